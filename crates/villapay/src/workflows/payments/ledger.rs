use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{Fee, FeeId, FeeStatus};
use super::policy::PaymentPolicy;

/// Stateless calculator for amounts owed on a fee as of a given date.
///
/// Stored monetary fields never hold derived penalties; every read that
/// displays or validates an amount goes through `assess`.
pub struct FeeLedger {
    policy: PaymentPolicy,
}

impl FeeLedger {
    pub fn new(policy: PaymentPolicy) -> Self {
        Self { policy }
    }

    pub fn assess(&self, fee: &Fee, today: NaiveDate) -> FeeAssessment {
        let days_overdue = if fee.status == FeeStatus::Paid {
            0
        } else {
            (today - fee.due_date).num_days().max(0)
        };

        let period = self.policy.penalty_period_days.max(1);
        let months_overdue = if days_overdue > 0 {
            days_overdue / period + 1
        } else {
            0
        };

        let late_fee = if days_overdue > 0 {
            let accrued =
                fee.amount * self.policy.monthly_penalty_rate * Decimal::from(months_overdue);
            accrued.max(self.policy.minimum_late_fee)
        } else {
            Decimal::ZERO
        };

        let total_due = (fee.amount + late_fee - fee.paid_amount).max(Decimal::ZERO);

        let is_overdue = !matches!(
            fee.status,
            FeeStatus::Paid | FeeStatus::Cancelled | FeeStatus::Waived
        ) && today > fee.due_date;

        FeeAssessment {
            fee_id: fee.id.clone(),
            status: fee.status,
            amount: fee.amount,
            paid_amount: fee.paid_amount,
            due_date: fee.due_date,
            days_overdue,
            months_overdue,
            late_fee,
            total_due,
            is_overdue,
        }
    }
}

/// Amounts owed on a fee at one point in time; doubles as the dues view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeAssessment {
    pub fee_id: FeeId,
    pub status: FeeStatus,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub due_date: NaiveDate,
    pub days_overdue: i64,
    pub months_overdue: i64,
    pub late_fee: Decimal,
    pub total_due: Decimal,
    pub is_overdue: bool,
}

impl FeeAssessment {
    /// True when nothing further is owed.
    pub fn is_settled(&self) -> bool {
        self.total_due.is_zero()
    }
}
