use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::domain::{AmountBreakdown, PaymentAttempt, Receipt, ReceiptId};
use super::ledger::FeeAssessment;

/// Builds the immutable record of a captured payment. Amounts are frozen
/// from the assessment that accompanied the charge; later penalty accrual
/// never rewrites an issued receipt.
pub struct ReceiptGenerator;

impl ReceiptGenerator {
    /// Freeze a successful attempt into a receipt. The charge is applied
    /// penalty-first: the payment covers any late fee still outstanding
    /// before the base obligation, and `base + late_fee` equals the amount
    /// actually captured.
    pub fn build(
        attempt: &PaymentAttempt,
        assessment: &FeeAssessment,
        now: DateTime<Utc>,
    ) -> Receipt {
        let late_outstanding =
            (assessment.late_fee - assessment.paid_amount).max(Decimal::ZERO);
        let late_fee = attempt.amount.min(late_outstanding);
        let base = attempt.amount - late_fee;

        Receipt {
            id: ReceiptId(format!("rcp_{}", Uuid::new_v4())),
            attempt_id: attempt.id.clone(),
            fee_id: attempt.fee_id.clone(),
            breakdown: AmountBreakdown {
                base,
                late_fee,
                total: attempt.amount,
            },
            issued_at: now,
        }
    }
}
