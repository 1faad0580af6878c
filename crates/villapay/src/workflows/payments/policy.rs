use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tunable amounts governing penalty accrual and gateway preconditions.
///
/// Constructed explicitly and injected where needed; nothing reads it from
/// global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPolicy {
    /// Penalty charged per started month overdue, as a fraction of the base
    /// amount.
    pub monthly_penalty_rate: Decimal,
    /// Floor applied to any non-zero late fee.
    pub minimum_late_fee: Decimal,
    /// Length of one penalty accrual period in days.
    pub penalty_period_days: i64,
    /// Smallest amount the wallet gateway accepts.
    pub wallet_minimum: Decimal,
    /// Smallest amount the bank-transfer gateway accepts.
    pub bank_transfer_minimum: Decimal,
    pub currency: String,
}

impl Default for PaymentPolicy {
    fn default() -> Self {
        Self {
            monthly_penalty_rate: dec!(0.02),
            minimum_late_fee: dec!(100),
            penalty_period_days: 30,
            wallet_minimum: dec!(50),
            bank_transfer_minimum: dec!(500),
            currency: "PHP".to_string(),
        }
    }
}
