use async_trait::async_trait;

use super::domain::{
    AttemptId, Fee, FeeId, PaymentAttempt, Permit, PermitId, Receipt, WorkerPass,
};

/// Storage abstraction so the service module can be exercised in isolation.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_fee(&self, fee: Fee) -> Result<Fee, StoreError>;
    async fn fee(&self, id: &FeeId) -> Result<Option<Fee>, StoreError>;
    async fn update_fee(&self, fee: Fee) -> Result<(), StoreError>;

    async fn insert_permit(&self, permit: Permit) -> Result<Permit, StoreError>;
    async fn permit(&self, id: &PermitId) -> Result<Option<Permit>, StoreError>;
    async fn update_permit(&self, permit: Permit) -> Result<(), StoreError>;
    /// The construction road fee linked to a permit, when one was assessed.
    async fn road_fee_for_permit(&self, id: &PermitId) -> Result<Option<Fee>, StoreError>;

    async fn insert_worker_pass(&self, pass: WorkerPass) -> Result<WorkerPass, StoreError>;
    async fn worker_passes_for_permit(
        &self,
        id: &PermitId,
    ) -> Result<Vec<WorkerPass>, StoreError>;

    /// Admit a new attempt only when no live attempt exists for the same
    /// fee. `Conflict` here is the single-flight guarantee; callers must
    /// not pre-check and insert separately.
    async fn begin_attempt(&self, attempt: PaymentAttempt) -> Result<PaymentAttempt, StoreError>;
    async fn attempt(&self, id: &AttemptId) -> Result<Option<PaymentAttempt>, StoreError>;
    async fn attempt_by_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentAttempt>, StoreError>;
    async fn update_attempt(&self, attempt: PaymentAttempt) -> Result<(), StoreError>;

    /// Record a receipt, refusing a second one for the same attempt.
    async fn insert_receipt(&self, receipt: Receipt) -> Result<Receipt, StoreError>;
    async fn receipt_for_attempt(&self, id: &AttemptId) -> Result<Option<Receipt>, StoreError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
