use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::domain::{
    AttemptId, Fee, FeeId, FeeKind, PaymentAttempt, Permit, PermitId, Receipt, WorkerPass,
    WorkerPassId,
};
use super::repository::{PaymentStore, StoreError};

/// Map-backed store for the sandbox deployment and tests.
#[derive(Default)]
pub struct InMemoryPaymentStore {
    fees: RwLock<HashMap<FeeId, Fee>>,
    permits: RwLock<HashMap<PermitId, Permit>>,
    worker_passes: RwLock<HashMap<WorkerPassId, WorkerPass>>,
    attempts: RwLock<HashMap<AttemptId, PaymentAttempt>>,
    receipts: RwLock<HashMap<AttemptId, Receipt>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert_fee(&self, fee: Fee) -> Result<Fee, StoreError> {
        let mut fees = self.fees.write().await;
        if fees.contains_key(&fee.id) {
            return Err(StoreError::Conflict);
        }
        fees.insert(fee.id.clone(), fee.clone());
        Ok(fee)
    }

    async fn fee(&self, id: &FeeId) -> Result<Option<Fee>, StoreError> {
        Ok(self.fees.read().await.get(id).cloned())
    }

    async fn update_fee(&self, fee: Fee) -> Result<(), StoreError> {
        let mut fees = self.fees.write().await;
        if !fees.contains_key(&fee.id) {
            return Err(StoreError::NotFound);
        }
        fees.insert(fee.id.clone(), fee);
        Ok(())
    }

    async fn insert_permit(&self, permit: Permit) -> Result<Permit, StoreError> {
        let mut permits = self.permits.write().await;
        if permits.contains_key(&permit.id) {
            return Err(StoreError::Conflict);
        }
        permits.insert(permit.id.clone(), permit.clone());
        Ok(permit)
    }

    async fn permit(&self, id: &PermitId) -> Result<Option<Permit>, StoreError> {
        Ok(self.permits.read().await.get(id).cloned())
    }

    async fn update_permit(&self, permit: Permit) -> Result<(), StoreError> {
        let mut permits = self.permits.write().await;
        if !permits.contains_key(&permit.id) {
            return Err(StoreError::NotFound);
        }
        permits.insert(permit.id.clone(), permit);
        Ok(())
    }

    async fn road_fee_for_permit(&self, id: &PermitId) -> Result<Option<Fee>, StoreError> {
        let fees = self.fees.read().await;
        Ok(fees
            .values()
            .find(|fee| {
                fee.kind == FeeKind::ConstructionRoadFee
                    && fee.linked_permit_id.as_ref() == Some(id)
            })
            .cloned())
    }

    async fn insert_worker_pass(&self, pass: WorkerPass) -> Result<WorkerPass, StoreError> {
        let mut passes = self.worker_passes.write().await;
        if passes.contains_key(&pass.id) {
            return Err(StoreError::Conflict);
        }
        passes.insert(pass.id.clone(), pass.clone());
        Ok(pass)
    }

    async fn worker_passes_for_permit(
        &self,
        id: &PermitId,
    ) -> Result<Vec<WorkerPass>, StoreError> {
        let passes = self.worker_passes.read().await;
        let mut matched: Vec<WorkerPass> = passes
            .values()
            .filter(|pass| &pass.permit_id == id)
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(matched)
    }

    async fn begin_attempt(&self, attempt: PaymentAttempt) -> Result<PaymentAttempt, StoreError> {
        // The live-attempt scan and the insert share one write guard, so two
        // racing submissions cannot both pass the check. Keyed by fee so the
        // permit route and the direct fee route contend for the same slot.
        let mut attempts = self.attempts.write().await;
        let already_live = attempts
            .values()
            .any(|existing| existing.fee_id == attempt.fee_id && !existing.status.is_terminal());
        if already_live {
            return Err(StoreError::Conflict);
        }
        if attempts.contains_key(&attempt.id) {
            return Err(StoreError::Conflict);
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn attempt(&self, id: &AttemptId) -> Result<Option<PaymentAttempt>, StoreError> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn attempt_by_intent(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentAttempt>, StoreError> {
        let attempts = self.attempts.read().await;
        Ok(attempts
            .values()
            .find(|attempt| attempt.intent_id.as_deref() == Some(intent_id))
            .cloned())
    }

    async fn update_attempt(&self, attempt: PaymentAttempt) -> Result<(), StoreError> {
        let mut attempts = self.attempts.write().await;
        if !attempts.contains_key(&attempt.id) {
            return Err(StoreError::NotFound);
        }
        attempts.insert(attempt.id.clone(), attempt);
        Ok(())
    }

    async fn insert_receipt(&self, receipt: Receipt) -> Result<Receipt, StoreError> {
        let mut receipts = self.receipts.write().await;
        if receipts.contains_key(&receipt.attempt_id) {
            return Err(StoreError::Conflict);
        }
        receipts.insert(receipt.attempt_id.clone(), receipt.clone());
        Ok(receipt)
    }

    async fn receipt_for_attempt(&self, id: &AttemptId) -> Result<Option<Receipt>, StoreError> {
        Ok(self.receipts.read().await.get(id).cloned())
    }
}
