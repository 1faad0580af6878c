use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::domain::{
    AttemptId, AttemptStatus, Fee, FeeId, FeeKind, FeeStatus, GatewayCategory, MethodDetails,
    PaymentAttempt, PaymentAttemptView, PaymentRequest, PaymentTarget, Permit, PermitId, Receipt,
    WorkerPass, WorkerPassId, WorkerPassStatus,
};
use super::events::GatewayEvent;
use super::gateway::{GatewayError, GatewayOutcome, GatewayRegistry, InitiateRequest};
use super::ledger::{FeeAssessment, FeeLedger};
use super::lifecycle::{PaymentStateMachine, TransitionError};
use super::policy::PaymentPolicy;
use super::receipt::ReceiptGenerator;
use super::repository::{PaymentStore, StoreError};

/// Service composing the ledger, gateway registry, state machine, and store.
/// Every mutation of payment state enters through here, whether it started
/// as an HTTP submission or an asynchronous gateway callback.
pub struct PaymentService<S> {
    store: Arc<S>,
    gateways: GatewayRegistry,
    ledger: FeeLedger,
    policy: PaymentPolicy,
}

impl<S> PaymentService<S>
where
    S: PaymentStore + 'static,
{
    pub fn new(store: Arc<S>, gateways: GatewayRegistry, policy: PaymentPolicy) -> Self {
        let ledger = FeeLedger::new(policy.clone());
        Self {
            store,
            gateways,
            ledger,
            policy,
        }
    }

    /// Register a fee obligation, typically from the billing intake.
    pub async fn register_fee(&self, fee: Fee) -> Result<Fee, PaymentError> {
        if fee.amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount);
        }
        Ok(self.store.insert_fee(fee).await?)
    }

    /// Register a construction permit. A permit carrying an assessed road fee
    /// also gets its companion fee record, due from the day of registration,
    /// so the payment routes that resolve by permit always find it.
    pub async fn register_permit(&self, permit: Permit) -> Result<Permit, PaymentError> {
        if let Some(amount) = permit.road_fee_amount {
            if amount <= Decimal::ZERO {
                return Err(PaymentError::NonPositiveAmount);
            }
        }

        let stored = self.store.insert_permit(permit).await?;
        if let Some(amount) = stored.road_fee_amount {
            if self.store.road_fee_for_permit(&stored.id).await?.is_none() {
                let settled = stored.road_fee_paid;
                let fee = Fee {
                    id: FeeId(format!("{}-road", stored.id.0)),
                    kind: FeeKind::ConstructionRoadFee,
                    amount,
                    due_date: Utc::now().date_naive(),
                    status: if settled {
                        FeeStatus::Paid
                    } else {
                        FeeStatus::Unpaid
                    },
                    paid_amount: if settled { amount } else { Decimal::ZERO },
                    paid_at: stored.road_fee_paid_at,
                    payment_method: None,
                    linked_permit_id: Some(stored.id.clone()),
                };
                self.store.insert_fee(fee).await?;
            }
        }
        Ok(stored)
    }

    pub async fn fee(&self, fee_id: &FeeId) -> Result<Fee, PaymentError> {
        self.store
            .fee(fee_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownFee(fee_id.clone()))
    }

    pub async fn permit(&self, permit_id: &PermitId) -> Result<Permit, PaymentError> {
        self.store
            .permit(permit_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownPermit(permit_id.clone()))
    }

    /// Current dues for a fee: penalty accrual, outstanding balance, and the
    /// derived overdue flag, all computed from the due date at call time.
    pub async fn assess_dues(&self, fee_id: &FeeId) -> Result<FeeAssessment, PaymentError> {
        let fee = self.fee(fee_id).await?;
        Ok(self.ledger.assess(&fee, Utc::now().date_naive()))
    }

    /// Submit a payment: validate, admit under single-flight, open a gateway
    /// intent, and confirm. Once an attempt is admitted the outcome is
    /// reported through the returned view rather than an error, whatever the
    /// gateway answered.
    pub async fn submit(&self, request: PaymentRequest) -> Result<PaymentAttemptView, PaymentError> {
        if request.amount <= Decimal::ZERO {
            return Err(PaymentError::NonPositiveAmount);
        }
        let category = request.method.category();
        let adapter = self
            .gateways
            .adapter(category)
            .ok_or(PaymentError::UnsupportedCategory(category))?;
        if let Some(minimum) = adapter.minimum_amount() {
            if request.amount < minimum {
                return Err(PaymentError::BelowCategoryMinimum { category, minimum });
            }
        }
        validate_details(&request.method)?;

        let mut fee = self.resolve_target_fee(&request.target).await?;
        if fee.status == FeeStatus::Processing {
            return Err(PaymentError::PaymentInProgress);
        }

        let displaced = PaymentStateMachine::begin_fee_payment(&mut fee)?;
        let assessment = self.ledger.assess(&fee, Utc::now().date_naive());
        if request.amount > assessment.total_due {
            return Err(PaymentError::AmountExceedsOutstanding {
                amount: request.amount,
                outstanding: assessment.total_due,
            });
        }

        let attempt = PaymentAttempt {
            id: AttemptId(format!("pay_{}", Uuid::new_v4())),
            target: request.target.clone(),
            fee_id: fee.id.clone(),
            category,
            status: AttemptStatus::Initiated,
            amount: request.amount,
            intent_id: None,
            gateway_reference: None,
            failure_reason: None,
            redirect_url: None,
            prior_fee_status: displaced,
            created_at: Utc::now(),
            resolved_at: None,
        };

        // Store-level admission is the single-flight arbiter; the status
        // check above only catches the sequential case early.
        let mut attempt = match self.store.begin_attempt(attempt).await {
            Ok(attempt) => attempt,
            Err(StoreError::Conflict) => return Err(PaymentError::PaymentInProgress),
            Err(error) => return Err(error.into()),
        };
        self.store.update_fee(fee).await?;

        let initiate = InitiateRequest {
            reference: attempt.id.0.clone(),
            amount: attempt.amount,
            currency: self.policy.currency.clone(),
            details: request.method,
        };
        let intent = match adapter.initiate(initiate).await {
            Ok(intent) => intent,
            Err(error) => {
                // No intent was opened, so no funds are at risk; the attempt
                // fails outright and the fee goes back to what it was.
                return self.finalize_failure(attempt, None, error.to_string()).await;
            }
        };

        attempt.intent_id = Some(intent.intent_id.clone());
        attempt.redirect_url = intent.redirect_url;
        PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Processing, Utc::now())?;
        self.store.update_attempt(attempt.clone()).await?;

        let outcome = match adapter.confirm(&intent.intent_id).await {
            Ok(outcome) => outcome,
            Err(error) => {
                // The intent is open at the gateway, so the attempt stays
                // processing; a later refresh or callback settles it.
                tracing::warn!(
                    attempt_id = %attempt.id,
                    intent_id = %intent.intent_id,
                    error = %error,
                    "confirmation unreachable, attempt left processing"
                );
                return Ok(attempt.status_view());
            }
        };

        self.apply_outcome(attempt, outcome).await
    }

    /// Re-confirm a live attempt against its gateway. Terminal attempts are
    /// answered from the store without touching the gateway.
    pub async fn refresh(&self, attempt_id: &AttemptId) -> Result<PaymentAttemptView, PaymentError> {
        let attempt = self
            .store
            .attempt(attempt_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownAttempt(attempt_id.clone()))?;
        if attempt.status.is_terminal() {
            tracing::debug!(attempt_id = %attempt.id, "refresh of settled attempt is a no-op");
            return self.view_with_receipt(attempt).await;
        }

        let intent_id = attempt
            .intent_id
            .clone()
            .ok_or_else(|| PaymentError::MissingIntent(attempt.id.clone()))?;
        let adapter = self
            .gateways
            .adapter(attempt.category)
            .ok_or(PaymentError::UnsupportedCategory(attempt.category))?;
        let outcome = adapter.confirm(&intent_id).await?;

        self.apply_outcome(attempt, outcome).await
    }

    /// Apply an asynchronous gateway callback. Duplicate deliveries for an
    /// already-settled attempt are ignored.
    pub async fn ingest_event(&self, event: GatewayEvent) -> Result<PaymentAttemptView, PaymentError> {
        let attempt = self
            .store
            .attempt_by_intent(&event.intent_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownIntent(event.intent_id.clone()))?;
        if attempt.status.is_terminal() {
            tracing::debug!(
                attempt_id = %attempt.id,
                intent_id = %event.intent_id,
                "callback for settled attempt ignored"
            );
            return self.view_with_receipt(attempt).await;
        }

        self.apply_outcome(attempt, event.outcome).await
    }

    /// Current state of an attempt, including its receipt once issued.
    pub async fn attempt_status(
        &self,
        attempt_id: &AttemptId,
    ) -> Result<PaymentAttemptView, PaymentError> {
        let attempt = self
            .store
            .attempt(attempt_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownAttempt(attempt_id.clone()))?;
        self.view_with_receipt(attempt).await
    }

    /// Receipt for a captured attempt.
    pub async fn receipt(&self, attempt_id: &AttemptId) -> Result<Receipt, PaymentError> {
        let attempt = self
            .store
            .attempt(attempt_id)
            .await?
            .ok_or_else(|| PaymentError::UnknownAttempt(attempt_id.clone()))?;
        self.store
            .receipt_for_attempt(&attempt.id)
            .await?
            .ok_or(PaymentError::ReceiptNotIssued(attempt.id))
    }

    /// Schedule a worker pass under a permit that currently admits them.
    pub async fn schedule_worker_pass(
        &self,
        permit_id: &PermitId,
        worker_name: String,
    ) -> Result<WorkerPass, PaymentError> {
        let permit = self.permit(permit_id).await?;
        PaymentStateMachine::admit_worker_pass(&permit)?;

        let pass = WorkerPass {
            id: WorkerPassId(format!("wp_{}", Uuid::new_v4())),
            permit_id: permit.id,
            worker_name,
            status: WorkerPassStatus::Scheduled,
        };
        Ok(self.store.insert_worker_pass(pass).await?)
    }

    pub async fn worker_passes(
        &self,
        permit_id: &PermitId,
    ) -> Result<Vec<WorkerPass>, PaymentError> {
        let permit = self.permit(permit_id).await?;
        Ok(self.store.worker_passes_for_permit(&permit.id).await?)
    }

    /// The fee a payment target settles: either the fee itself or the road
    /// fee linked to the named permit.
    async fn resolve_target_fee(&self, target: &PaymentTarget) -> Result<Fee, PaymentError> {
        match target {
            PaymentTarget::Fee(fee_id) => self.fee(fee_id).await,
            PaymentTarget::Permit(permit_id) => {
                let permit = self.permit(permit_id).await?;
                self.store
                    .road_fee_for_permit(&permit.id)
                    .await?
                    .ok_or_else(|| PaymentError::MissingRoadFee(permit_id.clone()))
            }
        }
    }

    /// Route a gateway outcome to the matching finalizer. Callers guarantee
    /// the attempt is still live.
    async fn apply_outcome(
        &self,
        mut attempt: PaymentAttempt,
        outcome: GatewayOutcome,
    ) -> Result<PaymentAttemptView, PaymentError> {
        match outcome {
            GatewayOutcome::Pending { transaction_id } => {
                if transaction_id.is_some() {
                    attempt.gateway_reference = transaction_id;
                    self.store.update_attempt(attempt.clone()).await?;
                }
                Ok(attempt.status_view())
            }
            GatewayOutcome::Succeeded { transaction_id, .. } => {
                self.finalize_success(attempt, transaction_id).await
            }
            GatewayOutcome::Failed {
                transaction_id,
                reason,
            } => self.finalize_failure(attempt, transaction_id, reason).await,
        }
    }

    /// Settle the fee, apply any permit effect, and issue the receipt. The
    /// attempt's own terminal write happens last so the single-flight slot
    /// only frees once the monetary records are consistent.
    async fn finalize_success(
        &self,
        mut attempt: PaymentAttempt,
        transaction_id: String,
    ) -> Result<PaymentAttemptView, PaymentError> {
        let now = Utc::now();
        let mut fee = self.fee(&attempt.fee_id).await?;
        let assessment = self.ledger.assess(&fee, now.date_naive());
        let settled_in_full = attempt.amount >= assessment.total_due;

        PaymentStateMachine::settle_fee(&mut fee, &attempt, settled_in_full, now)?;
        self.store.update_fee(fee.clone()).await?;

        if fee.kind == FeeKind::ConstructionRoadFee && settled_in_full {
            if let Some(permit_id) = &fee.linked_permit_id {
                let mut permit = self.permit(permit_id).await?;
                PaymentStateMachine::mark_road_fee_paid(&mut permit, now);
                self.store.update_permit(permit).await?;
            }
        }

        let receipt = ReceiptGenerator::build(&attempt, &assessment, now);
        let receipt = match self.store.insert_receipt(receipt).await {
            Ok(receipt) => receipt,
            Err(StoreError::Conflict) => self
                .store
                .receipt_for_attempt(&attempt.id)
                .await?
                .ok_or_else(|| PaymentError::ReceiptNotIssued(attempt.id.clone()))?,
            Err(error) => return Err(error.into()),
        };

        attempt.gateway_reference = Some(transaction_id);
        PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Succeeded, now)?;
        self.store.update_attempt(attempt.clone()).await?;

        tracing::info!(
            attempt_id = %attempt.id,
            fee_id = %attempt.fee_id,
            amount = %attempt.amount,
            settled_in_full,
            "payment captured"
        );

        let mut view = attempt.status_view();
        view.receipt_id = Some(receipt.id);
        Ok(view)
    }

    /// Put the fee back to the status the attempt displaced and record the
    /// failure. No monetary fields move on this path.
    async fn finalize_failure(
        &self,
        mut attempt: PaymentAttempt,
        transaction_id: Option<String>,
        reason: String,
    ) -> Result<PaymentAttemptView, PaymentError> {
        let now = Utc::now();
        let mut fee = self.fee(&attempt.fee_id).await?;
        PaymentStateMachine::restore_fee(&mut fee, attempt.prior_fee_status)?;
        self.store.update_fee(fee).await?;

        attempt.gateway_reference = transaction_id;
        attempt.failure_reason = Some(reason);
        PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Failed, now)?;
        self.store.update_attempt(attempt.clone()).await?;

        tracing::warn!(
            attempt_id = %attempt.id,
            fee_id = %attempt.fee_id,
            gateway_reference = attempt.gateway_reference.as_deref().unwrap_or("none"),
            reason = attempt.failure_reason.as_deref().unwrap_or(""),
            "payment failed"
        );

        Ok(attempt.status_view())
    }

    async fn view_with_receipt(
        &self,
        attempt: PaymentAttempt,
    ) -> Result<PaymentAttemptView, PaymentError> {
        let receipt = self.store.receipt_for_attempt(&attempt.id).await?;
        let mut view = attempt.status_view();
        view.receipt_id = receipt.map(|receipt| receipt.id);
        Ok(view)
    }
}

fn validate_details(details: &MethodDetails) -> Result<(), PaymentError> {
    match details {
        MethodDetails::Card {
            card_number,
            expiry,
            holder,
        } => {
            if !(12..=19).contains(&card_number.len())
                || !card_number.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(PaymentError::InvalidDetails(
                    "card number must be 12-19 digits".to_string(),
                ));
            }
            if !valid_expiry(expiry) {
                return Err(PaymentError::InvalidDetails(
                    "card expiry must be MM/YY".to_string(),
                ));
            }
            if holder.trim().is_empty() {
                return Err(PaymentError::InvalidDetails(
                    "cardholder name is required".to_string(),
                ));
            }
        }
        MethodDetails::Wallet { account } => {
            if !(10..=13).contains(&account.len()) || !account.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(PaymentError::InvalidDetails(
                    "wallet account must be 10-13 digits".to_string(),
                ));
            }
        }
        MethodDetails::BankTransfer {
            bank_code,
            account_number,
        } => {
            if bank_code.trim().is_empty() {
                return Err(PaymentError::InvalidDetails(
                    "bank code is required".to_string(),
                ));
            }
            if !(6..=20).contains(&account_number.len())
                || !account_number.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(PaymentError::InvalidDetails(
                    "bank account number must be 6-20 digits".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn valid_expiry(expiry: &str) -> bool {
    match expiry.split_once('/') {
        Some((month, year)) => {
            month.len() == 2
                && year.len() == 2
                && year.bytes().all(|b| b.is_ascii_digit())
                && month.parse::<u8>().map_or(false, |m| (1..=12).contains(&m))
        }
        None => false,
    }
}

/// Error raised by the payment service.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("unknown fee: {0}")]
    UnknownFee(FeeId),
    #[error("unknown permit: {0}")]
    UnknownPermit(PermitId),
    #[error("unknown payment attempt: {0}")]
    UnknownAttempt(AttemptId),
    #[error("no attempt is tracking gateway intent {0}")]
    UnknownIntent(String),
    #[error("attempt {0} has no gateway intent to confirm")]
    MissingIntent(AttemptId),
    #[error("permit {0} has no road fee assessed")]
    MissingRoadFee(PermitId),
    #[error("no gateway registered for category {}", .0.label())]
    UnsupportedCategory(GatewayCategory),
    #[error("payment amount must be positive")]
    NonPositiveAmount,
    #[error("payment of {amount} exceeds outstanding balance {outstanding}")]
    AmountExceedsOutstanding {
        amount: Decimal,
        outstanding: Decimal,
    },
    #[error("{} payments require at least {}", .category.label(), .minimum)]
    BelowCategoryMinimum {
        category: GatewayCategory,
        minimum: Decimal,
    },
    #[error("invalid payment details: {0}")]
    InvalidDetails(String),
    #[error("a payment for this target is already in flight")]
    PaymentInProgress,
    #[error("no receipt issued for attempt {0}")]
    ReceiptNotIssued(AttemptId),
    #[error(transparent)]
    Lifecycle(#[from] TransitionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
