use chrono::{DateTime, Utc};

use super::domain::{AttemptStatus, Fee, FeeStatus, PaymentAttempt, Permit, PermitStatus};

/// Legal state transitions for fees, permits, and attempts. All mutations of
/// lifecycle status funnel through here; the service persists what these
/// functions produce and never edits statuses directly.
pub struct PaymentStateMachine;

impl PaymentStateMachine {
    /// Move a payable fee into `processing` and hand back the status the
    /// charge displaced. The displaced status is restored verbatim if the
    /// attempt later fails, so seeded `overdue` records round-trip unchanged.
    pub fn begin_fee_payment(fee: &mut Fee) -> Result<FeeStatus, TransitionError> {
        if !fee.status.is_payable() {
            return Err(TransitionError::FeeNotPayable { status: fee.status });
        }
        let displaced = fee.status;
        fee.status = FeeStatus::Processing;
        Ok(displaced)
    }

    /// Apply a successful charge to a fee under settlement. `settled_in_full`
    /// is decided by the ledger against the updated paid amount; the state
    /// machine does not recompute dues.
    pub fn settle_fee(
        fee: &mut Fee,
        attempt: &PaymentAttempt,
        settled_in_full: bool,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let to = if settled_in_full {
            FeeStatus::Paid
        } else {
            FeeStatus::Partial
        };
        if fee.status != FeeStatus::Processing {
            return Err(TransitionError::InvalidFeeTransition {
                from: fee.status,
                to,
            });
        }

        fee.paid_amount += attempt.amount;
        fee.payment_method = Some(attempt.category);
        fee.status = to;
        if settled_in_full {
            fee.paid_at = Some(now);
        }
        Ok(())
    }

    /// Put a fee back to the status a failed charge displaced. No monetary
    /// fields move on failure.
    pub fn restore_fee(fee: &mut Fee, displaced: FeeStatus) -> Result<(), TransitionError> {
        if fee.status != FeeStatus::Processing {
            return Err(TransitionError::InvalidFeeTransition {
                from: fee.status,
                to: displaced,
            });
        }
        fee.status = displaced;
        Ok(())
    }

    /// Record a settled road fee on its permit. An `approved` permit moves to
    /// `in_progress`; a permit already past that point keeps its status.
    pub fn mark_road_fee_paid(permit: &mut Permit, now: DateTime<Utc>) {
        permit.road_fee_paid = true;
        permit.road_fee_paid_at = Some(now);
        if permit.status == PermitStatus::Approved {
            permit.status = PermitStatus::InProgress;
        }
    }

    /// Advance an attempt along `initiated -> processing -> succeeded/failed`.
    /// An attempt may also fail straight out of `initiated` when the gateway
    /// never opened an intent. Terminal attempts stamp `resolved_at`.
    pub fn advance_attempt(
        attempt: &mut PaymentAttempt,
        to: AttemptStatus,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        let legal = matches!(
            (attempt.status, to),
            (AttemptStatus::Initiated, AttemptStatus::Processing)
                | (AttemptStatus::Initiated, AttemptStatus::Failed)
                | (AttemptStatus::Processing, AttemptStatus::Succeeded)
                | (AttemptStatus::Processing, AttemptStatus::Failed)
        );
        if !legal {
            return Err(TransitionError::InvalidAttemptTransition {
                from: attempt.status,
                to,
            });
        }

        attempt.status = to;
        if to.is_terminal() {
            attempt.resolved_at = Some(now);
        }
        Ok(())
    }

    /// Worker passes may only be scheduled while the permit is `approved` or
    /// `in_progress`.
    pub fn admit_worker_pass(permit: &Permit) -> Result<(), TransitionError> {
        if !permit.status.accepts_worker_passes() {
            return Err(TransitionError::PermitNotAccepting {
                status: permit.status,
            });
        }
        Ok(())
    }
}

/// Error enumeration for rejected lifecycle transitions.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("fee cannot take a charge while {}", .status.label())]
    FeeNotPayable { status: FeeStatus },
    #[error("invalid fee transition: {} -> {}", .from.label(), .to.label())]
    InvalidFeeTransition { from: FeeStatus, to: FeeStatus },
    #[error("invalid attempt transition: {} -> {}", .from.label(), .to.label())]
    InvalidAttemptTransition {
        from: AttemptStatus,
        to: AttemptStatus,
    },
    #[error("permit does not admit worker passes while {}", .status.label())]
    PermitNotAccepting { status: PermitStatus },
}
