use chrono::Utc;
use rust_decimal_macros::dec;

use super::common::*;
use crate::workflows::payments::domain::{
    AttemptStatus, FeeStatus, GatewayCategory, PermitStatus,
};
use crate::workflows::payments::lifecycle::{PaymentStateMachine, TransitionError};

#[test]
fn payable_fee_enters_processing_and_reports_displaced_status() {
    let mut fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(10));
    fee.status = FeeStatus::Overdue;

    let displaced = PaymentStateMachine::begin_fee_payment(&mut fee).expect("fee is payable");

    assert_eq!(displaced, FeeStatus::Overdue);
    assert_eq!(fee.status, FeeStatus::Processing);
}

#[test]
fn settled_fee_rejects_new_charges() {
    let mut fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(10));
    fee.status = FeeStatus::Paid;

    let error = PaymentStateMachine::begin_fee_payment(&mut fee).expect_err("not payable");

    assert!(matches!(
        error,
        TransitionError::FeeNotPayable {
            status: FeeStatus::Paid
        }
    ));
    assert_eq!(fee.status, FeeStatus::Paid);
}

#[test]
fn full_settlement_marks_the_fee_paid() {
    let mut fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(10));
    let attempt = attempt_for(&fee, dec!(1100));
    fee.status = FeeStatus::Processing;

    PaymentStateMachine::settle_fee(&mut fee, &attempt, true, Utc::now()).expect("settles");

    assert_eq!(fee.status, FeeStatus::Paid);
    assert_eq!(fee.paid_amount, dec!(1100));
    assert_eq!(fee.payment_method, Some(GatewayCategory::Card));
    assert!(fee.paid_at.is_some());
}

#[test]
fn partial_settlement_keeps_the_fee_collectible() {
    let mut fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(0));
    let attempt = attempt_for(&fee, dec!(400));
    fee.status = FeeStatus::Processing;

    PaymentStateMachine::settle_fee(&mut fee, &attempt, false, Utc::now()).expect("settles");

    assert_eq!(fee.status, FeeStatus::Partial);
    assert_eq!(fee.paid_amount, dec!(400));
    assert!(fee.paid_at.is_none());
    assert!(fee.status.is_payable());
}

#[test]
fn settlement_requires_a_processing_fee() {
    let mut fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(0));
    let attempt = attempt_for(&fee, dec!(1000));

    let error = PaymentStateMachine::settle_fee(&mut fee, &attempt, true, Utc::now())
        .expect_err("fee was never displaced");

    assert!(matches!(
        error,
        TransitionError::InvalidFeeTransition {
            from: FeeStatus::Unpaid,
            ..
        }
    ));
    assert_eq!(fee.paid_amount, dec!(0));
}

#[test]
fn failed_charge_restores_the_displaced_status() {
    let mut fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(10));
    fee.status = FeeStatus::Overdue;
    let displaced = PaymentStateMachine::begin_fee_payment(&mut fee).expect("payable");

    PaymentStateMachine::restore_fee(&mut fee, displaced).expect("restores");

    assert_eq!(fee.status, FeeStatus::Overdue);
    assert_eq!(fee.paid_amount, dec!(0));
    assert!(fee.paid_at.is_none());
}

#[test]
fn attempts_walk_initiated_processing_terminal() {
    let fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(0));
    let mut attempt = attempt_for(&fee, dec!(1000));
    let now = Utc::now();

    PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Processing, now)
        .expect("advances");
    assert!(attempt.resolved_at.is_none());

    PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Succeeded, now)
        .expect("settles");
    assert_eq!(attempt.status, AttemptStatus::Succeeded);
    assert!(attempt.resolved_at.is_some());
}

#[test]
fn attempt_may_fail_before_an_intent_opens() {
    let fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(0));
    let mut attempt = attempt_for(&fee, dec!(1000));

    PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Failed, Utc::now())
        .expect("fails outright");

    assert_eq!(attempt.status, AttemptStatus::Failed);
    assert!(attempt.resolved_at.is_some());
}

#[test]
fn terminal_attempts_do_not_move() {
    let fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(0));
    let mut attempt = attempt_for(&fee, dec!(1000));
    let now = Utc::now();
    PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Processing, now)
        .expect("advances");
    PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Succeeded, now)
        .expect("settles");

    let error =
        PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Failed, now)
            .expect_err("terminal attempts are frozen");

    assert!(matches!(
        error,
        TransitionError::InvalidAttemptTransition {
            from: AttemptStatus::Succeeded,
            to: AttemptStatus::Failed,
        }
    ));
}

#[test]
fn skipping_processing_is_rejected() {
    let fee = monthly_fee("fee-2024-001", dec!(1000), days_ago(0));
    let mut attempt = attempt_for(&fee, dec!(1000));

    let error =
        PaymentStateMachine::advance_attempt(&mut attempt, AttemptStatus::Succeeded, Utc::now())
            .expect_err("capture requires a confirmed intent");

    assert!(matches!(
        error,
        TransitionError::InvalidAttemptTransition { .. }
    ));
}

#[test]
fn road_fee_settlement_promotes_an_approved_permit() {
    let mut permit = approved_permit("permit-2024-001", dec!(500));

    PaymentStateMachine::mark_road_fee_paid(&mut permit, Utc::now());

    assert_eq!(permit.status, PermitStatus::InProgress);
    assert!(permit.road_fee_paid);
    assert!(permit.road_fee_paid_at.is_some());
}

#[test]
fn permits_past_approval_keep_their_status() {
    let mut in_progress = approved_permit("permit-2024-001", dec!(500));
    in_progress.status = PermitStatus::InProgress;
    PaymentStateMachine::mark_road_fee_paid(&mut in_progress, Utc::now());
    assert_eq!(in_progress.status, PermitStatus::InProgress);

    let mut completed = approved_permit("permit-2024-002", dec!(500));
    completed.status = PermitStatus::Completed;
    PaymentStateMachine::mark_road_fee_paid(&mut completed, Utc::now());
    assert_eq!(completed.status, PermitStatus::Completed);
    assert!(completed.road_fee_paid);
}

#[test]
fn worker_passes_require_an_active_permit() {
    for status in [PermitStatus::Approved, PermitStatus::InProgress] {
        let permit = bare_permit("permit-2024-001", status);
        PaymentStateMachine::admit_worker_pass(&permit).expect("permit admits passes");
    }

    for status in [
        PermitStatus::Pending,
        PermitStatus::Rejected,
        PermitStatus::Completed,
    ] {
        let permit = bare_permit("permit-2024-002", status);
        let error =
            PaymentStateMachine::admit_worker_pass(&permit).expect_err("permit refuses passes");
        assert!(matches!(error, TransitionError::PermitNotAccepting { .. }));
    }
}
