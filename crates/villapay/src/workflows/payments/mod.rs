//! Fee and permit payment lifecycle: dues assessment with penalty accrual,
//! category-routed gateway submissions under single-flight protection,
//! outcome-driven state transitions, and idempotent receipts.
//!
//! The [`service::PaymentService`] is the only entry point that mutates
//! payment state. Synchronous confirmations, manual refreshes, and
//! asynchronous processor callbacks all converge on the same apply path, so
//! an outcome settles identically however it arrives.

pub mod domain;
pub mod events;
pub mod gateway;
pub mod ledger;
pub(crate) mod lifecycle;
pub(crate) mod memory;
pub(crate) mod policy;
pub(crate) mod receipt;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AmountBreakdown, AttemptId, AttemptStatus, Fee, FeeId, FeeKind, FeeStatus, GatewayCategory,
    MethodDetails, PaymentAttempt, PaymentAttemptView, PaymentRequest, PaymentTarget, Permit,
    PermitId, PermitStatus, Receipt, ReceiptId, WorkerPass, WorkerPassId, WorkerPassRequest,
    WorkerPassStatus,
};
pub use events::{CallbackPump, GatewayEvent};
pub use gateway::{
    BankGateway, CardGateway, GatewayAdapter, GatewayError, GatewayOutcome, GatewayRegistry,
    InitiateRequest, PaymentIntent, WalletGateway, DECLINING_CARD,
};
pub use ledger::{FeeAssessment, FeeLedger};
pub use lifecycle::{PaymentStateMachine, TransitionError};
pub use memory::InMemoryPaymentStore;
pub use policy::PaymentPolicy;
pub use receipt::ReceiptGenerator;
pub use repository::{PaymentStore, StoreError};
pub use router::payments_router;
pub use service::{PaymentError, PaymentService};
