use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for billed fees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeId(pub String);

/// Identifier wrapper for construction permits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermitId(pub String);

/// Identifier wrapper for contractor worker passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerPassId(pub String);

/// Identifier wrapper for payment attempts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub String);

/// Identifier wrapper for issued receipts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceiptId(pub String);

impl fmt::Display for FeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PermitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for WorkerPassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Billing classification carried by every fee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Monthly,
    Quarterly,
    Annual,
    Special,
    LateFee,
    ConstructionRoadFee,
}

impl FeeKind {
    pub const fn label(self) -> &'static str {
        match self {
            FeeKind::Monthly => "monthly",
            FeeKind::Quarterly => "quarterly",
            FeeKind::Annual => "annual",
            FeeKind::Special => "special",
            FeeKind::LateFee => "late_fee",
            FeeKind::ConstructionRoadFee => "construction_road_fee",
        }
    }
}

/// Lifecycle status of a fee. `overdue` may arrive from upstream seeds; the
/// engine itself derives overdue display state from the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Unpaid,
    Processing,
    Paid,
    Overdue,
    Partial,
    Waived,
    Cancelled,
}

impl FeeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            FeeStatus::Unpaid => "unpaid",
            FeeStatus::Processing => "processing",
            FeeStatus::Paid => "paid",
            FeeStatus::Overdue => "overdue",
            FeeStatus::Partial => "partial",
            FeeStatus::Waived => "waived",
            FeeStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses from which a payment attempt may be started.
    pub const fn is_payable(self) -> bool {
        matches!(self, FeeStatus::Unpaid | FeeStatus::Overdue | FeeStatus::Partial)
    }
}

/// A billed obligation against a household or a permit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub id: FeeId,
    pub kind: FeeKind,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: FeeStatus,
    pub paid_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<GatewayCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_permit_id: Option<PermitId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    Pending,
    Approved,
    Rejected,
    InProgress,
    Completed,
}

impl PermitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PermitStatus::Pending => "pending",
            PermitStatus::Approved => "approved",
            PermitStatus::Rejected => "rejected",
            PermitStatus::InProgress => "in_progress",
            PermitStatus::Completed => "completed",
        }
    }

    /// Worker passes may only be scheduled against an accepted permit.
    pub const fn accepts_worker_passes(self) -> bool {
        matches!(self, PermitStatus::Approved | PermitStatus::InProgress)
    }
}

/// A construction permit whose road fee gates the start of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub id: PermitId,
    pub status: PermitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_fee_amount: Option<Decimal>,
    pub road_fee_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_fee_paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPassStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
}

impl WorkerPassStatus {
    pub const fn label(self) -> &'static str {
        match self {
            WorkerPassStatus::Scheduled => "scheduled",
            WorkerPassStatus::Active => "active",
            WorkerPassStatus::Completed => "completed",
            WorkerPassStatus::Cancelled => "cancelled",
        }
    }
}

/// Site access pass for a contractor working under a permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerPass {
    pub id: WorkerPassId,
    pub permit_id: PermitId,
    pub worker_name: String,
    pub status: WorkerPassStatus,
}

/// Intake payload for scheduling a worker pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPassRequest {
    pub worker_name: String,
}

/// Payment processor families the engine can route to. Each category is an
/// independent adapter with its own preconditions and confirmation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayCategory {
    Card,
    Wallet,
    BankTransfer,
}

impl GatewayCategory {
    pub const fn label(self) -> &'static str {
        match self {
            GatewayCategory::Card => "card",
            GatewayCategory::Wallet => "wallet",
            GatewayCategory::BankTransfer => "bank_transfer",
        }
    }
}

/// Instrument details supplied with a payment submission. The variant picks
/// the gateway adapter; no string dispatch happens downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum MethodDetails {
    Card {
        card_number: String,
        expiry: String,
        holder: String,
    },
    Wallet {
        account: String,
    },
    BankTransfer {
        bank_code: String,
        account_number: String,
    },
}

impl MethodDetails {
    pub const fn category(&self) -> GatewayCategory {
        match self {
            MethodDetails::Card { .. } => GatewayCategory::Card,
            MethodDetails::Wallet { .. } => GatewayCategory::Wallet,
            MethodDetails::BankTransfer { .. } => GatewayCategory::BankTransfer,
        }
    }
}

/// What a payment submission is aimed at. A permit target resolves to the
/// permit's linked road fee before any attempt is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PaymentTarget {
    Fee(FeeId),
    Permit(PermitId),
}

/// Inbound payment submission accepted by the service facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub target: PaymentTarget,
    pub amount: Decimal,
    pub method: MethodDetails,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Initiated,
    Processing,
    Succeeded,
    Failed,
}

impl AttemptStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AttemptStatus::Initiated => "initiated",
            AttemptStatus::Processing => "processing",
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::Failed => "failed",
        }
    }

    /// Terminal attempts release the per-fee payment lock.
    pub const fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Succeeded | AttemptStatus::Failed)
    }
}

/// One routed payment against a fee. At most one attempt per fee may be live
/// (non-terminal) at any time; the store enforces this at insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttempt {
    pub id: AttemptId,
    pub target: PaymentTarget,
    pub fee_id: FeeId,
    pub category: GatewayCategory,
    pub status: AttemptStatus,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// Fee status this attempt displaced; restored verbatim if the attempt
    /// fails so seeded `overdue` fees round-trip unchanged.
    pub prior_fee_status: FeeStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PaymentAttempt {
    pub fn status_view(&self) -> PaymentAttemptView {
        PaymentAttemptView {
            attempt_id: self.id.clone(),
            fee_id: self.fee_id.clone(),
            category: self.category.label(),
            status: self.status.label(),
            amount: self.amount,
            gateway_reference: self.gateway_reference.clone(),
            failure_reason: self.failure_reason.clone(),
            redirect_url: self.redirect_url.clone(),
            receipt_id: None,
        }
    }
}

/// Sanitized representation of an attempt's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentAttemptView {
    pub attempt_id: AttemptId,
    pub fee_id: FeeId,
    pub category: &'static str,
    pub status: &'static str,
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<ReceiptId>,
}

/// Money split recorded on a receipt, frozen at payment time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmountBreakdown {
    pub base: Decimal,
    pub late_fee: Decimal,
    pub total: Decimal,
}

/// Proof of settlement, unique per succeeded attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub attempt_id: AttemptId,
    pub fee_id: FeeId,
    pub breakdown: AmountBreakdown,
    pub issued_at: DateTime<Utc>,
}
