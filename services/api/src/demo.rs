use crate::infra::{parse_amount, parse_date};
use chrono::{Duration, NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use villapay::error::AppError;
use villapay::workflows::payments::{
    BankGateway, CardGateway, Fee, FeeAssessment, FeeId, FeeKind, FeeLedger, FeeStatus,
    GatewayRegistry, InMemoryPaymentStore, MethodDetails, PaymentPolicy, PaymentRequest,
    PaymentService, PaymentStore, PaymentTarget, Permit, PermitId, PermitStatus, WalletGateway,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Base amount for the seeded monthly fee. Defaults to 10000.
    #[arg(long, value_parser = parse_amount)]
    pub(crate) amount: Option<Decimal>,
    /// Due date for the seeded monthly fee (YYYY-MM-DD). Defaults to 40 days ago.
    #[arg(long, value_parser = parse_date)]
    pub(crate) due_date: Option<NaiveDate>,
    /// Skip the permit road-fee portion of the demo.
    #[arg(long)]
    pub(crate) skip_permit: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DuesArgs {
    /// Base fee amount
    #[arg(long, value_parser = parse_amount)]
    pub(crate) amount: Decimal,
    /// Due date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) due_date: NaiveDate,
    /// Assessment date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_dues_report(args: DuesArgs) -> Result<(), AppError> {
    let DuesArgs {
        amount,
        due_date,
        as_of,
    } = args;

    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let ledger = FeeLedger::new(PaymentPolicy::default());
    let fee = Fee {
        id: FeeId("fee-preview".to_string()),
        kind: FeeKind::Monthly,
        amount,
        due_date,
        status: FeeStatus::Unpaid,
        paid_amount: Decimal::ZERO,
        paid_at: None,
        payment_method: None,
        linked_permit_id: None,
    };
    let assessment = ledger.assess(&fee, as_of);

    println!("Dues assessment (evaluated {as_of})");
    render_assessment(&assessment);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        amount,
        due_date,
        skip_permit,
    } = args;

    let amount = amount.unwrap_or(dec!(10000));
    let due_date = due_date.unwrap_or_else(|| Utc::now().date_naive() - Duration::days(40));

    println!("VillaPay payment lifecycle demo");

    let policy = PaymentPolicy::default();
    let wallet = Arc::new(WalletGateway::new(policy.wallet_minimum));
    let registry = GatewayRegistry::new()
        .register(Arc::new(CardGateway::new()))
        .register(wallet.clone())
        .register(Arc::new(BankGateway::new(policy.bank_transfer_minimum)));
    let store = Arc::new(InMemoryPaymentStore::new());
    let service = Arc::new(PaymentService::new(store.clone(), registry, policy));

    service
        .register_fee(Fee {
            id: FeeId("fee-2024-001".to_string()),
            kind: FeeKind::Monthly,
            amount,
            due_date,
            status: FeeStatus::Unpaid,
            paid_amount: Decimal::ZERO,
            paid_at: None,
            payment_method: None,
            linked_permit_id: None,
        })
        .await?;

    println!("\nMonthly dues");
    let assessment = service
        .assess_dues(&FeeId("fee-2024-001".to_string()))
        .await?;
    render_assessment(&assessment);

    println!("\nCard payment for the full balance");
    let view = match service
        .submit(PaymentRequest {
            target: PaymentTarget::Fee(FeeId("fee-2024-001".to_string())),
            amount: assessment.total_due,
            method: demo_card(),
        })
        .await
    {
        Ok(view) => view,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!("- attempt {} -> {}", view.attempt_id, view.status);
    if view.receipt_id.is_some() {
        let receipt = service.receipt(&view.attempt_id).await?;
        println!(
            "- receipt {}: base {} + late fee {} = {}",
            receipt.id, receipt.breakdown.base, receipt.breakdown.late_fee, receipt.breakdown.total
        );
        match serde_json::to_string_pretty(&receipt) {
            Ok(json) => println!("  Receipt payload:\n{json}"),
            Err(err) => println!("  Receipt payload unavailable: {err}"),
        }
    }

    if skip_permit {
        return Ok(());
    }

    println!("\nConstruction permit road fee (wallet, settles by callback)");
    service
        .register_permit(Permit {
            id: PermitId("permit-2024-001".to_string()),
            status: PermitStatus::Approved,
            road_fee_amount: Some(dec!(500)),
            road_fee_paid: false,
            road_fee_paid_at: None,
        })
        .await?;
    let road_dues = service
        .assess_dues(&FeeId("permit-2024-001-road".to_string()))
        .await?;
    render_assessment(&road_dues);

    let pending = match service
        .submit(PaymentRequest {
            target: PaymentTarget::Permit(PermitId("permit-2024-001".to_string())),
            amount: road_dues.total_due,
            method: MethodDetails::Wallet {
                account: "09171234567".to_string(),
            },
        })
        .await
    {
        Ok(view) => view,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };
    println!("- attempt {} -> {}", pending.attempt_id, pending.status);
    if let Some(url) = &pending.redirect_url {
        println!("- customer approves at {url}");
    }

    let intent_id = match store.attempt(&pending.attempt_id).await {
        Ok(Some(attempt)) => match attempt.intent_id {
            Some(intent_id) => intent_id,
            None => {
                println!("  No gateway intent was opened");
                return Ok(());
            }
        },
        Ok(None) => {
            println!("  Attempt record missing");
            return Ok(());
        }
        Err(err) => {
            println!("  Store unavailable: {err}");
            return Ok(());
        }
    };

    println!("- wallet processor approves intent {intent_id}");
    let event = match wallet.resolve(&intent_id, true).await {
        Ok(event) => event,
        Err(err) => {
            println!("  Sandbox wallet could not resolve: {err}");
            return Ok(());
        }
    };
    let settled = service.ingest_event(event).await?;
    println!("- attempt {} -> {}", settled.attempt_id, settled.status);

    let permit = service
        .permit(&PermitId("permit-2024-001".to_string()))
        .await?;
    println!(
        "- permit {} -> {} (road fee paid: {})",
        permit.id,
        permit.status.label(),
        permit.road_fee_paid
    );

    println!("\nWorker pass under the active permit");
    let pass = service
        .schedule_worker_pass(
            &PermitId("permit-2024-001".to_string()),
            "Rodel Cruz".to_string(),
        )
        .await?;
    println!(
        "- pass {} for {} -> {}",
        pass.id,
        pass.worker_name,
        pass.status.label()
    );

    Ok(())
}

fn demo_card() -> MethodDetails {
    MethodDetails::Card {
        card_number: "4111111111111111".to_string(),
        expiry: "12/27".to_string(),
        holder: "Maria Santos".to_string(),
    }
}

fn render_assessment(assessment: &FeeAssessment) {
    println!(
        "- {} owes {} (due {}, {} paid so far)",
        assessment.fee_id, assessment.amount, assessment.due_date, assessment.paid_amount
    );
    if assessment.days_overdue > 0 {
        println!(
            "- {} days overdue across {} penalty period(s) -> late fee {}",
            assessment.days_overdue, assessment.months_overdue, assessment.late_fee
        );
    } else {
        println!("- not overdue");
    }
    println!("- total due {}", assessment.total_due);
}
