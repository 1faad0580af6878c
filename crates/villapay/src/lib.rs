//! Payment lifecycle engine for a residential community: association fee
//! dues with late-penalty accrual, gateway-routed payment attempts,
//! permit road-fee settlement, worker pass admission, and receipts.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
