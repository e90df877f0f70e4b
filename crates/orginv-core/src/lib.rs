//! orginv-core: scan orchestration
//!
//! Expands the (account x region x scanner) matrix into scan units, executes
//! them on a bounded worker pool, and aggregates records and errors into a
//! single inventory per run.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod scheduler;
pub mod unit;

pub use aggregate::{Aggregator, InventoryAggregate, ScanError, ScanMetadata};
pub use config::ScanConfig;
pub use error::CoreError;
pub use orchestrator::Orchestrator;
pub use scheduler::{CancelFlag, ProgressFn, Scheduler};
pub use unit::{ScanUnit, expand_units};
