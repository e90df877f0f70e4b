//! orginv-scan: resource scanner contract and AWS implementations
//!
//! Defines the stateless [`Scanner`] trait, the record model scanners emit,
//! the retry policy applied around provider calls, and the built-in registry
//! of AWS resource scanners.

pub mod aws;
pub mod error;
pub mod record;
pub mod registry;
pub mod retry;
pub mod scanner;
pub mod scanners;

pub use error::{ErrorKind, ScanFailure};
pub use record::{FieldValue, GLOBAL_REGION, ResourceRecord};
pub use registry::ScannerRegistry;
pub use retry::{RetryPolicy, with_backoff};
pub use scanner::Scanner;
