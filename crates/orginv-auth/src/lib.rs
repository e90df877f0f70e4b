//! orginv-auth: organization directory and cross-account credentials
//!
//! Lists the accounts of an AWS Organization and brokers short-lived
//! per-account credentials through cross-account role assumption.

pub mod broker;
pub mod directory;
pub mod error;
pub mod sts;
pub mod types;

pub use broker::{CredentialBroker, RoleAssumer};
pub use directory::{OrgDirectory, OrganizationsDirectory};
pub use error::AuthError;
pub use sts::StsRoleAssumer;
pub use types::{Account, AccountStatus, Credentials};
