//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod plan;
pub mod remote;
pub mod secrets;
pub mod unit;

pub use config::{InstallerConfig, OwnershipPolicy, validate_config};
pub use credentials::{CredentialResolution, GitCredentials, resolve_credentials};
pub use error::{ConfigError, InstallError, UnitError};
pub use host::{Elevation, HostContext, OsRelease};
pub use plan::{InstallLayout, InstallPlan, Source, parse_confirmation};
pub use remote::rewrite_remote_url;
pub use secrets::SecretsFile;
pub use unit::{ServiceUnit, UnitFile};
