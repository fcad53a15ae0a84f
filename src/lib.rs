//! viprctl - Manage ViPR/CoprHD storage appliances
//!
//! The core of a command-line client for the appliance REST API.
//!
//! # Features
//!
//! - Log in once and reuse the cached session across invocations
//! - Transparent re-authentication when the appliance drops a session
//! - Address resources by name (`tenant / project / volume`) instead of URN
//! - Bounded retry on network failures, never on server errors
//! - Multiple output formats (table, CSV, JSON, YAML)
//!
//! # Example
//!
//! ```bash
//! # Log in and cache the session
//! viprctl --host vipr1.example.com -u root login
//!
//! # List volumes in a project of the home tenant
//! viprctl get volume --project P1
//!
//! # Show two volumes by name
//! viprctl get volume vol-a vol-b --project P1 -o json
//!
//! # Deactivate a volume
//! viprctl delete volume vol-a --project P1 -y
//!
//! # Raw request
//! viprctl api get /vdc/varrays
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod session;
pub mod ui;
pub mod vipr;

pub use cli::{ApiArgs, Cli, Command, DeleteArgs, GetArgs, OutputFormat, ScopeArgs};
pub use error::{ErrorKind, Result, ViprError};
pub use session::{CredentialStore, Credentials, Endpoint, Secret, Session};
pub use vipr::{
    run_command, AuthManager, HostResolver, ResolvedUri, ResourceKind, ResourcePath,
    RetryPolicy, UriResolver, ViprClient,
};
