//! Appliance API client module
//!
//! Authentication, request execution, and name-to-URI resolution against the
//! ViPR/CoprHD REST API.

mod auth;
mod client;
pub mod commands;
mod credentials;
mod host;
pub mod models;
pub mod resolver;
pub mod resources;
mod response;
pub mod traits;
mod transport;

pub use auth::{AuthManager, AuthState};
pub use client::ViprClient;
pub use commands::run_command;
pub use credentials::{CredentialArgs, CredentialResolver};
pub use host::{process_env, EnvLookup, HostResolver};
pub use models::{ApiResponse, Link, NamedRelatedResource, ServiceErrorBody, TaskResource, UserInfo};
pub use resolver::{PathSegment, ResolvedUri, ResourcePath, SegmentName, UriResolver};
pub use resources::{is_opaque_id, ResourceKind};
pub use response::is_auth_rejection;
pub use traits::ApiResource;
pub use transport::{is_idempotent, HttpResponse, RetryPolicy, Transport, TransportFailure};
