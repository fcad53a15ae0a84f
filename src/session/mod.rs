//! Session state module
//!
//! Holds the session/credential data model and the per-user cache file that
//! lets one login serve many invocations.

mod models;
mod store;

pub use models::{mask_token, CredentialSource, Credentials, Endpoint, Secret, Session};
pub use store::CredentialStore;
