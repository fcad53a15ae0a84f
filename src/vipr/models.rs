//! Wire models shared by every resource

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViprError};
use crate::vipr::traits::ApiResource;

/// A successful (2xx) appliance response.
///
/// Transient: handed to the caller and never retained by the client.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// Decoded JSON body (`Null` for an empty body)
    pub body: serde_json::Value,
}

impl ApiResponse {
    /// Deserialize the body into the caller's result shape
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            ViprError::Protocol(format!(
                "unexpected response shape (HTTP {}): {}",
                self.status, e
            ))
        })
    }
}

/// Hypermedia link attached to most appliance representations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// `{id, name, link}` entry returned by every list endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRelatedResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Present on project resource listings (`volume`, `fileshare`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl NamedRelatedResource {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            resource_type: None,
            link: None,
        }
    }
}

impl ApiResource for NamedRelatedResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Error payload the appliance attaches to non-success responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub retryable: Option<bool>,
}

/// `GET /user/whoami` representation (fields the CLI shows)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub distinguished_name: Option<String>,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub vdc_roles: Vec<String>,
    #[serde(default)]
    pub home_tenant_roles: Vec<String>,
}

/// Asynchronous operation handle returned by deactivate and create calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResource {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub op_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resource: Option<NamedRelatedResource>,
}
