//! Session and credential data models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::session as session_config;

/// Appliance address (host + API port)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL for API requests
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An authenticated session with one appliance.
///
/// This is also the on-disk format of the cached session file.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub host: String,
    pub port: u16,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "created-at")]
    pub created_at: DateTime<Utc>,
    /// Advisory only; the appliance decides when a token really expires
    #[serde(rename = "expires-at", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session for a freshly obtained token
    pub fn new(endpoint: &Endpoint, token: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            host: endpoint.host.clone(),
            port: endpoint.port,
            token: token.into(),
            cookie: None,
            username: None,
            created_at: now,
            expires_at: Some(now + Duration::hours(session_config::LIFETIME_HOURS)),
        }
    }

    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    /// Whether this session was issued by the given appliance
    pub fn is_for(&self, endpoint: &Endpoint) -> bool {
        self.host == endpoint.host && self.port == endpoint.port
    }

    /// Whether the advisory expiry time has passed
    pub fn is_past_expiry_hint(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub fn masked_token(&self) -> String {
        mask_token(Some(&self.token))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &self.masked_token())
            .field("cookie", &self.cookie.as_ref().map(|_| "****"))
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Secret half of a set of credentials
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Password exchanged for a token at login
    Password(String),
    /// Pre-issued session token, used as-is
    Token(String),
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Password(_) => write!(f, "Password(****)"),
            Secret::Token(t) => write!(f, "Token({})", mask_token(Some(t))),
        }
    }
}

/// Where a set of credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    CommandLine,
    Environment,
    Prompt,
    /// No explicit credentials; the cached session is the only option
    None,
}

/// Credentials for one invocation. Never logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub endpoint: Endpoint,
    pub username: Option<String>,
    pub secret: Option<Secret>,
    pub source: CredentialSource,
}

impl Credentials {
    /// Credentials with nothing explicit: rely on the cached session
    pub fn cached_only(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            username: None,
            secret: None,
            source: CredentialSource::None,
        }
    }

    pub fn password(endpoint: Endpoint, username: &str, password: &str) -> Self {
        Self {
            endpoint,
            username: Some(username.to_string()),
            secret: Some(Secret::Password(password.to_string())),
            source: CredentialSource::CommandLine,
        }
    }

    pub fn token(endpoint: Endpoint, token: &str) -> Self {
        Self {
            endpoint,
            username: None,
            secret: Some(Secret::Token(token.to_string())),
            source: CredentialSource::CommandLine,
        }
    }

    pub fn with_source(mut self, source: CredentialSource) -> Self {
        self.source = source;
        self
    }
}

/// Mask a token for display, keeping only its last four characters
pub fn mask_token(token: Option<&str>) -> String {
    match token {
        Some(t) if t.chars().count() >= 4 => {
            let tail: String = t.chars().skip(t.chars().count() - 4).collect();
            format!("****{}", tail)
        }
        Some(_) => "****".to_string(),
        None => "<not set>".to_string(),
    }
}
