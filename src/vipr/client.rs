//! Request executor
//!
//! Every authenticated call goes through [`ViprClient::execute`]: it makes sure
//! a session exists, sends the request with bounded transport retry, and
//! normalizes the response. An authorization failure triggers exactly one
//! re-login and one resend.

use log::{debug, info};
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::{Result, ViprError};
use crate::session::{CredentialStore, Credentials, Endpoint, Session};
use crate::vipr::auth::AuthManager;
use crate::vipr::response::{is_auth_rejection, normalize};
use crate::vipr::transport::{merge_headers, session_headers, HttpResponse, RetryPolicy, Transport};
use crate::vipr::models::ApiResponse;

/// Appliance API client
pub struct ViprClient {
    transport: Transport,
    auth: AuthManager,
    /// Batch mode - disables interactive prompts
    batch_mode: bool,
}

impl ViprClient {
    /// Create a client for the credentials' endpoint
    pub fn new(
        credentials: Credentials,
        store: Option<CredentialStore>,
        policy: RetryPolicy,
        insecure: bool,
    ) -> Result<Self> {
        let transport = Transport::new(&credentials.endpoint, policy, insecure)?;
        Ok(Self {
            transport,
            auth: AuthManager::new(credentials, store),
            batch_mode: false,
        })
    }

    /// Create a client with custom base URL (mock servers, proxies)
    pub fn with_base_url(
        base_url: &str,
        credentials: Credentials,
        store: Option<CredentialStore>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            transport: Transport::with_base_url(base_url, policy)?,
            auth: AuthManager::new(credentials, store),
            batch_mode: false,
        })
    }

    /// Set batch mode (no prompts, no spinners)
    pub fn set_batch_mode(&mut self, batch: bool) {
        self.batch_mode = batch;
    }

    pub fn is_batch_mode(&self) -> bool {
        self.batch_mode
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.auth.credentials().endpoint
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Obtain (or reuse) the session without issuing a request
    pub async fn ensure_session(&self) -> Result<Session> {
        self.auth.ensure_session(&self.transport).await
    }

    /// End the session and clear the cached copy
    pub async fn logout(&self) -> Result<bool> {
        self.auth.logout(&self.transport).await
    }

    /// Force re-authentication on the next request
    pub async fn invalidate(&self) {
        self.auth.invalidate().await
    }

    /// Execute an authenticated request.
    ///
    /// 2xx returns the decoded response. 401/403 re-authenticates once and
    /// resends; a second rejection is `AuthenticationFailed`. Other 4xx/5xx
    /// are returned as `Client`/`Server` errors without retry.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<&HeaderMap>,
    ) -> Result<ApiResponse> {
        let session = self.ensure_session().await?;
        let response = self.send(&method, path, body, headers, &session).await?;
        if !is_auth_rejection(response.status) {
            return normalize(&method, path, response);
        }

        info!(
            "{} {} returned HTTP {}; renewing session",
            method,
            path,
            response.status.as_u16()
        );

        self.auth.invalidate_stale(&session).await;
        let session = self.ensure_session().await?;
        let response = self.send(&method, path, body, headers, &session).await?;
        if is_auth_rejection(response.status) {
            return Err(ViprError::AuthenticationFailed(format!(
                "{} {} was rejected with HTTP {} after re-authentication",
                method,
                path,
                response.status.as_u16()
            )));
        }
        normalize(&method, path, response)
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<&HeaderMap>,
        session: &Session,
    ) -> Result<HttpResponse> {
        let headers = merge_headers(session_headers(session)?, headers);
        self.transport.send(method, path, body, &headers).await
    }

    /// Execute a request and deserialize the body
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        self.execute(method, path, body, None).await?.json()
    }

    /// GET a path and deserialize the body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("Fetching {}", path);
        self.execute_json(Method::GET, path, None).await
    }
}

/// Client for mock-server tests: password login as root/secret, no cache
#[cfg(test)]
pub(crate) fn test_client(base_url: &str) -> ViprClient {
    ViprClient::with_base_url(
        base_url,
        Credentials::password(Endpoint::new("vipr.example.com", 4443), "root", "secret"),
        None,
        RetryPolicy::fast(3),
    )
    .unwrap()
}
