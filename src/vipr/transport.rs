//! HTTPS transport with bounded retry of transient network failures

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::config::{api, retry};
use crate::error::{Result, ViprError};
use crate::session::{Endpoint, Session};

/// Retry and timeout settings for every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::MAX_ATTEMPTS,
            delay: Duration::from_millis(retry::DELAY_MS),
            timeout: Duration::from_secs(retry::TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(retry::CONNECT_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    /// Whether a failed attempt may be repeated.
    ///
    /// Connection failures never reached the appliance, so any method may
    /// retry them. Timeouts and resets after the request went out are only
    /// retried for idempotent methods.
    pub fn allows_retry(&self, method: &Method, failure: TransportFailure) -> bool {
        match failure {
            TransportFailure::Connect => true,
            TransportFailure::InFlight => is_idempotent(method),
            TransportFailure::Fatal => false,
        }
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Stage at which a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// Nothing was sent (DNS, refused, connect timeout)
    Connect,
    /// Sent, then timed out or reset before a response arrived
    InFlight,
    /// Not transient (bad URL, TLS configuration, ...)
    Fatal,
}

impl TransportFailure {
    fn classify(err: &reqwest::Error) -> Self {
        if err.is_connect() {
            TransportFailure::Connect
        } else if err.is_timeout() || err.is_request() {
            TransportFailure::InFlight
        } else {
            TransportFailure::Fatal
        }
    }
}

/// Methods that can be repeated without duplicating side effects
pub fn is_idempotent(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

/// A complete HTTP response, body read in full
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// Low-level HTTP sender shared by authentication and request execution
pub struct Transport {
    http: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl Transport {
    /// Create a transport for an appliance endpoint
    pub fn new(endpoint: &Endpoint, policy: RetryPolicy, insecure: bool) -> Result<Self> {
        Self::build(endpoint.base_url(), policy, insecure)
    }

    /// Create a transport against an explicit base URL (mock servers, proxies)
    pub fn with_base_url(base_url: &str, policy: RetryPolicy) -> Result<Self> {
        Self::build(base_url.trim_end_matches('/').to_string(), policy, false)
    }

    fn build(base_url: String, policy: RetryPolicy, insecure: bool) -> Result<Self> {
        let http = Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.timeout)
            // Appliances ship with self-signed certificates
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|e| ViprError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            policy,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Full URL for an API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request and read its body, retrying transient transport
    /// failures within the policy.
    ///
    /// Any HTTP response (whatever its status) is returned as-is; only
    /// network-level failures become errors. A body cut short counts as an
    /// in-flight failure, so only idempotent methods repeat it.
    pub async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: &HeaderMap,
    ) -> Result<HttpResponse> {
        let url = self.url(path);
        let max_attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("{} {} (attempt {}/{})", method, path, attempt, max_attempts);

            let mut builder = self
                .http
                .request(method.clone(), &url)
                .headers(headers.clone())
                .header(ACCEPT, api::CONTENT_TYPE);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let (failure, err) = match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    match response.text().await {
                        Ok(body) => {
                            return Ok(HttpResponse {
                                status,
                                headers,
                                body,
                            })
                        }
                        Err(err) => (TransportFailure::InFlight, err),
                    }
                }
                Err(err) => (TransportFailure::classify(&err), err),
            };

            if attempt >= max_attempts || !self.policy.allows_retry(method, failure) {
                return Err(ViprError::Transport {
                    attempts: attempt,
                    message: format!("{} {}: {}", method, path, error_chain(&err)),
                });
            }

            warn!(
                "{} {} failed ({:?}): {}; retrying in {:?}",
                method,
                path,
                failure,
                error_chain(&err),
                self.policy.delay
            );
            tokio::time::sleep(self.policy.delay).await;
        }
    }
}

/// Headers authenticating a request with an established session
pub fn session_headers(session: &Session) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-sds-auth-token"),
        header_value(&session.token, "session token")?,
    );
    if let Some(cookie) = &session.cookie {
        headers.insert(COOKIE, header_value(cookie, "session cookie")?);
    }
    Ok(headers)
}

/// Headers for the HTTP Basic login exchange
pub fn basic_auth_headers(username: &str, password: &str) -> Result<HeaderMap> {
    let encoded = BASE64.encode(format!("{}:{}", username, password));
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        header_value(&format!("Basic {}", encoded), "credentials")?,
    );
    Ok(headers)
}

/// Merge caller-supplied headers over a base set
pub fn merge_headers(mut base: HeaderMap, extra: Option<&HeaderMap>) -> HeaderMap {
    if let Some(extra) = extra {
        for (name, value) in extra {
            base.insert(name.clone(), value.clone());
        }
    }
    if !base.contains_key(CONTENT_TYPE) {
        base.insert(CONTENT_TYPE, HeaderValue::from_static(api::CONTENT_TYPE));
    }
    base
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ViprError::Config(format!("The {} contains invalid characters", what)))
}

/// Render an error with its source chain ("error sending request: connection refused")
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
impl RetryPolicy {
    /// Short timeouts for mock-server tests
    pub fn fast(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            delay: Duration::from_millis(10),
            timeout: Duration::from_millis(300),
            connect_timeout: Duration::from_millis(300),
        }
    }
}
