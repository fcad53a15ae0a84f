//! Authentication manager
//!
//! Owns the session for one invocation and moves it through
//! `Unauthenticated -> Authenticating -> Authenticated -> Expired -> ...`.
//! All transitions happen under one async lock, so a re-login triggered by
//! one request is never interleaved with another request's re-login.

use chrono::Utc;
use log::{debug, info, warn};
use reqwest::header::SET_COOKIE;
use reqwest::Method;
use tokio::sync::Mutex;

use crate::config::api;
use crate::error::{Result, ViprError};
use crate::session::{CredentialStore, Credentials, Secret, Session};
use crate::vipr::response::{classify_failure, is_auth_rejection};
use crate::vipr::transport::{basic_auth_headers, merge_headers, session_headers, Transport};

/// Lifecycle of the invocation's session
#[derive(Debug, Clone)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
    /// The appliance rejected the last session; the next use re-authenticates
    Expired,
}

pub struct AuthManager {
    credentials: Credentials,
    /// `None` when the cached session is bypassed (`--no-cache`)
    store: Option<CredentialStore>,
    state: Mutex<AuthState>,
}

impl AuthManager {
    pub fn new(credentials: Credentials, store: Option<CredentialStore>) -> Self {
        Self {
            credentials,
            store,
            state: Mutex::new(AuthState::Unauthenticated),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Snapshot of the current state
    pub async fn state(&self) -> AuthState {
        self.state.lock().await.clone()
    }

    /// Return a usable session, logging in if needed.
    ///
    /// An already-authenticated manager returns its session without any
    /// network round-trip.
    pub async fn ensure_session(&self, transport: &Transport) -> Result<Session> {
        let mut state = self.state.lock().await;
        let expired = match std::mem::replace(&mut *state, AuthState::Authenticating) {
            AuthState::Authenticated(session) => {
                *state = AuthState::Authenticated(session.clone());
                return Ok(session);
            }
            AuthState::Expired => true,
            // A leftover Authenticating means an earlier attempt was cancelled
            AuthState::Unauthenticated | AuthState::Authenticating => false,
        };

        match self.establish(transport, expired).await {
            Ok(session) => {
                debug!("Authenticated to {} (token {})", self.credentials.endpoint, session.masked_token());
                *state = AuthState::Authenticated(session.clone());
                Ok(session)
            }
            Err(e) => {
                *state = AuthState::Unauthenticated;
                Err(e)
            }
        }
    }

    /// Force the next `ensure_session` to re-authenticate
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if let AuthState::Authenticated(session) = &*state {
            self.forget_cached(session);
        }
        *state = AuthState::Expired;
    }

    /// Invalidate only if `stale` is still the current session.
    ///
    /// A request that raced with another request's re-login must not throw
    /// away the fresh session.
    pub async fn invalidate_stale(&self, stale: &Session) {
        let mut state = self.state.lock().await;
        let current = match &*state {
            AuthState::Authenticated(session) => session,
            _ => return,
        };
        if current.token != stale.token {
            debug!("Session already refreshed; keeping {}", current.masked_token());
            return;
        }
        info!("Session {} rejected by the appliance; re-authenticating", stale.masked_token());
        self.forget_cached(stale);
        *state = AuthState::Expired;
    }

    /// End the session on the appliance and clear the cached copy.
    ///
    /// Returns whether there was a session to end. The server-side logout is
    /// best effort; failures are logged.
    pub async fn logout(&self, transport: &Transport) -> Result<bool> {
        let mut state = self.state.lock().await;
        let session = match std::mem::replace(&mut *state, AuthState::Unauthenticated) {
            AuthState::Authenticated(session) => Some(session),
            _ => self.cached_session(),
        };

        if let Some(session) = &session {
            let result = match session_headers(session) {
                Ok(headers) => {
                    let headers = merge_headers(headers, None);
                    transport.send(&Method::GET, api::LOGOUT, None, &headers).await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(response) => debug!("Logout returned HTTP {}", response.status.as_u16()),
                Err(e) => warn!("Server-side logout failed: {}", e),
            }
        }

        if let Some(store) = &self.store {
            store.clear()?;
        }
        Ok(session.is_some())
    }

    /// Quick validation of a session: `true` if the appliance accepts it
    pub async fn probe(&self, transport: &Transport, session: &Session) -> Result<bool> {
        let headers = merge_headers(session_headers(session)?, None);
        let response = transport
            .send(&Method::GET, api::WHOAMI, None, &headers)
            .await?;
        let status = response.status;
        if status.is_success() {
            return Ok(true);
        }
        if is_auth_rejection(status) {
            debug!("Session {} rejected by probe (HTTP {})", session.masked_token(), status.as_u16());
            return Ok(false);
        }
        Err(classify_failure(&Method::GET, api::WHOAMI, status, &response.body))
    }

    async fn establish(&self, transport: &Transport, expired: bool) -> Result<Session> {
        let endpoint = &self.credentials.endpoint;
        match &self.credentials.secret {
            Some(Secret::Password(password)) => {
                let username = self.credentials.username.as_deref().ok_or_else(|| {
                    ViprError::Config("A username is required with a password".to_string())
                })?;
                let session = self.login(transport, username, password).await?;
                self.persist(&session);
                Ok(session)
            }
            Some(Secret::Token(token)) => {
                if expired {
                    return Err(ViprError::AuthenticationFailed(
                        "the supplied token is no longer accepted".to_string(),
                    ));
                }
                let session = Session::new(endpoint, token.clone())
                    .with_username(self.credentials.username.clone());
                if !self.probe(transport, &session).await? {
                    return Err(ViprError::AuthenticationFailed(
                        "the supplied token was rejected".to_string(),
                    ));
                }
                self.persist(&session);
                Ok(session)
            }
            None => {
                let session = self.cached_session().ok_or_else(|| {
                    ViprError::AuthenticationFailed(format!(
                        "no session for {}; run 'viprctl login' or supply credentials",
                        endpoint
                    ))
                })?;
                if self.probe(transport, &session).await? {
                    return Ok(session);
                }
                self.forget_cached(&session);
                Err(ViprError::AuthenticationFailed(format!(
                    "cached session for {} has expired; run 'viprctl login'",
                    endpoint
                )))
            }
        }
    }

    /// Exchange username/password for a session token
    async fn login(&self, transport: &Transport, username: &str, password: &str) -> Result<Session> {
        info!("Logging in to {} as '{}'", self.credentials.endpoint, username);
        let headers = merge_headers(basic_auth_headers(username, password)?, None);
        let response = transport
            .send(&Method::GET, api::LOGIN, None, &headers)
            .await?;

        let status = response.status;
        if is_auth_rejection(status) {
            return Err(ViprError::AuthenticationFailed(format!(
                "login rejected for user '{}' (HTTP {})",
                username,
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(classify_failure(&Method::GET, api::LOGIN, status, &response.body));
        }

        let token = response
            .headers
            .get(api::AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ViprError::Protocol(format!(
                    "login succeeded but no {} header was returned",
                    api::AUTH_TOKEN_HEADER
                ))
            })?;

        // Keep only "name=value" from the first cookie
        let cookie = response
            .headers
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Ok(Session::new(&self.credentials.endpoint, token)
            .with_cookie(cookie)
            .with_username(Some(username.to_string())))
    }

    /// Cached session for this endpoint, unless past its expiry hint
    fn cached_session(&self) -> Option<Session> {
        let session = self.store.as_ref()?.load()?;
        if !session.is_for(&self.credentials.endpoint) {
            debug!("Cached session is for {}, not {}", session.endpoint(), self.credentials.endpoint);
            return None;
        }
        if session.is_past_expiry_hint(Utc::now()) {
            debug!("Cached session {} is past its expiry hint", session.masked_token());
            return None;
        }
        Some(session)
    }

    fn persist(&self, session: &Session) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(session) {
                warn!("Could not cache session: {}", e);
            }
        }
    }

    /// Drop the cached copy if it holds this session's token
    fn forget_cached(&self, session: &Session) {
        let Some(store) = &self.store else {
            return;
        };
        if store.load().is_some_and(|cached| cached.token == session.token) {
            if let Err(e) = store.clear() {
                warn!("Could not clear cached session: {}", e);
            }
        }
    }
}
