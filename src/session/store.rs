//! Cached session file I/O

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::session as session_config;
use crate::error::{Result, ViprError};

use super::models::Session;

/// Persists the current user's session between invocations.
///
/// One file per user. Concurrent invocations race with last-writer-wins;
/// a stale token just triggers re-authentication on next use.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Create a store at the default location (`~/.viprctl/session.json`),
    /// or wherever `VIPR_SESSION_FILE` points
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Create a store with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(session_config::FILE_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(session_config::DIR_NAME)
            .join(session_config::FILE_NAME)
    }

    /// Load the cached session. Missing or unreadable files yield `None`.
    pub fn load(&self) -> Option<Session> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No cached session at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) => {
                debug!(
                    "Loaded cached session for {}:{} (token {})",
                    session.host,
                    session.port,
                    session.masked_token()
                );
                Some(session)
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Save the session, replacing any previous one.
    /// Uses atomic write (tmp file + rename) and creates the parent dir if needed.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ViprError::Config(format!(
                    "Failed to create session directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ViprError::Config(format!("Failed to serialize session: {}", e)))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).map_err(|e| {
            ViprError::Config(format!(
                "Failed to write temp session file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        // Tokens are credentials: owner-only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                ViprError::Config(format!("Failed to set permissions on session file: {}", e))
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            ViprError::Config(format!(
                "Failed to rename temp session file to {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Remove the cached session, if any
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Removed cached session {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ViprError::Config(format!(
                "Failed to remove session file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
