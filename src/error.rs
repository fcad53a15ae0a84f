use std::fmt;

/// Stable classification of every failure the CLI can report.
///
/// Each kind owns a message prefix and a process exit code so scripts can
/// branch on the failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AuthenticationFailed,
    ResourceNotFound,
    AmbiguousResource,
    ClientError,
    ServerError,
    ProtocolError,
    TransportError,
    Cancelled,
    Config,
}

impl ErrorKind {
    /// Message prefix printed before the error details
    pub fn prefix(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "authentication failed",
            ErrorKind::ResourceNotFound => "not found",
            ErrorKind::AmbiguousResource => "ambiguous",
            ErrorKind::ClientError => "client error",
            ErrorKind::ServerError => "server error",
            ErrorKind::ProtocolError => "protocol error",
            ErrorKind::TransportError => "transport error",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Config => "configuration error",
        }
    }

    /// Process exit code for this kind
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::AuthenticationFailed => 3,
            ErrorKind::ResourceNotFound => 4,
            ErrorKind::AmbiguousResource => 5,
            ErrorKind::ClientError => 6,
            ErrorKind::ServerError => 7,
            ErrorKind::ProtocolError => 8,
            ErrorKind::TransportError => 9,
            ErrorKind::Cancelled => 130,
        }
    }
}

/// Error reported by the appliance in a non-success response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    /// HTTP method of the failed request
    pub method: String,
    /// Request path
    pub path: String,
    /// HTTP status code
    pub status: u16,
    /// Appliance service code, when the body carried one
    pub code: Option<i64>,
    /// Appliance description, verbatim
    pub message: String,
    /// Appliance details, verbatim
    pub details: Option<String>,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} returned HTTP {}", self.method, self.path, self.status)?;
        if let Some(code) = self.code {
            write!(f, " (code {})", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(details) = &self.details {
            write!(f, " - {}", details)?;
        }
        Ok(())
    }
}

/// Custom error type for appliance operations
#[derive(Debug)]
pub enum ViprError {
    /// Login rejected, token invalid, or re-authentication did not help
    AuthenticationFailed(String),
    /// A name in a resource path matched nothing in its scope
    ResourceNotFound {
        kind: String,
        name: String,
        scope: String,
    },
    /// A name in a resource path matched more than one entry in its scope
    AmbiguousResource {
        kind: String,
        name: String,
        scope: String,
        ids: Vec<String>,
    },
    /// Appliance-reported 4xx
    Client(ApiFailure),
    /// Appliance-reported 5xx
    Server(ApiFailure),
    /// Malformed or undecodable response
    Protocol(String),
    /// Network-level failure after the retry budget was spent
    Transport { attempts: u32, message: String },
    /// Interrupted by the user
    Cancelled,
    /// Usage or configuration problem detected before talking to the appliance
    Config(String),
}

impl ViprError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViprError::AuthenticationFailed(_) => ErrorKind::AuthenticationFailed,
            ViprError::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            ViprError::AmbiguousResource { .. } => ErrorKind::AmbiguousResource,
            ViprError::Client(_) => ErrorKind::ClientError,
            ViprError::Server(_) => ErrorKind::ServerError,
            ViprError::Protocol(_) => ErrorKind::ProtocolError,
            ViprError::Transport { .. } => ErrorKind::TransportError,
            ViprError::Cancelled => ErrorKind::Cancelled,
            ViprError::Config(_) => ErrorKind::Config,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// HTTP status, for errors that came from an appliance response
    pub fn status(&self) -> Option<u16> {
        match self {
            ViprError::Client(f) | ViprError::Server(f) => Some(f.status),
            _ => None,
        }
    }
}

impl fmt::Display for ViprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.kind().prefix())?;
        match self {
            ViprError::AuthenticationFailed(msg) => write!(f, "{}", msg),
            ViprError::ResourceNotFound { kind, name, scope } => {
                write!(f, "{} '{}' not found in {}", kind, name, scope)
            }
            ViprError::AmbiguousResource {
                kind,
                name,
                scope,
                ids,
            } => write!(
                f,
                "{} {}s named '{}' in {}; use an id instead: {}",
                ids.len(),
                kind,
                name,
                scope,
                ids.join(", ")
            ),
            ViprError::Client(failure) | ViprError::Server(failure) => write!(f, "{}", failure),
            ViprError::Protocol(msg) => write!(f, "{}", msg),
            ViprError::Transport { attempts, message } => {
                write!(f, "{} (after {} attempt(s))", message, attempts)
            }
            ViprError::Cancelled => write!(f, "interrupted by user"),
            ViprError::Config(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ViprError {}

impl From<serde_json::Error> for ViprError {
    fn from(err: serde_json::Error) -> Self {
        ViprError::Protocol(format!("invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for ViprError {
    fn from(err: std::io::Error) -> Self {
        ViprError::Config(err.to_string())
    }
}

/// Result type alias for appliance operations
pub type Result<T> = std::result::Result<T, ViprError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_KINDS: [ErrorKind; 9] = [
        ErrorKind::AuthenticationFailed,
        ErrorKind::ResourceNotFound,
        ErrorKind::AmbiguousResource,
        ErrorKind::ClientError,
        ErrorKind::ServerError,
        ErrorKind::ProtocolError,
        ErrorKind::TransportError,
        ErrorKind::Cancelled,
        ErrorKind::Config,
    ];

    fn failure(status: u16) -> ApiFailure {
        ApiFailure {
            method: "DELETE".to_string(),
            path: "/block/volumes/urn:storageos:Volume:1:vdc1".to_string(),
            status,
            code: Some(1008),
            message: "Unable to find entity".to_string(),
            details: None,
        }
    }

    #[test]
    fn test_exit_codes_are_distinct_and_nonzero() {
        let codes: HashSet<i32> = ALL_KINDS.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), ALL_KINDS.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes: HashSet<&str> = ALL_KINDS.iter().map(|k| k.prefix()).collect();
        assert_eq!(prefixes.len(), ALL_KINDS.len());
    }

    #[test]
    fn test_display_starts_with_prefix() {
        let err = ViprError::Transport {
            attempts: 3,
            message: "connection refused".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("transport error: "));
        assert!(text.contains("3 attempt"));
    }

    #[test]
    fn test_client_error_display_carries_context() {
        let err = ViprError::Client(failure(404));
        let text = err.to_string();
        assert!(text.starts_with("client error: "));
        assert!(text.contains("HTTP 404"));
        assert!(text.contains("code 1008"));
        assert!(text.contains("/block/volumes/"));
        assert!(text.contains("Unable to find entity"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_ambiguous_display_lists_ids() {
        let err = ViprError::AmbiguousResource {
            kind: "volume".to_string(),
            name: "vol-a".to_string(),
            scope: "project 'P1'".to_string(),
            ids: vec!["urn:a".to_string(), "urn:b".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("2 volumes named 'vol-a'"));
        assert!(text.contains("urn:a, urn:b"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ViprError>();
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ViprError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::ProtocolError);
    }

    #[test]
    fn test_server_error_kind() {
        let err = ViprError::Server(failure(500));
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.exit_code(), 7);
    }
}
