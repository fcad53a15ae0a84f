/// Configuration constants for the appliance REST API
pub mod api {
    /// Header carrying the session token on every authenticated request
    pub const AUTH_TOKEN_HEADER: &str = "X-SDS-AUTH-TOKEN";

    /// Login endpoint (HTTP Basic credentials in, token header out)
    pub const LOGIN: &str = "/login";

    /// Logout endpoint
    pub const LOGOUT: &str = "/logout";

    /// Quick-validation probe for an existing token
    pub const WHOAMI: &str = "/user/whoami";

    /// Home tenant of the authenticated user
    pub const HOME_TENANT: &str = "/tenant";

    /// Tenants collection
    pub const TENANTS: &str = "/tenants";

    /// Prefix of every appliance-assigned identifier
    pub const URN_PREFIX: &str = "urn:storageos:";

    /// Content type used for request and response bodies
    pub const CONTENT_TYPE: &str = "application/json";
}

/// Configuration constants for credentials supplied through the environment
pub mod auth {
    /// Username environment variable
    pub const USERNAME_ENV_VAR: &str = "VIPR_USERNAME";

    /// Password environment variable
    pub const PASSWORD_ENV_VAR: &str = "VIPR_PASSWORD";

    /// Pre-issued token environment variable
    pub const TOKEN_ENV_VAR: &str = "VIPR_TOKEN";
}

/// Configuration constants for the appliance endpoint
pub mod host {
    /// Environment variable for the appliance host
    pub const ENV_VAR: &str = "VIPR_HOSTNAME";

    /// Environment variable for the appliance port
    pub const PORT_ENV_VAR: &str = "VIPR_PORT";
}

/// Configuration constants for the persisted session file
pub mod session {
    /// Directory name under the user's home directory
    pub const DIR_NAME: &str = ".viprctl";

    /// Session file name
    pub const FILE_NAME: &str = "session.json";

    /// Environment variable overriding the session file location
    pub const FILE_ENV_VAR: &str = "VIPR_SESSION_FILE";

    /// Hours after login before a cached session is assumed stale
    pub const LIFETIME_HOURS: i64 = 8;
}

/// Transport retry and timeout defaults
pub mod retry {
    /// Total attempts for a request that keeps failing at the transport level
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Fixed delay between attempts (milliseconds)
    pub const DELAY_MS: u64 = 500;

    /// Per-request timeout (seconds)
    pub const TIMEOUT_SECS: u64 = 30;

    /// TCP connect timeout (seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// Default values for CLI
pub mod defaults {
    /// Default appliance API port
    pub const PORT: u16 = 4443;

    /// Default log level
    pub const LOG_LEVEL: &str = "warn";
}
