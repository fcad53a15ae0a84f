//! CLI argument parsing

mod api;
mod common;
mod delete;
mod get;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{defaults, retry, session};
use crate::vipr::RetryPolicy;

pub use api::ApiArgs;
pub use common::OutputFormat;
pub use delete::DeleteArgs;
pub use get::{GetArgs, ScopeArgs};

/// ViPR/CoprHD storage appliance CLI
#[derive(Parser, Debug)]
#[command(name = "viprctl")]
#[command(version)]
#[command(about = "Manage ViPR/CoprHD storage appliances from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Appliance host name or IP address
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Appliance API port [default: 4443]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Username to log in with
    #[arg(short = 'u', long, global = true)]
    pub username: Option<String>,

    /// Password to log in with (prefer VIPR_PASSWORD or the prompt)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Pre-issued session token
    #[arg(long, global = true, conflicts_with = "password")]
    pub token: Option<String>,

    /// Neither read nor write the cached session
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Session cache file
    #[arg(long, global = true, env = session::FILE_ENV_VAR, hide_env_values = true)]
    pub session_file: Option<PathBuf>,

    /// Accept self-signed appliance certificates
    #[arg(short = 'k', long, global = true, default_value_t = false)]
    pub insecure: bool,

    /// Batch mode: no prompts, no spinners
    #[arg(short = 'b', long, global = true, default_value_t = false)]
    pub batch: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    /// Attempts per request on network failures
    #[arg(long, global = true, default_value_t = retry::MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = retry::TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Pause between attempts in milliseconds
    #[arg(long, global = true, default_value_t = retry::DELAY_MS)]
    pub retry_delay_ms: u64,
}

impl Cli {
    /// Transport retry policy from the global flags
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries,
            delay: Duration::from_millis(self.retry_delay_ms),
            timeout: Duration::from_secs(self.timeout),
            connect_timeout: Duration::from_secs(retry::CONNECT_TIMEOUT_SECS.min(self.timeout)),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and cache the session for later commands
    Login,

    /// End the session and remove the cached copy
    Logout,

    /// Show the authenticated user
    Whoami {
        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// List resources, or show them by name
    #[command(visible_alias = "show", visible_alias = "list")]
    Get(GetArgs),

    /// Deactivate a resource
    #[command(visible_alias = "rm")]
    Delete(DeleteArgs),

    /// Send a raw authenticated request
    Api(ApiArgs),
}
