//! Endpoint resolution from multiple sources

use log::debug;

use crate::config::{defaults, host as host_config};
use crate::error::{Result, ViprError};
use crate::session::{Endpoint, Session};

/// Environment lookup, injectable so resolution is testable
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a non-empty variable from the process environment
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Appliance endpoint resolution with fallback logic
pub struct HostResolver<'a> {
    env: EnvLookup<'a>,
}

impl<'a> HostResolver<'a> {
    pub fn new(env: EnvLookup<'a>) -> Self {
        Self { env }
    }

    /// Resolve the endpoint:
    /// 1. CLI argument (`--host`, `--port`)
    /// 2. Environment (`VIPR_HOSTNAME`, `VIPR_PORT`)
    /// 3. Cached session (its port only applies when its host is used)
    /// 4. Default port
    pub fn resolve(
        &self,
        cli_host: Option<&str>,
        cli_port: Option<u16>,
        cached: Option<&Session>,
    ) -> Result<Endpoint> {
        let env_host = (self.env)(host_config::ENV_VAR);
        let (host, from_cache) = match (cli_host, env_host, cached) {
            (Some(host), _, _) => {
                debug!("Using host from CLI argument: {}", host);
                (host.to_string(), false)
            }
            (None, Some(host), _) => {
                debug!("Using host from {}: {}", host_config::ENV_VAR, host);
                (host, false)
            }
            (None, None, Some(session)) => {
                debug!("Using host from cached session: {}", session.host);
                (session.host.clone(), true)
            }
            (None, None, None) => return Err(ViprError::Config(Self::host_not_found_message())),
        };

        let host = host.trim().to_string();
        if host.is_empty() || host.contains('/') {
            return Err(ViprError::Config(format!(
                "Invalid appliance host '{}'; expected a hostname or IP address",
                host
            )));
        }

        let port = match (cli_port, self.env_port()?, cached) {
            (Some(port), _, _) => port,
            (None, Some(port), _) => port,
            (None, None, Some(session)) if from_cache => session.port,
            _ => defaults::PORT,
        };

        Ok(Endpoint::new(host, port))
    }

    fn env_port(&self) -> Result<Option<u16>> {
        match (self.env)(host_config::PORT_ENV_VAR) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<u16>().map(Some).map_err(|_| {
                ViprError::Config(format!(
                    "{} must be a port number, got '{}'",
                    host_config::PORT_ENV_VAR,
                    raw
                ))
            }),
        }
    }

    fn host_not_found_message() -> String {
        format!(
            "No appliance host given. Provide one using:\n\
             \n\
             1. CLI argument:      viprctl --host <HOST>\n\
             2. Environment var:   export {}=<HOST>\n\
             3. A previous login:  viprctl --host <HOST> login",
            host_config::ENV_VAR
        )
    }
}
