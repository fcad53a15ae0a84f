//! Credential resolution from multiple sources

use log::debug;

use crate::config::auth;
use crate::error::{Result, ViprError};
use crate::session::{CredentialSource, Credentials, Endpoint, Secret};
use crate::vipr::host::EnvLookup;

/// Credentials given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialArgs<'a> {
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub token: Option<&'a str>,
}

/// Credential resolution with fallback logic
pub struct CredentialResolver<'a> {
    env: EnvLookup<'a>,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(env: EnvLookup<'a>) -> Self {
        Self { env }
    }

    /// Resolve credentials, first source wins:
    /// 1. CLI arguments (`--token`, or `--username`/`--password`)
    /// 2. Environment (`VIPR_TOKEN`, or `VIPR_USERNAME` + `VIPR_PASSWORD`)
    /// 3. Nothing explicit: the cached session is used
    ///
    /// A username with no password anywhere yields credentials without a
    /// secret; the caller decides whether to prompt.
    pub fn resolve(&self, endpoint: Endpoint, args: CredentialArgs<'_>) -> Result<Credentials> {
        let env_username = (self.env)(auth::USERNAME_ENV_VAR);
        let env_password = (self.env)(auth::PASSWORD_ENV_VAR);

        if let Some(token) = args.token {
            if args.password.is_some() {
                return Err(ViprError::Config(
                    "Use either --token or --password, not both".to_string(),
                ));
            }
            debug!("Using token from CLI argument");
            return Ok(Credentials::token(endpoint, token));
        }

        if args.username.is_some() || args.password.is_some() {
            let username = args
                .username
                .map(str::to_string)
                .or(env_username)
                .ok_or_else(|| {
                    ViprError::Config(format!(
                        "--password needs a username (--username or {})",
                        auth::USERNAME_ENV_VAR
                    ))
                })?;
            let password = args.password.map(str::to_string).or(env_password);
            debug!("Using username '{}' from CLI arguments", username);
            return Ok(Credentials {
                endpoint,
                username: Some(username),
                secret: password.map(Secret::Password),
                source: CredentialSource::CommandLine,
            });
        }

        if let Some(token) = (self.env)(auth::TOKEN_ENV_VAR) {
            debug!("Using token from {}", auth::TOKEN_ENV_VAR);
            return Ok(Credentials::token(endpoint, &token).with_source(CredentialSource::Environment));
        }

        match (env_username, env_password) {
            (Some(username), Some(password)) => {
                debug!("Using credentials from {}/{}", auth::USERNAME_ENV_VAR, auth::PASSWORD_ENV_VAR);
                Ok(Credentials::password(endpoint, &username, &password)
                    .with_source(CredentialSource::Environment))
            }
            (Some(username), None) => Ok(Credentials {
                endpoint,
                username: Some(username),
                secret: None,
                source: CredentialSource::Environment,
            }),
            _ => {
                debug!("No explicit credentials; relying on the cached session");
                Ok(Credentials::cached_only(endpoint))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn endpoint() -> Endpoint {
        Endpoint::new("vipr.example.com", 4443)
    }

    #[test]
    fn test_cli_password_beats_env_token() {
        let lookup = env(&[(auth::TOKEN_ENV_VAR, "env-tok")]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(
                endpoint(),
                CredentialArgs {
                    username: Some("root"),
                    password: Some("pw"),
                    token: None,
                },
            )
            .unwrap();
        assert_eq!(creds.secret, Some(Secret::Password("pw".to_string())));
        assert_eq!(creds.source, CredentialSource::CommandLine);
    }

    #[test]
    fn test_cli_token() {
        let lookup = env(&[]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(
                endpoint(),
                CredentialArgs {
                    token: Some("cli-tok"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(creds.secret, Some(Secret::Token("cli-tok".to_string())));
    }

    #[test]
    fn test_token_and_password_conflict() {
        let lookup = env(&[]);
        let err = CredentialResolver::new(&lookup)
            .resolve(
                endpoint(),
                CredentialArgs {
                    username: Some("root"),
                    password: Some("pw"),
                    token: Some("tok"),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
    }

    #[test]
    fn test_cli_username_takes_env_password() {
        let lookup = env(&[(auth::PASSWORD_ENV_VAR, "env-pw")]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(
                endpoint(),
                CredentialArgs {
                    username: Some("root"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(creds.secret, Some(Secret::Password("env-pw".to_string())));
    }

    #[test]
    fn test_username_without_password_has_no_secret() {
        let lookup = env(&[]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(
                endpoint(),
                CredentialArgs {
                    username: Some("root"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(creds.username.as_deref(), Some("root"));
        assert!(creds.secret.is_none());
    }

    #[test]
    fn test_password_without_username() {
        let lookup = env(&[]);
        let err = CredentialResolver::new(&lookup)
            .resolve(
                endpoint(),
                CredentialArgs {
                    password: Some("pw"),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ViprError::Config(_)));
    }

    #[test]
    fn test_env_credentials() {
        let lookup = env(&[
            (auth::USERNAME_ENV_VAR, "svc"),
            (auth::PASSWORD_ENV_VAR, "pw"),
        ]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(endpoint(), CredentialArgs::default())
            .unwrap();
        assert_eq!(creds.username.as_deref(), Some("svc"));
        assert_eq!(creds.source, CredentialSource::Environment);
    }

    #[test]
    fn test_env_token_beats_env_password() {
        let lookup = env(&[
            (auth::TOKEN_ENV_VAR, "env-tok"),
            (auth::USERNAME_ENV_VAR, "svc"),
            (auth::PASSWORD_ENV_VAR, "pw"),
        ]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(endpoint(), CredentialArgs::default())
            .unwrap();
        assert_eq!(creds.secret, Some(Secret::Token("env-tok".to_string())));
    }

    #[test]
    fn test_nothing_explicit_uses_cache() {
        let lookup = env(&[]);
        let creds = CredentialResolver::new(&lookup)
            .resolve(endpoint(), CredentialArgs::default())
            .unwrap();
        assert_eq!(creds, Credentials::cached_only(endpoint()));
    }
}
