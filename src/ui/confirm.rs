//! Interactive prompts

use dialoguer::{Confirm, Input, Password};

use crate::error::{Result, ViprError};

/// Ask before a destructive operation.
///
/// `assume_yes` skips the prompt. In batch mode without `assume_yes` the
/// operation is refused rather than silently confirmed.
pub fn confirm_action(prompt: &str, assume_yes: bool, batch_mode: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if batch_mode {
        return Err(ViprError::Config(
            "Refusing to prompt in batch mode; pass --yes to confirm".to_string(),
        ));
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| prompt_error("confirmation", e))
}

/// Prompt for a username
pub fn prompt_username(batch_mode: bool) -> Result<String> {
    if batch_mode {
        return Err(ViprError::Config(
            "A username is required (--username or VIPR_USERNAME)".to_string(),
        ));
    }
    Input::<String>::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(|e| prompt_error("username", e))
}

/// Prompt for a password without echo
pub fn prompt_password(username: &str, batch_mode: bool) -> Result<String> {
    if batch_mode {
        return Err(ViprError::Config(
            "A password is required (--password or VIPR_PASSWORD)".to_string(),
        ));
    }
    Password::new()
        .with_prompt(format!("Password for {}", username))
        .interact()
        .map_err(|e| prompt_error("password", e))
}

fn prompt_error(what: &str, err: dialoguer::Error) -> ViprError {
    match err {
        dialoguer::Error::IO(e) if e.kind() == std::io::ErrorKind::Interrupted => {
            ViprError::Cancelled
        }
        other => ViprError::Config(format!("Failed to read {}: {}", what, other)),
    }
}
