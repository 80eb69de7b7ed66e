//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"FVR_GITHUB_TOKEN"`).
//! - Callers invoke [`resolve_secrets`] once at startup and pass the result
//!   into client constructors; never scatter `std::env::var` calls.
//! - `Debug` impls **redact** values.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! # Enforcement
//! - Zoltar username + password are **required**: the canonical snapshot
//!   cannot be downloaded anonymously.
//! - The GitHub token is optional (anonymous access is rate-limited but works).

use anyhow::{bail, Result};
use serde_json::Value;

use crate::settings::read_str_at;

pub const DEFAULT_GITHUB_TOKEN_ENV: &str = "FVR_GITHUB_TOKEN";
pub const DEFAULT_ZOLTAR_USERNAME_ENV: &str = "Z_USERNAME";
pub const DEFAULT_ZOLTAR_PASSWORD_ENV: &str = "Z_PASSWORD";

/// All runtime-resolved secrets for one reconciliation run.
#[derive(Clone)]
pub struct ResolvedSecrets {
    pub github_token: Option<String>,
    pub zoltar_username: String,
    pub zoltar_password: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "github_token",
                &self.github_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("zoltar_username", &self.zoltar_username)
            .field("zoltar_password", &"<REDACTED>")
            .finish()
    }
}

struct SecretEnvNames {
    github_token_var: String,
    zoltar_username_var: String,
    zoltar_password_var: String,
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        github_token_var: read_str_at(config_json, "/github/token_env")
            .unwrap_or_else(|| DEFAULT_GITHUB_TOKEN_ENV.to_string()),
        zoltar_username_var: read_str_at(config_json, "/zoltar/username_env")
            .unwrap_or_else(|| DEFAULT_ZOLTAR_USERNAME_ENV.to_string()),
        zoltar_password_var: read_str_at(config_json, "/zoltar/password_env")
            .unwrap_or_else(|| DEFAULT_ZOLTAR_PASSWORD_ENV.to_string()),
    }
}

/// Unset and blank are both treated as absent.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve all secrets from the environment.
///
/// # Errors
/// Returns `Err` naming the **env var** of the first missing required value.
pub fn resolve_secrets(config_json: &Value) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let Some(zoltar_username) = resolve_env(&names.zoltar_username_var) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (zoltar username) is not set or empty",
            names.zoltar_username_var
        );
    };
    let Some(zoltar_password) = resolve_env(&names.zoltar_password_var) else {
        bail!(
            "SECRETS_MISSING: required env var '{}' (zoltar password) is not set or empty",
            names.zoltar_password_var
        );
    };

    Ok(ResolvedSecrets {
        github_token: resolve_env(&names.github_token_var),
        zoltar_username,
        zoltar_password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_values() {
        let s = ResolvedSecrets {
            github_token: Some("ghp_supersecretvalue".to_string()),
            zoltar_username: "forecaster".to_string(),
            zoltar_password: "hunter22".to_string(),
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("supersecret"));
        assert!(!dbg.contains("hunter22"));
        assert!(dbg.contains("forecaster"));
    }

    #[test]
    fn env_names_fall_back_to_defaults() {
        let names = parse_env_names(&serde_json::json!({}));
        assert_eq!(names.github_token_var, DEFAULT_GITHUB_TOKEN_ENV);
        assert_eq!(names.zoltar_username_var, DEFAULT_ZOLTAR_USERNAME_ENV);
        assert_eq!(names.zoltar_password_var, DEFAULT_ZOLTAR_PASSWORD_ENV);
    }
}
