//! Environment-provided configuration.

use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Fallback manager handle when `MANAGER_TELEGRAM` is unset.
pub const DEFAULT_MANAGER_HANDLE: &str = "@manager";

/// Which intake flow the bot runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeMode {
    /// Multi-step dialogue: name → age → workplace → citizenship.
    Guided,
    /// Single-message "City, Age" form.
    Quick,
}

impl FromStr for IntakeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guided" => Ok(Self::Guided),
            "quick" => Ok(Self::Quick),
            other => Err(format!("unknown intake mode: {other}")),
        }
    }
}

/// What `/start` does when a dialogue is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Discard in-flight answers and begin a fresh dialogue.
    Restart,
    /// Keep in-flight answers and re-prompt the current step.
    Keep,
}

impl FromStr for RestartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart" => Ok(Self::Restart),
            "keep" => Ok(Self::Keep),
            other => Err(format!("unknown restart policy: {other}")),
        }
    }
}

/// Bot configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram Bot API token.
    pub bot_token: SecretString,
    /// Path to the local lead database file.
    pub db_path: PathBuf,
    /// Manager contact handle, `@`-prefixed.
    pub manager_handle: String,
    /// Active intake flow.
    pub mode: IntakeMode,
    /// `/start` behavior mid-dialogue.
    pub restart_policy: RestartPolicy,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `TELEGRAM_BOT_TOKEN` is required; everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN".into()))?;

        let db_path = std::env::var("RECRUIT_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/recruit-intake.db"));

        let manager_handle = std::env::var("MANAGER_TELEGRAM")
            .unwrap_or_else(|_| DEFAULT_MANAGER_HANDLE.to_string());

        let mode = parse_env_or("INTAKE_MODE", IntakeMode::Guided)?;
        let restart_policy = parse_env_or("RESTART_POLICY", RestartPolicy::Restart)?;

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            db_path,
            manager_handle,
            mode,
            restart_policy,
        })
    }
}

/// Parse an optional env var, falling back to a default when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr<Err = String>,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
            key: key.into(),
            message,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_mode_parses() {
        assert_eq!("guided".parse::<IntakeMode>(), Ok(IntakeMode::Guided));
        assert_eq!(" Quick ".parse::<IntakeMode>(), Ok(IntakeMode::Quick));
        assert!("webhook".parse::<IntakeMode>().is_err());
    }

    #[test]
    fn restart_policy_parses() {
        assert_eq!("restart".parse::<RestartPolicy>(), Ok(RestartPolicy::Restart));
        assert_eq!("KEEP".parse::<RestartPolicy>(), Ok(RestartPolicy::Keep));
        assert!("reset".parse::<RestartPolicy>().is_err());
    }
}
