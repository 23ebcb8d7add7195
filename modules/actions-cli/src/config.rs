use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::info;

/// Destination credentials and transport settings loaded from environment
/// variables. Credentials are optional here and only demanded by the
/// destination that needs them.
#[derive(Debug, Clone)]
pub struct Config {
    // Metronome
    pub metronome_api_token: Option<String>,

    // Personas Messaging Twilio
    pub twilio_account_id: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub profile_api_environment: Option<String>,
    pub profile_api_space_id: Option<String>,
    pub profile_api_access_token: Option<String>,

    // Transport
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let http_timeout = env::var("ACTIONS_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("ACTIONS_HTTP_TIMEOUT_SECS must be a number")?;

        Ok(Self {
            metronome_api_token: optional_env("METRONOME_API_TOKEN"),
            twilio_account_id: optional_env("TWILIO_ACCOUNT_ID"),
            twilio_auth_token: optional_env("TWILIO_AUTH_TOKEN"),
            profile_api_environment: optional_env("PROFILE_API_ENVIRONMENT"),
            profile_api_space_id: optional_env("PROFILE_API_SPACE_ID"),
            profile_api_access_token: optional_env("PROFILE_API_ACCESS_TOKEN"),
            http_timeout: Duration::from_secs(http_timeout),
        })
    }

    /// Log which settings are present, never their values.
    pub fn log_redacted(&self) {
        info!(
            metronome_api_token = self.metronome_api_token.is_some(),
            twilio_account_id = self.twilio_account_id.is_some(),
            twilio_auth_token = self.twilio_auth_token.is_some(),
            profile_api_environment = self.profile_api_environment.is_some(),
            profile_api_space_id = self.profile_api_space_id.is_some(),
            profile_api_access_token = self.profile_api_access_token.is_some(),
            http_timeout_secs = self.http_timeout.as_secs(),
            "Config loaded"
        );
    }

    pub fn metronome_settings(&self) -> Result<destination_metronome::Settings> {
        Ok(destination_metronome::Settings {
            api_token: required(&self.metronome_api_token, "METRONOME_API_TOKEN")?,
        })
    }

    pub fn twilio_settings(&self) -> Result<destination_twilio_messaging::Settings> {
        Ok(destination_twilio_messaging::Settings {
            twilio_account_id: required(&self.twilio_account_id, "TWILIO_ACCOUNT_ID")?,
            twilio_auth_token: required(&self.twilio_auth_token, "TWILIO_AUTH_TOKEN")?,
            profile_api_environment: required(
                &self.profile_api_environment,
                "PROFILE_API_ENVIRONMENT",
            )?,
            profile_api_space_id: required(&self.profile_api_space_id, "PROFILE_API_SPACE_ID")?,
            profile_api_access_token: required(
                &self.profile_api_access_token,
                "PROFILE_API_ACCESS_TOKEN",
            )?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .ok_or_else(|| anyhow!("{key} environment variable is required"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> Config {
        Config {
            metronome_api_token: None,
            twilio_account_id: None,
            twilio_auth_token: None,
            profile_api_environment: None,
            profile_api_space_id: None,
            profile_api_access_token: None,
            http_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn missing_credentials_name_the_variable() {
        let err = empty().metronome_settings().unwrap_err();
        assert!(err.to_string().contains("METRONOME_API_TOKEN"));
    }

    #[test]
    fn twilio_settings_need_every_variable() {
        let mut config = empty();
        config.twilio_account_id = Some("AC1".into());
        config.twilio_auth_token = Some("tok".into());
        let err = config.twilio_settings().unwrap_err();
        assert!(err.to_string().contains("PROFILE_API_ENVIRONMENT"));
    }

    #[test]
    fn present_token_builds_settings() {
        let mut config = empty();
        config.metronome_api_token = Some("abc".into());
        assert_eq!(config.metronome_settings().unwrap().api_token, "abc");
    }
}
