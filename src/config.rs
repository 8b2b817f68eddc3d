use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::{env, path::Path};

/// Main configuration for doorman
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot configuration
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token
    pub token: String,
    /// Discord application ID, required for command deployment
    pub application_id: Option<u64>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.discord.token.is_empty() {
            return Err(ConfigError::Invalid {
                field: "discord.token".to_string(),
                reason: "Discord bot token cannot be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Load configuration from environment variables and config file
    pub fn load() -> Result<Self> {
        // Try to load from file first
        let config_path = env::var("DOORMAN_CONFIG").unwrap_or_else(|_| "doorman.toml".to_string());

        if Path::new(&config_path).exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|_e| ConfigError::NotFound {
                    path: config_path.clone(),
                })?;
            let config: Config =
                toml::from_str(&contents).map_err(|e| ConfigError::ParseFailed { source: e })?;

            // Override with environment variables
            Ok(config.override_from_env())
        } else {
            // Load from environment variables only
            Ok(Self::from_env())
        }
    }

    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default().override_from_env()
    }

    /// Override config values with environment variables
    fn override_from_env(mut self) -> Self {
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Ok(app_id) = env::var("APP_ID") {
            if let Ok(id) = app_id.parse() {
                self.discord.application_id = Some(id);
            }
        }

        self
    }
}

/// Helper to load dotenv file if it exists
pub fn load_dotenv() {
    if let Ok(path) = env::var("DOTENV_PATH") {
        dotenv::from_path(&path).ok();
    } else {
        dotenv::dotenv().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_token_fails_validation() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_toml_config() {
        let config: Config = toml::from_str(
            r#"
            [discord]
            token = "abc"
            application_id = 123456789012345678
            "#,
        )
        .unwrap();

        assert_eq!(config.discord.token, "abc");
        assert_eq!(config.discord.application_id, Some(123456789012345678));
        assert!(config.validate().is_ok());
    }
}
