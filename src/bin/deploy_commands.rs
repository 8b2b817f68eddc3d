//! Bulk-registers every command descriptor with Discord via a REST PUT.
//! Separate from the bot runtime; run it once after changing descriptors.

use doorman::{
    commands,
    config::{self, Config},
    error::{ConfigError, DiscordError},
};
use miette::Result;
use serenity::all::Command;
use serenity::http::Http;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    // Load environment variables
    config::load_dotenv();
    let config = Config::load()?;
    config.validate()?;

    let application_id = config.discord.application_id.ok_or(ConfigError::Invalid {
        field: "discord.application_id".to_string(),
        reason: "APP_ID is required to deploy commands".to_string(),
    })?;

    let http = Http::new(&config.discord.token);
    http.set_application_id(application_id.into());

    let descriptors = commands::descriptors();
    let count = descriptors.len();

    match Command::set_global_commands(&http, descriptors).await {
        Ok(_) => {
            info!("Added {count} commands");
            Ok(())
        }
        Err(source) => {
            error!("Failed to register commands: {source:?}");
            Err(DiscordError::RegistrationFailed { count, source }.into())
        }
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doorman=info,serenity=warn".into()),
        )
        .init();
}
