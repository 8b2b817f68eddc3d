use crate::commands;
use crate::config::Config;
use crate::error::{CommandError, DiscordError, Result};
use serenity::all::{
    ActivityData, CommandInteraction, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, Interaction, OnlineStatus,
};
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info};

/// Discord bot event handler
pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            "Logged in as: {} in {} servers",
            ready.user.name,
            ready.guilds.len()
        );

        ctx.set_presence(
            Some(ActivityData::listening("knee cracks")),
            OnlineStatus::DoNotDisturb,
        );
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            dispatch(&ctx, &command).await;
        }
    }
}

async fn dispatch(ctx: &Context, interaction: &CommandInteraction) {
    // Unknown command names are a deliberate no-op; they may belong to a
    // stale registration.
    let Some(command) = commands::find(&interaction.data.name) else {
        return;
    };

    info!(
        "Received slash command: {} from user {}",
        interaction.data.name, interaction.user.name
    );

    if let Err(e) = command.execute(ctx, interaction).await {
        report_failure(ctx, interaction, &e).await;
    }
}

/// Catch-all for handler failures: reply to the invoker with an ephemeral
/// warning carrying the error message. If even that reply fails, log and
/// give up.
async fn report_failure(ctx: &Context, interaction: &CommandInteraction, error: &CommandError) {
    error!("Command '{}' failed: {error:?}", interaction.data.name);

    let description = format!(
        ":warning: An error occured while trying to run this command:\n```{error}```"
    );
    let message = CreateInteractionResponseMessage::new()
        .embed(CreateEmbed::new().description(description))
        .ephemeral(true);

    if let Err(why) = interaction
        .create_response(&ctx.http, CreateInteractionResponse::Message(message))
        .await
    {
        error!("Failed to deliver command failure notice: {why:?}");
    }
}

/// Create the Discord client (without starting it)
pub async fn create_client(config: &Config) -> Result<Client> {
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::GUILD_MODERATION;

    let mut builder = Client::builder(&config.discord.token, intents).event_handler(Handler);
    if let Some(application_id) = config.discord.application_id {
        builder = builder.application_id(application_id.into());
    }

    builder
        .await
        .map_err(|source| DiscordError::ConnectionFailed { source }.into())
}

/// Create and run the Discord bot until the gateway connection ends.
pub async fn run(config: &Config) -> Result<()> {
    let mut client = create_client(config).await?;

    info!("Starting Discord bot...");
    client
        .start()
        .await
        .map_err(|source| DiscordError::ConnectionFailed { source })?;

    Ok(())
}
