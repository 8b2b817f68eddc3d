use crate::error::CommandError;
use once_cell::sync::Lazy;
use serenity::all::{CommandInteraction, CreateCommand};
use serenity::async_trait;
use serenity::client::Context;
use std::collections::HashMap;

pub mod kick;

/// A registered slash command: a declarative descriptor plus an async handler.
#[async_trait]
pub trait SlashCommand: Send + Sync {
    /// Command name as registered with Discord.
    fn name(&self) -> &'static str;

    /// Declarative descriptor used for registration.
    fn register(&self) -> CreateCommand;

    /// Handle one invocation of the command.
    async fn execute(
        &self,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<(), CommandError>;
}

static REGISTRY: Lazy<HashMap<&'static str, Box<dyn SlashCommand>>> = Lazy::new(|| {
    let commands: Vec<Box<dyn SlashCommand>> = vec![Box::new(kick::Kick)];
    commands
        .into_iter()
        .map(|command| (command.name(), command))
        .collect()
});

/// Look up a registered command by name.
pub fn find(name: &str) -> Option<&'static dyn SlashCommand> {
    REGISTRY.get(name).map(|command| command.as_ref())
}

/// Descriptors for every registered command, in no particular order.
pub fn descriptors() -> Vec<CreateCommand> {
    REGISTRY.values().map(|command| command.register()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_resolves_kick_by_name() {
        let command = find("kick").expect("kick should be registered");
        assert_eq!(command.name(), "kick");
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        assert!(find("ban").is_none());
        assert!(find("").is_none());
    }

    #[test]
    fn one_descriptor_per_registered_command() {
        assert_eq!(descriptors().len(), REGISTRY.len());
    }
}
