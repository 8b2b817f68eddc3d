//! Bulk kick command: parse mentioned users, confirm with the invoker, then
//! remove the members one at a time while live-updating a progress embed.

use crate::commands::SlashCommand;
use crate::error::CommandError;
use futures::future;
use once_cell::sync::Lazy;
use regex::Regex;
use serenity::all::{
    ButtonStyle, CommandInteraction, CommandOptionType, ComponentInteractionCollector,
    CreateActionRow, CreateButton, CreateCommand, CreateCommandOption, CreateEmbed,
    CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseMessage,
    EditInteractionResponse, Mentionable, Permissions, UserId,
};
use serenity::async_trait;
use serenity::client::Context;
use std::future::Future;
use std::num::NonZeroU64;
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// How long the confirmation prompt stays interactive.
const CONFIRMATION_WINDOW: Duration = Duration::from_secs(60);

/// Strict user mention: `<@` followed by a snowflake of at least 18 digits.
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@(\d{18,})>$").unwrap());

/// Extract candidate user IDs from free-form input. Tokens that don't match
/// the mention pattern are dropped silently; duplicates are kept and collapse
/// later when the kick queue is built.
pub fn parse_mentions(input: &str) -> Vec<UserId> {
    input
        .split_whitespace()
        .filter_map(|token| MENTION.captures(token))
        .filter_map(|caps| caps[1].parse::<NonZeroU64>().ok())
        .map(|id| UserId::new(id.get()))
        .collect()
}

/// A mentioned user confirmed to be a member of the invoking guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KickTarget {
    pub id: UserId,
    /// Mention-form handle used in every rendered message.
    pub handle: String,
}

/// Resolve candidate IDs against the guild roster. Fetches run concurrently
/// and all must settle before this returns; IDs with no membership record
/// are dropped without error.
pub async fn resolve_targets<F, Fut>(
    candidates: Vec<UserId>,
    fetch: F,
) -> Result<Vec<KickTarget>, CommandError>
where
    F: Fn(UserId) -> Fut,
    Fut: Future<Output = Option<KickTarget>>,
{
    let fetched = future::join_all(candidates.into_iter().map(fetch)).await;
    let targets: Vec<KickTarget> = fetched.into_iter().flatten().collect();

    if targets.is_empty() {
        return Err(CommandError::NoValidTargets);
    }
    Ok(targets)
}

/// Terminal states of the confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Confirmed,
    Cancelled,
    TimedOut,
}

/// Decide whether a button press resolves the gate. Presses from anyone but
/// the requester, and unknown component IDs, leave the gate waiting.
pub fn gate_response(requester: UserId, responder: UserId, component_id: &str) -> Option<GateOutcome> {
    if responder != requester {
        return None;
    }
    match component_id {
        "confirm" => Some(GateOutcome::Confirmed),
        "cancel" => Some(GateOutcome::Cancelled),
        _ => None,
    }
}

/// Per-member progress through the kick sequence. Outcomes only move forward
/// from `NotStarted`; a recorded result is never overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickOutcome {
    NotStarted,
    Succeeded,
    Failed,
}

fn outcome_marker(outcome: KickOutcome) -> &'static str {
    match outcome {
        KickOutcome::NotStarted => ":black_large_square:",
        KickOutcome::Succeeded => ":green_square:",
        KickOutcome::Failed => ":red_square:",
    }
}

/// Ordered association list of members to kick and their outcomes, keyed by
/// member id. Owned by one invocation's executor; insertion order is
/// resolution order and never changes.
#[derive(Debug)]
pub struct KickQueue {
    entries: Vec<(KickTarget, KickOutcome)>,
}

impl KickQueue {
    /// Build the queue from resolved targets. Duplicate IDs collapse onto
    /// their first occurrence.
    pub fn new(targets: Vec<KickTarget>) -> Self {
        let mut entries: Vec<(KickTarget, KickOutcome)> = Vec::with_capacity(targets.len());
        for target in targets {
            if entries.iter().all(|(existing, _)| existing.id != target.id) {
                entries.push((target, KickOutcome::NotStarted));
            }
        }
        Self { entries }
    }

    /// Member IDs in processing order.
    pub fn ids(&self) -> Vec<UserId> {
        self.entries.iter().map(|(target, _)| target.id).collect()
    }

    /// Record a member's result. Ignored if the member already has a
    /// terminal outcome or is not in the queue.
    pub fn record(&mut self, id: UserId, outcome: KickOutcome) {
        if let Some((_, current)) = self.entries.iter_mut().find(|(target, _)| target.id == id) {
            if *current == KickOutcome::NotStarted {
                *current = outcome;
            }
        }
    }

    /// Render the progress display: one marker-prefixed line per member, in
    /// insertion order. Pure; callers push the string to Discord.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(target, outcome)| format!("{} {}", outcome_marker(*outcome), target.handle))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of members kicked successfully so far.
    pub fn succeeded(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| *outcome == KickOutcome::Succeeded)
            .count()
    }
}

pub struct Kick;

#[async_trait]
impl SlashCommand for Kick {
    fn name(&self) -> &'static str {
        "kick"
    }

    fn register(&self) -> CreateCommand {
        CreateCommand::new(self.name())
            .description("Kick a single user or multiple users delimited with a space")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    "user",
                    "Target users to kick delimited with a space",
                )
                .required(true),
            )
            .add_option(CreateCommandOption::new(
                CommandOptionType::String,
                "reason",
                "Kick reason message",
            ))
            .default_member_permissions(Permissions::KICK_MEMBERS)
    }

    async fn execute(
        &self,
        ctx: &Context,
        interaction: &CommandInteraction,
    ) -> Result<(), CommandError> {
        let Some(guild_id) = interaction.guild_id else {
            return Ok(());
        };

        let raw_users = interaction
            .data
            .options
            .iter()
            .find(|option| option.name == "user")
            .and_then(|option| option.value.as_str())
            .ok_or(CommandError::InvalidOption { name: "user" })?;

        let reason = interaction
            .data
            .options
            .iter()
            .find(|option| option.name == "reason")
            .and_then(|option| option.value.as_str());

        let candidates = parse_mentions(raw_users);
        let targets = resolve_targets(candidates, |id| {
            let http = ctx.http.clone();
            async move {
                guild_id.member(&http, id).await.ok().map(|member| KickTarget {
                    id,
                    handle: member.user.mention().to_string(),
                })
            }
        })
        .await?;

        // Confirmation prompt with the full target list.
        let prompt = CreateEmbed::new()
            .title("Kick members?")
            .description(
                targets
                    .iter()
                    .map(|target| format!("- {}", target.handle))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
            .footer(CreateEmbedFooter::new(
                "If there are any missing members, make sure that the input is correct and try again",
            ));
        let buttons = CreateActionRow::Buttons(vec![
            CreateButton::new("confirm")
                .label("Kick")
                .style(ButtonStyle::Danger),
            CreateButton::new("cancel")
                .label("Cancel")
                .style(ButtonStyle::Secondary),
        ]);

        interaction
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .embed(prompt)
                        .components(vec![buttons]),
                ),
            )
            .await?;
        let message = interaction.get_response(&ctx.http).await?;

        // One fixed wait window from when the prompt was shown. Presses that
        // don't resolve the gate are discarded and waiting resumes on the
        // remainder of the same window.
        let deadline = Instant::now() + CONFIRMATION_WINDOW;
        let outcome = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break GateOutcome::TimedOut;
            }

            let Some(press) = ComponentInteractionCollector::new(&ctx.shard)
                .message_id(message.id)
                .timeout(remaining)
                .await
            else {
                break GateOutcome::TimedOut;
            };

            if let Some(outcome) =
                gate_response(interaction.user.id, press.user.id, &press.data.custom_id)
            {
                press
                    .create_response(&ctx.http, CreateInteractionResponse::Acknowledge)
                    .await?;
                break outcome;
            }
        };

        match outcome {
            GateOutcome::Confirmed => {
                self.kick_members(ctx, interaction, guild_id, targets, reason)
                    .await
            }
            GateOutcome::Cancelled => {
                let edit = EditInteractionResponse::new()
                    .embed(
                        CreateEmbed::new().description(":white_check_mark: Cancelled kick command"),
                    )
                    .components(vec![]);
                interaction.edit_response(&ctx.http, edit).await?;
                Ok(())
            }
            GateOutcome::TimedOut => {
                let edit = EditInteractionResponse::new()
                    .embed(CreateEmbed::new().description(
                        ":hourglass: No response within 60 seconds, cancelled kick command",
                    ))
                    .components(vec![]);
                interaction.edit_response(&ctx.http, edit).await?;
                Ok(())
            }
        }
    }
}

impl Kick {
    /// Kick the queued members strictly one at a time, refreshing the
    /// progress embed after every member so the display tracks true
    /// progress. A failed kick is recorded and logged, never fatal.
    async fn kick_members(
        &self,
        ctx: &Context,
        interaction: &CommandInteraction,
        guild_id: serenity::all::GuildId,
        targets: Vec<KickTarget>,
        reason: Option<&str>,
    ) -> Result<(), CommandError> {
        let mut queue = KickQueue::new(targets);

        let progress = |queue: &KickQueue| {
            EditInteractionResponse::new()
                .embed(
                    CreateEmbed::new()
                        .title("Kicking members")
                        .description(queue.render()),
                )
                .components(vec![])
        };

        interaction.edit_response(&ctx.http, progress(&queue)).await?;

        for id in queue.ids() {
            let result = match reason {
                Some(reason) => guild_id.kick_with_reason(&ctx.http, id, reason).await,
                None => guild_id.kick(&ctx.http, id).await,
            };

            match result {
                Ok(()) => queue.record(id, KickOutcome::Succeeded),
                Err(e) => {
                    warn!("Failed to kick user {id}: {e:?}");
                    queue.record(id, KickOutcome::Failed);
                }
            }

            interaction.edit_response(&ctx.http, progress(&queue)).await?;
        }

        let summary = EditInteractionResponse::new()
            .embed(CreateEmbed::new().title("Kicked members").description(format!(
                ":white_check_mark: Successfully kicked {} members",
                queue.succeeded()
            )))
            .components(vec![]);
        interaction.edit_response(&ctx.http, summary).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn target(id: u64) -> KickTarget {
        KickTarget {
            id: UserId::new(id),
            handle: format!("<@{id}>"),
        }
    }

    #[test]
    fn parses_well_formed_mentions_and_drops_the_rest() {
        let input = "<@123456789012345678> <@987654321098765432> notAMention";
        let ids = parse_mentions(input);
        assert_eq!(
            ids,
            vec![
                UserId::new(123456789012345678),
                UserId::new(987654321098765432)
            ]
        );
    }

    #[test]
    fn rejects_short_ids_and_malformed_tokens() {
        assert!(parse_mentions("<@12345>").is_empty());
        assert!(parse_mentions("<@abc>").is_empty());
        assert!(parse_mentions("<@123456789012345678").is_empty());
        assert!(parse_mentions("123456789012345678").is_empty());
        assert!(parse_mentions("").is_empty());
        assert!(parse_mentions("   ").is_empty());
    }

    #[test]
    fn rejects_all_zero_snowflakes() {
        // Matches the mention pattern but is not a constructible user id.
        assert!(parse_mentions("<@000000000000000000>").is_empty());
        assert_eq!(
            parse_mentions("<@000000000000000000> <@123456789012345678>"),
            vec![UserId::new(123456789012345678)]
        );
    }

    #[test]
    fn keeps_duplicates_at_parse_time() {
        let ids = parse_mentions("<@123456789012345678> <@123456789012345678>");
        assert_eq!(ids.len(), 2);
    }

    #[tokio::test]
    async fn resolution_drops_ids_absent_from_the_roster() {
        let roster: HashSet<u64> =
            [123456789012345678, 987654321098765432].into_iter().collect();
        let candidates = vec![
            UserId::new(123456789012345678),
            UserId::new(555555555555555555),
            UserId::new(987654321098765432),
        ];

        let targets = resolve_targets(candidates, |id| {
            let roster = roster.clone();
            async move { roster.contains(&id.get()).then(|| target(id.get())) }
        })
        .await
        .unwrap();

        assert_eq!(targets, vec![target(123456789012345678), target(987654321098765432)]);
    }

    #[tokio::test]
    async fn resolution_fails_when_nothing_resolves() {
        let candidates = vec![UserId::new(123456789012345678)];
        let result = resolve_targets(candidates, |_| async move { None }).await;
        assert!(matches!(result, Err(CommandError::NoValidTargets)));
    }

    #[tokio::test]
    async fn resolution_of_empty_candidate_set_fails() {
        let result = resolve_targets(vec![], |id| async move { Some(target(id.get())) }).await;
        assert!(matches!(result, Err(CommandError::NoValidTargets)));
    }

    #[test]
    fn gate_ignores_other_users() {
        let requester = UserId::new(111111111111111111);
        let stranger = UserId::new(222222222222222222);
        assert_eq!(gate_response(requester, stranger, "confirm"), None);
        assert_eq!(gate_response(requester, stranger, "cancel"), None);
    }

    #[test]
    fn gate_resolves_only_on_known_components_from_the_requester() {
        let requester = UserId::new(111111111111111111);
        assert_eq!(
            gate_response(requester, requester, "confirm"),
            Some(GateOutcome::Confirmed)
        );
        assert_eq!(
            gate_response(requester, requester, "cancel"),
            Some(GateOutcome::Cancelled)
        );
        assert_eq!(gate_response(requester, requester, "something_else"), None);
    }

    #[test]
    fn queue_collapses_duplicate_ids_on_first_insertion() {
        let queue = KickQueue::new(vec![target(1000000000000000001), target(1000000000000000001)]);
        assert_eq!(queue.ids(), vec![UserId::new(1000000000000000001)]);
    }

    #[test]
    fn queue_preserves_resolution_order() {
        let queue = KickQueue::new(vec![
            target(1000000000000000003),
            target(1000000000000000001),
            target(1000000000000000002),
        ]);
        assert_eq!(
            queue.ids(),
            vec![
                UserId::new(1000000000000000003),
                UserId::new(1000000000000000001),
                UserId::new(1000000000000000002),
            ]
        );
    }

    #[test]
    fn outcomes_never_move_backward() {
        let mut queue = KickQueue::new(vec![target(1000000000000000001)]);
        queue.record(UserId::new(1000000000000000001), KickOutcome::Succeeded);
        queue.record(UserId::new(1000000000000000001), KickOutcome::Failed);
        assert_eq!(queue.succeeded(), 1);
        assert!(queue.render().starts_with(":green_square:"));
    }

    #[test]
    fn render_is_pure_and_ordered() {
        let mut queue = KickQueue::new(vec![target(1000000000000000001), target(1000000000000000002)]);
        queue.record(UserId::new(1000000000000000001), KickOutcome::Succeeded);

        let first = queue.render();
        let second = queue.render();
        assert_eq!(first, second);
        assert_eq!(
            first,
            ":green_square: <@1000000000000000001>\n:black_large_square: <@1000000000000000002>"
        );
    }

    #[test]
    fn first_succeeds_second_fails_counts_one() {
        let mut queue = KickQueue::new(vec![target(1000000000000000001), target(1000000000000000002)]);
        queue.record(UserId::new(1000000000000000001), KickOutcome::Succeeded);
        queue.record(UserId::new(1000000000000000002), KickOutcome::Failed);

        assert_eq!(queue.succeeded(), 1);
        assert_eq!(
            queue.render(),
            ":green_square: <@1000000000000000001>\n:red_square: <@1000000000000000002>"
        );
    }
}
