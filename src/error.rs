use miette::Diagnostic;
use thiserror::Error;

/// Main error type for doorman operations
#[derive(Error, Debug, Diagnostic)]
pub enum DoormanError {
    #[error("Discord error")]
    #[diagnostic(help("Check Discord bot token and permissions"))]
    Discord(#[from] DiscordError),

    #[error("Configuration error")]
    #[diagnostic(help("Check your configuration file"))]
    Config(#[from] ConfigError),

    #[error("Command error")]
    #[diagnostic(help("Check the command input"))]
    Command(#[from] CommandError),
}

/// Discord-specific errors
#[derive(Error, Debug, Diagnostic)]
pub enum DiscordError {
    #[error("Failed to connect to Discord")]
    #[diagnostic(
        code(doorman::discord::connection_failed),
        help("Check bot token and network connection")
    )]
    ConnectionFailed {
        #[source]
        source: serenity::Error,
    },

    #[error("Failed to register {count} slash commands")]
    #[diagnostic(
        code(doorman::discord::registration_failed),
        help("Check the application id and that the token belongs to it")
    )]
    RegistrationFailed {
        count: usize,
        #[source]
        source: serenity::Error,
    },
}

/// Errors produced while executing a slash command. These surface to the
/// invoking user through the dispatcher's generic catch-all reply.
#[derive(Error, Debug, Diagnostic)]
pub enum CommandError {
    #[error(
        "No valid users mentioned! Make sure to add a space between each user and try again."
    )]
    #[diagnostic(
        code(doorman::command::no_valid_targets),
        help("Mentions must look like <@123456789012345678>")
    )]
    NoValidTargets,

    #[error("Option '{name}' is missing or not of the expected type")]
    #[diagnostic(
        code(doorman::command::invalid_option),
        help("The registered command descriptor and the handler disagree")
    )]
    InvalidOption { name: &'static str },

    #[error("Discord API call failed")]
    #[diagnostic(code(doorman::command::api_failed))]
    Api(#[from] serenity::Error),
}

/// Configuration errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Configuration file not found at {path}")]
    #[diagnostic(
        code(doorman::config::not_found),
        help("Create a config file or use environment variables")
    )]
    NotFound { path: String },

    #[error("Invalid configuration")]
    #[diagnostic(
        code(doorman::config::invalid),
        help("Check configuration format and required fields")
    )]
    Invalid { field: String, reason: String },

    #[error("Failed to parse configuration")]
    #[diagnostic(
        code(doorman::config::parse_failed),
        help("Check TOML syntax and field types")
    )]
    ParseFailed {
        #[source]
        source: toml::de::Error,
    },
}

/// Type alias for Results in doorman
pub type Result<T> = std::result::Result<T, DoormanError>;
