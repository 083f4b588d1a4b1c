//! Error types for the agency form bots.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Form definition error: {0}")]
    Definition(#[from] DefinitionError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("No channel registered under {0}")]
    UnknownChannel(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },
}

/// Errors raised while building a form definition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Form {form} has no steps")]
    Empty { form: String },

    #[error("Form {form} declares step key {key} more than once")]
    DuplicateKey { form: String, key: String },
}

/// A step rejected the user's answer. Handled inside the engine; the
/// session replays the current step.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("must be at least {min} characters")]
    TooShort { min: usize },

    #[error("not a number")]
    NotANumber,

    #[error("out of range")]
    OutOfRange { min: i64, max: i64 },
}
