//! Error types for recruit-intake.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// The unique index on the user id rejected an insert. Not a failure
    /// from the user's point of view — the caller routes this to the
    /// already-registered path.
    #[error("Lead already exists for user {user_id}")]
    Duplicate { user_id: i64 },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

/// A single intake field failed validation. Always recoverable: the user is
/// re-prompted and the dialogue state does not advance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be at least 2 characters")]
    TooShort { field: &'static str },

    #[error("age must be a whole number")]
    NotANumber,

    #[error("age must be between {min} and {max}")]
    OutOfRange { min: u8, max: u8 },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
