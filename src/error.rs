//! Error types for Job Beacon.

use std::time::Duration;

use crate::sources::SourceId;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Chat transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Failed to edit message {message_id} on channel {name}: {reason}")]
    EditFailed {
        name: String,
        message_id: i64,
        reason: String,
    },

    #[error("Failed to delete message {message_id} on channel {name}: {reason}")]
    DeleteFailed {
        name: String,
        message_id: i64,
        reason: String,
    },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Authentication failed for channel {name}: {reason}")]
    AuthFailed { name: String, reason: String },

    #[error("Rate limited on channel {name}, retry after {retry_after:?}")]
    RateLimited {
        name: String,
        retry_after: Option<Duration>,
    },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Errors from a job source adapter or the source registry.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure or timeout talking to the upstream source.
    #[error("Source {source_id} unavailable: {reason}")]
    UpstreamUnavailable { source_id: SourceId, reason: String },

    /// The upstream answered with data that could not be interpreted.
    #[error("Source {source_id} returned malformed data: {reason}")]
    UpstreamMalformed { source_id: SourceId, reason: String },

    #[error("No adapter registered for source {0}")]
    UnknownSource(SourceId),
}

impl FetchError {
    /// The source the failed request was addressed to.
    pub fn source_id(&self) -> &SourceId {
        match self {
            Self::UpstreamUnavailable { source_id, .. }
            | Self::UpstreamMalformed { source_id, .. }
            | Self::UnknownSource(source_id) => source_id,
        }
    }
}

/// The step a user has to take before an intent can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingStep {
    /// No search text has been submitted.
    NoQuery,
    /// A query is set but no source has been picked.
    NoSource,
    /// Navigation was requested with nothing on display.
    NothingDisplayed,
    /// The picked source has no registered adapter.
    UnknownSource(SourceId),
}

/// Outcome of an intent that could not be carried out.
///
/// None of these leave a session half-updated: an intent either commits
/// all of its changes or none of them.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("Precondition failed: {0:?}")]
    PreconditionFailed(MissingStep),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The fetch succeeded but the upstream has nothing more to show.
    #[error("No further results")]
    NoResults,

    /// Another intent for the same user is still in flight.
    #[error("Session busy")]
    Busy,

    /// The primary display message could not be sent or edited.
    #[error("Display failed: {0}")]
    Display(#[from] ChannelError),
}

impl NavigationError {
    /// Text shown to the user for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            Self::PreconditionFailed(MissingStep::NoQuery) => {
                "Type what kind of job you are looking for first.".to_string()
            }
            Self::PreconditionFailed(MissingStep::NoSource) => {
                "Please select a job site from the keyboard first.".to_string()
            }
            Self::PreconditionFailed(MissingStep::NothingDisplayed) => {
                "There are no results on display. Type a query to start a new search.".to_string()
            }
            Self::PreconditionFailed(MissingStep::UnknownSource(id)) => {
                format!("Job site '{id}' is not available. Pick another one.")
            }
            Self::Fetch(FetchError::UnknownSource(id)) => {
                format!("Job site '{id}' is not available. Pick another one.")
            }
            Self::Fetch(FetchError::UpstreamUnavailable { source_id, .. }) => {
                format!("Could not reach {source_id} right now. Please try again later.")
            }
            Self::Fetch(FetchError::UpstreamMalformed { source_id, .. }) => {
                format!("{source_id} returned results we could not read. Please try again later.")
            }
            Self::NoResults => "No further results.".to_string(),
            Self::Busy => "Still working on your previous request, please wait.".to_string(),
            Self::Display(_) => "An error occurred while updating the message.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
