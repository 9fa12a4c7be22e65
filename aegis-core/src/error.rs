//! Error types for aegis-core

use thiserror::Error;

/// Result alias used across aegis-core
pub type AegisResult<T> = Result<T, AegisError>;

/// Top-level error type for aegis-core
#[derive(Error, Debug)]
pub enum AegisError {
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Communication error: {0}")]
    Comms(#[from] CommsError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the agent directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),
}

/// Errors from the communication channel service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommsError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Unknown message: {0}")]
    UnknownMessage(String),

    #[error("Agent {agent} is not a participant of channel {channel}")]
    NotParticipant { agent: String, channel: String },

    #[error("History limit must be positive")]
    InvalidLimit,

    #[error("Message {0} has not been delivered")]
    NotDelivered(String),

    #[error("Message {message} is addressed to {recipient}, not {reader}")]
    WrongRecipient {
        message: String,
        recipient: String,
        reader: String,
    },

    #[error("Transit queue is closed")]
    TransitClosed,
}

impl From<DirectoryError> for CommsError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UnknownAgent(id) | DirectoryError::DuplicateAgent(id) => {
                CommsError::UnknownAgent(id)
            }
        }
    }
}

/// Errors from the per-agent task scheduler
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task depends on unknown task {0}")]
    UnknownDependency(String),

    #[error("Unknown decision: {0}")]
    UnknownDecision(String),

    #[error("Decision already submitted: {0}")]
    DuplicateDecision(String),

    #[error("Decision {0} has no options")]
    EmptyDecision(String),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}

/// Failure of a task-type handler
///
/// Always converted into a `failed` task by the scheduler, never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Invalid task parameters: {0}")]
    InvalidParameters(String),

    #[error("Action rejected: {0}")]
    Rejected(String),

    #[error("Collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Communication failure: {0}")]
    Comms(#[from] CommsError),
}

/// Failure of an external collaborator call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Collaborator timed out")]
    Timeout,

    #[error("Malformed collaborator response: {0}")]
    Malformed(String),
}

/// Errors loading runtime configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
