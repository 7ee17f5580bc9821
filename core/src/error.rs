use std::fmt;

use thiserror::Error;

use crate::target::Target;

/// Startup-time failures. The service refuses to start on any of these.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown {kind} tag: '{tag}'")]
    UnknownTag { kind: &'static str, tag: String },
    #[error("Supplied type not supported: {0}")]
    UnsupportedType(String),
    #[error("Invalid initialisation of '{tag}': {reason}")]
    Initialisation { tag: String, reason: String },
    #[error("'{tag}' cannot be applied to {target}")]
    IncompatibleTarget { tag: String, target: Target },
    #[error("Environment variable not set: {0}")]
    MissingEnv(String),
    #[error("Invalid JSON in {source_name}: {reason}")]
    InvalidJson { source_name: String, reason: String },
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn init(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Initialisation {
            tag: tag.into(),
            reason: reason.into(),
        }
    }
}

/// A specific object failed a check.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{validator}: {reason}")]
pub struct ValidationError {
    pub validator: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(validator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the validator name with the position it held inside a composite.
    pub fn within(self, composite: &str, index: usize) -> Self {
        Self {
            validator: format!("{}[{}].{}", composite, index, self.validator),
            reason: self.reason,
        }
    }
}

/// An actor's side effect failed.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{actor}: {reason}")]
pub struct ActionError {
    pub actor: String,
    pub reason: String,
}

impl ActionError {
    pub fn new(actor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            reason: reason.into(),
        }
    }

    pub fn within(self, composite: &str, index: usize) -> Self {
        Self {
            actor: format!("{}[{}].{}", composite, index, self.actor),
            reason: self.reason,
        }
    }
}

/// The request did not carry data in the configured shape.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Invalid data type")]
    UnsupportedMode(String),
    #[error("Data tag not found")]
    MissingData(String),
    #[error("Invalid data type: {0}")]
    Malformed(String),
    #[error("Payload too large: {0}")]
    TooLarge(String),
}

/// Stage of the pipeline at which validation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Label,
    Data,
    Cross,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Label => f.write_str("LABEL"),
            Stage::Data => f.write_str("DATA"),
            Stage::Cross => f.write_str("CROSS"),
        }
    }
}

/// Per-request failures of the validation/dispatch pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("{stage} validation failed: {source}")]
    Validation {
        stage: Stage,
        #[source]
        source: ValidationError,
    },
    #[error("Error occurred during LABEL actor: {0}")]
    LabelAction(#[source] ActionError),
    #[error("Error occurred during DATA actor: {0}")]
    DataAction(#[source] ActionError),
}
