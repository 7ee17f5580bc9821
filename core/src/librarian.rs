//! The validation/dispatch pipeline shared by every request.

use serde::Serialize;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, info, warn};

use crate::actors::{Actor, ActorResponse, DummyActor};
use crate::config::{InputConfig, InputMode, LibrarianConfig};
use crate::error::{ConfigError, PipelineError, Stage};
use crate::labels::LabelSet;
use crate::payload::{DataPayload, Subject};
use crate::resolver::{configure_actor, configure_cross_validator, configure_validator};
use crate::target::Target;
use crate::uid::Uid;
use crate::validators::{CrossValidator, DummyCrossValidator, DummyValidator, Validator};

/// Outcome of a fully processed request.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub uid: Uid,
    pub label_response: ActorResponse,
    pub data_response: ActorResponse,
}

impl Receipt {
    pub fn summary(&self) -> String {
        format!(
            "Labels and data processed successfully:\n\tLabel response: {}\n\tData response: {}",
            self.label_response, self.data_response
        )
    }
}

/// Validators and actors built once at startup and shared by all requests.
pub struct Librarian {
    input: InputConfig,
    label_validator: Box<dyn Validator>,
    data_validator: Box<dyn Validator>,
    cross_validator: Box<dyn CrossValidator>,
    label_actor: Box<dyn Actor>,
    data_actor: Box<dyn Actor>,
}

impl Librarian {
    /// A pipeline that accepts everything and does nothing.
    pub fn new(input: InputConfig) -> Self {
        Self {
            input,
            label_validator: Box::new(DummyValidator),
            data_validator: Box::new(DummyValidator),
            cross_validator: Box::new(DummyCrossValidator),
            label_actor: Box::new(DummyActor),
            data_actor: Box::new(DummyActor),
        }
    }

    pub fn with_label_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.label_validator = validator;
        self
    }

    pub fn with_data_validator(mut self, validator: Box<dyn Validator>) -> Self {
        self.data_validator = validator;
        self
    }

    pub fn with_cross_validator(mut self, validator: Box<dyn CrossValidator>) -> Self {
        self.cross_validator = validator;
        self
    }

    pub fn with_label_actor(mut self, actor: Box<dyn Actor>) -> Self {
        self.label_actor = actor;
        self
    }

    pub fn with_data_actor(mut self, actor: Box<dyn Actor>) -> Self {
        self.data_actor = actor;
        self
    }

    /// Build every group of `config`. Any failure here is fatal for the service.
    pub async fn from_config(config: &LibrarianConfig) -> Result<Self, ConfigError> {
        let librarian = Self {
            input: config.input.clone(),
            label_validator: configure_validator(config.label_validator.entries(), Target::Labels)?,
            data_validator: configure_validator(config.data_validator.entries(), Target::Data)?,
            cross_validator: configure_cross_validator(config.cross_validator.entries())?,
            label_actor: configure_actor(config.label_actor.entries(), Target::Labels).await?,
            data_actor: configure_actor(config.data_actor.entries(), Target::Data).await?,
        };
        librarian.log_setup();
        Ok(librarian)
    }

    pub fn input(&self) -> &InputConfig {
        &self.input
    }

    /// One line per configured component, as shown in the startup banner.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("INPUT", format!("{} (tag: {:?})", self.input.mode, self.input.tag)),
            ("LABEL VALIDATOR", self.label_validator.to_string()),
            ("DATA VALIDATOR", self.data_validator.to_string()),
            ("CROSS VALIDATOR", self.cross_validator.to_string()),
            ("LABEL ACTOR", self.label_actor.to_string()),
            ("DATA ACTOR", self.data_actor.to_string()),
        ]
    }

    fn log_setup(&self) {
        info!("Created a Librarian instance");
        for (component, description) in self.describe() {
            info!("[{}]: {}", component, description);
        }
        if let InputMode::Unsupported(mode) = &self.input.mode {
            warn!(mode = %mode, "Input type is not supported");
        }
    }

    /// Labels, then data, then the pair. Stops at the first failure.
    pub fn validate(&self, labels: &LabelSet, data: &DataPayload) -> Result<(), PipelineError> {
        self.label_validator
            .validate(Subject::Labels(labels))
            .map_err(|source| PipelineError::Validation {
                stage: Stage::Label,
                source,
            })?;
        self.data_validator
            .validate(Subject::Data(data))
            .map_err(|source| PipelineError::Validation {
                stage: Stage::Data,
                source,
            })?;
        self.cross_validator
            .validate(labels, data)
            .map_err(|source| PipelineError::Validation {
                stage: Stage::Cross,
                source,
            })
    }

    /// Validators can decode whole images, so on a multi-threaded runtime
    /// the worker hands its other tasks off while they run.
    fn validate_in_place(&self, labels: &LabelSet, data: &DataPayload) -> Result<(), PipelineError> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.validate(labels, data))
            }
            _ => self.validate(labels, data),
        }
    }

    /// Validate, then run the label actor and the data actor under a fresh uid.
    ///
    /// A data actor failure does not undo what the label actor already did.
    pub async fn process(&self, labels: &LabelSet, data: &DataPayload) -> Result<Receipt, PipelineError> {
        self.validate_in_place(labels, data)?;

        let uid = Uid::generate();
        debug!(uid = %uid, "Request validated");

        let label_response = self
            .label_actor
            .act(Subject::Labels(labels), &uid)
            .await
            .map_err(PipelineError::LabelAction)?;
        let data_response = self
            .data_actor
            .act(Subject::Data(data), &uid)
            .await
            .map_err(PipelineError::DataAction)?;

        info!(uid = %uid, "Labels and data processed");
        Ok(Receipt {
            uid,
            label_response,
            data_response,
        })
    }
}
