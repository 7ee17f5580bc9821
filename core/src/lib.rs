pub mod actors;
pub mod args;
pub mod config;
pub mod error;
pub mod labels;
pub mod librarian;
pub mod payload;
pub mod resolver;
pub mod target;
pub mod uid;
pub mod validators;

pub use actors::{Actor, ActorKind, ActorResponse};
pub use config::{InputConfig, InputMode, LibrarianConfig};
pub use error::*;
pub use labels::{LabelSet, LabelValue};
pub use librarian::{Librarian, Receipt};
pub use payload::{DataPayload, FilePayload, Subject, DEFAULT_FILENAME};
pub use target::{Accepts, Target};
pub use uid::Uid;
pub use validators::{CrossValidator, CrossValidatorKind, Validator, ValidatorKind};
