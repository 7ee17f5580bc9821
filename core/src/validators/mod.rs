//! Validators: predicates over labels or data, and their cross-checking
//! counterparts over a (labels, data) pair.
//!
//! Every leaf is built from a config entry through its kind's `configure`
//! function. The set of kinds is closed: an unknown tag is a configuration
//! error, not a runtime lookup miss.

pub mod cross;
pub mod file;
pub mod image;
pub mod keys;
pub mod types;

use std::fmt;
use std::str::FromStr;

use crate::args::Arguments;
use crate::error::{ConfigError, ValidationError};
use crate::payload::Subject;
use crate::target::Accepts;

pub use cross::{CompositeCrossValidator, CrossValidator, CrossValidatorKind, DummyCrossValidator, MatchFilenames};
pub use file::FileValidator;
pub use image::ImageValidator;
pub use keys::KeyValidator;
pub use types::{FieldType, TypeValidator};

/// A pure predicate over one half of a request.
pub trait Validator: fmt::Display + Send + Sync {
    /// Short name used in failure reasons.
    fn name(&self) -> &str;

    fn accepts(&self) -> Accepts {
        Accepts::ANY
    }

    fn validate(&self, subject: Subject<'_>) -> Result<(), ValidationError>;
}

/// Passes everything. Takes no arguments.
#[derive(Debug, Default)]
pub struct DummyValidator;

impl Validator for DummyValidator {
    fn name(&self) -> &str {
        "none"
    }

    fn validate(&self, _subject: Subject<'_>) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl fmt::Display for DummyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DummyValidator")
    }
}

/// Applies its validators in order and stops at the first failure.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    pub fn with(mut self, validator: Box<dyn Validator>) -> Self {
        self.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Validator for CompositeValidator {
    fn name(&self) -> &str {
        "composite"
    }

    fn accepts(&self) -> Accepts {
        self.validators
            .iter()
            .fold(Accepts::ANY, |acc, v| acc.and(v.accepts()))
    }

    fn validate(&self, subject: Subject<'_>) -> Result<(), ValidationError> {
        for (index, validator) in self.validators.iter().enumerate() {
            validator
                .validate(subject)
                .map_err(|e| e.within(self.name(), index))?;
        }
        Ok(())
    }
}

impl fmt::Display for CompositeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompositeValidator with Validators:")?;
        for validator in &self.validators {
            write!(f, " [{}]", validator)?;
        }
        Ok(())
    }
}

/// The validator tags a config entry may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorKind {
    None,
    Key,
    Type,
    File,
    Image,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 5] = [
        ValidatorKind::File,
        ValidatorKind::Type,
        ValidatorKind::Key,
        ValidatorKind::Image,
        ValidatorKind::None,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ValidatorKind::None => "none",
            ValidatorKind::Key => "key",
            ValidatorKind::Type => "type",
            ValidatorKind::File => "file",
            ValidatorKind::Image => "img",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ValidatorKind::None => "DummyValidator\n\tPasses everything. Takes no arguments.",
            ValidatorKind::Key => {
                "KeyValidator\n\tPasses when the object's keys are exactly the configured keys.\n\
                 \tArgs:\n\t\tkeys (list): keys the object must have"
            }
            ValidatorKind::Type => {
                "TypeValidator\n\tChecks that fields exist and have the configured type.\n\
                 \tArgs:\n\t\tconfig (dict): field name to one of \"str\", \"int\", \"float\", \"bool\""
            }
            ValidatorKind::File => {
                "FileValidator\n\tChecks the filename for an accepted extension.\n\
                 \tArgs:\n\t\tfiletypes (list): accepted filename suffixes, e.g. [\".png\"]"
            }
            ValidatorKind::Image => {
                "ImageValidator\n\tChecks that the payload decodes as an image of the given size.\n\
                 \tArgs:\n\t\th (int): height, 0 to skip\n\t\tw (int): width, 0 to skip"
            }
        }
    }

    pub fn configure(&self, mut args: Arguments<'_>) -> Result<Box<dyn Validator>, ConfigError> {
        let validator: Box<dyn Validator> = match self {
            ValidatorKind::None => Box::new(DummyValidator),
            ValidatorKind::Key => Box::new(KeyValidator::new(args.required::<Vec<String>>("keys")?)),
            ValidatorKind::Type => Box::new(TypeValidator::from_config(args.required("config")?)?),
            ValidatorKind::File => Box::new(FileValidator::new(args.required("filetypes")?)),
            ValidatorKind::Image => {
                let h = args.required("h")?;
                let w = args.required("w")?;
                Box::new(ImageValidator::new(h, w))
            }
        };
        args.finish()?;
        Ok(validator)
    }
}

impl FromStr for ValidatorKind {
    type Err = ConfigError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ValidatorKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| ConfigError::UnknownTag {
                kind: "validator",
                tag: tag.to_string(),
            })
    }
}
