//! Predicates over a (labels, data) pair.

use std::fmt;
use std::str::FromStr;

use crate::args::Arguments;
use crate::error::{ConfigError, ValidationError};
use crate::labels::LabelSet;
use crate::payload::DataPayload;

pub trait CrossValidator: fmt::Display + Send + Sync {
    fn name(&self) -> &str;

    fn validate(&self, labels: &LabelSet, data: &DataPayload) -> Result<(), ValidationError>;
}

#[derive(Debug, Default)]
pub struct DummyCrossValidator;

impl CrossValidator for DummyCrossValidator {
    fn name(&self) -> &str {
        "none"
    }

    fn validate(&self, _labels: &LabelSet, _data: &DataPayload) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl fmt::Display for DummyCrossValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DummyCrossValidator")
    }
}

/// Passes iff the `filename` label equals the data's filename.
///
/// The label is compared by its text form, so `filename=1` matches a data
/// filename of `"1"`. Either side missing is a failure.
#[derive(Debug, Default)]
pub struct MatchFilenames;

impl CrossValidator for MatchFilenames {
    fn name(&self) -> &str {
        "fname"
    }

    fn validate(&self, labels: &LabelSet, data: &DataPayload) -> Result<(), ValidationError> {
        let label_name = labels
            .get("filename")
            .map(ToString::to_string)
            .ok_or_else(|| ValidationError::new(self.name(), "labels have no filename"))?;
        let data_name = data
            .filename()
            .ok_or_else(|| ValidationError::new(self.name(), "data has no filename"))?;

        if label_name != data_name {
            return Err(ValidationError::new(
                self.name(),
                format!("filenames differ: '{}' != '{}'", label_name, data_name),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for MatchFilenames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MatchFilenames")
    }
}

#[derive(Default)]
pub struct CompositeCrossValidator {
    validators: Vec<Box<dyn CrossValidator>>,
}

impl CompositeCrossValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, validator: Box<dyn CrossValidator>) {
        self.validators.push(validator);
    }

    pub fn with(mut self, validator: Box<dyn CrossValidator>) -> Self {
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

impl CrossValidator for CompositeCrossValidator {
    fn name(&self) -> &str {
        "composite"
    }

    fn validate(&self, labels: &LabelSet, data: &DataPayload) -> Result<(), ValidationError> {
        for (index, validator) in self.validators.iter().enumerate() {
            validator
                .validate(labels, data)
                .map_err(|e| e.within(self.name(), index))?;
        }
        Ok(())
    }
}

impl fmt::Display for CompositeCrossValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompositeCrossValidator with CrossValidators:")?;
        for validator in &self.validators {
            write!(f, " [{}]", validator)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossValidatorKind {
    None,
    Fname,
}

impl CrossValidatorKind {
    pub const ALL: [CrossValidatorKind; 2] = [CrossValidatorKind::Fname, CrossValidatorKind::None];

    pub fn tag(&self) -> &'static str {
        match self {
            CrossValidatorKind::None => "none",
            CrossValidatorKind::Fname => "fname",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            CrossValidatorKind::None => "DummyCrossValidator\n\tPasses everything. Takes no arguments.",
            CrossValidatorKind::Fname => {
                "MatchFilenames\n\tPasses when the 'filename' label equals the data's filename. \
                 Takes no arguments."
            }
        }
    }

    pub fn configure(&self, args: Arguments<'_>) -> Result<Box<dyn CrossValidator>, ConfigError> {
        args.finish()?;
        Ok(match self {
            CrossValidatorKind::None => Box::new(DummyCrossValidator),
            CrossValidatorKind::Fname => Box::new(MatchFilenames),
        })
    }
}

impl FromStr for CrossValidatorKind {
    type Err = ConfigError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        CrossValidatorKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| ConfigError::UnknownTag {
                kind: "cross-validator",
                tag: tag.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::FilePayload;
    use serde_json::json;

    #[test]
    fn test_match_filenames_compares_label_to_data() {
        let labels = LabelSet::from_query(vec![("filename", "a.txt")]);
        let same = DataPayload::Json(json!({"filename": "a.txt"}));
        let other = DataPayload::File(FilePayload::new("b.txt", vec![1u8]));

        assert!(MatchFilenames.validate(&labels, &same).is_ok());
        let err = MatchFilenames.validate(&labels, &other).unwrap_err();
        assert!(err.reason.contains("'a.txt' != 'b.txt'"));
    }

    #[test]
    fn test_match_filenames_missing_side_fails() {
        let no_label = LabelSet::from_query(vec![("x", "1")]);
        let with_label = LabelSet::from_query(vec![("filename", "a.txt")]);
        let data = DataPayload::Json(json!({"filename": "a.txt"}));
        let no_name = DataPayload::Json(json!({"val": 1}));

        assert!(MatchFilenames.validate(&no_label, &data).is_err());
        assert!(MatchFilenames.validate(&with_label, &no_name).is_err());
    }

    #[test]
    fn test_numeric_label_matches_text_filename() {
        let labels = LabelSet::from_query(vec![("filename", "42")]);
        let data = DataPayload::Json(json!({"filename": "42"}));
        assert!(MatchFilenames.validate(&labels, &data).is_ok());
    }

    #[test]
    fn test_composite_reports_failing_child() {
        let composite = CompositeCrossValidator::new()
            .with(Box::new(DummyCrossValidator))
            .with(Box::new(MatchFilenames));
        let labels = LabelSet::from_query(vec![("filename", "a")]);
        let data = DataPayload::Json(json!({"filename": "b"}));

        let err = composite.validate(&labels, &data).unwrap_err();
        assert_eq!(err.validator, "composite[1].fname");
    }

    #[test]
    fn test_fname_takes_no_arguments() {
        let args = vec![json!("x")];
        let kwargs = serde_json::Map::new();
        assert!(CrossValidatorKind::Fname
            .configure(Arguments::new("fname", &args, &kwargs))
            .is_err());
    }
}
