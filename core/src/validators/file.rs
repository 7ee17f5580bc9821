use std::fmt;

use crate::error::ValidationError;
use crate::payload::Subject;
use crate::target::Accepts;

use super::Validator;

/// Passes iff the payload's filename ends with one of the accepted suffixes.
#[derive(Debug, Clone)]
pub struct FileValidator {
    filetypes: Vec<String>,
}

impl FileValidator {
    pub fn new(filetypes: Vec<String>) -> Self {
        Self { filetypes }
    }
}

impl Validator for FileValidator {
    fn name(&self) -> &str {
        "file"
    }

    fn accepts(&self) -> Accepts {
        Accepts::DATA
    }

    fn validate(&self, subject: Subject<'_>) -> Result<(), ValidationError> {
        let filename = subject
            .filename()
            .ok_or_else(|| ValidationError::new(self.name(), "payload has no filename"))?;

        if self.filetypes.iter().any(|ft| filename.ends_with(ft.as_str())) {
            return Ok(());
        }
        Err(ValidationError::new(
            self.name(),
            format!(
                "file extension mismatch: '{}' does not end with any of {:?}",
                filename, self.filetypes
            ),
        ))
    }
}

impl fmt::Display for FileValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileValidator with setup: filetypes: {:?}", self.filetypes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{DataPayload, FilePayload};
    use serde_json::json;

    #[test]
    fn test_accepts_listed_suffix() {
        let v = FileValidator::new(vec![".png".into(), ".jpg".into()]);
        let png = DataPayload::File(FilePayload::new("cat.png", vec![1u8]));
        assert!(v.validate(Subject::Data(&png)).is_ok());
    }

    #[test]
    fn test_rejects_other_suffix() {
        let v = FileValidator::new(vec![".png".into()]);
        let txt = DataPayload::Json(json!({"filename": "a.txt", "val": 1}));
        let err = v.validate(Subject::Data(&txt)).unwrap_err();
        assert!(err.reason.contains("extension mismatch"));
    }

    #[test]
    fn test_requires_filename() {
        let v = FileValidator::new(vec![".png".into()]);
        let data = DataPayload::Json(json!({"val": 1}));
        let err = v.validate(Subject::Data(&data)).unwrap_err();
        assert_eq!(err.reason, "payload has no filename");
    }
}
