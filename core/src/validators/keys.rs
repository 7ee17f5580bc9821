use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;
use crate::payload::Subject;

use super::Validator;

/// Passes iff the object's key set equals the configured set exactly.
#[derive(Debug, Clone)]
pub struct KeyValidator {
    keys: BTreeSet<String>,
}

impl KeyValidator {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl Validator for KeyValidator {
    fn name(&self) -> &str {
        "key"
    }

    fn validate(&self, subject: Subject<'_>) -> Result<(), ValidationError> {
        let present = subject
            .keys()
            .ok_or_else(|| ValidationError::new(self.name(), "object has no keys"))?;

        let missing: Vec<&str> = self
            .keys
            .iter()
            .map(String::as_str)
            .filter(|k| !present.contains(k))
            .collect();
        let unexpected: Vec<&str> = present
            .iter()
            .copied()
            .filter(|k| !self.keys.contains(*k))
            .collect();

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }
        Err(ValidationError::new(
            self.name(),
            format!(
                "key set mismatch (missing: {:?}, unexpected: {:?})",
                missing, unexpected
            ),
        ))
    }
}

impl fmt::Display for KeyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyValidator with setup: keys: {:?}", self.keys)
    }
}
