use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ValidationError};
use crate::payload::{Subject, ValueKind};

use super::Validator;

/// The type vocabulary accepted in a `type` validator config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
}

impl FieldType {
    fn kind(self) -> ValueKind {
        match self {
            FieldType::Str => ValueKind::Str,
            FieldType::Int => ValueKind::Int,
            FieldType::Float => ValueKind::Float,
            FieldType::Bool => ValueKind::Bool,
        }
    }
}

impl FromStr for FieldType {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "str" => Ok(FieldType::Str),
            "int" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            "bool" => Ok(FieldType::Bool),
            other => Err(ConfigError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

/// Checks that every configured field is present with the configured type.
///
/// Types are strict: a boolean is not an `int`, and `3.0` is a `float`.
/// This is narrower than a subtype check where `true` passes as an integer;
/// configure `bool` explicitly for flag fields.
#[derive(Debug, Clone)]
pub struct TypeValidator {
    fields: BTreeMap<String, FieldType>,
}

impl TypeValidator {
    /// Build from `{"field": "type name"}`. Unknown type names are rejected here.
    pub fn from_config(config: BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let fields = config
            .into_iter()
            .map(|(field, type_name)| Ok((field, type_name.parse()?)))
            .collect::<Result<_, ConfigError>>()?;
        Ok(Self { fields })
    }
}

impl Validator for TypeValidator {
    fn name(&self) -> &str {
        "type"
    }

    fn validate(&self, subject: Subject<'_>) -> Result<(), ValidationError> {
        for (field, expected) in &self.fields {
            let actual = subject.field_kind(field).ok_or_else(|| {
                ValidationError::new(self.name(), format!("Required field {} not found", field))
            })?;
            if actual != expected.kind() {
                return Err(ValidationError::new(
                    self.name(),
                    format!(
                        "Invalid type ({}) for {}. Expected ({})",
                        actual, field, expected
                    ),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for TypeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeValidator with setup: fields: {")?;
        for (i, (field, ty)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field, ty)?;
        }
        f.write_str("}")
    }
}
