//! Service configuration: input mode plus the six validator/actor groups.

use std::env;
use std::fmt;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::ConfigError;

pub const INPUT_CONFIG: &str = "INPUT_CONFIG";
pub const CROSS_VALID_CONFIG: &str = "CROSS_VALID_CONFIG";
pub const LABEL_VALID_CONFIG: &str = "LABEL_VALID_CONFIG";
pub const DATA_VALID_CONFIG: &str = "DATA_VALID_CONFIG";
pub const LABEL_ACTOR_CONFIG: &str = "LABEL_ACTOR_CONFIG";
pub const DATA_ACTOR_CONFIG: &str = "DATA_ACTOR_CONFIG";

/// `{"validator": tag, "args": [...], "kwargs": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    pub validator: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl ValidatorEntry {
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }
}

/// `{"actor": tag, "args": [...], "kwargs": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorEntry {
    pub actor: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl ActorEntry {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }
}

/// A group is either a single entry or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigList<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> ConfigList<T> {
    pub fn entries(&self) -> &[T] {
        match self {
            ConfigList::One(entry) => std::slice::from_ref(entry),
            ConfigList::Many(entries) => entries,
        }
    }
}

impl<T> Default for ConfigList<T> {
    fn default() -> Self {
        ConfigList::Many(Vec::new())
    }
}

impl<T> From<Vec<T>> for ConfigList<T> {
    fn from(entries: Vec<T>) -> Self {
        ConfigList::Many(entries)
    }
}

/// How the data half of a request is carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputMode {
    File,
    Json,
    Base64,
    /// Accepted at load time; every request is then rejected as invalid input.
    Unsupported(String),
}

impl From<String> for InputMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "file" => InputMode::File,
            "json" => InputMode::Json,
            "base64" => InputMode::Base64,
            _ => InputMode::Unsupported(mode),
        }
    }
}

impl From<InputMode> for String {
    fn from(mode: InputMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMode::File => f.write_str("file"),
            InputMode::Json => f.write_str("json"),
            InputMode::Base64 => f.write_str("base64"),
            InputMode::Unsupported(other) => f.write_str(other),
        }
    }
}

impl InputMode {
    pub const SUPPORTED: [InputMode; 3] = [InputMode::File, InputMode::Json, InputMode::Base64];

    pub fn describe(&self) -> &'static str {
        match self {
            InputMode::File => "Data is the multipart file field named by the tag",
            InputMode::Json => {
                "Data is the JSON body field named by the tag, or the whole body when the tag is empty"
            }
            InputMode::Base64 => {
                "Data is a base64 string in the form field named by the tag; \
                 any data-URI header is stripped and the 'filename' label names the file"
            }
            InputMode::Unsupported(_) => "Not supported, every request is rejected",
        }
    }
}

/// `{"type": mode, "tag": field}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(rename = "type")]
    pub mode: InputMode,
    #[serde(default)]
    pub tag: String,
}

/// Everything the pipeline is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct LibrarianConfig {
    #[serde(rename = "INPUT_CONFIG")]
    pub input: InputConfig,
    #[serde(rename = "CROSS_VALID_CONFIG")]
    pub cross_validator: ConfigList<ValidatorEntry>,
    #[serde(rename = "LABEL_VALID_CONFIG")]
    pub label_validator: ConfigList<ValidatorEntry>,
    #[serde(rename = "DATA_VALID_CONFIG")]
    pub data_validator: ConfigList<ValidatorEntry>,
    #[serde(rename = "LABEL_ACTOR_CONFIG")]
    pub label_actor: ConfigList<ActorEntry>,
    #[serde(rename = "DATA_ACTOR_CONFIG")]
    pub data_actor: ConfigList<ActorEntry>,
}

/// File layout as written by hand. The input group may also be given as the
/// flat `DATA_TYPE`/`DATA_TAG` pair.
#[derive(Deserialize)]
struct RawConfig {
    #[serde(rename = "INPUT_CONFIG", alias = "input_config")]
    input: Option<InputConfig>,
    #[serde(rename = "DATA_TYPE", alias = "data_type")]
    data_type: Option<String>,
    #[serde(rename = "DATA_TAG", alias = "data_tag")]
    data_tag: Option<String>,
    #[serde(rename = "CROSS_VALID_CONFIG", alias = "cross_valid_config", default)]
    cross_validator: ConfigList<ValidatorEntry>,
    #[serde(rename = "LABEL_VALID_CONFIG", alias = "label_valid_config", default)]
    label_validator: ConfigList<ValidatorEntry>,
    #[serde(rename = "DATA_VALID_CONFIG", alias = "data_valid_config", default)]
    data_validator: ConfigList<ValidatorEntry>,
    #[serde(rename = "LABEL_ACTOR_CONFIG", alias = "label_actor_config", default)]
    label_actor: ConfigList<ActorEntry>,
    #[serde(rename = "DATA_ACTOR_CONFIG", alias = "data_actor_config", default)]
    data_actor: ConfigList<ActorEntry>,
}

impl TryFrom<RawConfig> for LibrarianConfig {
    type Error = String;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let input = match (raw.input, raw.data_type) {
            (Some(input), _) => input,
            (None, Some(mode)) => InputConfig {
                mode: mode.into(),
                tag: raw.data_tag.unwrap_or_default(),
            },
            (None, None) => return Err(format!("missing field `{}`", INPUT_CONFIG)),
        };
        Ok(Self {
            input,
            cross_validator: raw.cross_validator,
            label_validator: raw.label_validator,
            data_validator: raw.data_validator,
            label_actor: raw.label_actor,
            data_actor: raw.data_actor,
        })
    }
}

fn parse_json<T: DeserializeOwned>(source_name: &str, raw: &str) -> Result<T, ConfigError> {
    serde_json::from_str(raw).map_err(|e| ConfigError::InvalidJson {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })
}

impl LibrarianConfig {
    /// No validation, and both halves are logged by a printer actor.
    pub fn debug_defaults() -> Self {
        Self {
            input: InputConfig {
                mode: InputMode::Json,
                tag: String::new(),
            },
            cross_validator: ConfigList::One(ValidatorEntry::new("none")),
            label_validator: ConfigList::One(ValidatorEntry::new("none")),
            data_validator: ConfigList::One(ValidatorEntry::new("none")),
            label_actor: ConfigList::One(ActorEntry::new("print")),
            data_actor: ConfigList::One(ActorEntry::new("print")),
        }
    }

    /// Load each group from the environment variable of the same name.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// `INPUT_CONFIG` may be replaced by the plain `DATA_TYPE`/`DATA_TAG` pair.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let group = |key: &str| -> Result<String, ConfigError> {
            lookup(key).ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
        };

        let input = match lookup(INPUT_CONFIG) {
            Some(raw) => parse_json(INPUT_CONFIG, &raw)?,
            None => match lookup("DATA_TYPE") {
                Some(mode) => InputConfig {
                    mode: mode.into(),
                    tag: lookup("DATA_TAG").unwrap_or_default(),
                },
                None => return Err(ConfigError::MissingEnv(INPUT_CONFIG.to_string())),
            },
        };

        let config = Self {
            input,
            cross_validator: parse_json(CROSS_VALID_CONFIG, &group(CROSS_VALID_CONFIG)?)?,
            label_validator: parse_json(LABEL_VALID_CONFIG, &group(LABEL_VALID_CONFIG)?)?,
            data_validator: parse_json(DATA_VALID_CONFIG, &group(DATA_VALID_CONFIG)?)?,
            label_actor: parse_json(LABEL_ACTOR_CONFIG, &group(LABEL_ACTOR_CONFIG)?)?,
            data_actor: parse_json(DATA_ACTOR_CONFIG, &group(DATA_ACTOR_CONFIG)?)?,
        };
        info!(input = %config.input.mode, "Configuration loaded from environment");
        config.warn_unsupported();
        Ok(config)
    }

    pub fn from_json_str(source_name: &str, raw: &str) -> Result<Self, ConfigError> {
        let config: Self = parse_json(source_name, raw)?;
        config.warn_unsupported();
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&path.display().to_string(), &raw)?;
        info!(file = %path.display(), input = %config.input.mode, "Configuration loaded from file");
        Ok(config)
    }

    fn warn_unsupported(&self) {
        if let InputMode::Unsupported(mode) = &self.input.mode {
            warn!(mode = %mode, "Unsupported input type, every request will be rejected");
        }
    }
}
