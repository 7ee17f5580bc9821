//! Binds the `args`/`kwargs` of a config entry to a leaf's parameters.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Parameters are taken in declaration order: the next positional argument
/// if one is left, otherwise the keyword of the same name.
pub struct Arguments<'a> {
    tag: &'a str,
    positional: &'a [Value],
    keyword: &'a Map<String, Value>,
    next_positional: usize,
    used_keywords: HashSet<&'a str>,
}

impl<'a> Arguments<'a> {
    pub fn new(tag: &'a str, positional: &'a [Value], keyword: &'a Map<String, Value>) -> Self {
        Self {
            tag,
            positional,
            keyword,
            next_positional: 0,
            used_keywords: HashSet::new(),
        }
    }

    pub fn required<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, ConfigError> {
        self.optional(name)?
            .ok_or_else(|| ConfigError::init(self.tag, format!("missing required argument '{}'", name)))
    }

    /// Like [`required`](Self::required), but also accepts an alternative keyword spelling.
    pub fn required_aliased<T: DeserializeOwned>(
        &mut self,
        name: &str,
        alias: &str,
    ) -> Result<T, ConfigError> {
        if let Some(value) = self.optional(name)? {
            return Ok(value);
        }
        self.optional(alias)?
            .ok_or_else(|| ConfigError::init(self.tag, format!("missing required argument '{}'", name)))
    }

    pub fn optional<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>, ConfigError> {
        let positional: &'a [Value] = self.positional;
        let keyword: &'a Map<String, Value> = self.keyword;
        let by_keyword = keyword.get_key_value(name);

        let value = if self.next_positional < positional.len() {
            if by_keyword.is_some() {
                return Err(ConfigError::init(
                    self.tag,
                    format!("got multiple values for argument '{}'", name),
                ));
            }
            let value = &positional[self.next_positional];
            self.next_positional += 1;
            value
        } else {
            match by_keyword {
                Some((key, value)) => {
                    self.used_keywords.insert(key.as_str());
                    value
                }
                None => return Ok(None),
            }
        };

        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ConfigError::init(self.tag, format!("invalid value for '{}': {}", name, e)))
    }

    pub fn optional_or<T: DeserializeOwned>(&mut self, name: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    /// Collect every positional argument not yet bound.
    pub fn rest(&mut self) -> Vec<Value> {
        let rest = self.positional[self.next_positional..].to_vec();
        self.next_positional = self.positional.len();
        rest
    }

    /// Fail on leftover positional arguments or unknown keywords.
    pub fn finish(self) -> Result<(), ConfigError> {
        if self.next_positional < self.positional.len() {
            return Err(ConfigError::init(
                self.tag,
                format!(
                    "takes {} positional arguments but {} were given",
                    self.next_positional,
                    self.positional.len()
                ),
            ));
        }
        if let Some(unknown) = self
            .keyword
            .keys()
            .find(|key| !self.used_keywords.contains(key.as_str()))
        {
            return Err(ConfigError::init(
                self.tag,
                format!("unexpected keyword argument '{}'", unknown),
            ));
        }
        Ok(())
    }
}
