//! Intents: command-specific execution parameters
//!
//! The planner never looks inside an intent. The command that owns it decodes
//! it into its own typed parameter struct.

use crate::error::IntentError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open key/value parameter set, immutable once handed to a command
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Intent(Map<String, Value>);

impl Intent {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn from_value(value: Value) -> Result<Self, IntentError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(IntentError::NotAnObject),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Decode into a command's typed parameters
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, IntentError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| IntentError::Decode(e.to_string()))
    }
}
