use crate::{ExpressionError, InputExpression, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shared key/value state for one graph run.
///
/// Steps receive it as `&mut State` and communicate only by writing to it.
/// Keys can be overwritten but never removed.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    data: HashMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from a plain JSON object; anything else is rejected.
    pub fn from_json_object(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Object(obj) => Some(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.data
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Write a key, returning the previous value if it was overwritten.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Keys a step should read for `expression`, given what is present now.
    pub fn resolve(&self, expression: &InputExpression) -> Result<Vec<String>, ExpressionError> {
        expression.resolve_in(self)
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}
