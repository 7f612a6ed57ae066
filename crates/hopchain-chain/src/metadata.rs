//! Free-form per-node options passed to dialers and connectors at init.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String-keyed option bag. Values may be typed (`true`, `30`) or strings
/// (`"true"`, `"30"`); the typed getters accept both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(HashMap<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_u64().map(|n| n != 0),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer seconds as a [`Duration`].
    pub fn get_duration_secs(&self, key: &str) -> Option<Duration> {
        self.get_u64(key).map(Duration::from_secs)
    }
}

impl From<HashMap<String, Value>> for Metadata {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_and_string_values() {
        let md = Metadata::new()
            .with("mux", true)
            .with("nodelay", "off")
            .with("timeout", 30)
            .with("backlog", "64")
            .with("host", "proxy.example");

        assert_eq!(md.get_bool("mux"), Some(true));
        assert_eq!(md.get_bool("nodelay"), Some(false));
        assert_eq!(md.get_duration_secs("timeout"), Some(Duration::from_secs(30)));
        assert_eq!(md.get_u64("backlog"), Some(64));
        assert_eq!(md.get_str("host"), Some("proxy.example"));
        assert_eq!(md.get_bool("host"), None);
        assert_eq!(md.get_u64("missing"), None);
    }

    #[test]
    fn deserialize_transparent() {
        let md: Metadata = serde_json::from_str(r#"{"mux": "yes", "ttl": 5}"#).unwrap();
        assert!(md.contains_key("mux"));
        assert_eq!(md.get_bool("mux"), Some(true));
        assert_eq!(md.get_u64("ttl"), Some(5));
    }
}
