//! Kafka appender configuration
//!
//! [`KafkaAppenderConfig`] mirrors the attributes of an appender element
//! (`name`, `topic`, `ignoreExceptions`, nested filter, layout and
//! properties) and can be read from JSON or assembled in code. It is only
//! validated when handed to [`KafkaAppender::create`](crate::KafkaAppender::create).

use crate::core::{AppenderError, FilterConfig, LayoutConfig, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Broker address list a producer connects to first
pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";

/// Encoding applied to record keys
pub const KEY_SERIALIZER: &str = "key.serializer";

/// Encoding applied to record values
pub const VALUE_SERIALIZER: &str = "value.serializer";

/// Serializer written into every property set before caller properties
pub const DEFAULT_SERIALIZER: &str = "string";

/// How the formatted event is turned into the record value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// Layout output coerced to UTF-8; invalid sequences become U+FFFD
    String,
    /// Layout output as-is
    Bytes,
}

impl PayloadEncoding {
    fn parse(key: &str, value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(PayloadEncoding::String),
            "bytes" | "bytearray" => Ok(PayloadEncoding::Bytes),
            other => Err(AppenderError::config(
                "KafkaAppender",
                format!("unsupported serializer '{}' for {}", other, key),
            )),
        }
    }

    pub fn encode(&self, payload: Vec<u8>) -> Vec<u8> {
        match self {
            PayloadEncoding::Bytes => payload,
            PayloadEncoding::String => match String::from_utf8(payload) {
                Ok(text) => text.into_bytes(),
                Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned().into_bytes(),
            },
        }
    }
}

/// A single key/value client setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Merged producer settings, fixed once the appender is built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerProperties {
    entries: BTreeMap<String, String>,
}

impl ProducerProperties {
    /// Serializer defaults first, then caller properties in order.
    ///
    /// Later writes replace earlier ones, so a caller-supplied serializer
    /// key overrides the default.
    pub fn merge(properties: &[Property]) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(KEY_SERIALIZER.to_string(), DEFAULT_SERIALIZER.to_string());
        entries.insert(VALUE_SERIALIZER.to_string(), DEFAULT_SERIALIZER.to_string());

        for property in properties {
            entries.insert(property.name.clone(), property.value.clone());
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Configured bootstrap servers, ignoring blank values
    pub fn bootstrap_servers(&self) -> Option<&str> {
        self.get(BOOTSTRAP_SERVERS).filter(|v| !v.trim().is_empty())
    }

    pub fn key_encoding(&self) -> Result<PayloadEncoding> {
        PayloadEncoding::parse(
            KEY_SERIALIZER,
            self.get(KEY_SERIALIZER).unwrap_or(DEFAULT_SERIALIZER),
        )
    }

    pub fn value_encoding(&self) -> Result<PayloadEncoding> {
        PayloadEncoding::parse(
            VALUE_SERIALIZER,
            self.get(VALUE_SERIALIZER).unwrap_or(DEFAULT_SERIALIZER),
        )
    }

    /// Every entry except the serializer keys, which the appender consumes
    pub fn client_settings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != KEY_SERIALIZER && k.as_str() != VALUE_SERIALIZER)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_ignore_exceptions() -> bool {
    true
}

/// Configuration for a [`KafkaAppender`](crate::KafkaAppender)
///
/// # Example
///
/// ```
/// use kafka_log_appender::KafkaAppenderConfig;
///
/// let config = KafkaAppenderConfig::from_json_str(r#"{
///     "name": "kafka",
///     "topic": "app-logs",
///     "layout": { "type": "PatternLayout", "pattern": "%d %-5p %c - %m%n" },
///     "properties": [
///         { "name": "bootstrap.servers", "value": "localhost:9092" }
///     ]
/// }"#).unwrap();
///
/// assert!(config.ignore_exceptions);
/// assert_eq!(config.topic.as_deref(), Some("app-logs"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaAppenderConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_ignore_exceptions")]
    pub ignore_exceptions: bool,
    #[serde(default)]
    pub filter: Option<FilterConfig>,
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Default for KafkaAppenderConfig {
    fn default() -> Self {
        Self {
            name: None,
            topic: None,
            ignore_exceptions: default_ignore_exceptions(),
            filter: None,
            layout: None,
            properties: Vec::new(),
        }
    }
}

impl KafkaAppenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppenderError::io_operation(
                "reading appender configuration",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&content)
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    #[must_use]
    pub fn ignore_exceptions(mut self, ignore: bool) -> Self {
        self.ignore_exceptions = ignore;
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: FilterConfig) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = Some(layout);
        self
    }

    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    #[must_use]
    pub fn bootstrap_servers(self, servers: impl Into<String>) -> Self {
        self.property(BOOTSTRAP_SERVERS, servers)
    }

    /// Merged properties this configuration would produce
    pub fn producer_properties(&self) -> ProducerProperties {
        ProducerProperties::merge(&self.properties)
    }
}
