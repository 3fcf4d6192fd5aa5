//! Producer abstraction the Kafka appender publishes through
//!
//! A [`Producer`] accepts records without waiting for the broker and
//! reports the outcome of each one later through a [`DeliveryCallback`]
//! running on a thread owned by the producer.

use crate::core::Result;
use std::fmt;

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;

#[cfg(feature = "kafka")]
pub use kafka::KafkaProducer;
pub use memory::{MemoryProducer, MemoryProducerHandle};

/// A single message bound for a topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerRecord {
    pub topic: String,
    pub value: Vec<u8>,
    /// Creation time in milliseconds since the epoch
    pub timestamp_millis: Option<i64>,
}

impl ProducerRecord {
    pub fn new(topic: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            value: value.into(),
            timestamp_millis: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp_millis = Some(millis);
        self
    }
}

/// Where an acknowledged record was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMetadata {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Asynchronous delivery failure reported by the producer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DeliveryError {
    message: String,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type DeliveryResult = std::result::Result<RecordMetadata, DeliveryError>;

/// Completion hook run exactly once per accepted record
pub type DeliveryCallback = Box<dyn FnOnce(DeliveryResult) + Send + 'static>;

pub trait Producer: Send + Sync {
    /// Enqueue a record without waiting for acknowledgement.
    ///
    /// On `Ok` the callback will be run once the outcome is known. On `Err`
    /// the record was never accepted and the callback is dropped unrun.
    fn send(&self, record: ProducerRecord, callback: DeliveryCallback) -> Result<()>;

    /// Block until every record accepted so far has completed.
    fn flush(&self) -> Result<()>;

    /// Release the client. Dropping has the same effect.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

impl fmt::Display for RecordMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}@{}", self.topic, self.partition, self.offset)
    }
}
