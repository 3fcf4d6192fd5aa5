//! Appender implementations

pub mod kafka;

pub use kafka::KafkaAppender;

pub use crate::core::Appender;
