//! `rdkafka`-backed producer
//!
//! Wraps a [`ThreadedProducer`], whose background polling thread runs the
//! delivery callbacks. librdkafka's own log and error reports are forwarded
//! to the status logger.

use super::{DeliveryCallback, DeliveryError, Producer, ProducerRecord, RecordMetadata};
use crate::config::ProducerProperties;
use crate::core::{AppenderError, Result, StatusLogger};
use parking_lot::Mutex;
use rdkafka::config::{ClientConfig, RDKafkaLogLevel};
use rdkafka::error::KafkaError;
use rdkafka::producer::{
    BaseRecord, DeliveryResult as RdDeliveryResult, Producer as _, ProducerContext,
    ThreadedProducer,
};
use rdkafka::util::Timeout;
use rdkafka::{ClientContext, Message};

/// Opaque carried through librdkafka, which requires `Send + Sync`
type CallbackSlot = Box<Mutex<Option<DeliveryCallback>>>;

/// Client context bridging librdkafka reports into this crate
pub struct DeliveryContext {
    status: StatusLogger,
}

impl ClientContext for DeliveryContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        let message = format!("librdkafka {}: {}", fac, log_message);
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => self.status.error(message),
            RDKafkaLogLevel::Warning => self.status.warn(message),
            _ => self.status.debug(message),
        }
    }

    fn error(&self, error: KafkaError, reason: &str) {
        self.status
            .warn(format!("Kafka client error: {} ({})", error, reason));
    }
}

impl ProducerContext for DeliveryContext {
    type DeliveryOpaque = CallbackSlot;

    fn delivery(&self, delivery_result: &RdDeliveryResult<'_>, callback: Self::DeliveryOpaque) {
        let result = match delivery_result {
            Ok(message) => Ok(RecordMetadata {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
            }),
            Err((err, _)) => Err(DeliveryError::new(err.to_string())),
        };
        let callback = callback.lock().take();
        if let Some(callback) = callback {
            callback(result);
        }
    }
}

/// Kafka producer publishing raw payloads without keys
pub struct KafkaProducer {
    inner: ThreadedProducer<DeliveryContext>,
}

impl KafkaProducer {
    /// Build a producer from merged appender properties.
    ///
    /// Only [`ProducerProperties::client_settings`] reach librdkafka; an
    /// unknown property name is reported as a creation error.
    pub fn new(properties: &ProducerProperties, status: StatusLogger) -> Result<Self> {
        let mut client_config = ClientConfig::new();
        for (key, value) in properties.client_settings() {
            client_config.set(key, value);
        }

        let inner: ThreadedProducer<DeliveryContext> = client_config
            .create_with_context(DeliveryContext { status })
            .map_err(|e| AppenderError::producer(e.to_string()))?;

        Ok(Self { inner })
    }
}

impl Producer for KafkaProducer {
    fn send(&self, record: ProducerRecord, callback: DeliveryCallback) -> Result<()> {
        let slot: CallbackSlot = Box::new(Mutex::new(Some(callback)));
        let mut base = BaseRecord::<(), [u8], CallbackSlot>::with_opaque_to(&record.topic, slot)
            .payload(record.value.as_slice());
        if let Some(millis) = record.timestamp_millis {
            base = base.timestamp(millis);
        }

        self.inner
            .send(base)
            .map_err(|(err, _)| AppenderError::enqueue(&record.topic, err.to_string()))
    }

    fn flush(&self) -> Result<()> {
        self.inner
            .flush(Timeout::Never)
            .map_err(|e| AppenderError::flush(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Property;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_create_without_reachable_broker() {
        let properties = ProducerProperties::merge(&[
            Property::new("bootstrap.servers", "127.0.0.1:1"),
            Property::new("message.timeout.ms", "1000"),
        ]);

        let producer = KafkaProducer::new(&properties, StatusLogger::silent());
        assert!(producer.is_ok());
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let properties = ProducerProperties::merge(&[
            Property::new("bootstrap.servers", "127.0.0.1:1"),
            Property::new("no.such.property", "1"),
        ]);

        let result = KafkaProducer::new(&properties, StatusLogger::silent());
        assert!(matches!(result, Err(AppenderError::ProducerCreation(_))));
    }

    #[test]
    fn test_delivery_failure_reaches_callback() {
        let properties = ProducerProperties::merge(&[
            Property::new("bootstrap.servers", "127.0.0.1:1"),
            Property::new("message.timeout.ms", "200"),
        ]);
        let producer = KafkaProducer::new(&properties, StatusLogger::silent()).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        producer
            .send(
                ProducerRecord::new("logs", "unreachable"),
                Box::new(move |result| {
                    let _ = tx.send(result);
                }),
            )
            .unwrap();
        producer.flush().unwrap();

        let result = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_binary_payload_with_timestamp_runs_callback_once() {
        let properties = ProducerProperties::merge(&[
            Property::new("bootstrap.servers", "127.0.0.1:1"),
            Property::new("message.timeout.ms", "200"),
        ]);
        let producer = KafkaProducer::new(&properties, StatusLogger::silent()).unwrap();

        let failures = Arc::new(AtomicUsize::new(0));
        let failures_clone = Arc::clone(&failures);
        let record =
            ProducerRecord::new("logs", vec![0xff, 0x00, 0x7f]).with_timestamp(1_736_332_245_123);
        producer
            .send(
                record,
                Box::new(move |result| {
                    if result.is_err() {
                        failures_clone.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
            .unwrap();
        producer.flush().unwrap();

        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }
}
