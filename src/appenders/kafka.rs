//! Kafka appender
//!
//! Publishes each formatted event to a topic without waiting for the
//! broker. Delivery failures are reported on the status log from the
//! producer's delivery thread and never reach the logging caller.

use crate::config::{KafkaAppenderConfig, PayloadEncoding, ProducerProperties};
use crate::core::{
    Appender, AppenderError, AppenderMetrics, Filter, FilterResult, Layout, LifeCycle,
    LifeCycleState, LogEvent, PatternLayout, Result, StatusLogger,
};
use crate::producer::{DeliveryCallback, Producer, ProducerRecord};
use parking_lot::RwLock;
use std::sync::Arc;

const COMPONENT: &str = "KafkaAppender";

/// Appender that sends log lines to a Kafka topic
///
/// # Example
///
/// ```
/// use kafka_log_appender::prelude::*;
///
/// let config = KafkaAppenderConfig::new()
///     .name("kafka")
///     .topic("app-logs")
///     .bootstrap_servers("localhost:9092");
///
/// let producer = MemoryProducer::new();
/// let handle = producer.handle();
/// let appender = KafkaAppender::create_with(config, StatusLogger::silent(), |_| Ok(producer))
///     .expect("invalid appender configuration");
///
/// let logger = Logger::builder().appender(appender).build();
/// logger.info("This log will be published to app-logs");
/// logger.stop();
///
/// assert_eq!(handle.messages(), vec!["This log will be published to app-logs\n"]);
/// ```
pub struct KafkaAppender<P: Producer> {
    name: String,
    topic: String,
    producer: RwLock<Option<P>>,
    layout: Arc<dyn Layout>,
    filter: Option<Arc<dyn Filter>>,
    ignore_exceptions: bool,
    properties: ProducerProperties,
    encoding: PayloadEncoding,
    lifecycle: LifeCycle,
    metrics: Arc<AppenderMetrics>,
    status: StatusLogger,
}

#[cfg(feature = "kafka")]
impl KafkaAppender<crate::producer::KafkaProducer> {
    /// Build an appender backed by an `rdkafka` producer.
    ///
    /// Returns `None` after logging one status error if the configuration is
    /// incomplete or the producer cannot be created.
    ///
    /// ```no_run
    /// use kafka_log_appender::prelude::*;
    ///
    /// let config = KafkaAppenderConfig::new()
    ///     .name("kafka")
    ///     .topic("app-logs")
    ///     .bootstrap_servers("localhost:9092");
    ///
    /// let appender = KafkaAppender::create(config).expect("invalid appender configuration");
    ///
    /// let logger = Logger::builder().appender(appender).build();
    /// logger.info("This log will be published to app-logs");
    /// ```
    pub fn create(config: KafkaAppenderConfig) -> Option<Self> {
        let status = StatusLogger::global().clone();
        let producer_status = status.clone();
        Self::create_with(config, status, move |properties| {
            crate::producer::KafkaProducer::new(properties, producer_status)
        })
    }
}

impl<P: Producer> KafkaAppender<P> {
    /// Build an appender with a caller-supplied producer constructor.
    ///
    /// Validation order: name, topic, layout (defaulting to `%m%n`), filter,
    /// merged properties, bootstrap servers, serializers, producer. The
    /// first failure is logged to `status` and yields `None`.
    pub fn create_with<F>(
        config: KafkaAppenderConfig,
        status: StatusLogger,
        make_producer: F,
    ) -> Option<Self>
    where
        F: FnOnce(&ProducerProperties) -> Result<P>,
    {
        match Self::try_create(config, &status, make_producer) {
            Ok(appender) => {
                status.debug(format!(
                    "Started {} {} for topic {}",
                    COMPONENT, appender.name, appender.topic
                ));
                Some(appender)
            }
            Err(err) => {
                status.error(err.to_string());
                None
            }
        }
    }

    fn try_create<F>(
        config: KafkaAppenderConfig,
        status: &StatusLogger,
        make_producer: F,
    ) -> Result<Self>
    where
        F: FnOnce(&ProducerProperties) -> Result<P>,
    {
        let name = required(config.name, "name")?;
        let topic = required(config.topic, "topic")?;

        let layout: Arc<dyn Layout> = match config.layout {
            Some(ref layout) => layout.build()?,
            None => Arc::new(PatternLayout::default()),
        };
        let filter = config.filter.as_ref().map(|f| f.build()).transpose()?;

        let properties = ProducerProperties::merge(&config.properties);
        if properties.bootstrap_servers().is_none() {
            return Err(AppenderError::no_bootstrap_servers(COMPONENT));
        }
        properties.key_encoding()?;
        let encoding = properties.value_encoding()?;

        let producer = make_producer(&properties)?;

        Ok(Self {
            name,
            topic,
            producer: RwLock::new(Some(producer)),
            layout,
            filter,
            ignore_exceptions: config.ignore_exceptions,
            properties,
            encoding,
            lifecycle: LifeCycle::started(),
            metrics: Arc::new(AppenderMetrics::new()),
            status: status.clone(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn properties(&self) -> &ProducerProperties {
        &self.properties
    }

    pub fn metrics(&self) -> &AppenderMetrics {
        &self.metrics
    }

    pub fn state(&self) -> LifeCycleState {
        self.lifecycle.state()
    }

    fn delivery_callback(&self) -> DeliveryCallback {
        let status = self.status.clone();
        let metrics = Arc::clone(&self.metrics);
        Box::new(move |result| match result {
            Ok(_) => {
                metrics.record_delivered();
            }
            Err(err) => {
                metrics.record_failed();
                status.error(format!("Failed to send log to Kafka: {}", err));
            }
        })
    }

    fn try_append(&self, event: &LogEvent) -> Result<()> {
        if !self.lifecycle.is_started() {
            return Err(AppenderError::stopped(&self.name));
        }

        let payload = self.encoding.encode(self.layout.to_bytes(event)?);
        let record = ProducerRecord::new(&self.topic, payload)
            .with_timestamp(event.timestamp.timestamp_millis());

        let producer = self.producer.read();
        let producer = producer
            .as_ref()
            .ok_or_else(|| AppenderError::stopped(&self.name))?;

        match producer.send(record, self.delivery_callback()) {
            Ok(()) => {
                self.metrics.record_submitted();
                Ok(())
            }
            Err(err) => {
                self.metrics.record_rejected();
                Err(err)
            }
        }
    }
}

fn required(value: Option<String>, attribute: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppenderError::missing(COMPONENT, attribute))
}

impl<P: Producer> Appender for KafkaAppender<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, event: &LogEvent) -> Result<()> {
        match self.try_append(event) {
            Ok(()) => Ok(()),
            Err(err) if self.ignore_exceptions => {
                self.status.error(format!(
                    "Unable to write to Kafka in appender [{}]: {}",
                    self.name, err
                ));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn stop(&self) {
        if !self.lifecycle.begin_stop() {
            return;
        }

        // Waits for in-progress appends holding the read lock
        let producer = self.producer.write().take();
        if let Some(producer) = producer {
            if let Err(err) = producer.flush() {
                self.status.error(format!(
                    "Error flushing {} {}: {}",
                    COMPONENT, self.name, err
                ));
            }
            producer.close();
        }

        self.lifecycle.mark_stopped();
        self.status
            .debug(format!("Stopped {} {}", COMPONENT, self.name));
    }

    fn is_started(&self) -> bool {
        self.lifecycle.is_started()
    }

    fn ignore_exceptions(&self) -> bool {
        self.ignore_exceptions
    }

    fn is_filtered(&self, event: &LogEvent) -> bool {
        self.filter
            .as_ref()
            .is_some_and(|f| f.filter(event) == FilterResult::Deny)
    }
}

impl<P: Producer> Drop for KafkaAppender<P> {
    fn drop(&mut self) {
        // Ensure in-flight records are delivered before the client goes away
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FilterConfig, LayoutConfig, LogLevel};
    use crate::producer::{MemoryProducer, MemoryProducerHandle};
    use std::time::Duration;

    fn valid_config() -> KafkaAppenderConfig {
        KafkaAppenderConfig::new()
            .name("kafka")
            .topic("app-logs")
            .bootstrap_servers("localhost:9092")
    }

    fn memory_appender(
        config: KafkaAppenderConfig,
    ) -> (Option<KafkaAppender<MemoryProducer>>, MemoryProducerHandle, StatusLogger) {
        let status = StatusLogger::silent();
        let producer = MemoryProducer::new();
        let handle = producer.handle();
        let appender = KafkaAppender::create_with(config, status.clone(), |_| Ok(producer));
        (appender, handle, status)
    }

    #[test]
    fn test_create_valid() {
        let (appender, _, status) = memory_appender(valid_config());
        let appender = appender.expect("appender should be created");

        assert!(appender.is_started());
        assert_eq!(appender.name(), "kafka");
        assert_eq!(appender.topic(), "app-logs");
        assert!(appender.ignore_exceptions());
        assert!(status.errors().is_empty());
    }

    #[test]
    fn test_missing_name() {
        let mut config = valid_config();
        config.name = None;
        let (appender, _, status) = memory_appender(config);

        assert!(appender.is_none());
        let errors = status.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "No name provided for KafkaAppender");
    }

    #[test]
    fn test_blank_topic_is_missing() {
        let config = valid_config().topic("   ");
        let (appender, _, status) = memory_appender(config);

        assert!(appender.is_none());
        assert_eq!(status.errors()[0].message, "No topic provided for KafkaAppender");
    }

    #[test]
    fn test_missing_bootstrap_servers() {
        let config = KafkaAppenderConfig::new().name("kafka").topic("app-logs");
        let (appender, _, status) = memory_appender(config);

        assert!(appender.is_none());
        let errors = status.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "No bootstrap servers configured for KafkaAppender"
        );
    }

    #[test]
    fn test_producer_not_built_when_invalid() {
        let status = StatusLogger::silent();
        let mut built = false;
        let appender = KafkaAppender::<MemoryProducer>::create_with(
            KafkaAppenderConfig::new().name("kafka"),
            status,
            |_| {
                built = true;
                Ok(MemoryProducer::new())
            },
        );
        assert!(appender.is_none());
        assert!(!built);
    }

    #[test]
    fn test_producer_creation_failure() {
        let status = StatusLogger::silent();
        let appender = KafkaAppender::<MemoryProducer>::create_with(
            valid_config(),
            status.clone(),
            |_| Err(AppenderError::producer("No such configuration property")),
        );

        assert!(appender.is_none());
        let errors = status.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("No such configuration property"));
    }

    #[test]
    fn test_invalid_layout_pattern() {
        let (appender, _, status) =
            memory_appender(valid_config().layout(LayoutConfig::pattern("%zz")));
        assert!(appender.is_none());
        assert_eq!(status.errors().len(), 1);
    }

    #[test]
    fn test_append_uses_default_layout() {
        let (appender, handle, _) = memory_appender(valid_config());
        let appender = appender.unwrap();

        appender
            .append(&LogEvent::new(LogLevel::Info, "user signed in"))
            .unwrap();
        appender.stop();

        let records = handle.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].topic, "app-logs");
        assert_eq!(records[0].value, b"user signed in\n");
        assert!(records[0].timestamp_millis.is_some());
        assert_eq!(appender.metrics().delivered(), 1);
    }

    #[test]
    fn test_delivery_failure_logged_once() {
        let (appender, handle, status) = memory_appender(valid_config());
        let appender = appender.unwrap();
        handle.fail_deliveries_with("Broker: Topic authorization failed");

        assert!(appender
            .append(&LogEvent::new(LogLevel::Error, "payment declined"))
            .is_ok());
        appender.stop();

        let errors = status.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            "Failed to send log to Kafka: Broker: Topic authorization failed"
        );
        assert_eq!(appender.metrics().failed(), 1);
    }

    #[test]
    fn test_rejected_send_swallowed_when_ignoring() {
        let (appender, handle, status) = memory_appender(valid_config());
        let appender = appender.unwrap();
        handle.reject_sends_with("Local: Queue full");

        assert!(appender.append(&LogEvent::new(LogLevel::Info, "x")).is_ok());
        assert_eq!(appender.metrics().rejected(), 1);
        assert_eq!(status.errors().len(), 1);
        assert!(status.errors()[0].message.contains("Local: Queue full"));
    }

    #[test]
    fn test_rejected_send_returned_when_not_ignoring() {
        let (appender, handle, status) = memory_appender(valid_config().ignore_exceptions(false));
        let appender = appender.unwrap();
        handle.reject_sends_with("Local: Queue full");

        let result = appender.append(&LogEvent::new(LogLevel::Info, "x"));
        assert!(matches!(result, Err(AppenderError::EnqueueError { .. })));
        assert!(status.errors().is_empty());
    }

    #[test]
    fn test_stop_drains_and_closes() {
        let (appender, handle, _) = memory_appender(valid_config());
        let appender = appender.unwrap();
        handle.set_latency(Duration::from_millis(5));

        for i in 0..20 {
            appender
                .append(&LogEvent::new(LogLevel::Info, format!("event {}", i)))
                .unwrap();
        }
        assert_eq!(handle.in_flight_at_close(), None);
        appender.stop();

        assert_eq!(handle.records().len(), 20);
        assert_eq!(handle.in_flight(), 0);
        assert_eq!(handle.flush_count(), 1);
        assert!(handle.is_closed());
        assert_eq!(handle.in_flight_at_close(), Some(0));
        assert_eq!(appender.state(), LifeCycleState::Stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (appender, handle, status) = memory_appender(valid_config());
        let appender = appender.unwrap();

        appender.stop();
        appender.stop();
        drop(appender);

        assert_eq!(handle.flush_count(), 1);
        assert!(status.errors().is_empty());
    }

    #[test]
    fn test_filter_denies_below_threshold() {
        let config = valid_config().filter(FilterConfig::ThresholdFilter {
            level: LogLevel::Warn,
            on_match: None,
            on_mismatch: None,
        });
        let (appender, _, _) = memory_appender(config);
        let appender = appender.unwrap();

        assert!(appender.is_filtered(&LogEvent::new(LogLevel::Info, "x")));
        assert!(!appender.is_filtered(&LogEvent::new(LogLevel::Error, "x")));
    }

    #[test]
    fn test_json_layout_payload() {
        let (appender, handle, _) = memory_appender(valid_config().layout(LayoutConfig::json()));
        let appender = appender.unwrap();

        appender
            .append(&LogEvent::new(LogLevel::Warn, "slow query").with_context_field("ms", 812))
            .unwrap();
        appender.stop();

        let value: serde_json::Value = serde_json::from_slice(&handle.records()[0].value).unwrap();
        assert_eq!(value["message"], "slow query");
        assert_eq!(value["context"]["ms"], "812");
    }
}
