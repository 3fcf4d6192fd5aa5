//! In-memory producer
//!
//! Behaves like a real client from the appender's point of view: `send`
//! only enqueues, and delivery callbacks run later on a dedicated delivery
//! thread. Failures can be injected through a [`MemoryProducerHandle`],
//! which stays usable after the producer itself has been moved into an
//! appender.

use super::{DeliveryCallback, DeliveryError, Producer, ProducerRecord, RecordMetadata};
use crate::core::{AppenderError, Result};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type Job = (ProducerRecord, DeliveryCallback);

#[derive(Default)]
struct Shared {
    records: Mutex<Vec<ProducerRecord>>,
    in_flight: Mutex<usize>,
    idle: Condvar,
    delivery_failure: Mutex<Option<String>>,
    send_rejection: Mutex<Option<String>>,
    latency: Mutex<Duration>,
    next_offset: AtomicI64,
    flushes: AtomicUsize,
    closed: AtomicBool,
    in_flight_at_close: Mutex<Option<usize>>,
}

impl Shared {
    fn deliver(&self, record: ProducerRecord, callback: DeliveryCallback) {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            thread::sleep(latency);
        }

        let failure = self.delivery_failure.lock().clone();
        let result = match failure {
            Some(message) => Err(DeliveryError::new(message)),
            None => {
                let metadata = RecordMetadata {
                    topic: record.topic.clone(),
                    partition: 0,
                    offset: self.next_offset.fetch_add(1, Ordering::SeqCst),
                };
                self.records.lock().push(record);
                Ok(metadata)
            }
        };

        let outcome =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(result)));
        if outcome.is_err() {
            eprintln!("[LOGGER CRITICAL] Delivery callback panicked in memory producer");
        }

        let mut in_flight = self.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.idle.notify_all();
        }
    }
}

/// Producer double that keeps acknowledged records in memory
///
/// # Example
///
/// ```
/// use kafka_log_appender::producer::{MemoryProducer, Producer, ProducerRecord};
///
/// let producer = MemoryProducer::new();
/// let handle = producer.handle();
///
/// producer
///     .send(ProducerRecord::new("logs", "hello"), Box::new(|_| {}))
///     .unwrap();
/// producer.flush().unwrap();
///
/// assert_eq!(handle.messages(), vec!["hello".to_string()]);
/// ```
pub struct MemoryProducer {
    shared: Arc<Shared>,
    sender: Option<Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MemoryProducer {
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        let (sender, receiver) = unbounded::<Job>();
        let worker_shared = Arc::clone(&shared);

        let worker = thread::Builder::new()
            .name("memory-producer-delivery".to_string())
            .spawn(move || {
                for (record, callback) in receiver.iter() {
                    worker_shared.deliver(record, callback);
                }
            })
            .ok();

        Self {
            shared,
            sender: worker.as_ref().map(|_| sender),
            worker,
        }
    }

    /// Delay every delivery report by `latency`
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.shared.latency.lock() = latency;
        self
    }

    pub fn handle(&self) -> MemoryProducerHandle {
        MemoryProducerHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Default for MemoryProducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Producer for MemoryProducer {
    fn send(&self, record: ProducerRecord, callback: DeliveryCallback) -> Result<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(AppenderError::enqueue(record.topic, "producer is closed"));
        }
        if let Some(message) = self.shared.send_rejection.lock().clone() {
            return Err(AppenderError::enqueue(record.topic, message));
        }
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| AppenderError::enqueue(&record.topic, "delivery thread not running"))?;

        *self.shared.in_flight.lock() += 1;
        if let Err(err) = sender.send((record, callback)) {
            let mut in_flight = self.shared.in_flight.lock();
            *in_flight = in_flight.saturating_sub(1);
            let (record, _) = err.into_inner();
            return Err(AppenderError::enqueue(record.topic, "delivery thread stopped"));
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.shared.flushes.fetch_add(1, Ordering::SeqCst);
        let mut in_flight = self.shared.in_flight.lock();
        while *in_flight > 0 {
            self.shared.idle.wait(&mut in_flight);
        }
        Ok(())
    }
}

impl Drop for MemoryProducer {
    fn drop(&mut self) {
        let pending = *self.shared.in_flight.lock();
        *self.shared.in_flight_at_close.lock() = Some(pending);
        self.shared.closed.store(true, Ordering::Release);
        // Disconnecting the channel lets the worker drain and exit
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.join() {
                eprintln!("[LOGGER ERROR] Memory producer delivery thread panicked: {:?}", e);
            }
        }
    }
}

/// Inspection and fault-injection side of a [`MemoryProducer`]
#[derive(Clone)]
pub struct MemoryProducerHandle {
    shared: Arc<Shared>,
}

impl MemoryProducerHandle {
    /// Records acknowledged so far, in delivery order
    pub fn records(&self) -> Vec<ProducerRecord> {
        self.shared.records.lock().clone()
    }

    /// Acknowledged payloads decoded as UTF-8
    pub fn messages(&self) -> Vec<String> {
        self.shared
            .records
            .lock()
            .iter()
            .map(|r| String::from_utf8_lossy(&r.value).into_owned())
            .collect()
    }

    /// Make every subsequent delivery report fail with `message`
    pub fn fail_deliveries_with(&self, message: impl Into<String>) {
        *self.shared.delivery_failure.lock() = Some(message.into());
    }

    pub fn succeed_deliveries(&self) {
        *self.shared.delivery_failure.lock() = None;
    }

    /// Make every subsequent `send` fail synchronously with `message`
    pub fn reject_sends_with(&self, message: impl Into<String>) {
        *self.shared.send_rejection.lock() = Some(message.into());
    }

    pub fn accept_sends(&self) {
        *self.shared.send_rejection.lock() = None;
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.shared.latency.lock() = latency;
    }

    pub fn in_flight(&self) -> usize {
        *self.shared.in_flight.lock()
    }

    pub fn flush_count(&self) -> usize {
        self.shared.flushes.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Records still awaiting delivery when the producer was closed
    pub fn in_flight_at_close(&self) -> Option<usize> {
        *self.shared.in_flight_at_close.lock()
    }
}
