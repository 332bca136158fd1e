use gpsbridge_nmea::ConvertedMessage;
use tracing::{trace, warn};

use crate::error::Result;

/// Receives converted messages from a [`MessageSink`].
pub trait Consumer {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Handle one message.
    fn consume(&mut self, message: &ConvertedMessage) -> Result<()>;
}

impl<C: Consumer + ?Sized> Consumer for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn consume(&mut self, message: &ConvertedMessage) -> Result<()> {
        (**self).consume(message)
    }
}

/// Fan-out of converted messages to registered consumers.
///
/// Consumers run in registration order. A failing consumer is logged and
/// skipped for that message only.
#[derive(Default)]
pub struct MessageSink {
    consumers: Vec<Box<dyn Consumer>>,
    failures: u64,
}

impl MessageSink {
    /// Create a sink with no consumers. Messages are discarded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a consumer.
    pub fn register<C: Consumer + 'static>(&mut self, consumer: C) {
        trace!(consumer = consumer.name(), "consumer registered");
        self.consumers.push(Box::new(consumer));
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_consumer<C: Consumer + 'static>(mut self, consumer: C) -> Self {
        self.register(consumer);
        self
    }

    /// Dispatch one message to every consumer.
    pub fn handle(&mut self, message: &ConvertedMessage) {
        for consumer in &mut self.consumers {
            if let Err(err) = consumer.consume(message) {
                self.failures += 1;
                warn!(
                    consumer = consumer.name(),
                    message = message.name(),
                    error = %err,
                    "consumer failed"
                );
            }
        }
    }

    /// Number of registered consumers.
    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Consumer failures since creation.
    pub fn failure_count(&self) -> u64 {
        self.failures
    }
}

impl std::fmt::Debug for MessageSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.consumers.iter().map(|c| c.name()).collect();
        f.debug_struct("MessageSink")
            .field("consumers", &names)
            .field("failures", &self.failures)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use gpsbridge_nmea::GpsPgrmv;

    use super::*;
    use crate::error::SinkError;

    type Seen = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        name: &'static str,
        seen: Seen,
        fail: bool,
    }

    impl Consumer for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn consume(&mut self, message: &ConvertedMessage) -> Result<()> {
            self.seen
                .borrow_mut()
                .push(format!("{}:{}", self.name, message.name()));
            if self.fail {
                return Err(SinkError::Consumer {
                    consumer: self.name.into(),
                    message: "refused".into(),
                });
            }
            Ok(())
        }
    }

    fn velocity() -> ConvertedMessage {
        ConvertedMessage::GpsPgrmv(GpsPgrmv {
            time_usec: 1,
            veast: 0.5,
            vnorth: 0.0,
            vup: f64::NAN,
        })
    }

    #[test]
    fn consumers_run_in_registration_order() {
        let seen = Seen::default();
        let mut sink = MessageSink::new()
            .with_consumer(Recorder {
                name: "a",
                seen: seen.clone(),
                fail: false,
            })
            .with_consumer(Recorder {
                name: "b",
                seen: seen.clone(),
                fail: false,
            });

        sink.handle(&velocity());

        assert_eq!(*seen.borrow(), ["a:GPS_PGRMV", "b:GPS_PGRMV"]);
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.failure_count(), 0);
    }

    #[test]
    fn failing_consumer_does_not_stop_siblings() {
        let seen = Seen::default();
        let mut sink = MessageSink::new();
        sink.register(Recorder {
            name: "broken",
            seen: seen.clone(),
            fail: true,
        });
        sink.register(Recorder {
            name: "ok",
            seen: seen.clone(),
            fail: false,
        });

        sink.handle(&velocity());
        sink.handle(&velocity());

        assert_eq!(seen.borrow().len(), 4);
        assert_eq!(seen.borrow()[3], "ok:GPS_PGRMV");
        assert_eq!(sink.failure_count(), 2);
    }

    #[test]
    fn empty_sink_discards() {
        let mut sink = MessageSink::new();
        assert!(sink.is_empty());
        sink.handle(&velocity());
        assert_eq!(sink.failure_count(), 0);
        assert!(format!("{sink:?}").contains("MessageSink"));
    }

    #[test]
    fn boxed_consumers_delegate() {
        let seen = Seen::default();
        let boxed: Box<dyn Consumer> = Box::new(Recorder {
            name: "boxed",
            seen: seen.clone(),
            fail: false,
        });
        let mut sink = MessageSink::new().with_consumer(boxed);
        sink.handle(&velocity());
        assert_eq!(*seen.borrow(), ["boxed:GPS_PGRMV"]);
    }
}
