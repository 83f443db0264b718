//! Log-only broker.
//!
//! Publishes nothing remotely: every envelope is encoded and written to the
//! log, and optionally to an extra sink. Sending always succeeds.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use fleetcast_events::{Envelope, Event};
use tracing::{info, warn};

use crate::{base_envelope, encode_envelope, Broker, BrokerError};

type Sink = Box<dyn Write + Send>;

/// Broker that writes encoded envelopes to the log.
#[derive(Default)]
pub struct StdoutBroker {
    sink: Option<Mutex<Sink>>,
}

impl StdoutBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also write every encoded envelope, newline terminated, to `sink`.
    pub fn with_sink(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Some(Mutex::new(Box::new(sink))),
        }
    }

    fn write_to_sink(&self, line: &[u8]) {
        let Some(sink) = &self.sink else {
            return;
        };

        let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write_line(&mut **sink, line) {
            warn!(broker = "stdout", error = %e, "Failed to write envelope to sink");
        }
    }
}

fn write_line(sink: &mut dyn Write, line: &[u8]) -> std::io::Result<()> {
    sink.write_all(line)?;
    sink.write_all(b"\n")?;
    sink.flush()
}

#[async_trait]
impl Broker for StdoutBroker {
    fn name(&self) -> &'static str {
        "stdout"
    }

    fn build_envelope(&self, event: &Event) -> Result<Envelope, BrokerError> {
        base_envelope(event)
    }

    async fn send_message(&self, envelope: Envelope) -> Result<(), BrokerError> {
        let output = encode_envelope(&envelope)?;

        info!(
            broker = "stdout",
            envelope = %String::from_utf8_lossy(&output),
            "Envelope published"
        );
        self.write_to_sink(&output);

        Ok(())
    }
}
