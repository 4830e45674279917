//! Inbound message sources.
//!
//! The listener pulls messages through [`MessageSource`], a blocking poll
//! bounded by a timeout. The transport that fills it is owned elsewhere;
//! [`ChannelSource`] adapts a channel of raw JSON text for transports that
//! push messages from their own thread.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePoll {
    /// A parsed message arrived.
    Message(Value),
    /// Nothing arrived within the timeout.
    Timeout,
    /// The source will produce no further messages.
    Stopped,
}

/// Errors surfaced by a message source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The transport delivered text that is not JSON.
    #[error("received malformed JSON: {source}")]
    Malformed {
        /// Text as received.
        raw: String,
        /// Parser complaint.
        #[source]
        source: serde_json::Error,
    },
}

/// Blocking supplier of inbound messages.
pub trait MessageSource: Send {
    /// Waits up to `timeout` for the next message.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when a message arrived but could not be
    /// parsed. The source stays usable afterwards.
    fn poll(&mut self, timeout: Duration) -> Result<SourcePoll, SourceError>;
}

/// [`MessageSource`] reading JSON text from a channel.
///
/// Dropping every sender stops the source.
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Receiver<String>,
}

impl ChannelSource {
    /// Wraps the receiving end of a message channel.
    #[must_use]
    pub const fn new(receiver: Receiver<String>) -> Self {
        Self { receiver }
    }
}

impl MessageSource for ChannelSource {
    fn poll(&mut self, timeout: Duration) -> Result<SourcePoll, SourceError> {
        match self.receiver.recv_timeout(timeout) {
            Ok(raw) => serde_json::from_str(&raw)
                .map(SourcePoll::Message)
                .map_err(|source| SourceError::Malformed { raw, source }),
            Err(RecvTimeoutError::Timeout) => Ok(SourcePoll::Timeout),
            Err(RecvTimeoutError::Disconnected) => Ok(SourcePoll::Stopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    const WAIT: Duration = Duration::from_millis(10);

    #[rstest]
    fn parses_queued_text() {
        let (tx, rx) = mpsc::channel();
        let mut source = ChannelSource::new(rx);
        tx.send(r#"{"operation":["random","run"]}"#.to_owned())
            .expect("send");

        let poll = source.poll(WAIT).expect("poll");
        assert_eq!(poll, SourcePoll::Message(json!({"operation": ["random", "run"]})));
    }

    #[rstest]
    fn times_out_when_idle() {
        let (_tx, rx) = mpsc::channel::<String>();
        let mut source = ChannelSource::new(rx);

        assert_eq!(source.poll(WAIT).expect("poll"), SourcePoll::Timeout);
    }

    #[rstest]
    fn stops_when_senders_are_gone() {
        let (tx, rx) = mpsc::channel::<String>();
        drop(tx);
        let mut source = ChannelSource::new(rx);

        assert_eq!(source.poll(WAIT).expect("poll"), SourcePoll::Stopped);
    }

    #[rstest]
    fn reports_malformed_text_and_keeps_going() {
        let (tx, rx) = mpsc::channel();
        let mut source = ChannelSource::new(rx);
        tx.send("{not json".to_owned()).expect("send");
        tx.send("{}".to_owned()).expect("send");

        let error = source.poll(WAIT).expect_err("malformed");
        assert!(matches!(error, SourceError::Malformed { ref raw, .. } if raw == "{not json"));
        assert_eq!(source.poll(WAIT).expect("poll"), SourcePoll::Message(json!({})));
    }
}
