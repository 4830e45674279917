//! Error types surfaced by the dispatcher.
//!
//! Two layers exist. [`DispatchError`] describes why one inbound message
//! could not be delivered as a success; it is converted into an
//! [`ErrorRecord`] before it reaches a continuation or the generic error
//! subscriber, so callers only ever see records. Setup and registry failures
//! are returned directly to the code that caused them.

use std::fmt;

use thiserror::Error;

/// Classification carried by every [`ErrorRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The message was not a well-formed protocol envelope.
    ProtocolMalformed,
    /// A required request or response field was absent.
    FieldMissing,
    /// A field was present but had the wrong shape.
    FieldInvalid,
    /// The service reported that the operation failed.
    OperationFailed,
    /// A reply arrived for an exchange with no live continuation.
    NoPendingCallback,
    /// An event carried an unrecognised status string.
    UnknownEvent,
    /// A device index pointed outside the reported device list.
    OutOfRange,
    /// The reply does not match what the continuation expects.
    UnexpectedReply,
    /// Dispatcher state could not be accessed.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ProtocolMalformed => "protocol malformed",
            Self::FieldMissing => "field missing",
            Self::FieldInvalid => "field invalid",
            Self::OperationFailed => "operation failed",
            Self::NoPendingCallback => "no pending callback",
            Self::UnknownEvent => "unknown event",
            Self::OutOfRange => "out of range",
            Self::UnexpectedReply => "unexpected reply",
            Self::Internal => "internal",
        };
        formatter.write_str(label)
    }
}

/// One `(message, kind)` pair reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    /// Human-readable message.
    pub message: String,
    /// Service-defined error kind, for example `ValidationError`.
    pub kind: String,
}

impl ErrorEntry {
    /// Builds an entry.
    #[must_use]
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
        }
    }
}

/// Failure delivered to a continuation or to the generic error subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct ErrorRecord {
    kind: ErrorKind,
    entries: Vec<ErrorEntry>,
    description: String,
}

impl ErrorRecord {
    /// Builds a record with no service entries.
    #[must_use]
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            description: description.into(),
        }
    }

    /// Builds the record for a service error envelope.
    ///
    /// The description reads
    /// `ERROR. Operation: sign/run, Error message(s):{ValidationError:'bad pid'} `.
    #[must_use]
    pub fn from_service(operation: Option<&str>, entries: Vec<ErrorEntry>) -> Self {
        let mut description = String::from("ERROR.");
        if let Some(path) = operation {
            description.push_str(" Operation: ");
            description.push_str(path);
        }
        if !entries.is_empty() {
            description.push_str(", Error message(s):");
            for entry in &entries {
                description.push_str(&format!("{{{}:'{}'}} ", entry.kind, entry.message));
            }
        }
        Self {
            kind: ErrorKind::OperationFailed,
            entries,
            description,
        }
    }

    /// Appends the serialised offending message to the description.
    #[must_use]
    pub fn with_dump(mut self, dump: &str) -> Self {
        if !self.description.ends_with(' ') {
            self.description.push(' ');
        }
        self.description.push_str("Json response follows:\n");
        self.description.push_str(dump);
        self
    }

    /// Classification of the failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Entries reported by the service, in wire order.
    #[must_use]
    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    /// Composed human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Reasons a single inbound message could not be delivered as a success.
///
/// Variants holding `dump` carry the serialised offending message so the
/// eventual subscriber can log it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The message is not a protocol envelope.
    #[error("malformed message: {reason}")]
    ProtocolMalformed {
        /// Why validation rejected the message.
        reason: String,
    },

    /// A required field is absent.
    #[error("Could not find JSON field \"{field}\" in the JSON obj:\n{dump}")]
    FieldMissing {
        /// Slash-separated path of the missing field.
        field: String,
        /// Serialised message.
        dump: String,
    },

    /// A field is present but cannot be decoded.
    #[error("Could not decode JSON field \"{field}\" ({reason}) in the JSON obj:\n{dump}")]
    FieldInvalid {
        /// Slash-separated path of the field.
        field: String,
        /// Decoder complaint.
        reason: String,
        /// Serialised message.
        dump: String,
    },

    /// The service did not confirm the operation.
    #[error("{reason}. JSON response follows:\n{dump}")]
    OperationFailed {
        /// Summary of the failed request.
        reason: String,
        /// Serialised message.
        dump: String,
    },

    /// A reply arrived for an exchange with no registered continuation.
    #[error("ERROR. Received {subject}. No callback found. Json response follows:\n{dump}")]
    NoPendingCallback {
        /// What the reply carried, for example `pseudo random value`.
        subject: &'static str,
        /// Serialised message.
        dump: String,
    },

    /// An event carried a status string outside the known set.
    #[error("unrecognised value '{value}' for JSON field \"{field}\" in the JSON obj:\n{dump}")]
    UnknownEvent {
        /// Slash-separated path of the field.
        field: String,
        /// Offending value.
        value: String,
        /// Serialised message.
        dump: String,
    },

    /// A device index falls outside the reported device list.
    #[error("index {index} into JSON field \"{field}\" is out of range for {len} entries:\n{dump}")]
    OutOfRange {
        /// Slash-separated path of the indexed array.
        field: String,
        /// Requested index.
        index: usize,
        /// Array length.
        len: usize,
        /// Serialised message.
        dump: String,
    },

    /// The reply does not fit the continuation registered for the exchange.
    #[error("received a {received} reply for a continuation expecting {expected}")]
    UnexpectedReply {
        /// Family of the decoded reply.
        received: String,
        /// Family of the registered continuation.
        expected: &'static str,
    },

    /// Internal dispatcher state is unusable.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl DispatchError {
    /// Classification used for the resulting [`ErrorRecord`].
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProtocolMalformed { .. } => ErrorKind::ProtocolMalformed,
            Self::FieldMissing { .. } => ErrorKind::FieldMissing,
            Self::FieldInvalid { .. } => ErrorKind::FieldInvalid,
            Self::OperationFailed { .. } => ErrorKind::OperationFailed,
            Self::NoPendingCallback { .. } => ErrorKind::NoPendingCallback,
            Self::UnknownEvent { .. } => ErrorKind::UnknownEvent,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::UnexpectedReply { .. } => ErrorKind::UnexpectedReply,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Converts the error into the record handed to subscribers.
    #[must_use]
    pub fn into_record(self) -> ErrorRecord {
        ErrorRecord::new(self.kind(), self.to_string())
    }

    /// Creates a protocol malformed error.
    #[must_use]
    pub fn protocol_malformed(reason: impl Into<String>) -> Self {
        Self::ProtocolMalformed {
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn field_missing(field: impl Into<String>, dump: impl Into<String>) -> Self {
        Self::FieldMissing {
            field: field.into(),
            dump: dump.into(),
        }
    }

    /// Creates an invalid field error.
    #[must_use]
    pub fn field_invalid(
        field: impl Into<String>,
        reason: impl Into<String>,
        dump: impl Into<String>,
    ) -> Self {
        Self::FieldInvalid {
            field: field.into(),
            reason: reason.into(),
            dump: dump.into(),
        }
    }

    /// Creates an operation failed error.
    #[must_use]
    pub fn operation_failed(reason: impl Into<String>, dump: impl Into<String>) -> Self {
        Self::OperationFailed {
            reason: reason.into(),
            dump: dump.into(),
        }
    }

    /// Creates a no pending callback error.
    #[must_use]
    pub fn no_pending_callback(subject: &'static str, dump: impl Into<String>) -> Self {
        Self::NoPendingCallback {
            subject,
            dump: dump.into(),
        }
    }

    /// Creates an unknown event error.
    #[must_use]
    pub fn unknown_event(
        field: impl Into<String>,
        value: impl Into<String>,
        dump: impl Into<String>,
    ) -> Self {
        Self::UnknownEvent {
            field: field.into(),
            value: value.into(),
            dump: dump.into(),
        }
    }

    /// Creates an out of range error.
    #[must_use]
    pub fn out_of_range(
        field: impl Into<String>,
        index: usize,
        len: usize,
        dump: impl Into<String>,
    ) -> Self {
        Self::OutOfRange {
            field: field.into(),
            index,
            len,
            dump: dump.into(),
        }
    }

    /// Creates an unexpected reply error.
    #[must_use]
    pub fn unexpected_reply(received: impl Into<String>, expected: &'static str) -> Self {
        Self::UnexpectedReply {
            received: received.into(),
            expected,
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Errors returned by [`crate::CorrelationRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A continuation is already live for the exchange.
    #[error("exchange '{exchange}' already has a pending continuation")]
    DuplicateExchange {
        /// Wire form of the exchange.
        exchange: String,
    },

    /// A thread panicked while holding the registry lock.
    #[error("correlation registry lock poisoned")]
    Poisoned,
}

/// Errors raised while assembling a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A subscriber slot was never bound.
    #[error("no subscriber bound for {subscriber}")]
    MissingSubscriber {
        /// Name of the unbound slot.
        subscriber: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn composes_service_error_description() {
        let record = ErrorRecord::from_service(
            Some("sign/run"),
            vec![ErrorEntry::new("bad pid", "ValidationError")],
        );

        assert_eq!(
            record.description(),
            "ERROR. Operation: sign/run, Error message(s):{ValidationError:'bad pid'} "
        );
        assert_eq!(record.kind(), ErrorKind::OperationFailed);
        assert_eq!(record.entries().len(), 1);
    }

    #[rstest]
    fn service_error_without_entries_names_only_the_operation() {
        let record = ErrorRecord::from_service(Some("totp/run"), Vec::new());
        assert_eq!(record.description(), "ERROR. Operation: totp/run");
    }

    #[rstest]
    fn dump_keeps_entries_and_extends_description() {
        let record = ErrorRecord::from_service(
            Some("random/run"),
            vec![ErrorEntry::new("expired", "SessionError")],
        )
        .with_dump(r#"{"exchange":"ghost-8"}"#);

        assert_eq!(
            record.description(),
            "ERROR. Operation: random/run, Error message(s):{SessionError:'expired'} \
             Json response follows:\n{\"exchange\":\"ghost-8\"}"
        );
        assert_eq!(record.entries(), [ErrorEntry::new("expired", "SessionError")]);
    }

    #[rstest]
    fn missing_field_record_names_the_field_and_dump() {
        let record =
            DispatchError::field_missing("response/pseudoRandomNumber", r#"{"a":1}"#).into_record();

        assert_eq!(record.kind(), ErrorKind::FieldMissing);
        assert!(record.description().contains("response/pseudoRandomNumber"));
        assert!(record.description().contains(r#"{"a":1}"#));
    }

    #[rstest]
    fn no_pending_callback_mentions_subject() {
        let error = DispatchError::no_pending_callback("signature", "{}");
        assert_eq!(error.kind(), ErrorKind::NoPendingCallback);
        assert!(error.to_string().contains("Received signature. No callback found"));
    }
}
