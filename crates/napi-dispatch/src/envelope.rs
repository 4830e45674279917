//! Protocol envelope parsing and field access.
//!
//! An [`Envelope`] is built from one parsed JSON message. Construction is the
//! envelope validation step: `operation`, `path` and `successful` must have
//! the expected shapes, and at least one of `operation`, `errors` or
//! `successful` must be present. The `errors` list and the `exchange` token
//! are read leniently so an error envelope can always be routed to the
//! continuation it names. Everything below the top level stays as
//! raw JSON and is reached through the typed `require_*` accessors, which
//! report the exact missing or malformed field.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{DispatchError, ErrorEntry};
use crate::exchange::Exchange;

/// Top-level fields decoded eagerly.
#[derive(Debug, Deserialize)]
struct Head {
    #[serde(default)]
    operation: Option<Vec<String>>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    exchange: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
    #[serde(default)]
    successful: Option<bool>,
}

/// A validated inbound message.
#[derive(Debug, Clone)]
pub struct Envelope {
    operation: Vec<String>,
    path: Option<String>,
    exchange: Option<Exchange>,
    errors: Option<Vec<ErrorEntry>>,
    successful: Option<bool>,
    raw: Value,
}

impl Envelope {
    /// Validates `raw` and builds an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ProtocolMalformed`] when `raw` is not an
    /// object, when `operation`, `path` or `successful` has the wrong type,
    /// or when the message carries none of `operation`, `errors` and
    /// `successful`.
    pub fn from_value(raw: Value) -> Result<Self, DispatchError> {
        if !raw.is_object() {
            return Err(DispatchError::protocol_malformed(format!(
                "expected a JSON object, got {raw}"
            )));
        }

        let head = Head::deserialize(&raw)
            .map_err(|error| DispatchError::protocol_malformed(error.to_string()))?;

        if head.operation.is_none() && head.errors.is_none() && head.successful.is_none() {
            return Err(DispatchError::protocol_malformed(
                "message carries none of \"operation\", \"errors\" or \"successful\"",
            ));
        }

        let errors = head.errors.as_ref().map(error_entries);

        Ok(Self {
            operation: head.operation.unwrap_or_default(),
            path: head.path,
            exchange: head.exchange.as_ref().and_then(exchange_token),
            errors,
            successful: head.successful,
            raw,
        })
    }

    /// Operation path segments, for example `["symmetricKey", "get"]`.
    #[must_use]
    pub fn operation(&self) -> &[String] {
        &self.operation
    }

    /// Returns the operation segment at `index`.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.operation.get(index).map(String::as_str)
    }

    /// Slash-separated operation path.
    ///
    /// Error envelopes name the failed operation in `path`; ordinary replies
    /// only carry the `operation` array, which is joined as a fallback.
    #[must_use]
    pub fn operation_path(&self) -> Option<String> {
        self.path.clone().or_else(|| {
            if self.operation.is_empty() {
                None
            } else {
                Some(self.operation.join("/"))
            }
        })
    }

    /// Exchange token echoed by the service.
    #[must_use]
    pub const fn exchange(&self) -> Option<&Exchange> {
        self.exchange.as_ref()
    }

    /// Top-level success flag.
    #[must_use]
    pub const fn successful(&self) -> Option<bool> {
        self.successful
    }

    /// Service error entries, empty when none were reported.
    #[must_use]
    pub fn errors(&self) -> &[ErrorEntry] {
        self.errors.as_deref().unwrap_or_default()
    }

    /// Returns `true` for error envelopes (`errors` present or
    /// `successful == false`).
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.errors.is_some() || self.successful == Some(false)
    }

    /// Serialised form of the whole message for diagnostics.
    #[must_use]
    pub fn dump(&self) -> String {
        self.raw.to_string()
    }

    /// Raw JSON of the whole message.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Walks `path` from the message root.
    #[must_use]
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.raw, |value, key| value.get(*key))
    }

    /// Returns the string at `path` when present.
    #[must_use]
    pub fn lookup_str(&self, path: &[&str]) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Returns `true` when the boolean at `path` equals `expected`.
    ///
    /// Absent or non-boolean values never match.
    #[must_use]
    pub fn flag_is(&self, path: &[&str], expected: bool) -> bool {
        self.lookup(path).and_then(Value::as_bool) == Some(expected)
    }

    /// Request-scoped provision id (`request.pid`).
    #[must_use]
    pub fn pid(&self) -> Option<&str> {
        self.lookup_str(&["request", "pid"])
    }

    /// Returns the value at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::FieldMissing`] when the field is absent.
    pub fn require(&self, path: &[&str]) -> Result<&Value, DispatchError> {
        self.lookup(path)
            .ok_or_else(|| DispatchError::field_missing(path.join("/"), self.dump()))
    }

    /// Returns the string at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::FieldMissing`] when the field is absent and
    /// [`DispatchError::FieldInvalid`] when it is not a string.
    pub fn require_str(&self, path: &[&str]) -> Result<String, DispatchError> {
        let value = self.require(path)?;
        value.as_str().map(str::to_owned).ok_or_else(|| {
            DispatchError::field_invalid(path.join("/"), "expected a string", self.dump())
        })
    }

    /// Returns the boolean at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::FieldMissing`] when the field is absent and
    /// [`DispatchError::FieldInvalid`] when it is not a boolean.
    pub fn require_bool(&self, path: &[&str]) -> Result<bool, DispatchError> {
        let value = self.require(path)?;
        value.as_bool().ok_or_else(|| {
            DispatchError::field_invalid(path.join("/"), "expected a boolean", self.dump())
        })
    }

    /// Decodes the value at `path` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::FieldMissing`] when the field is absent and
    /// [`DispatchError::FieldInvalid`] when it does not match `T`.
    pub fn require_as<T>(&self, path: &[&str]) -> Result<T, DispatchError>
    where
        T: DeserializeOwned,
    {
        let value = self.require(path)?;
        T::deserialize(value).map_err(|error| {
            DispatchError::field_invalid(path.join("/"), error.to_string(), self.dump())
        })
    }

    /// Returns the request pid.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::FieldMissing`] naming `request/pid`.
    pub fn require_pid(&self) -> Result<String, DispatchError> {
        self.require_str(&["request", "pid"])
    }
}

/// Reads the service error list.
///
/// Each entry is a `[message, kind]` array; missing elements read as empty,
/// extra elements are ignored and a bare string is a message without a
/// kind. A list of any other shape yields no entries, which still marks the
/// message as an error envelope.
fn error_entries(errors: &Value) -> Vec<ErrorEntry> {
    errors
        .as_array()
        .map(|items| items.iter().filter_map(error_entry).collect())
        .unwrap_or_default()
}

fn error_entry(item: &Value) -> Option<ErrorEntry> {
    match item {
        Value::Array(pair) => Some(ErrorEntry::new(
            pair.first().map(text).unwrap_or_default(),
            pair.get(1).map(text).unwrap_or_default(),
        )),
        Value::String(message) => Some(ErrorEntry::new(message.as_str(), "")),
        _ => None,
    }
}

/// Exchange token from a string or numeric `exchange` field.
fn exchange_token(value: &Value) -> Option<Exchange> {
    match value {
        Value::String(wire) => Some(Exchange::new(wire.as_str())),
        Value::Number(number) => Some(Exchange::new(number.to_string())),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    value.as_str().map_or_else(|| value.to_string(), str::to_owned)
}
