//! Single-shot continuations registered against exchange tokens.
//!
//! Each request family has its own variant so the payload type is fixed when
//! the caller registers. The dispatcher decodes a reply into a `Payload`
//! and hands it to `Continuation::deliver`, which pairs variants and turns
//! any mismatch into a failure instead of dropping the callback.

use std::fmt;

use crate::error::{DispatchError, ErrorRecord};
use crate::types::{DeviceInfo, HapticNotification, KeyType, Signature};

/// Outcome handed to a continuation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    /// Provision id from the request, or from the exchange token for
    /// device-info queries. Empty when the reply carried none.
    pub pid: String,
    /// Decoded payload or the failure that replaced it.
    pub outcome: Result<T, ErrorRecord>,
}

impl<T> Reply<T> {
    /// Successful reply.
    #[must_use]
    pub fn ok(pid: impl Into<String>, value: T) -> Self {
        Self {
            pid: pid.into(),
            outcome: Ok(value),
        }
    }

    /// Failed reply.
    #[must_use]
    pub fn failed(pid: impl Into<String>, record: ErrorRecord) -> Self {
        Self {
            pid: pid.into(),
            outcome: Err(record),
        }
    }

    /// Returns `true` when the reply carries a payload.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Boxed single-shot callback.
pub type Callback<T> = Box<dyn FnOnce(Reply<T>) + Send>;

/// Pending completion for one outstanding request.
pub enum Continuation {
    /// `random/run`.
    Random(Callback<String>),
    /// `symmetricKey/run` and `totp/run`.
    KeyCreated(Callback<KeyType>),
    /// `symmetricKey/get`.
    SymmetricKey(Callback<String>),
    /// `sign/run`.
    Signature(Callback<Signature>),
    /// `totp/get`.
    Totp(Callback<String>),
    /// `notify/run`.
    Notify(Callback<HapticNotification>),
    /// `revokeProvision/run`.
    Revoke(Callback<()>),
    /// `key/delete`.
    KeyRemoved(Callback<KeyType>),
    /// `info/get` for a single device.
    DeviceInfo(Callback<DeviceInfo>),
}

impl Continuation {
    /// Wraps a random-value callback.
    #[must_use]
    pub fn random(callback: impl FnOnce(Reply<String>) + Send + 'static) -> Self {
        Self::Random(Box::new(callback))
    }

    /// Wraps a key-creation callback.
    #[must_use]
    pub fn key_created(callback: impl FnOnce(Reply<KeyType>) + Send + 'static) -> Self {
        Self::KeyCreated(Box::new(callback))
    }

    /// Wraps a symmetric-key retrieval callback.
    #[must_use]
    pub fn symmetric_key(callback: impl FnOnce(Reply<String>) + Send + 'static) -> Self {
        Self::SymmetricKey(Box::new(callback))
    }

    /// Wraps a signing callback.
    #[must_use]
    pub fn signature(callback: impl FnOnce(Reply<Signature>) + Send + 'static) -> Self {
        Self::Signature(Box::new(callback))
    }

    /// Wraps a one-time code retrieval callback.
    #[must_use]
    pub fn totp(callback: impl FnOnce(Reply<String>) + Send + 'static) -> Self {
        Self::Totp(Box::new(callback))
    }

    /// Wraps a haptic notification callback.
    #[must_use]
    pub fn notify(callback: impl FnOnce(Reply<HapticNotification>) + Send + 'static) -> Self {
        Self::Notify(Box::new(callback))
    }

    /// Wraps a provision revocation callback.
    #[must_use]
    pub fn revoke(callback: impl FnOnce(Reply<()>) + Send + 'static) -> Self {
        Self::Revoke(Box::new(callback))
    }

    /// Wraps a key removal callback.
    #[must_use]
    pub fn key_removed(callback: impl FnOnce(Reply<KeyType>) + Send + 'static) -> Self {
        Self::KeyRemoved(Box::new(callback))
    }

    /// Wraps a device-info callback.
    #[must_use]
    pub fn device_info(callback: impl FnOnce(Reply<DeviceInfo>) + Send + 'static) -> Self {
        Self::DeviceInfo(Box::new(callback))
    }

    /// Name of the reply family this continuation expects.
    #[must_use]
    pub const fn family(&self) -> &'static str {
        match self {
            Self::Random(_) => "random",
            Self::KeyCreated(_) => "key creation",
            Self::SymmetricKey(_) => "symmetric key",
            Self::Signature(_) => "signature",
            Self::Totp(_) => "totp",
            Self::Notify(_) => "notification",
            Self::Revoke(_) => "revocation",
            Self::KeyRemoved(_) => "key removal",
            Self::DeviceInfo(_) => "device info",
        }
    }

    /// Consumes the continuation with a failure.
    pub fn fail(self, pid: impl Into<String>, record: ErrorRecord) {
        match self {
            Self::Random(callback)
            | Self::SymmetricKey(callback)
            | Self::Totp(callback) => callback(Reply::failed(pid, record)),
            Self::KeyCreated(callback) | Self::KeyRemoved(callback) => {
                callback(Reply::failed(pid, record));
            }
            Self::Signature(callback) => callback(Reply::failed(pid, record)),
            Self::Notify(callback) => callback(Reply::failed(pid, record)),
            Self::Revoke(callback) => callback(Reply::failed(pid, record)),
            Self::DeviceInfo(callback) => callback(Reply::failed(pid, record)),
        }
    }

    /// Consumes the continuation with a decode outcome.
    pub(crate) fn deliver(self, pid: String, outcome: Result<Payload, DispatchError>) {
        match outcome {
            Ok(payload) => self.accept(pid, payload),
            Err(error) => self.fail(pid, error.into_record()),
        }
    }

    fn accept(self, pid: String, payload: Payload) {
        match (self, payload) {
            (Self::Random(callback), Payload::Random(value))
            | (Self::SymmetricKey(callback), Payload::SymmetricKey(value))
            | (Self::Totp(callback), Payload::Totp(value)) => callback(Reply::ok(pid, value)),
            (Self::KeyCreated(callback), Payload::KeyCreated(key_type))
            | (Self::KeyRemoved(callback), Payload::KeyRemoved(key_type)) => {
                callback(Reply::ok(pid, key_type));
            }
            (Self::Signature(callback), Payload::Signature(signature)) => {
                callback(Reply::ok(pid, signature));
            }
            (Self::Notify(callback), Payload::Notify(notification)) => {
                callback(Reply::ok(pid, notification));
            }
            (Self::Revoke(callback), Payload::Revoke) => callback(Reply::ok(pid, ())),
            (Self::DeviceInfo(callback), Payload::DeviceInfo(info)) => {
                callback(Reply::ok(pid, info));
            }
            (continuation, unexpected) => {
                let expected = continuation.family();
                let record =
                    DispatchError::unexpected_reply(unexpected.family(), expected).into_record();
                continuation.fail(pid, record);
            }
        }
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Continuation")
            .field(&self.family())
            .finish()
    }
}

/// Decoded reply body awaiting a matching continuation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    Random(String),
    KeyCreated(KeyType),
    SymmetricKey(String),
    Signature(Signature),
    Totp(String),
    Notify(HapticNotification),
    Revoke,
    KeyRemoved(KeyType),
    DeviceInfo(DeviceInfo),
}

impl Payload {
    const fn family(&self) -> &'static str {
        match self {
            Self::Random(_) => "random",
            Self::KeyCreated(_) => "key creation",
            Self::SymmetricKey(_) => "symmetric key",
            Self::Signature(_) => "signature",
            Self::Totp(_) => "totp",
            Self::Notify(_) => "notification",
            Self::Revoke => "revocation",
            Self::KeyRemoved(_) => "key removal",
            Self::DeviceInfo(_) => "device info",
        }
    }
}
