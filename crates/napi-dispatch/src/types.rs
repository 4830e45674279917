//! Typed payloads delivered to continuations and subscribers.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

/// Kind of key created or removed on a provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum KeyType {
    /// Symmetric key.
    Symmetric,
    /// Time-based one-time password seed.
    Totp,
    /// The service acknowledged the request but named neither key kind.
    Error,
}

/// Haptic pattern the device was asked to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum HapticNotification {
    /// Positive confirmation pattern.
    Positive,
    /// Negative confirmation pattern.
    Negative,
}

impl HapticNotification {
    /// Maps the `request.buzz` flag onto a notification kind.
    #[must_use]
    pub const fn from_buzz(buzz: bool) -> Self {
        if buzz { Self::Positive } else { Self::Negative }
    }
}

/// Discovery state of a device as reported by `found-change` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum FoundStatus {
    /// State not yet known.
    Undefined,
    /// Seen but not identified.
    Anonymous,
    /// Identified and authenticated.
    Authenticated,
    /// No longer seen.
    Disappeared,
    /// Seen by the service.
    Found,
    /// Matched to a provision.
    Identified,
    /// Newly provisioned.
    Provisioned,
    /// Seen but not worn.
    Unclasped,
}

/// Proximity state of a device as reported by `presence-change` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum PresenceStatus {
    /// State not yet known.
    Undefined,
    /// Not present.
    No,
    /// Probably not present.
    Unlikely,
    /// Probably present.
    Likely,
    /// Present.
    Yes,
}

/// Provisioning mode transitions (`provision/run/start|stop`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum ProvisioningMode {
    /// Provisioning mode was entered.
    Start,
    /// Provisioning mode was left.
    Stop,
}

/// Handle naming one provisioned device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provision {
    pid: String,
}

impl Provision {
    /// Wraps a provision id.
    #[must_use]
    pub fn new(pid: impl Into<String>) -> Self {
        Self { pid: pid.into() }
    }

    /// Provision id.
    #[must_use]
    pub fn pid(&self) -> &str {
        &self.pid
    }
}

/// Result of a `sign` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Signature over the requested message.
    pub signature: String,
    /// Key the signature verifies against.
    pub verification_key: String,
}

/// Device description returned by a device-info query.
///
/// The blob layout belongs to the service; only the fields the dispatcher
/// itself cares about get typed accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    raw: Value,
}

impl DeviceInfo {
    /// Wraps one element of `response.nymiband`.
    #[must_use]
    pub const fn from_value(raw: Value) -> Self {
        Self { raw }
    }

    /// Provision id of the device, when it is provisioned.
    #[must_use]
    pub fn pid(&self) -> Option<&str> {
        self.raw
            .get("provisioned")
            .and_then(|provisioned| provisioned.get("pid"))
            .or_else(|| self.raw.get("pid"))
            .and_then(Value::as_str)
    }

    /// Discovery state, when reported and recognised.
    #[must_use]
    pub fn found(&self) -> Option<FoundStatus> {
        self.status("found")
    }

    /// Proximity state, when reported and recognised.
    #[must_use]
    pub fn presence(&self) -> Option<PresenceStatus> {
        self.status("present")
    }

    /// Raw device description.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    fn status<T: FromStr>(&self, key: &str) -> Option<T> {
        self.raw
            .get(key)
            .and_then(Value::as_str)
            .and_then(|value| value.parse().ok())
    }
}

/// Payload of a `found-change` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundChange {
    /// Provision id of the device.
    pub pid: String,
    /// Previous state.
    pub before: FoundStatus,
    /// New state.
    pub after: FoundStatus,
}

/// Payload of a `presence-change` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceChange {
    /// Provision id of the device.
    pub pid: String,
    /// Previous state.
    pub before: PresenceStatus,
    /// New state.
    pub after: PresenceStatus,
    /// Whether the wearer is authenticated.
    pub authenticated: bool,
}

/// Notification setting name to enabled flag, as returned by `api/get`.
pub type NotificationSettings = BTreeMap<String, bool>;
