//! Structured exchange tokens.
//!
//! The service echoes the caller-supplied `exchange` string on every reply.
//! Most tokens are opaque, but a few carry meaning: the provision list
//! queries use fixed names and device-info queries embed the pid after a
//! marker. An [`Exchange`] is keyed by the exact wire string, so a token
//! registered by a caller and the token echoed on the reply always match.
//! [`Exchange::kind`] classifies the token for decoders, which match on
//! [`ExchangeKind`] instead of slicing strings.

use std::fmt;

/// Marker preceding the pid in device-info exchange tokens.
pub const DEVICE_INFO_MARKER: &str = "deviceinfo";

const PROVISIONS: &str = "provisions";
const PROVISIONS_PRESENT: &str = "provisionsPresent";

/// Correlation token identifying one outstanding request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Exchange {
    wire: String,
}

/// Meaning carried by an exchange token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind<'a> {
    /// Opaque caller-chosen token.
    Request,
    /// Device-info query for the provision identified by `pid`.
    DeviceInfo {
        /// Provision id recovered from the token suffix.
        pid: &'a str,
    },
    /// Query for every provision known to the service.
    Provisions,
    /// Query for the provisions currently present.
    ProvisionsPresent,
}

impl Exchange {
    /// Wraps a wire token.
    ///
    /// Every token is accepted; its meaning is derived on demand by
    /// [`Exchange::kind`].
    #[must_use]
    pub fn new(wire: impl Into<String>) -> Self {
        Self { wire: wire.into() }
    }

    /// Builds the canonical device-info token for `pid`.
    #[must_use]
    pub fn device_info(pid: &str) -> Self {
        Self::new(format!("{DEVICE_INFO_MARKER}{pid}"))
    }

    /// Token as sent and echoed on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.wire
    }

    /// Classifies the token.
    ///
    /// Anything that is neither a provision list query nor contains
    /// [`DEVICE_INFO_MARKER`] is an opaque request token. Text before the
    /// marker is a caller prefix and does not affect the pid.
    #[must_use]
    pub fn kind(&self) -> ExchangeKind<'_> {
        match self.wire.as_str() {
            PROVISIONS => ExchangeKind::Provisions,
            PROVISIONS_PRESENT => ExchangeKind::ProvisionsPresent,
            wire => match wire.split_once(DEVICE_INFO_MARKER) {
                Some((_, pid)) => ExchangeKind::DeviceInfo { pid },
                None => ExchangeKind::Request,
            },
        }
    }

    /// Provision id carried by the token, if any.
    #[must_use]
    pub fn pid(&self) -> Option<&str> {
        match self.kind() {
            ExchangeKind::DeviceInfo { pid } => Some(pid),
            ExchangeKind::Request | ExchangeKind::Provisions | ExchangeKind::ProvisionsPresent => {
                None
            }
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.wire)
    }
}

impl From<&str> for Exchange {
    fn from(wire: &str) -> Self {
        Self::new(wire)
    }
}

impl From<String> for Exchange {
    fn from(wire: String) -> Self {
        Self::new(wire)
    }
}
