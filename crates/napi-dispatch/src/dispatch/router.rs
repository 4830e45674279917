//! Operation routing table.
//!
//! Inbound messages are classified by the first segment of their operation
//! path. Segments outside the table are not errors: the service emits
//! operations this client never asked about, and those are dropped.

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Known operation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Pseudo-random value generation.
    Random,
    /// Symmetric key creation and retrieval.
    SymmetricKey,
    /// Message signing.
    Sign,
    /// One-time code seed creation and code retrieval.
    Totp,
    /// Haptic notification.
    Notify,
    /// Provisioning reports and mode changes.
    Provision,
    /// Provision lists and device info.
    Info,
    /// Key removal.
    Key,
    /// Notification settings and status change events.
    Api,
    /// Provision revocation.
    RevokeProvision,
}

impl Operation {
    /// Parses the leading operation segment.
    ///
    /// Returns `None` for segments outside the table.
    #[must_use]
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "random" => Some(Self::Random),
            "symmetricKey" => Some(Self::SymmetricKey),
            "sign" => Some(Self::Sign),
            "totp" => Some(Self::Totp),
            "buzz" | "notify" => Some(Self::Notify),
            "provision" => Some(Self::Provision),
            "info" => Some(Self::Info),
            "key" => Some(Self::Key),
            "api" => Some(Self::Api),
            "revokeProvision" | "revoke" => Some(Self::RevokeProvision),
            _ => None,
        }
    }

    /// Returns the canonical wire segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::SymmetricKey => "symmetricKey",
            Self::Sign => "sign",
            Self::Totp => "totp",
            Self::Notify => "notify",
            Self::Provision => "provision",
            Self::Info => "info",
            Self::Key => "key",
            Self::Api => "api",
            Self::RevokeProvision => "revokeProvision",
        }
    }

    /// Returns `true` for families whose replies complete a registered
    /// continuation, and whose error envelopes are therefore routed to it.
    #[must_use]
    pub const fn is_session_scoped(self) -> bool {
        !matches!(self, Self::Provision | Self::Api)
    }
}
