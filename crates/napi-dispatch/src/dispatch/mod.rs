//! Message dispatch for the device-management protocol.
//!
//! A [`Dispatcher`] owns the subscriber bindings and shares the correlation
//! registry with request-issuing code. Each validated envelope is either an
//! error envelope, handed to the failure router, or routed by the first
//! segment of its operation path to a family handler.
//!
//! Handlers return `Err` only for failures that have no continuation to
//! receive them; those are reported to the generic error subscriber. Every
//! message therefore ends in at most one delivery, and in exactly one when it
//! names a live exchange.

mod failure;
mod info;
mod notifications;
mod provision;
mod router;
mod session;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

pub(crate) use self::router::DISPATCH_TARGET;
pub use self::router::Operation;
use crate::continuation::Continuation;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::exchange::Exchange;
use crate::registry::CorrelationRegistry;
use crate::subscribers::Subscribers;

/// Routes inbound messages to continuations and subscribers.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<CorrelationRegistry>,
    subscribers: Subscribers,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared registry.
    #[must_use]
    pub const fn new(registry: Arc<CorrelationRegistry>, subscribers: Subscribers) -> Self {
        Self {
            registry,
            subscribers,
        }
    }

    /// Registry this dispatcher completes continuations from.
    #[must_use]
    pub const fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    /// Validates and dispatches one parsed message.
    ///
    /// A message that fails envelope validation is reported to the generic
    /// error subscriber as `ProtocolMalformed`.
    pub fn dispatch_value(&mut self, raw: Value) {
        match Envelope::from_value(raw) {
            Ok(envelope) => self.dispatch(&envelope),
            Err(error) => self.report(error),
        }
    }

    /// Dispatches one validated envelope.
    pub fn dispatch(&mut self, envelope: &Envelope) {
        let outcome = if envelope.is_error() {
            failure::route(self, envelope)
        } else {
            self.route(envelope)
        };
        if let Err(error) = outcome {
            self.report(error);
        }
    }

    fn route(&mut self, envelope: &Envelope) -> Result<(), DispatchError> {
        let Some(segment) = envelope.segment(0) else {
            debug!(target: DISPATCH_TARGET, "message carries no operation, ignoring");
            return Ok(());
        };
        let Some(operation) = Operation::parse(segment) else {
            debug!(target: DISPATCH_TARGET, operation = segment, "unknown operation, ignoring");
            return Ok(());
        };

        let exchange = envelope.exchange().map(ToString::to_string).unwrap_or_default();
        debug!(
            target: DISPATCH_TARGET,
            operation = operation.as_str(),
            exchange = exchange.as_str(),
            "routing message"
        );

        match operation {
            Operation::Random => session::random(self, envelope),
            Operation::SymmetricKey => session::symmetric_key(self, envelope),
            Operation::Sign => session::sign(self, envelope),
            Operation::Totp => session::totp(self, envelope),
            Operation::Notify => session::notify(self, envelope),
            Operation::RevokeProvision => session::revoke(self, envelope),
            Operation::Key => session::key(self, envelope),
            Operation::Provision => provision::handle(self, envelope),
            Operation::Info => info::handle(self, envelope),
            Operation::Api => notifications::handle(self, envelope),
        }
    }

    /// Removes the continuation registered for `exchange`.
    fn claim(&self, exchange: &Exchange) -> Result<Option<Continuation>, DispatchError> {
        self.registry
            .take(exchange)
            .map_err(|error| DispatchError::internal(error.to_string()))
    }

    /// Reports a failure with no continuation to the generic error subscriber.
    pub(crate) fn report(&mut self, error: DispatchError) {
        warn!(
            target: DISPATCH_TARGET,
            kind = %error.kind(),
            error = %error,
            "reporting failure to error subscriber"
        );
        self.subscribers.error(error.into_record());
    }
}

/// Returns the exchange token or the error naming its absence.
fn require_exchange(envelope: &Envelope) -> Result<&Exchange, DispatchError> {
    envelope
        .exchange()
        .ok_or_else(|| DispatchError::field_missing("exchange", envelope.dump()))
}
