//! Error envelope routing.
//!
//! An error envelope for a correlated family fails the continuation
//! registered under its exchange. Everything else, including errors whose
//! exchange has no live continuation, reaches the generic error subscriber
//! with the raw message appended.

use tracing::warn;

use super::{DISPATCH_TARGET, Dispatcher, Operation};
use crate::envelope::Envelope;
use crate::error::{DispatchError, ErrorRecord};

pub(super) fn route(dispatcher: &mut Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    let path = envelope.operation_path();
    let record = ErrorRecord::from_service(path.as_deref(), envelope.errors().to_vec());

    let session_scoped = path
        .as_deref()
        .and_then(|operation| operation.split('/').next())
        .and_then(Operation::parse)
        .is_some_and(Operation::is_session_scoped);

    if session_scoped
        && let Some(exchange) = envelope.exchange()
        && let Some(continuation) = dispatcher.claim(exchange)?
    {
        let pid = exchange.pid().or_else(|| envelope.pid()).unwrap_or_default();
        warn!(
            target: DISPATCH_TARGET,
            exchange = %exchange,
            family = continuation.family(),
            error = %record,
            "service reported failure"
        );
        continuation.fail(pid, record);
        return Ok(());
    }

    warn!(target: DISPATCH_TARGET, error = %record, "service reported uncorrelated failure");
    dispatcher.subscribers.error(record.with_dump(&envelope.dump()));
    Ok(())
}
