//! Correlation registry mapping exchange tokens to pending continuations.
//!
//! The registry is shared between the threads that issue requests and the
//! listener thread that completes them. A single mutex serialises access, and
//! `take` removes the entry in the same critical section that finds it, so a
//! continuation can be claimed at most once.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::continuation::Continuation;
use crate::error::RegistryError;
use crate::exchange::Exchange;

const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Pending continuations keyed by exchange token.
#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    pending: Mutex<HashMap<Exchange, Continuation>>,
}

impl CorrelationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `continuation` for `exchange`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateExchange`] when a continuation is
    /// already live for the token, leaving the existing entry untouched, and
    /// [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn register(
        &self,
        exchange: Exchange,
        continuation: Continuation,
    ) -> Result<(), RegistryError> {
        let mut pending = self.lock()?;
        if pending.contains_key(&exchange) {
            return Err(RegistryError::DuplicateExchange {
                exchange: exchange.to_string(),
            });
        }
        debug!(
            target: REGISTRY_TARGET,
            exchange = %exchange,
            family = continuation.family(),
            "registered continuation"
        );
        pending.insert(exchange, continuation);
        Ok(())
    }

    /// Removes and returns the continuation for `exchange`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn take(&self, exchange: &Exchange) -> Result<Option<Continuation>, RegistryError> {
        let continuation = self.lock()?.remove(exchange);
        if continuation.is_some() {
            debug!(target: REGISTRY_TARGET, exchange = %exchange, "claimed continuation");
        }
        Ok(continuation)
    }

    /// Number of live continuations.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] when the lock is poisoned.
    pub fn pending(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Exchange, Continuation>>, RegistryError> {
        self.pending.lock().map_err(|_| RegistryError::Poisoned)
    }
}
