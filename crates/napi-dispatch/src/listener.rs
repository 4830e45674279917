//! Message loop driving a [`Dispatcher`] from a [`MessageSource`].

use std::io;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use napi_config::Config;
use thiserror::Error;
use tracing::{debug, info};

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::source::{MessageSource, SourceError, SourcePoll};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::listener");
const THREAD_NAME: &str = "napi-listener";

/// Errors surfaced while starting or joining the listener thread.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The operating system refused to start the thread.
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        /// Underlying spawn failure.
        #[source]
        source: io::Error,
    },
    /// The listener thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// Shared stop flag for a running listener.
///
/// Requesting a stop is idempotent and may happen from any thread. The loop
/// observes the flag between polls, so the message being dispatched when the
/// stop arrives is still completed.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Creates a handle in the running state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the loop to exit after the current iteration.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Single-threaded message loop.
#[derive(Debug)]
pub struct Listener<S> {
    source: S,
    dispatcher: Dispatcher,
    poll_interval: Duration,
    stop: StopHandle,
}

impl<S: MessageSource> Listener<S> {
    /// Builds a listener polling `source` at the configured interval.
    #[must_use]
    pub fn new(source: S, dispatcher: Dispatcher, config: &Config) -> Self {
        Self {
            source,
            dispatcher,
            poll_interval: config.poll_interval(),
            stop: StopHandle::new(),
        }
    }

    /// Handle that stops this listener.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs the loop on the calling thread until a stop is requested or the
    /// source reports that it has stopped.
    ///
    /// Malformed input is reported to the generic error subscriber and never
    /// ends the loop.
    pub fn run(&mut self) {
        info!(
            target: LISTENER_TARGET,
            poll_interval_ms = self.poll_interval.as_millis(),
            "message listener active"
        );
        while !self.stop.is_stopped() {
            match self.source.poll(self.poll_interval) {
                Ok(SourcePoll::Message(message)) => {
                    debug!(target: LISTENER_TARGET, body = %message, "received message");
                    self.dispatcher.dispatch_value(message);
                }
                Ok(SourcePoll::Timeout) => {}
                Ok(SourcePoll::Stopped) => {
                    info!(target: LISTENER_TARGET, "message source stopped");
                    break;
                }
                Err(SourceError::Malformed { raw, source }) => {
                    self.dispatcher.report(DispatchError::protocol_malformed(format!(
                        "could not parse message ({source}):\n{raw}"
                    )));
                }
            }
        }
        info!(target: LISTENER_TARGET, "message listener exiting");
    }
}

impl<S: MessageSource + 'static> Listener<S> {
    /// Moves the loop onto a dedicated thread.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Spawn`] when the thread cannot be started.
    pub fn spawn(mut self) -> Result<ListenerHandle, ListenerError> {
        let stop = self.stop_handle();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(move || self.run())
            .map_err(|source| ListenerError::Spawn { source })?;
        Ok(ListenerHandle {
            stop,
            handle: Some(handle),
        })
    }
}

/// Handle to the background listener thread.
///
/// Dropping the handle requests a stop without waiting for the thread.
#[derive(Debug)]
pub struct ListenerHandle {
    stop: StopHandle,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Requests the loop to stop.
    pub fn shutdown(&self) {
        self.stop.request_stop();
    }

    /// Stop handle shared with the loop.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Waits for the loop thread to exit.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the thread panicked, for
    /// example inside a subscriber callback.
    pub fn join(mut self) -> Result<(), ListenerError> {
        self.handle
            .take()
            .map_or(Ok(()), |handle| handle.join().map_err(|_| ListenerError::ThreadPanic))
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.stop.request_stop();
    }
}
