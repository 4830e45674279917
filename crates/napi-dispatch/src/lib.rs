//! Client-side dispatcher for the device-management service's JSON protocol.
//!
//! Callers register a [`Continuation`] in the shared [`CorrelationRegistry`]
//! under the exchange token of each request they send. A [`Listener`] thread
//! polls a [`MessageSource`] for replies and events, validates each one as an
//! [`Envelope`] and hands it to the [`Dispatcher`], which
//!
//! - fails the matching continuation, or notifies the generic error
//!   subscriber, for error envelopes;
//! - decodes replies and completes the continuation registered for their
//!   exchange, removing it in the same step;
//! - forwards unsolicited events to the process-wide [`Subscribers`].
//!
//! Every failure reaches exactly one recipient as an [`ErrorRecord`]. Bad
//! input never stops the loop; only the stop flag or an exhausted source do.
//!
//! ```no_run
//! use std::sync::{Arc, mpsc};
//!
//! use napi_config::Config;
//! use napi_dispatch::{
//!     ChannelSource, Continuation, CorrelationRegistry, Dispatcher, Exchange, Listener,
//!     Subscribers,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let subscribers = Subscribers::builder()
//!     .on_agreement(|_| {})
//!     .on_provision(|_| {})
//!     .on_error(|_| {})
//!     .on_provision_list(|_| {})
//!     .on_provision_mode(|_| {})
//!     .on_found_change(|_| {})
//!     .on_presence_change(|_| {})
//!     .on_notifications(|_| {})
//!     .build()?;
//!
//! let registry = Arc::new(CorrelationRegistry::new());
//! let (sender, receiver) = mpsc::channel::<String>();
//! let dispatcher = Dispatcher::new(Arc::clone(&registry), subscribers);
//! let handle = Listener::new(ChannelSource::new(receiver), dispatcher, &Config::default()).spawn()?;
//!
//! registry.register(Exchange::new("rand-1"), Continuation::random(|_| {}))?;
//! sender.send(
//!     r#"{"operation":["random","run"],"exchange":"rand-1","request":{"pid":"p1"},"response":{"pseudoRandomNumber":"42"}}"#.to_owned(),
//! )?;
//!
//! handle.shutdown();
//! handle.join()?;
//! # Ok(())
//! # }
//! ```

mod continuation;
mod dispatch;
mod envelope;
mod error;
mod exchange;
mod listener;
mod registry;
mod source;
mod subscribers;
pub mod telemetry;
mod types;

pub use continuation::{Callback, Continuation, Reply};
pub use dispatch::{Dispatcher, Operation};
pub use envelope::Envelope;
pub use error::{DispatchError, ErrorEntry, ErrorKind, ErrorRecord, RegistryError, SetupError};
pub use exchange::{DEVICE_INFO_MARKER, Exchange, ExchangeKind};
pub use listener::{Listener, ListenerError, ListenerHandle, StopHandle};
pub use registry::CorrelationRegistry;
pub use source::{ChannelSource, MessageSource, SourceError, SourcePoll};
pub use subscribers::{Subscribers, SubscribersBuilder};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use types::{
    DeviceInfo, FoundChange, FoundStatus, HapticNotification, KeyType, NotificationSettings,
    PresenceChange, PresenceStatus, Provision, ProvisioningMode, Signature,
};

#[cfg(test)]
mod tests;
