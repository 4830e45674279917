//! Recording doubles shared by the dispatcher test suites.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::{
    Continuation, CorrelationRegistry, DeviceInfo, Dispatcher, ErrorRecord, Exchange, FoundChange,
    HapticNotification, KeyType, NotificationSettings, PresenceChange, Provision,
    ProvisioningMode, Reply, Signature, Subscribers,
};

/// Everything a subscriber or continuation was handed, in delivery order.
#[derive(Debug, Clone, PartialEq)]
pub enum Observed {
    Agreement(Vec<String>),
    Provision(Provision),
    Error(ErrorRecord),
    ProvisionList(Vec<Provision>),
    ProvisionMode(ProvisioningMode),
    FoundChange(FoundChange),
    PresenceChange(PresenceChange),
    Notifications(NotificationSettings),
    Random(Reply<String>),
    KeyCreated(Reply<KeyType>),
    SymmetricKey(Reply<String>),
    Signature(Reply<Signature>),
    Totp(Reply<String>),
    Notify(Reply<HapticNotification>),
    Revoke(Reply<()>),
    KeyRemoved(Reply<KeyType>),
    DeviceInfo(Reply<DeviceInfo>),
}

impl Observed {
    /// Returns `true` for deliveries to a continuation.
    pub const fn is_continuation(&self) -> bool {
        matches!(
            self,
            Self::Random(_)
                | Self::KeyCreated(_)
                | Self::SymmetricKey(_)
                | Self::Signature(_)
                | Self::Totp(_)
                | Self::Notify(_)
                | Self::Revoke(_)
                | Self::KeyRemoved(_)
                | Self::DeviceInfo(_)
        )
    }

    /// Failure record carried by a continuation delivery.
    pub fn failure(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Random(reply) | Self::SymmetricKey(reply) | Self::Totp(reply) => {
                reply.outcome.as_ref().err()
            }
            Self::KeyCreated(reply) | Self::KeyRemoved(reply) => reply.outcome.as_ref().err(),
            Self::Signature(reply) => reply.outcome.as_ref().err(),
            Self::Notify(reply) => reply.outcome.as_ref().err(),
            Self::Revoke(reply) => reply.outcome.as_ref().err(),
            Self::DeviceInfo(reply) => reply.outcome.as_ref().err(),
            _ => None,
        }
    }
}

/// Thread-safe log of observed deliveries.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Observed>>>,
}

impl Recorder {
    fn push(&self, event: Observed) {
        self.events.lock().expect("recorder lock").push(event);
    }

    /// Snapshot of the deliveries so far.
    pub fn events(&self) -> Vec<Observed> {
        self.events.lock().expect("recorder lock").clone()
    }

    /// Records handed to the generic error subscriber.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Observed::Error(record) => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Deliveries made to continuations.
    pub fn continuations(&self) -> Vec<Observed> {
        self.events()
            .into_iter()
            .filter(Observed::is_continuation)
            .collect()
    }

    /// Subscribers that record into this log.
    pub fn subscribers(&self) -> Subscribers {
        let agreement = self.clone();
        let provision = self.clone();
        let error = self.clone();
        let provision_list = self.clone();
        let provision_mode = self.clone();
        let found_change = self.clone();
        let presence_change = self.clone();
        let notifications = self.clone();
        Subscribers::builder()
            .on_agreement(move |patterns| agreement.push(Observed::Agreement(patterns)))
            .on_provision(move |handle| provision.push(Observed::Provision(handle)))
            .on_error(move |record| error.push(Observed::Error(record)))
            .on_provision_list(move |list| provision_list.push(Observed::ProvisionList(list)))
            .on_provision_mode(move |mode| provision_mode.push(Observed::ProvisionMode(mode)))
            .on_found_change(move |change| found_change.push(Observed::FoundChange(change)))
            .on_presence_change(move |change| {
                presence_change.push(Observed::PresenceChange(change));
            })
            .on_notifications(move |settings| {
                notifications.push(Observed::Notifications(settings));
            })
            .build()
            .expect("all subscribers bound")
    }

    /// Continuation of the named family that records into this log.
    pub fn continuation(&self, family: &str) -> Continuation {
        let sink = self.clone();
        match family {
            "random" => Continuation::random(move |reply| sink.push(Observed::Random(reply))),
            "key creation" => {
                Continuation::key_created(move |reply| sink.push(Observed::KeyCreated(reply)))
            }
            "symmetric key" => {
                Continuation::symmetric_key(move |reply| sink.push(Observed::SymmetricKey(reply)))
            }
            "signature" => {
                Continuation::signature(move |reply| sink.push(Observed::Signature(reply)))
            }
            "totp" => Continuation::totp(move |reply| sink.push(Observed::Totp(reply))),
            "notification" => Continuation::notify(move |reply| sink.push(Observed::Notify(reply))),
            "revocation" => Continuation::revoke(move |reply| sink.push(Observed::Revoke(reply))),
            "key removal" => {
                Continuation::key_removed(move |reply| sink.push(Observed::KeyRemoved(reply)))
            }
            "device info" => {
                Continuation::device_info(move |reply| sink.push(Observed::DeviceInfo(reply)))
            }
            other => panic!("unknown continuation family '{other}'"),
        }
    }
}

/// Dispatcher wired to a recorder and a fresh registry.
#[derive(Debug)]
pub struct Harness {
    pub registry: Arc<CorrelationRegistry>,
    pub dispatcher: Dispatcher,
    pub recorder: Recorder,
}

impl Harness {
    pub fn new() -> Self {
        let recorder = Recorder::default();
        let registry = Arc::new(CorrelationRegistry::new());
        let dispatcher = Dispatcher::new(Arc::clone(&registry), recorder.subscribers());
        Self {
            registry,
            dispatcher,
            recorder,
        }
    }

    /// Registers a recording continuation of `family` under `exchange`.
    pub fn register(&self, exchange: &str, family: &str) {
        self.registry
            .register(Exchange::new(exchange), self.recorder.continuation(family))
            .expect("register continuation");
    }

    /// Dispatches one raw message.
    pub fn deliver(&mut self, message: Value) {
        self.dispatcher.dispatch_value(message);
    }

    /// Returns `true` while a continuation is live for `exchange`.
    pub fn is_pending(&self, exchange: &str) -> bool {
        let token = Exchange::new(exchange);
        match self.registry.take(&token).expect("registry lock") {
            Some(continuation) => {
                self.registry
                    .register(token, continuation)
                    .expect("re-register continuation");
                true
            }
            None => false,
        }
    }

    pub fn events(&self) -> Vec<Observed> {
        self.recorder.events()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.recorder.errors()
    }
}
