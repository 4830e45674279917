//! Process-wide event subscribers.
//!
//! Events that are not tied to a request (provisioning patterns, status
//! changes, errors without a pending continuation) go to exactly one
//! subscriber each. Every slot must be bound before a dispatcher can be
//! built, so no event is ever silently dropped for want of a handler.

use std::fmt;

use crate::error::{ErrorRecord, SetupError};
use crate::types::{FoundChange, NotificationSettings, PresenceChange, Provision, ProvisioningMode};

type Slot<T> = Box<dyn FnMut(T) + Send>;

/// Bound subscriber callbacks.
pub struct Subscribers {
    agreement: Slot<Vec<String>>,
    provision: Slot<Provision>,
    error: Slot<ErrorRecord>,
    provision_list: Slot<Vec<Provision>>,
    provision_mode: Slot<ProvisioningMode>,
    found_change: Slot<FoundChange>,
    presence_change: Slot<PresenceChange>,
    notifications: Slot<NotificationSettings>,
}

impl Subscribers {
    /// Starts binding subscribers.
    #[must_use]
    pub fn builder() -> SubscribersBuilder {
        SubscribersBuilder::default()
    }

    pub(crate) fn agreement(&mut self, patterns: Vec<String>) {
        (self.agreement)(patterns);
    }

    pub(crate) fn provision(&mut self, provision: Provision) {
        (self.provision)(provision);
    }

    pub(crate) fn error(&mut self, record: ErrorRecord) {
        (self.error)(record);
    }

    pub(crate) fn provision_list(&mut self, provisions: Vec<Provision>) {
        (self.provision_list)(provisions);
    }

    pub(crate) fn provision_mode(&mut self, mode: ProvisioningMode) {
        (self.provision_mode)(mode);
    }

    pub(crate) fn found_change(&mut self, change: FoundChange) {
        (self.found_change)(change);
    }

    pub(crate) fn presence_change(&mut self, change: PresenceChange) {
        (self.presence_change)(change);
    }

    pub(crate) fn notifications(&mut self, settings: NotificationSettings) {
        (self.notifications)(settings);
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Subscribers").finish_non_exhaustive()
    }
}

/// Collects subscriber callbacks before a dispatcher is built.
#[derive(Default)]
pub struct SubscribersBuilder {
    agreement: Option<Slot<Vec<String>>>,
    provision: Option<Slot<Provision>>,
    error: Option<Slot<ErrorRecord>>,
    provision_list: Option<Slot<Vec<Provision>>>,
    provision_mode: Option<Slot<ProvisioningMode>>,
    found_change: Option<Slot<FoundChange>>,
    presence_change: Option<Slot<PresenceChange>>,
    notifications: Option<Slot<NotificationSettings>>,
}

impl SubscribersBuilder {
    /// Binds the provisioning pattern subscriber.
    #[must_use]
    pub fn on_agreement(mut self, callback: impl FnMut(Vec<String>) + Send + 'static) -> Self {
        self.agreement = Some(Box::new(callback));
        self
    }

    /// Binds the new provision subscriber.
    #[must_use]
    pub fn on_provision(mut self, callback: impl FnMut(Provision) + Send + 'static) -> Self {
        self.provision = Some(Box::new(callback));
        self
    }

    /// Binds the generic error subscriber.
    #[must_use]
    pub fn on_error(mut self, callback: impl FnMut(ErrorRecord) + Send + 'static) -> Self {
        self.error = Some(Box::new(callback));
        self
    }

    /// Binds the provision list subscriber.
    #[must_use]
    pub fn on_provision_list(
        mut self,
        callback: impl FnMut(Vec<Provision>) + Send + 'static,
    ) -> Self {
        self.provision_list = Some(Box::new(callback));
        self
    }

    /// Binds the provisioning mode subscriber.
    #[must_use]
    pub fn on_provision_mode(
        mut self,
        callback: impl FnMut(ProvisioningMode) + Send + 'static,
    ) -> Self {
        self.provision_mode = Some(Box::new(callback));
        self
    }

    /// Binds the found-status change subscriber.
    #[must_use]
    pub fn on_found_change(mut self, callback: impl FnMut(FoundChange) + Send + 'static) -> Self {
        self.found_change = Some(Box::new(callback));
        self
    }

    /// Binds the presence-status change subscriber.
    #[must_use]
    pub fn on_presence_change(
        mut self,
        callback: impl FnMut(PresenceChange) + Send + 'static,
    ) -> Self {
        self.presence_change = Some(Box::new(callback));
        self
    }

    /// Binds the notification settings subscriber.
    #[must_use]
    pub fn on_notifications(
        mut self,
        callback: impl FnMut(NotificationSettings) + Send + 'static,
    ) -> Self {
        self.notifications = Some(Box::new(callback));
        self
    }

    /// Finishes binding.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::MissingSubscriber`] naming the first unbound
    /// slot.
    pub fn build(self) -> Result<Subscribers, SetupError> {
        Ok(Subscribers {
            agreement: required(self.agreement, "agreement")?,
            provision: required(self.provision, "provision")?,
            error: required(self.error, "error")?,
            provision_list: required(self.provision_list, "provision_list")?,
            provision_mode: required(self.provision_mode, "provision_mode")?,
            found_change: required(self.found_change, "found_change")?,
            presence_change: required(self.presence_change, "presence_change")?,
            notifications: required(self.notifications, "notifications")?,
        })
    }
}

impl fmt::Debug for SubscribersBuilder {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubscribersBuilder")
            .field("agreement", &self.agreement.is_some())
            .field("provision", &self.provision.is_some())
            .field("error", &self.error.is_some())
            .field("provision_list", &self.provision_list.is_some())
            .field("provision_mode", &self.provision_mode.is_some())
            .field("found_change", &self.found_change.is_some())
            .field("presence_change", &self.presence_change.is_some())
            .field("notifications", &self.notifications.is_some())
            .finish()
    }
}

fn required<T>(slot: Option<Slot<T>>, subscriber: &'static str) -> Result<Slot<T>, SetupError> {
    slot.ok_or(SetupError::MissingSubscriber { subscriber })
}
