//! `api` messages: notification settings and device status events.

use std::str::FromStr;

use tracing::debug;

use super::{DISPATCH_TARGET, Dispatcher};
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::types::{FoundChange, FoundStatus, NotificationSettings, PresenceChange, PresenceStatus};

pub(super) fn handle(dispatcher: &mut Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    match envelope.segment(1) {
        Some("report") => report(dispatcher, envelope),
        Some("get") => {
            let settings: NotificationSettings = envelope.require_as(&["response"])?;
            dispatcher.subscribers.notifications(settings);
            Ok(())
        }
        Some("set") => {
            debug!(target: DISPATCH_TARGET, "notification settings acknowledged");
            Ok(())
        }
        action => {
            debug!(target: DISPATCH_TARGET, ?action, "ignoring api message");
            Ok(())
        }
    }
}

fn report(dispatcher: &mut Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    match envelope.lookup_str(&["event", "kind"]) {
        Some("found-change") => {
            let change = FoundChange {
                pid: envelope.require_str(&["event", "pid"])?,
                before: status::<FoundStatus>(envelope, "before")?,
                after: status::<FoundStatus>(envelope, "after")?,
            };
            dispatcher.subscribers.found_change(change);
        }
        Some("presence-change") => {
            let change = PresenceChange {
                pid: envelope.require_str(&["event", "pid"])?,
                before: status::<PresenceStatus>(envelope, "before")?,
                after: status::<PresenceStatus>(envelope, "after")?,
                authenticated: envelope.flag_is(&["event", "authenticated"], true),
            };
            dispatcher.subscribers.presence_change(change);
        }
        kind => debug!(target: DISPATCH_TARGET, ?kind, "ignoring api report"),
    }
    Ok(())
}

/// Decodes `event.<key>` through the status string table.
fn status<T: FromStr>(envelope: &Envelope, key: &str) -> Result<T, DispatchError> {
    let value = envelope.require_str(&["event", key])?;
    value
        .parse()
        .map_err(|_| DispatchError::unknown_event(format!("event/{key}"), value, envelope.dump()))
}
