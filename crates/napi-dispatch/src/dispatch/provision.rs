//! `provision` events: agreement patterns, new provisions and mode changes.

use tracing::debug;

use super::{DISPATCH_TARGET, Dispatcher};
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::types::{Provision, ProvisioningMode};

pub(super) fn handle(dispatcher: &mut Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    match (envelope.segment(1), envelope.segment(2)) {
        (Some("report"), Some("patterns")) => {
            let patterns: Vec<String> = envelope.require_as(&["event", "patterns"])?;
            dispatcher.subscribers.agreement(patterns);
        }
        (Some("report"), Some("provisioned")) => {
            if envelope.lookup_str(&["event", "kind"]) != Some("provisioned") {
                debug!(target: DISPATCH_TARGET, "provisioned report without provisioned kind");
                return Ok(());
            }
            let pid = envelope.require_str(&["event", "info", "pid"])?;
            dispatcher.subscribers.provision(Provision::new(pid));
        }
        (Some("run"), Some(stage)) => {
            let Ok(mode) = stage.parse::<ProvisioningMode>() else {
                debug!(target: DISPATCH_TARGET, stage, "ignoring provision run stage");
                return Ok(());
            };
            dispatcher.subscribers.provision_mode(mode);
        }
        (action, detail) => {
            debug!(target: DISPATCH_TARGET, ?action, ?detail, "ignoring provision message");
        }
    }
    Ok(())
}
