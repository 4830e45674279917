//! `info` replies: provision lists and single-device queries.

use tracing::debug;

use super::{DISPATCH_TARGET, Dispatcher, require_exchange};
use crate::continuation::Payload;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::exchange::ExchangeKind;
use crate::types::{DeviceInfo, Provision};

const DEVICE_LIST: &str = "nymiband";
const PROVISION_MAP: &str = "provisionMap";

pub(super) fn handle(dispatcher: &mut Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    let exchange = require_exchange(envelope)?;
    match exchange.kind() {
        ExchangeKind::Provisions | ExchangeKind::ProvisionsPresent => {
            let provisions = provision_list(envelope, exchange.as_str())?;
            debug!(
                target: DISPATCH_TARGET,
                exchange = %exchange,
                count = provisions.len(),
                "delivering provision list"
            );
            dispatcher.subscribers.provision_list(provisions);
            Ok(())
        }
        ExchangeKind::DeviceInfo { pid } => {
            let continuation = dispatcher
                .claim(exchange)?
                .ok_or_else(|| DispatchError::no_pending_callback("device info", envelope.dump()))?;
            let outcome = decode_device_info(envelope, pid).map(Payload::DeviceInfo);
            continuation.deliver(pid.to_owned(), outcome);
            Ok(())
        }
        ExchangeKind::Request => {
            // Opaque tokens never carry an info reply.
            if let Some(continuation) = dispatcher.claim(exchange)? {
                let error = DispatchError::unexpected_reply("info", continuation.family());
                continuation.fail(envelope.pid().unwrap_or_default(), error.into_record());
            } else {
                debug!(target: DISPATCH_TARGET, exchange = %exchange, "unrecognised info exchange");
            }
            Ok(())
        }
    }
}

/// Reads `response.<key>` as a pid list. An absent list is empty.
fn provision_list(envelope: &Envelope, key: &str) -> Result<Vec<Provision>, DispatchError> {
    let path = ["response", key];
    if envelope.lookup(&path).is_none() {
        return Ok(Vec::new());
    }
    let pids: Vec<String> = envelope.require_as(&path)?;
    Ok(pids.into_iter().map(Provision::new).collect())
}

/// Resolves `pid` through `response.provisionMap` into `response.nymiband`.
fn decode_device_info(envelope: &Envelope, pid: &str) -> Result<DeviceInfo, DispatchError> {
    let index: usize = envelope.require_as(&["response", PROVISION_MAP, pid])?;

    let devices = envelope
        .require(&["response", DEVICE_LIST])?
        .as_array()
        .ok_or_else(|| {
            DispatchError::field_invalid(
                format!("response/{DEVICE_LIST}"),
                "expected an array",
                envelope.dump(),
            )
        })?;
    let device = devices.get(index).ok_or_else(|| {
        DispatchError::out_of_range(
            format!("response/{DEVICE_LIST}"),
            index,
            devices.len(),
            envelope.dump(),
        )
    })?;

    Ok(DeviceInfo::from_value(device.clone()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::error::ErrorKind;

    fn envelope(response: Value) -> Envelope {
        Envelope::from_value(json!({
            "operation": ["info", "get"],
            "exchange": "deviceinfo42",
            "response": response
        }))
        .expect("valid envelope")
    }

    #[rstest]
    fn resolves_pid_through_provision_map() {
        let message = envelope(json!({
            "provisionMap": {"7": 0, "42": 1},
            "nymiband": [{"pid": "7"}, {"pid": "42", "found": "identified"}]
        }));

        let info = decode_device_info(&message, "42").expect("device");
        assert_eq!(info.pid(), Some("42"));
    }

    #[rstest]
    #[case(json!({"nymiband": []}), ErrorKind::FieldMissing)]
    #[case(json!({"provisionMap": {"7": 0}, "nymiband": [{}]}), ErrorKind::FieldMissing)]
    #[case(json!({"provisionMap": {"42": 3}, "nymiband": [{}]}), ErrorKind::OutOfRange)]
    #[case(json!({"provisionMap": {"42": 0}, "nymiband": {}}), ErrorKind::FieldInvalid)]
    #[case(json!({"provisionMap": {"42": -1}, "nymiband": [{}]}), ErrorKind::FieldInvalid)]
    fn rejects_unresolvable_devices(#[case] response: Value, #[case] expected: ErrorKind) {
        let error = decode_device_info(&envelope(response), "42").expect_err("should fail");
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    fn unrelated_provision_map_entries_are_not_decoded() {
        let message = envelope(json!({
            "provisionMap": {"7": "stale", "42": 0},
            "nymiband": [{"pid": "42"}]
        }));

        let info = decode_device_info(&message, "42").expect("device");
        assert_eq!(info.pid(), Some("42"));
    }

    #[rstest]
    fn absent_provision_list_is_empty() {
        let message = Envelope::from_value(json!({
            "operation": ["info", "get"],
            "exchange": "provisions",
            "response": {}
        }))
        .expect("valid envelope");

        assert!(provision_list(&message, "provisions").expect("list").is_empty());
    }
}
