//! Handlers for request/response families.
//!
//! All of them follow one shape: resolve the exchange, claim its
//! continuation, then decode and deliver. Decode failures go to the claimed
//! continuation; a missing exchange or continuation goes to the generic
//! error subscriber.

use tracing::debug;

use super::{DISPATCH_TARGET, Dispatcher, require_exchange};
use crate::continuation::Payload;
use crate::envelope::Envelope;
use crate::error::DispatchError;
use crate::types::{HapticNotification, KeyType, Signature};

pub(super) fn random(dispatcher: &Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "pseudo random value", |message| {
        message
            .require_str(&["response", "pseudoRandomNumber"])
            .map(Payload::Random)
    })
}

pub(super) fn symmetric_key(
    dispatcher: &Dispatcher,
    envelope: &Envelope,
) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "symmetric key", |message| {
        match message.segment(1) {
            Some("run") => {
                confirmed(message, "Could not complete CreateSymmetricKey request")?;
                Ok(Payload::KeyCreated(KeyType::Symmetric))
            }
            Some("get") => message
                .require_str(&["response", "key"])
                .map(Payload::SymmetricKey),
            _ => Err(unsupported(message, "symmetricKey/run or symmetricKey/get")),
        }
    })
}

pub(super) fn sign(dispatcher: &Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "signature", |message| {
        Ok(Payload::Signature(Signature {
            signature: message.require_str(&["response", "signature"])?,
            verification_key: message.require_str(&["response", "verificationKey"])?,
        }))
    })
}

pub(super) fn totp(dispatcher: &Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "totp result", |message| {
        confirmed(message, "Could not complete CreateTOTP request")?;
        match message.segment(1) {
            Some("run") => Ok(Payload::KeyCreated(KeyType::Totp)),
            Some("get") => message
                .require_str(&["response", "totp"])
                .map(Payload::Totp),
            _ => Err(unsupported(message, "totp/run or totp/get")),
        }
    })
}

pub(super) fn notify(dispatcher: &Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "notification result", |message| {
        message
            .require_bool(&["request", "buzz"])
            .map(|buzz| Payload::Notify(HapticNotification::from_buzz(buzz)))
    })
}

pub(super) fn revoke(dispatcher: &Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "provision revocation", |_| Ok(Payload::Revoke))
}

pub(super) fn key(dispatcher: &Dispatcher, envelope: &Envelope) -> Result<(), DispatchError> {
    complete(dispatcher, envelope, "key removal", |message| {
        Ok(Payload::KeyRemoved(removed_key_type(message)))
    })
}

/// Infers which key a removal acknowledged.
///
/// The service echoes the request flags and clears the matching response
/// flag once the key is gone.
fn removed_key_type(message: &Envelope) -> KeyType {
    let cleared = |flag: &str| {
        message.flag_is(&["request", flag], true) && message.flag_is(&["response", flag], false)
    };
    if cleared("symmetric") {
        KeyType::Symmetric
    } else if cleared("totp") {
        KeyType::Totp
    } else {
        KeyType::Error
    }
}

fn complete<F>(
    dispatcher: &Dispatcher,
    envelope: &Envelope,
    subject: &'static str,
    decode: F,
) -> Result<(), DispatchError>
where
    F: FnOnce(&Envelope) -> Result<Payload, DispatchError>,
{
    let exchange = require_exchange(envelope)?;
    let continuation = dispatcher
        .claim(exchange)?
        .ok_or_else(|| DispatchError::no_pending_callback(subject, envelope.dump()))?;

    let pid = envelope.pid().unwrap_or_default().to_owned();
    let outcome = envelope.require_pid().and_then(|_| decode(envelope));

    debug!(
        target: DISPATCH_TARGET,
        exchange = %exchange,
        family = continuation.family(),
        success = outcome.is_ok(),
        "completing continuation"
    );
    continuation.deliver(pid, outcome);
    Ok(())
}

/// Requires a top-level `successful: true`.
fn confirmed(message: &Envelope, reason: &str) -> Result<(), DispatchError> {
    if message.successful() == Some(true) {
        Ok(())
    } else {
        Err(DispatchError::operation_failed(reason, message.dump()))
    }
}

fn unsupported(message: &Envelope, expected: &'static str) -> DispatchError {
    DispatchError::unexpected_reply(message.operation_path().unwrap_or_default(), expected)
}
