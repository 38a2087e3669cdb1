//! The invocation bridge: builds the cross-boundary call for one
//! decoded message and fires it at the engine.

use std::collections::HashMap;

use tracing::debug;

use crate::channel::InvocationRequest;
use crate::consts::{ARG_MESSAGE, ARG_SENDER, METHOD_MESSAGE_RECEIVED};
use crate::engine::cache::EngineHandle;
use crate::error::DispatchError;
use crate::message::InboundMessage;

/// Build the `messageReceived` request for one decoded message.
pub fn message_received(message: &InboundMessage) -> InvocationRequest {
    InvocationRequest {
        method: METHOD_MESSAGE_RECEIVED.to_string(),
        args: HashMap::from([
            (ARG_SENDER.to_string(), message.sender.clone()),
            (ARG_MESSAGE.to_string(), message.body.clone()),
        ]),
    }
}

/// Fire-and-forget: submit and return. Nothing is awaited, no
/// acknowledgment exists, and a failed submit is the caller's to
/// swallow.
pub fn dispatch(handle: &EngineHandle, message: &InboundMessage) -> Result<(), DispatchError> {
    let request = message_received(message);
    debug!(
        engine = handle.id(),
        channel = handle.channel(),
        method = %request.method,
        "dispatching invocation"
    );
    handle.submit(request)
}
