//! Event-side orchestration: from platform callback to dispatched
//! invocation, with every failure stopping here.
//!
//! The platform hands events to [`SmsReceiver::on_event`] and expects
//! nothing back — it has no recovery path, so nothing may escape. Each
//! event ends in exactly one of three terminal states: ignored,
//! dispatched, or failed-and-swallowed.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bridge;
use crate::consts::{ENGINE_ID, SMS_RECEIVED};
use crate::engine::cache::EngineCache;
use crate::error::{DecodeError, Failure};
use crate::message::{InboundEvent, InboundMessage, PayloadDecoder};

/// Terminal state of one event's handling. Failures are information
/// here, not errors to propagate — there is nobody to propagate to.
#[derive(Debug)]
pub enum Delivery {
    /// The event was not an SMS broadcast.
    Ignored,
    /// One invocation went out to the engine.
    Dispatched,
    /// Something broke along the way; it ends here.
    Failed(Failure),
}

/// Walks each platform event to a terminal state: decode the first
/// usable payload, resolve the background engine, dispatch.
pub struct SmsReceiver {
    decoder: Box<dyn PayloadDecoder>,
    engines: Arc<EngineCache>,
}

impl SmsReceiver {
    pub fn new(decoder: Box<dyn PayloadDecoder>, engines: Arc<EngineCache>) -> Self {
        Self { decoder, engines }
    }

    /// Handle one platform event to completion. Infallible by design:
    /// the returned [`Delivery`] is the whole story.
    pub async fn on_event(&self, event: &InboundEvent) -> Delivery {
        debug!(tag = %event.tag, payloads = event.payloads.len(), "event received");

        if event.tag != SMS_RECEIVED {
            debug!(tag = %event.tag, "not an SMS broadcast, ignoring");
            return Delivery::Ignored;
        }

        let message = match self.first_usable(&event.payloads) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "event dropped: no usable message");
                return Delivery::Failed(Failure::Decode(err));
            }
        };

        info!(sender = %message.sender, len = message.body.len(), "message received");

        let handle = match self.engines.get_or_create(ENGINE_ID).await {
            Ok(handle) => handle,
            Err(err) => {
                warn!(%err, "event dropped: engine unavailable");
                return Delivery::Failed(err.into());
            }
        };

        match bridge::dispatch(&handle, &message) {
            Ok(()) => Delivery::Dispatched,
            Err(err) => {
                warn!(%err, "event dropped: dispatch failed");
                Delivery::Failed(err.into())
            }
        }
    }

    /// Decode payloads in arrival order. The first success wins and
    /// later payloads are ignored on purpose; a failed payload is
    /// skipped, not fatal. Returns the last decode error when nothing
    /// was usable.
    fn first_usable(&self, payloads: &[Vec<u8>]) -> Result<InboundMessage, DecodeError> {
        let mut last_err = DecodeError::Empty;
        for payload in payloads {
            match self.decoder.decode(payload) {
                Ok(message) => return Ok(message),
                Err(err) => {
                    debug!(%err, "payload skipped");
                    last_err = err;
                }
            }
        }
        Err(last_err)
    }
}
