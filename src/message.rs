use serde::Deserialize;

use crate::consts::SMS_RECEIVED;
use crate::error::DecodeError;

/// One decoded message: who sent it and what it says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    pub body: String,
}

/// What the platform hands over when something arrives: an event tag
/// plus the raw transport payloads, still undecoded.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub tag: String,
    pub payloads: Vec<Vec<u8>>,
}

impl InboundEvent {
    /// An SMS broadcast carrying the given payloads.
    pub fn sms(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            tag: SMS_RECEIVED.to_string(),
            payloads,
        }
    }
}

/// Turns one raw transport payload into a structured message.
/// The platform's wire format lives behind this seam.
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<InboundMessage, DecodeError>;
}

/// The wire form of a payload: UTF-8 JSON with `sender` and `message`.
#[derive(Deserialize)]
struct WirePayload {
    sender: String,
    message: String,
}

/// Default decoder for [`WirePayload`] JSON.
pub struct JsonDecoder;

impl PayloadDecoder for JsonDecoder {
    fn decode(&self, payload: &[u8]) -> Result<InboundMessage, DecodeError> {
        let wire: WirePayload = serde_json::from_slice(payload)?;
        Ok(InboundMessage {
            sender: wire.sender,
            body: wire.message,
        })
    }
}
