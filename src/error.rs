//! Failure kinds along the delivery path.
//!
//! Every one of these is swallowed before the platform callback
//! returns; they exist so logs and tests can tell the stages apart.

use thiserror::Error;

/// A transport payload that did not yield a usable message.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The event carried no payloads at all.
    #[error("event carried no payloads")]
    Empty,

    /// The payload was not the JSON wire form.
    #[error("payload is not valid message JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Decoder-specific rejection.
    #[error("{0}")]
    Invalid(String),
}

/// The engine runtime could not be booted. Nothing gets cached when
/// this happens, so the next event retries from scratch.
#[derive(Debug, Error)]
#[error("engine `{id}` failed to initialize: {reason}")]
pub struct EngineInitError {
    pub id: String,
    pub reason: String,
}

impl EngineInitError {
    pub fn new(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

/// The invocation channel could not take the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The engine side of the channel is gone.
    #[error("invocation channel `{0}` is closed")]
    Closed(&'static str),

    /// The channel buffer is at capacity. Submission fails fast rather
    /// than wait; the request is dropped.
    #[error("invocation channel `{0}` is full")]
    Full(&'static str),
}

/// Why one event's handling ended in the failed terminal state.
#[derive(Debug, Error)]
pub enum Failure {
    /// No payload decoded into a usable message. Carries the last
    /// decoder error seen.
    #[error("no usable message: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    EngineInit(#[from] EngineInitError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
