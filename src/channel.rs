//! One-way invocation channel into an engine.
//!
//! Requests go in via [`InvocationSender::submit`] and come out on the
//! engine side, in order. Built on bounded [`tokio::sync::mpsc`]: any
//! number of callers may submit concurrently, submission never blocks,
//! and there is no reply path — by the time the engine looks at a
//! request, the caller is long gone.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::DispatchError;

/// A single named method call crossing into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub method: String,
    pub args: HashMap<String, String>,
}

/// The submitting half of an engine's invocation channel.
#[derive(Debug, Clone)]
pub struct InvocationSender {
    name: &'static str,
    tx: mpsc::Sender<InvocationRequest>,
}

impl InvocationSender {
    /// Submit a request without waiting for the engine to pick it up.
    /// A full or closed channel fails fast and the request is dropped.
    pub fn submit(&self, request: InvocationRequest) -> Result<(), DispatchError> {
        self.tx.try_send(request).map_err(|err| match err {
            TrySendError::Full(_) => DispatchError::Full(self.name),
            TrySendError::Closed(_) => DispatchError::Closed(self.name),
        })
    }

    /// The channel's well-known name, for logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether both senders feed the same channel.
    pub fn same_channel(&self, other: &InvocationSender) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

/// Create a named invocation channel parking up to `capacity` requests.
pub fn invocation_channel(
    name: &'static str,
    capacity: usize,
) -> (InvocationSender, mpsc::Receiver<InvocationRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (InvocationSender { name, tx }, rx)
}
