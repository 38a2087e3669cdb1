pub mod cache;
pub mod echo;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

use crate::channel::InvocationRequest;
use crate::error::EngineInitError;

/// The sandboxed side of the bridge. The rest of the crate only ever
/// talks to it through its invocation channel; whatever it does with a
/// request is its own business, and errors it raises stay on its side.
#[async_trait]
pub trait Engine: Send + 'static {
    /// Handle one invocation. Requests arrive one at a time, in
    /// channel order.
    async fn on_invocation(&mut self, request: InvocationRequest) -> Result<()>;
}

/// Boots engine runtimes. Construction is the slow, expensive step the
/// cache exists to avoid repeating.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn boot(&self, id: &str) -> Result<Box<dyn Engine>, EngineInitError>;
}
