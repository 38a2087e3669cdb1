use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::{Engine, EngineFactory};
use crate::channel::InvocationRequest;
use crate::consts::{ARG_MESSAGE, ARG_SENDER};
use crate::error::EngineInitError;

/// The demo binary's engine: prints what it receives and nothing more.
pub struct EchoEngine {
    id: String,
}

#[async_trait]
impl Engine for EchoEngine {
    async fn on_invocation(&mut self, request: InvocationRequest) -> Result<()> {
        let sender = request
            .args
            .get(ARG_SENDER)
            .map(String::as_str)
            .unwrap_or("<unknown>");
        let message = request
            .args
            .get(ARG_MESSAGE)
            .map(String::as_str)
            .unwrap_or("");
        info!(
            engine = %self.id,
            method = %request.method,
            from = sender,
            "{message}"
        );
        Ok(())
    }
}

/// Boots [`EchoEngine`]s. The only factory the binary needs.
pub struct EchoFactory;

#[async_trait]
impl EngineFactory for EchoFactory {
    async fn boot(&self, id: &str) -> Result<Box<dyn Engine>, EngineInitError> {
        Ok(Box::new(EchoEngine { id: id.to_string() }))
    }
}
