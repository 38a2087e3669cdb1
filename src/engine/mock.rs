use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Engine, EngineFactory};
use crate::channel::InvocationRequest;
use crate::error::EngineInitError;

/// Requests a [`MockEngine`] has finished handling, shared with the test.
pub type Inbox = Arc<Mutex<Vec<InvocationRequest>>>;

/// A scripted engine for tests: records every invocation, optionally
/// sleeping first so tests can watch dispatch return early.
#[derive(Default)]
pub struct MockEngine {
    pub inbox: Inbox,
    /// Bumped the moment handling begins, before any delay.
    pub started: Arc<AtomicUsize>,
    pub delay: Option<Duration>,
    /// Number of initial invocations to fail after recording.
    pub fail_first: usize,
    handled: usize,
}

#[async_trait]
impl Engine for MockEngine {
    async fn on_invocation(&mut self, request: InvocationRequest) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inbox.lock().await.push(request);

        let failing = self.handled < self.fail_first;
        self.handled += 1;
        if failing {
            anyhow::bail!("scripted engine failure");
        }
        Ok(())
    }
}

/// A scripted factory for tests. Counts boot attempts, can be told to
/// fail the first few, and passes its shared counters into every
/// engine it produces.
#[derive(Default)]
pub struct MockFactory {
    pub inbox: Inbox,
    /// Boot attempts, successful or not.
    pub boots: Arc<AtomicUsize>,
    /// Invocations engines have begun handling.
    pub started: Arc<AtomicUsize>,
    pub boot_delay: Option<Duration>,
    pub engine_delay: Option<Duration>,
    /// Number of initial boot attempts to fail.
    pub boot_failures: usize,
    /// `fail_first` handed to every engine produced.
    pub engine_failures: usize,
}

#[async_trait]
impl EngineFactory for MockFactory {
    async fn boot(&self, id: &str) -> Result<Box<dyn Engine>, EngineInitError> {
        let attempt = self.boots.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.boot_delay {
            tokio::time::sleep(delay).await;
        }
        if attempt < self.boot_failures {
            return Err(EngineInitError::new(id, "scripted boot failure"));
        }
        Ok(Box::new(MockEngine {
            inbox: Arc::clone(&self.inbox),
            started: Arc::clone(&self.started),
            delay: self.engine_delay,
            fail_first: self.engine_failures,
            handled: 0,
        }))
    }
}
