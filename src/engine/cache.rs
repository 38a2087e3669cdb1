//! Process-wide registry of running engines.
//!
//! One engine per identifier, booted on first use, shared by every
//! caller after that. Racing callers for the same identifier can never
//! boot two engines: one boots, the rest wait and receive its handle.
//! A failed boot registers nothing, so the next event retries.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

use crate::channel::{InvocationRequest, InvocationSender, invocation_channel};
use crate::consts::{INVOCATION_BUFFER, SMS_CHANNEL};
use crate::engine::{Engine, EngineFactory};
use crate::error::{DispatchError, EngineInitError};

/// A reference to a running engine. Cloning is cheap and every clone
/// submits into the same instance; concurrent submission needs no
/// locking on the caller's part.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    id: Arc<str>,
    sender: InvocationSender,
}

impl EngineHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the invocation channel this handle feeds.
    pub fn channel(&self) -> &'static str {
        self.sender.name()
    }

    /// Submit one request, fire-and-forget.
    pub fn submit(&self, request: InvocationRequest) -> Result<(), DispatchError> {
        self.sender.submit(request)
    }

    /// Whether both handles refer to the same running engine.
    pub fn same_instance(&self, other: &EngineHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }
}

/// The engine registry. Holds the only map from identifier to running
/// instance; everything the process dispatches goes through here.
pub struct EngineCache {
    factory: Box<dyn EngineFactory>,
    engines: Mutex<HashMap<String, Arc<OnceCell<EngineHandle>>>>,
}

impl EngineCache {
    pub fn new(factory: Box<dyn EngineFactory>) -> Self {
        Self {
            factory,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Return the engine registered under `id`, booting it first if
    /// this is the first request for it. Callers racing on one
    /// identifier serialize on its slot — exactly one boots, the rest
    /// get its handle — while other identifiers stay unaffected. After
    /// a failed boot the slot is left empty for the next call to retry.
    pub async fn get_or_create(&self, id: &str) -> Result<EngineHandle, EngineInitError> {
        // The map lock is only held long enough to resolve the slot;
        // the slow boot happens on the slot itself.
        let slot = {
            let mut engines = self.engines.lock().await;
            Arc::clone(engines.entry(id.to_string()).or_default())
        };

        if let Some(handle) = slot.get() {
            debug!(engine = id, "engine cache hit");
            return Ok(handle.clone());
        }

        let handle = slot
            .get_or_try_init(|| async move {
                info!(engine = id, "engine cache miss, booting");
                match self.factory.boot(id).await {
                    Ok(engine) => {
                        let handle = start(id, engine);
                        info!(engine = id, channel = handle.channel(), "engine running");
                        Ok(handle)
                    }
                    Err(err) => {
                        warn!(engine = id, %err, "engine boot failed, nothing cached");
                        Err(err)
                    }
                }
            })
            .await?;

        Ok(handle.clone())
    }
}

/// Start the engine's entry point: a task that drains the invocation
/// channel for as long as any handle stays alive. Engine errors are
/// information here; the loop logs them and keeps going.
fn start(id: &str, mut engine: Box<dyn Engine>) -> EngineHandle {
    let (sender, mut rx) = invocation_channel(SMS_CHANNEL, INVOCATION_BUFFER);
    let handle = EngineHandle {
        id: Arc::from(id),
        sender,
    };

    let engine_id = Arc::clone(&handle.id);
    tokio::spawn(async move {
        while let Some(request) = rx.recv().await {
            let method = request.method.clone();
            if let Err(err) = engine.on_invocation(request).await {
                error!(engine = %engine_id, %method, %err, "engine failed to handle invocation");
            }
        }
        debug!(engine = %engine_id, "invocation channel closed, entry point done");
    });

    handle
}
