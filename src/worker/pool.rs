use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::bridge::VisionBridge;
use crate::commands::{Request, handle_request};
use crate::core::{BridgeConfig, Outcome};
use crate::dispatch::Arg;
use crate::utils::{BridgeError, BridgeResult};

/// Async front end over one shared bridge.
///
/// Every call takes the bridge lock on the blocking pool, so store access,
/// including a clear, is strictly serialized. The semaphore bounds how many
/// calls may be queued on the blocking pool at once.
#[derive(Clone)]
pub struct WorkerPool {
    bridge: Arc<Mutex<VisionBridge>>,
    semaphore: Arc<Semaphore>,
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(config: BridgeConfig) -> Self {
        let worker_count = config.workers.max(1);
        Self {
            bridge: Arc::new(Mutex::new(VisionBridge::new(config))),
            semaphore: Arc::new(Semaphore::new(worker_count)),
            worker_count,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs `f` with exclusive access to the bridge on the blocking pool.
    pub async fn run<F, T>(&self, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut VisionBridge) -> BridgeResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self.semaphore.acquire().await.map_err(|e| {
            warn!("Failed to acquire semaphore: {}", e);
            BridgeError::from(e)
        })?;
        debug!(
            "Worker started - Available permits: {}/{}",
            self.semaphore.available_permits(),
            self.worker_count
        );

        let bridge = Arc::clone(&self.bridge);
        let result = tokio::task::spawn_blocking(move || {
            let mut guard = bridge.lock()?;
            f(&mut *guard)
        })
        .await?;

        debug!("Worker finished");
        result
    }

    pub async fn invoke(&self, verb: impl Into<String>, args: Vec<Arg>) -> BridgeResult<Outcome> {
        let verb = verb.into();
        self.run(move |bridge| bridge.invoke(&verb, &args)).await
    }

    pub async fn execute(&self, request: Request) -> BridgeResult<Value> {
        self.run(move |bridge| handle_request(bridge, request)).await
    }
}
