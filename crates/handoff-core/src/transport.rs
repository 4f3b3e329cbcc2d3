//! Host-side allocation of response body pipes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::body::{self, CollectedBody, OutgoingBody};
use crate::error::{BodyError, ConstructError};

/// Sizing of the pipes a [`Transport`] hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Bytes an output stream may buffer between flushes.
    pub write_budget: usize,
    /// Frames in flight per body pipe before writers suspend.
    pub pipe_depth: usize,
    /// Response bodies that may be open at once across all invocations.
    pub max_open_bodies: usize,
    /// Largest body the drain will collect.
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            write_budget: 64 * 1024,
            pipe_depth: 16,
            max_open_bodies: 1024,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

pub(crate) type BodyDrain = JoinHandle<Result<CollectedBody, BodyError>>;

/// The caller's allocator for response bodies.
///
/// Every body takes one of `max_open_bodies` slots and gets a drain
/// task that collects it. The slot returns when the drain ends, i.e.
/// when the body is finished, dropped or rejected as too large.
///
/// Opening a body spawns onto the current tokio runtime.
#[derive(Debug, Clone)]
pub struct Transport {
    config: Arc<TransportConfig>,
    slots: Arc<Semaphore>,
}

impl Transport {
    pub fn new(config: TransportConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_open_bodies));
        Self {
            config: Arc::new(config),
            slots,
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Body slots currently free.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub(crate) fn open_body(&self) -> Result<(OutgoingBody, BodyDrain), ConstructError> {
        let permit = self.slots.clone().try_acquire_owned().map_err(|_| {
            warn!(
                max_open_bodies = self.config.max_open_bodies,
                "no free body slots"
            );
            ConstructError::TransportExhausted
        })?;

        let (tx, rx) = mpsc::channel(self.config.pipe_depth.max(1));
        let limit = self.config.max_body_bytes;
        let drain = tokio::spawn(async move {
            let collected = body::drain(rx, limit).await;
            drop(permit);
            collected
        });
        debug!(available = self.slots.available_permits(), "body pipe opened");

        Ok((OutgoingBody::new(tx, self.config.write_budget.max(1)), drain))
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}
