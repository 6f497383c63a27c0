//! Cache-backed embedding access.
//!
//! Every embedding consumer (aesthetics, saliency, diversity) goes through
//! [`CachedEmbedder`]: cache lookup first, model call on miss, write-once
//! insert after. A per-key gate ensures concurrent scorers working on the
//! same frame compute the vector at most once per process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use bestshot_cache::EmbeddingStore;
use bestshot_models::Frame;

use crate::scorer::{EmbeddingModel, ModelFailure};

/// Shared, cloneable embedding front-end.
///
/// Clones share the underlying model, store and in-flight gate table, so one
/// instance can be handed to several scorers and the diversity filter.
#[derive(Clone)]
pub struct CachedEmbedder {
    model: Arc<dyn EmbeddingModel>,
    store: Arc<dyn EmbeddingStore>,
    timeout: Duration,
    inflight: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl CachedEmbedder {
    pub fn new(
        model: Arc<dyn EmbeddingModel>,
        store: Arc<dyn EmbeddingStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            store,
            timeout,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Dimensionality of the vectors produced by the wrapped model.
    pub fn dim(&self) -> usize {
        self.model.dim()
    }

    /// Return the embedding for `frame`, computing and caching it on a miss.
    ///
    /// Cache failures surface as [`ModelFailure::Cache`]; a dimensionality
    /// mismatch in the store must stop the run rather than degrade a frame.
    pub async fn embed(&self, frame: &Frame) -> Result<Vec<f32>, ModelFailure> {
        let key = frame.content_key.clone();

        if let Some(vector) = self.store.get(&key).await? {
            return Ok(vector);
        }

        let gate = {
            let mut inflight = self.inflight.lock().expect("inflight gate lock poisoned");
            inflight.entry(key.clone()).or_default().clone()
        };
        let _guard = gate.lock().await;

        // Another task may have filled the cache while we waited on the gate.
        if let Some(vector) = self.store.get(&key).await? {
            self.release(&key);
            return Ok(vector);
        }

        let result = tokio::time::timeout(self.timeout, self.model.embed(frame)).await;
        let vector = match result {
            Ok(Ok(vector)) => vector,
            Ok(Err(e)) => {
                self.release(&key);
                return Err(e);
            }
            Err(_) => {
                self.release(&key);
                return Err(ModelFailure::Timeout(self.timeout.as_secs()));
            }
        };

        self.store.put(&key, &vector).await?;
        self.release(&key);

        debug!(frame_index = frame.index, key = %key, "Embedding computed and cached");
        Ok(vector)
    }

    fn release(&self, key: &str) {
        let mut inflight = self.inflight.lock().expect("inflight gate lock poisoned");
        inflight.remove(key);
    }
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("dim", &self.model.dim())
            .field("timeout", &self.timeout)
            .finish()
    }
}
