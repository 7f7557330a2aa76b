//! Single-flight fetch dispatcher
//!
//! Requests are deduplicated by key and run one at a time, in submission
//! order, by a single worker task. Each accepted request produces exactly one
//! [`FetchEvent`] on the channel returned by [`FetchDispatcher::spawn`].

use crate::error::FetchError;
use crate::source::{ResourceSource, SourceResponse};
use image::DynamicImage;
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Completion of one dispatched request. A loaded image has already been
/// decoded once during validation.
#[derive(Debug, Clone)]
pub enum FetchEvent<K> {
    Loaded {
        key: K,
        bytes: Vec<u8>,
        image: DynamicImage,
    },
    Failed { key: K, error: FetchError },
}

impl<K: Copy> FetchEvent<K> {
    pub fn key(&self) -> K {
        match self {
            FetchEvent::Loaded { key, .. } | FetchEvent::Failed { key, .. } => *key,
        }
    }
}

/// Receiving end for dispatcher completions
pub type FetchEvents<K> = mpsc::UnboundedReceiver<FetchEvent<K>>;

/// Keys that are queued or in flight
type PendingSet<K> = Arc<Mutex<HashSet<K>>>;

fn lock<K>(pending: &PendingSet<K>) -> MutexGuard<'_, HashSet<K>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle for submitting fetch requests
pub struct FetchDispatcher<K> {
    pending: PendingSet<K>,
    queue: mpsc::UnboundedSender<K>,
}

impl<K> FetchDispatcher<K>
where
    K: Copy + Eq + Hash + Debug + Send + 'static,
{
    /// Start the worker task on the current tokio runtime.
    ///
    /// The worker stops once this handle is dropped and the queue drains, or
    /// as soon as the event receiver is dropped.
    pub fn spawn<S: ResourceSource>(source: S) -> (Self, FetchEvents<K>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let pending: PendingSet<K> = Arc::new(Mutex::new(HashSet::new()));

        tokio::spawn(run_worker(source, queue_rx, event_tx, Arc::clone(&pending)));

        (
            Self {
                pending,
                queue: queue_tx,
            },
            event_rx,
        )
    }

    /// Submit a request for `key`.
    ///
    /// Returns `false` when the key is already queued or in flight; the
    /// duplicate is dropped and no extra event will be produced.
    pub fn load_resource(&self, key: K) -> bool {
        let mut pending = lock(&self.pending);
        if !pending.insert(key) {
            log::debug!("Fetch for {:?} already pending, ignoring", key);
            return false;
        }
        if self.queue.send(key).is_err() {
            pending.remove(&key);
            log::warn!("Fetch worker has stopped, dropping request for {:?}", key);
            return false;
        }
        log::debug!("Queued fetch for {:?} ({} pending)", key, pending.len());
        true
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains(key)
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }
}

async fn run_worker<S, K>(
    source: S,
    mut queue: mpsc::UnboundedReceiver<K>,
    events: mpsc::UnboundedSender<FetchEvent<K>>,
    pending: PendingSet<K>,
) where
    S: ResourceSource,
    K: Copy + Eq + Hash + Debug + Send + 'static,
{
    while let Some(key) = queue.recv().await {
        log::debug!("Starting fetch for {:?}", key);
        let outcome = source.fetch().await.and_then(validate_response);

        // Clear before notifying so the receiver may resubmit immediately
        lock(&pending).remove(&key);

        let event = match outcome {
            Ok((bytes, image)) => {
                log::debug!("Fetched {} bytes for {:?}", bytes.len(), key);
                FetchEvent::Loaded { key, bytes, image }
            }
            Err(error) => {
                log::warn!("Fetch for {:?} failed: {}", key, error);
                FetchEvent::Failed { key, error }
            }
        };

        if events.send(event).is_err() {
            log::debug!("Fetch event receiver dropped, stopping worker");
            break;
        }
    }
}

/// Accept a response only if it is a 200 carrying a decodable image.
/// Returns the raw bytes together with the decoded image.
pub fn validate_response(
    response: SourceResponse,
) -> Result<(Vec<u8>, DynamicImage), FetchError> {
    if response.status != 200 {
        return Err(FetchError::HttpStatus(response.status));
    }
    if response.body.is_empty() {
        return Err(FetchError::InvalidPayload);
    }
    let image =
        image::load_from_memory(&response.body).map_err(|_| FetchError::InvalidPayload)?;
    Ok((response.body, image))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
