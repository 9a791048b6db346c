//! Fire-and-forget mirroring of point sets to the backend.
//!
//! Saves are queued on a single worker thread, so they run in the order they
//! were requested and never block the caller. A failed save is logged and
//! dropped; the local point store stays the source of truth.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use web_time::Instant;

use facemark_api::{Backend, ImageFeatures};

use crate::model::PointStore;

enum ThreadMessage {
    Save(ImageFeatures),
    /// Acknowledge once every earlier save has been attempted
    Flush(Sender<()>),
    Shutdown,
}

/// Queues full point-set saves for a background worker.
pub struct PersistenceGateway {
    request_tx: Sender<ThreadMessage>,
    thread_handle: Option<JoinHandle<()>>,
}

impl PersistenceGateway {
    /// Spawn the save worker.
    pub fn spawn(backend: Arc<dyn Backend>) -> Result<Self, String> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();

        let thread_handle = thread::Builder::new()
            .name("point-saver".to_string())
            .spawn(move || {
                log::debug!("Persistence thread started");
                Self::thread_loop(backend.as_ref(), request_rx);
                log::debug!("Persistence thread exiting");
            })
            .map_err(|e| format!("Failed to spawn persistence thread: {}", e))?;

        Ok(Self {
            request_tx,
            thread_handle: Some(thread_handle),
        })
    }

    /// Queue an upsert of every point in `store` for `image_id`.
    pub fn save(&self, image_id: &str, store: &PointStore) {
        let features = ImageFeatures {
            image_id: image_id.to_string(),
            points: store.to_wire(),
        };
        if self.request_tx.send(ThreadMessage::Save(features)).is_err() {
            log::error!("Persistence thread is gone, save for {} dropped", image_id);
        }
    }

    /// Block until every save queued so far has been attempted.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.request_tx.send(ThreadMessage::Flush(ack_tx)).is_err() {
            log::error!("Persistence thread is gone, nothing to flush");
            return;
        }
        if ack_rx.recv().is_err() {
            log::warn!("Persistence thread exited before flushing");
        }
    }

    fn thread_loop(backend: &dyn Backend, request_rx: Receiver<ThreadMessage>) {
        while let Ok(message) = request_rx.recv() {
            match message {
                ThreadMessage::Save(features) => {
                    let start = Instant::now();
                    match backend.save_feature_points(&features) {
                        Ok(response) if response.success => log::debug!(
                            "Saved {} points for {} in {:?}",
                            features.points.len(),
                            features.image_id,
                            start.elapsed()
                        ),
                        Ok(response) => log::warn!(
                            "Backend refused points for {}: {}",
                            features.image_id,
                            response.message
                        ),
                        Err(e) => log::warn!("Failed to save points for {}: {}", features.image_id, e),
                    }
                }
                ThreadMessage::Flush(ack) => {
                    let _ = ack.send(());
                }
                ThreadMessage::Shutdown => break,
            }
        }
    }
}

impl Drop for PersistenceGateway {
    /// Pending saves are flushed before the worker exits.
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("Persistence thread panicked");
            }
        }
    }
}
