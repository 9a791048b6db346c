//! Asynchronous image loading for redraw requests.
//!
//! `DecoderThread` runs decoding on a background thread so the session never
//! blocks on image decode. Completions are drained by the render synchronizer.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use image::RgbaImage;

use super::RedrawRequest;

/// Result of loading the image for one redraw request.
#[derive(Debug)]
pub struct LoadCompletion {
    pub request: RedrawRequest,
    pub result: Result<RgbaImage, String>,
}

/// Something that loads images for redraw requests and reports completions later.
pub trait ImageLoader {
    /// Start loading the image for a request.
    fn submit(&mut self, request: RedrawRequest);

    /// Take the next finished load, if any.
    fn try_next(&mut self) -> Option<LoadCompletion>;
}

/// Message sent to the decoder thread.
enum ThreadMessage {
    Decode(RedrawRequest),
    Shutdown,
}

/// Background thread decoding redraw images.
pub struct DecoderThread {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<LoadCompletion>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
}

impl DecoderThread {
    /// Spawn a new decoder thread.
    ///
    /// Returns `Err` if the thread fails to spawn.
    pub fn spawn() -> Result<Self, String> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<LoadCompletion>();

        let thread_handle = thread::Builder::new()
            .name("frame-decoder".to_string())
            .spawn(move || {
                log::debug!("Frame decoder thread started");
                Self::thread_loop(request_rx, result_tx);
                log::debug!("Frame decoder thread exiting");
            })
            .map_err(|e| format!("Failed to spawn decoder thread: {}", e))?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
        })
    }

    fn thread_loop(request_rx: Receiver<ThreadMessage>, result_tx: Sender<LoadCompletion>) {
        while let Ok(message) = request_rx.recv() {
            match message {
                ThreadMessage::Decode(request) => {
                    let result = image::load_from_memory(request.image.bytes())
                        .map(|img| img.to_rgba8())
                        .map_err(|e| format!("Failed to decode image: {}", e));
                    if result_tx.send(LoadCompletion { request, result }).is_err() {
                        log::warn!("Result channel closed, decoder thread exiting");
                        break;
                    }
                }
                ThreadMessage::Shutdown => break,
            }
        }
    }
}

impl ImageLoader for DecoderThread {
    fn submit(&mut self, request: RedrawRequest) {
        if self.request_tx.send(ThreadMessage::Decode(request)).is_err() {
            log::error!("Frame decoder thread is gone, dropping redraw request");
        }
    }

    fn try_next(&mut self) -> Option<LoadCompletion> {
        match self.result_rx.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Frame decoder result channel disconnected");
                None
            }
        }
    }
}

impl Drop for DecoderThread {
    fn drop(&mut self) {
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::warn!("Frame decoder thread panicked");
            }
        }
    }
}
