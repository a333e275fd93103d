//! Recognition Worker
//!
//! Owns the OCR engine on a background thread so the window keeps painting
//! while a photo is processed. Requests and replies travel over channels;
//! the thread handles one request at a time.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use image::RgbImage;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use crate::pipeline::{RecognitionResult, RecognizeError, Recognizer};
use crate::vision::TextDetector;

/// Messages sent from the window to the worker
#[derive(Debug)]
pub enum WorkerRequest {
    /// Recognize the plate in an already decoded image
    Recognize {
        request_id: u64,
        image_name: String,
        image: RgbImage,
    },
    /// Stop the worker thread
    Shutdown,
}

/// Messages sent from the worker back to the window
#[derive(Debug)]
pub struct WorkerReply {
    pub request_id: u64,
    pub outcome: Result<RecognitionResult, RecognizeError>,
}

/// Handle to the background recognition thread
pub struct RecognitionWorker {
    to_worker: Sender<WorkerRequest>,
    from_worker: Receiver<WorkerReply>,
    handle: Option<JoinHandle<()>>,
}

impl RecognitionWorker {
    /// Start the worker thread; `notify` runs after every reply is sent
    pub fn spawn<D, F>(detector: D, notify: F) -> Self
    where
        D: TextDetector + 'static,
        F: Fn() + Send + 'static,
    {
        let (to_worker, requests) = unbounded::<WorkerRequest>();
        let (replies, from_worker) = unbounded::<WorkerReply>();

        let handle = std::thread::spawn(move || {
            info!("Recognition worker starting...");
            let mut recognizer = Recognizer::new(detector);

            for request in requests.iter() {
                match request {
                    WorkerRequest::Recognize {
                        request_id,
                        image_name,
                        image,
                    } => {
                        debug!("Worker picked up request {} ({})", request_id, image_name);
                        let outcome = recognizer.recognize_image(&image).map(|mut result| {
                            result.image_name = image_name;
                            result
                        });

                        if replies.send(WorkerReply { request_id, outcome }).is_err() {
                            break;
                        }
                        notify();
                    }
                    WorkerRequest::Shutdown => break,
                }
            }
            info!("Recognition worker exiting...");
        });

        Self {
            to_worker,
            from_worker,
            handle: Some(handle),
        }
    }

    /// Queue an image for recognition
    pub fn submit(&self, request_id: u64, image_name: String, image: RgbImage) -> anyhow::Result<()> {
        self.to_worker
            .send(WorkerRequest::Recognize {
                request_id,
                image_name,
                image,
            })
            .map_err(|_| anyhow::anyhow!("Recognition worker has stopped"))
    }

    /// Next finished reply, if one is waiting
    pub fn try_recv(&self) -> Option<WorkerReply> {
        match self.from_worker.try_recv() {
            Ok(reply) => Some(reply),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("Recognition worker disconnected");
                None
            }
        }
    }

    /// Check if the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for RecognitionWorker {
    fn drop(&mut self) {
        // Signal worker to stop
        let _ = self.to_worker.send(WorkerRequest::Shutdown);

        // Wait for worker thread to finish
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
