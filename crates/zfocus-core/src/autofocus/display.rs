use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::device::FrameDisplay;
use crate::error::Result;
use crate::frame::Frame;

/// Frame display running on its own thread.
///
/// Frames are handed over through a one-slot channel. When the worker is
/// still busy with the previous frame the new one is dropped, so a slow
/// viewer never delays the next stage move.
pub struct BackgroundDisplay {
    tx: Option<SyncSender<Frame>>,
    worker: Option<JoinHandle<()>>,
    dropped: usize,
}

impl BackgroundDisplay {
    /// Start the worker thread; `sink` is called with every frame it
    /// accepts.
    pub fn spawn<F>(mut sink: F) -> Result<Self>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<Frame>(1);
        let worker = std::thread::Builder::new()
            .name("zfocus-display".into())
            .spawn(move || {
                while let Ok(frame) = rx.recv() {
                    sink(frame);
                }
            })?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            dropped: 0,
        })
    }

    /// Frames discarded because the worker was busy.
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }
}

impl FrameDisplay for BackgroundDisplay {
    fn display(&mut self, frame: &Frame) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(frame.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                debug!(dropped = self.dropped, "Display busy, frame dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Display worker has stopped");
                self.tx = None;
            }
        }
    }
}

impl Drop for BackgroundDisplay {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Display worker panicked");
            }
        }
    }
}
