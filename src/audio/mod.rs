//! Output sinks: where generated PCM goes.
//!
//! A sink is pull-driven. It tells the engine how much room it has through
//! `bytes_free()` and asks for more through a [`RefillNotifier`]; the engine
//! never writes more than the space it was told about.

pub mod device;
pub mod memory;

pub use device::CpalSink;
pub use memory::MemorySink;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::messaging::EngineEvent;

/// Streaming destination for mono 16-bit little-endian PCM.
pub trait OutputSink {
    /// Bytes that can be written right now without overflowing.
    fn bytes_free(&self) -> usize;

    /// Queue `pcm`, returning how many bytes were accepted (never more than
    /// `bytes_free()`, always a whole number of samples).
    fn write(&mut self, pcm: &[u8]) -> usize;

    /// Linear output gain in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
}

/// Handle a sink uses to ask the audio thread for a refill.
///
/// Notifications coalesce: only one `Refill` is in flight until the audio
/// thread calls [`RefillNotifier::acknowledge`].
#[derive(Clone, Debug)]
pub struct RefillNotifier {
    events: Sender<EngineEvent>,
    pending: Arc<AtomicBool>,
}

impl RefillNotifier {
    pub fn new(events: Sender<EngineEvent>) -> Self {
        Self {
            events,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn notify(&self) {
        if !self.pending.swap(true, Ordering::AcqRel) && self.events.send(EngineEvent::Refill).is_err() {
            // Engine is gone; nothing left to wake.
            self.pending.store(false, Ordering::Release);
        }
    }

    pub fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}
