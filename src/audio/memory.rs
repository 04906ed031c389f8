use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{OutputSink, RefillNotifier};

struct MemoryState {
    capacity: usize,
    queued: VecDeque<u8>,
    volume: f32,
    notifier: Option<RefillNotifier>,
}

/// In-memory sink with a fixed byte capacity.
///
/// Clones share the same queue, so one handle can live on the audio thread
/// while another plays the part of the device.
#[derive(Clone)]
pub struct MemorySink {
    state: Arc<Mutex<MemoryState>>,
}

impl MemorySink {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                capacity: capacity - capacity % 2,
                queued: VecDeque::with_capacity(capacity),
                volume: 1.0,
                notifier: None,
            })),
        }
    }

    pub fn attach_notifier(&self, notifier: RefillNotifier) {
        self.lock().notifier = Some(notifier);
    }

    /// Consume up to `bytes` like a device would, then request a refill.
    pub fn drain(&self, bytes: usize) -> Vec<u8> {
        let (drained, notifier) = {
            let mut state = self.lock();
            let n = bytes.min(state.queued.len());
            let drained: Vec<u8> = state.queued.drain(..n).collect();
            (drained, state.notifier.clone())
        };
        if let Some(notifier) = notifier {
            notifier.notify();
        }
        drained
    }

    /// Everything queued so far, without notifying.
    pub fn take_all(&self) -> Vec<u8> {
        self.lock().queued.drain(..).collect()
    }

    pub fn queued_len(&self) -> usize {
        self.lock().queued.len()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for MemorySink {
    fn bytes_free(&self) -> usize {
        let state = self.lock();
        state.capacity.saturating_sub(state.queued.len())
    }

    fn write(&mut self, pcm: &[u8]) -> usize {
        let mut state = self.lock();
        let free = state.capacity.saturating_sub(state.queued.len());
        let n = pcm.len().min(free);
        let n = n - n % 2;
        state.queued.extend(&pcm[..n]);
        n
    }

    fn set_volume(&mut self, volume: f32) {
        self.lock().volume = volume.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::EngineEvent;
    use crossbeam_channel::unbounded;

    #[test]
    fn write_never_exceeds_capacity() {
        let mut sink = MemorySink::new(10);
        assert_eq!(sink.bytes_free(), 10);
        assert_eq!(sink.write(&[1; 7]), 6);
        assert_eq!(sink.bytes_free(), 4);
        assert_eq!(sink.write(&[2; 8]), 4);
        assert_eq!(sink.bytes_free(), 0);
        assert_eq!(sink.write(&[3; 2]), 0);
        assert_eq!(sink.take_all(), vec![1, 1, 1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn drain_frees_space_and_notifies() {
        let (tx, rx) = unbounded();
        let mut sink = MemorySink::new(8);
        sink.attach_notifier(RefillNotifier::new(tx));
        sink.write(&[9; 8]);

        assert_eq!(sink.drain(4), vec![9; 4]);
        assert_eq!(sink.bytes_free(), 4);
        assert!(matches!(rx.try_recv(), Ok(EngineEvent::Refill)));
    }

    #[test]
    fn volume_is_clamped() {
        let mut sink = MemorySink::new(4);
        sink.set_volume(3.0);
        assert_eq!(sink.volume(), 1.0);
        sink.set_volume(0.4);
        assert_eq!(sink.volume(), 0.4);
    }
}
