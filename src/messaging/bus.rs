use crossbeam_channel::Receiver;
use log::{debug, info};

use super::EngineEvent;
use crate::audio::{OutputSink, RefillNotifier};
use crate::core::synth::Synth;

/// The audio-service side of the message bus.
///
/// Lives on the audio thread and is the only writer of synth state. Commands
/// and refill requests are handled one at a time in the order they arrived.
pub struct AudioService<S: OutputSink> {
    synth: Synth,
    sink: S,
    receiver: Receiver<EngineEvent>,
    notifier: RefillNotifier,
}

impl<S: OutputSink> AudioService<S> {
    pub fn new(synth: Synth, sink: S, receiver: Receiver<EngineEvent>, notifier: RefillNotifier) -> Self {
        AudioService {
            synth,
            sink,
            receiver,
            notifier,
        }
    }

    /// Prime the sink, then block on the queue until shutdown or disconnect.
    pub fn run(mut self) {
        self.refill();
        while let Ok(msg) = self.receiver.recv() {
            if !self.handle_message(msg) {
                break;
            }
        }
        info!("Audio service stopped");
    }

    /// Handle everything already queued without blocking. Returns false on shutdown.
    pub fn process_pending(&mut self) -> bool {
        while let Ok(msg) = self.receiver.try_recv() {
            if !self.handle_message(msg) {
                return false;
            }
        }
        true
    }

    /// Apply one event. Returns false when the service should stop.
    fn handle_message(&mut self, msg: EngineEvent) -> bool {
        match msg {
            EngineEvent::PlayNote(note) => self.synth.play_note(note),
            EngineEvent::PlayFrequency(freq) => {
                debug!("Playing frequency {:.2} Hz", freq);
                self.synth.play_frequency(freq);
            }
            EngineEvent::StopNote => {
                debug!("Releasing note");
                self.synth.stop_note();
            }
            EngineEvent::SetVolume(volume) => {
                debug!("Volume set to {:.3}", volume);
                self.sink.set_volume(volume);
            }
            EngineEvent::Refill => {
                self.notifier.acknowledge();
                self.refill();
            }
            EngineEvent::Shutdown => return false,
        }
        true
    }

    fn refill(&mut self) {
        let written = self.synth.refill(&mut self.sink);
        if written > 0 {
            debug!("Refilled {} bytes", written);
        }
    }

    pub fn synth(&self) -> &Synth {
        &self.synth
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
