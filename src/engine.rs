//! Control-thread facade over the audio service.
//!
//! `SynthEngine` never touches synth state directly. Each command becomes an
//! [`EngineEvent`] on an unbounded channel, so callers never wait on the audio
//! thread. Only `start()` blocks, until the device has opened or failed.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Sender};
use log::{debug, info, warn};

use crate::audio::{CpalSink, OutputSink, RefillNotifier};
use crate::config::EngineConfig;
use crate::core::note::Note;
use crate::core::synth::Synth;
use crate::core::volume::ui_level_to_linear;
use crate::error::{SynthError, SynthResult};
use crate::messaging::{AudioService, EngineEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    NotStarted,
    Running,
    /// `start()` failed; commands are accepted and ignored.
    Inert,
    Stopped,
}

pub struct SynthEngine {
    config: EngineConfig,
    status: EngineStatus,
    sender: Option<Sender<EngineEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl SynthEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            status: EngineStatus::NotStarted,
            sender: None,
            worker: None,
        }
    }

    /// Bind to the default output device.
    pub fn start(&mut self) -> SynthResult<()> {
        self.start_with(CpalSink::open)
    }

    /// Start the audio thread with a sink built by `open_sink` on that thread.
    ///
    /// The sink is constructed where it will live, since device streams are
    /// not always `Send`. A running engine rejects a second start without
    /// touching the device. A failed start leaves the engine `Inert`.
    pub fn start_with<S, F>(&mut self, open_sink: F) -> SynthResult<()>
    where
        S: OutputSink + 'static,
        F: FnOnce(&EngineConfig, RefillNotifier) -> SynthResult<S> + Send + 'static,
    {
        if self.status == EngineStatus::Running {
            warn!("Synth engine already started, ignoring start()");
            return Err(SynthError::AlreadyStarted);
        }
        self.config.validate()?;

        let (sender, receiver) = unbounded();
        let (ready_tx, ready_rx) = bounded::<SynthResult<()>>(1);
        let config = self.config.clone();
        let notifier = RefillNotifier::new(sender.clone());

        let worker = thread::Builder::new()
            .name("synth-audio".into())
            .spawn(move || {
                let mut sink = match open_sink(&config, notifier.clone()) {
                    Ok(sink) => sink,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                sink.set_volume(ui_level_to_linear(config.volume));
                let _ = ready_tx.send(Ok(()));

                let synth = Synth::new(config.sample_rate, config.envelope);
                AudioService::new(synth, sink, receiver, notifier).run();
            })?;

        let outcome = ready_rx.recv().unwrap_or(Err(SynthError::WorkerExited));
        match outcome {
            Ok(()) => {
                info!("Synth engine started at {} Hz", self.config.sample_rate);
                self.sender = Some(sender);
                self.worker = Some(worker);
                self.status = EngineStatus::Running;
                Ok(())
            }
            Err(err) => {
                warn!("Audio unavailable, synth engine is inert: {}", err);
                let _ = worker.join();
                self.status = EngineStatus::Inert;
                Err(err)
            }
        }
    }

    /// Release the device. Safe to call in any state.
    pub fn stop(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(EngineEvent::Shutdown);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Audio service thread panicked");
            }
            info!("Synth engine stopped");
        }
        if self.status == EngineStatus::Running {
            self.status = EngineStatus::Stopped;
        }
    }

    pub fn play_note(&self, note: Note) {
        self.send(EngineEvent::PlayNote(note));
    }

    pub fn play_frequency(&self, frequency: f64) {
        self.send(EngineEvent::PlayFrequency(frequency));
    }

    pub fn stop_note(&self) {
        self.send(EngineEvent::StopNote);
    }

    /// Set output volume from a 0..=100 slider level.
    pub fn change_volume(&self, level: u8) {
        self.send(EngineEvent::SetVolume(ui_level_to_linear(level)));
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn send(&self, event: EngineEvent) {
        match &self.sender {
            Some(sender) => {
                if sender.send(event).is_err() {
                    debug!("Audio service gone, dropping command");
                }
            }
            None => debug!("Synth engine not running, dropping {:?}", event),
        }
    }
}

impl Drop for SynthEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
