//! Real-time tone synthesis for an ear-training trainer.
//!
//! A monophonic additive synth (seven fixed harmonics under a rate-driven
//! ADSR envelope) renders 16-bit mono PCM into a pull-driven output sink.
//! The UI thread talks to it through [`SynthEngine`], which forwards commands
//! to a dedicated audio thread.

pub mod audio;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod messaging;
pub mod utils;

pub use config::EngineConfig;
pub use crate::core::{Note, PitchClass};
pub use engine::{EngineStatus, SynthEngine};
pub use error::{SynthError, SynthResult};
