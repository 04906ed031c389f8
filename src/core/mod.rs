pub mod envelope;
pub mod generator;
pub mod note;
pub mod oscillator;
pub mod synth;
pub mod volume;

pub use envelope::{AdsrEnvelope, AdsrParams, EnvelopeState};
pub use note::{Note, PitchClass};
pub use oscillator::HarmonicBank;
pub use synth::Synth;
