use crate::core::note::Note;

/// Everything the audio thread reacts to, in one queue so arrival order is kept.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PlayNote(Note),
    PlayFrequency(f64),
    StopNote,
    /// Linear gain, already mapped from the UI scale.
    SetVolume(f32),
    /// The sink has room for more audio.
    Refill,
    Shutdown,
}
