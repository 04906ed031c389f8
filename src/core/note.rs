use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Reference pitch for equal temperament (A4).
pub const REFERENCE_FREQUENCY: f64 = 440.0;
pub const REFERENCE_OCTAVE: i32 = 4;

pub const PITCH_CLASS_COUNT: u8 = 12;

const PITCH_CLASS_NAMES: [&str; PITCH_CLASS_COUNT as usize] =
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// One of the twelve chromatic positions in an octave, always stored in `0..12`.
///
/// Enharmonic spellings are plain aliases: `C_SHARP == D_FLAT`, `B_SHARP == C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);
    pub const C_SHARP: PitchClass = PitchClass(1);
    pub const D_FLAT: PitchClass = PitchClass(1);
    pub const D: PitchClass = PitchClass(2);
    pub const D_SHARP: PitchClass = PitchClass(3);
    pub const E_FLAT: PitchClass = PitchClass(3);
    pub const E: PitchClass = PitchClass(4);
    pub const F_FLAT: PitchClass = PitchClass(4);
    pub const E_SHARP: PitchClass = PitchClass(5);
    pub const F: PitchClass = PitchClass(5);
    pub const F_SHARP: PitchClass = PitchClass(6);
    pub const G_FLAT: PitchClass = PitchClass(6);
    pub const G: PitchClass = PitchClass(7);
    pub const G_SHARP: PitchClass = PitchClass(8);
    pub const A_FLAT: PitchClass = PitchClass(8);
    pub const A: PitchClass = PitchClass(9);
    pub const A_SHARP: PitchClass = PitchClass(10);
    pub const B_FLAT: PitchClass = PitchClass(10);
    pub const B: PitchClass = PitchClass(11);
    pub const C_FLAT: PitchClass = PitchClass(11);
    pub const B_SHARP: PitchClass = PitchClass(0);

    /// Build from any integer, reduced modulo 12.
    pub fn new(value: i32) -> Self {
        PitchClass(value.rem_euclid(PITCH_CLASS_COUNT as i32) as u8)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Sharp spelling, e.g. `"F#"`.
    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.0 as usize]
    }
}

impl From<i32> for PitchClass {
    fn from(value: i32) -> Self {
        PitchClass::new(value)
    }
}

impl From<PitchClass> for i32 {
    fn from(pc: PitchClass) -> Self {
        pc.0 as i32
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A pitch class in a specific octave. A4 is the 440 Hz anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub octave: i32,
    pub pitch_class: PitchClass,
}

impl Default for Note {
    fn default() -> Self {
        Note::new(REFERENCE_OCTAVE, PitchClass::A)
    }
}

impl Note {
    pub fn new(octave: i32, pitch_class: PitchClass) -> Self {
        Self { octave, pitch_class }
    }

    /// Fundamental frequency in Hz (12-tone equal temperament).
    pub fn frequency(&self) -> f64 {
        note_frequency(*self)
    }

    /// Signed semitone distance from `other` to `self`.
    pub fn semitones_from(&self, other: &Note) -> i32 {
        (self.octave - other.octave) * PITCH_CLASS_COUNT as i32
            + (i32::from(self.pitch_class) - i32::from(other.pitch_class))
    }

    /// Random target note for an ear-training round: octaves 3 to 5, any pitch class.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let octave = rng.random_range(3..6);
        let pitch_class = rng.random_range(0..PITCH_CLASS_COUNT as i32);
        Note::new(octave, PitchClass::new(pitch_class))
    }
}

/// Map a note to its fundamental frequency.
///
/// `note_diff` may fall outside `0..12` when relative to A; the exponent is
/// continuous so no special casing is needed.
pub fn note_frequency(note: Note) -> f64 {
    let octave_diff = (note.octave - REFERENCE_OCTAVE) as f64;
    let note_diff = (i32::from(note.pitch_class) - i32::from(PitchClass::A)) as f64;
    REFERENCE_FREQUENCY * 2.0f64.powf(octave_diff + note_diff / 12.0)
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = SynthError;

    /// Parses `C4`, `c#4`, `Bb3`, `E#-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SynthError::InvalidNote(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();

        let letter = chars.next().ok_or_else(invalid)?;
        let base = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let rest = chars.as_str();
        let (accidental, octave_str) = match rest.chars().next() {
            Some('#') => (1, &rest[1..]),
            Some('b') => (-1, &rest[1..]),
            _ => (0, rest),
        };

        let octave: i32 = octave_str.parse().map_err(|_| invalid())?;
        Ok(Note::new(octave, PitchClass::new(base + accidental)))
    }
}
