//! Additive oscillator bank with a fixed, fitted harmonic table.

use std::f64::consts::TAU;

use crate::utils::helpers::db_to_power_ratio;

pub const HARMONIC_COUNT: usize = 7;

/// Relative level of harmonics 1..=7 in dB, fitted against a reference tone.
pub const HARMONICS_DB: [f64; HARMONIC_COUNT] = [-31.0, -46.0, -54.0, -52.0, -68.0, -55.0, -55.0];

/// One phase accumulator per harmonic, in radians.
#[derive(Debug, Clone)]
pub struct HarmonicBank {
    phases: [f64; HARMONIC_COUNT],
    gains: [f64; HARMONIC_COUNT],
}

impl Default for HarmonicBank {
    fn default() -> Self {
        Self::new()
    }
}

impl HarmonicBank {
    pub fn new() -> Self {
        Self::with_levels(HARMONICS_DB)
    }

    /// Gains are normalized so the first harmonic is always 1.0.
    pub fn with_levels(levels_db: [f64; HARMONIC_COUNT]) -> Self {
        let mut gains = [0.0; HARMONIC_COUNT];
        for (gain, db) in gains.iter_mut().zip(levels_db.iter()) {
            *gain = db_to_power_ratio(db - levels_db[0]);
        }
        Self {
            phases: [0.0; HARMONIC_COUNT],
            gains,
        }
    }

    /// Produce one raw sample and step every harmonic forward by one sample period.
    pub fn generate_sample(&mut self, frequency: f64, sample_period: f64) -> f64 {
        let mut sample = 0.0;
        for (h, (phase, gain)) in self.phases.iter_mut().zip(self.gains.iter()).enumerate() {
            sample += gain * phase.sin();
            *phase += phase_increment(frequency, h + 1, sample_period);
        }
        sample
    }

    /// Fold every accumulator back into `[0, 2π)`. Call once per batch, never per sample.
    pub fn renormalize_phases(&mut self) {
        for phase in self.phases.iter_mut() {
            *phase %= TAU;
        }
    }

    pub fn reset_phases(&mut self) {
        self.phases = [0.0; HARMONIC_COUNT];
    }

    pub fn phases(&self) -> &[f64; HARMONIC_COUNT] {
        &self.phases
    }

    pub fn gains(&self) -> &[f64; HARMONIC_COUNT] {
        &self.gains
    }
}

/// Per-sample phase step of harmonic `harmonic` (1-based).
pub fn phase_increment(frequency: f64, harmonic: usize, sample_period: f64) -> f64 {
    frequency * harmonic as f64 * TAU * sample_period
}
