use log::debug;

use crate::audio::OutputSink;
use crate::core::envelope::{AdsrEnvelope, AdsrParams, EnvelopeState};
use crate::core::generator::{self, BYTES_PER_SAMPLE};
use crate::core::note::Note;
use crate::core::oscillator::HarmonicBank;

/// Monophonic synth state: one target frequency, one envelope, one harmonic bank.
///
/// Owned by the audio thread. Commands and refills both go through `&mut self`,
/// so a refill always sees a consistent state.
pub struct Synth {
    sample_rate: u32,
    frequency: f64,
    envelope: AdsrEnvelope,
    bank: HarmonicBank,
    sample_buffer: Vec<u8>,
}

impl Synth {
    pub fn new(sample_rate: u32, envelope: AdsrParams) -> Self {
        Self {
            sample_rate,
            frequency: 0.0,
            envelope: AdsrEnvelope::new(envelope),
            bank: HarmonicBank::new(),
            sample_buffer: Vec::new(),
        }
    }

    pub fn play_note(&mut self, note: Note) {
        debug!("Playing note {} ({:.2} Hz)", note, note.frequency());
        self.play_frequency(note.frequency());
    }

    /// Retune and restart the attack. Phases restart at zero for the new pitch.
    pub fn play_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
        self.bank.reset_phases();
        self.envelope.on();
    }

    /// Start the release; the tail keeps playing on later refills.
    pub fn stop_note(&mut self) {
        self.envelope.off();
    }

    /// Fill whatever the sink reports free and hand it over. Returns bytes written.
    pub fn refill(&mut self, sink: &mut dyn OutputSink) -> usize {
        let to_generate = sink.bytes_free() / BYTES_PER_SAMPLE;
        if to_generate == 0 {
            return 0;
        }
        let bytes = self.render(to_generate);
        sink.write(&self.sample_buffer[..bytes])
    }

    /// Generate `sample_count` samples into the internal buffer and return them.
    pub fn render_samples(&mut self, sample_count: usize) -> &[u8] {
        let bytes = self.render(sample_count);
        &self.sample_buffer[..bytes]
    }

    fn render(&mut self, sample_count: usize) -> usize {
        let bytes = sample_count * BYTES_PER_SAMPLE;
        if self.sample_buffer.len() < bytes {
            self.sample_buffer.resize(bytes, 0);
        }
        generator::fill(
            &mut self.sample_buffer,
            sample_count,
            self.frequency,
            &mut self.bank,
            &mut self.envelope,
            self.sample_rate,
        )
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn envelope_state(&self) -> EnvelopeState {
        self.envelope.state()
    }

    pub fn envelope_value(&self) -> f64 {
        self.envelope.value()
    }

    pub fn is_sounding(&self) -> bool {
        !self.envelope.is_idle()
    }

    pub fn bank(&self) -> &HarmonicBank {
        &self.bank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemorySink;
    use crate::core::note::PitchClass;
    use crate::utils::helpers::decode_pcm16;
    use std::f64::consts::TAU;

    fn synth() -> Synth {
        Synth::new(22050, AdsrParams::default())
    }

    #[test]
    fn idle_synth_refills_with_silence() {
        let mut synth = synth();
        let mut sink = MemorySink::new(400);
        assert_eq!(synth.refill(&mut sink), 400);
        assert!(decode_pcm16(&sink.take_all()).iter().all(|s| *s == 0));
        assert!(!synth.is_sounding());
    }

    #[test]
    fn refill_writes_exactly_the_free_space() {
        let mut synth = synth();
        synth.play_note(Note::new(4, PitchClass::A));
        let mut sink = MemorySink::new(1000);
        sink.write(&[0; 250]);
        assert_eq!(synth.refill(&mut sink), 750);
        assert_eq!(sink.bytes_free(), 0);
        assert_eq!(synth.refill(&mut sink), 0);
    }

    #[test]
    fn odd_free_space_rounds_down_to_whole_samples() {
        let mut synth = synth();
        let mut sink = MemorySink::new(100);
        sink.write(&[0; 2]);
        sink.drain(1);
        // One byte still queued leaves an odd number free.
        let free = sink.bytes_free();
        let written = synth.refill(&mut sink);
        assert_eq!(written, free - free % 2);
    }

    #[test]
    fn a4_scenario() {
        let mut synth = synth();
        synth.play_note(Note::new(4, PitchClass::A));
        assert_eq!(synth.frequency(), 440.0);

        let samples = decode_pcm16(synth.render_samples(100));
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0], 0);
        assert_eq!(synth.envelope_state(), EnvelopeState::Attack);
        assert!(synth.envelope_value() > 0.0);

        for (h, phase) in synth.bank().phases().iter().enumerate() {
            let step = 440.0 * (h + 1) as f64 * TAU / 22050.0;
            let expected = (100.0 * step) % TAU;
            assert!((phase - expected).abs() < 1e-9, "harmonic {}", h + 1);
        }
    }

    #[test]
    fn new_note_resets_phases_and_restarts_attack() {
        let mut synth = synth();
        synth.play_note(Note::new(4, PitchClass::A));
        synth.render_samples(5000);
        synth.stop_note();
        synth.render_samples(10);
        assert_eq!(synth.envelope_state(), EnvelopeState::Release);

        synth.play_note(Note::new(4, PitchClass::C));
        assert!(synth.bank().phases().iter().all(|p| *p == 0.0));
        assert_eq!(synth.envelope_state(), EnvelopeState::Attack);
        assert_eq!(synth.envelope_value(), 0.0);
    }

    #[test]
    fn stop_note_lets_the_tail_play_out() {
        let mut synth = synth();
        synth.play_note(Note::new(4, PitchClass::A));
        synth.render_samples(4410);
        synth.stop_note();

        let tail = decode_pcm16(synth.render_samples(441));
        assert!(tail.iter().any(|s| *s != 0), "release should not cut immediately");

        // Release from 0.7 at 2/s lasts 0.35 s.
        synth.render_samples(22050);
        assert!(!synth.is_sounding());
        let after = decode_pcm16(synth.render_samples(441));
        assert!(after.iter().all(|s| *s == 0));
    }
}
