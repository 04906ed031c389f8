//! Fills byte buffers with quantized 16-bit little-endian samples.

use crate::core::envelope::AdsrEnvelope;
use crate::core::note::REFERENCE_FREQUENCY;
use crate::core::oscillator::{HarmonicBank, HARMONIC_COUNT};

pub const BYTES_PER_SAMPLE: usize = 2;

/// Full-scale amplitude shared between all harmonics.
const HARMONIC_SCALE: f64 = i16::MAX as f64 / HARMONIC_COUNT as f64;

/// Write `sample_count` samples into `buffer` and return the number of bytes written.
///
/// The envelope advances by one sample period per sample. Phases are folded
/// back into `[0, 2π)` once the whole batch is done. A zero or non-finite
/// `frequency` has no loudness normalization and produces silence.
pub fn fill(
    buffer: &mut [u8],
    sample_count: usize,
    frequency: f64,
    bank: &mut HarmonicBank,
    envelope: &mut AdsrEnvelope,
    sample_rate: u32,
) -> usize {
    let sample_count = sample_count.min(buffer.len() / BYTES_PER_SAMPLE);
    let sample_period = 1.0 / sample_rate as f64;
    let bytes = sample_count * BYTES_PER_SAMPLE;

    if !is_audible_frequency(frequency) {
        buffer[..bytes].fill(0);
        for _ in 0..sample_count {
            envelope.advance(sample_period);
        }
        return bytes;
    }

    let normalization = REFERENCE_FREQUENCY / frequency;

    for frame in buffer[..bytes].chunks_exact_mut(BYTES_PER_SAMPLE) {
        let raw = bank.generate_sample(frequency, sample_period);
        let value = raw * normalization * envelope.value() * HARMONIC_SCALE;
        envelope.advance(sample_period);
        frame.copy_from_slice(&quantize(value).to_le_bytes());
    }

    bank.renormalize_phases();
    bytes
}

/// Truncate toward zero, saturating at the i16 range.
#[inline]
pub fn quantize(value: f64) -> i16 {
    value as i16
}

fn is_audible_frequency(frequency: f64) -> bool {
    frequency.is_finite() && frequency > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::AdsrParams;
    use crate::utils::helpers::decode_pcm16;
    use std::f64::consts::TAU;

    const RATE: u32 = 22050;

    fn parts() -> (HarmonicBank, AdsrEnvelope) {
        (HarmonicBank::new(), AdsrEnvelope::new(AdsrParams::default()))
    }

    #[test]
    fn silent_without_a_note() {
        let (mut bank, mut env) = parts();
        let mut buffer = vec![0xAAu8; 200];
        let written = fill(&mut buffer, 100, 0.0, &mut bank, &mut env, RATE);
        assert_eq!(written, 200);
        assert!(decode_pcm16(&buffer).iter().all(|s| *s == 0));
    }

    #[test]
    fn non_finite_frequency_is_silent() {
        let (mut bank, mut env) = parts();
        env.on();
        for freq in [f64::NAN, f64::INFINITY, -440.0] {
            let mut buffer = vec![0x55u8; 64];
            fill(&mut buffer, 32, freq, &mut bank, &mut env, RATE);
            assert!(decode_pcm16(&buffer).iter().all(|s| *s == 0), "{freq}");
        }
        assert!(bank.phases().iter().all(|p| *p == 0.0));
    }

    #[test]
    fn attack_ramps_up_from_silence() {
        let (mut bank, mut env) = parts();
        env.on();
        let mut buffer = vec![0u8; 200];
        fill(&mut buffer, 100, 440.0, &mut bank, &mut env, RATE);
        let samples = decode_pcm16(&buffer);

        // Envelope is exactly 0 for the first sample of the attack.
        assert_eq!(samples[0], 0);
        assert!(env.value() > 0.0);
        assert!((env.value() - 100.0 * 15.0 / RATE as f64).abs() < 1e-9);
        assert!(samples.iter().any(|s| *s != 0));

        let early: i32 = samples[..20].iter().map(|s| (*s as i32).abs()).max().unwrap();
        let late: i32 = samples[80..].iter().map(|s| (*s as i32).abs()).max().unwrap();
        assert!(late > early, "late {late} vs early {early}");
    }

    #[test]
    fn phases_are_folded_after_batch() {
        let (mut bank, mut env) = parts();
        env.on();
        let mut buffer = vec![0u8; 200];
        fill(&mut buffer, 100, 440.0, &mut bank, &mut env, RATE);
        for (h, phase) in bank.phases().iter().enumerate() {
            let expected = (100.0 * 440.0 * (h + 1) as f64 * TAU / RATE as f64) % TAU;
            assert!((0.0..TAU).contains(phase));
            assert!((phase - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn sample_count_is_capped_by_buffer() {
        let (mut bank, mut env) = parts();
        let mut buffer = vec![0u8; 11];
        assert_eq!(fill(&mut buffer, 100, 440.0, &mut bank, &mut env, RATE), 10);
    }

    #[test]
    fn bytes_match_quantized_values() {
        let (mut bank, mut env) = parts();
        let (mut ref_bank, mut ref_env) = parts();
        env.on();
        ref_env.on();
        let mut buffer = vec![0u8; 1024];
        fill(&mut buffer, 512, 330.0, &mut bank, &mut env, RATE);

        let period = 1.0 / RATE as f64;
        let expected: Vec<i16> = (0..512)
            .map(|_| {
                let raw = ref_bank.generate_sample(330.0, period);
                let v = raw * (440.0 / 330.0) * ref_env.value() * HARMONIC_SCALE;
                ref_env.advance(period);
                quantize(v)
            })
            .collect();
        assert_eq!(decode_pcm16(&buffer), expected);
    }

    #[test]
    fn quantize_truncates_toward_zero() {
        assert_eq!(quantize(1.9), 1);
        assert_eq!(quantize(-1.9), -1);
        assert_eq!(quantize(40000.0), i16::MAX);
        assert_eq!(quantize(-40000.0), i16::MIN);
    }
}
