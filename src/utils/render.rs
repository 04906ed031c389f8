//! Offline rendering of a single note, for listening tests and inspection.

use std::path::Path;

use log::info;

use crate::config::EngineConfig;
use crate::core::note::Note;
use crate::core::synth::Synth;
use crate::error::{SynthError, SynthResult};
use crate::utils::helpers::{decode_pcm16, format_time};

/// Longest hold `render_note` accepts.
pub const MAX_HOLD_SECONDS: f64 = 600.0;

/// Render `note` held for `hold_seconds`, followed by its complete release tail.
///
/// Samples are produced in notification-sized batches, the same granularity
/// the device pulls at, so phase folding happens on the same schedule.
pub fn render_note(config: &EngineConfig, note: Note, hold_seconds: f64) -> SynthResult<Vec<i16>> {
    config.validate()?;
    if !hold_seconds.is_finite() || !(0.0..=MAX_HOLD_SECONDS).contains(&hold_seconds) {
        return Err(SynthError::InvalidConfig(format!(
            "hold time must be between 0 and {} seconds, got {}",
            MAX_HOLD_SECONDS, hold_seconds
        )));
    }

    let mut synth = Synth::new(config.sample_rate, config.envelope);
    let batch = config.notify_frames();
    let hold_samples = (hold_seconds * config.sample_rate as f64) as usize;

    let mut samples = Vec::new();
    synth.play_note(note);
    while samples.len() < hold_samples {
        let n = batch.min(hold_samples - samples.len());
        samples.extend(decode_pcm16(synth.render_samples(n)));
    }

    synth.stop_note();
    while synth.is_sounding() {
        samples.extend(decode_pcm16(synth.render_samples(batch)));
    }

    info!(
        "Rendered {} ({} samples, {})",
        note,
        samples.len(),
        format_time(samples.len() as f64 / config.sample_rate as f64)
    );
    Ok(samples)
}

/// Store mono 16-bit samples as a WAV file.
pub fn write_wav(path: &Path, sample_rate: u32, samples: &[i16]) -> SynthResult<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(())
}
