//! cpal-backed output sink.
//!
//! The device callback runs on cpal's thread and pops i16 samples from a
//! lock-free ring buffer; the audio-service thread pushes into it. Every
//! `notify_interval` worth of frames the callback asks for a refill.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig, SupportedStreamConfigRange};
use log::{debug, error, info, warn};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use super::{OutputSink, RefillNotifier};
use crate::config::EngineConfig;
use crate::core::generator::BYTES_PER_SAMPLE;
use crate::core::volume::{ui_level_to_linear, SmoothedParameter};
use crate::error::{SynthError, SynthResult};

/// Source material is mono; devices with more channels get it duplicated.
const SOURCE_CHANNELS: u16 = 1;

pub struct CpalSink {
    /// Kept alive for as long as the sink exists; dropping it stops playback.
    _stream: Stream,
    producer: HeapProd<i16>,
    volume: Arc<AtomicU32>,
    scratch: Vec<i16>,
}

impl CpalSink {
    /// Open the default output device at the configured rate.
    ///
    /// Fails with `UnsupportedFormat` when no supported range covers the rate
    /// with a sample type we can convert to.
    pub fn open(config: &EngineConfig, notifier: RefillNotifier) -> SynthResult<Self> {
        let host = cpal::default_host();
        debug!("Using audio host: {}", host.id().name());

        let device = host.default_output_device().ok_or(SynthError::NoOutputDevice)?;
        info!(
            "Using output device: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".to_string())
        );

        let range = find_supported_range(&device, config.sample_rate)?;
        let sample_format = range.sample_format();
        let stream_config: StreamConfig = range.with_sample_rate(cpal::SampleRate(config.sample_rate)).into();
        debug!("Device config: {:?} ({:?})", stream_config, sample_format);

        let ring = HeapRb::<i16>::new(config.buffer_samples());
        let (producer, consumer) = ring.split();

        let initial_volume = ui_level_to_linear(config.volume);
        let volume = Arc::new(AtomicU32::new(initial_volume.to_bits()));

        let callback = CallbackState {
            consumer,
            volume: Arc::clone(&volume),
            gain: SmoothedParameter::new(initial_volume, config.volume_ramp_per_second),
            channels: stream_config.channels as usize,
            sample_period: config.sample_period() as f32,
            notify_frames: config.notify_frames(),
            frames_since_notify: 0,
            notifier,
        };

        let stream = match sample_format {
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, callback),
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, callback),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, callback),
            _ => {
                return Err(SynthError::UnsupportedFormat {
                    sample_rate: config.sample_rate,
                    channels: SOURCE_CHANNELS,
                })
            }
        }?;
        stream.play()?;

        info!(
            "Audio output started: {} Hz, {} device channel(s), {} sample buffer, refill every {:?}",
            config.sample_rate,
            stream_config.channels,
            config.buffer_samples(),
            config.notify_interval()
        );

        Ok(Self {
            _stream: stream,
            producer,
            volume,
            scratch: Vec::with_capacity(config.buffer_samples()),
        })
    }
}

impl OutputSink for CpalSink {
    fn bytes_free(&self) -> usize {
        self.producer.vacant_len() * BYTES_PER_SAMPLE
    }

    fn write(&mut self, pcm: &[u8]) -> usize {
        self.scratch.clear();
        self.scratch.extend(
            pcm.chunks_exact(BYTES_PER_SAMPLE)
                .take(self.producer.vacant_len())
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
        );
        self.producer.push_slice(&self.scratch) * BYTES_PER_SAMPLE
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume.store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }
}

/// Pick a supported range covering `sample_rate`, preferring fewer channels
/// and native i16 samples.
fn find_supported_range(device: &Device, sample_rate: u32) -> SynthResult<SupportedStreamConfigRange> {
    let ranges = device.supported_output_configs()?;

    let best = ranges
        .filter(|range| range.min_sample_rate().0 <= sample_rate && range.max_sample_rate().0 >= sample_rate)
        .filter_map(|range| format_rank(range.sample_format()).map(|rank| (range, rank)))
        .min_by_key(|(range, rank)| (range.channels(), *rank))
        .map(|(range, _)| range);

    best.ok_or_else(|| {
        warn!("raw audio format not supported by backend, cannot play audio.");
        SynthError::UnsupportedFormat {
            sample_rate,
            channels: SOURCE_CHANNELS,
        }
    })
}

fn format_rank(format: SampleFormat) -> Option<u8> {
    match format {
        SampleFormat::I16 => Some(0),
        SampleFormat::F32 => Some(1),
        SampleFormat::U16 => Some(2),
        _ => None,
    }
}

/// Everything the device callback owns.
struct CallbackState {
    consumer: HeapCons<i16>,
    volume: Arc<AtomicU32>,
    gain: SmoothedParameter,
    channels: usize,
    sample_period: f32,
    notify_frames: usize,
    frames_since_notify: usize,
    notifier: RefillNotifier,
}

impl CallbackState {
    fn render<T>(&mut self, data: &mut [T])
    where
        T: SizedSample + FromSample<f32>,
    {
        self.gain.set(f32::from_bits(self.volume.load(Ordering::Relaxed)));

        for frame in data.chunks_mut(self.channels) {
            // Underrun plays silence.
            let sample = self.consumer.try_pop().unwrap_or(0);
            self.gain.advance(self.sample_period);
            let value = T::from_sample(sample as f32 / 32768.0 * self.gain.get());
            for out in frame.iter_mut() {
                *out = value;
            }

            self.frames_since_notify += 1;
            if self.frames_since_notify >= self.notify_frames {
                self.frames_since_notify = 0;
                self.notifier.notify();
            }
        }
    }
}

fn build_stream<T>(device: &Device, config: &StreamConfig, mut state: CallbackState) -> SynthResult<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let err_fn = |err| error!("an error occurred on the audio stream: {}", err);

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| state.render(data),
        err_fn,
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_i16_is_preferred() {
        let i16_rank = format_rank(SampleFormat::I16).unwrap();
        let f32_rank = format_rank(SampleFormat::F32).unwrap();
        let u16_rank = format_rank(SampleFormat::U16).unwrap();
        assert!(i16_rank < f32_rank);
        assert!(i16_rank < u16_rank);
    }

    #[test]
    fn unconvertible_formats_are_rejected() {
        assert_eq!(format_rank(SampleFormat::I8), None);
        assert_eq!(format_rank(SampleFormat::I32), None);
        assert_eq!(format_rank(SampleFormat::F64), None);
    }
}
