use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::core::envelope::AdsrParams;
use crate::core::volume::MAX_UI_LEVEL;
use crate::error::{SynthError, SynthResult};

const CONFIG_DIR_NAME: &str = "ear-synth";
const CONFIG_FILE_NAME: &str = "engine.json";

/// Engine settings fixed at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// How often the device asks for more audio.
    pub notify_interval_ms: u64,
    /// Device-side buffer length.
    pub buffer_ms: u32,
    pub envelope: AdsrParams,
    /// Initial slider level, 0..=100.
    pub volume: u8,
    /// Linear gain units per second the device ramps volume changes at.
    pub volume_ramp_per_second: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            notify_interval_ms: 10,
            buffer_ms: 100,
            envelope: AdsrParams::default(),
            volume: MAX_UI_LEVEL,
            volume_ramp_per_second: 20.0,
        }
    }
}

impl EngineConfig {
    /// Load from the per-user config directory, or defaults when no file exists.
    pub fn load() -> SynthResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!("No engine config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> SynthResult<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> SynthResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn default_path() -> SynthResult<PathBuf> {
        let mut path = dirs::config_dir().ok_or(SynthError::NoConfigDir)?;
        path.push(CONFIG_DIR_NAME);
        path.push(CONFIG_FILE_NAME);
        Ok(path)
    }

    pub fn validate(&self) -> SynthResult<()> {
        if self.sample_rate == 0 {
            return Err(SynthError::InvalidConfig("sample_rate must be positive".into()));
        }
        if self.notify_interval_ms == 0 {
            return Err(SynthError::InvalidConfig("notify_interval_ms must be positive".into()));
        }
        if self.buffer_samples() == 0 {
            return Err(SynthError::InvalidConfig("buffer_ms is too small for the sample rate".into()));
        }
        if self.volume > MAX_UI_LEVEL {
            return Err(SynthError::InvalidConfig(format!(
                "volume {} is above {}",
                self.volume, MAX_UI_LEVEL
            )));
        }
        if self.volume_ramp_per_second.is_nan() || self.volume_ramp_per_second <= 0.0 {
            return Err(SynthError::InvalidConfig("volume_ramp_per_second must be positive".into()));
        }

        let env = &self.envelope;
        let rates = [
            ("attack_rate", env.attack_rate),
            ("decay_rate", env.decay_rate),
            ("sustain_level", env.sustain_level),
            ("sustain_decay_rate", env.sustain_decay_rate),
            ("release_rate", env.release_rate),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(SynthError::InvalidConfig(format!("envelope.{name} must be finite and >= 0")));
            }
        }
        if env.attack_rate == 0.0 || env.release_rate == 0.0 {
            return Err(SynthError::InvalidConfig(
                "envelope attack and release rates must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_millis(self.notify_interval_ms)
    }

    /// Device frames between two refill notifications (at least one).
    pub fn notify_frames(&self) -> usize {
        ((self.sample_rate as u64 * self.notify_interval_ms / 1000) as usize).max(1)
    }

    pub fn buffer_samples(&self) -> usize {
        (self.sample_rate as u64 * self.buffer_ms as u64 / 1000) as usize
    }
}
