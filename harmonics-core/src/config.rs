//! # Startup Configuration
//!
//! Fixed parameters of an analysis session. They are read once at startup
//! (optionally from a JSON file) and never change while the engine runs.
//!
//! The defaults describe an 88-key piano (A0 to C8) sampled at 48 kHz.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TunerError};
use crate::window::WindowBuffer;

/// Pre-conditioning applied to the transform input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    /// Feed the raw window to the transform.
    #[default]
    None,
    /// Remove DC offset and taper with a Hann window.
    Hann,
}

/// Startup configuration for the harmonic spectrum engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Shortest window duration the transform must cover, in seconds.
    pub min_window_secs: f64,
    /// Number of harmonic bands, starting with the fundamental.
    pub harmonics: usize,
    /// Display power ceiling.
    pub y_max: f32,
    /// Analysis ticks per second.
    pub framerate: u32,
    /// Frequency of note index 0, in Hz.
    pub lowest_freq: f64,
    /// Number of selectable notes.
    pub n_notes: usize,
    /// Note selected when tracking starts.
    pub start_note: usize,
    pub window_function: WindowFunction,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            min_window_secs: 0.5,
            harmonics: 8,
            y_max: 100.0,
            framerate: 30,
            lowest_freq: 27.5,
            n_notes: 88,
            // A4
            start_note: 48,
            window_function: WindowFunction::None,
        }
    }
}

impl TunerConfig {
    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let config: TunerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Checks that the configuration describes a usable session.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(TunerError::InvalidConfig(msg));
        if self.sample_rate == 0 {
            return fail("sample_rate must be positive".into());
        }
        if self.min_window_secs.is_nan() || self.min_window_secs <= 0.0 {
            return fail(format!(
                "min_window_secs must be positive, got {}",
                self.min_window_secs
            ));
        }
        if self.harmonics == 0 {
            return fail("at least one harmonic is required".into());
        }
        if self.y_max.is_nan() || self.y_max <= 0.0 {
            return fail(format!("y_max must be positive, got {}", self.y_max));
        }
        if self.framerate == 0 {
            return fail("framerate must be positive".into());
        }
        if self.lowest_freq.is_nan() || self.lowest_freq <= 0.0 {
            return fail(format!(
                "lowest_freq must be positive, got {}",
                self.lowest_freq
            ));
        }
        if self.n_notes == 0 {
            return fail("n_notes must be positive".into());
        }
        if self.start_note >= self.n_notes {
            return fail(format!(
                "start_note {} is outside 0..{}",
                self.start_note, self.n_notes
            ));
        }
        Ok(())
    }

    /// Number of samples in the analysis window.
    pub fn window_len(&self) -> usize {
        WindowBuffer::capacity_for(self.sample_rate, self.min_window_secs)
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// Time between two analysis ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.framerate.max(1) as f64)
    }
}
