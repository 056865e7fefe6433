// harmonics-core/src/lib.rs

//! The core logic for the harmonic spectrum tuner.
//! This crate is responsible for audio capture plumbing, the sliding analysis
//! window, the frequency transform and the per-harmonic cents/power bands.
//! It is completely headless and contains no display code.

pub mod audio;
pub mod bands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fft;
pub mod notes;
pub mod power;
pub mod tune_scale;
pub mod window;

pub use audio::{ChannelSource, SampleSource};
pub use config::{TunerConfig, WindowFunction};
pub use engine::{EngineState, SpectrumEngine};
pub use error::{Result, TunerError};
pub use notes::NoteModel;

/// Power around one harmonic of the reference note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSpectrum {
    /// Harmonic order, 1 for the fundamental.
    pub harmonic: usize,
    /// Deviation of each bin from the exact harmonic, in cents, ascending.
    pub cents: Vec<f32>,
    /// Display power of each bin, same length as `cents`.
    pub power: Vec<f32>,
}

/// Result of one analysis tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumFrame {
    /// Reference note the bands were planned for.
    pub note: Option<usize>,
    /// Frequency of the reference note in Hz.
    pub reference_freq: Option<f64>,
    /// One entry per harmonic, in ascending order. Empty while idle.
    pub bands: Vec<BandSpectrum>,
}

impl BandSpectrum {
    /// Cents and power of the strongest bin, if the band has any bins.
    pub fn peak(&self) -> Option<(f32, f32)> {
        self.power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, &p)| (self.cents[i], p))
    }
}
