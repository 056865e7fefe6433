//! # Note Model
//!
//! Conversions between note indices, frequencies, display names and
//! transform bins. Notes follow equal temperament relative to a fixed lowest
//! pitch: `f(n) = f0 * 2^(n/12)`.
//!
//! ## Features
//! - Note index to frequency and back
//! - Note names with octave numbers (`A0`, `C#3`, `Bb2`)
//! - Linear frequency to bin mapping for a fixed transform size
//! - Cent deviation between two frequencies

use crate::config::TunerConfig;
use crate::error::{Result, TunerError};

/// Chromatic name table, starting at C so octave numbers change at C.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Frequency of C0 with A4 = 440 Hz.
const C0_FREQ: f64 = 16.351_597_831_287_414;

/// Pure note and bin math for one analysis setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteModel {
    lowest_freq: f64,
    n_notes: usize,
    nyquist: f64,
    n_bins: usize,
    /// Semitones from C0 up to note index 0.
    name_offset: i64,
}

impl NoteModel {
    /// Creates a model for notes starting at `lowest_freq` and a transform of
    /// `window_len` real samples at `sample_rate`.
    pub fn new(lowest_freq: f64, n_notes: usize, sample_rate: u32, window_len: usize) -> Self {
        let name_offset = (12.0 * (lowest_freq / C0_FREQ).log2()).round() as i64;
        Self {
            lowest_freq,
            n_notes,
            nyquist: sample_rate as f64 / 2.0,
            n_bins: window_len / 2,
            name_offset,
        }
    }

    pub fn from_config(config: &TunerConfig) -> Self {
        Self::new(
            config.lowest_freq,
            config.n_notes,
            config.sample_rate,
            config.window_len(),
        )
    }

    pub fn lowest_freq(&self) -> f64 {
        self.lowest_freq
    }

    pub fn n_notes(&self) -> usize {
        self.n_notes
    }

    /// Index of the last complex bin (the Nyquist bin).
    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn nyquist(&self) -> f64 {
        self.nyquist
    }

    /// Frequency of a note index.
    ///
    /// # Errors
    /// * `NoteOutOfRange` if `note` is not in `[0, n_notes)`
    pub fn note_to_freq(&self, note: usize) -> Result<f64> {
        if note >= self.n_notes {
            return Err(TunerError::NoteOutOfRange {
                note: note as i64,
                n_notes: self.n_notes,
            });
        }
        Ok(self.lowest_freq * 2f64.powf(note as f64 / 12.0))
    }

    /// Fractional note index of a frequency; the exact inverse of
    /// [`note_to_freq`](Self::note_to_freq).
    pub fn freq_to_note(&self, freq: f64) -> f64 {
        12.0 * (freq / self.lowest_freq).log2()
    }

    /// Display name of a (possibly fractional) note index.
    ///
    /// Rounds half up, so `46.5` names the note above, not the even one.
    pub fn note_to_name(&self, note: f64) -> String {
        let rounded = (note + 0.5).floor() as i64 + self.name_offset;
        let name = NOTE_NAMES[rounded.rem_euclid(12) as usize];
        let octave = rounded.div_euclid(12);
        format!("{}{}", name, octave)
    }

    /// Nearest transform bin of a frequency. Not clipped to the bin range.
    pub fn freq_to_bin(&self, freq: f64) -> usize {
        (freq / self.nyquist * self.n_bins as f64).round().max(0.0) as usize
    }

    /// Centre frequency of a transform bin.
    pub fn bin_to_freq(&self, bin: usize) -> f64 {
        bin as f64 / self.n_bins as f64 * self.nyquist
    }

    /// Clamps a signed note index into the supported range.
    pub fn clamp_note(&self, note: i64) -> usize {
        note.clamp(0, self.n_notes as i64 - 1) as usize
    }

    /// Note index for a display name such as `"A4"` or `"C#3"`.
    pub fn note_from_name(&self, name: &str) -> Option<usize> {
        (0..self.n_notes).find(|&n| self.note_to_name(n as f64) == name)
    }

    /// Closest supported note to a frequency.
    pub fn nearest_note(&self, freq: f64) -> usize {
        if freq.is_nan() || freq <= 0.0 {
            return 0;
        }
        let note = (self.freq_to_note(freq) + 0.5).floor() as i64;
        self.clamp_note(note)
    }
}

/// Deviation of `freq` from `reference` in cents.
///
/// Positive values are sharp, negative values flat.
pub fn cents_between(freq: f64, reference: f64) -> f64 {
    1200.0 * (freq / reference).log2()
}
