//! # Harmonic Band Planner
//!
//! For a reference frequency, works out which transform bins belong to each
//! harmonic and the cents deviation of every one of those bins. Band `h`
//! spans half an octave either side of `h * f_ref`, i.e.
//! `[h * f_ref / √2, h * f_ref * √2]`, so its width in bins grows with `h`.
//!
//! Bands are planned once per note change. Per-frame work only slices the
//! spectrum with the stored bounds.

use std::f64::consts::SQRT_2;
use std::ops::RangeInclusive;

use crate::notes::{NoteModel, cents_between};

/// Bin bounds and cents axis of one harmonic.
#[derive(Debug, Clone, PartialEq)]
pub struct HarmonicBand {
    harmonic: usize,
    lo: usize,
    hi: usize,
    cents: Vec<f32>,
}

impl HarmonicBand {
    /// Plans band `harmonic` (1 = fundamental) around `reference_freq`.
    pub fn plan(model: &NoteModel, harmonic: usize, reference_freq: f64) -> Self {
        let centre = harmonic as f64 * reference_freq;
        let top = model.n_bins();
        // Bin 0 is DC and has no pitch.
        let lo = model.freq_to_bin(centre / SQRT_2).max(1).min(top);
        let hi = model.freq_to_bin(centre * SQRT_2).min(top);

        if lo >= hi {
            // Clipped away at Nyquist.
            return Self {
                harmonic,
                lo,
                hi: lo,
                cents: Vec::new(),
            };
        }

        let cents = (lo..=hi)
            .map(|bin| cents_between(model.bin_to_freq(bin), centre) as f32)
            .collect();
        Self {
            harmonic,
            lo,
            hi,
            cents,
        }
    }

    pub fn harmonic(&self) -> usize {
        self.harmonic
    }

    /// First bin of the band.
    pub fn lo(&self) -> usize {
        self.lo
    }

    /// Last bin of the band, inclusive.
    pub fn hi(&self) -> usize {
        self.hi
    }

    /// Cents deviation of each bin, ascending.
    pub fn cents(&self) -> &[f32] {
        &self.cents
    }

    /// Number of bins in the band.
    pub fn width(&self) -> usize {
        self.cents.len()
    }

    /// True when clipping left no bins.
    pub fn is_empty(&self) -> bool {
        self.cents.is_empty()
    }

    /// Bins covered by the band, `None` when empty.
    pub fn bins(&self) -> Option<RangeInclusive<usize>> {
        (!self.is_empty()).then(|| self.lo..=self.hi)
    }
}

/// Holds the bands for the current reference note.
#[derive(Debug, Clone)]
pub struct HarmonicBandPlanner {
    harmonics: usize,
    reference_freq: Option<f64>,
    bands: Vec<HarmonicBand>,
}

impl HarmonicBandPlanner {
    pub fn new(harmonics: usize) -> Self {
        Self {
            harmonics,
            reference_freq: None,
            bands: Vec::with_capacity(harmonics),
        }
    }

    /// Recomputes every band for a new reference frequency.
    pub fn plan(&mut self, model: &NoteModel, reference_freq: f64) {
        self.bands.clear();
        for h in 1..=self.harmonics {
            self.bands.push(HarmonicBand::plan(model, h, reference_freq));
        }
        self.reference_freq = Some(reference_freq);
    }

    pub fn harmonics(&self) -> usize {
        self.harmonics
    }

    /// Frequency the bands were planned for, if any.
    pub fn reference_freq(&self) -> Option<f64> {
        self.reference_freq
    }

    /// Planned bands in ascending harmonic order; empty before the first plan.
    pub fn bands(&self) -> &[HarmonicBand] {
        &self.bands
    }
}
