//! Display power for one harmonic band.

use rustfft::num_complex::Complex;

use crate::bands::HarmonicBand;

/// Turns complex bins into magnitudes bounded by a display ceiling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerNormalizer {
    y_max: f32,
}

impl PowerNormalizer {
    pub fn new(y_max: f32) -> Self {
        Self { y_max }
    }

    pub fn y_max(&self) -> f32 {
        self.y_max
    }

    /// Power of every bin in `band`, rescaled so it never exceeds the ceiling.
    pub fn band_power(&self, spectrum: &[Complex<f32>], band: &HarmonicBand) -> Vec<f32> {
        let mut power: Vec<f32> = match band.bins() {
            Some(bins) => spectrum[bins].iter().map(|c| c.norm()).collect(),
            None => Vec::new(),
        };
        self.cap(&mut power);
        power
    }

    /// Scales the whole series down so its peak sits exactly at the ceiling.
    ///
    /// Series already at or under the ceiling are left untouched. Each call is
    /// independent: nothing is remembered between bands or frames.
    pub fn cap(&self, power: &mut [f32]) {
        let Some((peak_idx, &peak)) = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
        else {
            return;
        };
        if peak.is_nan() || peak <= self.y_max {
            return;
        }
        let scale = self.y_max / peak;
        for value in power.iter_mut() {
            *value = (*value * scale).min(self.y_max);
        }
        power[peak_idx] = self.y_max;
    }
}
