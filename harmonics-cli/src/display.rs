//! Text rendering of spectrum frames.
//!
//! One line per harmonic: the strongest bin's deviation, its power and a
//! gauge drawn on the warped cents axis.

use harmonics_core::tune_scale::{FIXED_POINT, TuneScale};
use harmonics_core::{BandSpectrum, NoteModel, SpectrumFrame};

/// Renders frames as plain text.
#[derive(Debug, Clone)]
pub struct TextDisplay {
    scale: TuneScale,
    gauge_width: usize,
    y_max: f32,
}

impl TextDisplay {
    pub fn new(gauge_width: usize, y_max: f32) -> Self {
        Self {
            scale: TuneScale::default(),
            gauge_width: gauge_width.max(3) | 1,
            y_max,
        }
    }

    /// Heading naming the reference note.
    pub fn title(&self, frame: &SpectrumFrame, model: &NoteModel) -> String {
        match (frame.note, frame.reference_freq) {
            (Some(note), Some(freq)) => format!(
                "Harmonic spectrum at {} ({:.2} Hz)",
                model.note_to_name(note as f64),
                freq
            ),
            _ => "Harmonic spectrum (no note selected)".to_string(),
        }
    }

    /// Gauge column for a deviation; the centre column is 0 cents.
    pub fn gauge_column(&self, cents: f32) -> usize {
        let cents = (cents as f64).clamp(-FIXED_POINT, FIXED_POINT);
        let position = (self.scale.inverse(cents) + FIXED_POINT) / (2.0 * FIXED_POINT);
        (position * (self.gauge_width - 1) as f64).round() as usize
    }

    /// One line for one harmonic band.
    pub fn band_line(&self, band: &BandSpectrum) -> String {
        let mut gauge = vec!['-'; self.gauge_width];
        gauge[self.gauge_width / 2] = '|';

        let reading = match band.peak() {
            Some((cents, power)) if power > 0.0 => {
                gauge[self.gauge_column(cents)] = '#';
                format!("{:+7.1}c {:5.1}%", cents, 100.0 * power / self.y_max)
            }
            Some(_) => "  quiet        ".to_string(),
            None => "  above Nyquist".to_string(),
        };
        format!(
            "h{:<2} {} [{}]",
            band.harmonic,
            reading,
            gauge.into_iter().collect::<String>()
        )
    }

    /// Full text for a frame.
    pub fn render(&self, frame: &SpectrumFrame, model: &NoteModel) -> String {
        let mut out = self.title(frame, model);
        for band in &frame.bands {
            out.push('\n');
            out.push_str(&self.band_line(band));
        }
        out
    }
}
