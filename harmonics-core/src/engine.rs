//! # Spectrum Engine
//!
//! Owns the analysis window, the transform and its buffers, and the planned
//! harmonic bands. A front end calls [`SpectrumEngine::get_spectrum`] once per
//! tick and queues note changes with [`SpectrumEngine::change_note`]; queued
//! changes take effect at the start of the next tick, never mid-frame.
//!
//! ## States
//! - **Idle**: no note chosen yet, frames carry no bands
//! - **Tracking(note)**: bands planned around `note`
//! - **Halted**: a transform failed; the engine stops advancing

use rustfft::num_complex::Complex;

use crate::audio::SampleSource;
use crate::bands::{HarmonicBand, HarmonicBandPlanner};
use crate::config::TunerConfig;
use crate::error::{Result, TunerError};
use crate::fft::{RealFft, SpectralTransform};
use crate::notes::NoteModel;
use crate::power::PowerNormalizer;
use crate::window::WindowBuffer;
use crate::{BandSpectrum, SpectrumFrame};

/// Lifecycle of a [`SpectrumEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Tracking(usize),
    Halted,
}

/// Drives sample ingestion, the transform and band extraction.
#[derive(Debug)]
pub struct SpectrumEngine<T: SpectralTransform = RealFft> {
    config: TunerConfig,
    model: NoteModel,
    window: WindowBuffer,
    planner: HarmonicBandPlanner,
    normalizer: PowerNormalizer,
    transform: T,
    fft_in: Vec<f32>,
    fft_out: Vec<Complex<f32>>,
    state: EngineState,
    /// Latest note requested since the last tick.
    pending_note: Option<usize>,
    /// True once a transform has completed.
    has_output: bool,
    frame: SpectrumFrame,
}

impl SpectrumEngine<RealFft> {
    /// Creates an engine with a planned real FFT sized from `config`.
    pub fn new(config: TunerConfig) -> Result<Self> {
        config.validate()?;
        let transform = RealFft::new(config.window_len(), config.window_function);
        Self::with_transform(config, transform)
    }
}

impl<T: SpectralTransform> SpectrumEngine<T> {
    /// Creates an engine around an existing transform.
    ///
    /// # Errors
    /// * `InvalidConfig` if the configuration is unusable or the transform's
    ///   input or output size does not fit the configured window length
    pub fn with_transform(config: TunerConfig, transform: T) -> Result<Self> {
        config.validate()?;
        let window_len = config.window_len();
        if transform.len() != window_len {
            return Err(TunerError::InvalidConfig(format!(
                "transform length {} does not match window length {}",
                transform.len(),
                window_len
            )));
        }
        // Bands index up to bin N/2.
        if transform.output_len() != window_len / 2 + 1 {
            return Err(TunerError::InvalidConfig(format!(
                "transform produces {} bins, expected {}",
                transform.output_len(),
                window_len / 2 + 1
            )));
        }

        let model = NoteModel::from_config(&config);
        log::info!(
            "[ENGINE] Window of {} samples ({:.0} ms), {:.3} Hz per bin, {} harmonics",
            window_len,
            window_len as f64 * 1_000.0 / config.sample_rate as f64,
            model.bin_to_freq(1),
            config.harmonics
        );

        Ok(Self {
            model,
            window: WindowBuffer::new(window_len),
            planner: HarmonicBandPlanner::new(config.harmonics),
            normalizer: PowerNormalizer::new(config.y_max),
            fft_in: vec![0.0; window_len],
            fft_out: vec![Complex::new(0.0, 0.0); transform.output_len()],
            transform,
            state: EngineState::Idle,
            pending_note: None,
            has_output: false,
            frame: SpectrumFrame::default(),
            config,
        })
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn model(&self) -> &NoteModel {
        &self.model
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Note the bands are currently planned for.
    pub fn note(&self) -> Option<usize> {
        match self.state {
            EngineState::Tracking(note) => Some(note),
            _ => self.frame.note,
        }
    }

    /// Note queued for the next tick, if any.
    pub fn pending_note(&self) -> Option<usize> {
        self.pending_note
    }

    pub fn bands(&self) -> &[HarmonicBand] {
        self.planner.bands()
    }

    pub fn window(&self) -> &WindowBuffer {
        &self.window
    }

    /// Most recent frame, without advancing.
    pub fn frame(&self) -> &SpectrumFrame {
        &self.frame
    }

    /// Switches to `note` immediately and replans every band.
    ///
    /// Call between ticks. Front ends should prefer [`change_note`](Self::change_note),
    /// which defers the switch to the next tick.
    ///
    /// # Errors
    /// * `NoteOutOfRange` if `note` is not a supported note
    /// * `Halted` after a transform failure
    pub fn set_note(&mut self, note: usize) -> Result<()> {
        self.retune(note)?;
        self.rebuild_frame();
        Ok(())
    }

    /// Replans the bands for `note` without touching the frame.
    fn retune(&mut self, note: usize) -> Result<()> {
        if self.state == EngineState::Halted {
            return Err(TunerError::Halted);
        }
        let reference = self.model.note_to_freq(note)?;
        self.planner.plan(&self.model, reference);
        self.state = EngineState::Tracking(note);
        self.pending_note = None;
        log::info!(
            "[ENGINE] Tracking {} ({:.2} Hz)",
            self.model.note_to_name(note as f64),
            reference
        );
        Ok(())
    }

    /// Queues `note` for the next tick, clamped to the supported range.
    pub fn request_note(&mut self, note: i64) {
        self.pending_note = Some(self.model.clamp_note(note));
    }

    /// Queues a move of `delta` semitones from the current (or already queued)
    /// note, clamped to the supported range.
    ///
    /// Returns the queued note, or `None` when the move would not change
    /// anything, e.g. stepping past the top note while already on it. While
    /// idle, the move starts from the configured start note.
    pub fn change_note(&mut self, delta: i32) -> Option<usize> {
        let base = self
            .pending_note
            .or(self.note())
            .unwrap_or(self.config.start_note);
        let target = self.model.clamp_note(base as i64 + delta as i64);
        if target == base && self.note().is_some() {
            return None;
        }
        self.pending_note = Some(target);
        Some(target)
    }

    /// Applies a queued note change. Returns true if the bands changed.
    fn apply_pending(&mut self) -> Result<bool> {
        match self.pending_note.take() {
            Some(note) if Some(note) != self.note() => {
                self.retune(note)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Runs one tick and returns the frame for it.
    ///
    /// 1. Applies any queued note change
    /// 2. Pulls up to one window of samples from `source` without blocking
    /// 3. Runs the transform if new samples arrived
    /// 4. Slices and caps the power of every harmonic band
    ///
    /// With no new samples the previous frame is returned unchanged. Before
    /// the first transform the power arrays are zero.
    ///
    /// # Errors
    /// * `TransformFailure` if the transform fails; the engine halts
    /// * `Halted` on every call after a failure
    pub fn get_spectrum<S>(&mut self, source: &mut S) -> Result<&SpectrumFrame>
    where
        S: SampleSource + ?Sized,
    {
        if self.state == EngineState::Halted {
            return Err(TunerError::Halted);
        }
        let note_changed = self.apply_pending()?;

        let block = source.read(self.window.capacity());
        let ingested = self.window.ingest(&block);

        if ingested > 0 {
            self.fft_in.copy_from_slice(self.window.samples());
            if let Err(e) = self.transform.forward(&mut self.fft_in, &mut self.fft_out) {
                log::error!("[ENGINE] {}; halting", e);
                self.state = EngineState::Halted;
                return Err(e);
            }
            self.has_output = true;
        }

        if ingested > 0 || note_changed {
            self.rebuild_frame();
        }
        Ok(&self.frame)
    }

    /// Refreshes the frame from the stored spectrum and current bands.
    fn rebuild_frame(&mut self) {
        let bands = self
            .planner
            .bands()
            .iter()
            .map(|band| BandSpectrum {
                harmonic: band.harmonic(),
                cents: band.cents().to_vec(),
                power: if self.has_output {
                    self.normalizer.band_power(&self.fft_out, band)
                } else {
                    vec![0.0; band.width()]
                },
            })
            .collect();

        self.frame = SpectrumFrame {
            note: self.note(),
            reference_freq: self.planner.reference_freq(),
            bands,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TunerConfig {
        TunerConfig {
            sample_rate: 8_000,
            min_window_secs: 0.25,
            harmonics: 3,
            ..TunerConfig::default()
        }
    }

    fn silence(_max: usize) -> Vec<f32> {
        Vec::new()
    }

    /// Transform that fails on demand and counts its runs.
    struct FlakyTransform {
        len: usize,
        fail: bool,
        calls: usize,
    }

    impl FlakyTransform {
        fn new(len: usize, fail: bool) -> Self {
            Self {
                len,
                fail,
                calls: 0,
            }
        }
    }

    impl SpectralTransform for FlakyTransform {
        fn len(&self) -> usize {
            self.len
        }

        fn forward(&mut self, _input: &mut [f32], output: &mut [Complex<f32>]) -> Result<()> {
            self.calls += 1;
            if self.fail {
                return Err(TunerError::TransformFailure("provider fault".into()));
            }
            output.fill(Complex::new(1.0, 0.0));
            Ok(())
        }
    }

    /// Transform that writes fewer bins than the window needs.
    struct ShortOutput {
        len: usize,
    }

    impl SpectralTransform for ShortOutput {
        fn len(&self) -> usize {
            self.len
        }

        fn output_len(&self) -> usize {
            16
        }

        fn forward(&mut self, _input: &mut [f32], _output: &mut [Complex<f32>]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn starts_idle_with_empty_frame() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        assert_eq!(engine.state(), EngineState::Idle);
        let frame = engine.get_spectrum(&mut silence).unwrap();
        assert!(frame.bands.is_empty());
        assert_eq!(frame.note, None);
    }

    #[test]
    fn set_note_plans_zeroed_bands() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        engine.set_note(48).unwrap();
        assert_eq!(engine.state(), EngineState::Tracking(48));
        let frame = engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(frame.note, Some(48));
        assert_eq!(frame.bands.len(), 3);
        for (i, band) in frame.bands.iter().enumerate() {
            assert_eq!(band.harmonic, i + 1);
            assert_eq!(band.cents.len(), band.power.len());
            assert!(band.power.iter().all(|&p| p == 0.0));
        }
    }

    #[test]
    fn set_note_rejects_out_of_range() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        assert!(matches!(
            engine.set_note(88),
            Err(TunerError::NoteOutOfRange { .. })
        ));
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn change_note_waits_for_the_next_tick() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        engine.set_note(40).unwrap();
        let before = engine.bands().to_vec();

        assert_eq!(engine.change_note(2), Some(42));
        assert_eq!(engine.change_note(-12), Some(30));
        assert_eq!(engine.note(), Some(40));
        assert_eq!(engine.bands(), before.as_slice());

        let frame = engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(frame.note, Some(30));
        assert_eq!(engine.pending_note(), None);
        assert_ne!(engine.bands(), before.as_slice());
    }

    #[test]
    fn change_note_clamps_at_the_top() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        engine.set_note(87).unwrap();
        assert_eq!(engine.change_note(5), None);
        engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(engine.note(), Some(87));

        engine.set_note(85).unwrap();
        assert_eq!(engine.change_note(12), Some(87));
        engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(engine.note(), Some(87));
    }

    #[test]
    fn change_note_clamps_at_the_bottom() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        engine.set_note(0).unwrap();
        assert_eq!(engine.change_note(-1), None);
        assert_eq!(engine.change_note(-12), None);
    }

    #[test]
    fn idle_change_starts_from_start_note() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        assert_eq!(engine.change_note(1), Some(49));
        engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(engine.state(), EngineState::Tracking(49));
    }

    #[test]
    fn request_note_is_clamped() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        engine.request_note(-3);
        assert_eq!(engine.pending_note(), Some(0));
        engine.request_note(1_000);
        assert_eq!(engine.pending_note(), Some(87));
    }

    #[test]
    fn no_samples_reuses_previous_frame() {
        let mut engine = SpectrumEngine::new(small_config()).unwrap();
        engine.set_note(48).unwrap();
        let mut tone = |max: usize| {
            (0..max)
                .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 8_000.0).sin())
                .collect::<Vec<f32>>()
        };
        let first = engine.get_spectrum(&mut tone).unwrap().clone();
        assert!(first.bands[0].power.iter().any(|&p| p > 0.0));
        let second = engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(&first, second);
    }

    #[test]
    fn transform_failure_halts() {
        let config = small_config();
        let transform = FlakyTransform::new(config.window_len(), true);
        let mut engine = SpectrumEngine::with_transform(config, transform).unwrap();
        engine.set_note(48).unwrap();
        let mut noise = |max: usize| vec![0.1f32; max.min(16)];

        assert!(matches!(
            engine.get_spectrum(&mut noise),
            Err(TunerError::TransformFailure(_))
        ));
        assert_eq!(engine.state(), EngineState::Halted);
        assert!(matches!(
            engine.get_spectrum(&mut noise),
            Err(TunerError::Halted)
        ));
        assert!(matches!(engine.set_note(40), Err(TunerError::Halted)));
    }

    #[test]
    fn power_is_capped_per_band() {
        let config = TunerConfig {
            y_max: 0.5,
            ..small_config()
        };
        let transform = FlakyTransform::new(config.window_len(), false);
        let mut engine = SpectrumEngine::with_transform(config, transform).unwrap();
        engine.set_note(30).unwrap();
        let mut noise = |max: usize| vec![0.1f32; max.min(16)];
        let frame = engine.get_spectrum(&mut noise).unwrap();
        for band in &frame.bands {
            assert!(band.power.iter().all(|&p| p == 0.5));
        }
    }

    #[test]
    fn mismatched_transform_is_rejected() {
        let transform = FlakyTransform::new(100, false);
        assert!(matches!(
            SpectrumEngine::with_transform(small_config(), transform),
            Err(TunerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn short_transform_output_is_rejected() {
        let config = small_config();
        let transform = ShortOutput {
            len: config.window_len(),
        };
        assert!(matches!(
            SpectrumEngine::with_transform(config, transform),
            Err(TunerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn empty_tick_skips_the_transform() {
        let config = small_config();
        let transform = FlakyTransform::new(config.window_len(), false);
        let mut engine = SpectrumEngine::with_transform(config, transform).unwrap();
        engine.set_note(48).unwrap();
        let mut noise = |max: usize| vec![0.1f32; max.min(16)];

        engine.get_spectrum(&mut noise).unwrap();
        assert_eq!(engine.transform.calls, 1);
        engine.get_spectrum(&mut silence).unwrap();
        engine.get_spectrum(&mut silence).unwrap();
        assert_eq!(engine.transform.calls, 1);
    }

    #[test]
    fn empty_tick_never_reaches_a_failing_transform() {
        let config = small_config();
        let transform = FlakyTransform::new(config.window_len(), true);
        let mut engine = SpectrumEngine::with_transform(config, transform).unwrap();
        engine.set_note(48).unwrap();

        assert!(engine.get_spectrum(&mut silence).is_ok());
        assert_eq!(engine.transform.calls, 0);
        assert_eq!(engine.state(), EngineState::Tracking(48));
    }

    #[test]
    fn note_change_and_new_samples_share_one_tick() {
        let config = small_config();
        let transform = FlakyTransform::new(config.window_len(), false);
        let mut engine = SpectrumEngine::with_transform(config, transform).unwrap();
        engine.set_note(48).unwrap();
        assert_eq!(engine.change_note(-12), Some(36));

        let mut noise = |max: usize| vec![0.1f32; max.min(16)];
        let frame = engine.get_spectrum(&mut noise).unwrap().clone();
        assert_eq!(frame.note, Some(36));
        assert_eq!(frame.bands[0].cents, engine.bands()[0].cents());
        assert!(frame.bands[0].power.iter().all(|&p| p > 0.0));
        assert_eq!(engine.transform.calls, 1);
        assert_eq!(engine.frame(), &frame);
    }
}
