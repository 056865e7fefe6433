//! # Fast Fourier Transform (FFT) Module
//!
//! The frequency transform behind the spectrum engine. The engine only
//! depends on the [`SpectralTransform`] trait; [`RealFft`] is the planned
//! real-to-complex implementation used at runtime.
//!
//! ## Features
//! - Forward real-to-complex FFT using RealFFT (built on RustFFT)
//! - Planning and scratch allocation paid once, at construction
//! - Optional DC offset removal and Hann windowing before the transform

use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use crate::config::WindowFunction;
use crate::error::{Result, TunerError};

/// A forward transform over fixed-size buffers.
///
/// Implementations take `len()` real samples and write `len() / 2 + 1`
/// complex bins. `forward` takes `&mut self`, so a transform can never run
/// twice at once.
pub trait SpectralTransform {
    /// Number of real input samples.
    fn len(&self) -> usize;

    /// Number of complex output bins.
    fn output_len(&self) -> usize {
        self.len() / 2 + 1
    }

    /// Transforms `input` into `output`. The contents of `input` may be
    /// destroyed.
    fn forward(&mut self, input: &mut [f32], output: &mut [Complex<f32>]) -> Result<()>;
}

/// Removes the DC offset from a signal by making its average value zero.
///
/// # Arguments
/// * `signal` - Audio signal to process (modified in-place)
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 {
        return;
    }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Hann window coefficients, tapering to zero at both edges.
fn hann_coefficients(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// Planned forward real FFT of a fixed length.
pub struct RealFft {
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex<f32>>,
    window: Option<Vec<f32>>,
}

impl RealFft {
    /// Plans a transform of `len` samples.
    pub fn new(len: usize, window_function: WindowFunction) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(len);
        let scratch = plan.make_scratch_vec();
        let window = match window_function {
            WindowFunction::None => None,
            WindowFunction::Hann => Some(hann_coefficients(len)),
        };
        Self {
            plan,
            scratch,
            window,
        }
    }
}

impl std::fmt::Debug for RealFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealFft")
            .field("len", &self.plan.len())
            .field("windowed", &self.window.is_some())
            .finish()
    }
}

impl SpectralTransform for RealFft {
    fn len(&self) -> usize {
        self.plan.len()
    }

    fn forward(&mut self, input: &mut [f32], output: &mut [Complex<f32>]) -> Result<()> {
        if input.len() != self.len() || output.len() != self.output_len() {
            return Err(TunerError::TransformFailure(format!(
                "buffer sizes {}/{} do not match plan {}/{}",
                input.len(),
                output.len(),
                self.len(),
                self.output_len()
            )));
        }

        if let Some(window) = &self.window {
            remove_dc_offset(input);
            for (sample, w) in input.iter_mut().zip(window) {
                *sample *= w;
            }
        }

        self.plan
            .process_with_scratch(input, output, &mut self.scratch)
            .map_err(|e| TunerError::TransformFailure(e.to_string()))
    }
}
