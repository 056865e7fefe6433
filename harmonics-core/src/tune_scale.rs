//! Non-linear cents axis for display.
//!
//! Zooms in on 0 using a piecewise antisymmetric hyperbolic warp,
//! `y = sign(x) * (1 / (b - a|x|) - 1 / b)`, which keeps -600, 0 and 600
//! where they are. `forward` squeezes small deviations together; a display
//! places cents with `inverse`, which spreads them out around 0. Only front
//! ends use this; analysis works on plain cents.

/// Default stretch; higher means more zoom around 0.
pub const DEFAULT_STRETCH: f64 = 4e-5;

/// Cents that map onto themselves at either end of the axis.
pub const FIXED_POINT: f64 = 600.0;

/// Tick positions, in cents, for a warped axis.
pub const TICKS: [f64; 13] = [
    -600.0, -200.0, -100.0, -50.0, -25.0, -10.0, 0.0, 10.0, 25.0, 50.0, 100.0, 200.0, 600.0,
];

/// Invertible hyperbolic warp of the cents axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuneScale {
    a: f64,
    b: f64,
}

impl Default for TuneScale {
    fn default() -> Self {
        Self::with_stretch(DEFAULT_STRETCH)
    }
}

impl TuneScale {
    /// Builds a warp with stretch `a`; `b` is chosen so ±600 stay fixed.
    pub fn with_stretch(a: f64) -> Self {
        let half = FIXED_POINT / 2.0;
        let b = half * a + (half * half * a * a + a).sqrt();
        Self { a, b }
    }

    /// Compressing direction of the warp.
    pub fn forward(&self, cents: f64) -> f64 {
        cents.signum() * (1.0 / (self.b - self.a * cents.abs()) - 1.0 / self.b)
    }

    /// Expanding direction of the warp; maps cents to screen position.
    pub fn inverse(&self, y: f64) -> f64 {
        y.signum() * (self.b - 1.0 / (y.abs() + 1.0 / self.b)) / self.a
    }
}
