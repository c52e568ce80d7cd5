//! Biquad filter design and a direct-form-I biquad stage.
//!
//! Coefficient formulas come from the Audio EQ Cookbook (Robert
//! Bristow-Johnson), i.e. bilinear transforms of second-order analog
//! prototypes with frequency pre-warping.

use std::f64::consts::PI;

use super::window::db_to_linear;

/// Filter response shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    Lowpass,
    Highpass,
    Bandpass,
    Notch,
    Peaking,
    LowShelf,
    HighShelf,
}

/// Normalized biquad coefficients (`a0` divided out).
///
/// Immutable once designed; a parameter change produces a new set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl FilterCoefficients {
    /// Pass-through.
    pub const IDENTITY: FilterCoefficients = FilterCoefficients {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design a biquad.
    ///
    /// `frequency` must lie strictly between 0 and Nyquist and `q` must be
    /// positive; callers validate this before designing. `gain_db` only
    /// affects the peaking and shelf shapes.
    pub fn design(
        filter_type: FilterType,
        sample_rate: f64,
        frequency: f64,
        q: f64,
        gain_db: f64,
    ) -> Self {
        debug_assert!(frequency > 0.0 && frequency < sample_rate / 2.0);
        debug_assert!(q > 0.0);

        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);
        // cookbook A is the square root of the linear gain
        let a_lin = db_to_linear(gain_db / 2.0);

        let (b0, b1, b2, a0, a1, a2) = match filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                let b0 = b1 / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterType::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                let b1 = -(1.0 + cos_w0);
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterType::Bandpass => (
                alpha,
                0.0,
                -alpha,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Notch => (
                1.0,
                -2.0 * cos_w0,
                1.0,
                1.0 + alpha,
                -2.0 * cos_w0,
                1.0 - alpha,
            ),
            FilterType::Peaking => (
                1.0 + alpha * a_lin,
                -2.0 * cos_w0,
                1.0 - alpha * a_lin,
                1.0 + alpha / a_lin,
                -2.0 * cos_w0,
                1.0 - alpha / a_lin,
            ),
            FilterType::LowShelf => {
                let sq = 2.0 * a_lin.sqrt() * alpha;
                let ap1 = a_lin + 1.0;
                let am1 = a_lin - 1.0;
                (
                    a_lin * (ap1 - am1 * cos_w0 + sq),
                    2.0 * a_lin * (am1 - ap1 * cos_w0),
                    a_lin * (ap1 - am1 * cos_w0 - sq),
                    ap1 + am1 * cos_w0 + sq,
                    -2.0 * (am1 + ap1 * cos_w0),
                    ap1 + am1 * cos_w0 - sq,
                )
            }
            FilterType::HighShelf => {
                let sq = 2.0 * a_lin.sqrt() * alpha;
                let ap1 = a_lin + 1.0;
                let am1 = a_lin - 1.0;
                (
                    a_lin * (ap1 + am1 * cos_w0 + sq),
                    -2.0 * a_lin * (am1 + ap1 * cos_w0),
                    a_lin * (ap1 + am1 * cos_w0 - sq),
                    ap1 - am1 * cos_w0 + sq,
                    2.0 * (am1 - ap1 * cos_w0),
                    ap1 - am1 * cos_w0 - sq,
                )
            }
        };

        FilterCoefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Both poles strictly inside the unit circle (Jury conditions for a
    /// second-order denominator `1 + a1 z^-1 + a2 z^-2`).
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Magnitude response at `frequency` Hz.
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

/// One biquad stage in direct form I: two past inputs, two past outputs.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: FilterCoefficients,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    pub fn new(coeffs: FilterCoefficients) -> Self {
        Biquad {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn coefficients(&self) -> FilterCoefficients {
        self.coeffs
    }

    /// Swap in new coefficients. The delay registers are kept so a parameter
    /// change does not click.
    pub fn set_coefficients(&mut self, coeffs: FilterCoefficients) {
        self.coeffs = coeffs;
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    /// Zero the delay registers.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
