//! Second-order filter sections.
//!
//! Coefficients are derived in `f64` from a frequency normalized to Nyquist
//! (`0.0..=1.0`) and stored as `f32`. Processing is direct form I, with the
//! two previous inputs and outputs kept in the section.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Q of a second-order Butterworth section.
pub const BUTTERWORTH_Q: f64 = FRAC_1_SQRT_2;

/// Filter response of a designed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadType {
    Lowpass,
    Highpass,
    /// Boost or cut of `gain` dB around the centre frequency.
    Peaking,
}

/// One biquad section: coefficients (`a0 == 1`) and its delay line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::identity()
    }
}

impl Biquad {
    /// A section that passes its input unchanged.
    pub fn identity() -> Self {
        Self::from_coefficients(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Designs a section.
    ///
    /// `freq` is normalized to Nyquist. A low-pass at or above Nyquist passes
    /// everything and one at or below zero passes nothing; a high-pass is the
    /// reverse. A peaking section outside `(0, 1)` is flat, and one with
    /// `q <= 0` is a plain gain.
    pub fn new_set(kind: BiquadType, freq: f64, q: f64, gain: f64) -> Self {
        match kind {
            BiquadType::Lowpass => Self::lowpass(freq, q),
            BiquadType::Highpass => Self::highpass(freq, q),
            BiquadType::Peaking => Self::peaking(freq, q, gain),
        }
    }

    fn lowpass(freq: f64, q: f64) -> Self {
        if freq >= 1.0 || freq.is_nan() {
            return Self::identity();
        }
        if freq <= 0.0 {
            return Self::from_coefficients(0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        }

        let (cos_w0, alpha) = Self::cos_and_alpha(freq, q);
        let b1 = 1.0 - cos_w0;
        Self::from_coefficients(
            b1 * 0.5,
            b1,
            b1 * 0.5,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    fn highpass(freq: f64, q: f64) -> Self {
        if freq >= 1.0 || freq.is_nan() {
            return Self::from_coefficients(0.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        }
        if freq <= 0.0 {
            return Self::identity();
        }

        let (cos_w0, alpha) = Self::cos_and_alpha(freq, q);
        let b1 = -(1.0 + cos_w0);
        Self::from_coefficients(
            -b1 * 0.5,
            b1,
            -b1 * 0.5,
            1.0 + alpha,
            -2.0 * cos_w0,
            1.0 - alpha,
        )
    }

    fn peaking(freq: f64, q: f64, gain: f64) -> Self {
        if !gain.is_finite() || !(freq > 0.0 && freq < 1.0) {
            return Self::identity();
        }

        let a = 10.0_f64.powf(gain / 40.0);
        if q <= 0.0 || q.is_nan() {
            return Self::from_coefficients(a * a, 0.0, 0.0, 1.0, 0.0, 0.0);
        }

        let (cos_w0, alpha) = Self::cos_and_alpha(freq, q);
        Self::from_coefficients(
            1.0 + alpha * a,
            -2.0 * cos_w0,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_w0,
            1.0 - alpha / a,
        )
    }

    fn cos_and_alpha(freq: f64, q: f64) -> (f64, f64) {
        let w0 = PI * freq;
        let q = if q > 0.0 { q } else { BUTTERWORTH_Q };
        (w0.cos(), w0.sin() / (2.0 * q))
    }

    fn from_coefficients(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        let inv_a0 = 1.0 / a0;
        Self {
            b0: (b0 * inv_a0) as f32,
            b1: (b1 * inv_a0) as f32,
            b2: (b2 * inv_a0) as f32,
            a1: (a1 * inv_a0) as f32,
            a2: (a2 * inv_a0) as f32,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Filters one sample.
    #[inline]
    pub fn process_sample(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Filters `data` in place.
    pub fn process(&mut self, data: &mut [f32]) {
        let (b0, b1, b2, a1, a2) = (self.b0, self.b1, self.b2, self.a1, self.a2);
        let (mut x1, mut x2, mut y1, mut y2) = (self.x1, self.x2, self.y1, self.y2);

        for x in data.iter_mut() {
            let y = b0 * *x + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;
            x2 = x1;
            x1 = *x;
            y2 = y1;
            y1 = y;
            *x = y;
        }

        self.x1 = x1;
        self.x2 = x2;
        self.y1 = y1;
        self.y2 = y2;
    }

    /// Clears the delay line, keeping the coefficients.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Magnitude response at normalized frequency `freq`.
    pub fn magnitude(&self, freq: f64) -> f64 {
        let w = PI * freq;
        let (c1, s1) = (w.cos(), w.sin());
        let (c2, s2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b0 as f64 + self.b1 as f64 * c1 + self.b2 as f64 * c2;
        let num_im = -(self.b1 as f64 * s1 + self.b2 as f64 * s2);
        let den_re = 1.0 + self.a1 as f64 * c1 + self.a2 as f64 * c2;
        let den_im = -(self.a1 as f64 * s1 + self.a2 as f64 * s2);

        (num_re.hypot(num_im)) / (den_re.hypot(den_im))
    }
}

/// `freq_hz` as a fraction of Nyquist at `fs_hz`; `NaN` for a bad rate.
pub fn normalized_freq(fs_hz: f32, freq_hz: f32) -> f64 {
    if !(fs_hz.is_finite() && fs_hz > 0.0) {
        return f64::NAN;
    }
    freq_hz as f64 / (fs_hz as f64 * 0.5)
}
