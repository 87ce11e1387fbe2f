//! Software volume: per-index linear gain tables and their application.
//!
//! A [`SoftvolTable`] holds one linear scaler per volume index, computed from
//! a [`VolumeCurve`]. Scalers never exceed unity; a curve with positive dBFS
//! entries is capped rather than allowed to amplify.

use crate::audio_core::constants::{LN_10, MAX_VOLUME, NUM_VOLUME_STEPS};
use crate::audio_core::errors::SoftvolError;
use crate::audio_core::volume_curve::VolumeCurve;

/// Hardcoded scalers for the default curve: -50 dB at index 0 up to 0 dB at
/// index 100 in 0.5 dB steps.
pub const DEFAULT_SOFTVOL_SCALERS: [f32; NUM_VOLUME_STEPS] = [
    0.003162, 0.003350, 0.003548, 0.003758, 0.003981, 0.004217, //
    0.004467, 0.004732, 0.005012, 0.005309, 0.005623, 0.005957, //
    0.006310, 0.006683, 0.007079, 0.007499, 0.007943, 0.008414, //
    0.008913, 0.009441, 0.010000, 0.010593, 0.011220, 0.011885, //
    0.012589, 0.013335, 0.014125, 0.014962, 0.015849, 0.016788, //
    0.017783, 0.018836, 0.019953, 0.021135, 0.022387, 0.023714, //
    0.025119, 0.026607, 0.028184, 0.029854, 0.031623, 0.033497, //
    0.035481, 0.037584, 0.039811, 0.042170, 0.044668, 0.047315, //
    0.050119, 0.053088, 0.056234, 0.059566, 0.063096, 0.066834, //
    0.070795, 0.074989, 0.079433, 0.084140, 0.089125, 0.094406, //
    0.100000, 0.105925, 0.112202, 0.118850, 0.125893, 0.133352, //
    0.141254, 0.149624, 0.158489, 0.167880, 0.177828, 0.188365, //
    0.199526, 0.211349, 0.223872, 0.237137, 0.251189, 0.266073, //
    0.281838, 0.298538, 0.316228, 0.334965, 0.354813, 0.375837, //
    0.398107, 0.421697, 0.446684, 0.473151, 0.501187, 0.530884, //
    0.562341, 0.595662, 0.630957, 0.668344, 0.707946, 0.749894, //
    0.794328, 0.841395, 0.891251, 0.944061, 1.000000,
];

/// Converts centi-dB to a linear amplitude scaler: `10^(dBFS / 2000)`.
///
/// The exponent is formed in `f64` and the exponential is taken in `f32`,
/// which the hardcoded table was generated with.
#[inline]
pub fn convert_scaler_from_db(dbfs: i64) -> f32 {
    ((LN_10 / 2000.0 * dbfs as f64) as f32).exp()
}

/// Linear gain per volume index.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftvolTable {
    scalers: Box<[f32]>,
}

impl SoftvolTable {
    /// Evaluates `curve` at every index and converts each value to a scaler.
    pub fn from_curve(curve: &VolumeCurve) -> Result<Self, SoftvolError> {
        let mut scalers = Vec::new();
        scalers.try_reserve_exact(NUM_VOLUME_STEPS)?;

        let mut capped = 0usize;
        for volume in 0..NUM_VOLUME_STEPS {
            let scaler = convert_scaler_from_db(curve.dbfs(volume));
            if scaler > 1.0 {
                capped += 1;
            }
            scalers.push(scaler.min(1.0));
        }

        if capped > 0 {
            log::warn!("volume curve has {capped} entries above 0 dBFS, capped at unity gain");
        }

        Ok(Self {
            scalers: scalers.into_boxed_slice(),
        })
    }

    /// The hardcoded fallback table.
    pub fn default_table() -> Self {
        Self {
            scalers: Box::new(DEFAULT_SOFTVOL_SCALERS),
        }
    }

    /// Scaler for `volume`; indices above [`MAX_VOLUME`] read as full volume.
    #[inline]
    pub fn scaler(&self, volume: usize) -> f32 {
        self.scalers[volume.min(MAX_VOLUME)]
    }

    /// All scalers, indexed by volume.
    pub fn as_slice(&self) -> &[f32] {
        &self.scalers
    }
}

/// Builds a table from an optional curve, passing absence through.
pub fn build_from_curve(curve: Option<&VolumeCurve>) -> Result<Option<SoftvolTable>, SoftvolError> {
    curve.map(SoftvolTable::from_curve).transpose()
}

/// Multiplies the first `frames` samples of each planar channel by `scaler`.
pub fn scale_planar<C: AsMut<[f32]>>(channels: &mut [C], frames: usize, scaler: f32) {
    if scaler == 1.0 {
        return;
    }

    for channel in channels.iter_mut() {
        for sample in channel.as_mut().iter_mut().take(frames) {
            *sample *= scaler;
        }
    }
}

/// Multiplies interleaved 16-bit samples by `scaler` in place.
///
/// The product is truncated toward zero and saturated to the `i16` range.
pub fn scale_s16(samples: &mut [i16], scaler: f32) {
    if scaler == 1.0 {
        return;
    }

    for sample in samples.iter_mut() {
        *sample = (*sample as f32 * scaler) as i16;
    }
}
