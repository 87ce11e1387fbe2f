//! Volume curves mapping a volume index to an attenuation in centi-dB.
//!
//! A curve is evaluated at indices `0..=MAX_VOLUME`. Both variants clamp
//! indices above [`MAX_VOLUME`] to the top of the curve, so an out-of-range
//! index reads as full volume rather than extrapolating past the ceiling.

use crate::audio_core::constants::{
    DEFAULT_MAX_VOLUME_DBFS, DEFAULT_VOLUME_STEP, MAX_VOLUME, NUM_VOLUME_STEPS,
};

/// A function from volume index to dBFS, in hundredths of a dB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeCurve {
    /// Linear steps down from a ceiling:
    /// `dBFS(v) = max_volume - volume_step * (MAX_VOLUME - v)`.
    SimpleStep {
        /// Value at `MAX_VOLUME`, in centi-dB.
        max_volume: i64,
        /// Attenuation per index below `MAX_VOLUME`, in centi-dB.
        volume_step: i64,
    },

    /// One caller-supplied centi-dB value per index. Not checked for
    /// monotonicity.
    Explicit(Box<[i64; NUM_VOLUME_STEPS]>),
}

impl VolumeCurve {
    /// The system default curve: 0 dB at full volume, 0.5 dB per step.
    pub fn create_default() -> Self {
        Self::create_simple_step(DEFAULT_MAX_VOLUME_DBFS, DEFAULT_VOLUME_STEP)
    }

    /// A stepped curve with caller-supplied ceiling and step.
    ///
    /// Neither parameter is validated; a negative `volume_step` yields a curve
    /// that gets louder as the index goes down.
    pub fn create_simple_step(max_volume: i64, volume_step: i64) -> Self {
        Self::SimpleStep {
            max_volume,
            volume_step,
        }
    }

    /// A curve with one entry per volume index. The values are copied.
    pub fn create_explicit(db_values: &[i64; NUM_VOLUME_STEPS]) -> Self {
        Self::Explicit(Box::new(*db_values))
    }

    /// Returns the attenuation for `volume`, in centi-dB.
    ///
    /// Stepped curves saturate at the `i64` range instead of overflowing on
    /// extreme configured values.
    pub fn dbfs(&self, volume: usize) -> i64 {
        let volume = volume.min(MAX_VOLUME);
        match self {
            Self::SimpleStep {
                max_volume,
                volume_step,
            } => max_volume.saturating_sub(volume_step.saturating_mul((MAX_VOLUME - volume) as i64)),
            Self::Explicit(values) => values[volume],
        }
    }
}

impl Default for VolumeCurve {
    fn default() -> Self {
        Self::create_default()
    }
}
