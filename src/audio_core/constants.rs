//! Volume, configuration and DSP limits shared across the audio core.

/// Highest volume index a curve is evaluated at.
pub const MAX_VOLUME: usize = 100;

/// Number of entries in a softvol scaler table (indices `0..=MAX_VOLUME`).
pub const NUM_VOLUME_STEPS: usize = MAX_VOLUME + 1;

/// Ceiling of the default curve, in centi-dB.
pub const DEFAULT_MAX_VOLUME_DBFS: i64 = 0;

/// Step of the default curve, in centi-dB per volume index (0.5 dB).
pub const DEFAULT_VOLUME_STEP: i64 = 50;

/// `<control>:max_volume` fallback when a `simple_step` curve omits it.
pub const CONFIG_DEFAULT_MAX_VOLUME: i64 = 0;

/// `<control>:volume_step` fallback when a `simple_step` curve omits it (3 dB).
pub const CONFIG_DEFAULT_VOLUME_STEP: i64 = 300;

/// `<control>:dB_at_<i>` fallback when an `explicit` curve omits an entry.
pub const CONFIG_DEFAULT_DB_AT: i64 = 0;

/// Control name whose curve becomes a card's default.
pub const DEFAULT_CONTROL_NAME: &str = "Default";

/// Natural log of ten as used by the scaler conversion.
///
/// Truncated on purpose: the hardcoded default table was generated with it.
#[allow(clippy::approx_constant)]
pub const LN_10: f64 = 2.302585;

/// Full-scale magnitude of a 16-bit sample.
pub const S16_FULL_SCALE: f32 = 32768.0;

/// Maximum channel count the DSP chain handles.
pub const MAX_CHANNELS: usize = 8;

/// Maximum number of biquad sections per EQ channel.
pub const MAX_BIQUADS_PER_EQ: usize = 10;
