//! Software volume and stream DSP for an audio server.
//!
//! Volume curves map a 0..=100 volume index to attenuation in centi-dB.
//! Curves come from per-card INI files or built-in defaults, get turned into
//! linear softvol tables, and are applied to interleaved 16-bit PCM by a
//! [`StreamProcessor`] along with any EQ or crossover stages.

pub mod audio_core;

pub use audio_core::card_config::CardConfig;
pub use audio_core::node_volume::OutputNodeVolume;
pub use audio_core::setup_logger;
pub use audio_core::softvol::{SoftvolTable, build_from_curve, convert_scaler_from_db};
pub use audio_core::stream_processor::StreamProcessor;
pub use audio_core::volume_curve::VolumeCurve;
