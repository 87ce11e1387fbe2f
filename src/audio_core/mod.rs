//! Audio Core Module
//!
//! Software volume and per-stream DSP for an audio server. It is organized
//! into sub-modules, each with a specific responsibility:
//!
//! - [`volume_curve`]: volume index to attenuation mapping
//! - [`card_config`]: per-card INI files and the curves they configure
//! - [`softvol`]: linear scaler tables and their application
//! - [`node_volume`]: curve selection for output nodes
//! - [`format_conv`]: interleaved `i16` and planar `f32` conversion
//! - [`denormal`]: flush-to-zero for the processing thread
//! - [`biquad`] and [`dsp_chain`]: filters, EQ and crossovers
//! - [`stream_processor`]: the per-stream pipeline tying these together
//! - [`constants`] and [`errors`]

use env_logger::{Builder, Env};

pub mod biquad;
pub mod card_config;
pub mod constants;
pub mod denormal;
pub mod dsp_chain;
pub mod errors;
pub mod format_conv;
mod format_simd;
pub mod node_volume;
pub mod softvol;
pub mod stream_processor;
pub mod volume_curve;

/// Installs the `env_logger` backend for the `log` macros used across the
/// crate. Safe to call more than once.
pub fn setup_logger() {
    // `info` by default; override with `RUST_LOG`, e.g. `RUST_LOG=debug`.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Already initialized
}
