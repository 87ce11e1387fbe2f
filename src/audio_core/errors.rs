//! Audio-core error types.
//!
//! Absence (no config file, no configured curve) is never an error; it is
//! reported as `None` by the functions that look things up.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors that can occur while building a softvol scaler table.
#[derive(Debug, Error)]
pub enum SoftvolError {
    /// The scaler table could not be allocated.
    #[error("failed to allocate softvol scaler table: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Buffer-shape errors reported by the sample format converters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// An interleaved buffer ends in the middle of a frame.
    #[error("{samples} samples is not a whole number of {channels}-channel frames")]
    PartialFrame {
        /// Samples in the buffer.
        samples: usize,
        /// Channels per frame.
        channels: usize,
    },

    /// An input buffer holds fewer samples than `frames` requires.
    #[error("input buffer too short: need {needed} samples, have {actual}")]
    InputTooShort {
        /// Samples required.
        needed: usize,
        /// Samples available.
        actual: usize,
    },

    /// An output buffer holds fewer samples than `frames` requires.
    #[error("output buffer too short: need {needed} samples, have {actual}")]
    OutputTooShort {
        /// Samples required.
        needed: usize,
        /// Samples available.
        actual: usize,
    },
}

/// Errors that can occur while reading a card configuration file.
#[derive(Debug, Error)]
pub enum CardConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read card config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid INI.
    #[error("failed to parse card config: {0}")]
    Parse(String),
}

/// Errors that can occur while assembling a DSP chain or stream processor.
#[derive(Debug, Error)]
pub enum DspError {
    /// An EQ channel already holds the maximum number of biquads.
    #[error("EQ is full ({max} biquads per channel)")]
    TooManyBiquads {
        /// Maximum number of sections.
        max: usize,
    },

    /// A per-channel operation named a channel the module does not have.
    #[error("channel {channel} out of range ({channels} channels)")]
    NoSuchChannel {
        /// Requested channel index.
        channel: usize,
        /// Channels the module has.
        channels: usize,
    },

    /// The requested channel count exceeds the supported maximum.
    #[error("too many channels: {channels} (max {max})")]
    TooManyChannels {
        /// Requested channel count.
        channels: usize,
        /// Supported maximum.
        max: usize,
    },

    /// A processor needs at least one channel.
    #[error("stream processor needs at least one channel")]
    NoChannels,

    /// A processor needs a non-zero block size.
    #[error("stream processor needs a non-zero block size")]
    ZeroFrames,

    /// A module was built for a different channel count than the processor.
    #[error("module expects {module} channels, processor has {processor}")]
    ChannelMismatch {
        /// Channels the module was built for.
        module: usize,
        /// Channels the processor runs.
        processor: usize,
    },

    /// Building the softvol table failed.
    #[error(transparent)]
    Softvol(#[from] SoftvolError),

    /// A buffer did not have the expected shape.
    #[error(transparent)]
    Format(#[from] FormatError),
}
