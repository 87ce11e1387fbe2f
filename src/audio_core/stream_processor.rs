//! Per-stream processing: PCM in, DSP chain, software volume, PCM out.
//!
//! [`StreamProcessor`] owns all scratch memory it needs; once built it
//! processes without allocating, so it can run on the audio thread.

use crate::audio_core::constants::{MAX_CHANNELS, MAX_VOLUME};
use crate::audio_core::denormal::enable_flush_to_zero;
use crate::audio_core::dsp_chain::DspModule;
use crate::audio_core::errors::{DspError, FormatError};
use crate::audio_core::format_conv::{deinterleave, interleave};
use crate::audio_core::softvol::{SoftvolTable, scale_planar};

/// Runs interleaved 16-bit PCM through a chain of [`DspModule`]s and a
/// softvol scaler, in place.
pub struct StreamProcessor {
    channels: usize,
    block_frames: usize,
    planar: Vec<Vec<f32>>,
    modules: Vec<Box<dyn DspModule>>,
    scalers: SoftvolTable,
    volume: usize,
}

impl StreamProcessor {
    /// Creates a processor for `channels` channels that works in blocks of at
    /// most `block_frames` frames. Volume starts at [`MAX_VOLUME`].
    pub fn new(
        channels: usize,
        block_frames: usize,
        scalers: SoftvolTable,
    ) -> Result<Self, DspError> {
        if channels == 0 {
            return Err(DspError::NoChannels);
        }
        if channels > MAX_CHANNELS {
            return Err(DspError::TooManyChannels {
                channels,
                max: MAX_CHANNELS,
            });
        }
        if block_frames == 0 {
            return Err(DspError::ZeroFrames);
        }

        log::debug!("stream processor: {channels} ch, {block_frames} frames per block");

        Ok(Self {
            channels,
            block_frames,
            planar: vec![vec![0.0; block_frames]; channels],
            modules: Vec::new(),
            scalers,
            volume: MAX_VOLUME,
        })
    }

    /// Appends a stage to the end of the chain.
    pub fn add_module(&mut self, module: Box<dyn DspModule>) -> Result<(), DspError> {
        if module.channels() != self.channels {
            return Err(DspError::ChannelMismatch {
                module: module.channels(),
                processor: self.channels,
            });
        }
        self.modules.push(module);
        Ok(())
    }

    /// Sets the volume index used to look up the softvol scaler.
    pub fn set_volume(&mut self, volume: usize) {
        self.volume = volume.min(MAX_VOLUME);
    }

    pub fn volume(&self) -> usize {
        self.volume
    }

    /// Swaps in a table rebuilt from a new curve.
    pub fn set_scalers(&mut self, scalers: SoftvolTable) {
        self.scalers = scalers;
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Clears the state of every stage.
    pub fn reset(&mut self) {
        for module in self.modules.iter_mut() {
            module.reset();
        }
    }

    /// Processes interleaved samples in place.
    ///
    /// `pcm` must hold a whole number of frames; an empty buffer is a no-op.
    pub fn process(&mut self, pcm: &mut [i16]) -> Result<(), DspError> {
        if pcm.len() % self.channels != 0 {
            return Err(FormatError::PartialFrame {
                samples: pcm.len(),
                channels: self.channels,
            }
            .into());
        }
        if pcm.is_empty() {
            return Ok(());
        }

        enable_flush_to_zero();
        let scaler = self.scalers.scaler(self.volume);

        for block in pcm.chunks_mut(self.block_frames * self.channels) {
            let frames = block.len() / self.channels;
            deinterleave(block, &mut self.planar, frames)?;

            let mut views: [&mut [f32]; MAX_CHANNELS] = Default::default();
            for (view, channel) in views.iter_mut().zip(self.planar.iter_mut()) {
                *view = &mut channel[..frames];
            }
            let views = &mut views[..self.channels];

            for module in self.modules.iter_mut() {
                module.process(views, frames);
            }
            scale_planar(views, frames, scaler);

            interleave(views, block, frames)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_core::biquad::BiquadType;
    use crate::audio_core::dsp_chain::{Eq, MultibandGain};
    use crate::audio_core::volume_curve::VolumeCurve;

    fn default_processor(channels: usize, block_frames: usize) -> StreamProcessor {
        let scalers = SoftvolTable::from_curve(&VolumeCurve::create_default()).unwrap();
        StreamProcessor::new(channels, block_frames, scalers).unwrap()
    }

    #[test]
    fn test_empty_chain_at_full_volume_is_transparent() {
        let mut processor = default_processor(2, 64);
        let input: Vec<i16> = (0..1_000).map(|i| (i * 61 % 65_536 - 32_768) as i16).collect();
        let mut pcm = input.clone();

        processor.process(&mut pcm).unwrap();

        assert_eq!(pcm, input);
    }

    #[test]
    fn test_volume_scales_output() {
        let mut processor = default_processor(1, 16);
        processor.set_volume(60); // -20 dB on the default curve.
        let mut pcm = vec![10_000i16; 40];

        processor.process(&mut pcm).unwrap();

        assert!(pcm.iter().all(|s| (*s - 1_000).abs() <= 1));
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut processor = default_processor(1, 16);
        processor.set_volume(1_000);

        assert_eq!(processor.volume(), MAX_VOLUME);
    }

    #[test]
    fn test_partial_frame_is_rejected() {
        let mut processor = default_processor(2, 16);
        let mut pcm = vec![0i16; 5];

        assert!(matches!(
            processor.process(&mut pcm),
            Err(DspError::Format(FormatError::PartialFrame {
                samples: 5,
                channels: 2
            }))
        ));
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut processor = default_processor(2, 16);
        let mut pcm: Vec<i16> = Vec::new();

        processor.process(&mut pcm).unwrap();
    }

    #[test]
    fn test_invalid_construction() {
        let table = SoftvolTable::default_table;

        assert!(matches!(
            StreamProcessor::new(0, 16, table()),
            Err(DspError::NoChannels)
        ));
        assert!(matches!(
            StreamProcessor::new(MAX_CHANNELS + 1, 16, table()),
            Err(DspError::TooManyChannels { .. })
        ));
        assert!(matches!(
            StreamProcessor::new(2, 0, table()),
            Err(DspError::ZeroFrames)
        ));
    }

    #[test]
    fn test_module_channel_mismatch_is_rejected() {
        let mut processor = default_processor(2, 16);

        assert!(matches!(
            processor.add_module(Box::new(Eq::new(1, 48_000.0))),
            Err(DspError::ChannelMismatch {
                module: 1,
                processor: 2
            })
        ));
        assert!(processor.add_module(Box::new(Eq::new(2, 48_000.0))).is_ok());
    }

    #[test]
    fn test_flat_eq_chain_is_near_transparent() {
        let mut processor = default_processor(2, 32);
        let mut eq = Eq::new(2, 48_000.0);
        eq.append_biquad(0, BiquadType::Peaking, 1_000.0, 1.0, 0.0)
            .unwrap();
        eq.append_biquad(1, BiquadType::Peaking, 4_000.0, 2.0, 0.0)
            .unwrap();
        processor.add_module(Box::new(eq)).unwrap();

        let input: Vec<i16> = (0..512)
            .map(|i| ((i as f32 * 0.05).sin() * 12_000.0) as i16)
            .collect();
        let mut pcm = input.clone();
        processor.process(&mut pcm).unwrap();

        for (a, b) in input.iter().zip(&pcm) {
            assert!((*a as i32 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_module_gain_and_softvol_combine() {
        let mut processor = default_processor(1, 64);
        let mut multiband = MultibandGain::new(1, 48_000.0, 500.0, 5_000.0);
        multiband.set_band_gains_db([-6.0, -6.0, -6.0]);
        processor.add_module(Box::new(multiband)).unwrap();
        processor.set_volume(88); // -6 dB on the default curve.

        let mut pcm: Vec<i16> = (0..9_600)
            .map(|i| ((i as f32 * 0.1).sin() * 16_000.0) as i16)
            .collect();
        processor.process(&mut pcm).unwrap();

        // -12 dB in total.
        let peak = pcm[4_800..].iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!((3_900..=4_100).contains(&peak), "peak {peak}");
    }
}
