//! Conversion between interleaved 16-bit PCM and planar float buffers.
//!
//! The scalar functions define the conversion:
//!
//! - deinterleave: `out[ch][frame] = in[frame * channels + ch] / 32768.0`
//! - interleave: scale by 32768, add 0.5 away from zero, truncate, then
//!   saturate to `[-32768, 32767]`
//!
//! Stereo buffers take a vectorized path on targets that have one. It must
//! produce bit-identical output to the scalar path for every input.
//!
//! `frames == 0` is always a valid no-op, whatever the buffers look like.

use crate::audio_core::constants::S16_FULL_SCALE;
use crate::audio_core::errors::FormatError;
use crate::audio_core::format_simd;

/// Converts one 16-bit sample to float.
#[inline(always)]
pub fn s16_to_f32(sample: i16) -> f32 {
    sample as f32 / S16_FULL_SCALE
}

/// Converts one float sample to 16 bits, rounding half away from zero.
///
/// NaN converts to 0. Out-of-range values saturate.
#[inline(always)]
pub fn f32_to_s16(sample: f32) -> i16 {
    let mut scaled = sample * S16_FULL_SCALE;
    scaled += if scaled >= 0.0 { 0.5 } else { -0.5 };
    scaled.clamp(-32768.0, 32767.0) as i16
}

/// Splits `frames` interleaved frames into one float buffer per channel.
///
/// The channel count is `outputs.len()`.
pub fn deinterleave<O: AsMut<[f32]>>(
    input: &[i16],
    outputs: &mut [O],
    frames: usize,
) -> Result<(), FormatError> {
    if frames == 0 {
        return Ok(());
    }
    check_interleaved_len(input.len(), outputs.len(), frames, true)?;
    for output in outputs.iter_mut() {
        check_planar_len(output.as_mut().len(), frames, false)?;
    }

    if let [left, right] = outputs {
        if format_simd::deinterleave_stereo(
            &input[..frames * 2],
            &mut left.as_mut()[..frames],
            &mut right.as_mut()[..frames],
        ) {
            return Ok(());
        }
    }

    deinterleave_scalar(input, outputs, frames);
    Ok(())
}

/// Merges `frames` frames from one float buffer per channel into interleaved
/// 16-bit samples.
///
/// The channel count is `inputs.len()`.
pub fn interleave<I: AsRef<[f32]>>(
    inputs: &[I],
    output: &mut [i16],
    frames: usize,
) -> Result<(), FormatError> {
    if frames == 0 {
        return Ok(());
    }
    check_interleaved_len(output.len(), inputs.len(), frames, false)?;
    for input in inputs.iter() {
        check_planar_len(input.as_ref().len(), frames, true)?;
    }

    if let [left, right] = inputs {
        if format_simd::interleave_stereo(
            &left.as_ref()[..frames],
            &right.as_ref()[..frames],
            &mut output[..frames * 2],
        ) {
            return Ok(());
        }
    }

    interleave_scalar(inputs, output, frames);
    Ok(())
}

/// Reference deinterleave for any channel count.
///
/// Buffers must already be checked to hold `frames` frames.
pub(crate) fn deinterleave_scalar<O: AsMut<[f32]>>(input: &[i16], outputs: &mut [O], frames: usize) {
    let channels = outputs.len();
    if channels == 0 {
        return;
    }

    for (frame, samples) in input.chunks_exact(channels).take(frames).enumerate() {
        for (output, sample) in outputs.iter_mut().zip(samples) {
            output.as_mut()[frame] = s16_to_f32(*sample);
        }
    }
}

/// Reference interleave for any channel count.
///
/// Buffers must already be checked to hold `frames` frames.
pub(crate) fn interleave_scalar<I: AsRef<[f32]>>(inputs: &[I], output: &mut [i16], frames: usize) {
    let channels = inputs.len();
    if channels == 0 {
        return;
    }

    for (frame, samples) in output.chunks_exact_mut(channels).take(frames).enumerate() {
        for (sample, input) in samples.iter_mut().zip(inputs) {
            *sample = f32_to_s16(input.as_ref()[frame]);
        }
    }
}

fn check_interleaved_len(
    len: usize,
    channels: usize,
    frames: usize,
    is_input: bool,
) -> Result<(), FormatError> {
    too_short(len, frames.saturating_mul(channels), is_input)
}

fn check_planar_len(len: usize, frames: usize, is_input: bool) -> Result<(), FormatError> {
    too_short(len, frames, is_input)
}

fn too_short(actual: usize, needed: usize, is_input: bool) -> Result<(), FormatError> {
    match (actual >= needed, is_input) {
        (true, _) => Ok(()),
        (false, true) => Err(FormatError::InputTooShort { needed, actual }),
        (false, false) => Err(FormatError::OutputTooShort { needed, actual }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: [i16; 5] = [-32768, -1, 0, 1, 32767];

    #[test]
    fn test_s16_to_f32_is_asymmetric() {
        assert_eq!(s16_to_f32(-32768), -1.0);
        assert_eq!(s16_to_f32(32767), 32767.0 / 32768.0);
        assert_eq!(s16_to_f32(0), 0.0);
    }

    #[test]
    fn test_f32_to_s16_rounds_half_away_from_zero() {
        assert_eq!(f32_to_s16(0.5 / 32768.0), 1);
        assert_eq!(f32_to_s16(-0.5 / 32768.0), -1);
        assert_eq!(f32_to_s16(1.5 / 32768.0), 2);
        assert_eq!(f32_to_s16(2.5 / 32768.0), 3);
        assert_eq!(f32_to_s16(-2.5 / 32768.0), -3);
        assert_eq!(f32_to_s16(2.4 / 32768.0), 2);
    }

    #[test]
    fn test_f32_to_s16_saturates() {
        assert_eq!(f32_to_s16(1.0), 32767);
        assert_eq!(f32_to_s16(4.0), 32767);
        assert_eq!(f32_to_s16(-1.0), -32768);
        assert_eq!(f32_to_s16(-4.0), -32768);
        assert_eq!(f32_to_s16(f32::INFINITY), 32767);
        assert_eq!(f32_to_s16(f32::NEG_INFINITY), -32768);
        assert_eq!(f32_to_s16(f32::NAN), 0);
    }

    #[test]
    fn test_deinterleave_generic_channels() {
        let input = [1i16, 2, 3, 4, 5, 6];
        let mut outputs = vec![vec![0.0f32; 2]; 3];

        deinterleave(&input, &mut outputs, 2).unwrap();

        assert_eq!(outputs[0], vec![1.0 / 32768.0, 4.0 / 32768.0]);
        assert_eq!(outputs[1], vec![2.0 / 32768.0, 5.0 / 32768.0]);
        assert_eq!(outputs[2], vec![3.0 / 32768.0, 6.0 / 32768.0]);
    }

    #[test]
    fn test_interleave_generic_channels() {
        let inputs = vec![vec![0.5f32, -0.5], vec![1.0, -1.0], vec![0.0, 2.0]];
        let mut output = [0i16; 6];

        interleave(&inputs, &mut output, 2).unwrap();

        assert_eq!(output, [16384, 32767, 0, -16384, -32768, 32767]);
    }

    #[test]
    fn test_stereo_round_trip_all_values_with_perturbation() {
        let values: Vec<i16> = (i16::MIN..=i16::MAX).collect();
        let mut interleaved = Vec::with_capacity(values.len() * 2);
        for value in &values {
            interleaved.push(*value);
            interleaved.push(value.wrapping_neg());
        }
        let frames = values.len();

        let mut planar = vec![vec![0.0f32; frames]; 2];
        deinterleave(&interleaved, &mut planar, frames).unwrap();

        for delta in [0.0f32, 0.499 / 32768.0, -0.499 / 32768.0] {
            let perturbed: Vec<Vec<f32>> = planar
                .iter()
                .map(|c| c.iter().map(|s| s + delta).collect())
                .collect();
            let mut output = vec![0i16; frames * 2];
            interleave(&perturbed, &mut output, frames).unwrap();

            assert_eq!(output, interleaved, "perturbation {delta}");
        }
    }

    #[test]
    fn test_stereo_matches_scalar_on_boundaries() {
        let input: Vec<i16> = BOUNDARY
            .iter()
            .flat_map(|a| BOUNDARY.iter().map(move |b| [*a, *b]))
            .flatten()
            .collect();
        let frames = input.len() / 2;

        let mut fast = vec![vec![0.0f32; frames]; 2];
        let mut reference = vec![vec![0.0f32; frames]; 2];
        deinterleave(&input, &mut fast, frames).unwrap();
        deinterleave_scalar(&input, &mut reference, frames);
        for (a, b) in fast.iter().flatten().zip(reference.iter().flatten()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }

        let mut fast_out = vec![0i16; input.len()];
        let mut reference_out = vec![0i16; input.len()];
        interleave(&fast, &mut fast_out, frames).unwrap();
        interleave_scalar(&reference, &mut reference_out, frames);
        assert_eq!(fast_out, reference_out);
        assert_eq!(fast_out, input);
    }

    #[test]
    fn test_stereo_interleave_matches_scalar_off_grid() {
        // Values that do not come from an int16, including saturation, ties
        // and NaN, still have to agree with the scalar path.
        let specials = [
            0.0f32,
            -0.0,
            0.5 / 32768.0,
            -0.5 / 32768.0,
            1.5 / 32768.0,
            -1.5 / 32768.0,
            0.999_999,
            -0.999_999,
            1.0,
            -1.0,
            1.7,
            -3.2,
            1.0e-40,
            -1.0e-40,
            f32::INFINITY,
            f32::NEG_INFINITY,
            f32::NAN,
            0.123_456,
            -0.654_321,
        ];
        let left: Vec<f32> = specials.to_vec();
        let right: Vec<f32> = specials.iter().rev().copied().collect();
        let frames = left.len();
        let inputs = [left, right];

        let mut fast = vec![0i16; frames * 2];
        let mut reference = vec![0i16; frames * 2];
        interleave(&inputs, &mut fast, frames).unwrap();
        interleave_scalar(&inputs, &mut reference, frames);

        assert_eq!(fast, reference);
    }

    #[test]
    fn test_zero_frames_is_noop() {
        let mut outputs: [&mut [f32]; 0] = [];
        deinterleave(&[], &mut outputs, 0).unwrap();

        let mut empty: Vec<Vec<f32>> = vec![Vec::new(), Vec::new()];
        deinterleave(&[], &mut empty, 0).unwrap();
        assert!(empty.iter().all(|c| c.is_empty()));

        let inputs: [&[f32]; 2] = [&[], &[]];
        let mut output: [i16; 0] = [];
        interleave(&inputs, &mut output, 0).unwrap();
    }

    #[test]
    fn test_odd_frame_counts_use_tail_path() {
        for frames in 1..=9 {
            let input: Vec<i16> = (0..frames as i16 * 2).map(|v| v * 1000 - 7000).collect();
            let mut planar = vec![vec![0.0f32; frames]; 2];
            deinterleave(&input, &mut planar, frames).unwrap();

            let mut output = vec![0i16; frames * 2];
            interleave(&planar, &mut output, frames).unwrap();
            assert_eq!(output, input, "frames {frames}");
        }
    }

    #[test]
    fn test_short_buffers_are_rejected() {
        let mut outputs = vec![vec![0.0f32; 4]; 2];
        assert_eq!(
            deinterleave(&[0i16; 6], &mut outputs, 4),
            Err(FormatError::InputTooShort {
                needed: 8,
                actual: 6
            })
        );

        let mut short = vec![vec![0.0f32; 4], vec![0.0f32; 3]];
        assert_eq!(
            deinterleave(&[0i16; 8], &mut short, 4),
            Err(FormatError::OutputTooShort {
                needed: 4,
                actual: 3
            })
        );

        let inputs = vec![vec![0.0f32; 4]; 2];
        let mut output = [0i16; 7];
        assert_eq!(
            interleave(&inputs, &mut output, 4),
            Err(FormatError::OutputTooShort {
                needed: 8,
                actual: 7
            })
        );
    }

    #[test]
    fn test_ten_channel_round_trip() {
        let channels = 10;
        let frames = 7;
        let input: Vec<i16> = (0..channels * frames)
            .map(|i| (i as i32 * 937 - 32_768) as i16)
            .collect();
        let mut planar = vec![vec![0.0f32; frames]; channels];
        let mut output = vec![0i16; channels * frames];

        deinterleave(&input, &mut planar, frames).unwrap();
        for (ch, samples) in planar.iter().enumerate() {
            assert_eq!(samples[3], s16_to_f32(input[3 * channels + ch]));
        }

        interleave(&planar, &mut output, frames).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_input_is_not_modified() {
        let input = vec![100i16, -100, 200, -200];
        let copy = input.clone();
        let mut outputs = vec![vec![0.0f32; 2]; 2];

        deinterleave(&input, &mut outputs, 2).unwrap();

        assert_eq!(input, copy);
    }
}
