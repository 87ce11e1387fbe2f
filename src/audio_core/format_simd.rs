//! Vectorized stereo kernels for [`format_conv`](crate::audio_core::format_conv).
//!
//! Each entry point returns `false` when no vector unit is available, and the
//! caller falls back to the scalar path. When it returns `true` the whole
//! buffer has been converted: full 4-frame blocks by the vector kernel, the
//! remaining frames by the scalar per-sample conversion.

use crate::audio_core::format_conv::{f32_to_s16, s16_to_f32};

/// Whether the running CPU has a vector unit these kernels can use.
pub fn simd_available() -> bool {
    #[cfg(target_arch = "x86_64")]
    {
        std::arch::is_x86_feature_detected!("sse2")
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        false
    }
}

/// Deinterleaves stereo frames. `input` holds `2 * left.len()` samples.
pub fn deinterleave_stereo(input: &[i16], left: &mut [f32], right: &mut [f32]) -> bool {
    debug_assert_eq!(left.len(), right.len());
    debug_assert_eq!(input.len(), left.len() * 2);

    if !simd_available() {
        return false;
    }

    let done = vector_deinterleave(input, left, right);

    for (frame, samples) in input.chunks_exact(2).enumerate().skip(done) {
        left[frame] = s16_to_f32(samples[0]);
        right[frame] = s16_to_f32(samples[1]);
    }
    true
}

/// Interleaves stereo frames. `output` holds `2 * left.len()` samples.
pub fn interleave_stereo(left: &[f32], right: &[f32], output: &mut [i16]) -> bool {
    debug_assert_eq!(left.len(), right.len());
    debug_assert_eq!(output.len(), left.len() * 2);

    if !simd_available() {
        return false;
    }

    let done = vector_interleave(left, right, output);

    for (frame, samples) in output.chunks_exact_mut(2).enumerate().skip(done) {
        samples[0] = f32_to_s16(left[frame]);
        samples[1] = f32_to_s16(right[frame]);
    }
    true
}

#[cfg(target_arch = "x86_64")]
fn vector_deinterleave(input: &[i16], left: &mut [f32], right: &mut [f32]) -> usize {
    // SAFETY: only reached after `simd_available` confirmed SSE2, and the
    // debug-asserted shapes are upheld by `format_conv`.
    unsafe { sse2::deinterleave_stereo(input, left, right) }
}

#[cfg(target_arch = "x86_64")]
fn vector_interleave(left: &[f32], right: &[f32], output: &mut [i16]) -> usize {
    // SAFETY: as above.
    unsafe { sse2::interleave_stereo(left, right, output) }
}

#[cfg(not(target_arch = "x86_64"))]
fn vector_deinterleave(_input: &[i16], _left: &mut [f32], _right: &mut [f32]) -> usize {
    0
}

#[cfg(not(target_arch = "x86_64"))]
fn vector_interleave(_left: &[f32], _right: &[f32], _output: &mut [i16]) -> usize {
    0
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use std::arch::x86_64::{
        __m128, __m128i, _mm_add_ps, _mm_and_ps, _mm_andnot_ps, _mm_cmpge_ps, _mm_cmpord_ps,
        _mm_cvtepi32_ps, _mm_cvttps_epi32, _mm_loadu_ps, _mm_loadu_si128, _mm_max_ps, _mm_min_ps,
        _mm_mul_ps, _mm_or_ps, _mm_packs_epi32, _mm_set1_ps, _mm_setzero_ps, _mm_shuffle_ps,
        _mm_srai_epi32, _mm_storeu_ps, _mm_storeu_si128, _mm_unpackhi_epi16, _mm_unpackhi_ps,
        _mm_unpacklo_epi16, _mm_unpacklo_ps,
    };

    const FRAMES_PER_BLOCK: usize = 4;

    // Multiplying by an exact power of two gives the same bits as dividing.
    const INV_FULL_SCALE: f32 = 1.0 / 32768.0;

    // _MM_SHUFFLE(2, 0, 2, 0) and _MM_SHUFFLE(3, 1, 3, 1).
    const EVEN_LANES: i32 = 0b10_00_10_00;
    const ODD_LANES: i32 = 0b11_01_11_01;

    /// Converts whole 4-frame blocks and returns the number of frames done.
    ///
    /// # Safety
    ///
    /// SSE2 must be available; `input.len() >= 2 * left.len()` and
    /// `right.len() >= left.len()`.
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn deinterleave_stereo(
        input: &[i16],
        left: &mut [f32],
        right: &mut [f32],
    ) -> usize {
        let blocks = left.len() / FRAMES_PER_BLOCK;

        unsafe {
            let scale = _mm_set1_ps(INV_FULL_SCALE);
            for block in 0..blocks {
                let frame = block * FRAMES_PER_BLOCK;
                let raw = _mm_loadu_si128(input.as_ptr().add(frame * 2) as *const __m128i);

                // Sign-extend each i16 into an i32 lane.
                let first = _mm_srai_epi32::<16>(_mm_unpacklo_epi16(raw, raw));
                let second = _mm_srai_epi32::<16>(_mm_unpackhi_epi16(raw, raw));

                // [l0 r0 l1 r1] and [l2 r2 l3 r3]
                let first = _mm_mul_ps(_mm_cvtepi32_ps(first), scale);
                let second = _mm_mul_ps(_mm_cvtepi32_ps(second), scale);

                let l = _mm_shuffle_ps::<EVEN_LANES>(first, second);
                let r = _mm_shuffle_ps::<ODD_LANES>(first, second);
                _mm_storeu_ps(left.as_mut_ptr().add(frame), l);
                _mm_storeu_ps(right.as_mut_ptr().add(frame), r);
            }
        }

        blocks * FRAMES_PER_BLOCK
    }

    /// Converts whole 4-frame blocks and returns the number of frames done.
    ///
    /// # Safety
    ///
    /// SSE2 must be available; `output.len() >= 2 * left.len()` and
    /// `right.len() >= left.len()`.
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn interleave_stereo(
        left: &[f32],
        right: &[f32],
        output: &mut [i16],
    ) -> usize {
        let blocks = left.len() / FRAMES_PER_BLOCK;

        unsafe {
            for block in 0..blocks {
                let frame = block * FRAMES_PER_BLOCK;
                let l = _mm_loadu_ps(left.as_ptr().add(frame));
                let r = _mm_loadu_ps(right.as_ptr().add(frame));

                let first = round_to_s32(_mm_unpacklo_ps(l, r));
                let second = round_to_s32(_mm_unpackhi_ps(l, r));

                // Lanes are already within i16 range; the saturating pack is exact.
                _mm_storeu_si128(
                    output.as_mut_ptr().add(frame * 2) as *mut __m128i,
                    _mm_packs_epi32(first, second),
                );
            }
        }

        blocks * FRAMES_PER_BLOCK
    }

    /// Lane-wise `f32_to_s16` before narrowing.
    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn round_to_s32(samples: __m128) -> __m128i {
        unsafe {
            // NaN lanes become 0.
            let samples = _mm_and_ps(samples, _mm_cmpord_ps(samples, samples));
            let scaled = _mm_mul_ps(samples, _mm_set1_ps(32768.0));

            let non_negative = _mm_cmpge_ps(scaled, _mm_setzero_ps());
            let bias = _mm_or_ps(
                _mm_and_ps(non_negative, _mm_set1_ps(0.5)),
                _mm_andnot_ps(non_negative, _mm_set1_ps(-0.5)),
            );
            let biased = _mm_add_ps(scaled, bias);

            let clamped = _mm_max_ps(
                _mm_min_ps(biased, _mm_set1_ps(32767.0)),
                _mm_set1_ps(-32768.0),
            );
            _mm_cvttps_epi32(clamped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_core::format_conv::{deinterleave_scalar, interleave_scalar};

    // Small xorshift so the sweep is reproducible without extra crates.
    fn next(state: &mut u32) -> u32 {
        *state ^= *state << 13;
        *state ^= *state >> 17;
        *state ^= *state << 5;
        *state
    }

    #[test]
    fn test_deinterleave_matches_scalar_full_range() {
        if !simd_available() {
            return;
        }

        let input: Vec<i16> = (i16::MIN..=i16::MAX).collect();
        let frames = input.len() / 2;

        let mut left = vec![0.0f32; frames];
        let mut right = vec![0.0f32; frames];
        assert!(deinterleave_stereo(&input, &mut left, &mut right));

        let mut reference = vec![vec![0.0f32; frames]; 2];
        deinterleave_scalar(&input, &mut reference, frames);

        for frame in 0..frames {
            assert_eq!(left[frame].to_bits(), reference[0][frame].to_bits());
            assert_eq!(right[frame].to_bits(), reference[1][frame].to_bits());
        }
    }

    #[test]
    fn test_interleave_matches_scalar_random() {
        if !simd_available() {
            return;
        }

        let mut state = 0x2545_f491;
        let frames = 4099;
        let mut left = Vec::with_capacity(frames);
        let mut right = Vec::with_capacity(frames);
        for _ in 0..frames {
            // Covers [-2, 2) so saturation is exercised as well.
            left.push(next(&mut state) as f32 / u32::MAX as f32 * 4.0 - 2.0);
            right.push(f32::from_bits(next(&mut state) & 0xbfff_ffff));
        }

        let mut fast = vec![0i16; frames * 2];
        assert!(interleave_stereo(&left, &right, &mut fast));

        let mut reference = vec![0i16; frames * 2];
        interleave_scalar(&[&left, &right], &mut reference, frames);

        assert_eq!(fast, reference);
    }

    #[test]
    fn test_empty_buffers() {
        let mut left: [f32; 0] = [];
        let mut right: [f32; 0] = [];
        deinterleave_stereo(&[], &mut left, &mut right);

        let mut output: [i16; 0] = [];
        interleave_stereo(&left, &right, &mut output);
    }
}
