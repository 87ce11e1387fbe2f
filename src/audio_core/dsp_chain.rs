//! Processing stages that run on deinterleaved float buffers.
//!
//! Every [`DspModule`] works in place on one `&mut [f32]` per channel and
//! must accept `frames == 0`, including with empty slices, as a no-op.
//!
//! The crossovers split a buffer into bands held in separate caller buffers,
//! the layout a multi-band compressor consumes:
//!
//! ```text
//! INPUT --+-- lp0 --+-- lp1 --+---> LOW  (data0)
//!         |         |         |
//!         |         \-- hp1 --/
//!         |
//!         \-- hp0 --+-- lp2 ------> MID  (data1)
//!                   |
//!                   \-- hp2 ------> HIGH (data2)
//!
//!            [f0]       [f1]
//! ```

use crate::audio_core::biquad::{BUTTERWORTH_Q, Biquad, BiquadType, normalized_freq};
use crate::audio_core::constants::MAX_BIQUADS_PER_EQ;
use crate::audio_core::errors::DspError;

/// Scratch size of [`MultibandGain`]; longer calls are processed in pieces.
const MULTIBAND_BLOCK_FRAMES: usize = 256;

/// An in-place processing stage of the DSP chain.
pub trait DspModule: Send {
    /// Number of channels this module was built for.
    fn channels(&self) -> usize;

    /// Processes the first `frames` samples of every channel in place.
    fn process(&mut self, channels: &mut [&mut [f32]], frames: usize);

    /// Clears all filter state.
    fn reset(&mut self);
}

/// Per-channel cascade of up to [`MAX_BIQUADS_PER_EQ`] biquads.
#[derive(Debug, Clone)]
pub struct Eq {
    fs_hz: f32,
    biquads: Vec<Vec<Biquad>>,
}

impl Eq {
    pub fn new(channels: usize, fs_hz: f32) -> Self {
        Self {
            fs_hz,
            biquads: vec![Vec::new(); channels],
        }
    }

    /// Designs a section at `freq_hz` and appends it to `channel`.
    pub fn append_biquad(
        &mut self,
        channel: usize,
        kind: BiquadType,
        freq_hz: f32,
        q: f32,
        gain_db: f32,
    ) -> Result<(), DspError> {
        let biquad = Biquad::new_set(
            kind,
            normalized_freq(self.fs_hz, freq_hz),
            q as f64,
            gain_db as f64,
        );
        self.append_biquad_direct(channel, biquad)
    }

    /// Appends a ready-made section to `channel`.
    pub fn append_biquad_direct(&mut self, channel: usize, biquad: Biquad) -> Result<(), DspError> {
        let channels = self.biquads.len();
        let biquads = self
            .biquads
            .get_mut(channel)
            .ok_or(DspError::NoSuchChannel { channel, channels })?;
        if biquads.len() >= MAX_BIQUADS_PER_EQ {
            return Err(DspError::TooManyBiquads {
                max: MAX_BIQUADS_PER_EQ,
            });
        }
        biquads.push(biquad);
        Ok(())
    }

    /// Number of sections on `channel`.
    pub fn len(&self, channel: usize) -> usize {
        self.biquads.get(channel).map_or(0, Vec::len)
    }
}

impl DspModule for Eq {
    fn channels(&self) -> usize {
        self.biquads.len()
    }

    fn process(&mut self, channels: &mut [&mut [f32]], frames: usize) {
        if frames == 0 {
            return;
        }

        for (data, biquads) in channels.iter_mut().zip(self.biquads.iter_mut()) {
            let data = &mut data[..frames];
            for biquad in biquads.iter_mut() {
                biquad.process(data);
            }
        }
    }

    fn reset(&mut self) {
        for biquad in self.biquads.iter_mut().flatten() {
            biquad.reset();
        }
    }
}

/// Linkwitz-Riley fourth-order filter: two identical Butterworth sections
/// in series.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lr4 {
    stages: [Biquad; 2],
}

impl Lr4 {
    /// `freq` is normalized to Nyquist.
    pub fn new(kind: BiquadType, freq: f64) -> Self {
        let biquad = Biquad::new_set(kind, freq, BUTTERWORTH_Q, 0.0);
        Self {
            stages: [biquad; 2],
        }
    }

    #[inline]
    fn process_sample(&mut self, x: f32) -> f32 {
        let y = self.stages[0].process_sample(x);
        self.stages[1].process_sample(y)
    }

    /// Low band of `data0` back into `data0`, high band into `data1`.
    pub fn split(lp: &mut Lr4, hp: &mut Lr4, data0: &mut [f32], data1: &mut [f32]) {
        for (low, high) in data0.iter_mut().zip(data1.iter_mut()) {
            let x = *low;
            *low = lp.process_sample(x);
            *high = hp.process_sample(x);
        }
    }

    /// Splits `data` and sums the bands back in place. The result has the
    /// magnitude of the input and the phase of the split.
    pub fn merge(lp: &mut Lr4, hp: &mut Lr4, data: &mut [f32]) {
        for x in data.iter_mut() {
            *x = lp.process_sample(*x) + hp.process_sample(*x);
        }
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}

/// Two-band crossover at one frequency.
#[derive(Debug, Clone, Copy)]
pub struct Crossover2 {
    lp: Lr4,
    hp: Lr4,
}

impl Crossover2 {
    /// `freq` is normalized to Nyquist.
    pub fn new(freq: f64) -> Self {
        Self {
            lp: Lr4::new(BiquadType::Lowpass, freq),
            hp: Lr4::new(BiquadType::Highpass, freq),
        }
    }

    /// Splits `data0` in place: low band in `data0`, high band in `data1`.
    pub fn process(&mut self, data0: &mut [f32], data1: &mut [f32]) {
        Lr4::split(&mut self.lp, &mut self.hp, data0, data1);
    }

    pub fn reset(&mut self) {
        self.lp.reset();
        self.hp.reset();
    }
}

/// Three-band crossover at `freq1 < freq2`.
#[derive(Debug, Clone, Copy)]
pub struct Crossover3 {
    lp: [Lr4; 3],
    hp: [Lr4; 3],
}

impl Crossover3 {
    /// Both frequencies are normalized to Nyquist.
    pub fn new(freq1: f64, freq2: f64) -> Self {
        let freqs = [freq1, freq2, freq2];
        Self {
            lp: freqs.map(|f| Lr4::new(BiquadType::Lowpass, f)),
            hp: freqs.map(|f| Lr4::new(BiquadType::Highpass, f)),
        }
    }

    /// Splits `data0` in place into low (`data0`), mid (`data1`) and high
    /// (`data2`) bands. The low band goes through an all-pass at `freq2` so
    /// all three bands share the same phase.
    pub fn process(&mut self, data0: &mut [f32], data1: &mut [f32], data2: &mut [f32]) {
        let [lp0, lp1, lp2] = &mut self.lp;
        let [hp0, hp1, hp2] = &mut self.hp;

        Lr4::split(lp0, hp0, data0, data1);
        Lr4::merge(lp1, hp1, data0);
        Lr4::split(lp2, hp2, data1, data2);
    }

    pub fn reset(&mut self) {
        for lr4 in self.lp.iter_mut().chain(self.hp.iter_mut()) {
            lr4.reset();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BandSplit {
    Two(Crossover2),
    Three(Crossover3),
}

impl BandSplit {
    fn reset(&mut self) {
        match self {
            BandSplit::Two(crossover) => crossover.reset(),
            BandSplit::Three(crossover) => crossover.reset(),
        }
    }
}

/// Crossover per channel with a static gain on each band, summed back into
/// the channel buffer.
pub struct MultibandGain {
    crossovers: Vec<BandSplit>,
    gains: [f32; 3],
    mid: Vec<f32>,
    high: Vec<f32>,
}

impl MultibandGain {
    /// Three bands split at `low_mid_hz` and `mid_high_hz`, all gains at 0 dB.
    pub fn new(channels: usize, fs_hz: f32, low_mid_hz: f32, mid_high_hz: f32) -> Self {
        let crossover = Crossover3::new(
            normalized_freq(fs_hz, low_mid_hz),
            normalized_freq(fs_hz, mid_high_hz),
        );
        Self::with_split(channels, BandSplit::Three(crossover))
    }

    /// Low and high bands split at `split_hz`, all gains at 0 dB. The mid
    /// gain is ignored.
    pub fn two_band(channels: usize, fs_hz: f32, split_hz: f32) -> Self {
        let crossover = Crossover2::new(normalized_freq(fs_hz, split_hz));
        Self::with_split(channels, BandSplit::Two(crossover))
    }

    fn with_split(channels: usize, split: BandSplit) -> Self {
        Self {
            crossovers: vec![split; channels],
            gains: [1.0; 3],
            mid: vec![0.0; MULTIBAND_BLOCK_FRAMES],
            high: vec![0.0; MULTIBAND_BLOCK_FRAMES],
        }
    }

    /// Number of bands per channel.
    pub fn bands(&self) -> usize {
        match self.crossovers.first() {
            Some(BandSplit::Two(_)) => 2,
            _ => 3,
        }
    }

    /// Sets the low, mid and high band gains. Non-finite values mean 0 dB.
    pub fn set_band_gains_db(&mut self, gains_db: [f32; 3]) {
        self.gains = gains_db.map(|db| {
            if db.is_finite() {
                10.0_f32.powf(db / 20.0)
            } else {
                1.0
            }
        });
    }

    pub fn band_gains(&self) -> [f32; 3] {
        self.gains
    }
}

impl DspModule for MultibandGain {
    fn channels(&self) -> usize {
        self.crossovers.len()
    }

    fn process(&mut self, channels: &mut [&mut [f32]], frames: usize) {
        if frames == 0 {
            return;
        }

        let [low_gain, mid_gain, high_gain] = self.gains;
        for (data, crossover) in channels.iter_mut().zip(self.crossovers.iter_mut()) {
            for low in data[..frames].chunks_mut(MULTIBAND_BLOCK_FRAMES) {
                let mid = &mut self.mid[..low.len()];
                let high = &mut self.high[..low.len()];
                match crossover {
                    BandSplit::Two(crossover) => {
                        crossover.process(low, high);
                        for (l, h) in low.iter_mut().zip(high.iter()) {
                            *l = *l * low_gain + *h * high_gain;
                        }
                    }
                    BandSplit::Three(crossover) => {
                        crossover.process(low, mid, high);
                        for ((l, m), h) in low.iter_mut().zip(mid.iter()).zip(high.iter()) {
                            *l = *l * low_gain + *m * mid_gain + *h * high_gain;
                        }
                    }
                }
            }
        }
    }

    fn reset(&mut self) {
        for crossover in self.crossovers.iter_mut() {
            crossover.reset();
        }
    }
}
