//! Cabinet simulation by FIR convolution with an impulse response.
//!
//! Convolution runs in the time domain: each output sample costs one
//! multiply-add per impulse-response tap, so a block costs
//! `ir.len() * block.len()`. The last `ir.len() - 1` inputs are kept between
//! blocks so that the tail of one block's response carries into the next.

use std::sync::Arc;

use log::debug;

use super::effect::{Effect, EffectKind, ParamSpec, find_spec, validate};
use super::window::{blend, hamming, sinc};
use crate::error::{Result, RigError};

/// Default speaker roll-off for [`ImpulseResponse::cabinet`].
pub const DEFAULT_CABINET_CUTOFF_HZ: f64 = 5000.0;
/// Default length of the generated cabinet response.
pub const DEFAULT_CABINET_TAPS: usize = 129;

/// An immutable impulse response. Cloning shares the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpulseResponse {
    taps: Arc<[f32]>,
}

impl ImpulseResponse {
    /// A single unit sample; convolving with it changes nothing.
    pub fn unit() -> Self {
        ImpulseResponse {
            taps: Arc::from(vec![1.0f32]),
        }
    }

    pub fn from_samples(samples: Vec<f32>) -> Result<Self> {
        if samples.is_empty() {
            return Err(RigError::EmptyImpulseResponse);
        }
        Ok(ImpulseResponse {
            taps: Arc::from(samples),
        })
    }

    /// A moving-average kernel of `len` taps, each `1 / len`.
    pub fn boxcar(len: usize) -> Result<Self> {
        let tap = 1.0 / len.max(1) as f32;
        Self::from_samples(vec![tap; len])
    }

    /// A Hamming-windowed sinc low-pass with unity DC gain, a rough stand-in
    /// for a guitar speaker's top-end roll-off.
    pub fn cabinet(sample_rate: u32, cutoff_hz: f64, taps: usize) -> Result<Self> {
        if taps == 0 {
            return Err(RigError::EmptyImpulseResponse);
        }
        let sr = sample_rate as f64;
        let fc = (cutoff_hz / sr).clamp(1e-4, 0.45);
        let center = (taps - 1) as f64 / 2.0;
        let window = hamming(taps);
        let raw: Vec<f64> = window
            .iter()
            .enumerate()
            .map(|(n, w)| 2.0 * fc * sinc(2.0 * fc * (n as f64 - center)) * w)
            .collect();
        let dc: f64 = raw.iter().sum();
        let norm = if dc.abs() > 1e-12 { 1.0 / dc } else { 1.0 };
        Self::from_samples(raw.iter().map(|&h| (h * norm) as f32).collect())
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.taps
    }
}

pub(crate) const CABINET_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("mix", 0.0, 1.0, 1.0, ""),
    ParamSpec::new("level", 0.0, 2.0, 1.0, ""),
];

/// Convolves the signal with an impulse response.
#[derive(Debug, Clone)]
pub struct Cabinet {
    sample_rate: u32,
    ir: ImpulseResponse,
    /// Ring of the last `ir.len()` inputs; `pos` holds the newest.
    history: Vec<f32>,
    pos: usize,
    mix: f64,
    level: f64,
}

impl Cabinet {
    /// A cabinet loaded with the default generated speaker response.
    pub fn new(sample_rate: u32) -> Self {
        let ir = ImpulseResponse::cabinet(sample_rate, DEFAULT_CABINET_CUTOFF_HZ, DEFAULT_CABINET_TAPS)
            .unwrap_or_else(|_| ImpulseResponse::unit());
        Self::with_impulse_response(sample_rate, ir)
    }

    pub fn with_impulse_response(sample_rate: u32, ir: ImpulseResponse) -> Self {
        let len = ir.len();
        Cabinet {
            sample_rate,
            ir,
            history: vec![0.0; len],
            pos: 0,
            mix: CABINET_PARAMS[0].default,
            level: CABINET_PARAMS[1].default,
        }
    }

    pub fn impulse_response(&self) -> &ImpulseResponse {
        &self.ir
    }

    /// Replace the impulse response. The old history belongs to a different
    /// system, so this also resets the effect.
    pub fn load_impulse_response(&mut self, ir: ImpulseResponse) {
        debug!("cabinet: loading {}-tap impulse response", ir.len());
        self.history = vec![0.0; ir.len()];
        self.pos = 0;
        self.ir = ir;
    }

    #[inline]
    fn convolve(&mut self, input: f32) -> f32 {
        let len = self.history.len();
        self.pos += 1;
        if self.pos == len {
            self.pos = 0;
        }
        self.history[self.pos] = input;

        // taps[k] pairs with the input k samples ago: history[pos - k], then
        // wrapping to the end of the ring.
        let taps = self.ir.samples();
        let (recent, older) = self.history.split_at(self.pos + 1);
        let (taps_recent, taps_older) = taps.split_at(self.pos + 1);
        let mut acc = 0.0f32;
        for (h, x) in taps_recent.iter().zip(recent.iter().rev()) {
            acc += h * x;
        }
        for (h, x) in taps_older.iter().zip(older.iter().rev()) {
            acc += h * x;
        }
        acc
    }
}

impl Effect for Cabinet {
    fn kind(&self) -> EffectKind {
        EffectKind::Cabinet
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        CABINET_PARAMS
    }

    fn parameter(&self, name: &str) -> Result<f64> {
        let spec = find_spec(EffectKind::Cabinet, CABINET_PARAMS, name)?;
        Ok(match spec.name {
            "mix" => self.mix,
            _ => self.level,
        })
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let spec = validate(EffectKind::Cabinet, CABINET_PARAMS, name, value)?;
        match spec.name {
            "mix" => self.mix = value,
            _ => self.level = value,
        }
        Ok(())
    }

    fn process_block(&mut self, block: &mut [f32]) {
        let mix = self.mix as f32;
        let level = self.level as f32;
        for sample in block.iter_mut() {
            let wet = self.convolve(*sample);
            *sample = blend(*sample, wet, mix) * level;
        }
    }

    fn reset(&mut self) {
        self.history.fill(0.0);
        self.pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::effect::test_support::{SPLITS, test_signal, whole_and_split};
    use assert_approx_eq::assert_approx_eq;

    /// Straightforward full convolution truncated to the input length.
    fn reference(input: &[f32], ir: &[f32]) -> Vec<f32> {
        (0..input.len())
            .map(|n| {
                let mut acc = 0.0f32;
                for (k, h) in ir.iter().enumerate() {
                    if k <= n {
                        acc += h * input[n - k];
                    }
                }
                acc
            })
            .collect()
    }

    #[test]
    fn unit_impulse_is_identity() {
        let mut cab = Cabinet::with_impulse_response(44100, ImpulseResponse::unit());
        let input = test_signal(5000, 44100);
        assert_eq!(cab.process(&input), input);
    }

    #[test]
    fn matches_direct_convolution() {
        let ir = ImpulseResponse::from_samples(vec![0.5, -0.25, 0.125, 0.0, 0.3]).unwrap();
        let mut cab = Cabinet::with_impulse_response(8000, ir.clone());
        let input = test_signal(300, 8000);
        let out = cab.process(&input);
        let expected = reference(&input, ir.samples());
        for (a, b) in out.iter().zip(&expected) {
            assert_approx_eq!(a, b, 1e-6);
        }
    }

    #[test]
    fn tail_carries_into_next_block() {
        let ir = ImpulseResponse::from_samples(vec![1.0, 0.5, 0.25]).unwrap();
        let mut cab = Cabinet::with_impulse_response(1000, ir);
        assert_eq!(cab.process(&[1.0]), vec![1.0]);
        assert_eq!(cab.process(&[0.0, 0.0, 0.0]), vec![0.5, 0.25, 0.0]);
    }

    #[test]
    fn block_size_invariance_is_exact() {
        let ir = ImpulseResponse::cabinet(44100, 4000.0, 257).unwrap();
        let mut cab = Cabinet::with_impulse_response(44100, ir);
        let input = test_signal(6000, 44100);
        let (whole, chunked) = whole_and_split(&mut cab, &input, &SPLITS);
        assert_eq!(whole, chunked);
    }

    #[test]
    fn load_resets_history() {
        let mut cab = Cabinet::with_impulse_response(1000, ImpulseResponse::boxcar(4).unwrap());
        cab.process(&[1.0, 1.0, 1.0]);
        cab.load_impulse_response(ImpulseResponse::from_samples(vec![0.0, 1.0]).unwrap());
        assert_eq!(cab.process(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn reset_matches_fresh() {
        let input = test_signal(2000, 44100);
        let mut used = Cabinet::new(44100);
        used.process(&input);
        used.reset();
        let a = used.process(&input[..500]);
        let b = Cabinet::new(44100).process(&input[..500]);
        assert_eq!(a, b);
    }

    #[test]
    fn generated_cabinet_passes_lows_and_cuts_highs() {
        let ir = ImpulseResponse::cabinet(44100, 3000.0, 129).unwrap();
        assert_eq!(ir.len(), 129);
        let sum: f32 = ir.samples().iter().sum();
        assert_approx_eq!(sum, 1.0, 1e-4);

        let mut cab = Cabinet::with_impulse_response(44100, ir);
        let high: Vec<f32> = (0..4000)
            .map(|i| (2.0 * std::f64::consts::PI * 12000.0 * i as f64 / 44100.0).sin() as f32)
            .collect();
        let out = cab.process(&high);
        let peak = out[500..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!(peak < 0.05, "12 kHz should be strongly attenuated, got {peak}");
    }

    #[test]
    fn boxcar_averages() {
        let ir = ImpulseResponse::boxcar(4).unwrap();
        assert_eq!(ir.samples(), &[0.25; 4]);
        let mut cab = Cabinet::with_impulse_response(1000, ir);
        let out = cab.process(&[1.0; 6]);
        assert_eq!(out, vec![0.25, 0.5, 0.75, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_impulse_rejected() {
        assert_eq!(
            ImpulseResponse::from_samples(Vec::new()),
            Err(RigError::EmptyImpulseResponse)
        );
        assert!(ImpulseResponse::cabinet(44100, 1000.0, 0).is_err());
    }

    #[test]
    fn mix_and_level() {
        let mut cab = Cabinet::with_impulse_response(1000, ImpulseResponse::from_samples(vec![0.0, 1.0]).unwrap());
        cab.set_parameter("mix", 0.5).unwrap();
        cab.set_parameter("level", 2.0).unwrap();
        assert_eq!(cab.process(&[1.0, 0.0]), vec![1.0, 1.0]);
        assert!(cab.set_parameter("level", 2.5).is_err());
        assert_eq!(cab.parameter("level").unwrap(), 2.0);
    }
}
