//! Low-frequency oscillator for modulation effects, plus test-tone generators.

use std::f64::consts::PI;

use crate::buffer::SampleBuffer;
use crate::error::Result;

/// A phase-accumulating sine LFO.
///
/// The phase is measured in cycles, advances by `rate / sample_rate` per
/// sample, and wraps into `[0, 1)`. It is the only state, so carrying the
/// struct across blocks keeps modulation continuous.
#[derive(Debug, Clone)]
pub struct Lfo {
    rate: f64,
    phase: f64,
    sample_rate: f64,
}

impl Lfo {
    pub fn new(rate: f64, sample_rate: f64) -> Self {
        Lfo {
            rate,
            phase: 0.0,
            sample_rate,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Change the rate without disturbing the phase.
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Phase increment per sample.
    fn phase_inc(&self) -> f64 {
        self.rate / self.sample_rate
    }

    /// Current value in `[-1, 1]`, then advance one sample.
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        let value = (2.0 * PI * self.phase).sin();

        self.phase += self.phase_inc();
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        value
    }

    /// Return to phase zero.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// Open-string frequencies of a guitar in standard tuning, low E to high E.
pub const OPEN_STRINGS_HZ: [f64; 6] = [82.41, 123.47, 164.81, 207.65, 246.94, 329.64];

/// Per-string amplitude of [`open_strings`], 2500 on the 16-bit PCM scale.
pub const OPEN_STRING_AMPLITUDE: f64 = 2500.0 / 32768.0;

/// A pure sine tone.
pub fn sine_tone(
    frequency: f64,
    amplitude: f64,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<SampleBuffer> {
    let sr = sample_rate as f64;
    let len = (duration_secs * sr).round().max(0.0) as usize;
    let samples = (0..len)
        .map(|i| (amplitude * (2.0 * PI * frequency * i as f64 / sr).sin()) as f32)
        .collect();
    SampleBuffer::from_samples(samples, sample_rate)
}

/// All six open strings sounding together as cosines, a handy stand-in for
/// a strummed recording.
pub fn open_strings(duration_secs: f64, sample_rate: u32) -> Result<SampleBuffer> {
    let sr = sample_rate as f64;
    let len = (duration_secs * sr).round().max(0.0) as usize;
    let samples = (0..len)
        .map(|i| {
            let t = i as f64 / sr;
            OPEN_STRINGS_HZ
                .iter()
                .map(|f| OPEN_STRING_AMPLITUDE * (2.0 * PI * f * t).cos())
                .sum::<f64>() as f32
        })
        .collect();
    SampleBuffer::from_samples(samples, sample_rate)
}
