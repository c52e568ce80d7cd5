//! Delay line and the echo effect built on it.

use log::debug;

use super::effect::{Effect, EffectKind, ParamSpec, find_spec, validate};
use super::window::blend;
use crate::error::Result;

/// A circular buffer of past samples.
///
/// `read(0)` is the sample most recently pushed; `read(n)` is the one pushed
/// `n` samples before it. Reads longer than the capacity allows are clamped.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// A delay line able to look back `max_delay` samples.
    pub fn new(max_delay: usize) -> Self {
        DelayLine {
            buffer: vec![0.0; max_delay + 1],
            write_pos: 0,
        }
    }

    /// Longest delay that can be read, in samples.
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        let idx = (self.write_pos + len - 1 - delay) % len;
        self.buffer[idx]
    }

    /// Read `delay` samples back with linear interpolation between the two
    /// neighbouring samples.
    #[inline]
    pub fn read_fractional(&self, delay: f64) -> f32 {
        let delay = delay.clamp(0.0, self.max_delay() as f64);
        let whole = delay.floor();
        let frac = (delay - whole) as f32;
        let d0 = whole as usize;
        let s0 = self.read(d0);
        if frac == 0.0 {
            return s0;
        }
        let s1 = self.read(d0 + 1);
        s0 + frac * (s1 - s0)
    }

    /// Zero the history.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

const MAX_ECHOES: usize = 8;
const MAX_ECHO_TIME: f64 = 1.0;

pub(crate) const ECHO_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("echoes", 0.0, MAX_ECHOES as f64, 3.0, ""),
    ParamSpec::new("time", 0.01, MAX_ECHO_TIME, 0.25, "s"),
    ParamSpec::new("mix", 0.0, 1.0, 1.0, ""),
];

/// Repeating echo without feedback.
///
/// Each output sample is `sum(exp(-j) * x[n - j * D])` for `j` in
/// `0..=echoes`, the input convolved with an exponentially decaying Dirac
/// comb and cut to the input length. The `j = 0` term is the dry signal, so
/// `mix` blends between the input and the whole comb.
#[derive(Debug, Clone)]
pub struct Echo {
    sample_rate: u32,
    line: DelayLine,
    taps: [f32; MAX_ECHOES + 1],
    echoes: usize,
    time: f64,
    spacing: usize,
    mix: f64,
}

impl Echo {
    pub fn new(sample_rate: u32) -> Self {
        let max_spacing = (MAX_ECHO_TIME * sample_rate as f64).floor() as usize;
        let mut taps = [0.0; MAX_ECHOES + 1];
        for (j, tap) in taps.iter_mut().enumerate() {
            *tap = (-(j as f64)).exp() as f32;
        }
        let mut echo = Echo {
            sample_rate,
            line: DelayLine::new(max_spacing * MAX_ECHOES),
            taps,
            echoes: ECHO_PARAMS[0].default as usize,
            time: ECHO_PARAMS[1].default,
            spacing: 1,
            mix: ECHO_PARAMS[2].default,
        };
        echo.update_spacing();
        echo
    }

    /// Create an echo with specific parameters.
    pub fn with_params(sample_rate: u32, echoes: usize, time: f64, mix: f64) -> Result<Self> {
        let mut e = Self::new(sample_rate);
        e.set_parameter("echoes", echoes as f64)?;
        e.set_parameter("time", time)?;
        e.set_parameter("mix", mix)?;
        Ok(e)
    }

    /// Distance between echoes in samples.
    pub fn spacing(&self) -> usize {
        self.spacing
    }

    fn update_spacing(&mut self) {
        self.spacing = ((self.time * self.sample_rate as f64).floor() as usize).max(1);
    }
}

impl Effect for Echo {
    fn kind(&self) -> EffectKind {
        EffectKind::Echo
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        ECHO_PARAMS
    }

    fn parameter(&self, name: &str) -> Result<f64> {
        let spec = find_spec(EffectKind::Echo, ECHO_PARAMS, name)?;
        Ok(match spec.name {
            "echoes" => self.echoes as f64,
            "time" => self.time,
            _ => self.mix,
        })
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let spec = validate(EffectKind::Echo, ECHO_PARAMS, name, value)?;
        match spec.name {
            "echoes" => self.echoes = value.round() as usize,
            "time" => {
                self.time = value;
                self.update_spacing();
                debug!("echo spacing now {} samples", self.spacing);
            }
            _ => self.mix = value,
        }
        Ok(())
    }

    fn process_block(&mut self, block: &mut [f32]) {
        let mix = self.mix as f32;
        for sample in block.iter_mut() {
            let dry = *sample;
            self.line.push(dry);
            let mut wet = 0.0f32;
            for (j, tap) in self.taps[..=self.echoes].iter().enumerate() {
                wet += tap * self.line.read(j * self.spacing);
            }
            *sample = blend(dry, wet, mix);
        }
    }

    fn reset(&mut self) {
        self.line.clear();
    }
}
