//! Modulation effects — chorus, flanger, and tremolo.
//!
//! Chorus and flanger read a delay line at a position swept by a sine LFO,
//! which produces small pitch wobbles that thicken the sound. Tremolo uses
//! the same LFO to sweep the amplitude instead.

use super::delay::DelayLine;
use super::effect::{Effect, EffectKind, ParamSpec, find_spec, validate};
use super::oscillator::Lfo;
use super::window::blend;
use crate::error::Result;

pub(crate) const MODULATION_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("rate", 0.1, 10.0, 1.5, "Hz"),
    ParamSpec::new("depth", 0.0, 1.0, 0.5, ""),
    ParamSpec::new("mix", 0.0, 1.0, 0.5, ""),
];

/// Which modulation the effect applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModulationMode {
    Chorus,
    Flanger,
    Tremolo,
}

impl ModulationMode {
    /// Centre delay and maximum excursion in seconds. Tremolo has no delay.
    fn delay_times(self) -> (f64, f64) {
        match self {
            ModulationMode::Chorus => (0.015, 0.005),
            ModulationMode::Flanger => (0.003, 0.002),
            ModulationMode::Tremolo => (0.0, 0.0),
        }
    }

    fn kind(self) -> EffectKind {
        match self {
            ModulationMode::Chorus => EffectKind::Chorus,
            ModulationMode::Flanger => EffectKind::Flanger,
            ModulationMode::Tremolo => EffectKind::Tremolo,
        }
    }
}

/// An LFO-driven modulation effect with rate, depth, and mix.
///
/// State carried between blocks is the LFO phase and, for the delay-based
/// modes, the delay line contents.
#[derive(Debug, Clone)]
pub struct Modulation {
    mode: ModulationMode,
    sample_rate: u32,
    lfo: Lfo,
    line: DelayLine,
    base_delay: f64,
    excursion: f64,
    depth: f64,
    mix: f64,
}

impl Modulation {
    /// Create a modulation effect with default settings.
    pub fn new(mode: ModulationMode, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        let (base, excursion) = mode.delay_times();
        // Two samples of slack for the interpolation neighbour.
        let max_delay = ((base + excursion) * sr).ceil() as usize + 2;
        Modulation {
            mode,
            sample_rate,
            lfo: Lfo::new(MODULATION_PARAMS[0].default, sr),
            line: DelayLine::new(max_delay),
            base_delay: base * sr,
            excursion: excursion * sr,
            depth: MODULATION_PARAMS[1].default,
            mix: MODULATION_PARAMS[2].default,
        }
    }

    /// Create a modulation effect with specific parameters.
    pub fn with_params(
        mode: ModulationMode,
        sample_rate: u32,
        rate: f64,
        depth: f64,
        mix: f64,
    ) -> Result<Self> {
        let mut m = Self::new(mode, sample_rate);
        m.set_parameter("rate", rate)?;
        m.set_parameter("depth", depth)?;
        m.set_parameter("mix", mix)?;
        Ok(m)
    }

    pub fn mode(&self) -> ModulationMode {
        self.mode
    }

    /// Current LFO phase in cycles.
    pub fn phase(&self) -> f64 {
        self.lfo.phase()
    }

    #[inline]
    fn process_sample(&mut self, input: f32) -> f32 {
        let lfo = self.lfo.next_value();
        let wet = match self.mode {
            ModulationMode::Tremolo => {
                let gain = 1.0 - self.depth * 0.5 * (1.0 + lfo);
                input * gain as f32
            }
            ModulationMode::Chorus | ModulationMode::Flanger => {
                self.line.push(input);
                let delay = self.base_delay + self.depth * self.excursion * lfo;
                self.line.read_fractional(delay.max(1.0))
            }
        };
        blend(input, wet, self.mix as f32)
    }
}

impl Effect for Modulation {
    fn kind(&self) -> EffectKind {
        self.mode.kind()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        MODULATION_PARAMS
    }

    fn parameter(&self, name: &str) -> Result<f64> {
        let spec = find_spec(self.kind(), MODULATION_PARAMS, name)?;
        Ok(match spec.name {
            "rate" => self.lfo.rate(),
            "depth" => self.depth,
            _ => self.mix,
        })
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let spec = validate(self.kind(), MODULATION_PARAMS, name, value)?;
        match spec.name {
            "rate" => self.lfo.set_rate(value),
            "depth" => self.depth = value,
            _ => self.mix = value,
        }
        Ok(())
    }

    fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    fn reset(&mut self) {
        self.lfo.reset();
        self.line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::effect::test_support::{SPLITS, test_signal, whole_and_split};
    use assert_approx_eq::assert_approx_eq;

    const MODES: [ModulationMode; 3] = [
        ModulationMode::Chorus,
        ModulationMode::Flanger,
        ModulationMode::Tremolo,
    ];

    #[test]
    fn test_passthrough_when_dry() {
        for mode in MODES {
            let mut m = Modulation::with_params(mode, 44100, 2.0, 1.0, 0.0).unwrap();
            let input = test_signal(3000, 44100);
            assert_eq!(m.process(&input), input, "{mode:?}");
        }
    }

    #[test]
    fn test_chorus_wet_is_delayed() {
        let mut m = Modulation::with_params(ModulationMode::Chorus, 1000, 1.0, 0.0, 1.0).unwrap();
        // depth 0 -> fixed 15 sample delay
        let mut input = vec![0.0f32; 40];
        input[0] = 1.0;
        let out = m.process(&input);
        assert_eq!(out[15], 1.0);
        assert_eq!(out.iter().filter(|&&s| s != 0.0).count(), 1);
    }

    #[test]
    fn test_chorus_output_modulated() {
        let mut m = Modulation::with_params(ModulationMode::Chorus, 44100, 2.0, 1.0, 1.0).unwrap();
        let input: Vec<f32> = (0..8820)
            .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 44100.0).sin() as f32)
            .collect();
        let out = m.process(&input);
        let late = &out[2000..];
        let diff = late
            .iter()
            .zip(&input[2000 - 662..])
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        // a fixed 15 ms copy would match the input shifted by 662 samples
        assert!(diff > 0.01, "chorus should vary its delay, max diff {diff}");
        assert!(late.iter().all(|s| s.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn test_tremolo_gain_envelope() {
        let mut m = Modulation::with_params(ModulationMode::Tremolo, 1000, 1.0, 1.0, 1.0).unwrap();
        let out = m.process(&vec![1.0f32; 1000]);
        // phase 0 -> sin 0 -> gain 0.5; phase 0.25 -> gain 0; phase 0.75 -> gain 1
        assert_approx_eq!(out[0] as f64, 0.5, 1e-6);
        assert_approx_eq!(out[250] as f64, 0.0, 1e-6);
        assert_approx_eq!(out[750] as f64, 1.0, 1e-6);
        assert!(out.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_phase_persists_across_blocks() {
        let mut m = Modulation::with_params(ModulationMode::Tremolo, 1000, 2.0, 0.5, 1.0).unwrap();
        m.process(&vec![0.0f32; 100]);
        assert_approx_eq!(m.phase(), 0.2, 1e-9);
        m.process(&vec![0.0f32; 300]);
        assert_approx_eq!(m.phase(), 0.8, 1e-9);
        m.reset();
        assert_eq!(m.phase(), 0.0);
    }

    #[test]
    fn test_block_size_invariance() {
        for mode in MODES {
            let mut m = Modulation::with_params(mode, 44100, 3.3, 0.8, 0.6).unwrap();
            let input = test_signal(6000, 44100);
            let (whole, chunked) = whole_and_split(&mut m, &input, &SPLITS);
            assert_eq!(whole, chunked, "{mode:?}");
        }
    }

    #[test]
    fn test_reset_matches_fresh() {
        let input = test_signal(4000, 48000);
        let mut used = Modulation::with_params(ModulationMode::Flanger, 48000, 0.7, 0.9, 0.5).unwrap();
        used.process(&input);
        used.reset();
        let a = used.process(&input[..1000]);
        let mut fresh = Modulation::with_params(ModulationMode::Flanger, 48000, 0.7, 0.9, 0.5).unwrap();
        assert_eq!(a, fresh.process(&input[..1000]));
    }

    #[test]
    fn test_kind_and_rejection() {
        let mut m = Modulation::new(ModulationMode::Flanger, 44100);
        assert_eq!(m.kind(), EffectKind::Flanger);
        assert!(m.set_parameter("rate", 0.0).is_err());
        assert_eq!(m.parameter("rate").unwrap(), 1.5);
    }
}
