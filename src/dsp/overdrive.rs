//! Overdrive — a stateless tanh waveshaper with dry/wet blend.

use super::effect::{Effect, EffectKind, ParamSpec, find_spec, validate};
use super::window::blend;
use crate::error::Result;

/// Pre-gain applied at `drive = 1.0`.
const MAX_PRE_GAIN: f64 = 25.0;

pub(crate) const OVERDRIVE_PARAMS: &[ParamSpec] = &[
    ParamSpec::new("drive", 0.0, 1.0, 0.5, ""),
    ParamSpec::new("mix", 0.0, 1.0, 1.0, ""),
    ParamSpec::new("level", 0.0, 1.0, 1.0, ""),
];

/// Soft clipper: odd, bounded by 1, and smooth everywhere.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Gain/overdrive stage.
///
/// `drive` scales the input by `1 + 24 * drive` before [`soft_clip`];
/// `mix` crossfades from the clean input to the shaped signal; `level`
/// trims the result.
#[derive(Debug, Clone)]
pub struct Overdrive {
    sample_rate: u32,
    drive: f64,
    mix: f64,
    level: f64,
    pre_gain: f32,
}

impl Overdrive {
    pub fn new(sample_rate: u32) -> Self {
        let mut od = Overdrive {
            sample_rate,
            drive: OVERDRIVE_PARAMS[0].default,
            mix: OVERDRIVE_PARAMS[1].default,
            level: OVERDRIVE_PARAMS[2].default,
            pre_gain: 1.0,
        };
        od.update_pre_gain();
        od
    }

    /// Create an overdrive with specific drive and mix.
    pub fn with_params(sample_rate: u32, drive: f64, mix: f64) -> Result<Self> {
        let mut od = Self::new(sample_rate);
        od.set_parameter("drive", drive)?;
        od.set_parameter("mix", mix)?;
        Ok(od)
    }

    fn update_pre_gain(&mut self) {
        self.pre_gain = (1.0 + (MAX_PRE_GAIN - 1.0) * self.drive) as f32;
    }

    #[inline]
    fn shape(&self, x: f32) -> f32 {
        let clipped = soft_clip(x * self.pre_gain);
        blend(x, clipped, self.mix as f32) * self.level as f32
    }
}

impl Effect for Overdrive {
    fn kind(&self) -> EffectKind {
        EffectKind::Overdrive
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        OVERDRIVE_PARAMS
    }

    fn parameter(&self, name: &str) -> Result<f64> {
        let spec = find_spec(EffectKind::Overdrive, OVERDRIVE_PARAMS, name)?;
        Ok(match spec.name {
            "drive" => self.drive,
            "mix" => self.mix,
            _ => self.level,
        })
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let spec = validate(EffectKind::Overdrive, OVERDRIVE_PARAMS, name, value)?;
        match spec.name {
            "drive" => {
                self.drive = value;
                self.update_pre_gain();
            }
            "mix" => self.mix = value,
            _ => self.level = value,
        }
        Ok(())
    }

    fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.shape(*sample);
        }
    }

    fn reset(&mut self) {}
}
