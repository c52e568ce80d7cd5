//! The effect capability shared by every stage of a chain.
//!
//! An effect processes mono `f32` blocks in place, keeps whatever state it
//! needs between calls, and exposes a fixed table of named parameters with
//! declared ranges. Processing a signal in several blocks must give the same
//! result as processing it in one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::cabinet::CABINET_PARAMS;
use super::delay::ECHO_PARAMS;
use super::modulation::MODULATION_PARAMS;
use super::overdrive::OVERDRIVE_PARAMS;
use super::tone::TONE_PARAMS;
use crate::error::{Result, RigError};

/// The closed set of effect types this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    #[serde(alias = "gain")]
    Overdrive,
    Tone,
    Chorus,
    Flanger,
    Tremolo,
    Cabinet,
    Echo,
}

impl EffectKind {
    pub const ALL: [EffectKind; 7] = [
        EffectKind::Overdrive,
        EffectKind::Tone,
        EffectKind::Chorus,
        EffectKind::Flanger,
        EffectKind::Tremolo,
        EffectKind::Cabinet,
        EffectKind::Echo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Overdrive => "overdrive",
            EffectKind::Tone => "tone",
            EffectKind::Chorus => "chorus",
            EffectKind::Flanger => "flanger",
            EffectKind::Tremolo => "tremolo",
            EffectKind::Cabinet => "cabinet",
            EffectKind::Echo => "echo",
        }
    }

    /// The parameter table shared by every effect of this kind.
    pub fn parameters(self) -> &'static [ParamSpec] {
        match self {
            EffectKind::Overdrive => OVERDRIVE_PARAMS,
            EffectKind::Tone => TONE_PARAMS,
            EffectKind::Chorus | EffectKind::Flanger | EffectKind::Tremolo => MODULATION_PARAMS,
            EffectKind::Cabinet => CABINET_PARAMS,
            EffectKind::Echo => ECHO_PARAMS,
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "gain" {
            return Ok(EffectKind::Overdrive);
        }
        EffectKind::ALL
            .into_iter()
            .find(|k| k.name() == lower)
            .ok_or_else(|| RigError::UnknownEffect(s.to_string()))
    }
}

/// Declared range and default of one effect parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub unit: &'static str,
}

impl ParamSpec {
    pub const fn new(
        name: &'static str,
        min: f64,
        max: f64,
        default: f64,
        unit: &'static str,
    ) -> Self {
        ParamSpec {
            name,
            min,
            max,
            default,
            unit,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Look up `name` in `specs` and check `value` against its range.
///
/// Effects call this first in `set_parameter`, before touching any state.
pub fn validate(
    effect: EffectKind,
    specs: &'static [ParamSpec],
    name: &str,
    value: f64,
) -> Result<&'static ParamSpec> {
    let spec = find_spec(effect, specs, name)?;
    if !spec.contains(value) {
        return Err(RigError::ParameterOutOfRange {
            effect,
            name: name.to_string(),
            value,
            min: spec.min,
            max: spec.max,
        });
    }
    Ok(spec)
}

/// Look up `name` in `specs` without checking a value.
pub fn find_spec(
    effect: EffectKind,
    specs: &'static [ParamSpec],
    name: &str,
) -> Result<&'static ParamSpec> {
    specs
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| RigError::UnknownParameter {
            effect,
            name: name.to_string(),
        })
}

/// A single stage of an effect chain.
///
/// Implementations must not allocate or block inside
/// [`Effect::process_block`]; any buffers they need are sized when the
/// effect is built or when a parameter changes.
pub trait Effect: Send + fmt::Debug {
    fn kind(&self) -> EffectKind;

    /// Sample rate the effect was built for.
    fn sample_rate(&self) -> u32;

    /// The parameter table: names, ranges, and defaults.
    fn parameters(&self) -> &'static [ParamSpec];

    /// Current value of a parameter.
    fn parameter(&self, name: &str) -> Result<f64>;

    /// Change a parameter.
    ///
    /// Fails with [`RigError::ParameterOutOfRange`] when `value` lies outside
    /// the declared range; a rejected call leaves the effect untouched.
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()>;

    /// Process a block in place. The output has the same length as the input.
    fn process_block(&mut self, block: &mut [f32]);

    /// Clear all internal state back to what a freshly built effect holds.
    fn reset(&mut self);

    /// Delay introduced by the effect, in samples.
    fn latency(&self) -> usize {
        0
    }

    /// Copying convenience around [`Effect::process_block`].
    fn process(&mut self, input: &[f32]) -> Vec<f32> {
        let mut out = input.to_vec();
        self.process_block(&mut out);
        out
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[ParamSpec] = &[
        ParamSpec::new("drive", 0.0, 1.0, 0.5, ""),
        ParamSpec::new("freq", 20.0, 200.0, 100.0, "Hz"),
    ];

    #[test]
    fn kind_parses_names_and_alias() {
        assert_eq!("Tone".parse::<EffectKind>(), Ok(EffectKind::Tone));
        assert_eq!("gain".parse::<EffectKind>(), Ok(EffectKind::Overdrive));
        assert_eq!(
            "wah".parse::<EffectKind>(),
            Err(RigError::UnknownEffect("wah".to_string()))
        );
        for kind in EffectKind::ALL {
            assert_eq!(kind.name().parse::<EffectKind>(), Ok(kind));
        }
    }

    #[test]
    fn kind_serde_lowercase() {
        let json = serde_json::to_string(&EffectKind::Cabinet).unwrap();
        assert_eq!(json, "\"cabinet\"");
        let k: EffectKind = serde_json::from_str("\"gain\"").unwrap();
        assert_eq!(k, EffectKind::Overdrive);
    }

    #[test]
    fn validate_checks_range_and_name() {
        assert!(validate(EffectKind::Overdrive, SPECS, "drive", 1.0).is_ok());
        assert!(matches!(
            validate(EffectKind::Overdrive, SPECS, "drive", 1.01),
            Err(RigError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            validate(EffectKind::Overdrive, SPECS, "freq", f64::NAN),
            Err(RigError::ParameterOutOfRange { .. })
        ));
        assert!(matches!(
            validate(EffectKind::Overdrive, SPECS, "tone", 0.5),
            Err(RigError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn kind_tables_match_built_effects() {
        for kind in EffectKind::ALL {
            let effect = crate::dsp::chain::build_effect(kind, 48000).unwrap();
            assert_eq!(effect.kind(), kind);
            assert_eq!(effect.parameters(), kind.parameters(), "{kind}");
        }
    }
}
