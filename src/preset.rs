//! Chain preset schema.
//!
//! A preset lists the effects of a chain with their position and parameter
//! values. Reading and writing preset files is left to the caller; this
//! module only defines the JSON shape and checks it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dsp::effect::EffectKind;
use crate::error::{Result, RigError};

// ── Chain Preset (top-level) ────────────────────────────────

/// A whole chain: `{"effects": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainPreset {
    pub effects: Vec<EffectSlot>,
}

// ── Effect Slot ─────────────────────────────────────────────

/// One effect in a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSlot {
    /// Effect type name (e.g. "overdrive", "tone", "cabinet").
    #[serde(rename = "effectType")]
    pub effect_type: EffectKind,
    /// Position in the chain; slots are applied in ascending order.
    #[serde(rename = "orderedIndex")]
    pub ordered_index: usize,
    /// Parameter values by name. Missing names keep their defaults.
    #[serde(default, rename = "parameterMap")]
    pub parameter_map: BTreeMap<String, f64>,
    /// Custom impulse response samples (cabinet slots only).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "impulseResponse"
    )]
    pub impulse_response: Option<Vec<f32>>,
}

impl EffectSlot {
    pub fn new(effect_type: EffectKind, ordered_index: usize) -> Self {
        EffectSlot {
            effect_type,
            ordered_index,
            parameter_map: BTreeMap::new(),
            impulse_response: None,
        }
    }

    /// Builder-style parameter setter.
    pub fn with_param(mut self, name: &str, value: f64) -> Self {
        self.parameter_map.insert(name.to_string(), value);
        self
    }
}

impl ChainPreset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Slots sorted by `orderedIndex`. Duplicate indices are an error.
    pub fn ordered_slots(&self) -> Result<Vec<&EffectSlot>> {
        let mut seen = BTreeSet::new();
        for slot in &self.effects {
            if !seen.insert(slot.ordered_index) {
                return Err(RigError::Preset(format!(
                    "duplicate orderedIndex {}",
                    slot.ordered_index
                )));
            }
        }
        let mut slots: Vec<&EffectSlot> = self.effects.iter().collect();
        slots.sort_by_key(|s| s.ordered_index);
        Ok(slots)
    }
}
