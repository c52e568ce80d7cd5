pub mod buffer;
pub mod dsp;
pub mod error;
pub mod preset;
pub mod transport;

pub use buffer::SampleBuffer;
pub use dsp::cabinet::ImpulseResponse;
pub use dsp::chain::EffectChain;
pub use dsp::effect::{Effect, EffectKind, ParamSpec};
pub use error::{Result, RigError};
pub use preset::{ChainPreset, EffectSlot};
pub use transport::{LoopbackTransport, Transport, run_session};

use serde::Serialize;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One entry of the effect catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    #[serde(rename = "effectType")]
    pub effect_type: EffectKind,
    pub parameters: &'static [ParamSpec],
}

/// Every effect type with its parameter table.
pub fn catalog() -> Vec<CatalogEntry> {
    EffectKind::ALL
        .into_iter()
        .map(|kind| CatalogEntry {
            effect_type: kind,
            parameters: kind.parameters(),
        })
        .collect()
}

/// Build a chain from preset JSON and run `samples` through it once.
pub fn process_with_preset(preset_json: &str, samples: Vec<f32>, sample_rate: u32) -> Result<Vec<f32>> {
    let preset = ChainPreset::from_json(preset_json)?;
    let mut chain = EffectChain::from_preset(&preset, sample_rate)?;
    let buffer = SampleBuffer::from_samples(samples, sample_rate)?;
    Ok(chain.process(buffer)?.into_samples())
}

/// WASM-exposed: return the amprig-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: list effect types and their parameter ranges.
#[wasm_bindgen]
pub fn effect_catalog() -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&catalog()).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: process mono f32 samples through the chain described by
/// `preset_json`. Returns the processed buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn process_samples(
    preset_json: &str,
    samples: Vec<f32>,
    sample_rate: u32,
) -> std::result::Result<Vec<f32>, JsValue> {
    process_with_preset(preset_json, samples, sample_rate)
        .map_err(|e| JsValue::from_str(&format!("{e}")))
}
