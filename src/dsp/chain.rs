//! Effect chain — an ordered pipeline of effects sharing one sample rate.

use std::collections::BTreeMap;

use log::debug;

use super::cabinet::{Cabinet, ImpulseResponse};
use super::delay::Echo;
use super::effect::{Effect, EffectKind};
use super::modulation::{Modulation, ModulationMode};
use super::overdrive::Overdrive;
use super::tone::ToneFilter;
use crate::buffer::SampleBuffer;
use crate::error::{Result, RigError};
use crate::preset::{ChainPreset, EffectSlot};

/// Build an effect of `kind` at its default settings.
///
/// Fails with [`RigError::InvalidSampleRate`] for a zero rate, or for a rate
/// too low to hold the effect's own parameter ranges.
pub fn build_effect(kind: EffectKind, sample_rate: u32) -> Result<Box<dyn Effect>> {
    if sample_rate == 0 {
        return Err(RigError::InvalidSampleRate(sample_rate));
    }
    Ok(match kind {
        EffectKind::Overdrive => Box::new(Overdrive::new(sample_rate)),
        EffectKind::Tone => Box::new(ToneFilter::new(sample_rate)?),
        EffectKind::Chorus => Box::new(Modulation::new(ModulationMode::Chorus, sample_rate)),
        EffectKind::Flanger => Box::new(Modulation::new(ModulationMode::Flanger, sample_rate)),
        EffectKind::Tremolo => Box::new(Modulation::new(ModulationMode::Tremolo, sample_rate)),
        EffectKind::Cabinet => Box::new(Cabinet::new(sample_rate)),
        EffectKind::Echo => Box::new(Echo::new(sample_rate)),
    })
}

/// Build an effect and apply `params`, failing on the first unknown name or
/// out-of-range value.
pub fn build_effect_with(
    kind: EffectKind,
    sample_rate: u32,
    params: &BTreeMap<String, f64>,
) -> Result<Box<dyn Effect>> {
    let mut effect = build_effect(kind, sample_rate)?;
    for (name, &value) in params {
        effect.set_parameter(name, value)?;
    }
    Ok(effect)
}

/// An ordered sequence of effects applied one after another.
///
/// The chain owns its effects and their state. It is not meant to be shared
/// between threads while processing; use one chain per stream.
#[derive(Debug)]
pub struct EffectChain {
    sample_rate: u32,
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    pub fn new(sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(RigError::InvalidSampleRate(sample_rate));
        }
        Ok(EffectChain {
            sample_rate,
            effects: Vec::new(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn effects(&self) -> &[Box<dyn Effect>] {
        &self.effects
    }

    pub fn get(&self, position: usize) -> Option<&dyn Effect> {
        self.effects.get(position).map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut (dyn Effect + 'static)> {
        self.effects.get_mut(position).map(|e| e.as_mut())
    }

    /// Kinds of the effects in chain order.
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects.iter().map(|e| e.kind()).collect()
    }

    fn check_rate(&self, effect: &dyn Effect) -> Result<()> {
        if effect.sample_rate() != self.sample_rate {
            return Err(RigError::SampleRateMismatch {
                expected: self.sample_rate,
                found: effect.sample_rate(),
            });
        }
        Ok(())
    }

    fn check_buffer(&self, buffer: &SampleBuffer) -> Result<()> {
        if buffer.sample_rate() != self.sample_rate {
            return Err(RigError::SampleRateMismatch {
                expected: self.sample_rate,
                found: buffer.sample_rate(),
            });
        }
        Ok(())
    }

    /// Append an effect at the end of the chain.
    pub fn push(&mut self, effect: Box<dyn Effect>) -> Result<()> {
        self.check_rate(effect.as_ref())?;
        debug!("chain: push {} at {}", effect.kind(), self.effects.len());
        self.effects.push(effect);
        Ok(())
    }

    /// Insert an effect so that it ends up at `position`.
    pub fn insert(&mut self, position: usize, effect: Box<dyn Effect>) -> Result<()> {
        if position > self.effects.len() {
            return Err(RigError::Position {
                position,
                len: self.effects.len(),
            });
        }
        self.check_rate(effect.as_ref())?;
        debug!("chain: insert {} at {position}", effect.kind());
        self.effects.insert(position, effect);
        Ok(())
    }

    /// Remove and return the effect at `position`.
    pub fn remove(&mut self, position: usize) -> Result<Box<dyn Effect>> {
        if position >= self.effects.len() {
            return Err(RigError::Position {
                position,
                len: self.effects.len(),
            });
        }
        let effect = self.effects.remove(position);
        debug!("chain: removed {} from {position}", effect.kind());
        Ok(effect)
    }

    /// Move the effect at `from` so it ends up at `to`, shifting the ones in
    /// between. Effect state travels with the effect.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.effects.len();
        for position in [from, to] {
            if position >= len {
                return Err(RigError::Position { position, len });
            }
        }
        let effect = self.effects.remove(from);
        self.effects.insert(to, effect);
        debug!("chain: moved effect {from} -> {to}, order now {:?}", self.kinds());
        Ok(())
    }

    /// Exchange two effects.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let len = self.effects.len();
        for position in [a, b] {
            if position >= len {
                return Err(RigError::Position { position, len });
            }
        }
        self.effects.swap(a, b);
        Ok(())
    }

    /// Build an effect by kind with a parameter map and append it.
    ///
    /// Parameters are validated here, before the effect joins the chain.
    pub fn add_by_name(&mut self, name: &str, params: &BTreeMap<String, f64>) -> Result<()> {
        let kind: EffectKind = name.parse()?;
        let effect = build_effect_with(kind, self.sample_rate, params)?;
        self.push(effect)
    }

    /// Run `buffer` through every effect in order.
    ///
    /// The buffer is processed in place and handed back. A sample-rate
    /// mismatch is reported before any effect runs, so on error no effect
    /// state has changed.
    pub fn process(&mut self, mut buffer: SampleBuffer) -> Result<SampleBuffer> {
        self.check_buffer(&buffer)?;
        // In place: the buffer's samples are overwritten stage by stage.
        let samples = buffer.samples_mut();
        for effect in self.effects.iter_mut() {
            effect.process_block(samples);
        }
        Ok(buffer)
    }

    /// Like [`EffectChain::process`], but feeds the chain `block_size`
    /// samples at a time, as an audio callback would.
    pub fn process_in_blocks(
        &mut self,
        mut buffer: SampleBuffer,
        block_size: usize,
    ) -> Result<SampleBuffer> {
        self.check_buffer(&buffer)?;
        // In place, one block at a time through the whole chain.
        for block in buffer.samples_mut().chunks_mut(block_size.max(1)) {
            for effect in self.effects.iter_mut() {
                effect.process_block(block);
            }
        }
        Ok(buffer)
    }

    /// Reset every effect, in chain order. Call before processing an
    /// unrelated recording.
    pub fn reset_all(&mut self) {
        debug!("chain: reset {} effects", self.effects.len());
        for effect in self.effects.iter_mut() {
            effect.reset();
        }
    }

    /// Build a chain from a preset.
    pub fn from_preset(preset: &ChainPreset, sample_rate: u32) -> Result<Self> {
        let mut chain = EffectChain::new(sample_rate)?;
        for slot in preset.ordered_slots()? {
            let effect: Box<dyn Effect> = match &slot.impulse_response {
                None => build_effect_with(slot.effect_type, sample_rate, &slot.parameter_map)?,
                Some(ir) if slot.effect_type == EffectKind::Cabinet => {
                    let ir = ImpulseResponse::from_samples(ir.clone())?;
                    let mut cab = Cabinet::with_impulse_response(sample_rate, ir);
                    for (name, &value) in &slot.parameter_map {
                        cab.set_parameter(name, value)?;
                    }
                    Box::new(cab)
                }
                Some(_) => {
                    return Err(RigError::Preset(format!(
                        "slot {} is {}, only cabinet slots take an impulse response",
                        slot.ordered_index, slot.effect_type
                    )));
                }
            };
            chain.push(effect)?;
        }
        debug!("chain: built {:?} from preset at {sample_rate} Hz", chain.kinds());
        Ok(chain)
    }

    /// Snapshot the chain's effect types and parameter values.
    ///
    /// Impulse responses are not captured; cabinets come back with the
    /// default response.
    pub fn to_preset(&self) -> ChainPreset {
        let effects = self
            .effects
            .iter()
            .enumerate()
            .map(|(i, effect)| {
                let parameter_map = effect
                    .parameters()
                    .iter()
                    .filter_map(|spec| {
                        effect
                            .parameter(spec.name)
                            .ok()
                            .map(|v| (spec.name.to_string(), v))
                    })
                    .collect();
                EffectSlot {
                    effect_type: effect.kind(),
                    ordered_index: i,
                    parameter_map,
                    impulse_response: None,
                }
            })
            .collect();
        ChainPreset { effects }
    }
}
