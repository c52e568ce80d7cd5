//! Capture/playback boundary.
//!
//! Device access lives outside this crate. A [`Transport`] hands the chain a
//! recorded buffer and accepts the processed one; [`run_session`] wires the
//! two ends to an [`EffectChain`].

use std::collections::VecDeque;

use log::debug;

use crate::buffer::SampleBuffer;
use crate::dsp::chain::EffectChain;
use crate::error::{Result, RigError};

/// Something that can record a buffer and play one back.
pub trait Transport {
    /// Record one buffer.
    fn capture(&mut self) -> Result<SampleBuffer>;

    /// Deliver a processed buffer to the output.
    fn play(&mut self, buffer: SampleBuffer) -> Result<()>;
}

/// Record, process, and play one take.
///
/// The chain is reset first so nothing from an earlier take leaks into this
/// one. Returns the number of samples played.
pub fn run_session(transport: &mut dyn Transport, chain: &mut EffectChain) -> Result<usize> {
    chain.reset_all();
    let input = transport.capture()?;
    debug!(
        "session: captured {} samples at {} Hz",
        input.len(),
        input.sample_rate()
    );
    let output = chain.process(input)?;
    let played = output.len();
    transport.play(output)?;
    Ok(played)
}

/// In-memory transport: captures from a queue of prepared takes and keeps
/// everything it is asked to play.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    takes: VecDeque<SampleBuffer>,
    played: Vec<SampleBuffer>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a buffer for the next `capture`.
    pub fn queue(&mut self, take: SampleBuffer) {
        self.takes.push_back(take);
    }

    pub fn pending(&self) -> usize {
        self.takes.len()
    }

    pub fn played(&self) -> &[SampleBuffer] {
        &self.played
    }

    pub fn take_played(&mut self) -> Vec<SampleBuffer> {
        std::mem::take(&mut self.played)
    }
}

impl Transport for LoopbackTransport {
    fn capture(&mut self) -> Result<SampleBuffer> {
        self.takes
            .pop_front()
            .ok_or_else(|| RigError::Transport("no take queued for capture".to_string()))
    }

    fn play(&mut self, buffer: SampleBuffer) -> Result<()> {
        self.played.push(buffer);
        Ok(())
    }
}
