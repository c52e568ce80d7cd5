use thiserror::Error;

use crate::dsp::effect::EffectKind;

/// Errors raised by buffers, effects, and chains.
///
/// Every failure is local and synchronous: it is reported to the caller of
/// the offending operation and never retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RigError {
    #[error("sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("{effect} parameter '{name}' = {value} is outside {min}..={max}")]
    ParameterOutOfRange {
        effect: EffectKind,
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("window of {length} samples at {start} exceeds buffer length {len}")]
    Range {
        start: usize,
        length: usize,
        len: usize,
    },

    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(u32),

    #[error("{effect} has no parameter named '{name}'")]
    UnknownParameter { effect: EffectKind, name: String },

    #[error("unknown effect type '{0}'")]
    UnknownEffect(String),

    #[error("chain position {position} is out of bounds for {len} effects")]
    Position { position: usize, len: usize },

    #[error("impulse response must contain at least one sample")]
    EmptyImpulseResponse,

    #[error("invalid preset: {0}")]
    Preset(String),

    #[error("transport: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for RigError {
    fn from(e: serde_json::Error) -> Self {
        RigError::Preset(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RigError>;
