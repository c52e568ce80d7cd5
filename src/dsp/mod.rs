//! DSP — effects, their building blocks, and the chain that runs them.
//!
//! Everything here is plain per-sample Rust with no I/O, so the same code
//! runs natively and in the browser through the WASM exports.

pub mod analysis;
pub mod cabinet;
pub mod chain;
pub mod delay;
pub mod effect;
pub mod filter;
pub mod modulation;
pub mod oscillator;
pub mod overdrive;
pub mod tone;
pub mod window;
