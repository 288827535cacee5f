//! Built-in audio nodes.
//!
//! Nodes are organized into three categories:
//!
//! ## Sources ([`source`])
//!
//! Generate audio with no audio inputs:
//! - [`Oscillator`] - One-shot periodic oscillator (sine, square, triangle, sawtooth)
//!
//! ## Effects ([`effect`])
//!
//! Process audio (inputs → outputs):
//! - [`Gain`] - Amplitude stage with set-value and exponential-ramp automation
//! - [`Mixer`] - Sum multiple inputs together (the engine's output bus)
//! - [`ScopeTap`] - Pass-through that feeds a [`Scope`] for visualization
//!
//! ## Sinks ([`sink`])
//!
//! Consume audio with no audio outputs:
//! - [`CpalSink`] - Output to system audio device (requires `cpal_sink` feature)
//! - [`RtrbSink`] - Write to ring buffer (offline rendering)
//!
//! # Message Types
//!
//! - [`OscillatorMessage`] - Start or stop an [`Oscillator`]
//! - [`GainMessage`] - Schedule [`Gain`] automation on the audio clock
//!
//! Nodes without parameters (like [`Mixer`]) use `()` as their message type.

pub mod source;
pub mod effect;
pub mod sink;

// Re-export common types at the top level for convenience
pub use source::{Oscillator, OscillatorMessage, Playback, Waveform};
pub use effect::{Gain, GainMessage, Mixer, Scope, ScopeTap};
pub use sink::RtrbSink;

#[cfg(feature = "cpal_sink")]
pub use sink::CpalSink;
