//! tonepool - click-free voice allocation for a small polyphonic tone generator
//!
//! Design principles:
//! - A front end sends the full set of tones it wants; the pool works out the difference
//! - Voices are never mutated in place: changed tones cross-fade
//! - Released voices ramp to a floor level before they are stopped, so nothing clicks
//! - Nodes receive parameters via message ring buffers, not shared state
//! - CPAL devices are discoverable, sinks are just nodes
//!
//! # Example
//!
//! ```
//! use tonepool::{Engine, Session, SessionConfig, ToneDescriptor};
//! use tonepool::nodes::Waveform;
//!
//! let mut session = Session::with_engine(Engine::new(48_000, 2), &SessionConfig::default());
//! session.apply(&[ToneDescriptor::new(Waveform::Sine, 440.0, 50.0, 0.25)]);
//! session.render(16);
//!
//! // Gone from the pool at once, audible until its fade is over
//! session.apply(&[]);
//! assert_eq!(session.pool().unwrap().fading_len(), 1);
//! ```

mod node;
mod graph;
mod engine;
mod error;
mod output;
pub mod config;
pub mod nodes;
pub mod port;
pub mod session;
pub mod voice;

pub use node::{AudioNode, ProcessContext, NodeId};
pub use engine::{Engine, Handle};
pub use error::Error;
pub use output::{audio_supported, OutputDevice};
pub use config::SessionConfig;
pub use session::Session;
pub use voice::{AudioPlatform, ToneDescriptor, ToneKey, VoicePool};
