//! Audio effect nodes (processors with audio inputs and outputs)

mod gain;
mod mixer;
mod scope;

pub use gain::{Gain, GainMessage};
pub use mixer::Mixer;
pub use scope::{Scope, ScopeTap};
