//! Voice allocation: one generator and gain stage per distinct wanted tone.
//!
//! A front end describes *what* should be sounding as a list of
//! [`ToneDescriptor`]s. A [`VoicePool`] turns each new list into the minimum
//! set of changes: start voices for new tones, fade out voices for tones that
//! went away, leave the rest alone. A fading voice keeps ringing until its
//! release is due, so a tone that comes back while the old voice fades simply
//! gets a new voice.
//!
//! The pool is written against [`AudioPlatform`], implemented by
//! [`Engine`](crate::Engine) for real output and by [`RecordingPlatform`] for
//! tests.

mod descriptor;
mod device;
mod platform;
mod pool;
mod recording;
mod release;

pub use descriptor::{DescriptorError, ToneDescriptor, ToneKey, FADE_FLOOR};
pub use device::{Device, DeviceId, DeviceState};
pub use platform::AudioPlatform;
pub use pool::{PoolStats, VoicePool};
pub use recording::{GeneratorId, Op, RecordingPlatform, StageId};
pub use release::ReleaseQueue;
