//! One sounding tone and its lifecycle

use std::fmt;

use super::descriptor::{ToneDescriptor, ToneKey, FADE_FLOOR};
use super::platform::AudioPlatform;

/// Identifies a device within its pool; never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a [`Device`]. Moves forward only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceState {
    /// Generator and gain stage allocated, not yet routed
    Connecting,
    /// Routed to the output and audible
    Sounding,
    /// Ramping down; waiting for its release
    Fading,
    /// Stopped and disconnected
    Released,
}

/// A generator and gain stage realizing one [`ToneDescriptor`].
pub struct Device<P: AudioPlatform> {
    id: DeviceId,
    key: ToneKey,
    descriptor: ToneDescriptor,
    generator: P::Generator,
    stage: P::Stage,
    state: DeviceState,
    fade_started_at: Option<f64>,
    release_at: Option<f64>,
}

impl<P: AudioPlatform> Device<P> {
    /// Build the voice and bring it to [`DeviceState::Sounding`].
    pub fn create(platform: &mut P, id: DeviceId, key: ToneKey, descriptor: ToneDescriptor) -> Self {
        let generator =
            platform.create_generator(descriptor.shape, descriptor.sounding_frequency() as f32);
        let stage = platform.create_stage();

        let mut device = Self {
            id,
            key,
            descriptor,
            generator,
            stage,
            state: DeviceState::Connecting,
            fade_started_at: None,
            release_at: None,
        };
        tracing::debug!(device = %id, %key, "connecting");

        let now = platform.now();
        platform.set_level(&mut device.stage, device.descriptor.level(), now);
        platform.wire(&device.generator, &device.stage);
        platform.start(&mut device.generator);
        device.transition(DeviceState::Sounding);

        device
    }

    /// Schedule the release ramp, ending `fade_out_period` after `now`.
    ///
    /// Returns when the device may be released: `margin` seconds after the
    /// ramp ends. Only a sounding device can fade; anything else returns
    /// `None`.
    pub fn begin_fade(&mut self, platform: &mut P, now: f64, margin: f64) -> Option<f64> {
        if self.state != DeviceState::Sounding {
            debug_assert!(false, "begin_fade on a {:?} device", self.state);
            return None;
        }

        let ramp_end = now + self.descriptor.fade_out_period;
        platform.set_level(&mut self.stage, self.descriptor.level(), now);
        platform.ramp_level(&mut self.stage, FADE_FLOOR, ramp_end);

        let release_at = ramp_end + margin;
        self.fade_started_at = Some(now);
        self.release_at = Some(release_at);
        self.transition(DeviceState::Fading);

        Some(release_at)
    }

    /// Stop the generator and free both stages. Returns the state the device
    /// ends in, always [`DeviceState::Released`].
    pub fn release(mut self, platform: &mut P) -> DeviceState {
        platform.stop(&mut self.generator);
        self.transition(DeviceState::Released);
        platform.unwire(self.generator, self.stage);
        self.state
    }

    fn transition(&mut self, to: DeviceState) {
        debug_assert!(to > self.state, "{:?} -> {:?}", self.state, to);
        tracing::debug!(device = %self.id, key = %self.key, from = ?self.state, ?to, "transition");
        self.state = to;
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn key(&self) -> &ToneKey {
        &self.key
    }

    pub fn descriptor(&self) -> &ToneDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn generator(&self) -> &P::Generator {
        &self.generator
    }

    pub fn stage(&self) -> &P::Stage {
        &self.stage
    }

    /// When the release ramp began, once fading.
    pub fn fade_started_at(&self) -> Option<f64> {
        self.fade_started_at
    }

    /// When the device is due for release, once fading.
    pub fn release_at(&self) -> Option<f64> {
        self.release_at
    }
}
