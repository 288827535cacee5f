//! The audio primitives a voice is built from

use crate::engine::{Engine, Handle};
use crate::nodes::{Gain, GainMessage, Oscillator, OscillatorMessage, Waveform};

/// What a [`VoicePool`](super::VoicePool) needs from an audio backend.
///
/// A voice is a generator feeding a gain stage feeding the shared output.
/// Times are seconds on the backend's audio clock, the same clock
/// [`now`](Self::now) reads.
///
/// [`Engine`] is the real backend; [`RecordingPlatform`](super::RecordingPlatform)
/// logs every call against a virtual clock for tests.
pub trait AudioPlatform {
    type Generator;
    type Stage;

    fn now(&self) -> f64;

    /// Allocate a stopped generator.
    fn create_generator(&mut self, shape: Waveform, frequency: f32) -> Self::Generator;

    /// Allocate a silent gain stage.
    fn create_stage(&mut self) -> Self::Stage;

    /// Route `generator → stage → output`.
    fn wire(&mut self, generator: &Self::Generator, stage: &Self::Stage);

    fn start(&mut self, generator: &mut Self::Generator);

    /// Pin the stage's level to `value` at `time`.
    fn set_level(&mut self, stage: &mut Self::Stage, value: f32, time: f64);

    /// Ramp the stage's level exponentially from its last pinned value, reaching
    /// `value` at `time`.
    fn ramp_level(&mut self, stage: &mut Self::Stage, value: f32, time: f64);

    /// Stop the generator for good.
    fn stop(&mut self, generator: &mut Self::Generator);

    /// Disconnect and free both halves of a voice.
    fn unwire(&mut self, generator: Self::Generator, stage: Self::Stage);
}

impl AudioPlatform for Engine {
    type Generator = Handle<OscillatorMessage>;
    type Stage = Handle<GainMessage>;

    fn now(&self) -> f64 {
        Engine::now(self)
    }

    fn create_generator(&mut self, shape: Waveform, frequency: f32) -> Self::Generator {
        self.add(Oscillator::new(shape, frequency))
    }

    fn create_stage(&mut self) -> Self::Stage {
        self.add(Gain::new(0.0))
    }

    fn wire(&mut self, generator: &Self::Generator, stage: &Self::Stage) {
        self.connect(generator, stage);
        self.output(stage);
    }

    fn start(&mut self, generator: &mut Self::Generator) {
        send(generator, OscillatorMessage::Start);
    }

    fn set_level(&mut self, stage: &mut Self::Stage, value: f32, time: f64) {
        send(stage, GainMessage::SetValueAtTime { value, time });
    }

    fn ramp_level(&mut self, stage: &mut Self::Stage, value: f32, time: f64) {
        send(stage, GainMessage::ExponentialRampToValueAtTime { value, time });
    }

    fn stop(&mut self, generator: &mut Self::Generator) {
        send(generator, OscillatorMessage::Stop);
    }

    fn unwire(&mut self, generator: Self::Generator, stage: Self::Stage) {
        self.remove(generator);
        self.remove(stage);
    }
}

fn send<M: Send + std::fmt::Debug + 'static>(handle: &mut Handle<M>, msg: M) {
    if let Err(msg) = handle.send(msg) {
        tracing::warn!(node = ?handle.id(), ?msg, "message queue full, dropping");
    }
}
