//! An [`AudioPlatform`] that records calls instead of making sound

use super::platform::AudioPlatform;
use crate::nodes::Waveform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeneratorId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(pub u32);

/// One call made on a [`RecordingPlatform`].
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    CreateGenerator { generator: GeneratorId, shape: Waveform, frequency: f32 },
    CreateStage { stage: StageId },
    Wire { generator: GeneratorId, stage: StageId },
    Start { generator: GeneratorId },
    SetLevel { stage: StageId, value: f32, time: f64 },
    RampLevel { stage: StageId, value: f32, time: f64 },
    Stop { generator: GeneratorId },
    Unwire { generator: GeneratorId, stage: StageId },
}

/// Logs every platform call against a virtual clock.
///
/// Time only moves when told to, so scheduled releases can be stepped
/// through exactly.
///
/// ```
/// use tonepool::nodes::Waveform;
/// use tonepool::voice::{AudioPlatform, Op, RecordingPlatform};
///
/// let mut platform = RecordingPlatform::new();
/// platform.advance(1.5);
/// let mut stage = platform.create_stage();
/// platform.set_level(&mut stage, 0.5, platform.now());
///
/// assert!(matches!(platform.ops()[1], Op::SetLevel { time, .. } if time == 1.5));
/// ```
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    now: f64,
    next_id: u32,
    ops: Vec<Op>,
    /// Wired generator/stage pairs not yet unwired
    connected: Vec<(GeneratorId, StageId)>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the virtual clock forward by `secs`.
    pub fn advance(&mut self, secs: f64) {
        self.now += secs;
    }

    pub fn set_now(&mut self, now: f64) {
        self.now = now;
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Return the log so far and start a new one.
    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    /// Voices currently routed to the output.
    pub fn connected(&self) -> &[(GeneratorId, StageId)] {
        &self.connected
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl AudioPlatform for RecordingPlatform {
    type Generator = GeneratorId;
    type Stage = StageId;

    fn now(&self) -> f64 {
        self.now
    }

    fn create_generator(&mut self, shape: Waveform, frequency: f32) -> GeneratorId {
        let generator = GeneratorId(self.next_id());
        self.ops.push(Op::CreateGenerator { generator, shape, frequency });
        generator
    }

    fn create_stage(&mut self) -> StageId {
        let stage = StageId(self.next_id());
        self.ops.push(Op::CreateStage { stage });
        stage
    }

    fn wire(&mut self, generator: &GeneratorId, stage: &StageId) {
        self.connected.push((*generator, *stage));
        self.ops.push(Op::Wire { generator: *generator, stage: *stage });
    }

    fn start(&mut self, generator: &mut GeneratorId) {
        self.ops.push(Op::Start { generator: *generator });
    }

    fn set_level(&mut self, stage: &mut StageId, value: f32, time: f64) {
        self.ops.push(Op::SetLevel { stage: *stage, value, time });
    }

    fn ramp_level(&mut self, stage: &mut StageId, value: f32, time: f64) {
        self.ops.push(Op::RampLevel { stage: *stage, value, time });
    }

    fn stop(&mut self, generator: &mut GeneratorId) {
        self.ops.push(Op::Stop { generator: *generator });
    }

    fn unwire(&mut self, generator: GeneratorId, stage: StageId) {
        self.connected.retain(|pair| *pair != (generator, stage));
        self.ops.push(Op::Unwire { generator, stage });
    }
}
