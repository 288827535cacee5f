//! Periodic tone generator

use dasp_graph::{Buffer, Input};
use serde::{Deserialize, Serialize};

use crate::node::{AudioNode, ProcessContext};

/// Waveform produced by an [`Oscillator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Sample the waveform at `phase` (in cycles, `0.0..1.0`).
    ///
    /// Every shape starts at zero and rises, so a freshly started oscillator
    /// doesn't open with a step.
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * std::f32::consts::TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * ((phase + 0.25).fract() - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * (phase + 0.5).fract() - 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }
}

/// Messages to control an Oscillator
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OscillatorMessage {
    /// Begin producing signal. Ignored once the oscillator has been stopped.
    Start,
    /// Stop producing signal for good
    Stop,
}

/// Where an oscillator is in its one-shot life.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Playback {
    Idle,
    Running,
    Stopped,
}

/// A full-scale periodic oscillator (mono source)
///
/// Outputs silence until it receives [`OscillatorMessage::Start`]. Like a
/// browser oscillator it is one-shot: after [`OscillatorMessage::Stop`] it
/// stays silent and a later `Start` is ignored.
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32,
    playback: Playback,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency: frequency.max(0.0),
            phase: 0.0,
            playback: Playback::Idle,
        }
    }

    pub fn sine(frequency: f32) -> Self {
        Self::new(Waveform::Sine, frequency)
    }

    #[inline]
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[inline]
    pub fn playback(&self) -> Playback {
        self.playback
    }

    fn handle(&mut self, msg: OscillatorMessage) {
        match msg {
            OscillatorMessage::Start => {
                if self.playback == Playback::Idle {
                    self.playback = Playback::Running;
                }
            }
            OscillatorMessage::Stop => self.playback = Playback::Stopped,
        }
    }
}

impl AudioNode for Oscillator {
    type Message = OscillatorMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = OscillatorMessage>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            self.handle(msg);
        }

        let Some((first, rest)) = outputs.split_first_mut() else {
            return;
        };

        if self.playback != Playback::Running {
            first.silence();
        } else {
            let phase_inc = self.frequency / ctx.sample_rate as f32;
            let waveform = self.waveform;

            for sample in first.iter_mut() {
                *sample = waveform.sample(self.phase);

                self.phase += phase_inc;
                self.phase -= self.phase.floor();
            }
        }

        // Copy to remaining output channels (if any)
        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 0 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}
