//! Core node trait and context types.

use dasp_graph::{Buffer, Input};

/// Information available during audio processing.
///
/// Passed to every [`AudioNode::process`] call. Besides the graph's sample rate
/// and block size it carries the position of the block on the audio clock, which
/// is what parameter automation (see [`Gain`](crate::nodes::Gain)) is scheduled against.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// Sample rate of the graph in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of samples per buffer (always [`Buffer::LEN`])
    pub buffer_size: usize,
    /// Index of the first frame of the current block since the graph was created
    pub frame: u64,
}

impl ProcessContext {
    /// Audio clock time, in seconds, of the first frame of the current block.
    #[inline]
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    /// Duration of one frame in seconds.
    #[inline]
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }
}

/// Unique identifier for a node within a graph.
///
/// You typically don't interact with this directly - use [`Handle`](crate::Handle) instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

/// The core trait for audio processing nodes.
///
/// Nodes can be:
/// - **Sources**: Generate audio (0 inputs, 1+ outputs) - oscillators
/// - **Effects**: Process audio (1+ inputs, 1+ outputs) - gain stages, mixers, taps
/// - **Sinks**: Consume audio (1+ inputs, 0 outputs) - device outputs, recorders
///
/// # Message-Based Parameters
///
/// Instead of shared mutable state, nodes receive parameter updates via messages.
/// Define your message type and handle it at the start of `process()`:
///
/// ```
/// use tonepool::{AudioNode, ProcessContext};
/// use dasp_graph::{Buffer, Input};
///
/// enum HumMessage {
///     SetLevel(f32),
/// }
///
/// struct Hum {
///     level: f32,
///     phase: f32,
/// }
///
/// impl AudioNode for Hum {
///     type Message = HumMessage;
///
///     fn process(
///         &mut self,
///         ctx: &ProcessContext,
///         messages: impl Iterator<Item = HumMessage>,
///         _inputs: &[Input],
///         outputs: &mut [Buffer],
///     ) {
///         for msg in messages {
///             match msg {
///                 HumMessage::SetLevel(l) => self.level = l,
///             }
///         }
///
///         for sample in outputs[0].iter_mut() {
///             *sample = (self.phase * std::f32::consts::TAU).sin() * self.level;
///             self.phase = (self.phase + 50.0 / ctx.sample_rate as f32) % 1.0;
///         }
///     }
/// }
/// ```
///
/// If your node doesn't need runtime parameter updates, use `()` as the message type.
pub trait AudioNode: Send + 'static {
    /// Message type for parameter updates.
    ///
    /// Use a custom enum for nodes with parameters, or `()` for nodes without.
    type Message: Send + 'static;

    /// Process one block of audio.
    ///
    /// Called once per audio block (64 samples). Your implementation should:
    /// 1. Drain and handle all pending messages
    /// 2. Read from `inputs` (if any)
    /// 3. Write to `outputs`
    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    );

    /// Number of audio input channels (0 for sources).
    fn num_inputs(&self) -> usize { 0 }

    /// Number of audio output channels.
    fn num_outputs(&self) -> usize { 1 }
}
