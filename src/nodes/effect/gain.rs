//! Gain stage with sample-accurate automation

use std::collections::VecDeque;

use dasp_graph::{Buffer, Input};

use crate::node::{AudioNode, ProcessContext};

/// Messages to control gain
///
/// Times are on the graph's audio clock, in seconds (see [`ProcessContext::time`]).
/// Events must be sent in non-decreasing time order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GainMessage {
    /// Jump to `value` at `time`
    SetValueAtTime { value: f32, time: f64 },
    /// Ramp exponentially from the previous event's value to `value`, arriving at `time`
    ExponentialRampToValueAtTime { value: f32, time: f64 },
}

impl GainMessage {
    fn time(&self) -> f64 {
        match *self {
            GainMessage::SetValueAtTime { time, .. } => time,
            GainMessage::ExponentialRampToValueAtTime { time, .. } => time,
        }
    }
}

/// A gain (volume) control that passes audio through with amplitude scaling.
///
/// The level follows a timeline of automation events. An exponential ramp
/// needs both ends strictly positive; a ramp from or to zero holds the start
/// value and jumps at the end time. This is why fades target a small floor
/// rather than zero.
pub struct Gain {
    value: f32,
    /// Value and time the next ramp starts from
    anchor: (f32, f64),
    events: VecDeque<GainMessage>,
}

impl Gain {
    /// Create a new gain node with the specified gain value
    pub fn new(gain: f32) -> Self {
        Self {
            value: gain,
            anchor: (gain, 0.0),
            events: VecDeque::new(),
        }
    }

    /// Current level (as of the last processed sample)
    #[inline]
    pub fn gain(&self) -> f32 {
        self.value
    }

    /// Number of automation events that haven't completed yet
    #[inline]
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn push_event(&mut self, msg: GainMessage) {
        // Out-of-order events would stall the queue; clamp them to the tail
        let tail = self.events.back().map(GainMessage::time).unwrap_or(f64::MIN);
        let msg = match msg {
            GainMessage::SetValueAtTime { value, time } => {
                GainMessage::SetValueAtTime { value, time: time.max(tail) }
            }
            GainMessage::ExponentialRampToValueAtTime { value, time } => {
                GainMessage::ExponentialRampToValueAtTime { value, time: time.max(tail) }
            }
        };
        self.events.push_back(msg);
    }

    /// Level at time `t`, consuming events that have completed by then.
    fn value_at(&mut self, t: f64) -> f32 {
        while let Some(event) = self.events.front().copied() {
            match event {
                GainMessage::SetValueAtTime { value, time } => {
                    if t < time {
                        break;
                    }
                    self.value = value;
                    self.anchor = (value, time);
                    self.events.pop_front();
                }
                GainMessage::ExponentialRampToValueAtTime { value, time } => {
                    if t >= time {
                        self.value = value;
                        self.anchor = (value, time);
                        self.events.pop_front();
                        continue;
                    }

                    let (v0, t0) = self.anchor;
                    if t < t0 {
                        break;
                    }
                    self.value = exponential_ramp(v0, value, (t - t0) / (time - t0));
                    break;
                }
            }
        }
        self.value
    }
}

/// Exponential interpolation between `v0` and `v1` at `progress` (`0.0..=1.0`).
pub(crate) fn exponential_ramp(v0: f32, v1: f32, progress: f64) -> f32 {
    if v0 <= 0.0 || v1 <= 0.0 {
        return v0;
    }
    let ratio = (v1 / v0) as f64;
    (v0 as f64 * ratio.powf(progress.clamp(0.0, 1.0))) as f32
}

impl AudioNode for Gain {
    type Message = GainMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = GainMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            self.push_event(msg);
        }

        // The automation advances even when nothing is connected upstream
        let start = ctx.time();
        let dt = ctx.frame_duration();
        let mut curve = [0.0f32; Buffer::LEN];
        for (i, g) in curve.iter_mut().enumerate() {
            *g = self.value_at(start + i as f64 * dt);
        }

        let in_buffers = inputs.first().map(|i| i.buffers()).unwrap_or(&[]);

        for (ch, out_buffer) in outputs.iter_mut().enumerate() {
            // Get input for this channel, or last available channel
            match in_buffers.get(ch).or_else(|| in_buffers.last()) {
                Some(in_buffer) => {
                    for ((o, &x), &g) in out_buffer.iter_mut().zip(in_buffer.iter()).zip(curve.iter()) {
                        *o = x * g;
                    }
                }
                None => out_buffer.silence(),
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 1_000;

    fn ctx(frame: u64) -> ProcessContext {
        ProcessContext { sample_rate: RATE, buffer_size: Buffer::LEN, frame }
    }

    /// Sample the automation timeline once per frame.
    fn curve(gain: &mut Gain, messages: Vec<GainMessage>, frames: usize) -> Vec<f32> {
        for msg in messages {
            gain.push_event(msg);
        }
        (0..frames).map(|i| gain.value_at(i as f64 / RATE as f64)).collect()
    }

    #[test]
    fn holds_initial_value() {
        let mut gain = Gain::new(0.5);
        let out = curve(&mut gain, vec![], 64);
        assert!(out.iter().all(|s| *s == 0.5));
    }

    #[test]
    fn set_value_takes_effect_at_its_time() {
        let mut gain = Gain::new(0.25);
        // 10 frames in at 1 kHz
        let out = curve(&mut gain, vec![GainMessage::SetValueAtTime { value: 0.75, time: 0.010 }], 64);
        assert_eq!(out[9], 0.25);
        assert_eq!(out[10], 0.75);
    }

    #[test]
    fn exponential_ramp_hits_geometric_midpoint() {
        let mut gain = Gain::new(1.0);
        let messages = vec![
            GainMessage::SetValueAtTime { value: 1.0, time: 0.0 },
            GainMessage::ExponentialRampToValueAtTime { value: 0.01, time: 0.100 },
        ];
        let out = curve(&mut gain, messages, 192);

        // Halfway through the ramp the level is sqrt(v0 * v1)
        let midpoint = out[50];
        assert!((midpoint - 0.1).abs() < 1e-3, "midpoint was {midpoint}");

        // Monotonic decay that settles on the target, never below it
        assert!(out[..100].windows(2).all(|w| w[1] <= w[0]));
        assert!(out.iter().all(|s| *s >= 0.01 - 1e-6));
        assert_eq!(out[150], 0.01);
        assert_eq!(gain.pending_events(), 0);
    }

    #[test]
    fn zero_length_ramp_jumps() {
        let mut gain = Gain::new(0.8);
        let messages = vec![
            GainMessage::SetValueAtTime { value: 0.8, time: 0.0 },
            GainMessage::ExponentialRampToValueAtTime { value: 0.00001, time: 0.0 },
        ];
        let out = curve(&mut gain, messages, 64);
        assert!(out.iter().all(|s| *s == 0.00001));
    }

    #[test]
    fn ramp_from_zero_holds_then_jumps() {
        assert_eq!(exponential_ramp(0.0, 0.5, 0.5), 0.0);
        assert_eq!(exponential_ramp(0.5, 0.5, 0.3), 0.5);
    }

    #[test]
    fn out_of_order_events_are_clamped() {
        let mut gain = Gain::new(1.0);
        let out = curve(
            &mut gain,
            vec![
                GainMessage::SetValueAtTime { value: 0.5, time: 0.020 },
                GainMessage::SetValueAtTime { value: 0.25, time: 0.010 },
            ],
            64,
        );
        assert_eq!(out[15], 1.0);
        assert_eq!(out[20], 0.25);
    }

    #[test]
    fn unconnected_stage_outputs_silence() {
        let mut gain = Gain::new(1.0);
        let mut out = [Buffer::SILENT];
        out[0].iter_mut().for_each(|s| *s = 0.3);
        gain.process(&ctx(0), std::iter::empty(), &[], &mut out);
        assert!(out[0].iter().all(|s| *s == 0.0));
    }
}
