//! Analysis tap for visualizing the output bus

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use dasp_graph::{Buffer, Input};

use crate::node::{AudioNode, ProcessContext};

/// Samples shared between a tap and its reader.
///
/// The tap always overwrites the oldest samples, so a reader that falls behind
/// still sees the newest audio.
struct ScopeRing {
    /// f32 bit patterns; the length is a power of two
    samples: Box<[AtomicU32]>,
    /// Total samples written since creation
    written: AtomicU64,
}

impl ScopeRing {
    fn new(capacity: usize) -> Self {
        Self {
            samples: (0..capacity).map(|_| AtomicU32::new(0)).collect(),
            written: AtomicU64::new(0),
        }
    }

    #[inline]
    fn slot(&self, index: u64) -> &AtomicU32 {
        &self.samples[index as usize & (self.samples.len() - 1)]
    }
}

/// A pass-through node that copies the first channel of its input for a
/// [`Scope`] to read on another cadence.
///
/// Audio is forwarded unchanged. Recording never blocks and never waits for
/// the reader.
pub struct ScopeTap {
    ring: Arc<ScopeRing>,
    channels: usize,
}

/// Reading side of a [`ScopeTap`]: the most recent `window` samples.
pub struct Scope {
    ring: Arc<ScopeRing>,
    window: usize,
}

impl ScopeTap {
    /// Create a tap and its reader. `window` is the snapshot length in samples.
    pub fn new(channels: usize, window: usize) -> (Self, Scope) {
        let window = window.max(Buffer::LEN);
        // Twice the window: a block written during a snapshot lands outside it
        let ring = Arc::new(ScopeRing::new((window * 2).next_power_of_two()));

        let tap = Self {
            ring: ring.clone(),
            channels: channels.max(1),
        };
        let scope = Scope { ring, window };
        (tap, scope)
    }

    fn record(&self, block: &[f32]) {
        let start = self.ring.written.load(Ordering::Relaxed);
        for (i, sample) in block.iter().enumerate() {
            self.ring
                .slot(start.wrapping_add(i as u64))
                .store(sample.to_bits(), Ordering::Relaxed);
        }
        self.ring
            .written
            .store(start.wrapping_add(block.len() as u64), Ordering::Release);
    }
}

impl AudioNode for ScopeTap {
    type Message = ();

    fn process(
        &mut self,
        _ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        let in_buffers = inputs.first().map(|i| i.buffers()).unwrap_or(&[]);

        for (ch, out_buffer) in outputs.iter_mut().enumerate() {
            match in_buffers.get(ch).or_else(|| in_buffers.last()) {
                Some(in_buffer) => out_buffer.copy_from_slice(in_buffer),
                None => out_buffer.silence(),
            }
        }

        if let Some(first) = outputs.first() {
            self.record(first);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { self.channels }
}

impl Scope {
    /// The latest window, oldest sample first.
    ///
    /// Before the tap has produced a full window the missing head is zeros.
    pub fn snapshot(&self) -> Vec<f32> {
        let end = self.ring.written.load(Ordering::Acquire);
        let start = end.wrapping_sub(self.window as u64);
        (0..self.window as u64)
            .map(|i| f32::from_bits(self.ring.slot(start.wrapping_add(i)).load(Ordering::Relaxed)))
            .collect()
    }

    /// Snapshot length in samples
    pub fn window(&self) -> usize {
        self.window
    }

    /// Peak absolute amplitude of the latest window
    pub fn peak(&self) -> f32 {
        self.snapshot().iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_keeps_latest_window_in_order() {
        let (tap, scope) = ScopeTap::new(1, 64);
        let ramp: Vec<f32> = (0..100).map(|i| i as f32).collect();
        tap.record(&ramp);

        let snap = scope.snapshot();
        assert_eq!(snap.len(), 64);
        assert_eq!(snap[0], 36.0);
        assert_eq!(snap[63], 99.0);
    }

    #[test]
    fn partial_window_is_zero_padded() {
        let (tap, scope) = ScopeTap::new(1, 64);
        tap.record(&[0.5; 10]);

        let snap = scope.snapshot();
        assert!(snap[..54].iter().all(|s| *s == 0.0));
        assert!(snap[54..].iter().all(|s| *s == 0.5));
        assert_eq!(scope.peak(), 0.5);
    }

    #[test]
    fn lagging_reader_sees_newest_audio() {
        let (tap, scope) = ScopeTap::new(1, 256);
        let loud = [1.0; Buffer::LEN];
        let quiet = [0.0; Buffer::LEN];

        // far more than the ring holds, with no reads in between
        for _ in 0..100 {
            tap.record(&loud);
        }
        for _ in 0..100 {
            tap.record(&quiet);
        }
        assert_eq!(scope.peak(), 0.0);

        tap.record(&loud);
        let snap = scope.snapshot();
        assert!(snap[..256 - Buffer::LEN].iter().all(|s| *s == 0.0));
        assert!(snap[256 - Buffer::LEN..].iter().all(|s| *s == 1.0));
    }
}
