//! Tone descriptors and their lookup keys

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::nodes::Waveform;

/// Level a fading voice ramps down to instead of zero.
///
/// An exponential ramp can't reach zero, and stopping at a level this low is
/// inaudible.
pub const FADE_FLOOR: f32 = 0.00001;

/// One tone that should be sounding.
///
/// Two descriptors are the same tone iff every field is equal; see [`ToneKey`].
///
/// On the wire it is a JSON object with camelCase fields:
///
/// ```
/// use tonepool::{ToneDescriptor, nodes::Waveform};
///
/// let tone: ToneDescriptor = serde_json::from_str(
///     r#"{"shape":"triangle","frequency":220,"octave":1,"volume":40,"fadeOutPeriod":0.5}"#,
/// ).unwrap();
///
/// assert_eq!(tone.shape, Waveform::Triangle);
/// assert_eq!(tone.sounding_frequency(), 440.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToneDescriptor {
    pub shape: Waveform,
    /// Base frequency in Hz, before the octave shift
    pub frequency: f64,
    /// Octave shift; the tone sounds at `frequency * 2^octave`
    #[serde(default)]
    pub octave: i32,
    /// Percent of full scale, `0..=100`
    pub volume: f64,
    /// Seconds the tone takes to die away once it is no longer wanted
    pub fade_out_period: f64,
}

/// Why a descriptor can't be turned into a voice.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum DescriptorError {
    #[error("frequency must be a positive number of hertz, got {0}")]
    NonPositiveFrequency(f64),

    #[error("frequency {frequency} Hz shifted by {octave} octaves is out of range")]
    FrequencyOutOfRange { frequency: f64, octave: i32 },

    #[error("volume must be within 0..=100, got {0}")]
    VolumeOutOfRange(f64),

    #[error("fade-out period must be a non-negative number of seconds, got {0}")]
    NegativeFadeOut(f64),
}

impl ToneDescriptor {
    pub fn new(shape: Waveform, frequency: f64, volume: f64, fade_out_period: f64) -> Self {
        Self {
            shape,
            frequency,
            octave: 0,
            volume,
            fade_out_period,
        }
    }

    pub fn with_octave(mut self, octave: i32) -> Self {
        self.octave = octave;
        self
    }

    /// Frequency the generator runs at, in Hz.
    pub fn sounding_frequency(&self) -> f64 {
        self.frequency * 2f64.powi(self.octave)
    }

    /// Gain stage level, `0.0..=1.0`.
    pub fn level(&self) -> f32 {
        (self.volume / 100.0) as f32
    }

    /// Check that the descriptor can drive a generator and a gain stage.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(DescriptorError::NonPositiveFrequency(self.frequency));
        }
        let sounding = self.sounding_frequency();
        if !(sounding.is_finite() && sounding > 0.0 && sounding <= f32::MAX as f64) {
            return Err(DescriptorError::FrequencyOutOfRange {
                frequency: self.frequency,
                octave: self.octave,
            });
        }
        if !(0.0..=100.0).contains(&self.volume) {
            return Err(DescriptorError::VolumeOutOfRange(self.volume));
        }
        if !(self.fade_out_period.is_finite() && self.fade_out_period >= 0.0) {
            return Err(DescriptorError::NegativeFadeOut(self.fade_out_period));
        }
        Ok(())
    }

    /// The identity of this tone, if it is valid.
    pub fn key(&self) -> Result<ToneKey, DescriptorError> {
        self.validate()?;
        Ok(ToneKey {
            shape: self.shape,
            frequency: canonical_bits(self.frequency),
            octave: self.octave,
            volume: canonical_bits(self.volume),
            fade_out_period: canonical_bits(self.fade_out_period),
        })
    }
}

/// `-0.0` and `0.0` compare equal, so they must share a key.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// Hashable identity of a [`ToneDescriptor`]: every field, in a fixed order.
///
/// Equal descriptors produce equal keys and, since NaN never passes
/// validation, distinct descriptors produce distinct keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToneKey {
    shape: Waveform,
    frequency: u64,
    octave: i32,
    volume: u64,
    fade_out_period: u64,
}

impl fmt::Display for ToneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.shape.name(),
            f64::from_bits(self.frequency),
            self.octave,
            f64::from_bits(self.volume),
            f64::from_bits(self.fade_out_period),
        )
    }
}
