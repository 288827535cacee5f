//! Line-delimited JSON ports between a front end and a session
//!
//! Inbound, each line is a full snapshot of the tones that should be sounding:
//!
//! ```text
//! [{"shape":"sine","frequency":440,"octave":0,"volume":50,"fadeOutPeriod":0.5}]
//! ```
//!
//! Outbound, the session writes one [`Capabilities`] line at startup and then a
//! [`ScopeFrame`] line per display tick.

use serde::Serialize;
use thiserror::Error;

use crate::voice::ToneDescriptor;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("malformed tone snapshot: {0}")]
    Snapshot(#[source] serde_json::Error),

    #[error("failed to encode outbound message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decode one inbound snapshot line.
///
/// A blank line is the empty snapshot. Unknown shapes and missing fields are
/// rejected here, before anything reaches the voice pool.
pub fn parse_snapshot(line: &str) -> Result<Vec<ToneDescriptor>, PortError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(line).map_err(PortError::Snapshot)
}

/// Announced once, before any scope frames.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub audio_supported: bool,
}

/// A window of recent output-bus samples, oldest first.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScopeFrame {
    pub samples: Vec<f32>,
}

/// Encode an outbound message as a single JSON line, without the newline.
pub fn to_json_line<T: Serialize>(message: &T) -> Result<String, PortError> {
    serde_json::to_string(message).map_err(PortError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Waveform;

    #[test]
    fn parses_a_snapshot() {
        let tones = parse_snapshot(
            r#"[{"shape":"sine","frequency":440,"octave":0,"volume":50,"fadeOutPeriod":0.5},
                {"shape":"sawtooth","frequency":110,"volume":20,"fadeOutPeriod":2}]"#,
        )
        .unwrap();

        assert_eq!(tones.len(), 2);
        assert_eq!(tones[0], ToneDescriptor::new(Waveform::Sine, 440.0, 50.0, 0.5));
        assert_eq!(tones[1].shape, Waveform::Sawtooth);
        assert_eq!(tones[1].octave, 0);
    }

    #[test]
    fn blank_lines_and_empty_arrays_are_empty_snapshots() {
        assert!(parse_snapshot("").unwrap().is_empty());
        assert!(parse_snapshot("  \r").unwrap().is_empty());
        assert!(parse_snapshot("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_shapes() {
        let err = parse_snapshot(
            r#"[{"shape":"noise","frequency":440,"volume":50,"fadeOutPeriod":0.5}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, PortError::Snapshot(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_snapshot("[{").is_err());
        // a single object is not a snapshot
        assert!(parse_snapshot(
            r#"{"shape":"sine","frequency":440,"volume":50,"fadeOutPeriod":0.5}"#
        )
        .is_err());
        assert!(parse_snapshot(r#"[{"shape":"sine","frequency":440}]"#).is_err());
    }

    #[test]
    fn encodes_outbound_lines() {
        let line = to_json_line(&Capabilities { audio_supported: true }).unwrap();
        assert_eq!(line, r#"{"audioSupported":true}"#);

        let line = to_json_line(&ScopeFrame { samples: vec![0.0, 0.5, -1.0] }).unwrap();
        assert_eq!(line, r#"{"samples":[0.0,0.5,-1.0]}"#);
    }
}
