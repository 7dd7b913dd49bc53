//! Signal-presence line monitor
//!
//! The monitor application runs FFmpeg with the `signalstats` filter and
//! `metadata=print`, which emits one diagnostic line per analysed frame on
//! stderr:
//!
//! ```text
//! [Parsed_metadata_1 @ 0x55..] lavfi.signalstats.YMIN=16.000000
//! ```
//!
//! This module extracts the luminance minimum out of that stream and
//! classifies it against [`SIGNAL_THRESHOLD`](crate::types::SIGNAL_THRESHOLD).
//! The stream is diagnostic, not a control channel: lines without the marker
//! and malformed numbers are dropped silently, never surfaced as errors.

use crate::process::CommandSpec;
use crate::types::{device_path, DeviceId, SignalSample};
use regex::Regex;
use std::path::Path;

/// Marker substring a line must contain before extraction is attempted
const YMIN_MARKER: &str = "lavfi.signalstats.YMIN";

/// Parses YMIN values out of FFmpeg `signalstats` output lines
pub struct SignalLineParser {
    ymin_re: Regex,
}

impl SignalLineParser {
    pub fn new() -> Self {
        Self {
            // Field shape: YMIN=16.000000 (integer or decimal, '=' or ':')
            ymin_re: Regex::new(r"YMIN[=:]\s*(-?\d+(?:\.\d+)?)")
                .expect("YMIN pattern is a valid regex"),
        }
    }

    /// Extract the YMIN value from one output line
    ///
    /// Returns `None` for lines without the marker and for marker lines whose
    /// numeric field fails to parse (best-effort skip).
    pub fn extract(&self, line: &str) -> Option<f64> {
        if !line.contains(YMIN_MARKER) {
            return None;
        }
        self.ymin_re
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|field| field.as_str().parse().ok())
    }

    /// Extract and classify one line for a device
    pub fn sample(&self, device: DeviceId, line: &str) -> Option<SignalSample> {
        self.extract(line)
            .map(|ymin| SignalSample::classify(device, ymin))
    }
}

impl Default for SignalLineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the FFmpeg invocation that streams signal statistics for a device
///
/// Reads the raw 8-bit sample stream, runs `signalstats` and prints the frame
/// metadata, discarding the video itself. Runs until terminated.
pub fn stats_command(ffmpeg: &Path, device: DeviceId) -> CommandSpec {
    CommandSpec::new(ffmpeg)
        .args([
            "-hide_banner",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "gray",
            "-video_size",
            "2048x512",
            "-i",
        ])
        .arg(device_path(device))
        .args(["-vf", "signalstats,metadata=print", "-f", "null", "-"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SIGNAL_THRESHOLD;

    #[test]
    fn test_extract_typical_metadata_line() {
        let parser = SignalLineParser::new();
        let line = "[Parsed_metadata_1 @ 0x5576] lavfi.signalstats.YMIN=16.000000";
        assert_eq!(parser.extract(line), Some(16.0));
    }

    #[test]
    fn test_extract_integer_field() {
        let parser = SignalLineParser::new();
        assert_eq!(parser.extract("lavfi.signalstats.YMIN=235"), Some(235.0));
    }

    #[test]
    fn test_lines_without_marker_are_skipped() {
        let parser = SignalLineParser::new();
        // YMIN-like text without the full marker must not match.
        assert_eq!(parser.extract("frame=  100 fps= 25 YMIN=3"), None);
        assert_eq!(parser.extract("lavfi.signalstats.YMAX=235.000000"), None);
    }

    #[test]
    fn test_malformed_number_is_dropped_silently() {
        let parser = SignalLineParser::new();
        assert_eq!(parser.extract("lavfi.signalstats.YMIN=abc"), None);
        assert_eq!(parser.extract("lavfi.signalstats.YMIN="), None);
    }

    #[test]
    fn test_sample_classification() {
        let parser = SignalLineParser::new();

        let present = parser
            .sample(0, "lavfi.signalstats.YMIN=16.000000")
            .expect("marker line should parse");
        assert!(present.present);

        let absent = parser
            .sample(0, "lavfi.signalstats.YMIN=200.000000")
            .expect("marker line should parse");
        assert!(!absent.present);
    }

    #[test]
    fn test_sample_boundary_value_is_no_signal() {
        let parser = SignalLineParser::new();
        let line = format!("lavfi.signalstats.YMIN={:.6}", SIGNAL_THRESHOLD);
        let sample = parser.sample(3, &line).expect("marker line should parse");
        assert!(!sample.present);
        assert_eq!(sample.ymin, SIGNAL_THRESHOLD);
    }

    #[test]
    fn test_stats_command_targets_device() {
        let spec = stats_command(Path::new("/usr/bin/ffmpeg"), 1);
        assert!(spec.args.iter().any(|a| a == "/dev/cxadc1"));
        assert!(spec.args.iter().any(|a| a.contains("signalstats")));
    }
}
