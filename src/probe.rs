//! CXADC device probing
//!
//! Capture devices appear as `/dev/cxadc0..N`. Whether a device is usable is
//! decided heuristically: run a ~100ms diagnostic FFmpeg read against the
//! device path and look for a "not found" style complaint in the output. A
//! device held by another process may be misclassified; this is a
//! best-effort capability check, not a guarantee.

use crate::error::Result;
use crate::process::{self, CommandSpec, ProcessEvent};
use crate::types::{device_path, DeviceId};
use std::path::Path;
use std::time::Duration;

/// Highest number of candidate devices a probe will consider
pub const DEFAULT_MAX_DEVICES: u32 = 4;

/// Diagnostic capture duration passed to FFmpeg
const PROBE_CAPTURE_SECS: &str = "0.1";

/// Bound on the total wait per device (capture time plus process overhead)
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Error markers FFmpeg emits for an absent device
const ABSENT_MARKERS: &[&str] = &["No such file or directory", "No such device", "not found"];

/// Classify a device's presence from the diagnostic invocation's output
///
/// Present unless any line carries a "not found" style message.
pub fn classify_output(lines: &[String]) -> bool {
    !lines
        .iter()
        .any(|line| ABSENT_MARKERS.iter().any(|marker| line.contains(marker)))
}

/// Build the short diagnostic FFmpeg invocation for one device
pub fn probe_command(ffmpeg: &Path, device: DeviceId) -> CommandSpec {
    CommandSpec::new(ffmpeg)
        .args(["-hide_banner", "-f", "u8", "-i"])
        .arg(device_path(device))
        .args(["-t", PROBE_CAPTURE_SECS, "-f", "null", "-"])
}

/// Probe candidate devices 0..`max_devices`, returning the present indices
/// in order
///
/// Each candidate gets one short supervised FFmpeg run; a run that exceeds
/// the per-device bound is terminated and the device counted absent.
pub fn probe(ffmpeg: &Path, max_devices: u32) -> Result<Vec<DeviceId>> {
    let mut present = Vec::new();
    for device in 0..max_devices {
        if probe_one(ffmpeg, device)? {
            present.push(device);
        }
    }
    tracing::info!("Probe found {} device(s): {:?}", present.len(), present);
    Ok(present)
}

/// Run the diagnostic invocation for a single device and classify it
fn probe_one(ffmpeg: &Path, device: DeviceId) -> Result<bool> {
    let handle = process::spawn(&probe_command(ffmpeg, device))?;

    if handle.wait_timeout(PROBE_TIMEOUT).is_none() {
        tracing::warn!("Probe of device {} timed out, terminating", device);
        if let Err(e) = handle.terminate() {
            tracing::warn!("Failed to terminate probe process: {}", e);
        }
        return Ok(false);
    }

    let lines: Vec<String> = handle
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            ProcessEvent::Line(line) => Some(line),
            ProcessEvent::Exited(_) => None,
        })
        .collect();

    let found = classify_output(&lines);
    tracing::debug!(device, found, "probe result");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_on_not_found_marker() {
        let lines = vec![
            "ffmpeg version 6.0".to_string(),
            "/dev/cxadc2: No such file or directory".to_string(),
        ];
        assert!(!classify_output(&lines));
    }

    #[test]
    fn test_absent_on_no_such_device() {
        let lines = vec!["[u8 @ 0x55] /dev/cxadc1: No such device".to_string()];
        assert!(!classify_output(&lines));
    }

    #[test]
    fn test_present_on_normal_diagnostics() {
        let lines = vec![
            "Input #0, u8, from '/dev/cxadc0':".to_string(),
            "size=    2816KiB time=00:00:00.10 bitrate=230686.1kbits/s".to_string(),
        ];
        assert!(classify_output(&lines));
    }

    #[test]
    fn test_present_on_empty_output() {
        assert!(classify_output(&[]));
    }

    #[test]
    fn test_probe_command_shape() {
        let spec = probe_command(Path::new("ffmpeg"), 3);
        assert!(spec.args.iter().any(|a| a == "/dev/cxadc3"));
        assert!(spec.args.windows(2).any(|w| w[0] == "-t" && w[1] == "0.1"));
    }
}
