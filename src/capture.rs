//! RF capture and preview command construction
//!
//! Recording dumps the raw 8-bit sample stream from a CXADC device into a
//! file via FFmpeg; previewing hands the device to mpv interpreted as raw
//! video. Both run as supervised processes; this module only builds the
//! invocations.

use crate::process::CommandSpec;
use crate::types::{device_path, DeviceId};
use std::path::Path;

/// Default file name for a new capture, timestamped to avoid clobbering
pub fn default_output_name() -> String {
    format!("cxadc_{}.u8", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

/// Build the FFmpeg invocation that records a device's raw sample stream
///
/// `-y` is deliberate: the GUI confirms overwrites before spawning.
pub fn record_command(ffmpeg: &Path, device: DeviceId, output: &Path) -> CommandSpec {
    CommandSpec::new(ffmpeg)
        .args(["-hide_banner", "-y", "-f", "u8", "-i"])
        .arg(device_path(device))
        .args(["-c", "copy", "-f", "u8"])
        .arg(output.display().to_string())
}

/// Build the mpv invocation that previews a device as raw video
pub fn preview_command(mpv: &Path, device: DeviceId) -> CommandSpec {
    CommandSpec::new(mpv)
        .args([
            "--demuxer=rawvideo",
            "--demuxer-rawvideo-format=gray",
            "--demuxer-rawvideo-w=2048",
            "--demuxer-rawvideo-h=512",
        ])
        .arg(device_path(device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_output_name_shape() {
        let name = default_output_name();
        assert!(name.starts_with("cxadc_"));
        assert!(name.ends_with(".u8"));
    }

    #[test]
    fn test_record_command_targets_device_and_output() {
        let out = PathBuf::from("/captures/tape1.u8");
        let spec = record_command(Path::new("ffmpeg"), 0, &out);
        assert!(spec.args.iter().any(|a| a == "/dev/cxadc0"));
        assert!(spec.args.iter().any(|a| a == "/captures/tape1.u8"));
    }

    #[test]
    fn test_preview_command_uses_raw_demuxer() {
        let spec = preview_command(Path::new("mpv"), 2);
        assert!(spec.args.iter().any(|a| a == "/dev/cxadc2"));
        assert!(spec.args.iter().any(|a| a.contains("rawvideo")));
    }
}
