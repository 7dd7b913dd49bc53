//! Core data types shared between the backend workers and the UI

use serde::{Deserialize, Serialize};

/// Luminance-minimum threshold for signal presence classification.
///
/// FFmpeg's `signalstats` YMIN statistic sits near black level (high values)
/// when a device sees no active video. A value strictly below this threshold
/// classifies as "signal present"; the boundary value itself is no-signal.
pub const SIGNAL_THRESHOLD: f64 = 60.0;

/// Index of a CXADC capture device (`/dev/cxadc<N>`)
pub type DeviceId = u32;

/// Build the platform device path for a CXADC device index
pub fn device_path(device: DeviceId) -> String {
    format!("/dev/cxadc{}", device)
}

/// How a supervised process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// Process exited normally with the given code
    Code(i32),
    /// Process was killed by a signal or ended without an exit code
    Killed,
}

impl ExitKind {
    /// Whether the process exited normally with code 0
    pub fn success(&self) -> bool {
        matches!(self, ExitKind::Code(0))
    }

    /// Convert from a std exit status
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitKind::Code(code),
            None => ExitKind::Killed,
        }
    }
}

impl std::fmt::Display for ExitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitKind::Code(code) => write!(f, "exit code {}", code),
            ExitKind::Killed => write!(f, "killed"),
        }
    }
}

/// An immutable classified sample from the signal statistics stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    /// Device the sample was observed on
    pub device: DeviceId,
    /// Extracted luminance minimum
    pub ymin: f64,
    /// Classification against [`SIGNAL_THRESHOLD`]
    pub present: bool,
}

impl SignalSample {
    /// Classify a raw YMIN value for a device
    pub fn classify(device: DeviceId, ymin: f64) -> Self {
        Self {
            device,
            ymin,
            present: ymin < SIGNAL_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_below_threshold() {
        let sample = SignalSample::classify(0, 16.0);
        assert!(sample.present);
    }

    #[test]
    fn test_classification_boundary_is_no_signal() {
        // Strictly-less-than: the threshold itself is no-signal.
        let sample = SignalSample::classify(0, SIGNAL_THRESHOLD);
        assert!(!sample.present);
    }

    #[test]
    fn test_classification_above_threshold() {
        let sample = SignalSample::classify(1, 235.0);
        assert!(!sample.present);
        assert_eq!(sample.device, 1);
    }

    #[test]
    fn test_exit_kind_success() {
        assert!(ExitKind::Code(0).success());
        assert!(!ExitKind::Code(1).success());
        assert!(!ExitKind::Killed.success());
    }

    #[test]
    fn test_device_path() {
        assert_eq!(device_path(2), "/dev/cxadc2");
    }
}
