use serde::{Deserialize, Serialize};
use std::fmt;

/// A span of video time, in seconds.
///
/// Serialized as a bare number of seconds so choreography files read
/// naturally (`"duration": 0.35`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration {
    seconds: f64,
}

impl Duration {
    /// Negative and NaN inputs become zero.
    pub fn from_seconds(seconds: f64) -> Self {
        Self {
            seconds: if seconds > 0.0 { seconds } else { 0.0 },
        }
    }

    pub fn from_frames(frames: u64, fps: f64) -> Self {
        Self::from_seconds(frames as f64 / fps)
    }

    pub fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Fractional frame count at `fps`. Animation windows keep sub-frame
    /// precision: 0.35 s at 30 fps is 10.5 frames.
    pub fn as_frames(&self, fps: f64) -> f64 {
        self.seconds * fps
    }

    /// Nearest whole frame at `fps`, used where an event must land on a frame.
    pub fn to_frame_offset(&self, fps: f64) -> u64 {
        self.as_frames(fps).round() as u64
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)
    }
}
