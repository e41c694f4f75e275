//! # teaser-encode
//!
//! Turns rendered frames into a video file. Frames are pushed one at a time
//! through a [`FrameSink`], so a render never holds the whole clip in memory.

pub mod ffmpeg;
pub mod sink;

pub use ffmpeg::{FfmpegEncoder, FfmpegSink};
pub use sink::{FrameSink, MemorySink, SinkFactory};
