use std::path::Path;

use teaser_core::{FrameBuffer, TeaserError, TeaserResult};

/// Destination for an ordered stream of rendered frames.
///
/// Callers write frames `0, 1, 2, ...` in order and call [`FrameSink::finish`]
/// exactly once after the last frame.
pub trait FrameSink: Send {
    fn write_frame(&mut self, index: u64, frame: &FrameBuffer) -> TeaserResult<()>;

    fn finish(&mut self) -> TeaserResult<()>;
}

/// Opens the sink a render job writes to, given the stream format and the
/// output file chosen for the job.
pub trait SinkFactory: Send + Sync {
    fn open_sink(&self, width: u32, height: u32, fps: u32, path: &Path) -> TeaserResult<Box<dyn FrameSink>>;
}

/// Keeps every frame in memory. Used for previews and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<FrameBuffer>,
    pub indices: Vec<u64>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, index: u64, frame: &FrameBuffer) -> TeaserResult<()> {
        if self.finished {
            return Err(TeaserError::Encode(format!(
                "frame {} written after finish",
                index
            )));
        }
        self.indices.push(index);
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> TeaserResult<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teaser_core::Color;

    #[test]
    fn test_memory_sink_records_in_order() {
        let mut sink = MemorySink::new();
        for i in 0..3 {
            sink.write_frame(i, &FrameBuffer::solid(2, 2, &Color::RED)).unwrap();
        }
        sink.finish().unwrap();
        assert_eq!(sink.indices, vec![0, 1, 2]);
        assert_eq!(sink.frames.len(), 3);
        assert!(sink.is_finished());
        assert!(sink.write_frame(3, &FrameBuffer::solid(2, 2, &Color::RED)).is_err());
    }
}
