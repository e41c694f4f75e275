use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use teaser_core::{EncoderConfig, FrameBuffer, TeaserError, TeaserResult};

use crate::sink::{FrameSink, SinkFactory};

/// Longest stderr excerpt quoted in an error.
const STDERR_TAIL_CHARS: usize = 2000;

/// Encoder that shells out to FFmpeg for H.264 encoding.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Check if the configured FFmpeg binary can be run.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Start an FFmpeg process writing `width`×`height` RGBA frames at `fps`
    /// into an H.264/MP4 file at `output_path`.
    pub fn open(&self, width: u32, height: u32, fps: u32, output_path: &Path) -> TeaserResult<FfmpegSink> {
        if width == 0 || height == 0 || fps == 0 {
            return Err(TeaserError::Encode(format!(
                "invalid stream format {}x{} @ {}fps",
                width, height, fps
            )));
        }
        // libx264 with yuv420p needs even dimensions.
        if width % 2 != 0 || height % 2 != 0 {
            return Err(TeaserError::Encode(format!(
                "H.264 output needs even dimensions, got {}x{}",
                width, height
            )));
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut cmd = Command::new(&self.config.ffmpeg_path);
        cmd.args(["-y", "-hide_banner", "-nostats", "-loglevel", "error"]);

        // Input: raw video frames from stdin
        cmd.args([
            "-f", "rawvideo",
            "-pixel_format", "rgba",
            "-video_size", &format!("{}x{}", width, height),
            "-framerate", &fps.to_string(),
            "-i", "-",
        ]);

        cmd.args([
            "-c:v", "libx264",
            "-pix_fmt", "yuv420p",
            "-preset", &self.config.preset,
            "-crf", &self.config.crf.to_string(),
            "-movflags", "+faststart",
        ]);

        cmd.arg(output_path);

        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TeaserError::Encode(format!(
                    "failed to start {}: {}. Install FFmpeg: https://ffmpeg.org/download.html",
                    self.config.ffmpeg_path, e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TeaserError::Encode("failed to open ffmpeg stdin".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| TeaserError::Encode("failed to open ffmpeg stderr".into()))?;
        // Drained concurrently: a full stderr pipe would block ffmpeg.
        let stderr_reader = std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        });

        tracing::debug!(
            path = %output_path.display(),
            width,
            height,
            fps,
            "ffmpeg started"
        );

        Ok(FfmpegSink {
            child: Some(child),
            stdin: Some(stdin),
            stderr_reader: Some(stderr_reader),
            width,
            height,
            fps,
            next_index: 0,
            output_path: output_path.to_path_buf(),
        })
    }
}

impl SinkFactory for FfmpegEncoder {
    fn open_sink(&self, width: u32, height: u32, fps: u32, path: &Path) -> TeaserResult<Box<dyn FrameSink>> {
        Ok(Box::new(self.open(width, height, fps, path)?))
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new(EncoderConfig::default())
    }
}

/// A running FFmpeg process fed through stdin.
///
/// Dropping an unfinished sink kills the process. The partially written file
/// is left where it is.
pub struct FfmpegSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_reader: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    fps: u32,
    next_index: u64,
    output_path: PathBuf,
}

impl FfmpegSink {
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn frames_written(&self) -> u64 {
        self.next_index
    }

    /// Close stdin, wait for the process and collect everything it printed.
    fn wait_for_exit(&mut self) -> TeaserResult<(ExitStatus, String)> {
        self.stdin = None;
        let mut child = self
            .child
            .take()
            .ok_or_else(|| TeaserError::Encode("ffmpeg already finished".into()))?;
        let status = child
            .wait()
            .map_err(|e| TeaserError::Encode(format!("ffmpeg process error: {}", e)))?;
        Ok((status, self.join_stderr()))
    }

    fn join_stderr(&mut self) -> String {
        self.stderr_reader
            .take()
            .and_then(|reader| reader.join().ok())
            .map(|text| stderr_tail(&text))
            .unwrap_or_default()
    }

    /// Wait for the process after a failed write and collect what it printed.
    fn collect_stderr(&mut self) -> String {
        match self.wait_for_exit() {
            Ok((_, stderr)) => stderr,
            Err(e) => e.to_string(),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, index: u64, frame: &FrameBuffer) -> TeaserResult<()> {
        if index != self.next_index {
            return Err(TeaserError::Encode(format!(
                "frame {} written out of order, expected {}",
                index, self.next_index
            )));
        }
        if frame.width != self.width || frame.height != self.height {
            return Err(TeaserError::Encode(format!(
                "frame {} has dimensions {}x{}, expected {}x{}",
                index, frame.width, frame.height, self.width, self.height
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| TeaserError::Encode("ffmpeg input already closed".into()))?;
        if let Err(e) = stdin.write_all(&frame.data) {
            let stderr = self.collect_stderr();
            return Err(TeaserError::Encode(format!(
                "failed to write frame {} to ffmpeg: {}. FFmpeg stderr: {}",
                index, e, stderr
            )));
        }
        self.next_index += 1;
        Ok(())
    }

    fn finish(&mut self) -> TeaserResult<()> {
        // Closing stdin signals end of input.
        let (status, stderr) = self.wait_for_exit()?;
        if !status.success() {
            return Err(TeaserError::Encode(format!(
                "ffmpeg failed with status {}: {}",
                status, stderr
            )));
        }

        tracing::info!(
            "Encoded {} frames to {} ({}x{} @ {}fps)",
            self.next_index,
            self.output_path.display(),
            self.width,
            self.height,
            self.fps
        );

        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.join_stderr();
    }
}

/// The last [`STDERR_TAIL_CHARS`] characters of `text`, trimmed.
fn stderr_tail(text: &str) -> String {
    let text = text.trim();
    let skip = text.chars().count().saturating_sub(STDERR_TAIL_CHARS);
    text.chars().skip(skip).collect()
}
