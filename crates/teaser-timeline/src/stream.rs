//! Character-by-character text reveal.

/// Half-period of the caret blink while text is still streaming.
pub const CARET_BLINK_SECS: f64 = 0.5;

/// The revealed part of a streamed string at one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamedText<'a> {
    /// Revealed prefix, always ending on a char boundary.
    pub prefix: &'a str,
    /// Number of revealed characters.
    pub visible: usize,
    /// Total characters in the full text.
    pub total: usize,
}

impl StreamedText<'_> {
    /// True while characters remain to be revealed.
    pub fn is_streaming(&self) -> bool {
        self.visible < self.total
    }
}

/// Number of characters visible at `frame` for a stream starting at `start_frame`.
///
/// `floor(elapsed_frames * chars_per_second / fps)`, clamped to `total`.
/// A non-positive or non-finite rate reveals the whole text at once.
pub fn visible_chars(frame: u64, start_frame: u64, total: usize, chars_per_second: f64, fps: f64) -> usize {
    if !(chars_per_second.is_finite() && chars_per_second > 0.0) || fps <= 0.0 {
        return total;
    }
    let elapsed = frame.saturating_sub(start_frame) as f64;
    // Multiply before dividing so whole-frame boundaries land exactly.
    let revealed = (elapsed * chars_per_second / fps + 1e-9).floor();
    if revealed >= total as f64 {
        total
    } else {
        revealed as usize
    }
}

/// The prefix of `full_text` revealed at `frame`.
pub fn streamed_prefix(
    frame: u64,
    start_frame: u64,
    full_text: &str,
    chars_per_second: f64,
    fps: f64,
) -> StreamedText<'_> {
    let total = full_text.chars().count();
    let visible = visible_chars(frame, start_frame, total, chars_per_second, fps);
    let end = full_text
        .char_indices()
        .nth(visible)
        .map_or(full_text.len(), |(idx, _)| idx);
    StreamedText {
        prefix: &full_text[..end],
        visible,
        total,
    }
}

/// Frames after the start frame until a text of `total` characters is fully revealed.
pub fn frames_to_complete(total: usize, chars_per_second: f64, fps: f64) -> u64 {
    if !(chars_per_second.is_finite() && chars_per_second > 0.0) {
        return 0;
    }
    (total as f64 / chars_per_second * fps - 1e-9).ceil().max(0.0) as u64
}

/// Whether the blinking caret is lit at `frame`.
pub fn caret_visible(frame: u64, fps: f64) -> bool {
    let half_period = (fps * CARET_BLINK_SECS).max(1.0);
    ((frame as f64 / half_period).floor() as u64) % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_before_start() {
        for frame in 0..=36 {
            let s = streamed_prefix(frame, 36, "Discover more.", 18.0, 30.0);
            assert_eq!(s.prefix, "");
            assert_eq!(s.visible, 0);
            assert!(s.is_streaming());
        }
    }

    #[test]
    fn test_reveal_rate() {
        // 18 cps at 30 fps = 0.6 chars per frame.
        let s = streamed_prefix(5, 0, "Hello world", 18.0, 30.0);
        assert_eq!(s.visible, 3);
        assert_eq!(s.prefix, "Hel");
    }

    #[test]
    fn test_monotone_and_terminal() {
        let text = "Stream me slowly, please.";
        let total = text.chars().count();
        let start = 12;
        let done_at = start + frames_to_complete(total, 18.0, 30.0);
        let mut prev = 0;
        for frame in 0..400 {
            let s = streamed_prefix(frame, start, text, 18.0, 30.0);
            assert!(s.visible >= prev, "regressed at frame {}", frame);
            if frame >= done_at {
                assert_eq!(s.visible, total);
                assert_eq!(s.prefix, text);
                assert!(!s.is_streaming());
            }
            prev = s.visible;
        }
    }

    #[test]
    fn test_terminal_bound_is_tight() {
        // "Acme": 4 chars ÷ 18 cps × 30 fps = 6.67 → 7 frames.
        assert_eq!(frames_to_complete(4, 18.0, 30.0), 7);
        assert_eq!(streamed_prefix(6, 0, "Acme", 18.0, 30.0).visible, 3);
        assert_eq!(streamed_prefix(7, 0, "Acme", 18.0, 30.0).visible, 4);
        // Exact division: 3 chars take exactly 5 frames.
        assert_eq!(frames_to_complete(3, 18.0, 30.0), 5);
        assert_eq!(streamed_prefix(5, 0, "abc", 18.0, 30.0).visible, 3);
    }

    #[test]
    fn test_multibyte_prefix_on_char_boundary() {
        let s = streamed_prefix(5, 0, "héllo wörld", 18.0, 30.0);
        assert_eq!(s.prefix, "hél");
        assert_eq!(s.total, 11);
    }

    #[test]
    fn test_empty_text_is_complete() {
        let s = streamed_prefix(0, 0, "", 18.0, 30.0);
        assert_eq!(s.prefix, "");
        assert!(!s.is_streaming());
    }

    #[test]
    fn test_non_positive_rate_reveals_everything() {
        let s = streamed_prefix(0, 10, "Acme", 0.0, 30.0);
        assert_eq!(s.prefix, "Acme");
        assert_eq!(frames_to_complete(4, 0.0, 30.0), 0);
    }

    #[test]
    fn test_caret_blinks_half_second() {
        assert!(caret_visible(0, 30.0));
        assert!(caret_visible(14, 30.0));
        assert!(!caret_visible(15, 30.0));
        assert!(!caret_visible(29, 30.0));
        assert!(caret_visible(30, 30.0));
    }
}
