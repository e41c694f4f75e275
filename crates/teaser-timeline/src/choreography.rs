//! Scene choreography: per-element animation recipes evaluated per frame.
//!
//! A [`Choreography`] is plain data. The three built-in presets (`classic`,
//! `streamed` and `two-scene`) are values of the same type, and a
//! [`SceneChoreographer`] turns any of them into a [`VisualState`] for a
//! given frame.

use serde::{Deserialize, Serialize};
use teaser_core::{Duration, Easing, TeaserError, TeaserResult};

use crate::composition::{CompositionSpec, InputProps};
use crate::interpolate::{interpolate, AnimationRange};
use crate::stream::{caret_visible, frames_to_complete, streamed_prefix};

/// Reference point a [`Trigger`] is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    #[default]
    CompositionStart,
    /// End of the first scene. Equal to the composition start in a single-scene layout.
    SceneBoundary,
    /// The title's trigger frame. Not valid for the title itself.
    Title,
}

/// When an element's animations begin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Trigger {
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default)]
    pub offset: Duration,
}

impl Trigger {
    pub fn at_start(offset_secs: f64) -> Self {
        Self {
            anchor: Anchor::CompositionStart,
            offset: Duration::from_seconds(offset_secs),
        }
    }

    pub fn after_boundary(offset_secs: f64) -> Self {
        Self {
            anchor: Anchor::SceneBoundary,
            offset: Duration::from_seconds(offset_secs),
        }
    }

    pub fn after_title(offset_secs: f64) -> Self {
        Self {
            anchor: Anchor::Title,
            offset: Duration::from_seconds(offset_secs),
        }
    }

    /// Trigger frame, rounded to a whole frame. `title_frame` is only read
    /// for [`Anchor::Title`].
    pub fn resolve(&self, boundary_frame: u64, title_frame: u64, fps: f64) -> u64 {
        let base = match self.anchor {
            Anchor::CompositionStart => 0,
            Anchor::SceneBoundary => boundary_frame,
            Anchor::Title => title_frame,
        };
        base + self.offset.to_frame_offset(fps)
    }
}

/// One animated property, relative to its element's trigger frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub delay: Duration,
    pub duration: Duration,
    pub from: f64,
    pub to: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl Track {
    pub fn new(duration_secs: f64, from: f64, to: f64) -> Self {
        Self {
            delay: Duration::zero(),
            duration: Duration::from_seconds(duration_secs),
            from,
            to,
            easing: Easing::Linear,
        }
    }

    pub fn with_delay(mut self, secs: f64) -> Self {
        self.delay = Duration::from_seconds(secs);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// The clamped range this track covers when its element starts at `start_frame`.
    ///
    /// Delays and durations keep fractional frames; only the trigger is whole.
    pub fn range(&self, start_frame: u64, fps: f64) -> AnimationRange {
        let a = start_frame as f64 + self.delay.as_frames(fps);
        let b = a + self.duration.as_frames(fps);
        AnimationRange::new([a, b], [self.from, self.to]).with_easing(self.easing)
    }

    pub fn value_at(&self, frame: u64, start_frame: u64, fps: f64) -> f64 {
        interpolate(frame as f64, &self.range(start_frame, fps))
    }

    /// Fractional frame at which the track reaches `to`.
    pub fn end_frame(&self, start_frame: u64, fps: f64) -> f64 {
        self.range(start_frame, fps).input[1]
    }
}

/// Animation recipe for one on-screen element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecipe {
    #[serde(default)]
    pub trigger: Trigger,
    pub opacity: Track,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Track>,
    /// Characters per second for streamed text. `None` shows the full text at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_cps: Option<f64>,
}

impl ElementRecipe {
    pub fn fade(trigger: Trigger, opacity: Track) -> Self {
        Self {
            trigger,
            opacity,
            offset_x: None,
            offset_y: None,
            scale: None,
            stream_cps: None,
        }
    }

    pub fn with_offset_x(mut self, track: Track) -> Self {
        self.offset_x = Some(track);
        self
    }

    pub fn with_offset_y(mut self, track: Track) -> Self {
        self.offset_y = Some(track);
        self
    }

    pub fn with_scale(mut self, track: Track) -> Self {
        self.scale = Some(track);
        self
    }

    pub fn streamed(mut self, cps: f64) -> Self {
        self.stream_cps = Some(cps);
        self
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        std::iter::once(&self.opacity)
            .chain(self.offset_x.iter())
            .chain(self.offset_y.iter())
            .chain(self.scale.iter())
    }

    /// Frame after which none of this element's tracks change.
    fn tracks_settled(&self, start_frame: u64, fps: f64) -> f64 {
        self.tracks()
            .map(|t| t.end_frame(start_frame, fps))
            .fold(start_frame as f64, f64::max)
    }
}

/// How the composition is split into scenes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SceneLayout {
    #[default]
    SingleScene,
    /// Text alone first, then the image joins at `first_scene`.
    TwoScene { first_scene: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSizes {
    pub title: f64,
    pub description: f64,
}

impl FontSizes {
    pub const STANDARD: FontSizes = FontSizes {
        title: 56.0,
        description: 28.0,
    };

    pub const HERO: FontSizes = FontSizes {
        title: 80.0,
        description: 32.0,
    };
}

impl Default for FontSizes {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Font-size change from `hero` to the standard sizes, starting at the scene boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontTransition {
    pub hero: FontSizes,
    pub window: Duration,
    #[serde(default)]
    pub easing: Easing,
}

/// A complete, data-driven animation plan for the teaser cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choreography {
    pub name: String,
    #[serde(default)]
    pub layout: SceneLayout,
    pub image: ElementRecipe,
    pub title: ElementRecipe,
    pub description: ElementRecipe,
    #[serde(default)]
    pub standard_fonts: FontSizes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_transition: Option<FontTransition>,
    /// Length of the global fade to transparent at the end of the composition.
    pub end_fade: Duration,
}

impl Choreography {
    pub const PRESETS: [&'static str; 3] = ["classic", "streamed", "two-scene"];

    /// Everything fades in together; nothing streams.
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            layout: SceneLayout::SingleScene,
            image: ElementRecipe::fade(Trigger::at_start(0.0), Track::new(1.0, 0.0, 1.0))
                .with_scale(Track::new(0.8, 0.92, 1.0)),
            title: ElementRecipe::fade(Trigger::at_start(0.0), Track::new(1.0, 0.0, 1.0))
                .with_offset_y(Track::new(1.0, 30.0, 0.0).with_delay(0.5)),
            description: ElementRecipe::fade(
                Trigger::at_start(0.0),
                Track::new(0.8, 0.0, 1.0).with_delay(1.2),
            ),
            standard_fonts: FontSizes::STANDARD,
            font_transition: None,
            end_fade: Duration::from_seconds(1.5),
        }
    }

    /// Single scene with streamed title and description.
    pub fn streamed() -> Self {
        Self {
            name: "streamed".to_string(),
            layout: SceneLayout::SingleScene,
            image: image_entrance(Trigger::at_start(0.0), 0.5, 0.7, 0.9, 0.8),
            title: ElementRecipe::fade(Trigger::at_start(0.0), Track::new(0.3, 0.0, 1.0))
                .with_offset_x(Track::new(0.4, 60.0, 0.0).with_easing(Easing::EaseOutCubic))
                .streamed(18.0),
            description: ElementRecipe::fade(Trigger::after_title(1.2), Track::new(0.3, 0.0, 1.0))
                .with_offset_y(Track::new(0.5, 40.0, 0.0).with_easing(Easing::EaseOutCubic))
                .streamed(18.0),
            standard_fonts: FontSizes::STANDARD,
            font_transition: None,
            end_fade: Duration::from_seconds(1.5),
        }
    }

    /// Hero-sized text first, then the image enters and the text shrinks.
    pub fn two_scene() -> Self {
        Self {
            name: "two-scene".to_string(),
            layout: SceneLayout::TwoScene {
                first_scene: Duration::from_seconds(3.0),
            },
            image: image_entrance(Trigger::after_boundary(0.0), 0.4, 0.6, 0.88, 0.6),
            title: ElementRecipe::fade(Trigger::at_start(0.5), Track::new(0.25, 0.0, 1.0))
                .with_offset_x(Track::new(0.4, 40.0, 0.0).with_easing(Easing::EaseOutCubic))
                .streamed(18.0),
            description: ElementRecipe::fade(Trigger::after_title(1.2), Track::new(0.3, 0.0, 1.0))
                .with_offset_y(Track::new(0.4, 30.0, 0.0).with_easing(Easing::EaseOutCubic))
                .streamed(18.0),
            standard_fonts: FontSizes::STANDARD,
            font_transition: Some(FontTransition {
                hero: FontSizes::HERO,
                window: Duration::from_seconds(0.35),
                easing: Easing::EaseOutCubic,
            }),
            end_fade: Duration::from_seconds(1.5),
        }
    }

    pub fn from_preset(name: &str) -> TeaserResult<Self> {
        match name {
            "classic" => Ok(Self::classic()),
            "streamed" => Ok(Self::streamed()),
            "two-scene" => Ok(Self::two_scene()),
            other => Err(TeaserError::InvalidArgument(format!(
                "unknown choreography preset '{}', expected one of {}",
                other,
                Self::PRESETS.join(", ")
            ))),
        }
    }
}

impl Default for Choreography {
    fn default() -> Self {
        Self::streamed()
    }
}

fn image_entrance(trigger: Trigger, fade: f64, slide: f64, scale_from: f64, scale_secs: f64) -> ElementRecipe {
    ElementRecipe::fade(trigger, Track::new(fade, 0.0, 1.0))
        .with_offset_y(Track::new(slide, 80.0, 0.0).with_easing(Easing::EaseOutCubic))
        .with_scale(Track::new(scale_secs, scale_from, 1.0).with_easing(Easing::EaseOutQuart))
}

/// A half-open frame interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SceneSpan {
    pub index: usize,
    pub start: u64,
    pub end: u64,
}

impl SceneSpan {
    pub fn contains(&self, frame: u64) -> bool {
        frame >= self.start && frame < self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// Some entrance track or text stream is still running.
    Reveal,
    Hold,
    FadeOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageState {
    pub opacity: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    /// Share of the layout reserved for the image card, 0 (absent) to 1.
    pub slot: f64,
    /// No image source; draw the placeholder box.
    pub placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextState {
    pub opacity: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub font_size: f64,
    pub revealed: String,
    pub total_chars: usize,
    /// Started and not yet fully revealed.
    pub streaming: bool,
    pub caret_visible: bool,
}

/// Everything the compositor needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualState {
    pub frame: u64,
    pub scene: usize,
    pub phase: Phase,
    /// Container opacity applied on top of every element.
    pub global_opacity: f64,
    pub image: ImageState,
    pub title: TextState,
    pub description: TextState,
}

/// Evaluates a [`Choreography`] for one composition and one set of props.
#[derive(Debug, Clone)]
pub struct SceneChoreographer {
    choreography: Choreography,
    props: InputProps,
    description: String,
    fps: f64,
    duration_in_frames: u64,
    boundary: u64,
    scenes: Vec<SceneSpan>,
    image_start: u64,
    title_start: u64,
    description_start: u64,
    end_fade: AnimationRange,
    settle_frame: f64,
}

impl SceneChoreographer {
    pub fn new(choreography: &Choreography, spec: &CompositionSpec, props: &InputProps) -> Self {
        let fps = spec.fps_f64();
        let total = spec.duration_in_frames;

        let boundary = match choreography.layout {
            SceneLayout::SingleScene => 0,
            SceneLayout::TwoScene { first_scene } => first_scene.to_frame_offset(fps).min(total),
        };
        let scenes = if boundary == 0 || boundary >= total {
            vec![SceneSpan { index: 0, start: 0, end: total }]
        } else {
            vec![
                SceneSpan { index: 0, start: 0, end: boundary },
                SceneSpan { index: 1, start: boundary, end: total },
            ]
        };

        let title_start = choreography.title.trigger.resolve(boundary, 0, fps);
        let image_start = choreography.image.trigger.resolve(boundary, title_start, fps);
        let description_start = choreography.description.trigger.resolve(boundary, title_start, fps);

        let fade_frames = choreography.end_fade.as_frames(fps);
        let end_fade = AnimationRange::new([total as f64 - fade_frames, total as f64], [1.0, 0.0]);

        let description = props.display_description().to_string();

        let mut settle_frame = choreography
            .image
            .tracks_settled(image_start, fps)
            .max(choreography.title.tracks_settled(title_start, fps))
            .max(choreography.description.tracks_settled(description_start, fps));
        if let Some(cps) = choreography.title.stream_cps {
            let n = props.title.chars().count();
            settle_frame = settle_frame.max((title_start + frames_to_complete(n, cps, fps)) as f64);
        }
        if let Some(cps) = choreography.description.stream_cps {
            let n = description.chars().count();
            settle_frame =
                settle_frame.max((description_start + frames_to_complete(n, cps, fps)) as f64);
        }
        if let (Some(transition), SceneLayout::TwoScene { .. }) =
            (&choreography.font_transition, choreography.layout)
        {
            settle_frame = settle_frame.max(boundary as f64 + transition.window.as_frames(fps));
        }

        Self {
            choreography: choreography.clone(),
            props: props.clone(),
            description,
            fps,
            duration_in_frames: total,
            boundary,
            scenes,
            image_start,
            title_start,
            description_start,
            end_fade,
            settle_frame,
        }
    }

    pub fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    pub fn scenes(&self) -> &[SceneSpan] {
        &self.scenes
    }

    /// Scene active at `frame`. Frames past the end belong to the last scene.
    pub fn scene_at(&self, frame: u64) -> &SceneSpan {
        self.scenes
            .iter()
            .find(|s| s.contains(frame))
            .unwrap_or(&self.scenes[self.scenes.len() - 1])
    }

    /// First frame of the second scene, or 0 for a single-scene layout.
    pub fn boundary_frame(&self) -> u64 {
        self.boundary
    }

    /// Fractional frame after which only the end fade changes anything.
    pub fn settle_frame(&self) -> f64 {
        self.settle_frame
    }

    pub fn global_opacity(&self, frame: u64) -> f64 {
        interpolate(frame as f64, &self.end_fade)
    }

    pub fn phase_at(&self, frame: u64) -> Phase {
        let f = frame as f64;
        if f >= self.end_fade.input[0] {
            Phase::FadeOut
        } else if f < self.settle_frame {
            Phase::Reveal
        } else {
            Phase::Hold
        }
    }

    pub fn font_sizes_at(&self, frame: u64) -> FontSizes {
        let standard = self.choreography.standard_fonts;
        let transition = match (&self.choreography.font_transition, self.choreography.layout) {
            (Some(t), SceneLayout::TwoScene { .. }) => t,
            _ => return standard,
        };
        let a = self.boundary as f64;
        let b = a + transition.window.as_frames(self.fps);
        let size = |hero: f64, standard: f64| {
            let range = AnimationRange::new([a, b], [hero, standard]).with_easing(transition.easing);
            interpolate(frame as f64, &range)
        };
        FontSizes {
            title: size(transition.hero.title, standard.title),
            description: size(transition.hero.description, standard.description),
        }
    }

    /// Image layout slot: 0 before the boundary, easing to 1 with the font transition.
    fn image_slot_at(&self, frame: u64) -> f64 {
        match self.choreography.layout {
            SceneLayout::SingleScene => 1.0,
            SceneLayout::TwoScene { .. } => {
                let a = self.boundary as f64;
                let (window, easing) = self
                    .choreography
                    .font_transition
                    .map(|t| (t.window.as_frames(self.fps), t.easing))
                    .unwrap_or((0.0, Easing::Linear));
                let range = AnimationRange::new([a, a + window], [0.0, 1.0]).with_easing(easing);
                interpolate(frame as f64, &range)
            }
        }
    }

    fn image_state(&self, frame: u64) -> ImageState {
        let recipe = &self.choreography.image;
        let start = self.image_start;
        let placeholder = self.props.image_source().is_none();
        let track = |t: &Option<Track>, rest: f64| t.map_or(rest, |t| t.value_at(frame, start, self.fps));
        ImageState {
            opacity: recipe.opacity.value_at(frame, start, self.fps),
            offset_x: if placeholder { 0.0 } else { track(&recipe.offset_x, 0.0) },
            offset_y: if placeholder { 0.0 } else { track(&recipe.offset_y, 0.0) },
            scale: track(&recipe.scale, 1.0),
            slot: self.image_slot_at(frame),
            placeholder,
        }
    }

    fn text_state(&self, frame: u64, recipe: &ElementRecipe, start: u64, text: &str, font_size: f64) -> TextState {
        let track = |t: &Option<Track>, rest: f64| t.map_or(rest, |t| t.value_at(frame, start, self.fps));
        let (revealed, total_chars, streaming) = match recipe.stream_cps {
            Some(cps) => {
                let s = streamed_prefix(frame, start, text, cps, self.fps);
                (s.prefix.to_string(), s.total, frame >= start && s.is_streaming())
            }
            None => (text.to_string(), text.chars().count(), false),
        };
        TextState {
            opacity: recipe.opacity.value_at(frame, start, self.fps),
            offset_x: track(&recipe.offset_x, 0.0),
            offset_y: track(&recipe.offset_y, 0.0),
            font_size,
            revealed,
            total_chars,
            streaming,
            caret_visible: streaming && caret_visible(frame - start, self.fps),
        }
    }

    /// Visual state of every element at `frame`.
    pub fn visual_state(&self, frame: u64) -> VisualState {
        let fonts = self.font_sizes_at(frame);
        VisualState {
            frame,
            scene: self.scene_at(frame).index,
            phase: self.phase_at(frame),
            global_opacity: self.global_opacity(frame),
            image: self.image_state(frame),
            title: self.text_state(
                frame,
                &self.choreography.title,
                self.title_start,
                &self.props.title,
                fonts.title,
            ),
            description: self.text_state(
                frame,
                &self.choreography.description,
                self.description_start,
                &self.description,
                fonts.description,
            ),
        }
    }

    /// Visual states for the whole composition, in frame order.
    pub fn timeline(&self) -> impl Iterator<Item = VisualState> + '_ {
        (0..self.duration_in_frames).map(|f| self.visual_state(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> InputProps {
        InputProps::new("Acme", "", None)
    }

    fn choreographer(choreography: Choreography, props: &InputProps) -> SceneChoreographer {
        SceneChoreographer::new(&choreography, &CompositionSpec::teaser(), props)
    }

    #[test]
    fn test_acme_scenario() {
        let c = choreographer(Choreography::streamed(), &acme());

        let s0 = c.visual_state(0);
        assert_eq!(s0.title.revealed, "");
        assert!(s0.image.placeholder);
        assert_eq!(s0.phase, Phase::Reveal);

        let s90 = c.visual_state(90);
        assert_eq!(s90.title.revealed, "Acme");
        assert!(!s90.title.streaming);
        assert_eq!(s90.description.revealed, "Discover more.");
        assert_eq!(s90.phase, Phase::Hold);

        // Description starts at frame 36; 4 frames × 0.6 chars = 2 chars.
        assert_eq!(c.visual_state(40).description.revealed, "Di");

        let s239 = c.visual_state(239);
        assert!(s239.global_opacity < 0.05);
        assert_eq!(s239.phase, Phase::FadeOut);
        assert_eq!(c.global_opacity(240), 0.0);
    }

    #[test]
    fn test_end_fade_clamped_before_window() {
        let c = choreographer(Choreography::streamed(), &acme());
        for frame in 0..=195 {
            assert_eq!(c.global_opacity(frame), 1.0);
        }
        let mut prev = 1.0;
        for frame in 195..240 {
            let o = c.global_opacity(frame);
            assert!(o <= prev);
            prev = o;
        }
        assert_eq!(c.phase_at(194), Phase::Hold);
        assert_eq!(c.phase_at(195), Phase::FadeOut);
    }

    #[test]
    fn test_placeholder_zeroes_offsets_but_animates() {
        let c = choreographer(Choreography::streamed(), &acme());
        let s = c.visual_state(5);
        assert_eq!(s.image.offset_y, 0.0);
        assert!(s.image.opacity > 0.0 && s.image.opacity < 1.0);
        assert!(s.image.scale > 0.9 && s.image.scale < 1.0);

        let with_image = InputProps::new("Acme", "", Some("https://acme.test/og.png".into()));
        let c = choreographer(Choreography::streamed(), &with_image);
        let s = c.visual_state(5);
        assert!(!s.image.placeholder);
        assert!(s.image.offset_y > 0.0);
        assert_eq!(c.visual_state(0).image.offset_y, 80.0);
    }

    #[test]
    fn test_classic_preset_matches_single_fade() {
        let props = InputProps::new("Acme", "Rockets", None);
        let c = choreographer(Choreography::classic(), &props);

        let s = c.visual_state(0);
        assert_eq!(s.title.revealed, "Acme");
        assert_eq!(s.title.opacity, 0.0);
        assert_eq!(s.image.scale, 0.92);
        assert_eq!(s.title.offset_y, 30.0);

        let s = c.visual_state(15);
        assert!((s.title.opacity - 0.5).abs() < 1e-12);
        assert_eq!(s.title.offset_y, 30.0);

        let s = c.visual_state(30);
        assert_eq!(s.title.opacity, 1.0);
        assert!((s.title.offset_y - 15.0).abs() < 1e-9);
        assert_eq!(s.description.opacity, 0.0);

        let s = c.visual_state(60);
        assert_eq!(s.description.opacity, 1.0);
        assert_eq!(s.title.offset_y, 0.0);
        assert!(!s.title.streaming);
    }

    #[test]
    fn test_streamed_title_caret() {
        let props = InputProps::new("A much longer product title", "", None);
        let c = choreographer(Choreography::streamed(), &props);
        let s = c.visual_state(3);
        assert!(s.title.streaming);
        assert!(s.title.caret_visible);
        assert_eq!(s.title.total_chars, 27);
        assert!(!c.visual_state(16).title.caret_visible);
        // Description has not started yet: no caret.
        assert!(!s.description.streaming);
        assert!(!s.description.caret_visible);
    }

    #[test]
    fn test_two_scene_layout() {
        let props = InputProps::new("Acme", "Rockets for everyone", None);
        let c = choreographer(Choreography::two_scene(), &props);

        assert_eq!(
            c.scenes(),
            &[
                SceneSpan { index: 0, start: 0, end: 90 },
                SceneSpan { index: 1, start: 90, end: 240 },
            ]
        );
        assert_eq!(c.scene_at(89).index, 0);
        assert_eq!(c.scene_at(90).index, 1);
        assert_eq!(c.scene_at(1000).index, 1);

        // Title starts at 0.5 s.
        assert_eq!(c.visual_state(15).title.revealed, "");
        assert_eq!(c.visual_state(15).title.opacity, 0.0);

        // Image waits for the boundary.
        assert_eq!(c.visual_state(89).image.opacity, 0.0);
        assert_eq!(c.visual_state(89).image.slot, 0.0);
        assert_eq!(c.visual_state(90).image.opacity, 0.0);
        assert!(c.visual_state(95).image.opacity > 0.0);
        assert_eq!(c.visual_state(120).image.slot, 1.0);
    }

    #[test]
    fn test_font_transition_continuous_and_monotone() {
        let c = choreographer(Choreography::two_scene(), &acme());
        for frame in 0..=90 {
            let f = c.font_sizes_at(frame);
            assert_eq!(f.title, 80.0);
            assert_eq!(f.description, 32.0);
        }
        let mut prev = c.font_sizes_at(90);
        for frame in 91..240 {
            let f = c.font_sizes_at(frame);
            assert!(f.title <= prev.title);
            assert!(f.description <= prev.description);
            // No jump larger than the whole transition spread over its 10.5 frames would allow.
            assert!(prev.title - f.title < 24.0 * 0.5);
            prev = f;
        }
        assert_eq!(c.font_sizes_at(101).title, 56.0);
        assert_eq!(c.font_sizes_at(101).description, 28.0);
    }

    #[test]
    fn test_single_scene_has_standard_fonts() {
        let c = choreographer(Choreography::streamed(), &acme());
        assert_eq!(c.scenes().len(), 1);
        assert_eq!(c.font_sizes_at(0), FontSizes::STANDARD);
        assert_eq!(c.visual_state(0).image.slot, 1.0);
    }

    #[test]
    fn test_text_streams_monotone() {
        let props = InputProps::new("Acme Rocket Company", "Going places quickly.", None);
        for choreography in [Choreography::streamed(), Choreography::two_scene()] {
            let c = choreographer(choreography, &props);
            let mut prev = (0, 0);
            for state in c.timeline() {
                let now = (
                    state.title.revealed.chars().count(),
                    state.description.revealed.chars().count(),
                );
                assert!(now.0 >= prev.0 && now.1 >= prev.1);
                prev = now;
            }
            assert_eq!(prev, (19, 21));
        }
    }

    #[test]
    fn test_state_is_pure() {
        let c = choreographer(Choreography::two_scene(), &acme());
        assert_eq!(c.visual_state(100), c.visual_state(100));
        let again = choreographer(Choreography::two_scene(), &acme());
        assert_eq!(c.visual_state(100), again.visual_state(100));
    }

    #[test]
    fn test_from_preset() {
        assert_eq!(Choreography::from_preset("classic").unwrap().name, "classic");
        assert_eq!(Choreography::from_preset("two-scene").unwrap().name, "two-scene");
        assert_eq!(Choreography::default().name, "streamed");
        assert!(Choreography::from_preset("bounce").is_err());
    }

    #[test]
    fn test_choreography_json_roundtrip_keeps_shape() {
        let json = serde_json::to_value(Choreography::two_scene()).unwrap();
        assert_eq!(json["layout"]["kind"], "two-scene");
        assert_eq!(json["image"]["trigger"]["anchor"], "scene-boundary");
        assert_eq!(json["description"]["trigger"]["anchor"], "title");
        let back: Choreography = serde_json::from_value(json).unwrap();
        assert_eq!(back, Choreography::two_scene());
    }

    #[test]
    fn test_trigger_rounds_to_whole_frames() {
        assert_eq!(Trigger::at_start(1.2).resolve(0, 0, 30.0), 36);
        assert_eq!(Trigger::at_start(0.51).resolve(0, 0, 30.0), 15);
        assert_eq!(Trigger::after_boundary(0.0).resolve(90, 0, 30.0), 90);
        assert_eq!(Trigger::after_boundary(0.1).resolve(90, 0, 30.0), 93);
        assert_eq!(Trigger::after_title(1.2).resolve(90, 15, 30.0), 51);
    }

    #[test]
    fn test_description_follows_retimed_title() {
        let props = InputProps::new("Acme", "Rockets", None);
        let mut choreography = Choreography::streamed();
        choreography.title.trigger = Trigger::at_start(0.5);
        let c = choreographer(choreography, &props);

        // Title now starts at frame 15, so the description starts 36 frames later.
        assert_eq!(c.visual_state(50).description.revealed, "");
        assert_eq!(c.visual_state(50).description.opacity, 0.0);
        assert_eq!(c.visual_state(55).description.revealed, "Ro");
    }

    #[test]
    fn test_empty_body_shows_same_text_as_explicit_defaults() {
        let implicit = InputProps::from_json(&serde_json::json!({}));
        let explicit = InputProps::from_json(&serde_json::json!({
            "title": "Product",
            "description": "Discover more.",
        }));
        for choreography in [Choreography::classic(), Choreography::streamed(), Choreography::two_scene()] {
            let a = choreographer(choreography.clone(), &implicit);
            let b = choreographer(choreography, &explicit);
            let mut frames = 0;
            for (x, y) in a.timeline().zip(b.timeline()) {
                assert_eq!(x.title.revealed, y.title.revealed, "frame {}", x.frame);
                assert_eq!(x.description.revealed, y.description.revealed, "frame {}", x.frame);
                frames += 1;
            }
            assert_eq!(frames, 240);
            let last = a.visual_state(239);
            assert_eq!(last.title.revealed, "Product");
            assert_eq!(last.description.revealed, "Discover more.");
        }
    }
}
