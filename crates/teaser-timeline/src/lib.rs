//! # teaser-timeline
//!
//! The frame-based animation engine behind teaser videos.
//!
//! Everything here is a pure function of the frame index: given a
//! [`CompositionSpec`], the job's [`InputProps`] and a [`Choreography`],
//! [`SceneChoreographer::visual_state`] returns the exact visual state of every
//! element for that frame. No wall clock is consulted.

pub mod choreography;
pub mod composition;
pub mod interpolate;
pub mod stream;
pub mod validate;

pub use choreography::{
    Anchor, Choreography, ElementRecipe, FontSizes, FontTransition, ImageState, Phase,
    SceneChoreographer, SceneLayout, SceneSpan, TextState, Track, Trigger, VisualState,
};
pub use composition::{
    select_composition, CompositionRegistry, CompositionSpec, InputProps, SelectedComposition,
    FALLBACK_DESCRIPTION,
};
pub use interpolate::{interpolate, AnimationRange};
pub use stream::{caret_visible, frames_to_complete, streamed_prefix, StreamedText};
pub use validate::validate_choreography;
