//! # teaser-core
//!
//! Core types and primitives for the teaser video engine.
//! This crate contains foundational types shared across all teaser crates:
//! frame buffers, colors, durations, easing curves, configuration
//! and error types.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod hash;
pub mod time;
pub mod types;

pub use config::*;

pub use color::Color;
pub use error::{TeaserError, TeaserResult};
pub use frame::{FrameBuffer, PixelFormat};
pub use time::Duration;
pub use types::{Easing, Extrapolate};
