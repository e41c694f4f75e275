//! # teaser-render
//!
//! The teaser rendering engine. Compiles the static bundle once per process,
//! lays out the title card for a job's props and rasterizes every frame of the
//! choreography on the CPU before handing them to an encoder sink.

pub mod bundle;
pub mod compositor;
pub mod image_loader;
pub mod pipeline;
pub mod text;

pub use bundle::{Bundle, BundleCache};
pub use compositor::{encode_png, Compositor};
pub use pipeline::{RenderOutput, RenderPipeline, SinkRender};
pub use text::{TextBlock, TextRenderer};
