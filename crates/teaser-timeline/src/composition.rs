//! Composition definitions and input props.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use teaser_core::{Duration, TeaserError, TeaserResult};

/// Description shown when a page provides none.
pub const FALLBACK_DESCRIPTION: &str = "Discover more.";

/// Content rendered into a teaser. Fixed for the lifetime of one render job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProps {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl InputProps {
    pub fn new(title: impl Into<String>, description: impl Into<String>, image: Option<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            image,
        }
    }

    /// Build props from a loosely typed JSON body.
    ///
    /// Each field defaults independently: a missing or non-string `title`
    /// becomes `"Product"`, `description` becomes `""` and `image` becomes
    /// `None`. Applying this to its own serialized output is a no-op.
    pub fn from_json(body: &Value) -> Self {
        let field = |name: &str| body.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            title: field("title").unwrap_or_else(|| "Product".to_string()),
            description: field("description").unwrap_or_default(),
            image: field("image"),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "title": self.title,
            "description": self.description,
            "image": self.image,
        })
    }

    /// Description as it is drawn on screen.
    pub fn display_description(&self) -> &str {
        if self.description.is_empty() {
            FALLBACK_DESCRIPTION
        } else {
            &self.description
        }
    }

    /// Image source if one was given. Empty strings count as absent.
    pub fn image_source(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// A fixed-size, fixed-length video definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionSpec {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_in_frames: u64,
    pub default_props: InputProps,
}

impl CompositionSpec {
    /// Create a composition lasting `seconds`. `fps × seconds` must be a whole
    /// positive number of frames.
    pub fn from_seconds(
        id: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
        seconds: f64,
        default_props: InputProps,
    ) -> TeaserResult<Self> {
        let frames = fps as f64 * seconds;
        if !frames.is_finite() || frames < 1.0 || (frames - frames.round()).abs() > 1e-9 {
            return Err(TeaserError::Composition(format!(
                "{} fps × {} s is not a whole number of frames",
                fps, seconds
            )));
        }
        let spec = Self {
            id: id.into(),
            width,
            height,
            fps,
            duration_in_frames: frames.round() as u64,
            default_props,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// The reference teaser: 1920×1080 at 30 fps for 8 seconds.
    pub fn teaser() -> Self {
        Self {
            id: "Teaser".to_string(),
            width: 1920,
            height: 1080,
            fps: 30,
            duration_in_frames: 240,
            default_props: InputProps::new(
                "Product Name",
                "Short description of your product.",
                None,
            ),
        }
    }

    pub fn validate(&self) -> TeaserResult<()> {
        if self.id.trim().is_empty() {
            return Err(TeaserError::Composition("composition id is empty".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(TeaserError::Composition(format!(
                "composition '{}' has zero size {}x{}",
                self.id, self.width, self.height
            )));
        }
        if self.fps == 0 {
            return Err(TeaserError::Composition(format!(
                "composition '{}' has zero fps",
                self.id
            )));
        }
        if self.duration_in_frames == 0 {
            return Err(TeaserError::Composition(format!(
                "composition '{}' has no frames",
                self.id
            )));
        }
        Ok(())
    }

    pub fn fps_f64(&self) -> f64 {
        self.fps as f64
    }

    pub fn duration(&self) -> Duration {
        Duration::from_frames(self.duration_in_frames, self.fps as f64)
    }
}

/// A composition resolved for one job, paired with the props it renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedComposition {
    pub spec: CompositionSpec,
    pub props: InputProps,
}

/// Known compositions, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct CompositionRegistry {
    compositions: Vec<CompositionSpec>,
}

impl CompositionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the reference teaser.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.compositions.push(CompositionSpec::teaser());
        registry
    }

    pub fn register(&mut self, spec: CompositionSpec) -> TeaserResult<()> {
        spec.validate()?;
        if self.get(&spec.id).is_some() {
            return Err(TeaserError::Composition(format!(
                "composition '{}' is already registered",
                spec.id
            )));
        }
        self.compositions.push(spec);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CompositionSpec> {
        self.compositions.iter().find(|c| c.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.compositions.iter().map(|c| c.id.as_str())
    }

    /// Resolve `id`, pairing it with `props` or the composition's defaults.
    pub fn select(&self, id: &str, props: Option<InputProps>) -> TeaserResult<SelectedComposition> {
        let spec = self.get(id).ok_or_else(|| {
            TeaserError::Composition(format!("composition '{}' not found", id))
        })?;
        Ok(SelectedComposition {
            props: props.unwrap_or_else(|| spec.default_props.clone()),
            spec: spec.clone(),
        })
    }
}

/// Select `id` from the standard registry.
pub fn select_composition(id: &str, props: Option<InputProps>) -> TeaserResult<SelectedComposition> {
    CompositionRegistry::standard().select(id, props)
}
