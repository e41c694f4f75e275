use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TeaserError, TeaserResult};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory rendered `<uuid>.mp4` files are written to.
    pub output_dir: PathBuf,
    /// Composition id to render.
    pub composition: String,
    pub preset: String, // "classic" | "streamed" | "two-scene"
    /// Explicit TTF/OTF font; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    /// Timeout for fetching the hero image, in seconds.
    pub image_timeout_secs: u64,
    /// Accept plain paths and `file://` image sources. Off for anything
    /// reachable over HTTP; the CLI turns it on for its own arguments.
    pub allow_local_images: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            composition: "Teaser".to_string(),
            preset: "streamed".to_string(),
            font_path: None,
            image_timeout_secs: 20,
            allow_local_images: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub ffmpeg_path: String,
    pub preset: String,
    pub crf: u8,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            preset: "medium".to_string(),
            crf: 23,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Firecrawl credential. Usually supplied via `FIRECRAWL_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Backoff before the single retry on a 502/503.
    pub retry_delay_ms: u64,
    pub markdown_limit: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.firecrawl.dev".to_string(),
            retry_delay_ms: 2000,
            markdown_limit: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TeaserConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl TeaserConfig {
    pub fn load_from_file(path: &Path) -> TeaserResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TeaserError::config(e.to_string(), path))?;
        toml::from_str(&contents).map_err(|e| TeaserError::config(e.to_string(), path))
    }

    /// Load `path` if it exists, otherwise defaults, then apply environment overrides.
    pub fn load(path: &Path) -> TeaserResult<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup("TEASER_OUTPUT_DIR") {
            self.render.output_dir = PathBuf::from(dir);
        }
        if let Some(font) = lookup("TEASER_FONT") {
            self.render.font_path = Some(PathBuf::from(font));
        }
        if let Some(preset) = lookup("TEASER_PRESET") {
            self.render.preset = preset;
        }
        if let Some(key) = lookup("FIRECRAWL_API_KEY") {
            let key = key.trim().to_string();
            self.analyzer.api_key = (!key.is_empty()).then_some(key);
        }
        if let Some(url) = lookup("FIRECRAWL_BASE_URL") {
            self.analyzer.base_url = url;
        }
    }
}
