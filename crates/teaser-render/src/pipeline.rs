use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::Value;
use teaser_core::hash::{ContentHash, StreamHasher};
use teaser_core::{EncoderConfig, FrameBuffer, RenderConfig, TeaserConfig, TeaserError, TeaserResult};
use teaser_encode::{FfmpegEncoder, FrameSink, SinkFactory};
use teaser_timeline::{
    validate_choreography, Choreography, CompositionRegistry, CompositionSpec, InputProps,
    SceneChoreographer,
};
use uuid::Uuid;

use crate::bundle::{Bundle, BundleCache};
use crate::compositor::Compositor;
use crate::image_loader::{fetch_image, ImageSource};

/// Reference to a finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub job_id: Uuid,
    /// File on disk, `<output_dir>/<job_id>.mp4`.
    pub path: PathBuf,
    /// Public URL path, `/output/<job_id>.mp4`.
    pub video_url: String,
    pub frame_count: u64,
    /// Hash over every frame in order, independent of the encoder.
    pub content_hash: ContentHash,
}

/// Result of driving a caller-provided sink.
pub struct SinkRender<S> {
    pub sink: S,
    pub frame_count: u64,
    pub content_hash: ContentHash,
}

/// Everything needed to draw the frames of one job.
struct FrameJob {
    spec: CompositionSpec,
    choreographer: SceneChoreographer,
    compositor: Compositor,
}

impl FrameJob {
    fn render_frame(&self, frame: u64) -> TeaserResult<FrameBuffer> {
        self.compositor.compose(&self.choreographer.visual_state(frame))
    }

    /// Push frames `0..duration` into `sink` in order, rasterizing each batch in parallel.
    fn drive(&self, sink: &mut dyn FrameSink) -> TeaserResult<ContentHash> {
        let total = self.spec.duration_in_frames;
        let batch = (rayon::current_num_threads() * 2).max(1) as u64;
        let mut hasher = StreamHasher::new();

        let mut start = 0;
        while start < total {
            let end = (start + batch).min(total);
            let frames: Vec<FrameBuffer> = (start..end)
                .into_par_iter()
                .map(|frame| self.render_frame(frame))
                .collect::<TeaserResult<_>>()?;

            for (index, frame) in (start..end).zip(frames.iter()) {
                hasher.update(frame);
                sink.write_frame(index, frame)?;
            }
            tracing::debug!("wrote frames {}..{} of {}", start, end, total);
            start = end;
        }

        sink.finish()?;
        Ok(hasher.finalize())
    }
}

/// The render pipeline: props in, encoded teaser out.
///
/// Holds the process-wide bundle cache, so one pipeline should be shared by
/// every job in the process.
pub struct RenderPipeline {
    config: RenderConfig,
    encoder: FfmpegEncoder,
    sinks: Arc<dyn SinkFactory>,
    choreography: Choreography,
    registry: CompositionRegistry,
    bundle: BundleCache<Bundle>,
    http: reqwest::Client,
}

impl RenderPipeline {
    pub fn new(config: RenderConfig, encoder: EncoderConfig) -> TeaserResult<Self> {
        let choreography = Choreography::from_preset(&config.preset)?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.image_timeout_secs))
            .build()
            .map_err(|e| TeaserError::Render(format!("failed to build HTTP client: {}", e)))?;
        let encoder = FfmpegEncoder::new(encoder);
        Ok(Self {
            config,
            sinks: Arc::new(encoder.clone()),
            encoder,
            choreography,
            registry: CompositionRegistry::standard(),
            bundle: BundleCache::new(),
            http,
        })
    }

    pub fn from_config(config: &TeaserConfig) -> TeaserResult<Self> {
        Self::new(config.render.clone(), config.encoder.clone())
    }

    pub fn with_choreography(mut self, choreography: Choreography) -> Self {
        self.choreography = choreography;
        self
    }

    /// Route finished jobs somewhere other than FFmpeg. `render` still picks
    /// the output path; the factory decides what is written there.
    pub fn with_sink_factory(mut self, sinks: Arc<dyn SinkFactory>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn register_composition(&mut self, spec: CompositionSpec) -> TeaserResult<()> {
        self.registry.register(spec)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn encoder(&self) -> &FfmpegEncoder {
        &self.encoder
    }

    pub fn choreography(&self) -> &Choreography {
        &self.choreography
    }

    /// The composition this pipeline renders.
    pub fn composition(&self) -> TeaserResult<&CompositionSpec> {
        self.registry.get(&self.config.composition).ok_or_else(|| {
            TeaserError::Composition(format!("composition '{}' not found", self.config.composition))
        })
    }

    /// The compiled bundle, compiling it on first use.
    pub async fn bundle(&self) -> TeaserResult<Arc<Bundle>> {
        let spec = self.composition()?;
        let (width, height) = (spec.width, spec.height);
        let font_path = self.config.font_path.clone();
        self.bundle
            .get_or_compile(|| async move {
                tracing::info!("Compiling render bundle ({}x{})", width, height);
                let bundle = tokio::task::spawn_blocking(move || {
                    Bundle::compile(font_path.as_deref(), width, height)
                })
                .await
                .map_err(|e| TeaserError::Compile(format!("bundle compile task failed: {}", e)))??;
                tracing::info!(
                    "Bundle {} ready (font {})",
                    bundle.id,
                    bundle.font_path.display()
                );
                Ok(bundle)
            })
            .await
    }

    /// Forget the compiled bundle; the next job compiles it again.
    pub async fn invalidate_bundle(&self) {
        self.bundle.invalidate().await;
    }

    async fn prepare(&self, props: InputProps) -> TeaserResult<FrameJob> {
        let selected = self.registry.select(&self.config.composition, Some(props))?;
        validate_choreography(&self.choreography, &selected.spec).map_err(|errors| {
            TeaserError::Composition(
                errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })?;

        let image_source = selected
            .props
            .image_source()
            .map(|source| ImageSource::resolve(source, self.config.allow_local_images))
            .transpose()?;

        let bundle = self.bundle().await?;

        let image = match &image_source {
            Some(source) => {
                tracing::debug!("fetching hero image {:?}", source);
                Some(fetch_image(&self.http, source).await?)
            }
            None => None,
        };

        let spec = selected.spec;
        let props = selected.props;
        let compositor = tokio::task::spawn_blocking(move || {
            Compositor::new(bundle, spec.width, spec.height, &props, image.as_ref())
                .map(|compositor| (compositor, spec, props))
        })
        .await
        .map_err(|e| TeaserError::Render(format!("card build task failed: {}", e)))?;
        let (compositor, spec, props) = compositor?;

        let choreographer = SceneChoreographer::new(&self.choreography, &spec, &props);
        Ok(FrameJob {
            spec,
            choreographer,
            compositor,
        })
    }

    /// Render `props` into a new `<uuid>.mp4` under the output directory.
    ///
    /// A failed job may leave a partial file behind.
    pub async fn render(&self, props: InputProps) -> TeaserResult<RenderOutput> {
        let job_id = Uuid::new_v4();
        tracing::info!("Render job {} started: {:?}", job_id, props.title);

        match self.render_job(job_id, props).await {
            Ok(output) => {
                tracing::info!(
                    "Render job {} finished: {} frames -> {}",
                    job_id,
                    output.frame_count,
                    output.path.display()
                );
                Ok(output)
            }
            Err(e) => {
                tracing::error!("Render job {} failed: {}", job_id, e);
                Err(e)
            }
        }
    }

    async fn render_job(&self, job_id: Uuid, props: InputProps) -> TeaserResult<RenderOutput> {
        let job = self.prepare(props).await?;

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let file_name = format!("{}.mp4", job_id);
        let path = self.config.output_dir.join(&file_name);

        let sinks = Arc::clone(&self.sinks);
        let target = path.clone();
        let (frame_count, content_hash) = tokio::task::spawn_blocking(move || {
            let mut sink = sinks.open_sink(job.spec.width, job.spec.height, job.spec.fps, &target)?;
            let hash = job.drive(sink.as_mut())?;
            Ok::<_, TeaserError>((job.spec.duration_in_frames, hash))
        })
        .await
        .map_err(|e| TeaserError::Render(format!("render task failed: {}", e)))??;

        Ok(RenderOutput {
            job_id,
            path,
            video_url: format!("/output/{}", file_name),
            frame_count,
            content_hash,
        })
    }

    /// Render a loosely typed JSON body, defaulting missing fields.
    pub async fn render_json(&self, body: &Value) -> TeaserResult<RenderOutput> {
        self.render(InputProps::from_json(body)).await
    }

    /// Run the full job against `sink` instead of the FFmpeg encoder.
    pub async fn render_with_sink<S>(&self, props: InputProps, mut sink: S) -> TeaserResult<SinkRender<S>>
    where
        S: FrameSink + 'static,
    {
        let job = self.prepare(props).await?;
        tokio::task::spawn_blocking(move || {
            let content_hash = job.drive(&mut sink)?;
            Ok(SinkRender {
                sink,
                frame_count: job.spec.duration_in_frames,
                content_hash,
            })
        })
        .await
        .map_err(|e| TeaserError::Render(format!("render task failed: {}", e)))?
    }

    /// Render a single frame, for previews.
    pub async fn render_frame(&self, props: InputProps, frame: u64) -> TeaserResult<FrameBuffer> {
        let job = self.prepare(props).await?;
        if frame >= job.spec.duration_in_frames {
            return Err(TeaserError::InvalidArgument(format!(
                "frame {} is outside the composition (0..{})",
                frame, job.spec.duration_in_frames
            )));
        }
        tokio::task::spawn_blocking(move || job.render_frame(frame))
            .await
            .map_err(|e| TeaserError::Render(format!("render task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teaser_encode::MemorySink;

    fn tiny_pipeline(dir: &std::path::Path) -> RenderPipeline {
        let config = RenderConfig {
            output_dir: dir.to_path_buf(),
            composition: "Tiny".into(),
            allow_local_images: true,
            ..RenderConfig::default()
        };
        let mut pipeline = RenderPipeline::new(config, EncoderConfig::default()).unwrap();
        pipeline
            .register_composition(
                CompositionSpec::from_seconds(
                    "Tiny",
                    160,
                    90,
                    10,
                    2.0,
                    CompositionSpec::teaser().default_props,
                )
                .unwrap(),
            )
            .unwrap();
        pipeline
    }

    fn font_available() -> bool {
        crate::text::discover_font(None).is_ok()
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let config = RenderConfig {
            preset: "bounce".into(),
            ..RenderConfig::default()
        };
        assert!(RenderPipeline::new(config, EncoderConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_unknown_composition() {
        let config = RenderConfig {
            composition: "Missing".into(),
            ..RenderConfig::default()
        };
        let pipeline = RenderPipeline::new(config, EncoderConfig::default()).unwrap();
        let err = pipeline
            .render_with_sink(InputProps::new("Acme", "", None), MemorySink::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TeaserError::Composition(_)));
    }

    #[tokio::test]
    async fn test_invalid_choreography_for_composition() {
        let dir = tempfile::tempdir().unwrap();
        // Two-scene boundary at 3 s does not fit a 2 s composition.
        let pipeline = tiny_pipeline(dir.path()).with_choreography(Choreography::two_scene());
        let err = pipeline
            .render_with_sink(InputProps::new("Acme", "", None), MemorySink::new())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("scene boundary"));
    }

    #[tokio::test]
    async fn test_frames_written_in_order_and_hashed() {
        if !font_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let pipeline = tiny_pipeline(dir.path());
        let props = InputProps::new("Acme", "", None);

        let first = pipeline
            .render_with_sink(props.clone(), MemorySink::new())
            .await
            .unwrap();
        assert_eq!(first.frame_count, 20);
        assert_eq!(first.sink.indices, (0..20).collect::<Vec<_>>());
        assert!(first.sink.is_finished());

        let mut hasher = StreamHasher::new();
        for frame in &first.sink.frames {
            hasher.update(frame);
        }
        assert_eq!(hasher.finalize(), first.content_hash);

        let second = pipeline
            .render_with_sink(props, MemorySink::new())
            .await
            .unwrap();
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[tokio::test]
    async fn test_bundle_compiled_once() {
        if !font_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let pipeline = tiny_pipeline(dir.path());
        let a = pipeline.bundle().await.unwrap();
        let b = pipeline.bundle().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        pipeline.invalidate_bundle().await;
        let c = pipeline.bundle().await.unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.id, c.id);
    }

    #[tokio::test]
    async fn test_missing_image_fails_job() {
        if !font_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let pipeline = tiny_pipeline(dir.path());
        let props = InputProps::new("Acme", "", Some("/nonexistent/og.png".into()));
        let err = pipeline
            .render_with_sink(props, MemorySink::new())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, TeaserError::Asset { .. }));
    }

    #[tokio::test]
    async fn test_local_image_refused_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let config = RenderConfig {
            output_dir: dir.path().to_path_buf(),
            ..RenderConfig::default()
        };
        let pipeline = RenderPipeline::new(config, EncoderConfig::default()).unwrap();
        // Refused before the bundle or the file system is touched.
        for image in ["/etc/passwd", "file:///etc/passwd"] {
            let props = InputProps::new("Acme", "", Some(image.into()));
            let err = pipeline
                .render_with_sink(props, MemorySink::new())
                .await
                .err()
                .unwrap();
            assert!(matches!(err, TeaserError::InvalidArgument(_)), "{}", err);
            assert!(!err.to_string().contains("passwd"));
        }
    }

    #[tokio::test]
    async fn test_render_frame_bounds() {
        if !font_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let pipeline = tiny_pipeline(dir.path());
        let props = InputProps::new("Acme", "Rockets", None);
        let frame = pipeline.render_frame(props.clone(), 19).await.unwrap();
        assert_eq!((frame.width, frame.height), (160, 90));
        assert!(pipeline.render_frame(props, 20).await.is_err());
    }
}
