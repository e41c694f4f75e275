//! The compiled render bundle and its process-wide single-flight cache.
//!
//! Compiling a bundle loads the font and pre-rasterizes the static layers. It
//! is done once per process: the first job compiles while holding the cache
//! lock, every later job reuses the published bundle.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use teaser_core::hash::hash_parts;
use teaser_core::{Color, FrameBuffer, TeaserResult};
use tokio::sync::Mutex;

use crate::text::{discover_font, TextRenderer};

/// `#0f172a → #1e293b → #0f172a`, top to bottom.
pub fn background_stops() -> [(f32, Color); 3] {
    let edge = Color::from_rgba8(15, 23, 42, 1.0);
    [(0.0, edge), (0.5, Color::from_rgba8(30, 41, 59, 1.0)), (1.0, edge)]
}

/// Dark wash over the top 40% of the frame.
pub fn overlay_stops() -> [(f32, Color); 2] {
    [
        (0.0, Color::from_rgba8(15, 23, 42, 0.7)),
        (0.4, Color::from_rgba8(15, 23, 42, 0.0)),
    ]
}

/// Everything a job needs that does not depend on its props.
pub struct Bundle {
    /// Content-derived id, `bundle-<hex>`.
    pub id: String,
    pub font_path: PathBuf,
    pub text: TextRenderer,
    pub background: FrameBuffer,
    pub overlay: FrameBuffer,
}

impl Bundle {
    /// Load the font and rasterize the static layers for a `width`×`height` canvas.
    pub fn compile(font_path: Option<&Path>, width: u32, height: u32) -> TeaserResult<Self> {
        let (font_path, font, font_bytes) = discover_font(font_path)?;

        let background = FrameBuffer::vertical_gradient(width, height, &background_stops());
        let overlay = FrameBuffer::vertical_gradient(width, height, &overlay_stops());

        let digest = hash_parts(&[font_bytes.as_slice(), &width.to_le_bytes(), &height.to_le_bytes()]);

        Ok(Self {
            id: format!("bundle-{}", digest.short()),
            font_path,
            text: TextRenderer::new(font),
            background,
            overlay,
        })
    }
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundle")
            .field("id", &self.id)
            .field("font_path", &self.font_path)
            .field("width", &self.background.width)
            .field("height", &self.background.height)
            .finish()
    }
}

/// Memoized, single-flight slot for an expensive value.
///
/// Concurrent callers of [`BundleCache::get_or_compile`] trigger at most one
/// compile. A failed compile publishes nothing, so the next caller retries.
pub struct BundleCache<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> BundleCache<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub async fn get_or_compile<F, Fut>(&self, compile: F) -> TeaserResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TeaserResult<T>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(compile().await?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// Drop the published value; the next caller compiles again.
    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}

impl<T> Default for BundleCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use teaser_core::TeaserError;

    #[tokio::test]
    async fn test_single_flight() {
        let cache = Arc::new(BundleCache::<usize>::new());
        let compiles = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let compiles = Arc::clone(&compiles);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compile(|| async {
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(compiles.fetch_add(1, Ordering::SeqCst) + 100)
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(*handle.await.unwrap().unwrap(), 100);
        }
        assert_eq!(compiles.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_compile_is_retried() {
        let cache = BundleCache::<u32>::new();
        let err = cache
            .get_or_compile(|| async { Err(TeaserError::Compile("boom".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, TeaserError::Compile(_)));

        let value = cache.get_or_compile(|| async { Ok(7) }).await.unwrap();
        assert_eq!(*value, 7);
    }

    #[tokio::test]
    async fn test_first_success_wins_until_invalidated() {
        let cache = BundleCache::<u32>::new();
        assert_eq!(*cache.get_or_compile(|| async { Ok(1) }).await.unwrap(), 1);
        assert_eq!(*cache.get_or_compile(|| async { Ok(2) }).await.unwrap(), 1);

        cache.invalidate().await;
        assert_eq!(*cache.get_or_compile(|| async { Ok(3) }).await.unwrap(), 3);
    }

    #[test]
    fn test_compile_missing_font_fails() {
        let err = Bundle::compile(Some(Path::new("/nonexistent/font.ttf")), 64, 36).unwrap_err();
        assert!(matches!(err, TeaserError::Asset { .. }));
    }

    #[test]
    fn test_compile_is_content_addressed() {
        let Ok(a) = Bundle::compile(None, 64, 36) else { return };
        let b = Bundle::compile(None, 64, 36).unwrap();
        let c = Bundle::compile(None, 128, 72).unwrap();
        assert!(a.id.starts_with("bundle-"));
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!((a.background.width, a.background.height), (64, 36));
        // Overlay is transparent below 40% of the height.
        assert_eq!(a.overlay.get_pixel(10, 30).map(|p| p[3]), Some(0));
        assert!(a.overlay.get_pixel(10, 0).map_or(false, |p| p[3] > 150));
    }
}
