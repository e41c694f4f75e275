//! Image loading module.
//! Fetches hero images over HTTP or from disk and decodes them into FrameBuffers.

use std::path::PathBuf;

use image::imageops::FilterType;
use image::RgbaImage;
use teaser_core::{FrameBuffer, PixelFormat, TeaserError, TeaserResult};

/// Where a hero image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Http(String),
    File(PathBuf),
}

impl ImageSource {
    /// Classify an image reference: `http(s)://` URLs, `file://` URLs or plain paths.
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ImageSource::Http(trimmed.to_string())
        } else if lower.starts_with("file://") {
            ImageSource::File(PathBuf::from(&trimmed["file://".len()..]))
        } else {
            ImageSource::File(PathBuf::from(trimmed))
        }
    }

    /// Like [`ImageSource::parse`], but local files are refused unless
    /// `allow_local` is set. The error does not echo the rejected path.
    pub fn resolve(source: &str, allow_local: bool) -> TeaserResult<Self> {
        match Self::parse(source) {
            ImageSource::File(_) if !allow_local => Err(TeaserError::InvalidArgument(
                "hero image must be an http(s) URL".into(),
            )),
            parsed => Ok(parsed),
        }
    }
}

/// Decode an image from raw bytes.
pub fn load_image_from_bytes(data: &[u8], source_ref: &str) -> TeaserResult<FrameBuffer> {
    let img = image::load_from_memory(data)
        .map_err(|e| TeaserError::asset(format!("failed to decode image: {}", e), source_ref))?;
    Ok(to_frame_buffer(img.to_rgba8()))
}

fn to_frame_buffer(rgba: RgbaImage) -> FrameBuffer {
    let (width, height) = rgba.dimensions();
    let mut fb = FrameBuffer::new(width, height, PixelFormat::Rgba8);
    fb.data = rgba.into_raw();
    fb
}

fn to_rgba_image(fb: &FrameBuffer) -> TeaserResult<RgbaImage> {
    RgbaImage::from_raw(fb.width, fb.height, fb.data.clone()).ok_or_else(|| {
        TeaserError::Render(format!(
            "frame buffer of {} bytes does not match {}x{}",
            fb.data.len(),
            fb.width,
            fb.height
        ))
    })
}

/// Fetch and decode the image behind `source`.
///
/// Any failure (unreachable host, non-2xx status, missing file, undecodable
/// bytes) is an [`TeaserError::Asset`]. File errors are logged in full but
/// the returned message carries no OS detail.
pub async fn fetch_image(client: &reqwest::Client, source: &ImageSource) -> TeaserResult<FrameBuffer> {
    let (bytes, source_ref) = match source {
        ImageSource::Http(url) => {
            let res = client
                .get(url)
                .send()
                .await
                .map_err(|e| TeaserError::asset(format!("failed to download image: {}", e), url))?;
            if !res.status().is_success() {
                return Err(TeaserError::asset(
                    format!("image fetch failed with HTTP {}", res.status()),
                    url,
                ));
            }
            let bytes = res
                .bytes()
                .await
                .map_err(|e| TeaserError::asset(format!("failed to read image body: {}", e), url))?;
            (bytes.to_vec(), url.clone())
        }
        ImageSource::File(path) => {
            let source_ref = path.display().to_string();
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                tracing::warn!("failed to read image {}: {}", source_ref, e);
                TeaserError::asset("failed to read image file", &source_ref)
            })?;
            (bytes, source_ref)
        }
    };

    tokio::task::spawn_blocking(move || load_image_from_bytes(&bytes, &source_ref))
        .await
        .map_err(|e| TeaserError::Render(format!("image decode task failed: {}", e)))?
}

/// Scale `fb` to cover a `width`×`height` box and crop the overflow evenly,
/// like CSS `object-fit: cover`.
pub fn cover_fit(fb: &FrameBuffer, width: u32, height: u32) -> TeaserResult<FrameBuffer> {
    if fb.width == 0 || fb.height == 0 || width == 0 || height == 0 {
        return Err(TeaserError::InvalidArgument(format!(
            "cannot cover-fit {}x{} into {}x{}",
            fb.width, fb.height, width, height
        )));
    }
    let scale = (width as f64 / fb.width as f64).max(height as f64 / fb.height as f64);
    let scaled_w = ((fb.width as f64 * scale).round() as u32).max(width);
    let scaled_h = ((fb.height as f64 * scale).round() as u32).max(height);

    let src = to_rgba_image(fb)?;
    let scaled = if (scaled_w, scaled_h) == (fb.width, fb.height) {
        src
    } else {
        image::imageops::resize(&src, scaled_w, scaled_h, FilterType::Triangle)
    };
    let x = (scaled_w - width) / 2;
    let y = (scaled_h - height) / 2;
    let cropped = image::imageops::crop_imm(&scaled, x, y, width, height).to_image();
    Ok(to_frame_buffer(cropped))
}

/// Resample `fb` by `factor`. Callers position the result.
pub fn scale_by(fb: &FrameBuffer, factor: f64) -> TeaserResult<FrameBuffer> {
    let w = ((fb.width as f64 * factor).round() as u32).max(1);
    let h = ((fb.height as f64 * factor).round() as u32).max(1);
    if (w, h) == (fb.width, fb.height) {
        return Ok(fb.clone());
    }
    let src = to_rgba_image(fb)?;
    Ok(to_frame_buffer(image::imageops::resize(
        &src,
        w,
        h,
        FilterType::Triangle,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teaser_core::Color;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_source_classification() {
        assert_eq!(
            ImageSource::parse(" https://acme.test/og.png "),
            ImageSource::Http("https://acme.test/og.png".into())
        );
        assert_eq!(
            ImageSource::parse("file:///tmp/og.png"),
            ImageSource::File(PathBuf::from("/tmp/og.png"))
        );
        assert_eq!(
            ImageSource::parse("assets/og.png"),
            ImageSource::File(PathBuf::from("assets/og.png"))
        );
    }

    #[test]
    fn test_local_sources_need_opt_in() {
        for source in ["/etc/passwd", "file:///etc/passwd", "og.png"] {
            let err = ImageSource::resolve(source, false).unwrap_err();
            assert!(matches!(err, TeaserError::InvalidArgument(_)));
            assert!(!err.to_string().contains("passwd"));
            assert!(ImageSource::resolve(source, true).is_ok());
        }
        assert_eq!(
            ImageSource::resolve("HTTPS://acme.test/og.png", false).unwrap(),
            ImageSource::Http("HTTPS://acme.test/og.png".into())
        );
    }

    #[tokio::test]
    async fn test_missing_file_hides_os_error() {
        let client = reqwest::Client::new();
        let source = ImageSource::File(PathBuf::from("/nonexistent/image.png"));
        match fetch_image(&client, &source).await {
            Err(TeaserError::Asset { message, .. }) => {
                assert_eq!(message, "failed to read image file");
            }
            other => panic!("expected asset error, got {:?}", other.map(|fb| fb.width)),
        }
    }

    #[test]
    fn test_undecodable_bytes() {
        assert!(load_image_from_bytes(b"not an image", "<memory>").is_err());
    }

    #[test]
    fn test_cover_fit_wide_source() {
        let fb = FrameBuffer::solid(400, 100, &Color::RED);
        let fitted = cover_fit(&fb, 160, 100).unwrap();
        assert_eq!((fitted.width, fitted.height), (160, 100));
        assert_eq!(fitted.get_pixel(80, 50), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_cover_fit_upscales_small_source() {
        let fb = FrameBuffer::solid(16, 16, &Color::BLUE);
        let fitted = cover_fit(&fb, 720, 450).unwrap();
        assert_eq!((fitted.width, fitted.height), (720, 450));
    }

    #[test]
    fn test_cover_fit_crops_center() {
        // Left half red, right half blue; a square crop out of the middle keeps both.
        let mut fb = FrameBuffer::solid(200, 100, &Color::RED);
        for y in 0..100 {
            for x in 100..200 {
                fb.set_pixel(x, y, [0, 0, 255, 255]);
            }
        }
        let fitted = cover_fit(&fb, 100, 100).unwrap();
        assert_eq!(fitted.get_pixel(5, 50), Some([255, 0, 0, 255]));
        assert_eq!(fitted.get_pixel(95, 50), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_scale_by() {
        let fb = FrameBuffer::solid(100, 50, &Color::RED);
        let half = scale_by(&fb, 0.5).unwrap();
        assert_eq!((half.width, half.height), (50, 25));
        assert_eq!(scale_by(&fb, 1.0).unwrap(), fb);
    }

    #[tokio::test]
    async fn test_fetch_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("og.png");
        std::fs::write(&file, png_bytes(8, 4)).unwrap();

        let client = reqwest::Client::new();
        let source = ImageSource::resolve(file.to_str().unwrap(), true).unwrap();
        let fb = fetch_image(&client, &source).await.unwrap();
        assert_eq!((fb.width, fb.height), (8, 4));

        let url = ImageSource::resolve(&format!("file://{}", file.display()), true).unwrap();
        assert!(fetch_image(&client, &url).await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/og.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes(12, 6)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let og = ImageSource::Http(format!("{}/og.png", server.uri()));
        let fb = fetch_image(&client, &og).await.unwrap();
        assert_eq!((fb.width, fb.height), (12, 6));

        let gone = ImageSource::Http(format!("{}/gone.png", server.uri()));
        let err = fetch_image(&client, &gone).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
