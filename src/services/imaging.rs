use bytes::{Bytes, BytesMut};
use image::imageops::FilterType;
use reqwest::{Client, Url};
use std::time::Duration;
use crate::errors::{AppError, AppResult};

/// RGB pixels scaled to [-1, 1], row-major, `size x size x 3`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pub size: u32,
    pub pixels: Vec<f32>,
}

impl NormalizedImage {
    /// Nested `[row][col][channel]` view, the shape model servers expect.
    pub fn to_nested(&self) -> Vec<Vec<[f32; 3]>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.pixels
            .chunks_exact(3 * self.size as usize)
            .map(|row| {
                row.chunks_exact(3)
                    .map(|px| [px[0], px[1], px[2]])
                    .collect()
            })
            .collect()
    }
}

/// Decodes an uploaded or fetched image and prepares it for the classifier:
/// RGB conversion, square resize, then Inception scaling (`x / 127.5 - 1`).
pub fn normalize(bytes: &[u8], size: u32) -> AppResult<NormalizedImage> {
    if size == 0 {
        return Err(AppError::Internal("Model input size must be positive".into()));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AppError::InvalidInput(format!("Error processing image: {}", e)))?;

    // Palette and alpha images end up as plain RGB here
    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, FilterType::CatmullRom);

    let pixels = resized
        .as_raw()
        .iter()
        .map(|&channel| channel as f32 / 127.5 - 1.0)
        .collect();

    Ok(NormalizedImage { size, pixels })
}

/// Downloads images named by URL in classify requests.
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout, max_bytes })
    }

    pub async fn fetch(&self, raw_url: &str) -> AppResult<Bytes> {
        let raw_url = raw_url.trim();
        if raw_url.is_empty() {
            return Err(AppError::InvalidInput("No url provided".into()));
        }

        let url = Url::parse(raw_url)
            .map_err(|e| AppError::InvalidInput(format!("Invalid url '{}': {}", raw_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::InvalidInput(format!(
                "Unsupported url scheme '{}'",
                url.scheme()
            )));
        }

        tracing::debug!("Fetching image from {}", url);
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Image fetch from {} returned {}", url, status);
            return Err(AppError::InvalidInput(format!("Image url returned {}", status)));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(self.too_large());
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.request_error(e))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.freeze())
    }

    fn request_error(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::UpstreamTimeout(self.timeout.as_secs())
        } else {
            AppError::Upstream(format!("Failed to fetch image: {}", err))
        }
    }

    fn too_large(&self) -> AppError {
        AppError::InvalidInput(format!("Image exceeds {} bytes", self.max_bytes))
    }
}
