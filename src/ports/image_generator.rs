//! Image generator port for AI image generation APIs.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ImageError;
use crate::params::ImageSize;

/// A request to generate one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Model identifier (e.g., `"gpt-image-1"`).
    pub model: String,
    /// The text prompt describing the desired image.
    pub prompt: String,
    /// Output dimensions.
    pub size: ImageSize,
    /// Quality level (`"auto"`, `"low"`, `"medium"`, `"high"`).
    pub quality: String,
}

/// A single generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Raw image bytes (decoded from base64 or downloaded).
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// MIME type of the image (e.g., `"image/png"`).
    pub mime_type: String,
}

/// Response containing generated images.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResponse {
    /// The generated images.
    pub images: Vec<GeneratedImage>,
}

impl ImageResponse {
    /// Take the first image, rejecting an empty response or empty payload.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::MalformedResponse`] when there is no usable image.
    pub fn into_first(self) -> Result<GeneratedImage, ImageError> {
        let image = self
            .images
            .into_iter()
            .next()
            .ok_or_else(|| ImageError::MalformedResponse("No image data returned".into()))?;
        if image.data.is_empty() {
            return Err(ImageError::MalformedResponse("Image payload is empty".into()));
        }
        Ok(image)
    }
}

/// Boxed future type returned by [`ImageGenerator::generate`].
pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ImageResponse, ImageError>> + Send + 'a>>;

/// Generates images from text prompts via an external API.
///
/// Implementations are shared between concurrently running jobs.
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for the given request.
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings in cassettes.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
