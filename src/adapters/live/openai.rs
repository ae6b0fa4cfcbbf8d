//! Live adapter for the `OpenAI` image generation API.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ImageError;
use crate::ports::image_generator::{
    GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest, ImageResponse,
};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Bodies longer than this are cut when quoted in error messages.
const MAX_QUOTED_BODY: usize = 500;

/// Live `OpenAI` image generator that calls the `OpenAI` Images API.
pub struct OpenAiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiGenerator {
    /// Create a new `OpenAI` generator with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, OPENAI_API_BASE.to_string())
    }

    /// Create a generator that talks to a compatible API at `base_url`.
    #[must_use]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { client: Client::new(), api_key, base_url }
    }

    async fn download(&self, url: &str) -> Result<GeneratedImage, ImageError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Api {
                status: status.as_u16(),
                message: format!("Failed to download image from {url}"),
            });
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let data = response.bytes().await?.to_vec();
        Ok(GeneratedImage { data, mime_type })
    }
}

impl ImageGenerator for OpenAiGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let body = serde_json::json!({
                "model": request.model,
                "prompt": request.prompt,
                "n": 1,
                "size": request.size.as_str(),
                "quality": request.quality,
            });

            tracing::debug!(model = %request.model, size = %request.size, "Sending image request");

            let response = self
                .client
                .post(format!("{}/images/generations", self.base_url))
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;

            if !status.is_success() {
                return Err(classify_error(status.as_u16(), &response_text));
            }

            let mut images = Vec::new();
            for source in parse_sources(&response_text)? {
                let image = match source {
                    ImageSource::Inline(data) => {
                        GeneratedImage { data, mime_type: "image/png".to_string() }
                    }
                    ImageSource::Url(url) => self.download(&url).await?,
                };
                images.push(image);
            }

            Ok(ImageResponse { images })
        })
    }
}

/// Where the bytes of one generated image can be found.
#[derive(Debug, PartialEq, Eq)]
enum ImageSource {
    /// Decoded `b64_json` payload.
    Inline(Vec<u8>),
    /// Hosted image that still has to be fetched.
    Url(String),
}

/// Parse a successful response body into image sources.
fn parse_sources(body: &str) -> Result<Vec<ImageSource>, ImageError> {
    let parsed: OpenAiResponse = serde_json::from_str(body)
        .map_err(|e| ImageError::MalformedResponse(format!("Failed to parse response: {e}")))?;

    let mut sources = Vec::with_capacity(parsed.data.len());
    for item in parsed.data {
        let source = match (item.b64_json, item.url) {
            (Some(b64), _) => {
                let data = base64::engine::general_purpose::STANDARD.decode(&b64).map_err(|e| {
                    ImageError::MalformedResponse(format!("Failed to decode base64: {e}"))
                })?;
                ImageSource::Inline(data)
            }
            (None, Some(url)) if !url.is_empty() => ImageSource::Url(url),
            _ => {
                return Err(ImageError::MalformedResponse(
                    "Image entry has neither b64_json nor url".into(),
                ));
            }
        };
        sources.push(source);
    }

    if sources.is_empty() {
        return Err(ImageError::MalformedResponse(format!(
            "No images in response. Body: {}",
            quote_body(body)
        )));
    }

    Ok(sources)
}

/// Map an error response to the matching per-job error.
fn classify_error(status: u16, body: &str) -> ImageError {
    let message = serde_json::from_str::<OpenAiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| quote_body(body));

    match status {
        401 | 403 => ImageError::Unauthorized { status, message },
        429 => ImageError::RateLimited { message },
        _ => ImageError::Api { status, message },
    }
}

fn quote_body(body: &str) -> String {
    match body.char_indices().nth(MAX_QUOTED_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

// --- OpenAI API response types ---

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    b64_json: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}
