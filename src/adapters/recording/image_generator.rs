//! Captures every generator call of a run, successful or not.

use std::sync::{Arc, Mutex, PoisonError};

use crate::cassette::recorder::CassetteRecorder;
use crate::ports::image_generator::{GenerateFuture, ImageGenerator, ImageRequest};

/// Forwards requests to a live generator and appends each result to a shared cassette.
pub struct RecordingImageGenerator {
    live: Box<dyn ImageGenerator>,
    cassette: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingImageGenerator {
    /// Wrap `live` so every call is also appended to `cassette`.
    #[must_use]
    pub fn new(live: Box<dyn ImageGenerator>, cassette: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { live, cassette }
    }
}

impl ImageGenerator for RecordingImageGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let outcome = self.live.generate(&request).await;
            // Jobs finish concurrently; the lock only orders the appends.
            let recorded = self
                .cassette
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record("image_generator", "generate", &request, &outcome);
            if let Err(e) = recorded {
                tracing::warn!(error = %e, prompt = %request.prompt, "Interaction not recorded");
            }
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::error::ImageError;
    use crate::params::ImageSize;
    use crate::ports::image_generator::{GeneratedImage, ImageResponse};

    /// Succeeds for prompts starting with "ok", fails otherwise.
    struct Picky;

    impl ImageGenerator for Picky {
        fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
            let ok = request.prompt.starts_with("ok");
            Box::pin(async move {
                if ok {
                    Ok(ImageResponse {
                        images: vec![GeneratedImage {
                            data: vec![1],
                            mime_type: "image/png".into(),
                        }],
                    })
                } else {
                    Err(ImageError::RateLimited { message: "slow down".into() })
                }
            })
        }
    }

    fn request(prompt: &str) -> ImageRequest {
        ImageRequest {
            model: "gpt-image-1".into(),
            prompt: prompt.into(),
            size: ImageSize::Auto,
            quality: "auto".into(),
        }
    }

    #[tokio::test]
    async fn records_successes_and_failures() {
        let cassette = Arc::new(Mutex::new(CassetteRecorder::new(
            PathBuf::from("unused.yaml"),
            "test",
            "unknown",
        )));
        let generator = RecordingImageGenerator::new(Box::new(Picky), Arc::clone(&cassette));

        let ok = generator.generate(&request("ok fox")).await.unwrap();
        assert_eq!(ok.images[0].data, vec![1]);
        let err = generator.generate(&request("no fox")).await.unwrap_err();
        assert!(matches!(err, ImageError::RateLimited { .. }));

        assert_eq!(cassette.lock().unwrap().interaction_count(), 2);
    }
}
