//! Replaying adapter for the `ImageGenerator` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result, Replayed};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::ImageError;
use crate::ports::image_generator::{GenerateFuture, ImageGenerator, ImageRequest, ImageResponse};

/// Serves recorded image generation results from a cassette.
pub struct ReplayingImageGenerator {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingImageGenerator {
    /// Create a replaying generator backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

impl ImageGenerator for ReplayingImageGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let output = next_output(&self.replayer, "image_generator", "generate", request);
        Box::pin(async move {
            let output = output.map_err(ImageError::Replay)?;
            match replay_result::<ImageResponse>(output) {
                Ok(Replayed::Ok(response)) => Ok(response),
                Ok(Replayed::Err(message)) => Err(ImageError::Recorded(message)),
                Err(e) => Err(ImageError::Replay(format!("Unreadable recorded response: {e}"))),
            }
        })
    }
}
