//! Executing a single job: one API call, one file.

use std::sync::Arc;

use crate::dispatch::Job;
use crate::error::ImageError;
use crate::output::save_image;
use crate::params::ImageSize;
use crate::ports::{ImageGenerator, ImageRequest};

/// Request settings shared by every job of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Model identifier.
    pub model: String,
    /// Requested image size.
    pub size: ImageSize,
    /// Quality level.
    pub quality: String,
}

impl RenderSettings {
    fn request_for(&self, job: &Job) -> ImageRequest {
        ImageRequest {
            model: self.model.clone(),
            prompt: job.prompt.text.clone(),
            size: self.size,
            quality: self.quality.clone(),
        }
    }
}

/// Generate the image for `job` and write it to the job's output path.
///
/// # Errors
///
/// Returns the API, response or write error that stopped this job.
pub async fn render_job(
    generator: Arc<dyn ImageGenerator>,
    settings: Arc<RenderSettings>,
    job: Job,
) -> Result<usize, ImageError> {
    let request = settings.request_for(&job);
    let image = generator.generate(&request).await?.into_first()?;
    tracing::debug!(index = job.prompt.index, mime = %image.mime_type, "Image received");
    save_image(&image.data, &job.output_path).await
}
