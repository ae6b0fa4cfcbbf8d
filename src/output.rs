//! Output directory handling and image saving.

use std::path::{Path, PathBuf};

use crate::error::ImageError;

/// Path of the image for prompt `index`: `<dir>/<index>.png`.
#[must_use]
pub fn image_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{index}.png"))
}

/// Make sure `dir` exists and is a directory, creating it if absent.
///
/// # Errors
///
/// Returns a config error if `dir` exists but is not a directory, or if it
/// cannot be created.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ImageError> {
    if dir.exists() && !dir.is_dir() {
        return Err(ImageError::Config(format!(
            "Output path {} exists and is not a directory",
            dir.display()
        )));
    }
    std::fs::create_dir_all(dir).map_err(|e| {
        ImageError::Config(format!("Cannot create output directory {}: {e}", dir.display()))
    })
}

/// Write raw image bytes to `path` and return how many were written.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn save_image(data: &[u8], path: &Path) -> Result<usize, ImageError> {
    tokio::fs::write(path, data).await?;
    Ok(data.len())
}
