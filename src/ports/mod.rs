//! Boundary between the job pipeline and the image service.
//!
//! The pipeline only talks to [`ImageGenerator`]; the live, recording and
//! replaying implementations live in `src/adapters/`.

pub mod image_generator;

pub use image_generator::{ImageGenerator, ImageRequest};
