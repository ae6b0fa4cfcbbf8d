//! Adapter implementations for port traits.
//!
//! - `live/` - `OpenAI` Images API client
//! - `recording/` - Wraps a live adapter and captures each call to a cassette
//! - `replaying/` - Serves captured calls back without touching the network

pub mod live;
pub mod recording;
pub mod replaying;
