//! Hue bridge CLIP v2 API: listing entertainment configurations and
//! starting or stopping streaming on them.

pub mod client;
pub mod configurations;
pub mod error;

pub use client::{DirectoryService, HueClient};
pub use configurations::{select_configuration, EntertainmentConfiguration};
pub use error::HueError;
