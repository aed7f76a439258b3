//! Philips Hue Entertainment streaming

pub mod api;
pub mod command;
pub mod models;
pub mod stream;

pub use command::{parse_line, Command, ParseError, Target};
pub use models::{HueConfig, Session};
