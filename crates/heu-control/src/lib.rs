//! heu Control - Hue Entertainment streaming core
//!
//! This crate turns a live feed of colour commands into HueStream v2 frames
//! sent at a fixed rate:
//! - **Commands**: `#rrggbb` / `<channel> #rrggbb` clauses, `;`-separated
//! - **Frames**: fixed-capacity encoder for the 52-byte preamble and 7-byte channel entries
//! - **Streaming**: command source task plus a tick-driven scheduler
//! - **Bridge API**: listing entertainment configurations, starting and stopping streaming
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heu_control::hue::stream::{spawn_command_source, ColorSpace, LogTransport, StreamScheduler, StreamSettings};
//! use heu_control::hue::Session;
//!
//! # async fn run() -> heu_control::Result<()> {
//! let session = Session::new("1a8d99cc-967b-44f2-9202-43f976c0fa6b", [0, 1, 2], ColorSpace::Rgb)?;
//! let mut scheduler = StreamScheduler::new(session, LogTransport::new(), StreamSettings::default())?;
//!
//! let (outcomes, _source) = spawn_command_source(&b"#FF0000\n1 #00FF00\n"[..]);
//! scheduler.run(outcomes).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`hue::command`] - command line parsing
//! - [`hue::stream`] - frame encoding, command source, scheduler, transports
//! - [`hue::api`] - bridge CLIP v2 client
//! - [`error`] - Error types

#![allow(missing_docs)]

/// Error types
pub mod error;

/// Philips Hue Entertainment streaming
pub mod hue;

// Re-exports
pub use error::{ControlError, Result};
pub use hue::{parse_line, Command, HueConfig, ParseError, Session, Target};
