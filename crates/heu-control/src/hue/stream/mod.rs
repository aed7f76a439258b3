//! Entertainment streaming: frame encoding, command ingestion and the
//! fixed-rate send loop.

pub mod manager;
pub mod protocol;
pub mod source;
pub mod transport;

pub use manager::{
    DuplicatePolicy, StreamError, StreamScheduler, StreamSettings, DEFAULT_FREQUENCY_HZ,
    MAX_FREQUENCY_HZ,
};
pub use protocol::{ColorSpace, FrameBuilder, FrameError};
pub use source::{spawn_command_source, SourceError, StreamOutcome};
pub use transport::{LogTransport, Transport, TransportError, UdpTransport};
