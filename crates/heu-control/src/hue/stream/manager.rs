use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace};

use super::protocol::{FrameBuilder, FrameError};
use super::source::{SourceError, StreamOutcome};
use super::transport::{Transport, TransportError};
use crate::hue::command::{Command, Target};
use crate::hue::models::Session;

pub const DEFAULT_FREQUENCY_HZ: u32 = 60;
/// Highest accepted frame rate
pub const MAX_FREQUENCY_HZ: u32 = 1000;

/// How repeated channel ids within one command batch are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// One entry per channel: it keeps the slot of the first write and the
    /// colour of the last.
    #[default]
    LastWriteWins,
    /// One entry per write. Receivers decide which entry applies.
    Append,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::LastWriteWins => write!(f, "last-write-wins"),
            DuplicatePolicy::Append => write!(f, "append"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-write-wins" => Ok(DuplicatePolicy::LastWriteWins),
            "append" => Ok(DuplicatePolicy::Append),
            other => Err(format!(
                "unknown duplicate policy '{}' (expected last-write-wins or append)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    pub frequency_hz: u32,
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            frequency_hz: DEFAULT_FREQUENCY_HZ,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl StreamSettings {
    /// Time between two frames
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.frequency_hz.max(1)
    }
}

#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("command source stopped without reporting an outcome")]
    SourceDisconnected,

    #[error("failed to send frame: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("frequency {0} Hz is outside 1..={max} Hz", max = MAX_FREQUENCY_HZ)]
    InvalidFrequency(u32),
}

enum SchedulerState {
    Running,
    /// Input is over; one more frame is owed before returning the outcome
    Draining(Result<(), StreamError>),
    Stopped,
}

/// Owns the frame and the transport, and emits one frame per tick.
pub struct StreamScheduler<T: Transport> {
    session: Session,
    settings: StreamSettings,
    builder: FrameBuilder,
    transport: T,
    frames_sent: u64,
}

impl<T: Transport> StreamScheduler<T> {
    pub fn new(session: Session, transport: T, settings: StreamSettings) -> Result<Self, StreamError> {
        let frequency_hz = settings.frequency_hz;
        if !(1..=MAX_FREQUENCY_HZ).contains(&frequency_hz) || settings.period().is_zero() {
            return Err(StreamError::InvalidFrequency(frequency_hz));
        }

        let mut builder = FrameBuilder::new(session.color_space());
        builder.write_preamble(session.id().as_bytes())?;

        Ok(Self {
            session,
            settings,
            builder,
            transport,
            frames_sent: 0,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The frame the next tick will send
    pub fn frame(&self) -> &[u8] {
        self.builder.build()
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Replaces the frame body with one command batch.
    ///
    /// Broadcasts expand to every session channel in membership order.
    pub fn apply_batch(&mut self, commands: &[Command]) -> Result<(), FrameError> {
        let channel_ids = self.session.channel_ids();
        let writes = commands.iter().flat_map(|command| {
            let targets: &[u8] = match &command.target {
                Target::Broadcast => channel_ids,
                Target::Channel(id) => std::slice::from_ref(id),
            };
            targets.iter().map(move |id| (*id, command.color))
        });

        self.builder.reset_body();
        match self.settings.duplicate_policy {
            DuplicatePolicy::Append => {
                for (channel_id, color) in writes {
                    self.builder.write_channel_color(channel_id, color)?;
                }
            }
            DuplicatePolicy::LastWriteWins => {
                let mut resolved: Vec<(u8, Srgb)> = Vec::with_capacity(channel_ids.len());
                for (channel_id, color) in writes {
                    match resolved.iter_mut().find(|(id, _)| *id == channel_id) {
                        Some(slot) => slot.1 = color,
                        None => resolved.push((channel_id, color)),
                    }
                }
                for (channel_id, color) in resolved {
                    self.builder.write_channel_color(channel_id, color)?;
                }
            }
        }

        debug!(
            "Applied {} command(s), frame now holds {} channel(s)",
            commands.len(),
            self.builder.channel_count()
        );
        Ok(())
    }

    async fn send_frame(&mut self) -> Result<(), TransportError> {
        self.transport.write(self.builder.build()).await?;
        self.frames_sent += 1;
        trace!("Sent frame {}", self.frames_sent);
        Ok(())
    }

    /// Runs until the command feed ends and the final frame is flushed, or
    /// until a frame cannot be built or sent.
    ///
    /// Returns `Ok` after end of input and the source's error otherwise.
    pub async fn run(
        &mut self,
        mut outcomes: mpsc::Receiver<StreamOutcome>,
    ) -> Result<(), StreamError> {
        let period = self.settings.period();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Streaming to {} ({} channel(s), {} Hz, {})",
            self.session.id(),
            self.session.channel_ids().len(),
            self.settings.frequency_hz,
            self.session.color_space()
        );

        let mut state = SchedulerState::Running;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.send_frame().await {
                        error!("Error sending Hue stream frame: {}", e);
                        return Err(e.into());
                    }
                    match std::mem::replace(&mut state, SchedulerState::Stopped) {
                        SchedulerState::Draining(result) => {
                            info!("Final frame sent after {} frame(s)", self.frames_sent);
                            return result;
                        }
                        other => state = other,
                    }
                }
                outcome = outcomes.recv(), if matches!(state, SchedulerState::Running) => {
                    state = match outcome {
                        Some(StreamOutcome::Commands(commands)) => {
                            self.apply_batch(&commands)?;
                            SchedulerState::Running
                        }
                        Some(StreamOutcome::EndOfInput) => {
                            debug!("End of input, draining");
                            SchedulerState::Draining(Ok(()))
                        }
                        Some(StreamOutcome::Error(e)) => {
                            debug!("Command source failed, draining: {}", e);
                            SchedulerState::Draining(Err(e.into()))
                        }
                        None => SchedulerState::Draining(Err(StreamError::SourceDisconnected)),
                    };
                }
            }
        }
    }
}
