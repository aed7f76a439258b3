use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::hue::command::{parse_line, Command, ParseError};

/// Slots in the queue between the command source and the scheduler
pub const HANDOFF_CAPACITY: usize = 1;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read command input: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ParseError,
    },
}

/// What the command source produced for one line
#[derive(Debug)]
pub enum StreamOutcome {
    Commands(Vec<Command>),
    EndOfInput,
    Error(SourceError),
}

impl StreamOutcome {
    /// `EndOfInput` and `Error` end the feed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamOutcome::Commands(_))
    }
}

/// Spawns the command source on the runtime and returns the receiving end of
/// its handoff queue.
pub fn spawn_command_source<R>(input: R) -> (mpsc::Receiver<StreamOutcome>, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
    let handle = tokio::spawn(run_command_source(input, tx));
    (rx, handle)
}

/// Reads lines until end of input or the first failure, forwarding one
/// outcome per line. Nothing is read or sent after a terminal outcome.
pub async fn run_command_source<R>(input: R, tx: mpsc::Sender<StreamOutcome>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();
    let mut line_number = 0usize;

    loop {
        let outcome = match lines.next_line().await {
            Ok(Some(line)) => {
                line_number += 1;
                match parse_line(&line) {
                    Ok(commands) => {
                        debug!("line {}: {} command(s)", line_number, commands.len());
                        StreamOutcome::Commands(commands)
                    }
                    Err(source) => {
                        warn!("line {}: {}", line_number, source);
                        StreamOutcome::Error(SourceError::Parse {
                            line: line_number,
                            source,
                        })
                    }
                }
            }
            Ok(None) => {
                info!("Exiting cleanly...");
                StreamOutcome::EndOfInput
            }
            Err(e) => {
                warn!("Command input failed: {}", e);
                StreamOutcome::Error(e.into())
            }
        };

        let terminal = outcome.is_terminal();
        if tx.send(outcome).await.is_err() {
            debug!("Scheduler dropped the command queue, stopping input");
            return;
        }
        if terminal {
            return;
        }
    }
}
