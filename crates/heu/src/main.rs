//! heu - Hue Entertainment Utility
//!
//! Reads colour commands line by line and streams them to a Philips Hue
//! entertainment configuration at a fixed rate.

mod cli;
mod config;
mod logging_setup;

use anyhow::{anyhow, Context, Result};
use heu_control::hue::api::{select_configuration, DirectoryService, HueClient};
use heu_control::hue::stream::{
    spawn_command_source, LogTransport, StreamScheduler, StreamSettings, Transport, UdpTransport,
};
use heu_control::Session;
use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::{error, info, warn};

use cli::{Cli, Command, StreamArgs};
use config::AppConfig;

/// Session id used when no bridge is involved
const DRY_RUN_SESSION_ID: &str = "00000000-0000-0000-0000-000000000000";

type CommandInput = Box<dyn AsyncRead + Unpin + Send>;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging_setup::init(cli.verbose) {
        eprintln!("Warning: {:#}", e);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(cli));
    // A pending read on standard input must not hold the process open
    runtime.shutdown_timeout(Duration::from_millis(100));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::debug!("Loaded config: {:?}", config);

    match cli.command {
        Command::List => run_list(&config).await,
        Command::Stream(args) => run_stream(&config, args).await,
    }
}

async fn run_list(config: &AppConfig) -> Result<()> {
    let client = HueClient::new(&config.hue)?;
    let configurations = client.list_configurations().await?;
    println!("{}", serde_json::to_string(&configurations)?);
    Ok(())
}

async fn run_stream(config: &AppConfig, args: StreamArgs) -> Result<()> {
    let settings = StreamSettings {
        frequency_hz: args.frequency.unwrap_or(config.stream.frequency),
        duplicate_policy: args.duplicates.unwrap_or(config.stream.duplicates),
    };
    let color_space = args.color_space.unwrap_or(config.stream.color_space);
    let input = open_input(args.file.as_deref()).await?;

    if args.dry_run {
        let session = Session::new(DRY_RUN_SESSION_ID, args.channels.iter().copied(), color_space)?;
        return drive(session, LogTransport::new(), settings, input).await;
    }

    config.hue.validate()?;
    let relay = config.hue.relay_target(args.relay.or(config.stream.relay))?;
    let client = HueClient::new(&config.hue)?;

    let configuration = select_configuration(
        client.list_configurations().await?,
        args.config_id.as_deref(),
    )?;
    let session = Session::from_configuration(&configuration, color_space)?;
    info!(
        "Using entertainment configuration '{}' ({})",
        configuration.name(),
        configuration.id
    );

    let session_id = session.id().to_string();
    let result = establish_and_drive(&client, config, session, relay, settings, input).await;

    if let Err(e) = client.stop_session(&session_id).await {
        warn!("Failed to stop entertainment session: {}", e);
    }
    result
}

/// Starts the bridge stream and opens the relay transport within the
/// handshake timeout, then streams.
async fn establish_and_drive(
    client: &HueClient,
    config: &AppConfig,
    session: Session,
    relay: SocketAddr,
    settings: StreamSettings,
    input: CommandInput,
) -> Result<()> {
    let timeout = config.stream.handshake_timeout();
    let establish = async {
        client.start_session(session.id()).await?;
        Ok::<_, anyhow::Error>(UdpTransport::connect(relay).await?)
    };
    let transport = tokio::time::timeout(timeout, establish)
        .await
        .map_err(|_| anyhow!("Timed out after {:?} establishing the streaming session", timeout))??;

    drive(session, transport, settings, input).await
}

async fn open_input(path: Option<&Path>) -> Result<CommandInput> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open command file: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => {
            info!("Enter colour commands now (ctrl+d to exit)");
            Ok(Box::new(tokio::io::stdin()))
        }
    }
}

/// Runs the command source and the scheduler until input ends, an error
/// occurs or the process is interrupted.
async fn drive<T: Transport>(
    session: Session,
    transport: T,
    settings: StreamSettings,
    input: CommandInput,
) -> Result<()> {
    let mut scheduler = StreamScheduler::new(session, transport, settings)?;
    let (outcomes, _source) = spawn_command_source(input);

    tokio::select! {
        result = scheduler.run(outcomes) => {
            result.context("Streaming stopped")?;
            info!("Stream finished after {} frame(s)", scheduler.frames_sent());
            Ok(())
        }
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    }
}
