use clap::{Args, Parser, Subcommand};
use heu_control::hue::stream::{ColorSpace, DuplicatePolicy, MAX_FREQUENCY_HZ};
use std::net::SocketAddr;
use std::path::PathBuf;

/// heu (Hue Entertainment Utility): stream colour commands to a Philips Hue
/// bridge. You provide channel and colour information, and it handles the
/// details.
#[derive(Parser, Debug)]
#[command(name = "heu")]
#[command(about = "Hue Entertainment Utility", long_about = None)]
pub struct Cli {
    /// Alternate config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show more logs
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List entertainment configurations as JSON
    List,
    /// Stream colour commands from standard input (or a file) to a session
    Stream(StreamArgs),
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Entertainment configuration id (defaults to the first one)
    pub config_id: Option<String>,

    /// File from which to read commands (defaults to standard input)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Frequency in Hz at which to send frames (1 to 1000)
    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_FREQUENCY_HZ))
    )]
    pub frequency: Option<u32>,

    /// Colour space of the frames: rgb or xy
    #[arg(long)]
    pub color_space: Option<ColorSpace>,

    /// Handling of repeated channels in one line: last-write-wins or append
    #[arg(long)]
    pub duplicates: Option<DuplicatePolicy>,

    /// DTLS-terminating relay that forwards frames to the bridge
    #[arg(long, value_name = "ADDR")]
    pub relay: Option<SocketAddr>,

    /// Log frames instead of contacting the bridge
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Channel ids of the simulated session used by --dry-run
    #[arg(long, value_delimiter = ',', default_value = "0")]
    pub channels: Vec<u8>,
}

impl Cli {
    /// Parse CLI arguments from the environment
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
