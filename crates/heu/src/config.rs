//! Configuration loading
//!
//! Values come from a TOML file, then `HEU_*` environment variables override
//! them, then command line flags override both. A `.env` file in the working
//! directory (or a parent) supplies environment variables that the process
//! environment does not already set.
//!
//! ```toml
//! bridge_ip = "192.168.1.5"
//! hue_application_key = "..."
//!
//! [stream]
//! frequency = 60
//! color_space = "rgb"
//! duplicates = "last-write-wins"
//! handshake_timeout_secs = 30
//! relay = "127.0.0.1:2100"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use heu_control::hue::stream::{
    ColorSpace, DuplicatePolicy, DEFAULT_FREQUENCY_HZ, MAX_FREQUENCY_HZ,
};
use heu_control::HueConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "heu.toml";
pub const ENV_PREFIX: &str = "HEU_";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub frequency: u32,
    pub color_space: ColorSpace,
    pub duplicates: DuplicatePolicy,
    /// Bound on starting the bridge stream and opening the transport
    pub handshake_timeout_secs: u64,
    /// DTLS-terminating relay that receives the plain UDP frames
    pub relay: Option<SocketAddr>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY_HZ,
            color_space: ColorSpace::Rgb,
            duplicates: DuplicatePolicy::LastWriteWins,
            handshake_timeout_secs: 30,
            relay: None,
        }
    }
}

impl StreamConfig {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_FREQUENCY_HZ).contains(&self.frequency) {
            bail!(
                "stream frequency {} Hz is outside 1..={} Hz",
                self.frequency,
                MAX_FREQUENCY_HZ
            );
        }
        if self.handshake_timeout_secs == 0 {
            bail!("handshake_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub hue: HueConfig,
    pub stream: StreamConfig,
}

impl AppConfig {
    /// Loads the explicit file if given, otherwise the first default file
    /// that exists, then applies the environment and `.env`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_paths().into_iter().find(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        let dotenv = dotenv_vars(None);
        config.apply_env(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))?;
        config.stream.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        tracing::debug!("Loaded config file: {:?}", path);
        Ok(config)
    }

    /// Overrides fields from `HEU_*` variables returned by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("BRIDGE_IP") {
            self.hue.bridge_ip = value;
        }
        if let Some(value) = var("HUE_APPLICATION_KEY") {
            self.hue.hue_application_key = value;
        }
        if let Some(value) = var("FREQUENCY") {
            self.stream.frequency = value
                .parse()
                .with_context(|| format!("{}FREQUENCY is not a number: {}", ENV_PREFIX, value))?;
        }
        if let Some(value) = var("COLOR_SPACE") {
            self.stream.color_space = value.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(value) = var("DUPLICATES") {
            self.stream.duplicates = value.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(value) = var("HANDSHAKE_TIMEOUT_SECS") {
            self.stream.handshake_timeout_secs = value.parse().with_context(|| {
                format!("{}HANDSHAKE_TIMEOUT_SECS is not a number: {}", ENV_PREFIX, value)
            })?;
        }
        if let Some(value) = var("RELAY") {
            self.stream.relay = Some(value.parse().with_context(|| {
                format!("{}RELAY is not a socket address: {}", ENV_PREFIX, value)
            })?);
        }
        Ok(())
    }
}

/// Variables from a `.env` file: `path`, or the first `.env` found from the
/// working directory upwards. A missing file yields nothing.
pub fn dotenv_vars(path: Option<&Path>) -> HashMap<String, String> {
    let entries = match path {
        Some(path) => dotenvy::from_path_iter(path),
        None => dotenvy::dotenv_iter(),
    };
    let entries = match entries {
        Ok(entries) => entries,
        Err(e) => {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
            return HashMap::new();
        }
    };

    let mut vars = HashMap::new();
    for entry in entries {
        match entry {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed .env entry: {}", e);
            }
        }
    }
    vars
}

/// `<config dir>/heu/heu.toml`, then `heu.toml` next to the executable
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("heu").join(CONFIG_FILE_NAME));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join(CONFIG_FILE_NAME));
    }
    paths
}
