use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use super::api::configurations::EntertainmentConfiguration;
use super::api::error::HueError;
use super::stream::protocol::{ColorSpace, MAX_CHANNELS, SESSION_ID_SIZE};
use super::stream::transport::STREAM_PORT;
use crate::error::{ControlError, Result};

/// Bridge address and credentials
#[derive(Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HueConfig {
    pub bridge_ip: String,
    pub hue_application_key: String, // Sent as "hue-application-key" in REST headers
}

impl std::fmt::Debug for HueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HueConfig")
            .field("bridge_ip", &self.bridge_ip)
            .field("hue_application_key", &"***REDACTED***")
            .finish()
    }
}

impl HueConfig {
    pub fn bridge_addr(&self) -> std::result::Result<IpAddr, HueError> {
        self.bridge_ip.parse().map_err(|_| {
            HueError::InvalidConfig(format!("bridge_ip '{}' is not an IP address", self.bridge_ip))
        })
    }

    /// Address of the bridge's entertainment streaming endpoint
    pub fn stream_addr(&self) -> std::result::Result<SocketAddr, HueError> {
        Ok(SocketAddr::new(self.bridge_addr()?, STREAM_PORT))
    }

    /// Picks the datagram target for a live stream.
    ///
    /// The bridge endpoint only accepts DTLS, so frames must go through a
    /// relay that terminates DTLS towards the bridge.
    pub fn relay_target(
        &self,
        relay: Option<SocketAddr>,
    ) -> std::result::Result<SocketAddr, HueError> {
        let relay = relay.ok_or_else(|| {
            HueError::InvalidConfig(
                "no relay configured: the bridge accepts DTLS only and heu sends plain UDP; \
                 pass --relay <addr> of a DTLS-terminating relay or use --dry-run"
                    .to_string(),
            )
        })?;

        let bridge = self.stream_addr()?;
        if relay == bridge {
            return Err(HueError::InvalidConfig(format!(
                "relay {} is the bridge's DTLS endpoint, which drops plain UDP frames",
                relay
            )));
        }
        Ok(relay)
    }

    /// Checks everything needed to talk to the bridge.
    pub fn validate(&self) -> std::result::Result<(), HueError> {
        self.bridge_addr()?;
        if self.hue_application_key.is_empty() {
            return Err(HueError::InvalidConfig(
                "hue_application_key is missing".to_string(),
            ));
        }
        Ok(())
    }
}

/// The streaming context: which entertainment configuration, which channels
/// and which colour space. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    channel_ids: Vec<u8>,
    color_space: ColorSpace,
}

impl Session {
    /// Builds a session. Repeated channel ids keep their first position.
    pub fn new(
        id: impl Into<String>,
        channel_ids: impl IntoIterator<Item = u8>,
        color_space: ColorSpace,
    ) -> Result<Self> {
        let id = id.into();
        if id.len() != SESSION_ID_SIZE || !id.is_ascii() {
            return Err(ControlError::InvalidSession(format!(
                "session id '{}' must be {} ASCII characters",
                id, SESSION_ID_SIZE
            )));
        }

        let mut unique = Vec::new();
        for channel_id in channel_ids {
            if !unique.contains(&channel_id) {
                unique.push(channel_id);
            }
        }
        if unique.len() > MAX_CHANNELS {
            return Err(ControlError::InvalidSession(format!(
                "{} channels exceed the frame limit of {}",
                unique.len(),
                MAX_CHANNELS
            )));
        }

        Ok(Self {
            id,
            channel_ids: unique,
            color_space,
        })
    }

    pub fn from_configuration(
        config: &EntertainmentConfiguration,
        color_space: ColorSpace,
    ) -> Result<Self> {
        Self::new(
            config.id.clone(),
            config.channels.iter().map(|c| c.channel_id),
            color_space,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel_ids(&self) -> &[u8] {
        &self.channel_ids
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }
}
