use super::configurations::{EntertainmentConfiguration, V2Response};
use super::error::HueError;
use crate::hue::models::HueConfig;
use serde::Serialize;
use std::time::Duration;

/// Where entertainment configurations come from and how streaming is
/// switched on and off for one of them.
#[async_trait::async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list_configurations(&self) -> Result<Vec<EntertainmentConfiguration>, HueError>;

    async fn start_session(&self, configuration_id: &str) -> Result<(), HueError>;

    async fn stop_session(&self, configuration_id: &str) -> Result<(), HueError>;
}

#[derive(Serialize)]
struct StreamAction<'a> {
    action: &'a str,
}

/// CLIP v2 client for a single bridge.
pub struct HueClient {
    http: reqwest::Client,
    base_url: String,
    application_key: String,
}

impl HueClient {
    /// Creates a client. The bridge serves a self-signed certificate, so
    /// certificate validation is disabled.
    pub fn new(config: &HueConfig) -> Result<Self, HueError> {
        let bridge = config.bridge_addr()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(HueError::Network)?;

        let host = match bridge {
            std::net::IpAddr::V4(ip) => ip.to_string(),
            std::net::IpAddr::V6(ip) => format!("[{}]", ip),
        };

        Ok(Self {
            http,
            base_url: format!("https://{}/clip/v2", host),
            application_key: config.hue_application_key.clone(),
        })
    }

    fn configuration_url(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => format!(
                "{}/resource/entertainment_configuration/{}",
                self.base_url, id
            ),
            None => format!("{}/resource/entertainment_configuration", self.base_url),
        }
    }

    async fn set_stream_active(&self, id: &str, active: bool) -> Result<(), HueError> {
        let action = if active { "start" } else { "stop" };

        let resp = self
            .http
            .put(self.configuration_url(Some(id)))
            .header("hue-application-key", &self.application_key)
            .json(&StreamAction { action })
            .send()
            .await?;

        let status = resp.status();
        let response_text = resp.text().await?;

        if !status.is_success() {
            return Err(HueError::ApiError(format!(
                "Failed to {} stream: HTTP {} - {}",
                action, status, response_text
            )));
        }

        let response: V2Response<serde_json::Value> = serde_json::from_str(&response_text)?;
        response.into_result()?;

        tracing::debug!("Entertainment configuration {} stream {}", id, action);
        Ok(())
    }
}

#[async_trait::async_trait]
impl DirectoryService for HueClient {
    async fn list_configurations(&self) -> Result<Vec<EntertainmentConfiguration>, HueError> {
        let resp = self
            .http
            .get(self.configuration_url(None))
            .header("hue-application-key", &self.application_key)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HueError::ApiError(format!(
                "Failed to get entertainment configurations: HTTP {}",
                resp.status()
            )));
        }

        let response: V2Response<EntertainmentConfiguration> = resp.json().await?;
        response.into_result()
    }

    async fn start_session(&self, configuration_id: &str) -> Result<(), HueError> {
        self.set_stream_active(configuration_id, true).await
    }

    async fn stop_session(&self, configuration_id: &str) -> Result<(), HueError> {
        self.set_stream_active(configuration_id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HueConfig {
        HueConfig {
            bridge_ip: "192.168.1.5".to_string(),
            hue_application_key: "key".to_string(),
        }
    }

    #[test]
    fn test_configuration_urls() {
        let client = HueClient::new(&config()).unwrap();
        assert_eq!(
            client.configuration_url(None),
            "https://192.168.1.5/clip/v2/resource/entertainment_configuration"
        );
        assert_eq!(
            client.configuration_url(Some("abc")),
            "https://192.168.1.5/clip/v2/resource/entertainment_configuration/abc"
        );
    }

    #[test]
    fn test_client_requires_ip() {
        let mut config = config();
        config.bridge_ip = "not-an-ip".to_string();
        assert!(matches!(
            HueClient::new(&config),
            Err(HueError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stream_action_body() {
        let body = serde_json::to_string(&StreamAction { action: "start" }).unwrap();
        assert_eq!(body, r#"{"action":"start"}"#);
    }
}
