use super::error::HueError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ResourceIdentifier {
    pub rid: String,
    pub rtype: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Metadata {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ChannelMember {
    pub service: ResourceIdentifier,
    pub index: u32,
}

/// One streaming channel. `channel_id` is the id used in frames.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Channel {
    pub channel_id: u8,
    pub position: Position,
    pub members: Vec<ChannelMember>,
}

/// An entertainment configuration (entertainment area) as reported by the bridge
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EntertainmentConfiguration {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub metadata: Metadata,
    pub configuration_type: String,
    pub status: String,
    pub active_streamer: Option<ResourceIdentifier>,
    pub channels: Vec<Channel>,
    pub light_services: Vec<ResourceIdentifier>,
}

impl EntertainmentConfiguration {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub(crate) struct ApiErrorDescription {
    pub description: String,
}

/// CLIP v2 response envelope
#[derive(Deserialize, Debug)]
pub(crate) struct V2Response<T> {
    #[serde(default)]
    pub errors: Vec<ApiErrorDescription>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> V2Response<T> {
    /// Turns reported errors into a `HueError`, otherwise yields the data.
    pub fn into_result(self) -> Result<Vec<T>, HueError> {
        if self.errors.is_empty() {
            return Ok(self.data);
        }
        let descriptions: Vec<String> = self.errors.into_iter().map(|e| e.description).collect();
        Err(HueError::ApiError(descriptions.join("; ")))
    }
}

/// Picks the configuration to stream to: the first one when no id is given,
/// otherwise the one with a matching id.
pub fn select_configuration(
    configurations: Vec<EntertainmentConfiguration>,
    id: Option<&str>,
) -> Result<EntertainmentConfiguration, HueError> {
    if configurations.is_empty() {
        return Err(HueError::NoConfigurations);
    }
    match id {
        None => configurations
            .into_iter()
            .next()
            .ok_or(HueError::NoConfigurations),
        Some(id) => configurations
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| HueError::ConfigurationNotFound(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "errors": [],
            "data": [{
                "id": "1a8d99cc-967b-44f2-9202-43f976c0fa6b",
                "type": "entertainment_configuration",
                "metadata": { "name": "Entertainment area 1" },
                "configuration_type": "screen",
                "status": "inactive",
                "channels": [
                    {
                        "channel_id": 0,
                        "position": { "x": -0.6, "y": 0.8, "z": 0.0 },
                        "members": [{
                            "service": { "rid": "abc", "rtype": "entertainment" },
                            "index": 0
                        }]
                    },
                    {
                        "channel_id": 1,
                        "position": { "x": 0.6, "y": 0.8, "z": 0.0 },
                        "members": []
                    }
                ]
            }, {
                "id": "2b8d99cc-967b-44f2-9202-43f976c0fa6b",
                "metadata": { "name": "Kitchen" },
                "channels": []
            }]
        })
    }

    #[test]
    fn test_parse_v2_entertainment_config() {
        let response: V2Response<EntertainmentConfiguration> =
            serde_json::from_value(sample()).unwrap();
        let data = response.into_result().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].id, "1a8d99cc-967b-44f2-9202-43f976c0fa6b");
        assert_eq!(data[0].name(), "Entertainment area 1");
        assert_eq!(data[0].resource_type, "entertainment_configuration");
        assert_eq!(data[0].channels.len(), 2);
        assert_eq!(data[0].channels[0].members[0].service.rid, "abc");
        assert_eq!(data[0].channels[1].channel_id, 1);
        assert!(data[1].channels.is_empty());
    }

    #[test]
    fn test_response_errors_are_reported() {
        let response: V2Response<EntertainmentConfiguration> = serde_json::from_value(json!({
            "errors": [{ "description": "unauthorized user" }],
            "data": []
        }))
        .unwrap();
        match response.into_result() {
            Err(HueError::ApiError(msg)) => assert_eq!(msg, "unauthorized user"),
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[test]
    fn test_select_configuration() {
        let response: V2Response<EntertainmentConfiguration> =
            serde_json::from_value(sample()).unwrap();
        let data = response.into_result().unwrap();

        let first = select_configuration(data.clone(), None).unwrap();
        assert_eq!(first.name(), "Entertainment area 1");

        let kitchen =
            select_configuration(data.clone(), Some("2b8d99cc-967b-44f2-9202-43f976c0fa6b"))
                .unwrap();
        assert_eq!(kitchen.name(), "Kitchen");

        assert!(matches!(
            select_configuration(data, Some("missing")),
            Err(HueError::ConfigurationNotFound(_))
        ));
        assert!(matches!(
            select_configuration(Vec::new(), None),
            Err(HueError::NoConfigurations)
        ));
    }
}
