use palette::{FromColor, Srgb, Xyz};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Protocol name at the start of every frame
pub const PROTOCOL_NAME: &[u8; 9] = b"HueStream";
/// Protocol version 2.0
pub const PROTOCOL_VERSION: [u8; 2] = [0x02, 0x00];

pub const MAX_CHANNELS: usize = 20;
pub const SESSION_ID_SIZE: usize = 36;
pub const HEADER_SIZE: usize = 16;
pub const PREAMBLE_SIZE: usize = HEADER_SIZE + SESSION_ID_SIZE;
pub const CHANNEL_ENTRY_SIZE: usize = 7;
pub const MAX_MESSAGE_SIZE: usize = PREAMBLE_SIZE + MAX_CHANNELS * CHANNEL_ENTRY_SIZE;

const COLOR_SPACE_OFFSET: usize = 14;

/// Colour space selector carried in the frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Rgb,
    Xy,
}

impl ColorSpace {
    pub fn selector(self) -> u8 {
        match self {
            ColorSpace::Rgb => 0x00,
            ColorSpace::Xy => 0x01,
        }
    }

    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            0x00 => Some(ColorSpace::Rgb),
            0x01 => Some(ColorSpace::Xy),
            _ => None,
        }
    }

    /// Converts a colour into the three 16-bit components for this space.
    ///
    /// RGB scales each channel linearly. XY goes through CIE XYZ (D65) and
    /// emits chromaticity x, y and the luminance Y as brightness.
    pub fn encode(self, color: Srgb) -> [u16; 3] {
        let [a, b, c] = match self {
            ColorSpace::Rgb => [color.red, color.green, color.blue],
            ColorSpace::Xy => {
                let xyz: Xyz = Xyz::from_color(color);
                let sum = xyz.x + xyz.y + xyz.z;
                if sum > 0.0 {
                    [xyz.x / sum, xyz.y / sum, xyz.y]
                } else {
                    [0.0, 0.0, 0.0]
                }
            }
        };
        [scale(a), scale(b), scale(c)]
    }
}

fn scale(component: f32) -> u16 {
    (component.clamp(0.0, 1.0) * f32::from(u16::MAX)).round() as u16
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpace::Rgb => write!(f, "rgb"),
            ColorSpace::Xy => write!(f, "xy"),
        }
    }
}

impl FromStr for ColorSpace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorSpace::Rgb),
            "xy" => Ok(ColorSpace::Xy),
            other => Err(format!("unknown colour space '{}' (expected rgb or xy)", other)),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("session id is incorrect size: {actual} != {expected}")]
    InvalidSessionId { expected: usize, actual: usize },

    #[error("attempted to add too many channel entries, a maximum of {max} are allowed")]
    TooManyChannels { max: usize },

    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// Builds Hue Entertainment streaming frames.
///
/// Format (Hue Entertainment API v2):
/// - 16-byte header:
///   - 9 bytes: "HueStream"
///   - 2 bytes: version (0x02, 0x00)
///   - 1 byte:  sequence id (always 0)
///   - 2 bytes: reserved
///   - 1 byte:  colour space (0x00 = RGB, 0x01 = XY+brightness)
///   - 1 byte:  reserved
/// - 36-byte entertainment configuration id (UUID as ASCII)
/// - N x 7-byte channel entries: channel id, then three big-endian u16
///
/// The buffer is allocated once at full capacity and reused for every frame;
/// only the logical length returned by [`FrameBuilder::build`] changes.
pub struct FrameBuilder {
    buffer: [u8; MAX_MESSAGE_SIZE],
    color_space: ColorSpace,
    channel_count: usize,
}

impl FrameBuilder {
    pub fn new(color_space: ColorSpace) -> Self {
        Self {
            buffer: [0u8; MAX_MESSAGE_SIZE],
            color_space,
            channel_count: 0,
        }
    }

    pub fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// Writes the header and session id. The body is left as is.
    pub fn write_preamble(&mut self, session_id: &[u8]) -> Result<(), FrameError> {
        if session_id.len() != SESSION_ID_SIZE {
            return Err(FrameError::InvalidSessionId {
                expected: SESSION_ID_SIZE,
                actual: session_id.len(),
            });
        }

        let header = &mut self.buffer[..HEADER_SIZE];
        header.fill(0);
        header[0..9].copy_from_slice(PROTOCOL_NAME);
        header[9..11].copy_from_slice(&PROTOCOL_VERSION);
        header[COLOR_SPACE_OFFSET] = self.color_space.selector();

        self.buffer[HEADER_SIZE..PREAMBLE_SIZE].copy_from_slice(session_id);
        Ok(())
    }

    pub fn reset_body(&mut self) {
        self.channel_count = 0;
    }

    /// Appends one channel entry. Fails without touching the buffer when the
    /// frame already holds [`MAX_CHANNELS`] entries.
    pub fn write_channel_color(&mut self, channel_id: u8, color: Srgb) -> Result<(), FrameError> {
        if self.channel_count >= MAX_CHANNELS {
            return Err(FrameError::TooManyChannels { max: MAX_CHANNELS });
        }

        let start = PREAMBLE_SIZE + self.channel_count * CHANNEL_ENTRY_SIZE;
        let entry = &mut self.buffer[start..start + CHANNEL_ENTRY_SIZE];
        entry[0] = channel_id;
        for (i, component) in self.color_space.encode(color).iter().enumerate() {
            entry[1 + i * 2..3 + i * 2].copy_from_slice(&component.to_be_bytes());
        }

        self.channel_count += 1;
        Ok(())
    }

    /// The current frame: preamble plus the entries written since the last reset.
    pub fn build(&self) -> &[u8] {
        &self.buffer[..PREAMBLE_SIZE + self.channel_count * CHANNEL_ENTRY_SIZE]
    }
}

/// One channel entry read back from a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEntry {
    pub channel_id: u8,
    pub components: [u16; 3],
}

/// A frame read back from bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub color_space: ColorSpace,
    pub session_id: String,
    pub entries: Vec<ChannelEntry>,
}

/// Parses a frame produced by [`FrameBuilder`].
pub fn decode_frame(frame: &[u8]) -> Result<DecodedFrame, FrameError> {
    if frame.len() < PREAMBLE_SIZE {
        return Err(FrameError::Malformed(format!(
            "{} bytes is shorter than the {}-byte preamble",
            frame.len(),
            PREAMBLE_SIZE
        )));
    }
    if &frame[0..9] != PROTOCOL_NAME {
        return Err(FrameError::Malformed("missing HueStream tag".to_string()));
    }
    let body = &frame[PREAMBLE_SIZE..];
    if body.len() % CHANNEL_ENTRY_SIZE != 0 || body.len() / CHANNEL_ENTRY_SIZE > MAX_CHANNELS {
        return Err(FrameError::Malformed(format!(
            "body of {} bytes is not a valid entry list",
            body.len()
        )));
    }

    let color_space = ColorSpace::from_selector(frame[COLOR_SPACE_OFFSET]).ok_or_else(|| {
        FrameError::Malformed(format!(
            "unknown colour space selector {:#04x}",
            frame[COLOR_SPACE_OFFSET]
        ))
    })?;
    let session_id = String::from_utf8_lossy(&frame[HEADER_SIZE..PREAMBLE_SIZE]).into_owned();

    let entries = body
        .chunks_exact(CHANNEL_ENTRY_SIZE)
        .map(|entry| ChannelEntry {
            channel_id: entry[0],
            components: [
                u16::from_be_bytes([entry[1], entry[2]]),
                u16::from_be_bytes([entry[3], entry[4]]),
                u16::from_be_bytes([entry[5], entry[6]]),
            ],
        })
        .collect();

    Ok(DecodedFrame {
        color_space,
        session_id,
        entries,
    })
}
