//! Colour command parsing
//!
//! A command line holds one or more `;`-separated clauses. Each clause is
//! either a bare colour, applied to every channel of the session, or a
//! channel id followed by a colour:
//!
//! ```text
//! #FF0000
//! 1 #00FF00; 2 #0000FF
//! f80; 3 11223344
//! ```

use palette::Srgb;
use std::fmt;
use thiserror::Error;

/// Which channels a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every channel in the session
    Broadcast,
    /// A single channel
    Channel(u8),
}

/// A single colour update parsed from one clause
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    pub target: Target,
    pub color: Srgb,
}

impl Command {
    pub fn broadcast(color: Srgb) -> Self {
        Self {
            target: Target::Broadcast,
            color,
        }
    }

    pub fn channel(channel_id: u8, color: Srgb) -> Self {
        Self {
            target: Target::Channel(channel_id),
            color,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        if let Target::Channel(id) = self.target {
            write!(f, "{} ", id)?;
        }
        write!(
            f,
            "#{:02X}{:02X}{:02X}",
            to_byte(self.color.red),
            to_byte(self.color.green),
            to_byte(self.color.blue)
        )
    }
}

/// A clause that could not be turned into a command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected `<colour>` or `<channel> <colour>`, got `{clause}`")]
    ClauseShape { clause: String },

    #[error("invalid channel id in `{clause}` (expected 0-255)")]
    InvalidChannel { clause: String },

    #[error("invalid hex colour in `{clause}`")]
    InvalidColor { clause: String },
}

impl ParseError {
    /// The offending clause, trimmed
    pub fn clause(&self) -> &str {
        match self {
            ParseError::ClauseShape { clause }
            | ParseError::InvalidChannel { clause }
            | ParseError::InvalidColor { clause } => clause,
        }
    }
}

/// Parses one input line into commands.
///
/// Empty clauses are skipped, so a blank line yields an empty list. The first
/// bad clause fails the whole line.
pub fn parse_line(line: &str) -> Result<Vec<Command>, ParseError> {
    let mut commands = Vec::new();
    for clause in line.split(';').map(str::trim) {
        if clause.is_empty() {
            continue;
        }
        commands.push(parse_clause(clause)?);
    }
    Ok(commands)
}

/// Renders commands back into a line that [`parse_line`] accepts.
pub fn render_line(commands: &[Command]) -> String {
    commands
        .iter()
        .map(Command::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

fn parse_clause(clause: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = clause.split_whitespace().collect();
    match tokens.as_slice() {
        [color] => {
            let color = parse_hex_color(color).ok_or_else(|| ParseError::InvalidColor {
                clause: clause.to_string(),
            })?;
            Ok(Command::broadcast(color))
        }
        [channel, color] => {
            let channel_id = parse_channel_id(channel).ok_or_else(|| {
                ParseError::InvalidChannel {
                    clause: clause.to_string(),
                }
            })?;
            let color = parse_hex_color(color).ok_or_else(|| ParseError::InvalidColor {
                clause: clause.to_string(),
            })?;
            Ok(Command::channel(channel_id, color))
        }
        _ => Err(ParseError::ClauseShape {
            clause: clause.to_string(),
        }),
    }
}

fn parse_channel_id(text: &str) -> Option<u8> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parses `#rgb`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
///
/// Alpha is accepted for compatibility with web colour notation but discarded.
pub fn parse_hex_color(text: &str) -> Option<Srgb> {
    let digits = text.strip_prefix('#').unwrap_or(text);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|n| n * 17);

    let (r, g, b) = match digits.len() {
        3 => (nibble(0)?, nibble(1)?, nibble(2)?),
        6 | 8 => (byte(0)?, byte(2)?, byte(4)?),
        _ => return None,
    };

    Some(Srgb::new(r, g, b).into_format())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Srgb {
        Srgb::new(r, g, b).into_format()
    }

    #[test]
    fn test_broadcast_clause() {
        let commands = parse_line("#FF0000").unwrap();
        assert_eq!(commands, vec![Command::broadcast(rgb(255, 0, 0))]);
    }

    #[test]
    fn test_targeted_clause() {
        let commands = parse_line("2 #00FF00").unwrap();
        assert_eq!(commands, vec![Command::channel(2, rgb(0, 255, 0))]);
    }

    #[test]
    fn test_multiple_clauses_keep_order() {
        let commands = parse_line("#000000; 1 #FFFFFF ;;3 0000ff\n").unwrap();
        assert_eq!(
            commands,
            vec![
                Command::broadcast(rgb(0, 0, 0)),
                Command::channel(1, rgb(255, 255, 255)),
                Command::channel(3, rgb(0, 0, 255)),
            ]
        );
    }

    #[test]
    fn test_blank_line_is_empty() {
        assert!(parse_line("").unwrap().is_empty());
        assert!(parse_line("  ;  \n").unwrap().is_empty());
    }

    #[test]
    fn test_short_and_alpha_notation() {
        assert_eq!(parse_hex_color("#f80"), Some(rgb(0xff, 0x88, 0x00)));
        assert_eq!(parse_hex_color("11223344"), Some(rgb(0x11, 0x22, 0x33)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
        assert_eq!(parse_hex_color("#"), None);
        assert_eq!(parse_hex_color("+12"), None);
    }

    #[test]
    fn test_invalid_channel_reports_clause() {
        let err = parse_line("#FFFFFF; 999 #ZZZ").unwrap_err();
        assert!(matches!(err, ParseError::InvalidChannel { .. }));
        assert_eq!(err.clause(), "999 #ZZZ");

        assert!(matches!(
            parse_line("+1 #FFF").unwrap_err(),
            ParseError::InvalidChannel { .. }
        ));
    }

    #[test]
    fn test_invalid_color_reports_clause() {
        let err = parse_line("4 #ZZZ").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidColor {
                clause: "4 #ZZZ".to_string()
            }
        );
    }

    #[test]
    fn test_too_many_tokens() {
        let err = parse_line("1 2 #FFF").unwrap_err();
        assert!(matches!(err, ParseError::ClauseShape { .. }));
    }

    #[test]
    fn test_display_renders_parseable_clause() {
        let command = Command::channel(7, rgb(0x12, 0xab, 0xff));
        assert_eq!(command.to_string(), "7 #12ABFF");
        assert_eq!(
            render_line(&[Command::broadcast(rgb(1, 2, 3)), command]),
            "#010203;7 #12ABFF"
        );
    }
}
