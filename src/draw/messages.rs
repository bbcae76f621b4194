use crate::draw::model::{Color, Mode, MAX_LINE_WIDTH, MAX_OPACITY, MIN_LINE_WIDTH};
use anyhow::{anyhow, Context, Result};
use std::fmt;

/// Message carried by the command bus from control surfaces to the engine.
///
/// The textual form `verb[ argument]` is kept for logging and for producers
/// that only speak strings; see [`Command::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Color(Color),
    Background(Color),
    Wipe,
    Undo,
    Mode(Mode),
    Width(u32),
    Alpha(u8),
    Text(String),
    Fill(bool),
}

impl Command {
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Color(_) => "color",
            Command::Background(_) => "background",
            Command::Wipe => "wipe",
            Command::Undo => "undo",
            Command::Mode(_) => "mode",
            Command::Width(_) => "width",
            Command::Alpha(_) => "alpha",
            Command::Text(_) => "text",
            Command::Fill(_) => "fill",
        }
    }

    /// Parses the wire form. Unknown verbs yield `Ok(None)`; a known verb
    /// with a bad argument is an error and the whole command is dropped.
    pub fn parse(wire: &str) -> Result<Option<Command>> {
        let (verb, argument) = match wire.split_once(' ') {
            Some((verb, argument)) => (verb, Some(argument)),
            None => (wire, None),
        };
        let required = || argument.ok_or_else(|| anyhow!("'{verb}' requires an argument"));

        let command = match verb {
            "color" => Command::Color(required()?.parse::<Color>().context("color argument")?),
            "background" => {
                Command::Background(required()?.parse::<Color>().context("background argument")?)
            }
            "wipe" => Command::Wipe,
            "undo" => Command::Undo,
            "mode" => Command::Mode(required()?.parse::<Mode>().context("mode argument")?),
            "width" => {
                let width: u32 = required()?.trim().parse().context("width argument")?;
                if !(MIN_LINE_WIDTH..=MAX_LINE_WIDTH).contains(&width) {
                    return Err(anyhow!(
                        "width {width} outside {MIN_LINE_WIDTH}..={MAX_LINE_WIDTH}"
                    ));
                }
                Command::Width(width)
            }
            "alpha" => {
                let alpha: u8 = required()?.trim().parse().context("alpha argument")?;
                if alpha > MAX_OPACITY {
                    return Err(anyhow!("alpha {alpha} outside 0..={MAX_OPACITY}"));
                }
                Command::Alpha(alpha)
            }
            "text" => Command::Text(argument.unwrap_or_default().to_string()),
            "fill" => {
                let flag: i64 = required()?.trim().parse().context("fill argument")?;
                Command::Fill(flag != 0)
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.verb();
        match self {
            Command::Color(color) | Command::Background(color) => write!(f, "{verb} {color}"),
            Command::Wipe | Command::Undo => f.write_str(verb),
            Command::Mode(mode) => write!(f, "{verb} {mode}"),
            Command::Width(width) => write!(f, "{verb} {width}"),
            Command::Alpha(alpha) => write!(f, "{verb} {alpha}"),
            Command::Text(text) => write!(f, "{verb} {text}"),
            Command::Fill(on) => write!(f, "{verb} {}", u8::from(*on)),
        }
    }
}
