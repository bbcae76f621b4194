use crate::draw::geometry::{AspectRatio, WindowGeometry};
use crate::draw::model::{clamp_line_width, clamp_opacity, Color, Mode, Style};
use crate::draw::window_query::NamePattern;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PainterConfig {
    pub style: Style,
    pub mode: Mode,
    pub geometry: Option<WindowGeometry>,
    pub separate: bool,
    pub following: Option<NamePattern>,
    pub ratio: Option<AspectRatio>,
}

/// On-disk shape. Every field is optional and loosely typed so a single bad
/// value only resets that value.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    width: Option<Value>,
    color: Option<Value>,
    background: Option<Value>,
    mode: Option<Value>,
    alpha: Option<Value>,
    fill: Option<Value>,
    geometry: Option<Value>,
    separate: Option<Value>,
    following: Option<Value>,
    ratio: Option<Value>,
}

#[derive(Debug, Serialize)]
struct SavedConfig {
    width: u32,
    color: Color,
    background: Color,
    mode: Mode,
    alpha: u8,
    fill: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry: Option<String>,
    separate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    following: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<String>,
}

impl PainterConfig {
    /// Loads `path`, falling back to defaults when the file is missing or corrupt.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), ?err, "config unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_json::from_str(content).context("deserialize config json")?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Style::default();
        let style = Style {
            line_width: field("width", raw.width, parse_width).unwrap_or(defaults.line_width),
            stroke_color: field("color", raw.color, parse_color)
                .unwrap_or(defaults.stroke_color),
            background_color: field("background", raw.background, parse_color)
                .unwrap_or(defaults.background_color),
            fill_color: field("fill", raw.fill, parse_color).or(defaults.fill_color),
            opacity: field("alpha", raw.alpha, parse_alpha).unwrap_or(defaults.opacity),
        };
        Self {
            style,
            mode: field("mode", raw.mode, |value| {
                as_str(&value)?.parse::<Mode>()
            })
            .unwrap_or_default(),
            geometry: field("geometry", raw.geometry, |value| {
                as_str(&value)?.parse::<WindowGeometry>()
            }),
            separate: field("separate", raw.separate, |value| {
                value
                    .as_bool()
                    .ok_or_else(|| anyhow!("expected a boolean, got {value}"))
            })
            .unwrap_or(false),
            following: field("following", raw.following, parse_following),
            ratio: field("ratio", raw.ratio, parse_ratio),
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        let saved = SavedConfig {
            width: self.style.line_width,
            color: self.style.stroke_color,
            background: self.style.background_color,
            mode: self.mode,
            alpha: self.style.opacity,
            fill: self.style.fill_color,
            geometry: self.geometry.map(|geometry| geometry.to_string()),
            separate: self.separate,
            following: self.following.as_ref().map(ToString::to_string),
            ratio: self.ratio.map(|ratio| ratio.to_string()),
        };
        serde_json::to_string_pretty(&saved).context("serialize config")
    }

    /// Writes to a temporary file next to `path` and renames it into place.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_string()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create config folder {}", dir.display()))?;

        let mut file = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temporary config in {}", dir.display()))?;
        file.write_all(json.as_bytes())
            .context("write temporary config")?;
        file.as_file().sync_all().context("flush temporary config")?;
        file.persist(path)
            .map_err(|err| err.error)
            .with_context(|| format!("replace config file {}", path.display()))?;
        tracing::info!(path = %path.display(), "config saved");
        Ok(())
    }
}

/// Converts one config value, logging and discarding it when invalid.
fn field<T>(name: &str, value: Option<Value>, convert: impl FnOnce(Value) -> Result<T>) -> Option<T> {
    let value = value.filter(|value| !value.is_null())?;
    match convert(value) {
        Ok(converted) => Some(converted),
        Err(err) => {
            tracing::warn!(field = name, ?err, "ignoring invalid config value");
            None
        }
    }
}

fn as_str(value: &Value) -> Result<&str> {
    value
        .as_str()
        .ok_or_else(|| anyhow!("expected a string, got {value}"))
}

fn as_number(value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|number| number.is_finite())
        .ok_or_else(|| anyhow!("expected a number, got {value}"))
}

fn parse_width(value: Value) -> Result<u32> {
    let width = as_number(&value)?.max(0.0).min(f64::from(u32::MAX));
    Ok(clamp_line_width(width as u32))
}

fn parse_alpha(value: Value) -> Result<u8> {
    let alpha = as_number(&value)?.max(0.0).min(f64::from(u32::MAX));
    Ok(clamp_opacity(alpha as u32))
}

fn parse_color(value: Value) -> Result<Color> {
    as_str(&value)?.parse::<Color>()
}

fn parse_following(value: Value) -> Result<NamePattern> {
    let pattern = as_str(&value)?;
    if pattern.is_empty() {
        return Err(anyhow!("empty window name"));
    }
    Ok(NamePattern::parse(pattern))
}

fn parse_ratio(value: Value) -> Result<AspectRatio> {
    match &value {
        Value::String(ratio) => ratio.parse::<AspectRatio>(),
        Value::Array(parts) => match parts.as_slice() {
            [width, height] => {
                let component = |part: &Value| -> Result<u32> {
                    part.as_u64()
                        .and_then(|number| u32::try_from(number).ok())
                        .ok_or_else(|| anyhow!("invalid ratio component {part}"))
                };
                AspectRatio::new(component(width)?, component(height)?)
            }
            _ => Err(anyhow!("ratio array must have two elements, got {value}")),
        },
        _ => Err(anyhow!("expected \"WxH\" or [W, H], got {value}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_loads_over_defaults() {
        let config =
            PainterConfig::from_json_str(r##"{"width":5,"color":"#000000","alpha":80}"##)
                .unwrap();
        assert_eq!(config.style.line_width, 5);
        assert_eq!(config.style.stroke_color, Color::BLACK);
        assert_eq!(config.style.opacity, 80);
        assert_eq!(config.style.background_color, Color::WHITE);
        assert_eq!(config.mode, Mode::Pen);
        assert_eq!(config.following, None);
    }

    #[test]
    fn loose_values_are_normalised() {
        let config = PainterConfig::from_json_str(
            r##"{"width":12.0,"alpha":250,"fill":"#00ff00","ratio":[16,9],"following":"*Term","geometry":"800x600+-5+10"}"##,
        )
        .unwrap();
        assert_eq!(config.style.line_width, 10);
        assert_eq!(config.style.opacity, 100);
        assert_eq!(config.style.fill_color, Some(Color::rgb(0, 255, 0)));
        assert_eq!(config.ratio, AspectRatio::new(16, 9).ok());
        assert_eq!(config.following, Some(NamePattern::Suffix("Term".into())));
        assert_eq!(config.geometry, Some(WindowGeometry::new(800, 600, -5, 10)));
    }

    #[test]
    fn bad_field_falls_back_to_its_default_only() {
        let config = PainterConfig::from_json_str(r#"{"color":"purple","mode":"arrow","width":"wide"}"#)
            .unwrap();
        assert_eq!(config.style.stroke_color, Color::BLACK);
        assert_eq!(config.style.line_width, 5);
        assert_eq!(config.mode, Mode::Arrow);
    }

    #[test]
    fn corrupt_or_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(PainterConfig::load(&missing), PainterConfig::default());

        let corrupt = dir.path().join("config.json");
        std::fs::write(&corrupt, "{ not json").unwrap();
        assert!(PainterConfig::try_load(&corrupt).is_err());
        assert_eq!(PainterConfig::load(&corrupt), PainterConfig::default());
    }

    #[test]
    fn save_then_load_restores_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let config = PainterConfig {
            style: Style {
                line_width: 7,
                stroke_color: Color::rgb(0x1a, 0xbc, 0x9c),
                background_color: Color::rgb(1, 2, 3),
                fill_color: Some(Color::rgb(0xe7, 0x4c, 0x3c)),
                opacity: 55,
            },
            mode: Mode::Ellipse,
            geometry: Some(WindowGeometry::new(640, 480, 12, 34)),
            separate: true,
            following: Some(NamePattern::Prefix("Fire".into())),
            ratio: AspectRatio::new(4, 3).ok(),
        };

        config.save(&path).unwrap();
        assert_eq!(PainterConfig::load(&path), config);

        let json: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["following"], "Fire*");
        assert_eq!(json["ratio"], "4x3");
        assert_eq!(json["geometry"], "640x480+12+34");
    }

    #[test]
    fn absent_fill_is_written_as_null() {
        let json = PainterConfig::default().to_json_string().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["fill"].is_null());
        assert!(value.get("following").is_none());
        assert_eq!(value["mode"], "pen");
    }

    #[test]
    fn colors_are_saved_as_spelled() {
        let config =
            PainterConfig::from_json_str(r##"{"color":"#E74C3C","background":"#ffffff"}"##)
                .unwrap();
        let value: Value = serde_json::from_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(value["color"], "#E74C3C");
        assert_eq!(value["background"], "#ffffff");
    }
}
