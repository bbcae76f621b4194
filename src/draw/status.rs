use crate::draw::geometry::WindowGeometry;
use crate::draw::model::{Color, Mode, Style};
use std::collections::BTreeMap;

/// Partial status change. Only `Some` fields changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusUpdate {
    pub color: Option<Color>,
    pub bg_color: Option<Color>,
    pub mode: Option<Mode>,
    pub fill: Option<Option<Color>>,
    pub width: Option<u32>,
    pub alpha: Option<u8>,
    pub text: Option<String>,
    pub win_position: Option<(i32, i32)>,
    pub win_size: Option<(i32, i32)>,
    pub separate: Option<bool>,
}

impl StatusUpdate {
    pub fn full(style: &Style, mode: Mode, separate: bool) -> Self {
        Self {
            color: Some(style.stroke_color),
            bg_color: Some(style.background_color),
            mode: Some(mode),
            fill: Some(style.fill_color),
            width: Some(style.line_width),
            alpha: Some(style.opacity),
            separate: Some(separate),
            ..Self::default()
        }
    }

    pub fn geometry(geometry: WindowGeometry) -> Self {
        Self {
            win_position: Some(geometry.position()),
            win_size: Some(geometry.size()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A surface that mirrors engine state. Observers never feed back into the engine.
pub trait StatusObserver {
    fn update_status(&mut self, update: &StatusUpdate);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusField {
    Color,
    BgColor,
    Mode,
    Fill,
    Width,
    Alpha,
    WinPosition,
    WinSize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLabel {
    pub text: String,
    pub swatch: Option<Color>,
}

impl StatusLabel {
    fn plain(text: String) -> Self {
        Self { text, swatch: None }
    }
}

/// Labels of the inline status bar for the fields present in `update`.
pub fn status_bar_labels(update: &StatusUpdate) -> Vec<(StatusField, StatusLabel)> {
    let mut labels = Vec::new();
    if let Some(color) = update.color {
        labels.push((
            StatusField::Color,
            StatusLabel {
                text: format!("color: {color}"),
                swatch: Some(color),
            },
        ));
    }
    if let Some(color) = update.bg_color {
        labels.push((
            StatusField::BgColor,
            StatusLabel {
                text: format!("bg_color: {color}"),
                swatch: Some(color),
            },
        ));
    }
    if let Some(mode) = update.mode {
        labels.push((StatusField::Mode, StatusLabel::plain(format!("mode: {mode}"))));
    }
    if let Some(fill) = update.fill {
        let state = if fill.is_some() { "on" } else { "off" };
        labels.push((StatusField::Fill, StatusLabel::plain(format!("fill: {state}"))));
    }
    if let Some(width) = update.width {
        labels.push((StatusField::Width, StatusLabel::plain(format!("width: {width}"))));
    }
    if let Some(alpha) = update.alpha {
        labels.push((StatusField::Alpha, StatusLabel::plain(format!("opacity: {alpha}"))));
    }
    if let Some((x, y)) = update.win_position {
        labels.push((StatusField::WinPosition, StatusLabel::plain(format!("({x}, {y})"))));
    }
    if let Some((w, h)) = update.win_size {
        labels.push((StatusField::WinSize, StatusLabel::plain(format!("({w}, {h})"))));
    }
    labels
}

/// Inline status bar: one sunken label per field, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBarView {
    labels: BTreeMap<StatusField, StatusLabel>,
}

impl StatusBarView {
    pub fn label(&self, field: StatusField) -> Option<&StatusLabel> {
        self.labels.get(&field)
    }

    pub fn text(&self, field: StatusField) -> Option<&str> {
        self.label(field).map(|label| label.text.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = (StatusField, &StatusLabel)> {
        self.labels.iter().map(|(field, label)| (*field, label))
    }
}

impl StatusObserver for StatusBarView {
    fn update_status(&mut self, update: &StatusUpdate) {
        for (field, label) in status_bar_labels(update) {
            self.labels.insert(field, label);
        }
    }
}

/// Widget state of the control panel: active tool button, swatches, sliders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPanelView {
    pub active_mode: Mode,
    pub color: Color,
    pub bg_color: Color,
    pub fill_enabled: bool,
    pub width: u32,
    pub alpha: u8,
    pub separate: bool,
    pub text: String,
}

impl Default for ControlPanelView {
    fn default() -> Self {
        let style = Style::default();
        Self {
            active_mode: Mode::default(),
            color: style.stroke_color,
            bg_color: style.background_color,
            fill_enabled: style.fill_color.is_some(),
            width: style.line_width,
            alpha: style.opacity,
            separate: false,
            text: String::new(),
        }
    }
}

impl ControlPanelView {
    pub fn width_display(&self) -> String {
        self.width.to_string()
    }

    pub fn alpha_display(&self) -> String {
        self.alpha.to_string()
    }
}

impl StatusObserver for ControlPanelView {
    fn update_status(&mut self, update: &StatusUpdate) {
        if let Some(mode) = update.mode {
            self.active_mode = mode;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(color) = update.bg_color {
            self.bg_color = color;
        }
        if let Some(fill) = update.fill {
            self.fill_enabled = fill.is_some();
        }
        if let Some(width) = update.width {
            self.width = width;
        }
        if let Some(alpha) = update.alpha {
            self.alpha = alpha;
        }
        if let Some(separate) = update.separate {
            self.separate = separate;
        }
        if let Some(text) = &update.text {
            self.text.clone_from(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_field_formats() {
        let update = StatusUpdate {
            color: Some(Color::rgb(255, 0, 0)),
            fill: Some(None),
            alpha: Some(55),
            win_position: Some((10, -4)),
            ..StatusUpdate::default()
        };
        let labels = status_bar_labels(&update);
        let texts: Vec<_> = labels.iter().map(|(_, l)| l.text.as_str()).collect();
        assert_eq!(texts, vec!["color: #ff0000", "fill: off", "opacity: 55", "(10, -4)"]);
        assert_eq!(labels[0].1.swatch, Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn partial_updates_leave_other_labels_untouched() {
        let mut bar = StatusBarView::default();
        bar.update_status(&StatusUpdate::full(&Style::default(), Mode::Pen, false));
        bar.update_status(&StatusUpdate {
            width: Some(9),
            ..StatusUpdate::default()
        });
        assert_eq!(bar.text(StatusField::Width), Some("width: 9"));
        assert_eq!(bar.text(StatusField::Mode), Some("mode: pen"));
        assert_eq!(bar.text(StatusField::WinSize), None);
    }

    #[test]
    fn control_panel_tracks_fill_and_text() {
        let mut panel = ControlPanelView::default();
        panel.update_status(&StatusUpdate {
            fill: Some(Some(Color::BLACK)),
            text: Some("hello".into()),
            ..StatusUpdate::default()
        });
        assert!(panel.fill_enabled);
        assert_eq!(panel.text, "hello");
    }

    #[test]
    fn geometry_update_carries_position_and_size() {
        let update = StatusUpdate::geometry(WindowGeometry::new(300, 200, 5, 6));
        assert_eq!(update.win_position, Some((5, 6)));
        assert_eq!(update.win_size, Some((300, 200)));
        assert!(!update.is_empty());
        assert!(StatusUpdate::default().is_empty());
    }
}
