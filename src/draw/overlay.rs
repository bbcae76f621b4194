use crate::draw::canvas::{CanvasItem, RecordingCanvas};
use crate::draw::follow::OverlayWindow;
use crate::draw::geometry::{Point, WindowGeometry};
use crate::draw::input::{EngineEvent, PointerButton, PointerModifiers};
use crate::draw::keyboard::{KeyCode, KeyEvent, KeyModifiers};
use crate::draw::model::{Color, Shape};
use crate::draw::service::PainterRuntime;
use crate::draw::toolbar::{self, ToolbarAction, ToolbarState};
use crate::draw::window_query::WindowQuery;
use crate::settings::PainterConfig;
use eframe::egui::{self, Color32, Pos2, Stroke};
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;

pub const APP_TITLE: &str = "Overlay Painter";
const ELLIPSE_SEGMENTS: usize = 48;
/// Frames during which viewport reports are ignored after a programmatic move.
const SETTLE_FRAMES: u8 = 10;

/// The overlay's egui viewport seen through [`OverlayWindow`]. Geometry is in
/// physical pixels; viewport commands are queued and flushed once per frame.
#[derive(Debug)]
pub struct EguiOverlay {
    geometry: WindowGeometry,
    visible: bool,
    opacity: u8,
    pixels_per_point: f32,
    settling: u8,
    /// Client area origin relative to the frame origin, physical pixels.
    frame_offset: (i32, i32),
    pending: Vec<egui::ViewportCommand>,
}

impl EguiOverlay {
    pub fn new(geometry: WindowGeometry, opacity: u8) -> Self {
        Self {
            geometry,
            visible: true,
            opacity,
            pixels_per_point: 1.0,
            settling: 0,
            frame_offset: (0, 0),
            pending: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Picks up user moves and resizes. Returns the new geometry when it changed.
    pub fn sync_from_viewport(&mut self, ctx: &egui::Context) -> Option<WindowGeometry> {
        self.pixels_per_point = ctx.pixels_per_point();
        let (outer, inner) = ctx.input(|i| (i.viewport().outer_rect, i.viewport().inner_rect));
        self.sync_from_rects(outer, inner?)
    }

    /// Geometry is the client area. The outer rect only tells where the
    /// window frame puts it, which programmatic moves have to undo.
    pub fn sync_from_rects(
        &mut self,
        outer: Option<egui::Rect>,
        inner: egui::Rect,
    ) -> Option<WindowGeometry> {
        let ppp = self.pixels_per_point;
        let physical = |v: f32| (v * ppp).round() as i32;
        if let Some(outer) = outer {
            self.frame_offset = (
                physical(inner.min.x - outer.min.x),
                physical(inner.min.y - outer.min.y),
            );
        }
        if self.settling > 0 {
            self.settling -= 1;
            return None;
        }
        let current = WindowGeometry::new(
            physical(inner.width()),
            physical(inner.height()),
            physical(inner.min.x),
            physical(inner.min.y),
        );
        if current == self.geometry {
            return None;
        }
        self.geometry = current;
        Some(current)
    }

    pub fn flush(&mut self, ctx: &egui::Context) {
        for command in self.pending.drain(..) {
            ctx.send_viewport_cmd(command);
        }
    }
}

impl OverlayWindow for EguiOverlay {
    fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    fn set_geometry(&mut self, geometry: WindowGeometry) {
        let ppp = self.pixels_per_point;
        self.geometry = geometry;
        self.settling = SETTLE_FRAMES;
        let (dx, dy) = self.frame_offset;
        self.pending.push(egui::ViewportCommand::OuterPosition(Pos2::new(
            (geometry.x - dx) as f32 / ppp,
            (geometry.y - dy) as f32 / ppp,
        )));
        self.pending.push(egui::ViewportCommand::InnerSize(egui::vec2(
            geometry.width as f32 / ppp,
            geometry.height as f32 / ppp,
        )));
    }

    /// Hidden means fully transparent and click-through, so the frame loop
    /// keeps running and can bring the overlay back.
    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.pending
                .push(egui::ViewportCommand::MousePassthrough(!visible));
        }
    }

    fn set_opacity(&mut self, alpha: u8) {
        self.opacity = alpha;
    }
}

/// Maps an egui key press to the engine's key model. Plain characters arrive
/// as text events instead, see [`text_key_events`].
pub fn key_event_from_egui(key: egui::Key, modifiers: egui::Modifiers) -> Option<KeyEvent> {
    let key_modifiers = KeyModifiers {
        ctrl: modifiers.ctrl || modifiers.command,
    };
    if key == egui::Key::Escape {
        return Some(KeyEvent {
            key: KeyCode::Escape,
            modifiers: key_modifiers,
        });
    }
    if !key_modifiers.ctrl {
        return None;
    }
    let c = match key {
        egui::Key::L => 'l',
        egui::Key::Z => 'z',
        egui::Key::W => 'w',
        egui::Key::R => 'r',
        egui::Key::Plus | egui::Key::Equals => '+',
        egui::Key::Minus => '-',
        _ => return None,
    };
    Some(KeyEvent {
        key: KeyCode::Char(c),
        modifiers: key_modifiers,
    })
}

pub fn text_key_events(text: &str) -> impl Iterator<Item = KeyEvent> + '_ {
    text.chars().map(|c| KeyEvent::plain(KeyCode::Char(c)))
}

fn pointer_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn canvas_point(origin: Pos2, pos: Pos2) -> (i32, i32) {
    let local = pos - origin;
    (local.x.round() as i32, local.y.round() as i32)
}

/// Closed polyline approximating the ellipse inscribed in the box `a`-`b`.
pub fn ellipse_points(a: Pos2, b: Pos2) -> Vec<Pos2> {
    let center = Pos2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let rx = (b.x - a.x).abs() / 2.0;
    let ry = (b.y - a.y).abs() / 2.0;
    (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            let angle = TAU * i as f32 / ELLIPSE_SEGMENTS as f32;
            Pos2::new(center.x + rx * angle.cos(), center.y + ry * angle.sin())
        })
        .collect()
}

fn tinted(color: Color, opacity: f32) -> Color32 {
    toolbar::to_color32(color).gamma_multiply(opacity)
}

fn paint_item(painter: &egui::Painter, origin: Pos2, item: &CanvasItem, opacity: f32) {
    let to_screen = |p: Point| Pos2::new(origin.x + p.x as f32, origin.y + p.y as f32);
    let width = item.style.width as f32;
    let stroke = item
        .style
        .outline
        .map(|color| Stroke::new(width, tinted(color, opacity)))
        .unwrap_or(Stroke::NONE);
    let fill = item
        .style
        .fill
        .map(|color| tinted(color, opacity))
        .unwrap_or(Color32::TRANSPARENT);

    match &item.shape {
        Shape::Line { from, to } => {
            let (from, to) = (to_screen(*from), to_screen(*to));
            painter.line_segment([from, to], stroke);
            // Round joints so freehand strokes do not look gappy.
            if width > 2.0 {
                painter.circle_filled(from, width / 2.0, stroke.color);
                painter.circle_filled(to, width / 2.0, stroke.color);
            }
        }
        Shape::Rectangle { corner_a, corner_b } => {
            let rect = egui::Rect::from_two_pos(to_screen(*corner_a), to_screen(*corner_b));
            painter.rect(rect, 0.0, fill, stroke);
        }
        Shape::Oval { corner_a, corner_b } => {
            let points = ellipse_points(to_screen(*corner_a), to_screen(*corner_b));
            if item.style.fill.is_some() {
                painter.add(egui::Shape::convex_polygon(points, fill, stroke));
            } else {
                painter.add(egui::Shape::closed_line(points, stroke));
            }
        }
        Shape::Polygon { points } => {
            let points: Vec<Pos2> = points.iter().copied().map(to_screen).collect();
            if item.style.fill.is_some() {
                painter.add(egui::Shape::convex_polygon(points, fill, stroke));
            } else {
                painter.add(egui::Shape::closed_line(points, stroke));
            }
        }
        Shape::Text { at, text, size } => {
            painter.text(
                to_screen(*at),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(*size as f32),
                fill,
            );
        }
    }
}

/// eframe application hosting the overlay and its control surfaces.
pub struct PainterApp {
    runtime: PainterRuntime,
    canvas: RecordingCanvas,
    overlay: EguiOverlay,
    query: Box<dyn WindowQuery>,
    toolbar: ToolbarState,
    config_path: PathBuf,
    separate_layout: bool,
    pressed: Option<PointerButton>,
    inside: bool,
    saved: bool,
}

impl PainterApp {
    pub fn new(config: &PainterConfig, config_path: PathBuf, query: Box<dyn WindowQuery>) -> Self {
        let mut runtime = PainterRuntime::new(config, Instant::now());
        let mut canvas = RecordingCanvas::new(config.style.background_color);
        let mut overlay = EguiOverlay::new(config.geometry.unwrap_or_default(), config.style.opacity);
        runtime.start(&mut canvas, &mut overlay);
        Self {
            runtime,
            canvas,
            overlay,
            query,
            toolbar: ToolbarState::default(),
            config_path,
            separate_layout: config.separate,
            pressed: None,
            inside: false,
            saved: false,
        }
    }

    /// Viewport options for the overlay window.
    pub fn viewport(config: &PainterConfig) -> egui::ViewportBuilder {
        let mut builder = egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_transparent(true)
            .with_inner_size([800.0, 600.0]);
        if let Some(geometry) = config.geometry {
            builder = builder
                .with_position([geometry.x as f32, geometry.y as f32])
                .with_inner_size([geometry.width as f32, geometry.height as f32]);
        }
        if config.separate {
            builder = builder.with_decorations(false).with_always_on_top();
        }
        builder
    }

    fn apply_toolbar(&mut self, actions: Vec<ToolbarAction>) {
        let sender = self.runtime.sender();
        for action in actions {
            match action {
                ToolbarAction::Submit(command) => {
                    sender.submit(command);
                }
                ToolbarAction::SetSeparate(separate) => self.runtime.set_separate(separate),
            }
        }
    }

    fn feed(&mut self, event: EngineEvent) {
        self.runtime
            .handle_input(&mut self.canvas, &mut self.overlay, event);
    }

    fn handle_pointer(&mut self, ctx: &egui::Context, canvas_rect: egui::Rect, hovered: bool) {
        let origin = canvas_rect.min;
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    modifiers,
                } => {
                    let Some(button) = pointer_button(button) else {
                        continue;
                    };
                    let point = canvas_point(origin, pos);
                    if pressed && self.pressed.is_none() && hovered && canvas_rect.contains(pos) {
                        self.pressed = Some(button);
                        self.feed(EngineEvent::PointerDown {
                            point,
                            button,
                            modifiers: PointerModifiers {
                                shift: modifiers.shift,
                                alt: modifiers.alt,
                            },
                        });
                    } else if !pressed && self.pressed == Some(button) {
                        self.pressed = None;
                        self.feed(EngineEvent::PointerUp { point, button });
                    }
                }
                egui::Event::PointerMoved(pos) => {
                    let point = canvas_point(origin, pos);
                    if let Some(button) = self.pressed {
                        self.feed(EngineEvent::PointerDrag { point, button });
                    } else if hovered && canvas_rect.contains(pos) {
                        self.inside = true;
                        self.feed(EngineEvent::PointerHover { point });
                    } else if self.inside {
                        self.inside = false;
                        self.feed(EngineEvent::PointerLeave);
                    }
                }
                egui::Event::PointerGone => {
                    self.inside = false;
                    self.pressed = None;
                    self.feed(EngineEvent::PointerLeave);
                }
                _ => {}
            }
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            match event {
                egui::Event::Key {
                    key,
                    pressed: true,
                    modifiers,
                    ..
                } => {
                    if let Some(key_event) = key_event_from_egui(key, modifiers) {
                        self.feed(EngineEvent::Key(key_event));
                    }
                }
                egui::Event::Text(text) => {
                    for key_event in text_key_events(&text) {
                        self.feed(EngineEvent::Key(key_event));
                    }
                }
                _ => {}
            }
        }
    }

    fn paint(&self, painter: &egui::Painter, rect: egui::Rect) {
        if !self.overlay.is_visible() {
            return;
        }
        let opacity = f32::from(self.overlay.opacity()) / 100.0;
        painter.rect_filled(rect, 0.0, tinted(self.canvas.background(), opacity));
        for item in self.canvas.items() {
            paint_item(painter, rect.min, item, opacity);
        }
    }

    /// The inline menu and status bar go away with the overlay.
    fn shows_inline_panels(&self) -> bool {
        !self.separate_layout && self.overlay.is_visible()
    }

    fn save_config(&mut self) {
        if self.saved {
            return;
        }
        self.saved = true;
        let snapshot = self.runtime.snapshot(Some(self.overlay.geometry()));
        if let Err(err) = snapshot.save(&self.config_path) {
            tracing::error!(?err, path = %self.config_path.display(), "failed to save config");
            std::process::exit(1);
        }
    }
}

impl eframe::App for PainterApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if let Some(geometry) = self.overlay.sync_from_viewport(ctx) {
            self.runtime.geometry_changed(geometry);
        }
        self.runtime
            .tick(now, &mut self.canvas, &mut self.overlay, self.query.as_mut());

        if self.separate_layout {
            let view = self.runtime.control_panel().clone();
            let bar = self.runtime.status_bar().clone();
            let toolbar_state = &mut self.toolbar;
            let (actions, panel_closed) = ctx.show_viewport_immediate(
                egui::ViewportId::from_hash_of("overlay_painter_controls"),
                egui::ViewportBuilder::default()
                    .with_title(format!("{APP_TITLE} controls"))
                    .with_inner_size([420.0, 360.0]),
                |ctx, _class| {
                    let actions = egui::CentralPanel::default()
                        .show(ctx, |ui| {
                            let actions = toolbar::control_panel_ui(ui, &view, toolbar_state);
                            ui.separator();
                            toolbar::status_bar_ui(ui, &bar);
                            actions
                        })
                        .inner;
                    (actions, ctx.input(|i| i.viewport().close_requested()))
                },
            );
            self.apply_toolbar(actions);
            if panel_closed {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        } else if self.shows_inline_panels() {
            let view = self.runtime.control_panel().clone();
            let actions = egui::TopBottomPanel::top("overlay_painter_menu")
                .show(ctx, |ui| {
                    let mut actions = toolbar::menu_bar_ui(ui, &view);
                    ui.collapsing("Controls", |ui| {
                        actions.extend(toolbar::control_panel_ui(ui, &view, &mut self.toolbar));
                    });
                    actions
                })
                .inner;
            self.apply_toolbar(actions);
            egui::TopBottomPanel::bottom("overlay_painter_status").show(ctx, |ui| {
                toolbar::status_bar_ui(ui, self.runtime.status_bar());
            });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (response, painter) =
                    ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
                self.handle_pointer(ctx, response.rect, response.hovered());
                self.handle_keys(ctx);
                if response.hovered() {
                    ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
                }
                self.paint(&painter, response.rect);
            });

        self.overlay.flush(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.save_config();
        }
        ctx.request_repaint_after(self.runtime.next_deadline().saturating_duration_since(now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_shortcuts_map_to_characters() {
        let ctrl = egui::Modifiers {
            ctrl: true,
            ..egui::Modifiers::NONE
        };
        assert_eq!(
            key_event_from_egui(egui::Key::Equals, ctrl).map(|event| event.key),
            Some(KeyCode::Char('+'))
        );
        assert_eq!(
            key_event_from_egui(egui::Key::Z, ctrl).map(|event| event.key),
            Some(KeyCode::Char('z'))
        );
        assert_eq!(key_event_from_egui(egui::Key::Z, egui::Modifiers::NONE), None);
        assert_eq!(
            key_event_from_egui(egui::Key::Escape, egui::Modifiers::NONE),
            Some(KeyEvent::plain(KeyCode::Escape))
        );
    }

    #[test]
    fn shift_and_alt_do_not_change_a_shortcut() {
        let ctrl_shift_alt = egui::Modifiers {
            ctrl: true,
            shift: true,
            alt: true,
            ..egui::Modifiers::NONE
        };
        assert_eq!(
            key_event_from_egui(egui::Key::Plus, ctrl_shift_alt),
            Some(KeyEvent::ctrl('+'))
        );
    }

    #[test]
    fn typed_text_becomes_plain_key_presses() {
        let keys: Vec<_> = text_key_events("a+").map(|event| event.key).collect();
        assert_eq!(keys, vec![KeyCode::Char('a'), KeyCode::Char('+')]);
    }

    #[test]
    fn ellipse_outline_stays_inside_its_box() {
        let points = ellipse_points(Pos2::new(0.0, 0.0), Pos2::new(20.0, 10.0));
        assert_eq!(points.len(), ELLIPSE_SEGMENTS);
        assert!(points
            .iter()
            .all(|p| (-0.01..=20.01).contains(&p.x) && (-0.01..=10.01).contains(&p.y)));
        assert_eq!(points[0], Pos2::new(20.0, 5.0));
    }

    #[test]
    fn overlay_queues_viewport_commands_for_moves() {
        let mut overlay = EguiOverlay::new(WindowGeometry::default(), 80);
        overlay.set_geometry(WindowGeometry::new(300, 200, 10, 20));
        overlay.set_visible(false);
        overlay.set_visible(false);
        assert_eq!(overlay.pending.len(), 3);
        assert_eq!(overlay.geometry(), WindowGeometry::new(300, 200, 10, 20));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn moves_compensate_for_the_window_frame() {
        let mut overlay = EguiOverlay::new(WindowGeometry::default(), 80);
        let outer = egui::Rect::from_min_size(Pos2::new(0.0, 0.0), egui::vec2(300.0, 230.0));
        let inner = egui::Rect::from_min_size(Pos2::new(0.0, 30.0), egui::vec2(300.0, 200.0));
        assert_eq!(
            overlay.sync_from_rects(Some(outer), inner),
            Some(WindowGeometry::new(300, 200, 0, 30))
        );

        let wanted = WindowGeometry::new(300, 200, 0, 0);
        overlay.set_geometry(wanted);
        assert!(matches!(
            overlay.pending[0],
            egui::ViewportCommand::OuterPosition(pos) if pos == Pos2::new(0.0, -30.0)
        ));

        // The window manager places the client area where it was asked to.
        let outer = outer.translate(egui::vec2(0.0, -30.0));
        let inner = inner.translate(egui::vec2(0.0, -30.0));
        for _ in 0..=SETTLE_FRAMES {
            assert_eq!(overlay.sync_from_rects(Some(outer), inner), None);
        }
        assert_eq!(overlay.geometry(), wanted);
    }

    #[test]
    fn hidden_overlay_drops_inline_panels() {
        let path = std::env::temp_dir().join("overlay_painter_unused.json");
        let mut app = PainterApp::new(
            &PainterConfig::default(),
            path,
            Box::new(crate::draw::window_query::NullWindowQuery),
        );
        assert!(app.shows_inline_panels());
        app.overlay.set_visible(false);
        assert!(!app.shows_inline_panels());
        app.overlay.set_visible(true);
        app.separate_layout = true;
        assert!(!app.shows_inline_panels());
    }
}
