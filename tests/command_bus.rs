use overlay_painter::draw::canvas::RecordingCanvas;
use overlay_painter::draw::follow::OverlayWindow;
use overlay_painter::draw::geometry::WindowGeometry;
use overlay_painter::draw::messages::Command;
use overlay_painter::draw::model::{Color, Mode};
use overlay_painter::draw::scheduler::COMMAND_POLL_INTERVAL;
use overlay_painter::draw::service::PainterRuntime;
use overlay_painter::draw::status::StatusField;
use overlay_painter::draw::window_query::NullWindowQuery;
use overlay_painter::settings::PainterConfig;
use std::time::Instant;

#[derive(Default)]
struct Overlay {
    geometry: WindowGeometry,
    opacity: Option<u8>,
}

impl OverlayWindow for Overlay {
    fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    fn set_geometry(&mut self, geometry: WindowGeometry) {
        self.geometry = geometry;
    }

    fn set_visible(&mut self, _visible: bool) {}

    fn set_opacity(&mut self, alpha: u8) {
        self.opacity = Some(alpha);
    }
}

#[test]
fn width_command_reaches_both_observers() {
    let config = PainterConfig::from_json_str(r##"{"width":5,"color":"#000000","alpha":80}"##)
        .unwrap();
    assert_eq!(config.style.line_width, 5);
    assert_eq!(config.style.stroke_color, Color::BLACK);
    assert_eq!(config.style.opacity, 80);

    let start = Instant::now();
    let mut runtime = PainterRuntime::new(&config, start);
    let mut canvas = RecordingCanvas::default();
    let mut overlay = Overlay::default();

    assert!(runtime.sender().submit_wire("width 8"));
    runtime.tick(
        start + COMMAND_POLL_INTERVAL,
        &mut canvas,
        &mut overlay,
        &mut NullWindowQuery,
    );

    assert_eq!(runtime.engine().style().line_width, 8);
    assert_eq!(runtime.status_bar().text(StatusField::Width), Some("width: 8"));
    assert_eq!(runtime.control_panel().width_display(), "8");
}

#[test]
fn observers_track_the_latest_value_of_every_field() {
    let mut runtime = PainterRuntime::new(&PainterConfig::default(), Instant::now());
    let mut canvas = RecordingCanvas::default();
    let mut overlay = Overlay::default();
    let sender = runtime.sender();

    for wire in [
        "width 3", "alpha 40", "color #ff0000", "mode arrow", "width 9", "alpha 65",
        "color #00ff00", "mode eraser",
    ] {
        assert!(sender.submit_wire(wire), "{wire} should be accepted");
    }
    runtime.drain_commands(&mut canvas, &mut overlay);

    let bar = runtime.status_bar();
    assert_eq!(bar.text(StatusField::Width), Some("width: 9"));
    assert_eq!(bar.text(StatusField::Alpha), Some("opacity: 65"));
    assert_eq!(bar.text(StatusField::Color), Some("color: #00ff00"));
    assert_eq!(bar.text(StatusField::Mode), Some("mode: eraser"));

    let panel = runtime.control_panel();
    assert_eq!(panel.width, 9);
    assert_eq!(panel.alpha, 65);
    assert_eq!(panel.color, Color::rgb(0, 255, 0));
    assert_eq!(panel.active_mode, Mode::Eraser);
    assert_eq!(overlay.opacity, Some(65));
}

#[test]
fn bad_commands_are_dropped_whole() {
    let mut runtime = PainterRuntime::new(&PainterConfig::default(), Instant::now());
    let sender = runtime.sender();

    assert!(!sender.submit_wire("width eight"));
    assert!(!sender.submit_wire("color #12"));
    assert!(!sender.submit_wire("teleport 3"));
    assert_eq!(
        runtime.drain_commands(&mut RecordingCanvas::default(), &mut Overlay::default()),
        0
    );
    assert_eq!(runtime.engine().style().line_width, 5);
}

#[test]
fn producers_on_other_threads_keep_their_order() {
    let mut runtime = PainterRuntime::new(&PainterConfig::default(), Instant::now());
    let sender = runtime.sender();
    std::thread::spawn(move || {
        for width in 1..=10 {
            sender.submit(Command::Width(width));
        }
    })
    .join()
    .unwrap();

    assert_eq!(
        runtime.drain_commands(&mut RecordingCanvas::default(), &mut Overlay::default()),
        10
    );
    assert_eq!(runtime.engine().style().line_width, 10);
}
