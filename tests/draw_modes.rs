use overlay_painter::draw::canvas::RecordingCanvas;
use overlay_painter::draw::geometry::{arrow_tips, Point};
use overlay_painter::draw::input::{DrawEngine, EngineEvent, PointerButton, PointerModifiers};
use overlay_painter::draw::model::{Mode, Shape, Style};

#[test]
fn arrow_barbs_mirror_across_the_shaft() {
    let (tip1, tip2) = arrow_tips(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    assert!((tip1.x - tip2.x).abs() < 1e-9);
    assert!((tip1.y + tip2.y).abs() < 1e-9);
    assert!(tip1.y.abs() > 0.0);
    assert!(tip1.x < 10.0);
}

#[test]
fn shift_drag_previews_a_square() {
    let mut engine = DrawEngine::new(Style::default(), Mode::Rectangle);
    let mut canvas = RecordingCanvas::default();
    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerDown {
            point: (10, 10),
            button: PointerButton::Primary,
            modifiers: PointerModifiers {
                shift: true,
                alt: false,
            },
        },
    );
    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerDrag {
            point: (50, 30),
            button: PointerButton::Primary,
        },
    );

    let ghost = engine.ghost().unwrap();
    let item = canvas.get(ghost).unwrap();
    assert_eq!(
        item.shape,
        Shape::Rectangle {
            corner_a: Point::new(10.0, 10.0),
            corner_b: Point::new(50.0, 50.0),
        }
    );
    assert!(engine.history().is_empty());

    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerUp {
            point: (50, 30),
            button: PointerButton::Primary,
        },
    );
    assert_eq!(engine.ghost(), None);
    assert_eq!(canvas.items().len(), 1);
    assert_eq!(
        canvas.items()[0].shape,
        Shape::Rectangle {
            corner_a: Point::new(10.0, 10.0),
            corner_b: Point::new(50.0, 50.0),
        }
    );
}
