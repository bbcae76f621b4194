use overlay_painter::draw::canvas::{Canvas, RecordingCanvas};
use overlay_painter::draw::input::{DrawEngine, EngineEvent, PointerButton, PointerModifiers};
use overlay_painter::draw::messages::Command;
use overlay_painter::draw::model::{Mode, Style};

fn stroke(engine: &mut DrawEngine, canvas: &mut RecordingCanvas, from: (i32, i32), motions: i32) {
    engine.apply_event(
        canvas,
        EngineEvent::PointerDown {
            point: from,
            button: PointerButton::Primary,
            modifiers: PointerModifiers::default(),
        },
    );
    for step in 1..=motions {
        engine.apply_event(
            canvas,
            EngineEvent::PointerDrag {
                point: (from.0 + step, from.1 + step * 2),
                button: PointerButton::Primary,
            },
        );
    }
    engine.apply_event(
        canvas,
        EngineEvent::PointerUp {
            point: (from.0 + motions, from.1 + motions * 2),
            button: PointerButton::Primary,
        },
    );
}

fn rectangle(engine: &mut DrawEngine, canvas: &mut RecordingCanvas) {
    engine.apply_event(canvas, EngineEvent::Command(Command::Mode(Mode::Rectangle)));
    engine.apply_event(
        canvas,
        EngineEvent::PointerDown {
            point: (0, 0),
            button: PointerButton::Primary,
            modifiers: PointerModifiers::default(),
        },
    );
    engine.apply_event(
        canvas,
        EngineEvent::PointerDrag {
            point: (30, 40),
            button: PointerButton::Primary,
        },
    );
    engine.apply_event(
        canvas,
        EngineEvent::PointerUp {
            point: (30, 40),
            button: PointerButton::Primary,
        },
    );
}

#[test]
fn undo_removes_whole_stroke_and_nothing_else() {
    let mut engine = DrawEngine::new(Style::default(), Mode::Rectangle);
    let mut canvas = RecordingCanvas::default();
    rectangle(&mut engine, &mut canvas);
    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Mode(Mode::Pen)));

    let motions = 17;
    stroke(&mut engine, &mut canvas, (5, 5), motions);
    assert_eq!(canvas.len(), 1 + motions as usize + 1);

    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Undo));
    assert_eq!(canvas.len(), 1);
    assert!(canvas.tags(canvas.items()[0].handle).contains("shape"));

    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Undo));
    assert!(canvas.is_empty());
}

#[test]
fn consecutive_strokes_undo_one_at_a_time() {
    let mut engine = DrawEngine::new(Style::default(), Mode::Pen);
    let mut canvas = RecordingCanvas::default();
    stroke(&mut engine, &mut canvas, (0, 0), 3);
    stroke(&mut engine, &mut canvas, (50, 50), 4);
    assert_eq!(canvas.len(), 4 + 5);

    engine.undo(&mut canvas);
    assert_eq!(canvas.len(), 4);
    let tags: Vec<_> = canvas
        .items()
        .iter()
        .map(|item| canvas.tags(item.handle))
        .collect();
    assert!(tags[0].contains("manual-start"));
    assert!(tags[1..].iter().all(|tag| tag.contains("manual")));
}

#[test]
fn wipe_then_undo_is_a_no_op() {
    let mut engine = DrawEngine::new(Style::default(), Mode::Pen);
    let mut canvas = RecordingCanvas::default();
    stroke(&mut engine, &mut canvas, (0, 0), 5);
    rectangle(&mut engine, &mut canvas);

    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Wipe));
    assert!(canvas.is_empty());
    assert!(engine.history().is_empty());

    let effects = engine.apply_event(&mut canvas, EngineEvent::Command(Command::Undo));
    assert!(effects.is_empty());
    assert!(canvas.is_empty());
}

#[test]
fn undo_mid_stroke_ends_the_stroke_and_spares_earlier_shapes() {
    let mut engine = DrawEngine::new(Style::default(), Mode::Rectangle);
    let mut canvas = RecordingCanvas::default();
    rectangle(&mut engine, &mut canvas);
    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Mode(Mode::Pen)));

    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerDown {
            point: (50, 50),
            button: PointerButton::Primary,
            modifiers: PointerModifiers::default(),
        },
    );
    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerDrag {
            point: (51, 52),
            button: PointerButton::Primary,
        },
    );
    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Undo));
    assert_eq!(canvas.len(), 1);
    assert_eq!(engine.drag_anchor(), None);

    for point in [(52, 54), (53, 56)] {
        engine.apply_event(
            &mut canvas,
            EngineEvent::PointerDrag {
                point,
                button: PointerButton::Primary,
            },
        );
    }
    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerUp {
            point: (53, 56),
            button: PointerButton::Primary,
        },
    );
    assert_eq!(canvas.len(), 1);

    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Undo));
    assert!(canvas.is_empty());
}

#[test]
fn wipe_mid_stroke_leaves_nothing_to_continue() {
    let mut engine = DrawEngine::new(Style::default(), Mode::Pen);
    let mut canvas = RecordingCanvas::default();
    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerDown {
            point: (0, 0),
            button: PointerButton::Primary,
            modifiers: PointerModifiers::default(),
        },
    );
    engine.apply_event(&mut canvas, EngineEvent::Command(Command::Wipe));
    engine.apply_event(
        &mut canvas,
        EngineEvent::PointerDrag {
            point: (4, 4),
            button: PointerButton::Primary,
        },
    );
    assert!(canvas.is_empty());
    assert!(engine.history().is_empty());
}
