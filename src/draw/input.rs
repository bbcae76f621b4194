use crate::draw::canvas::Canvas;
use crate::draw::geometry::{arrow_polygon, ellipse_bounds, rectangle_corners, DragConstraint, Point};
use crate::draw::history::DrawHistory;
use crate::draw::keyboard::{map_key_event, KeyEvent};
use crate::draw::messages::Command;
use crate::draw::model::{Color, Mode, PrimitiveHandle, PrimitiveTag, Shape, ShapeStyle, Style};
use crate::draw::status::StatusUpdate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerModifiers {
    pub shift: bool,
    pub alt: bool,
}

impl PointerModifiers {
    /// Shift wins over alt when both are held.
    pub fn constraint(self) -> DragConstraint {
        if self.shift {
            DragConstraint::Square
        } else if self.alt {
            DragConstraint::Centered
        } else {
            DragConstraint::Free
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Draws with the current mode.
    Primary,
    /// Draws a straight line regardless of mode.
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    PointerDown {
        point: (i32, i32),
        button: PointerButton,
        modifiers: PointerModifiers,
    },
    /// Motion with a button held.
    PointerDrag {
        point: (i32, i32),
        button: PointerButton,
    },
    /// Motion with no button held.
    PointerHover { point: (i32, i32) },
    PointerUp {
        point: (i32, i32),
        button: PointerButton,
    },
    PointerLeave,
    Key(KeyEvent),
    Command(Command),
}

/// Side effects the engine cannot perform on the canvas itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEffect {
    Status(StatusUpdate),
    SetOpacity(u8),
    /// Queue a command on the bus (keyboard shortcuts go through the bus).
    Submit(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DragState {
    /// Press point for shapes; previous point for freehand strokes.
    anchor: (i32, i32),
    button: PointerButton,
    constraint: DragConstraint,
}

/// Mode state machine. Owns the style, the pending text, the ghost preview
/// and the undo history, and turns events into canvas operations.
#[derive(Debug, Clone)]
pub struct DrawEngine {
    mode: Mode,
    style: Style,
    text: String,
    capturing: bool,
    drag: Option<DragState>,
    ghost: Option<PrimitiveHandle>,
    history: DrawHistory,
}

impl Default for DrawEngine {
    fn default() -> Self {
        Self::new(Style::default(), Mode::default())
    }
}

impl DrawEngine {
    pub fn new(style: Style, mode: Mode) -> Self {
        Self {
            mode,
            style,
            text: String::new(),
            capturing: false,
            drag: None,
            ghost: None,
            history: DrawHistory::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn ghost(&self) -> Option<PrimitiveHandle> {
        self.ghost
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn drag_anchor(&self) -> Option<(i32, i32)> {
        self.drag.map(|drag| drag.anchor)
    }

    pub fn apply_event(&mut self, canvas: &mut dyn Canvas, event: EngineEvent) -> Vec<EngineEffect> {
        match event {
            EngineEvent::PointerDown {
                point,
                button,
                modifiers,
            } => {
                self.handle_down(canvas, point, button, modifiers);
                Vec::new()
            }
            EngineEvent::PointerDrag { point, button } => {
                self.handle_drag(canvas, point, button);
                Vec::new()
            }
            EngineEvent::PointerHover { point } => {
                self.handle_hover(canvas, point);
                Vec::new()
            }
            EngineEvent::PointerUp { point, button } => self.handle_up(canvas, point, button),
            EngineEvent::PointerLeave => {
                self.reset(canvas);
                Vec::new()
            }
            EngineEvent::Key(key) => self.handle_key(key),
            EngineEvent::Command(command) => self.dispatch(canvas, command),
        }
    }

    fn handle_down(
        &mut self,
        canvas: &mut dyn Canvas,
        point: (i32, i32),
        button: PointerButton,
        modifiers: PointerModifiers,
    ) {
        let constraint = match button {
            PointerButton::Primary => modifiers.constraint(),
            PointerButton::Secondary => DragConstraint::Free,
        };
        self.drag = Some(DragState {
            anchor: point,
            button,
            constraint,
        });
        if button == PointerButton::Secondary {
            return;
        }

        match self.mode {
            Mode::Pen | Mode::Eraser => {
                self.clear_ghost(canvas);
                let at = Point::from(point);
                self.commit(
                    canvas,
                    Shape::Line { from: at, to: at },
                    self.style.stroke_style(self.paint_color()),
                    PrimitiveTag::StrokeStart,
                );
            }
            Mode::Text => {
                let shape = self.text_shape(point);
                self.commit(canvas, shape, self.text_style(), PrimitiveTag::Discrete);
            }
            Mode::Rectangle | Mode::Ellipse | Mode::Arrow => {}
        }
    }

    fn handle_drag(&mut self, canvas: &mut dyn Canvas, point: (i32, i32), button: PointerButton) {
        let Some(drag) = self.drag.filter(|drag| drag.button == button) else {
            return;
        };

        if button == PointerButton::Secondary {
            let line = Shape::Line {
                from: Point::from(drag.anchor),
                to: Point::from(point),
            };
            self.replace_ghost(canvas, line, self.style.stroke_style(self.style.stroke_color));
            return;
        }

        match self.mode {
            Mode::Pen | Mode::Eraser => {
                let segment = Shape::Line {
                    from: Point::from(drag.anchor),
                    to: Point::from(point),
                };
                self.commit(
                    canvas,
                    segment,
                    self.style.stroke_style(self.paint_color()),
                    PrimitiveTag::StrokeContinuation,
                );
                self.drag = Some(DragState {
                    anchor: point,
                    ..drag
                });
            }
            Mode::Rectangle | Mode::Ellipse | Mode::Arrow => {
                if let Some(shape) = self.shape_for(drag, point) {
                    self.replace_ghost(canvas, shape, self.style.shape_style());
                }
            }
            Mode::Text => {
                let shape = self.text_shape(point);
                self.replace_ghost(canvas, shape, self.text_style());
            }
        }
    }

    fn handle_hover(&mut self, canvas: &mut dyn Canvas, point: (i32, i32)) {
        if self.drag.is_some() {
            return;
        }
        match self.mode {
            Mode::Pen | Mode::Eraser => {
                let radius = f64::from(self.style.line_width) / 2.0;
                let (x, y) = (f64::from(point.0), f64::from(point.1));
                let ring = Shape::Oval {
                    corner_a: Point::new(x - radius, y - radius),
                    corner_b: Point::new(x + radius, y + radius),
                };
                let style = ShapeStyle {
                    outline: Some(Color::BLACK),
                    fill: None,
                    width: 1,
                };
                self.replace_ghost(canvas, ring, style);
            }
            Mode::Text => {
                let shape = self.text_shape(point);
                self.replace_ghost(canvas, shape, self.text_style());
            }
            Mode::Rectangle | Mode::Ellipse | Mode::Arrow => {}
        }
    }

    fn handle_up(
        &mut self,
        canvas: &mut dyn Canvas,
        point: (i32, i32),
        button: PointerButton,
    ) -> Vec<EngineEffect> {
        let mut effects = Vec::new();
        let drag = self.drag.filter(|drag| drag.button == button);

        match (button, drag) {
            (PointerButton::Secondary, Some(drag)) => {
                let line = Shape::Line {
                    from: Point::from(drag.anchor),
                    to: Point::from(point),
                };
                self.commit(
                    canvas,
                    line,
                    self.style.stroke_style(self.style.stroke_color),
                    PrimitiveTag::Discrete,
                );
            }
            (PointerButton::Primary, Some(drag)) => {
                if let Some(shape) = self.shape_for(drag, point) {
                    self.commit(canvas, shape, self.style.shape_style(), PrimitiveTag::Discrete);
                }
            }
            (_, None) => {}
        }

        if button == PointerButton::Primary && self.mode == Mode::Text && !self.capturing {
            self.mode = Mode::Pen;
            effects.push(EngineEffect::Status(StatusUpdate {
                mode: Some(self.mode),
                ..StatusUpdate::default()
            }));
        }

        self.reset(canvas);
        effects
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<EngineEffect> {
        let action = map_key_event(key, self.capturing, &self.style);
        let mut effects = Vec::new();
        match action.capture {
            Some(true) => {
                self.capturing = true;
                self.text.clear();
                effects.push(EngineEffect::Status(StatusUpdate {
                    text: Some(String::new()),
                    ..StatusUpdate::default()
                }));
            }
            Some(false) => self.capturing = false,
            None => {}
        }
        effects.extend(action.commands.into_iter().map(EngineEffect::Submit));
        effects
    }

    /// Applies one bus command. Every field change is reported as a status update.
    pub fn dispatch(&mut self, canvas: &mut dyn Canvas, command: Command) -> Vec<EngineEffect> {
        let mut update = StatusUpdate::default();
        let mut effects = Vec::new();

        match command {
            Command::Color(color) => {
                self.style.stroke_color = color;
                update.color = Some(color);
            }
            Command::Background(color) => {
                self.style.background_color = color;
                canvas.configure_background(color);
                update.bg_color = Some(color);
            }
            Command::Wipe => self.wipe(canvas),
            Command::Undo => self.undo(canvas),
            Command::Mode(mode) => {
                self.mode = mode;
                self.reset(canvas);
                update.mode = Some(mode);
            }
            Command::Width(width) => {
                self.style.line_width = width;
                update.width = Some(width);
            }
            Command::Alpha(alpha) => {
                self.style.opacity = alpha;
                effects.push(EngineEffect::SetOpacity(alpha));
                update.alpha = Some(alpha);
            }
            Command::Text(text) => {
                if self.capturing {
                    self.text.push_str(&text);
                } else {
                    self.text = text;
                }
                update.text = Some(self.text.clone());
            }
            Command::Fill(on) => {
                self.style.fill_color = on.then_some(self.style.stroke_color);
                update.fill = Some(self.style.fill_color);
            }
        }

        if !update.is_empty() {
            effects.push(EngineEffect::Status(update));
        }
        effects
    }

    /// Removes the last gesture. A freehand stroke goes as a whole, and a
    /// stroke still being drawn ends here.
    pub fn undo(&mut self, canvas: &mut dyn Canvas) {
        self.reset(canvas);
        for entry in self.history.undo() {
            canvas.delete(entry.handle);
        }
    }

    /// Erases everything, ghost included. Not undoable.
    pub fn wipe(&mut self, canvas: &mut dyn Canvas) {
        let removed = self.history.clear();
        tracing::debug!(primitives = removed.len(), "wiping canvas");
        canvas.delete_all();
        self.ghost = None;
        self.drag = None;
    }

    /// Drops any in-progress interaction: ghost, drag start and modifiers.
    pub fn reset(&mut self, canvas: &mut dyn Canvas) {
        self.clear_ghost(canvas);
        self.drag = None;
    }

    fn paint_color(&self) -> Color {
        match self.mode {
            Mode::Eraser => self.style.background_color,
            _ => self.style.stroke_color,
        }
    }

    fn text_shape(&self, point: (i32, i32)) -> Shape {
        Shape::Text {
            at: Point::from(point),
            text: self.text.clone(),
            size: self.style.font_size(),
        }
    }

    fn text_style(&self) -> ShapeStyle {
        ShapeStyle {
            outline: None,
            fill: Some(self.style.stroke_color),
            width: self.style.line_width,
        }
    }

    /// Ghost and committed shapes both come from here so release never jumps.
    fn shape_for(&self, drag: DragState, point: (i32, i32)) -> Option<Shape> {
        match self.mode {
            Mode::Rectangle => {
                let (corner_a, corner_b) = rectangle_corners(drag.anchor, point, drag.constraint);
                Some(Shape::Rectangle { corner_a, corner_b })
            }
            Mode::Ellipse => {
                let (corner_a, corner_b) = ellipse_bounds(drag.anchor, point, drag.constraint);
                Some(Shape::Oval { corner_a, corner_b })
            }
            Mode::Arrow => Some(Shape::Polygon {
                points: arrow_polygon(Point::from(drag.anchor), Point::from(point)),
            }),
            Mode::Pen | Mode::Eraser | Mode::Text => None,
        }
    }

    fn commit(&mut self, canvas: &mut dyn Canvas, shape: Shape, style: ShapeStyle, tag: PrimitiveTag) {
        let handle = canvas.create(shape, style, Some(tag));
        self.history.commit(handle, tag);
    }

    fn replace_ghost(&mut self, canvas: &mut dyn Canvas, shape: Shape, style: ShapeStyle) {
        self.clear_ghost(canvas);
        self.ghost = Some(canvas.create(shape, style, None));
    }

    fn clear_ghost(&mut self, canvas: &mut dyn Canvas) {
        if let Some(ghost) = self.ghost.take() {
            canvas.delete(ghost);
        }
    }
}
