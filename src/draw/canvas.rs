use crate::draw::model::{Color, PrimitiveHandle, PrimitiveTag, Shape, ShapeStyle};
use std::collections::HashSet;

/// Rendering surface the engine draws on.
pub trait Canvas {
    fn create(&mut self, shape: Shape, style: ShapeStyle, tag: Option<PrimitiveTag>)
        -> PrimitiveHandle;

    /// Deleting an unknown handle is a no-op.
    fn delete(&mut self, handle: PrimitiveHandle);

    fn delete_all(&mut self);

    fn configure_background(&mut self, color: Color);

    fn tags(&self, handle: PrimitiveHandle) -> HashSet<&'static str>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasItem {
    pub handle: PrimitiveHandle,
    pub shape: Shape,
    pub style: ShapeStyle,
    pub tag: Option<PrimitiveTag>,
}

/// Retained, in-memory canvas. Items are kept in stacking order (oldest first)
/// and painted by the overlay every frame.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    items: Vec<CanvasItem>,
    next_handle: u64,
    background: Color,
    revision: u64,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new(Color::WHITE)
    }
}

impl RecordingCanvas {
    pub fn new(background: Color) -> Self {
        Self {
            items: Vec::new(),
            next_handle: 1,
            background,
            revision: 0,
        }
    }

    pub fn items(&self) -> &[CanvasItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, handle: PrimitiveHandle) -> Option<&CanvasItem> {
        self.items.iter().find(|item| item.handle == handle)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    /// Bumped on every mutation; lets the renderer skip unchanged frames.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl Canvas for RecordingCanvas {
    fn create(
        &mut self,
        shape: Shape,
        style: ShapeStyle,
        tag: Option<PrimitiveTag>,
    ) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next_handle);
        self.next_handle += 1;
        self.items.push(CanvasItem {
            handle,
            shape,
            style,
            tag,
        });
        self.revision += 1;
        handle
    }

    fn delete(&mut self, handle: PrimitiveHandle) {
        let before = self.items.len();
        self.items.retain(|item| item.handle != handle);
        if self.items.len() != before {
            self.revision += 1;
        }
    }

    fn delete_all(&mut self) {
        self.items.clear();
        self.revision += 1;
    }

    fn configure_background(&mut self, color: Color) {
        self.background = color;
        self.revision += 1;
    }

    fn tags(&self, handle: PrimitiveHandle) -> HashSet<&'static str> {
        self.get(handle)
            .and_then(|item| item.tag)
            .map(|tag| HashSet::from([tag.as_str()]))
            .unwrap_or_default()
    }
}
