use crate::draw::model::{PrimitiveHandle, PrimitiveTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommittedPrimitive {
    pub handle: PrimitiveHandle,
    pub tag: PrimitiveTag,
}

/// Committed primitives in creation order.
///
/// A freehand stroke is one `StrokeStart` followed by any number of
/// `StrokeContinuation` entries; [`DrawHistory::undo`] removes such a run as
/// a single gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawHistory {
    undo_stack: Vec<CommittedPrimitive>,
}

impl DrawHistory {
    pub fn commit(&mut self, handle: PrimitiveHandle, tag: PrimitiveTag) {
        self.undo_stack.push(CommittedPrimitive { handle, tag });
    }

    /// Pops the most recent gesture and returns its primitives, newest first.
    /// Empty when there is nothing to undo.
    pub fn undo(&mut self) -> Vec<CommittedPrimitive> {
        let mut removed = Vec::new();
        while let Some(entry) = self.undo_stack.pop() {
            removed.push(entry);
            if entry.tag != PrimitiveTag::StrokeContinuation {
                break;
            }
            // A continuation run only ever swallows its own start.
            if self
                .undo_stack
                .last()
                .is_some_and(|next| next.tag == PrimitiveTag::Discrete)
            {
                break;
            }
        }
        removed
    }

    pub fn clear(&mut self) -> Vec<CommittedPrimitive> {
        std::mem::take(&mut self.undo_stack)
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    pub fn entries(&self) -> &[CommittedPrimitive] {
        &self.undo_stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(tags: &[PrimitiveTag]) -> DrawHistory {
        let mut history = DrawHistory::default();
        for (idx, tag) in tags.iter().enumerate() {
            history.commit(PrimitiveHandle(idx as u64), *tag);
        }
        history
    }

    #[test]
    fn undo_removes_whole_stroke_and_nothing_before_it() {
        use PrimitiveTag::*;
        let mut history = history_of(&[Discrete, StrokeStart, StrokeContinuation, StrokeContinuation]);

        let removed = history.undo();
        assert_eq!(removed.len(), 3);
        assert_eq!(removed.last().map(|p| p.tag), Some(StrokeStart));
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.entries()[0].tag, Discrete);
    }

    #[test]
    fn undo_of_discrete_shape_pops_one() {
        use PrimitiveTag::*;
        let mut history = history_of(&[StrokeStart, StrokeContinuation, Discrete]);
        assert_eq!(history.undo().len(), 1);
        assert_eq!(history.undo().len(), 2);
        assert!(history.undo().is_empty());
    }

    #[test]
    fn bare_stroke_start_is_its_own_gesture() {
        use PrimitiveTag::*;
        let mut history = history_of(&[StrokeStart, StrokeStart]);
        assert_eq!(history.undo().len(), 1);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn continuations_without_a_start_leave_earlier_shapes_alone() {
        use PrimitiveTag::*;
        let mut history = history_of(&[Discrete, StrokeContinuation, StrokeContinuation]);
        assert_eq!(history.undo().len(), 2);
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.entries()[0].tag, Discrete);
    }

    #[test]
    fn clear_then_undo_is_noop() {
        use PrimitiveTag::*;
        let mut history = history_of(&[StrokeStart, StrokeContinuation]);
        assert_eq!(history.clear().len(), 2);
        assert!(history.undo().is_empty());
        assert!(history.is_empty());
    }
}
