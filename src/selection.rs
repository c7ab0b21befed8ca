//! Drag-selection tracking.
//!
//! [`SelectionController`] follows one pointer gesture at a time: a press
//! anchors the selection, hovering extends it along a straight line, and the
//! release hands the traced path back as a candidate.

use tracing::debug;

use crate::geometry::{resolve, Cell, CellPath};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Drag {
    anchor: Cell,
    path: CellPath,
}

/// Tracks an in-progress drag gesture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    drag: Option<Drag>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a drag at `cell`.
    ///
    /// `enabled` reflects whether the session currently accepts selections
    /// (phase Active, no reveal pending). When it is `false` the press is
    /// ignored. Returns whether a drag started.
    pub fn begin_drag(&mut self, cell: Cell, enabled: bool) -> bool {
        if !enabled {
            debug!(%cell, "selection disabled, ignoring press");
            return false;
        }
        self.drag = Some(Drag {
            anchor: cell,
            path: CellPath::single(cell),
        });
        true
    }

    /// Extend the drag towards `cell`.
    ///
    /// An off-line hover leaves the previous path in place. Returns whether
    /// the path changed.
    pub fn extend_drag(&mut self, cell: Cell) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        match resolve(drag.anchor, cell) {
            Some(path) if path != drag.path => {
                drag.path = path;
                true
            }
            _ => false,
        }
    }

    /// Finish the drag and return the traced path as a candidate.
    ///
    /// A press without movement still yields its one-cell path.
    pub fn end_drag(&mut self) -> Option<CellPath> {
        self.drag.take().map(|drag| drag.path)
    }

    /// Drop any in-progress drag without producing a candidate.
    pub fn cancel(&mut self) {
        if self.drag.take().is_some() {
            debug!("in-progress selection cancelled");
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn anchor(&self) -> Option<Cell> {
        self.drag.as_ref().map(|drag| drag.anchor)
    }

    /// The path currently highlighted as being selected.
    pub fn path(&self) -> Option<&CellPath> {
        self.drag.as_ref().map(|drag| &drag.path)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn disabled_press_is_ignored() {
        let mut selection = SelectionController::new();
        assert!(!selection.begin_drag(Cell::new(0, 0), false));
        assert!(!selection.is_dragging());
        assert!(selection.path().is_none());
        assert!(selection.end_drag().is_none());
    }

    #[test]
    fn press_anchors_single_cell_path() {
        let mut selection = SelectionController::new();
        assert!(selection.begin_drag(Cell::new(1, 1), true));
        assert_eq!(selection.anchor(), Some(Cell::new(1, 1)));
        assert_eq!(selection.path().unwrap().cells(), &[Cell::new(1, 1)]);
    }

    #[test]
    fn hover_extends_along_a_line() {
        let mut selection = SelectionController::new();
        selection.begin_drag(Cell::new(0, 0), true);
        assert!(selection.extend_drag(Cell::new(0, 1)));
        assert!(selection.extend_drag(Cell::new(0, 2)));
        assert_eq!(selection.path().unwrap().len(), 3);
    }

    #[test]
    fn off_line_hover_keeps_previous_path() {
        let mut selection = SelectionController::new();
        selection.begin_drag(Cell::new(0, 0), true);
        selection.extend_drag(Cell::new(2, 2));
        let before = selection.path().cloned();

        assert!(!selection.extend_drag(Cell::new(2, 1)));
        assert_eq!(selection.path().cloned(), before);

        // Back on a line, the drag resumes.
        assert!(selection.extend_drag(Cell::new(2, 0)));
        assert_eq!(selection.path().unwrap().end(), Cell::new(2, 0));
    }

    #[test]
    fn hovering_the_anchor_keeps_previous_path() {
        let mut selection = SelectionController::new();
        selection.begin_drag(Cell::new(1, 1), true);
        selection.extend_drag(Cell::new(1, 3));
        assert!(!selection.extend_drag(Cell::new(1, 1)));
        assert_eq!(selection.path().unwrap().len(), 3);
    }

    #[test]
    fn hover_without_drag_does_nothing() {
        let mut selection = SelectionController::new();
        assert!(!selection.extend_drag(Cell::new(0, 1)));
        assert!(selection.path().is_none());
    }

    #[test]
    fn release_emits_path_and_resets() {
        let mut selection = SelectionController::new();
        selection.begin_drag(Cell::new(0, 0), true);
        selection.extend_drag(Cell::new(2, 0));

        let path = selection.end_drag().unwrap();
        assert_eq!(path.start(), Cell::new(0, 0));
        assert_eq!(path.end(), Cell::new(2, 0));
        assert!(!selection.is_dragging());
        assert!(selection.end_drag().is_none());
    }

    #[test]
    fn release_without_movement_emits_single_cell() {
        let mut selection = SelectionController::new();
        selection.begin_drag(Cell::new(2, 2), true);
        assert_eq!(selection.end_drag().unwrap().len(), 1);
    }

    #[test]
    fn cancel_discards_without_candidate() {
        let mut selection = SelectionController::new();
        selection.begin_drag(Cell::new(0, 0), true);
        selection.extend_drag(Cell::new(0, 2));
        selection.cancel();
        assert!(!selection.is_dragging());
        assert!(selection.end_drag().is_none());
    }
}
