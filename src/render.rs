//! Pure view projections of session and selection state.

use std::fmt;
use std::time::Duration;

use crate::geometry::{Cell, CellPath};
use crate::puzzle::{FoundEntry, Grid, SolutionEntry, WordList};

/// Visual class of one grid cell, lowest precedence first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellClass {
    #[default]
    Normal,
    Selecting,
    Found,
    Solution,
}

impl CellClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Selecting => "selecting",
            Self::Found => "found",
            Self::Solution => "solution",
        }
    }
}

/// Per-cell classes for a whole grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    size: usize,
    classes: Vec<CellClass>,
}

impl BoardView {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn class_at(&self, cell: Cell) -> CellClass {
        self.index(cell)
            .and_then(|index| self.classes.get(index).copied())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellClass]> {
        self.classes.chunks(self.size.max(1))
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        (cell.row < self.size && cell.col < self.size).then_some(cell.row * self.size + cell.col)
    }

    /// Raise the class of every cell on `path` to at least `class`.
    fn paint(&mut self, path: &CellPath, class: CellClass) {
        for &cell in path {
            if let Some(slot) = self.index(cell).and_then(|i| self.classes.get_mut(i)) {
                *slot = (*slot).max(class);
            }
        }
    }
}

/// Classify every cell. Precedence: solution > found > selecting > normal.
pub fn project(
    grid: &Grid,
    found: &[FoundEntry],
    solutions: &[SolutionEntry],
    selection: Option<&CellPath>,
) -> BoardView {
    let size = grid.size();
    let mut view = BoardView {
        size,
        classes: vec![CellClass::Normal; size * size],
    };
    if let Some(path) = selection {
        view.paint(path, CellClass::Selecting);
    }
    for entry in found {
        view.paint(&entry.path, CellClass::Found);
    }
    for entry in solutions {
        view.paint(&entry.path, CellClass::Solution);
    }
    view
}

/// Found-word progress against the announced total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub found: usize,
    pub total: usize,
}

impl Progress {
    /// Percentage rounded to the nearest integer, within `0..=100`; 0 with
    /// no words.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let total = self.total as u128;
        let found = (self.found as u128).min(total);
        let rounded = (found * 100 + total / 2) / total;
        u32::try_from(rounded).unwrap_or(100)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} - {}%", self.found, self.total, self.percent())
    }
}

/// One line of the word panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordStatus {
    pub word: String,
    pub found: bool,
}

/// The word list in server order with found flags.
pub fn word_statuses(words: &WordList, is_found: impl Fn(&str) -> bool) -> Vec<WordStatus> {
    words
        .iter()
        .map(|word| WordStatus {
            word: word.to_string(),
            found: is_found(word),
        })
        .collect()
}

/// Format a duration as `MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
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
    use crate::geometry::resolve;

    fn grid() -> Grid {
        Grid::from_lines(&["CAT", "ARX", "TXX"]).unwrap()
    }

    fn path(from: (usize, usize), to: (usize, usize)) -> CellPath {
        resolve(from.into(), to.into()).unwrap()
    }

    #[test]
    fn untouched_grid_is_normal() {
        let view = project(&grid(), &[], &[], None);
        assert!(view.rows().flatten().all(|&c| c == CellClass::Normal));
        assert_eq!(view.rows().count(), 3);
    }

    #[test]
    fn selection_is_highlighted() {
        let selecting = path((0, 0), (2, 2));
        let view = project(&grid(), &[], &[], Some(&selecting));
        assert_eq!(view.class_at(Cell::new(1, 1)), CellClass::Selecting);
        assert_eq!(view.class_at(Cell::new(0, 1)), CellClass::Normal);
    }

    #[test]
    fn found_beats_selection_and_solution_beats_found() {
        let found = [FoundEntry {
            word: "CAT".into(),
            path: path((0, 0), (0, 2)),
        }];
        let solutions = [SolutionEntry {
            word: "CAT".into(),
            path: path((0, 0), (2, 0)),
        }];
        let selecting = path((0, 0), (2, 2));
        let view = project(&grid(), &found, &solutions, Some(&selecting));

        assert_eq!(view.class_at(Cell::new(0, 0)), CellClass::Solution);
        assert_eq!(view.class_at(Cell::new(0, 2)), CellClass::Found);
        assert_eq!(view.class_at(Cell::new(1, 0)), CellClass::Solution);
        assert_eq!(view.class_at(Cell::new(2, 2)), CellClass::Selecting);
        assert_eq!(view.class_at(Cell::new(1, 2)), CellClass::Normal);
    }

    #[test]
    fn out_of_grid_lookups_are_normal() {
        let view = project(&grid(), &[], &[], None);
        assert_eq!(view.class_at(Cell::new(7, 7)), CellClass::Normal);
    }

    #[test]
    fn progress_rounds_like_a_percentage_bar() {
        assert_eq!(Progress { found: 1, total: 3 }.percent(), 33);
        assert_eq!(Progress { found: 2, total: 3 }.percent(), 67);
        assert_eq!(Progress { found: 0, total: 0 }.percent(), 0);
        assert_eq!(Progress { found: 2, total: 4 }.to_string(), "2/4 - 50%");
    }

    #[test]
    fn progress_never_passes_full() {
        assert_eq!(Progress { found: 5, total: 4 }.percent(), 100);
        assert_eq!(Progress { found: usize::MAX, total: 1 }.percent(), 100);
        assert_eq!(Progress { found: 7, total: 7 }.to_string(), "7/7 - 100%");
    }

    #[test]
    fn word_panel_marks_found_words() {
        let words = WordList::new(["CAT", "DOG"]);
        let statuses = word_statuses(&words, |w| w == "DOG");
        assert_eq!(
            statuses,
            vec![
                WordStatus {
                    word: "CAT".into(),
                    found: false
                },
                WordStatus {
                    word: "DOG".into(),
                    found: true
                },
            ]
        );
    }

    #[test]
    fn elapsed_is_minutes_and_seconds() {
        assert_eq!(format_elapsed(Duration::ZERO), "00:00");
        assert_eq!(format_elapsed(Duration::from_millis(61_900)), "01:01");
        assert_eq!(format_elapsed(Duration::from_secs(3600)), "60:00");
    }
}
