//! Puzzle data: the letter grid, the target word list and the entries that
//! record where words were found.

use std::collections::HashSet;

use crate::error::{Result, WordFindError};
use crate::geometry::{Cell, CellPath};

/// An immutable square grid of single characters, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    letters: Vec<char>,
}

impl Grid {
    /// Build a grid from wire rows, where every cell is a one-character string.
    ///
    /// # Errors
    ///
    /// Returns [`WordFindError::MalformedMessage`] if the grid is empty, not
    /// square, or any cell is not exactly one character.
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(WordFindError::MalformedMessage("empty grid".into()));
        }
        if let Some((row_index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != size) {
            return Err(WordFindError::MalformedMessage(format!(
                "grid row {row_index} has {} cells, expected {size}",
                row.len()
            )));
        }
        // Rows are square now, so the cells already exist on the heap.
        let cells = size
            .checked_mul(size)
            .ok_or_else(|| WordFindError::MalformedMessage(format!("grid of {size} rows is too large")))?;
        let mut letters = Vec::with_capacity(cells);
        for (row_index, row) in rows.iter().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                let mut chars = cell.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) => letters.push(letter),
                    _ => {
                        return Err(WordFindError::MalformedMessage(format!(
                            "grid cell ({row_index}, {col_index}) is {cell:?}, expected one character"
                        )));
                    }
                }
            }
        }
        Ok(Self { size, letters })
    }

    /// Build a grid from one string per row (`["CAT", "ARX", "TXX"]`).
    ///
    /// # Errors
    ///
    /// Same conditions as [`Grid::from_rows`].
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Result<Self> {
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|line| line.as_ref().chars().map(String::from).collect())
            .collect();
        Self::from_rows(&rows)
    }

    /// Side length N.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    pub fn letter(&self, cell: Cell) -> Option<char> {
        if !self.contains(cell) {
            return None;
        }
        self.letters.get(cell.row * self.size + cell.col).copied()
    }

    /// Join the letters along `path` in path order.
    ///
    /// Returns `None` if any cell lies outside the grid.
    pub fn word_along(&self, path: &CellPath) -> Option<String> {
        path.iter().map(|&cell| self.letter(cell)).collect()
    }

    /// Whether every cell of `path` lies inside the grid.
    pub fn contains_path(&self, path: &CellPath) -> bool {
        path.iter().all(|&cell| self.contains(cell))
    }

    /// Iterate rows as character slices.
    pub fn rows(&self) -> impl Iterator<Item = &[char]> {
        self.letters.chunks(self.size.max(1))
    }
}

/// The target words for one puzzle, in server order, without duplicates.
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let words = words
            .into_iter()
            .map(Into::into)
            .filter(|word: &String| seen.insert(word.clone()))
            .collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

/// A grid and its word list. The two are only ever replaced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    grid: Grid,
    words: WordList,
    total_words: usize,
}

impl Puzzle {
    /// `total_words` is the count the server announced; it falls back to the
    /// word-list length when the server omitted it.
    pub fn new(grid: Grid, words: WordList, total_words: Option<usize>) -> Self {
        let total_words = total_words.unwrap_or(words.len());
        Self {
            grid,
            words,
            total_words,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn words(&self) -> &WordList {
        &self.words
    }

    /// Word count announced by the server (`total_palabras`).
    pub fn total_words(&self) -> usize {
        self.total_words
    }
}

/// A word the client accepted, with the path it was traced along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundEntry {
    pub word: String,
    pub path: CellPath,
}

/// A word position disclosed by the server in a solution reveal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionEntry {
    pub word: String,
    pub path: CellPath,
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

    fn cat_grid() -> Grid {
        Grid::from_lines(&["CAT", "ARX", "TXX"]).unwrap()
    }

    #[test]
    fn grid_reads_letters_by_row_and_column() {
        let grid = cat_grid();
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.letter(Cell::new(0, 1)), Some('A'));
        assert_eq!(grid.letter(Cell::new(2, 0)), Some('T'));
        assert_eq!(grid.letter(Cell::new(3, 0)), None);
        assert_eq!(grid.letter(Cell::new(0, 3)), None);
    }

    #[test]
    fn tall_grid_of_empty_rows_is_rejected_before_allocating() {
        let rows = vec![Vec::<String>::new(); 200_000];
        let err = Grid::from_rows(&rows).unwrap_err();
        assert!(matches!(err, WordFindError::MalformedMessage(_)));
    }

    #[test]
    fn short_last_row_is_rejected() {
        let rows: Vec<Vec<String>> = vec![
            vec!["A".into(), "B".into()],
            vec!["C".into()],
        ];
        let err = Grid::from_rows(&rows).unwrap_err();
        assert!(err.to_string().contains("grid row 1 has 1 cells"));
    }

    #[test]
    fn word_along_follows_path_order() {
        let grid = cat_grid();
        let across = resolve(Cell::new(0, 0), Cell::new(0, 2)).unwrap();
        assert_eq!(grid.word_along(&across).as_deref(), Some("CAT"));

        let backwards = resolve(Cell::new(0, 2), Cell::new(0, 0)).unwrap();
        assert_eq!(grid.word_along(&backwards).as_deref(), Some("TAC"));

        let down = resolve(Cell::new(0, 0), Cell::new(2, 0)).unwrap();
        assert_eq!(grid.word_along(&down).as_deref(), Some("CAT"));
    }

    #[test]
    fn word_along_rejects_out_of_grid_paths() {
        let grid = cat_grid();
        let path = resolve(Cell::new(0, 0), Cell::new(0, 4)).unwrap();
        assert!(!grid.contains_path(&path));
        assert_eq!(grid.word_along(&path), None);
    }

    #[test]
    fn grid_rejects_ragged_rows() {
        let err = Grid::from_lines(&["CAT", "AR", "TXX"]).unwrap_err();
        assert!(matches!(err, WordFindError::MalformedMessage(_)));
    }

    #[test]
    fn grid_rejects_non_square_shape() {
        assert!(Grid::from_lines(&["CATS", "ARXS", "TXXS"]).is_err());
        assert!(Grid::from_lines::<&str>(&[]).is_err());
    }

    #[test]
    fn grid_rejects_multi_character_cells() {
        let rows = vec![
            vec!["C".to_string(), "AT".to_string()],
            vec!["A".to_string(), "R".to_string()],
        ];
        assert!(Grid::from_rows(&rows).is_err());

        let rows = vec![
            vec!["C".to_string(), String::new()],
            vec!["A".to_string(), "R".to_string()],
        ];
        assert!(Grid::from_rows(&rows).is_err());
    }

    #[test]
    fn grid_accepts_non_ascii_letters() {
        let grid = Grid::from_lines(&["ÑA", "OS"]).unwrap();
        assert_eq!(grid.letter(Cell::new(0, 0)), Some('Ñ'));
    }

    #[test]
    fn rows_iterates_in_order() {
        let grid = cat_grid();
        let rows: Vec<String> = grid.rows().map(|r| r.iter().collect()).collect();
        assert_eq!(rows, vec!["CAT", "ARX", "TXX"]);
    }

    #[test]
    fn word_list_deduplicates_and_is_case_sensitive() {
        let words = WordList::new(["CAT", "DOG", "CAT"]);
        assert_eq!(words.len(), 2);
        assert!(words.contains("CAT"));
        assert!(!words.contains("cat"));
        assert_eq!(words.iter().collect::<Vec<_>>(), vec!["CAT", "DOG"]);
    }

    #[test]
    fn puzzle_total_defaults_to_word_count() {
        let puzzle = Puzzle::new(cat_grid(), WordList::new(["CAT"]), None);
        assert_eq!(puzzle.total_words(), 1);

        let puzzle = Puzzle::new(cat_grid(), WordList::new(["CAT"]), Some(4));
        assert_eq!(puzzle.total_words(), 4);
    }
}
