use thiserror::Error;
use tracing::warn;

/// A finite rectangular grid of cells, row-major, with `(0, 0)` the top-left corner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    pub name: Option<String>,
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid cell '{got}' at line {line}, column {column}")]
    InvalidCell {
        line: usize,
        column: usize,
        got: char,
    },

    #[error("Rows have {got} cells, expected {exp}")]
    RaggedRows { exp: usize, got: usize },
}

impl Pattern {
    /// An all-dead pattern of the given size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            name: None,
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    /// Build a pattern from rows of cells. Every row must have the same length.
    pub fn from_rows<R>(rows: &[R]) -> Result<Self, PatternError>
    where
        R: AsRef<[bool]>,
    {
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut pattern = Self::new(width, rows.len());

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();

            if row.len() != width {
                return Err(PatternError::RaggedRows {
                    exp: width,
                    got: row.len(),
                });
            }

            pattern.cells[y * width..(y + 1) * width].copy_from_slice(row);
        }

        Ok(pattern)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cells outside the pattern are dead.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        assert!(x < self.width, "x is out of bounds");
        assert!(y < self.height, "y is out of bounds");

        self.cells[y * self.width + x] = alive;
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Coordinates of every living cell, row by row
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(|(i, _)| (i % self.width, i / self.width))
    }

    /// Parse the plaintext (`.cells`) format.
    ///
    /// Lines starting with `!` are comments, and `!Name:` gives the pattern its name. Dead cells
    /// are `.` or `0`, living cells `O`, `o`, `*` or `1`. Short rows are padded with dead cells.
    ///
    /// See: https://conwaylife.com/wiki/Plaintext
    pub fn parse_plaintext(text: &str) -> Result<Self, PatternError> {
        let mut name = None;
        let mut rows: Vec<Vec<bool>> = Vec::new();

        for (n, line) in text.lines().enumerate() {
            let line = line.trim_end();

            if let Some(comment) = line.strip_prefix('!') {
                if let Some(value) = comment.strip_prefix("Name:") {
                    if name.is_some() {
                        warn!("Pattern name already defined. Using latest");
                    }

                    name = Some(value.trim().to_string());
                }

                continue;
            }

            let row = line
                .chars()
                .enumerate()
                .map(|(column, c)| match c {
                    '.' | '0' => Ok(false),
                    'O' | 'o' | '*' | '1' => Ok(true),
                    got => Err(PatternError::InvalidCell {
                        line: n + 1,
                        column: column + 1,
                        got,
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;

            rows.push(row);
        }

        // Trailing blank lines carry no cells
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, false);
        }

        let mut pattern = Self::from_rows(&rows)?;
        pattern.name = name;

        Ok(pattern)
    }

    /// Write the pattern in the plaintext format, using `.` and `O`.
    pub fn to_plaintext(&self) -> String {
        let mut text = String::new();

        if let Some(name) = &self.name {
            text.push_str(&format!("!Name: {name}\n"));
        }

        for row in self.cells.chunks(self.width.max(1)) {
            text.extend(row.iter().map(|&alive| if alive { 'O' } else { '.' }));
            text.push('\n');
        }

        text
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_glider() {
        let text = "!Name: Glider\n!\n.O.\n..O\nOOO\n";

        let p = Pattern::parse_plaintext(text).unwrap();

        assert_eq!(p.name.as_deref(), Some("Glider"));
        assert_eq!((p.width(), p.height()), (3, 3));
        assert_eq!(
            p.live_cells().collect::<Vec<_>>(),
            vec![(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
        );
    }

    #[test]
    fn parse_pads_short_rows() {
        let p = Pattern::parse_plaintext("1\n011\n\n01\n\n").unwrap();

        assert_eq!((p.width(), p.height()), (3, 4));
        assert!(p.get(0, 0));
        assert!(!p.get(2, 0));
        assert!(!p.get(0, 2));
        assert!(p.get(1, 3));
        assert_eq!(p.population(), 4);
    }

    #[test]
    fn parse_rejects_unknown_cells() {
        let err = Pattern::parse_plaintext("..\n.x\n").unwrap_err();

        assert_eq!(
            err,
            PatternError::InvalidCell {
                line: 2,
                column: 2,
                got: 'x'
            }
        );
    }

    #[test]
    fn invalid_cell_column_counts_characters() {
        let err = Pattern::parse_plaintext("O.\n.O→.\n").unwrap_err();

        assert_eq!(
            err,
            PatternError::InvalidCell {
                line: 2,
                column: 3,
                got: '→'
            }
        );
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let rows = [vec![true, false], vec![true]];

        assert_eq!(
            Pattern::from_rows(&rows),
            Err(PatternError::RaggedRows { exp: 2, got: 1 })
        );
    }

    #[test]
    fn plaintext_round_trip() {
        let text = "!Name: Beacon\nOO..\nOO..\n..OO\n..OO\n";

        let p = Pattern::parse_plaintext(text).unwrap();

        assert_eq!(p.to_plaintext(), text);
    }

    #[test]
    fn empty_text_is_an_empty_pattern() {
        let p = Pattern::parse_plaintext("!Name: nothing\n").unwrap();

        assert_eq!((p.width(), p.height()), (0, 0));
        assert_eq!(p.population(), 0);
    }
}
