// Board contents: mine placement and neighbor counts
// Generated once per game and immutable until the next new-game swap

use rand::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid board configuration: {rows}x{columns} with {mines} mines")]
    InvalidConfiguration {
        rows: usize,
        columns: usize,
        mines: usize,
    },
    #[error("cell ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },
}

/// What a cell holds: a mine, or the number of mines among its
/// up-to-8 neighbors (0-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellContent {
    Mine,
    Count(u8),
}

/// Grid of cell contents, row-major.
#[derive(Clone)]
pub struct Board {
    rows: usize,
    columns: usize,
    mine_count: usize,
    cells: Vec<CellContent>,
}

impl Board {
    /// Generate a board with `mine_count` mines placed uniformly at random.
    pub fn generate(rows: usize, columns: usize, mine_count: usize) -> Result<Board, BoardError> {
        Self::generate_with(rows, columns, mine_count, &mut thread_rng())
    }

    /// Same as `generate` but with a caller-supplied RNG (seeded boards in tests).
    ///
    /// Placement shuffles a flat sequence of `mine_count` mine markers and
    /// `rows*columns - mine_count` empty markers, so the board always holds
    /// exactly `mine_count` mines and every placement is equally likely.
    pub fn generate_with<R: Rng + ?Sized>(
        rows: usize,
        columns: usize,
        mine_count: usize,
        rng: &mut R,
    ) -> Result<Board, BoardError> {
        if rows == 0 || columns == 0 || mine_count > rows * columns {
            return Err(BoardError::InvalidConfiguration {
                rows,
                columns,
                mines: mine_count,
            });
        }
        let mut markers = vec![true; mine_count];
        markers.resize(rows * columns, false);
        markers.shuffle(rng);
        Ok(Self::from_markers(rows, columns, mine_count, &markers))
    }

    /// Build a board with mines at the given coordinates. Used for fixed
    /// layouts where the placement must be known in advance.
    pub fn from_mine_coords(
        rows: usize,
        columns: usize,
        mines: &[(usize, usize)],
    ) -> Result<Board, BoardError> {
        if rows == 0 || columns == 0 {
            return Err(BoardError::InvalidConfiguration {
                rows,
                columns,
                mines: mines.len(),
            });
        }
        let mut markers = vec![false; rows * columns];
        for &(row, col) in mines {
            if row >= rows || col >= columns {
                return Err(BoardError::OutOfBounds { row, col });
            }
            markers[row * columns + col] = true;
        }
        let mine_count = markers.iter().filter(|&&m| m).count();
        Ok(Self::from_markers(rows, columns, mine_count, &markers))
    }

    /// Reshape the flat marker sequence into cell contents, computing the
    /// neighbor count for every non-mine cell over the bounds-clipped 3x3
    /// block around it (self excluded, no wraparound).
    fn from_markers(rows: usize, columns: usize, mine_count: usize, markers: &[bool]) -> Board {
        let cells = (0..rows * columns)
            .map(|i| {
                if markers[i] {
                    return CellContent::Mine;
                }
                let (row, col) = (i / columns, i % columns);
                let mut adj = 0u8;
                for nr in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                    for nc in col.saturating_sub(1)..=(col + 1).min(columns - 1) {
                        if (nr, nc) != (row, col) && markers[nr * columns + nc] {
                            adj += 1;
                        }
                    }
                }
                CellContent::Count(adj)
            })
            .collect();
        Board {
            rows,
            columns,
            mine_count,
            cells,
        }
    }

    pub fn content_at(&self, row: usize, col: usize) -> Result<CellContent, BoardError> {
        if !self.in_bounds(row, col) {
            return Err(BoardError::OutOfBounds { row, col });
        }
        Ok(self.cells[row * self.columns + col])
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn count_mines(board: &Board) -> usize {
        let mut mines = 0;
        for row in 0..board.rows() {
            for col in 0..board.columns() {
                if board.content_at(row, col).unwrap() == CellContent::Mine {
                    mines += 1;
                }
            }
        }
        mines
    }

    fn recount_neighbors(board: &Board, row: usize, col: usize) -> u8 {
        let mut adj = 0u8;
        for nr in row.saturating_sub(1)..=(row + 1).min(board.rows() - 1) {
            for nc in col.saturating_sub(1)..=(col + 1).min(board.columns() - 1) {
                if (nr, nc) != (row, col)
                    && board.content_at(nr, nc).unwrap() == CellContent::Mine
                {
                    adj += 1;
                }
            }
        }
        adj
    }

    #[test]
    fn generated_board_has_exact_mine_count() {
        for _ in 0..10 {
            let board = Board::generate(10, 10, 25).unwrap();
            assert_eq!(count_mines(&board), 25);
        }
        let board = Board::generate(5, 5, 0).unwrap();
        assert_eq!(count_mines(&board), 0);
        let board = Board::generate(3, 3, 9).unwrap();
        assert_eq!(count_mines(&board), 9);
    }

    #[test]
    fn neighbor_counts_match_recount() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let board = Board::generate_with(8, 12, 20, &mut rng).unwrap();
            for row in 0..board.rows() {
                for col in 0..board.columns() {
                    if let CellContent::Count(n) = board.content_at(row, col).unwrap() {
                        assert_eq!(n, recount_neighbors(&board, row, col));
                    }
                }
            }
        }
    }

    #[test]
    fn fixed_layout_counts() {
        let board = Board::from_mine_coords(3, 3, &[(0, 0), (2, 2)]).unwrap();
        assert_eq!(board.mine_count(), 2);
        assert_eq!(board.content_at(0, 0).unwrap(), CellContent::Mine);
        assert_eq!(board.content_at(2, 2).unwrap(), CellContent::Mine);
        assert_eq!(board.content_at(1, 1).unwrap(), CellContent::Count(2));
        assert_eq!(board.content_at(0, 1).unwrap(), CellContent::Count(1));
        assert_eq!(board.content_at(0, 2).unwrap(), CellContent::Count(0));
        assert_eq!(board.content_at(2, 0).unwrap(), CellContent::Count(0));
        assert_eq!(board.content_at(1, 2).unwrap(), CellContent::Count(1));
    }

    #[test]
    fn rejects_invalid_configurations() {
        assert!(matches!(
            Board::generate(0, 5, 0),
            Err(BoardError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Board::generate(5, 0, 0),
            Err(BoardError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Board::generate(3, 3, 10),
            Err(BoardError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn content_at_rejects_out_of_bounds() {
        let board = Board::generate(4, 6, 3).unwrap();
        assert!(matches!(
            board.content_at(4, 0),
            Err(BoardError::OutOfBounds { row: 4, col: 0 })
        ));
        assert!(matches!(
            board.content_at(0, 6),
            Err(BoardError::OutOfBounds { row: 0, col: 6 })
        ));
    }

    #[test]
    fn from_mine_coords_rejects_out_of_bounds() {
        assert!(matches!(
            Board::from_mine_coords(3, 3, &[(3, 0)]),
            Err(BoardError::OutOfBounds { .. })
        ));
    }
}
