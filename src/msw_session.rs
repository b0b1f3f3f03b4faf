// Reveal/flag state machine over a Board
// Pure game state: no rendering dependency, the UI drains render events
// or polls the cell queries

use crate::msw_board::{Board, BoardError, CellContent};

/// Visibility of a single cell. One state per cell, so a cell can never be
/// both flagged and revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed,
}

/// Notifications for the presentation layer, drained via `take_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// Cell content became visible at (row, col).
    CellShown {
        row: usize,
        col: usize,
        content: CellContent,
    },
    /// Flag marker placed at (row, col).
    FlagPlaced { row: usize, col: usize },
    /// Flag or content marker removed at (row, col).
    MarkerCleared { row: usize, col: usize },
    /// A mine was revealed; the whole board has been revealed.
    Lost,
}

/// A single game in progress: per-cell visibility over an owned board.
pub struct GameSession {
    board: Board,
    states: Vec<CellState>,
    lost: bool,
    events: Vec<RenderEvent>,
}

impl GameSession {
    pub fn new(rows: usize, columns: usize, mine_count: usize) -> Result<GameSession, BoardError> {
        let board = Board::generate(rows, columns, mine_count)?;
        Ok(Self::with_board(board))
    }

    pub fn with_board(board: Board) -> GameSession {
        let cells = board.rows() * board.columns();
        GameSession {
            board,
            states: vec![CellState::Hidden; cells],
            lost: false,
            events: Vec::new(),
        }
    }

    /// Reveal the cell at (row, col).
    ///
    /// A flagged cell is un-flagged first and then still revealed in the
    /// same call; an already-revealed cell is a no-op. Revealing a mine
    /// loses the session and forces every cell through this same path,
    /// so remaining flags are cleared exactly as if each cell were
    /// revealed by hand.
    pub fn reveal(&mut self, row: usize, col: usize) -> Result<(), BoardError> {
        let idx = self.index(row, col)?;
        if self.states[idx] == CellState::Flagged {
            self.states[idx] = CellState::Hidden;
            self.events.push(RenderEvent::MarkerCleared { row, col });
        }
        if self.states[idx] != CellState::Revealed {
            self.states[idx] = CellState::Revealed;
            let content = self.board.content_at(row, col)?;
            self.events.push(RenderEvent::CellShown { row, col, content });
            if content == CellContent::Mine && !self.lost {
                self.lost = true;
                self.reveal_all()?;
                self.events.push(RenderEvent::Lost);
            }
        }
        Ok(())
    }

    /// Reveal every cell by running it through `reveal`, row-major.
    /// Already-revealed cells are no-ops; flagged cells get un-flagged.
    fn reveal_all(&mut self) -> Result<(), BoardError> {
        for row in 0..self.board.rows() {
            for col in 0..self.board.columns() {
                self.reveal(row, col)?;
            }
        }
        Ok(())
    }

    /// Toggle the flag at (row, col). Revealed cells cannot be flagged.
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Result<(), BoardError> {
        let idx = self.index(row, col)?;
        match self.states[idx] {
            CellState::Hidden => {
                self.states[idx] = CellState::Flagged;
                self.events.push(RenderEvent::FlagPlaced { row, col });
            }
            CellState::Flagged => {
                self.states[idx] = CellState::Hidden;
                self.events.push(RenderEvent::MarkerCleared { row, col });
            }
            CellState::Revealed => {}
        }
        Ok(())
    }

    /// Start a fresh game on a new board with the same dimensions and the
    /// given mine count. An invalid mine count fails the operation and
    /// leaves the current session untouched.
    pub fn new_game(&mut self, mine_count: usize) -> Result<(), BoardError> {
        let board = Board::generate(self.board.rows(), self.board.columns(), mine_count)?;
        for row in 0..self.board.rows() {
            for col in 0..self.board.columns() {
                if self.states[row * self.board.columns() + col] != CellState::Hidden {
                    self.events.push(RenderEvent::MarkerCleared { row, col });
                }
            }
        }
        self.states.fill(CellState::Hidden);
        self.board = board;
        self.lost = false;
        Ok(())
    }

    pub fn cell_state(&self, row: usize, col: usize) -> Result<CellState, BoardError> {
        Ok(self.states[self.index(row, col)?])
    }

    /// Content of a cell. Only meaningful to the presentation layer for
    /// revealed cells; drawing hidden contents would leak the board.
    pub fn cell_content(&self, row: usize, col: usize) -> Result<CellContent, BoardError> {
        self.board.content_at(row, col)
    }

    pub fn lost(&self) -> bool {
        self.lost
    }

    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn columns(&self) -> usize {
        self.board.columns()
    }

    pub fn mine_count(&self) -> usize {
        self.board.mine_count()
    }

    /// Drain pending render notifications in emission order.
    pub fn take_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, BoardError> {
        if !self.board.in_bounds(row, col) {
            return Err(BoardError::OutOfBounds { row, col });
        }
        Ok(row * self.board.columns() + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    /// 2x2 board with a single mine at (0, 0).
    fn corner_mine_session() -> GameSession {
        GameSession::with_board(Board::from_mine_coords(2, 2, &[(0, 0)]).unwrap())
    }

    fn states(session: &GameSession) -> Vec<CellState> {
        let mut all = Vec::new();
        for row in 0..session.rows() {
            for col in 0..session.columns() {
                all.push(session.cell_state(row, col).unwrap());
            }
        }
        all
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut session = corner_mine_session();
        session.reveal(1, 1).unwrap();
        let first = states(&session);
        session.take_events();
        session.reveal(1, 1).unwrap();
        assert_eq!(states(&session), first);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn flag_round_trip_restores_hidden() {
        let mut session = corner_mine_session();
        session.toggle_flag(0, 1).unwrap();
        assert_eq!(session.cell_state(0, 1).unwrap(), CellState::Flagged);
        session.toggle_flag(0, 1).unwrap();
        assert_eq!(session.cell_state(0, 1).unwrap(), CellState::Hidden);
        assert_eq!(
            session.take_events(),
            vec![
                RenderEvent::FlagPlaced { row: 0, col: 1 },
                RenderEvent::MarkerCleared { row: 0, col: 1 },
            ]
        );
    }

    #[test]
    fn reveal_unflags_then_reveals_in_one_call() {
        let mut session = corner_mine_session();
        session.toggle_flag(1, 1).unwrap();
        session.take_events();
        session.reveal(1, 1).unwrap();
        assert_eq!(session.cell_state(1, 1).unwrap(), CellState::Revealed);
        assert_eq!(
            session.take_events(),
            vec![
                RenderEvent::MarkerCleared { row: 1, col: 1 },
                RenderEvent::CellShown {
                    row: 1,
                    col: 1,
                    content: CellContent::Count(1),
                },
            ]
        );
    }

    #[test]
    fn flags_cannot_be_placed_on_revealed_cells() {
        let mut session = corner_mine_session();
        session.reveal(1, 0).unwrap();
        session.take_events();
        session.toggle_flag(1, 0).unwrap();
        assert_eq!(session.cell_state(1, 0).unwrap(), CellState::Revealed);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn revealing_a_mine_reveals_the_whole_board() {
        let mut session = corner_mine_session();
        session.toggle_flag(1, 1).unwrap();
        session.take_events();
        session.reveal(0, 0).unwrap();
        assert!(session.lost());
        for state in states(&session) {
            assert_eq!(state, CellState::Revealed);
        }
        let events = session.take_events();
        // the clicked mine first, the flag cleared during the cascade,
        // and Lost strictly last
        assert_eq!(
            events[0],
            RenderEvent::CellShown {
                row: 0,
                col: 0,
                content: CellContent::Mine,
            }
        );
        assert!(events.contains(&RenderEvent::MarkerCleared { row: 1, col: 1 }));
        assert_eq!(events.last(), Some(&RenderEvent::Lost));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RenderEvent::Lost))
                .count(),
            1
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RenderEvent::CellShown { .. }))
                .count(),
            4
        );
    }

    #[test]
    fn new_game_resets_everything() {
        let board = Board::from_mine_coords(5, 5, &[(0, 1), (0, 2), (0, 3)]).unwrap();
        let mut session = GameSession::with_board(board);
        session.reveal(2, 2).unwrap();
        session.toggle_flag(0, 0).unwrap();
        session.take_events();
        session.new_game(5).unwrap();
        assert!(!session.lost());
        assert_eq!(session.mine_count(), 5);
        for state in states(&session) {
            assert_eq!(state, CellState::Hidden);
        }
        let events = session.take_events();
        assert!(events.contains(&RenderEvent::MarkerCleared { row: 2, col: 2 }));
        assert!(events.contains(&RenderEvent::MarkerCleared { row: 0, col: 0 }));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn new_game_with_too_many_mines_leaves_session_intact() {
        let mut session = corner_mine_session();
        session.reveal(1, 1).unwrap();
        assert!(matches!(
            session.new_game(5),
            Err(BoardError::InvalidConfiguration { .. })
        ));
        assert_eq!(session.cell_state(1, 1).unwrap(), CellState::Revealed);
        assert_eq!(session.mine_count(), 1);
    }

    #[test]
    fn out_of_bounds_operations_fail_loud() {
        let mut session = corner_mine_session();
        assert!(matches!(
            session.reveal(2, 0),
            Err(BoardError::OutOfBounds { row: 2, col: 0 })
        ));
        assert!(matches!(
            session.toggle_flag(0, 2),
            Err(BoardError::OutOfBounds { .. })
        ));
        assert!(matches!(
            session.cell_state(9, 9),
            Err(BoardError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn random_operation_sequences_keep_states_consistent() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut session = GameSession::new(6, 6, 8).unwrap();
            for _ in 0..200 {
                let row = rng.gen_range(0..6);
                let col = rng.gen_range(0..6);
                if rng.gen_bool(0.5) {
                    session.reveal(row, col).unwrap();
                } else {
                    session.toggle_flag(row, col).unwrap();
                }
                // each cell is in exactly one state by construction; a lost
                // session must have every cell revealed
                if session.lost() {
                    for state in states(&session) {
                        assert_eq!(state, CellState::Revealed);
                    }
                }
            }
        }
    }
}
