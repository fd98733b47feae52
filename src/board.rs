//! A single game session: the grid, the move record and whose turn it is

use log::debug;

use crate::config::EngineConfig;
use crate::encoding::parse_sequence;
use crate::error::{EngineError, MoveRejection};
use crate::grid::{Grid, Player};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameState {
    Playing,
    /// `cells` holds exactly `win_length` (row, column) pairs along the deciding line
    Win {
        winner: Player,
        cells: Vec<(usize, usize)>,
    },
    Draw,
}

impl GameState {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameState::Playing)
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    win_length: usize,
    moves: Vec<usize>, // 0-indexed columns, one per ply
    player: Player,
    state: GameState,
}

impl Board {
    pub fn new(rows: usize, cols: usize, win_length: usize) -> Self {
        Self {
            grid: Grid::new(rows, cols),
            win_length,
            moves: Vec::new(),
            player: Player::One,
            state: GameState::Playing,
        }
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::new(config.rows, config.cols, config.win_length)
    }

    /// Plays out a move sequence in its external (1-based) form
    pub fn from_moves<S: AsRef<str>>(moves: S, rows: usize, cols: usize, win_length: usize) -> Result<Self, EngineError> {
        let mut board = Self::new(rows, cols, win_length);
        for column in parse_sequence(moves.as_ref(), cols)? {
            board.drop(column)?;
        }
        Ok(board)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn cols(&self) -> usize {
        self.grid.cols()
    }

    pub fn win_length(&self) -> usize {
        self.win_length
    }

    /// The player to move, or the winner once the game is won
    pub fn player(&self) -> Player {
        self.player
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn winner(&self) -> Option<Player> {
        match self.state {
            GameState::Win { winner, .. } => Some(winner),
            _ => None,
        }
    }

    pub fn winning_cells(&self) -> Option<&[(usize, usize)]> {
        match &self.state {
            GameState::Win { cells, .. } => Some(cells),
            _ => None,
        }
    }

    /// Columns played so far, 0-indexed
    pub fn moves(&self) -> &[usize] {
        &self.moves
    }

    pub fn num_moves(&self) -> usize {
        self.moves.len()
    }

    /// Drops the current player's disc into `column` (0-indexed) and returns
    /// the landing row. The turn only passes if the game goes on.
    pub fn drop(&mut self, column: usize) -> Result<usize, EngineError> {
        let reject = |reason| EngineError::InvalidMove {
            column: column + 1,
            reason,
        };
        if self.state.is_over() {
            return Err(reject(MoveRejection::GameOver));
        }
        if column >= self.grid.cols() {
            return Err(reject(MoveRejection::OutOfRange));
        }
        let row = self
            .grid
            .drop(column, self.player)
            .ok_or_else(|| reject(MoveRejection::ColumnFull))?;
        self.moves.push(column);

        self.state = self.check_termination(row, column);
        if !self.state.is_over() {
            self.player = self.player.other();
        } else {
            debug!("game ended after {} moves: {:?}", self.moves.len(), self.state);
        }
        Ok(row)
    }

    /// Takes back the last move. Does nothing before the first move or once
    /// the game has ended.
    pub fn undo(&mut self) {
        if self.state.is_over() {
            return;
        }
        if let Some(column) = self.moves.pop() {
            self.grid.lift(column);
            self.player = self.player.other();
            self.state = GameState::Playing;
        }
    }

    /// Evaluates the position after a disc landed at (row, column)
    pub fn check_termination(&self, row: usize, column: usize) -> GameState {
        if let Some(cells) = self.grid.winning_line(row, column, self.win_length) {
            if let Some(winner) = self.grid.get(row, column).owner() {
                return GameState::Win { winner, cells };
            }
        }
        if self.grid.is_full() {
            GameState::Draw
        } else {
            GameState::Playing
        }
    }

    pub fn reset(&mut self) {
        self.grid.clear();
        self.moves.clear();
        self.player = Player::One;
        self.state = GameState::Playing;
    }
}
