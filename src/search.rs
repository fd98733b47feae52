//! A fixed-depth minimax agent
//!
//! The agent never touches a live [`Board`](crate::board::Board). Every
//! candidate move is simulated on a fresh copy of the grid it is given, so
//! one `Search` can be driven from any thread that owns its input.

use log::debug;

use crate::error::EngineError;
use crate::grid::{Grid, Player};

/// Score of a completed line, divided by the ply depth it was found at
pub const WIN_SCORE: i32 = 1000;
/// Score reported by [`Search::column_scores`] for a move that wins on the spot
pub const IMMEDIATE_WIN_SCORE: i32 = 100_000;
/// Score reported by [`Search::column_scores`] for a full column
pub const INVALID_SCORE: i32 = i32::MIN;

/// A minimax agent playing for `me`, looking `max_depth` plies past its own move
///
/// # Position Scoring
/// Scores are always from `me`'s point of view. A line completed by the side
/// to maximise at ply `d` scores `1000 / d`, one completed by the minimising
/// side `-1000 / d`, so nearer wins and further losses are preferred. Once the
/// depth limit is passed the position is scored statically, favouring discs in
/// the central columns.
#[derive(Clone, Debug)]
pub struct Search {
    me: Player,
    max_depth: usize,

    /// The number of nodes searched by this `Search` so far (for diagnostics only)
    pub node_count: usize,
}

impl Search {
    pub fn new(me: Player, max_depth: usize) -> Self {
        Self {
            me,
            max_depth,
            node_count: 0,
        }
    }

    pub fn me(&self) -> Player {
        self.me
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Picks the best column for `me`
    ///
    /// A move that wins immediately is returned without searching further.
    /// Otherwise the highest scoring column is chosen, the lowest index
    /// winning ties.
    pub fn choose_column(&mut self, grid: &Grid, win_length: usize) -> Result<usize, EngineError> {
        let mut best: Option<(usize, i32)> = None;

        for column in grid.legal_columns() {
            let mut next = grid.clone();
            let row = match next.drop(column, self.me) {
                Some(row) => row,
                None => continue,
            };
            if next.is_winning_cell(row, column, win_length) {
                debug!("{} wins immediately in column {}", self.me, column + 1);
                return Ok(column);
            }
            let score = self.minimax(&next, win_length, 1, false, self.me.other());
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((column, score));
            }
        }

        match best {
            Some((column, score)) => {
                debug!(
                    "{} chose column {} (score {}, {} nodes)",
                    self.me,
                    column + 1,
                    score,
                    self.node_count
                );
                Ok(column)
            }
            // fall back to the first column with room, if there is one
            None => (0..grid.cols())
                .find(|&column| grid.playable(column))
                .ok_or(EngineError::NoLegalMove),
        }
    }

    /// Scores every column for `me`, in column order
    ///
    /// Full columns score [`INVALID_SCORE`] and immediate wins score
    /// [`IMMEDIATE_WIN_SCORE`]; everything else gets its minimax value.
    pub fn column_scores(&mut self, grid: &Grid, win_length: usize) -> Vec<i32> {
        let scores: Vec<i32> = (0..grid.cols())
            .map(|column| {
                let mut next = grid.clone();
                match next.drop(column, self.me) {
                    None => INVALID_SCORE,
                    Some(row) if next.is_winning_cell(row, column, win_length) => {
                        IMMEDIATE_WIN_SCORE
                    }
                    Some(_) => self.minimax(&next, win_length, 1, false, self.me.other()),
                }
            })
            .collect();
        debug!("{} column scores: {:?}", self.me, scores);
        scores
    }

    /// Scores `grid` with `mover` to play at ply `depth` (the root's children are ply 1)
    pub fn minimax(&mut self, grid: &Grid, win_length: usize, depth: usize, maximizing: bool, mover: Player) -> i32 {
        self.node_count += 1;

        if depth > self.max_depth {
            return self.evaluate(grid, win_length);
        }

        let moves: Vec<usize> = grid.legal_columns().collect();
        if moves.is_empty() {
            return 0;
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for column in moves {
            let mut next = grid.clone();
            let row = match next.drop(column, mover) {
                Some(row) => row,
                None => continue,
            };
            if next.is_winning_cell(row, column, win_length) {
                let score = WIN_SCORE / depth.max(1) as i32;
                return if maximizing { score } else { -score };
            }

            let value = self.minimax(&next, win_length, depth + 1, !maximizing, mover.other());
            best = if maximizing {
                best.max(value)
            } else {
                best.min(value)
            };
        }
        best
    }

    /// Static score of a position that was not decided within the depth limit
    pub fn evaluate(&self, grid: &Grid, win_length: usize) -> i32 {
        let center = grid.cols() as i32 / 2;
        let mut score = 0;

        for row in 0..grid.rows() {
            for column in 0..grid.cols() {
                let owner = match grid.get(row, column).owner() {
                    Some(owner) => owner,
                    None => continue,
                };
                if grid.is_winning_cell(row, column, win_length) {
                    return if owner == self.me { WIN_SCORE } else { -WIN_SCORE };
                }

                let center_bias = center - (column as i32 - center).abs();
                if owner == self.me {
                    score += center_bias;
                } else {
                    score -= center_bias;
                }
            }
        }
        score
    }
}
