//! A minimax agent and position archive for the board game 'Connect 4'
//! on boards of any size
//!
//! The agent searches a fixed number of plies ahead, with no pruning, and
//! finished games are archived under a key that is shared by a position
//! and its mirror image.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_minimax::{board::Board, grid::Player, search::Search};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let board = Board::from_moves("445566", 9, 9, 4)?;
//! let mut search = Search::new(Player::One, 2);
//! let column = search.choose_column(board.grid(), board.win_length())?;
//!
//! // player one completes the bottom row by playing in column 3
//! assert_eq!(column, 2);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod error;

pub mod config;

pub mod grid;

pub mod board;

pub mod search;

pub mod encoding;

pub mod archive;

pub mod selfplay;


/// The default height of the game board in tiles
pub const DEFAULT_ROWS: usize = 9;

/// The default width of the game board in tiles
pub const DEFAULT_COLS: usize = 9;

/// The default number of aligned tiles needed to win
pub const DEFAULT_WIN_LENGTH: usize = 4;

// ensure a winning line fits on the default board and moves stay single digits
const_assert!(DEFAULT_WIN_LENGTH <= DEFAULT_ROWS && DEFAULT_WIN_LENGTH <= DEFAULT_COLS);
const_assert!(DEFAULT_COLS <= 9);
