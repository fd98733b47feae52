//! The raw playing grid, shared by the live [`Board`](crate::board::Board),
//! the search and the key encoder
//!
//! A `Grid` knows nothing about whose turn it is or how it got into its
//! current shape. Anything that needs to simulate moves takes its own copy.

use std::fmt;

/// One of the two player identities
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::PlayerOne,
            Player::Two => Cell::PlayerTwo,
        }
    }

    /// 1 or 2, as used in the encoded key and the archive
    pub fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Cell {
    Empty,
    PlayerOne,
    PlayerTwo,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::PlayerOne => Some(Player::One),
            Cell::PlayerTwo => Some(Player::Two),
        }
    }

    /// Base-3 digit of this cell: empty 0, player one 1, player two 2
    pub fn digit(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::PlayerOne => 1,
            Cell::PlayerTwo => 2,
        }
    }
}

/// Scan directions as (row step, column step), in the order lines are
/// checked: horizontal, vertical, diagonal down-right, diagonal down-left
pub const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// A rows x cols array of cells, row 0 at the top
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>, // cells are stored row-major, top-to-bottom
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    /// Builds a grid by asking `cell` for every (row, column)
    pub fn from_fn<F: FnMut(usize, usize) -> Cell>(rows: usize, cols: usize, mut cell: F) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for column in 0..cols {
                cells.push(cell(row, column));
            }
        }
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn get(&self, row: usize, column: usize) -> Cell {
        self.cells[row * self.cols + column]
    }

    pub(crate) fn set(&mut self, row: usize, column: usize, cell: Cell) {
        self.cells[row * self.cols + column] = cell;
    }

    pub(crate) fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = Cell::Empty);
    }

    /// A column accepts a disc while its top cell is empty
    pub fn playable(&self, column: usize) -> bool {
        column < self.cols && self.get(0, column).is_empty()
    }

    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.cols).filter(move |&column| self.playable(column))
    }

    pub fn is_full(&self) -> bool {
        (0..self.cols).all(|column| !self.playable(column))
    }

    /// The lowest empty row of `column`, if any
    pub fn landing_row(&self, column: usize) -> Option<usize> {
        if column >= self.cols {
            return None;
        }
        (0..self.rows).rev().find(|&row| self.get(row, column).is_empty())
    }

    /// Drops a disc for `player` under gravity, returning the landing row
    pub fn drop(&mut self, column: usize, player: Player) -> Option<usize> {
        let row = self.landing_row(column)?;
        self.set(row, column, player.cell());
        Some(row)
    }

    /// Removes the topmost disc of `column`, returning the row it occupied
    pub(crate) fn lift(&mut self, column: usize) -> Option<usize> {
        if column >= self.cols {
            return None;
        }
        let row = (0..self.rows).find(|&row| !self.get(row, column).is_empty())?;
        self.set(row, column, Cell::Empty);
        Some(row)
    }

    fn step(&self, row: usize, column: usize, d_row: isize, d_col: isize, k: isize) -> Option<(usize, usize)> {
        let r = row as isize + k * d_row;
        let c = column as isize + k * d_col;
        if r < 0 || r >= self.rows as isize || c < 0 || c >= self.cols as isize {
            return None;
        }
        Some((r as usize, c as usize))
    }

    /// Number of cells matching `cell` contiguous from (row, column) in one
    /// direction, not counting the start cell
    fn run(&self, row: usize, column: usize, d_row: isize, d_col: isize, cell: Cell) -> usize {
        let mut count = 0;
        while let Some((r, c)) = self.step(row, column, d_row, d_col, count as isize + 1) {
            if self.get(r, c) != cell {
                break;
            }
            count += 1;
        }
        count
    }

    /// Length of the full line through (row, column) along one axis
    fn line_length(&self, row: usize, column: usize, (d_row, d_col): (isize, isize)) -> usize {
        let cell = self.get(row, column);
        1 + self.run(row, column, d_row, d_col, cell) + self.run(row, column, -d_row, -d_col, cell)
    }

    /// Whether the disc at (row, column) is part of a line of at least `win_length`
    pub fn is_winning_cell(&self, row: usize, column: usize, win_length: usize) -> bool {
        if self.get(row, column).is_empty() {
            return false;
        }
        AXES.iter()
            .any(|&axis| self.line_length(row, column, axis) >= win_length)
    }

    /// The cells of the first winning line through (row, column), in axis
    /// order, trimmed to exactly `win_length` cells around the middle of the run
    pub fn winning_line(&self, row: usize, column: usize, win_length: usize) -> Option<Vec<(usize, usize)>> {
        let cell = self.get(row, column);
        if cell.is_empty() {
            return None;
        }
        let (d_row, d_col) = *AXES
            .iter()
            .find(|&&axis| self.line_length(row, column, axis) >= win_length)?;

        let back = self.run(row, column, -d_row, -d_col, cell) as isize;
        let forward = self.run(row, column, d_row, d_col, cell) as isize;
        let line: Vec<(usize, usize)> = (-back..=forward)
            .filter_map(|k| self.step(row, column, d_row, d_col, k))
            .collect();

        // trim an over-long run symmetrically, rounding the start down
        let start = (line.len() - win_length) / 2;
        Some(line[start..start + win_length].to_vec())
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.rows {
            for column in 0..self.cols {
                let symbol = match self.get(row, column) {
                    Cell::Empty => '.',
                    Cell::PlayerOne => 'X',
                    Cell::PlayerTwo => 'O',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
