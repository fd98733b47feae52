use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use connect4_minimax::{board::Board, grid::Cell};

/// Draws the board with coloured discs, highlighting a winning line
pub fn display(board: &Board) -> Result<()> {
    let mut stdout = stdout();
    let grid = board.grid();
    let winning = board.winning_cells().unwrap_or(&[]);

    let header: String = (1..=grid.cols()).map(|x| format!("{} ", x % 10)).collect();
    stdout.queue(PrintStyledContent(style(format!("\n{}\n", header))))?;

    for row in 0..grid.rows() {
        for column in 0..grid.cols() {
            let background = if winning.contains(&(row, column)) {
                Color::DarkGreen
            } else {
                Color::DarkBlue
            };
            stdout.queue(PrintStyledContent(
                style("O ")
                    .attribute(Attribute::Bold)
                    .on(background)
                    .with(match grid.get(row, column) {
                        Cell::PlayerOne => Color::Red,
                        Cell::PlayerTwo => Color::Yellow,
                        Cell::Empty => background,
                    }),
            ))?;
        }
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.queue(PrintStyledContent(style("\n")))?;
    stdout.flush()?;
    Ok(())
}
