use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use connect4_mtdf::{Board, Cell, Player, HEIGHT, WIDTH};

/// Draws the board with column numbers on top, marking a winning line if there is one
pub fn display(board: &Board) -> Result<()> {
    let mut stdout = stdout();
    let winning_cells = board.is_win();

    let cols: String = (1..=WIDTH).map(|x| x.to_string()).collect();
    stdout.queue(PrintStyledContent(style(cols + "\n")))?;

    for row in (0..HEIGHT).rev() {
        for column in 0..WIDTH {
            let highlighted = winning_cells.map_or(false, |cells| cells.contains(&(column, row)));
            stdout.queue(PrintStyledContent(
                style(if highlighted { "*" } else { "O" })
                    .attribute(Attribute::Bold)
                    .on(Color::DarkBlue)
                    .with(match board.cell(column, row) {
                        Cell::Occupied(Player::A) => Color::Yellow,
                        Cell::Occupied(Player::B) => Color::Red,
                        Cell::Empty => Color::Black,
                    }),
            ))?;
        }
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;
    Ok(())
}
