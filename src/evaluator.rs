//! Heuristic scoring of positions on the search horizon

use crate::board::{Board, Player, LINE_MASKS, WIN_LINES};
use crate::HEIGHT;

/// Scores `board` for the player to move, minus the same score for their opponent
///
/// Only meaningful for positions that are not already decided. The value is a
/// move-ordering aid rather than an estimate of the game theoretic result.
pub fn heuristic(board: &Board) -> i32 {
    let player = board.to_move();
    player_score(board, player) - player_score(board, player.opponent())
}

/// Sums the open lines of `player`, weighting each by how many pieces it
/// already holds and how low its empty cells sit, plus a term for completing
/// cells stacked directly on top of each other
fn player_score(board: &Board, player: Player) -> i32 {
    let own = board.pieces(player);
    let opponent = board.pieces(player.opponent());
    let empty = board.empty_mask();

    let mut score = 0;
    // empty cells that would complete a line of three
    let mut threats = 0u64;
    for (&line, cells) in LINE_MASKS.iter().zip(WIN_LINES.iter()) {
        // lines blocked by the opponent can never be won
        if line & opponent != 0 {
            continue;
        }
        let pieces = (line & own).count_ones() as i32;

        let (mut row_sum, mut empties) = (0, 0);
        for &(column, row) in cells {
            if empty & Board::cell_mask(column, row) != 0 {
                row_sum += row;
                empties += 1;
            }
        }
        let average_row = if empties == 0 { 0 } else { row_sum / empties };
        score += pieces * (HEIGHT - average_row) as i32;

        if pieces == 3 {
            threats |= line & empty;
        }
    }

    // lower cells whose cell directly above is also a threat; the bit above
    // the top row is always clear, so nothing leaks between columns
    let mut stacked = threats & (threats >> 1);
    while stacked != 0 {
        let lower_row = stacked.trailing_zeros() as usize % (HEIGHT + 1);
        score += HEIGHT as i32 - lower_row as i32 * 100;
        stacked &= stacked - 1;
    }
    score
}
