//! A Connect 4 opponent built on a depth-limited MTD(f) search
//!
//! The engine explores the game tree with null-window alpha-beta searches,
//! deepening iteratively until its thinking time runs out. Positions that
//! fall on the search horizon are scored by a line-counting heuristic, and
//! proven score bounds are remembered in a transposition table together with
//! those of the mirrored position.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_mtdf::{apply_human_move, new_game, search::SearchEngine};
//! use std::time::Duration;
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut engine = SearchEngine::new().with_max_depth(4);
//! let board = apply_human_move(&new_game(), 3)?;
//!
//! let reply = engine.best_move(&board, Duration::from_secs(2));
//! assert!(reply.is_some());
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod evaluator;

pub mod transposition_table;

pub mod search;


pub use board::{Board, Cell, GameState, IllegalMoveError, Player};

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
// a board that cannot hold four in a row has no win lines
const_assert!(WIDTH >= 4 && HEIGHT >= 4);

/// Starts a new game: an empty board with player A to move
pub fn new_game() -> Board {
    Board::new()
}

/// Drops a piece for the human player, who is whoever is to move on `board`
pub fn apply_human_move(board: &Board, column: usize) -> Result<Board, IllegalMoveError> {
    board.apply_move(column)
}
