use anyhow::{anyhow, Result};
use thiserror::Error;

use std::fmt;

use crate::{HEIGHT, WIDTH};

/// The number of length-4 windows on the board
pub const NUM_LINES: usize =
    (WIDTH - 3) * HEIGHT + WIDTH * (HEIGHT - 3) + 2 * (WIDTH - 3) * (HEIGHT - 3);

/// Every length-4 window as (column, row) coordinates: horizontal lines first,
/// then vertical, then the two diagonal directions
pub const WIN_LINES: [[(usize, usize); 4]; NUM_LINES] = static_masks::win_lines();

/// Bitmaps of the windows in [`WIN_LINES`], in the same order
pub const LINE_MASKS: [u64; NUM_LINES] = static_masks::line_masks();

mod static_masks {
    use super::NUM_LINES;
    use crate::{HEIGHT, WIDTH};

    // (column step, row step): horizontal, vertical, diagonal /, diagonal \
    const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

    pub const fn bottom_mask() -> u64 {
        let mut mask = 0;
        let mut column = 0;
        while column < WIDTH {
            mask |= 1 << (column * (HEIGHT + 1));
            column += 1;
        }
        mask
    }
    pub const fn full_board_mask() -> u64 {
        bottom_mask() * ((1 << HEIGHT as u64) - 1)
    }

    pub const fn cell_mask(column: usize, row: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + row)
    }

    pub const fn win_lines() -> [[(usize, usize); 4]; NUM_LINES] {
        let mut lines = [[(0, 0); 4]; NUM_LINES];
        let mut n = 0;
        let mut d = 0;
        while d < DIRECTIONS.len() {
            let (dc, dr) = DIRECTIONS[d];
            let mut column = 0;
            while column < WIDTH as i32 {
                let mut row = 0;
                while row < HEIGHT as i32 {
                    let end_column = column + 3 * dc;
                    let end_row = row + 3 * dr;
                    if end_column >= 0 && end_column < WIDTH as i32 && end_row < HEIGHT as i32 {
                        let mut i = 0;
                        while i < 4 {
                            lines[n][i] = (
                                (column + i as i32 * dc) as usize,
                                (row + i as i32 * dr) as usize,
                            );
                            i += 1;
                        }
                        n += 1;
                    }
                    row += 1;
                }
                column += 1;
            }
            d += 1;
        }
        lines
    }

    pub const fn line_masks() -> [u64; NUM_LINES] {
        let lines = win_lines();
        let mut masks = [0; NUM_LINES];
        let mut n = 0;
        while n < NUM_LINES {
            let mut i = 0;
            while i < 4 {
                masks[n] |= cell_mask(lines[n][i].0, lines[n][i].1);
                i += 1;
            }
            n += 1;
        }
        masks
    }
}

/// One of the two sides; player A always moves first
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Player {
    A,
    B,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::A => 'X',
            Player::B => 'O',
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Cell {
    Empty,
    Occupied(Player),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => write!(f, "."),
            Cell::Occupied(player) => write!(f, "{}", player.symbol()),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameState {
    InProgress,
    Won(Player),
    Drawn,
}

/// A move that cannot be played on the current board
#[derive(Copy, Clone, Eq, PartialEq, Debug, Error)]
pub enum IllegalMoveError {
    #[error("column {column} is full")]
    ColumnFull { column: usize },
    #[error("column {column} out of range, columns must be between 0 and {}", WIDTH - 1)]
    ColumnOutOfRange { column: usize },
    #[error("the game is already over")]
    GameOver,
}

/// A Connect 4 position
///
/// Each column takes `HEIGHT + 1` bits of a `u64`, bottom row first; the
/// extra bit on top of every column stays clear. Boards are small `Copy`
/// values, so moves return a new board rather than mutating in place.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Board {
    // mask of the tiles of the player to move
    player_mask: u64,
    // mask of all tiles
    board_mask: u64,
    num_moves: usize,
}

impl Board {
    pub fn new() -> Self {
        Self {
            player_mask: 0,
            board_mask: 0,
            num_moves: 0,
        }
    }

    /// Builds a board from a sequence of 1-indexed column digits, e.g. `"4453"`
    pub fn from_moves<S: AsRef<str>>(moves: S) -> Result<Self> {
        let mut board = Self::new();

        for column_char in moves.as_ref().chars() {
            match column_char.to_digit(10).map(|c| c as usize) {
                Some(column @ 1..=WIDTH) => {
                    board = board
                        .apply_move(column - 1)
                        .map_err(|err| anyhow!("invalid move '{}': {}", column_char, err))?;
                }
                _ => return Err(anyhow!("could not parse '{}' as a valid move", column_char)),
            }
        }
        Ok(board)
    }

    /// Builds a board from a diagram, top row first
    ///
    /// `X` is player A, `O` is player B and `.` is an empty cell. Whitespace is
    /// ignored, so the output of `Display` can be read back. The player to
    /// move is derived from the piece counts.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self> {
        if rows.len() != HEIGHT {
            return Err(anyhow!("expected {} rows, found {}", HEIGHT, rows.len()));
        }

        // player A, player B
        let mut masks = [0u64; 2];
        for (i, line) in rows.iter().enumerate() {
            let row = HEIGHT - 1 - i;
            let cells: Vec<char> = line
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            if cells.len() != WIDTH {
                return Err(anyhow!(
                    "row {} has {} cells, expected {}",
                    row,
                    cells.len(),
                    WIDTH
                ));
            }
            for (column, cell) in cells.into_iter().enumerate() {
                match cell {
                    'X' | 'x' => masks[0] |= static_masks::cell_mask(column, row),
                    'O' | 'o' => masks[1] |= static_masks::cell_mask(column, row),
                    '.' => {}
                    _ => return Err(anyhow!("could not parse '{}' as a cell", cell)),
                }
            }
        }

        let board_mask = masks[0] | masks[1];
        for column in 0..WIDTH {
            // occupied cells must be a run starting at the bottom
            let bits = (board_mask & Self::column_mask(column)) >> (column * (HEIGHT + 1));
            if bits & (bits + 1) != 0 {
                return Err(anyhow!("column {} has a floating piece", column));
            }
        }

        let (a, b) = (masks[0].count_ones(), masks[1].count_ones());
        if a != b && a != b + 1 {
            return Err(anyhow!(
                "impossible piece counts: {} for X and {} for O",
                a,
                b
            ));
        }

        let num_moves = (a + b) as usize;
        let player_mask = if num_moves % 2 == 0 { masks[0] } else { masks[1] };
        // only the player who moved last can have completed a line
        if has_alignment(player_mask) {
            return Err(anyhow!("the player to move already has four in a row"));
        }
        Ok(Self {
            player_mask,
            board_mask,
            num_moves,
        })
    }

    pub fn top_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1) + (HEIGHT - 1))
    }

    pub fn bottom_mask(column: usize) -> u64 {
        1 << (column * (HEIGHT + 1))
    }

    pub fn column_mask(column: usize) -> u64 {
        ((1 << HEIGHT) - 1) << (column * (HEIGHT + 1))
    }

    pub fn num_moves(&self) -> usize {
        self.num_moves
    }

    /// The player whose piece the next move drops
    pub fn to_move(&self) -> Player {
        if self.num_moves % 2 == 0 {
            Player::A
        } else {
            Player::B
        }
    }

    /// Bitmap of the tiles owned by `player`
    pub fn pieces(&self, player: Player) -> u64 {
        if player == self.to_move() {
            self.player_mask
        } else {
            self.player_mask ^ self.board_mask
        }
    }

    /// Bitmap of the empty cells
    pub fn empty_mask(&self) -> u64 {
        static_masks::full_board_mask() ^ self.board_mask
    }

    pub fn cell_mask(column: usize, row: usize) -> u64 {
        static_masks::cell_mask(column, row)
    }

    pub fn cell(&self, column: usize, row: usize) -> Cell {
        assert!(
            column < WIDTH && row < HEIGHT,
            "cell ({}, {}) is outside the {}x{} board",
            column,
            row,
            WIDTH,
            HEIGHT
        );
        let mask = Self::cell_mask(column, row);
        if self.board_mask & mask == 0 {
            Cell::Empty
        } else if self.player_mask & mask != 0 {
            Cell::Occupied(self.to_move())
        } else {
            Cell::Occupied(self.to_move().opponent())
        }
    }

    /// The number of pieces in `column`
    pub fn column_height(&self, column: usize) -> usize {
        (self.board_mask & Self::column_mask(column)).count_ones() as usize
    }

    pub fn column_has_space(&self, column: usize) -> bool {
        column < WIDTH && Self::top_mask(column) & self.board_mask == 0
    }

    /// Columns with room for another piece, left to right
    pub fn legal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        (0..WIDTH).filter(move |&column| self.column_has_space(column))
    }

    /// Drops a piece for the player to move into `column`
    pub fn apply_move(&self, column: usize) -> Result<Self, IllegalMoveError> {
        if column >= WIDTH {
            return Err(IllegalMoveError::ColumnOutOfRange { column });
        }
        if self.has_winner() {
            return Err(IllegalMoveError::GameOver);
        }
        if !self.column_has_space(column) {
            return Err(IllegalMoveError::ColumnFull { column });
        }
        Ok(self.play(column))
    }

    /// Drops a piece without validation, for use inside the search
    pub(crate) fn play(&self, column: usize) -> Self {
        debug_assert!(self.column_has_space(column), "column {} is full", column);
        let move_bitmap = (self.board_mask + Self::bottom_mask(column)) & Self::column_mask(column);
        Self {
            // switch the current player
            player_mask: self.player_mask ^ self.board_mask,
            // add a cell of the previous player to the correct column
            board_mask: self.board_mask | move_bitmap,
            num_moves: self.num_moves + 1,
        }
    }

    /// Whether the player who moved last has four in a row
    pub fn has_winner(&self) -> bool {
        has_alignment(self.player_mask ^ self.board_mask)
    }

    /// The four cells of a line completed by the player who moved last
    pub fn is_win(&self) -> Option<[(usize, usize); 4]> {
        let last_mover = self.player_mask ^ self.board_mask;
        LINE_MASKS
            .iter()
            .position(|&line| line & last_mover == line)
            .map(|n| WIN_LINES[n])
    }

    pub fn is_full(&self) -> bool {
        self.board_mask == static_masks::full_board_mask()
    }

    pub fn state(&self) -> GameState {
        if self.has_winner() {
            GameState::Won(self.to_move().opponent())
        } else if self.is_full() {
            GameState::Drawn
        } else {
            GameState::InProgress
        }
    }

    // key for transposition table
    pub fn canonical_key(&self) -> u64 {
        // columns never carry into each other, and the sum is unique per position
        self.player_mask + self.board_mask
    }

    /// The key of the left-right mirrored position
    pub fn mirror_key(&self) -> u64 {
        mirror_mask(self.canonical_key())
    }

    /// The left-right mirrored position, with the same player to move
    pub fn mirror(&self) -> Self {
        Self {
            player_mask: mirror_mask(self.player_mask),
            board_mask: mirror_mask(self.board_mask),
            num_moves: self.num_moves,
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            for column in 0..WIDTH {
                write!(f, " {}", self.cell(column, row))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn mirror_mask(mask: u64) -> u64 {
    let column_bits = (1 << (HEIGHT + 1)) - 1;
    let mut mirrored = 0;
    for column in 0..WIDTH {
        let bits = (mask >> (column * (HEIGHT + 1))) & column_bits;
        mirrored |= bits << ((WIDTH - 1 - column) * (HEIGHT + 1));
    }
    mirrored
}

fn has_alignment(pos: u64) -> bool {
    // check horizontal alignment
    // mark all horizontal runs of 2
    let mut m = pos & (pos >> (HEIGHT + 1));
    // check for runs of 2 * (runs of 2)
    if m & (m >> (2 * (HEIGHT + 1))) != 0 {
        return true;
    }

    // check diagonal alignment 1
    m = pos & (pos >> HEIGHT);
    if m & (m >> (2 * HEIGHT)) != 0 {
        return true;
    }

    // check diagonal alignment 2
    m = pos & (pos >> (HEIGHT + 2));
    if m & (m >> (2 * (HEIGHT + 2))) != 0 {
        return true;
    }

    // check vertical alignment
    m = pos & (pos >> 1);
    if m & (m >> 2) != 0 {
        return true;
    }

    // no alignments
    false
}
