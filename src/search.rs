//! An engine choosing Connect 4 moves with iterative deepening MTD(f)

use log::{debug, trace};

use std::time::{Duration, Instant};

use crate::{
    board::{Board, GameState},
    evaluator::heuristic,
    transposition_table::*,
    HEIGHT, WIDTH,
};

/// The score of a position won by the player the search is playing for
pub const WIN_SCORE: i32 = 999;
/// The lower end of the score range, below any reachable score
pub const MIN_BOUND: i32 = -1000;
/// The upper end of the score range, above any reachable score
pub const MAX_BOUND: i32 = 1000;

/// The deepest iterative deepening pass run by default
pub const DEFAULT_MAX_DEPTH: u32 = 9;
/// How long `best_move` keeps starting new passes, by default
pub const DEFAULT_THINK_TIME: Duration = Duration::from_secs(2);

// seed for the first MTD(f) pass, any value inside the score range works
const FIRST_GUESS: i32 = 3;

/// A score together with the column that achieves it
///
/// `column` is `None` for terminal positions, horizon positions and bounds
/// taken straight from the transposition table.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SearchResult {
    pub score: i32,
    pub column: Option<usize>,
}

impl SearchResult {
    fn leaf(score: i32) -> Self {
        Self {
            score,
            column: None,
        }
    }
}

/// An agent choosing moves for whichever player is to move
///
/// # Notes
/// Scores are always from the point of view of the player to move at the root
/// of the search: a win for them is [`WIN_SCORE`], a loss is `-WIN_SCORE`, a
/// draw is 0, and positions on the search horizon get a clamped heuristic
/// score in between.
///
/// The engine owns its transposition table, so bounds proven during one call
/// to [`best_move`] are reused by the next. Use one engine per game, or at
/// least per program run.
///
/// [`best_move`]: SearchEngine::best_move
#[derive(Clone, Debug)]
pub struct SearchEngine {
    /// The number of nodes searched by this engine so far (for diagnostics only)
    pub node_count: usize,
    max_depth: u32,
    transposition_table: Option<TranspositionTable>,
}

impl SearchEngine {
    /// Creates an engine with an empty transposition table
    pub fn new() -> Self {
        Self {
            node_count: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            transposition_table: Some(TranspositionTable::new()),
        }
    }

    /// Caps the iterative deepening at `max_depth` plies
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        assert!(max_depth >= 1, "the search needs a depth of at least one ply");
        self.max_depth = max_depth;
        self
    }

    /// Disables the transposition table, searching every node from scratch
    pub fn without_transposition_table(mut self) -> Self {
        self.transposition_table = None;
        self
    }

    pub fn transposition_table(&self) -> Option<&TranspositionTable> {
        self.transposition_table.as_ref()
    }

    /// Picks a column for the player to move, or `None` if the game is over
    ///
    /// Passes of increasing depth run until the maximum depth is reached or
    /// `think_time` has passed. The clock is only checked between passes, so a
    /// slow pass can overrun it.
    pub fn best_move(&mut self, board: &Board, think_time: Duration) -> Option<usize> {
        if board.state() != GameState::InProgress {
            return None;
        }
        self.deepen(board, self.max_depth, Some(think_time)).column
    }

    /// Runs iterative deepening up to `depth` plies with no time limit
    pub fn search_to_depth(&mut self, board: &Board, depth: u32) -> SearchResult {
        assert!(depth >= 1, "the search needs a depth of at least one ply");
        self.deepen(board, depth, None)
    }

    fn deepen(&mut self, board: &Board, max_depth: u32, think_time: Option<Duration>) -> SearchResult {
        if board.state() != GameState::InProgress {
            return self.alpha_beta(board, true, 0, MIN_BOUND, MAX_BOUND);
        }

        let start = Instant::now();
        // searching past the last empty cell cannot change the result
        let empty_cells = (WIDTH * HEIGHT - board.num_moves()) as u32;

        let mut guess = SearchResult::leaf(FIRST_GUESS);
        for depth in 1..=max_depth {
            let nodes_before = self.node_count;
            guess = self.mtdf(board, guess, depth);

            debug!(
                "depth {}: score {}, column {:?}, {} nodes, {:.3}s elapsed",
                depth,
                guess.score,
                guess.column,
                self.node_count - nodes_before,
                start.elapsed().as_secs_f64()
            );

            if depth >= empty_cells {
                break;
            }
            if let Some(limit) = think_time {
                if start.elapsed() > limit {
                    break;
                }
            }
        }
        guess
    }

    /// Converges on the score of `board` at `depth` with null-window searches,
    /// starting from the previous estimate `guess`
    pub fn mtdf(&mut self, board: &Board, guess: SearchResult, depth: u32) -> SearchResult {
        let mut lower_bound = MIN_BOUND;
        let mut upper_bound = MAX_BOUND;

        let mut g = guess.score;
        let mut best_column = guess.column;
        while lower_bound < upper_bound {
            // never search a window that lies entirely below the lower bound
            let beta = if g == lower_bound { g + 1 } else { g };
            let trial = self.root_search(board, depth, beta - 1, beta);
            g = trial.score;

            trace!(
                "null window at depth {} with beta {}: {} via {:?}",
                depth,
                beta,
                g,
                trial.column
            );

            if g < beta {
                upper_bound = g;
            } else {
                lower_bound = g;
                // only a search failing high proves its column reaches the bound
                if trial.column.is_some() {
                    best_column = trial.column;
                }
            }
        }
        SearchResult {
            score: g,
            column: best_column,
        }
    }

    /// Minimax search with alpha-beta pruning and the transposition table
    ///
    /// `maximizing` is true when the player to move on `board` is the one the
    /// search is playing for. The returned score is fail-soft: at most `alpha`
    /// means the true score is no higher, at least `beta` means it is no lower,
    /// anything in between is exact.
    pub fn alpha_beta(
        &mut self,
        board: &Board,
        maximizing: bool,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
    ) -> SearchResult {
        self.node_count += 1;
        let (original_alpha, original_beta) = (alpha, beta);

        if let Some(table) = &self.transposition_table {
            let key = |bound| TableKey {
                position: board.canonical_key(),
                depth,
                maximizing,
                bound,
            };
            if let Some(lower) = table.get(&key(Bound::Lower)) {
                if lower >= beta {
                    return SearchResult::leaf(lower);
                }
                alpha = alpha.max(lower);
            }
            if let Some(upper) = table.get(&key(Bound::Upper)) {
                if upper <= alpha {
                    return SearchResult::leaf(upper);
                }
                beta = beta.min(upper);
            }
        }

        if let Some(result) = Self::terminal_or_horizon(board, maximizing, depth) {
            return result;
        }

        let best = self.expand(board, maximizing, depth, alpha, beta);
        self.store(board, maximizing, depth, original_alpha, original_beta, best.score);
        best
    }

    /// Performs a top-level search, bypassing transposition table lookups so
    /// that a column is always returned for positions still in play
    fn root_search(&mut self, board: &Board, depth: u32, alpha: i32, beta: i32) -> SearchResult {
        self.node_count += 1;

        if let Some(result) = Self::terminal_or_horizon(board, true, depth) {
            return result;
        }

        let best = self.expand(board, true, depth, alpha, beta);
        self.store(board, true, depth, alpha, beta, best.score);
        best
    }

    fn terminal_or_horizon(board: &Board, maximizing: bool, depth: u32) -> Option<SearchResult> {
        if board.has_winner() {
            // the player who just moved completed the line, which is the
            // opponent of whoever is to move here
            let score = if maximizing { -WIN_SCORE } else { WIN_SCORE };
            Some(SearchResult::leaf(score))
        } else if board.is_full() {
            Some(SearchResult::leaf(0))
        } else if depth == 0 {
            // keep heuristic scores strictly inside the win/loss scores
            let score = heuristic(board).clamp(1 - WIN_SCORE, WIN_SCORE - 1);
            Some(SearchResult::leaf(if maximizing { score } else { -score }))
        } else {
            None
        }
    }

    /// Searches the children of `board` left to right; ties keep the leftmost column
    fn expand(
        &mut self,
        board: &Board,
        maximizing: bool,
        depth: u32,
        alpha: i32,
        beta: i32,
    ) -> SearchResult {
        let mut best = SearchResult::leaf(if maximizing { MIN_BOUND } else { MAX_BOUND });

        for column in board.legal_columns() {
            let child = board.play(column);
            if maximizing {
                let value = self
                    .alpha_beta(&child, false, depth - 1, alpha.max(best.score), beta)
                    .score;
                if value > best.score {
                    best = SearchResult {
                        score: value,
                        column: Some(column),
                    };
                }
                // the opponent will not allow this line
                if value >= beta {
                    break;
                }
            } else {
                let value = self
                    .alpha_beta(&child, true, depth - 1, alpha, beta.min(best.score))
                    .score;
                if value < best.score {
                    best = SearchResult {
                        score: value,
                        column: Some(column),
                    };
                }
                if value <= alpha {
                    break;
                }
            }
        }
        best
    }

    /// Remembers `score` if it falls outside the window, under the position's
    /// own key and the key of its mirror image
    fn store(
        &mut self,
        board: &Board,
        maximizing: bool,
        depth: u32,
        alpha: i32,
        beta: i32,
        score: i32,
    ) {
        let bound = if score <= alpha {
            Bound::Upper
        } else if score >= beta {
            Bound::Lower
        } else {
            return;
        };

        if let Some(table) = self.transposition_table.as_mut() {
            for &position in [board.canonical_key(), board.mirror_key()].iter() {
                table.set(
                    TableKey {
                        position,
                        depth,
                        maximizing,
                        bound,
                    },
                    score,
                );
            }
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}
