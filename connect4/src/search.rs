//! Depth-limited minimax, plain and with alpha-beta pruning.
//!
//! Both searches share the same leaf rule and the same "best column" seeding,
//! so for any position they pick the same column; pruning only skips work.
use tracing::debug;

use crate::{Board, Player};

/// Column picked by a search together with its backed-up value and the
/// number of positions visited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub column: Option<usize>,
    pub value: i32,
    pub nodes: u64,
}

/// Best column for `player` after an exhaustive search `depth` plies deep.
/// `None` when `depth` is zero or the board has no legal move.
pub fn min_max(board: &Board, depth: u32, player: Player) -> Option<usize> {
    min_max_search(board, depth, player).column
}

pub fn min_max_search(board: &Board, depth: u32, player: Player) -> SearchOutcome {
    let mut search = MinMax { player, nodes: 0 };
    let (value, column) = search.max_value(board, depth, None);
    debug!(?player, depth, ?column, value, nodes = search.nodes, "minmax search finished");
    SearchOutcome {
        column,
        value,
        nodes: search.nodes,
    }
}

/// Same answer as [`min_max`], with alpha-beta cutoffs.
pub fn alpha_beta(board: &Board, depth: u32, player: Player) -> Option<usize> {
    alpha_beta_search(board, depth, player).column
}

pub fn alpha_beta_search(board: &Board, depth: u32, player: Player) -> SearchOutcome {
    let mut search = AlphaBeta { player, nodes: 0 };
    let (value, column) = search.max_value(board, depth, None, i32::MIN, i32::MAX);
    debug!(?player, depth, ?column, value, nodes = search.nodes, "alpha-beta search finished");
    SearchOutcome {
        column,
        value,
        nodes: search.nodes,
    }
}

/// A position is a leaf once the depth budget is spent or the move that
/// produced it already won for `mover`.
fn is_leaf(board: &Board, depth: u32, last_move: Option<usize>, mover: Player) -> bool {
    depth == 0 || last_move.is_some_and(|column| board.result(mover, column))
}

/// Fallback column before any child is scored: the last legal column.
/// Only a strictly better child replaces it.
fn seed_column(board: &Board) -> Option<usize> {
    board.legal_moves().last().copied()
}

fn child(board: &Board, column: usize, player: Player) -> Board {
    let mut next = board.clone();
    next.place(column, player);
    next
}

struct MinMax {
    player: Player,
    nodes: u64,
}

impl MinMax {
    fn max_value(&mut self, board: &Board, depth: u32, last_move: Option<usize>) -> (i32, Option<usize>) {
        self.nodes += 1;
        if is_leaf(board, depth, last_move, self.player.opponent()) {
            return (board.evaluate(self.player), None);
        }

        let mut best = i32::MIN;
        let mut best_column = seed_column(board);
        for column in board.legal_moves() {
            let next = child(board, column, self.player);
            let (value, _) = self.min_value(&next, depth - 1, Some(column));
            if value > best {
                best = value;
                best_column = Some(column);
            }
        }
        (best, best_column)
    }

    fn min_value(&mut self, board: &Board, depth: u32, last_move: Option<usize>) -> (i32, Option<usize>) {
        self.nodes += 1;
        if is_leaf(board, depth, last_move, self.player) {
            return (board.evaluate(self.player), None);
        }

        let mut best = i32::MAX;
        let mut best_column = seed_column(board);
        for column in board.legal_moves() {
            let next = child(board, column, self.player.opponent());
            let (value, _) = self.max_value(&next, depth - 1, Some(column));
            if value < best {
                best = value;
                best_column = Some(column);
            }
        }
        (best, best_column)
    }
}

struct AlphaBeta {
    player: Player,
    nodes: u64,
}

impl AlphaBeta {
    fn max_value(
        &mut self,
        board: &Board,
        depth: u32,
        last_move: Option<usize>,
        mut alpha: i32,
        beta: i32,
    ) -> (i32, Option<usize>) {
        self.nodes += 1;
        if is_leaf(board, depth, last_move, self.player.opponent()) {
            return (board.evaluate(self.player), None);
        }

        let mut best = i32::MIN;
        let mut best_column = seed_column(board);
        for column in board.legal_moves() {
            let next = child(board, column, self.player);
            let (value, _) = self.min_value(&next, depth - 1, Some(column), alpha, beta);
            if value > best {
                best = value;
                best_column = Some(column);
            }
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }
        (best, best_column)
    }

    fn min_value(
        &mut self,
        board: &Board,
        depth: u32,
        last_move: Option<usize>,
        alpha: i32,
        mut beta: i32,
    ) -> (i32, Option<usize>) {
        self.nodes += 1;
        if is_leaf(board, depth, last_move, self.player) {
            return (board.evaluate(self.player), None);
        }

        let mut best = i32::MAX;
        let mut best_column = seed_column(board);
        for column in board.legal_moves() {
            let next = child(board, column, self.player.opponent());
            let (value, _) = self.max_value(&next, depth - 1, Some(column), alpha, beta);
            if value < best {
                best = value;
                best_column = Some(column);
            }
            beta = beta.min(best);
            if beta <= alpha {
                break;
            }
        }
        (best, best_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WIDTH;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn random_midgame(rng: &mut StdRng) -> Option<(Board, Player)> {
        let mut board = Board::new();
        let mut player = Player::Red;
        let plies = rng.gen_range(0..20);
        for _ in 0..plies {
            let &column = board.legal_moves().choose(rng)?;
            board.place(column, player);
            if board.result(player, column) {
                return None;
            }
            player = player.opponent();
        }
        Some((board, player))
    }

    #[test]
    fn takes_the_immediate_horizontal_win() {
        let board: Board = ".......
                            .......
                            .......
                            .......
                            YYY....
                            RRR...."
            .parse()
            .unwrap();
        for depth in 1..=4 {
            assert_eq!(min_max(&board, depth, Player::Red), Some(3), "depth {depth}");
            assert_eq!(alpha_beta(&board, depth, Player::Red), Some(3), "depth {depth}");
        }
    }

    #[test]
    fn blocks_the_square_that_completes_a_row() {
        let board: Board = ".......
                            .......
                            .......
                            .......
                            ......Y
                            RR.R..Y"
            .parse()
            .unwrap();
        // Red completes its row in column 2; yellow has to take that square first.
        assert_eq!(alpha_beta(&board, 3, Player::Red), Some(2));
        assert_eq!(min_max(&board, 3, Player::Red), Some(2));
        assert_eq!(alpha_beta(&board, 2, Player::Yellow), Some(2));
        assert_eq!(min_max(&board, 2, Player::Yellow), Some(2));
    }

    #[test]
    fn zero_depth_returns_the_sentinel() {
        let board = Board::new();
        let outcome = min_max_search(&board, 0, Player::Red);
        assert_eq!(outcome.column, None);
        assert_eq!(outcome.value, 0);
        assert_eq!(outcome.nodes, 1);
        assert_eq!(alpha_beta(&board, 0, Player::Yellow), None);
    }

    #[test]
    fn full_board_has_no_column_to_offer() {
        let board: Board = "YYRRYYR
                            RRYYRRY
                            YYRRYYR
                            RRYYRRY
                            YYRRYYR
                            RRYYRRY"
            .parse()
            .unwrap();
        assert_eq!(min_max(&board, 3, Player::Red), None);
        assert_eq!(alpha_beta(&board, 3, Player::Red), None);
    }

    #[test]
    fn only_legal_column_is_chosen() {
        let board: Board = "RYRY.YR
                            YRYRYRY
                            YRYRRYR
                            RYRYYRY
                            RYRYRYR
                            YRYRYRY"
            .parse()
            .unwrap();
        assert_eq!(board.legal_moves(), vec![4]);
        assert_eq!(min_max(&board, 4, Player::Red), Some(4));
        assert_eq!(alpha_beta(&board, 4, Player::Yellow), Some(4));
    }

    #[test]
    fn dead_end_children_keep_the_last_legal_column() {
        // Two cells left; every line below ends on a full board with no
        // moves, so both children back up the floor value.
        let board: Board = "Y.RRY.R
                            RRYYRRY
                            YYRRYYR
                            RRYYRRY
                            YYRRYYR
                            RRYYRRY"
            .parse()
            .unwrap();
        assert_eq!(board.legal_moves(), vec![1, 5]);
        for depth in 3..=5 {
            let plain = min_max_search(&board, depth, Player::Red);
            let pruned = alpha_beta_search(&board, depth, Player::Red);
            assert_eq!(plain.column, Some(5), "depth {depth}");
            assert_eq!(plain.value, i32::MIN, "depth {depth}");
            assert_eq!(pruned.column, Some(5), "depth {depth}");
            assert_eq!(pruned.value, i32::MIN, "depth {depth}");
        }
    }

    #[test]
    fn alpha_beta_matches_min_max_on_random_positions() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut checked = 0;
        while checked < 40 {
            let Some((board, player)) = random_midgame(&mut rng) else {
                continue;
            };
            for depth in 1..=4 {
                let plain = min_max_search(&board, depth, player);
                let pruned = alpha_beta_search(&board, depth, player);
                assert_eq!(plain.column, pruned.column, "depth {depth}\n{board}");
                assert_eq!(plain.value, pruned.value, "depth {depth}\n{board}");
                assert!(pruned.nodes <= plain.nodes);
                assert!(plain.column.is_some_and(|c| c < WIDTH && board.is_column_not_full(c)));
            }
            checked += 1;
        }
    }

    #[test]
    fn pruning_visits_fewer_nodes() {
        let board = Board::new();
        let plain = min_max_search(&board, 4, Player::Red);
        let pruned = alpha_beta_search(&board, 4, Player::Red);
        assert_eq!(plain.nodes, 1 + 7 + 49 + 343 + 2401);
        assert!(pruned.nodes < plain.nodes);
        assert_eq!(plain.column, pruned.column);
    }
}
