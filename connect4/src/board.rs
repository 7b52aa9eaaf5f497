use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{GameError, Player};

pub const WIDTH: usize = 7;
pub const HEIGHT: usize = 6;
const CONNECT: usize = 4;
const SCAN_LENGTH: usize = 7;

/// Direction steps as (row, column); row grows upward.
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// Every line the heuristic scans, clipped to the grid.
static SCAN_LINES: Lazy<Vec<Vec<(usize, usize)>>> = Lazy::new(generate_scan_lines);

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Empty,
    Red,
    Yellow,
}

impl From<Player> for CellState {
    fn from(player: Player) -> Self {
        match player {
            Player::Red => CellState::Red,
            Player::Yellow => CellState::Yellow,
        }
    }
}

impl CellState {
    fn symbol(self) -> char {
        match self {
            CellState::Empty => '.',
            CellState::Red => 'R',
            CellState::Yellow => 'Y',
        }
    }
}

/// 6x7 grid. Row 0 is the bottom row; tokens stack upward from it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[CellState; WIDTH]; HEIGHT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, column: usize) -> CellState {
        self.cells[row][column]
    }

    /// Number of tokens already stacked in `column`.
    pub fn column_height(&self, column: usize) -> usize {
        (0..HEIGHT)
            .take_while(|&row| self.cells[row][column] != CellState::Empty)
            .count()
    }

    /// Drops `player`'s token into `column` and returns the row it landed on.
    pub fn update_board(&mut self, column: usize, player: Player) -> Result<usize, GameError> {
        if column >= WIDTH {
            return Err(GameError::ColumnOutOfBounds { column });
        }
        if !self.is_column_not_full(column) {
            return Err(GameError::ColumnFull { column });
        }
        Ok(self.place(column, player))
    }

    /// Unchecked drop for callers that already know `column` is legal.
    pub(crate) fn place(&mut self, column: usize, player: Player) -> usize {
        let row = self.column_height(column);
        debug_assert!(row < HEIGHT, "column {column} is full");
        self.cells[row][column] = player.into();
        row
    }

    pub fn is_column_not_full(&self, column: usize) -> bool {
        column < WIDTH && self.cells[HEIGHT - 1][column] == CellState::Empty
    }

    pub fn is_full(&self) -> bool {
        (0..WIDTH).all(|column| !self.is_column_not_full(column))
    }

    pub fn legal_moves(&self) -> Vec<usize> {
        (0..WIDTH)
            .filter(|&column| self.is_column_not_full(column))
            .collect()
    }

    /// Whether `player` has four in a line through their topmost token in
    /// `column`. Called right after a move, that token is the one just played.
    pub fn result(&self, player: Player, column: usize) -> bool {
        if column >= WIDTH {
            return false;
        }
        let cell = CellState::from(player);
        let Some(row) = (0..HEIGHT).rev().find(|&row| self.cells[row][column] == cell) else {
            return false;
        };
        AXES.iter().any(|&(d_row, d_col)| {
            1 + self.count_run(row, column, d_row, d_col, cell)
                + self.count_run(row, column, -d_row, -d_col, cell)
                >= CONNECT
        })
    }

    fn count_run(&self, row: usize, column: usize, d_row: isize, d_col: isize, cell: CellState) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize, column as isize);
        loop {
            r += d_row;
            c += d_col;
            if !in_bounds(r, c) || self.cells[r as usize][c as usize] != cell {
                return count;
            }
            count += 1;
        }
    }

    /// Static heuristic from `perspective`'s point of view. Each scan line
    /// contributes its best run for both colours; the opponent's runs count
    /// negatively, so swapping every token and the perspective negates the
    /// score.
    pub fn evaluate(&self, perspective: Player) -> i32 {
        let mut score = 0;
        for line in SCAN_LINES.iter() {
            for player in [Player::Red, Player::Yellow] {
                let (run, open) = self.best_run(line, player.into());
                let value = run_value(run, open);
                if player == perspective {
                    score += value;
                } else {
                    score -= value;
                }
            }
        }
        score
    }

    /// Picks the strongest segment of `line` between opposing tokens, as
    /// (own tokens, empty cells) in that segment. Ties on the token count go
    /// to the earlier segment unless the final one has more room.
    fn best_run(&self, line: &[(usize, usize)], cell: CellState) -> (usize, usize) {
        let (mut run, mut open) = (0, 0);
        let mut best: Option<(usize, usize)> = None;
        for &(row, column) in line {
            match self.cells[row][column] {
                c if c == cell => run += 1,
                CellState::Empty => open += 1,
                _ => {
                    if best.map_or(true, |(best_run, _)| run >= best_run) {
                        best = Some((run, open));
                    }
                    run = 0;
                    open = 0;
                }
            }
        }
        match best {
            Some((best_run, best_open)) if run < best_run || (run == best_run && open <= best_open) => {
                (best_run, best_open)
            }
            _ => (run, open),
        }
    }
}

fn run_value(run: usize, open: usize) -> i32 {
    match (run, open) {
        (1, open) if open >= 3 => 1,
        (2, open) if open >= 2 => 10,
        (3, open) if open >= 1 => 100,
        (4, _) => 1000,
        _ => 0,
    }
}

fn in_bounds(row: isize, column: isize) -> bool {
    (0..HEIGHT as isize).contains(&row) && (0..WIDTH as isize).contains(&column)
}

fn generate_scan_lines() -> Vec<Vec<(usize, usize)>> {
    let mut starts: Vec<(usize, usize, isize, isize)> = Vec::new();
    // Horizontal
    for row in 0..HEIGHT {
        starts.push((row, 0, 0, 1));
    }
    // Vertical
    for column in 0..WIDTH {
        starts.push((0, column, 1, 0));
    }
    // Diagonal \ (up and to the left), from the bottom row then the right edge
    for column in 0..WIDTH {
        starts.push((0, column, 1, -1));
    }
    for row in 1..HEIGHT {
        starts.push((row, WIDTH - 1, 1, -1));
    }
    // Diagonal / (up and to the right), from the left edge then the bottom row
    for row in (1..HEIGHT).rev() {
        starts.push((row, 0, 1, 1));
    }
    for column in 0..WIDTH {
        starts.push((0, column, 1, 1));
    }

    starts
        .into_iter()
        .map(|(row, column, d_row, d_col)| {
            (0..SCAN_LENGTH as isize)
                .map(|step| (row as isize + step * d_row, column as isize + step * d_col))
                .take_while(|&(r, c)| in_bounds(r, c))
                .map(|(r, c)| (r as usize, c as usize))
                .collect()
        })
        .collect()
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..HEIGHT).rev() {
            let line: String = self.cells[row].iter().map(|cell| cell.symbol()).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Parses the [`Display`](fmt::Display) form: six lines, top row first,
/// using `.`, `R` and `Y`.
impl FromStr for Board {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() != HEIGHT {
            return Err(GameError::InvalidBoard {
                reason: format!("expected {HEIGHT} rows, found {}", lines.len()),
            });
        }
        let mut board = Board::new();
        for (index, line) in lines.iter().enumerate() {
            let row = HEIGHT - 1 - index;
            let symbols: Vec<char> = line.chars().collect();
            if symbols.len() != WIDTH {
                return Err(GameError::InvalidBoard {
                    reason: format!("row {row} has {} cells, expected {WIDTH}", symbols.len()),
                });
            }
            for (column, symbol) in symbols.into_iter().enumerate() {
                board.cells[row][column] = match symbol {
                    '.' => CellState::Empty,
                    'R' | 'r' => CellState::Red,
                    'Y' | 'y' => CellState::Yellow,
                    other => {
                        return Err(GameError::InvalidBoard {
                            reason: format!("unexpected cell {other:?} at row {row}, column {column}"),
                        })
                    }
                };
            }
        }
        for column in 0..WIDTH {
            let height = board.column_height(column);
            if (height..HEIGHT).any(|row| board.cells[row][column] != CellState::Empty) {
                return Err(GameError::InvalidBoard {
                    reason: format!("column {column} has a floating token"),
                });
            }
        }
        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn board(rows: &str) -> Board {
        rows.parse().unwrap()
    }

    fn swap_colours(board: &Board) -> Board {
        let mut swapped = board.clone();
        for row in swapped.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = match *cell {
                    CellState::Red => CellState::Yellow,
                    CellState::Yellow => CellState::Red,
                    CellState::Empty => CellState::Empty,
                };
            }
        }
        swapped
    }

    #[test]
    fn tokens_stack_from_the_bottom() {
        let mut board = Board::new();
        assert_eq!(board.update_board(3, Player::Red), Ok(0));
        assert_eq!(board.update_board(3, Player::Yellow), Ok(1));
        assert_eq!(board.cell(0, 3), CellState::Red);
        assert_eq!(board.cell(1, 3), CellState::Yellow);
        assert_eq!(board.column_height(3), 2);
        assert_eq!(board.column_height(2), 0);
    }

    #[test]
    fn full_column_is_rejected_without_mutation() {
        let mut board = Board::new();
        for i in 0..HEIGHT {
            let player = if i % 2 == 0 { Player::Red } else { Player::Yellow };
            board.update_board(0, player).unwrap();
        }
        assert!(!board.is_column_not_full(0));
        let before = board.clone();
        assert_eq!(
            board.update_board(0, Player::Red),
            Err(GameError::ColumnFull { column: 0 })
        );
        assert_eq!(
            board.update_board(WIDTH, Player::Red),
            Err(GameError::ColumnOutOfBounds { column: WIDTH })
        );
        assert_eq!(board, before);
        assert_eq!(board.legal_moves(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn random_play_keeps_columns_contiguous() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut board = Board::new();
        let mut player = Player::Red;
        while let Some(&column) = board.legal_moves().choose(&mut rng) {
            let before = board.column_height(column);
            board.update_board(column, player).unwrap();
            assert_eq!(board.column_height(column), before + 1);
            let reparsed: Board = board.to_string().parse().unwrap();
            assert_eq!(reparsed, board);
            player = player.opponent();
        }
        assert!(board.is_full());
    }

    #[test]
    fn clone_does_not_share_cells() {
        let original = Board::new();
        let mut copy = original.clone();
        copy.update_board(4, Player::Yellow).unwrap();
        assert_eq!(original.column_height(4), 0);
        assert_eq!(copy.column_height(4), 1);
    }

    #[test]
    fn three_in_a_row_is_not_a_win_on_any_axis() {
        let horizontal = board(
            ".......
             .......
             .......
             .......
             .......
             RRR....",
        );
        let vertical = board(
            ".......
             .......
             .......
             R......
             R......
             R......",
        );
        let rising = board(
            ".......
             .......
             .......
             ..R....
             .RY....
             RYY....",
        );
        let falling = board(
            ".......
             .......
             .......
             R......
             YR.....
             YYR....",
        );
        assert!(!horizontal.result(Player::Red, 2));
        assert!(!vertical.result(Player::Red, 0));
        assert!(!rising.result(Player::Red, 2));
        assert!(!falling.result(Player::Red, 0));
    }

    #[test]
    fn four_in_a_row_wins_on_every_axis() {
        let horizontal = board(
            ".......
             .......
             .......
             .......
             .......
             YRRRR..",
        );
        let vertical = board(
            ".......
             .......
             Y......
             Y......
             Y......
             Y......",
        );
        let rising = board(
            ".......
             .......
             ...R...
             ..RY...
             .RYY...
             RYYY...",
        );
        let falling = board(
            ".......
             .......
             Y......
             RY.....
             RRY....
             RRRY...",
        );
        for column in 1..=4 {
            assert!(horizontal.result(Player::Red, column));
        }
        assert!(!horizontal.result(Player::Yellow, 0));
        assert!(vertical.result(Player::Yellow, 0));
        assert!(rising.result(Player::Red, 3));
        assert!(rising.result(Player::Red, 0));
        assert!(falling.result(Player::Yellow, 0));
        assert!(falling.result(Player::Yellow, 3));
    }

    #[test]
    fn result_checks_the_topmost_token_of_the_player() {
        // Yellow has a bottom-row four, but its topmost token in column 0 sits
        // on row 1, off that line.
        let board = board(
            ".......
             .......
             .......
             .......
             YR.....
             YYYY...",
        );
        assert!(!board.result(Player::Yellow, 0));
        assert!(board.result(Player::Yellow, 1));
        assert!(!board.result(Player::Red, 2));
    }

    #[test]
    fn filled_board_without_four_is_a_draw() {
        let board = board(
            "YYRRYYR
             RRYYRRY
             YYRRYYR
             RRYYRRY
             YYRRYYR
             RRYYRRY",
        );
        assert!(board.is_full());
        for column in 0..WIDTH {
            assert!(!board.result(Player::Red, column));
            assert!(!board.result(Player::Yellow, column));
        }
    }

    #[test]
    fn single_centre_token_scores_one_per_open_line() {
        let mut board = Board::new();
        assert_eq!(board.evaluate(Player::Red), 0);
        board.update_board(3, Player::Red).unwrap();
        assert_eq!(board.evaluate(Player::Red), 4);
        assert_eq!(board.evaluate(Player::Yellow), -4);
    }

    #[test]
    fn capped_three_scores_nothing_for_its_row() {
        let open = board(
            ".......
             .......
             .......
             .......
             .......
             .RRR...",
        );
        let capped = board(
            ".......
             .......
             .......
             .......
             .......
             YRRRY..",
        );
        assert_eq!(open.evaluate(Player::Red), 107);
        assert!(capped.evaluate(Player::Red) < 100);
    }

    #[test]
    fn equal_runs_keep_the_earlier_segment_unless_the_last_has_more_room() {
        let bottom_row = &SCAN_LINES[0];
        // Earlier segment has more room and keeps its place.
        let earlier = board(
            ".......
             .......
             .......
             .......
             .......
             R...YR.",
        );
        assert_eq!(earlier.best_run(bottom_row, CellState::Red), (1, 3));
        assert_eq!(earlier.best_run(bottom_row, CellState::Yellow), (1, 3));
        assert_eq!(earlier.evaluate(Player::Red), 2);

        // Final segment has more room and replaces the earlier one.
        let later = board(
            ".......
             .......
             .......
             .......
             .......
             R.YR...",
        );
        assert_eq!(later.best_run(bottom_row, CellState::Red), (1, 3));
        assert_eq!(later.best_run(bottom_row, CellState::Yellow), (1, 1));
        assert_eq!(later.evaluate(Player::Red), 4);
        assert_eq!(later.evaluate(Player::Yellow), -4);
    }

    #[test]
    fn evaluate_is_colour_antisymmetric() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut board = Board::new();
            let mut player = Player::Red;
            let plies = rng.gen_range(0..30);
            for _ in 0..plies {
                let Some(&column) = board.legal_moves().choose(&mut rng) else {
                    break;
                };
                board.update_board(column, player).unwrap();
                player = player.opponent();
            }
            let swapped = swap_colours(&board);
            for perspective in [Player::Red, Player::Yellow] {
                assert_eq!(
                    swapped.evaluate(perspective.opponent()),
                    board.evaluate(perspective)
                );
                assert_eq!(board.evaluate(perspective.opponent()), -board.evaluate(perspective));
            }
        }
    }

    #[test]
    fn scan_lines_cover_every_cell_on_each_axis() {
        // 6 rows + 7 columns + 12 diagonals per direction
        assert_eq!(SCAN_LINES.len(), HEIGHT + WIDTH + 2 * (WIDTH + HEIGHT - 1));
        let cells: usize = SCAN_LINES.iter().map(Vec::len).sum();
        assert_eq!(cells, 4 * WIDTH * HEIGHT);
    }

    #[test]
    fn parse_rejects_floating_tokens() {
        let err = ".......
                   .......
                   .......
                   .......
                   R......
                   ......."
            .parse::<Board>()
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidBoard { .. }));
        assert!("RRR".parse::<Board>().is_err());
    }
}
