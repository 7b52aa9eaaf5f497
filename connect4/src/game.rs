//! A live game: the board, whose turn it is, and how it ended.
//! Move histories use the compact `R3Y3R4` notation, one colour letter and one
//! 0-based column digit per move.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Board, GameError, Player, WIDTH};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Draw,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub player: Player,
    pub column: usize,
    pub row: usize,
    pub status: GameStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedMove {
    pub player: Player,
    pub column: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Game {
    board: Board,
    to_move: Player,
    status: GameStatus,
    history: Vec<TypedMove>,
}

impl Game {
    pub fn new(first: Player) -> Self {
        Self {
            board: Board::new(),
            to_move: first,
            status: GameStatus::InProgress,
            history: Vec::new(),
        }
    }

    /// Replays `moves` as given; each move names its own player.
    pub fn from_history(moves: &[TypedMove]) -> Result<Self, GameError> {
        let first = moves.first().map(|m| m.player).unwrap_or(Player::Red);
        let mut game = Self::new(first);
        for mv in moves {
            game.force_play(mv.player, mv.column)?;
        }
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status != GameStatus::InProgress
    }

    pub fn history(&self) -> &[TypedMove] {
        &self.history
    }

    pub fn history_string(&self) -> String {
        self.history
            .iter()
            .map(|mv| format!("{}{}", mv.player.symbol(), mv.column))
            .collect()
    }

    /// Plays `column` for the side to move.
    pub fn play(&mut self, column: usize) -> Result<MoveOutcome, GameError> {
        let player = self.to_move;
        self.force_play(player, column)
    }

    fn force_play(&mut self, player: Player, column: usize) -> Result<MoveOutcome, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        let row = self.board.update_board(column, player)?;
        self.history.push(TypedMove { player, column });
        self.to_move = player.opponent();

        self.status = if self.board.result(player, column) {
            info!(%player, column, "game won");
            GameStatus::Won(player)
        } else if self.board.is_full() {
            info!("game drawn");
            GameStatus::Draw
        } else {
            GameStatus::InProgress
        };

        Ok(MoveOutcome {
            player,
            column,
            row,
            status: self.status,
        })
    }
}

pub fn parse_history(history: &str) -> Result<Vec<TypedMove>, GameError> {
    if history.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut moves = Vec::new();
    let chars: Vec<char> = history.trim().chars().collect();
    let mut idx = 0;
    while idx < chars.len() {
        let color = chars[idx];
        let player = match color {
            'R' | 'r' => Player::Red,
            'Y' | 'y' => Player::Yellow,
            _ => {
                return Err(GameError::ParseMove {
                    position: idx,
                    reason: format!("expected R or Y, found {color}"),
                })
            }
        };
        idx += 1;
        let Some(&column_char) = chars.get(idx) else {
            return Err(GameError::ParseMove {
                position: idx,
                reason: "missing column number".to_string(),
            });
        };
        let Some(column) = column_char.to_digit(10).map(|d| d as usize) else {
            return Err(GameError::ParseMove {
                position: idx,
                reason: format!("expected column digit, found {column_char}"),
            });
        };
        if column >= WIDTH {
            return Err(GameError::ParseMove {
                position: idx,
                reason: format!("column must be 0-{}", WIDTH - 1),
            });
        }
        moves.push(TypedMove { player, column });
        idx += 1;
    }
    Ok(moves)
}
