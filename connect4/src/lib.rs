//! Connect 4 engine with three interchangeable move-selection strategies.
//! A [`Board`] holds the 6x7 grid; [`min_max`], [`alpha_beta`] and
//! [`Mcts::get_best_move`] each take a board, the side to play and a budget,
//! and answer with a column. Searches only ever touch clones of the board
//! they are given.
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod board;
mod game;
pub mod mcts;
mod search;
mod strategy;

pub use board::{Board, CellState, HEIGHT, WIDTH};
pub use game::{parse_history, Game, GameStatus, MoveOutcome, TypedMove};
pub use mcts::{Mcts, DEFAULT_EXPLORATION};
pub use search::{alpha_beta, alpha_beta_search, min_max, min_max_search, SearchOutcome};
pub use strategy::{Strategy, DEFAULT_ALPHABETA_DEPTH, DEFAULT_MCTS_ITERATIONS, DEFAULT_MINMAX_DEPTH};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Red,
    Yellow,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Player::Red => 'R',
            Player::Yellow => 'Y',
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::Red => f.write_str("red"),
            Player::Yellow => f.write_str("yellow"),
        }
    }
}

impl std::str::FromStr for Player {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(Player::Red),
            "yellow" | "y" => Ok(Player::Yellow),
            other => Err(GameError::UnknownPlayer(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GameError {
    #[error("invalid move string at position {position}: {reason}")]
    ParseMove { position: usize, reason: String },
    #[error("column {column} is full")]
    ColumnFull { column: usize },
    #[error("column {column} is out of bounds")]
    ColumnOutOfBounds { column: usize },
    #[error("no legal moves remain")]
    NoMoves,
    #[error("the game is already over")]
    GameOver,
    #[error("unknown player {0:?}")]
    UnknownPlayer(String),
    #[error("invalid board: {reason}")]
    InvalidBoard { reason: String },
    #[error("invalid strategy {input:?}: {reason}")]
    InvalidStrategy { input: String, reason: String },
}
