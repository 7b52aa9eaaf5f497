use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::mcts::{Mcts, DEFAULT_EXPLORATION};
use crate::{alpha_beta, min_max, Board, GameError, Player};

pub const DEFAULT_MINMAX_DEPTH: u32 = 5;
pub const DEFAULT_ALPHABETA_DEPTH: u32 = 8;
pub const DEFAULT_MCTS_ITERATIONS: u32 = 100_000;

/// A move-selection strategy and its budget. All three share the shape
/// `(board, player) -> column`, so callers can swap them freely.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", try_from = "StrategyConfig")]
pub enum Strategy {
    MinMax { depth: u32 },
    AlphaBeta { depth: u32 },
    Mcts { iterations: u32, exploration: f64 },
}

/// Config form of [`Strategy`]; missing budgets take the defaults and the
/// result goes through the same checks as the `kind[:budget]` form.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum StrategyConfig {
    MinMax {
        #[serde(default = "default_minmax_depth")]
        depth: u32,
    },
    AlphaBeta {
        #[serde(default = "default_alphabeta_depth")]
        depth: u32,
    },
    Mcts {
        #[serde(default = "default_mcts_iterations")]
        iterations: u32,
        #[serde(default = "default_exploration")]
        exploration: f64,
    },
}

impl TryFrom<StrategyConfig> for Strategy {
    type Error = GameError;

    fn try_from(config: StrategyConfig) -> Result<Self, Self::Error> {
        let strategy = match config {
            StrategyConfig::MinMax { depth } => Strategy::MinMax { depth },
            StrategyConfig::AlphaBeta { depth } => Strategy::AlphaBeta { depth },
            StrategyConfig::Mcts {
                iterations,
                exploration,
            } => Strategy::Mcts {
                iterations,
                exploration,
            },
        };
        strategy.validate()
    }
}

fn default_minmax_depth() -> u32 {
    DEFAULT_MINMAX_DEPTH
}

fn default_alphabeta_depth() -> u32 {
    DEFAULT_ALPHABETA_DEPTH
}

fn default_mcts_iterations() -> u32 {
    DEFAULT_MCTS_ITERATIONS
}

fn default_exploration() -> f64 {
    DEFAULT_EXPLORATION
}

impl Strategy {
    /// Depth for the tree searches, iterations for MCTS.
    pub fn budget(&self) -> u32 {
        match *self {
            Strategy::MinMax { depth } | Strategy::AlphaBeta { depth } => depth,
            Strategy::Mcts { iterations, .. } => iterations,
        }
    }

    /// Rejects budgets that could never produce a move.
    pub fn validate(self) -> Result<Self, GameError> {
        let invalid = |reason: &str| GameError::InvalidStrategy {
            input: self.to_string(),
            reason: reason.to_string(),
        };
        if self.budget() == 0 {
            return Err(invalid("budget must be at least 1"));
        }
        if let Strategy::Mcts { exploration, .. } = self {
            if !exploration.is_finite() || exploration < 0.0 {
                return Err(invalid("exploration must be a finite, non-negative number"));
            }
        }
        Ok(self)
    }

    /// Picks a column for `player`. `rng` feeds the MCTS rollouts and is
    /// ignored by the deterministic searches.
    pub fn choose_move<R: Rng>(&self, board: &Board, player: Player, rng: &mut R) -> Result<usize, GameError> {
        match *self {
            Strategy::MinMax { depth } => min_max(board, depth, player).ok_or(GameError::NoMoves),
            Strategy::AlphaBeta { depth } => alpha_beta(board, depth, player).ok_or(GameError::NoMoves),
            Strategy::Mcts {
                iterations,
                exploration,
            } => Mcts::with_rng(rng).get_best_move_with_exploration(board, player, iterations, exploration),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::MinMax { depth } => write!(f, "minmax:{depth}"),
            Strategy::AlphaBeta { depth } => write!(f, "alphabeta:{depth}"),
            Strategy::Mcts { iterations, .. } => write!(f, "mcts:{iterations}"),
        }
    }
}

/// Parses `kind[:budget]`, e.g. `minmax`, `alphabeta:6`, `mcts:20000`.
impl FromStr for Strategy {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| GameError::InvalidStrategy {
            input: s.to_string(),
            reason,
        };
        let (kind, budget) = match s.trim().split_once(':') {
            Some((kind, budget)) => {
                let budget: u32 = budget
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("budget {budget:?} is not a number")))?;
                (kind.trim(), Some(budget))
            }
            None => (s.trim(), None),
        };

        let strategy = match kind.to_ascii_lowercase().as_str() {
            "minmax" | "minimax" => Strategy::MinMax {
                depth: budget.unwrap_or(DEFAULT_MINMAX_DEPTH),
            },
            "alphabeta" | "alpha-beta" => Strategy::AlphaBeta {
                depth: budget.unwrap_or(DEFAULT_ALPHABETA_DEPTH),
            },
            "mcts" => Strategy::Mcts {
                iterations: budget.unwrap_or(DEFAULT_MCTS_ITERATIONS),
                exploration: DEFAULT_EXPLORATION,
            },
            other => return Err(invalid(format!("unknown strategy {other:?}"))),
        };
        strategy.validate().map_err(|err| match err {
            GameError::InvalidStrategy { reason, .. } => invalid(reason),
            other => other,
        })
    }
}
