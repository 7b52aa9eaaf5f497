//! Search tree node.
//!
//! A node wraps the board reached by playing `column` from its parent,
//! together with the rollout statistics gathered below it.

use crate::{Board, Player};

/// Index into the [`SearchTree`](super::SearchTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// Whose turn it is at a node, relative to the side running the search.
///
/// The root is always [`Perspective::Searcher`]; each level below flips.
/// Counters on a node are kept for the player who made the move into it, so
/// a `Searcher` node counts the opponent's wins and an `Opponent` node
/// counts the searcher's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    Searcher,
    Opponent,
}

impl Perspective {
    pub fn flip(self) -> Self {
        match self {
            Perspective::Searcher => Perspective::Opponent,
            Perspective::Opponent => Perspective::Searcher,
        }
    }
}

/// How a rollout ended, from the searching side's point of view.
///
/// The outcome names the side that actually won the playout and each node
/// credits it to the player who moved into that node. This replaces scoring
/// each rollout against the perspective flag of the node it started from,
/// which credited wins to the wrong side on every other level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FavorsSearchingSide,
    FavorsOpponent,
    Draw,
}

#[derive(Debug, Clone)]
pub struct SearchNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Column played to reach this node; `None` for the root.
    pub column: Option<usize>,
    pub board: Board,
    /// Side to move on `board`.
    pub to_move: Player,
    pub perspective: Perspective,
    /// Starts at 1 so ratios never divide by zero.
    pub visits: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl SearchNode {
    pub fn new_root(board: Board, to_move: Player) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            column: None,
            board,
            to_move,
            perspective: Perspective::Searcher,
            visits: 1,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    pub fn new_child(parent: NodeId, parent_node: &SearchNode, column: usize) -> Self {
        let mut board = parent_node.board.clone();
        board.place(column, parent_node.to_move);
        Self {
            parent: Some(parent),
            children: Vec::new(),
            column: Some(column),
            board,
            to_move: parent_node.to_move.opponent(),
            perspective: parent_node.perspective.flip(),
            visits: 1,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    /// Player whose move produced this node.
    pub fn mover(&self) -> Player {
        self.to_move.opponent()
    }

    /// True when the move into this node already won the game.
    pub fn is_winning_move(&self) -> bool {
        self.column
            .is_some_and(|column| self.board.result(self.mover(), column))
    }

    pub fn win_rate(&self) -> f64 {
        f64::from(self.wins) / f64::from(self.visits)
    }

    /// UCT score seen from a parent with `parent_visits` visits.
    pub fn uct(&self, parent_visits: u32, exploration: f64) -> f64 {
        let visits = f64::from(self.visits);
        self.win_rate() + exploration * (2.0 * f64::from(parent_visits).ln() / visits).sqrt()
    }

    /// Counts one rollout against this node's own perspective.
    pub fn record(&mut self, outcome: Outcome) {
        self.visits += 1;
        match (outcome, self.perspective) {
            (Outcome::Draw, _) => self.draws += 1,
            (Outcome::FavorsSearchingSide, Perspective::Opponent)
            | (Outcome::FavorsOpponent, Perspective::Searcher) => self.wins += 1,
            (Outcome::FavorsSearchingSide, Perspective::Searcher)
            | (Outcome::FavorsOpponent, Perspective::Opponent) => self.losses += 1,
        }
    }
}
