//! Monte Carlo Tree Search with random rollouts.
//!
//! Each decision grows a fresh [`SearchTree`] through select, expand,
//! simulate and backpropagate steps, then drops it once a column is picked:
//! 1. Selection: follow the highest UCT child down to a leaf
//! 2. Expansion: add every legal child of the leaf at once, pick one at random
//! 3. Simulation: play uniformly random moves until a win or a full board
//! 4. Backpropagation: count the outcome on every node back up to the root

mod node;
mod tree;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::{Board, GameError, Player};

pub use node::{NodeId, Outcome, Perspective, SearchNode};
pub use tree::{SearchTree, TreeShape};

pub const DEFAULT_EXPLORATION: f64 = 1.41;

/// Statistics of one root child after a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildStats {
    pub column: usize,
    pub visits: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// Result of an MCTS decision.
#[derive(Debug, Clone)]
pub struct MctsResult {
    /// Root child with the best win rate
    pub column: usize,
    pub iterations: u32,
    pub children: Vec<ChildStats>,
    pub shape: TreeShape,
}

/// MCTS player. The random source drives both expansion and rollouts; seed it
/// through [`Mcts::with_rng`] for reproducible decisions.
#[derive(Debug, Clone)]
pub struct Mcts<R = StdRng> {
    rng: R,
}

impl Mcts<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Mcts<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Mcts<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn get_best_move(&mut self, board: &Board, player: Player, iterations: u32) -> Result<usize, GameError> {
        self.get_best_move_with_exploration(board, player, iterations, DEFAULT_EXPLORATION)
    }

    pub fn get_best_move_with_exploration(
        &mut self,
        board: &Board,
        player: Player,
        iterations: u32,
        exploration: f64,
    ) -> Result<usize, GameError> {
        self.search(board, player, iterations, exploration)
            .map(|result| result.column)
    }

    /// Runs `iterations` rollouts for `player` and reports the chosen column
    /// along with the root's child statistics and the shape of the tree.
    pub fn search(
        &mut self,
        board: &Board,
        player: Player,
        iterations: u32,
        exploration: f64,
    ) -> Result<MctsResult, GameError> {
        let mut tree = SearchTree::new(board.clone(), player);

        for iteration in 0..iterations {
            let selected = select(&tree, exploration);
            let leaf = self.expand(&mut tree, selected);
            let outcome = self.simulate(tree.get(leaf), player);
            backpropagate(&mut tree, leaf, outcome);
            trace!(iteration, ?outcome, "rollout finished");
        }

        let column = best_child(&tree)
            .and_then(|id| tree.get(id).column)
            .ok_or(GameError::NoMoves)?;
        let children = tree
            .get(tree.root())
            .children
            .iter()
            .filter_map(|&id| {
                let node = tree.get(id);
                node.column.map(|column| ChildStats {
                    column,
                    visits: node.visits,
                    wins: node.wins,
                    losses: node.losses,
                    draws: node.draws,
                })
            })
            .collect();
        let shape = tree.shape();
        debug!(
            ?player,
            iterations,
            column,
            nodes = shape.total_nodes,
            levels = shape.levels,
            balance = shape.balance_score,
            "mcts search finished"
        );

        Ok(MctsResult {
            column,
            iterations,
            children,
            shape,
        })
    }

    /// Adds every legal child of `id` and returns one of them at random.
    /// Finished positions come back unexpanded.
    fn expand(&mut self, tree: &mut SearchTree, id: NodeId) -> NodeId {
        if tree.get(id).is_winning_move() {
            return id;
        }
        tree.expand(id).choose(&mut self.rng).copied().unwrap_or(id)
    }

    /// Plays random moves from `node` until someone connects four or the
    /// board fills up.
    fn simulate(&mut self, node: &SearchNode, searcher: Player) -> Outcome {
        let mut board = node.board.clone();
        let mut to_move = node.to_move;
        let mut winner = node.is_winning_move().then(|| node.mover());

        while winner.is_none() {
            let Some(&column) = board.legal_moves().choose(&mut self.rng) else {
                break;
            };
            board.place(column, to_move);
            if board.result(to_move, column) {
                winner = Some(to_move);
            }
            to_move = to_move.opponent();
        }

        match winner {
            Some(player) if player == searcher => Outcome::FavorsSearchingSide,
            Some(_) => Outcome::FavorsOpponent,
            None => Outcome::Draw,
        }
    }
}

/// Descends from the root through the best UCT child until a leaf.
fn select(tree: &SearchTree, exploration: f64) -> NodeId {
    let mut current = tree.root();
    loop {
        let node = tree.get(current);
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &node.children {
            let score = tree.get(child).uct(node.visits, exploration);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((child, score));
            }
        }
        match best {
            Some((child, _)) => current = child,
            None => return current,
        }
    }
}

fn backpropagate(tree: &mut SearchTree, leaf: NodeId, outcome: Outcome) {
    let mut current = Some(leaf);
    while let Some(id) = current {
        let node = tree.get_mut(id);
        node.record(outcome);
        current = node.parent;
    }
}

/// Root child with the highest plain win rate; the first one wins ties.
fn best_child(tree: &SearchTree) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for &child in &tree.get(tree.root()).children {
        let rate = tree.get(child).win_rate();
        if best.map_or(true, |(_, best_rate)| rate > best_rate) {
            best = Some((child, rate));
        }
    }
    best.map(|(id, _)| id)
}
