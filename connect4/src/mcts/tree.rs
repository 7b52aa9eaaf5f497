//! Arena-backed search tree. Nodes live in one `Vec` and point at each other
//! through [`NodeId`]s: children are owned by the arena, parents are plain
//! indices, so there is no reference cycle to manage.

use std::collections::VecDeque;

use crate::{Board, Player};

use super::node::{NodeId, SearchNode};

#[derive(Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    pub fn new(board: Board, to_move: Player) -> Self {
        Self {
            nodes: vec![SearchNode::new_root(board, to_move)],
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Creates one child per legal column of `parent`, in column order.
    pub fn expand(&mut self, parent: NodeId) -> &[NodeId] {
        let columns = self.get(parent).board.legal_moves();
        for column in columns {
            let child = SearchNode::new_child(parent, self.get(parent), column);
            let id = NodeId(self.nodes.len());
            self.nodes.push(child);
            self.get_mut(parent).children.push(id);
        }
        &self.get(parent).children
    }

    /// Breadth-first summary of how the tree grew.
    pub fn shape(&self) -> TreeShape {
        let mut nodes_per_level: Vec<usize> = Vec::new();
        let mut queue = VecDeque::from([(self.root(), 0usize)]);
        while let Some((id, level)) = queue.pop_front() {
            if nodes_per_level.len() <= level {
                nodes_per_level.push(0);
            }
            nodes_per_level[level] += 1;
            queue.extend(self.get(id).children.iter().map(|&child| (child, level + 1)));
        }

        let levels = nodes_per_level.len();
        let total_nodes: usize = nodes_per_level.iter().sum();
        let average = total_nodes as f64 / levels as f64;
        let balance_score = nodes_per_level
            .iter()
            .map(|&count| (average - count as f64).abs())
            .sum::<f64>()
            / levels as f64;

        TreeShape {
            levels,
            nodes_per_level,
            total_nodes,
            balance_score,
        }
    }
}

/// Depth and spread of a search tree. `balance_score` is the mean absolute
/// deviation of the per-level node count from the per-level average.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeShape {
    pub levels: usize,
    pub nodes_per_level: Vec<usize>,
    pub total_nodes: usize,
    pub balance_score: f64,
}
