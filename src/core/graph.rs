//! Arena owning every node recorded by a handler

use std::ops::{Index, IndexMut};

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use super::node::{Argument, Node, NodeId};
use super::opcode::OpCode;
use super::rules::{self, Shortcut};
use crate::traits::MathScalar;

/// Results of the last generation pass, kept so the backend bundle can borrow them
#[derive(Debug, Default)]
pub(crate) struct GenerationState {
    /// Materialized nodes of the original graph in evaluation order
    pub(crate) variable_order: Vec<NodeId>,
    /// Same order over the optimized graph
    pub(crate) variable_order_opt: Vec<NodeId>,
    /// Original node -> optimized node
    pub(crate) regular_to_opt: FxHashMap<NodeId, NodeId>,
    /// Output-reserved id -> position in the requested output list
    pub(crate) dependent_ids: FxHashMap<usize, usize>,
    /// Whether `variable_order_opt` is the final order
    pub(crate) optimized: bool,
    /// Last id handed out
    pub(crate) id_count: usize,
    pub(crate) min_temporary_id: usize,
    /// Set after the first generation; later passes must reset counters
    pub(crate) used: bool,
}

/// The operation graph.
///
/// Original nodes are never removed individually: they live until
/// [`Graph::reset`]. Nodes produced by the optimizer live in the same arena
/// but are tracked separately and discarded at the start of every generation.
#[derive(Debug)]
pub struct Graph<B> {
    nodes: SlotMap<NodeId, Node<B>>,
    originals: Vec<NodeId>,
    optimized: Vec<NodeId>,
    independents: Vec<NodeId>,
    pub(crate) state: GenerationState,
}

impl<B: MathScalar> Default for Graph<B> {
    fn default() -> Self {
        Self::with_capacity(50)
    }
}

impl<B: MathScalar> Graph<B> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            originals: Vec::with_capacity(capacity),
            optimized: Vec::new(),
            independents: Vec::new(),
            state: GenerationState::default(),
        }
    }

    /// Register a new original node
    pub(crate) fn add_node(&mut self, op: OpCode, args: Vec<Argument<B>>) -> NodeId {
        debug_assert!(
            op == OpCode::Inv || op == OpCode::Alias || args.iter().any(|a| a.node().is_some()),
            "{op} node created without variable arguments"
        );
        let id = self.nodes.insert(Node::new(op, args));
        self.originals.push(id);
        id
    }

    /// Register a new independent variable at the end of the roster
    pub(crate) fn add_independent(&mut self) -> NodeId {
        let id = self.add_node(OpCode::Inv, Vec::new());
        self.independents.push(id);
        id
    }

    /// Register a node that belongs to the optimized graph
    pub(crate) fn add_optimized(&mut self, node: Node<B>) -> NodeId {
        let id = self.nodes.insert(node);
        self.optimized.push(id);
        id
    }

    /// Create (or shortcut) a binary operation between two arguments
    pub(crate) fn binary(&mut self, op: OpCode, a: Argument<B>, b: Argument<B>) -> Argument<B> {
        match rules::binary_shortcut(op, a.param(), b.param()) {
            Some(Shortcut::Value(v)) => Argument::Param(v),
            Some(Shortcut::Left) => a,
            Some(Shortcut::Right) => b,
            None => Argument::Node(self.add_node(op, vec![a, b])),
        }
    }

    /// Create (or fold) a unary operation
    pub(crate) fn unary(&mut self, op: OpCode, a: Argument<B>) -> Argument<B> {
        match a {
            Argument::Param(v) => Argument::Param(rules::fold_unary(op, v)),
            Argument::Node(_) => Argument::Node(self.add_node(op, vec![a])),
        }
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<B>> {
        self.nodes.get(id)
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<B>> {
        self.nodes.get_mut(id)
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes recorded by expression building (optimized nodes excluded)
    #[inline]
    pub fn node_count(&self) -> usize {
        self.originals.len()
    }

    /// Number of nodes created by the last optimization pass
    #[inline]
    pub fn optimized_count(&self) -> usize {
        self.optimized.len()
    }

    pub(crate) fn originals(&self) -> &[NodeId] {
        &self.originals
    }

    /// The independent variable roster, in creation order
    #[inline]
    pub fn independents(&self) -> &[NodeId] {
        &self.independents
    }

    pub fn independent_index(&self, id: NodeId) -> Option<usize> {
        self.independents.iter().position(|&n| n == id)
    }

    pub(crate) fn remove_independent(&mut self, index: usize) -> NodeId {
        self.independents.remove(index)
    }

    /// Id 1..=k denotes one of the current independents
    #[inline]
    pub fn is_independent(&self, id: NodeId) -> bool {
        let slot = self[id].slot;
        slot > 0 && slot <= self.independents.len()
    }

    /// Ids at or beyond the temporary threshold belong to temporaries
    #[inline]
    pub fn is_temporary(&self, id: NodeId) -> bool {
        let min = self.state.min_temporary_id;
        min > 0 && self[id].slot >= min
    }

    /// Prepare for a new generation pass.
    ///
    /// Drops the previous optimized graph and clears all transient counters
    /// so the same structure can be scheduled against a different output set.
    pub(crate) fn begin_generation(&mut self) {
        for id in self.optimized.drain(..) {
            self.nodes.remove(id);
        }
        if self.state.used {
            for &id in &self.originals {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.reset_counters();
                }
            }
        }
        self.state.variable_order.clear();
        self.state.variable_order_opt.clear();
        self.state.regular_to_opt.clear();
        self.state.dependent_ids.clear();
        self.state.optimized = false;
        self.state.id_count = 0;
        self.state.min_temporary_id = 0;
        self.state.used = true;
    }

    /// Materialized nodes in their final evaluation order
    pub fn variable_order(&self) -> &[NodeId] {
        if self.state.optimized {
            &self.state.variable_order_opt
        } else {
            &self.state.variable_order
        }
    }

    /// The optimized counterpart of an original node, after an optimizing generation
    pub fn optimized_node(&self, original: NodeId) -> Option<NodeId> {
        self.state.regular_to_opt.get(&original).copied()
    }

    /// Last id handed out by the latest generation
    #[inline]
    pub fn max_variable_id(&self) -> usize {
        self.state.id_count
    }

    #[inline]
    pub fn min_temporary_id(&self) -> usize {
        self.state.min_temporary_id
    }

    /// Release every node, original and optimized, and empty the roster
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.originals.clear();
        self.optimized.clear();
        self.independents.clear();
        self.state = GenerationState::default();
    }
}

impl<B> Index<NodeId> for Graph<B> {
    type Output = Node<B>;

    fn index(&self, id: NodeId) -> &Node<B> {
        &self.nodes[id]
    }
}

impl<B> IndexMut<NodeId> for Graph<B> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<B> {
        &mut self.nodes[id]
    }
}
