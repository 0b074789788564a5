//! Graph nodes and their argument edges

use super::opcode::{ChainOp, OpCode};

slotmap::new_key_type! {
    /// Stable handle of a node inside a handler's arena.
    ///
    /// Keys are generational: a handle that outlives a handler reset is
    /// detected instead of aliasing a newer node.
    pub struct NodeId;
}

/// An argument edge: either a reference to another node or an embedded literal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Argument<B> {
    Node(NodeId),
    Param(B),
}

impl<B: Copy> Argument<B> {
    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Argument::Node(id) => Some(*id),
            Argument::Param(_) => None,
        }
    }

    #[inline]
    pub fn param(&self) -> Option<B> {
        match self {
            Argument::Param(v) => Some(*v),
            Argument::Node(_) => None,
        }
    }
}

/// One scalar operation in the expression graph
#[derive(Debug, Clone, PartialEq)]
pub struct Node<B> {
    pub(crate) op: OpCode,
    pub(crate) args: Vec<Argument<B>>,
    /// Per-argument tags, only for `AddSub`/`MulDiv` chains
    pub(crate) chain: Vec<ChainOp>,
    /// Storage location; zero means unassigned
    pub(crate) slot: usize,
    pub(crate) eval_rank: usize,
    pub(crate) total_refs: usize,
    pub(crate) last_use_rank: usize,
    pub(crate) name: Option<String>,
}

impl<B> Node<B> {
    pub(crate) fn new(op: OpCode, args: Vec<Argument<B>>) -> Self {
        Self {
            op,
            args,
            chain: Vec::new(),
            slot: 0,
            eval_rank: 0,
            total_refs: 0,
            last_use_rank: 0,
            name: None,
        }
    }

    /// A node for the optimized graph that inherits the bookkeeping of `orig`
    pub(crate) fn derived(
        op: OpCode,
        args: Vec<Argument<B>>,
        chain: Vec<ChainOp>,
        orig: &Node<B>,
    ) -> Self {
        let mut node = Self::new(op, args);
        node.chain = chain;
        node.clone_info(orig);
        node
    }

    pub(crate) fn clone_info(&mut self, orig: &Node<B>) {
        self.slot = orig.slot;
        self.eval_rank = orig.eval_rank;
        self.total_refs = orig.total_refs;
        self.last_use_rank = orig.last_use_rank;
        self.name.clone_from(&orig.name);
    }

    pub(crate) fn reset_counters(&mut self) {
        self.slot = 0;
        self.eval_rank = 0;
        self.total_refs = 0;
        self.last_use_rank = 0;
    }

    /// Rebind this node to point at `target`; every edge into it stays valid
    pub(crate) fn make_alias(&mut self, target: Argument<B>) {
        self.op = OpCode::Alias;
        self.args = vec![target];
        self.chain.clear();
        self.slot = 0;
        self.name = None;
    }

    #[inline]
    pub fn op(&self) -> OpCode {
        self.op
    }

    #[inline]
    pub fn args(&self) -> &[Argument<B>] {
        &self.args
    }

    /// Operator tags of a chain node (empty otherwise)
    #[inline]
    pub fn chain(&self) -> &[ChainOp] {
        &self.chain
    }

    /// The assigned storage location, zero if none
    #[inline]
    pub fn slot_id(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn eval_rank(&self) -> usize {
        self.eval_rank
    }

    /// Number of references to this node within the requested sub-graph
    #[inline]
    pub fn total_ref_count(&self) -> usize {
        self.total_refs
    }

    #[inline]
    pub fn last_use_rank(&self) -> usize {
        self.last_use_rank
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Iterate over the node arguments that reference other nodes
    pub fn node_args(&self) -> impl Iterator<Item = (usize, NodeId)> + '_
    where
        B: Copy,
    {
        self.args
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.node().map(|id| (i, id)))
    }
}
