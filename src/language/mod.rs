//! Backend handoff: materialization policy, renderer trait and the
//! read-only bundle produced by a generation pass
//!
//! The core never formats text. A [`Language`] receives a
//! [`GenerationData`] describing the final evaluation order and slot ids and
//! must render exactly that order.

mod c;
mod names;

pub use c::CLanguage;
pub use names::{DefaultNameGenerator, VariableNameGenerator};

use std::cell::Ref;
use std::fmt;

use crate::core::{Argument, Graph, Node, NodeId, OpCode};
use crate::error::Result;
use crate::traits::MathScalar;

/// Decides which values get their own variable in generated code
pub trait MaterializationPolicy<B: MathScalar> {
    /// Whether `node` must be stored instead of inlined into its consumers
    fn creates_new_variable(&self, node: &Node<B>) -> bool {
        node.total_ref_count() > 1
    }

    /// Whether argument `arg_index` of an `op` node must be a stored variable
    fn requires_variable_argument(&self, op: OpCode, arg_index: usize) -> bool {
        let _ = (op, arg_index);
        false
    }
}

/// Materializes exactly the values used more than once
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl<B: MathScalar> MaterializationPolicy<B> for DefaultPolicy {}

/// A target language renderer
pub trait Language<B: MathScalar>: MaterializationPolicy<B> {
    /// Write the statements computing the outputs of `data`
    fn generate_source_code(&self, out: &mut dyn fmt::Write, data: &GenerationData<'_, B>)
    -> Result<()>;
}

/// Result of a generation pass, borrowed from the handler.
///
/// While a bundle is alive the handler's graph cannot be modified; building
/// new expressions fails with [`CodeGenError::GraphInUse`](crate::CodeGenError::GraphInUse).
pub struct GenerationData<'a, B: MathScalar> {
    graph: Ref<'a, Graph<B>>,
    outputs: Vec<Argument<B>>,
    names: &'a dyn VariableNameGenerator,
}

impl<'a, B: MathScalar> GenerationData<'a, B> {
    pub(crate) fn new(
        graph: Ref<'a, Graph<B>>,
        outputs: Vec<Argument<B>>,
        names: &'a dyn VariableNameGenerator,
    ) -> Self {
        Self {
            graph,
            outputs,
            names,
        }
    }

    #[inline]
    pub fn graph(&self) -> &Graph<B> {
        &self.graph
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node<B>> {
        self.graph.node(id)
    }

    /// Independents in roster order; position `i` holds id `i + 1`
    #[inline]
    pub fn independents(&self) -> &[NodeId] {
        self.graph.independents()
    }

    /// The requested outputs, remapped into the optimized graph when enabled
    #[inline]
    pub fn outputs(&self) -> &[Argument<B>] {
        &self.outputs
    }

    /// Materialized nodes in evaluation order
    #[inline]
    pub fn variable_order(&self) -> &[NodeId] {
        self.graph.variable_order()
    }

    #[inline]
    pub fn min_temporary_id(&self) -> usize {
        self.graph.min_temporary_id()
    }

    #[inline]
    pub fn max_variable_id(&self) -> usize {
        self.graph.max_variable_id()
    }

    /// Number of distinct temporary slots
    pub fn temporary_count(&self) -> usize {
        (self.max_variable_id() + 1).saturating_sub(self.min_temporary_id())
    }

    #[inline]
    pub fn is_optimized(&self) -> bool {
        self.graph.state.optimized
    }

    #[inline]
    pub fn names(&self) -> &dyn VariableNameGenerator {
        self.names
    }

    /// Output position owning the id of `id`, if that id was reserved for an output
    pub fn dependent_index(&self, id: NodeId) -> Option<usize> {
        let slot = self.graph.node(id)?.slot_id();
        self.graph.state.dependent_ids.get(&slot).copied()
    }

    /// Identifier of a materialized node, `None` for inlined nodes
    pub fn variable_name(&self, id: NodeId) -> Option<String> {
        let node = self.graph.node(id)?;
        let slot = node.slot_id();
        if slot == 0 {
            return None;
        }
        if slot <= self.independents().len() {
            return Some(self.names.independent_name(slot - 1, node.name()));
        }
        if let Some(index) = self.dependent_index(id) {
            return Some(self.names.dependent_name(index));
        }
        let min = self.min_temporary_id();
        (slot >= min).then(|| self.names.temporary_name(slot - min, node.name()))
    }
}

impl<B: MathScalar> fmt::Debug for GenerationData<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationData")
            .field("outputs", &self.outputs)
            .field("variable_order", &self.variable_order())
            .field("min_temporary_id", &self.min_temporary_id())
            .field("max_variable_id", &self.max_variable_id())
            .finish_non_exhaustive()
    }
}
