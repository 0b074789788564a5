//! The code handler: owns the operation graph and runs generation passes
//!
//! A generation pass goes through:
//! 1. id assignment for independents and outputs
//! 2. reference marking over the requested sub-graph
//! 3. scheduling, driven by the backend's [`MaterializationPolicy`]
//! 4. optional chain flattening
//! 5. optional temporary slot reuse
//!
//! Each pass resets the transient counters first, so one handler can
//! generate code for several output sets.
//!
//! # Example
//! ```
//! use symb_codegen::{CLanguage, CodeHandler, DefaultNameGenerator};
//!
//! let handler = CodeHandler::<f64>::new();
//! let u = handler.make_variables(2);
//! let z = &u[0] / 1.0 + &u[1] * &u[1];
//!
//! let source = handler
//!     .generate_code(&[z], &CLanguage::default(), &DefaultNameGenerator::default(), "model")
//!     .unwrap();
//! assert_eq!(source, "   y[0] = x[0] + (x[1] * x[1]);\n");
//! ```

mod optimize;
mod schedule;
mod slots;
mod solve;

pub use solve::{EquationSolver, LocalSolver};

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Instant;

use crate::core::{Argument, Graph, NodeId};
use crate::error::{CodeGenError, Result};
use crate::language::{GenerationData, Language, MaterializationPolicy, VariableNameGenerator};
use crate::symbolic::{SharedGraph, Symbolic, Variable, borrow_graph, expect_recorded};
use crate::traits::MathScalar;

/// Generation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSettings {
    /// Flatten add/sub and mul/div chains
    pub optimize: bool,
    /// Share slots between temporaries with disjoint lifetimes
    pub reuse_ids: bool,
    /// Log timing of every generation job
    pub verbose: bool,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            optimize: true,
            reuse_ids: true,
            verbose: false,
        }
    }
}

/// Records operations on symbolic values and turns them into source code
pub struct CodeHandler<B: MathScalar = f64> {
    graph: SharedGraph<B>,
    settings: HandlerSettings,
}

impl<B: MathScalar> Default for CodeHandler<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: MathScalar> std::fmt::Debug for CodeHandler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeHandler")
            .field("settings", &self.settings)
            .field("independents", &self.independent_count())
            .field("nodes", &self.node_count())
            .finish()
    }
}

impl<B: MathScalar> CodeHandler<B> {
    pub fn new() -> Self {
        Self::with_capacity(50)
    }

    /// Pre-size the node arena
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            graph: Rc::new(RefCell::new(Graph::with_capacity(capacity))),
            settings: HandlerSettings::default(),
        }
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.settings.optimize = optimize;
        self
    }

    pub fn with_reuse_ids(mut self, reuse: bool) -> Self {
        self.settings.reuse_ids = reuse;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.settings.verbose = verbose;
        self
    }

    pub fn set_optimize(&mut self, optimize: bool) {
        self.settings.optimize = optimize;
    }

    pub fn set_reuse_ids(&mut self, reuse: bool) {
        self.settings.reuse_ids = reuse;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.settings.verbose = verbose;
    }

    pub fn is_optimize(&self) -> bool {
        self.settings.optimize
    }

    pub fn is_reuse_ids(&self) -> bool {
        self.settings.reuse_ids
    }

    pub fn is_verbose(&self) -> bool {
        self.settings.verbose
    }

    pub fn settings(&self) -> HandlerSettings {
        self.settings
    }

    /// Read access to the operation graph.
    ///
    /// # Panics
    ///
    /// Never while no graph mutation is in progress, which can only happen
    /// inside this crate's own methods.
    pub fn graph(&self) -> Ref<'_, Graph<B>> {
        self.graph.borrow()
    }

    /// Register a new independent variable
    pub fn try_make_variable(&self) -> Result<Symbolic<B>> {
        let id = borrow_graph(&self.graph)?.add_independent();
        Ok(Symbolic::from_node(id, &self.graph))
    }

    /// Register a new independent variable
    ///
    /// # Panics
    ///
    /// While a [`GenerationData`] of this handler is alive.
    #[track_caller]
    pub fn make_variable(&self) -> Symbolic<B> {
        expect_recorded(self.try_make_variable())
    }

    /// Register `n` independent variables, in order
    #[track_caller]
    pub fn make_variables(&self, n: usize) -> Vec<Symbolic<B>> {
        (0..n).map(|_| self.make_variable()).collect()
    }

    pub fn independent_count(&self) -> usize {
        self.graph().independents().len()
    }

    /// Nodes recorded so far, optimized nodes excluded
    pub fn node_count(&self) -> usize {
        self.graph().node_count()
    }

    /// Last id issued by the latest generation
    pub fn max_variable_id(&self) -> usize {
        self.graph().max_variable_id()
    }

    /// First id used for temporaries by the latest generation
    pub fn min_temporary_id(&self) -> usize {
        self.graph().min_temporary_id()
    }

    /// Roster position of an independent variable
    pub fn independent_index(&self, value: &Symbolic<B>) -> Result<usize> {
        let id = self.own_node(value)?;
        self.graph()
            .independent_index(id)
            .ok_or(CodeGenError::NotIndependent)
    }

    /// Release every node, original and optimized.
    ///
    /// Variables created before the reset can no longer be used with this
    /// handler: operations on them fail with [`CodeGenError::ForeignNode`].
    pub fn reset(&mut self) {
        self.graph.borrow_mut().reset();
        log::debug!("code handler reset");
    }

    fn owns(&self, var: &Variable<B>) -> bool {
        std::ptr::eq(var.graph.as_ptr(), Rc::as_ptr(&self.graph))
    }

    /// The node of a variable recorded by this handler
    pub(crate) fn own_node(&self, value: &Symbolic<B>) -> Result<NodeId> {
        match value {
            Symbolic::Parameter(_) => Err(CodeGenError::NotIndependent),
            Symbolic::Variable(var) if !self.owns(var) => Err(CodeGenError::CrossGraph),
            Symbolic::Variable(var) => {
                if self.graph().contains(var.node) {
                    Ok(var.node)
                } else {
                    Err(CodeGenError::ForeignNode)
                }
            }
        }
    }

    pub(crate) fn own_argument(&self, value: &Symbolic<B>) -> Result<Argument<B>> {
        match value {
            Symbolic::Parameter(v) => Ok(Argument::Param(*v)),
            Symbolic::Variable(_) => self.own_node(value).map(Argument::Node),
        }
    }

    /// Schedule, optimize and allocate slots for `outputs`.
    ///
    /// The returned bundle borrows the graph until it is dropped.
    ///
    /// # Errors
    ///
    /// `CrossGraph` / `ForeignNode` when an output does not belong to this
    /// handler, `GraphInUse` while another bundle is alive.
    ///
    /// # Panics
    ///
    /// When the scheduling bookkeeping is inconsistent, which indicates a bug
    /// in this crate rather than bad input.
    pub fn generate<'a, P>(
        &'a self,
        outputs: &[Symbolic<B>],
        policy: &P,
        names: &'a dyn VariableNameGenerator,
    ) -> Result<GenerationData<'a, B>>
    where
        P: MaterializationPolicy<B> + ?Sized,
    {
        let requested = outputs
            .iter()
            .map(|o| self.own_argument(o))
            .collect::<Result<Vec<_>>>()?;

        let start = Instant::now();
        let final_outputs = {
            let mut guard = borrow_graph(&self.graph)?;
            let graph: &mut Graph<B> = &mut guard;

            graph.begin_generation();
            schedule::assign_ids(graph, &requested);
            schedule::mark_references(graph, &requested);
            let order = schedule::Scheduler::new(&mut *graph, policy).run(&requested);
            log::trace!("scheduled {} operations", order.len());
            graph.state.variable_order = order;

            let final_outputs = if self.settings.optimize {
                optimize::optimize(graph, &requested)
            } else {
                requested
            };
            if self.settings.reuse_ids {
                slots::reuse_slots(graph);
            }
            final_outputs
        };

        let data = GenerationData::new(self.graph.borrow(), final_outputs, names);
        if self.settings.verbose {
            log::debug!(
                "generation of {} outputs: {} operations, {} temporaries in {:?}",
                outputs.len(),
                data.variable_order().len(),
                data.temporary_count(),
                start.elapsed()
            );
        }
        Ok(data)
    }

    /// Generate and render `outputs` with `language`
    pub fn generate_code<L>(
        &self,
        outputs: &[Symbolic<B>],
        language: &L,
        names: &dyn VariableNameGenerator,
        job_name: &str,
    ) -> Result<String>
    where
        L: Language<B> + ?Sized,
    {
        let start = Instant::now();
        log::debug!("generating source for '{job_name}'");

        let data = self.generate(outputs, language, names)?;
        let mut source = String::new();
        language.generate_source_code(&mut source, &data)?;

        if self.settings.verbose {
            log::debug!(
                "source for '{job_name}' generated in {:?} ({} bytes)",
                start.elapsed(),
                source.len()
            );
        } else {
            log::debug!("source for '{job_name}' generated");
        }
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{CLanguage, DefaultNameGenerator, DefaultPolicy};

    #[test]
    fn test_settings_builder() {
        let handler = CodeHandler::<f64>::with_capacity(8)
            .with_optimize(false)
            .with_verbose(true);
        assert!(!handler.is_optimize());
        assert!(handler.is_reuse_ids());
        assert!(handler.is_verbose());

        let mut handler = CodeHandler::<f64>::new();
        handler.set_reuse_ids(false);
        assert_eq!(
            handler.settings(),
            HandlerSettings {
                optimize: true,
                reuse_ids: false,
                verbose: false
            }
        );
    }

    #[test]
    fn test_independent_index() {
        let handler = CodeHandler::<f64>::new();
        let u = handler.make_variables(3);
        assert_eq!(handler.independent_index(&u[2]), Ok(2));
        assert_eq!(handler.independent_count(), 3);

        let other = CodeHandler::<f64>::new();
        let w = other.make_variable();
        assert_eq!(handler.independent_index(&w), Err(CodeGenError::CrossGraph));
        assert_eq!(
            handler.independent_index(&Symbolic::Parameter(1.0)),
            Err(CodeGenError::NotIndependent)
        );
    }

    #[test]
    fn test_bundle_blocks_graph_mutation() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let y = x.sin();
        let names = DefaultNameGenerator::default();

        let data = handler.generate(&[y.clone()], &DefaultPolicy, &names).unwrap();
        assert_eq!(x.try_unary(crate::core::OpCode::Cos), Err(CodeGenError::GraphInUse));
        assert!(handler.try_make_variable().is_err());
        assert!(handler.generate(&[y.clone()], &DefaultPolicy, &names).is_err());
        drop(data);

        assert!(handler.generate(&[y], &DefaultPolicy, &names).is_ok());
    }

    #[test]
    fn test_reset_invalidates_variables() {
        let mut handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        handler.reset();
        assert_eq!(handler.node_count(), 0);
        assert_eq!(x.try_unary(crate::core::OpCode::Exp), Err(CodeGenError::ForeignNode));

        let names = DefaultNameGenerator::default();
        let err = handler
            .generate_code(&[x], &CLanguage::default(), &names, "stale")
            .unwrap_err();
        assert_eq!(err, CodeGenError::ForeignNode);
    }

    #[test]
    fn test_foreign_outputs_rejected() {
        let h1 = CodeHandler::<f64>::new();
        let h2 = CodeHandler::<f64>::new();
        let y = h2.make_variable().exp();
        let names = DefaultNameGenerator::default();
        assert_eq!(
            h1.generate(&[y], &DefaultPolicy, &names).unwrap_err(),
            CodeGenError::CrossGraph
        );
    }
}
