//! Symbolic values and construction-time algebra
//!
//! A [`Symbolic`] is either a compile-time constant (`Parameter`) or a handle
//! to a node recorded by a [`CodeHandler`](crate::CodeHandler) (`Variable`).
//! Arithmetic on parameters folds immediately; trivial identities such as
//! `x + 0` or `x * 1` return the other operand without allocating a node.
//!
//! # Example
//! ```
//! use symb_codegen::{CodeHandler, Symbolic};
//!
//! let handler = CodeHandler::<f64>::new();
//! let x = handler.make_variable();
//!
//! let same = &x * 1.0;
//! assert_eq!(same, x);
//! assert_eq!(handler.node_count(), 1);
//!
//! let zero = &x * 0.0;
//! assert_eq!(zero, Symbolic::Parameter(0.0));
//! ```

mod math_methods;
mod operators;

use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::rules::{self, Shortcut};
use crate::core::{Argument, CompareOp, Graph, NodeId, OpCode};
use crate::error::{CodeGenError, Result};
use crate::traits::{MathScalar, is_identical_equal, is_identical_one, is_identical_zero};

pub(crate) type SharedGraph<B> = Rc<RefCell<Graph<B>>>;

/// Handle to a node owned by a handler.
///
/// The back-reference is weak: it is used to check that combined variables
/// belong to the same handler and to register new nodes, never to keep the
/// handler alive.
#[derive(Clone)]
pub struct Variable<B> {
    pub(crate) node: NodeId,
    pub(crate) graph: Weak<RefCell<Graph<B>>>,
}

impl<B> Variable<B> {
    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    #[inline]
    pub(crate) fn same_graph(&self, other: &Variable<B>) -> bool {
        Weak::ptr_eq(&self.graph, &other.graph)
    }
}

impl<B> fmt::Debug for Variable<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Variable({:?})", self.node)
    }
}

/// A scalar recorded for code generation: a constant or a graph node
#[derive(Clone, Debug)]
pub enum Symbolic<B: MathScalar = f64> {
    Parameter(B),
    Variable(Variable<B>),
}

impl<B: MathScalar> From<B> for Symbolic<B> {
    fn from(value: B) -> Self {
        Symbolic::Parameter(value)
    }
}

impl<B: MathScalar> Default for Symbolic<B> {
    fn default() -> Self {
        Symbolic::Parameter(B::zero())
    }
}

impl<B: MathScalar> Symbolic<B> {
    pub(crate) fn from_node(node: NodeId, graph: &SharedGraph<B>) -> Self {
        Symbolic::Variable(Variable {
            node,
            graph: Rc::downgrade(graph),
        })
    }

    pub(crate) fn from_argument(arg: Argument<B>, graph: &SharedGraph<B>) -> Self {
        match arg {
            Argument::Param(v) => Symbolic::Parameter(v),
            Argument::Node(id) => Self::from_node(id, graph),
        }
    }

    #[inline]
    pub fn is_parameter(&self) -> bool {
        matches!(self, Symbolic::Parameter(_))
    }

    #[inline]
    pub fn is_variable(&self) -> bool {
        matches!(self, Symbolic::Variable(_))
    }

    /// The constant value of a parameter
    #[inline]
    pub fn parameter_value(&self) -> Option<B> {
        match self {
            Symbolic::Parameter(v) => Some(*v),
            Symbolic::Variable(_) => None,
        }
    }

    /// The node behind a variable
    #[inline]
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Symbolic::Parameter(_) => None,
            Symbolic::Variable(v) => Some(v.node),
        }
    }

    /// The argument edge this value contributes to a new node
    #[inline]
    pub fn argument(&self) -> Argument<B> {
        match self {
            Symbolic::Parameter(v) => Argument::Param(*v),
            Symbolic::Variable(v) => Argument::Node(v.node),
        }
    }

    /// A parameter that is exactly zero
    pub fn identical_zero(&self) -> bool {
        self.parameter_value().is_some_and(is_identical_zero)
    }

    /// A parameter that is exactly one
    pub fn identical_one(&self) -> bool {
        self.parameter_value().is_some_and(is_identical_one)
    }

    /// Two parameters holding the same value
    pub fn identical_equal_par(&self, other: &Symbolic<B>) -> bool {
        match (self, other) {
            (Symbolic::Parameter(a), Symbolic::Parameter(b)) => is_identical_equal(*a, *b),
            _ => false,
        }
    }

    /// Variables are never NaN at recording time
    pub fn is_nan(&self) -> bool {
        self.parameter_value().is_some_and(|v| v.is_nan())
    }

    /// Attach a display name to the node behind a variable
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let Symbolic::Variable(var) = self else {
            return Err(CodeGenError::unsupported("cannot name a parameter"));
        };
        let shared = upgrade(var)?;
        let mut graph = borrow_graph(&shared)?;
        let node = graph
            .node_mut(var.node)
            .ok_or(CodeGenError::ForeignNode)?;
        node.name = Some(name.into());
        Ok(())
    }

    /// Apply a binary operation, folding and shortcutting where possible.
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` when `op` is not a binary arithmetic opcode,
    /// `CrossGraph` when both operands are variables of different handlers,
    /// `HandlerDropped` / `ForeignNode` for stale variables.
    pub fn try_binary(&self, op: OpCode, rhs: &Symbolic<B>) -> Result<Symbolic<B>> {
        if !matches!(
            op,
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Pow
        ) {
            return Err(CodeGenError::unsupported(format!("{op} is not a binary operation")));
        }
        match rules::binary_shortcut(op, self.parameter_value(), rhs.parameter_value()) {
            Some(Shortcut::Value(v)) => Ok(Symbolic::Parameter(v)),
            Some(Shortcut::Left) => Ok(self.clone()),
            Some(Shortcut::Right) => Ok(rhs.clone()),
            None => record(&[self, rhs], op, vec![self.argument(), rhs.argument()]),
        }
    }

    /// Apply a unary operation, folding parameters
    ///
    /// # Errors
    ///
    /// `UnsupportedOperation` when `op` is neither a unary function nor
    /// negation, plus the stale-variable errors of [`Symbolic::try_binary`].
    pub fn try_unary(&self, op: OpCode) -> Result<Symbolic<B>> {
        if !op.is_unary_function() && op != OpCode::UnMinus {
            return Err(CodeGenError::unsupported(format!("{op} is not a unary operation")));
        }
        match self {
            Symbolic::Parameter(v) => Ok(Symbolic::Parameter(rules::fold_unary(op, *v))),
            Symbolic::Variable(_) => record(&[self], op, vec![self.argument()]),
        }
    }

    /// Conditional expression `left <cmp> right ? if_true : if_false`.
    ///
    /// When both sides of the comparison are parameters the branch is
    /// selected immediately.
    pub fn try_cond_exp(
        cmp: CompareOp,
        left: &Symbolic<B>,
        right: &Symbolic<B>,
        if_true: &Symbolic<B>,
        if_false: &Symbolic<B>,
    ) -> Result<Symbolic<B>> {
        if let (Some(l), Some(r)) = (left.parameter_value(), right.parameter_value()) {
            return Ok(if cmp.apply(l, r) {
                if_true.clone()
            } else {
                if_false.clone()
            });
        }
        let operands = [left, right, if_true, if_false];
        let args = operands.iter().map(|s| s.argument()).collect();
        record(&operands, cmp.opcode(), args)
    }

    fn compare(
        &self,
        other: &Symbolic<B>,
        op: &'static str,
        cmp: impl FnOnce(B, B) -> bool,
    ) -> Result<bool> {
        match (self, other) {
            (Symbolic::Parameter(a), Symbolic::Parameter(b)) => Ok(cmp(*a, *b)),
            _ => Err(CodeGenError::invalid_comparison(op)),
        }
    }

    /// `self < other`, defined for parameters only
    pub fn try_lt(&self, other: &Symbolic<B>) -> Result<bool> {
        self.compare(other, "<", |a, b| a < b)
    }

    /// `self <= other`, defined for parameters only
    pub fn try_le(&self, other: &Symbolic<B>) -> Result<bool> {
        self.compare(other, "<=", |a, b| a <= b)
    }

    /// `self > other`, defined for parameters only
    pub fn try_gt(&self, other: &Symbolic<B>) -> Result<bool> {
        self.compare(other, ">", |a, b| a > b)
    }

    /// `self >= other`, defined for parameters only
    pub fn try_ge(&self, other: &Symbolic<B>) -> Result<bool> {
        self.compare(other, ">=", |a, b| a >= b)
    }
}

/// Parameters compare by value, variables by node identity
impl<B: MathScalar> PartialEq for Symbolic<B> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Symbolic::Parameter(a), Symbolic::Parameter(b)) => a == b,
            (Symbolic::Variable(a), Symbolic::Variable(b)) => a.node == b.node && a.same_graph(b),
            _ => false,
        }
    }
}

fn upgrade<B>(var: &Variable<B>) -> Result<SharedGraph<B>> {
    var.graph.upgrade().ok_or(CodeGenError::HandlerDropped)
}

pub(crate) fn borrow_graph<B>(shared: &SharedGraph<B>) -> Result<RefMut<'_, Graph<B>>> {
    shared.try_borrow_mut().map_err(|_| CodeGenError::GraphInUse)
}

/// Find the single handler shared by every variable operand
fn common_graph<B: MathScalar>(operands: &[&Symbolic<B>]) -> Result<SharedGraph<B>> {
    let mut found: Option<&Variable<B>> = None;
    for operand in operands {
        if let Symbolic::Variable(var) = operand {
            match found {
                Some(first) if !first.same_graph(var) => return Err(CodeGenError::CrossGraph),
                Some(_) => {}
                None => found = Some(var),
            }
        }
    }
    let var = found.ok_or_else(|| CodeGenError::unsupported("no variable operand"))?;
    upgrade(var)
}

/// Register a node for `op` in the handler shared by `operands`
fn record<B: MathScalar>(
    operands: &[&Symbolic<B>],
    op: OpCode,
    args: Vec<Argument<B>>,
) -> Result<Symbolic<B>> {
    let shared = common_graph(operands)?;
    let id = {
        let mut graph = borrow_graph(&shared)?;
        if args
            .iter()
            .filter_map(Argument::node)
            .any(|id| !graph.contains(id))
        {
            return Err(CodeGenError::ForeignNode);
        }
        graph.add_node(op, args)
    };
    Ok(Symbolic::from_node(id, &shared))
}

/// Unwrap the result of an infallible-looking operator.
///
/// Combining variables from different handlers is a usage error that cannot
/// be recovered from, so the operator traits panic with the error message.
#[track_caller]
pub(crate) fn expect_recorded<B: MathScalar>(result: Result<Symbolic<B>>) -> Symbolic<B> {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CodeHandler;

    #[test]
    fn test_parameter_equality_by_value() {
        let a: Symbolic = 2.0.into();
        let b: Symbolic = Symbolic::Parameter(2.0);
        assert_eq!(a, b);
        assert_ne!(a, Symbolic::Parameter(3.0));
    }

    #[test]
    fn test_variable_equality_by_identity() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let a = &x + 1.0;
        let b = &x + 1.0;
        assert_eq!(a, a.clone());
        // structurally identical, separately built
        assert_ne!(a, b);
        assert_ne!(a, Symbolic::Parameter(1.0));
    }

    #[test]
    fn test_ordering_only_for_parameters() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let one: Symbolic = 1.0.into();
        let two: Symbolic = 2.0.into();

        assert_eq!(one.try_lt(&two), Ok(true));
        assert_eq!(two.try_le(&one), Ok(false));
        assert_eq!(two.try_ge(&two), Ok(true));
        assert_eq!(
            x.try_gt(&one),
            Err(CodeGenError::invalid_comparison(">"))
        );
        assert!(one.try_le(&x).is_err());
    }

    #[test]
    fn test_cross_graph_is_rejected() {
        let h1 = CodeHandler::<f64>::new();
        let h2 = CodeHandler::<f64>::new();
        let x = h1.make_variable();
        let y = h2.make_variable();
        assert_eq!(x.try_binary(OpCode::Add, &y), Err(CodeGenError::CrossGraph));
        // identity shortcuts never look at the handler
        assert_eq!(x.try_binary(OpCode::Mul, &Symbolic::Parameter(1.0)), Ok(x));
    }

    #[test]
    fn test_dropped_handler() {
        let x = {
            let handler = CodeHandler::<f64>::new();
            handler.make_variable()
        };
        assert_eq!(x.try_unary(OpCode::Sin), Err(CodeGenError::HandlerDropped));
    }

    #[test]
    fn test_mismatched_opcode_is_rejected() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let one = Symbolic::Parameter(1.0);
        let two = Symbolic::Parameter(2.0);

        for result in [
            one.try_unary(OpCode::Add),
            x.try_unary(OpCode::Mul),
            x.try_unary(OpCode::Alias),
            one.try_binary(OpCode::Sin, &two),
            x.try_binary(OpCode::Exp, &one),
            x.try_binary(OpCode::AddSub, &x),
        ] {
            assert!(matches!(result, Err(CodeGenError::UnsupportedOperation(_))));
        }
        // nothing was recorded besides the independent
        assert_eq!(handler.node_count(), 1);
        assert_eq!(
            one.try_unary(OpCode::UnMinus).unwrap().parameter_value(),
            Some(-1.0)
        );
    }

    #[test]
    fn test_cond_exp_selects_branch_for_parameters() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        let y = handler.make_variable();
        let one: Symbolic = 1.0.into();
        let two: Symbolic = 2.0.into();

        let picked = Symbolic::try_cond_exp(CompareOp::Lt, &one, &two, &x, &y).unwrap();
        assert_eq!(picked, x);
        assert_eq!(handler.node_count(), 2);

        let node = Symbolic::try_cond_exp(CompareOp::Lt, &one, &x, &x, &y).unwrap();
        assert!(node.is_variable());
        assert_eq!(handler.node_count(), 3);
    }

    #[test]
    fn test_set_name() {
        let handler = CodeHandler::<f64>::new();
        let x = handler.make_variable();
        x.set_name("temperature").unwrap();
        let graph = handler.graph();
        assert_eq!(graph[x.node_id().unwrap()].name(), Some("temperature"));
        assert!(Symbolic::Parameter(1.0).set_name("p").is_err());
    }

    #[test]
    fn test_is_nan() {
        let handler = CodeHandler::<f64>::new();
        assert!(!handler.make_variable().is_nan());
        assert!(Symbolic::Parameter(f64::NAN).is_nan());
    }
}
