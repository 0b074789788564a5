//! Local equation solving and independent-variable elimination

use rustc_hash::FxHashMap;

use super::CodeHandler;
use crate::core::{Argument, ChainOp, Graph, NodeId, OpCode};
use crate::error::{Result, SolveError};
use crate::symbolic::{Symbolic, borrow_graph};
use crate::traits::MathScalar;

/// Isolates one node of an expression assumed to equal zero
pub trait EquationSolver<B: MathScalar> {
    /// Build an expression equal to `target` given `residual == 0`.
    ///
    /// Implementations must not modify `graph` when they return an error.
    fn solve(
        &self,
        graph: &mut Graph<B>,
        residual: Argument<B>,
        target: NodeId,
    ) -> std::result::Result<Argument<B>, SolveError>;
}

/// Solver that inverts the operations found on the single path from the
/// residual down to the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSolver;

impl LocalSolver {
    fn is_invertible(op: OpCode) -> bool {
        matches!(
            op,
            OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::UnMinus
                | OpCode::Exp
                | OpCode::Log
                | OpCode::Sqrt
                | OpCode::Alias
                | OpCode::AddSub
                | OpCode::MulDiv
        )
    }

    /// Number of distinct paths from each node down to `target`, capped at two
    fn count_paths<B: MathScalar>(
        graph: &Graph<B>,
        root: NodeId,
        target: NodeId,
    ) -> FxHashMap<NodeId, u8> {
        let mut counts: FxHashMap<NodeId, u8> = FxHashMap::default();
        counts.insert(target, 1);

        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if counts.contains_key(&id) {
                continue;
            }
            let node = &graph[id];
            if !expanded {
                stack.push((id, true));
                stack.extend(
                    node.args
                        .iter()
                        .filter_map(Argument::node)
                        .filter(|child| !counts.contains_key(child))
                        .map(|child| (child, false)),
                );
                continue;
            }
            let total = node
                .args
                .iter()
                .filter_map(Argument::node)
                .map(|child| counts.get(&child).copied().unwrap_or(0))
                .fold(0_u8, |acc, c| acc.saturating_add(c).min(2));
            counts.insert(id, total);
        }
        counts
    }

    /// The chain of `(node, argument index)` leading from `root` to `target`
    fn find_path<B: MathScalar>(
        graph: &Graph<B>,
        root: NodeId,
        target: NodeId,
    ) -> std::result::Result<Vec<(NodeId, usize)>, SolveError> {
        let counts = Self::count_paths(graph, root, target);
        match counts.get(&root).copied().unwrap_or(0) {
            0 => return Err(SolveError::NotPresent),
            1 => {}
            _ => return Err(SolveError::MultipleOccurrences),
        }

        let mut path = Vec::new();
        let mut current = root;
        while current != target {
            let node = &graph[current];
            if !Self::is_invertible(node.op) {
                return Err(SolveError::Unsolvable(node.op));
            }
            let Some((index, next)) = node
                .node_args()
                .find(|(_, child)| counts.get(child).copied().unwrap_or(0) > 0)
            else {
                return Err(SolveError::NotPresent);
            };
            path.push((current, index));
            current = next;
        }
        Ok(path)
    }

    /// Signed sum of every chain operand except `skip`
    fn chain_rest<B: MathScalar>(
        graph: &mut Graph<B>,
        args: &[Argument<B>],
        tags: &[ChainOp],
        skip: usize,
    ) -> Argument<B> {
        let mut acc: Option<Argument<B>> = None;
        for (j, (&arg, &tag)) in args.iter().zip(tags).enumerate() {
            if j == skip {
                continue;
            }
            acc = Some(match (acc, tag) {
                (None, ChainOp::Add | ChainOp::Mul) => arg,
                (None, ChainOp::Sub) => graph.unary(OpCode::UnMinus, arg),
                (None, ChainOp::Div) => graph.binary(OpCode::Div, Argument::Param(B::one()), arg),
                (Some(prev), ChainOp::Add) => graph.binary(OpCode::Add, prev, arg),
                (Some(prev), ChainOp::Sub) => graph.binary(OpCode::Sub, prev, arg),
                (Some(prev), ChainOp::Mul) => graph.binary(OpCode::Mul, prev, arg),
                (Some(prev), ChainOp::Div) => graph.binary(OpCode::Div, prev, arg),
            });
        }
        acc.unwrap_or_else(|| match tags.first() {
            Some(ChainOp::Mul | ChainOp::Div) => Argument::Param(B::one()),
            _ => Argument::Param(B::zero()),
        })
    }

    /// Undo one operation: `rhs` is the value of the node, the result is the
    /// value its argument `index` must take.
    fn invert<B: MathScalar>(
        graph: &mut Graph<B>,
        id: NodeId,
        index: usize,
        rhs: Argument<B>,
    ) -> Argument<B> {
        let node = graph[id].clone();
        let args = &node.args;
        match node.op {
            OpCode::Add => graph.binary(OpCode::Sub, rhs, args[1 - index]),
            OpCode::Sub if index == 0 => graph.binary(OpCode::Add, rhs, args[1]),
            OpCode::Sub => graph.binary(OpCode::Sub, args[0], rhs),
            OpCode::Mul => graph.binary(OpCode::Div, rhs, args[1 - index]),
            OpCode::Div if index == 0 => graph.binary(OpCode::Mul, rhs, args[1]),
            OpCode::Div => graph.binary(OpCode::Div, args[0], rhs),
            OpCode::UnMinus => graph.unary(OpCode::UnMinus, rhs),
            OpCode::Exp => graph.unary(OpCode::Log, rhs),
            OpCode::Log => graph.unary(OpCode::Exp, rhs),
            OpCode::Sqrt => graph.binary(OpCode::Mul, rhs, rhs),
            OpCode::AddSub => {
                let rest = Self::chain_rest(graph, args, &node.chain, index);
                match node.chain[index] {
                    ChainOp::Sub => graph.binary(OpCode::Sub, rest, rhs),
                    _ => graph.binary(OpCode::Sub, rhs, rest),
                }
            }
            OpCode::MulDiv => {
                let rest = Self::chain_rest(graph, args, &node.chain, index);
                match node.chain[index] {
                    ChainOp::Div => graph.binary(OpCode::Div, rest, rhs),
                    _ => graph.binary(OpCode::Div, rhs, rest),
                }
            }
            // Alias, and anything validated as invertible
            _ => rhs,
        }
    }
}

impl<B: MathScalar> EquationSolver<B> for LocalSolver {
    fn solve(
        &self,
        graph: &mut Graph<B>,
        residual: Argument<B>,
        target: NodeId,
    ) -> std::result::Result<Argument<B>, SolveError> {
        let Argument::Node(root) = residual else {
            return Err(SolveError::NotPresent);
        };
        // nothing is created before the whole path is known to be invertible
        let path = Self::find_path(graph, root, target)?;

        let mut rhs = Argument::Param(B::zero());
        for (id, index) in path {
            rhs = Self::invert(graph, id, index, rhs);
        }
        Ok(rhs)
    }
}

impl<B: MathScalar> CodeHandler<B> {
    /// Solve `residual == 0` for `target` with the [`LocalSolver`]
    pub fn solve_for(&self, residual: &Symbolic<B>, target: &Symbolic<B>) -> Result<Symbolic<B>> {
        self.solve_for_with(&LocalSolver, residual, target)
    }

    /// Solve `residual == 0` for `target` with a custom solver
    pub fn solve_for_with<S>(
        &self,
        solver: &S,
        residual: &Symbolic<B>,
        target: &Symbolic<B>,
    ) -> Result<Symbolic<B>>
    where
        S: EquationSolver<B> + ?Sized,
    {
        let target = self.own_node(target)?;
        let residual = self.own_argument(residual)?;
        let mut graph = borrow_graph(&self.graph)?;
        let solved = solver.solve(&mut graph, residual, target)?;
        drop(graph);
        Ok(Symbolic::from_argument(solved, &self.graph))
    }

    /// Eliminate an independent variable using `residual == 0`.
    ///
    /// On success the independent becomes an alias of the solved expression
    /// and leaves the roster; the remaining independents keep their order.
    /// On failure the graph is left unmodified.
    pub fn substitute_independent(
        &self,
        independent: &Symbolic<B>,
        residual: &Symbolic<B>,
    ) -> Result<()> {
        self.substitute_independent_with(&LocalSolver, independent, residual)
    }

    /// [`substitute_independent`](Self::substitute_independent) with a custom solver
    pub fn substitute_independent_with<S>(
        &self,
        solver: &S,
        independent: &Symbolic<B>,
        residual: &Symbolic<B>,
    ) -> Result<()>
    where
        S: EquationSolver<B> + ?Sized,
    {
        let index = self.independent_index(independent)?;
        let target = self.own_node(independent)?;
        let residual = self.own_argument(residual)?;

        let mut graph = borrow_graph(&self.graph)?;
        let solved = solver.solve(&mut graph, residual, target)?;
        graph[target].make_alias(solved);
        graph.remove_independent(index);
        log::debug!(
            "eliminated independent {index}, {} independents left",
            graph.independents().len()
        );
        Ok(())
    }
}
