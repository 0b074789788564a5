//! Flattening of associative add/sub and mul/div chains
//!
//! The pass builds a parallel set of nodes in the same arena; original nodes
//! are never modified. A sub-expression is spliced into its consumer's chain
//! only when it has no slot and a single reference, so sharing is preserved.

use rustc_hash::FxHashMap;

use crate::core::{Argument, ChainOp, Graph, Node, NodeId, OpCode};
use crate::traits::MathScalar;

/// The two associative families and their chain representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    AddSub,
    MulDiv,
}

impl Family {
    fn of(op: OpCode) -> Option<Self> {
        match op {
            OpCode::Add | OpCode::Sub | OpCode::AddSub => Some(Family::AddSub),
            OpCode::Mul | OpCode::Div | OpCode::MulDiv => Some(Family::MulDiv),
            _ => None,
        }
    }

    fn chain_op(self) -> OpCode {
        match self {
            Family::AddSub => OpCode::AddSub,
            Family::MulDiv => OpCode::MulDiv,
        }
    }

    /// Tag of the leading chain element
    fn leading(self) -> ChainOp {
        match self {
            Family::AddSub => ChainOp::Add,
            Family::MulDiv => ChainOp::Mul,
        }
    }
}

struct Optimizer<'a, B> {
    graph: &'a mut Graph<B>,
    memo: FxHashMap<NodeId, Argument<B>>,
}

/// Optimize the sub-graph scheduled by the last pass.
///
/// Fills `variable_order_opt` and the original-to-optimized map, and
/// returns the outputs remapped into the optimized graph.
pub(crate) fn optimize<B: MathScalar>(
    graph: &mut Graph<B>,
    outputs: &[Argument<B>],
) -> Vec<Argument<B>> {
    let order = graph.state.variable_order.clone();
    let mut optimizer = Optimizer {
        graph,
        memo: FxHashMap::default(),
    };

    for id in outputs.iter().filter_map(Argument::node) {
        optimizer.optimize_from(id);
    }

    let remapped: Vec<Argument<B>> = outputs.iter().map(|&a| optimizer.map_arg(a)).collect();
    let order_opt: Vec<NodeId> = order
        .iter()
        .filter_map(|&id| optimizer.map_arg(Argument::Node(id)).node())
        .collect();
    debug_assert_eq!(order_opt.len(), order.len());

    let Optimizer { graph, memo } = optimizer;
    graph.state.regular_to_opt = memo
        .into_iter()
        .filter_map(|(orig, opt)| opt.node().map(|n| (orig, n)))
        .collect();
    graph.state.variable_order_opt = order_opt;
    graph.state.optimized = true;
    remapped
}

impl<B: MathScalar> Optimizer<'_, B> {
    fn map_arg(&self, arg: Argument<B>) -> Argument<B> {
        match arg {
            Argument::Param(_) => arg,
            Argument::Node(id) => {
                debug_assert!(self.memo.contains_key(&id), "argument optimized out of order");
                self.memo.get(&id).copied().unwrap_or(arg)
            }
        }
    }

    /// Post-order over everything reachable from `root`, memoized by original node
    fn optimize_from(&mut self, root: NodeId) {
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if self.memo.contains_key(&id) {
                continue;
            }
            let node = &self.graph[id];
            if node.op == OpCode::Inv {
                self.memo.insert(id, Argument::Node(id));
                continue;
            }
            if !expanded {
                stack.push((id, true));
                stack.extend(
                    node.args
                        .iter()
                        .rev()
                        .filter_map(Argument::node)
                        .filter(|child| !self.memo.contains_key(child))
                        .map(|child| (child, false)),
                );
                continue;
            }
            let result = self.build(id);
            self.memo.insert(id, result);
        }
    }

    /// A value with a single consumer and no slot, possibly behind inline aliases
    fn is_exclusive(&self, arg: Argument<B>) -> bool {
        let mut current = arg;
        loop {
            let Argument::Node(id) = current else {
                return false;
            };
            let node = &self.graph[id];
            if node.total_refs > 1 || node.slot != 0 {
                return false;
            }
            if node.op != OpCode::Alias {
                return true;
            }
            current = node.args[0];
        }
    }

    /// The optimized node behind `arg` if it can absorb more operands of `family`
    fn spliceable(&self, orig: Argument<B>, opt: Argument<B>, family: Family) -> Option<NodeId> {
        let id = opt.node()?;
        (self.is_exclusive(orig) && Family::of(self.graph[id].op) == Some(family)).then_some(id)
    }

    /// Rewrite a binary optimized node as a two element chain
    fn make_chain(&mut self, id: NodeId, family: Family) {
        let node = &mut self.graph[id];
        if node.op.is_chain() {
            return;
        }
        if let Some(tag) = ChainOp::from_binary(node.op) {
            node.chain = vec![family.leading(), tag];
            node.op = family.chain_op();
        }
    }

    fn build(&mut self, id: NodeId) -> Argument<B> {
        let orig = self.graph[id].clone();
        let args: Vec<Argument<B>> = orig.args.iter().map(|&a| self.map_arg(a)).collect();

        match orig.op {
            // inline aliases disappear, consumers see the target directly
            OpCode::Alias if orig.slot == 0 => args[0],
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                self.build_chain(&orig, args[0], args[1])
            }
            op => {
                let node = Node::derived(op, args, orig.chain.clone(), &orig);
                Argument::Node(self.graph.add_optimized(node))
            }
        }
    }

    fn build_chain(&mut self, orig: &Node<B>, left: Argument<B>, right: Argument<B>) -> Argument<B> {
        let op = orig.op;
        let Some(family) = Family::of(op) else {
            unreachable!("{op} is not associative");
        };
        let Some(tag) = ChainOp::from_binary(op) else {
            unreachable!("{op} is not a binary chain operation");
        };
        let inverts = matches!(op, OpCode::Sub | OpCode::Div);

        let left_chain = self.spliceable(orig.args[0], left, family);
        let right_chain = self.spliceable(orig.args[1], right, family);

        if let Some(lc) = left_chain {
            self.make_chain(lc, family);
            if let Some(rc) = right_chain {
                self.make_chain(rc, family);
                let absorbed = self.graph[rc].clone();
                let chain = &mut self.graph[lc];
                chain.args.extend(absorbed.args);
                chain
                    .chain
                    .extend(absorbed.chain.iter().map(|&t| if inverts { t.flip() } else { t }));
            } else {
                let chain = &mut self.graph[lc];
                chain.args.push(right);
                chain.chain.push(tag);
            }
            self.graph[lc].clone_info(orig);
            log::trace!("spliced {op} into left {} chain", family.chain_op());
            Argument::Node(lc)
        } else if let Some(rc) = right_chain {
            self.make_chain(rc, family);
            let chain = &mut self.graph[rc];
            if inverts {
                for t in &mut chain.chain {
                    *t = t.flip();
                }
            }
            chain.args.insert(0, left);
            chain.chain.insert(0, family.leading());
            chain.clone_info(orig);
            log::trace!("spliced {op} into right {} chain", family.chain_op());
            Argument::Node(rc)
        } else {
            let node = Node::derived(op, vec![left, right], Vec::new(), orig);
            Argument::Node(self.graph.add_optimized(node))
        }
    }
}
