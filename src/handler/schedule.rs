//! Id assignment, reference marking and evaluation ordering
//!
//! All passes walk the graph with explicit work stacks so that long
//! expression chains do not overflow the call stack.

use rustc_hash::FxHashMap;

use crate::core::{Argument, Graph, NodeId, OpCode};
use crate::language::MaterializationPolicy;
use crate::traits::MathScalar;

/// Give ids `1..=k` to the independents and the next ids to outputs without one.
///
/// Records the first id available for temporaries.
pub(crate) fn assign_ids<B: MathScalar>(graph: &mut Graph<B>, outputs: &[Argument<B>]) {
    let roster = graph.independents().to_vec();
    for (i, &id) in roster.iter().enumerate() {
        graph[id].slot = i + 1;
    }

    let mut id_count = roster.len();
    for (index, output) in outputs.iter().enumerate() {
        let Some(id) = output.node() else { continue };
        if graph[id].slot == 0 {
            id_count += 1;
            graph[id].slot = id_count;
            graph.state.dependent_ids.insert(id_count, index);
        }
    }

    graph.state.id_count = id_count;
    graph.state.min_temporary_id = id_count + 1;
}

/// Count references inside the sub-graph reachable from `outputs`.
///
/// Every edge (and every output request) adds one reference; arguments are
/// only visited the first time a node is reached.
pub(crate) fn mark_references<B: MathScalar>(graph: &mut Graph<B>, outputs: &[Argument<B>]) {
    let mut stack: Vec<NodeId> = outputs.iter().filter_map(Argument::node).collect();
    while let Some(id) = stack.pop() {
        let node = &mut graph[id];
        node.total_refs += 1;
        if node.total_refs == 1 {
            stack.extend(node.args.iter().filter_map(Argument::node));
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    arg: usize,
    descended: bool,
}

/// Decides which nodes become standalone variables and in which order.
pub(crate) struct Scheduler<'a, B, P: ?Sized> {
    graph: &'a mut Graph<B>,
    policy: &'a P,
    /// Uses seen so far by this pass, doubles as the visited flag
    pending: FxHashMap<NodeId, usize>,
    queue: Vec<NodeId>,
}

impl<'a, B, P> Scheduler<'a, B, P>
where
    B: MathScalar,
    P: MaterializationPolicy<B> + ?Sized,
{
    pub(crate) fn new(graph: &'a mut Graph<B>, policy: &'a P) -> Self {
        Self {
            graph,
            policy,
            pending: FxHashMap::default(),
            queue: Vec::new(),
        }
    }

    /// Build the evaluation queue for `outputs`.
    ///
    /// # Panics
    ///
    /// When the number of issued ids does not match the queue plus the
    /// independents, which means the graph bookkeeping is corrupt.
    pub(crate) fn run(mut self, outputs: &[Argument<B>]) -> Vec<NodeId> {
        for id in outputs.iter().filter_map(Argument::node) {
            if self.pending_count(id) == 0 {
                self.visit(id);
            }
            self.add_use(id);
            let node = &self.graph[id];
            if node.op != OpCode::Inv && node.eval_rank == 0 {
                self.enqueue(id);
            }
        }

        assert_eq!(
            self.graph.state.id_count,
            self.queue.len() + self.graph.independents().len(),
            "mismatch between the number of issued ids and the scheduled operations"
        );
        self.queue
    }

    #[inline]
    fn pending_count(&self, id: NodeId) -> usize {
        self.pending.get(&id).copied().unwrap_or(0)
    }

    #[inline]
    fn add_use(&mut self, id: NodeId) {
        *self.pending.entry(id).or_insert(0) += 1;
    }

    /// Post-order walk: each argument is fully scheduled before the
    /// decision about the argument itself is taken.
    fn visit(&mut self, root: NodeId) {
        let mut stack = vec![Frame {
            node: root,
            arg: 0,
            descended: false,
        }];

        while let Some(&frame) = stack.last() {
            let top = stack.len() - 1;
            let Some(&edge) = self.graph[frame.node].args.get(frame.arg) else {
                stack.pop();
                continue;
            };
            let Argument::Node(child) = edge else {
                stack[top].arg += 1;
                continue;
            };

            if !frame.descended && self.pending_count(child) == 0 {
                stack[top].descended = true;
                stack.push(Frame {
                    node: child,
                    arg: 0,
                    descended: false,
                });
                continue;
            }

            stack[top].arg += 1;
            stack[top].descended = false;
            self.add_use(child);
            // the first consumer fixes whether the child is stored or inlined
            if self.pending_count(child) == 1 {
                self.check_variable_creation(frame.node, frame.arg, child);
            }
        }
    }

    fn check_variable_creation(&mut self, parent: NodeId, arg_index: usize, child: NodeId) {
        let op = self.graph[parent].op;
        let node = &self.graph[child];
        if node.op == OpCode::Inv || node.eval_rank != 0 {
            return;
        }
        // outputs already own an id and are stored there anyway
        if node.slot != 0
            || self.policy.creates_new_variable(node)
            || self.policy.requires_variable_argument(op, arg_index)
        {
            self.enqueue(child);
        }
    }

    fn enqueue(&mut self, id: NodeId) {
        self.queue.push(id);
        self.graph[id].eval_rank = self.queue.len();
        if self.graph[id].slot == 0 {
            self.graph.state.id_count += 1;
            let next = self.graph.state.id_count;
            self.graph[id].slot = next;
        }
    }
}
