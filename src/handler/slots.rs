//! Temporary slot reuse
//!
//! Liveness is measured in evaluation ranks. A temporary computed at rank
//! `p` whose last consumer runs at rank `L` occupies its slot over `[p, L]`
//! and the slot can be handed out again from rank `L + 1`. Freed slots are
//! reused most-recently-freed first.

use rustc_hash::FxHashSet;

use crate::core::{Argument, Graph, NodeId};
use crate::traits::MathScalar;

/// Slots chosen for one schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SlotPlan {
    /// Slot per rank, `None` for entries that are not temporaries
    pub(crate) slots: Vec<Option<usize>>,
    /// Highest id in use after the plan
    pub(crate) max_id: usize,
}

/// Plan slot ids for a schedule.
///
/// `last_uses[p]` describes the instruction at rank `p + 1`: `Some(L)` for a
/// temporary whose last consumer runs at rank `L`, `None` otherwise. New ids
/// are issued from `min_temporary_id` upwards.
pub(crate) fn plan_slots(last_uses: &[Option<usize>], min_temporary_id: usize) -> SlotPlan {
    let n = last_uses.len();
    let mut releases: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
    let mut free: Vec<usize> = Vec::new();
    let mut next = min_temporary_id.saturating_sub(1);
    let mut slots = Vec::with_capacity(n);

    for (pos, last_use) in last_uses.iter().enumerate() {
        let rank = pos + 1;
        free.append(&mut releases[rank - 1]);

        let Some(last_use) = *last_use else {
            slots.push(None);
            continue;
        };
        let slot = if let Some(reused) = free.pop() {
            log::trace!("rank {rank} reuses slot {reused}");
            reused
        } else {
            next += 1;
            next
        };
        releases[last_use.clamp(rank, n)].push(slot);
        slots.push(Some(slot));
    }

    SlotPlan {
        slots,
        max_id: next,
    }
}

/// Record, for every materialized node, the rank of its last consumer.
///
/// Inlined arguments are looked through: a value read inside an inlined
/// expression is used by the instruction that evaluates that expression.
pub(crate) fn compute_liveness<B: MathScalar>(graph: &mut Graph<B>, order: &[NodeId]) {
    let mut stack: Vec<NodeId> = Vec::new();
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();

    for (pos, &consumer) in order.iter().enumerate() {
        let rank = pos + 1;
        visited.clear();
        stack.extend(graph[consumer].args.iter().filter_map(Argument::node));

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let node = &mut graph[id];
            if node.slot != 0 {
                node.last_use_rank = node.last_use_rank.max(rank);
            } else {
                stack.extend(node.args.iter().filter_map(Argument::node));
            }
        }
    }
}

/// Reassign temporary ids along the final evaluation order
pub(crate) fn reuse_slots<B: MathScalar>(graph: &mut Graph<B>) {
    let order = graph.variable_order().to_vec();
    compute_liveness(graph, &order);

    let min = graph.min_temporary_id();
    let last_uses: Vec<Option<usize>> = order
        .iter()
        .map(|&id| {
            let node = &graph[id];
            (node.slot >= min).then_some(node.last_use_rank)
        })
        .collect();

    let plan = plan_slots(&last_uses, min);
    for (&id, slot) in order.iter().zip(&plan.slots) {
        if let Some(slot) = *slot {
            graph[id].slot = slot;
        }
    }
    log::trace!(
        "{} temporaries share {} slots",
        plan.slots.iter().flatten().count(),
        (plan.max_id + 1).saturating_sub(min)
    );
    graph.state.id_count = plan.max_id;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_lifetimes_share_one_slot() {
        // temporaries at ranks 1, 3 and 5, each read by the next instruction
        let plan = plan_slots(&[Some(2), None, Some(4), None, Some(5)], 10);
        assert_eq!(plan.slots, vec![Some(10), None, Some(10), None, Some(10)]);
        assert_eq!(plan.max_id, 10);
    }

    #[test]
    fn test_overlap_forces_new_slot_and_reuse_is_lifo() {
        let plan = plan_slots(&[Some(4), Some(4), Some(5), None, Some(5)], 3);
        assert_eq!(plan.slots[..3], [Some(3), Some(4), Some(5)]);
        // slots 3 and 4 are released after rank 4; 4 was freed last
        assert_eq!(plan.slots[4], Some(4));
        assert_eq!(plan.max_id, 5);
    }

    #[test]
    fn test_slot_not_reused_at_its_last_use() {
        // rank 2 consumes rank 1 and is itself a temporary
        let plan = plan_slots(&[Some(2), Some(3), None], 1);
        assert_eq!(plan.slots, vec![Some(1), Some(2), None]);
    }

    #[test]
    fn test_no_temporaries() {
        let plan = plan_slots(&[None, None], 4);
        assert_eq!(plan.slots, vec![None, None]);
        assert_eq!(plan.max_id, 3);
    }

    #[test]
    fn test_plans_never_share_live_slots() {
        fn prop(raw: Vec<(bool, u8)>) -> bool {
            let n = raw.len();
            let last_uses: Vec<Option<usize>> = raw
                .iter()
                .enumerate()
                .map(|(p, &(temp, span))| temp.then(|| (p + 1 + span as usize % 4).min(n)))
                .collect();
            let plan = plan_slots(&last_uses, 1);
            for i in 0..n {
                for j in (i + 1)..n {
                    let (Some(a), Some(b)) = (plan.slots[i], plan.slots[j]) else {
                        continue;
                    };
                    let end_i = last_uses[i].unwrap_or(i + 1);
                    // j starts at rank j + 1, inside i's interval
                    if a == b && j < end_i {
                        return false;
                    }
                }
            }
            true
        }
        quickcheck::QuickCheck::new()
            .tests(300)
            .quickcheck(prop as fn(Vec<(bool, u8)>) -> bool);
    }
}
