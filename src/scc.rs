//! Decomposition of a directed graph into strongly connected components.
//!
//! The interface is closure-based: callers hand in the ground set of vertices
//! and a successor function, so the same code serves whole automata, the
//! powerset automaton, and the edge-restricted subgraphs of priority
//! minimization.

use crate::math::{OrderedMap, OrderedSet};
use crate::StateId;

/// An SCC decomposition. `sccs` lists the components in topological order of
/// the component DAG (a component comes before every component reachable from
/// it); each component holds its states in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SccDecomposition {
    /// The components, topologically ordered.
    pub sccs: Vec<Vec<StateId>>,
    scc_of: OrderedMap<StateId, usize>,
}

impl SccDecomposition {
    /// Number of components.
    pub fn num_sccs(&self) -> usize {
        self.sccs.len()
    }

    /// Index of the component containing `state`.
    ///
    /// # Panics
    /// Panics if `state` was not part of the decomposed vertex set.
    pub fn scc_of(&self, state: StateId) -> usize {
        self.scc_of[&state]
    }

    /// Whether `state` was part of the decomposed vertex set.
    pub fn contains(&self, state: StateId) -> bool {
        self.scc_of.contains_key(&state)
    }

    /// The states of component `idx`, ascending.
    pub fn states_of(&self, idx: usize) -> &[StateId] {
        &self.sccs[idx]
    }

    /// Indices of the components directly reachable from component `idx`,
    /// excluding `idx` itself.
    pub fn succ_sccs(
        &self,
        mut succ: impl FnMut(StateId) -> Vec<StateId>,
        idx: usize,
    ) -> OrderedSet<usize> {
        let mut out = OrderedSet::new();
        for &st in &self.sccs[idx] {
            for q in succ(st) {
                if let Some(&other) = self.scc_of.get(&q) {
                    if other != idx {
                        out.insert(other);
                    }
                }
            }
        }
        out
    }
}

/// Computes the strongly connected components of the graph spanned by
/// `states` under `succ`, using an iterative formulation of Tarjan's
/// algorithm. Successors outside the ground set are ignored.
pub fn get_sccs(
    states: impl IntoIterator<Item = StateId>,
    mut succ: impl FnMut(StateId) -> Vec<StateId>,
) -> SccDecomposition {
    let ground: OrderedSet<StateId> = states.into_iter().collect();
    let restricted = |v: StateId, succ: &mut dyn FnMut(StateId) -> Vec<StateId>| {
        succ(v)
            .into_iter()
            .filter(|q| ground.contains(q))
            .collect::<Vec<_>>()
    };

    let mut index_of: OrderedMap<StateId, usize> = OrderedMap::new();
    let mut low: OrderedMap<StateId, usize> = OrderedMap::new();
    let mut stack: Vec<StateId> = vec![];
    let mut on_stack: OrderedSet<StateId> = OrderedSet::new();
    let mut next_index = 0usize;
    // Tarjan pops components bottom-up, i.e. in reverse topological order
    let mut popped: Vec<Vec<StateId>> = vec![];

    for &root in &ground {
        if index_of.contains_key(&root) {
            continue;
        }
        let mut call: Vec<(StateId, Vec<StateId>, usize)> =
            vec![(root, restricted(root, &mut succ), 0)];
        index_of.insert(root, next_index);
        low.insert(root, next_index);
        next_index += 1;
        stack.push(root);
        on_stack.insert(root);

        'frames: while let Some((v, sucs, mut pos)) = call.pop() {
            while pos < sucs.len() {
                let w = sucs[pos];
                pos += 1;
                if !index_of.contains_key(&w) {
                    index_of.insert(w, next_index);
                    low.insert(w, next_index);
                    next_index += 1;
                    stack.push(w);
                    on_stack.insert(w);
                    let w_sucs = restricted(w, &mut succ);
                    call.push((v, sucs, pos));
                    call.push((w, w_sucs, 0));
                    continue 'frames;
                }
                if on_stack.contains(&w) {
                    let back = index_of[&w];
                    let lv = low.get_mut(&v).unwrap();
                    *lv = (*lv).min(back);
                }
            }
            // all successors of v handled
            if low[&v] == index_of[&v] {
                let mut comp = vec![];
                loop {
                    let w = stack.pop().unwrap();
                    on_stack.remove(&w);
                    comp.push(w);
                    if w == v {
                        break;
                    }
                }
                comp.sort_unstable();
                popped.push(comp);
            }
            if let Some((parent, _, _)) = call.last() {
                let lv = low[&v];
                let lp = low.get_mut(parent).unwrap();
                *lp = (*lp).min(lv);
            }
        }
    }

    popped.reverse();
    let mut scc_of = OrderedMap::new();
    for (idx, comp) in popped.iter().enumerate() {
        for &st in comp {
            scc_of.insert(st, idx);
        }
    }
    SccDecomposition {
        sccs: popped,
        scc_of,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::OrderedMap;

    fn graph(edges: &[(StateId, StateId)]) -> OrderedMap<StateId, Vec<StateId>> {
        let mut adj: OrderedMap<StateId, Vec<StateId>> = OrderedMap::new();
        for &(p, q) in edges {
            adj.entry(p).or_default().push(q);
            adj.entry(q).or_default();
        }
        adj
    }

    #[test]
    fn decomposes_and_orders_topologically() {
        // 0 -> 1 -> {2,3} cycle, 1 self loop
        let adj = graph(&[(0, 1), (1, 1), (1, 2), (2, 3), (3, 2)]);
        let sccs = get_sccs(adj.keys().copied(), |v| adj[&v].clone());

        assert_eq!(sccs.num_sccs(), 3);
        assert_eq!(sccs.sccs, vec![vec![0], vec![1], vec![2, 3]]);
        assert_eq!(sccs.scc_of(3), 2);

        // topological: every edge goes to an equal or later component
        for (&p, qs) in &adj {
            for &q in qs {
                assert!(sccs.scc_of(p) <= sccs.scc_of(q));
            }
        }
    }

    #[test]
    fn successor_components() {
        let adj = graph(&[(0, 1), (0, 2), (1, 1), (2, 2)]);
        let sccs = get_sccs(adj.keys().copied(), |v| adj[&v].clone());
        let of0 = sccs.scc_of(0);
        let succs = sccs.succ_sccs(|v| adj[&v].clone(), of0);
        assert_eq!(succs.len(), 2);
        assert!(sccs.succ_sccs(|v| adj[&v].clone(), sccs.scc_of(1)).is_empty());
    }

    #[test]
    fn ignores_foreign_successors() {
        let adj = graph(&[(0, 1), (1, 0), (1, 9)]);
        // restrict the ground set to {0, 1}; the edge to 9 is ignored
        let sccs = get_sccs([0, 1], |v| adj[&v].clone());
        assert_eq!(sccs.num_sccs(), 1);
        assert_eq!(sccs.states_of(0), &[0, 1]);
        assert!(!sccs.contains(9));
    }

    #[test]
    fn big_cycle_is_one_component() {
        let n = 500;
        let sccs = get_sccs(0..n, |v| vec![(v + 1) % n]);
        assert_eq!(sccs.num_sccs(), 1);
        assert_eq!(sccs.states_of(0).len(), n);
    }
}
