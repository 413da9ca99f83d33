//! Operations on the priorities of a colored parity automaton: mapping them
//! through a function, switching the condition type, complementation, and
//! compression to the least number of distinct priorities.

use crate::aut::Aut;
use crate::math::OrderedMap;
use crate::parity::{priority_transformer, ParityType};
use crate::partition::{ClassId, PartitionRefiner};
use crate::scc::get_sccs;
use crate::{Priority, StateId, Sym};

/// Maps every assigned priority slot of the colored automaton through `f`.
pub fn transform_priorities<T: Ord + Clone>(aut: &mut Aut<T>, f: impl Fn(Priority) -> Priority) {
    assert!(aut.is_colored());
    if aut.is_state_based() {
        let states: Vec<StateId> = aut.states().collect();
        for s in states {
            let p = aut.state_priority(s).unwrap();
            aut.set_priority(s, Some(f(p)));
        }
    } else {
        for (p, x, q, pri) in aut.edges() {
            aut.modify_edge(p, x, q, Some(f(pri.unwrap())));
        }
    }
}

/// Switches the colored automaton to the parity condition type `to`,
/// translating all priorities so that the accepted language is unchanged.
pub fn change_parity_type<T: Ord + Clone>(aut: &mut Aut<T>, to: ParityType) {
    let (pmin, pmax) = aut.pri_bounds();
    let f = priority_transformer(aut.patype(), to, pmin, pmax);
    transform_priorities(aut, f);
    aut.set_patype(to);
}

/// Complements the colored parity automaton by shifting every priority,
/// keeping the condition type.
pub fn complement<T: Ord + Clone>(aut: &mut Aut<T>) {
    transform_priorities(aut, |p| p + 1);
}

/// Compresses the priorities of a colored transition-based parity automaton
/// to the least possible values without changing the accepted language or
/// the state count.
///
/// The automaton is translated to max-odd, then each SCC repeatedly sheds
/// its dominant priority: the remaining edges are compressed recursively and
/// the dominant edges get the least admissible priority above the result.
/// Edges on no cycle never decide a run and get priority zero.
pub fn minimize_priorities<T: Ord + Clone>(aut: &mut Aut<T>) {
    assert!(
        !aut.is_state_based(),
        "priority minimization works on transition-based automata"
    );
    assert!(aut.is_colored());
    let orig = aut.patype();
    let (pmin, pmax) = aut.pri_bounds();
    let to_max_odd = priority_transformer(orig, ParityType::MaxOdd, pmin, pmax);

    let edges: Vec<(StateId, Sym, StateId, Priority)> = aut
        .edges()
        .into_iter()
        .map(|(p, x, q, pri)| (p, x, q, to_max_odd(pri.unwrap())))
        .collect();
    let mut assigned: Vec<Option<Priority>> = vec![None; edges.len()];
    if !edges.is_empty() {
        let mut refiner = PartitionRefiner::new(vec![(0..edges.len()).collect()]);
        shrink(&edges, &mut refiner, 0, &mut assigned);
    }
    for (idx, &(p, x, q, _)) in edges.iter().enumerate() {
        let pri = assigned[idx].expect("every edge gets a priority");
        aut.modify_edge(p, x, q, Some(pri));
    }
    aut.set_patype(ParityType::MaxOdd);
    change_parity_type(aut, orig);
}

/// Assigns minimal max-odd priorities to the edges of `class` and returns
/// the largest value it used.
fn shrink(
    edges: &[(StateId, Sym, StateId, Priority)],
    refiner: &mut PartitionRefiner<usize>,
    class: ClassId,
    assigned: &mut [Option<Priority>],
) -> Priority {
    if refiner.size_of(class) == 0 {
        return 0;
    }
    let members = refiner.elements_of(class);

    let mut adj: OrderedMap<StateId, Vec<StateId>> = OrderedMap::new();
    for &e in &members {
        let (p, _, q, _) = edges[e];
        adj.entry(p).or_default().push(q);
        adj.entry(q).or_default();
    }
    let sccs = get_sccs(adj.keys().copied(), |v| adj[&v].clone());
    let intra = |e: usize| {
        let (p, _, q, _) = edges[e];
        sccs.scc_of(p) == sccs.scc_of(q)
    };

    // edges between components lie on no cycle of this subgraph
    if members.iter().all(|&e| !intra(e)) {
        for &e in &members {
            assigned[e] = Some(0);
        }
        return 0;
    }
    if let Some(cross) = refiner.separate(class, |&e| !intra(e)) {
        for e in refiner.elements_of(cross) {
            assigned[e] = Some(0);
        }
    }

    // handle every component on its own
    let intra_members = refiner.elements_of(class);
    let mut present: Vec<usize> = intra_members
        .iter()
        .map(|&e| sccs.scc_of(edges[e].0))
        .collect();
    present.sort_unstable();
    present.dedup();
    let mut component_classes: Vec<ClassId> = vec![];
    let mut remaining = class;
    for &sc in &present[..present.len() - 1] {
        let split = refiner
            .separate(remaining, |&e| sccs.scc_of(edges[e].0) == sc)
            .expect("every listed component has edges");
        component_classes.push(split);
    }
    component_classes.push(remaining);

    let mut top = 0;
    for cls in component_classes {
        let m = refiner
            .elements_of(cls)
            .iter()
            .map(|&e| edges[e].3)
            .max()
            .unwrap();
        // shed the dominant priority, compress the remainder first
        let (dominant, below) = match refiner.separate(cls, |&e| edges[e].3 == m) {
            Some(dom) => (dom, shrink(edges, refiner, cls, assigned)),
            None => (cls, 0),
        };
        let v = if below % 2 == m % 2 { below } else { below + 1 };
        for e in refiner.elements_of(dominant) {
            assigned[e] = Some(v);
        }
        top = top.max(v);
    }
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parity::good_priority;

    fn two_state_dpa() -> Aut<u32> {
        // accepts words with infinitely many 1-symbols
        let mut aut = Aut::new(false, "dpa", vec!["a".to_string()], 0);
        aut.add_state(1);
        aut.add_edge(0, 0, 0, Some(3));
        aut.add_edge(0, 1, 1, Some(2));
        aut.add_edge(1, 0, 0, Some(3));
        aut.add_edge(1, 1, 1, Some(2));
        aut
    }

    #[test]
    fn transform_keeps_multiset_coherent() {
        let mut aut = two_state_dpa();
        transform_priorities(&mut aut, |p| p + 4);
        assert_eq!(aut.pris(), vec![6, 7]);
        assert_eq!(aut.prio_count(6), 2);
        assert_eq!(aut.prio_count(7), 2);
    }

    #[test]
    fn change_type_round_trips() {
        let mut aut: Aut<u32> = Aut::new(false, "rt", vec!["a".to_string()], 0);
        aut.add_state(1);
        aut.add_edge(0, 0, 0, Some(1));
        aut.add_edge(0, 1, 1, Some(0));
        aut.add_edge(1, 0, 0, Some(1));
        aut.add_edge(1, 1, 1, Some(0));
        let before = aut.edges();

        change_parity_type(&mut aut, ParityType::MaxOdd);
        assert_eq!(aut.patype(), ParityType::MaxOdd);
        // goodness of each edge is preserved
        assert!(good_priority(ParityType::MaxOdd, aut.edge_priority(0, 1, 1).unwrap()));
        assert!(!good_priority(ParityType::MaxOdd, aut.edge_priority(0, 0, 0).unwrap()));
        change_parity_type(&mut aut, ParityType::MinEven);
        assert_eq!(aut.edges(), before);
    }

    #[test]
    fn complement_flips_goodness() {
        let mut aut = two_state_dpa();
        complement(&mut aut);
        assert!(!good_priority(aut.patype(), aut.edge_priority(0, 1, 1).unwrap()));
        assert!(good_priority(aut.patype(), aut.edge_priority(0, 0, 0).unwrap()));
    }

    #[test]
    fn minimization_compresses_to_two_priorities() {
        let mut aut = two_state_dpa();
        minimize_priorities(&mut aut);
        assert_eq!(aut.patype(), ParityType::MinEven);
        assert_eq!(aut.pris(), vec![0, 1]);
        // the good/bad split of the edges is unchanged
        assert_eq!(aut.edge_priority(0, 1, 1), Some(0));
        assert_eq!(aut.edge_priority(1, 1, 1), Some(0));
        assert_eq!(aut.edge_priority(0, 0, 0), Some(1));
        assert_eq!(aut.edge_priority(1, 0, 0), Some(1));
    }

    #[test]
    fn minimization_zeroes_transient_edges() {
        let mut aut: Aut<u32> = Aut::new(false, "t", vec!["a".to_string()], 0);
        aut.add_state(1);
        aut.add_edge(0, 0, 0, Some(4));
        aut.add_edge(0, 1, 1, Some(5));
        aut.add_edge(1, 0, 1, Some(2));
        aut.add_edge(1, 1, 1, Some(2));
        minimize_priorities(&mut aut);

        // both loops keep their goodness with the least values, the
        // transient edge joins the weakest class
        assert!(good_priority(ParityType::MinEven, aut.edge_priority(0, 0, 0).unwrap()));
        assert!(good_priority(ParityType::MinEven, aut.edge_priority(1, 0, 1).unwrap()));
        assert!(good_priority(ParityType::MinEven, aut.edge_priority(1, 1, 1).unwrap()));
        let used = aut.pris();
        assert!(used.len() <= 2);
    }
}


