//! Acceptance of ultimately periodic words `u v^ω`, both on nondeterministic
//! Büchi automata (does some run visit an accepting state infinitely often?)
//! and on deterministic parity automata (does the dominant priority of the
//! lasso satisfy the condition?).

use crate::aut::Aut;
use crate::math::{OrderedMap, OrderedSet};
use crate::parity::{good_priority, stronger_priority};
use crate::{Priority, StateId, Sym};

/// Whether the Büchi automaton accepts the word `prefix · cycle^ω`, i.e.
/// whether some run visits an accepting state infinitely often.
pub fn nba_accepts<T: Ord + Clone>(aut: &Aut<T>, prefix: &[Sym], cycle: &[Sym]) -> bool {
    assert!(aut.is_buchi());
    assert!(!cycle.is_empty());

    // states reachable on the prefix
    let mut cur: OrderedSet<StateId> = OrderedSet::from_iter([aut.init()]);
    for &x in prefix {
        cur = cur.iter().flat_map(|&p| aut.succ(p, x)).collect();
    }

    // product of the automaton with the cycle positions
    let step = |(p, i): (StateId, usize)| -> Vec<(StateId, usize)> {
        aut.succ(p, cycle[i])
            .into_iter()
            .map(|q| (q, (i + 1) % cycle.len()))
            .collect()
    };
    let mut reached: OrderedSet<(StateId, usize)> = OrderedSet::new();
    let mut queue: Vec<(StateId, usize)> = cur.iter().map(|&p| (p, 0)).collect();
    while let Some(node) = queue.pop() {
        if !reached.insert(node) {
            continue;
        }
        queue.extend(step(node));
    }

    // accepted iff some reachable accepting product node lies on a cycle
    for &node in &reached {
        if !aut.state_buchi_accepting(node.0) {
            continue;
        }
        let mut seen: OrderedSet<(StateId, usize)> = OrderedSet::new();
        let mut queue = step(node);
        while let Some(other) = queue.pop() {
            if other == node {
                return true;
            }
            if seen.insert(other) {
                queue.extend(step(other));
            }
        }
    }
    false
}

/// Whether the deterministic parity automaton accepts `prefix · cycle^ω`.
/// The automaton may be partial; a word that runs into a missing edge is
/// rejected. Works for both acceptance modes: in state-based mode the
/// priorities of the visited states count, otherwise those of the taken
/// edges.
pub fn dpa_accepts<T: Ord + Clone>(aut: &Aut<T>, prefix: &[Sym], cycle: &[Sym]) -> bool {
    assert!(aut.is_deterministic());
    assert!(!cycle.is_empty());

    let mut st = aut.init();
    for &x in prefix {
        match aut.succ(st, x).first() {
            Some(&q) => st = q,
            None => return false,
        }
    }

    // pump the cycle until a (state, position) pair repeats
    let mut first_visit: OrderedMap<(StateId, usize), usize> = OrderedMap::new();
    let mut trace: Vec<Option<Priority>> = vec![];
    let mut pos = 0;
    loop {
        if let Some(&start) = first_visit.get(&(st, pos)) {
            let dominant = trace[start..]
                .iter()
                .flatten()
                .copied()
                .reduce(|p, q| stronger_priority(aut.patype(), p, q));
            return dominant.is_some_and(|p| good_priority(aut.patype(), p));
        }
        first_visit.insert((st, pos), trace.len());

        let x = cycle[pos];
        let Some(&(q, epri)) = aut.succ_edges(st, x).first() else {
            return false;
        };
        trace.push(if aut.is_state_based() {
            aut.state_priority(q)
        } else {
            epri
        });
        st = q;
        pos = (pos + 1) % cycle.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// NBA for "infinitely many 1-symbols".
    fn inf_often() -> Aut<u32> {
        let mut aut = Aut::new(true, "io", vec!["a".to_string()], 0);
        aut.add_state(1);
        aut.set_priority(0, Some(1));
        aut.set_priority(1, Some(0));
        aut.add_edge(0, 0, 0, None);
        aut.add_edge(0, 1, 1, None);
        aut.add_edge(1, 0, 0, None);
        aut.add_edge(1, 1, 1, None);
        aut
    }

    /// NBA guessing the point from which only 1-symbols follow.
    fn ev_always() -> Aut<u32> {
        let mut aut = Aut::new(true, "ea", vec!["a".to_string()], 0);
        aut.add_state(1);
        aut.set_priority(1, Some(0));
        aut.add_edge(0, 0, 0, None);
        aut.add_edge(0, 1, 0, None);
        aut.add_edge(0, 1, 1, None);
        aut.add_edge(1, 1, 1, None);
        aut
    }

    #[test]
    fn buchi_acceptance_on_lassos() {
        let io = inf_often();
        assert!(nba_accepts(&io, &[], &[1]));
        assert!(nba_accepts(&io, &[0, 0], &[1, 0]));
        assert!(!nba_accepts(&io, &[1, 1], &[0]));

        let ea = ev_always();
        assert!(nba_accepts(&ea, &[], &[1]));
        assert!(nba_accepts(&ea, &[0, 1, 0], &[1]));
        assert!(!nba_accepts(&ea, &[], &[1, 0]));
        assert!(!nba_accepts(&ea, &[1], &[0]));
    }

    #[test]
    fn parity_acceptance_on_lassos() {
        // accepts words with infinitely many 1-symbols
        let mut dpa: Aut<u32> = Aut::new(false, "dpa", vec!["a".to_string()], 0);
        dpa.add_state(1);
        dpa.add_edge(0, 0, 0, Some(1));
        dpa.add_edge(0, 1, 1, Some(0));
        dpa.add_edge(1, 0, 0, Some(1));
        dpa.add_edge(1, 1, 1, Some(0));

        assert!(dpa_accepts(&dpa, &[], &[1]));
        assert!(dpa_accepts(&dpa, &[0], &[0, 1]));
        assert!(!dpa_accepts(&dpa, &[1], &[0]));
        // unrolled cycles describe the same word
        assert_eq!(
            dpa_accepts(&dpa, &[], &[1, 0]),
            dpa_accepts(&dpa, &[1], &[0, 1])
        );
    }

    #[test]
    fn partial_automata_reject_missing_edges() {
        let mut dpa: Aut<u32> = Aut::new(false, "partial", vec!["a".to_string()], 0);
        dpa.add_edge(0, 1, 0, Some(0));
        assert!(dpa_accepts(&dpa, &[], &[1]));
        assert!(!dpa_accepts(&dpa, &[0], &[1]));
        assert!(!dpa_accepts(&dpa, &[], &[1, 0]));
    }

    #[test]
    fn state_based_lasso_evaluation() {
        let mut dba: Aut<u32> = Aut::new(true, "dba", vec!["a".to_string()], 0);
        dba.add_state(1);
        dba.set_priority(0, Some(1));
        dba.set_priority(1, Some(0));
        dba.add_edge(0, 0, 0, None);
        dba.add_edge(0, 1, 1, None);
        dba.add_edge(1, 0, 0, None);
        dba.add_edge(1, 1, 1, None);

        assert!(dpa_accepts(&dba, &[], &[1]));
        assert!(dpa_accepts(&dba, &[], &[0, 1]));
        assert!(!dpa_accepts(&dba, &[1], &[0]));
    }
}


