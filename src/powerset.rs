//! Bitset-based subset machinery: an adjacency matrix over fixed state sets,
//! the reduced powerset successor function, and the powerset automaton that
//! guides SCC-decomposed determinization.

use bit_set::BitSet;

use crate::aut::Aut;
use crate::graph::bfs;
use crate::level::DetConf;
use crate::math::OrderedMap;
use crate::{StateId, Sym};

/// Adjacency matrix of an NBA: `mat[x][p]` is the set of `x`-successors of
/// state `p`. The automaton must be normalized enough that every state id is
/// a valid row index.
pub type AdjMat = Vec<Vec<BitSet>>;

/// Builds the adjacency matrix of the given automaton.
pub fn adj_matrix<T: Ord + Clone>(aut: &Aut<T>) -> AdjMat {
    let n = aut.states().max().map_or(0, |m| m + 1);
    let mut mat = vec![vec![BitSet::with_capacity(n); n]; aut.num_syms()];
    for p in aut.states() {
        for x in aut.state_outsyms(p) {
            for q in aut.succ(p, x) {
                mat[x][p].insert(q);
            }
        }
    }
    mat
}

/// Computes the successor of the subset `from` under symbol `x`.
///
/// The plain union of the per-state successor rows is reduced in two ways:
/// if it intersects `sinks` (states whose language is the full `Σ^ω`), it
/// collapses to exactly `sinks`; afterwards, for every member `i` with an
/// entry in `impl_masks`, the set is intersected with `impl_masks[i]`,
/// dropping states whose language is strictly subsumed by that of `i`.
pub fn powersucc(
    mat: &AdjMat,
    from: &BitSet,
    x: Sym,
    sinks: &BitSet,
    impl_masks: &OrderedMap<StateId, BitSet>,
) -> BitSet {
    let row = &mat[x];
    let mut ret = BitSet::new();
    for i in from.iter() {
        ret.union_with(&row[i]);
    }
    if !sinks.is_empty() && !ret.is_disjoint(sinks) {
        return sinks.clone();
    }
    if !impl_masks.is_empty() {
        let members: Vec<usize> = ret.iter().collect();
        for i in members {
            if ret.contains(i) {
                if let Some(mask) = impl_masks.get(&i) {
                    ret.intersect_with(mask);
                }
            }
        }
    }
    ret
}

/// Builds the powerset automaton of the NBA underlying `dc`: states are
/// tagged with subsets of NBA states, the initial subset is the singleton of
/// the NBA's initial state, and transitions follow [`powersucc`]. The empty
/// subset is materialized as an ordinary (sink) state when reachable.
pub fn powerset_automaton<T: Ord + Clone>(nba: &Aut<T>, dc: &DetConf) -> Aut<BitSet> {
    let mut initset = BitSet::new();
    initset.insert(nba.init());

    let mut psa: Aut<BitSet> = Aut::new(true, nba.name(), nba.aps().to_vec(), 0);
    psa.tag.put(initset, 0);
    let num_syms = psa.num_syms();

    bfs(0 as StateId, |&st, work| {
        let cur = psa.tag.tag_of(st).expect("powerset states are tagged").clone();
        for x in 0..num_syms {
            let sucset = powersucc(&dc.mat, &cur, x, &dc.sinks, &dc.impl_masks);
            let sucst = psa.tag.put_or_get(sucset, psa.num_states());
            if !psa.has_state(sucst) {
                psa.add_state(sucst);
            }
            psa.add_edge(st, x, sucst, None);
            work.push(sucst);
        }
    });
    psa
}
