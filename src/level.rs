//! Macro states of the determinization: ranked slices.
//!
//! A [`Level`] partitions the currently reachable NBA states into an ordered
//! list of disjoint sets, each carrying a rank; smaller ranks are older. The
//! successor computation splits every set into its accepting and
//! non-accepting successors, deduplicates left to right, migrates the ranks
//! of emptied sets onto their surviving neighbors and reports the outcome as
//! a min-even parity priority: the oldest rank with an event decides, where
//! absorbing a neighbor is good and disappearing is bad.

use std::fmt;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::trace;

use crate::aut::Aut;
use crate::math::OrderedMap;
use crate::powerset::{adj_matrix, AdjMat};
use crate::{Priority, StateId, Sym};

/// Configuration of a determinization run: the NBA's adjacency matrix, its
/// accepting states, and the optional reductions applied to every subset
/// (accepting sinks and language-inclusion masks, both usually provided by
/// analyses outside this crate).
#[derive(Debug, Clone)]
pub struct DetConf {
    /// Adjacency matrix of the NBA.
    pub mat: AdjMat,
    /// The Büchi-accepting states.
    pub accepting: BitSet,
    /// States whose language is `Σ^ω`; reaching any of them collapses the
    /// subset to exactly this set. Empty to disable.
    pub sinks: BitSet,
    /// For state `i`, the mask of states not strictly subsuming `i`;
    /// subsets containing `i` are intersected with it. Empty to disable.
    pub impl_masks: OrderedMap<StateId, BitSet>,
}

impl DetConf {
    /// Derives a configuration from a Büchi automaton, with no sink or
    /// implication-mask reductions.
    ///
    /// # Panics
    /// Panics if the automaton does not satisfy [`Aut::is_buchi`].
    pub fn new<T: Ord + Clone>(nba: &Aut<T>) -> Self {
        assert!(nba.is_buchi(), "determinization requires a Büchi automaton");
        let accepting = nba
            .states()
            .filter(|&s| nba.state_buchi_accepting(s))
            .collect();
        DetConf {
            mat: adj_matrix(nba),
            accepting,
            sinks: BitSet::new(),
            impl_masks: OrderedMap::new(),
        }
    }

    // apply the implication masks the same way powersucc does
    fn reduce(&self, set: &mut BitSet) {
        if self.impl_masks.is_empty() {
            return;
        }
        let members: Vec<usize> = set.iter().collect();
        for i in members {
            if set.contains(i) {
                if let Some(mask) = self.impl_masks.get(&i) {
                    set.intersect_with(mask);
                }
            }
        }
    }
}

/// A determinization macro state: disjoint, nonempty sets of NBA states in
/// slice order, with a rank permutation `0..k` where rank 0 is the oldest.
/// Equality over the full structure is what interns macro states.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level {
    powerset: BitSet,
    sets: Vec<BitSet>,
    ranks: Vec<u32>,
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.sets
                .iter()
                .zip(&self.ranks)
                .map(|(set, rank)| format!(
                    "{rank}:{{{}}}",
                    set.iter().map(|q| q.to_string()).join(", ")
                ))
                .join(", ")
        )
    }
}

impl Level {
    /// The macro state for the given start subset: one set holding the whole
    /// subset, carrying rank 0.
    pub fn new(_dc: &DetConf, startset: &BitSet) -> Self {
        if startset.is_empty() {
            return Self::empty();
        }
        Level {
            powerset: startset.clone(),
            sets: vec![startset.clone()],
            ranks: vec![0],
        }
    }

    fn empty() -> Self {
        Level {
            powerset: BitSet::new(),
            sets: vec![],
            ranks: vec![],
        }
    }

    /// The union of all sets, i.e. the plain reachable subset.
    pub fn powerset(&self) -> &BitSet {
        &self.powerset
    }

    /// Whether no NBA state is tracked anymore.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The slice partition.
    pub fn sets(&self) -> &[BitSet] {
        &self.sets
    }

    /// The rank of each set.
    pub fn ranks(&self) -> &[u32] {
        &self.ranks
    }

    #[cfg(debug_assertions)]
    fn sanity_checked(self) -> Self {
        assert_eq!(self.sets.len(), self.ranks.len());
        for (i, set) in self.sets.iter().enumerate() {
            assert!(!set.is_empty());
            for other in self.sets.iter().skip(i + 1) {
                assert!(set.is_disjoint(other), "slice sets must be disjoint");
            }
        }
        let mut sorted = self.ranks.clone();
        sorted.sort_unstable();
        assert!(
            sorted.iter().enumerate().all(|(i, &r)| r == i as u32),
            "ranks must be a permutation of 0..k"
        );
        self
    }

    #[cfg(not(debug_assertions))]
    fn sanity_checked(self) -> Self {
        self
    }

    /// Computes the successor level under symbol `x` together with the
    /// priority of the transition.
    pub fn succ(&self, dc: &DetConf, x: Sym) -> (Level, Priority) {
        debug_assert_eq!(self.sets.len(), self.ranks.len());
        let weakest = 2 * self.sets.len() as Priority + 1;
        if self.sets.is_empty() {
            return (Level::empty(), weakest);
        }

        // split the successors of every set into accepting and not; the
        // accepting part becomes a fresh unranked set on the older side
        let mut sets_out: Vec<BitSet> = Vec::with_capacity(2 * self.sets.len());
        let mut ranks_out: Vec<Option<u32>> = Vec::with_capacity(2 * self.sets.len());
        let mut union_all = BitSet::new();
        for (i, set) in self.sets.iter().enumerate() {
            let mut t = BitSet::new();
            for p in set.iter() {
                t.union_with(&dc.mat[x][p]);
            }
            union_all.union_with(&t);
            let mut acc = t.clone();
            acc.intersect_with(&dc.accepting);
            let mut non = t;
            non.difference_with(&dc.accepting);
            sets_out.push(acc);
            ranks_out.push(None);
            sets_out.push(non);
            ranks_out.push(Some(self.ranks[i]));
        }

        // reaching an accepting sink swallows everything else
        if !dc.sinks.is_empty() && !union_all.is_disjoint(&dc.sinks) {
            let collapsed = Level {
                powerset: dc.sinks.clone(),
                sets: vec![dc.sinks.clone()],
                ranks: vec![0],
            };
            return (collapsed.sanity_checked(), 0);
        }

        // prune states subsumed under language inclusion
        let mut reduced = union_all;
        dc.reduce(&mut reduced);
        if !dc.impl_masks.is_empty() {
            for set in &mut sets_out {
                set.intersect_with(&reduced);
            }
        }

        // deduplicate left to right; the oldest lineage keeps a state
        let mut seen = BitSet::new();
        for set in &mut sets_out {
            set.difference_with(&seen);
            seen.union_with(set);
        }

        // ranks of emptied sets migrate onto the nearest surviving set to
        // their left; absorbing is good, losing against an older rank is not
        let mut survived: Vec<u32> = vec![];
        let mut disappeared: Vec<u32> = vec![];
        'outer: for i in 0..ranks_out.len() {
            let Some(rank) = ranks_out[i] else { continue };
            if !sets_out[i].is_empty() {
                continue;
            }
            ranks_out[i] = None;
            for j in (0..i).rev() {
                if sets_out[j].is_empty() {
                    debug_assert!(ranks_out[j].is_none());
                    continue;
                }
                match ranks_out[j] {
                    None => {
                        ranks_out[j] = Some(rank);
                        survived.push(rank);
                    }
                    Some(host) if host > rank => {
                        disappeared.push(host);
                        survived.push(rank);
                        ranks_out[j] = Some(rank);
                    }
                    Some(_) => disappeared.push(rank),
                }
                continue 'outer;
            }
            disappeared.push(rank);
        }
        trace!(
            "symbol {x}: {self:?} split into {} with S={{{}}} D={{{}}}",
            sets_out
                .iter()
                .zip(&ranks_out)
                .map(|(s, r)| format!(
                    "{}:{{{}}}",
                    r.map_or("#".to_string(), |r| r.to_string()),
                    s.iter().map(|q| q.to_string()).join(", ")
                ))
                .join(", "),
            survived.iter().join(", "),
            disappeared.iter().join(", ")
        );

        // drop empty sets
        let mut sets = vec![];
        let mut old_ranks = vec![];
        for (i, set) in sets_out.into_iter().enumerate() {
            if !set.is_empty() {
                sets.push(set);
                old_ranks.push(ranks_out[i]);
            }
        }
        if sets.is_empty() {
            return (Level::empty(), weakest);
        }

        let priority = survived
            .iter()
            .map(|&r| 2 * r + 2)
            .chain(disappeared.iter().map(|&r| 2 * r + 1))
            .min()
            .unwrap_or(weakest);

        // renormalize: survivors keep their relative age, fresh sets are
        // appended youngest-last in slice order
        let mut order: Vec<usize> = (0..sets.len()).filter(|&i| old_ranks[i].is_some()).collect();
        order.sort_by_key(|&i| old_ranks[i]);
        let mut ranks = vec![0u32; sets.len()];
        let mut next = 0u32;
        for &i in &order {
            ranks[i] = next;
            next += 1;
        }
        for (i, old) in old_ranks.iter().enumerate() {
            if old.is_none() {
                ranks[i] = next;
                next += 1;
            }
        }

        let mut powerset = BitSet::new();
        for set in &sets {
            powerset.union_with(set);
        }
        let level = Level {
            powerset,
            sets,
            ranks,
        }
        .sanity_checked();
        trace!("successor {level:?} with priority {priority}");
        (level, priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(xs: &[usize]) -> BitSet {
        xs.iter().copied().collect()
    }

    /// NBA for "eventually always a": 0 loops on both symbols and guesses
    /// the switch into the accepting 1, which survives only on symbol 1.
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
    fn accepting_self_loop_reports_a_good_event() {
        let mut aut: Aut<u32> = Aut::new(true, "t", vec!["a".to_string()], 0);
        aut.set_priority(0, Some(0));
        aut.add_edge(0, 0, 0, None);
        aut.add_edge(0, 1, 0, None);
        let dc = DetConf::new(&aut);

        let l0 = Level::new(&dc, &bits(&[0]));
        for x in 0..2 {
            let (suc, pri) = l0.succ(&dc, x);
            assert_eq!(suc, l0, "the macro state reproduces itself");
            assert_eq!(pri, 2, "rank 0 absorbs its accepting successors");
        }
    }

    #[test]
    fn rejecting_self_loop_reports_no_event() {
        let mut aut: Aut<u32> = Aut::new(true, "t", vec!["a".to_string()], 0);
        aut.set_priority(0, Some(1));
        aut.add_edge(0, 0, 0, None);
        aut.add_edge(0, 1, 0, None);
        let dc = DetConf::new(&aut);

        let l0 = Level::new(&dc, &bits(&[0]));
        let (suc, pri) = l0.succ(&dc, 0);
        assert_eq!(suc, l0);
        assert_eq!(pri, 3, "weakest bad priority for a slice of width one");
    }

    #[test]
    fn dying_powerset_gives_an_empty_level() {
        let mut aut: Aut<u32> = Aut::new(true, "t", vec!["a".to_string()], 0);
        aut.set_priority(0, Some(0));
        aut.add_edge(0, 1, 0, None);
        let dc = DetConf::new(&aut);

        let l0 = Level::new(&dc, &bits(&[0]));
        let (suc, _) = l0.succ(&dc, 0);
        assert!(suc.is_empty());
    }

    #[test]
    fn guessing_produces_a_two_set_slice() {
        let aut = ev_always();
        let dc = DetConf::new(&aut);
        let l0 = Level::new(&dc, &bits(&[0]));

        let (l1, pri) = l0.succ(&dc, 1);
        assert_eq!(pri, 3, "no rank died or absorbed anything");
        assert_eq!(l1.sets(), &[bits(&[1]), bits(&[0])]);
        assert_eq!(l1.ranks(), &[1, 0], "the fresh accepting set is younger");
        assert_eq!(l1.powerset(), &bits(&[0, 1]));

        // staying on symbol 1 the young rank keeps absorbing: a good event
        let (l2, pri) = l1.succ(&dc, 1);
        assert_eq!(l2, l1);
        assert_eq!(pri, 4);

        // symbol 0 kills the accepting branch: rank 1 dies
        let (l3, pri) = l1.succ(&dc, 0);
        assert_eq!(l3, l0);
        assert_eq!(pri, 3);
    }

    #[test]
    fn sink_collapse_swallows_the_slice() {
        let aut = ev_always();
        let mut dc = DetConf::new(&aut);
        dc.sinks = bits(&[1]);

        let l0 = Level::new(&dc, &bits(&[0]));
        let (l1, pri) = l0.succ(&dc, 1);
        assert_eq!(pri, 0);
        assert_eq!(l1.sets(), &[bits(&[1])]);

        // the sink level reproduces itself with a good event
        let (l2, pri) = l1.succ(&dc, 1);
        assert_eq!(l2, l1);
        assert_eq!(pri, 0);
    }
}


