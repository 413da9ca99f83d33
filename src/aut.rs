//! A mutable labeled parity automaton. Priorities annotate either states or
//! transitions, a multiset keeps track of all assigned priorities, and a
//! bidirectional tag map associates opaque labels with state ids.

use std::fmt;

use itertools::Itertools;

use crate::math::OrderedMap;
use crate::parity::{good_priority, stronger_priority, ParityType};
use crate::tagmap::TagMap;
use crate::{Priority, StateId, Sym};

/// A parity automaton with a unique initial state, priorities on states or
/// edges, and an arbitrary label attached to states via [`TagMap`]. Büchi
/// automata are the state-based instances with at most two priorities.
///
/// The alphabet is the power set of the atomic propositions, with symbols
/// enumerated as `0..2^|AP|`. Edges live in nested ordered maps
/// `source -> symbol -> target -> priority`, so all iteration is in
/// ascending order and repeated runs build identical automata.
#[derive(Clone)]
pub struct Aut<T: Ord + Clone> {
    // whether the state ids form a contiguous block (see `normalize`)
    normalized: bool,
    // state-based acceptance: priorities sit on states instead of edges
    state_based: bool,
    name: String,
    aps: Vec<String>,
    patype: ParityType,
    init: StateId,
    // how many assigned slots currently carry each priority
    prio_cnt: OrderedMap<Priority, usize>,
    state_pri: OrderedMap<StateId, Priority>,
    adj: OrderedMap<StateId, OrderedMap<Sym, OrderedMap<StateId, Option<Priority>>>>,
    /// Labels attached to states.
    pub tag: TagMap<T>,
}

impl<T: Ord + Clone> Aut<T> {
    /// Creates an automaton with the single state `initial`.
    pub fn new(state_based: bool, name: &str, aps: Vec<String>, initial: StateId) -> Self {
        let mut aut = Aut {
            normalized: true,
            state_based,
            name: name.to_string(),
            aps,
            patype: ParityType::MinEven,
            init: initial,
            prio_cnt: OrderedMap::new(),
            state_pri: OrderedMap::new(),
            adj: OrderedMap::new(),
            tag: TagMap::new(),
        };
        aut.add_state(initial);
        aut.init = initial;
        aut
    }

    /// Whether priorities annotate states rather than edges.
    pub fn is_state_based(&self) -> bool {
        self.state_based
    }

    /// The automaton's name, kept for presentation purposes only.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The atomic proposition names. Their count fixes the alphabet size.
    pub fn aps(&self) -> &[String] {
        &self.aps
    }

    /// Size of the alphabet, `2^|AP|`.
    pub fn num_syms(&self) -> usize {
        1 << self.aps.len()
    }

    /// All symbols of the alphabet.
    pub fn syms(&self) -> std::ops::Range<Sym> {
        0..self.num_syms()
    }

    /// The parity condition type.
    pub fn patype(&self) -> ParityType {
        self.patype
    }

    /// Sets the parity condition type. The priorities are left untouched;
    /// use [`crate::priorities::change_parity_type`] to translate them.
    pub fn set_patype(&mut self, t: ParityType) {
        self.patype = t;
    }

    /// The initial state.
    pub fn init(&self) -> StateId {
        self.init
    }

    /// Makes `initial` the initial state. It must exist.
    pub fn set_init(&mut self, initial: StateId) {
        assert!(self.has_state(initial));
        self.init = initial;
    }

    /// Whether the state ids form a contiguous block.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    // ------------------------------------------------------------------
    // states

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.adj.len()
    }

    /// All state ids, ascending.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.adj.keys().copied()
    }

    /// Whether `s` is a state.
    pub fn has_state(&self, s: StateId) -> bool {
        self.adj.contains_key(&s)
    }

    /// Adds the fresh state `s`.
    ///
    /// # Panics
    /// Panics if `s` already exists.
    pub fn add_state(&mut self, s: StateId) {
        assert!(!self.has_state(s), "state {s} already exists");
        if s != self.num_states() {
            self.normalized = false;
        }
        self.adj.insert(s, OrderedMap::new());
    }

    // ------------------------------------------------------------------
    // priorities

    fn inc_prio(&mut self, p: Priority) {
        *self.prio_cnt.entry(p).or_insert(0) += 1;
    }

    fn dec_prio(&mut self, p: Priority) {
        let cnt = self
            .prio_cnt
            .get_mut(&p)
            .expect("priority multiset out of sync");
        *cnt -= 1;
        if *cnt == 0 {
            self.prio_cnt.remove(&p);
        }
    }

    /// The distinct priorities currently assigned, ascending.
    pub fn pris(&self) -> Vec<Priority> {
        self.prio_cnt.keys().copied().collect()
    }

    /// How many slots currently carry priority `p`.
    pub fn prio_count(&self, p: Priority) -> usize {
        self.prio_cnt.get(&p).copied().unwrap_or(0)
    }

    /// Smallest and largest assigned priority. Without any assignment the
    /// result is a one-priority range that rejects everything.
    pub fn pri_bounds(&self) -> (Priority, Priority) {
        match (
            self.prio_cnt.keys().next(),
            self.prio_cnt.keys().next_back(),
        ) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ if self.patype.is_even() => (1, 1),
            _ => (0, 0),
        }
    }

    /// The priority of state `s`, if assigned.
    pub fn state_priority(&self, s: StateId) -> Option<Priority> {
        assert!(self.has_state(s));
        self.state_pri.get(&s).copied()
    }

    /// Assigns (or with `None` clears) the priority of state `s`, keeping the
    /// priority multiset in step. Only allowed in state-based mode.
    pub fn set_priority(&mut self, s: StateId, pri: Option<Priority>) {
        assert!(self.state_based, "priorities sit on edges in this automaton");
        assert!(self.has_state(s));
        if let Some(old) = self.state_pri.remove(&s) {
            self.dec_prio(old);
        }
        if let Some(p) = pri {
            self.state_pri.insert(s, p);
            self.inc_prio(p);
        }
    }

    // ------------------------------------------------------------------
    // edges

    /// The symbols on which `p` has outgoing edges, ascending.
    pub fn state_outsyms(&self, p: StateId) -> Vec<Sym> {
        assert!(self.has_state(p));
        self.adj[&p].keys().copied().collect()
    }

    /// Whether `p` has an outgoing edge on `x`.
    pub fn state_has_outsym(&self, p: StateId, x: Sym) -> bool {
        assert!(self.has_state(p));
        self.adj[&p].contains_key(&x)
    }

    /// Whether the edge `p --x--> q` exists.
    pub fn has_edge(&self, p: StateId, x: Sym, q: StateId) -> bool {
        assert!(self.has_state(p));
        self.adj[&p].get(&x).is_some_and(|t| t.contains_key(&q))
    }

    /// Adds the edge `p --x--> q` with the given priority.
    ///
    /// # Panics
    /// Panics if the edge exists, if `x` is not a symbol, if an endpoint is
    /// missing, or if a priority is given in state-based mode.
    pub fn add_edge(&mut self, p: StateId, x: Sym, q: StateId, pri: Option<Priority>) {
        assert!(self.has_state(p));
        assert!(self.has_state(q));
        assert!(x < self.num_syms(), "symbol {x} out of range");
        assert!(pri.is_none() || !self.state_based);
        assert!(!self.has_edge(p, x, q), "edge already exists");
        self.adj
            .get_mut(&p)
            .unwrap()
            .entry(x)
            .or_default()
            .insert(q, pri);
        if let Some(p) = pri {
            self.inc_prio(p);
        }
    }

    /// Replaces the priority of the existing edge `p --x--> q`.
    pub fn modify_edge(&mut self, p: StateId, x: Sym, q: StateId, pri: Option<Priority>) {
        let slot = self
            .adj
            .get_mut(&p)
            .and_then(|row| row.get_mut(&x))
            .and_then(|targets| targets.get_mut(&q))
            .expect("edge must exist");
        let old = std::mem::replace(slot, pri);
        if let Some(old) = old {
            self.dec_prio(old);
        }
        if let Some(p) = pri {
            self.inc_prio(p);
        }
    }

    /// Removes the existing edge `p --x--> q`.
    pub fn remove_edge(&mut self, p: StateId, x: Sym, q: StateId) {
        let targets = self
            .adj
            .get_mut(&p)
            .and_then(|row| row.get_mut(&x))
            .expect("edge must exist");
        let old = targets.remove(&q).expect("edge must exist");
        if targets.is_empty() {
            self.adj.get_mut(&p).unwrap().remove(&x);
        }
        if let Some(old) = old {
            self.dec_prio(old);
        }
    }

    /// The priority of the existing edge `p --x--> q`.
    pub fn edge_priority(&self, p: StateId, x: Sym, q: StateId) -> Option<Priority> {
        *self.adj[&p]
            .get(&x)
            .and_then(|targets| targets.get(&q))
            .expect("edge must exist")
    }

    /// The `x`-successors of `p` with their edge priorities, ascending by id.
    pub fn succ_edges(&self, p: StateId, x: Sym) -> Vec<(StateId, Option<Priority>)> {
        assert!(self.has_state(p));
        match self.adj[&p].get(&x) {
            Some(targets) => targets.iter().map(|(&q, &pri)| (q, pri)).collect(),
            None => vec![],
        }
    }

    /// The `x`-successors of `p`, ascending.
    pub fn succ(&self, p: StateId, x: Sym) -> Vec<StateId> {
        assert!(self.has_state(p));
        match self.adj[&p].get(&x) {
            Some(targets) => targets.keys().copied().collect(),
            None => vec![],
        }
    }

    /// The successors of `p` under any symbol, ascending and deduplicated.
    pub fn succ_any(&self, p: StateId) -> Vec<StateId> {
        assert!(self.has_state(p));
        self.adj[&p]
            .values()
            .flat_map(|targets| targets.keys().copied())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// All edges as `(source, symbol, target, priority)` tuples, in source,
    /// symbol, target order.
    pub fn edges(&self) -> Vec<(StateId, Sym, StateId, Option<Priority>)> {
        self.adj
            .iter()
            .flat_map(|(&p, row)| {
                row.iter()
                    .flat_map(move |(&x, targets)| targets.iter().map(move |(&q, &pri)| (p, x, q, pri)))
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // derived predicates

    /// Whether this is a Büchi automaton: state-based with at most two
    /// distinct priorities of which the stronger one is good.
    pub fn is_buchi(&self) -> bool {
        let pris = self.pris();
        self.state_based
            && (pris.len() < 2
                || (pris.len() == 2
                    && good_priority(
                        self.patype,
                        stronger_priority(self.patype, pris[0], pris[1]),
                    )))
    }

    /// In a Büchi automaton, whether `s` is an accepting state.
    pub fn state_buchi_accepting(&self, s: StateId) -> bool {
        self.state_priority(s)
            .is_some_and(|p| good_priority(self.patype, p))
    }

    /// Whether every `(state, symbol)` pair has at most one successor.
    pub fn is_deterministic(&self) -> bool {
        self.adj.values().all(|row| row.values().all(|t| t.len() <= 1))
    }

    /// Whether every `(state, symbol)` pair has at least one successor.
    pub fn is_complete(&self) -> bool {
        self.states()
            .all(|p| self.syms().all(|x| !self.succ(p, x).is_empty()))
    }

    /// Whether every slot of the active mode carries a priority.
    pub fn is_colored(&self) -> bool {
        if self.state_based {
            self.states().all(|p| self.state_pri.contains_key(&p))
        } else {
            self.adj
                .values()
                .all(|row| row.values().all(|t| t.values().all(|pri| pri.is_some())))
        }
    }

    /// Adds a rejecting sink and routes every missing `(state, symbol)` pair
    /// to it. Does nothing if the automaton is already complete.
    pub fn make_complete(&mut self) {
        if self.is_complete() || self.num_syms() == 0 {
            return;
        }
        let sink = self.adj.keys().next_back().map_or(0, |&m| m + 1);
        self.add_state(sink);
        let rejpri = if self.patype.is_even() { 1 } else { 0 };
        if self.state_based {
            self.set_priority(sink, Some(rejpri));
        }
        let states: Vec<StateId> = self.states().collect();
        for st in states {
            for x in self.syms() {
                if self.succ(st, x).is_empty() {
                    let pri = if self.state_based { None } else { Some(rejpri) };
                    self.add_edge(st, x, sink, pri);
                }
            }
        }
    }

    /// Assigns the weakest bad priority above everything in use to every slot
    /// that has none, so that the automaton becomes colored without changing
    /// its language. Defined for min-parity types.
    pub fn make_colored(&mut self) {
        assert!(self.patype.is_min());
        let mut bad = self.prio_cnt.keys().next_back().map_or(0, |&m| m);
        if good_priority(self.patype, bad) {
            bad += 1;
        }
        if self.state_based {
            let missing: Vec<StateId> = self
                .states()
                .filter(|s| !self.state_pri.contains_key(s))
                .collect();
            for s in missing {
                self.set_priority(s, Some(bad));
            }
        } else {
            for (p, x, q, pri) in self.edges() {
                if pri.is_none() {
                    self.modify_edge(p, x, q, Some(bad));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // bulk operations

    /// Copies each state's priority onto all of its outgoing edges, clears
    /// the state priorities and switches to transition-based mode.
    pub fn to_transition_based(&mut self) {
        assert!(self.state_based);
        let pris: Vec<(StateId, Option<Priority>)> = self
            .states()
            .map(|s| (s, self.state_priority(s)))
            .collect();
        for &(s, _) in &pris {
            self.set_priority(s, None);
        }
        self.state_based = false;
        for (s, pri) in pris {
            let Some(pri) = pri else { continue };
            for x in self.state_outsyms(s) {
                for q in self.succ(s, x) {
                    self.modify_edge(s, x, q, Some(pri));
                }
            }
        }
    }

    /// Removes the given states together with their priorities, tags and all
    /// incident edges. `tokill` must be sorted and every member must exist.
    /// If the initial state is removed, the smallest surviving id becomes
    /// initial; callers that may trigger this should re-set the initial state
    /// themselves.
    pub fn remove_states(&mut self, tokill: &[StateId]) {
        debug_assert!(tokill.windows(2).all(|w| w[0] < w[1]), "must be sorted");
        for &s in tokill {
            assert!(self.has_state(s), "cannot remove unknown state {s}");
        }
        let killinit = tokill.binary_search(&self.init).is_ok();

        for &s in tokill {
            if self.state_based && self.state_pri.contains_key(&s) {
                self.set_priority(s, None);
            }
            self.tag.remove_id(s);
        }
        // outgoing edges disappear with their source
        for &s in tokill {
            let row = self.adj.remove(&s).unwrap();
            for targets in row.into_values() {
                for pri in targets.into_values().flatten() {
                    self.dec_prio(pri);
                }
            }
        }
        // strip the removed states out of the remaining successor maps
        let mut dropped: Vec<Priority> = vec![];
        for row in self.adj.values_mut() {
            for targets in row.values_mut() {
                for &v in tokill {
                    if let Some(Some(pri)) = targets.remove(&v) {
                        dropped.push(pri);
                    }
                }
            }
            row.retain(|_, targets| !targets.is_empty());
        }
        for pri in dropped {
            self.dec_prio(pri);
        }

        if killinit {
            if let Some(&first) = self.adj.keys().next() {
                self.init = first;
            }
        }
        self.normalized = false;
    }

    /// Redirects all edges into `others` onto the representative `rep` and
    /// removes `others`. On a `(source, symbol)` collision the priority of
    /// the smallest absorbed target wins; an existing edge to `rep` is kept
    /// as is. `others` must be sorted, must not contain `rep` and must not
    /// contain the initial state.
    pub fn merge_states(&mut self, others: &[StateId], rep: StateId) {
        if others.is_empty() {
            return;
        }
        assert!(self.has_state(rep));
        debug_assert!(others.windows(2).all(|w| w[0] < w[1]), "must be sorted");
        for &q in others {
            assert!(self.has_state(q));
        }
        assert!(others.binary_search(&self.init).is_err());
        assert!(others.binary_search(&rep).is_err());

        let states: Vec<StateId> = self.states().collect();
        for st in states {
            for x in self.state_outsyms(st) {
                let absorbed = self
                    .succ(st, x)
                    .into_iter()
                    .find(|q| others.binary_search(q).is_ok());
                let Some(first) = absorbed else { continue };
                let pri = self.edge_priority(st, x, first);
                if !self.has_edge(st, x, rep) {
                    self.add_edge(st, x, rep, pri);
                }
            }
        }
        self.remove_states(others);
    }

    /// Merges each equivalence class of size at least two into a single
    /// representative: the class maximum, or the initial state for the one
    /// class containing it. Classes must be sorted.
    pub fn quotient(&mut self, classes: &[Vec<StateId>]) {
        let initial = self.init;
        let mut seen_init = false;
        for class in classes {
            if class.len() < 2 {
                continue;
            }
            let mut members = class.clone();
            let rep = if !seen_init {
                match members.binary_search(&initial) {
                    Ok(pos) => {
                        members.remove(pos);
                        seen_init = true;
                        initial
                    }
                    Err(_) => members.pop().unwrap(),
                }
            } else {
                members.pop().unwrap()
            };
            self.merge_states(&members, rep);
        }
    }

    /// Renumbers the states to `offset..offset + n`, preserving order, and
    /// returns the renumbering. If the ids already match, the automaton is
    /// left as a copy of itself and the identity map is returned.
    pub fn normalize(&mut self, offset: StateId) -> OrderedMap<StateId, StateId> {
        let (aut, map) = self.get_normalized(offset);
        *self = aut;
        self.normalized = true;
        map
    }

    /// Like [`Aut::normalize`], but returns the renumbered automaton instead
    /// of replacing `self`.
    pub fn get_normalized(&self, offset: StateId) -> (Self, OrderedMap<StateId, StateId>) {
        let mut map = OrderedMap::new();
        let mut next = offset;
        let mut changes = false;
        for s in self.states() {
            map.insert(s, next);
            if next != s {
                changes = true;
            }
            next += 1;
        }
        if !changes {
            return (self.clone(), map);
        }

        let mut ret = Aut::new(
            self.state_based,
            &self.name,
            self.aps.clone(),
            map[&self.init],
        );
        ret.patype = self.patype;
        for s in self.states() {
            let ns = map[&s];
            if !ret.has_state(ns) {
                ret.add_state(ns);
            }
            if let Some(t) = self.tag.tag_of(s) {
                ret.tag.put(t.clone(), ns);
            }
            if self.state_based {
                if let Some(p) = self.state_priority(s) {
                    ret.set_priority(ns, Some(p));
                }
            }
            for x in self.state_outsyms(s) {
                for (q, pri) in self.succ_edges(s, x) {
                    let nq = map[&q];
                    if !ret.has_state(nq) {
                        ret.add_state(nq);
                    }
                    ret.add_edge(ns, x, nq, pri);
                }
            }
        }
        (ret, map)
    }

    /// Copies all states, priorities, tags and edges of `other` into `self`.
    /// The alphabets must agree and the state sets must be disjoint; the
    /// initial state of `other` is ignored.
    pub fn insert(&mut self, other: &Aut<T>) {
        assert_eq!(self.aps, other.aps, "alphabets must agree");
        for s in other.states() {
            assert!(!self.has_state(s), "state sets must be disjoint");
        }
        let keep_normalized = self.normalized
            && other.normalized
            && other.states().next() == Some(self.num_states());

        for s in other.states() {
            if !self.has_state(s) {
                self.add_state(s);
            }
            if self.state_based && other.state_based {
                if let Some(p) = other.state_priority(s) {
                    self.set_priority(s, Some(p));
                }
            }
            if let Some(t) = other.tag.tag_of(s) {
                self.tag.put(t.clone(), s);
            }
            for x in other.state_outsyms(s) {
                for (q, pri) in other.succ_edges(s, x) {
                    if !self.has_state(q) {
                        self.add_state(q);
                    }
                    self.add_edge(s, x, q, pri);
                }
            }
        }
        self.normalized = keep_normalized;
    }
}

impl<T: Ord + Clone + fmt::Debug> fmt::Debug for Aut<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} automaton \"{}\", {:?}, {} states, init {}",
            if self.state_based { "state-based" } else { "transition-based" },
            self.name,
            self.patype,
            self.num_states(),
            self.init
        )?;
        for s in self.states() {
            let pri = match self.state_priority(s) {
                Some(p) => format!(" [{p}]"),
                None => String::new(),
            };
            let tag = match self.tag.tag_of(s) {
                Some(t) => format!(" {t:?}"),
                None => String::new(),
            };
            writeln!(f, "  {s}{pri}{tag}")?;
            for x in self.state_outsyms(s) {
                writeln!(
                    f,
                    "    --{x}--> {}",
                    self.succ_edges(s, x)
                        .iter()
                        .map(|(q, pri)| match pri {
                            Some(p) => format!("{q} [{p}]"),
                            None => format!("{q}"),
                        })
                        .join(", ")
                )?;
            }
        }
        Ok(())
    }
}
