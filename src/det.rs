//! Determinization of Büchi automata into transition-based min-even parity
//! automata: a single-pass breadth-first subset construction over macro
//! states, and a variant that determinizes each strongly connected component
//! of the powerset automaton separately and stitches the parts together.

use bit_set::BitSet;
use thiserror::Error;
use tracing::{debug, trace};

use crate::aut::Aut;
use crate::graph::{bfs, find_path, word_from_path};
use crate::level::{DetConf, Level};
use crate::math::{OrderedMap, OrderedSet, Set};
use crate::parity::ParityType;
use crate::powerset::powersucc;
use crate::scc::{get_sccs, SccDecomposition};
use crate::StateId;

/// Structural failures of determinization that a caller may want to recover
/// from, e.g. by falling back to the single-pass entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetError {
    /// The input automaton does not satisfy [`Aut::is_buchi`].
    #[error("input automaton is not a Büchi automaton")]
    NotBuchi,
    /// A successor subset is not a state of the powerset automaton, which
    /// means the given powerset automaton or configuration is inconsistent
    /// with the NBA.
    #[error("reached a subset unknown to the powerset automaton")]
    UnknownPowerset,
    /// A subautomaton that must be deterministic has several successors for
    /// some state and symbol.
    #[error("SCC subautomaton is not deterministic")]
    NotDeterministic,
}

/// Determinizes `nba` starting from the macro state of `startset`, exploring
/// only successors whose subset satisfies `pred`. If `backmap` is given,
/// every new DPA state is recorded with the subset it was created for.
///
/// The BFS tracks pairs of the plain reduced subset and the interned DPA
/// state: the subset drives the predicate, the macro state everything else.
/// State ids count up in discovery order, so equal inputs produce equal
/// automata.
pub fn determinize_set<T: Ord + Clone>(
    nba: &Aut<T>,
    dc: &DetConf,
    startset: &BitSet,
    mut pred: impl FnMut(&BitSet) -> Result<bool, DetError>,
    mut backmap: Option<&mut OrderedMap<StateId, BitSet>>,
) -> Result<Aut<Level>, DetError> {
    assert!(nba.is_buchi(), "determinization requires a Büchi automaton");
    let myinit: StateId = 0;
    let mut pa: Aut<Level> = Aut::new(false, nba.name(), nba.aps().to_vec(), myinit);
    pa.set_patype(ParityType::MinEven);
    pa.tag.put(Level::new(dc, startset), myinit);
    if let Some(bm) = backmap.as_deref_mut() {
        bm.insert(myinit, startset.clone());
    }
    let num_syms = pa.num_syms();

    // a DPA state is expanded once, even when reached under several subsets
    let mut expanded: Set<StateId> = Set::default();
    let mut numvis = 0usize;
    let mut failed: Option<DetError> = None;

    bfs((startset.clone(), myinit), |(cur_set, cur_id), work| {
        if !expanded.insert(*cur_id) {
            return;
        }
        numvis += 1;
        if numvis % 5000 == 0 {
            debug!("expanded {numvis} macro states");
        }
        let cur = pa
            .tag
            .tag_of(*cur_id)
            .expect("every DPA state is tagged")
            .clone();

        for x in 0..num_syms {
            let (suclevel, sucpri) = cur.succ(dc, x);
            if suclevel.is_empty() {
                continue;
            }
            let sucset = powersucc(&dc.mat, cur_set, x, &dc.sinks, &dc.impl_masks);
            match pred(&sucset) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    failed = Some(e);
                    work.halt();
                    return;
                }
            }
            let sucst = pa.tag.put_or_get(suclevel, pa.num_states());
            if !pa.has_state(sucst) {
                pa.add_state(sucst);
                if let Some(bm) = backmap.as_deref_mut() {
                    bm.insert(sucst, sucset.clone());
                }
            }
            trace!("adding edge {cur_id} --{x}--> {sucst} with priority {sucpri}");
            pa.add_edge(*cur_id, x, sucst, Some(sucpri));
            work.push((sucset, sucst));
        }
    });

    match failed {
        Some(e) => Err(e),
        None => Ok(pa),
    }
}

/// Determinizes `nba` in a single pass, starting from the singleton subset
/// of its initial state and exploring everything.
pub fn determinize<T: Ord + Clone>(nba: &Aut<T>, dc: &DetConf) -> Aut<Level> {
    let mut initset = BitSet::new();
    initset.insert(nba.init());
    let pa = determinize_set(nba, dc, &initset, |_| Ok(true), None)
        .expect("the trivial predicate cannot fail");
    debug!(
        "determinized NBA of size {} to DPA with {} states",
        nba.num_states(),
        pa.num_states()
    );
    pa
}

/// Finds the smallest terminal SCC of a determinized SCC subautomaton. Being
/// terminal guarantees that it realizes every subset of the powerset SCC.
fn min_terminal_scc(pa: &Aut<Level>, pai: &SccDecomposition) -> usize {
    let mut best: Option<usize> = None;
    let mut best_size = pa.num_states() + 1;
    for idx in 0..pai.num_sccs() {
        let size = pai.states_of(idx).len();
        if size < best_size && pai.succ_sccs(|v| pa.succ_any(v), idx).is_empty() {
            best = Some(idx);
            best_size = size;
        }
    }
    best.expect("a finite graph has a terminal SCC")
}

/// Determinizes `nba` component-wise: every SCC of the powerset automaton
/// `psa` is determinized on its own, trimmed to its smallest terminal SCC,
/// and the parts are joined by re-walking the inter-SCC edges of `psa`.
/// Components are handled in reverse topological order (the order of
/// [`SccDecomposition::sccs`], reversed), so every inter-SCC edge lands on an
/// already mapped state.
pub fn determinize_scc<T: Ord + Clone>(
    nba: &Aut<T>,
    dc: &DetConf,
    psa: &Aut<BitSet>,
    psai: &SccDecomposition,
) -> Result<Aut<Level>, DetError> {
    if !nba.is_buchi() {
        return Err(DetError::NotBuchi);
    }
    // powerset state -> state of the result DPA with the same subset
    let mut ps2pa: OrderedMap<StateId, StateId> = OrderedMap::new();
    // result DPA state -> subset it represents
    let mut origps: OrderedMap<StateId, BitSet> = OrderedMap::new();

    let mut ret: Aut<Level> = Aut::new(false, nba.name(), nba.aps().to_vec(), 0);
    ret.set_patype(ParityType::MinEven);
    ret.remove_states(&[0]); // start from a blank graph

    for scc in (0..psai.num_sccs()).rev() {
        let rep = psai.states_of(scc)[0];
        let repps = psa
            .tag
            .tag_of(rep)
            .ok_or(DetError::UnknownPowerset)?
            .clone();
        if repps.is_empty() {
            continue;
        }

        let mut backmap: OrderedMap<StateId, BitSet> = OrderedMap::new();
        let mut sccpa = determinize_set(
            nba,
            dc,
            &repps,
            |subset| match psa.tag.get(subset) {
                Some(s) => Ok(psai.scc_of(s) == scc),
                None => Err(DetError::UnknownPowerset),
            },
            Some(&mut backmap),
        )?;

        let sccpai = get_sccs(sccpa.states(), |v| sccpa.succ_any(v));
        let bottom = min_terminal_scc(&sccpa, &sccpai);
        let keep = sccpai.states_of(bottom);
        let tokill: Vec<StateId> = sccpa
            .states()
            .filter(|s| keep.binary_search(s).is_err())
            .collect();
        sccpa.remove_states(&tokill);
        let normmap = sccpa.normalize(ret.num_states());
        for st in keep {
            origps.insert(normmap[st], backmap[st].clone());
        }
        ret.insert(&sccpa);

        // locate the state of the trimmed part that represents `repps`: walk
        // a word leading from the subset of its (arbitrary) entry state to
        // the representative, replayed deterministically
        let mut repst = sccpa.init();
        let entry = psa
            .tag
            .get(&origps[&sccpa.init()])
            .ok_or(DetError::UnknownPowerset)?;
        if entry != rep {
            let path = find_path(psa, entry, rep);
            debug_assert!(!path.is_empty(), "representative reachable within its SCC");
            for x in word_from_path(psa, &path) {
                let sucs = sccpa.succ(repst, x);
                if sucs.len() != 1 {
                    return Err(DetError::NotDeterministic);
                }
                repst = sucs[0];
            }
        }
        ps2pa.insert(rep, repst);

        // walk the powerset SCC and simulate it in the trimmed part to map
        // every subset of this component
        let mut failed: Option<DetError> = None;
        bfs(rep, |&st, work| {
            let pst = ps2pa[&st];
            for x in psa.state_outsyms(st) {
                for sucst in psa.succ(st, x) {
                    if ps2pa.contains_key(&sucst) || psai.scc_of(sucst) != scc {
                        continue;
                    }
                    let pasucs = sccpa.succ(pst, x);
                    if pasucs.len() != 1 {
                        failed = Some(DetError::NotDeterministic);
                        work.halt();
                        return;
                    }
                    ps2pa.insert(sucst, pasucs[0]);
                    work.push(sucst);
                }
            }
        });
        if let Some(e) = failed {
            return Err(e);
        }
    }

    debug_assert_eq!(
        ps2pa.values().collect::<OrderedSet<_>>().len(),
        ps2pa.len(),
        "the powerset-to-DPA map must be injective"
    );
    ret.set_init(ps2pa[&psa.init()]);

    // add the inter-SCC edges along a walk of the result; the subsets they
    // connect cannot lie on a common cycle, so their priority is irrelevant
    let num_syms = ret.num_syms();
    bfs(ret.init(), |&st, work| {
        let pst = psa
            .tag
            .get(&origps[&st])
            .expect("stitched states carry known subsets");
        for x in 0..num_syms {
            if ret.succ(st, x).is_empty() {
                let psucs = psa.succ(pst, x);
                debug_assert!(psucs.len() <= 1);
                if let Some(&psuc) = psucs.first() {
                    let target_empty = psa
                        .tag
                        .tag_of(psuc)
                        .is_some_and(|subset| subset.is_empty());
                    if !target_empty {
                        ret.add_edge(st, x, ps2pa[&psuc], Some(0));
                    }
                }
            }
            for suc in ret.succ(st, x) {
                work.push(suc);
            }
        }
    });

    debug!(
        "stitched {} powerset components into a DPA with {} states",
        psai.num_sccs(),
        ret.num_states()
    );
    Ok(ret)
}
