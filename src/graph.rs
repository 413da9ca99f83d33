//! Graph traversal helpers: a generic BFS driver plus reachability, shortest
//! path and path-to-word utilities on automata.

use std::collections::VecDeque;

use crate::aut::Aut;
use crate::math::{OrderedMap, OrderedSet};
use crate::{StateId, Sym};

/// Worklist handle passed to the visitor of [`bfs`]. The visitor enqueues
/// neighbors through [`Bfs::push`]; each vertex is handed to the visitor at
/// most once, in first-enqueued order.
pub struct Bfs<T> {
    queue: VecDeque<T>,
    visited: OrderedSet<T>,
    halted: bool,
}

impl<T: Ord + Clone> Bfs<T> {
    /// Enqueues `item` unless it was enqueued before.
    pub fn push(&mut self, item: T) {
        if !self.halted && self.visited.insert(item.clone()) {
            self.queue.push_back(item);
        }
    }

    /// Whether `item` has been enqueued at some point.
    pub fn seen(&self, item: &T) -> bool {
        self.visited.contains(item)
    }

    /// Stops the traversal; no further vertices are visited.
    pub fn halt(&mut self) {
        self.halted = true;
        self.queue.clear();
    }
}

/// Runs a breadth-first traversal from `seed`. The visitor receives each
/// vertex exactly once together with the worklist handle used to enqueue
/// neighbors.
pub fn bfs<T: Ord + Clone>(seed: T, mut visit: impl FnMut(&T, &mut Bfs<T>)) {
    let mut work = Bfs {
        queue: VecDeque::new(),
        visited: OrderedSet::new(),
        halted: false,
    };
    work.push(seed);
    while let Some(item) = work.queue.pop_front() {
        if work.halted {
            break;
        }
        visit(&item, &mut work);
    }
}

/// Returns the sorted list of states reachable from `from`, including `from`
/// itself.
pub fn reachable_states<T: Ord + Clone>(aut: &Aut<T>, from: StateId) -> Vec<StateId> {
    let mut reached = OrderedSet::new();
    bfs(from, |&st, work| {
        reached.insert(st);
        for suc in aut.succ_any(st) {
            work.push(suc);
        }
    });
    reached.into_iter().collect()
}

/// Returns the sorted list of states that can not be reached from `from`.
pub fn unreachable_states<T: Ord + Clone>(aut: &Aut<T>, from: StateId) -> Vec<StateId> {
    let reachable = reachable_states(aut, from);
    aut.states()
        .filter(|s| reachable.binary_search(s).is_err())
        .collect()
}

/// Finds a shortest state sequence from `from` to `to`, both included.
/// Returns an empty sequence if `to` is unreachable. A path from a state to
/// itself requires at least one edge.
pub fn find_path<T: Ord + Clone>(aut: &Aut<T>, from: StateId, to: StateId) -> Vec<StateId> {
    let mut pred: OrderedMap<StateId, StateId> = OrderedMap::new();
    bfs(from, |&st, work| {
        for suc in aut.succ_any(st) {
            if !pred.contains_key(&suc) {
                pred.insert(suc, st);
                work.push(suc);
            }
        }
    });

    if !pred.contains_key(&to) {
        return vec![];
    }
    let mut path = vec![to, pred[&to]];
    while *path.last().unwrap() != from {
        path.push(pred[path.last().unwrap()]);
    }
    path.reverse();
    path
}

/// Returns a symbol sequence realizing the given state sequence, picking the
/// least symbol at every step.
///
/// # Panics
/// Panics if some step of the sequence is not an edge of the automaton.
pub fn word_from_path<T: Ord + Clone>(aut: &Aut<T>, path: &[StateId]) -> Vec<Sym> {
    assert!(path.len() >= 2);
    let mut word = Vec::with_capacity(path.len() - 1);
    for win in path.windows(2) {
        let sym = aut
            .state_outsyms(win[0])
            .into_iter()
            .find(|&x| aut.succ(win[0], x).contains(&win[1]))
            .expect("no symbol realizes a step of the given path");
        word.push(sym);
    }
    word
}
