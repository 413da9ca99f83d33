//! Determinization of nondeterministic Büchi automata (NBA) into
//! deterministic parity automata (DPA).
//!
//! The crate is built around three pieces:
//! - [`Aut`], a mutable labeled parity automaton over an alphabet that is the
//!   power set of a fixed list of atomic propositions,
//! - the macro-state type [`Level`] together with its successor computation,
//!   which generalizes the subset construction with enough structure to
//!   assign parity priorities to transitions,
//! - the determinization drivers in [`det`], which explore macro states
//!   breadth-first and either build one DPA in a single pass or determinize
//!   each strongly connected component of the powerset automaton separately
//!   and stitch the parts back together.
//!
//! The resulting automata are transition-based and use the min-even parity
//! condition: a run is accepting iff the least priority it takes infinitely
//! often is even.

pub mod aut;
pub mod det;
pub mod graph;
pub mod level;
pub mod math;
pub mod parity;
pub mod partition;
pub mod powerset;
pub mod priorities;
pub mod run;
pub mod scc;
pub mod tagmap;

/// Identifier of an automaton state. Operations may temporarily leave gaps in
/// the used ids; [`Aut::normalize`] restores a contiguous range.
pub type StateId = usize;

/// A symbol of the alphabet, i.e. a valuation of the atomic propositions
/// encoded as an integer below `2^|AP|`.
pub type Sym = usize;

/// A parity priority. Unassigned slots are represented as `None` rather than
/// with a sentinel value.
pub type Priority = u32;

pub use aut::Aut;
pub use det::{determinize, determinize_scc, determinize_set, DetError};
pub use level::{DetConf, Level};
pub use parity::ParityType;
pub use partition::PartitionRefiner;
pub use powerset::{adj_matrix, powerset_automaton, powersucc, AdjMat};
pub use scc::{get_sccs, SccDecomposition};
pub use tagmap::TagMap;
