//! Collection type aliases used throughout the crate. Ordered variants back
//! everything whose iteration order feeds state-id assignment, so that two
//! runs on the same input produce identical automata.

use std::collections::{BTreeMap, BTreeSet};

/// Type alias for sets with a deterministic, sorted iteration order.
pub type OrderedSet<S> = BTreeSet<S>;

/// Type alias for maps with a deterministic, sorted iteration order.
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Type alias for sets that only need insertion-ordered iteration.
pub type Set<S> = indexmap::IndexSet<S>;

/// Type alias for maps that only need insertion-ordered iteration.
pub type Map<K, V> = indexmap::IndexMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping
/// which associates each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;
