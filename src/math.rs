use std::collections::BTreeSet;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;
/// Type alias for sets with a deterministic iteration order, used where the order in which
/// elements are reported matters (for example when rendering accept states).
pub type OrderedSet<S> = BTreeSet<S>;
