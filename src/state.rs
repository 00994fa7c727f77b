use std::fmt::Debug;

use crate::{alphabet::CharAlphabet, math::Map};

/// The type that is used to index states by default.
pub type DefaultIdType = u32;

/// Identifies a state within the state table of its owning [`Dfa`](crate::Dfa).
///
/// States reference each other through these lightweight indices instead of pointers, which
/// keeps the automaton free of reference cycles and trivially clonable. An id is only
/// meaningful together with the automaton that handed it out.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub(crate) DefaultIdType);

impl StateId {
    /// Returns the position of the identified state in the owning state table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single named state of an automaton together with its outgoing transitions.
///
/// The transition mapping associates at most one destination with each symbol. It is
/// populated while the transitions field of the encoding is parsed and never changes
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    name: String,
    edges: Map<char, StateId>,
}

impl State {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            edges: Map::default(),
        }
    }

    /// Returns the name under which this state was declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records `destination` as the successor on `symbol`. Returns whether the edge was
    /// actually added, which is not the case if `symbol` lies outside the owning automaton's
    /// `alphabet` or if an edge for `symbol` exists already. In both cases the state is left
    /// untouched, so the first recorded edge for a symbol always wins.
    pub fn add_transition(
        &mut self,
        alphabet: &CharAlphabet,
        symbol: char,
        destination: StateId,
    ) -> bool {
        if !alphabet.contains(symbol) {
            return false;
        }
        if self.edges.contains_key(&symbol) {
            return false;
        }
        self.edges.insert(symbol, destination);
        true
    }

    /// Returns the state to which this state transitions on `symbol`, or `None` if no such
    /// edge is defined. The absence of an edge is what makes a run stuck and what the
    /// validation pass reports as a missing edge.
    pub fn transition_on(&self, symbol: char) -> Option<StateId> {
        self.edges.get(&symbol).copied()
    }

    /// Returns an iterator over all outgoing edges as `(symbol, destination)` pairs. The
    /// iteration order is unspecified.
    pub fn edges(&self) -> impl Iterator<Item = (char, StateId)> + '_ {
        self.edges.iter().map(|(sym, id)| (*sym, *id))
    }

    /// Gives the number of outgoing edges this state has.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{State, StateId};
    use crate::alphabet::CharAlphabet;

    #[test]
    fn first_recorded_edge_wins() {
        let alphabet = CharAlphabet::of_size(2);
        let mut state = State::new("q0".to_string());
        assert!(state.add_transition(&alphabet, 'a', StateId(1)));
        assert!(!state.add_transition(&alphabet, 'a', StateId(0)));
        assert_eq!(state.transition_on('a'), Some(StateId(1)));
        assert_eq!(state.edge_count(), 1);
    }

    #[test]
    fn foreign_symbols_are_refused() {
        let alphabet = CharAlphabet::of_size(2);
        let mut state = State::new("q0".to_string());
        assert!(!state.add_transition(&alphabet, 'x', StateId(0)));
        assert_eq!(state.transition_on('x'), None);
        assert_eq!(state.edge_count(), 0);
    }
}
