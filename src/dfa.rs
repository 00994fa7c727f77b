use std::str::FromStr;

use itertools::Itertools;
use tracing::trace;

use crate::{
    alphabet::CharAlphabet,
    build::{self, BuildError},
    math::{Map, OrderedSet},
    state::{DefaultIdType, State, StateId},
    Show,
};

/// A deterministic finite automaton over single-`char` symbols.
///
/// A [`Dfa`] owns its state table, its [`CharAlphabet`], the designated start state and the
/// set of accept states. Instances can only be obtained through [`Dfa::from_fields`] (or the
/// [`FromStr`] impl), which parses the five-field encoding and validates the result, so every
/// value of this type is guaranteed to have a total, alphabet-closed transition function.
///
/// The automaton itself is immutable; running a word drives a separate [`Walk`] value, which
/// means a shared `&Dfa` can serve any number of independent [`run`](Dfa::run) calls, also
/// from multiple threads at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dfa {
    states: Vec<State>,
    index: Map<String, StateId>,
    alphabet: CharAlphabet,
    start: StateId,
    accept: OrderedSet<StateId>,
}

impl Dfa {
    /// Constructs a [`Dfa`] from the five fields of the encoding, in order: state names
    /// (comma-separated), alphabet (one symbol per character), transitions, start state
    /// name and accept state names (comma-separated).
    ///
    /// Either every field parses and the structural validation passes, or the specific
    /// [`BuildError`] is returned and no automaton is created.
    ///
    /// # Example
    /// ```
    /// use dfa_builder::prelude::*;
    ///
    /// // accepts every word over {a, b} with at least two a's
    /// let dfa = Dfa::from_fields([
    ///     "q0,q1,q2",
    ///     "ab",
    ///     "q0:a,q1;b,q0.q1:a,q2;b,q1.q2:a,q2;b,q2.",
    ///     "q0",
    ///     "q2",
    /// ])
    /// .unwrap();
    /// assert!(dfa.run("baba"));
    /// assert!(!dfa.run("ab"));
    /// ```
    pub fn from_fields<I, S>(fields: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        build::build(fields)
    }

    pub(crate) fn assemble(
        states: Vec<State>,
        index: Map<String, StateId>,
        alphabet: CharAlphabet,
        start: StateId,
        accept: OrderedSet<StateId>,
    ) -> Self {
        Self {
            states,
            index,
            alphabet,
            start,
            accept,
        }
    }

    /// Returns a reference to the alphabet of this automaton.
    pub fn alphabet(&self) -> &CharAlphabet {
        &self.alphabet
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the id of the start state.
    pub fn start(&self) -> StateId {
        self.start
    }

    /// Returns the name of the start state.
    pub fn start_name(&self) -> &str {
        self.state(self.start).name()
    }

    /// Looks up the id of the state with the given name.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.index.get(name).copied()
    }

    /// Returns a reference to the state with the given id.
    ///
    /// # Panics
    /// Panics if `id` was not handed out by this automaton.
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Returns the name of the state with the given id.
    ///
    /// # Panics
    /// Panics if `id` was not handed out by this automaton.
    pub fn state_name(&self, id: StateId) -> &str {
        self.state(id).name()
    }

    /// Returns an iterator over all states together with their ids, in declaration order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> + '_ {
        self.states
            .iter()
            .enumerate()
            .map(|(i, state)| (StateId(i as DefaultIdType), state))
    }

    /// Returns an iterator over the names of all states, in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(|state| state.name())
    }

    /// Returns whether the state with the given id is accepting.
    pub fn is_accepting(&self, id: StateId) -> bool {
        self.accept.contains(&id)
    }

    /// Returns an iterator over the names of the accept states, in declaration order.
    pub fn accept_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.accept.iter().map(|&id| self.state_name(id))
    }

    /// Returns the destination of the transition from the state `id` on `symbol`, or `None`
    /// if no such edge exists. Since validation guarantees totality, this only returns
    /// `None` for symbols outside the alphabet.
    ///
    /// # Panics
    /// Panics if `id` was not handed out by this automaton.
    pub fn transition(&self, id: StateId, symbol: char) -> Option<StateId> {
        self.state(id).transition_on(symbol)
    }

    /// Re-runs the structural validation predicate that construction already enforced. As
    /// the automaton cannot be mutated after construction, this can only ever fail if a
    /// future code path breaks that guarantee; [`run`](Dfa::run) asserts it in debug builds.
    pub fn check(&self) -> Result<(), BuildError> {
        let defects =
            build::structural_defects(&self.states, &self.alphabet, self.start, &self.accept);
        if defects.is_empty() {
            Ok(())
        } else {
            Err(BuildError::InvalidAutomaton(defects))
        }
    }

    /// Begins a new [`Walk`] at the start state.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            dfa: self,
            current: Some(self.start),
        }
    }

    /// Runs the automaton on the given word and returns whether it is accepted.
    ///
    /// The word is read symbol by symbol from a fresh walk that begins at the start state.
    /// If some symbol has no outgoing edge from the current state, the walk is stuck and the
    /// word is rejected immediately, without consuming the remaining input. Otherwise the
    /// word is accepted precisely if the state reached after the last symbol is accepting.
    /// The empty word is accepted precisely if the start state is.
    pub fn run<W: AsRef<str>>(&self, word: W) -> bool {
        debug_assert!(self.check().is_ok());
        let word = word.as_ref();
        let mut walk = self.walk();
        for symbol in word.chars() {
            if !walk.step(symbol) {
                trace!("run of {:?} got stuck on '{}'", word, symbol);
                return false;
            }
        }
        walk.accepted()
    }

    /// Renders the transition table of this automaton as a string. The start state is
    /// prefixed with an arrow and accept states are printed in bold. Symbols without an
    /// edge (which validation rules out) show up as `-`.
    pub fn transition_table(&self) -> String {
        use owo_colors::OwoColorize;
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string())
                .chain(self.alphabet.universe().map(|sym| sym.to_string())),
        );
        for (id, state) in self.states() {
            let mut name = state.name().to_string();
            if id == self.start {
                name = format!("→{}", name);
            }
            if self.is_accepting(id) {
                name = name.bold().to_string();
            }
            let mut row = vec![name];
            for sym in self.alphabet.universe() {
                match state.transition_on(sym) {
                    Some(dest) => row.push(self.state_name(dest).to_string()),
                    None => row.push("-".to_string()),
                }
            }
            builder.push_record(row);
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

impl FromStr for Dfa {
    type Err = BuildError;

    /// Parses an automaton from the newline-separated form of the encoding, one field
    /// per line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fields(s.lines())
    }
}

impl Show for Dfa {
    fn show(&self) -> String {
        format!(
            "DFA over {} with states {{{}}} starting in {}\n{}",
            self.alphabet.show(),
            self.state_names().join(", "),
            self.start_name(),
            self.transition_table()
        )
    }
}

/// A single traversal of a [`Dfa`], holding the current-state cursor.
///
/// A walk starts out at the start state and advances one symbol at a time through
/// [`step`](Walk::step). Once a symbol without an outgoing edge is encountered the walk
/// becomes stuck, which is terminal: every further step fails and the walk can never
/// accept. Keeping the cursor here instead of inside the automaton is what makes the
/// automaton itself freely shareable.
#[derive(Clone, Copy, Debug)]
pub struct Walk<'a> {
    dfa: &'a Dfa,
    current: Option<StateId>,
}

impl<'a> Walk<'a> {
    /// Advances the cursor on the given symbol. Returns whether a matching edge existed;
    /// if none did, the walk is stuck from now on.
    pub fn step(&mut self, symbol: char) -> bool {
        match self
            .current
            .and_then(|id| self.dfa.state(id).transition_on(symbol))
        {
            Some(next) => {
                self.current = Some(next);
                true
            }
            None => {
                self.current = None;
                false
            }
        }
    }

    /// Returns the id of the state the cursor currently points to, or `None` if the walk
    /// is stuck.
    pub fn current(&self) -> Option<StateId> {
        self.current
    }

    /// Returns whether the walk is stuck, i.e. a previous step found no matching edge.
    pub fn is_stuck(&self) -> bool {
        self.current.is_none()
    }

    /// Returns whether the walk currently sits in an accept state. A stuck walk never
    /// accepts.
    pub fn accepted(&self) -> bool {
        self.current.is_some_and(|id| self.dfa.is_accepting(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn at_least_two_as() -> Dfa {
        Dfa::from_fields([
            "q0,q1,q2",
            "ab",
            "q0:a,q1;b,q0.q1:a,q2;b,q1.q2:a,q2;b,q2.",
            "q0",
            "q2",
        ])
        .unwrap()
    }

    #[test]
    fn scenario_acceptance() {
        let dfa = at_least_two_as();
        assert!(dfa.run("aa"));
        assert!(!dfa.run("ab"));
        assert!(!dfa.run(""));
    }

    #[test]
    fn runs_are_independent() {
        let dfa = at_least_two_as();
        assert!(dfa.run("aaaa"));
        // the second run starts from q0 again, not from the absorbing q2
        assert!(!dfa.run("b"));

        let fresh = at_least_two_as();
        assert_eq!(dfa.run("aaaa"), fresh.run("aaaa"));
        assert_eq!(dfa.run("b"), at_least_two_as().run("b"));
    }

    #[test_log::test]
    fn stuck_run_stops_immediately() {
        let dfa = at_least_two_as();
        // 'x' is not in the alphabet, so no edge can exist for it; the trailing
        // "aa" would reach the accept state if it were still consumed
        assert!(!dfa.run("xaa"));

        let mut walk = dfa.walk();
        assert!(!walk.step('x'));
        assert!(walk.is_stuck());
        assert_eq!(walk.current(), None);
        // stuck is terminal
        assert!(!walk.step('a'));
        assert!(!walk.accepted());
    }

    #[test]
    fn walk_steps_through_states() {
        let dfa = at_least_two_as();
        let q1 = dfa.state_id("q1").unwrap();
        let q2 = dfa.state_id("q2").unwrap();

        let mut walk = dfa.walk();
        assert_eq!(walk.current(), Some(dfa.start()));
        assert!(walk.step('a'));
        assert_eq!(walk.current(), Some(q1));
        assert!(!walk.accepted());
        assert!(walk.step('a'));
        assert_eq!(walk.current(), Some(q2));
        assert!(walk.accepted());
    }

    #[test]
    fn introspection_accessors() {
        let dfa = at_least_two_as();
        assert_eq!(dfa.size(), 3);
        assert_eq!(dfa.alphabet().size(), 2);
        assert_eq!(dfa.start_name(), "q0");
        assert_eq!(dfa.state_names().collect::<Vec<_>>(), vec!["q0", "q1", "q2"]);
        assert_eq!(dfa.accept_names().collect::<Vec<_>>(), vec!["q2"]);

        let q0 = dfa.state_id("q0").unwrap();
        let q1 = dfa.state_id("q1").unwrap();
        assert_eq!(dfa.state_name(q1), "q1");
        assert_eq!(dfa.transition(q0, 'a'), Some(q1));
        assert_eq!(dfa.transition(q0, 'x'), None);
        assert!(!dfa.is_accepting(q0));
        assert!(dfa.check().is_ok());
    }

    #[test]
    fn parses_from_newline_separated_string() {
        let dfa: Dfa = "q0,q1\nab\nq0:a,q1;b,q0.q1:a,q1;b,q1.\nq0\nq1"
            .parse()
            .unwrap();
        assert!(dfa.run("ba"));
        assert!(!dfa.run("bbb"));

        assert_eq!(
            "q0\nab".parse::<Dfa>(),
            Err(BuildError::MalformedEncoding { fields: 2 })
        );
    }

    #[test]
    fn transition_table_lists_all_states() {
        let dfa = at_least_two_as();
        let table = dfa.transition_table();
        for name in ["q0", "q1", "q2"] {
            assert!(table.contains(name), "{} missing from\n{}", name, table);
        }
        assert!(table.contains("State"));
    }

    #[test]
    fn automaton_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dfa>();

        let dfa = at_least_two_as();
        std::thread::scope(|scope| {
            let first = scope.spawn(|| dfa.run("aba"));
            let second = scope.spawn(|| dfa.run("bb"));
            assert!(first.join().unwrap());
            assert!(!second.join().unwrap());
        });
    }
}
