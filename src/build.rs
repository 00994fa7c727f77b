//! Turns the five-field textual encoding into a validated [`Dfa`].
//!
//! The fields are parsed strictly in order (states, alphabet, transitions, start state,
//! accept states) because the later fields reference names that the states field declares.
//! Each sub-parser fails fast with the specific [`BuildError`] it detects; after all five
//! fields parsed, a structural validation pass checks that the transition function is total
//! over the alphabet and not keyed by foreign symbols. Only when that pass finds no
//! [`Defect`] is a [`Dfa`] handed out.

use itertools::Itertools;
use tracing::{debug, trace, warn};

use crate::{
    alphabet::CharAlphabet,
    dfa::Dfa,
    math::{Map, OrderedSet, Set},
    state::{DefaultIdType, State, StateId},
};

/// The number of fields an encoding must consist of.
const FIELD_COUNT: usize = 5;

/// The ways in which constructing an automaton from an encoding can fail. Every failure is
/// fatal to the construction attempt, no partially built automaton is ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The encoding does not consist of exactly five fields.
    MalformedEncoding {
        /// How many fields were actually supplied.
        fields: usize,
    },
    /// The states field declares the same state name twice.
    DuplicateState(String),
    /// The alphabet field declares the same symbol twice.
    DuplicateSymbol(char),
    /// The accept states field lists the same state twice.
    DuplicateAcceptState(String),
    /// A state name referenced in the transitions or accept states field does not resolve
    /// to a declared state.
    UnknownState(String),
    /// The start state field does not resolve to a declared state.
    UnknownStartState(String),
    /// The transition scanner reached an inconsistent state, see [`TransitionDefect`].
    MalformedTransition(TransitionDefect),
    /// The parsed automaton is not structurally a DFA. Contains every [`Defect`] the
    /// validation pass found.
    InvalidAutomaton(Vec<Defect>),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::MalformedEncoding { fields } => {
                write!(f, "Encoding has {} fields, expected {}", fields, FIELD_COUNT)
            }
            BuildError::DuplicateState(name) => write!(f, "State \"{}\" is declared twice", name),
            BuildError::DuplicateSymbol(sym) => write!(f, "Symbol '{}' is declared twice", sym),
            BuildError::DuplicateAcceptState(name) => {
                write!(f, "State \"{}\" is listed twice as accepting", name)
            }
            BuildError::UnknownState(name) => {
                write!(f, "Referenced state \"{}\" was never declared", name)
            }
            BuildError::UnknownStartState(name) => {
                write!(f, "Start state \"{}\" was never declared", name)
            }
            BuildError::MalformedTransition(defect) => {
                write!(f, "Malformed transitions field: {}", defect)
            }
            BuildError::InvalidAutomaton(defects) => {
                write!(f, "Automaton is not a DFA: {}", defects.iter().join(", "))
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// The inconsistencies the transition scanner can run into. The scanner is a three-mode
/// state machine (reading a source name, reading a symbol, reading a destination name),
/// which makes every malformed branch of the micro-grammar enumerable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDefect {
    /// A `,` was reached before any symbol character was buffered.
    CommaWithoutSymbol,
    /// A `,` appeared inside a destination name, so the previous pair was never terminated.
    CommaInDestination,
    /// A `;` or `.` was reached while no source-state group was open.
    TerminatorWithoutSource(char),
    /// A `;` or `.` was reached before a transition symbol was captured.
    TerminatorWithoutSymbol(char),
    /// A `:` appeared while a transition group was still open.
    ColonInsideGroup,
    /// The field ended in the middle of a transition group.
    UnterminatedGroup,
}

impl std::fmt::Display for TransitionDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionDefect::CommaWithoutSymbol => {
                write!(f, "',' with no preceding transition symbol")
            }
            TransitionDefect::CommaInDestination => write!(f, "',' inside a destination name"),
            TransitionDefect::TerminatorWithoutSource(term) => {
                write!(f, "'{}' with no open transition group", term)
            }
            TransitionDefect::TerminatorWithoutSymbol(term) => {
                write!(f, "'{}' before any transition symbol was captured", term)
            }
            TransitionDefect::ColonInsideGroup => {
                write!(f, "':' inside an open transition group")
            }
            TransitionDefect::UnterminatedGroup => {
                write!(f, "field ended inside a transition group")
            }
        }
    }
}

/// A structural reason why a parsed automaton is not a DFA. All defects found by the
/// validation pass are reported together in [`BuildError::InvalidAutomaton`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Defect {
    /// A state has no outgoing edge for an alphabet symbol, the transition function is
    /// not total.
    MissingEdge {
        /// Name of the state the edge is missing from.
        state: String,
        /// The alphabet symbol for which no edge exists.
        symbol: char,
    },
    /// A transition is keyed by a symbol outside the declared alphabet.
    ForeignSymbol {
        /// Name of the state carrying the offending transition.
        state: String,
        /// The symbol that is not part of the alphabet.
        symbol: char,
    },
    /// The start state id does not point into the state table.
    StartOutOfRange(StateId),
    /// An accept state id does not point into the state table.
    AcceptOutOfRange(StateId),
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Defect::MissingEdge { state, symbol } => {
                write!(f, "state \"{}\" has no transition on '{}'", state, symbol)
            }
            Defect::ForeignSymbol { state, symbol } => write!(
                f,
                "state \"{}\" transitions on '{}' which is not in the alphabet",
                state, symbol
            ),
            Defect::StartOutOfRange(id) => write!(f, "start state id {:?} is out of range", id),
            Defect::AcceptOutOfRange(id) => write!(f, "accept state id {:?} is out of range", id),
        }
    }
}

/// The modes of the transition scanner. Carrying the resolved source and the captured
/// symbol in the mode itself means an edge can only ever be recorded when both exist.
#[derive(Clone, Copy)]
enum Mode {
    /// Accumulating a source-state name, terminated by `:`.
    Source,
    /// Accumulating a transition symbol, terminated by `,`.
    Symbol { source: StateId },
    /// Accumulating a destination-state name, terminated by `;` or `.`.
    Destination { source: StateId, symbol: char },
}

/// Accumulates the parsed fields and performs the final validation. Callers go through
/// [`Dfa::from_fields`], which guarantees that the sub-parsers run in declaration order.
#[derive(Default)]
struct DfaBuilder {
    states: Vec<State>,
    index: Map<String, StateId>,
    alphabet: CharAlphabet,
    start: Option<StateId>,
    accept: OrderedSet<StateId>,
    foreign: Vec<(StateId, char)>,
}

pub(crate) fn build<I, S>(fields: I) -> Result<Dfa, BuildError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let fields: Vec<S> = fields.into_iter().collect();
    if fields.len() != FIELD_COUNT {
        return Err(BuildError::MalformedEncoding {
            fields: fields.len(),
        });
    }
    let mut builder = DfaBuilder::default();
    builder.parse_states(fields[0].as_ref())?;
    builder.parse_alphabet(fields[1].as_ref())?;
    builder.parse_transitions(fields[2].as_ref())?;
    builder.parse_start(fields[3].as_ref())?;
    builder.parse_accept(fields[4].as_ref())?;
    builder.finish()
}

impl DfaBuilder {
    fn resolve(&self, name: &str) -> Result<StateId, BuildError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::UnknownState(name.to_string()))
    }

    fn parse_states(&mut self, field: &str) -> Result<(), BuildError> {
        if field.is_empty() {
            return Ok(());
        }
        for name in field.split(',') {
            let id = StateId(self.states.len() as DefaultIdType);
            if self.index.insert(name.to_string(), id).is_some() {
                return Err(BuildError::DuplicateState(name.to_string()));
            }
            self.states.push(State::new(name.to_string()));
        }
        trace!("states field declared {} states", self.states.len());
        Ok(())
    }

    fn parse_alphabet(&mut self, field: &str) -> Result<(), BuildError> {
        let mut symbols = Vec::new();
        let mut seen = Set::default();
        for sym in field.chars() {
            if !seen.insert(sym) {
                return Err(BuildError::DuplicateSymbol(sym));
            }
            symbols.push(sym);
        }
        trace!("alphabet field declared {} symbols", symbols.len());
        self.alphabet = CharAlphabet::new(symbols);
        Ok(())
    }

    fn parse_transitions(&mut self, field: &str) -> Result<(), BuildError> {
        let mut mode = Mode::Source;
        let mut buffer = String::new();
        for ch in field.chars() {
            match (mode, ch) {
                (Mode::Source, ':') => {
                    let source = self.resolve(&buffer)?;
                    trace!("opening transition group for state \"{}\"", buffer);
                    buffer.clear();
                    mode = Mode::Symbol { source };
                }
                (Mode::Source, ',') => {
                    return Err(BuildError::MalformedTransition(
                        TransitionDefect::CommaWithoutSymbol,
                    ))
                }
                (Mode::Source, term @ (';' | '.')) => {
                    return Err(BuildError::MalformedTransition(
                        TransitionDefect::TerminatorWithoutSource(term),
                    ))
                }
                (Mode::Symbol { source }, ',') => {
                    // the symbol is the character immediately preceding the comma
                    let Some(symbol) = buffer.chars().last() else {
                        return Err(BuildError::MalformedTransition(
                            TransitionDefect::CommaWithoutSymbol,
                        ));
                    };
                    buffer.clear();
                    mode = Mode::Destination { source, symbol };
                }
                (Mode::Symbol { .. }, term @ (';' | '.')) => {
                    return Err(BuildError::MalformedTransition(
                        TransitionDefect::TerminatorWithoutSymbol(term),
                    ))
                }
                (Mode::Symbol { .. } | Mode::Destination { .. }, ':') => {
                    return Err(BuildError::MalformedTransition(
                        TransitionDefect::ColonInsideGroup,
                    ))
                }
                (Mode::Destination { .. }, ',') => {
                    return Err(BuildError::MalformedTransition(
                        TransitionDefect::CommaInDestination,
                    ))
                }
                (Mode::Destination { source, symbol }, term @ (';' | '.')) => {
                    let destination = self.resolve(&buffer)?;
                    self.record_edge(source, symbol, destination);
                    buffer.clear();
                    mode = if term == '.' {
                        Mode::Source
                    } else {
                        Mode::Symbol { source }
                    };
                }
                (_, other) => buffer.push(other),
            }
        }
        if !matches!(mode, Mode::Source) || !buffer.is_empty() {
            return Err(BuildError::MalformedTransition(
                TransitionDefect::UnterminatedGroup,
            ));
        }
        Ok(())
    }

    fn record_edge(&mut self, source: StateId, symbol: char, destination: StateId) {
        let source_name = self.states[source.index()].name().to_string();
        if !self.alphabet.contains(symbol) {
            warn!(
                "transition from \"{}\" on '{}' uses a symbol outside the alphabet",
                source_name, symbol
            );
            self.foreign.push((source, symbol));
            return;
        }
        if self.states[source.index()].add_transition(&self.alphabet, symbol, destination) {
            trace!(
                "recorded transition \"{}\" --{}--> \"{}\"",
                source_name,
                symbol,
                self.states[destination.index()].name()
            );
        } else {
            // first write wins, the duplicate is dropped
            warn!(
                "dropping duplicate transition from \"{}\" on '{}'",
                source_name, symbol
            );
        }
    }

    fn parse_start(&mut self, field: &str) -> Result<(), BuildError> {
        match self.index.get(field) {
            Some(&id) => {
                self.start = Some(id);
                Ok(())
            }
            None => Err(BuildError::UnknownStartState(field.to_string())),
        }
    }

    fn parse_accept(&mut self, field: &str) -> Result<(), BuildError> {
        if field.is_empty() {
            // an automaton that accepts nothing is still a DFA
            return Ok(());
        }
        for name in field.split(',') {
            let id = self.resolve(name)?;
            if !self.accept.insert(id) {
                return Err(BuildError::DuplicateAcceptState(name.to_string()));
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Dfa, BuildError> {
        let Some(start) = self.start else {
            // parse_start ran before us, this cannot be reached through `build`
            return Err(BuildError::UnknownStartState(String::new()));
        };
        let mut defects: Vec<Defect> = self
            .foreign
            .iter()
            .map(|&(id, symbol)| Defect::ForeignSymbol {
                state: self.states[id.index()].name().to_string(),
                symbol,
            })
            .collect();
        defects.extend(structural_defects(
            &self.states,
            &self.alphabet,
            start,
            &self.accept,
        ));
        if !defects.is_empty() {
            debug!("validation found {} defect(s)", defects.len());
            return Err(BuildError::InvalidAutomaton(defects));
        }
        debug!(
            "built DFA with {} states over {} symbols",
            self.states.len(),
            self.alphabet.size()
        );
        Ok(Dfa::assemble(
            self.states,
            self.index,
            self.alphabet,
            start,
            self.accept,
        ))
    }
}

/// The structural validation predicate. Checks that start and accept ids point into the
/// state table, that every state has an edge for every alphabet symbol and that no edge is
/// keyed by a foreign symbol. Used once after parsing and again by [`Dfa::check`].
pub(crate) fn structural_defects(
    states: &[State],
    alphabet: &CharAlphabet,
    start: StateId,
    accept: &OrderedSet<StateId>,
) -> Vec<Defect> {
    let mut defects = Vec::new();
    if start.index() >= states.len() {
        defects.push(Defect::StartOutOfRange(start));
    }
    for &id in accept {
        if id.index() >= states.len() {
            defects.push(Defect::AcceptOutOfRange(id));
        }
    }
    for state in states {
        for sym in alphabet.universe() {
            if state.transition_on(sym).is_none() {
                defects.push(Defect::MissingEdge {
                    state: state.name().to_string(),
                    symbol: sym,
                });
            }
        }
        for (sym, _) in state.edges() {
            if !alphabet.contains(sym) {
                defects.push(Defect::ForeignSymbol {
                    state: state.name().to_string(),
                    symbol: sym,
                });
            }
        }
    }
    defects
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    const SCENARIO: [&str; 5] = [
        "q0,q1,q2",
        "ab",
        "q0:a,q1;b,q0.q1:a,q2;b,q1.q2:a,q2;b,q2.",
        "q0",
        "q2",
    ];

    fn with_transitions(transitions: &str) -> Result<Dfa, BuildError> {
        Dfa::from_fields([SCENARIO[0], SCENARIO[1], transitions, SCENARIO[3], SCENARIO[4]])
    }

    #[test]
    fn wrong_field_count() {
        assert_eq!(
            Dfa::from_fields(["q0", "a", "q0:a,q0.", "q0"]),
            Err(BuildError::MalformedEncoding { fields: 4 })
        );
        assert_eq!(
            Dfa::from_fields(["q0", "a", "q0:a,q0.", "q0", "q0", "extra"]),
            Err(BuildError::MalformedEncoding { fields: 6 })
        );
    }

    #[test_log::test]
    fn duplicate_state_fails_before_anything_else() {
        // the later fields are garbage on purpose, they must never be looked at
        let result = Dfa::from_fields(["q0,q0", "aa", "nonsense", "nope", ",,"]);
        assert_eq!(result, Err(BuildError::DuplicateState("q0".to_string())));
    }

    #[test]
    fn duplicate_symbol() {
        let result = Dfa::from_fields(["q0", "aba", "q0:a,q0;b,q0.", "q0", "q0"]);
        assert_eq!(result, Err(BuildError::DuplicateSymbol('a')));
    }

    #[test]
    fn unknown_source_state() {
        assert_eq!(
            with_transitions("qX:a,q0."),
            Err(BuildError::UnknownState("qX".to_string()))
        );
    }

    #[test]
    fn unknown_destination_state() {
        assert_eq!(
            with_transitions("q0:a,qX;"),
            Err(BuildError::UnknownState("qX".to_string()))
        );
    }

    #[test]
    fn unknown_start_state() {
        let result = Dfa::from_fields(["q0", "a", "q0:a,q0.", "qX", "q0"]);
        assert_eq!(result, Err(BuildError::UnknownStartState("qX".to_string())));
    }

    #[test]
    fn accept_states_must_resolve_and_be_unique() {
        let fields = ["q0,q1", "a", "q0:a,q1.q1:a,q0.", "q0", "q1,qX"];
        assert_eq!(
            Dfa::from_fields(fields),
            Err(BuildError::UnknownState("qX".to_string()))
        );
        let fields = ["q0,q1", "a", "q0:a,q1.q1:a,q0.", "q0", "q1,q1"];
        assert_eq!(
            Dfa::from_fields(fields),
            Err(BuildError::DuplicateAcceptState("q1".to_string()))
        );
    }

    #[test_log::test]
    fn malformed_transition_branches() {
        for (transitions, defect) in [
            (",a,q0.", TransitionDefect::CommaWithoutSymbol),
            ("q0:,q0.", TransitionDefect::CommaWithoutSymbol),
            (";q0:a,q0.", TransitionDefect::TerminatorWithoutSource(';')),
            (".", TransitionDefect::TerminatorWithoutSource('.')),
            ("q0:a;b,q0.", TransitionDefect::TerminatorWithoutSymbol(';')),
            ("q0:a.", TransitionDefect::TerminatorWithoutSymbol('.')),
            ("q0:a,q0,b.", TransitionDefect::CommaInDestination),
            ("q0:a,q1:b,q0.", TransitionDefect::ColonInsideGroup),
            ("q0:a,q1;b,q0", TransitionDefect::UnterminatedGroup),
            ("q0:a,q1.junk", TransitionDefect::UnterminatedGroup),
        ] {
            assert_eq!(
                with_transitions(transitions),
                Err(BuildError::MalformedTransition(defect)),
                "transitions field {:?}",
                transitions
            );
        }
    }

    #[test]
    fn foreign_symbol_is_a_closure_defect() {
        // alphabet is "ab" but the transitions field also references 'c'
        let fields = ["q0", "ab", "q0:a,q0;b,q0;c,q0.", "q0", "q0"];
        match Dfa::from_fields(fields) {
            Err(BuildError::InvalidAutomaton(defects)) => {
                assert_eq!(
                    defects,
                    vec![Defect::ForeignSymbol {
                        state: "q0".to_string(),
                        symbol: 'c'
                    }]
                );
            }
            other => panic!("expected closure defect, got {:?}", other),
        }
    }

    #[test]
    fn missing_edge_is_a_totality_defect() {
        let result = with_transitions("q0:a,q1;b,q0.q1:a,q2;b,q1.q2:a,q2.");
        match result {
            Err(BuildError::InvalidAutomaton(defects)) => {
                assert_eq!(
                    defects,
                    vec![Defect::MissingEdge {
                        state: "q2".to_string(),
                        symbol: 'b'
                    }]
                );
            }
            other => panic!("expected totality defect, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_transition_keeps_the_first_edge() {
        let fields = ["q0,q1", "ab", "q0:a,q0;a,q1;b,q0.q1:a,q1;b,q1.", "q0", "q1"];
        let dfa = Dfa::from_fields(fields).unwrap();
        let q0 = dfa.state_id("q0").unwrap();
        assert_eq!(dfa.transition(q0, 'a'), Some(q0));
    }

    #[test]
    fn empty_accept_field_builds_a_rejecting_automaton() {
        let dfa = Dfa::from_fields(["q0", "a", "q0:a,q0.", "q0", ""]).unwrap();
        assert!(!dfa.run(""));
        assert!(!dfa.run("aaa"));
    }

    #[test]
    fn errors_render_human_readable() {
        assert_eq!(
            BuildError::DuplicateSymbol('a').to_string(),
            "Symbol 'a' is declared twice"
        );
        let err = BuildError::InvalidAutomaton(vec![Defect::MissingEdge {
            state: "q1".to_string(),
            symbol: 'b',
        }]);
        assert_eq!(
            err.to_string(),
            "Automaton is not a DFA: state \"q1\" has no transition on 'b'"
        );
    }
}
