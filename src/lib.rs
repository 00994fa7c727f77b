//! Library for building and running deterministic finite automata (DFAs) from a compact textual encoding.
//!
//! A DFA is described by exactly five ordered fields: the state names, the alphabet, the transition
//! table, the start state and the accepting states. The [`Dfa`](crate::Dfa) type parses such an
//! encoding, validates that the result is structurally a DFA (the transition function is total over
//! the alphabet and no transition is keyed by a foreign symbol, see [`build::Defect`]) and then
//! answers membership queries for input words. Construction is atomic: either every field parses
//! and validation passes, or a [`build::BuildError`] describes the first problem encountered and no
//! automaton is handed out.
//!
//! Words are run without mutating the automaton. [`Dfa::run`](crate::Dfa::run) drives a fresh
//! [`Walk`](crate::dfa::Walk) from the start state through the word, so a `&Dfa` can be shared
//! freely (also across threads) and every run is independent of the ones before it. A walk that
//! encounters a symbol without an outgoing edge becomes stuck and the word is rejected without
//! consuming the remaining input.
//!
//! The encoding itself is line-oriented, an example accepting all words over `{a, b}` that contain
//! at least one `a`:
//! ```text
//! q0,q1
//! ab
//! q0:a,q1;b,q0.q1:a,q1;b,q1.
//! q0
//! q1
//! ```
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use dfa_builder::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::CharAlphabet,
        build::{BuildError, Defect, TransitionDefect},
        dfa::{Dfa, Walk},
        state::{DefaultIdType, State, StateId},
        Show,
    };
}

/// This module contains definitions of mathematical objects (sets, maps) which are used
/// throughout the crate and do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets.
pub mod alphabet;
pub use alphabet::CharAlphabet;

/// Defines states of an automaton and the identifiers through which they reference each other.
pub mod state;
pub use state::{State, StateId};

/// Parsing of the five-field encoding and structural validation of the result.
pub mod build;
pub use build::BuildError;

/// Defines the automaton itself together with the walk/run machinery.
pub mod dfa;
pub use dfa::{Dfa, Walk};

/// Helper trait which is used for displaying objects in a human readable way, mainly
/// for debugging purposes and for the surrounding presentation layer.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state this should be
    /// for example q0, q1, q2, ... and for a symbol just the character itself.
    fn show(&self) -> String;
    /// Show a collection of the thing, for a collection of states this should be
    /// {q0, q1, q2, ...} and for a collection of symbols the concatenation of them.
    /// By default this is unimplemented.
    fn show_collection<'a, I>(_iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        unimplemented!("This operation makes no sense.")
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }

    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        use itertools::Itertools;
        format!("{{{}}}", iter.into_iter().join(", "))
    }
}
