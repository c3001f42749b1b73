//! Library for analyzing probabilistic finite automata (PFA) in Rust.
//!
//! A PFA consists of a finite set of states $Q$, an alphabet $\Sigma$, a designated initial state and a set of accepting states. In contrast to a deterministic automaton, reading a symbol $a$ in a state $q$ does not lead to a single successor but to a probability distribution over successors. Pairs $(q, a)$ for which no distribution is given are dead ends: a run that reaches them simply dies. If the distribution for some pair has total mass below one, the missing mass is interpreted as the probability of the run aborting on that step (see [`Pfa::substochastic_transitions`]).
//!
//! The central question is how likely a given finite word is accepted. The crate answers it in two independent ways. The [`exact`] engine multiplies the initial vector with one transition matrix per symbol and projects onto the accepting states, repetitions of a single symbol are handled with exponentiation by squaring so that even very long words stay cheap. The [`stochastic`] engine samples random walks through the automaton and reports acceptance rate and path probability statistics. As the number of trials grows, the two agree, which is the main consistency check the crate offers.
//!
//! On top of these two engines sit
//! - [`cutpoint`], which classifies a word as lying above or below a probability threshold,
//! - [`search`], which enumerates all words up to a length bound and collects those whose probability satisfies a threshold or interval criterion within a wall-clock budget,
//! - [`loops`], which compares both engines on powers $a^k$ of a single symbol and on the probability of returning to a state after $k$ steps,
//! - [`benchmark`], which collects side-by-side engine results into tables.
//!
//! Which engine is used is decided through the closed [`Method`] enumeration, both variants of which implement the [`Evaluator`] trait. All operations return plain value records that can be rendered through the [`Show`] trait.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use pfa::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        automaton::{Pfa, PfaBuilder, PROBABILITY_TOLERANCE},
        benchmark::{Benchmark, BenchmarkRow},
        cutpoint::CutPointDecision,
        engine::{Estimate, Evaluator, ExactEngine, Method, MethodKind, StochasticEngine},
        error::{EvaluationFailure, InputError, ValidationError},
        exact::{ExactEvaluation, PowerEvaluation},
        loops::LoopComparison,
        math,
        search::{Criterion, LengthTiming, SearchConfig, SearchMatch, SearchOutcome, TimingSummary},
        stochastic::{PowerEstimate, StochasticConfig, StochasticEvaluation},
        Show, StateId, Symbol,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the crate and
/// do not really fit to the top level.
pub mod math;

/// Defines the error types of the crate.
pub mod error;

/// Defines the probabilistic automaton itself, its validation and the matrix views on it.
pub mod automaton;
pub use automaton::Pfa;

/// Exact evaluation through matrix products.
pub mod exact;

/// Monte Carlo evaluation through sampled random walks.
pub mod stochastic;

/// The shared evaluation contract and the closed enumeration of evaluation methods.
pub mod engine;
pub use engine::{Evaluator, Method};

/// Cut-point classification of words.
pub mod cutpoint;

/// Bounded exhaustive search for words meeting a probability criterion.
pub mod search;

/// Comparison of both engines on loops of a single symbol.
pub mod loops;

/// Side-by-side engine comparison tables.
pub mod benchmark;

use std::{fmt::Debug, hash::Hash, time::Duration};

use itertools::Itertools;

/// A state identifier. States are ordered, and the order determines the index a state
/// receives in the matrix and vector views of a [`Pfa`].
pub trait StateId: Clone + Ord + Hash + Debug + Show {}

impl<T: Clone + Ord + Hash + Debug + Show> StateId for T {}

/// A symbol of the alphabet. The order on symbols determines the order in which
/// [`Pfa::search`] enumerates words.
pub trait Symbol: Clone + Ord + Hash + Debug + Show {}

impl<T: Clone + Ord + Hash + Debug + Show> Symbol for T {}

/// Helper trait which can be used to display states, symbols, words and the records
/// produced by the engines.
pub trait Show {
    /// Returns a human readable representation of `self`. For a state this could be q0, for a word
    /// "abba" and for an analysis result a table. This is mainly used for reporting and in error messages.
    fn show(&self) -> String;
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl Show for str {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for usize {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for u32 {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for u8 {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for f64 {
    fn show(&self) -> String {
        format!("{self:.6}")
    }
}

impl Show for bool {
    fn show(&self) -> String {
        match self {
            true => "+",
            false => "-",
        }
        .to_string()
    }
}

impl Show for Duration {
    fn show(&self) -> String {
        format!("{:.3}ms", self.as_secs_f64() * 1000.0)
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        format!("\"{}\"", self.iter().map(|x| x.show()).join(""))
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show> Show for Option<S> {
    fn show(&self) -> String {
        match self {
            None => "-".to_string(),
            Some(x) => x.show(),
        }
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
