use crate::{error::ValidationError, Pfa, StateId, Symbol};

/// Helper struct for the construction of a [`Pfa`]. It collects states, symbols, transitions,
/// the start state and the accepting states and validates all of them at once when
/// [`PfaBuilder::build`] is called.
///
/// States and symbols are never added implicitly, a transition that mentions a state or symbol
/// which was not declared through [`PfaBuilder::with_states`] or [`PfaBuilder::with_alphabet`]
/// makes the construction fail.
///
/// # Example
///
/// We want to create a PFA with two states `q0` and `q1` over the alphabet `['a', 'b']`, where
/// reading `a` in `q0` moves to either state with equal probability, and `b` keeps `q1` in place.
/// Reading `b` in `q0` and `a` in `q1` is undefined.
/// ```
/// use pfa::prelude::*;
///
/// let pfa: Pfa = Pfa::builder()
///     .with_states(["q0", "q1"])
///     .with_alphabet(['a', 'b'])
///     .with_transition("q0", 'a', [("q0", 0.5), ("q1", 0.5)])
///     .with_transition("q1", 'b', [("q1", 1.0)])
///     .with_start("q0")
///     .with_accepting(["q1"])
///     .build()
///     .unwrap();
/// assert!(pfa.step(&"q0".to_string(), &'b').is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PfaBuilder<Q = String, S = char> {
    states: Vec<Q>,
    alphabet: Vec<S>,
    transitions: Vec<((Q, S), Vec<(Q, f64)>)>,
    start: Option<Q>,
    accepting: Vec<Q>,
    allow_substochastic: bool,
}

impl<Q, S> Default for PfaBuilder<Q, S> {
    fn default() -> Self {
        Self {
            states: vec![],
            alphabet: vec![],
            transitions: vec![],
            start: None,
            accepting: vec![],
            allow_substochastic: false,
        }
    }
}

impl<Q: StateId, S: Symbol> PfaBuilder<Q, S> {
    /// Declares the given states.
    pub fn with_states<X, I>(mut self, states: I) -> Self
    where
        X: Into<Q>,
        I: IntoIterator<Item = X>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Declares the given symbols.
    pub fn with_alphabet<X, I>(mut self, symbols: I) -> Self
    where
        X: Into<S>,
        I: IntoIterator<Item = X>,
    {
        self.alphabet.extend(symbols.into_iter().map(Into::into));
        self
    }

    /// Sets the distribution over successors when reading `symbol` in `state`.
    pub fn with_transition<X, Y, D>(
        mut self,
        state: impl Into<Q>,
        symbol: impl Into<S>,
        outcomes: D,
    ) -> Self
    where
        X: Into<Q>,
        Y: Into<f64>,
        D: IntoIterator<Item = (X, Y)>,
    {
        self.transitions.push((
            (state.into(), symbol.into()),
            outcomes
                .into_iter()
                .map(|(q, p)| (q.into(), p.into()))
                .collect(),
        ));
        self
    }

    /// Adds a collection of transitions, each given as a triple of source state, symbol and
    /// distribution over successors.
    pub fn with_transitions<X, Y, D, I>(self, transitions: I) -> Self
    where
        X: Into<Q>,
        Y: Into<S>,
        D: IntoIterator<Item = (X, f64)>,
        I: IntoIterator<Item = (X, Y, D)>,
    {
        transitions
            .into_iter()
            .fold(self, |acc, (state, symbol, outcomes)| {
                acc.with_transition(state, symbol, outcomes)
            })
    }

    /// Sets the start state.
    pub fn with_start(mut self, state: impl Into<Q>) -> Self {
        self.start = Some(state.into());
        self
    }

    /// Marks the given states as accepting.
    pub fn with_accepting<X, I>(mut self, states: I) -> Self
    where
        X: Into<Q>,
        I: IntoIterator<Item = X>,
    {
        self.accepting.extend(states.into_iter().map(Into::into));
        self
    }

    /// Determines whether transitions whose outcomes sum to less than one are accepted.
    pub fn allow_substochastic(mut self, allow: bool) -> Self {
        self.allow_substochastic = allow;
        self
    }

    /// Validates everything that was collected and produces the automaton.
    pub fn build(self) -> Result<Pfa<Q, S>, ValidationError> {
        let start = self.start.ok_or(ValidationError::MissingStart)?;
        Pfa::new(
            self.states,
            self.alphabet,
            self.transitions,
            start,
            self.accepting,
            self.allow_substochastic,
        )
    }
}
