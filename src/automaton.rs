use std::{collections::BTreeSet, fmt::Debug};

use bit_set::BitSet;
use tracing::{trace, warn};

use crate::{
    error::{EvaluationFailure, InputError, ValidationError},
    math::{self, Bijection, Map, Matrix, Set, Vector},
    StateId, Symbol,
};

mod builder;
pub use builder::PfaBuilder;

/// Tolerance that is used when checking whether the outcomes of a transition sum to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-8;

/// A single possible outcome of reading a symbol in a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Outcome {
    pub(crate) target: usize,
    pub(crate) probability: f64,
}

/// A probabilistic finite automaton over states of type `Q` and symbols of type `S`.
///
/// Every state and every symbol is assigned a fixed index, which is its position in the
/// sorted order of all states or symbols respectively. These indices determine the rows and
/// columns of the [`Pfa::transition_matrices`] as well as the entries of
/// [`Pfa::initial_vector`] and [`Pfa::final_vector`].
///
/// For each pair of a state and a symbol there is either a probability distribution over
/// successor states or nothing, in which case the transition is undefined and a run reading
/// the symbol in that state dies. The automaton is validated on construction and cannot be
/// modified afterwards, so it can be shared freely between evaluations.
///
/// # Example
/// ```
/// use pfa::prelude::*;
///
/// let pfa: Pfa = Pfa::builder()
///     .with_states(["q1", "q2"])
///     .with_alphabet(['a'])
///     .with_transition("q1", 'a', [("q1", 0.5), ("q2", 0.5)])
///     .with_transition("q2", 'a', [("q1", 0.3), ("q2", 0.7)])
///     .with_start("q1")
///     .with_accepting(["q2"])
///     .build()
///     .unwrap();
/// assert_eq!(pfa.size(), 2);
/// assert_eq!(pfa.evaluate_exact(&['a']).probability, 0.5);
/// ```
pub struct Pfa<Q = String, S = char> {
    states: Bijection<Q, usize>,
    alphabet: Bijection<S, usize>,
    // indexed by `state * alphabet.len() + symbol`
    successors: Vec<Option<Vec<Outcome>>>,
    start_state: Q,
    start: usize,
    accepting: BitSet,
    allow_substochastic: bool,
}

impl<Q: StateId, S: Symbol> Clone for Pfa<Q, S> {
    fn clone(&self) -> Self {
        Self {
            states: self.states.clone(),
            alphabet: self.alphabet.clone(),
            successors: self.successors.clone(),
            start_state: self.start_state.clone(),
            start: self.start,
            accepting: self.accepting.clone(),
            allow_substochastic: self.allow_substochastic,
        }
    }
}

impl<Q: StateId, S: Symbol> Debug for Pfa<Q, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pfa")
            .field("states", &self.states)
            .field("alphabet", &self.alphabet)
            .field("successors", &self.successors)
            .field("start_state", &self.start_state)
            .field("accepting", &self.accepting)
            .field("allow_substochastic", &self.allow_substochastic)
            .finish()
    }
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Instantiates a new [`PfaBuilder`].
    pub fn builder() -> PfaBuilder<Q, S> {
        PfaBuilder::default()
    }

    /// Creates a new automaton and validates it. The given `transitions` map pairs of a state and
    /// a symbol to a distribution over successor states. Pairs that do not appear are undefined.
    ///
    /// Construction fails if there are no states, if the start state, an accepting state or a state
    /// or symbol occurring in `transitions` is unknown, if a probability is not in `[0, 1]`, if the
    /// outcomes of a pair sum to more than `1 + PROBABILITY_TOLERANCE`, or if they sum to less than
    /// `1 - PROBABILITY_TOLERANCE` while `allow_substochastic` is `false`. Substochastic pairs that
    /// are allowed produce a warning.
    pub fn new<T, D>(
        states: impl IntoIterator<Item = Q>,
        alphabet: impl IntoIterator<Item = S>,
        transitions: T,
        start: Q,
        accepting: impl IntoIterator<Item = Q>,
        allow_substochastic: bool,
    ) -> Result<Self, ValidationError>
    where
        T: IntoIterator<Item = ((Q, S), D)>,
        D: IntoIterator<Item = (Q, f64)>,
    {
        let states: Bijection<Q, usize> = states
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, q)| (q, i))
            .collect();
        if states.is_empty() {
            return Err(ValidationError::NoStates);
        }

        let alphabet: Bijection<S, usize> = alphabet
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, s)| (s, i))
            .collect();

        let start_index = *states
            .get_by_left(&start)
            .ok_or_else(|| ValidationError::UnknownStartState(start.show()))?;

        let mut accepting_indices = BitSet::with_capacity(states.len());
        for q in accepting {
            let index = states
                .get_by_left(&q)
                .ok_or_else(|| ValidationError::UnknownAcceptState(q.show()))?;
            accepting_indices.insert(*index);
        }

        let mut successors = vec![None; states.len() * alphabet.len()];
        for ((state, symbol), distribution) in transitions {
            let (Some(&source), Some(&sym)) =
                (states.get_by_left(&state), alphabet.get_by_left(&symbol))
            else {
                return Err(if states.contains_left(&state) {
                    ValidationError::UnknownSymbol {
                        state: state.show(),
                        symbol: symbol.show(),
                    }
                } else {
                    ValidationError::UnknownSourceState {
                        state: state.show(),
                        symbol: symbol.show(),
                    }
                });
            };

            let slot = &mut successors[source * alphabet.len() + sym];
            if slot.is_some() {
                return Err(ValidationError::DuplicateTransition {
                    state: state.show(),
                    symbol: symbol.show(),
                });
            }

            let mut seen = Set::default();
            let mut outcomes = Vec::new();
            let mut total = 0.0;
            for (target, probability) in distribution {
                let Some(&target_index) = states.get_by_left(&target) else {
                    return Err(ValidationError::UnknownTargetState {
                        state: state.show(),
                        symbol: symbol.show(),
                        target: target.show(),
                    });
                };
                if !seen.insert(target_index) {
                    return Err(ValidationError::DuplicateTarget {
                        state: state.show(),
                        symbol: symbol.show(),
                        target: target.show(),
                    });
                }
                if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
                    return Err(ValidationError::InvalidProbability {
                        state: state.show(),
                        symbol: symbol.show(),
                        target: target.show(),
                        probability,
                    });
                }
                total += probability;
                outcomes.push(Outcome {
                    target: target_index,
                    probability,
                });
            }

            if total > 1.0 + PROBABILITY_TOLERANCE {
                return Err(ValidationError::ExcessMass {
                    state: state.show(),
                    symbol: symbol.show(),
                    total,
                });
            }
            if total < 1.0 - PROBABILITY_TOLERANCE {
                if !allow_substochastic {
                    return Err(ValidationError::DeficientMass {
                        state: state.show(),
                        symbol: symbol.show(),
                        total,
                    });
                }
                warn!(
                    "outcomes of ({}, {}) only sum to {total}, the remaining mass aborts the run",
                    state.show(),
                    symbol.show()
                );
            }

            outcomes.sort_by_key(|o| o.target);
            *slot = Some(outcomes);
        }

        trace!(
            "constructed automaton with {} states over {} symbols",
            states.len(),
            alphabet.len()
        );

        Ok(Self {
            states,
            alphabet,
            successors,
            start_state: start,
            start: start_index,
            accepting: accepting_indices,
            allow_substochastic,
        })
    }

    /// Returns the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Iterates over all states in the order of their indices.
    pub fn states(&self) -> impl Iterator<Item = &Q> + '_ {
        self.states.left_values()
    }

    /// Iterates over all symbols in sorted order.
    pub fn alphabet(&self) -> impl Iterator<Item = &S> + '_ {
        self.alphabet.left_values()
    }

    /// Returns the initial state.
    pub fn start_state(&self) -> &Q {
        &self.start_state
    }

    /// Iterates over the accepting states in the order of their indices.
    pub fn accept_states(&self) -> impl Iterator<Item = &Q> + '_ {
        self.states
            .iter()
            .filter(|(_, i)| self.accepting.contains(**i))
            .map(|(q, _)| q)
    }

    /// Returns true if and only if `state` is an accepting state.
    pub fn is_accepting(&self, state: &Q) -> bool {
        self.state_index(state)
            .is_some_and(|i| self.accepting.contains(i))
    }

    /// Whether transitions with a total mass below one were accepted on construction.
    pub fn allows_substochastic(&self) -> bool {
        self.allow_substochastic
    }

    /// Returns the index of `state` in the matrix and vector views, if it exists.
    pub fn state_index(&self, state: &Q) -> Option<usize> {
        self.states.get_by_left(state).copied()
    }

    /// Returns the index of `symbol`, if it is part of the alphabet.
    pub fn symbol_index(&self, symbol: &S) -> Option<usize> {
        self.alphabet.get_by_left(symbol).copied()
    }

    /// Returns the distribution over successors when reading `symbol` in `state`. Gives `None`
    /// if the transition is undefined or if `state` or `symbol` are unknown.
    pub fn step(&self, state: &Q, symbol: &S) -> Option<Vec<(&Q, f64)>> {
        let outcomes = self.successors(self.state_index(state)?, self.symbol_index(symbol)?)?;
        Some(
            outcomes
                .iter()
                .filter_map(|o| Some((self.states.get_by_right(&o.target)?, o.probability)))
                .collect(),
        )
    }

    /// Lists all defined transitions whose outcomes sum to less than one (up to
    /// [`PROBABILITY_TOLERANCE`]) together with their total mass.
    pub fn substochastic_transitions(&self) -> Vec<(&Q, &S, f64)> {
        self.states
            .iter()
            .flat_map(|(q, &i)| {
                self.alphabet.iter().filter_map(move |(s, &j)| {
                    let total: f64 = self.successors(i, j)?.iter().map(|o| o.probability).sum();
                    (total < 1.0 - PROBABILITY_TOLERANCE).then_some((q, s, total))
                })
            })
            .collect()
    }

    /// Returns true if every defined transition has total mass one.
    pub fn is_stochastic(&self) -> bool {
        self.substochastic_transitions().is_empty()
    }

    /// Builds the transition matrix for every symbol in a single pass over all transitions.
    pub fn transition_matrices(&self) -> Map<S, Matrix> {
        let mut matrices: Vec<Matrix> = (0..self.alphabet.len())
            .map(|_| Matrix::zeros((self.size(), self.size())))
            .collect();
        for (position, outcomes) in self.successors.iter().enumerate() {
            let Some(outcomes) = outcomes else {
                continue;
            };
            let (source, sym) = (
                position / self.alphabet.len(),
                position % self.alphabet.len(),
            );
            for o in outcomes {
                matrices[sym][[source, o.target]] = o.probability;
            }
        }
        self.alphabet.left_values().cloned().zip(matrices).collect()
    }

    /// Builds the transition matrix for `symbol`, or `None` if it is not in the alphabet.
    pub fn transition_matrix(&self, symbol: &S) -> Option<Matrix> {
        self.symbol_index(symbol).map(|sym| self.matrix_at(sym))
    }

    /// Gives the row vector that is `1` at the index of the start state and `0` elsewhere.
    pub fn initial_vector(&self) -> Vector {
        math::one_hot(self.size(), self.start)
    }

    /// Gives the column vector that is `1` at the index of each accepting state and `0` elsewhere.
    pub fn final_vector(&self) -> Vector {
        let mut vector = Vector::zeros(self.size());
        for i in &self.accepting {
            vector[i] = 1.0;
        }
        vector
    }

    pub(crate) fn start_index(&self) -> usize {
        self.start
    }

    pub(crate) fn is_accepting_index(&self, state: usize) -> bool {
        self.accepting.contains(state)
    }

    pub(crate) fn successors(&self, state: usize, symbol: usize) -> Option<&[Outcome]> {
        self.successors
            .get(state * self.alphabet.len() + symbol)?
            .as_deref()
    }

    pub(crate) fn matrix_at(&self, symbol: usize) -> Matrix {
        let mut matrix = Matrix::zeros((self.size(), self.size()));
        for source in 0..self.size() {
            for o in self.successors(source, symbol).unwrap_or_default() {
                matrix[[source, o.target]] = o.probability;
            }
        }
        matrix
    }

    /// Translates `word` into symbol indices, reporting the first symbol that is not in the alphabet.
    pub(crate) fn symbol_indices(&self, word: &[S]) -> Result<Vec<usize>, EvaluationFailure> {
        word.iter()
            .enumerate()
            .map(|(position, symbol)| {
                self.symbol_index(symbol)
                    .ok_or_else(|| EvaluationFailure::UnknownSymbol {
                        symbol: symbol.show(),
                        position,
                    })
            })
            .collect()
    }

    pub(crate) fn require_symbol(&self, symbol: &S) -> Result<usize, InputError> {
        self.symbol_index(symbol)
            .ok_or_else(|| InputError::UnknownSymbol(symbol.show()))
    }

    pub(crate) fn require_state(&self, state: &Q) -> Result<usize, InputError> {
        self.state_index(state)
            .ok_or_else(|| InputError::UnknownState(state.show()))
    }
}
