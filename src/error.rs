use thiserror::Error;

/// Errors that are raised while constructing a [`crate::Pfa`]. They are never deferred
/// to evaluation time, an automaton that was built successfully is valid.
///
/// States and symbols are stored in their [`crate::Show`] representation.
#[derive(Debug, Clone, PartialEq, Error)]
#[allow(missing_docs)]
pub enum ValidationError {
    #[error("the automaton has no states")]
    NoStates,
    #[error("no start state was given")]
    MissingStart,
    #[error("start state `{0}` is not a state of the automaton")]
    UnknownStartState(String),
    #[error("accepting state `{0}` is not a state of the automaton")]
    UnknownAcceptState(String),
    #[error("transition ({state}, {symbol}) leaves from unknown state `{state}`")]
    UnknownSourceState { state: String, symbol: String },
    #[error("transition ({state}, {symbol}) reads symbol `{symbol}` which is not in the alphabet")]
    UnknownSymbol { state: String, symbol: String },
    #[error("transition ({state}, {symbol}) leads to unknown state `{target}`")]
    UnknownTargetState {
        state: String,
        symbol: String,
        target: String,
    },
    #[error("transition ({state}, {symbol}) is given more than once")]
    DuplicateTransition { state: String, symbol: String },
    #[error("transition ({state}, {symbol}) lists target `{target}` more than once")]
    DuplicateTarget {
        state: String,
        symbol: String,
        target: String,
    },
    #[error(
        "transition ({state}, {symbol}) assigns invalid probability {probability} to `{target}`"
    )]
    InvalidProbability {
        state: String,
        symbol: String,
        target: String,
        probability: f64,
    },
    #[error("outcomes of ({state}, {symbol}) sum to {total}, which exceeds 1")]
    ExcessMass {
        state: String,
        symbol: String,
        total: f64,
    },
    #[error(
        "outcomes of ({state}, {symbol}) only sum to {total} and substochastic transitions are not allowed"
    )]
    DeficientMass {
        state: String,
        symbol: String,
        total: f64,
    },
}

/// Errors caused by invalid arguments to an operation. These abort the single call
/// they are raised in and are never coerced into a valid value.
#[derive(Debug, Clone, PartialEq, Error)]
#[allow(missing_docs)]
pub enum InputError {
    #[error("threshold {0} is not in [0, 1]")]
    ThresholdOutOfRange(f64),
    #[error("[{low}, {high}] is not a valid probability interval")]
    InvalidInterval { low: f64, high: f64 },
    #[error("both a threshold and an interval were given, expected exactly one")]
    AmbiguousCriterion,
    #[error("neither a threshold nor an interval was given, expected exactly one")]
    MissingCriterion,
    #[error("number of steps must be at least 1, got {0}")]
    NonPositiveSteps(usize),
    #[error("symbol `{0}` is not in the alphabet")]
    UnknownSymbol(String),
    #[error("`{0}` is not a state of the automaton")]
    UnknownState(String),
    #[error("number of trials must be at least 1")]
    NoTrials,
}

/// Failures during an evaluation that are reported inside the result record instead of
/// aborting. A batch operation like [`crate::Pfa::search`] simply moves on to the next word.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum EvaluationFailure {
    #[error("symbol `{symbol}` at position {position} is not in the alphabet")]
    UnknownSymbol { symbol: String, position: usize },
}
