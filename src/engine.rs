use std::time::Duration;

use crate::{
    error::{EvaluationFailure, InputError},
    stochastic::StochasticConfig,
    Pfa, Show, StateId, Symbol,
};

/// Identifies the engine that produced an [`Estimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MethodKind {
    /// Matrix products, see [`Pfa::evaluate_exact`].
    Exact,
    /// Sampled random walks, see [`Pfa::evaluate_stochastic`].
    Stochastic,
}

impl Show for MethodKind {
    fn show(&self) -> String {
        match self {
            MethodKind::Exact => "Matrix Product",
            MethodKind::Stochastic => "Monte Carlo",
        }
        .to_string()
    }
}

/// The uniform result of an [`Evaluator`], regardless of which engine backs it.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate<S> {
    /// The evaluated word.
    pub word: Vec<S>,
    /// The engine that produced the estimate.
    pub method: MethodKind,
    /// The (estimated) acceptance probability.
    pub probability: f64,
    /// Time the evaluation took.
    pub elapsed: Duration,
    /// Set if the word could not be evaluated properly, the probability is `0` then.
    pub failure: Option<EvaluationFailure>,
}

/// The evaluation contract that both engines fulfil: given an automaton and a word, produce
/// an acceptance probability.
pub trait Evaluator<Q, S> {
    /// Which kind of engine this is.
    fn kind(&self) -> MethodKind;

    /// Computes or estimates the acceptance probability of `word` in `pfa`.
    fn estimate(&self, pfa: &Pfa<Q, S>, word: &[S]) -> Result<Estimate<S>, InputError>;
}

/// Evaluates words exactly through [`Pfa::evaluate_exact`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExactEngine;

impl<Q: StateId, S: Symbol> Evaluator<Q, S> for ExactEngine {
    fn kind(&self) -> MethodKind {
        MethodKind::Exact
    }

    fn estimate(&self, pfa: &Pfa<Q, S>, word: &[S]) -> Result<Estimate<S>, InputError> {
        let result = pfa.evaluate_exact(word);
        Ok(Estimate {
            word: result.word,
            method: MethodKind::Exact,
            probability: result.probability,
            elapsed: result.elapsed,
            failure: result.failure,
        })
    }
}

/// Estimates acceptance probabilities through [`Pfa::evaluate_stochastic`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StochasticEngine(pub StochasticConfig);

impl<Q: StateId, S: Symbol> Evaluator<Q, S> for StochasticEngine {
    fn kind(&self) -> MethodKind {
        MethodKind::Stochastic
    }

    fn estimate(&self, pfa: &Pfa<Q, S>, word: &[S]) -> Result<Estimate<S>, InputError> {
        let failure = pfa.symbol_indices(word).err();
        let result = pfa.evaluate_stochastic(word, &self.0)?;
        Ok(Estimate {
            word: result.word,
            method: MethodKind::Stochastic,
            probability: result.acceptance_rate,
            elapsed: result.elapsed,
            failure,
        })
    }
}

/// The closed set of evaluation methods. Both variants implement [`Evaluator`] by delegating
/// to [`ExactEngine`] and [`StochasticEngine`] respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Exact evaluation through matrix products.
    Exact,
    /// Monte Carlo estimation with the given configuration.
    Stochastic(StochasticConfig),
}

impl Default for Method {
    fn default() -> Self {
        Method::Stochastic(StochasticConfig::default())
    }
}

impl<Q: StateId, S: Symbol> Evaluator<Q, S> for Method {
    fn kind(&self) -> MethodKind {
        match self {
            Method::Exact => MethodKind::Exact,
            Method::Stochastic(_) => MethodKind::Stochastic,
        }
    }

    fn estimate(&self, pfa: &Pfa<Q, S>, word: &[S]) -> Result<Estimate<S>, InputError> {
        match self {
            Method::Exact => ExactEngine.estimate(pfa, word),
            Method::Stochastic(config) => StochasticEngine(*config).estimate(pfa, word),
        }
    }
}
