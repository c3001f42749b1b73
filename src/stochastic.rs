use std::{
    iter,
    time::{Duration, Instant},
};

use tracing::trace;

use crate::{
    automaton::{Outcome, PROBABILITY_TOLERANCE},
    error::InputError,
    math::RunningStats,
    Pfa, Show, StateId, Symbol,
};

/// Configures a Monte Carlo estimation: how many walks are sampled, whether the random
/// draws are seeded and whether the running estimate is recorded.
///
/// ```
/// use pfa::prelude::*;
///
/// let config = StochasticConfig::new(1_000).with_seed(7).with_trace();
/// assert_eq!(config.trials(), 1_000);
/// assert_eq!(config.seed(), Some(7));
/// assert!(config.records_trace());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StochasticConfig {
    trials: usize,
    seed: Option<u64>,
    trace: bool,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl StochasticConfig {
    /// Samples `trials` walks with process-ambient randomness and without a trace.
    pub fn new(trials: usize) -> Self {
        Self {
            trials,
            seed: None,
            trace: false,
        }
    }

    /// Makes the sequence of random draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Records the running estimate after every trial in [`PowerEstimate::trace`].
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// The number of sampled walks.
    pub fn trials(&self) -> usize {
        self.trials
    }

    /// The seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Whether the running estimate is recorded.
    pub fn records_trace(&self) -> bool {
        self.trace
    }

    pub(crate) fn validate(&self) -> Result<(), InputError> {
        if self.trials == 0 {
            return Err(InputError::NoTrials);
        }
        Ok(())
    }

    pub(crate) fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Result of estimating the acceptance probability of a word by sampling random walks.
#[derive(Debug, Clone, PartialEq)]
pub struct StochasticEvaluation<S> {
    /// The evaluated word.
    pub word: Vec<S>,
    /// The number of sampled walks.
    pub trials: usize,
    /// Fraction of walks that ended in an accepting state.
    pub acceptance_rate: f64,
    /// Mean over all walks of the product of the probabilities of the steps taken. Walks that
    /// die contribute `0`.
    pub mean_path_probability: f64,
    /// Sample standard deviation of the path probabilities.
    pub stddev_path_probability: f64,
    /// Number of walks that died, either on an undefined transition or because the
    /// drawn outcome fell into the missing mass of a substochastic transition.
    pub stuck_walks: usize,
    /// Time the sampling took.
    pub elapsed: Duration,
}

/// Monte Carlo estimate for a repeated single symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerEstimate<S> {
    /// The repeated symbol.
    pub symbol: S,
    /// The number of repetitions.
    pub k: usize,
    /// The number of sampled walks.
    pub trials: usize,
    /// The estimated probability, i.e. the fraction of successful walks.
    pub probability: f64,
    /// Standard error of the estimate, `stddev / sqrt(trials)`.
    pub stderr: f64,
    /// The estimate after each trial, only present if requested through
    /// [`StochasticConfig::with_trace`].
    pub trace: Option<Vec<f64>>,
    /// Time the sampling took.
    pub elapsed: Duration,
}

/// Outcome of a single simulated walk.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Walk {
    end: Option<usize>,
    path_probability: f64,
}

/// Draws one of the `outcomes` according to their probabilities. If the outcomes sum to less
/// than one, the missing mass leads to `None`.
fn draw(outcomes: &[Outcome], rng: &mut fastrand::Rng) -> Option<Outcome> {
    pick(outcomes, rng.f64())
}

/// Selects the outcome whose cumulative interval contains `value`. Outcomes that sum to one
/// up to [`PROBABILITY_TOLERANCE`] count as a full distribution, so a `value` beyond their
/// total still selects the last outcome.
fn pick(outcomes: &[Outcome], value: f64) -> Option<Outcome> {
    let mut cumulative = 0.0;
    for outcome in outcomes {
        cumulative += outcome.probability;
        if value < cumulative {
            return Some(*outcome);
        }
    }
    if cumulative >= 1.0 - PROBABILITY_TOLERANCE {
        outcomes.last().copied()
    } else {
        None
    }
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Runs a single walk from `from`. A `None` symbol is unknown and kills the walk just like an
    /// undefined transition does.
    fn walk<I>(&self, from: usize, symbols: I, rng: &mut fastrand::Rng) -> Walk
    where
        I: IntoIterator<Item = Option<usize>>,
    {
        let mut current = from;
        let mut path_probability = 1.0;
        for sym in symbols {
            let Some(outcome) = sym
                .and_then(|sym| self.successors(current, sym))
                .and_then(|outcomes| draw(outcomes, rng))
            else {
                return Walk {
                    end: None,
                    path_probability: 0.0,
                };
            };
            current = outcome.target;
            path_probability *= outcome.probability;
        }
        Walk {
            end: Some(current),
            path_probability,
        }
    }

    /// Estimates the acceptance probability of `word` by sampling `config.trials()` random walks.
    ///
    /// Each walk starts in the start state. For every symbol the successor is drawn according to
    /// the distribution of the current transition and the probability of the chosen outcome is
    /// multiplied into the path probability. If the transition is undefined (or the symbol is not
    /// in the alphabet) the walk dies, it counts as rejecting with path probability `0`. A walk that
    /// survives the whole word is accepting iff it ends in an accepting state.
    ///
    /// As the number of trials grows, the acceptance rate converges to the probability computed
    /// by [`Pfa::evaluate_exact`].
    pub fn evaluate_stochastic(
        &self,
        word: &[S],
        config: &StochasticConfig,
    ) -> Result<StochasticEvaluation<S>, InputError> {
        config.validate()?;
        let mut rng = config.rng();
        Ok(self.simulate(word, config.trials(), &mut rng))
    }

    /// Does the actual sampling for [`Pfa::evaluate_stochastic`] with a caller-provided source of
    /// randomness, which lets a search reuse one seeded generator across many words.
    pub(crate) fn simulate(
        &self,
        word: &[S],
        trials: usize,
        rng: &mut fastrand::Rng,
    ) -> StochasticEvaluation<S> {
        let start = Instant::now();
        let symbols: Vec<Option<usize>> = word.iter().map(|s| self.symbol_index(s)).collect();

        let mut accepted = 0;
        let mut stuck_walks = 0;
        let mut paths = RunningStats::new();
        for _ in 0..trials {
            let walk = self.walk(self.start_index(), symbols.iter().copied(), rng);
            match walk.end {
                Some(end) if self.is_accepting_index(end) => accepted += 1,
                Some(_) => {}
                None => stuck_walks += 1,
            }
            paths.push(walk.path_probability);
        }

        trace!(
            "sampled {trials} walks for {}, {accepted} accepted and {stuck_walks} died",
            word.show()
        );

        StochasticEvaluation {
            word: word.to_vec(),
            trials,
            acceptance_rate: accepted as f64 / trials.max(1) as f64,
            mean_path_probability: paths.mean(),
            stddev_path_probability: paths.stddev(),
            stuck_walks,
            elapsed: start.elapsed(),
        }
    }

    /// Estimates the acceptance probability of `symbol^k` by sampling. The cost of this grows
    /// linearly in `k`, whereas [`Pfa::evaluate_exact_power`] only needs `O(log k)` matrix
    /// products, which is why the elapsed time is reported alongside the standard error.
    ///
    /// Fails if `symbol` is not in the alphabet, if `k` is zero or if no trials are requested.
    pub fn evaluate_stochastic_power(
        &self,
        symbol: &S,
        k: usize,
        config: &StochasticConfig,
    ) -> Result<PowerEstimate<S>, InputError> {
        let sym = self.require_symbol(symbol)?;
        if k < 1 {
            return Err(InputError::NonPositiveSteps(k));
        }
        config.validate()?;

        let from = self.start_index();
        Ok(self.estimate_indicator(symbol, k, config, |rng| {
            self.walk(from, iter::repeat(Some(sym)).take(k), rng)
                .end
                .is_some_and(|end| self.is_accepting_index(end))
        }))
    }

    /// Estimates the probability of being back in `state` after reading `symbol` exactly `k`
    /// times when starting in `state`. This is the sampling counterpart of
    /// [`Pfa::return_probability`] and fails under the same conditions, or if no trials are
    /// requested.
    pub fn estimate_return_probability(
        &self,
        symbol: &S,
        state: &Q,
        k: usize,
        config: &StochasticConfig,
    ) -> Result<PowerEstimate<S>, InputError> {
        let sym = self.require_symbol(symbol)?;
        let index = self.require_state(state)?;
        if k < 1 {
            return Err(InputError::NonPositiveSteps(k));
        }
        config.validate()?;

        Ok(self.estimate_indicator(symbol, k, config, |rng| {
            self.walk(index, iter::repeat(Some(sym)).take(k), rng).end == Some(index)
        }))
    }

    fn estimate_indicator<F>(
        &self,
        symbol: &S,
        k: usize,
        config: &StochasticConfig,
        mut trial: F,
    ) -> PowerEstimate<S>
    where
        F: FnMut(&mut fastrand::Rng) -> bool,
    {
        let start = Instant::now();
        let mut rng = config.rng();
        let mut stats = RunningStats::new();
        let mut trace = config.records_trace().then(|| Vec::with_capacity(config.trials()));

        for _ in 0..config.trials() {
            stats.push(if trial(&mut rng) { 1.0 } else { 0.0 });
            if let Some(trace) = trace.as_mut() {
                trace.push(stats.mean());
            }
        }

        trace!(
            "estimated {}^{k} with {} trials: {:.6} ± {:.6}",
            symbol.show(),
            config.trials(),
            stats.mean(),
            stats.standard_error()
        );

        PowerEstimate {
            symbol: symbol.clone(),
            k,
            trials: config.trials(),
            probability: stats.mean(),
            stderr: stats.standard_error(),
            trace,
            elapsed: start.elapsed(),
        }
    }
}
