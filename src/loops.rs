use std::time::{Duration, Instant};

use owo_colors::OwoColorize;

use crate::{
    error::InputError, stochastic::StochasticConfig, Pfa, Show, StateId, Symbol,
};

/// Both engines' answers for the same loop `symbol^k`, either for acceptance from the start
/// state or, if `state` is set, for returning to `state`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopComparison<Q, S> {
    /// The repeated symbol.
    pub symbol: S,
    /// The number of repetitions.
    pub k: usize,
    /// The state whose return probability was computed, `None` for acceptance probabilities.
    pub state: Option<Q>,
    /// Result of the exact engine.
    pub exact_probability: f64,
    /// Result of the Monte Carlo engine.
    pub stochastic_probability: f64,
    /// Standard error of the Monte Carlo result.
    pub stderr: f64,
    /// The number of sampled walks.
    pub trials: usize,
    /// Running Monte Carlo estimate, if it was requested.
    pub trace: Option<Vec<f64>>,
    /// Time spent in the exact engine.
    pub exact_elapsed: Duration,
    /// Time spent in the Monte Carlo engine.
    pub stochastic_elapsed: Duration,
}

impl<Q, S> LoopComparison<Q, S> {
    /// The absolute difference between both engines.
    pub fn disagreement(&self) -> f64 {
        (self.exact_probability - self.stochastic_probability).abs()
    }

    /// Returns true if the engines disagree by at most `z` standard errors.
    pub fn within_standard_errors(&self, z: f64) -> bool {
        self.disagreement() <= z * self.stderr
    }
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Compares [`Pfa::evaluate_exact_power`] with [`Pfa::evaluate_stochastic_power`] on
    /// `symbol^k`. Both engines always run, neither result is preferred.
    ///
    /// Fails if `symbol` is not in the alphabet, if `k` is zero or if no trials are requested.
    pub fn compare_power(
        &self,
        symbol: &S,
        k: usize,
        config: &StochasticConfig,
    ) -> Result<LoopComparison<Q, S>, InputError> {
        config.validate()?;
        let exact = self.evaluate_exact_power(symbol, k)?;
        let estimate = self.evaluate_stochastic_power(symbol, k, config)?;
        Ok(LoopComparison {
            symbol: symbol.clone(),
            k,
            state: None,
            exact_probability: exact.probability,
            stochastic_probability: estimate.probability,
            stderr: estimate.stderr,
            trials: estimate.trials,
            trace: estimate.trace,
            exact_elapsed: exact.elapsed,
            stochastic_elapsed: estimate.elapsed,
        })
    }

    /// Compares [`Pfa::return_probability`] with [`Pfa::estimate_return_probability`] for
    /// returning to `state` after reading `symbol` exactly `k` times.
    pub fn compare_return(
        &self,
        symbol: &S,
        state: &Q,
        k: usize,
        config: &StochasticConfig,
    ) -> Result<LoopComparison<Q, S>, InputError> {
        config.validate()?;
        let start = Instant::now();
        let exact_probability = self.return_probability(symbol, state, k)?;
        let exact_elapsed = start.elapsed();
        let estimate = self.estimate_return_probability(symbol, state, k, config)?;
        Ok(LoopComparison {
            symbol: symbol.clone(),
            k,
            state: Some(state.clone()),
            exact_probability,
            stochastic_probability: estimate.probability,
            stderr: estimate.stderr,
            trials: estimate.trials,
            trace: estimate.trace,
            exact_elapsed,
            stochastic_elapsed: estimate.elapsed,
        })
    }
}

impl<Q: Show, S: Show> Show for LoopComparison<Q, S> {
    fn show(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            [
                "Symbol",
                "State",
                "Steps (k)",
                "Exact Prob",
                "MC Prob",
                "MC Std. Error",
                "Exact Time",
                "MC Time",
            ]
            .map(String::from),
        );
        builder.push_record([
            self.symbol.show(),
            self.state.show(),
            self.k.show(),
            self.exact_probability.show().green().to_string(),
            self.stochastic_probability.show().blue().to_string(),
            self.stderr.show(),
            self.exact_elapsed.show(),
            self.stochastic_elapsed.show(),
        ]);
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}
