use std::time::Duration;

use owo_colors::OwoColorize;

use crate::{
    engine::MethodKind, error::InputError, stochastic::StochasticConfig, Pfa, Show, StateId, Symbol,
};

/// One engine's result for one word.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRow<S> {
    /// The evaluated word.
    pub word: Vec<S>,
    /// The engine.
    pub method: MethodKind,
    /// Acceptance probability (exact) or acceptance rate (Monte Carlo).
    pub probability: f64,
    /// Mean path probability, only reported by the Monte Carlo engine.
    pub mean_path_probability: Option<f64>,
    /// Standard deviation of the path probability, only reported by the Monte Carlo engine.
    pub stddev_path_probability: Option<f64>,
    /// Time the engine took.
    pub elapsed: Duration,
    /// Number of sampled walks, only reported by the Monte Carlo engine.
    pub trials: Option<usize>,
}

/// A growing table of engine results. It is owned by the caller, who decides which
/// results to collect and for how long, e.g. over all words a user looked at in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Benchmark<S> {
    rows: Vec<BenchmarkRow<S>>,
}

impl<S> Default for Benchmark<S> {
    fn default() -> Self {
        Self { rows: vec![] }
    }
}

impl<S> Benchmark<S> {
    /// Creates an empty benchmark.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    pub fn push(&mut self, row: BenchmarkRow<S>) {
        self.rows.push(row);
    }

    /// Appends all rows of `other`, keeping their order.
    pub fn extend(&mut self, other: Benchmark<S>) {
        self.rows.extend(other.rows);
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> &[BenchmarkRow<S>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no row was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows produced by the given engine.
    pub fn rows_for(&self, method: MethodKind) -> impl Iterator<Item = &BenchmarkRow<S>> + '_ {
        self.rows.iter().filter(move |row| row.method == method)
    }

    /// Total time spent in the given engine over all rows.
    pub fn total_elapsed(&self, method: MethodKind) -> Duration {
        self.rows_for(method).map(|row| row.elapsed).sum()
    }
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Evaluates `word` with both engines and collects the results in a fresh [`Benchmark`],
    /// the Monte Carlo row first.
    pub fn benchmark(
        &self,
        word: &[S],
        config: &StochasticConfig,
    ) -> Result<Benchmark<S>, InputError> {
        let stochastic = self.evaluate_stochastic(word, config)?;
        let exact = self.evaluate_exact(word);

        let mut benchmark = Benchmark::new();
        benchmark.push(BenchmarkRow {
            word: stochastic.word,
            method: MethodKind::Stochastic,
            probability: stochastic.acceptance_rate,
            mean_path_probability: Some(stochastic.mean_path_probability),
            stddev_path_probability: Some(stochastic.stddev_path_probability),
            elapsed: stochastic.elapsed,
            trials: Some(stochastic.trials),
        });
        benchmark.push(BenchmarkRow {
            word: exact.word,
            method: MethodKind::Exact,
            probability: exact.probability,
            mean_path_probability: None,
            stddev_path_probability: None,
            elapsed: exact.elapsed,
            trials: None,
        });
        Ok(benchmark)
    }
}

impl<S: Show> Show for Benchmark<S> {
    fn show(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            [
                "Word",
                "Method",
                "Probability",
                "Average Path Prob",
                "Stddev Path Prob",
                "Elapsed Time",
                "Trials",
            ]
            .map(String::from),
        );
        for row in &self.rows {
            let method = match row.method {
                MethodKind::Exact => row.method.show().green().to_string(),
                MethodKind::Stochastic => row.method.show().blue().to_string(),
            };
            builder.push_record([
                row.word.show(),
                method,
                row.probability.show(),
                row.mean_path_probability.show(),
                row.stddev_path_probability.show(),
                row.elapsed.show(),
                row.trials.show(),
            ]);
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}
