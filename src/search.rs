use std::time::{Duration, Instant};

use itertools::Itertools;
use owo_colors::OwoColorize;
use tracing::{debug, trace};

use crate::{
    cutpoint::check_probability, error::InputError, stochastic::StochasticConfig, Pfa, Show,
    StateId, Symbol,
};

/// Decides which probabilities a [`Pfa::search`] is looking for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    /// Probabilities greater than or equal to the given threshold.
    Threshold(f64),
    /// Probabilities within the closed interval `[low, high]`.
    Interval(f64, f64),
}

impl Criterion {
    /// Creates a validated threshold criterion.
    pub fn threshold(threshold: f64) -> Result<Self, InputError> {
        Ok(Criterion::Threshold(check_probability(threshold)?))
    }

    /// Creates a validated interval criterion, both bounds must be probabilities and
    /// `low <= high`.
    pub fn interval(low: f64, high: f64) -> Result<Self, InputError> {
        let criterion = Criterion::Interval(low, high);
        criterion.validate()?;
        Ok(criterion)
    }

    /// Builds a criterion from an optional threshold and an optional interval, of which
    /// exactly one has to be given.
    pub fn from_parts(
        threshold: Option<f64>,
        interval: Option<(f64, f64)>,
    ) -> Result<Self, InputError> {
        match (threshold, interval) {
            (Some(threshold), None) => Self::threshold(threshold),
            (None, Some((low, high))) => Self::interval(low, high),
            (Some(_), Some(_)) => Err(InputError::AmbiguousCriterion),
            (None, None) => Err(InputError::MissingCriterion),
        }
    }

    /// Returns true if `probability` meets the criterion.
    pub fn is_satisfied_by(&self, probability: f64) -> bool {
        match self {
            Criterion::Threshold(threshold) => probability >= *threshold,
            Criterion::Interval(low, high) => *low <= probability && probability <= *high,
        }
    }

    fn validate(&self) -> Result<(), InputError> {
        match *self {
            Criterion::Threshold(threshold) => check_probability(threshold).map(|_| ()),
            Criterion::Interval(low, high) => {
                if check_probability(low).is_err() || check_probability(high).is_err() || low > high
                {
                    Err(InputError::InvalidInterval { low, high })
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Show for Criterion {
    fn show(&self) -> String {
        match self {
            Criterion::Threshold(threshold) => format!(">= {threshold}"),
            Criterion::Interval(low, high) => format!("[{low}, {high}]"),
        }
    }
}

/// Configuration of a [`Pfa::search`].
///
/// ```
/// use std::time::Duration;
/// use pfa::prelude::*;
///
/// let config = SearchConfig::new(3, Criterion::threshold(0.5).unwrap())
///     .with_trials(1_000)
///     .with_seed(3)
///     .with_time_limit(Duration::from_secs(2));
/// assert_eq!(config.max_length(), 3);
/// assert_eq!(config.stochastic().trials(), 1_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    max_length: usize,
    criterion: Criterion,
    stochastic: StochasticConfig,
    time_limit: Duration,
}

impl SearchConfig {
    /// Searches words of length `1..=max_length` for the given criterion with 10000 trials
    /// per word and a time limit of ten seconds.
    pub fn new(max_length: usize, criterion: Criterion) -> Self {
        Self {
            max_length,
            criterion,
            stochastic: StochasticConfig::default(),
            time_limit: Duration::from_secs(10),
        }
    }

    /// Replaces the configuration of the Monte Carlo engine.
    pub fn with_stochastic(mut self, stochastic: StochasticConfig) -> Self {
        self.stochastic = stochastic;
        self
    }

    /// Sets the number of sampled walks per word.
    pub fn with_trials(mut self, trials: usize) -> Self {
        let seed = self.stochastic.seed();
        self.stochastic = StochasticConfig::new(trials);
        if let Some(seed) = seed {
            self.stochastic = self.stochastic.with_seed(seed);
        }
        self
    }

    /// Seeds the Monte Carlo engine, making the whole search reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.stochastic = self.stochastic.with_seed(seed);
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// The maximal word length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The criterion words have to meet.
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// The configuration of the Monte Carlo engine.
    pub fn stochastic(&self) -> &StochasticConfig {
        &self.stochastic
    }

    /// The wall-clock budget.
    pub fn time_limit(&self) -> Duration {
        self.time_limit
    }
}

/// A word found by [`Pfa::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch<S> {
    /// The word.
    pub word: Vec<S>,
    /// Probability according to the exact engine.
    pub exact_probability: f64,
    /// Acceptance rate according to the Monte Carlo engine.
    pub stochastic_probability: f64,
    /// Time spent in the exact engine for this word.
    pub exact_elapsed: Duration,
    /// Time spent in the Monte Carlo engine for this word.
    pub stochastic_elapsed: Duration,
}

/// Cumulative engine times for all evaluated words of one length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthTiming {
    /// The word length.
    pub length: usize,
    /// How many words of this length were evaluated.
    pub words: usize,
    /// Total time spent in the exact engine.
    pub exact: Duration,
    /// Total time spent in the Monte Carlo engine.
    pub stochastic: Duration,
}

impl LengthTiming {
    fn new(length: usize) -> Self {
        Self {
            length,
            words: 0,
            exact: Duration::ZERO,
            stochastic: Duration::ZERO,
        }
    }
}

/// Summarizes where the time of a [`Pfa::search`] went.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingSummary {
    /// Total time spent in the exact engine.
    pub exact: Duration,
    /// Total time spent in the Monte Carlo engine.
    pub stochastic: Duration,
    /// Whether the time limit was hit before all words were evaluated.
    pub stopped_early: bool,
    /// Number of evaluated words.
    pub words_evaluated: usize,
    /// Engine times broken down by word length, only lengths of which at least one word
    /// was evaluated appear.
    pub per_length: Vec<LengthTiming>,
}

impl TimingSummary {
    fn record(&mut self, timing: LengthTiming) {
        if timing.words > 0 {
            self.exact += timing.exact;
            self.stochastic += timing.stochastic;
            self.words_evaluated += timing.words;
            self.per_length.push(timing);
        }
    }
}

/// The result of a [`Pfa::search`]. If the search was cut short by its time limit, `matches`
/// holds everything that was found up to that point.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<S> {
    /// The criterion that was searched for.
    pub criterion: Criterion,
    /// All words meeting the criterion, shorter words first and words of equal length in
    /// lexicographic order.
    pub matches: Vec<SearchMatch<S>>,
    /// Engine times and early-stop flag.
    pub timing: TimingSummary,
}

impl<S> SearchOutcome<S> {
    /// Returns true if the time limit was hit.
    pub fn stopped_early(&self) -> bool {
        self.timing.stopped_early
    }
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Searches all words of length `1..=max_length` for those whose acceptance probability meets
    /// the configured criterion. Words are enumerated by increasing length and, within one length,
    /// in lexicographic order of the sorted alphabet, so identical inputs give identical results.
    ///
    /// Every word is evaluated with both engines and kept if **either** probability meets the
    /// criterion.
    ///
    /// Before each word the elapsed time is compared with the time limit. Once it is used up the
    /// search stops and returns the matches found so far with the early-stop flag set. As there
    /// are `|alphabet|^max_length` words of maximal length, the time limit is the only thing that
    /// guarantees termination in reasonable time for larger inputs.
    pub fn search(&self, config: &SearchConfig) -> Result<SearchOutcome<S>, InputError> {
        config.criterion.validate()?;
        config.stochastic.validate()?;

        let started = Instant::now();
        let mut rng = config.stochastic.rng();
        let symbols: Vec<S> = self.alphabet().cloned().collect();
        let mut matches = vec![];
        let mut timing = TimingSummary::default();

        'lengths: for length in 1..=config.max_length {
            if started.elapsed() >= config.time_limit {
                debug!(
                    "time limit of {:?} exhausted before length {length}, stopping early",
                    config.time_limit
                );
                timing.stopped_early = true;
                break;
            }
            if symbols.is_empty() {
                debug!("alphabet is empty, there are no words of positive length");
                break;
            }

            debug!("searching words of length {length}");
            let mut current = LengthTiming::new(length);

            for word in std::iter::repeat(symbols.iter().cloned())
                .take(length)
                .multi_cartesian_product()
            {
                if started.elapsed() >= config.time_limit {
                    debug!(
                        "time limit of {:?} exhausted after {} words, stopping early",
                        config.time_limit,
                        timing.words_evaluated + current.words
                    );
                    timing.stopped_early = true;
                    timing.record(current);
                    break 'lengths;
                }

                let exact = self.evaluate_exact(&word);
                let stochastic = self.simulate(&word, config.stochastic.trials(), &mut rng);
                current.words += 1;
                current.exact += exact.elapsed;
                current.stochastic += stochastic.elapsed;

                trace!(
                    "{}: exact {:.6}, stochastic {:.6}",
                    word.show(),
                    exact.probability,
                    stochastic.acceptance_rate
                );

                if config.criterion.is_satisfied_by(exact.probability)
                    || config.criterion.is_satisfied_by(stochastic.acceptance_rate)
                {
                    matches.push(SearchMatch {
                        word,
                        exact_probability: exact.probability,
                        stochastic_probability: stochastic.acceptance_rate,
                        exact_elapsed: exact.elapsed,
                        stochastic_elapsed: stochastic.elapsed,
                    });
                }
            }

            timing.record(current);
        }

        debug!(
            "search finished with {} matches among {} words",
            matches.len(),
            timing.words_evaluated
        );

        Ok(SearchOutcome {
            criterion: config.criterion,
            matches,
            timing,
        })
    }
}

impl<S: Show> Show for SearchOutcome<S> {
    fn show(&self) -> String {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            [
                "Word",
                "Monte Carlo Prob",
                "Matrix Prob",
                "Cut-point",
                "MC Time",
                "MM Time",
            ]
            .map(String::from),
        );
        for m in &self.matches {
            builder.push_record([
                m.word.show().bold().to_string(),
                m.stochastic_probability.show(),
                m.exact_probability.show(),
                self.criterion.show(),
                m.stochastic_elapsed.show(),
                m.exact_elapsed.show(),
            ]);
        }

        let status = if self.timing.stopped_early {
            "stopped early".red().to_string()
        } else {
            "complete".green().to_string()
        };

        let table = builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string();
        format!(
            "{table}\nMonte Carlo {} | Matrix Product {} | {} words, {status}",
            self.timing.stochastic.show(),
            self.timing.exact.show(),
            self.timing.words_evaluated,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use itertools::Itertools;

    use crate::prelude::*;
    use crate::tests::{ab_pfa, two_state_pfa};

    #[test]
    fn criterion_needs_exactly_one_part() {
        assert_eq!(
            Criterion::from_parts(None, None).unwrap_err(),
            InputError::MissingCriterion
        );
        assert_eq!(
            Criterion::from_parts(Some(0.5), Some((0.1, 0.2))).unwrap_err(),
            InputError::AmbiguousCriterion
        );
        assert_eq!(
            Criterion::from_parts(Some(0.5), None).unwrap(),
            Criterion::Threshold(0.5)
        );
        assert_eq!(
            Criterion::from_parts(None, Some((0.2, 0.1))).unwrap_err(),
            InputError::InvalidInterval {
                low: 0.2,
                high: 0.1
            }
        );
        assert!(Criterion::threshold(1.1).is_err());
    }

    #[test]
    fn criterion_bounds_are_inclusive() {
        assert!(Criterion::Threshold(0.5).is_satisfied_by(0.5));
        assert!(!Criterion::Threshold(0.5).is_satisfied_by(0.4999));
        let interval = Criterion::Interval(0.1, 0.2);
        assert!(interval.is_satisfied_by(0.1));
        assert!(interval.is_satisfied_by(0.2));
        assert!(!interval.is_satisfied_by(0.21));
    }

    #[test_log::test]
    fn unreachable_threshold_gives_no_matches() {
        let pfa = ab_pfa();
        let config = SearchConfig::new(2, Criterion::threshold(1.0).unwrap())
            .with_trials(1_000)
            .with_seed(1)
            .with_time_limit(Duration::from_secs(60));
        let outcome = pfa.search(&config).unwrap();
        assert!(outcome.matches.is_empty());
        assert!(!outcome.stopped_early());
        assert_eq!(outcome.timing.words_evaluated, 2 + 4);
        assert_eq!(outcome.timing.per_length.len(), 2);
        assert_eq!(outcome.timing.per_length[1].words, 4);
    }

    #[test]
    fn matches_come_in_enumeration_order() {
        let pfa = ab_pfa();
        let config = SearchConfig::new(3, Criterion::interval(0.1, 0.6).unwrap())
            .with_trials(2_000)
            .with_seed(5)
            .with_time_limit(Duration::from_secs(60));
        let outcome = pfa.search(&config).unwrap();
        let words: Vec<String> = outcome
            .matches
            .iter()
            .map(|m| m.word.iter().collect())
            .collect();
        // exact probabilities: aa 0.5, ab 0.15, aaa 0.75, aab 0.575, aba 0.5, abb 0.255
        assert_eq!(words, vec!["aa", "ab", "aab", "aba", "abb"]);
        let sorted: Vec<_> = words
            .iter()
            .cloned()
            .sorted_by_key(|w| (w.len(), w.clone()))
            .collect();
        assert_eq!(words, sorted);
    }

    #[test]
    fn search_is_reproducible_with_seed() {
        let pfa = two_state_pfa();
        let config = SearchConfig::new(4, Criterion::interval(0.55, 0.62).unwrap())
            .with_trials(500)
            .with_seed(13)
            .with_time_limit(Duration::from_secs(60));
        let first = pfa.search(&config).unwrap();
        let second = pfa.search(&config).unwrap();
        let probabilities = |o: &SearchOutcome<char>| {
            o.matches
                .iter()
                .map(|m| (m.word.clone(), m.stochastic_probability))
                .collect::<Vec<_>>()
        };
        assert_eq!(probabilities(&first), probabilities(&second));
    }

    #[test]
    fn exhausted_budget_stops_early() {
        let pfa = ab_pfa();
        let config = SearchConfig::new(8, Criterion::threshold(0.0).unwrap())
            .with_trials(10)
            .with_time_limit(Duration::ZERO);
        let outcome = pfa.search(&config).unwrap();
        assert!(outcome.stopped_early());
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.timing.words_evaluated, 0);
        assert!(outcome.show().contains("stopped early"));
    }

    #[test_log::test]
    fn empty_alphabet_terminates() {
        let pfa: Pfa = Pfa::builder()
            .with_states(["q0"])
            .with_start("q0")
            .with_accepting(["q0"])
            .build()
            .unwrap();
        let criterion = Criterion::threshold(0.5).unwrap();

        let config = SearchConfig::new(1_000_000, criterion)
            .with_trials(10)
            .with_time_limit(Duration::ZERO);
        let outcome = pfa.search(&config).unwrap();
        assert!(outcome.stopped_early());
        assert_eq!(outcome.timing.words_evaluated, 0);

        let config = SearchConfig::new(1_000_000, criterion)
            .with_trials(10)
            .with_time_limit(Duration::from_secs(60));
        let outcome = pfa.search(&config).unwrap();
        assert!(!outcome.stopped_early());
        assert!(outcome.matches.is_empty());
        assert!(outcome.timing.per_length.is_empty());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let pfa = ab_pfa();
        let config = SearchConfig::new(2, Criterion::Threshold(2.0));
        assert_eq!(
            pfa.search(&config).unwrap_err(),
            InputError::ThresholdOutOfRange(2.0)
        );
        let config = SearchConfig::new(2, Criterion::Threshold(0.5)).with_trials(0);
        assert_eq!(pfa.search(&config).unwrap_err(), InputError::NoTrials);
    }
}
