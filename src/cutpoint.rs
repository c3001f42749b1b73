use crate::{
    engine::{Evaluator, ExactEngine, MethodKind, StochasticEngine},
    error::{EvaluationFailure, InputError},
    stochastic::StochasticConfig,
    Pfa, Show, StateId, Symbol,
};

/// The outcome of comparing the acceptance probability of a word against a cut-point.
#[derive(Debug, Clone, PartialEq)]
pub struct CutPointDecision<S> {
    /// The classified word.
    pub word: Vec<S>,
    /// The engine whose probability was used.
    pub method: MethodKind,
    /// The (estimated) acceptance probability.
    pub probability: f64,
    /// The cut-point.
    pub threshold: f64,
    /// Whether `probability > threshold`. A probability equal to the threshold is not above it.
    pub is_above_threshold: bool,
    /// Set if the engine could not evaluate the word properly.
    pub failure: Option<EvaluationFailure>,
}

/// Makes sure `value` is a probability.
pub(crate) fn check_probability(value: f64) -> Result<f64, InputError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(InputError::ThresholdOutOfRange(value))
    }
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Evaluates `word` with the given `method` and compares the resulting probability with
    /// `threshold`, which must lie in `[0, 1]`. The word is above the cut-point only if its
    /// probability is strictly greater than the threshold.
    pub fn classify<E>(
        &self,
        word: &[S],
        method: &E,
        threshold: f64,
    ) -> Result<CutPointDecision<S>, InputError>
    where
        E: Evaluator<Q, S>,
    {
        let threshold = check_probability(threshold)?;
        let estimate = method.estimate(self, word)?;
        Ok(CutPointDecision {
            word: estimate.word,
            method: estimate.method,
            probability: estimate.probability,
            threshold,
            is_above_threshold: estimate.probability > threshold,
            failure: estimate.failure,
        })
    }

    /// Classifies `word` with both engines, the Monte Carlo decision comes first.
    pub fn classify_with_both(
        &self,
        word: &[S],
        config: &StochasticConfig,
        threshold: f64,
    ) -> Result<[CutPointDecision<S>; 2], InputError> {
        Ok([
            self.classify(word, &StochasticEngine(*config), threshold)?,
            self.classify(word, &ExactEngine, threshold)?,
        ])
    }
}

impl<S: Show> Show for CutPointDecision<S> {
    fn show(&self) -> String {
        let header = ["Word", "Method", "Probability", "Cut-point", "Above"];
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(header.map(String::from));
        builder.push_record([
            self.word.show(),
            self.method.show(),
            self.probability.show(),
            self.threshold.show(),
            self.is_above_threshold.show(),
        ]);
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}
