use std::time::{Duration, Instant};

use tracing::trace;

use crate::{
    error::{EvaluationFailure, InputError},
    math::{self, Map, Matrix},
    Pfa, Show, StateId, Symbol,
};

/// Result of evaluating a word with the exact engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactEvaluation<S> {
    /// The evaluated word.
    pub word: Vec<S>,
    /// Acceptance probability, `0` if the evaluation failed.
    pub probability: f64,
    /// Set if the word could not be evaluated, e.g. because it contains a symbol that is
    /// not part of the alphabet.
    pub failure: Option<EvaluationFailure>,
    /// Time the computation took.
    pub elapsed: Duration,
}

impl<S> ExactEvaluation<S> {
    /// Returns true if the evaluation did not fail.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Result of evaluating the word `symbol^k` with the exact engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerEvaluation<S> {
    /// The repeated symbol.
    pub symbol: S,
    /// The number of repetitions.
    pub k: usize,
    /// Acceptance probability of `symbol^k`.
    pub probability: f64,
    /// Time the computation took.
    pub elapsed: Duration,
}

impl<Q: StateId, S: Symbol> Pfa<Q, S> {
    /// Computes the probability that `word` is accepted as `v0 · M(w1) ⋯ M(wn) · f`, where `v0`
    /// is the [`Pfa::initial_vector`], `f` the [`Pfa::final_vector`] and `M(a)` the transition
    /// matrix of `a`. The computation is deterministic, evaluating the same word twice yields
    /// bit-identical probabilities.
    ///
    /// If `word` contains a symbol that is not in the alphabet, the probability is reported
    /// as `0` and the reason is attached as [`ExactEvaluation::failure`].
    pub fn evaluate_exact(&self, word: &[S]) -> ExactEvaluation<S> {
        let start = Instant::now();
        let (probability, failure) = match self.exact_probability(word) {
            Ok(p) => (p, None),
            Err(failure) => {
                trace!("exact evaluation of {} failed: {failure}", word.show());
                (0.0, Some(failure))
            }
        };
        ExactEvaluation {
            word: word.to_vec(),
            probability,
            failure,
            elapsed: start.elapsed(),
        }
    }

    fn exact_probability(&self, word: &[S]) -> Result<f64, EvaluationFailure> {
        let indices = self.symbol_indices(word)?;
        let mut matrices: Map<usize, Matrix> = Map::default();
        let reached = indices
            .into_iter()
            .fold(self.initial_vector(), |current, sym| {
                current.dot(&*matrices.entry(sym).or_insert_with(|| self.matrix_at(sym)))
            });
        Ok(reached.dot(&self.final_vector()).clamp(0.0, 1.0))
    }

    /// Computes the acceptance probability of the word that consists of `k` repetitions of
    /// `symbol`, i.e. `v0 · M(symbol)^k · f`. The power is computed by repeated squaring, so
    /// only `O(log k)` matrix products are necessary.
    ///
    /// Fails if `symbol` is not in the alphabet or if `k` is zero.
    pub fn evaluate_exact_power(
        &self,
        symbol: &S,
        k: usize,
    ) -> Result<PowerEvaluation<S>, InputError> {
        let sym = self.require_symbol(symbol)?;
        if k < 1 {
            return Err(InputError::NonPositiveSteps(k));
        }
        let start = Instant::now();
        let power = math::matrix_power(&self.matrix_at(sym), k);
        let probability = self
            .initial_vector()
            .dot(&power)
            .dot(&self.final_vector())
            .clamp(0.0, 1.0);
        Ok(PowerEvaluation {
            symbol: symbol.clone(),
            k,
            probability,
            elapsed: start.elapsed(),
        })
    }

    /// Computes the probability of being in `state` again after reading `symbol` exactly `k`
    /// times when starting in `state`.
    ///
    /// Fails if `k` is zero or if `symbol` or `state` do not belong to the automaton.
    pub fn return_probability(&self, symbol: &S, state: &Q, k: usize) -> Result<f64, InputError> {
        let sym = self.require_symbol(symbol)?;
        let index = self.require_state(state)?;
        if k < 1 {
            return Err(InputError::NonPositiveSteps(k));
        }

        let power = math::matrix_power(&self.matrix_at(sym), k);
        let reached = math::one_hot(self.size(), index).dot(&power);
        Ok(reached[index].clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::tests::{ab_pfa, two_state_pfa};

    #[test]
    fn two_state_example() {
        let pfa = two_state_pfa();
        assert_eq!(pfa.evaluate_exact(&['a']).probability, 0.5);
        assert!((pfa.evaluate_exact(&['a', 'a']).probability - 0.6).abs() < 1e-12);
        // the empty word is accepted iff the start state accepts
        assert_eq!(pfa.evaluate_exact(&[]).probability, 0.0);
    }

    #[test]
    fn unknown_symbols_are_reported() {
        let pfa = two_state_pfa();
        let result = pfa.evaluate_exact(&['a', 'x']);
        assert!(!result.is_success());
        assert_eq!(result.probability, 0.0);
        assert_eq!(
            result.failure,
            Some(EvaluationFailure::UnknownSymbol {
                symbol: "x".into(),
                position: 1
            })
        );
    }

    #[test]
    fn undefined_transitions_lose_mass() {
        let pfa = ab_pfa();
        assert_eq!(pfa.evaluate_exact(&['b']).probability, 0.0);
        assert!((pfa.evaluate_exact(&['a', 'a']).probability - 0.5).abs() < 1e-12);
        assert!((pfa.evaluate_exact(&['a', 'b']).probability - 0.15).abs() < 1e-12);
    }

    #[test]
    fn evaluation_is_deterministic() {
        let pfa = ab_pfa();
        let word = ['a', 'b', 'a', 'b', 'b', 'a'];
        let first = pfa.evaluate_exact(&word).probability;
        for _ in 0..10 {
            assert_eq!(pfa.evaluate_exact(&word).probability.to_bits(), first.to_bits());
        }
    }

    #[test]
    fn power_agrees_with_word_evaluation() {
        let pfa = two_state_pfa();
        for k in [1, 2, 5, 16, 100] {
            let word = vec!['a'; k];
            let power = pfa.evaluate_exact_power(&'a', k).unwrap();
            assert_eq!(power.k, k);
            assert!(
                (power.probability - pfa.evaluate_exact(&word).probability).abs() < 1e-9,
                "mismatch for k = {k}"
            );
        }
        // long powers stay cheap and converge to the stationary acceptance probability 0.625
        let long = pfa.evaluate_exact_power(&'a', 100_000).unwrap();
        assert!((long.probability - 0.625).abs() < 1e-9);
        assert_eq!(
            pfa.evaluate_exact_power(&'a', 0).unwrap_err(),
            InputError::NonPositiveSteps(0)
        );
        assert_eq!(
            pfa.evaluate_exact_power(&'b', 3).unwrap_err(),
            InputError::UnknownSymbol("b".into())
        );
    }

    #[test]
    fn return_probabilities() {
        let pfa = two_state_pfa();
        let q1 = "q1".to_string();
        assert_eq!(pfa.return_probability(&'a', &q1, 1).unwrap(), 0.5);
        assert!((pfa.return_probability(&'a', &q1, 2).unwrap() - 0.4).abs() < 1e-12);
        assert_eq!(
            pfa.return_probability(&'a', &q1, 0).unwrap_err(),
            InputError::NonPositiveSteps(0)
        );
        assert_eq!(
            pfa.return_probability(&'a', &"q9".to_string(), 1).unwrap_err(),
            InputError::UnknownState("q9".into())
        );
        assert_eq!(
            pfa.return_probability(&'c', &q1, 1).unwrap_err(),
            InputError::UnknownSymbol("c".into())
        );
    }
}
