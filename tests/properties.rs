use std::time::Duration;

use pfa::prelude::*;

fn example() -> Pfa {
    Pfa::new(
        ["q1".to_string(), "q2".to_string()],
        ['a'],
        [
            (
                ("q1".to_string(), 'a'),
                vec![("q1".to_string(), 0.5), ("q2".to_string(), 0.5)],
            ),
            (
                ("q2".to_string(), 'a'),
                vec![("q1".to_string(), 0.3), ("q2".to_string(), 0.7)],
            ),
        ],
        "q1".to_string(),
        ["q2".to_string()],
        false,
    )
    .expect("example automaton is valid")
}

fn binary() -> Pfa<u32, char> {
    Pfa::builder()
        .with_states([0u32, 1, 2])
        .with_alphabet(['a', 'b'])
        .with_transition(0u32, 'a', [(0u32, 0.2), (1, 0.8)])
        .with_transition(0u32, 'b', [(2u32, 1.0)])
        .with_transition(1u32, 'a', [(1u32, 0.4), (2, 0.6)])
        .with_transition(1u32, 'b', [(0u32, 0.9)])
        .with_transition(2u32, 'a', [(2u32, 1.0)])
        .with_start(0u32)
        .with_accepting([1u32])
        .allow_substochastic(true)
        .build()
        .expect("binary automaton is valid")
}

#[test]
fn end_to_end_example() {
    let pfa = example();
    assert_eq!(pfa.evaluate_exact(&['a']).probability, 0.5);
    assert!((pfa.evaluate_exact(&['a', 'a']).probability - 0.6).abs() < 1e-12);
    assert_eq!(
        pfa.return_probability(&'a', &"q1".to_string(), 1).unwrap(),
        0.5
    );
}

#[test]
fn exact_probabilities_are_probabilities() {
    let pfa = binary();
    let symbols = ['a', 'b'];
    for length in 0..=6 {
        for index in 0..(1usize << length) {
            let word: Vec<char> = (0..length)
                .map(|position| symbols[(index >> position) & 1])
                .collect();
            let p = pfa.evaluate_exact(&word).probability;
            assert!((0.0..=1.0).contains(&p), "{} has probability {p}", word.show());
        }
    }
}

#[test]
fn deviation_shrinks_with_more_trials() {
    let pfa = binary();
    let word = ['a', 'b', 'a'];
    let exact = pfa.evaluate_exact(&word).probability;

    let mean_deviation = |trials: usize, seeds: std::ops::Range<u64>| {
        let runs = seeds.end - seeds.start;
        seeds
            .map(|seed| {
                let estimate = pfa
                    .evaluate_stochastic(&word, &StochasticConfig::new(trials).with_seed(seed))
                    .unwrap();
                (estimate.acceptance_rate - exact).abs()
            })
            .sum::<f64>()
            / runs as f64
    };

    let small = mean_deviation(100, 0..30);
    let large = mean_deviation(100_000, 100..105);
    assert!(small > large, "{small} vs {large}");
    assert!(large < 0.01);
}

#[test]
fn fast_power_matches_repeated_multiplication() {
    let pfa = binary();
    for symbol in ['a', 'b'] {
        let matrix = pfa.transition_matrix(&symbol).unwrap();
        for k in [1, 2, 5, 16, 100] {
            let naive = pfa
                .initial_vector()
                .dot(&math::matrix_power_naive(&matrix, k))
                .dot(&pfa.final_vector());
            let fast = pfa.evaluate_exact_power(&symbol, k).unwrap().probability;
            assert!((fast - naive).abs() < 1e-9, "{symbol}^{k}: {fast} vs {naive}");
        }
    }
}

#[test]
fn tie_is_not_above_cut_point() {
    let pfa = example();
    let decision = pfa.classify(&['a'], &Method::Exact, 0.5).unwrap();
    assert!(!decision.is_above_threshold);
}

#[test]
fn mass_validation() {
    let build = |outcomes: Vec<(&'static str, f64)>, allow: bool| {
        Pfa::<String, char>::builder()
            .with_states(["q0", "q1"])
            .with_alphabet(['a'])
            .with_transition("q0", 'a', outcomes)
            .with_start("q0")
            .allow_substochastic(allow)
            .build()
            .map(|pfa| pfa.size())
    };
    assert!(matches!(
        build(vec![("q0", 0.7), ("q1", 0.5)], true),
        Err(ValidationError::ExcessMass { .. })
    ));
    assert!(matches!(
        build(vec![("q0", 0.5)], false),
        Err(ValidationError::DeficientMass { .. })
    ));
    assert_eq!(build(vec![("q0", 0.5)], true), Ok(2));
}

#[test]
fn search_without_reachable_threshold() {
    let pfa = example();
    let config = SearchConfig::new(2, Criterion::threshold(1.0).unwrap())
        .with_trials(1_000)
        .with_seed(7)
        .with_time_limit(Duration::from_secs(60));
    let outcome = pfa.search(&config).unwrap();
    assert!(outcome.matches.is_empty());
    assert!(!outcome.timing.stopped_early);
}

#[test]
fn search_with_zero_budget() {
    let pfa = binary();
    let config = SearchConfig::new(10, Criterion::interval(0.0, 1.0).unwrap())
        .with_trials(100)
        .with_time_limit(Duration::ZERO);
    let outcome = pfa.search(&config).unwrap();
    assert!(outcome.timing.stopped_early);
    assert!(outcome.matches.is_empty());
}

#[test]
fn search_keeps_words_either_engine_accepts() {
    let pfa = binary();
    let config = SearchConfig::new(2, Criterion::interval(0.5, 1.0).unwrap())
        .with_trials(2_000)
        .with_seed(99)
        .with_time_limit(Duration::from_secs(60));
    let outcome = pfa.search(&config).unwrap();
    for m in &outcome.matches {
        assert!(
            config.criterion().is_satisfied_by(m.exact_probability)
                || config.criterion().is_satisfied_by(m.stochastic_probability)
        );
    }
    // 'a' is accepted with probability 0.8
    assert_eq!(outcome.matches[0].word, vec!['a']);
    assert_eq!(outcome.timing.words_evaluated, 6);
}

#[test]
fn loop_analysis_reports_both_engines() {
    let pfa = example();
    let comparison = pfa
        .compare_power(&'a', 1_000, &StochasticConfig::new(2_000).with_seed(3))
        .unwrap();
    assert!((comparison.exact_probability - 0.625).abs() < 1e-9);
    assert!(comparison.stderr > 0.0);
    assert!(comparison.disagreement() < 0.06);
}
