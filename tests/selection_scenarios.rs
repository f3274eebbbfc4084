//! End-to-end selection scenarios driven through the public API.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use linucb::{Bandit, BanditConfig, BanditError, ContextualBandit, HybridLinUcb, LinUcb};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Bernoulli reward with a per-(context, arm) success rate
fn draw_reward(rng: &mut ChaCha8Rng, rate: f64) -> f64 {
    if rng.gen::<f64>() < rate {
        1.0
    } else {
        0.0
    }
}

#[test]
fn fresh_model_ties_are_broken_uniformly() {
    init_tracing();
    let mut model = LinUcb::with_seed(3, 4, 1.0, 2024).unwrap();
    let mut counts = [0usize; 4];
    let trials = 40_000;
    for _ in 0..trials {
        counts[model.select_arm(&[0.2, 0.4, 0.6]).unwrap()] += 1;
    }
    for &count in &counts {
        let freq = count as f64 / trials as f64;
        assert!((freq - 0.25).abs() < 0.02, "frequency {} not near 0.25", freq);
    }
}

#[test]
fn hybrid_fresh_model_ties_are_broken_uniformly() {
    init_tracing();
    let mut model = HybridLinUcb::with_seed(2, 2, 2, 1.0, 7).unwrap();
    let mut counts = [0usize; 2];
    for _ in 0..10_000 {
        counts[model.select_arm(&[1.0, 0.0, 0.0, 1.0]).unwrap()] += 1;
    }
    assert!(counts.iter().all(|&c| (4_500..=5_500).contains(&c)), "{:?}", counts);
}

#[test]
fn disjoint_model_finds_best_arm_per_context() {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut model = LinUcb::with_seed(2, 4, 0.5, 1).unwrap();
    // context {0,1} favours arm 1, context {1,0} favours arm 2
    let contexts = [[0.0, 1.0], [1.0, 0.0]];
    let rates = [[0.1, 0.8, 0.2, 0.1], [0.1, 0.2, 0.9, 0.3]];

    let mut late_picks = [[0usize; 4]; 2];
    for round in 0..4_000 {
        let which = round % 2;
        let context = &contexts[which];
        let arm = model.select_arm(context).unwrap();
        let reward = draw_reward(&mut rng, rates[which][arm]);
        model.update(context, arm, reward).unwrap();
        if round >= 2_000 {
            late_picks[which][arm] += 1;
        }
    }

    let best_for = |which: usize| {
        (0..4)
            .max_by_key(|&arm| late_picks[which][arm])
            .unwrap()
    };
    assert_eq!(best_for(0), 1, "{:?}", late_picks);
    assert_eq!(best_for(1), 2, "{:?}", late_picks);
}

#[test]
fn hybrid_model_learns_shared_effect() {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut model = HybridLinUcb::with_seed(1, 1, 3, 0.3, 9).unwrap();
    let rates = [0.2, 0.5, 0.8];

    for round in 0..900 {
        let arm = round % 3;
        let reward = draw_reward(&mut rng, rates[arm]);
        model.update(&[1.0, 1.0], arm, reward).unwrap();
    }

    let estimates = model.estimate(&[1.0, 1.0]).unwrap();
    assert!(estimates[2].exploitation > estimates[1].exploitation);
    assert!(estimates[1].exploitation > estimates[0].exploitation);
    assert!(model.shared_coefficients()[0] != 0.0);
    assert!(model.diagnose().is_healthy);
}

#[test]
fn bandit_enum_dispatches_to_both_variants() {
    init_tracing();
    let mut models: Vec<Bandit> = vec![
        BanditConfig::disjoint(2, 3).with_seed(3).build().unwrap(),
        BanditConfig::hybrid(2, 1, 3).with_alpha(0.2).with_seed(3).build().unwrap(),
    ];

    for model in &mut models {
        let dim = model.context_dimension();
        let context = vec![0.5; dim];
        let arm = model.select_arm(&context).unwrap();
        model.update(&context, arm, 1.0).unwrap();
        assert_eq!(model.predict(&context).unwrap().len(), 3);

        let err = model
            .update_batch(&[context.clone()], &[0, 1], &[1.0])
            .unwrap_err();
        assert_eq!(
            err,
            BanditError::LengthMismatch {
                contexts: 1,
                arms: 2,
                rewards: 1
            }
        );
    }

    assert!(models[0].as_disjoint().is_some());
    assert!(models[1].is_hybrid());
}

#[test]
fn trait_objects_share_one_surface() {
    let mut models: Vec<Box<dyn ContextualBandit>> = vec![
        Box::new(LinUcb::with_seed(2, 2, 1.0, 5).unwrap()),
        Box::new(HybridLinUcb::with_seed(2, 2, 2, 1.0, 5).unwrap()),
    ];
    for model in models.iter_mut() {
        let wrong = vec![1.0; model.context_dimension() + 1];
        assert!(matches!(
            model.predict(&wrong),
            Err(BanditError::DimensionMismatch { .. })
        ));
        assert!(model.select_arm(&wrong).is_err());
    }
}
