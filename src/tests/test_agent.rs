use std::fs;
use std::path::Path;

use ndarray::{array, Array1};
use tempfile::tempdir;

use crate::agent::{AgentConfig, DqnAgent};
use crate::error::PongError;
use crate::network::NeuralNetwork;
use crate::optimizer::GradientClipper;
use crate::optimizer::OptimizerConfig;
use crate::replay_buffer::Transition;

fn small_config() -> AgentConfig {
    AgentConfig::default()
        .hidden_layers(&[16])
        .batch_size(8)
        .min_replay_size(16)
        .replay_capacity(256)
        .target_sync_interval(5)
        .learning_rate(1e-3)
        .seed(17)
}

fn observation(i: usize) -> Array1<f32> {
    let t = i as f32 * 0.1;
    array![t.sin(), t.cos(), 0.5 * t.sin(), -0.5 * t.cos(), 0.2, -0.2]
}

fn fill(agent: &mut DqnAgent, count: usize) {
    for i in 0..count {
        agent
            .remember(Transition {
                observation: observation(i),
                action: i % 3,
                reward: if i % 7 == 0 { 1.0 } else { -0.1 },
                next_observation: observation(i + 1),
                terminal: i % 10 == 9,
            })
            .unwrap();
    }
}

#[test]
fn test_new_agent() {
    let agent = DqnAgent::new(small_config()).unwrap();

    assert_eq!(agent.epsilon(), 1.0);
    assert_eq!(agent.train_steps(), 0);
    assert_eq!(agent.num_actions(), 3);
    assert_eq!(agent.live_network().input_size(), 6);
    assert!(agent.live_network().same_parameters(agent.target_network()));
}

#[test]
fn test_invalid_config_rejected() {
    assert!(DqnAgent::new(small_config().gamma(1.0)).is_err());
    assert!(DqnAgent::new(small_config().batch_size(0)).is_err());
    assert!(DqnAgent::new(small_config().epsilon(0.1, 0.5, 0.99)).is_err());
    assert!(DqnAgent::new(small_config().target_sync_interval(0)).is_err());
}

#[test]
fn test_min_replay_beyond_capacity_rejected() {
    let config = small_config().replay_capacity(10).min_replay_size(20);
    assert!(matches!(config.validate(), Err(PongError::InvalidParameter { .. })));
    assert!(DqnAgent::new(config).is_err());

    assert!(small_config().replay_capacity(20).min_replay_size(20).validate().is_ok());
}

#[test]
fn test_gradient_clip_bounds_validated() {
    let reversed = small_config().gradient_clip(GradientClipper::ClipByValue { min: 1.0, max: -1.0 });
    assert!(matches!(reversed.validate(), Err(PongError::InvalidParameter { .. })));
    assert!(DqnAgent::new(reversed).is_err());

    let nan = GradientClipper::ClipByValue { min: f32::NAN, max: 1.0 };
    assert!(small_config().gradient_clip(nan).validate().is_err());
    let zero_norm = GradientClipper::ClipByNorm { max_norm: 0.0 };
    assert!(small_config().gradient_clip(zero_norm).validate().is_err());
    let infinite_norm = GradientClipper::ClipByGlobalNorm { max_norm: f32::INFINITY };
    assert!(small_config().gradient_clip(infinite_norm).validate().is_err());

    let sane = GradientClipper::ClipByValue { min: -1.0, max: 1.0 };
    let mut agent = DqnAgent::new(small_config().gradient_clip(sane)).unwrap();
    fill(&mut agent, 32);
    assert!(agent.learn().unwrap().is_some());
}

/// Zero every weight so each output equals its bias, whatever the input.
fn constant_outputs(network: &mut NeuralNetwork, outputs: [f32; 3]) {
    for layer in network.layers.iter_mut() {
        layer.weights.fill(0.0);
        layer.biases.fill(0.0);
    }
    if let Some(last) = network.layers.last_mut() {
        last.biases.assign(&array![outputs[0], outputs[1], outputs[2]]);
    }
}

#[test]
fn test_learning_target_bootstraps_from_target_network() {
    let config = small_config()
        .gamma(0.9)
        .batch_size(2)
        .min_replay_size(2)
        .replay_capacity(2);
    let mut agent = DqnAgent::new(config).unwrap();

    let mut checkpoint = agent.snapshot();
    constant_outputs(&mut checkpoint.live, [0.5, 0.0, 0.0]);
    constant_outputs(&mut checkpoint.target, [1.0, 3.0, 2.0]);
    agent.restore(checkpoint, Path::new("hand-set")).unwrap();

    agent
        .remember(Transition {
            observation: observation(0),
            action: 0,
            reward: 1.0,
            next_observation: observation(1),
            terminal: false,
        })
        .unwrap();
    agent
        .remember(Transition {
            observation: observation(2),
            action: 0,
            reward: -1.0,
            next_observation: observation(3),
            terminal: true,
        })
        .unwrap();

    // Non-terminal: 1 + 0.9 * max(1, 3, 2) = 3.7 against a live value of 0.5.
    // Terminal: no bootstrap, -1 against 0.5.
    let expected = ((3.7f32 - 0.5).powi(2) + (-1.0f32 - 0.5).powi(2)) / 2.0;
    let loss = agent.learn().unwrap().unwrap();
    assert!((loss - expected).abs() < 1e-4, "loss {} expected {}", loss, expected);
}

#[test]
fn test_learn_waits_for_min_replay() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    fill(&mut agent, 15);

    assert_eq!(agent.learn().unwrap(), None);
    assert_eq!(agent.train_steps(), 0);
    assert_eq!(agent.epsilon(), 1.0);

    fill(&mut agent, 1);
    let loss = agent.learn().unwrap();
    assert!(loss.map_or(false, f32::is_finite));
    assert_eq!(agent.train_steps(), 1);
}

#[test]
fn test_epsilon_decays_monotonically_to_floor() {
    let mut agent = DqnAgent::new(small_config().epsilon(1.0, 0.5, 0.9)).unwrap();
    fill(&mut agent, 32);

    let mut previous = agent.epsilon();
    for _ in 0..20 {
        agent.learn().unwrap();
        assert!(agent.epsilon() <= previous);
        assert!(agent.epsilon() >= 0.5);
        previous = agent.epsilon();
    }
    assert_eq!(agent.epsilon(), 0.5);
}

#[test]
fn test_epsilon_override_is_not_raised_by_decay() {
    let mut agent = DqnAgent::new(small_config().epsilon(1.0, 0.5, 0.9)).unwrap();
    fill(&mut agent, 32);

    agent.set_epsilon(0.2);
    agent.learn().unwrap();
    assert_eq!(agent.epsilon(), 0.2);

    agent.set_epsilon(3.0);
    assert_eq!(agent.epsilon(), 1.0);
}

#[test]
fn test_target_sync_interval() {
    let mut agent = DqnAgent::new(small_config()).unwrap();
    let initial = agent.target_network().clone();
    fill(&mut agent, 32);

    for _ in 0..4 {
        agent.learn().unwrap();
        assert!(agent.target_network().same_parameters(&initial));
        assert!(!agent.live_network().same_parameters(agent.target_network()));
    }

    agent.learn().unwrap();
    assert_eq!(agent.train_steps(), 5);
    assert!(agent.live_network().same_parameters(agent.target_network()));

    let synced = agent.target_network().clone();
    agent.learn().unwrap();
    assert!(agent.target_network().same_parameters(&synced));
}

#[test]
fn test_remember_rejects_invalid_transitions() {
    let mut agent = DqnAgent::new(small_config()).unwrap();

    let bad_action = agent.remember(Transition {
        observation: observation(0),
        action: 3,
        reward: 0.0,
        next_observation: observation(1),
        terminal: false,
    });
    assert!(matches!(bad_action, Err(PongError::InvalidAction { action: 3, max_actions: 3 })));

    let bad_shape = agent.remember(Transition {
        observation: array![0.0, 1.0],
        action: 0,
        reward: 0.0,
        next_observation: observation(1),
        terminal: false,
    });
    assert!(bad_shape.is_err());
    assert!(agent.memory().is_empty());
}

#[test]
fn test_greedy_when_epsilon_is_zero() {
    let mut agent = DqnAgent::new(small_config().epsilon(0.0, 0.0, 1.0)).unwrap();
    for i in 0..20 {
        let obs = observation(i);
        assert_eq!(agent.select_action(obs.view()), agent.greedy_action(obs.view()));
    }
}

#[test]
fn test_save_load_reproduces_policy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("agent.ckpt");

    let mut trained = DqnAgent::new(small_config()).unwrap();
    fill(&mut trained, 64);
    for _ in 0..12 {
        trained.learn().unwrap();
    }
    trained.save(&path).unwrap();

    let mut restored = DqnAgent::new(small_config().seed(99)).unwrap();
    restored.load(&path).unwrap();

    assert_eq!(restored.epsilon(), trained.epsilon());
    assert_eq!(restored.train_steps(), 12);
    assert!(restored.live_network().same_parameters(trained.live_network()));
    assert!(restored.target_network().same_parameters(trained.target_network()));
    for i in 0..30 {
        let obs = observation(i);
        assert_eq!(restored.greedy_action(obs.view()), trained.greedy_action(obs.view()));
    }
}

#[test]
fn test_failed_load_leaves_agent_untouched() {
    let dir = tempdir().unwrap();
    let mut agent = DqnAgent::new(small_config()).unwrap();
    let before = agent.snapshot();

    let missing = agent.load(dir.path().join("nope.ckpt"));
    assert!(matches!(missing, Err(PongError::CheckpointNotFound(_))));

    let garbage = dir.path().join("garbage.ckpt");
    fs::write(&garbage, b"definitely not a checkpoint").unwrap();
    assert!(matches!(agent.load(&garbage), Err(PongError::CheckpointCorrupt { .. })));

    let other = DqnAgent::new(small_config().hidden_layers(&[4, 4])).unwrap();
    let mismatched = dir.path().join("other.ckpt");
    other.save(&mismatched).unwrap();
    assert!(matches!(agent.load(&mismatched), Err(PongError::CheckpointCorrupt { .. })));

    let sgd = DqnAgent::new(small_config().optimizer(OptimizerConfig::Sgd)).unwrap();
    let wrong_optimizer = dir.path().join("sgd.ckpt");
    sgd.save(&wrong_optimizer).unwrap();
    assert!(matches!(agent.load(&wrong_optimizer), Err(PongError::CheckpointCorrupt { .. })));

    assert!(agent.live_network().same_parameters(&before.live));
    assert_eq!(agent.epsilon(), before.epsilon);
    assert_eq!(agent.train_steps(), before.train_steps);
}
