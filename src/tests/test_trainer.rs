use crate::trainer::stats::LossAccumulator;
use crate::trainer::{episode_checkpoint_name, ResumeFrom, ScoreWindow, StopSignal, TrainerConfig, TrainerState};

#[test]
fn test_score_window_average() {
    let mut window = ScoreWindow::new(3);
    assert_eq!(window.average(), None);

    window.push(1.0);
    window.push(2.0);
    assert_eq!(window.average(), Some(1.5));

    window.push(3.0);
    window.push(7.0);
    assert_eq!(window.len(), 3);
    assert_eq!(window.returns(), vec![2.0, 3.0, 7.0]);
    assert_eq!(window.average(), Some(4.0));
}

#[test]
fn test_score_window_rebuild_keeps_recent() {
    let window = ScoreWindow::from_returns(2, &[1.0, 2.0, 3.0]);
    assert_eq!(window.returns(), vec![2.0, 3.0]);
    assert_eq!(window.capacity(), 2);
}

#[test]
fn test_loss_accumulator() {
    let mut losses = LossAccumulator::default();
    assert_eq!(losses.mean(), None);
    losses.add(1.0);
    losses.add(3.0);
    assert_eq!(losses.mean(), Some(2.0));
}

#[test]
fn test_stop_signal_is_shared() {
    let signal = StopSignal::new();
    let clone = signal.clone();
    assert!(!signal.is_stopped());

    clone.stop();
    assert!(signal.is_stopped());
}

#[test]
fn test_trainer_config_validation() {
    assert!(TrainerConfig::default().validate().is_ok());
    assert_eq!(TrainerConfig::default().resume, ResumeFrom::Latest);
    assert!(TrainerConfig::default().save_interval(0).validate().is_err());
    assert!(TrainerConfig::default().window(0).validate().is_err());
    assert!(TrainerConfig::default().resume_epsilon(1.5).validate().is_err());
}

#[test]
fn test_state_json_defaults_missing_fields() {
    let state: TrainerState = serde_json::from_str(r#"{"episode": 12}"#).unwrap();
    assert_eq!(state.episode, 12);
    assert_eq!(state.best_average, None);
    assert!(state.recent_returns.is_empty());

    assert_eq!(episode_checkpoint_name(50), "episode_50.ckpt");
}
