#[cfg(test)]
mod property_tests {
    use ndarray::Array1;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use volley::env::{BallState, EnvConfig, PongEnv, TrackingOpponent, NUM_ACTIONS};
    use volley::error::PongError;
    use volley::replay_buffer::{ReplayMemory, Transition};

    fn in_bounds(observation: &Array1<f32>) -> bool {
        observation.iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v))
    }

    // Ball states anywhere near the court, including slightly outside it
    fn ball_strategy() -> impl Strategy<Value = BallState> {
        (-50.0f32..850.0, -50.0f32..650.0, -40.0f32..40.0, -40.0f32..40.0).prop_map(|(x, y, vx, vy)| BallState {
            x,
            y,
            vx,
            vy,
            size: 15.0,
            hits: 0,
        })
    }

    fn transition(tag: usize) -> Transition {
        Transition {
            observation: Array1::from_elem(6, tag as f32),
            action: tag % NUM_ACTIONS,
            reward: tag as f32,
            next_observation: Array1::zeros(6),
            terminal: false,
        }
    }

    fn court(seed: u64) -> PongEnv {
        PongEnv::new(EnvConfig::default(), Box::new(TrackingOpponent::new(0.2)), Some(seed)).unwrap()
    }

    proptest! {
        #[test]
        fn test_observation_bounded_for_any_ball(ball in ball_strategy(), seed in any::<u64>()) {
            let mut env = court(seed);
            env.reset();
            env.set_ball(ball);
            prop_assert!(in_bounds(&env.observation()));
        }

        #[test]
        fn test_random_play_stays_valid(
            actions in prop::collection::vec(0usize..NUM_ACTIONS, 1..300),
            seed in any::<u64>()
        ) {
            let mut env = court(seed);
            let mut observation = env.reset();
            prop_assert!(in_bounds(&observation));

            let mut hits = env.agent_hits();
            for action in actions {
                let step = env.step_index(action).unwrap();
                prop_assert!(in_bounds(&step.observation));
                prop_assert!(step.reward.is_finite());

                let delta = env.agent_hits() - hits;
                prop_assert!(delta <= 1);
                prop_assert_eq!(delta == 1, step.agent_hit);
                hits = env.agent_hits();

                let paddle = env.agent_paddle();
                prop_assert!(paddle.y >= 0.0);
                prop_assert!(paddle.y + paddle.height <= env.config().height);

                if step.terminal {
                    prop_assert!(step.outcome.is_some());
                    observation = env.reset();
                    hits = env.agent_hits();
                } else {
                    observation = step.observation;
                }
            }
            prop_assert!(in_bounds(&observation));
        }

        #[test]
        fn test_step_rejects_out_of_range_actions(action in NUM_ACTIONS..1000usize) {
            let mut env = court(0);
            env.reset();
            let is_invalid_action = matches!(env.step_index(action), Err(PongError::InvalidAction { .. }));
            prop_assert!(is_invalid_action);
        }

        #[test]
        fn test_kinematic_limits(mut ball in ball_strategy()) {
            let config = EnvConfig::default();
            ball.enforce_limits(&config);

            prop_assert!(ball.vx.abs() >= config.min_horizontal_speed);
            let max_vy = ball.vx.abs() * config.max_travel_angle.to_radians().tan();
            prop_assert!(ball.vy.abs() <= max_vy + 1e-4);
        }

        #[test]
        fn test_advance_keeps_horizontal_floor(mut ball in ball_strategy()) {
            let config = EnvConfig::default();
            let (x, vx) = (ball.x, ball.vx);
            ball.advance(&config);

            prop_assert!(ball.vx.abs() >= config.min_horizontal_speed);
            prop_assert!((ball.x - x - ball.vx).abs() < 1e-3);
            if vx != 0.0 {
                prop_assert_eq!(ball.vx.signum(), vx.signum());
            }
        }

        #[test]
        fn test_replay_keeps_newest_in_order(capacity in 1usize..50, pushes in 0usize..150) {
            let mut memory = ReplayMemory::new(capacity).unwrap();
            for tag in 0..pushes {
                memory.push(transition(tag));
            }

            prop_assert_eq!(memory.len(), pushes.min(capacity));
            let first_kept = pushes.saturating_sub(capacity);
            let rewards: Vec<f32> = memory.iter().map(|t| t.reward).collect();
            let expected: Vec<f32> = (first_kept..pushes).map(|tag| tag as f32).collect();
            prop_assert_eq!(rewards, expected);
        }

        #[test]
        fn test_sample_fails_only_when_short(stored in 0usize..40, batch in 0usize..60, seed in any::<u64>()) {
            let mut memory = ReplayMemory::new(64).unwrap();
            for tag in 0..stored {
                memory.push(transition(tag));
            }
            let mut rng = StdRng::seed_from_u64(seed);

            match memory.sample(batch, &mut rng) {
                Ok(sample) => {
                    prop_assert!(batch <= stored);
                    prop_assert_eq!(sample.len(), batch);
                    let mut tags: Vec<u32> = sample.iter().map(|t| t.reward as u32).collect();
                    tags.sort_unstable();
                    tags.dedup();
                    prop_assert_eq!(tags.len(), batch);
                }
                Err(e) => {
                    prop_assert!(batch > stored);
                    let is_insufficient = matches!(e, PongError::InsufficientData { .. });
                    prop_assert!(is_insufficient);
                }
            }
        }
    }
}
