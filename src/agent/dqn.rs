use std::path::Path;

use log::debug;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::AgentConfig;
use crate::checkpoint::{Checkpoint, CHECKPOINT_FORMAT_VERSION};
use crate::env::{NUM_ACTIONS, OBSERVATION_SIZE};
use crate::error::{PongError, Result};
use crate::loss::Loss;
use crate::network::NeuralNetwork;
use crate::optimizer::OptimizerWrapper;
use crate::replay_buffer::{ReplayMemory, Transition};

/// Deep Q-Network agent with a hard-synced target network.
///
/// The agent owns the live and target estimators, the optimizer state and
/// the replay memory. Actions are chosen epsilon-greedily from the live
/// estimator; every learning step samples a batch from replay, regresses the
/// value of each taken action toward `r + (1 - terminal)·γ·max target(next)`
/// and then decays epsilon toward its floor.
///
/// # Example
///
/// ```rust
/// use volley::agent::{AgentConfig, DqnAgent};
/// use volley::replay_buffer::Transition;
/// use ndarray::Array1;
///
/// let config = AgentConfig::default()
///     .hidden_layers(&[16])
///     .batch_size(4)
///     .min_replay_size(8)
///     .seed(3);
/// let mut agent = DqnAgent::new(config).unwrap();
///
/// let observation = Array1::zeros(6);
/// for _ in 0..8 {
///     let action = agent.select_action(observation.view());
///     agent.remember(Transition {
///         observation: observation.clone(),
///         action,
///         reward: 0.1,
///         next_observation: observation.clone(),
///         terminal: false,
///     }).unwrap();
/// }
/// assert!(agent.learn().unwrap().is_some());
/// ```
pub struct DqnAgent {
    live: NeuralNetwork,
    target: NeuralNetwork,
    optimizer: OptimizerWrapper,
    memory: ReplayMemory,
    config: AgentConfig,
    epsilon: f32,
    train_steps: u64,
    rng: StdRng,
}

impl DqnAgent {
    /// Agent sized for the volley court: six observation inputs, three actions.
    pub fn new(config: AgentConfig) -> Result<Self> {
        Self::with_dimensions(OBSERVATION_SIZE, NUM_ACTIONS, config)
    }

    pub fn with_dimensions(observation_size: usize, num_actions: usize, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let live = NeuralNetwork::q_network(observation_size, &config.hidden_layers, num_actions, &mut rng)?;
        let target = live.clone();
        let optimizer = config.optimizer.build(&live.layers);
        let memory = ReplayMemory::new(config.replay_capacity)?;

        Ok(DqnAgent {
            live,
            target,
            optimizer,
            memory,
            epsilon: config.epsilon_start,
            config,
            train_steps: 0,
            rng,
        })
    }

    pub fn num_actions(&self) -> usize {
        self.live.output_size()
    }

    /// Epsilon-greedy action: uniform with probability epsilon, greedy otherwise.
    pub fn select_action(&mut self, observation: ArrayView1<f32>) -> usize {
        let num_actions = self.num_actions();
        if self.rng.gen::<f32>() < self.epsilon {
            self.rng.gen_range(0..num_actions)
        } else {
            self.greedy_action(observation)
        }
    }

    /// Action with the highest live value, lowest index on ties.
    pub fn greedy_action(&mut self, observation: ArrayView1<f32>) -> usize {
        self.live.greedy_action(observation)
    }

    pub fn q_values(&mut self, observation: ArrayView1<f32>) -> Array1<f32> {
        self.live.forward(observation)
    }

    /// Store a transition in replay memory.
    pub fn remember(&mut self, transition: Transition) -> Result<()> {
        if transition.action >= self.num_actions() {
            return Err(PongError::InvalidAction {
                action: transition.action,
                max_actions: self.num_actions(),
            });
        }
        let expected = self.live.input_size();
        if transition.observation.len() != expected || transition.next_observation.len() != expected {
            return Err(PongError::invalid_parameter(
                "transition".to_string(),
                format!("observations must have {} components", expected),
            ));
        }
        self.memory.push(transition);
        Ok(())
    }

    /// One learning step.
    ///
    /// Returns `Ok(None)` without touching any state until replay holds
    /// `min_replay_size` transitions (and at least one batch).
    pub fn learn(&mut self) -> Result<Option<f32>> {
        if self.memory.len() < self.config.min_replay_size {
            return Ok(None);
        }
        let batch = match self.memory.sample(self.config.batch_size, &mut self.rng) {
            Ok(batch) => batch,
            Err(PongError::InsufficientData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let batch_size = batch.len();
        let input_size = self.live.input_size();
        let mut observations = Array2::<f32>::zeros((batch_size, input_size));
        let mut next_observations = Array2::<f32>::zeros((batch_size, input_size));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Vec::with_capacity(batch_size);
        let mut terminals = Vec::with_capacity(batch_size);

        for (i, transition) in batch.iter().enumerate() {
            observations.row_mut(i).assign(&transition.observation);
            next_observations.row_mut(i).assign(&transition.next_observation);
            actions.push(transition.action);
            rewards.push(transition.reward);
            terminals.push(transition.terminal);
        }

        let next_values = self.target.forward_batch(next_observations.view());
        let targets: Array1<f32> = (0..batch_size)
            .map(|i| {
                let bootstrap = if terminals[i] {
                    0.0
                } else {
                    next_values.row(i).fold(f32::NEG_INFINITY, |max, &v| max.max(v))
                };
                rewards[i] + self.config.gamma * bootstrap
            })
            .collect();

        let values = self.live.forward_batch(observations.view());
        let predicted: Array1<f32> = (0..batch_size).map(|i| values[[i, actions[i]]]).collect();

        let loss = self.config.loss.compute(predicted.view(), targets.view());
        let loss_gradient = self.config.loss.gradient(predicted.view(), targets.view());

        // Only the taken action's output receives an error signal
        let mut output_errors = Array2::<f32>::zeros(values.dim());
        for (i, &action) in actions.iter().enumerate() {
            output_errors[[i, action]] = loss_gradient[i];
        }

        let mut gradients = self.live.backward_batch(output_errors.view());
        self.config.gradient_clip.clip(&mut gradients);
        self.live.apply_gradients(&gradients, &mut self.optimizer, self.config.learning_rate);

        self.train_steps += 1;
        self.decay_epsilon();
        if self.train_steps % self.config.target_sync_interval == 0 {
            self.sync_target();
            debug!("Target network synced at learning step {}", self.train_steps);
        }

        Ok(Some(loss))
    }

    fn decay_epsilon(&mut self) {
        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
    }

    /// Hard-copy the live parameters into the target network.
    pub fn sync_target(&mut self) {
        self.target.copy_parameters_from(&self.live);
    }

    /// Operator override of the exploration value, clamped to `[0, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Learning steps performed since the agent was created or restored
    pub fn train_steps(&self) -> u64 {
        self.train_steps
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn live_network(&self) -> &NeuralNetwork {
        &self.live
    }

    pub fn target_network(&self) -> &NeuralNetwork {
        &self.target
    }

    /// Capture the full learning state.
    pub fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            format_version: CHECKPOINT_FORMAT_VERSION,
            live: self.live.clone(),
            target: self.target.clone(),
            optimizer: self.optimizer.clone(),
            epsilon: self.epsilon,
            train_steps: self.train_steps,
        }
    }

    /// Replace the learning state with `checkpoint`.
    ///
    /// A checkpoint whose estimator or optimizer shapes differ from this
    /// agent's is rejected as corrupt and leaves the agent untouched.
    /// `origin` labels the error.
    pub fn restore(&mut self, checkpoint: Checkpoint, origin: &Path) -> Result<()> {
        if !checkpoint.live.same_architecture(&self.live) || !checkpoint.target.same_architecture(&self.live) {
            return Err(PongError::corrupt(origin, "estimator shape does not match the agent"));
        }
        if !checkpoint.optimizer.matches_layers(&self.live.layers)
            || std::mem::discriminant(&checkpoint.optimizer) != std::mem::discriminant(&self.optimizer)
        {
            return Err(PongError::corrupt(origin, "optimizer state does not match the agent"));
        }

        self.live = checkpoint.live;
        self.target = checkpoint.target;
        self.optimizer = checkpoint.optimizer;
        self.epsilon = checkpoint.epsilon;
        self.train_steps = checkpoint.train_steps;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.snapshot().write_to(path.as_ref())
    }

    /// Restore from a checkpoint file; on any error the agent is unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let checkpoint = Checkpoint::read_from(path)?;
        self.restore(checkpoint, path)
    }
}
