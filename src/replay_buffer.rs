use ndarray::Array1;
use rand::Rng;
use rand::seq::index;
use std::collections::VecDeque;

use crate::error::{PongError, Result};

/// One step of experience: what was observed, what was done, and what followed.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_observation: Array1<f32>,
    pub terminal: bool,
}

/// Fixed-capacity experience replay with ring-buffer eviction.
///
/// Pushing into a full memory drops the oldest transition. Sampling is
/// uniform and without replacement inside one batch; separate calls draw
/// independently.
#[derive(Clone, Debug)]
pub struct ReplayMemory {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PongError::invalid_parameter("capacity", "must be greater than 0"));
        }
        Ok(ReplayMemory {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` distinct stored transitions uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if batch_size > self.buffer.len() {
            return Err(PongError::InsufficientData {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }

        Ok(index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect())
    }

    /// Stored transitions from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
