use std::collections::HashSet;

use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::PongError;
use crate::replay_buffer::{ReplayMemory, Transition};

fn transition(i: usize) -> Transition {
    Transition {
        observation: array![i as f32],
        action: i % 3,
        reward: i as f32,
        next_observation: array![(i + 1) as f32],
        terminal: i % 5 == 4,
    }
}

#[test]
fn test_push_and_sample() {
    let mut memory = ReplayMemory::new(10).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    memory.push(transition(7));

    assert_eq!(memory.len(), 1);
    let sample = memory.sample(1, &mut rng).unwrap();
    assert_eq!(sample[0], &transition(7));
}

#[test]
fn test_capacity_evicts_oldest_in_order() {
    let mut memory = ReplayMemory::new(3).unwrap();
    for i in 0..5 {
        memory.push(transition(i));
    }

    assert_eq!(memory.len(), 3);
    assert_eq!(memory.capacity(), 3);
    let rewards: Vec<f32> = memory.iter().map(|t| t.reward).collect();
    assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_sample_insufficient_data() {
    let mut memory = ReplayMemory::new(10).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    for i in 0..4 {
        memory.push(transition(i));
    }

    match memory.sample(5, &mut rng) {
        Err(PongError::InsufficientData { requested, available }) => {
            assert_eq!(requested, 5);
            assert_eq!(available, 4);
        }
        other => panic!("expected InsufficientData, got {:?}", other.map(|b| b.len())),
    }
    assert_eq!(memory.sample(4, &mut rng).unwrap().len(), 4);
}

#[test]
fn test_sample_without_replacement() {
    let mut memory = ReplayMemory::new(50).unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    for i in 0..20 {
        memory.push(transition(i));
    }

    for _ in 0..10 {
        let batch = memory.sample(20, &mut rng).unwrap();
        let distinct: HashSet<u32> = batch.iter().map(|t| t.reward as u32).collect();
        assert_eq!(distinct.len(), 20);
    }
}

#[test]
fn test_is_empty_and_zero_capacity() {
    let mut memory = ReplayMemory::new(2).unwrap();
    assert!(memory.is_empty());
    memory.push(transition(0));
    assert!(!memory.is_empty());

    assert!(matches!(ReplayMemory::new(0), Err(PongError::InvalidParameter { .. })));
}
