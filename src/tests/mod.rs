pub mod test_agent;
pub mod test_layers;
pub mod test_network;
pub mod test_replay_buffer;
pub mod test_trainer;
