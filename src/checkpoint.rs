//! Checkpoint encoding and the named-blob store checkpoints are written to.
//!
//! A [`Checkpoint`] is the complete learning state of an agent: both
//! estimators, the optimizer state, the exploration value and the learning
//! step counter. It is encoded with bincode behind a size limit, so a corrupt
//! file yields an error instead of an unbounded allocation.

use std::fs;
use std::path::{Path, PathBuf};

use bincode::Options;
use serde::{Serialize, Deserialize};

use crate::error::{PongError, Result};
use crate::network::NeuralNetwork;
use crate::optimizer::OptimizerWrapper;

/// Bumped whenever the encoded layout changes
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

const MAX_CHECKPOINT_BYTES: u64 = 512 * 1024 * 1024;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_CHECKPOINT_BYTES)
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Checkpoint {
    pub format_version: u32,
    pub live: NeuralNetwork,
    pub target: NeuralNetwork,
    pub optimizer: OptimizerWrapper,
    pub epsilon: f32,
    pub train_steps: u64,
}

impl Checkpoint {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(codec().serialize(self)?)
    }

    /// Decode and sanity-check a checkpoint. `origin` only labels errors.
    pub fn from_bytes(bytes: &[u8], origin: &Path) -> Result<Self> {
        let checkpoint: Checkpoint = codec()
            .deserialize(bytes)
            .map_err(|e| PongError::corrupt(origin, e.to_string()))?;
        checkpoint
            .check_consistency()
            .map_err(|reason| PongError::corrupt(origin, reason))?;
        Ok(checkpoint)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        write_atomically(path, &self.to_bytes()?)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PongError::CheckpointNotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, path)
    }

    fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(format!(
                "format version {} (expected {})",
                self.format_version, CHECKPOINT_FORMAT_VERSION
            ));
        }
        if let Some(reason) = self.live.shape_mismatch() {
            return Err(format!("live estimator: {}", reason));
        }
        if let Some(reason) = self.target.shape_mismatch() {
            return Err(format!("target estimator: {}", reason));
        }
        if !self.live.same_architecture(&self.target) {
            return Err("live and target estimators differ in shape".to_string());
        }
        if !self.optimizer.matches_layers(&self.live.layers) {
            return Err("optimizer state does not match the estimator".to_string());
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(format!("exploration value {} outside [0, 1]", self.epsilon));
        }
        Ok(())
    }
}

/// Write through a temporary sibling and rename, so an interrupted write
/// never leaves a truncated file under the final name.
fn write_atomically(path: &Path, blob: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, blob)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Named-blob storage used by the trainer for checkpoints and bookkeeping.
pub trait CheckpointStore {
    fn write(&self, name: &str, blob: &[u8]) -> Result<()>;

    /// Fails with [`PongError::CheckpointNotFound`] for unknown names
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    fn exists(&self, name: &str) -> bool;

    /// Where `name` lives, used in error messages and logs
    fn locate(&self, name: &str) -> PathBuf;
}

/// A directory of files, one per blob.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(DirectoryStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CheckpointStore for DirectoryStore {
    fn write(&self, name: &str, blob: &[u8]) -> Result<()> {
        write_atomically(&self.locate(name), blob)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.locate(name);
        if !path.is_file() {
            return Err(PongError::CheckpointNotFound(path));
        }
        Ok(fs::read(path)?)
    }

    fn exists(&self, name: &str) -> bool {
        self.locate(name).is_file()
    }

    fn locate(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}
