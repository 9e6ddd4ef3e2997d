//! Best score persistence
//!
//! A single named integer that survives restarts. The session owns the
//! store and hands it to the match state machine at construction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name the best score is persisted under
pub const BEST_SCORE_KEY: &str = "best_score_breakout";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("score store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("score store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value style store for the persisted best score
pub trait ScoreStore {
    /// Stored best score, 0 if nothing has been stored yet
    fn get(&self) -> Result<u64, StoreError>;
    fn set(&mut self, score: u64) -> Result<(), StoreError>;
}

/// Volatile store, for tests and throwaway sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    best: u64,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u64) -> Self {
        Self { best }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn get(&self) -> Result<u64, StoreError> {
        Ok(self.best)
    }

    fn set(&mut self, score: u64) -> Result<(), StoreError> {
        self.best = score;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BestScoreFile {
    #[serde(rename = "best_score_breakout")]
    best_score: u64,
}

/// JSON file store, written atomically through a temp file
#[derive(Debug, Clone)]
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn get(&self) -> Result<u64, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let file: BestScoreFile = serde_json::from_str(&json)?;
        Ok(file.best_score)
    }

    fn set(&mut self, score: u64) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(&BestScoreFile { best_score: score })?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("Best score {} saved to {}", score, self.path.display());
        Ok(())
    }
}
