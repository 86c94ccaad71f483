//! Configuration - command line flags with environment fallbacks
//!
//! Values come from flags, then `COACH_*` environment variables (a `.env`
//! file is loaded first by `main`), then the defaults below.

use std::path::{Path, PathBuf};

use clap::Args;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "coach.db";
pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const MAX_ROWS_ABSOLUTE: usize = 10_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Database file not found: {0}")]
    DatabaseMissing(PathBuf),

    #[error("max_rows must be at least 1")]
    MaxRowsTooSmall,

    #[error("max_rows ({max_rows}) cannot exceed {absolute}")]
    MaxRowsTooLarge { max_rows: usize, absolute: usize },
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "COACH_DB_PATH", default_value = DEFAULT_DB_PATH, global = true)]
    pub db_path: PathBuf,

    /// Row cap for plan and log range queries
    #[arg(long, env = "COACH_MAX_ROWS", default_value_t = DEFAULT_MAX_ROWS, global = true)]
    pub max_rows: usize,

    #[arg(skip = MAX_ROWS_ABSOLUTE)]
    pub max_rows_absolute: usize,
}

impl Config {
    pub fn from_db_path(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            max_rows: DEFAULT_MAX_ROWS,
            max_rows_absolute: MAX_ROWS_ABSOLUTE,
        }
    }

    /// Check limits and that the database already exists.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.db_path.exists() {
            return Err(ConfigError::DatabaseMissing(self.db_path.clone()));
        }
        self.validate_limits()
    }

    /// Check limits only; used where the database may still be created.
    pub fn validate_limits(&self) -> Result<(), ConfigError> {
        if self.max_rows < 1 {
            return Err(ConfigError::MaxRowsTooSmall);
        }
        if self.max_rows > self.max_rows_absolute {
            return Err(ConfigError::MaxRowsTooLarge {
                max_rows: self.max_rows,
                absolute: self.max_rows_absolute,
            });
        }
        Ok(())
    }

    pub fn db_path_str(&self) -> String {
        self.db_path.to_string_lossy().into_owned()
    }
}
