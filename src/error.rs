//! Error type shared by the planner and its loaders

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid standard recipe name '{name}': {reason}")]
    InvalidRecipeName { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid planning target: {0}")]
    InvalidTarget(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
