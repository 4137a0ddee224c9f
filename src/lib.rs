//! Missionboard - a kanban ticket board for AI agents and humans.
//!
//! This library provides the core functionality for the `mb` CLI tool and
//! board server: ticket/comment/message tracking, an agent roster, and a
//! subscribe-and-refetch sync model over a local relational backend.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod models;
pub mod server;
pub mod store;
pub mod sync;
pub mod views;


/// Library-level error type for Missionboard operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Missionboard operations.
pub type Result<T> = std::result::Result<T, Error>;
