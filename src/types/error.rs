//! Unified error types for the application
//!
//! This module defines error types that:
//! - Are serializable for view-layer consumption
//! - Provide actionable error messages
//! - Map internal errors to user-friendly variants

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error type for store operations and services
///
/// All errors are serializable so they can be rendered by any front-end.
/// Error messages should be user-friendly and actionable.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SkiffError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// Implement From for common error types

impl From<std::io::Error> for SkiffError {
    fn from(err: std::io::Error) -> Self {
        SkiffError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SkiffError {
    fn from(err: toml::de::Error) -> Self {
        SkiffError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SkiffError {
    fn from(err: serde_json::Error) -> Self {
        SkiffError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for SkiffError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SkiffError::Parse(err.to_string())
        } else {
            SkiffError::Network(err.to_string())
        }
    }
}

/// Result type alias using SkiffError
pub type Result<T> = std::result::Result<T, SkiffError>;
