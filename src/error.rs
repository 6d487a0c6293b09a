use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse csv {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("cannot merge tables with different headers: {expected:?} vs {found:?}")]
    HeaderMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("no input tables to merge")]
    NoInput,
}

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("required column missing from raw table: {0}")]
    MissingColumn(&'static str),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write csv {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to prepare database directory {path}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open database {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create table {table}")]
    Schema {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to insert message {message_id:?}")]
    Insert {
        message_id: Option<i64>,
        #[source]
        source: rusqlite::Error,
    },

    #[error("invalid value for column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("database query failed")]
    Query(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("unreadable image: {0}")]
    UnreadableImage(PathBuf),

    #[error("detector failed: {0}")]
    Model(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be an integer, got {value:?}")]
    InvalidInteger { name: &'static str, value: String },
}
