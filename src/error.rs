use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("IO Error reading expenses: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Error decoding expenses: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Expenses must be a JSON array of entries")]
    NotAnArray,

    #[error("Invalid expense entry at index {index}: {reason}")]
    Validation { index: usize, reason: String },

    #[error("Amounts overflow at expense entry {index}")]
    Overflow { index: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No configuration found at {}, \
        run `invoicer setup` or pass --interactive",
        path.display()
    )]
    NotFound { path: PathBuf },

    #[error("Could not determine a configuration directory, use --config-dir")]
    NoConfigDir,

    #[error("IO Error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Error decoding configuration: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
