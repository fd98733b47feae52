use std::fmt;
use std::path::PathBuf;

/// Why a drop was refused
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MoveRejection {
    GameOver,
    OutOfRange,
    ColumnFull,
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            MoveRejection::GameOver => "game is over",
            MoveRejection::OutOfRange => "column out of range",
            MoveRejection::ColumnFull => "column full",
        };
        f.write_str(reason)
    }
}

/// Recoverable errors raised by the board, the search and the encoder
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// `column` is 1-based, matching what a player typed
    #[error("Invalid move, column {column}: {reason}")]
    InvalidMove { column: usize, reason: MoveRejection },

    #[error("no legal move, the board is full")]
    NoLegalMove,

    #[error("encoded key is {length} digits long, expected at most {limit}")]
    EncodingOverflow { length: usize, limit: usize },

    #[error("unsupported radix {0}, expected 2..=36")]
    UnsupportedRadix(u32),

    #[error("could not parse move sequence: {0}")]
    InvalidSequence(String),
}

/// Why an [`EngineConfig`](crate::config::EngineConfig) was refused
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Malformed(#[from] toml::de::Error),

    /// Dimensions or depths outside what the engine supports
    #[error("invalid config: {0}")]
    Invalid(String),
}
