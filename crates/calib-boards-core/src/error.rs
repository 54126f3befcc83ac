use std::path::PathBuf;

use crate::LayoutError;

/// Errors produced while loading or resolving a board-set configuration.
///
/// Every variant is fatal: no board geometry is produced once one is returned.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config path '{}' doesn't exist", .0.display())]
    NotFound(PathBuf),
    #[error("config path '{}' must be a .{expected} file", path.display())]
    WrongExtension {
        path: PathBuf,
        expected: &'static str,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("missing required key `{0}`")]
    MissingField(&'static str),
    #[error("number_board must be >= 1")]
    NoBoards,
    #[error("`{field}` has {got} entries, expected {expected}")]
    ArrayLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("boards_index[{board}] = {index} is out of range for {count} boards")]
    BoardIndexOutOfRange {
        board: usize,
        index: usize,
        count: usize,
    },
    #[error("board {index} does not exist, the set has {count} boards")]
    NoSuchBoard { index: usize, count: usize },
    #[error("invalid `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("unknown marker dictionary `{0}`")]
    UnknownDictionary(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
