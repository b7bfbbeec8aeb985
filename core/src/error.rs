use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Board dimensions must be non-zero with an even tile count")]
    InvalidDimensions,
    #[error("Tile index out of range")]
    InvalidTileIndex,
    #[error("Board does not hold every pair exactly twice")]
    InvalidBoard,
    #[error("Leaderboard entry is malformed")]
    InvalidEntry,
    #[error("Leaderboard storage is unavailable")]
    StorageUnavailable,
}

pub type Result<T> = core::result::Result<T, GameError>;
