//! Error types for the bonus board engine

use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum BonusError {
    #[error("Invalid weight table: weights for phase '{phase}' sum to zero")]
    InvalidWeightTable { phase: String },

    #[error("Unknown weight phase: {0}")]
    UnknownPhase(String),

    #[error("Cell out of bounds: col {col}, row {row}")]
    CellOutOfBounds { col: usize, row: usize },

    #[error("Cell already occupied: col {col}, row {row}")]
    CellOccupied { col: usize, row: usize },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Bonus round not armed")]
    NotArmed,

    #[error("Bonus round already ended, reset required")]
    RoundEnded,

    #[error("Spin step already in progress")]
    StepInProgress,

    #[error("Presentation error: {0}")]
    Presentation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type BonusResult<T> = Result<T, BonusError>;
