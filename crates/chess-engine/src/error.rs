use chess_core::FenError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::lan::LanError;
use crate::movegen::magics::TableBuildError;

/// Any error the engine reports to its caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed FEN: {0}")]
    MalformedFen(#[from] FenError),
    #[error("illegal move notation: {0}")]
    IllegalMoveNotation(#[from] LanError),
    #[error("attack table build failed: {0}")]
    TableBuildFailure(#[from] TableBuildError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
