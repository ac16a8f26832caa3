//! Bitboard chess engine core.
//!
//! This crate provides:
//! - [`Bitboard`] and the constant geometry tables it is built from
//! - Magic-bitboard attack tables for sliding pieces
//! - [`Position`], an immutable value holding boards, state and material
//! - Pseudo-legal and legal move generation, and perft
//! - Static evaluation and a minimax search with quiescence, null-move and
//!   forward pruning
//! - An iterative-deepening driver with cooperative cancellation
//! - [`Game`] for repetition and fifty-move bookkeeping
//!
//! # Architecture
//!
//! Each colored piece kind has its own 64-bit board, plus one for combined
//! occupancy. Applying a move copies the position and edits the copy, so a
//! search can hold any number of positions without undo logic.
//!
//! # Example
//!
//! ```
//! use chess_engine::{generate_legal, search, Position, SearchConfig, SearchLimits};
//!
//! let position = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1")?;
//! assert_eq!(generate_legal(&position).len(), 17);
//!
//! let report = search(&position, &SearchConfig::default(), SearchLimits::depth(1));
//! assert_eq!(report.best_move.map(|m| m.to_lan()), Some("a1a8".to_string()));
//! # Ok::<(), chess_engine::EngineError>(())
//! ```

mod bitboard;
pub mod config;
mod error;
pub mod eval;
mod game;
pub mod geometry;
pub mod lan;
pub mod movegen;
mod position;
pub mod search;
mod zobrist;

pub use bitboard::{Bitboard, BitboardIter};
pub use config::{ConfigError, EngineConfig, Pruning, SearchConfig, Strategy};
pub use error::EngineError;
pub use eval::{evaluate, EvalParams, Evaluator, PieceValues};
pub use game::{Game, GameError, GameStatus};
pub use lan::{apply_lan_moves, parse_lan, LanError};
pub use movegen::magics::{init_tables, TableBuildError};
pub use movegen::perft::{perft, perft_divide};
pub use movegen::{
    generate_legal, generate_pseudo_legal, is_king_attacked, is_legal, is_square_attacked,
    push_move, terminal_state, MoveList, Terminal,
};
pub use position::{IllegalPosition, Position, StateInfo, BOARD_COUNT};
pub use search::{
    search, spawn_search, CancelToken, DepthReport, Node, SearchCancelled, SearchHandle,
    SearchLimits, SearchReport, Searcher, TimeControl, MATE_SCORE,
};
pub use zobrist::{ZobristKeys, ZOBRIST};
