//! Core chess value types.
//!
//! This crate holds the plain data shared by the engine and its tools:
//! - [`Color`], [`Piece`] and the twelve colored [`PieceKind`]s
//! - [`Square`], [`File`] and [`Rank`] coordinates (a1 = 0, h8 = 63)
//! - [`Move`], a packed 32-bit move, and [`LanMove`] for long algebraic input
//! - [`CastlingRights`] and [`CastlePath`]
//! - [`FenParts`], the validated fields of a FEN record

mod castling;
mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use castling::{CastlePath, CastleSide, CastlingRights};
pub use color::Color;
pub use fen::{FenError, FenParts, MAX_FULLMOVE_NUMBER, MAX_HALFMOVE_CLOCK};
pub use mov::{LanMove, Move, NotationError};
pub use piece::{Piece, PieceKind};
pub use square::{File, ParseSquareError, Rank, Square};
