//! FEN (Forsyth-Edwards Notation) records.
//!
//! [`FenParts`] is the decoded, validated form of a FEN string. It is
//! independent of any board representation; the engine builds its own
//! position from it.

use thiserror::Error;

use crate::{CastlingRights, Color, PieceKind, Rank, Square};

/// Largest half-move clock a position can hold.
pub const MAX_HALFMOVE_CLOCK: u32 = 127;
/// Largest full-move counter a position can hold.
pub const MAX_FULLMOVE_NUMBER: u32 = 8191;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 4 or 6 fields, got {0}")]
    InvalidFieldCount(usize),

    #[error("invalid piece placement: expected 8 ranks, got {0}")]
    InvalidRankCount(usize),

    #[error("invalid piece placement: unknown piece '{piece}' on rank {rank}")]
    InvalidPiece { piece: char, rank: u8 },

    #[error("invalid piece placement: rank {rank} describes {squares} squares")]
    InvalidRankLength { rank: u8, squares: u32 },

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),

    #[error("invalid castling rights: {0}")]
    InvalidCastlingRights(String),

    #[error("invalid en passant square: {0}")]
    InvalidEnPassantSquare(String),

    #[error("invalid halfmove clock: {0}")]
    InvalidHalfmoveClock(String),

    #[error("invalid fullmove number: {0}")]
    InvalidFullmoveNumber(String),
}

/// The six fields of a FEN record, decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenParts {
    /// Occupant of each square, indexed a1 = 0 .. h8 = 63.
    pub board: [Option<PieceKind>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl FenParts {
    /// The standard starting position.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Parses a FEN string.
    ///
    /// The two move counters may be omitted, in which case they default to
    /// `0 1`. Every other defect is an error.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(FenError::InvalidFieldCount(fields.len()));
        }

        let board = parse_placement(fields[0])?;
        let side_to_move = Color::from_fen_field(fields[1])
            .ok_or_else(|| FenError::InvalidActiveColor(fields[1].to_string()))?;
        let castling = CastlingRights::from_fen_field(fields[2])
            .ok_or_else(|| FenError::InvalidCastlingRights(fields[2].to_string()))?;
        let en_passant = parse_en_passant(fields[3])?;

        let (halfmove_clock, fullmove_number) = match fields.get(4..6) {
            Some([half, full]) => (
                parse_counter(half, MAX_HALFMOVE_CLOCK)
                    .ok_or_else(|| FenError::InvalidHalfmoveClock(half.to_string()))?,
                parse_counter(full, MAX_FULLMOVE_NUMBER)
                    .ok_or_else(|| FenError::InvalidFullmoveNumber(full.to_string()))?,
            ),
            _ => (0, 1),
        };

        Ok(FenParts {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Serializes back to a six-field FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::with_capacity(72);
        for rank in Rank::ALL.iter().rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[rank.index() as usize * 8 + file] {
                    Some(kind) => {
                        if empty > 0 {
                            placement.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        placement.push(kind.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push(char::from(b'0' + empty));
            }
            if *rank != Rank::First {
                placement.push('/');
            }
        }

        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{} {} {} {} {} {}",
            placement,
            self.side_to_move.fen_char(),
            self.castling,
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }
}

impl Default for FenParts {
    fn default() -> Self {
        let mut board = [None; 64];
        let back = "RNBQKBNR";
        for (file, c) in back.chars().enumerate() {
            board[file] = PieceKind::from_fen_char(c);
            board[56 + file] = PieceKind::from_fen_char(c.to_ascii_lowercase());
            board[8 + file] = Some(PieceKind::WhitePawn);
            board[48 + file] = Some(PieceKind::BlackPawn);
        }
        FenParts {
            board,
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

fn parse_placement(placement: &str) -> Result<[Option<PieceKind>; 64], FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidRankCount(ranks.len()));
    }

    let mut board = [None; 64];
    for (i, row) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut squares: u32 = 0;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                squares += skip;
                continue;
            }
            let kind = PieceKind::from_fen_char(c).ok_or(FenError::InvalidPiece {
                piece: c,
                rank: rank as u8 + 1,
            })?;
            if squares < 8 {
                board[rank * 8 + squares as usize] = Some(kind);
            }
            squares += 1;
        }
        if squares != 8 {
            return Err(FenError::InvalidRankLength {
                rank: rank as u8 + 1,
                squares,
            });
        }
    }
    Ok(board)
}

fn parse_en_passant(field: &str) -> Result<Option<Square>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    match Square::from_algebraic(field) {
        Some(sq) if matches!(sq.rank(), Rank::Third | Rank::Sixth) => Ok(Some(sq)),
        _ => Err(FenError::InvalidEnPassantSquare(field.to_string())),
    }
}

fn parse_counter(field: &str, max: u32) -> Option<u32> {
    field.parse::<u32>().ok().filter(|&n| n <= max)
}
