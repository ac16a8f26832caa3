//! Packed move values and long-algebraic notation.

use std::fmt;

use thiserror::Error;

use crate::{Piece, PieceKind, Square};

const TO_SHIFT: u32 = 0;
const FROM_SHIFT: u32 = 6;
const MOVED_SHIFT: u32 = 12;
const CAPTURED_SHIFT: u32 = 16;
const PROMOTION_SHIFT: u32 = 20;
const PROMOTION_FLAG: u32 = 1 << 24;
const EN_PASSANT_FLAG: u32 = 1 << 25;
const CASTLING_FLAG: u32 = 1 << 26;

const SQUARE_MASK: u32 = 0x3F;
const KIND_MASK: u32 = 0xF;
const NO_PIECE: u32 = PieceKind::BLOCKERS as u32;

/// A move packed into 32 bits.
///
/// | bits  | field                                  |
/// |-------|----------------------------------------|
/// | 0-5   | destination square                     |
/// | 6-11  | source square                          |
/// | 12-15 | moved piece kind (12 = none)           |
/// | 16-19 | captured piece kind (12 = none)        |
/// | 20-23 | promotion piece kind (12 = none)       |
/// | 24    | promotion flag                         |
/// | 25    | en passant flag                        |
/// | 26    | castling flag                          |
///
/// A move whose source equals its destination is the null move: applying it
/// only passes the turn.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move(u32);

impl Move {
    pub const NULL: Move = Move(
        (NO_PIECE << MOVED_SHIFT) | (NO_PIECE << CAPTURED_SHIFT) | (NO_PIECE << PROMOTION_SHIFT),
    );

    /// A quiet move of `moved` from `from` to `to`. Use the `with_*`
    /// builders to attach a capture, promotion or special-move flag.
    #[inline]
    pub const fn new(from: Square, to: Square, moved: PieceKind) -> Self {
        Move(
            ((to.index() as u32) << TO_SHIFT)
                | ((from.index() as u32) << FROM_SHIFT)
                | ((moved as u32) << MOVED_SHIFT)
                | (NO_PIECE << CAPTURED_SHIFT)
                | (NO_PIECE << PROMOTION_SHIFT),
        )
    }

    #[inline]
    pub const fn with_capture(self, captured: PieceKind) -> Self {
        Move(
            (self.0 & !(KIND_MASK << CAPTURED_SHIFT)) | ((captured as u32) << CAPTURED_SHIFT),
        )
    }

    #[inline]
    pub const fn with_promotion(self, promotion: PieceKind) -> Self {
        Move(
            (self.0 & !(KIND_MASK << PROMOTION_SHIFT))
                | ((promotion as u32) << PROMOTION_SHIFT)
                | PROMOTION_FLAG,
        )
    }

    #[inline]
    pub const fn with_en_passant(self) -> Self {
        Move(self.0 | EN_PASSANT_FLAG)
    }

    #[inline]
    pub const fn with_castling(self) -> Self {
        Move(self.0 | CASTLING_FLAG)
    }

    #[inline]
    pub const fn from(self) -> Square {
        Square::from_index_masked(self.0 >> FROM_SHIFT)
    }

    #[inline]
    pub const fn to(self) -> Square {
        Square::from_index_masked(self.0 >> TO_SHIFT)
    }

    #[inline]
    pub const fn moved(self) -> Option<PieceKind> {
        PieceKind::from_index(((self.0 >> MOVED_SHIFT) & KIND_MASK) as u8)
    }

    #[inline]
    pub const fn captured(self) -> Option<PieceKind> {
        PieceKind::from_index(((self.0 >> CAPTURED_SHIFT) & KIND_MASK) as u8)
    }

    #[inline]
    pub const fn promotion(self) -> Option<PieceKind> {
        PieceKind::from_index(((self.0 >> PROMOTION_SHIFT) & KIND_MASK) as u8)
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.0 & PROMOTION_FLAG != 0
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.0 & EN_PASSANT_FLAG != 0
    }

    #[inline]
    pub const fn is_castling(self) -> bool {
        self.0 & CASTLING_FLAG != 0
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        (self.0 >> CAPTURED_SHIFT) & KIND_MASK != NO_PIECE
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        (self.0 >> FROM_SHIFT) & SQUARE_MASK == (self.0 >> TO_SHIFT) & SQUARE_MASK
    }

    /// Raw packed value.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Long algebraic notation: `e2e4`, `e7e8q`, or `0000` for the null move.
    pub fn to_lan(self) -> String {
        if self.is_null() {
            return "0000".to_string();
        }
        let mut lan = format!("{}{}", self.from(), self.to());
        if let Some(promotion) = self.promotion() {
            lan.push(promotion.piece().letter());
        }
        lan
    }

    /// The syntactic part of this move, for comparison with parsed input.
    pub fn lan_move(self) -> LanMove {
        LanMove {
            from: self.from(),
            to: self.to(),
            promotion: self.promotion().map(PieceKind::piece),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lan())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_lan())?;
        if let Some(captured) = self.captured() {
            write!(f, "x{captured}")?;
        }
        if self.is_en_passant() {
            f.write_str(" ep")?;
        }
        if self.is_castling() {
            f.write_str(" castle")?;
        }
        Ok(())
    }
}

/// Errors from parsing long algebraic notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("move {0:?} must be 4 or 5 characters")]
    InvalidLength(String),
    #[error("move {0:?} has an invalid square")]
    InvalidSquare(String),
    #[error("move {0:?} has an invalid promotion piece")]
    InvalidPromotion(String),
}

/// The squares and promotion piece written in a LAN string, before they
/// are resolved against a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl LanMove {
    pub fn parse(lan: &str) -> Result<Self, NotationError> {
        if !lan.is_ascii() || !(4..=5).contains(&lan.len()) {
            return Err(NotationError::InvalidLength(lan.to_string()));
        }
        let from = Square::from_algebraic(&lan[0..2])
            .ok_or_else(|| NotationError::InvalidSquare(lan.to_string()))?;
        let to = Square::from_algebraic(&lan[2..4])
            .ok_or_else(|| NotationError::InvalidSquare(lan.to_string()))?;
        let promotion = match lan[4..].chars().next() {
            None => None,
            Some(c) => match Piece::from_letter(c) {
                Some(piece) if Piece::PROMOTIONS.contains(&piece) => Some(piece),
                _ => return Err(NotationError::InvalidPromotion(lan.to_string())),
            },
        };
        Ok(LanMove {
            from,
            to,
            promotion,
        })
    }

    pub fn is_null(&self) -> bool {
        self.from == self.to
    }
}
