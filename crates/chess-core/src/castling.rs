//! Castling availability.

use std::fmt;

use crate::{Color, Square};

/// Which wing a castle goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    King,
    Queen,
}

impl CastleSide {
    pub const BOTH: [CastleSide; 2] = [CastleSide::King, CastleSide::Queen];
}

/// The four castling rights as a 4-bit set: K, Q, k, q from the low bit up.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        CastlingRights(bits & 0b1111)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    const fn flag(color: Color, side: CastleSide) -> u8 {
        let base = match side {
            CastleSide::King => 0b01,
            CastleSide::Queen => 0b10,
        };
        base << (color.index() * 2)
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::flag(color, side) != 0
    }

    #[inline]
    pub const fn with(self, color: Color, side: CastleSide) -> Self {
        CastlingRights(self.0 | Self::flag(color, side))
    }

    #[inline]
    pub const fn without(self, color: Color, side: CastleSide) -> Self {
        CastlingRights(self.0 & !Self::flag(color, side))
    }

    #[inline]
    pub const fn without_color(self, color: Color) -> Self {
        self.without(color, CastleSide::King)
            .without(color, CastleSide::Queen)
    }

    /// Rights that survive a move touching `square`, either as source or
    /// destination. Moving off a king's or rook's home square, or capturing
    /// onto a rook's home square, forfeits the matching rights.
    pub const fn after_touching(self, square: Square) -> Self {
        match square.index() {
            0 => self.without(Color::White, CastleSide::Queen),
            4 => self.without_color(Color::White),
            7 => self.without(Color::White, CastleSide::King),
            56 => self.without(Color::Black, CastleSide::Queen),
            60 => self.without_color(Color::Black),
            63 => self.without(Color::Black, CastleSide::King),
            _ => self,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parses the castling field of a FEN record (`KQkq`, `Kq`, `-`, ...).
    pub fn from_fen_field(field: &str) -> Option<Self> {
        if field == "-" {
            return Some(Self::NONE);
        }
        if field.is_empty() {
            return None;
        }
        field.chars().try_fold(Self::NONE, |rights, c| {
            let (color, side) = match c {
                'K' => (Color::White, CastleSide::King),
                'Q' => (Color::White, CastleSide::Queen),
                'k' => (Color::Black, CastleSide::King),
                'q' => (Color::Black, CastleSide::Queen),
                _ => return None,
            };
            Some(rights.with(color, side))
        })
    }
}

/// King start, king destination, rook start and rook destination squares of
/// a castle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlePath {
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
}

impl CastlePath {
    pub const fn new(color: Color, side: CastleSide) -> Self {
        match (color, side) {
            (Color::White, CastleSide::King) => CastlePath {
                king_from: Square::E1,
                king_to: Square::G1,
                rook_from: Square::H1,
                rook_to: Square::F1,
            },
            (Color::White, CastleSide::Queen) => CastlePath {
                king_from: Square::E1,
                king_to: Square::C1,
                rook_from: Square::A1,
                rook_to: Square::D1,
            },
            (Color::Black, CastleSide::King) => CastlePath {
                king_from: Square::E8,
                king_to: Square::G8,
                rook_from: Square::H8,
                rook_to: Square::F8,
            },
            (Color::Black, CastleSide::Queen) => CastlePath {
                king_from: Square::E8,
                king_to: Square::C8,
                rook_from: Square::A8,
                rook_to: Square::D8,
            },
        }
    }

    /// Looks up the castle whose king lands on `king_to`.
    pub fn by_destination(king_to: Square) -> Option<Self> {
        let (color, side) = match king_to {
            Square::G1 => (Color::White, CastleSide::King),
            Square::C1 => (Color::White, CastleSide::Queen),
            Square::G8 => (Color::Black, CastleSide::King),
            Square::C8 => (Color::Black, CastleSide::Queen),
            _ => return None,
        };
        Some(Self::new(color, side))
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (c, color, side) in [
            ('K', Color::White, CastleSide::King),
            ('Q', Color::White, CastleSide::Queen),
            ('k', Color::Black, CastleSide::King),
            ('q', Color::Black, CastleSide::Queen),
        ] {
            if self.has(color, side) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CastlingRights({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fen_field_round_trip() {
        for field in ["KQkq", "Kq", "k", "-", "Qk"] {
            let rights = CastlingRights::from_fen_field(field).unwrap();
            assert_eq!(rights.to_string(), field);
        }
        assert_eq!(CastlingRights::from_fen_field("KX"), None);
        assert_eq!(CastlingRights::from_fen_field(""), None);
    }

    #[test]
    fn bit_layout() {
        let rights = CastlingRights::NONE
            .with(Color::White, CastleSide::King)
            .with(Color::Black, CastleSide::Queen);
        assert_eq!(rights.bits(), 0b1001);
    }

    #[test]
    fn touching_home_squares_revokes_rights() {
        let all = CastlingRights::ALL;
        assert_eq!(all.after_touching(Square::E1).to_string(), "kq");
        assert_eq!(all.after_touching(Square::H1).to_string(), "Qkq");
        assert_eq!(all.after_touching(Square::A8).to_string(), "KQk");
        assert_eq!(all.after_touching(Square::E8).to_string(), "KQ");
        assert_eq!(all.after_touching("d4".parse().unwrap()), all);
    }

    #[test]
    fn castle_paths() {
        let path = CastlePath::new(Color::Black, CastleSide::Queen);
        assert_eq!(path.king_to, Square::C8);
        assert_eq!(path.rook_from, Square::A8);
        assert_eq!(path.rook_to, Square::D8);
        assert_eq!(CastlePath::by_destination(Square::G1), Some(CastlePath::new(Color::White, CastleSide::King)));
        assert_eq!(CastlePath::by_destination("e4".parse().unwrap()), None);
    }
}
