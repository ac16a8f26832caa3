//! Piece types, with and without color.

use crate::Color;

/// The six piece types, without color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    /// Pieces a pawn may promote to, strongest first.
    pub const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase letter used in FEN and in LAN promotion suffixes.
    pub const fn letter(self) -> char {
        match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        }
    }

    /// Parses a piece letter in either case.
    pub const fn from_letter(c: char) -> Option<Piece> {
        match c.to_ascii_lowercase() {
            'p' => Some(Piece::Pawn),
            'n' => Some(Piece::Knight),
            'b' => Some(Piece::Bishop),
            'r' => Some(Piece::Rook),
            'q' => Some(Piece::Queen),
            'k' => Some(Piece::King),
            _ => None,
        }
    }

    #[inline]
    pub const fn with_color(self, color: Color) -> PieceKind {
        PieceKind::new(self, color)
    }
}

/// One of the twelve colored piece kinds.
///
/// Discriminants 0..=5 are white pawn through king and 6..=11 the black
/// ones. Index 12 ([`PieceKind::BLOCKERS`]) is reserved: in a position it
/// names the combined-occupancy bitboard, and inside a packed move it
/// encodes "no piece".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PieceKind {
    WhitePawn = 0,
    WhiteKnight,
    WhiteBishop,
    WhiteRook,
    WhiteQueen,
    WhiteKing,
    BlackPawn,
    BlackKnight,
    BlackBishop,
    BlackRook,
    BlackQueen,
    BlackKing,
}

impl PieceKind {
    pub const COUNT: usize = 12;
    pub const BLOCKERS: usize = 12;

    pub const ALL: [PieceKind; 12] = [
        PieceKind::WhitePawn,
        PieceKind::WhiteKnight,
        PieceKind::WhiteBishop,
        PieceKind::WhiteRook,
        PieceKind::WhiteQueen,
        PieceKind::WhiteKing,
        PieceKind::BlackPawn,
        PieceKind::BlackKnight,
        PieceKind::BlackBishop,
        PieceKind::BlackRook,
        PieceKind::BlackQueen,
        PieceKind::BlackKing,
    ];

    #[inline]
    pub const fn new(piece: Piece, color: Color) -> Self {
        Self::ALL[color.index() * 6 + piece.index()]
    }

    /// Decodes an index; 12 and above (including the sentinel) give `None`.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < Self::COUNT {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn piece(self) -> Piece {
        Piece::ALL[self as usize % 6]
    }

    #[inline]
    pub const fn color(self) -> Color {
        if (self as u8) < 6 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// The six kinds belonging to `color`, pawn first.
    pub fn of_color(color: Color) -> &'static [PieceKind] {
        let start = color.index() * 6;
        &Self::ALL[start..start + 6]
    }

    pub const fn fen_char(self) -> char {
        let c = self.piece().letter();
        match self.color() {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub const fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        match Piece::from_letter(c) {
            Some(piece) => Some(Self::new(piece, color)),
            None => None,
        }
    }
}

impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fen_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_fen_letter_order() {
        let letters: String = PieceKind::ALL.iter().map(|k| k.fen_char()).collect();
        assert_eq!(letters, "PNBRQKpnbrqk");
    }

    #[test]
    fn kind_decomposes_into_piece_and_color() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::new(kind.piece(), kind.color()), kind);
        }
        assert_eq!(PieceKind::BlackQueen.piece(), Piece::Queen);
        assert_eq!(PieceKind::BlackQueen.color(), Color::Black);
        assert_eq!(Piece::Rook.with_color(Color::White), PieceKind::WhiteRook);
    }

    #[test]
    fn sentinel_index_is_not_a_kind() {
        assert_eq!(PieceKind::from_index(PieceKind::BLOCKERS as u8), None);
        assert_eq!(PieceKind::from_index(11), Some(PieceKind::BlackKing));
    }

    #[test]
    fn fen_chars() {
        assert_eq!(PieceKind::from_fen_char('N'), Some(PieceKind::WhiteKnight));
        assert_eq!(PieceKind::from_fen_char('k'), Some(PieceKind::BlackKing));
        assert_eq!(PieceKind::from_fen_char('x'), None);
        assert_eq!(PieceKind::from_fen_char('1'), None);
    }

    #[test]
    fn kinds_of_color() {
        assert!(PieceKind::of_color(Color::White)
            .iter()
            .all(|k| k.color() == Color::White));
        assert_eq!(PieceKind::of_color(Color::Black)[5], PieceKind::BlackKing);
    }

    #[test]
    fn promotion_letters() {
        let letters: String = Piece::PROMOTIONS.iter().map(|p| p.letter()).collect();
        assert_eq!(letters, "qrbn");
        assert_eq!(Piece::from_letter('Q'), Some(Piece::Queen));
    }
}
