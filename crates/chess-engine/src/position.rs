//! Chess position representation.
//!
//! A [`Position`] is a plain value: thirteen bitboards (one per colored piece
//! kind plus combined occupancy), a packed [`StateInfo`] word, and an
//! incrementally maintained material balance. Applying a move produces a new
//! position and leaves the old one untouched.

use std::fmt;

use chess_core::{
    CastlingRights, Color, FenError, FenParts, Piece, PieceKind, Rank, Square,
    MAX_FULLMOVE_NUMBER, MAX_HALFMOVE_CLOCK,
};
use thiserror::Error;

use crate::eval::PieceValues;
use crate::geometry::RANKS;
use crate::movegen::is_king_attacked;
use crate::Bitboard;

/// Number of bitboards in a position: twelve piece kinds plus occupancy.
pub const BOARD_COUNT: usize = PieceKind::COUNT + 1;

const WHITE_TO_MOVE: u32 = 1;
const CASTLING_SHIFT: u32 = 1;
const EP_PRESENT: u32 = 1 << 5;
const EP_SHIFT: u32 = 6;
const HALFMOVE_SHIFT: u32 = 12;
const FULLMOVE_SHIFT: u32 = 19;

/// Side to move, castling rights, en passant target and both move counters
/// packed into one word.
///
/// | bits  | field                                   |
/// |-------|-----------------------------------------|
/// | 0     | white to move                           |
/// | 1-4   | castling rights (K, Q, k, q)            |
/// | 5     | en passant target present               |
/// | 6-11  | en passant target square                |
/// | 12-18 | half-move clock (saturates at 127)      |
/// | 19-31 | full-move counter (saturates at 8191)   |
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateInfo(u32);

impl StateInfo {
    pub const fn new(
        side_to_move: Color,
        castling: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        StateInfo(0)
            .with_side_to_move(side_to_move)
            .with_castling(castling)
            .with_en_passant(en_passant)
            .with_halfmove_clock(halfmove_clock)
            .with_fullmove_number(fullmove_number)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn side_to_move(self) -> Color {
        if self.0 & WHITE_TO_MOVE != 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline]
    pub const fn castling(self) -> CastlingRights {
        CastlingRights::from_bits((self.0 >> CASTLING_SHIFT) as u8)
    }

    #[inline]
    pub const fn en_passant(self) -> Option<Square> {
        if self.0 & EP_PRESENT != 0 {
            Some(Square::from_index_masked(self.0 >> EP_SHIFT))
        } else {
            None
        }
    }

    #[inline]
    pub const fn halfmove_clock(self) -> u32 {
        (self.0 >> HALFMOVE_SHIFT) & MAX_HALFMOVE_CLOCK
    }

    #[inline]
    pub const fn fullmove_number(self) -> u32 {
        (self.0 >> FULLMOVE_SHIFT) & MAX_FULLMOVE_NUMBER
    }

    #[inline]
    pub const fn with_side_to_move(self, color: Color) -> Self {
        match color {
            Color::White => StateInfo(self.0 | WHITE_TO_MOVE),
            Color::Black => StateInfo(self.0 & !WHITE_TO_MOVE),
        }
    }

    #[inline]
    pub const fn with_castling(self, rights: CastlingRights) -> Self {
        StateInfo((self.0 & !(0b1111 << CASTLING_SHIFT)) | ((rights.bits() as u32) << CASTLING_SHIFT))
    }

    #[inline]
    pub const fn with_en_passant(self, target: Option<Square>) -> Self {
        let cleared = self.0 & !(EP_PRESENT | (0x3F << EP_SHIFT));
        match target {
            Some(sq) => StateInfo(cleared | EP_PRESENT | ((sq.index() as u32) << EP_SHIFT)),
            None => StateInfo(cleared),
        }
    }

    /// Values above 127 are stored as 127.
    #[inline]
    pub const fn with_halfmove_clock(self, clock: u32) -> Self {
        let clock = if clock > MAX_HALFMOVE_CLOCK { MAX_HALFMOVE_CLOCK } else { clock };
        StateInfo((self.0 & !(MAX_HALFMOVE_CLOCK << HALFMOVE_SHIFT)) | (clock << HALFMOVE_SHIFT))
    }

    /// Values above 8191 are stored as 8191.
    #[inline]
    pub const fn with_fullmove_number(self, number: u32) -> Self {
        let number = if number > MAX_FULLMOVE_NUMBER { MAX_FULLMOVE_NUMBER } else { number };
        StateInfo((self.0 & !(MAX_FULLMOVE_NUMBER << FULLMOVE_SHIFT)) | (number << FULLMOVE_SHIFT))
    }
}

impl fmt::Debug for StateInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateInfo")
            .field("side_to_move", &self.side_to_move())
            .field("castling", &self.castling())
            .field("en_passant", &self.en_passant())
            .field("halfmove_clock", &self.halfmove_clock())
            .field("fullmove_number", &self.fullmove_number())
            .finish()
    }
}

/// Ways a position can be unreachable in a legal game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalPosition {
    #[error("{color} has {count} kings")]
    KingCount { color: Color, count: u32 },
    #[error("pawn on back rank square {0}")]
    PawnOnBackRank(Square),
    #[error("{0} is in check but it is not their move")]
    WaitingSideInCheck(Color),
}

/// A complete chess position.
#[derive(Clone, Copy, PartialEq)]
pub struct Position {
    boards: [Bitboard; BOARD_COUNT],
    info: StateInfo,
    material: f64,
}

impl Position {
    /// No pieces, white to move, no rights, counters `0 1`.
    pub fn empty() -> Self {
        Position {
            boards: [Bitboard::EMPTY; BOARD_COUNT],
            info: StateInfo::new(Color::White, CastlingRights::NONE, None, 0, 1),
            material: 0.0,
        }
    }

    pub fn startpos() -> Self {
        Self::from_fen_parts(&FenParts::default())
    }

    /// Parses a FEN string. Structural defects are errors; a well-formed
    /// FEN describing an unreachable position is accepted (see
    /// [`Position::validate`]).
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        FenParts::parse(fen).map(|parts| Self::from_fen_parts(&parts))
    }

    pub fn from_fen_parts(parts: &FenParts) -> Self {
        let mut position = Position::empty();
        for (sq, kind) in Square::all().zip(parts.board.iter()) {
            if let Some(kind) = *kind {
                position.put(kind, sq);
            }
        }
        position.info = StateInfo::new(
            parts.side_to_move,
            parts.castling,
            parts.en_passant,
            parts.halfmove_clock,
            parts.fullmove_number,
        );
        position
    }

    pub fn to_fen_parts(&self) -> FenParts {
        let mut board = [None; 64];
        for (sq, slot) in Square::all().zip(board.iter_mut()) {
            *slot = self.piece_at(sq);
        }
        FenParts {
            board,
            side_to_move: self.side_to_move(),
            castling: self.castling(),
            en_passant: self.en_passant(),
            halfmove_clock: self.halfmove_clock(),
            fullmove_number: self.fullmove_number(),
        }
    }

    pub fn to_fen(&self) -> String {
        self.to_fen_parts().to_fen()
    }

    #[inline]
    pub fn pieces(&self, kind: PieceKind) -> Bitboard {
        self.boards[kind.index()]
    }

    #[inline]
    pub fn pieces_of(&self, piece: Piece, color: Color) -> Bitboard {
        self.boards[PieceKind::new(piece, color).index()]
    }

    /// Every occupied square.
    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.boards[PieceKind::BLOCKERS]
    }

    /// Squares holding a piece of `color`.
    #[inline]
    pub fn color_occupancy(&self, color: Color) -> Bitboard {
        PieceKind::of_color(color)
            .iter()
            .fold(Bitboard::EMPTY, |acc, kind| acc | self.boards[kind.index()])
    }

    /// The kind on `sq`, probing boards in kind order.
    pub fn piece_at(&self, sq: Square) -> Option<PieceKind> {
        if !self.occupied().contains(sq) {
            return None;
        }
        PieceKind::ALL
            .into_iter()
            .find(|kind| self.boards[kind.index()].contains(sq))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(Piece::King, color).lsb()
    }

    #[inline]
    pub fn info(&self) -> StateInfo {
        self.info
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.info.side_to_move()
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.info.castling()
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.info.en_passant()
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.info.halfmove_clock()
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.info.fullmove_number()
    }

    /// Material balance with the standard weights, positive when white is
    /// ahead.
    #[inline]
    pub fn material(&self) -> f64 {
        self.material
    }

    /// Material balance recomputed from the boards.
    pub fn material_from_scratch(&self) -> f64 {
        PieceKind::ALL
            .iter()
            .map(|&kind| PieceValues::STANDARD.signed(kind) * self.pieces(kind).count() as f64)
            .sum()
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        is_king_attacked(self, color)
    }

    /// True once the half-move clock reaches 100.
    pub fn is_fifty_move_rule(&self) -> bool {
        self.halfmove_clock() >= 100
    }

    /// Checks that the position could arise in a legal game: one king per
    /// side, no pawns on the first or eighth rank, and the side that just
    /// moved not left in check.
    pub fn validate(&self) -> Result<(), IllegalPosition> {
        for color in Color::BOTH {
            let count = self.pieces_of(Piece::King, color).count();
            if count != 1 {
                return Err(IllegalPosition::KingCount { color, count });
            }
        }
        let pawns = self.pieces(PieceKind::WhitePawn) | self.pieces(PieceKind::BlackPawn);
        if let Some(sq) = (pawns & (RANKS[0] | RANKS[7])).lsb() {
            return Err(IllegalPosition::PawnOnBackRank(sq));
        }
        let waiting = self.side_to_move().opposite();
        if self.is_in_check(waiting) {
            return Err(IllegalPosition::WaitingSideInCheck(waiting));
        }
        Ok(())
    }

    pub fn is_illegal(&self) -> bool {
        self.validate().is_err()
    }

    pub(crate) fn put(&mut self, kind: PieceKind, sq: Square) {
        self.boards[kind.index()].set(sq);
        self.boards[PieceKind::BLOCKERS].set(sq);
        self.material += PieceValues::STANDARD.signed(kind);
    }

    pub(crate) fn remove(&mut self, kind: PieceKind, sq: Square) {
        if self.boards[kind.index()].contains(sq) {
            self.boards[kind.index()].clear(sq);
            self.boards[PieceKind::BLOCKERS].clear(sq);
            self.material -= PieceValues::STANDARD.signed(kind);
        }
    }

    pub(crate) fn set_info(&mut self, info: StateInfo) {
        self.info = info;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::ALL.iter().rev() {
            write!(f, "{} ", rank.to_char())?;
            for file in chess_core::File::ALL {
                match self.piece_at(Square::new(file, *rank)) {
                    Some(kind) => write!(f, "{} ", kind.fen_char())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}
