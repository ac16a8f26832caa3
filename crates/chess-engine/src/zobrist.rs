//! Zobrist hashing for position identification.
//!
//! A hash XORs one key per occupied (kind, square) pair with keys for black
//! to move, each held castling right and the file of the en passant target
//! when a pawn can actually take it. Two positions that agree on all of
//! these hash equal, which is exactly the identity used for repetition
//! detection.

use chess_core::{CastleSide, Color, Piece, PieceKind, Square};

use crate::movegen::pawn_attacks;
use crate::Position;

pub struct ZobristKeys {
    pieces: [[u64; 64]; PieceKind::COUNT],
    black_to_move: u64,
    /// Indexed by castling-right bit: K, Q, k, q.
    castling: [u64; 4],
    en_passant: [u64; 8],
}

const fn xorshift(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

impl ZobristKeys {
    /// Deterministic keys from a fixed xorshift stream.
    const fn new() -> Self {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut pieces = [[0u64; 64]; PieceKind::COUNT];
        let mut castling = [0u64; 4];
        let mut en_passant = [0u64; 8];

        let mut kind = 0;
        while kind < PieceKind::COUNT {
            let mut sq = 0;
            while sq < 64 {
                state = xorshift(state);
                pieces[kind][sq] = state;
                sq += 1;
            }
            kind += 1;
        }

        state = xorshift(state);
        let black_to_move = state;

        let mut i = 0;
        while i < 4 {
            state = xorshift(state);
            castling[i] = state;
            i += 1;
        }

        let mut i = 0;
        while i < 8 {
            state = xorshift(state);
            en_passant[i] = state;
            i += 1;
        }

        ZobristKeys {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    #[inline]
    pub const fn piece_key(&self, kind: PieceKind, sq: Square) -> u64 {
        self.pieces[kind.index()][sq.index()]
    }

    pub fn hash(&self, position: &Position) -> u64 {
        let mut hash = 0;
        for kind in PieceKind::ALL {
            for sq in position.pieces(kind) {
                hash ^= self.piece_key(kind, sq);
            }
        }
        if position.side_to_move() == Color::Black {
            hash ^= self.black_to_move;
        }
        let rights = position.castling();
        for (i, (color, side)) in [
            (Color::White, CastleSide::King),
            (Color::White, CastleSide::Queen),
            (Color::Black, CastleSide::King),
            (Color::Black, CastleSide::Queen),
        ]
        .into_iter()
        .enumerate()
        {
            if rights.has(color, side) {
                hash ^= self.castling[i];
            }
        }
        if let Some(ep) = capturable_en_passant(position) {
            hash ^= self.en_passant[ep.file().index() as usize];
        }
        hash
    }
}

/// The en passant target, if a pawn of the side to move attacks it. A target
/// nobody can take does not change which moves are available.
fn capturable_en_passant(position: &Position) -> Option<Square> {
    let ep = position.en_passant()?;
    let us = position.side_to_move();
    let takers = pawn_attacks(ep, us.opposite()) & position.pieces_of(Piece::Pawn, us);
    takers.is_not_empty().then_some(ep)
}

pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

impl Position {
    pub fn zobrist_hash(&self) -> u64 {
        ZOBRIST.hash(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{generate_legal, push_move};
    use chess_core::Move;

    fn play(position: &Position, lan: &str) -> Position {
        let m = generate_legal(position)
            .as_slice()
            .iter()
            .copied()
            .find(|m| m.to_lan() == lan)
            .unwrap();
        push_move(position, m)
    }

    #[test]
    fn keys_are_distinct() {
        let a = ZOBRIST.piece_key(PieceKind::WhitePawn, Square::A1);
        let b = ZOBRIST.piece_key(PieceKind::WhitePawn, Square::B1);
        let c = ZOBRIST.piece_key(PieceKind::BlackPawn, Square::A1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(ZOBRIST.black_to_move, 0);
    }

    #[test]
    fn side_to_move_changes_hash() {
        let start = Position::startpos();
        let passed = push_move(&start, Move::NULL);
        assert_ne!(start.zobrist_hash(), passed.zobrist_hash());
    }

    #[test]
    fn transpositions_hash_equal() {
        let start = Position::startpos();
        let a = play(&play(&play(&play(&start, "g1f3"), "g8f6"), "b1c3"), "b8c6");
        let b = play(&play(&play(&play(&start, "b1c3"), "b8c6"), "g1f3"), "g8f6");
        assert_eq!(a.zobrist_hash(), b.zobrist_hash());
    }

    #[test]
    fn rights_and_en_passant_are_part_of_identity() {
        let with_rights = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let without = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kkq - 0 1").unwrap();
        assert_ne!(with_rights.zobrist_hash(), without.zobrist_hash());

        let ep = Position::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1").unwrap();
        let no_ep = Position::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - - 0 1").unwrap();
        assert_ne!(ep.zobrist_hash(), no_ep.zobrist_hash());
    }

    #[test]
    fn uncapturable_en_passant_is_ignored() {
        let ep = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").unwrap();
        let no_ep = Position::from_fen("4k3/8/8/8/4P3/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(ep.zobrist_hash(), no_ep.zobrist_hash());

        // A white pawn on d4 does not help black.
        let ep = Position::from_fen("4k3/8/8/8/3PP3/8/8/4K3 b - e3 0 1").unwrap();
        let no_ep = Position::from_fen("4k3/8/8/8/3PP3/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(ep.zobrist_hash(), no_ep.zobrist_hash());
    }

    #[test]
    fn counters_do_not_affect_hash() {
        let a = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let b = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 37 60").unwrap();
        assert_eq!(a.zobrist_hash(), b.zobrist_hash());
    }
}
