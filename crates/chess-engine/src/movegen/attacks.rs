//! Attack sets for every piece type.
//!
//! Leaper tables (knight, king, pawn captures) are built at compile time by
//! shifting a single-square board; sliders go through the magic tables.

use chess_core::{Color, Square};

use crate::Bitboard;

pub use super::magics::{bishop_attacks, queen_attacks, rook_attacks};

#[derive(Clone, Copy)]
enum Leaper {
    Knight,
    King,
    WhitePawn,
    BlackPawn,
}

const KNIGHT_ATTACKS: [Bitboard; 64] = build_leaper(Leaper::Knight);
const KING_ATTACKS: [Bitboard; 64] = build_leaper(Leaper::King);
const WHITE_PAWN_ATTACKS: [Bitboard; 64] = build_leaper(Leaper::WhitePawn);
const BLACK_PAWN_ATTACKS: [Bitboard; 64] = build_leaper(Leaper::BlackPawn);

const fn knight_spread(bb: Bitboard) -> Bitboard {
    let two_up = bb.shift_up(2);
    let two_down = bb.shift_down(2);
    let two_left = bb.shift_left(2);
    let two_right = bb.shift_right(2);
    two_up
        .shift_left(1)
        .or(two_up.shift_right(1))
        .or(two_down.shift_left(1))
        .or(two_down.shift_right(1))
        .or(two_left.shift_up(1))
        .or(two_left.shift_down(1))
        .or(two_right.shift_up(1))
        .or(two_right.shift_down(1))
}

const fn king_spread(bb: Bitboard) -> Bitboard {
    let row = bb.or(bb.shift_left(1)).or(bb.shift_right(1));
    row.or(row.shift_up(1)).or(row.shift_down(1)).and_not(bb)
}

const fn white_pawn_spread(bb: Bitboard) -> Bitboard {
    let up = bb.shift_up(1);
    up.shift_left(1).or(up.shift_right(1))
}

const fn black_pawn_spread(bb: Bitboard) -> Bitboard {
    let down = bb.shift_down(1);
    down.shift_left(1).or(down.shift_right(1))
}

const fn build_leaper(leaper: Leaper) -> [Bitboard; 64] {
    let mut table = [Bitboard::EMPTY; 64];
    let mut sq = 0;
    while sq < 64 {
        let origin = Bitboard(1u64 << sq);
        table[sq] = match leaper {
            Leaper::Knight => knight_spread(origin),
            Leaper::King => king_spread(origin),
            Leaper::WhitePawn => white_pawn_spread(origin),
            Leaper::BlackPawn => black_pawn_spread(origin),
        };
        sq += 1;
    }
    table
}

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard {
    KNIGHT_ATTACKS[sq.index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> Bitboard {
    KING_ATTACKS[sq.index()]
}

/// Squares a pawn of `color` on `sq` captures on.
#[inline]
pub fn pawn_attacks(sq: Square, color: Color) -> Bitboard {
    match color {
        Color::White => WHITE_PAWN_ATTACKS[sq.index()],
        Color::Black => BLACK_PAWN_ATTACKS[sq.index()],
    }
}

/// Single-step pushes of every pawn in `pawns` for `color`, ignoring
/// blockers.
#[inline]
pub fn pawn_pushes(pawns: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => pawns.shift_up(1),
        Color::Black => pawns.shift_down(1),
    }
}
