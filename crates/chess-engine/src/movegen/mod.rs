//! Move generation and move application.
//!
//! Generation runs in two stages. [`generate_pseudo_legal`] produces every
//! move that follows piece-movement rules, ignoring checks.
//! [`generate_legal`] then filters that list, rejecting castles out of,
//! through or into check and any move that leaves the mover's king
//! attacked.

mod attacks;
pub mod magics;
pub mod perft;

use chess_core::{CastlePath, CastleSide, Color, Move, Piece, PieceKind, Square};

use crate::geometry::{ray, Direction};
use crate::{Bitboard, Position};

pub use attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, pawn_pushes, queen_attacks,
    rook_attacks,
};

/// A list of moves with a fixed maximum capacity.
///
/// The bound covers pseudo-legal generation, which can exceed the 218-move
/// legal maximum, so generation never allocates.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; Self::MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const MAX_MOVES: usize = 256;

    #[inline]
    pub const fn new() -> Self {
        MoveList {
            moves: [Move::NULL; Self::MAX_MOVES],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, m: Move) {
        debug_assert!(self.len < Self::MAX_MOVES);
        if self.len < Self::MAX_MOVES {
            self.moves[self.len] = m;
            self.len += 1;
        }
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Drops everything past the first `len` moves.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn contains(&self, m: Move) -> bool {
        self.as_slice().contains(&m)
    }

    /// Retains only moves for which the predicate returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&Move) -> bool,
    {
        let mut write = 0;
        for read in 0..self.len {
            if f(&self.moves[read]) {
                self.moves[write] = self.moves[read];
                write += 1;
            }
        }
        self.len = write;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for MoveList {
    type Output = Move;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// How a game ends when the side to move has no legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Checkmate,
    Stalemate,
}

/// Generates every pseudo-legal move for the side to move.
pub fn generate_pseudo_legal(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    let us = position.side_to_move();
    let own = position.color_occupancy(us);
    let occupied = position.occupied();

    generate_pawn_moves(position, &mut moves);

    for from in position.pieces_of(Piece::Knight, us) {
        push_targets(position, &mut moves, from, Piece::Knight, knight_attacks(from) & !own);
    }
    for from in position.pieces_of(Piece::Bishop, us) {
        push_targets(position, &mut moves, from, Piece::Bishop, bishop_attacks(from, occupied) & !own);
    }
    for from in position.pieces_of(Piece::Rook, us) {
        push_targets(position, &mut moves, from, Piece::Rook, rook_attacks(from, occupied) & !own);
    }
    for from in position.pieces_of(Piece::Queen, us) {
        push_targets(position, &mut moves, from, Piece::Queen, queen_attacks(from, occupied) & !own);
    }
    for from in position.pieces_of(Piece::King, us) {
        push_targets(position, &mut moves, from, Piece::King, king_attacks(from) & !own);
    }

    generate_castling_moves(position, &mut moves);
    moves
}

/// Generates every legal move for the side to move.
pub fn generate_legal(position: &Position) -> MoveList {
    let mut moves = generate_pseudo_legal(position);
    moves.retain(|m| is_legal(position, *m));
    moves
}

/// Whether a pseudo-legal move is legal.
pub fn is_legal(position: &Position, m: Move) -> bool {
    let us = position.side_to_move();

    if position.color_occupancy(us).contains(m.to()) {
        return false;
    }

    if m.is_castling() {
        if is_king_attacked(position, us) {
            return false;
        }
        let transit = Square::from_index_masked(((m.from().index() + m.to().index()) / 2) as u32);
        if is_square_attacked(position, transit, us.opposite()) {
            return false;
        }
    }

    !is_king_attacked(&push_move(position, m), us)
}

/// The game result when the side to move has no legal move, `None` while
/// play can continue.
pub fn terminal_state(position: &Position) -> Option<Terminal> {
    if !generate_legal(position).is_empty() {
        return None;
    }
    if is_king_attacked(position, position.side_to_move()) {
        Some(Terminal::Checkmate)
    } else {
        Some(Terminal::Stalemate)
    }
}

fn push_targets(position: &Position, moves: &mut MoveList, from: Square, piece: Piece, targets: Bitboard) {
    let moved = piece.with_color(position.side_to_move());
    for to in targets {
        moves.push(with_capture_at(position, Move::new(from, to, moved), to));
    }
}

fn with_capture_at(position: &Position, m: Move, sq: Square) -> Move {
    match position.piece_at(sq) {
        Some(captured) => m.with_capture(captured),
        None => m,
    }
}

fn push_pawn_move(moves: &mut MoveList, m: Move, us: Color) {
    if m.to().rank() == us.promotion_rank() {
        for piece in Piece::PROMOTIONS {
            moves.push(m.with_promotion(piece.with_color(us)));
        }
    } else {
        moves.push(m);
    }
}

fn generate_pawn_moves(position: &Position, moves: &mut MoveList) {
    let us = position.side_to_move();
    let them = us.opposite();
    let pawn = PieceKind::new(Piece::Pawn, us);
    let their_pieces = position.color_occupancy(them);
    let empty = !position.occupied();
    let start_rank = match us {
        Color::White => chess_core::Rank::Second,
        Color::Black => chess_core::Rank::Seventh,
    };

    for from in position.pieces(pawn) {
        let origin = Bitboard::from_square(from);

        let single = pawn_pushes(origin, us) & empty;
        if let Some(to) = single.lsb() {
            push_pawn_move(moves, Move::new(from, to, pawn), us);
            if from.rank() == start_rank {
                if let Some(to) = (pawn_pushes(single, us) & empty).lsb() {
                    moves.push(Move::new(from, to, pawn));
                }
            }
        }

        for to in pawn_attacks(from, us) & their_pieces {
            push_pawn_move(moves, with_capture_at(position, Move::new(from, to, pawn), to), us);
        }

        if let Some(ep) = position.en_passant() {
            if pawn_attacks(from, us).contains(ep) {
                let captured = PieceKind::new(Piece::Pawn, them);
                moves.push(Move::new(from, ep, pawn).with_capture(captured).with_en_passant());
            }
        }
    }
}

/// Adds castles whose right is held and whose path between king and rook
/// is empty. Attacked squares are checked by the legality filter.
fn generate_castling_moves(position: &Position, moves: &mut MoveList) {
    let us = position.side_to_move();
    let rights = position.castling();
    let king = PieceKind::new(Piece::King, us);
    let rook = PieceKind::new(Piece::Rook, us);

    for side in CastleSide::BOTH {
        if !rights.has(us, side) {
            continue;
        }
        let path = CastlePath::new(us, side);
        if !position.pieces(king).contains(path.king_from) || !position.pieces(rook).contains(path.rook_from) {
            continue;
        }
        let dir = match side {
            CastleSide::King => Direction::East,
            CastleSide::Queen => Direction::West,
        };
        let between = ray(dir, path.king_from).and_not(ray(dir, path.rook_from)).without(path.rook_from);
        if (between & position.occupied()).is_empty() {
            moves.push(Move::new(path.king_from, path.king_to, king).with_castling());
        }
    }
}

/// Whether any piece of `by` attacks `sq`.
pub fn is_square_attacked(position: &Position, sq: Square, by: Color) -> bool {
    let occupied = position.occupied();
    let queens = position.pieces_of(Piece::Queen, by);

    (pawn_attacks(sq, by.opposite()) & position.pieces_of(Piece::Pawn, by)).is_not_empty()
        || (knight_attacks(sq) & position.pieces_of(Piece::Knight, by)).is_not_empty()
        || (king_attacks(sq) & position.pieces_of(Piece::King, by)).is_not_empty()
        || (bishop_attacks(sq, occupied) & (position.pieces_of(Piece::Bishop, by) | queens)).is_not_empty()
        || (rook_attacks(sq, occupied) & (position.pieces_of(Piece::Rook, by) | queens)).is_not_empty()
}

/// Whether the king of `color` is attacked. A side without a king is never
/// in check.
pub fn is_king_attacked(position: &Position, color: Color) -> bool {
    position
        .king_square(color)
        .is_some_and(|king| is_square_attacked(position, king, color.opposite()))
}

/// Applies `m` and returns the resulting position.
///
/// `m` must be pseudo-legal for `position`; the null move passes the turn.
pub fn push_move(position: &Position, m: Move) -> Position {
    let mut next = *position;
    let info = position.info();
    let us = info.side_to_move();
    let them = us.opposite();
    let fullmove = match us {
        Color::White => info.fullmove_number(),
        Color::Black => info.fullmove_number() + 1,
    };

    let moved = match m.moved().or_else(|| position.piece_at(m.from())) {
        Some(kind) if !m.is_null() => kind,
        _ => {
            next.set_info(
                info.with_side_to_move(them)
                    .with_en_passant(None)
                    .with_halfmove_clock(info.halfmove_clock() + 1)
                    .with_fullmove_number(fullmove),
            );
            return next;
        }
    };

    let (from, to) = (m.from(), m.to());
    next.remove(moved, from);

    if m.is_en_passant() {
        let victim = Square::new(to.file(), from.rank());
        next.remove(PieceKind::new(Piece::Pawn, them), victim);
    } else if let Some(captured) = m.captured() {
        next.remove(captured, to);
    }

    next.put(m.promotion().unwrap_or(moved), to);

    if m.is_castling() {
        if let Some(path) = CastlePath::by_destination(to) {
            let rook = PieceKind::new(Piece::Rook, us);
            next.remove(rook, path.rook_from);
            next.put(rook, path.rook_to);
        }
    }

    let is_pawn = moved.piece() == Piece::Pawn;
    let en_passant = if is_pawn && from.index().abs_diff(to.index()) == 16 {
        Square::from_index(((from.index() + to.index()) / 2) as u8)
    } else {
        None
    };
    let halfmove = if is_pawn || m.is_capture() {
        0
    } else {
        info.halfmove_clock() + 1
    };

    next.set_info(
        info.with_side_to_move(them)
            .with_castling(info.castling().after_touching(from).after_touching(to))
            .with_en_passant(en_passant)
            .with_halfmove_clock(halfmove)
            .with_fullmove_number(fullmove),
    );
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn find(moves: &MoveList, lan: &str) -> Option<Move> {
        moves.as_slice().iter().copied().find(|m| m.to_lan() == lan)
    }

    #[test]
    fn movelist_basics() {
        let mut list = MoveList::new();
        assert!(list.is_empty());
        let a = Move::new(sq("e2"), sq("e4"), PieceKind::WhitePawn);
        let b = Move::new(sq("d2"), sq("d4"), PieceKind::WhitePawn);
        list.push(a);
        list.push(b);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1], b);
        assert!(list.contains(a));
        list.retain(|m| m.from() == sq("d2"));
        assert_eq!(list.as_slice(), &[b]);
        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn startpos_has_twenty_moves() {
        let position = Position::startpos();
        assert_eq!(generate_pseudo_legal(&position).len(), 20);
        assert_eq!(generate_legal(&position).len(), 20);
    }

    #[test]
    fn moves_carry_moved_and_captured_kinds() {
        let position =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2").unwrap();
        let moves = generate_legal(&position);
        let capture = find(&moves, "e4d5").unwrap();
        assert_eq!(capture.moved(), Some(PieceKind::WhitePawn));
        assert_eq!(capture.captured(), Some(PieceKind::BlackPawn));
        let quiet = find(&moves, "g1f3").unwrap();
        assert_eq!(quiet.moved(), Some(PieceKind::WhiteKnight));
        assert_eq!(quiet.captured(), None);
    }

    #[test]
    fn double_push_sets_en_passant_target() {
        let position = Position::startpos();
        let m = find(&generate_legal(&position), "e2e4").unwrap();
        let next = push_move(&position, m);
        assert_eq!(next.side_to_move(), Color::Black);
        assert_eq!(next.en_passant(), Some(sq("e3")));
        assert_eq!(next.piece_at(sq("e4")), Some(PieceKind::WhitePawn));
        assert_eq!(next.piece_at(sq("e2")), None);
        assert_eq!(next.halfmove_clock(), 0);
        assert_eq!(next.fullmove_number(), 1);
        // Copy-on-write: the original is untouched.
        assert_eq!(position, Position::startpos());
    }

    #[test]
    fn en_passant_capture_removes_passed_pawn() {
        let position =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
        let m = find(&generate_legal(&position), "e5f6").unwrap();
        assert!(m.is_en_passant());
        assert_eq!(m.captured(), Some(PieceKind::BlackPawn));
        let next = push_move(&position, m);
        assert_eq!(next.piece_at(sq("f5")), None);
        assert_eq!(next.piece_at(sq("f6")), Some(PieceKind::WhitePawn));
        assert_eq!(next.material(), 1.0);
        assert_eq!(next.en_passant(), None);
    }

    #[test]
    fn castling_moves_rook() {
        let position = Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
        let moves = generate_legal(&position);
        let short = find(&moves, "e1g1").unwrap();
        assert!(short.is_castling());
        assert!(find(&moves, "e1c1").unwrap().is_castling());

        let next = push_move(&position, short);
        assert_eq!(next.piece_at(Square::G1), Some(PieceKind::WhiteKing));
        assert_eq!(next.piece_at(Square::F1), Some(PieceKind::WhiteRook));
        assert_eq!(next.piece_at(Square::H1), None);
        assert_eq!(next.castling().to_string(), "kq");
    }

    #[test]
    fn no_castling_through_attacked_square() {
        let position = Position::from_fen("r3k2r/ppppp1pp/8/5r2/8/8/PPPPP1PP/R3K2R w KQkq - 0 1").unwrap();
        let moves = generate_legal(&position);
        assert!(find(&moves, "e1g1").is_none());
        assert!(find(&moves, "e1c1").is_some());
        // The pseudo-legal list still offers it.
        assert!(find(&generate_pseudo_legal(&position), "e1g1").is_some());
    }

    #[test]
    fn no_castling_out_of_or_into_check() {
        let in_check = Position::from_fen("r3k2r/pppp1ppp/8/4r3/8/8/PPPP1PPP/R3K2R w KQkq - 0 1").unwrap();
        let moves = generate_legal(&in_check);
        assert!(!moves.as_slice().iter().any(|m| m.is_castling()));

        let into_check = Position::from_fen("r3k2r/pppppp1p/8/6r1/8/8/PPPPPP1P/R3K2R w KQkq - 0 1").unwrap();
        assert!(find(&generate_legal(&into_check), "e1g1").is_none());
    }

    #[test]
    fn no_castling_without_rook_or_through_pieces() {
        let blocked = Position::from_fen("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1").unwrap();
        let moves = generate_legal(&blocked);
        assert!(!moves.as_slice().iter().any(|m| m.is_castling()));

        let rook_gone = Position::from_fen("r3k2r/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert!(!generate_legal(&rook_gone).as_slice().iter().any(|m| m.is_castling()));
    }

    #[test]
    fn rook_capture_revokes_castling() {
        let position = Position::from_fen("r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1").unwrap();
        let m = find(&generate_legal(&position), "g2h1").unwrap();
        let next = push_move(&position, m);
        assert_eq!(next.castling().to_string(), "Qkq");
        assert_eq!(next.halfmove_clock(), 0);
        assert_eq!(next.fullmove_number(), 2);
    }

    #[test]
    fn promotions() {
        let position = Position::from_fen("1n5k/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let moves = generate_legal(&position);
        let promos: Vec<_> = moves.as_slice().iter().filter(|m| m.is_promotion()).collect();
        assert_eq!(promos.len(), 8);
        let capture_knight = find(&moves, "a7b8n").unwrap();
        assert_eq!(capture_knight.captured(), Some(PieceKind::BlackKnight));
        let next = push_move(&position, capture_knight);
        assert_eq!(next.piece_at(sq("b8")), Some(PieceKind::WhiteKnight));
        assert_eq!(next.material(), 3.0);
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let position = Position::from_fen("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1").unwrap();
        let moves = generate_legal(&position);
        assert!(!moves.as_slice().iter().any(|m| m.from() == sq("e2")));
    }

    #[test]
    fn null_move_passes_turn() {
        let position =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 3 7").unwrap();
        let next = push_move(&position, Move::NULL);
        assert_eq!(next.side_to_move(), Color::White);
        assert_eq!(next.en_passant(), None);
        assert_eq!(next.halfmove_clock(), 4);
        assert_eq!(next.fullmove_number(), 8);
        assert_eq!(next.occupied(), position.occupied());
        assert_eq!(next.castling(), position.castling());
    }

    #[test]
    fn checkmate_and_stalemate() {
        let mate = Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        assert_eq!(terminal_state(&mate), Some(Terminal::Checkmate));

        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(terminal_state(&stalemate), Some(Terminal::Stalemate));

        assert_eq!(terminal_state(&Position::startpos()), None);
    }

    #[test]
    fn attacked_squares() {
        let position = Position::startpos();
        assert!(is_square_attacked(&position, sq("e3"), Color::White));
        assert!(!is_square_attacked(&position, sq("e4"), Color::White));
        assert!(is_square_attacked(&position, sq("f6"), Color::Black));
        assert!(!is_king_attacked(&position, Color::White));
    }

    fn playout(choices: &[usize]) -> Vec<Position> {
        let mut positions = vec![Position::startpos()];
        for &choice in choices {
            let current = positions[positions.len() - 1];
            let moves = generate_legal(&current);
            if moves.is_empty() {
                break;
            }
            positions.push(push_move(&current, moves[choice % moves.len()]));
        }
        positions
    }

    proptest! {
        #[test]
        fn random_playouts_keep_invariants(choices in prop::collection::vec(any::<usize>(), 0..60)) {
            for position in playout(&choices) {
                let union = PieceKind::ALL.iter().fold(Bitboard::EMPTY, |acc, &k| acc | position.pieces(k));
                prop_assert_eq!(position.occupied(), union);
                prop_assert!((position.material() - position.material_from_scratch()).abs() < 1e-9);
                prop_assert!(!position.is_illegal());
                prop_assert_eq!(Position::from_fen(&position.to_fen()).unwrap(), position);
                for m in generate_legal(&position).as_slice() {
                    prop_assert!(is_legal(&position, *m));
                }
            }
        }
    }
}
