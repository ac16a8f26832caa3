//! Bitboard representation and operations.
//!
//! A bitboard is a 64-bit integer where each bit represents a square on the
//! chess board. Bit 0 is a1, bit 7 is h1 and bit 63 is h8.

use chess_core::Square;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

use crate::geometry::{LEFT_FILES, RIGHT_FILES};

/// A set of squares.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bitboard(pub u64);

impl Bitboard {
    /// No squares.
    pub const EMPTY: Bitboard = Bitboard(0);
    /// All 64 squares.
    pub const FULL: Bitboard = Bitboard(!0);

    /// Creates a bitboard from raw bits.
    #[inline]
    pub const fn new(bits: u64) -> Self {
        Bitboard(bits)
    }

    /// A bitboard with only `sq` set.
    #[inline]
    pub const fn from_square(sq: Square) -> Self {
        Bitboard(sq.bit())
    }

    /// True if no square is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if at least one square is set.
    #[inline]
    pub const fn is_not_empty(self) -> bool {
        self.0 != 0
    }

    /// Population count.
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// True if `sq` is set.
    #[inline]
    pub const fn contains(self, sq: Square) -> bool {
        self.0 & sq.bit() != 0
    }

    /// Returns a copy with `sq` set.
    #[inline]
    pub const fn with(self, sq: Square) -> Self {
        Bitboard(self.0 | sq.bit())
    }

    /// Returns a copy with `sq` cleared.
    #[inline]
    pub const fn without(self, sq: Square) -> Self {
        Bitboard(self.0 & !sq.bit())
    }

    /// Sets `sq` in place.
    #[inline]
    pub fn set(&mut self, sq: Square) {
        self.0 |= sq.bit();
    }

    /// Clears `sq` in place.
    #[inline]
    pub fn clear(&mut self, sq: Square) {
        self.0 &= !sq.bit();
    }

    /// Lowest set square, if any.
    #[inline]
    pub const fn lsb(self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::from_index_masked(self.0.trailing_zeros()))
        }
    }

    /// Highest set square, if any.
    #[inline]
    pub const fn msb(self) -> Option<Square> {
        if self.0 == 0 {
            None
        } else {
            Some(Square::from_index_masked(63 - self.0.leading_zeros()))
        }
    }

    /// Removes and returns the lowest set square.
    #[inline]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let sq = self.lsb()?;
        self.0 &= self.0 - 1;
        Some(sq)
    }

    /// Moves every square `n` ranks toward rank 8; squares pushed past the
    /// edge disappear.
    #[inline]
    pub const fn shift_up(self, n: u32) -> Self {
        if n >= 8 {
            Bitboard::EMPTY
        } else {
            Bitboard(self.0 << (8 * n))
        }
    }

    /// Moves every square `n` ranks toward rank 1.
    #[inline]
    pub const fn shift_down(self, n: u32) -> Self {
        if n >= 8 {
            Bitboard::EMPTY
        } else {
            Bitboard(self.0 >> (8 * n))
        }
    }

    /// Moves every square `n` files toward the a-file. Squares on the first
    /// `n` files are dropped before shifting so nothing wraps to the
    /// previous rank.
    #[inline]
    pub const fn shift_left(self, n: u32) -> Self {
        if n >= 8 {
            Bitboard::EMPTY
        } else {
            Bitboard((self.0 & !LEFT_FILES[n as usize].0) >> n)
        }
    }

    /// Moves every square `n` files toward the h-file.
    #[inline]
    pub const fn shift_right(self, n: u32) -> Self {
        if n >= 8 {
            Bitboard::EMPTY
        } else {
            Bitboard((self.0 & !RIGHT_FILES[n as usize].0) << n)
        }
    }

    /// Union, usable in const context.
    #[inline]
    pub const fn or(self, other: Bitboard) -> Self {
        Bitboard(self.0 | other.0)
    }

    /// Intersection, usable in const context.
    #[inline]
    pub const fn and(self, other: Bitboard) -> Self {
        Bitboard(self.0 & other.0)
    }

    /// Squares in `self` but not in `other`.
    #[inline]
    pub const fn and_not(self, other: Bitboard) -> Self {
        Bitboard(self.0 & !other.0)
    }
}

impl BitAnd for Bitboard {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 & rhs.0)
    }
}

impl BitAndAssign for Bitboard {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl BitOr for Bitboard {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 | rhs.0)
    }
}

impl BitOrAssign for Bitboard {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitXor for Bitboard {
    type Output = Self;
    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Bitboard(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for Bitboard {
    #[inline]
    fn bitxor_assign(&mut self, rhs: Self) {
        self.0 ^= rhs.0;
    }
}

impl Not for Bitboard {
    type Output = Self;
    #[inline]
    fn not(self) -> Self::Output {
        Bitboard(!self.0)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bitboard({:#018x})", self.0)?;
        for rank in (0..8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8 {
                if (self.0 >> (rank * 8 + file)) & 1 == 1 {
                    write!(f, "X ")?;
                } else {
                    write!(f, ". ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

/// Iterator over set squares in a bitboard.
pub struct BitboardIter(Bitboard);

impl Iterator for BitboardIter {
    type Item = Square;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_lsb()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.0.count() as usize;
        (count, Some(count))
    }
}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        BitboardIter(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FILES, RANKS};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn single_square() {
        let bb = Bitboard::from_square(Square::A1);
        assert_eq!(bb.0, 1);
        assert!(bb.contains(Square::A1));
        assert!(!bb.contains(Square::B1));
        assert_eq!(bb.with(Square::H8).count(), 2);
        assert_eq!(bb.without(Square::A1), Bitboard::EMPTY);
    }

    #[test]
    fn horizontal_shifts_do_not_wrap() {
        let h4 = Bitboard::from_square(sq("h4"));
        assert_eq!(h4.shift_right(1), Bitboard::EMPTY);
        assert_eq!(h4.shift_left(7), Bitboard::from_square(sq("a4")));

        let a4 = Bitboard::from_square(sq("a4"));
        assert_eq!(a4.shift_left(1), Bitboard::EMPTY);
        assert_eq!(a4.shift_right(2), Bitboard::from_square(sq("c4")));

        assert_eq!(FILES[0].shift_right(8), Bitboard::EMPTY);
        assert_eq!(FILES[3].shift_left(3), FILES[0]);
    }

    #[test]
    fn vertical_shifts_drop_off_the_board() {
        assert_eq!(RANKS[7].shift_up(1), Bitboard::EMPTY);
        assert_eq!(RANKS[0].shift_up(7), RANKS[7]);
        assert_eq!(RANKS[5].shift_down(5), RANKS[0]);
        assert_eq!(Bitboard::FULL.shift_up(8), Bitboard::EMPTY);
        assert_eq!(Bitboard::FULL.shift_down(8), Bitboard::EMPTY);
        assert_eq!(Bitboard::FULL.shift_left(0), Bitboard::FULL);
    }

    #[test]
    fn iterates_in_square_order() {
        let squares: Vec<Square> = FILES[0].into_iter().collect();
        assert_eq!(squares.len(), 8);
        assert_eq!(squares[0], Square::A1);
        assert_eq!(squares[7], Square::A8);
    }

    #[test]
    fn pop_lsb_drains() {
        let mut bb = Bitboard::new(0b1010);
        assert_eq!(bb.pop_lsb().map(|s| s.index()), Some(1));
        assert_eq!(bb.pop_lsb().map(|s| s.index()), Some(3));
        assert_eq!(bb.pop_lsb(), None);
    }
}
