//! Fixed board geometry: file and rank masks, edge sets, and sliding rays.
//!
//! Everything here is computed at compile time.

use chess_core::Square;

use crate::Bitboard;

const FILE_A: u64 = 0x0101_0101_0101_0101;
const RANK_1: u64 = 0x0000_0000_0000_00FF;

const fn build_files() -> [Bitboard; 8] {
    let mut files = [Bitboard::EMPTY; 8];
    let mut i = 0;
    while i < 8 {
        files[i] = Bitboard(FILE_A << i);
        i += 1;
    }
    files
}

const fn build_ranks() -> [Bitboard; 8] {
    let mut ranks = [Bitboard::EMPTY; 8];
    let mut i = 0;
    while i < 8 {
        ranks[i] = Bitboard(RANK_1 << (8 * i));
        i += 1;
    }
    ranks
}

/// `from_low`: accumulate `lines[0..n]`; otherwise `lines[8-n..8]`.
const fn build_bands(lines: [Bitboard; 8], from_low: bool) -> [Bitboard; 9] {
    let mut bands = [Bitboard::EMPTY; 9];
    let mut n = 1;
    while n <= 8 {
        let line = if from_low { lines[n - 1] } else { lines[8 - n] };
        bands[n] = Bitboard(bands[n - 1].0 | line.0);
        n += 1;
    }
    bands
}

/// `FILES[0]` is the a-file.
pub const FILES: [Bitboard; 8] = build_files();
/// `RANKS[0]` is the first rank.
pub const RANKS: [Bitboard; 8] = build_ranks();
/// `LEFT_FILES[n]` is the union of the `n` leftmost files (a, b, ...).
pub const LEFT_FILES: [Bitboard; 9] = build_bands(FILES, true);
/// `RIGHT_FILES[n]` is the union of the `n` rightmost files (h, g, ...).
pub const RIGHT_FILES: [Bitboard; 9] = build_bands(FILES, false);
/// `BOTTOM_RANKS[n]` is the union of the `n` lowest ranks.
pub const BOTTOM_RANKS: [Bitboard; 9] = build_bands(RANKS, true);
/// `TOP_RANKS[n]` is the union of the `n` highest ranks.
pub const TOP_RANKS: [Bitboard; 9] = build_bands(RANKS, false);

pub const EDGES: Bitboard = Bitboard(FILES[0].0 | FILES[7].0 | RANKS[0].0 | RANKS[7].0);
pub const LIGHT_SQUARES: Bitboard = Bitboard(0x55AA_55AA_55AA_55AA);
pub const DARK_SQUARES: Bitboard = Bitboard(!LIGHT_SQUARES.0);

/// The eight compass directions, counter-clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North = 0,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    East,
    NorthEast,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
        Direction::East,
        Direction::NorthEast,
    ];
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::North,
        Direction::West,
        Direction::South,
        Direction::East,
    ];
    pub const DIAGONAL: [Direction; 4] = [
        Direction::NorthWest,
        Direction::SouthWest,
        Direction::SouthEast,
        Direction::NorthEast,
    ];

    /// Moves every square of `bb` one step this way.
    #[inline]
    pub const fn step(self, bb: Bitboard) -> Bitboard {
        match self {
            Direction::North => bb.shift_up(1),
            Direction::NorthWest => bb.shift_up(1).shift_left(1),
            Direction::West => bb.shift_left(1),
            Direction::SouthWest => bb.shift_down(1).shift_left(1),
            Direction::South => bb.shift_down(1),
            Direction::SouthEast => bb.shift_down(1).shift_right(1),
            Direction::East => bb.shift_right(1),
            Direction::NorthEast => bb.shift_up(1).shift_right(1),
        }
    }

    /// True when this direction increases the square index.
    #[inline]
    pub const fn is_positive(self) -> bool {
        matches!(
            self,
            Direction::North | Direction::NorthWest | Direction::East | Direction::NorthEast
        )
    }
}

const fn build_rays() -> [[Bitboard; 64]; 8] {
    let mut rays = [[Bitboard::EMPTY; 64]; 8];
    let mut d = 0;
    while d < 8 {
        let dir = Direction::ALL[d];
        let mut sq = 0;
        while sq < 64 {
            let mut walker = dir.step(Bitboard(1u64 << sq));
            let mut ray = 0u64;
            while walker.0 != 0 {
                ray |= walker.0;
                walker = dir.step(walker);
            }
            rays[d][sq] = Bitboard(ray);
            sq += 1;
        }
        d += 1;
    }
    rays
}

/// `RAYS[dir][sq]`: squares reachable from `sq` walking in `dir` on an
/// empty board, excluding `sq` itself.
pub const RAYS: [[Bitboard; 64]; 8] = build_rays();

#[inline]
pub const fn ray(dir: Direction, sq: Square) -> Bitboard {
    RAYS[dir as usize][sq.index()]
}
