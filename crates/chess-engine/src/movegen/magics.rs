//! Magic bitboard tables for sliding piece attack generation.
//!
//! For every square, the squares that can block a slider (its *relevant
//! occupancy*, edges excluded) are hashed with a multiply-and-shift into a
//! dense per-square table of attack sets. A multiplier is usable only if no
//! two blocker subsets with different attack sets land on the same index.
//!
//! The multipliers below were found offline by [`find_magic`]; the
//! `magic-finder` tool regenerates them. At startup every embedded constant is
//! re-verified against all blocker subsets before the table is published.

use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

use chess_core::Square;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use crate::geometry::{ray, Direction, EDGES, FILES, RANKS};
use crate::Bitboard;

/// Candidate budget per square before a search gives up.
pub const MAX_MAGIC_ATTEMPTS: u64 = 100_000_000;

/// Seed for replacing an embedded multiplier that fails verification.
const FALLBACK_SEED: u64 = 0x5EED_0F_C4E55;

/// Candidates whose top byte gets fewer set bits than this from the mask
/// rarely hash well and are skipped without a full trial.
const MIN_HIGH_BITS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slider {
    Rook,
    Bishop,
}

impl Slider {
    pub const BOTH: [Slider; 2] = [Slider::Rook, Slider::Bishop];

    pub const fn directions(self) -> [Direction; 4] {
        match self {
            Slider::Rook => Direction::ORTHOGONAL,
            Slider::Bishop => Direction::DIAGONAL,
        }
    }

    pub const fn embedded_magics(self) -> &'static [u64; 64] {
        match self {
            Slider::Rook => &ROOK_MAGICS,
            Slider::Bishop => &BISHOP_MAGICS,
        }
    }
}

impl fmt::Display for Slider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slider::Rook => f.write_str("rook"),
            Slider::Bishop => f.write_str("bishop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableBuildError {
    #[error("no {slider} magic found for {square} after {attempts} attempts")]
    MagicNotFound {
        slider: Slider,
        square: Square,
        attempts: u64,
    },
}

/// Squares whose occupancy can change a slider's attacks from `sq`.
///
/// Each ray drops its final square: a piece on the board edge blocks
/// nothing further.
pub fn relevant_occupancy(slider: Slider, sq: Square) -> Bitboard {
    match slider {
        Slider::Rook => {
            ray(Direction::North, sq).and_not(RANKS[7])
                | ray(Direction::South, sq).and_not(RANKS[0])
                | ray(Direction::West, sq).and_not(FILES[0])
                | ray(Direction::East, sq).and_not(FILES[7])
        }
        Slider::Bishop => {
            let diagonals = Direction::DIAGONAL
                .iter()
                .fold(Bitboard::EMPTY, |acc, &dir| acc | ray(dir, sq));
            diagonals.and_not(EDGES)
        }
    }
}

/// Maps `index` to a subset of `mask`: bit `j` of `index` selects the
/// `j`-th lowest set square of `mask`. Indices `0..2^mask.count()` cover
/// every subset exactly once.
pub fn index_to_occupancy(index: usize, mask: Bitboard) -> Bitboard {
    mask.into_iter()
        .enumerate()
        .filter(|(j, _)| index & (1 << j) != 0)
        .fold(Bitboard::EMPTY, |acc, (_, sq)| acc.with(sq))
}

/// Attack set by walking rays; each ray stops at, and includes, its first
/// blocker.
pub fn slow_attacks(slider: Slider, sq: Square, blockers: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for dir in slider.directions() {
        let full = ray(dir, sq);
        let hits = full & blockers;
        let nearest = if dir.is_positive() { hits.lsb() } else { hits.msb() };
        attacks |= match nearest {
            Some(blocker) => full.and_not(ray(dir, blocker)),
            None => full,
        };
    }
    attacks
}

/// Every blocker subset of one square with its attack set.
struct OccupancySet {
    slider: Slider,
    square: Square,
    mask: Bitboard,
    occupancies: Vec<Bitboard>,
    attacks: Vec<Bitboard>,
}

impl OccupancySet {
    fn new(slider: Slider, square: Square) -> Self {
        let mask = relevant_occupancy(slider, square);
        let size = 1usize << mask.count();
        let occupancies: Vec<Bitboard> = (0..size).map(|i| index_to_occupancy(i, mask)).collect();
        let attacks = occupancies
            .iter()
            .map(|&occ| slow_attacks(slider, square, occ))
            .collect();
        OccupancySet {
            slider,
            square,
            mask,
            occupancies,
            attacks,
        }
    }

    fn bits(&self) -> u32 {
        self.mask.count()
    }

    fn passes_density_check(&self, magic: u64) -> bool {
        (self.mask.0.wrapping_mul(magic) & 0xFF00_0000_0000_0000).count_ones() >= MIN_HIGH_BITS
    }

    /// Builds the lookup table for `magic`, or `None` on a destructive
    /// collision. `scratch` is reused between calls.
    fn try_magic(&self, magic: u64, scratch: &mut Vec<Option<Bitboard>>) -> Option<MagicEntry> {
        let shift = 64 - self.bits();
        scratch.clear();
        scratch.resize(self.occupancies.len(), None);

        for (&occ, &attacks) in self.occupancies.iter().zip(&self.attacks) {
            let index = (occ.0.wrapping_mul(magic) >> shift) as usize;
            match scratch[index] {
                None => scratch[index] = Some(attacks),
                Some(existing) if existing == attacks => {}
                Some(_) => return None,
            }
        }

        Some(MagicEntry {
            mask: self.mask,
            magic,
            shift,
            attacks: scratch.iter().map(|a| a.unwrap_or_default()).collect(),
        })
    }
}

/// Lookup data for one slider on one square.
#[derive(Clone)]
pub struct MagicEntry {
    pub mask: Bitboard,
    pub magic: u64,
    pub shift: u32,
    attacks: Box<[Bitboard]>,
}

impl MagicEntry {
    #[inline]
    pub fn index(&self, occupied: Bitboard) -> usize {
        ((occupied & self.mask).0.wrapping_mul(self.magic) >> self.shift) as usize
    }

    #[inline]
    pub fn attacks(&self, occupied: Bitboard) -> Bitboard {
        self.attacks[self.index(occupied)]
    }

    pub fn table_len(&self) -> usize {
        self.attacks.len()
    }
}

impl fmt::Debug for MagicEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicEntry")
            .field("magic", &format_args!("{:#018x}", self.magic))
            .field("shift", &self.shift)
            .field("table_len", &self.attacks.len())
            .finish()
    }
}

/// Verifies `magic` for one square, returning its table if it is collision
/// free.
pub fn try_magic(slider: Slider, sq: Square, magic: u64) -> Option<MagicEntry> {
    OccupancySet::new(slider, sq).try_magic(magic, &mut Vec::new())
}

/// Searches for a collision-free multiplier with sparse random candidates.
pub fn find_magic<R: Rng>(
    slider: Slider,
    sq: Square,
    rng: &mut R,
    max_attempts: u64,
) -> Result<MagicEntry, TableBuildError> {
    let set = OccupancySet::new(slider, sq);
    search_set(&set, rng, max_attempts)
}

fn search_set<R: Rng>(
    set: &OccupancySet,
    rng: &mut R,
    max_attempts: u64,
) -> Result<MagicEntry, TableBuildError> {
    let mut scratch = Vec::with_capacity(set.occupancies.len());
    for attempt in 0..max_attempts {
        let magic = rng.gen::<u64>() & rng.gen::<u64>() & rng.gen::<u64>();
        if !set.passes_density_check(magic) {
            continue;
        }
        if let Some(entry) = set.try_magic(magic, &mut scratch) {
            debug!(
                slider = %set.slider,
                square = %set.square,
                attempts = attempt + 1,
                "found magic {:#018x}",
                magic
            );
            return Ok(entry);
        }
    }
    Err(TableBuildError::MagicNotFound {
        slider: set.slider,
        square: set.square,
        attempts: max_attempts,
    })
}

/// Rook and bishop lookup tables for all 64 squares.
#[derive(Debug, Clone)]
pub struct SliderTables {
    rook: Vec<MagicEntry>,
    bishop: Vec<MagicEntry>,
}

impl SliderTables {
    /// Builds tables from the embedded multipliers, verifying each one.
    /// A multiplier that collides is replaced by a seeded search.
    pub fn from_embedded() -> Result<Self, TableBuildError> {
        let start = Instant::now();
        let mut scratch = Vec::new();
        let mut build = |slider: Slider| -> Result<Vec<MagicEntry>, TableBuildError> {
            Square::all()
                .map(|sq| {
                    let set = OccupancySet::new(slider, sq);
                    let magic = slider.embedded_magics()[sq.index()];
                    match set.try_magic(magic, &mut scratch) {
                        Some(entry) => Ok(entry),
                        None => {
                            warn!(%slider, square = %sq, "embedded magic {:#018x} collides, searching", magic);
                            let mut rng = StdRng::seed_from_u64(FALLBACK_SEED ^ sq.index() as u64);
                            search_set(&set, &mut rng, MAX_MAGIC_ATTEMPTS)
                        }
                    }
                })
                .collect()
        };
        let rook = build(Slider::Rook)?;
        let bishop = build(Slider::Bishop)?;
        debug!(elapsed_ms = start.elapsed().as_millis() as u64, "slider tables built");
        Ok(SliderTables { rook, bishop })
    }

    #[inline]
    pub fn entry(&self, slider: Slider, sq: Square) -> &MagicEntry {
        match slider {
            Slider::Rook => &self.rook[sq.index()],
            Slider::Bishop => &self.bishop[sq.index()],
        }
    }
}

static SLIDER_TABLES: OnceLock<SliderTables> = OnceLock::new();

/// Builds the process-wide tables if needed. Call once at startup to turn
/// a build failure into an error instead of a panic on first lookup.
pub fn init_tables() -> Result<&'static SliderTables, TableBuildError> {
    if let Some(tables) = SLIDER_TABLES.get() {
        return Ok(tables);
    }
    let tables = SliderTables::from_embedded()?;
    Ok(SLIDER_TABLES.get_or_init(|| tables))
}

/// The process-wide tables.
///
/// # Panics
///
/// If the tables cannot be built. A partially built table is never used.
#[inline]
pub fn tables() -> &'static SliderTables {
    SLIDER_TABLES.get_or_init(|| match SliderTables::from_embedded() {
        Ok(tables) => tables,
        Err(err) => panic!("slider attack tables failed to build: {err}"),
    })
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().entry(Slider::Rook, sq).attacks(occupied)
}

#[inline]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    tables().entry(Slider::Bishop, sq).attacks(occupied)
}

#[inline]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    rook_attacks(sq, occupied) | bishop_attacks(sq, occupied)
}

pub const ROOK_MAGICS: [u64; 64] = [
    0x0a80_02c0_0010_8020, 0x06c0_0049_b000_2001, 0x0100_2000_1009_0040, 0x2480_0410_0080_0801,
    0x0280_0280_0400_0800, 0x0900_4100_0804_0022, 0x0280_0200_0100_1080, 0x2880_0020_4100_0080,
    0xa000_8000_8040_0034, 0x0004_8080_2000_4000, 0x2290_8020_0480_1000, 0x0411_000d_0010_0020,
    0x0402_8008_0004_0080, 0x000b_0004_0100_4208, 0x2409_0001_0004_0200, 0x0001_0021_0000_4082,
    0x0022_8780_01e2_4000, 0x1090_8100_2100_4010, 0x0801_0300_4020_0012, 0x0500_8080_0800_1000,
    0x0a08_0180_1400_0880, 0x8000_8080_0400_0200, 0x0201_0080_8001_0200, 0x0801_0200_0044_1091,
    0x0000_8000_8020_4005, 0x1040_2000_4010_0048, 0x0000_1202_0040_2082, 0x0d14_8804_8010_0080,
    0x0012_0402_8008_0080, 0x0100_0400_8002_0080, 0x9020_0100_8080_0200, 0x0813_2412_0014_8449,
    0x0491_6040_0180_0080, 0x0100_4010_0040_2001, 0x4820_0100_2100_1040, 0x0400_4022_0200_0812,
    0x0209_0090_0500_0802, 0x0810_8006_0180_0400, 0x4301_0832_1400_0150, 0x2040_2645_8e00_1401,
    0x0040_2040_0080_8000, 0x8001_0080_4001_0020, 0x8410_8208_2042_0010, 0x1003_0010_0009_0020,
    0x0804_0400_0800_8080, 0x0012_0008_1002_0004, 0x1000_1002_0004_0208, 0x4300_00a0_4402_0001,
    0x0280_0090_2341_0300, 0x00e0_1000_4000_2240, 0x0000_2001_0040_1700, 0x2244_1004_0800_8080,
    0x0008_0004_0080_1980, 0x0002_0008_1004_0200, 0x8010_1002_2881_0400, 0x2000_0090_4421_0200,
    0x4080_0080_4010_2101, 0x0040_0020_8041_1d01, 0x2005_5240_6000_0901, 0x0502_0010_0840_0422,
    0x489a_0008_1020_0402, 0x0001_0044_0008_0a13, 0x4000_0110_0802_0084, 0x0026_0021_1405_8042,
];

pub const BISHOP_MAGICS: [u64; 64] = [
    0x89a1_1218_9604_0240, 0x2004_8448_0200_2010, 0x2068_0800_5192_1000, 0x6288_0a02_2020_0808,
    0x0004_0420_0400_0000, 0x0100_8220_2020_0011, 0xc004_4422_2012_000a, 0x0028_8088_0121_6001,
    0x0400_4920_8840_8100, 0x0201_c401_040c_0084, 0x0084_0800_910a_0010, 0x0000_0820_8024_0060,
    0x2000_8405_0400_6000, 0x3001_0c41_0840_5004, 0x1008_0054_1008_0802, 0x8144_0422_0910_0900,
    0x0208_0810_2001_4400, 0x0048_0020_1208_ca00, 0x0f18_1404_0801_2008, 0x1004_0028_0210_2001,
    0x0841_0008_2008_0811, 0x0040_2002_00a4_2008, 0x0000_8000_5404_2000, 0x8801_0400_410c_9000,
    0x0520_0404_7010_4290, 0x1004_0400_5150_0081, 0x2002_0818_3308_0021, 0x0004_00c0_0c01_0142,
    0x9414_0820_0c00_2000, 0x0658_8100_0080_6011, 0x0188_0710_4044_0a00, 0x4800_4040_0201_1c00,
    0x0104_4420_4040_4200, 0x0511_0802_0022_2104, 0x0004_0224_0112_0400, 0x80c0_0404_0008_0120,
    0x8040_0100_4082_0802, 0x0480_8107_0002_0090, 0x0102_008e_0004_0242, 0x0809_0052_0205_0100,
    0x8002_0242_2010_4080, 0x0431_0088_0414_2000, 0x0019_0018_0208_1400, 0x0200_0142_0804_0080,
    0x3308_0820_0820_0100, 0x0410_1050_0040_c020, 0x4012_020c_0421_0308, 0x2082_20a2_0200_4080,
    0x0111_0401_2008_2000, 0x6803_0401_4128_0a00, 0x2101_0042_0241_0000, 0x8200_0000_4110_8022,
    0x0000_0210_8208_8000, 0x0002_4102_0401_0040, 0x0040_1004_0080_9000, 0x0822_0882_2082_0214,
    0x0040_8080_9001_2004, 0x0091_0224_0402_18c9, 0x0402_8144_2201_5008, 0x0090_0140_0484_2410,
    0x0001_0000_4230_4105, 0x0010_0088_3041_2a00, 0x2520_0810_9000_8908, 0x4010_2000_a0a6_0140,
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn relevant_occupancy_sizes() {
        assert_eq!(relevant_occupancy(Slider::Rook, Square::A1).count(), 12);
        assert_eq!(relevant_occupancy(Slider::Rook, sq("d4")).count(), 10);
        assert_eq!(relevant_occupancy(Slider::Rook, sq("b1")).count(), 11);
        assert_eq!(relevant_occupancy(Slider::Bishop, Square::A1).count(), 6);
        assert_eq!(relevant_occupancy(Slider::Bishop, sq("d4")).count(), 9);
        assert!(!relevant_occupancy(Slider::Rook, Square::A1).contains(Square::H1));
        assert!(!relevant_occupancy(Slider::Rook, Square::A1).contains(Square::A8));
    }

    #[test]
    fn subset_enumeration_is_a_bijection() {
        let mask = relevant_occupancy(Slider::Bishop, sq("c1"));
        let size = 1usize << mask.count();
        let mut seen: Vec<u64> = (0..size).map(|i| index_to_occupancy(i, mask).0).collect();
        assert!(seen.iter().all(|&occ| occ & !mask.0 == 0));
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), size);
        assert_eq!(index_to_occupancy(0, mask), Bitboard::EMPTY);
        assert_eq!(index_to_occupancy(size - 1, mask), mask);
    }

    #[test]
    fn slow_attacks_stop_at_blockers() {
        let blockers = Bitboard::EMPTY.with(sq("d6")).with(sq("b4"));
        let attacks = slow_attacks(Slider::Rook, sq("d4"), blockers);
        assert!(attacks.contains(sq("d6")));
        assert!(!attacks.contains(sq("d7")));
        assert!(attacks.contains(sq("b4")));
        assert!(!attacks.contains(sq("a4")));
        assert!(attacks.contains(sq("h4")));
        assert!(attacks.contains(sq("d1")));
        assert_eq!(attacks.count(), 2 + 2 + 4 + 3);
    }

    #[test]
    fn empty_board_lookups() {
        assert_eq!(bishop_attacks(sq("d4"), Bitboard::EMPTY).count(), 13);
        assert_eq!(rook_attacks(sq("d4"), Bitboard::EMPTY).count(), 14);
        assert_eq!(queen_attacks(sq("d4"), Bitboard::EMPTY).count(), 27);
        assert_eq!(bishop_attacks(Square::A1, Bitboard::EMPTY).count(), 7);
        assert_eq!(rook_attacks(Square::A1, Bitboard::EMPTY).count(), 14);
    }

    #[test]
    fn lookups_ignore_irrelevant_occupancy() {
        let edge_noise = Bitboard::EMPTY.with(Square::H8).with(Square::A8);
        assert_eq!(
            bishop_attacks(sq("d4"), edge_noise),
            bishop_attacks(sq("d4"), Bitboard::EMPTY)
        );
    }

    #[test]
    fn every_subset_of_every_square_matches_ray_walk() {
        let tables = init_tables().unwrap();
        for slider in Slider::BOTH {
            for square in Square::all() {
                let entry = tables.entry(slider, square);
                let mask = relevant_occupancy(slider, square);
                assert_eq!(entry.table_len(), 1 << mask.count());
                for i in 0..(1usize << mask.count()) {
                    let occ = index_to_occupancy(i, mask);
                    assert_eq!(
                        entry.attacks(occ),
                        slow_attacks(slider, square, occ),
                        "{slider} on {square} with {occ:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn colliding_magic_is_rejected() {
        assert!(try_magic(Slider::Rook, sq("d4"), 0).is_none());
        assert!(try_magic(Slider::Bishop, sq("d4"), 1).is_none());
    }

    #[test]
    fn search_finds_bishop_magics() {
        let mut rng = StdRng::seed_from_u64(7);
        for name in ["a1", "d4", "h5"] {
            let square = sq(name);
            let entry = find_magic(Slider::Bishop, square, &mut rng, MAX_MAGIC_ATTEMPTS).unwrap();
            assert!(try_magic(Slider::Bishop, square, entry.magic).is_some());
        }
    }

    #[test]
    fn search_gives_up_after_budget() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = find_magic(Slider::Rook, Square::A1, &mut rng, 0).unwrap_err();
        assert_eq!(
            err,
            TableBuildError::MagicNotFound {
                slider: Slider::Rook,
                square: Square::A1,
                attempts: 0
            }
        );
    }

    proptest! {
        #[test]
        fn random_occupancy_matches_ray_walk(index in 0u8..64, occupied in any::<u64>()) {
            let square = Square::from_index(index).unwrap();
            let occupied = Bitboard(occupied);
            prop_assert_eq!(rook_attacks(square, occupied), slow_attacks(Slider::Rook, square, occupied));
            prop_assert_eq!(bishop_attacks(square, occupied), slow_attacks(Slider::Bishop, square, occupied));
        }
    }
}
