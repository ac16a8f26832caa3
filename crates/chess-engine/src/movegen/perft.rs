//! Perft: exhaustive leaf counts used to validate move generation against
//! published reference numbers.

use chess_core::Move;

use super::{generate_legal, push_move};
use crate::Position;

/// Number of leaf positions `depth` plies below `position`.
pub fn perft(position: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal(position);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .as_slice()
        .iter()
        .map(|&m| perft(&push_move(position, m), depth - 1))
        .sum()
}

/// Leaf counts split by root move, sorted by LAN. The counts add up to
/// `perft(position, depth)`.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(Move, u64)> {
    let mut results: Vec<(Move, u64)> = generate_legal(position)
        .as_slice()
        .iter()
        .map(|&m| (m, perft(&push_move(position, m), depth.saturating_sub(1))))
        .collect();
    results.sort_by_key(|(m, _)| m.to_lan());
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -";
    const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    fn check(fen: &str, expected: &[u64]) {
        let position = Position::from_fen(fen).unwrap();
        for (depth, &nodes) in (1..).zip(expected) {
            assert_eq!(perft(&position, depth), nodes, "{fen} at depth {depth}");
        }
    }

    #[test]
    fn startpos() {
        check(chess_core::FenParts::STARTPOS, &[20, 400, 8_902]);
    }

    #[test]
    fn startpos_depth_4() {
        assert_eq!(perft(&Position::startpos(), 4), 197_281);
    }

    #[test]
    #[ignore = "slow in debug builds"]
    fn startpos_depth_5() {
        assert_eq!(perft(&Position::startpos(), 5), 4_865_609);
    }

    #[test]
    fn kiwipete() {
        check(KIWIPETE, &[48, 2_039, 97_862]);
    }

    #[test]
    fn position_3() {
        check(POSITION_3, &[14, 191, 2_812]);
    }

    #[test]
    fn position_4() {
        check(POSITION_4, &[6, 264, 9_467]);
    }

    #[test]
    fn position_5() {
        check(POSITION_5, &[44, 1_486, 62_379]);
    }

    #[test]
    fn divide_sums_to_perft() {
        let position = Position::from_fen(KIWIPETE).unwrap();
        let split = perft_divide(&position, 2);
        assert_eq!(split.len(), 48);
        assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
        let lans: Vec<String> = split.iter().map(|(m, _)| m.to_lan()).collect();
        let mut sorted = lans.clone();
        sorted.sort();
        assert_eq!(lans, sorted);
    }
}
