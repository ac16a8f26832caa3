//! Static evaluation.
//!
//! Scores are in pawns and absolute: positive favours white, negative
//! favours black, whoever is to move.

use chess_core::{Color, Move, Piece, PieceKind};
use serde::{Deserialize, Serialize};

use crate::movegen::{generate_legal, generate_pseudo_legal, push_move};
use crate::Position;

/// Weight of each piece type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceValues {
    pub pawn: f64,
    pub knight: f64,
    pub bishop: f64,
    pub rook: f64,
    pub queen: f64,
    pub king: f64,
}

impl PieceValues {
    pub const STANDARD: PieceValues = PieceValues {
        pawn: 1.0,
        knight: 3.0,
        bishop: 3.0,
        rook: 5.0,
        queen: 9.0,
        king: 200.0,
    };

    pub const fn value(&self, piece: Piece) -> f64 {
        match piece {
            Piece::Pawn => self.pawn,
            Piece::Knight => self.knight,
            Piece::Bishop => self.bishop,
            Piece::Rook => self.rook,
            Piece::Queen => self.queen,
            Piece::King => self.king,
        }
    }

    /// Value of `kind`, negated for black pieces.
    pub fn signed(&self, kind: PieceKind) -> f64 {
        match kind.color() {
            Color::White => self.value(kind.piece()),
            Color::Black => -self.value(kind.piece()),
        }
    }
}

impl Default for PieceValues {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Which evaluation function to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Evaluator {
    /// Weighted piece count.
    #[default]
    Material,
    /// Material plus the difference in pseudo-legal move counts.
    MaterialInfluence,
    /// Material plus the difference in legal move counts.
    MaterialMobility,
}

/// Tunable inputs to evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalParams {
    pub piece_values: PieceValues,
    /// Pawns per move of mobility advantage.
    pub mobility_factor: f64,
    /// Multiplier on the side to move's own move count. Slightly above 1.0
    /// it breaks otherwise symmetric ties in favour of the side to move.
    pub initiative: f64,
}

impl Default for EvalParams {
    fn default() -> Self {
        EvalParams {
            piece_values: PieceValues::STANDARD,
            mobility_factor: 0.1,
            initiative: 1.05,
        }
    }
}

pub fn evaluate(position: &Position, evaluator: Evaluator, params: &EvalParams) -> f64 {
    let material = material(position, &params.piece_values);
    match evaluator {
        Evaluator::Material => material,
        Evaluator::MaterialInfluence => {
            material + activity(position, params, |p| generate_pseudo_legal(p).len())
        }
        Evaluator::MaterialMobility => {
            material + activity(position, params, |p| generate_legal(p).len())
        }
    }
}

pub fn material(position: &Position, values: &PieceValues) -> f64 {
    if *values == PieceValues::STANDARD {
        return position.material();
    }
    PieceKind::ALL
        .iter()
        .map(|&kind| values.signed(kind) * position.pieces(kind).count() as f64)
        .sum()
}

/// Move-count advantage. The waiting side's moves are counted by handing it
/// the turn with a null move.
fn activity(position: &Position, params: &EvalParams, count: impl Fn(&Position) -> usize) -> f64 {
    let own = count(position) as f64 * params.initiative;
    let theirs = count(&push_move(position, Move::NULL)) as f64;
    let edge = match position.side_to_move() {
        Color::White => own - theirs,
        Color::Black => theirs - own,
    };
    params.mobility_factor * edge
}
