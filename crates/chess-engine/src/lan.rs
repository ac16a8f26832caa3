//! Resolving long algebraic notation against a position.

use chess_core::{LanMove, Move, NotationError};
use thiserror::Error;

use crate::movegen::{generate_pseudo_legal, push_move};
use crate::Position;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanError {
    #[error(transparent)]
    Syntax(#[from] NotationError),
    #[error("no move {0} in this position")]
    NoSuchMove(String),
}

/// Turns `lan` into a fully annotated move for `position`.
///
/// The move must be pseudo-legal: it is matched against the pseudo-legal
/// list, so a move that leaves the king in check is accepted here and
/// rejected by the legality filter. `0000` yields the null move.
pub fn parse_lan(position: &Position, lan: &str) -> Result<Move, LanError> {
    if lan == "0000" {
        return Ok(Move::NULL);
    }
    let parsed = LanMove::parse(lan)?;
    generate_pseudo_legal(position)
        .as_slice()
        .iter()
        .copied()
        .find(|m| m.lan_move() == parsed)
        .ok_or_else(|| LanError::NoSuchMove(lan.to_string()))
}

/// Applies a sequence of LAN moves, as in `position startpos moves e2e4 e7e5`.
pub fn apply_lan_moves<'a, I>(position: &Position, moves: I) -> Result<Position, LanError>
where
    I: IntoIterator<Item = &'a str>,
{
    moves.into_iter().try_fold(*position, |current, lan| {
        let m = parse_lan(&current, lan)?;
        Ok(push_move(&current, m))
    })
}
