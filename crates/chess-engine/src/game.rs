//! Game management with history tracking.
//!
//! [`Game`] wraps a [`Position`] with what a single position cannot know:
//! - the zobrist hash of every position reached, for repetition
//! - the moves played so far
//!
//! [`Game::status`] combines the terminal state of the position with the
//! fifty-move and threefold repetition draws.

use chess_core::{FenError, Move};
use thiserror::Error;

use crate::lan::{parse_lan, LanError};
use crate::movegen::{generate_legal, push_move, terminal_state, MoveList, Terminal};
use crate::Position;

/// Error type for game operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The move is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(String),
    /// The move text could not be resolved in the current position.
    #[error(transparent)]
    Notation(#[from] LanError),
}

/// State of the game after the last move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// No result yet.
    Ongoing,
    /// The side to move is mated.
    Checkmate,
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// A hundred half-moves without a capture or pawn move.
    FiftyMoveRule,
    /// The current position has occurred three times.
    ThreefoldRepetition,
}

impl GameStatus {
    /// True for every status except [`GameStatus::Ongoing`].
    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }
}

/// A game in progress.
#[derive(Debug, Clone)]
pub struct Game {
    position: Position,
    /// Zobrist hash of every position so far, the current one last.
    history: Vec<u64>,
    /// Moves played, in order.
    moves: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A game from the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    /// A game starting from `position`, with no history before it.
    pub fn from_position(position: Position) -> Self {
        Game {
            history: vec![position.zobrist_hash()],
            position,
            moves: Vec::new(),
        }
    }

    /// A game starting from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Position::from_fen(fen).map(Self::from_position)
    }

    /// The current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Moves played since the game started.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        generate_legal(&self.position)
    }

    /// Plays `m`, which must be one of [`Self::legal_moves`].
    pub fn push(&mut self, m: Move) -> Result<(), GameError> {
        if !self.legal_moves().contains(m) {
            return Err(GameError::IllegalMove(m.to_lan()));
        }
        self.position = push_move(&self.position, m);
        self.history.push(self.position.zobrist_hash());
        self.moves.push(m);
        Ok(())
    }

    /// Plays a move given in long algebraic notation and returns it.
    pub fn push_lan(&mut self, lan: &str) -> Result<Move, GameError> {
        let m = parse_lan(&self.position, lan)?;
        self.push(m)?;
        Ok(m)
    }

    /// How many times the current position has occurred, counting now.
    pub fn repetition_count(&self) -> usize {
        let current = self.position.zobrist_hash();
        self.history.iter().filter(|&&h| h == current).count()
    }

    /// True once the current position has occurred three times.
    pub fn is_threefold_repetition(&self) -> bool {
        self.repetition_count() >= 3
    }

    /// True once a hundred half-moves passed without a capture or pawn move.
    pub fn is_fifty_move_rule(&self) -> bool {
        self.position.is_fifty_move_rule()
    }

    /// Checkmate and stalemate take precedence over the draw rules.
    pub fn status(&self) -> GameStatus {
        match terminal_state(&self.position) {
            Some(Terminal::Checkmate) => GameStatus::Checkmate,
            Some(Terminal::Stalemate) => GameStatus::Stalemate,
            None if self.is_fifty_move_rule() => GameStatus::FiftyMoveRule,
            None if self.is_threefold_repetition() => GameStatus::ThreefoldRepetition,
            None => GameStatus::Ongoing,
        }
    }
}
