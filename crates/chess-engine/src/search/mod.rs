//! Depth-limited minimax search.
//!
//! Scores are absolute (positive favours white). White nodes raise `alpha`,
//! black nodes lower `beta`, so the window keeps its meaning at every depth
//! and no score is ever negated.

mod driver;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chess_core::{Color, Move};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::config::{Pruning, SearchConfig};
use crate::eval::{evaluate, EvalParams};
use crate::movegen::{generate_legal, push_move, MoveList};
use crate::Position;

pub use driver::{
    search, spawn_search, DepthReport, SearchHandle, SearchLimits, SearchReport, TimeControl,
};

/// Score of delivering mate at the root. A mate `n` plies away scores
/// `MATE_SCORE - n`, so shorter mates are preferred.
pub const MATE_SCORE: f64 = 1.0e6;

/// Returned through `?` when a [`CancelToken`] fires mid-search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search cancelled")]
pub struct SearchCancelled;

/// Shared stop flag, polled once per search node.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn check(&self) -> Result<(), SearchCancelled> {
        if self.is_cancelled() {
            Err(SearchCancelled)
        } else {
            Ok(())
        }
    }
}

/// Result of searching one node. `best_move` is null for leaves and for
/// positions without legal moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub best_move: Move,
    pub score: f64,
}

impl Node {
    const fn leaf(score: f64) -> Self {
        Node {
            best_move: Move::NULL,
            score,
        }
    }
}

/// Score for the side to move being checkmated `height` plies below the root.
fn mated(side: Color, height: u32) -> f64 {
    let score = MATE_SCORE - f64::from(height);
    match side {
        Color::White => -score,
        Color::Black => score,
    }
}

fn better_for(side: Color, a: f64, b: f64) -> bool {
    match side {
        Color::White => a > b,
        Color::Black => a < b,
    }
}

/// Runs searches for one configuration and counts the work done.
pub struct Searcher {
    config: SearchConfig,
    params: EvalParams,
    cancel: CancelToken,
    nodes: u64,
    leaves: u64,
}

impl Searcher {
    pub fn new(config: SearchConfig, cancel: CancelToken) -> Self {
        let params = config.eval_params();
        Searcher {
            config,
            params,
            cancel,
            nodes: 0,
            leaves: 0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Nodes entered since construction, across every call.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Nodes scored without expansion: horizon leaves and game ends.
    pub fn leaves(&self) -> u64 {
        self.leaves
    }

    pub fn evaluate(&self, position: &Position) -> f64 {
        evaluate(position, self.config.evaluator, &self.params)
    }

    /// A uniformly random legal move, seeded from the configuration when a
    /// seed is set.
    pub fn random_move(&self, position: &Position) -> Option<Move> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        generate_legal(position).as_slice().choose(&mut rng).copied()
    }

    /// Searches `position` with a nominal horizon of `depth` plies below the
    /// root's children. Depth 0 scores every root move statically, or by
    /// quiescence when that strategy is selected.
    pub fn search_depth(&mut self, position: &Position, depth: u32) -> Result<Node, SearchCancelled> {
        let nodes_before = self.nodes;
        let leaves_before = self.leaves;
        let root_static = self.evaluate(position);
        let node = self.search_node(
            position,
            depth as i32 + 1,
            f64::NEG_INFINITY,
            f64::INFINITY,
            root_static,
            0,
            true,
        )?;
        debug!(
            depth,
            nodes = self.nodes - nodes_before,
            leaves = self.leaves - leaves_before,
            score = node.score,
            "search finished"
        );
        Ok(node)
    }

    #[allow(clippy::too_many_arguments)]
    fn search_node(
        &mut self,
        position: &Position,
        ply: i32,
        mut alpha: f64,
        mut beta: f64,
        parent_static: f64,
        height: u32,
        allow_null: bool,
    ) -> Result<Node, SearchCancelled> {
        self.cancel.check()?;
        self.nodes += 1;

        let us = position.side_to_move();
        let mut moves = generate_legal(position);
        if moves.is_empty() {
            self.leaves += 1;
            let score = if position.is_in_check(us) {
                mated(us, height)
            } else {
                0.0
            };
            return Ok(Node::leaf(score));
        }

        let static_score = self.evaluate(position);
        let root = height == 0;
        if !root {
            let quiet = !self.config.uses_quiescence()
                || (static_score - parent_static).abs() < self.config.quiescence_cutoff;
            if ply <= -(self.config.quiescence_max_depth as i32) || (ply <= 0 && quiet) {
                self.leaves += 1;
                return Ok(Node::leaf(static_score));
            }
        }

        let pruning = self.config.pruning;
        let (window_alpha, window_beta) = (alpha, beta);
        let mut best: Option<Node> = None;

        if pruning.contains(Pruning::NULL_MOVE)
            && allow_null
            && !root
            && ply > 0
            && !position.is_in_check(us)
        {
            let reduced = ply - 1 - self.config.null_move_reduction as i32;
            let passed = push_move(position, Move::NULL);
            let reply =
                self.search_node(&passed, reduced, alpha, beta, static_score, height + 1, false)?;
            best = Some(Node::leaf(reply.score));
            match us {
                Color::White => alpha = alpha.max(reply.score),
                Color::Black => beta = beta.min(reply.score),
            }
        }

        if pruning.contains(Pruning::FORWARD) {
            self.forward_prune(position, &mut moves);
        }

        for &m in moves.as_slice() {
            let child = push_move(position, m);
            let reply = self.search_node(&child, ply - 1, alpha, beta, static_score, height + 1, true)?;

            if best.map_or(true, |b| better_for(us, reply.score, b.score)) {
                best = Some(Node {
                    best_move: m,
                    score: reply.score,
                });
            }
            match us {
                Color::White => alpha = alpha.max(reply.score),
                Color::Black => beta = beta.min(reply.score),
            }
            if pruning.contains(Pruning::ALPHA_BETA) && beta <= alpha {
                break;
            }
        }

        match best {
            Some(node) if !node.best_move.is_null() => Ok(node),
            // The null move's bound was never beaten by a real move. That
            // score is unproven, so search the node again without it.
            _ => self.search_node(
                position,
                ply,
                window_alpha,
                window_beta,
                parent_static,
                height,
                false,
            ),
        }
    }

    /// Keeps the `forward_prune_n` moves with the best static score after
    /// the move, ordered best first for the side to move.
    fn forward_prune(&self, position: &Position, moves: &mut MoveList) {
        let us = position.side_to_move();
        let keep = self.config.forward_prune_n.max(1).min(moves.len());
        let mut scores = [0.0f64; MoveList::MAX_MOVES];
        for (score, &m) in scores.iter_mut().zip(moves.as_slice()) {
            *score = self.evaluate(&push_move(position, m));
        }

        let list = moves.as_mut_slice();
        for i in 0..keep {
            let mut pick = i;
            for j in i + 1..list.len() {
                if better_for(us, scores[j], scores[pick]) {
                    pick = j;
                }
            }
            list.swap(i, pick);
            scores.swap(i, pick);
        }
        moves.truncate(keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use crate::eval::Evaluator;

    fn config(strategy: Strategy, pruning: Pruning) -> SearchConfig {
        SearchConfig {
            strategy,
            pruning,
            evaluator: Evaluator::Material,
            ..SearchConfig::default()
        }
    }

    fn best(fen: &str, config: SearchConfig, depth: u32) -> Node {
        let position = Position::from_fen(fen).unwrap();
        Searcher::new(config, CancelToken::new())
            .search_depth(&position, depth)
            .unwrap()
    }

    const WHITE_MATES_IN_ONE: &str = "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1";
    const BLACK_MATES_IN_ONE: &str = "r5k1/8/8/8/8/8/5PPP/6K1 b - - 0 1";

    #[test]
    fn finds_mate_in_one_for_either_side() {
        for pruning in [Pruning::NONE, Pruning::default(), Pruning::ALPHA_BETA | Pruning::FORWARD] {
            let node = best(WHITE_MATES_IN_ONE, config(Strategy::Minimax, pruning), 0);
            assert_eq!(node.best_move.to_lan(), "a1a8");
            assert_eq!(node.score, MATE_SCORE - 1.0);

            let node = best(BLACK_MATES_IN_ONE, config(Strategy::Minimax, pruning), 0);
            assert_eq!(node.best_move.to_lan(), "a8a1");
            assert_eq!(node.score, -(MATE_SCORE - 1.0));
        }
    }

    #[test]
    fn prefers_the_shorter_mate() {
        let node = best(WHITE_MATES_IN_ONE, config(Strategy::Minimax, Pruning::ALPHA_BETA), 2);
        assert_eq!(node.best_move.to_lan(), "a1a8");
        assert_eq!(node.score, MATE_SCORE - 1.0);
    }

    #[test]
    fn captures_a_free_piece() {
        let fen = "4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1";
        let node = best(fen, config(Strategy::Minimax, Pruning::ALPHA_BETA), 0);
        assert_eq!(node.best_move.to_lan(), "d1d5");
        assert_eq!(node.score, 5.0);
    }

    // The rook on d5 is defended by the pawn on e6.
    const DEFENDED_ROOK: &str = "4k3/8/4p3/3r4/8/8/8/3QK3 w - - 0 1";

    #[test]
    fn avoids_a_defended_piece_at_depth_one() {
        let node = best(DEFENDED_ROOK, config(Strategy::Minimax, Pruning::ALPHA_BETA), 1);
        assert_ne!(node.best_move.to_lan(), "d1d5");
        assert_eq!(node.score, 3.0);
    }

    #[test]
    fn quiescence_sees_the_recapture() {
        // At depth 0 plain minimax grabs the rook; quiescence extends the
        // capture and sees the pawn take back.
        let plain = best(DEFENDED_ROOK, config(Strategy::Minimax, Pruning::ALPHA_BETA), 0);
        assert_eq!(plain.best_move.to_lan(), "d1d5");
        assert_eq!(plain.score, 8.0);

        let quiescent = best(DEFENDED_ROOK, config(Strategy::MinimaxQuiescence, Pruning::ALPHA_BETA), 0);
        assert_ne!(quiescent.best_move.to_lan(), "d1d5");
        assert_eq!(quiescent.score, 3.0);
    }

    #[test]
    fn pruning_does_not_change_the_minimax_value() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let full = best(fen, config(Strategy::Minimax, Pruning::NONE), 1);
        let pruned = best(fen, config(Strategy::Minimax, Pruning::ALPHA_BETA), 1);
        assert_eq!(full.score, pruned.score);
    }

    #[test]
    fn alpha_beta_visits_fewer_nodes() {
        let position = Position::startpos();
        let mut full = Searcher::new(config(Strategy::Minimax, Pruning::NONE), CancelToken::new());
        let mut pruned = Searcher::new(config(Strategy::Minimax, Pruning::ALPHA_BETA), CancelToken::new());
        full.search_depth(&position, 1).unwrap();
        pruned.search_depth(&position, 1).unwrap();
        assert!(pruned.nodes() < full.nodes());
        assert!(pruned.leaves() <= pruned.nodes());
    }

    #[test]
    fn null_move_never_surfaces_as_best() {
        let cfg = config(Strategy::MinimaxQuiescence, Pruning::ALPHA_BETA | Pruning::NULL_MOVE);
        for fen in [
            chess_core::FenParts::STARTPOS,
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "8/8/8/4k3/8/8/4PK2/8 b - - 0 1",
        ] {
            for depth in 0..2 {
                let node = best(fen, cfg.clone(), depth);
                assert!(!node.best_move.is_null(), "{fen} at depth {depth}");
            }
        }
    }

    #[test]
    fn forward_pruning_keeps_the_best_static_moves() {
        let position = Position::from_fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1").unwrap();
        let mut cfg = config(Strategy::Minimax, Pruning::FORWARD);
        cfg.forward_prune_n = 3;
        let searcher = Searcher::new(cfg, CancelToken::new());
        let mut moves = generate_legal(&position);
        searcher.forward_prune(&position, &mut moves);
        assert_eq!(moves.len(), 3);
        assert_eq!(moves[0].to_lan(), "d1d5");
    }

    #[test]
    fn stalemate_scores_zero() {
        // Black to move has no legal move and is not in check.
        let node = best("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", config(Strategy::Minimax, Pruning::NONE), 1);
        assert!(node.best_move.is_null());
        assert_eq!(node.score, 0.0);
    }

    #[test]
    fn cancelled_token_aborts() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut searcher = Searcher::new(SearchConfig::default(), cancel);
        assert_eq!(
            searcher.search_depth(&Position::startpos(), 3),
            Err(SearchCancelled)
        );
    }

    #[test]
    fn seeded_random_move_is_repeatable_and_legal() {
        let cfg = SearchConfig {
            strategy: Strategy::Random,
            seed: Some(7),
            ..SearchConfig::default()
        };
        let position = Position::startpos();
        let a = Searcher::new(cfg.clone(), CancelToken::new()).random_move(&position);
        let b = Searcher::new(cfg, CancelToken::new()).random_move(&position);
        assert_eq!(a, b);
        assert!(generate_legal(&position).contains(a.unwrap()));
    }
}
