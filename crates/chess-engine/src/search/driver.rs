//! Iterative deepening on a worker thread.
//!
//! The worker searches depth 0, 1, 2, ... and sends a [`DepthReport`] after
//! every completed depth. The caller's [`SearchHandle::wait`] plays the time
//! keeper: it collects reports until the budget runs out, then cancels the
//! worker. An interrupted depth is discarded, so the answer always comes
//! from the deepest depth that finished.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chess_core::{Color, Move};
use tracing::{debug, info};

use super::{CancelToken, Searcher};
use crate::config::{SearchConfig, Strategy};
use crate::movegen::{generate_legal, terminal_state, Terminal};
use crate::Position;

/// Time kept in reserve when the budget is derived from a clock.
const SAFETY_MARGIN: Duration = Duration::from_millis(50);
const DEFAULT_MOVES_TO_GO: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_depth: u32,
    /// Wall-clock budget. `None` searches until `max_depth` completes or the
    /// handle is stopped.
    pub time_budget: Option<Duration>,
}

impl SearchLimits {
    pub fn depth(max_depth: u32) -> Self {
        SearchLimits {
            max_depth,
            time_budget: None,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::depth(config.max_depth)
    }

    pub fn with_time_budget(self, budget: Duration) -> Self {
        SearchLimits {
            time_budget: Some(budget),
            ..self
        }
    }
}

/// Clock state as carried by a "go" command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeControl {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub moves_to_go: Option<u32>,
    pub move_time: Option<Duration>,
    pub depth: Option<u32>,
}

impl TimeControl {
    /// How long `color` should think. A fixed move time wins; otherwise the
    /// remaining clock is split over the moves left and half the increment
    /// is added, never exceeding the clock minus a safety margin.
    pub fn budget_for(&self, color: Color) -> Option<Duration> {
        if let Some(move_time) = self.move_time {
            return Some(move_time);
        }
        let (remaining, increment) = match color {
            Color::White => (self.wtime?, self.winc.unwrap_or_default()),
            Color::Black => (self.btime?, self.binc.unwrap_or_default()),
        };
        let moves_to_go = self.moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
        let budget = remaining / moves_to_go + increment / 2;
        Some(budget.min(remaining.saturating_sub(SAFETY_MARGIN)))
    }

    pub fn limits(&self, color: Color, config: &SearchConfig) -> SearchLimits {
        SearchLimits {
            max_depth: self.depth.unwrap_or(config.max_depth),
            time_budget: self.budget_for(color),
        }
    }
}

/// Progress after one completed depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthReport {
    pub depth: u32,
    /// Nodes searched since the search started.
    pub nodes: u64,
    pub elapsed: Duration,
    pub score: f64,
    pub best_move: Move,
}

impl DepthReport {
    /// Score in centipawns.
    pub fn score_cp(&self) -> i64 {
        (self.score * 100.0).round() as i64
    }

    pub fn nodes_per_second(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.nodes as f64 / secs) as u64
        } else {
            self.nodes
        }
    }
}

/// Outcome of a finished or stopped search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// `None` only when the side to move has no legal move.
    pub best_move: Option<Move>,
    pub score: f64,
    pub nodes: u64,
    /// Deepest completed depth, `None` when no depth finished.
    pub depth: Option<u32>,
    /// Set when the root position is already checkmate or stalemate.
    pub terminal: Option<Terminal>,
    pub reports: Vec<DepthReport>,
}

/// A search running on its own thread.
pub struct SearchHandle {
    position: Position,
    evaluation: f64,
    cancel: CancelToken,
    reports: Receiver<DepthReport>,
    worker: JoinHandle<u64>,
    started: Instant,
    time_budget: Option<Duration>,
}

/// Starts an iterative-deepening search of `position` on a new thread.
pub fn spawn_search(position: &Position, config: &SearchConfig, limits: SearchLimits) -> SearchHandle {
    let cancel = CancelToken::new();
    let (sender, reports) = mpsc::channel();
    let searcher = Searcher::new(config.clone(), cancel.clone());
    let evaluation = searcher.evaluate(position);
    let root = *position;
    let started = Instant::now();

    let worker = thread::spawn(move || run_worker(searcher, root, limits.max_depth, started, sender));

    SearchHandle {
        position: *position,
        evaluation,
        cancel,
        reports,
        worker,
        started,
        time_budget: limits.time_budget,
    }
}

fn run_worker(
    mut searcher: Searcher,
    position: Position,
    max_depth: u32,
    started: Instant,
    sender: mpsc::Sender<DepthReport>,
) -> u64 {
    if searcher.config().strategy == Strategy::Random {
        if let Some(best_move) = searcher.random_move(&position) {
            let score = searcher.evaluate(&position);
            // The receiver may already be gone; there is nothing left to do.
            let _ = sender.send(DepthReport {
                depth: 0,
                nodes: 0,
                elapsed: started.elapsed(),
                score,
                best_move,
            });
        }
        return 0;
    }

    for depth in 0..=max_depth {
        let node = match searcher.search_depth(&position, depth) {
            Ok(node) => node,
            Err(_) => {
                debug!(depth, "search cancelled");
                break;
            }
        };
        if node.best_move.is_null() {
            break;
        }
        let report = DepthReport {
            depth,
            nodes: searcher.nodes(),
            elapsed: started.elapsed(),
            score: node.score,
            best_move: node.best_move,
        };
        info!(
            depth,
            nodes = report.nodes,
            time_ms = report.elapsed.as_millis() as u64,
            nps = report.nodes_per_second(),
            score_cp = report.score_cp(),
            best_move = %report.best_move,
            "depth complete"
        );
        if sender.send(report).is_err() {
            break;
        }
    }
    searcher.nodes()
}

impl SearchHandle {
    /// Asks the worker to stop at its next node.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Blocks until the search finishes, is stopped, or uses up its time
    /// budget, then returns the best move of the deepest completed depth.
    pub fn wait(self) -> SearchReport {
        let deadline = self.time_budget.map(|budget| self.started + budget);
        let mut reports = Vec::new();

        loop {
            let received = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        Err(RecvTimeoutError::Timeout)
                    } else {
                        self.reports.recv_timeout(left)
                    }
                }
                None => self.reports.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(report) => reports.push(report),
                Err(RecvTimeoutError::Timeout) => {
                    debug!(elapsed_ms = self.started.elapsed().as_millis() as u64, "time budget spent");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.cancel.cancel();
        let nodes = match self.worker.join() {
            Ok(nodes) => nodes,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        reports.extend(self.reports.try_iter());

        let terminal = terminal_state(&self.position);
        let last = reports.last().copied();
        let best_move = match last {
            Some(report) => Some(report.best_move),
            None if terminal.is_none() => generate_legal(&self.position).as_slice().first().copied(),
            None => None,
        };

        SearchReport {
            best_move,
            score: last.map_or(self.evaluation, |report| report.score),
            nodes,
            depth: last.map(|report| report.depth),
            terminal,
            reports,
        }
    }
}

/// Runs a search to completion on a worker thread and waits for it.
pub fn search(position: &Position, config: &SearchConfig, limits: SearchLimits) -> SearchReport {
    spawn_search(position, config, limits).wait()
}
