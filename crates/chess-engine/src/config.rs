//! Engine configuration.
//!
//! Configuration is an immutable value passed into search and evaluation.
//! It is usually loaded from TOML; every field has a default, so an empty
//! document is a valid configuration.

use std::fmt;
use std::ops::BitOr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::{EvalParams, Evaluator, PieceValues};

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// A value parsed but is outside its usable range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Move selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Uniformly random legal move.
    Random,
    /// Depth-limited minimax, leaves scored statically at the horizon.
    Minimax,
    /// Minimax that keeps searching past the horizon while the static score
    /// is still swinging.
    #[default]
    MinimaxQuiescence,
}

/// Set of pruning techniques, stored as bit flags.
///
/// In TOML this is the raw integer, e.g. `pruning = 3` for alpha-beta plus
/// null-move.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pruning(u8);

impl Pruning {
    pub const NONE: Pruning = Pruning(0);
    pub const ALPHA_BETA: Pruning = Pruning(1);
    pub const NULL_MOVE: Pruning = Pruning(2);
    pub const FORWARD: Pruning = Pruning(4);
    /// Reserved. Accepted in configuration and otherwise ignored.
    pub const TRANSPOSITION: Pruning = Pruning(8);

    pub const fn from_bits(bits: u8) -> Self {
        Pruning(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Pruning) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: Pruning) -> Self {
        Pruning(self.0 & !other.0)
    }
}

impl Default for Pruning {
    fn default() -> Self {
        Pruning::ALPHA_BETA | Pruning::NULL_MOVE
    }
}

impl BitOr for Pruning {
    type Output = Pruning;

    fn bitor(self, rhs: Pruning) -> Pruning {
        Pruning(self.0 | rhs.0)
    }
}

impl fmt::Debug for Pruning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Pruning::ALPHA_BETA, "ALPHA_BETA"),
            (Pruning::NULL_MOVE, "NULL_MOVE"),
            (Pruning::FORWARD, "FORWARD"),
            (Pruning::TRANSPOSITION, "TRANSPOSITION"),
        ];
        let set: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "Pruning(NONE)")
        } else {
            write!(f, "Pruning({})", set.join(" | "))
        }
    }
}

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub strategy: Strategy,
    #[serde(default)]
    pub pruning: Pruning,
    #[serde(default)]
    pub evaluator: Evaluator,
    /// Deepest iterative-deepening iteration. Depth 0 looks one ply ahead.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Number of moves kept per node when forward pruning is on.
    #[serde(default = "default_forward_prune_n")]
    pub forward_prune_n: usize,
    #[serde(default = "default_mobility_factor")]
    pub mobility_factor: f64,
    #[serde(default = "default_initiative")]
    pub initiative: f64,
    /// A position is quiet when its static score moved less than this
    /// (in pawns) from its parent's.
    #[serde(default = "default_quiescence_cutoff")]
    pub quiescence_cutoff: f64,
    /// Extra plies allowed past the horizon while positions are not quiet.
    #[serde(default = "default_quiescence_max_depth")]
    pub quiescence_max_depth: u32,
    /// Plies subtracted from a null-move search beyond the usual one.
    #[serde(default = "default_null_move_reduction")]
    pub null_move_reduction: u32,
    #[serde(default)]
    pub piece_values: PieceValues,
    /// Seed for the random strategy. Unset means seeded from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_depth() -> u32 {
    4
}

fn default_forward_prune_n() -> usize {
    16
}

fn default_mobility_factor() -> f64 {
    0.1
}

fn default_initiative() -> f64 {
    1.05
}

fn default_quiescence_cutoff() -> f64 {
    0.5
}

fn default_quiescence_max_depth() -> u32 {
    4
}

fn default_null_move_reduction() -> u32 {
    1
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            strategy: Strategy::default(),
            pruning: Pruning::default(),
            evaluator: Evaluator::default(),
            max_depth: default_max_depth(),
            forward_prune_n: default_forward_prune_n(),
            mobility_factor: default_mobility_factor(),
            initiative: default_initiative(),
            quiescence_cutoff: default_quiescence_cutoff(),
            quiescence_max_depth: default_quiescence_max_depth(),
            null_move_reduction: default_null_move_reduction(),
            piece_values: PieceValues::default(),
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn eval_params(&self) -> EvalParams {
        EvalParams {
            piece_values: self.piece_values,
            mobility_factor: self.mobility_factor,
            initiative: self.initiative,
        }
    }

    pub fn uses_quiescence(&self) -> bool {
        self.strategy == Strategy::MinimaxQuiescence
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pruning.contains(Pruning::FORWARD) && self.forward_prune_n == 0 {
            return Err(ConfigError::InvalidValue {
                field: "forward_prune_n",
                reason: "must be at least 1 when forward pruning is enabled".to_string(),
            });
        }
        for (field, value) in [
            ("mobility_factor", self.mobility_factor),
            ("initiative", self.initiative),
            ("quiescence_cutoff", self.quiescence_cutoff),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("{value} is not a finite non-negative number"),
                });
            }
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] for invalid TOML or unknown
    /// variants, and [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.search.validate()?;
        Ok(config)
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.search.strategy, Strategy::MinimaxQuiescence);
        assert_eq!(config.search.pruning, Pruning::ALPHA_BETA | Pruning::NULL_MOVE);
        assert_eq!(config.search.piece_values, PieceValues::STANDARD);
        assert_eq!(config.search.initiative, 1.05);
    }

    #[test]
    fn test_parse_full_search_section() {
        let toml_content = r#"
[search]
strategy = "minimax"
pruning = 13
evaluator = "material-mobility"
max_depth = 6
forward_prune_n = 8
mobility_factor = 0.05
quiescence_cutoff = 0.75
quiescence_max_depth = 2
null_move_reduction = 2
seed = 42

[search.piece_values]
knight = 3.2
bishop = 3.3
"#;

        let config = EngineConfig::from_toml_str(toml_content).unwrap();
        let search = &config.search;
        assert_eq!(search.strategy, Strategy::Minimax);
        assert!(search.pruning.contains(Pruning::ALPHA_BETA));
        assert!(!search.pruning.contains(Pruning::NULL_MOVE));
        assert!(search.pruning.contains(Pruning::FORWARD));
        assert!(search.pruning.contains(Pruning::TRANSPOSITION));
        assert_eq!(search.evaluator, Evaluator::MaterialMobility);
        assert_eq!(search.max_depth, 6);
        assert_eq!(search.forward_prune_n, 8);
        assert_eq!(search.quiescence_max_depth, 2);
        assert_eq!(search.null_move_reduction, 2);
        assert_eq!(search.seed, Some(42));
        assert_eq!(search.piece_values.knight, 3.2);
        assert_eq!(search.piece_values.bishop, 3.3);
        assert_eq!(search.piece_values.rook, 5.0);

        let params = search.eval_params();
        assert_eq!(params.mobility_factor, 0.05);
        assert_eq!(params.initiative, 1.05);
    }

    #[test]
    fn test_unknown_variant_is_parse_error() {
        let result = EngineConfig::from_toml_str("[search]\nstrategy = \"alphazero\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = EngineConfig::from_toml_str("[search]\npruning = 4\nforward_prune_n = 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "forward_prune_n", .. })
        ));

        let result = EngineConfig::from_toml_str("[search]\nmobility_factor = -1.0\n");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "mobility_factor", .. })
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = EngineConfig::load("/nonexistent/engine.toml");
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_pruning_flags() {
        let flags = Pruning::ALPHA_BETA | Pruning::FORWARD;
        assert_eq!(flags.bits(), 5);
        assert!(flags.contains(Pruning::FORWARD));
        assert!(!flags.without(Pruning::FORWARD).contains(Pruning::FORWARD));
        assert!(Pruning::NONE.contains(Pruning::NONE));
        assert_eq!(format!("{flags:?}"), "Pruning(ALPHA_BETA | FORWARD)");
        assert_eq!(format!("{:?}", Pruning::NONE), "Pruning(NONE)");
    }
}
