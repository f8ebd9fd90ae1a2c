use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assembly::AssemblyOptions;
use crate::curation::kinds::CurationKind;
use crate::homology::mapper::DEFAULT_EVALUE_CUTOFF;
use crate::troubleshoot::engine::{
    TroubleshootOptions, DEFAULT_FLUX_BOUND, DEFAULT_GROWTH_PROBE, DEFAULT_KEFF,
    DEFAULT_MAX_ITERATIONS,
};
use crate::troubleshoot::problem::available_solvers;
use crate::troubleshoot::clarabel::ClarabelSolver;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Where the entries of a curation kind come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindSource {
    /// Supplied by the organism's curation tables
    #[default]
    Manual,
    /// Produced by homology and umbrella defaults only
    Generated,
}

fn default_growth_probe() -> f64 {
    DEFAULT_GROWTH_PROBE
}

fn default_evalue_cutoff() -> f64 {
    DEFAULT_EVALUE_CUTOFF
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_keff() -> f64 {
    DEFAULT_KEFF
}

fn default_flux_bound() -> f64 {
    DEFAULT_FLUX_BOUND
}

fn default_solver() -> String {
    ClarabelSolver::NAME.to_string()
}

fn default_required_kinds() -> Vec<CurationKind> {
    vec![CurationKind::RibosomeStoich]
}

/// Options of a build, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Growth flux the feasibility test pins
    #[serde(default = "default_growth_probe")]
    pub growth_probe: f64,

    /// Homology matches with a larger e-value are ignored
    #[serde(default = "default_evalue_cutoff")]
    pub evalue_cutoff: f64,

    /// Cap on troubleshooting iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// keff for expression machinery and patched reactions
    #[serde(default = "default_keff")]
    pub default_keff: f64,

    /// Flux magnitude treated as unbounded
    #[serde(default = "default_flux_bound")]
    pub upper_flux_bound: f64,

    /// LP backend name
    #[serde(default = "default_solver")]
    pub solver: String,

    /// Kinds that must have entries and fully resolving references
    #[serde(default = "default_required_kinds")]
    pub required_kinds: Vec<CurationKind>,

    /// Per-kind source; kinds not listed are manual
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub kind_sources: BTreeMap<CurationKind, KindSource>,

    /// Fail on unparseable gene-reaction rules
    #[serde(default)]
    pub strict_gene_rules: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            growth_probe: DEFAULT_GROWTH_PROBE,
            evalue_cutoff: DEFAULT_EVALUE_CUTOFF,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            default_keff: DEFAULT_KEFF,
            upper_flux_bound: DEFAULT_FLUX_BOUND,
            solver: default_solver(),
            required_kinds: default_required_kinds(),
            kind_sources: BTreeMap::new(),
            strict_gene_rules: false,
        }
    }
}

impl BuilderConfig {
    /// Parse a config from JSON; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check every value is usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        };
        positive("growth_probe", self.growth_probe)?;
        positive("evalue_cutoff", self.evalue_cutoff)?;
        positive("default_keff", self.default_keff)?;
        positive("upper_flux_bound", self.upper_flux_bound)?;

        if self.growth_probe >= self.upper_flux_bound {
            return Err(ConfigError::InvalidValue {
                field: "growth_probe",
                reason: format!("must be below upper_flux_bound ({})", self.upper_flux_bound),
            });
        }
        let solver = self.solver.to_ascii_lowercase();
        if !available_solvers().contains(&solver.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "solver",
                reason: format!(
                    "unknown backend '{}' (available: {})",
                    self.solver,
                    available_solvers().join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Source configured for a kind
    #[must_use]
    pub fn source_of(&self, kind: CurationKind) -> KindSource {
        self.kind_sources.get(&kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            default_keff: self.default_keff,
            flux_bound: self.upper_flux_bound,
            strict_gene_rules: self.strict_gene_rules,
        }
    }

    #[must_use]
    pub fn troubleshoot_options(&self) -> TroubleshootOptions {
        TroubleshootOptions {
            growth_probe: self.growth_probe,
            max_iterations: self.max_iterations,
            default_keff: self.default_keff,
            flux_bound: self.upper_flux_bound,
        }
    }
}
