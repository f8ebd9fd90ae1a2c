//! Top-level build pipeline.
//!
//! [`MEBuilder`] sequences every phase of a build and owns the decisions that
//! cross phase boundaries:
//!
//! 1. Validate the organism inputs
//! 2. Load manual curation, skipping kinds configured as generated
//! 3. Borrow curation from a reference organism through homology
//! 4. Fill remaining slots from the umbrella defaults
//! 5. Check every required kind has entries
//! 6. Assemble the draft model and check curation references against it
//! 7. Troubleshoot the draft to growth feasibility
//!
//! Every fallback taken is a note in the returned
//! [`TroubleshootingReport`]. Only errors without a safe default abort.
//!
//! ## Example
//!
//! ```rust,ignore
//! use me_builder::builder::{BuilderConfig, MEBuilder};
//!
//! let output = MEBuilder::new(BuilderConfig::default())
//!     .with_curation("manual", entries)
//!     .build(&inputs)?;
//!
//! println!("{}", output.model.stats());
//! print!("{}", output.report.render_log());
//! ```

pub mod config;

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::assembly::{AssemblyError, ModelAssembler};
use crate::core::gpr::GprError;
use crate::core::model::MEModel;
use crate::core::organism::{InputError, OrganismInputs, ReferenceOrganism};
use crate::curation::defaults::{CatalogError, UmbrellaDefaults};
use crate::curation::kinds::{CurationEntry, CurationKind};
use crate::curation::registry::{CurationRegistry, EntryOrigin, RegistryError};
use crate::homology::{HomologyError, HomologyMapper, HomologyMatch};
use crate::parsing::ParseError;
use crate::report::{CurationNote, Importance, TroubleshootingReport};
use crate::troubleshoot::engine::{FeasibilityTroubleshooter, TroubleshootOutcome, TroubleshootState};
use crate::troubleshoot::problem::{solver_by_name, LpSolver, SolverError};

pub use config::{BuilderConfig, ConfigError, KindSource};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Required curation kind {kind} has no entries and no homology fallback")]
    MissingRequiredInput { kind: CurationKind },

    #[error("{referenced_by} references {entity}: {reason}")]
    DanglingReference {
        entity: String,
        referenced_by: String,
        reason: String,
    },

    #[error("Gene-reaction rule '{rule}' of {reaction} cannot be parsed: {source}")]
    AmbiguousGeneRule {
        reaction: String,
        rule: String,
        #[source]
        source: GprError,
    },

    #[error("Model still infeasible after {} troubleshooting iterations", .report.iterations())]
    UnresolvedInfeasibility { report: Box<TroubleshootingReport> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Invalid organism inputs: {0}")]
    Input(InputError),

    #[error("Invalid curation: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Homology(#[from] HomologyError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<InputError> for BuildError {
    fn from(err: InputError) -> Self {
        match err {
            InputError::ConflictingName {
                gene,
                annotation,
                network,
            } => Self::DanglingReference {
                entity: gene,
                referenced_by: "metabolic network".to_string(),
                reason: format!(
                    "the annotation names this gene '{annotation}' but the network names it '{network}'"
                ),
            },
            other => Self::Input(other),
        }
    }
}

impl From<AssemblyError> for BuildError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::AmbiguousGeneRule {
                reaction,
                rule,
                source,
            } => Self::AmbiguousGeneRule {
                reaction,
                rule,
                source,
            },
            AssemblyError::UnknownUnitGene { unit, gene } => Self::DanglingReference {
                entity: gene,
                referenced_by: format!("transcription unit {unit}"),
                reason: "not an annotated gene".to_string(),
            },
            AssemblyError::DanglingLinks(links) => {
                let count = links.len();
                match links.into_iter().next() {
                    Some(link) => Self::DanglingReference {
                        entity: link.entity,
                        referenced_by: link.owner,
                        reason: format!(
                            "not indexed by the model ({:?} link, {count} dangling in total)",
                            link.role
                        ),
                    },
                    None => Self::DanglingReference {
                        entity: String::new(),
                        referenced_by: "assembly".to_string(),
                        reason: "dangling links reported without detail".to_string(),
                    },
                }
            }
        }
    }
}

/// Curation registry after every source has been merged
#[derive(Debug, Clone)]
pub struct PreparedCuration {
    pub registry: CurationRegistry,
    pub notes: Vec<CurationNote>,
}

/// A linked draft model plus the curation it was built from
#[derive(Debug, Clone)]
pub struct BuildDraft {
    pub model: MEModel,
    pub registry: CurationRegistry,
    /// Notes from curation and assembly; no patch records yet
    pub report: TroubleshootingReport,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub model: MEModel,
    pub registry: CurationRegistry,
    pub report: TroubleshootingReport,
    pub outcome: TroubleshootOutcome,
}

impl BuildOutput {
    /// Registered entries per kind and origin
    #[must_use]
    pub fn registry_summary(&self) -> BTreeMap<CurationKind, BTreeMap<EntryOrigin, usize>> {
        CurationKind::ALL
            .into_iter()
            .filter(|kind| !self.registry.is_empty(*kind))
            .map(|kind| (kind, self.registry.origin_counts(kind)))
            .collect()
    }
}

/// Homology inputs: matches plus the organism they point into
#[derive(Debug, Clone)]
struct HomologySource {
    matches: Vec<HomologyMatch>,
    reference: ReferenceOrganism,
}

/// Orchestrates curation, assembly and troubleshooting
pub struct MEBuilder {
    config: BuilderConfig,
    solver: Option<Box<dyn LpSolver>>,
    curation: Vec<(String, Vec<CurationEntry>)>,
    homology: Option<HomologySource>,
    defaults: Option<UmbrellaDefaults>,
}

impl MEBuilder {
    #[must_use]
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            solver: None,
            curation: Vec::new(),
            homology: None,
            defaults: None,
        }
    }

    /// Use this backend instead of the one named in the config
    #[must_use]
    pub fn with_solver(mut self, solver: Box<dyn LpSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Add a manual curation source. Later sources replace earlier ones
    /// key by key.
    #[must_use]
    pub fn with_curation(mut self, source: impl Into<String>, entries: Vec<CurationEntry>) -> Self {
        self.curation.push((source.into(), entries));
        self
    }

    /// Borrow curation from a reference organism through these matches
    #[must_use]
    pub fn with_homology(mut self, matches: Vec<HomologyMatch>, reference: ReferenceOrganism) -> Self {
        self.homology = Some(HomologySource { matches, reference });
        self
    }

    /// Replace the embedded umbrella defaults
    #[must_use]
    pub fn with_defaults(mut self, defaults: UmbrellaDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Validate the inputs and merge every curation source
    ///
    /// # Errors
    ///
    /// Returns `BuildError::DanglingReference` for a gene the inputs name
    /// inconsistently, `BuildError::MissingRequiredInput` when a required kind
    /// ends up empty, and other variants for invalid inputs or curation.
    pub fn prepare(&self, inputs: &OrganismInputs) -> Result<PreparedCuration, BuildError> {
        self.config.validate()?;
        inputs.validate()?;

        let mut registry = CurationRegistry::new();
        let mut notes = Vec::new();

        self.load_manual(&mut registry, &mut notes)?;
        self.borrow_homology(&mut registry, &mut notes)?;
        self.fill_defaults(&mut registry, &mut notes)?;

        if let Some(kind) = registry.missing_required(&self.config.required_kinds) {
            return Err(BuildError::MissingRequiredInput { kind });
        }
        info!(
            entries = registry.total_len(),
            notes = notes.len(),
            "Curation registry ready"
        );
        Ok(PreparedCuration { registry, notes })
    }

    fn load_manual(
        &self,
        registry: &mut CurationRegistry,
        notes: &mut Vec<CurationNote>,
    ) -> Result<(), BuildError> {
        for (source, entries) in &self.curation {
            let mut skipped: BTreeMap<CurationKind, usize> = BTreeMap::new();
            let kept: Vec<CurationEntry> = entries
                .iter()
                .filter(|entry| {
                    let generated = self.config.source_of(entry.kind()) == KindSource::Generated;
                    if generated {
                        *skipped.entry(entry.kind()).or_insert(0) += 1;
                    }
                    !generated
                })
                .cloned()
                .collect();

            for (kind, count) in skipped {
                warn!(kind = %kind, count, source = %source, "Ignoring manual entries of a generated kind");
                notes.push(CurationNote::new(
                    Importance::Medium,
                    kind.as_str(),
                    format!("{count} manual {kind} entries in {source} ignored; the kind is configured as generated"),
                    format!("remove them from {source} or configure {kind} as manual"),
                ));
            }

            let loaded = registry.load_all(source, kept)?;
            info!(source = %source, entries = loaded, "Loaded manual curation");
        }
        Ok(())
    }

    fn borrow_homology(
        &self,
        registry: &mut CurationRegistry,
        notes: &mut Vec<CurationNote>,
    ) -> Result<(), BuildError> {
        let Some(homology) = &self.homology else {
            return Ok(());
        };
        let mapper = HomologyMapper::new(self.config.evalue_cutoff)?;
        let borrowed = mapper.borrow(&homology.matches, &homology.reference, registry)?;
        let reference = homology.reference.id.as_str();

        for (kind, entries) in borrowed {
            for entry in entries.iter().filter(|e| !e.dropped_genes.is_empty()) {
                notes.push(CurationNote::new(
                    Importance::Medium,
                    entry.entry.key(),
                    format!(
                        "{kind} entry {} borrowed from {reference} without reference genes {} that have no homolog",
                        entry.reference_key,
                        entry.dropped_genes.join(", ")
                    ),
                    "check whether the organism encodes these subunits",
                ));
            }
            let count = registry.merge_borrowed(
                kind,
                entries.into_iter().map(|e| e.entry).collect(),
                reference,
            );
            if count > 0 {
                info!(kind = %kind, count, reference, "Borrowed curation through homology");
                notes.push(CurationNote::new(
                    Importance::Low,
                    kind.as_str(),
                    format!("{count} {kind} entries borrowed from {reference}"),
                    "review borrowed entries against organism literature",
                ));
            }
        }
        Ok(())
    }

    fn fill_defaults(
        &self,
        registry: &mut CurationRegistry,
        notes: &mut Vec<CurationNote>,
    ) -> Result<(), BuildError> {
        let embedded;
        let defaults = match &self.defaults {
            Some(defaults) => defaults,
            None => {
                embedded = UmbrellaDefaults::load_embedded()?;
                &embedded
            }
        };

        for (kind, count) in defaults.fill(registry) {
            debug!(kind = %kind, count, "Umbrella defaults used");
            notes.push(CurationNote::new(
                Importance::Low,
                kind.as_str(),
                format!("{count} {kind} entries filled from umbrella defaults"),
                format!("curate organism-specific {kind} entries"),
            ));
        }
        Ok(())
    }

    /// Prepare curation, assemble the draft and check references against it
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::prepare`], `BuildError::AmbiguousGeneRule`
    /// under strict gene rules, and `BuildError::DanglingReference` for an
    /// unresolved reference of a required kind.
    pub fn draft(&self, inputs: &OrganismInputs) -> Result<BuildDraft, BuildError> {
        let PreparedCuration { registry, notes } = self.prepare(inputs)?;
        let mut report = TroubleshootingReport::new();
        report.extend_notes(notes);

        let assembly = ModelAssembler::new(&registry, self.config.assembly_options()).build(inputs)?;
        report.extend_notes(assembly.notes);
        let model = assembly.model;

        for dangling in registry.finalize(&model) {
            if self.config.required_kinds.contains(&dangling.kind) {
                return Err(BuildError::DanglingReference {
                    entity: dangling.reference.id.clone(),
                    referenced_by: format!("{} entry {}", dangling.kind, dangling.key),
                    reason: format!("no {:?} with this id in the assembled model", dangling.reference.role),
                });
            }
            warn!(reference = %dangling, "Dangling curation reference");
            report.note(
                Importance::Medium,
                dangling.key.clone(),
                dangling.to_string(),
                "correct or remove the entry",
            );
        }

        Ok(BuildDraft {
            model,
            registry,
            report,
        })
    }

    /// Run the whole pipeline
    ///
    /// # Errors
    ///
    /// Returns any error of [`Self::draft`], or
    /// `BuildError::UnresolvedInfeasibility` carrying the full report when the
    /// troubleshooting loop cannot make the model feasible.
    pub fn build(&self, inputs: &OrganismInputs) -> Result<BuildOutput, BuildError> {
        let BuildDraft {
            mut model,
            registry,
            mut report,
        } = self.draft(inputs)?;

        let configured;
        let solver: &dyn LpSolver = match &self.solver {
            Some(solver) => solver.as_ref(),
            None => {
                configured = solver_by_name(&self.config.solver)?;
                configured.as_ref()
            }
        };

        let troubleshooter = FeasibilityTroubleshooter::new(solver, self.config.troubleshoot_options());
        let outcome = troubleshooter.run(&mut model, &mut report)?;
        if outcome.state == TroubleshootState::Unresolved {
            return Err(BuildError::UnresolvedInfeasibility {
                report: Box::new(report),
            });
        }

        info!(
            iterations = outcome.iterations,
            reactions = model.reactions.len(),
            "Model is feasible"
        );
        Ok(BuildOutput {
            model,
            registry,
            report,
            outcome,
        })
    }
}
