use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{ProductType, SpeciesKind};
use crate::utils::validation::{compute_signature, format_coefficient};

/// Model format version for compatibility checking
pub const MODEL_VERSION: &str = "1.0.0";

/// A species in the model index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub id: String,
    pub kind: SpeciesKind,
}

/// How a complex came to be in the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexOrigin {
    /// From a curated stoichiometry entry
    Curated,
    /// Built from an isozyme of a gene-reaction rule
    Generated,
    /// RNA polymerase core bound to a sigma factor
    Holoenzyme,
    /// A curated complex carrying modifications
    Modified,
    /// Placeholder absorbing unassigned gene products
    Dummy,
}

/// A macromolecular complex and the species it is assembled from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub id: String,

    /// Species id -> copies per complex
    pub components: BTreeMap<String, f64>,

    pub origin: ComplexOrigin,
}

/// An atomic machinery step attached to expression or formation reactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subreaction {
    pub id: String,

    /// Catalysing species, coupled once per use
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enzymes: Vec<String>,

    /// Metabolite id -> signed coefficient per use
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stoichiometry: BTreeMap<String, f64>,

    pub keff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Metabolic,
    Exchange,
    Growth,
    Transcription,
    Translation,
    Charging,
    Folding,
    Translocation,
    Formation,
    Degradation,
    Demand,
    Sink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionFlag {
    /// No gene association in the source network
    Orphan,
    /// Proceeds without catalysis
    Spontaneous,
    /// Gene-reaction rule could not be parsed; excluded from flux coupling
    AmbiguousRule,
    /// Added or changed by the troubleshooter
    Patched,
}

/// A reaction of the ME network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionDraft {
    pub id: String,

    pub kind: ReactionKind,

    /// Species id -> signed coefficient (negative for reactants)
    pub stoichiometry: BTreeMap<String, f64>,

    /// Gene-reaction rule this reaction was derived from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gene_rule: String,

    pub lower_bound: f64,

    pub upper_bound: f64,

    /// Effective catalytic rate; unset until curated or patched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keff: Option<f64>,

    /// Species consumed at `1 / keff` per unit flux
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalysts: Vec<String>,

    /// Subreaction id -> number of uses per unit flux
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subreactions: BTreeMap<String, f64>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub flags: BTreeSet<ReactionFlag>,

    /// Metabolic network reaction this one was derived from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ReactionDraft {
    pub fn new(id: impl Into<String>, kind: ReactionKind, upper_bound: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            stoichiometry: BTreeMap::new(),
            gene_rule: String::new(),
            lower_bound: 0.0,
            upper_bound,
            keff: None,
            catalysts: Vec::new(),
            subreactions: BTreeMap::new(),
            flags: BTreeSet::new(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_stoichiometry(mut self, stoichiometry: BTreeMap<String, f64>) -> Self {
        self.stoichiometry = stoichiometry;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    #[must_use]
    pub fn with_keff(mut self, keff: Option<f64>) -> Self {
        self.keff = keff;
        self
    }

    #[must_use]
    pub fn with_catalyst(mut self, catalyst: impl Into<String>) -> Self {
        let catalyst = catalyst.into();
        if !self.catalysts.contains(&catalyst) {
            self.catalysts.push(catalyst);
        }
        self
    }

    #[must_use]
    pub fn with_flag(mut self, flag: ReactionFlag) -> Self {
        self.flags.insert(flag);
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.gene_rule = rule.into();
        self
    }

    /// Add to the coefficient of a species
    pub fn add_coefficient(&mut self, species: &str, coefficient: f64) {
        if coefficient == 0.0 {
            return;
        }
        *self.stoichiometry.entry(species.to_string()).or_insert(0.0) += coefficient;
    }

    /// Add uses of a subreaction
    pub fn add_subreaction(&mut self, id: &str, count: f64) {
        if count <= 0.0 {
            return;
        }
        *self.subreactions.entry(id.to_string()).or_insert(0.0) += count;
    }

    /// Reactions with catalysts cannot carry flux without a keff
    #[must_use]
    pub fn needs_keff(&self) -> bool {
        !self.catalysts.is_empty()
    }

    #[must_use]
    pub fn has_flag(&self, flag: ReactionFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Where a dangling link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRole {
    Stoichiometry,
    Catalyst,
    Subreaction,
    SubreactionEnzyme,
    SubreactionStoichiometry,
    ComplexComponent,
    GrowthReaction,
}

/// An id referenced from within the model that the model does not index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DanglingLink {
    /// Reaction, complex or subreaction holding the reference
    pub owner: String,
    pub entity: String,
    pub role: LinkRole,
}

impl std::fmt::Display for DanglingLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} references unknown {} ({:?})", self.owner, self.entity, self.role)
    }
}

/// The ME model: aggregate root over species, genes, complexes, subreactions
/// and reactions. Every index is insertion-ordered so two builds from the
/// same inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MEModel {
    pub id: String,
    pub species: IndexMap<String, Species>,
    pub genes: IndexMap<String, ProductType>,
    pub complexes: IndexMap<String, Complex>,
    pub subreactions: IndexMap<String, Subreaction>,
    pub reactions: IndexMap<String, ReactionDraft>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_reaction: Option<String>,
}

#[derive(Serialize)]
struct ModelData<'a> {
    version: &'a str,
    created_at: String,
    signature: String,
    model: &'a MEModel,
}

impl MEModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            species: IndexMap::new(),
            genes: IndexMap::new(),
            complexes: IndexMap::new(),
            subreactions: IndexMap::new(),
            reactions: IndexMap::new(),
            growth_reaction: None,
        }
    }

    /// Index a species; an existing entry keeps its kind
    pub fn add_species(&mut self, id: &str, kind: SpeciesKind) -> bool {
        if self.species.contains_key(id) {
            return false;
        }
        self.species.insert(
            id.to_string(),
            Species {
                id: id.to_string(),
                kind,
            },
        );
        true
    }

    pub fn add_gene(&mut self, id: &str, product: ProductType) {
        self.genes.insert(id.to_string(), product);
    }

    /// Index a complex and its species; returns false if already present
    pub fn add_complex(&mut self, complex: Complex) -> bool {
        if self.complexes.contains_key(&complex.id) {
            return false;
        }
        self.add_species(&complex.id, SpeciesKind::Complex);
        self.complexes.insert(complex.id.clone(), complex);
        true
    }

    pub fn add_subreaction(&mut self, subreaction: Subreaction) -> bool {
        if self.subreactions.contains_key(&subreaction.id) {
            return false;
        }
        self.subreactions
            .insert(subreaction.id.clone(), subreaction);
        true
    }

    /// Add a reaction; returns false and leaves the model untouched if the id is taken
    pub fn add_reaction(&mut self, reaction: ReactionDraft) -> bool {
        if self.reactions.contains_key(&reaction.id) {
            return false;
        }
        self.reactions.insert(reaction.id.clone(), reaction);
        true
    }

    #[must_use]
    pub fn has_species(&self, id: &str) -> bool {
        self.species.contains_key(id)
    }

    #[must_use]
    pub fn species_kind(&self, id: &str) -> Option<SpeciesKind> {
        self.species.get(id).map(|s| s.kind)
    }

    #[must_use]
    pub fn reaction(&self, id: &str) -> Option<&ReactionDraft> {
        self.reactions.get(id)
    }

    pub fn reaction_mut(&mut self, id: &str) -> Option<&mut ReactionDraft> {
        self.reactions.get_mut(id)
    }

    /// Stoichiometry with subreactions expanded and catalysts coupled.
    ///
    /// Each catalyst is consumed at `1 / keff` per unit flux. A reaction whose
    /// keff is unset couples at `fallback_keff` so its catalysts still appear
    /// as consumers; the LP pins such reactions to zero flux regardless.
    #[must_use]
    pub fn coupled_stoichiometry(
        &self,
        reaction: &ReactionDraft,
        fallback_keff: f64,
    ) -> BTreeMap<String, f64> {
        let mut coupled = reaction.stoichiometry.clone();

        let keff = reaction.keff.unwrap_or(fallback_keff);
        for catalyst in &reaction.catalysts {
            *coupled.entry(catalyst.clone()).or_insert(0.0) -= 1.0 / keff;
        }

        for (sub_id, count) in &reaction.subreactions {
            let Some(sub) = self.subreactions.get(sub_id) else {
                continue;
            };
            for (met, coefficient) in &sub.stoichiometry {
                *coupled.entry(met.clone()).or_insert(0.0) += coefficient * count;
            }
            for enzyme in &sub.enzymes {
                *coupled.entry(enzyme.clone()).or_insert(0.0) -= 1.0 / sub.keff;
            }
        }

        coupled.retain(|_, c| *c != 0.0);
        coupled
    }

    /// Keffs of metabolic reactions that have one
    #[must_use]
    pub fn metabolic_keffs(&self) -> Vec<f64> {
        self.reactions
            .values()
            .filter(|r| r.kind == ReactionKind::Metabolic)
            .filter_map(|r| r.keff)
            .collect()
    }

    /// Every id this model references but does not index
    #[must_use]
    pub fn validate_links(&self) -> Vec<DanglingLink> {
        let mut dangling = Vec::new();
        let mut check = |owner: &str, entity: &str, role: LinkRole, ok: bool| {
            if !ok {
                dangling.push(DanglingLink {
                    owner: owner.to_string(),
                    entity: entity.to_string(),
                    role,
                });
            }
        };

        for reaction in self.reactions.values() {
            for species in reaction.stoichiometry.keys() {
                check(&reaction.id, species, LinkRole::Stoichiometry, self.has_species(species));
            }
            for catalyst in &reaction.catalysts {
                check(&reaction.id, catalyst, LinkRole::Catalyst, self.has_species(catalyst));
            }
            for sub in reaction.subreactions.keys() {
                check(
                    &reaction.id,
                    sub,
                    LinkRole::Subreaction,
                    self.subreactions.contains_key(sub),
                );
            }
        }

        for sub in self.subreactions.values() {
            for enzyme in &sub.enzymes {
                check(&sub.id, enzyme, LinkRole::SubreactionEnzyme, self.has_species(enzyme));
            }
            for met in sub.stoichiometry.keys() {
                check(
                    &sub.id,
                    met,
                    LinkRole::SubreactionStoichiometry,
                    self.has_species(met),
                );
            }
        }

        for complex in self.complexes.values() {
            for component in complex.components.keys() {
                check(
                    &complex.id,
                    component,
                    LinkRole::ComplexComponent,
                    self.has_species(component),
                );
            }
        }

        if let Some(growth) = &self.growth_reaction {
            check(
                &self.id,
                growth,
                LinkRole::GrowthReaction,
                self.reactions.contains_key(growth),
            );
        }

        dangling.sort();
        dangling
    }

    /// Deterministic hash over every reaction's stoichiometry and bounds
    #[must_use]
    pub fn signature(&self) -> String {
        let lines: Vec<String> = self
            .reactions
            .values()
            .map(|r| {
                let stoich: Vec<String> = r
                    .stoichiometry
                    .iter()
                    .map(|(id, c)| format!("{id}={}", format_coefficient(*c)))
                    .collect();
                let subs: Vec<String> = r
                    .subreactions
                    .iter()
                    .map(|(id, c)| format!("{id}x{}", format_coefficient(*c)))
                    .collect();
                format!(
                    "{}|{}|{}|{}|{}|{}|{}",
                    r.id,
                    stoich.join(","),
                    r.catalysts.join(","),
                    subs.join(","),
                    r.keff.map(format_coefficient).unwrap_or_default(),
                    format_coefficient(r.lower_bound),
                    format_coefficient(r.upper_bound),
                )
            })
            .collect();
        compute_signature(&lines)
    }

    /// Export the model to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let data = ModelData {
            version: MODEL_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            signature: self.signature(),
            model: self,
        };
        serde_json::to_string_pretty(&data)
    }

    #[must_use]
    pub fn stats(&self) -> ModelStats {
        let count_kind = |kind: ReactionKind| {
            self.reactions
                .values()
                .filter(|r| r.kind == kind)
                .count()
        };
        ModelStats {
            species: self.species.len(),
            genes: self.genes.len(),
            complexes: self.complexes.len(),
            subreactions: self.subreactions.len(),
            reactions: self.reactions.len(),
            metabolic: count_kind(ReactionKind::Metabolic),
            expression: count_kind(ReactionKind::Transcription)
                + count_kind(ReactionKind::Translation)
                + count_kind(ReactionKind::Folding)
                + count_kind(ReactionKind::Translocation)
                + count_kind(ReactionKind::Degradation)
                + count_kind(ReactionKind::Charging),
            formation: count_kind(ReactionKind::Formation),
            orphan: self
                .reactions
                .values()
                .filter(|r| r.has_flag(ReactionFlag::Orphan))
                .count(),
            missing_keff: self
                .reactions
                .values()
                .filter(|r| r.needs_keff() && r.keff.is_none())
                .count(),
        }
    }
}

/// Summary counts of a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub species: usize,
    pub genes: usize,
    pub complexes: usize,
    pub subreactions: usize,
    pub reactions: usize,
    pub metabolic: usize,
    pub expression: usize,
    pub formation: usize,
    pub orphan: usize,
    pub missing_keff: usize,
}

impl std::fmt::Display for ModelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Species:       {}", self.species)?;
        writeln!(f, "Genes:         {}", self.genes)?;
        writeln!(f, "Complexes:     {}", self.complexes)?;
        writeln!(f, "Subreactions:  {}", self.subreactions)?;
        writeln!(f, "Reactions:     {}", self.reactions)?;
        writeln!(f, "  metabolic:   {}", self.metabolic)?;
        writeln!(f, "  expression:  {}", self.expression)?;
        writeln!(f, "  formation:   {}", self.formation)?;
        writeln!(f, "  orphan:      {}", self.orphan)?;
        write!(f, "  no keff:     {}", self.missing_keff)
    }
}
