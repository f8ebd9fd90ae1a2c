use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::assembly::{Assembly, AssemblyError, AssemblyOptions};
use crate::core::gene::GeneRecord;
use crate::core::gpr::GeneRule;
use crate::core::model::{Complex, ComplexOrigin, MEModel, ReactionDraft, ReactionFlag, ReactionKind};
use crate::core::organism::{NetworkReaction, OrganismInputs};
use crate::core::types::{
    ProductType, SpeciesKind, Strand, DUMMY_COMPLEX, DUMMY_GENE, DUMMY_GENE_LENGTH, RIBOSOME,
};
use crate::curation::kinds::{CurationEntry, CurationKind};
use crate::curation::registry::CurationRegistry;
use crate::report::{CurationNote, Importance};

/// Builds draft ME models from organism inputs and a filled registry
pub struct ModelAssembler<'a> {
    registry: &'a CurationRegistry,
    options: AssemblyOptions,
}

impl<'a> ModelAssembler<'a> {
    pub fn new(registry: &'a CurationRegistry, options: AssemblyOptions) -> Self {
        Self { registry, options }
    }

    #[must_use]
    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// Assemble the draft model.
    ///
    /// # Errors
    ///
    /// Returns `AssemblyError::AmbiguousGeneRule` for an unparseable rule when
    /// `strict_gene_rules` is set, `AssemblyError::UnknownUnitGene` for a
    /// transcription unit naming an unannotated gene, and
    /// `AssemblyError::DanglingLinks` if the result is not fully linked.
    pub fn build(&self, inputs: &OrganismInputs) -> Result<Assembly, AssemblyError> {
        let mut draft = Draft::new(self.registry, self.options, inputs);

        draft.index_metabolites();
        draft.index_genes();
        draft.register_subreactions();
        draft.build_machinery();
        draft.express()?;
        draft.build_metabolism()?;
        draft.assign_dummy();

        let links = draft.model.validate_links();
        if !links.is_empty() {
            return Err(AssemblyError::DanglingLinks(links));
        }

        let stats = draft.model.stats();
        info!(
            species = stats.species,
            reactions = stats.reactions,
            complexes = stats.complexes,
            notes = draft.notes.len(),
            "Assembled draft model"
        );

        Ok(Assembly {
            model: draft.model,
            notes: draft.notes,
        })
    }
}

/// Working state of one assembly run
pub(super) struct Draft<'a> {
    pub(super) registry: &'a CurationRegistry,
    pub(super) options: AssemblyOptions,
    pub(super) inputs: &'a OrganismInputs,
    pub(super) model: MEModel,
    pub(super) notes: Vec<CurationNote>,

    /// Annotated genes plus the dummy gene
    pub(super) genes: IndexMap<String, GeneRecord>,

    /// Gene -> species its product matures into
    mature: HashMap<String, (String, SpeciesKind)>,

    complex_ids: HashSet<String>,
    generic_ids: HashSet<String>,

    /// Genes whose product is consumed by a complex or machinery step
    assigned: HashSet<String>,

    /// Network metabolite -> ME metabolite, `None` when eliminated
    metabolite_map: HashMap<String, Option<String>>,

    /// Isozyme gene set -> generated complex
    generated: HashMap<BTreeSet<String>, String>,
}

impl<'a> Draft<'a> {
    fn new(
        registry: &'a CurationRegistry,
        options: AssemblyOptions,
        inputs: &'a OrganismInputs,
    ) -> Self {
        let mut complex_ids: HashSet<String> = [
            CurationKind::ComplexStoichiometry,
            CurationKind::ComplexModification,
            CurationKind::RnaPolymerase,
            CurationKind::RnaDegradosome,
        ]
        .into_iter()
        .flat_map(|kind| registry.entries(kind).map(CurationEntry::key))
        .collect();
        complex_ids.insert(RIBOSOME.to_string());
        complex_ids.insert(DUMMY_COMPLEX.to_string());
        for entry in registry.entries(CurationKind::SigmaFactor) {
            complex_ids.insert(holoenzyme_id(&entry.key()));
        }

        let generic_ids = registry
            .entries(CurationKind::GenericComponent)
            .map(CurationEntry::key)
            .collect();

        let metabolite_map = registry
            .entries(CurationKind::MetaboliteMapping)
            .filter_map(|entry| match entry {
                CurationEntry::MetaboliteMapping(m) => {
                    Some((m.metabolite.clone(), m.maps_to.clone()))
                }
                _ => None,
            })
            .collect();

        Self {
            registry,
            options,
            inputs,
            model: MEModel::new(&inputs.id),
            notes: Vec::new(),
            genes: IndexMap::new(),
            mature: HashMap::new(),
            complex_ids,
            generic_ids,
            assigned: HashSet::new(),
            metabolite_map,
            generated: HashMap::new(),
        }
    }

    pub(super) fn note(
        &mut self,
        importance: Importance,
        triggered_by: &str,
        msg: impl Into<String>,
        to_do: &str,
    ) {
        self.notes
            .push(CurationNote::new(importance, triggered_by, msg, to_do));
    }

    /// Index a metabolite on demand
    pub(super) fn metabolite(&mut self, id: &str) -> String {
        self.model.add_species(id, SpeciesKind::Metabolite);
        id.to_string()
    }

    /// Resolve a component, enzyme or member id to an indexed species.
    ///
    /// Genes resolve to the mature form of their product. Unknown ids are
    /// skipped with a note.
    pub(super) fn resolve(&mut self, id: &str, owner: &str) -> Option<String> {
        if let Some((species, kind)) = self.mature.get(id).cloned() {
            self.assigned.insert(id.to_string());
            self.model.add_species(&species, kind);
            return Some(species);
        }
        if self.generic_ids.contains(id) {
            self.model.add_species(id, SpeciesKind::Generic);
            return Some(id.to_string());
        }
        if self.complex_ids.contains(id) {
            self.model.add_species(id, SpeciesKind::Complex);
            return Some(id.to_string());
        }
        if self.model.has_species(id) {
            return Some(id.to_string());
        }
        self.note(
            Importance::Medium,
            owner,
            format!("{owner} references unknown component {id}; it was left out"),
            "curate the component or correct the identifier",
        );
        None
    }

    /// Resolve a list of enzymes, dropping unknown ones
    pub(super) fn resolve_all(&mut self, ids: &[String], owner: &str) -> Vec<String> {
        ids.iter().filter_map(|id| self.resolve(id, owner)).collect()
    }

    pub(super) fn gene_record(&self, id: &str) -> Option<&GeneRecord> {
        self.genes.get(id)
    }

    /// Register a complex with resolved components and its formation reaction
    pub(super) fn add_formation(
        &mut self,
        complex: &str,
        components: &BTreeMap<String, f64>,
        origin: ComplexOrigin,
        subreactions: &[(String, f64)],
    ) -> bool {
        let mut resolved: BTreeMap<String, f64> = BTreeMap::new();
        for (component, count) in components {
            if let Some(species) = self.resolve(component, complex) {
                *resolved.entry(species).or_insert(0.0) += count;
            }
        }

        let mut reaction = ReactionDraft::new(
            format!("formation_{complex}"),
            ReactionKind::Formation,
            self.options.flux_bound,
        );
        for (species, count) in &resolved {
            reaction.add_coefficient(species, -count);
        }
        reaction.add_coefficient(complex, 1.0);
        for (sub, count) in subreactions {
            if self.model.subreactions.contains_key(sub) {
                reaction.add_subreaction(sub, *count);
            }
        }

        let added = self.model.add_complex(Complex {
            id: complex.to_string(),
            components: resolved,
            origin,
        });
        if added {
            self.model.add_reaction(reaction);
        }
        added
    }

    fn index_metabolites(&mut self) {
        let network = &self.inputs.network;
        let mut ids: Vec<String> = network.metabolites.iter().map(|m| m.id.clone()).collect();
        for reaction in &network.reactions {
            ids.extend(reaction.metabolites.keys().cloned());
        }
        for id in ids {
            if let Some(mapped) = self.mapped(&id) {
                self.metabolite(&mapped);
            }
        }
        debug!(metabolites = self.model.species.len(), "Indexed network metabolites");
    }

    fn mapped(&self, id: &str) -> Option<String> {
        match self.metabolite_map.get(id) {
            Some(target) => target.clone(),
            None => Some(id.to_string()),
        }
    }

    fn index_genes(&mut self) {
        for gene in &self.inputs.genes {
            self.genes.insert(gene.id.clone(), gene.clone());
        }
        self.genes.insert(
            DUMMY_GENE.to_string(),
            GeneRecord::new(DUMMY_GENE, ProductType::Protein).with_coordinates(
                1,
                DUMMY_GENE_LENGTH,
                Strand::Plus,
            ),
        );

        let folded: HashSet<String> = self
            .registry
            .entries(CurationKind::FoldingMechanism)
            .filter_map(|entry| match entry {
                CurationEntry::FoldingMechanism(f) => Some(f.clients.clone()),
                _ => None,
            })
            .flatten()
            .collect();

        let genes: Vec<(String, ProductType)> = self
            .genes
            .values()
            .map(|g| (g.id.clone(), g.product))
            .collect();
        for (id, product) in genes {
            self.model.add_gene(&id, product);
            let mature = if product == ProductType::Protein {
                let location = match self.registry.get(CurationKind::ProteinLocation, &id) {
                    Some(CurationEntry::ProteinLocation(loc)) => Some(loc.compartment.clone()),
                    _ => None,
                };
                match location {
                    Some(compartment) => (format!("protein_{id}_{compartment}"), SpeciesKind::Protein),
                    None if folded.contains(&id) => (format!("protein_{id}_folded"), SpeciesKind::Protein),
                    None => (format!("protein_{id}"), SpeciesKind::Protein),
                }
            } else {
                (format!("RNA_{id}"), SpeciesKind::Rna)
            };
            self.mature.insert(id, mature);
        }
        debug!(genes = self.genes.len(), "Indexed genes");
    }

    fn isozyme_complexes(&self) -> BTreeMap<BTreeSet<String>, String> {
        let mut by_genes = BTreeMap::new();
        for entry in self.registry.entries(CurationKind::ComplexStoichiometry) {
            let CurationEntry::ComplexStoichiometry(stoich) = entry else {
                continue;
            };
            let genes: BTreeSet<String> = stoich.components.keys().cloned().collect();
            if !genes.is_empty() && genes.iter().all(|g| self.genes.contains_key(g)) {
                by_genes.entry(genes).or_insert_with(|| stoich.complex.clone());
            }
        }
        by_genes
    }

    fn reaction_keff(&self, reaction: &str, complex: &str) -> Option<f64> {
        let keyed = format!("{reaction}@{complex}");
        let found = [keyed.as_str(), reaction]
            .into_iter()
            .find_map(|key| match self.registry.get(CurationKind::ReactionKeff, key) {
                Some(CurationEntry::ReactionKeff(curated)) => Some(curated.keff),
                _ => None,
            });
        found
    }

    fn mapped_stoichiometry(&self, metabolites: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        let mut stoichiometry = BTreeMap::new();
        for (id, coefficient) in metabolites {
            if let Some(mapped) = self.mapped(id) {
                *stoichiometry.entry(mapped).or_insert(0.0) += coefficient;
            }
        }
        stoichiometry.retain(|_, c: &mut f64| *c != 0.0);
        stoichiometry
    }

    fn build_metabolism(&mut self) -> Result<(), AssemblyError> {
        let curated = self.isozyme_complexes();
        let inputs = self.inputs;
        for reaction in &inputs.network.reactions {
            self.add_network_reaction(reaction, &curated)?;
        }
        self.model.growth_reaction = Some(inputs.network.objective.clone());
        debug!(
            reactions = self.model.reactions.len(),
            generated_complexes = self.generated.len(),
            "Built metabolic reactions"
        );
        Ok(())
    }

    fn add_network_reaction(
        &mut self,
        reaction: &NetworkReaction,
        curated: &BTreeMap<BTreeSet<String>, String>,
    ) -> Result<(), AssemblyError> {
        let stoichiometry = self.mapped_stoichiometry(&reaction.metabolites);
        let (lower, upper) = (reaction.lower_bound, reaction.upper_bound);

        if reaction.id == self.inputs.network.objective {
            self.model.add_reaction(
                ReactionDraft::new(&reaction.id, ReactionKind::Growth, upper)
                    .with_bounds(lower.max(0.0), upper)
                    .with_stoichiometry(stoichiometry)
                    .with_source(&reaction.id),
            );
            return Ok(());
        }
        if reaction.is_boundary() {
            self.model.add_reaction(
                ReactionDraft::new(&reaction.id, ReactionKind::Exchange, upper)
                    .with_bounds(lower, upper)
                    .with_stoichiometry(stoichiometry)
                    .with_source(&reaction.id),
            );
            return Ok(());
        }

        let uncatalysed = ReactionDraft::new(&reaction.id, ReactionKind::Metabolic, upper)
            .with_bounds(lower, upper)
            .with_stoichiometry(stoichiometry.clone())
            .with_source(&reaction.id)
            .with_rule(&reaction.gene_reaction_rule);

        let parsed = GeneRule::parse(&reaction.gene_reaction_rule)
            .and_then(|rule| rule.map(|r| r.to_dnf()).transpose());
        let clauses = match parsed {
            Ok(Some(clauses)) => clauses,
            Ok(None) => {
                let flag = if reaction.spontaneous {
                    ReactionFlag::Spontaneous
                } else {
                    self.note(
                        Importance::Low,
                        &reaction.id,
                        format!("{} has no gene association and runs uncatalysed", reaction.id),
                        "check whether the reaction is spontaneous or needs a gene",
                    );
                    ReactionFlag::Orphan
                };
                self.model.add_reaction(uncatalysed.with_flag(flag));
                return Ok(());
            }
            Err(source) => {
                if self.options.strict_gene_rules {
                    return Err(AssemblyError::AmbiguousGeneRule {
                        reaction: reaction.id.clone(),
                        rule: reaction.gene_reaction_rule.clone(),
                        source,
                    });
                }
                self.note(
                    Importance::High,
                    &reaction.id,
                    format!(
                        "gene-reaction rule '{}' cannot be parsed ({source}); the reaction is not coupled to enzymes",
                        reaction.gene_reaction_rule
                    ),
                    "correct the gene-reaction rule",
                );
                self.model
                    .add_reaction(uncatalysed.with_flag(ReactionFlag::AmbiguousRule));
                return Ok(());
            }
        };

        let mut isozymes = Vec::with_capacity(clauses.len());
        for clause in clauses {
            match clause.iter().find(|g| !self.genes.contains_key(*g)) {
                Some(unknown) => {
                    let unknown = unknown.clone();
                    self.note(
                        Importance::Medium,
                        &reaction.id,
                        format!(
                            "isozyme ({}) of {} names unannotated gene {unknown}; the isozyme was dropped",
                            clause.iter().cloned().collect::<Vec<_>>().join(" and "),
                            reaction.id
                        ),
                        "add the gene to the annotation or correct the rule",
                    );
                }
                None => isozymes.push(clause),
            }
        }
        if isozymes.is_empty() {
            self.model.add_reaction(uncatalysed.with_flag(ReactionFlag::Orphan));
            return Ok(());
        }

        let class = self.inputs.subsystem_class(reaction);
        let mut classified = false;
        for (index, genes) in isozymes.into_iter().enumerate() {
            let complex = match curated.get(&genes) {
                Some(complex) => complex.clone(),
                None => self.generated_complex(&reaction.id, index + 1, genes),
            };
            let keff = match (self.reaction_keff(&reaction.id, &complex), class) {
                (Some(keff), _) => Some(keff),
                (None, Some(class)) => {
                    classified = true;
                    Some(class.keff())
                }
                (None, None) => None,
            };

            if upper > 0.0 {
                self.model.add_reaction(
                    ReactionDraft::new(
                        format!("{}_FWD_{complex}", reaction.id),
                        ReactionKind::Metabolic,
                        upper,
                    )
                    .with_stoichiometry(stoichiometry.clone())
                    .with_catalyst(&complex)
                    .with_keff(keff)
                    .with_source(&reaction.id)
                    .with_rule(&reaction.gene_reaction_rule),
                );
            }
            if reaction.is_reversible() {
                let reversed = stoichiometry.iter().map(|(id, c)| (id.clone(), -c)).collect();
                self.model.add_reaction(
                    ReactionDraft::new(
                        format!("{}_REV_{complex}", reaction.id),
                        ReactionKind::Metabolic,
                        -lower,
                    )
                    .with_stoichiometry(reversed)
                    .with_catalyst(&complex)
                    .with_keff(keff)
                    .with_source(&reaction.id)
                    .with_rule(&reaction.gene_reaction_rule),
                );
            }
        }
        if let (Some(class), true) = (class, classified) {
            self.note(
                Importance::Low,
                &reaction.id,
                format!(
                    "keff of {} taken from subsystem class {class} ({})",
                    reaction.id,
                    class.keff()
                ),
                "curate reaction_keff for the reaction",
            );
        }
        Ok(())
    }

    /// Complex for an isozyme with no curated counterpart, shared by every
    /// reaction with the same gene set
    fn generated_complex(&mut self, reaction: &str, index: usize, genes: BTreeSet<String>) -> String {
        if let Some(existing) = self.generated.get(&genes) {
            return existing.clone();
        }
        let id = format!("CPLX_{reaction}-{index}");
        let components: BTreeMap<String, f64> = genes.iter().map(|g| (g.clone(), 1.0)).collect();
        self.complex_ids.insert(id.clone());
        self.add_formation(&id, &components, ComplexOrigin::Generated, &[]);
        self.note(
            Importance::Low,
            reaction,
            format!(
                "generated complex {id} from isozyme ({}) with one copy per gene",
                genes.iter().cloned().collect::<Vec<_>>().join(" and ")
            ),
            "curate complex_stoichiometry for the isozyme",
        );
        self.generated.insert(genes, id.clone());
        id
    }

    /// Feed every protein that is in no complex to the dummy complex
    fn assign_dummy(&mut self) {
        let unassigned: Vec<String> = self
            .genes
            .values()
            .filter(|g| g.product == ProductType::Protein)
            .filter(|g| g.id != DUMMY_GENE && !self.assigned.contains(&g.id))
            .map(|g| g.id.clone())
            .collect();

        let mut components = BTreeMap::from([(DUMMY_GENE.to_string(), 1.0)]);
        for gene in &unassigned {
            components.insert(gene.clone(), 1.0);
        }
        self.add_formation(DUMMY_COMPLEX, &components, ComplexOrigin::Dummy, &[]);

        if !unassigned.is_empty() {
            debug!(genes = unassigned.len(), "Assigned gene products to the dummy complex");
            self.note(
                Importance::Low,
                DUMMY_COMPLEX,
                format!(
                    "{} gene products are in no complex and feed {DUMMY_COMPLEX}: {}",
                    unassigned.len(),
                    unassigned.join(", ")
                ),
                "curate complex membership for these genes",
            );
        }
    }
}

/// Species id of the RNA polymerase bound to a sigma factor
pub(super) fn holoenzyme_id(sigma: &str) -> String {
    format!("RNAP_{sigma}")
}
