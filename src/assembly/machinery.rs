use std::collections::BTreeMap;

use tracing::debug;

use crate::assembly::assembler::{holoenzyme_id, Draft};
use crate::core::model::{ComplexOrigin, ReactionDraft, ReactionKind, Subreaction};
use crate::core::types::{SpeciesKind, RIBOSOME};
use crate::curation::kinds::{CurationEntry, CurationKind};
use crate::report::Importance;

/// Subreaction id of an excision mechanism
pub(super) fn excision_id(mechanism: &str) -> String {
    format!("{mechanism}_excision")
}

/// Subreaction id of the release factor reading a stop codon
pub(super) fn release_id(codon: &str) -> String {
    format!("release_{codon}")
}

impl Draft<'_> {
    /// Register every machinery step of the registry as a subreaction
    pub(super) fn register_subreactions(&mut self) {
        let mut steps: Vec<(String, Vec<String>, BTreeMap<String, f64>)> = Vec::new();
        for kind in [
            CurationKind::RibosomeSubreaction,
            CurationKind::TranscriptionSubreaction,
            CurationKind::TranslationInitiation,
            CurationKind::TranslationElongation,
            CurationKind::TranslationTermination,
            CurationKind::PeptideReleaseFactor,
            CurationKind::SpecialTrnaSubreaction,
            CurationKind::TrnaModification,
            CurationKind::RrnaModification,
            CurationKind::ExcisionMachinery,
            CurationKind::SpecialModification,
        ] {
            for entry in self.registry.entries(kind) {
                let step = match entry {
                    CurationEntry::RibosomeSubreaction(s)
                    | CurationEntry::TranslationInitiation(s)
                    | CurationEntry::TranslationElongation(s)
                    | CurationEntry::TranslationTermination(s)
                    | CurationEntry::RrnaModification(s)
                    | CurationEntry::SpecialModification(s) => {
                        (s.id.clone(), s.enzymes.clone(), s.stoichiometry.clone())
                    }
                    CurationEntry::TranscriptionSubreaction(s) => {
                        (s.id.clone(), s.enzymes.clone(), s.stoichiometry.clone())
                    }
                    CurationEntry::SpecialTrnaSubreaction(s) => {
                        (s.id.clone(), s.enzymes.clone(), s.stoichiometry.clone())
                    }
                    CurationEntry::TrnaModification(s) => {
                        let mut enzymes = s.enzymes.clone();
                        enzymes.extend(s.carriers.keys().cloned());
                        (s.id.clone(), enzymes, s.stoichiometry.clone())
                    }
                    CurationEntry::PeptideReleaseFactor(s) => (
                        release_id(&entry.key()),
                        vec![s.enzyme.clone()],
                        BTreeMap::new(),
                    ),
                    CurationEntry::ExcisionMachinery(s) => (
                        excision_id(&s.mechanism.to_string()),
                        s.enzymes.clone(),
                        BTreeMap::new(),
                    ),
                    _ => continue,
                };
                steps.push(step);
            }
        }

        for (id, enzymes, stoichiometry) in steps {
            let enzymes = self.resolve_all(&enzymes, &id);
            let stoichiometry = stoichiometry
                .into_iter()
                .map(|(met, c)| (self.metabolite(&met), c))
                .collect();
            self.model.add_subreaction(Subreaction {
                id,
                enzymes,
                stoichiometry,
                keff: self.options.default_keff,
            });
        }
        debug!(subreactions = self.model.subreactions.len(), "Registered subreactions");
    }

    /// Curated complexes, the ribosome, polymerases, modified complexes and generics
    pub(super) fn build_machinery(&mut self) {
        let registry = self.registry;

        for kind in [
            CurationKind::ComplexStoichiometry,
            CurationKind::RnaPolymerase,
            CurationKind::RnaDegradosome,
        ] {
            for entry in registry.entries(kind) {
                if let CurationEntry::ComplexStoichiometry(curated)
                | CurationEntry::RnaPolymerase(curated)
                | CurationEntry::RnaDegradosome(curated) = entry
                {
                    self.add_formation(&curated.complex, &curated.components, ComplexOrigin::Curated, &[]);
                }
            }
        }

        self.build_ribosome();
        self.build_holoenzymes();
        self.build_modified_complexes();
        self.build_generics();
        debug!(complexes = self.model.complexes.len(), "Built machinery complexes");
    }

    fn build_ribosome(&mut self) {
        let registry = self.registry;
        let mut components: BTreeMap<String, f64> = BTreeMap::new();
        for entry in registry.entries(CurationKind::RibosomeStoich) {
            if let CurationEntry::RibosomeStoich(step) = entry {
                for (component, count) in &step.components {
                    *components.entry(component.clone()).or_insert(0.0) += count;
                }
            }
        }

        if components.is_empty() {
            self.model.add_species(RIBOSOME, SpeciesKind::Complex);
            self.note(
                Importance::High,
                RIBOSOME,
                "no ribosome_stoich entries; the ribosome has no formation reaction",
                "curate ribosome_stoich",
            );
            return;
        }

        let subreactions: Vec<(String, f64)> = [CurationKind::RibosomeSubreaction, CurationKind::RrnaModification]
            .into_iter()
            .flat_map(|kind| registry.entries(kind).map(|e| (e.key(), 1.0)))
            .collect();
        self.add_formation(RIBOSOME, &components, ComplexOrigin::Curated, &subreactions);
    }

    /// Polymerase core the holoenzymes are built on
    fn polymerase_core(&self) -> Option<String> {
        self.registry
            .entries(CurationKind::RnaPolymerase)
            .map(CurationEntry::key)
            .find(|id| self.model.complexes.contains_key(id))
    }

    fn build_holoenzymes(&mut self) {
        let sigmas: Vec<String> = self
            .registry
            .entries(CurationKind::SigmaFactor)
            .map(CurationEntry::key)
            .collect();
        if sigmas.is_empty() {
            return;
        }
        let Some(core) = self.polymerase_core() else {
            self.note(
                Importance::High,
                "rna_polymerase",
                "sigma factors are curated but no RNA polymerase core could be built",
                "curate rna_polymerase",
            );
            return;
        };

        for sigma in sigmas {
            if self.gene_record(&sigma).is_none() {
                self.note(
                    Importance::Medium,
                    &sigma,
                    format!("sigma factor {sigma} is not an annotated gene; no holoenzyme built"),
                    "correct the sigma_factor gene id",
                );
                continue;
            }
            let components = BTreeMap::from([(core.clone(), 1.0), (sigma.clone(), 1.0)]);
            self.add_formation(&holoenzyme_id(&sigma), &components, ComplexOrigin::Holoenzyme, &[]);
        }
    }

    /// RNA polymerase transcribing a unit: its own sigma, the housekeeping
    /// sigma, then the bare core
    pub(super) fn polymerase_for(&self, sigma: Option<&str>) -> Option<String> {
        let built = |id: String| self.model.complexes.contains_key(&id).then_some(id);

        if let Some(holo) = sigma.and_then(|s| built(holoenzyme_id(s))) {
            return Some(holo);
        }
        let housekeeping = self
            .registry
            .entries(CurationKind::SigmaFactor)
            .find_map(|entry| match entry {
                CurationEntry::SigmaFactor(s) if s.housekeeping => built(holoenzyme_id(&s.gene)),
                _ => None,
            });
        housekeeping.or_else(|| self.polymerase_core())
    }

    /// Degradosome catalysing mRNA degradation
    pub(super) fn degradosome(&self) -> Option<String> {
        self.registry
            .entries(CurationKind::RnaDegradosome)
            .map(CurationEntry::key)
            .find(|id| self.model.complexes.contains_key(id))
    }

    fn build_modified_complexes(&mut self) {
        let registry = self.registry;
        for entry in registry.entries(CurationKind::ComplexModification) {
            let CurationEntry::ComplexModification(modified) = entry else {
                continue;
            };
            let mut components = BTreeMap::from([(modified.core.clone(), 1.0)]);
            let mut subreactions = Vec::new();
            for (modification, count) in &modified.modifications {
                if registry.contains(CurationKind::SpecialModification, modification) {
                    subreactions.push((modification.clone(), *count));
                } else {
                    components.insert(modification.clone(), *count);
                }
            }
            self.add_formation(&modified.complex, &components, ComplexOrigin::Modified, &subreactions);
        }
    }

    fn build_generics(&mut self) {
        let registry = self.registry;
        for entry in registry.entries(CurationKind::GenericComponent) {
            let CurationEntry::GenericComponent(generic) = entry else {
                continue;
            };
            self.model.add_species(&generic.generic, SpeciesKind::Generic);
            for member in &generic.members {
                let Some(species) = self.resolve(member, &generic.generic) else {
                    continue;
                };
                let mut reaction = ReactionDraft::new(
                    format!("formation_{}_{member}", generic.generic),
                    ReactionKind::Formation,
                    self.options.flux_bound,
                );
                reaction.add_coefficient(&species, -1.0);
                reaction.add_coefficient(&generic.generic, 1.0);
                self.model.add_reaction(reaction);
            }
        }
    }
}
