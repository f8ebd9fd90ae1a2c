use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::assembly::assembler::Draft;
use crate::assembly::machinery::{excision_id, release_id};
use crate::assembly::AssemblyError;
use crate::core::gene::{GeneRecord, TranscriptionUnit};
use crate::core::model::{ReactionDraft, ReactionKind};
use crate::core::types::{
    amino_acid_metabolite, ProductType, SpeciesKind, AMP, ATP, DUMMY_COMPLEX, H2O, NMPS, NTPS, PPI,
    PROTON, RIBOSOME,
};
use crate::curation::kinds::{CurationEntry, CurationKind, ExcisionMechanism, TranscriptionStage};
use crate::report::Importance;

/// Nucleotide composition in A, C, G, U order; a quarter of the length each
/// when no sequence is known
#[allow(clippy::cast_precision_loss)]
fn composition(gene: &GeneRecord) -> [f64; 4] {
    match gene.base_counts() {
        Some(counts) => counts.map(|c| c as f64),
        None => [gene.length() as f64 / 4.0; 4],
    }
}

impl Draft<'_> {
    /// Transcription, translation and maturation of every gene
    pub(super) fn express(&mut self) -> Result<(), AssemblyError> {
        for unit in self.transcription_units()? {
            self.transcribe(&unit);
        }

        let genes: Vec<GeneRecord> = self.genes.values().cloned().collect();
        for gene in &genes {
            if gene.product == ProductType::Protein {
                self.translate(gene);
                self.fold(gene);
                self.translocate(gene);
                self.degrade(gene);
            } else {
                self.demand_stable_rna(gene);
            }
        }
        debug!(reactions = self.model.reactions.len(), "Built expression reactions");
        Ok(())
    }

    /// Annotated units plus a monocistronic unit for every uncovered gene
    fn transcription_units(&self) -> Result<Vec<TranscriptionUnit>, AssemblyError> {
        let mut covered: HashSet<&str> = HashSet::new();
        let mut units = Vec::with_capacity(self.genes.len());
        for unit in &self.inputs.transcription_units {
            for gene in &unit.genes {
                if !self.genes.contains_key(gene) {
                    return Err(AssemblyError::UnknownUnitGene {
                        unit: unit.id.clone(),
                        gene: gene.clone(),
                    });
                }
                covered.insert(gene);
            }
            units.push(unit.clone());
        }
        for gene in self.genes.keys() {
            if !covered.contains(gene.as_str()) {
                units.push(TranscriptionUnit::monocistronic(gene));
            }
        }
        Ok(units)
    }

    fn transcribe(&mut self, unit: &TranscriptionUnit) {
        let id = format!("transcription_{}", unit.id);
        let mut reaction = ReactionDraft::new(&id, ReactionKind::Transcription, self.options.flux_bound)
            .with_keff(Some(self.options.default_keff));

        let members: Vec<GeneRecord> = unit
            .genes
            .iter()
            .filter_map(|g| self.gene_record(g).cloned())
            .collect();

        let mut nucleotides = [0.0; 4];
        for gene in &members {
            for (total, count) in nucleotides.iter_mut().zip(composition(gene)) {
                *total += count;
            }
            let rna = format!("RNA_{}", gene.id);
            self.model.add_species(&rna, SpeciesKind::Rna);
            reaction.add_coefficient(&rna, 1.0);
        }
        for (ntp, count) in NTPS.iter().zip(nucleotides) {
            reaction.add_coefficient(&self.metabolite(ntp), -count);
        }
        reaction.add_coefficient(&self.metabolite(PPI), nucleotides.iter().sum());

        match self.polymerase_for(unit.sigma.as_deref()) {
            Some(polymerase) => reaction = reaction.with_catalyst(polymerase),
            None => self.note(
                Importance::High,
                &id,
                format!("no RNA polymerase available for {}; transcription is uncatalysed", unit.id),
                "curate rna_polymerase and sigma_factor",
            ),
        }

        for stage in TranscriptionStage::ALL {
            let step = self
                .registry
                .entries(CurationKind::TranscriptionSubreaction)
                .find_map(|entry| match entry {
                    CurationEntry::TranscriptionSubreaction(s) if s.stage == stage => Some(s.id.clone()),
                    _ => None,
                });
            match step {
                Some(step) => reaction.add_subreaction(&step, 1.0),
                None => self.note(
                    Importance::Medium,
                    &id,
                    format!("no {stage:?} transcription subreaction").to_lowercase(),
                    "curate transcription_subreaction",
                ),
            }
        }

        if members.iter().any(|g| g.product.is_stable_rna()) {
            let mechanism = if members.iter().any(|g| g.product == ProductType::Rrna) {
                ExcisionMechanism::RrnaContaining
            } else if members.len() > 1 {
                ExcisionMechanism::Polycistronic
            } else {
                ExcisionMechanism::Monocistronic
            };
            let excision = excision_id(&mechanism.to_string());
            if self.model.subreactions.contains_key(&excision) {
                reaction.add_subreaction(&excision, 1.0);
            } else {
                self.note(
                    Importance::Medium,
                    &id,
                    format!("no {mechanism} excision machinery for {}", unit.id),
                    "curate excision_machinery",
                );
            }
        }

        let registry = self.registry;
        for gene in members.iter().filter(|g| g.product == ProductType::Trna) {
            let Some(CurationEntry::TrnaModificationTarget(target)) =
                registry.get(CurationKind::TrnaModificationTarget, &gene.id)
            else {
                continue;
            };
            for (modification, count) in &target.modifications {
                if self.model.subreactions.contains_key(modification) {
                    reaction.add_subreaction(modification, *count);
                } else {
                    self.note(
                        Importance::Medium,
                        &gene.id,
                        format!("tRNA modification {modification} of {} is not curated", gene.id),
                        "curate trna_modification",
                    );
                }
            }
        }

        self.model.add_reaction(reaction);
    }

    fn translate(&mut self, gene: &GeneRecord) {
        let id = format!("translation_{}", gene.id);
        let rna = format!("RNA_{}", gene.id);
        let protein = format!("protein_{}", gene.id);
        self.model.add_species(&protein, SpeciesKind::Protein);

        let mut reaction = ReactionDraft::new(&id, ReactionKind::Translation, self.options.flux_bound)
            .with_keff(Some(self.options.default_keff))
            .with_catalyst(RIBOSOME)
            .with_catalyst(&rna);
        reaction.add_coefficient(&protein, 1.0);

        #[allow(clippy::cast_precision_loss)]
        let residues = gene.residue_count() as f64;
        let registry = self.registry;
        for (kind, count) in [
            (CurationKind::TranslationInitiation, 1.0),
            (CurationKind::TranslationElongation, residues),
            (CurationKind::TranslationTermination, 1.0),
        ] {
            for entry in registry.entries(kind) {
                reaction.add_subreaction(&entry.key(), count);
            }
        }

        if let Some(sequence) = gene.protein_sequence() {
            match gene.stop_codon() {
                Some(codon) if self.model.subreactions.contains_key(&release_id(&codon)) => {
                    reaction.add_subreaction(&release_id(&codon), 1.0);
                }
                Some(codon) => self.note(
                    Importance::Medium,
                    &gene.id,
                    format!("no release factor reads stop codon {codon} of {}", gene.id),
                    "curate peptide_release_factor",
                ),
                None => {}
            }

            let mut residue_counts: BTreeMap<char, u64> = BTreeMap::new();
            for residue in sequence.chars() {
                *residue_counts.entry(residue).or_insert(0) += 1;
            }
            for (residue, count) in residue_counts {
                #[allow(clippy::cast_precision_loss)]
                let count = count as f64;
                for entry in registry.entries(CurationKind::SpecialTrnaSubreaction) {
                    if let CurationEntry::SpecialTrnaSubreaction(s) = entry {
                        if s.residue.eq_ignore_ascii_case(&residue) {
                            reaction.add_subreaction(&s.id, count);
                        }
                    }
                }
                if let Some(trna) = self.charged_trna(residue) {
                    reaction.add_coefficient(&trna, -count);
                }
            }
        }

        self.model.add_reaction(reaction);
    }

    /// Charged tRNA species for a residue, adding its charging reaction once
    fn charged_trna(&mut self, residue: char) -> Option<String> {
        let aa = amino_acid_metabolite(residue)?;
        let residue = residue.to_ascii_uppercase();
        let trna = format!("generic_tRNA_{residue}");
        let id = format!("charging_tRNA_{residue}");
        if self.model.reactions.contains_key(&id) {
            return Some(trna);
        }

        let registry = self.registry;
        let synthetase = match registry.get(CurationKind::TrnaSynthetase, &residue.to_string()) {
            Some(CurationEntry::TrnaSynthetase(s)) => self.resolve(&s.enzyme, &id),
            _ => None,
        };
        let synthetase = synthetase.unwrap_or_else(|| {
            self.note(
                Importance::Low,
                &id,
                format!("no tRNA synthetase for residue {residue}; charged by {DUMMY_COMPLEX}"),
                "curate trna_synthetase",
            );
            DUMMY_COMPLEX.to_string()
        });

        self.model.add_species(&trna, SpeciesKind::Rna);
        let mut reaction = ReactionDraft::new(&id, ReactionKind::Charging, self.options.flux_bound)
            .with_keff(Some(self.options.default_keff))
            .with_catalyst(synthetase);
        for (met, coefficient) in [(aa, -1.0), (ATP, -1.0), (AMP, 1.0), (PPI, 1.0)] {
            reaction.add_coefficient(&self.metabolite(met), coefficient);
        }
        reaction.add_coefficient(&trna, 1.0);
        self.model.add_reaction(reaction);
        Some(trna)
    }

    fn fold(&mut self, gene: &GeneRecord) {
        let registry = self.registry;
        let Some(CurationEntry::FoldingMechanism(folding)) = registry
            .entries(CurationKind::FoldingMechanism)
            .find(|entry| match entry {
                CurationEntry::FoldingMechanism(f) => f.clients.contains(&gene.id),
                _ => false,
            })
        else {
            return;
        };

        let id = format!("folding_{}_{}", gene.id, folding.mechanism);
        let folded = format!("protein_{}_folded", gene.id);
        self.model.add_species(&folded, SpeciesKind::Protein);

        let mut reaction = ReactionDraft::new(&id, ReactionKind::Folding, self.options.flux_bound);
        reaction.add_coefficient(&format!("protein_{}", gene.id), -1.0);
        reaction.add_coefficient(&folded, 1.0);
        let enzymes = self.resolve_all(&folding.enzymes, &id);
        for enzyme in enzymes {
            reaction = reaction.with_catalyst(enzyme);
        }
        reaction = reaction.with_keff(Some(folding.keff.unwrap_or(self.options.default_keff)));
        self.model.add_reaction(reaction);
    }

    fn translocate(&mut self, gene: &GeneRecord) {
        let registry = self.registry;
        let Some(CurationEntry::ProteinLocation(location)) =
            registry.get(CurationKind::ProteinLocation, &gene.id)
        else {
            return;
        };

        let id = format!("translocation_{}_{}", gene.id, location.compartment);
        let folded = format!("protein_{}_folded", gene.id);
        let source = if self.model.has_species(&folded) {
            folded
        } else {
            format!("protein_{}", gene.id)
        };
        let target = format!("protein_{}_{}", gene.id, location.compartment);
        self.model.add_species(&target, SpeciesKind::Protein);

        let mut reaction = ReactionDraft::new(&id, ReactionKind::Translocation, self.options.flux_bound);
        reaction.add_coefficient(&source, -1.0);
        reaction.add_coefficient(&target, 1.0);

        #[allow(clippy::cast_precision_loss)]
        let residues = gene.residue_count() as f64;
        let mut keff: Option<f64> = None;
        for pathway in &location.pathways {
            let Some(CurationEntry::TranslocationPathway(curated)) =
                registry.get(CurationKind::TranslocationPathway, pathway)
            else {
                self.note(
                    Importance::Medium,
                    &id,
                    format!("translocation pathway {pathway} is not curated"),
                    "curate translocation_pathway",
                );
                continue;
            };
            let scale = if curated.length_dependent { residues } else { 1.0 };
            for (met, coefficient) in &curated.stoichiometry {
                reaction.add_coefficient(&self.metabolite(met), coefficient * scale);
            }
            for enzyme in self.resolve_all(&curated.enzymes, &id) {
                reaction = reaction.with_catalyst(enzyme);
            }
            if let Some(value) = curated.keff {
                keff = Some(keff.map_or(value, |k: f64| k.min(value)));
            }
        }
        reaction = reaction.with_keff(Some(keff.unwrap_or(self.options.default_keff)));
        self.model.add_reaction(reaction);
    }

    /// mRNA turnover back to nucleotide monophosphates
    fn degrade(&mut self, gene: &GeneRecord) {
        let id = format!("degradation_{}", gene.id);
        let rna = format!("RNA_{}", gene.id);
        let composition = composition(gene);
        let bonds = (composition.iter().sum::<f64>() - 1.0).max(0.0);

        let mut reaction = ReactionDraft::new(&id, ReactionKind::Degradation, self.options.flux_bound)
            .with_keff(Some(self.options.default_keff));
        reaction.add_coefficient(&rna, -1.0);
        reaction.add_coefficient(&self.metabolite(H2O), -bonds);
        for (nmp, count) in NMPS.iter().zip(composition) {
            reaction.add_coefficient(&self.metabolite(nmp), count);
        }
        reaction.add_coefficient(&self.metabolite(PROTON), bonds);

        match self.degradosome() {
            Some(degradosome) => reaction = reaction.with_catalyst(degradosome),
            None => self.note(
                Importance::Medium,
                &id,
                format!("no RNA degradosome; RNA_{} is degraded uncatalysed", gene.id),
                "curate rna_degradosome",
            ),
        }
        self.model.add_reaction(reaction);
    }

    /// Stable RNAs are drained rather than degraded
    fn demand_stable_rna(&mut self, gene: &GeneRecord) {
        let rna = format!("RNA_{}", gene.id);
        self.model.add_reaction(
            ReactionDraft::new(format!("DM_{rna}"), ReactionKind::Demand, self.options.flux_bound)
                .with_stoichiometry(BTreeMap::from([(rna, -1.0)])),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{AssemblyOptions, ModelAssembler};
    use crate::core::organism::{MetabolicNetwork, NetworkReaction, OrganismInputs};
    use crate::core::types::Strand;
    use crate::curation::defaults::UmbrellaDefaults;
    use crate::curation::kinds::{
        ComplexSpec, RibosomeStoichSpec, SigmaFactorSpec, SpecialTrnaSpec, TrnaModificationSpec,
        TrnaModificationTargetSpec, TrnaSynthetaseSpec,
    };
    use crate::curation::registry::CurationRegistry;

    fn stoich(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(id, c)| ((*id).to_string(), *c)).collect()
    }

    fn inputs(genes: Vec<GeneRecord>, units: Vec<TranscriptionUnit>) -> OrganismInputs {
        OrganismInputs {
            id: "toy".to_string(),
            genes,
            transcription_units: units,
            network: MetabolicNetwork {
                id: "toy_m".to_string(),
                objective: "BIOMASS".to_string(),
                metabolites: Vec::new(),
                reactions: vec![NetworkReaction::new("BIOMASS", stoich(&[("atp_c", -1.0)]))],
                genes: Vec::new(),
            },
            subsystem_classification: BTreeMap::new(),
        }
    }

    fn registry(extra: Vec<CurationEntry>) -> CurationRegistry {
        let mut entries = vec![
            CurationEntry::RnaPolymerase(ComplexSpec {
                complex: "RNAP_core".to_string(),
                components: stoich(&[("g_rnap", 2.0)]),
            }),
            CurationEntry::SigmaFactor(SigmaFactorSpec {
                gene: "g_sig".to_string(),
                housekeeping: true,
            }),
            CurationEntry::SigmaFactor(SigmaFactorSpec {
                gene: "g_alt".to_string(),
                housekeeping: false,
            }),
            CurationEntry::RibosomeStoich(RibosomeStoichSpec {
                step: "30_S_assembly".to_string(),
                components: stoich(&[("g_rrn", 1.0)]),
            }),
        ];
        entries.extend(extra);
        let mut registry = CurationRegistry::from_entries("manual", entries).unwrap();
        UmbrellaDefaults::load_embedded().unwrap().fill(&mut registry);
        registry
    }

    fn base_genes() -> Vec<GeneRecord> {
        vec![
            GeneRecord::new("g_rnap", ProductType::Protein).with_coordinates(1, 300, Strand::Plus),
            GeneRecord::new("g_sig", ProductType::Protein).with_coordinates(1, 300, Strand::Plus),
            GeneRecord::new("g_alt", ProductType::Protein).with_coordinates(1, 300, Strand::Plus),
            GeneRecord::new("g_rrn", ProductType::Rrna).with_coordinates(1, 120, Strand::Plus),
        ]
    }

    fn build(registry: &CurationRegistry, inputs: &OrganismInputs) -> crate::assembly::Assembly {
        ModelAssembler::new(registry, AssemblyOptions::default())
            .build(inputs)
            .unwrap()
    }

    #[test]
    fn test_transcription_without_sequence() {
        let assembly = build(&registry(vec![]), &inputs(base_genes(), vec![]));
        let reaction = assembly.model.reaction("transcription_TU_g_rnap").unwrap();
        assert_eq!(reaction.stoichiometry["atp_c"], -75.0);
        assert_eq!(reaction.stoichiometry["utp_c"], -75.0);
        assert_eq!(reaction.stoichiometry["ppi_c"], 300.0);
        assert_eq!(reaction.stoichiometry["RNA_g_rnap"], 1.0);
        assert_eq!(reaction.catalysts, vec!["RNAP_g_sig".to_string()]);
        assert_eq!(reaction.keff, Some(65.0));
        assert_eq!(reaction.subreactions.len(), 3);
        assert!(reaction.subreactions.contains_key("Transcription_elongation_generic"));
    }

    #[test]
    fn test_unit_sigma_and_excision() {
        let mut genes = base_genes();
        genes.push(GeneRecord::new("g_trn", ProductType::Trna).with_sequence("GGGCCA"));
        let units = vec![
            TranscriptionUnit::new("TU_rrn", vec!["g_rrn".to_string(), "g_trn".to_string()])
                .with_sigma("g_alt"),
        ];
        let assembly = build(&registry(vec![]), &inputs(genes, units));
        let model = &assembly.model;

        let reaction = model.reaction("transcription_TU_rrn").unwrap();
        assert_eq!(reaction.catalysts, vec!["RNAP_g_alt".to_string()]);
        assert!(reaction.subreactions.contains_key("rrna_containing_excision"));
        assert_eq!(reaction.stoichiometry["RNA_g_rrn"], 1.0);
        assert_eq!(reaction.stoichiometry["RNA_g_trn"], 1.0);
        // 120 / 4 from the rRNA plus three from the tRNA sequence
        assert_eq!(reaction.stoichiometry["gtp_c"], -33.0);

        assert!(model.reaction("DM_RNA_g_trn").is_some());
        assert!(model.reaction("degradation_g_trn").is_none());
        assert!(model.reaction("transcription_TU_g_rrn").is_none());
    }

    #[test]
    fn test_unknown_unit_gene() {
        let units = vec![TranscriptionUnit::new("TU_x", vec!["g_nope".to_string()])];
        let registry = registry(vec![]);
        let result = ModelAssembler::new(&registry, AssemblyOptions::default())
            .build(&inputs(base_genes(), units));
        assert!(matches!(
            result,
            Err(AssemblyError::UnknownUnitGene { ref gene, .. }) if gene == "g_nope"
        ));
    }

    #[test]
    fn test_translation_with_sequence() {
        let mut genes = base_genes();
        // ATG GCT TGA GCC TAA
        genes.push(GeneRecord::new("g_seq", ProductType::Protein).with_sequence("ATGGCTTGAGCCTAA"));
        let registry = registry(vec![
            CurationEntry::TrnaSynthetase(TrnaSynthetaseSpec {
                residue: 'A',
                enzyme: "g_rnap".to_string(),
            }),
            CurationEntry::SpecialTrnaSubreaction(SpecialTrnaSpec {
                id: "fmet_addition".to_string(),
                residue: 'M',
                enzymes: vec![],
                stoichiometry: BTreeMap::new(),
            }),
        ]);
        let assembly = build(&registry, &inputs(genes, vec![]));
        let model = &assembly.model;

        let reaction = model.reaction("translation_g_seq").unwrap();
        assert_eq!(reaction.catalysts, vec![RIBOSOME.to_string(), "RNA_g_seq".to_string()]);
        // The sequence translates up to the first stop: M A
        assert_eq!(reaction.subreactions["Translation_elongation_generic"], 2.0);
        assert_eq!(reaction.subreactions["Translation_initiation_generic"], 1.0);
        assert_eq!(reaction.subreactions["fmet_addition"], 1.0);
        assert_eq!(reaction.subreactions["release_UAA"], 1.0);
        assert_eq!(reaction.stoichiometry["generic_tRNA_A"], -1.0);
        assert_eq!(reaction.stoichiometry["generic_tRNA_M"], -1.0);

        let charging = model.reaction("charging_tRNA_A").unwrap();
        assert_eq!(charging.catalysts, vec!["protein_g_rnap".to_string()]);
        assert_eq!(charging.stoichiometry["ala__L_c"], -1.0);
        let methionine = model.reaction("charging_tRNA_M").unwrap();
        assert_eq!(methionine.catalysts, vec![DUMMY_COMPLEX.to_string()]);
    }

    #[test]
    fn test_trna_modification() {
        let mut genes = base_genes();
        genes.push(GeneRecord::new("g_trn", ProductType::Trna).with_coordinates(1, 76, Strand::Plus));
        let registry = registry(vec![
            CurationEntry::TrnaModification(TrnaModificationSpec {
                id: "m1G_at_37".to_string(),
                enzymes: vec!["g_alt".to_string()],
                stoichiometry: stoich(&[("amet_c", -1.0), ("ahcys_c", 1.0)]),
                carriers: BTreeMap::new(),
            }),
            CurationEntry::TrnaModificationTarget(TrnaModificationTargetSpec {
                gene: "g_trn".to_string(),
                modifications: stoich(&[("m1G_at_37", 1.0), ("unknown_mod", 1.0)]),
            }),
        ]);
        let assembly = build(&registry, &inputs(genes, vec![]));
        let reaction = assembly.model.reaction("transcription_TU_g_trn").unwrap();
        assert_eq!(reaction.subreactions["m1G_at_37"], 1.0);
        assert!(!reaction.subreactions.contains_key("unknown_mod"));
        assert!(reaction.subreactions.contains_key("monocistronic_excision"));
        assert!(assembly.model.has_species("amet_c"));
        assert!(assembly.notes.iter().any(|n| n.msg.contains("unknown_mod")));
    }

    #[test]
    fn test_degradation() {
        let assembly = build(&registry(vec![]), &inputs(base_genes(), vec![]));
        let reaction = assembly.model.reaction("degradation_g_sig").unwrap();
        assert_eq!(reaction.stoichiometry["RNA_g_sig"], -1.0);
        assert_eq!(reaction.stoichiometry["h2o_c"], -299.0);
        assert_eq!(reaction.stoichiometry["amp_c"], 75.0);
        assert_eq!(reaction.stoichiometry["h_c"], 299.0);
        assert_eq!(reaction.catalysts, vec!["RNA_degradosome_generic".to_string()]);
    }
}
