use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of curation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurationKind {
    ComplexStoichiometry,
    ComplexModification,
    RibosomeStoich,
    RibosomeSubreaction,
    RnaPolymerase,
    SigmaFactor,
    TranscriptionSubreaction,
    TranslationInitiation,
    TranslationElongation,
    TranslationTermination,
    PeptideReleaseFactor,
    TrnaSynthetase,
    SpecialTrnaSubreaction,
    TrnaModification,
    TrnaModificationTarget,
    RrnaModification,
    RnaDegradosome,
    ExcisionMachinery,
    SpecialModification,
    FoldingMechanism,
    TranslocationPathway,
    ProteinLocation,
    GenericComponent,
    ReactionKeff,
    MetaboliteMapping,
}

impl CurationKind {
    pub const ALL: [Self; 25] = [
        Self::ComplexStoichiometry,
        Self::ComplexModification,
        Self::RibosomeStoich,
        Self::RibosomeSubreaction,
        Self::RnaPolymerase,
        Self::SigmaFactor,
        Self::TranscriptionSubreaction,
        Self::TranslationInitiation,
        Self::TranslationElongation,
        Self::TranslationTermination,
        Self::PeptideReleaseFactor,
        Self::TrnaSynthetase,
        Self::SpecialTrnaSubreaction,
        Self::TrnaModification,
        Self::TrnaModificationTarget,
        Self::RrnaModification,
        Self::RnaDegradosome,
        Self::ExcisionMachinery,
        Self::SpecialModification,
        Self::FoldingMechanism,
        Self::TranslocationPathway,
        Self::ProteinLocation,
        Self::GenericComponent,
        Self::ReactionKeff,
        Self::MetaboliteMapping,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComplexStoichiometry => "complex_stoichiometry",
            Self::ComplexModification => "complex_modification",
            Self::RibosomeStoich => "ribosome_stoich",
            Self::RibosomeSubreaction => "ribosome_subreaction",
            Self::RnaPolymerase => "rna_polymerase",
            Self::SigmaFactor => "sigma_factor",
            Self::TranscriptionSubreaction => "transcription_subreaction",
            Self::TranslationInitiation => "translation_initiation",
            Self::TranslationElongation => "translation_elongation",
            Self::TranslationTermination => "translation_termination",
            Self::PeptideReleaseFactor => "peptide_release_factor",
            Self::TrnaSynthetase => "trna_synthetase",
            Self::SpecialTrnaSubreaction => "special_trna_subreaction",
            Self::TrnaModification => "trna_modification",
            Self::TrnaModificationTarget => "trna_modification_target",
            Self::RrnaModification => "rrna_modification",
            Self::RnaDegradosome => "rna_degradosome",
            Self::ExcisionMachinery => "excision_machinery",
            Self::SpecialModification => "special_modification",
            Self::FoldingMechanism => "folding_mechanism",
            Self::TranslocationPathway => "translocation_pathway",
            Self::ProteinLocation => "protein_location",
            Self::GenericComponent => "generic_component",
            Self::ReactionKeff => "reaction_keff",
            Self::MetaboliteMapping => "metabolite_mapping",
        }
    }

    /// What the primary key of this kind identifies
    #[must_use]
    pub fn key_description(self) -> &'static str {
        match self {
            Self::ComplexStoichiometry | Self::RnaPolymerase | Self::RnaDegradosome => "complex id",
            Self::ComplexModification => "modified complex id",
            Self::RibosomeStoich => "assembly step",
            Self::SigmaFactor | Self::TrnaModificationTarget | Self::ProteinLocation => "gene id",
            Self::PeptideReleaseFactor => "stop codon",
            Self::TrnaSynthetase => "amino acid",
            Self::ExcisionMachinery => "excision mechanism",
            Self::FoldingMechanism => "folding mechanism",
            Self::TranslocationPathway => "pathway id",
            Self::GenericComponent => "generic id",
            Self::ReactionKeff => "reaction[@complex]",
            Self::MetaboliteMapping => "network metabolite id",
            Self::RibosomeSubreaction
            | Self::TranscriptionSubreaction
            | Self::TranslationInitiation
            | Self::TranslationElongation
            | Self::TranslationTermination
            | Self::SpecialTrnaSubreaction
            | Self::TrnaModification
            | Self::RrnaModification
            | Self::SpecialModification => "subreaction id",
        }
    }

    /// Kinds keyed by an organism gene id
    #[must_use]
    pub fn is_gene_keyed(self) -> bool {
        matches!(
            self,
            Self::SigmaFactor | Self::TrnaModificationTarget | Self::ProteinLocation
        )
    }

    /// Organism-specific kinds are never borrowed from a reference organism
    #[must_use]
    pub fn is_borrowable(self) -> bool {
        !matches!(self, Self::ReactionKeff | Self::MetaboliteMapping)
    }
}

impl std::fmt::Display for CurationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CurationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown curation kind '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionStage {
    Initiation,
    Elongation,
    Termination,
}

impl TranscriptionStage {
    pub const ALL: [Self; 3] = [Self::Initiation, Self::Elongation, Self::Termination];
}

/// How a primary transcript is processed into mature RNAs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcisionMechanism {
    RrnaContaining,
    Monocistronic,
    Polycistronic,
}

impl std::fmt::Display for ExcisionMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RrnaContaining => write!(f, "rrna_containing"),
            Self::Monocistronic => write!(f, "monocistronic"),
            Self::Polycistronic => write!(f, "polycistronic"),
        }
    }
}

/// A complex assembled from components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexSpec {
    pub complex: String,
    /// Gene, complex or metabolite id -> copies
    pub components: BTreeMap<String, f64>,
}

/// A machinery step: catalysing enzymes plus metabolite stoichiometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubreactionSpec {
    pub id: String,
    #[serde(default)]
    pub enzymes: Vec<String>,
    #[serde(default)]
    pub stoichiometry: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexModificationSpec {
    pub complex: String,
    pub core: String,
    /// Metabolite, complex or special modification id -> copies
    pub modifications: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RibosomeStoichSpec {
    pub step: String,
    pub components: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SigmaFactorSpec {
    pub gene: String,
    #[serde(default)]
    pub housekeeping: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSubreactionSpec {
    pub id: String,
    pub stage: TranscriptionStage,
    #[serde(default)]
    pub enzymes: Vec<String>,
    #[serde(default)]
    pub stoichiometry: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseFactorSpec {
    /// Stop codon in RNA alphabet
    pub codon: String,
    pub enzyme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrnaSynthetaseSpec {
    /// One-letter amino acid code
    pub residue: char,
    pub enzyme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialTrnaSpec {
    pub id: String,
    /// Residue whose incorporation needs this step, e.g. `U` for selenocysteine
    pub residue: char,
    #[serde(default)]
    pub enzymes: Vec<String>,
    #[serde(default)]
    pub stoichiometry: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrnaModificationSpec {
    pub id: String,
    #[serde(default)]
    pub enzymes: Vec<String>,
    #[serde(default)]
    pub stoichiometry: BTreeMap<String, f64>,
    /// Carrier species consumed alongside the enzymes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub carriers: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrnaModificationTargetSpec {
    pub gene: String,
    /// tRNA modification id -> number of sites
    pub modifications: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcisionSpec {
    pub mechanism: ExcisionMechanism,
    #[serde(default)]
    pub enzymes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldingSpec {
    pub mechanism: String,
    #[serde(default)]
    pub enzymes: Vec<String>,
    /// Genes whose products need this mechanism to fold
    pub clients: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keff: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslocationSpec {
    pub pathway: String,
    #[serde(default)]
    pub enzymes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keff: Option<f64>,
    /// Energy stoichiometry scales with the residue count
    #[serde(default)]
    pub length_dependent: bool,
    #[serde(default)]
    pub stoichiometry: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinLocationSpec {
    pub gene: String,
    pub compartment: String,
    #[serde(default)]
    pub pathways: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericSpec {
    pub generic: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionKeffSpec {
    /// Metabolic network reaction id
    pub reaction: String,
    /// Restrict to the isozyme catalysed by this complex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex: Option<String>,
    pub keff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaboliteMappingSpec {
    pub metabolite: String,
    /// Replacement ME metabolite; `None` removes the metabolite everywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maps_to: Option<String>,
}

/// One typed curation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurationEntry {
    ComplexStoichiometry(ComplexSpec),
    ComplexModification(ComplexModificationSpec),
    RibosomeStoich(RibosomeStoichSpec),
    RibosomeSubreaction(SubreactionSpec),
    RnaPolymerase(ComplexSpec),
    SigmaFactor(SigmaFactorSpec),
    TranscriptionSubreaction(TranscriptionSubreactionSpec),
    TranslationInitiation(SubreactionSpec),
    TranslationElongation(SubreactionSpec),
    TranslationTermination(SubreactionSpec),
    PeptideReleaseFactor(ReleaseFactorSpec),
    TrnaSynthetase(TrnaSynthetaseSpec),
    SpecialTrnaSubreaction(SpecialTrnaSpec),
    TrnaModification(TrnaModificationSpec),
    TrnaModificationTarget(TrnaModificationTargetSpec),
    RrnaModification(SubreactionSpec),
    RnaDegradosome(ComplexSpec),
    ExcisionMachinery(ExcisionSpec),
    SpecialModification(SubreactionSpec),
    FoldingMechanism(FoldingSpec),
    TranslocationPathway(TranslocationSpec),
    ProteinLocation(ProteinLocationSpec),
    GenericComponent(GenericSpec),
    ReactionKeff(ReactionKeffSpec),
    MetaboliteMapping(MetaboliteMappingSpec),
}

/// What a referenced identifier must resolve to in the assembled model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefRole {
    /// An annotated gene
    Gene,
    /// A gene or any indexed species
    Component,
    /// An indexed species
    Species,
    /// A metabolite, inserted on demand during assembly
    Metabolite,
    /// A species or a special modification entry
    Modification,
    /// A network reaction
    Reaction,
    /// An entry of the given kind in the registry
    Entry(CurationKind),
}

/// An identifier referenced by a curation entry
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub role: RefRole,
}

impl EntityRef {
    fn new(id: &str, role: RefRole) -> Self {
        Self {
            id: id.to_string(),
            role,
        }
    }
}

/// Rewrites reference-organism gene ids into organism gene ids.
///
/// Ids that are not reference genes (complexes, metabolites) pass through
/// unchanged. Reference genes without an organism counterpart are dropped.
pub struct GeneRewriter<'a> {
    reference_genes: &'a HashSet<String>,
    mapping: &'a BTreeMap<String, String>,
    seen: usize,
    dropped: Vec<String>,
}

impl<'a> GeneRewriter<'a> {
    pub fn new(
        reference_genes: &'a HashSet<String>,
        mapping: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            reference_genes,
            mapping,
            seen: 0,
            dropped: Vec::new(),
        }
    }

    fn id(&mut self, id: &str) -> Option<String> {
        if !self.reference_genes.contains(id) {
            return Some(id.to_string());
        }
        self.seen += 1;
        let mapped = self.mapping.get(id).cloned();
        if mapped.is_none() {
            self.dropped.push(id.to_string());
        }
        mapped
    }

    fn list(&mut self, ids: &[String]) -> Vec<String> {
        ids.iter().filter_map(|id| self.id(id)).collect()
    }

    fn map(&mut self, map: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
        let mut rewritten = BTreeMap::new();
        for (id, coefficient) in map {
            if let Some(new_id) = self.id(id) {
                *rewritten.entry(new_id).or_insert(0.0) += coefficient;
            }
        }
        rewritten
    }

    fn subreaction(&mut self, template: &SubreactionSpec) -> SubreactionSpec {
        SubreactionSpec {
            id: template.id.clone(),
            enzymes: self.list(&template.enzymes),
            stoichiometry: template.stoichiometry.clone(),
        }
    }

    fn complex(&mut self, template: &ComplexSpec) -> ComplexSpec {
        ComplexSpec {
            complex: template.complex.clone(),
            components: self.map(&template.components),
        }
    }

    /// Whether the rewritten entry is worth keeping
    #[must_use]
    pub fn keeps_entry(&self) -> bool {
        self.seen == 0 || self.dropped.len() < self.seen
    }

    /// Reference genes dropped so far
    #[must_use]
    pub fn dropped(&self) -> &[String] {
        &self.dropped
    }
}

impl CurationEntry {
    #[must_use]
    pub fn kind(&self) -> CurationKind {
        match self {
            Self::ComplexStoichiometry(_) => CurationKind::ComplexStoichiometry,
            Self::ComplexModification(_) => CurationKind::ComplexModification,
            Self::RibosomeStoich(_) => CurationKind::RibosomeStoich,
            Self::RibosomeSubreaction(_) => CurationKind::RibosomeSubreaction,
            Self::RnaPolymerase(_) => CurationKind::RnaPolymerase,
            Self::SigmaFactor(_) => CurationKind::SigmaFactor,
            Self::TranscriptionSubreaction(_) => CurationKind::TranscriptionSubreaction,
            Self::TranslationInitiation(_) => CurationKind::TranslationInitiation,
            Self::TranslationElongation(_) => CurationKind::TranslationElongation,
            Self::TranslationTermination(_) => CurationKind::TranslationTermination,
            Self::PeptideReleaseFactor(_) => CurationKind::PeptideReleaseFactor,
            Self::TrnaSynthetase(_) => CurationKind::TrnaSynthetase,
            Self::SpecialTrnaSubreaction(_) => CurationKind::SpecialTrnaSubreaction,
            Self::TrnaModification(_) => CurationKind::TrnaModification,
            Self::TrnaModificationTarget(_) => CurationKind::TrnaModificationTarget,
            Self::RrnaModification(_) => CurationKind::RrnaModification,
            Self::RnaDegradosome(_) => CurationKind::RnaDegradosome,
            Self::ExcisionMachinery(_) => CurationKind::ExcisionMachinery,
            Self::SpecialModification(_) => CurationKind::SpecialModification,
            Self::FoldingMechanism(_) => CurationKind::FoldingMechanism,
            Self::TranslocationPathway(_) => CurationKind::TranslocationPathway,
            Self::ProteinLocation(_) => CurationKind::ProteinLocation,
            Self::GenericComponent(_) => CurationKind::GenericComponent,
            Self::ReactionKeff(_) => CurationKind::ReactionKeff,
            Self::MetaboliteMapping(_) => CurationKind::MetaboliteMapping,
        }
    }

    /// Primary key within the entry's kind
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::ComplexStoichiometry(s) | Self::RnaPolymerase(s) | Self::RnaDegradosome(s) => {
                s.complex.clone()
            }
            Self::ComplexModification(s) => s.complex.clone(),
            Self::RibosomeStoich(s) => s.step.clone(),
            Self::RibosomeSubreaction(s)
            | Self::TranslationInitiation(s)
            | Self::TranslationElongation(s)
            | Self::TranslationTermination(s)
            | Self::RrnaModification(s)
            | Self::SpecialModification(s) => s.id.clone(),
            Self::SigmaFactor(s) => s.gene.clone(),
            Self::TranscriptionSubreaction(s) => s.id.clone(),
            Self::PeptideReleaseFactor(s) => s.codon.to_ascii_uppercase(),
            Self::TrnaSynthetase(s) => s.residue.to_ascii_uppercase().to_string(),
            Self::SpecialTrnaSubreaction(s) => s.id.clone(),
            Self::TrnaModification(s) => s.id.clone(),
            Self::TrnaModificationTarget(s) => s.gene.clone(),
            Self::ExcisionMachinery(s) => s.mechanism.to_string(),
            Self::FoldingMechanism(s) => s.mechanism.clone(),
            Self::TranslocationPathway(s) => s.pathway.clone(),
            Self::ProteinLocation(s) => s.gene.clone(),
            Self::GenericComponent(s) => s.generic.clone(),
            Self::ReactionKeff(s) => match &s.complex {
                Some(complex) => format!("{}@{complex}", s.reaction),
                None => s.reaction.clone(),
            },
            Self::MetaboliteMapping(s) => s.metabolite.clone(),
        }
    }

    /// The role this entry plays in the model.
    ///
    /// Kinds that describe a single piece of machinery (the polymerase core,
    /// the degradosome, each transcription stage, each translation step) hold
    /// one slot regardless of key. Umbrella defaults only fill empty slots.
    #[must_use]
    pub fn slot(&self) -> String {
        match self {
            Self::RnaPolymerase(_)
            | Self::RnaDegradosome(_)
            | Self::TranslationInitiation(_)
            | Self::TranslationElongation(_)
            | Self::TranslationTermination(_) => "default".to_string(),
            Self::TranscriptionSubreaction(s) => format!("{:?}", s.stage),
            _ => self.key(),
        }
    }

    /// Identifiers this entry references, with what each must resolve to
    #[must_use]
    pub fn references(&self) -> Vec<EntityRef> {
        let mut refs = Vec::new();
        let components = |refs: &mut Vec<EntityRef>, map: &BTreeMap<String, f64>| {
            refs.extend(map.keys().map(|id| EntityRef::new(id, RefRole::Component)));
        };
        let enzymes = |refs: &mut Vec<EntityRef>, ids: &[String]| {
            refs.extend(ids.iter().map(|id| EntityRef::new(id, RefRole::Component)));
        };
        let metabolites = |refs: &mut Vec<EntityRef>, map: &BTreeMap<String, f64>| {
            refs.extend(map.keys().map(|id| EntityRef::new(id, RefRole::Metabolite)));
        };

        match self {
            Self::ComplexStoichiometry(s) | Self::RnaPolymerase(s) | Self::RnaDegradosome(s) => {
                components(&mut refs, &s.components);
            }
            Self::ComplexModification(s) => {
                refs.push(EntityRef::new(&s.core, RefRole::Species));
                refs.extend(
                    s.modifications
                        .keys()
                        .map(|id| EntityRef::new(id, RefRole::Modification)),
                );
            }
            Self::RibosomeStoich(s) => components(&mut refs, &s.components),
            Self::RibosomeSubreaction(s)
            | Self::TranslationInitiation(s)
            | Self::TranslationElongation(s)
            | Self::TranslationTermination(s)
            | Self::RrnaModification(s)
            | Self::SpecialModification(s) => {
                enzymes(&mut refs, &s.enzymes);
                metabolites(&mut refs, &s.stoichiometry);
            }
            Self::SigmaFactor(s) => refs.push(EntityRef::new(&s.gene, RefRole::Gene)),
            Self::TranscriptionSubreaction(s) => {
                enzymes(&mut refs, &s.enzymes);
                metabolites(&mut refs, &s.stoichiometry);
            }
            Self::PeptideReleaseFactor(s) => refs.push(EntityRef::new(&s.enzyme, RefRole::Component)),
            Self::TrnaSynthetase(s) => refs.push(EntityRef::new(&s.enzyme, RefRole::Component)),
            Self::SpecialTrnaSubreaction(s) => {
                enzymes(&mut refs, &s.enzymes);
                metabolites(&mut refs, &s.stoichiometry);
            }
            Self::TrnaModification(s) => {
                enzymes(&mut refs, &s.enzymes);
                metabolites(&mut refs, &s.stoichiometry);
                components(&mut refs, &s.carriers);
            }
            Self::TrnaModificationTarget(s) => {
                refs.push(EntityRef::new(&s.gene, RefRole::Gene));
                refs.extend(s.modifications.keys().map(|id| {
                    EntityRef::new(id, RefRole::Entry(CurationKind::TrnaModification))
                }));
            }
            Self::ExcisionMachinery(s) => enzymes(&mut refs, &s.enzymes),
            Self::FoldingMechanism(s) => {
                enzymes(&mut refs, &s.enzymes);
                refs.extend(s.clients.iter().map(|id| EntityRef::new(id, RefRole::Gene)));
            }
            Self::TranslocationPathway(s) => {
                enzymes(&mut refs, &s.enzymes);
                metabolites(&mut refs, &s.stoichiometry);
            }
            Self::ProteinLocation(s) => {
                refs.push(EntityRef::new(&s.gene, RefRole::Gene));
                refs.extend(s.pathways.iter().map(|id| {
                    EntityRef::new(id, RefRole::Entry(CurationKind::TranslocationPathway))
                }));
            }
            Self::GenericComponent(s) => enzymes(&mut refs, &s.members),
            Self::ReactionKeff(s) => {
                refs.push(EntityRef::new(&s.reaction, RefRole::Reaction));
                if let Some(complex) = &s.complex {
                    refs.push(EntityRef::new(complex, RefRole::Species));
                }
            }
            Self::MetaboliteMapping(s) => {
                if let Some(target) = &s.maps_to {
                    refs.push(EntityRef::new(target, RefRole::Metabolite));
                }
            }
        }

        refs
    }

    /// Copy of a gene-keyed entry keyed by another gene
    #[must_use]
    pub fn with_gene_key(&self, gene: &str) -> Option<Self> {
        match self {
            Self::SigmaFactor(s) => Some(Self::SigmaFactor(SigmaFactorSpec {
                gene: gene.to_string(),
                ..s.clone()
            })),
            Self::TrnaModificationTarget(s) => {
                Some(Self::TrnaModificationTarget(TrnaModificationTargetSpec {
                    gene: gene.to_string(),
                    ..s.clone()
                }))
            }
            Self::ProteinLocation(s) => Some(Self::ProteinLocation(ProteinLocationSpec {
                gene: gene.to_string(),
                ..s.clone()
            })),
            _ => None,
        }
    }

    /// Copy of a machinery entry with its gene references rewritten
    #[must_use]
    pub fn rewrite_genes(&self, rw: &mut GeneRewriter<'_>) -> Self {
        match self {
            Self::ComplexStoichiometry(s) => Self::ComplexStoichiometry(rw.complex(s)),
            Self::RnaPolymerase(s) => Self::RnaPolymerase(rw.complex(s)),
            Self::RnaDegradosome(s) => Self::RnaDegradosome(rw.complex(s)),
            Self::ComplexModification(s) => Self::ComplexModification(ComplexModificationSpec {
                complex: s.complex.clone(),
                core: s.core.clone(),
                modifications: rw.map(&s.modifications),
            }),
            Self::RibosomeStoich(s) => Self::RibosomeStoich(RibosomeStoichSpec {
                step: s.step.clone(),
                components: rw.map(&s.components),
            }),
            Self::RibosomeSubreaction(s) => Self::RibosomeSubreaction(rw.subreaction(s)),
            Self::TranslationInitiation(s) => Self::TranslationInitiation(rw.subreaction(s)),
            Self::TranslationElongation(s) => Self::TranslationElongation(rw.subreaction(s)),
            Self::TranslationTermination(s) => Self::TranslationTermination(rw.subreaction(s)),
            Self::RrnaModification(s) => Self::RrnaModification(rw.subreaction(s)),
            Self::SpecialModification(s) => Self::SpecialModification(rw.subreaction(s)),
            Self::TranscriptionSubreaction(s) => {
                Self::TranscriptionSubreaction(TranscriptionSubreactionSpec {
                    enzymes: rw.list(&s.enzymes),
                    ..s.clone()
                })
            }
            Self::PeptideReleaseFactor(s) => match rw.id(&s.enzyme) {
                Some(enzyme) => Self::PeptideReleaseFactor(ReleaseFactorSpec {
                    codon: s.codon.clone(),
                    enzyme,
                }),
                None => self.clone(),
            },
            Self::TrnaSynthetase(s) => match rw.id(&s.enzyme) {
                Some(enzyme) => Self::TrnaSynthetase(TrnaSynthetaseSpec {
                    residue: s.residue,
                    enzyme,
                }),
                None => self.clone(),
            },
            Self::SpecialTrnaSubreaction(s) => Self::SpecialTrnaSubreaction(SpecialTrnaSpec {
                enzymes: rw.list(&s.enzymes),
                ..s.clone()
            }),
            Self::TrnaModification(s) => Self::TrnaModification(TrnaModificationSpec {
                enzymes: rw.list(&s.enzymes),
                carriers: rw.map(&s.carriers),
                ..s.clone()
            }),
            Self::ExcisionMachinery(s) => Self::ExcisionMachinery(ExcisionSpec {
                mechanism: s.mechanism,
                enzymes: rw.list(&s.enzymes),
            }),
            Self::FoldingMechanism(s) => Self::FoldingMechanism(FoldingSpec {
                enzymes: rw.list(&s.enzymes),
                clients: rw.list(&s.clients),
                ..s.clone()
            }),
            Self::TranslocationPathway(s) => Self::TranslocationPathway(TranslocationSpec {
                enzymes: rw.list(&s.enzymes),
                ..s.clone()
            }),
            Self::GenericComponent(s) => Self::GenericComponent(GenericSpec {
                generic: s.generic.clone(),
                members: rw.list(&s.members),
            }),
            Self::SigmaFactor(_)
            | Self::TrnaModificationTarget(_)
            | Self::ProteinLocation(_)
            | Self::ReactionKeff(_)
            | Self::MetaboliteMapping(_) => self.clone(),
        }
    }
}
