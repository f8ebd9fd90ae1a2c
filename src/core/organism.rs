use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::gene::{GeneRecord, TranscriptionUnit};
use crate::curation::kinds::CurationEntry;
use crate::utils::validation::{
    check_record_limit, is_valid_identifier, MAX_GENES, MAX_REACTIONS,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Duplicate gene id in annotation: {0}")]
    DuplicateGene(String),

    #[error("Duplicate reaction id in metabolic network: {0}")]
    DuplicateReaction(String),

    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error(
        "Gene {gene} is named '{annotation}' in the annotation but '{network}' in the metabolic network"
    )]
    ConflictingName {
        gene: String,
        annotation: String,
        network: String,
    },

    #[error("Objective reaction '{0}' is not part of the metabolic network")]
    MissingObjective(String),

    #[error("{0}")]
    TooManyRecords(String),
}

fn default_upper_bound() -> f64 {
    1000.0
}

/// A metabolite of the metabolic network model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetabolite {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartment: Option<String>,
}

/// A reaction of the metabolic network model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReaction {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Metabolite id -> signed coefficient (negative for reactants)
    pub metabolites: BTreeMap<String, f64>,

    #[serde(default)]
    pub lower_bound: f64,

    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,

    /// Boolean gene-reaction rule; empty for orphan reactions
    #[serde(default)]
    pub gene_reaction_rule: String,

    /// Proceeds without enzymatic catalysis
    #[serde(default)]
    pub spontaneous: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
}

impl NetworkReaction {
    pub fn new(id: impl Into<String>, metabolites: BTreeMap<String, f64>) -> Self {
        Self {
            id: id.into(),
            name: None,
            metabolites,
            lower_bound: 0.0,
            upper_bound: default_upper_bound(),
            gene_reaction_rule: String::new(),
            spontaneous: false,
            subsystem: None,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.gene_reaction_rule = rule.into();
        self
    }

    #[must_use]
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.lower_bound < 0.0
    }

    /// Exchange-like reactions touch exactly one metabolite
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }
}

/// A gene as named by the metabolic network model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkGene {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Parsed metabolic network (M-model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetabolicNetwork {
    pub id: String,

    /// Identifier of the biomass (growth) reaction
    pub objective: String,

    #[serde(default)]
    pub metabolites: Vec<NetworkMetabolite>,

    pub reactions: Vec<NetworkReaction>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genes: Vec<NetworkGene>,
}

/// Kinetic class of a metabolic subsystem.
///
/// Catalysed reactions of a classified subsystem that have no curated keff
/// take the class keff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SubsystemClass {
    /// Central carbon and energy metabolism
    #[serde(rename = "central_CE")]
    CentralCe,
    /// Central amino acid, fatty acid and nucleotide metabolism
    #[serde(rename = "central_AFN")]
    CentralAfn,
    #[serde(rename = "intermediate")]
    Intermediate,
    #[serde(rename = "secondary")]
    Secondary,
    #[serde(rename = "other")]
    Other,
}

impl SubsystemClass {
    #[must_use]
    pub const fn keff(self) -> f64 {
        match self {
            Self::CentralCe => 79.0,
            Self::CentralAfn => 18.0,
            Self::Intermediate => 5.2,
            Self::Secondary => 2.5,
            Self::Other => 65.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CentralCe => "central_CE",
            Self::CentralAfn => "central_AFN",
            Self::Intermediate => "intermediate",
            Self::Secondary => "secondary",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for SubsystemClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Already-parsed raw inputs for one organism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismInputs {
    pub id: String,

    /// Genome annotation
    pub genes: Vec<GeneRecord>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transcription_units: Vec<TranscriptionUnit>,

    pub network: MetabolicNetwork,

    /// Subsystem name -> kinetic class
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subsystem_classification: BTreeMap<String, SubsystemClass>,
}

impl OrganismInputs {
    /// Check the inputs for duplicate ids and for genes that the annotation and
    /// the metabolic network name differently.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputError`] found.
    pub fn validate(&self) -> Result<(), InputError> {
        if let Some(msg) = check_record_limit(self.genes.len(), MAX_GENES + 1, "genes") {
            return Err(InputError::TooManyRecords(msg));
        }
        if let Some(msg) =
            check_record_limit(self.network.reactions.len(), MAX_REACTIONS + 1, "reactions")
        {
            return Err(InputError::TooManyRecords(msg));
        }

        let mut names: HashMap<&str, Option<&str>> = HashMap::with_capacity(self.genes.len());
        for gene in &self.genes {
            if !is_valid_identifier(&gene.id) {
                return Err(InputError::InvalidIdentifier(gene.id.clone()));
            }
            if names.insert(&gene.id, gene.name.as_deref()).is_some() {
                return Err(InputError::DuplicateGene(gene.id.clone()));
            }
        }

        let mut reaction_ids: HashSet<&str> = HashSet::with_capacity(self.network.reactions.len());
        for reaction in &self.network.reactions {
            if !is_valid_identifier(&reaction.id) {
                return Err(InputError::InvalidIdentifier(reaction.id.clone()));
            }
            if !reaction_ids.insert(&reaction.id) {
                return Err(InputError::DuplicateReaction(reaction.id.clone()));
            }
        }
        if !reaction_ids.contains(self.network.objective.as_str()) {
            return Err(InputError::MissingObjective(self.network.objective.clone()));
        }

        // A gene named one way by the annotation and another by the network
        // means the two sources disagree on which product the id refers to
        for network_gene in &self.network.genes {
            let (Some(Some(annotated)), Some(named)) = (
                names.get(network_gene.id.as_str()),
                network_gene.name.as_deref(),
            ) else {
                continue;
            };
            if !annotated.eq_ignore_ascii_case(named) {
                return Err(InputError::ConflictingName {
                    gene: network_gene.id.clone(),
                    annotation: (*annotated).to_string(),
                    network: named.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Look up an annotated gene
    #[must_use]
    pub fn gene(&self, id: &str) -> Option<&GeneRecord> {
        self.genes.iter().find(|g| g.id == id)
    }

    /// Class of the subsystem a network reaction belongs to, if classified
    #[must_use]
    pub fn subsystem_class(&self, reaction: &NetworkReaction) -> Option<SubsystemClass> {
        let subsystem = reaction.subsystem.as_deref()?;
        self.subsystem_classification.get(subsystem).copied()
    }
}

/// A reference organism whose curation can be borrowed through homology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceOrganism {
    pub id: String,

    /// Gene ids of the reference genome
    pub genes: Vec<String>,

    /// Curated entries of the reference organism
    pub curation: Vec<CurationEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ProductType;

    fn inputs() -> OrganismInputs {
        OrganismInputs {
            id: "toy".to_string(),
            genes: vec![
                GeneRecord::new("g1", ProductType::Protein).with_name("glk"),
                GeneRecord::new("g2", ProductType::Protein),
            ],
            transcription_units: Vec::new(),
            network: MetabolicNetwork {
                id: "toy_m".to_string(),
                objective: "BIOMASS".to_string(),
                metabolites: Vec::new(),
                reactions: vec![
                    NetworkReaction::new("BIOMASS", BTreeMap::from([("g6p_c".to_string(), -1.0)])),
                    NetworkReaction::new(
                        "GLCK",
                        BTreeMap::from([("glc__D_c".to_string(), -1.0), ("g6p_c".to_string(), 1.0)]),
                    )
                    .with_rule("g1"),
                ],
                genes: vec![NetworkGene {
                    id: "g1".to_string(),
                    name: Some("GLK".to_string()),
                }],
            },
            subsystem_classification: BTreeMap::new(),
        }
    }

    #[test]
    fn test_valid_inputs() {
        assert!(inputs().validate().is_ok());
    }

    #[test]
    fn test_duplicate_gene() {
        let mut inputs = inputs();
        inputs
            .genes
            .push(GeneRecord::new("g1", ProductType::Protein));
        assert_eq!(
            inputs.validate(),
            Err(InputError::DuplicateGene("g1".to_string()))
        );
    }

    #[test]
    fn test_conflicting_name() {
        let mut inputs = inputs();
        inputs.network.genes[0].name = Some("hxk".to_string());
        assert!(matches!(
            inputs.validate(),
            Err(InputError::ConflictingName { ref gene, .. }) if gene == "g1"
        ));
    }

    #[test]
    fn test_missing_objective() {
        let mut inputs = inputs();
        inputs.network.objective = "GROWTH".to_string();
        assert!(matches!(
            inputs.validate(),
            Err(InputError::MissingObjective(_))
        ));
    }

    #[test]
    fn test_gene_limit_is_inclusive() {
        let mut inputs = inputs();
        inputs.genes = (0..MAX_GENES)
            .map(|i| GeneRecord::new(format!("g{i}"), ProductType::Protein))
            .collect();
        assert!(inputs.validate().is_ok());

        inputs
            .genes
            .push(GeneRecord::new("g_extra", ProductType::Protein));
        assert!(matches!(
            inputs.validate(),
            Err(InputError::TooManyRecords(_))
        ));
    }

    #[test]
    fn test_subsystem_class() {
        let json = r#"{"Glycolysis/Gluconeogenesis": "central_CE", "Cofactor biosynthesis": "secondary"}"#;
        let mut inputs = inputs();
        inputs.subsystem_classification = serde_json::from_str(json).unwrap();

        let glycolysis = NetworkReaction::new("PGI", BTreeMap::new()).with_subsystem("Glycolysis/Gluconeogenesis");
        assert_eq!(inputs.subsystem_class(&glycolysis), Some(SubsystemClass::CentralCe));
        assert_eq!(SubsystemClass::CentralCe.keff(), 79.0);

        let unclassified = NetworkReaction::new("X", BTreeMap::new()).with_subsystem("Transport");
        assert_eq!(inputs.subsystem_class(&unclassified), None);
        assert_eq!(inputs.subsystem_class(&NetworkReaction::new("Y", BTreeMap::new())), None);

        assert!(serde_json::from_str::<SubsystemClass>(r#""central""#).is_err());
    }

    #[test]
    fn test_reaction_defaults_from_json() {
        let json = r#"{"id": "PGI", "metabolites": {"g6p_c": -1, "f6p_c": 1}}"#;
        let reaction: NetworkReaction = serde_json::from_str(json).unwrap();
        assert!((reaction.upper_bound - 1000.0).abs() < f64::EPSILON);
        assert!(!reaction.is_reversible());
        assert!(reaction.gene_reaction_rule.is_empty());
    }
}
