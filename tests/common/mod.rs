//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use me_builder::core::organism::{OrganismInputs, ReferenceOrganism};
use me_builder::curation::kinds::{CurationEntry, CurationKind};
use me_builder::homology::HomologyMatch;
use me_builder::parsing::homology::parse_homology_file;
use me_builder::parsing::json::{read_curation, read_organism, read_reference};

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Annotation and network with exchanges for every machinery metabolite
pub fn organism() -> OrganismInputs {
    read_organism(&data_path("organism.json")).unwrap()
}

/// Manual curation covering every required kind
pub fn curation() -> Vec<CurationEntry> {
    read_curation(&data_path("curation.json")).unwrap()
}

pub fn curation_without(kind: CurationKind) -> Vec<CurationEntry> {
    curation().into_iter().filter(|e| e.kind() != kind).collect()
}

pub fn reference() -> ReferenceOrganism {
    read_reference(&data_path("reference.json")).unwrap()
}

pub fn matches() -> Vec<HomologyMatch> {
    parse_homology_file(&data_path("rbh.tsv")).unwrap()
}

/// Glucokinase also consumes a cofactor nothing produces
pub fn cofactor_organism() -> OrganismInputs {
    let mut inputs = organism();
    let glck = inputs
        .network
        .reactions
        .iter_mut()
        .find(|r| r.id == "GLCK")
        .unwrap();
    glck.metabolites.insert("cofactor_c".to_string(), -1.0);
    inputs
}

/// The network names a gene differently from the annotation
pub fn conflicting_organism() -> OrganismInputs {
    let mut inputs = organism();
    inputs.network.genes[0].name = Some("pgi".to_string());
    inputs
}

/// Serialize a fixture into a scratch directory
pub fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}
