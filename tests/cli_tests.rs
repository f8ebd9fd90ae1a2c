//! Command-line behaviour of the `me-builder` binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use me_builder::curation::kinds::CurationKind;

use common::{cofactor_organism, conflicting_organism, curation_without, data_path, write_json};

fn me_builder() -> Command {
    Command::cargo_bin("me-builder").unwrap()
}

#[test]
fn test_kinds_lists_every_curation_table() {
    let output = me_builder()
        .args(["kinds", "--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ribosome_stoich"))
        .stdout(predicate::str::contains("reaction_keff"))
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8(output).unwrap();
    assert_eq!(stdout.lines().count(), CurationKind::ALL.len() + 1);
}

#[test]
fn test_kinds_with_defaults_json() {
    let output = me_builder()
        .args(["kinds", "--with-defaults", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let kinds: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let kinds = kinds.as_array().unwrap();
    assert!(!kinds.is_empty());
    assert!(kinds.iter().all(|k| k["defaults"].as_u64().unwrap() > 0));
    assert!(kinds.iter().any(|k| k["kind"] == "rna_polymerase"));
}

#[test]
fn test_check_reports_manual_curation() {
    let output = me_builder()
        .arg("check")
        .arg(data_path("organism.json"))
        .arg("-c")
        .arg(data_path("curation.json"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["organism"], "toy");
    let ribosome = summary["curation"]
        .as_array()
        .unwrap()
        .iter()
        .find(|k| k["kind"] == "ribosome_stoich")
        .unwrap();
    assert_eq!(ribosome["manual"], 1);
    assert_eq!(ribosome["homology"], 0);
}

#[test]
fn test_build_writes_model_and_notes() {
    let dir = TempDir::new().unwrap();
    let model = dir.path().join("model.json.gz");
    let notes = dir.path().join("notes.txt");

    me_builder()
        .arg("build")
        .arg(data_path("organism.json"))
        .arg("-c")
        .arg(data_path("curation.json"))
        .arg("--config")
        .arg(data_path("config.json"))
        .arg("-o")
        .arg(&model)
        .arg("--notes")
        .arg(&notes)
        .assert()
        .success()
        .stdout(predicate::str::contains("Feasible without troubleshooting"))
        .stdout(predicate::str::contains("Signature:"));

    let written = me_builder::parsing::json::read_text(&model).unwrap();
    let written: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert!(written["signature"].is_string());
    assert_eq!(written["model"]["id"], "toy");

    let notes = std::fs::read_to_string(&notes).unwrap();
    assert!(notes.contains("=== Curation notes"));
    assert!(notes.contains("umbrella defaults"));
}

#[test]
fn test_build_borrows_through_homology() {
    let dir = TempDir::new().unwrap();
    let curation = write_json(
        dir.path(),
        "curation.json",
        &curation_without(CurationKind::RibosomeStoich),
    );

    let output = me_builder()
        .arg("build")
        .arg(data_path("organism.json"))
        .arg("-c")
        .arg(&curation)
        .arg("--homology")
        .arg(data_path("rbh.tsv"))
        .arg("--reference")
        .arg(data_path("reference.json"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(summary["state"], "done");
    assert_eq!(summary["curation"]["ribosome_stoich"]["homology"], 1);
}

#[test]
fn test_homology_requires_reference() {
    me_builder()
        .arg("check")
        .arg(data_path("organism.json"))
        .arg("--homology")
        .arg(data_path("rbh.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--reference"));
}

#[test]
fn test_build_patch_log_as_tsv() {
    let dir = TempDir::new().unwrap();
    let organism = write_json(dir.path(), "organism.json", &cofactor_organism());
    let curation = write_json(
        dir.path(),
        "curation.json",
        &curation_without(CurationKind::ReactionKeff),
    );

    me_builder()
        .arg("build")
        .arg(&organism)
        .arg("-c")
        .arg(&curation)
        .args(["--format", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("iteration\tgap\ttarget\tpatch\tfeasible"))
        .stdout(predicate::str::contains("UnproducedMetabolite\tcofactor_c"))
        .stdout(predicate::str::contains("MissingKeff\tGLCK_FWD_ENZ1"));
}

#[test]
fn test_unresolved_build_fails_with_notes() {
    let dir = TempDir::new().unwrap();
    let organism = write_json(dir.path(), "organism.json", &cofactor_organism());
    let curation = write_json(
        dir.path(),
        "curation.json",
        &curation_without(CurationKind::ReactionKeff),
    );
    let notes = dir.path().join("notes.txt");

    me_builder()
        .arg("build")
        .arg(&organism)
        .arg("-c")
        .arg(&curation)
        .args(["--max-iterations", "1"])
        .arg("--notes")
        .arg(&notes)
        .assert()
        .failure()
        .stderr(predicate::str::contains("still infeasible"))
        .stderr(predicate::str::contains("Unresolved gaps"));

    let notes = std::fs::read_to_string(&notes).unwrap();
    assert!(notes.contains("SK_cofactor_c"));
}

#[test]
fn test_conflicting_gene_name_fails() {
    let dir = TempDir::new().unwrap();
    let organism = write_json(dir.path(), "organism.json", &conflicting_organism());

    me_builder()
        .arg("check")
        .arg(&organism)
        .arg("-c")
        .arg(data_path("curation.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("g_enz"))
        .stderr(predicate::str::contains("metabolic network"));
}

#[test]
fn test_invalid_config_override_fails() {
    me_builder()
        .arg("check")
        .arg(data_path("organism.json"))
        .arg("-c")
        .arg(data_path("curation.json"))
        .args(["--solver", "cplex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid builder configuration"));
}
