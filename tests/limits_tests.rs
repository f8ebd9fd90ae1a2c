//! Input limits and rejection of malformed records
//!
//! These tests feed oversized or malformed inputs through the public
//! readers and the builder and check that they are refused with a typed
//! error instead of being assembled.

mod common;

use me_builder::builder::{BuildError, BuilderConfig, MEBuilder};
use me_builder::core::gpr::{GeneRule, GprError, MAX_DNF_CLAUSES, MAX_GPR_DEPTH};
use me_builder::core::organism::InputError;
use me_builder::curation::registry::RegistryError;
use me_builder::parsing::homology::parse_homology_text;
use me_builder::parsing::ParseError;
use me_builder::utils::validation::{is_valid_identifier, MAX_IDENTIFIER_LENGTH};

use common::{curation, organism};

fn draft_error(inputs: &me_builder::OrganismInputs) -> BuildError {
    MEBuilder::new(BuilderConfig::default())
        .with_curation("curation.json", curation())
        .draft(inputs)
        .unwrap_err()
}

#[test]
fn test_identifier_length_limit() {
    let longest = "g".repeat(MAX_IDENTIFIER_LENGTH);
    assert!(is_valid_identifier(&longest));
    assert!(!is_valid_identifier(&format!("{longest}x")));

    let mut inputs = organism();
    inputs.genes[0].id = format!("{longest}x");
    assert!(matches!(
        draft_error(&inputs),
        BuildError::Input(InputError::InvalidIdentifier(_))
    ));
}

#[test]
fn test_identifier_with_whitespace_rejected() {
    let mut inputs = organism();
    inputs.network.reactions[0].id = "EX glc".to_string();
    assert!(matches!(
        draft_error(&inputs),
        BuildError::Input(InputError::InvalidIdentifier(id)) if id == "EX glc"
    ));
}

#[test]
fn test_duplicate_gene_rejected() {
    let mut inputs = organism();
    let copy = inputs.genes[0].clone();
    inputs.genes.push(copy);
    assert!(matches!(
        draft_error(&inputs),
        BuildError::Input(InputError::DuplicateGene(id)) if id == "g_enz"
    ));
}

#[test]
fn test_duplicate_reaction_rejected() {
    let mut inputs = organism();
    let copy = inputs.network.reactions[1].clone();
    inputs.network.reactions.push(copy);
    assert!(matches!(
        draft_error(&inputs),
        BuildError::Input(InputError::DuplicateReaction(id)) if id == "GLCK"
    ));
}

#[test]
fn test_duplicate_manual_key_rejected() {
    let mut entries = curation();
    entries.push(entries[0].clone());
    let err = MEBuilder::new(BuilderConfig::default())
        .with_curation("curation.json", entries)
        .draft(&organism())
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::Registry(RegistryError::DuplicateKey { key, .. }) if key == "ENZ1"
    ));
}

#[test]
fn test_gene_rule_clause_limit() {
    // Eleven two-way choices expand to 2048 clauses
    let rule = (0..11)
        .map(|i| format!("(a{i} or b{i})"))
        .collect::<Vec<_>>()
        .join(" and ");
    let parsed = GeneRule::parse(&rule).unwrap().unwrap();
    assert_eq!(parsed.to_dnf(), Err(GprError::TooComplex(MAX_DNF_CLAUSES)));
}

#[test]
fn test_gene_rule_nesting_limit() {
    let depth = 100_000;
    let rule = format!("{}g_enz{}", "(".repeat(depth), ")".repeat(depth));
    assert!(matches!(
        GeneRule::parse(&rule),
        Err(GprError::TooDeep { max: MAX_GPR_DEPTH, .. })
    ));

    let mut inputs = organism();
    inputs
        .network
        .reactions
        .iter_mut()
        .find(|r| r.id == "GLCK")
        .unwrap()
        .gene_reaction_rule = rule;

    // Lenient builds note the rule and keep going
    let lenient = MEBuilder::new(BuilderConfig::default())
        .with_curation("curation.json", curation())
        .draft(&inputs)
        .unwrap();
    assert!(lenient
        .report
        .notes()
        .iter()
        .any(|n| n.triggered_by == "GLCK"));

    let config = BuilderConfig {
        strict_gene_rules: true,
        ..BuilderConfig::default()
    };
    let err = MEBuilder::new(config)
        .with_curation("curation.json", curation())
        .draft(&inputs)
        .unwrap_err();
    assert!(matches!(err, BuildError::AmbiguousGeneRule { reaction, .. } if reaction == "GLCK"));
}

#[test]
fn test_homology_rejects_non_finite_scores() {
    let err = parse_homology_text("g1\tr1\tNaN\t1e-50\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidFormat(_)));

    let err = parse_homology_text("g1\tr1\t100\tinf\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidFormat(_)));
}

#[test]
fn test_homology_rejects_short_lines() {
    let err = parse_homology_text("g1\tr1\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidFormat(_)));
}

#[test]
fn test_unknown_curation_kind_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("curation.json");
    std::fs::write(
        &path,
        r#"[{"kind": "ribosome_recipe", "id": "30_S_assembly", "components": {}}]"#,
    )
    .unwrap();

    let err = me_builder::parsing::json::read_curation(&path).unwrap_err();
    assert!(err.to_string().contains("curation.json"));
}
