//! End-to-end builds on the toy organism: the four reference scenarios plus
//! the idempotence, linkage, precedence, determinism and termination
//! properties of the pipeline.

mod common;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use me_builder::builder::{BuildError, BuilderConfig, MEBuilder};
use me_builder::curation::kinds::{CurationEntry, CurationKind};
use me_builder::curation::registry::EntryOrigin;
use me_builder::report::TroubleshootingReport;
use me_builder::troubleshoot::clarabel::ClarabelSolver;
use me_builder::troubleshoot::diagnosis::GapKind;
use me_builder::troubleshoot::engine::{FeasibilityTroubleshooter, Patch, TroubleshootState};
use me_builder::troubleshoot::problem::{LpProblem, LpSolution, LpSolver, SolverError};

use common::{
    cofactor_organism, conflicting_organism, curation, curation_without, matches, organism,
    reference,
};

fn builder(entries: Vec<CurationEntry>) -> MEBuilder {
    MEBuilder::new(BuilderConfig::default()).with_curation("curation.json", entries)
}

/// Counts solves while delegating to Clarabel
struct CountingSolver {
    inner: ClarabelSolver,
    calls: Arc<AtomicUsize>,
}

impl LpSolver for CountingSolver {
    fn name(&self) -> &str {
        "counting"
    }

    fn solve(&self, problem: &LpProblem) -> Result<LpSolution, SolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.solve(problem)
    }
}

#[test]
fn test_scenario_a_consistent_curation_needs_no_patches() {
    let output = builder(curation()).build(&organism()).unwrap();

    assert_eq!(output.outcome.state, TroubleshootState::Done);
    assert!(output.outcome.feasible);
    assert_eq!(output.outcome.iterations, 0);
    assert!(output.report.records().is_empty());
    assert_eq!(output.report.final_state(), Some(TroubleshootState::Done));
}

#[test]
fn test_scenario_b_ribosome_borrowed_through_homology() {
    let output = builder(curation_without(CurationKind::RibosomeStoich))
        .with_homology(matches(), reference())
        .build(&organism())
        .unwrap();

    let ribosome = output
        .registry
        .get_registered(CurationKind::RibosomeStoich, "30_S_assembly")
        .unwrap();
    assert_eq!(ribosome.origin, EntryOrigin::Homology);
    assert_eq!(ribosome.source, "ref_org");

    // Equal scores for g_rps resolve to the lexicographically smaller ref_rps
    let CurationEntry::RibosomeStoich(step) = &ribosome.entry else {
        panic!("expected a ribosome_stoich entry");
    };
    assert_eq!(
        step.components,
        BTreeMap::from([("g_rps".to_string(), 1.0), ("g_rrn".to_string(), 1.0)])
    );
    assert!(output.model.complexes.contains_key("ribosome"));
    assert!(output
        .report
        .notes()
        .iter()
        .any(|n| n.triggered_by == "ribosome_stoich" && n.msg.contains("ref_org")));
}

#[test]
fn test_scenario_b_without_homology_is_missing_input() {
    let err = builder(curation_without(CurationKind::RibosomeStoich))
        .build(&organism())
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::MissingRequiredInput {
            kind: CurationKind::RibosomeStoich
        }
    ));
}

#[test]
fn test_scenario_c_conflicting_names_fail_before_assembly() {
    let err = builder(curation()).draft(&conflicting_organism()).unwrap_err();
    match err {
        BuildError::DanglingReference { entity, reason, .. } => {
            assert_eq!(entity, "g_enz");
            assert!(reason.contains("glk"));
            assert!(reason.contains("pgi"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scenario_d_unproduced_metabolite_patched_before_keff() {
    let output = builder(curation_without(CurationKind::ReactionKeff))
        .build(&cofactor_organism())
        .unwrap();

    let records = output.report.records();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].iteration, 1);
    assert_eq!(records[0].gap.kind, GapKind::UnproducedMetabolite);
    assert_eq!(records[0].gap.target, "cofactor_c");
    assert_eq!(
        records[0].patch,
        Patch::AddSink {
            reaction: "SK_cofactor_c".to_string(),
            species: "cofactor_c".to_string(),
        }
    );
    assert!(!records[0].feasible);

    assert_eq!(records[1].iteration, 2);
    assert_eq!(records[1].gap.kind, GapKind::MissingKeff);
    assert_eq!(records[1].gap.target, "GLCK_FWD_ENZ1");
    assert!(matches!(
        &records[1].patch,
        Patch::SetKeff { reaction, keff } if reaction == "GLCK_FWD_ENZ1" && (*keff - 65.0).abs() < 1e-9
    ));
    assert!(records[1].feasible);

    assert!(output.model.reactions.contains_key("SK_cofactor_c"));
    assert_eq!(output.outcome.state, TroubleshootState::Done);
}

#[test]
fn test_each_patch_is_followed_by_a_solve() {
    let calls = Arc::new(AtomicUsize::new(0));
    let solver = CountingSolver {
        inner: ClarabelSolver::default(),
        calls: Arc::clone(&calls),
    };
    let output = builder(curation_without(CurationKind::ReactionKeff))
        .with_solver(Box::new(solver))
        .build(&cofactor_organism())
        .unwrap();

    assert_eq!(output.report.records().len(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_termination_bound() {
    for cap in [0, 1] {
        let config = BuilderConfig {
            max_iterations: cap,
            ..BuilderConfig::default()
        };
        let err = MEBuilder::new(config)
            .with_curation("curation.json", curation_without(CurationKind::ReactionKeff))
            .build(&cofactor_organism())
            .unwrap_err();

        let BuildError::UnresolvedInfeasibility { report } = err else {
            panic!("expected unresolved infeasibility with cap {cap}");
        };
        assert_eq!(report.records().len(), cap);
        assert_eq!(report.final_state(), Some(TroubleshootState::Unresolved));
        assert!(!report.unresolved().is_empty());
    }
}

#[test]
fn test_idempotence_on_feasible_model() {
    for (entries, inputs) in [
        (curation(), organism()),
        (curation_without(CurationKind::ReactionKeff), cofactor_organism()),
    ] {
        let output = builder(entries).build(&inputs).unwrap();
        let mut model = output.model.clone();
        let mut report = TroubleshootingReport::new();

        let solver = ClarabelSolver::default();
        let outcome = FeasibilityTroubleshooter::new(&solver, BuilderConfig::default().troubleshoot_options())
            .run(&mut model, &mut report)
            .unwrap();

        assert_eq!(outcome.state, TroubleshootState::Done);
        assert!(report.records().is_empty());
        assert_eq!(model, output.model);
    }
}

#[test]
fn test_no_dangling_references() {
    let builds = [
        builder(curation()).build(&organism()).unwrap(),
        builder(curation_without(CurationKind::RibosomeStoich))
            .with_homology(matches(), reference())
            .build(&organism())
            .unwrap(),
        builder(curation_without(CurationKind::ReactionKeff))
            .build(&cofactor_organism())
            .unwrap(),
    ];
    for output in &builds {
        assert!(output.model.validate_links().is_empty());
        for reaction in output.model.reactions.values() {
            for species in reaction.stoichiometry.keys() {
                assert!(output.model.has_species(species), "{} -> {species}", reaction.id);
            }
            for catalyst in &reaction.catalysts {
                assert!(output.model.has_species(catalyst), "{} -> {catalyst}", reaction.id);
            }
        }
    }
}

#[test]
fn test_every_gene_participates() {
    let inputs = organism();
    let output = builder(curation()).build(&inputs).unwrap();
    for gene in &inputs.genes {
        let transcript = format!("RNA_{}", gene.id);
        assert!(
            output
                .model
                .reactions
                .values()
                .any(|r| r.stoichiometry.get(&transcript).is_some_and(|c| *c > 0.0)),
            "{} is never transcribed",
            gene.id
        );
    }
    // g_lone is in no curated complex, so it feeds the dummy complex
    let dummy = output.model.reaction("formation_CPLX_dummy").unwrap();
    assert!(dummy.stoichiometry.contains_key("protein_g_lone"));
}

#[test]
fn test_precedence_manual_beats_homology() {
    let output = builder(curation())
        .with_homology(matches(), reference())
        .build(&organism())
        .unwrap();

    for (kind, key) in [
        (CurationKind::ComplexStoichiometry, "ENZ1"),
        (CurationKind::RibosomeStoich, "30_S_assembly"),
    ] {
        assert_eq!(
            output.registry.get_registered(kind, key).unwrap().origin,
            EntryOrigin::Manual
        );
    }
    let Some(CurationEntry::ComplexStoichiometry(enz)) =
        output.registry.get(CurationKind::ComplexStoichiometry, "ENZ1")
    else {
        panic!("ENZ1 missing");
    };
    assert_eq!(enz.components, BTreeMap::from([("g_enz".to_string(), 2.0)]));
}

#[test]
fn test_determinism() {
    let run = || {
        builder(curation_without(CurationKind::ReactionKeff))
            .with_homology(matches(), reference())
            .build(&cofactor_organism())
            .unwrap()
    };
    let first = run();
    let second = run();

    assert_eq!(first.report.records(), second.report.records());
    assert_eq!(first.report.notes(), second.report.notes());
    assert_eq!(first.model, second.model);
    assert_eq!(first.model.signature(), second.model.signature());
    assert_eq!(first.registry_summary(), second.registry_summary());
}

#[test]
fn test_strict_gene_rules() {
    let mut inputs = organism();
    inputs
        .network
        .reactions
        .iter_mut()
        .find(|r| r.id == "GLCK")
        .unwrap()
        .gene_reaction_rule = "g_enz and (".to_string();

    let lenient = builder(curation()).draft(&inputs).unwrap();
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
