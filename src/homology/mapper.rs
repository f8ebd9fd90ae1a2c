use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::organism::ReferenceOrganism;
use crate::curation::kinds::{CurationEntry, CurationKind, GeneRewriter};
use crate::curation::registry::{CurationRegistry, RegistryError};

/// Default e-value cutoff for accepting a homology match
pub const DEFAULT_EVALUE_CUTOFF: f64 = 1e-10;

#[derive(Error, Debug)]
pub enum HomologyError {
    #[error("Invalid e-value cutoff: {0}")]
    InvalidCutoff(f64),

    #[error("Reference organism curation is inconsistent: {0}")]
    Reference(#[from] RegistryError),
}

/// Gene-to-gene match from an external reciprocal best hit search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomologyMatch {
    pub organism_gene: String,
    pub reference_gene: String,
    /// Similarity score, higher is better
    pub score: f64,
    pub evalue: f64,
}

impl HomologyMatch {
    pub fn new(
        organism_gene: impl Into<String>,
        reference_gene: impl Into<String>,
        score: f64,
        evalue: f64,
    ) -> Self {
        Self {
            organism_gene: organism_gene.into(),
            reference_gene: reference_gene.into(),
            score,
            evalue,
        }
    }
}

/// Order matches so that the better one compares greater.
///
/// Higher score wins; on equal scores the lexicographically smaller
/// reference gene wins, then the smaller organism gene.
fn rank(a: &HomologyMatch, b: &HomologyMatch) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| b.reference_gene.cmp(&a.reference_gene))
        .then_with(|| b.organism_gene.cmp(&a.organism_gene))
}

/// A curation entry copied from a reference organism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowedEntry {
    pub entry: CurationEntry,
    /// Key of the entry in the reference organism
    pub reference_key: String,
    /// Reference genes with no organism counterpart, left out of the copy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_genes: Vec<String>,
}

/// Borrows curation from a reference organism through homology matches
#[derive(Debug, Clone)]
pub struct HomologyMapper {
    evalue_cutoff: f64,
}

impl Default for HomologyMapper {
    fn default() -> Self {
        Self {
            evalue_cutoff: DEFAULT_EVALUE_CUTOFF,
        }
    }
}

impl HomologyMapper {
    /// Create a mapper accepting matches with e-value at or below the cutoff
    ///
    /// # Errors
    ///
    /// Returns `HomologyError::InvalidCutoff` for a negative or non-finite cutoff.
    pub fn new(evalue_cutoff: f64) -> Result<Self, HomologyError> {
        if !evalue_cutoff.is_finite() || evalue_cutoff < 0.0 {
            return Err(HomologyError::InvalidCutoff(evalue_cutoff));
        }
        Ok(Self { evalue_cutoff })
    }

    #[must_use]
    pub fn evalue_cutoff(&self) -> f64 {
        self.evalue_cutoff
    }

    /// Best accepted match per organism gene
    #[must_use]
    pub fn best_matches(&self, matches: &[HomologyMatch]) -> BTreeMap<String, HomologyMatch> {
        let cutoff = self.evalue_cutoff;
        let best: HashMap<&str, &HomologyMatch> = matches
            .par_iter()
            .filter(|m| m.evalue <= cutoff)
            .fold(HashMap::new, |mut acc, m| {
                keep_better(&mut acc, m.organism_gene.as_str(), m);
                acc
            })
            .reduce(HashMap::new, |mut left, right| {
                for (gene, m) in right {
                    keep_better(&mut left, gene, m);
                }
                left
            });

        best.into_iter()
            .map(|(gene, m)| (gene.to_string(), m.clone()))
            .collect()
    }

    /// Reference gene -> organism gene, from the best match of each organism gene.
    ///
    /// When several organism genes share a best reference gene, the best
    /// ranked match keeps it.
    #[must_use]
    pub fn reference_to_organism(
        best: &BTreeMap<String, HomologyMatch>,
    ) -> BTreeMap<String, String> {
        let mut inverse: HashMap<&str, &HomologyMatch> = HashMap::new();
        for m in best.values() {
            keep_better(&mut inverse, m.reference_gene.as_str(), m);
        }
        inverse
            .into_iter()
            .map(|(reference, m)| (reference.to_string(), m.organism_gene.clone()))
            .collect()
    }

    /// Copy reference curation for entries the target registry lacks.
    ///
    /// Gene-keyed entries are rekeyed by the organism gene whose best match
    /// is the reference gene. Machinery entries keep their key and have their
    /// reference gene ids rewritten; an entry whose reference genes all lack a
    /// counterpart is skipped. Organism-specific kinds are never borrowed.
    ///
    /// # Errors
    ///
    /// Returns a [`HomologyError`] if the reference curation holds duplicate keys.
    pub fn borrow(
        &self,
        matches: &[HomologyMatch],
        reference: &ReferenceOrganism,
        target: &CurationRegistry,
    ) -> Result<BTreeMap<CurationKind, Vec<BorrowedEntry>>, HomologyError> {
        let reference_registry =
            CurationRegistry::from_entries(&reference.id, reference.curation.clone())?;
        let best = self.best_matches(matches);
        let inverse = Self::reference_to_organism(&best);

        let mut reference_genes: HashSet<String> = reference.genes.iter().cloned().collect();
        reference_genes.extend(matches.iter().map(|m| m.reference_gene.clone()));

        let mut borrowed: BTreeMap<CurationKind, Vec<BorrowedEntry>> = BTreeMap::new();
        for kind in CurationKind::ALL.into_iter().filter(|k| k.is_borrowable()) {
            let mut entries = Vec::new();

            if kind.is_gene_keyed() {
                for m in best.values() {
                    if target.contains(kind, &m.organism_gene) {
                        continue;
                    }
                    let Some(entry) = reference_registry.get(kind, &m.reference_gene) else {
                        continue;
                    };
                    if let Some(rekeyed) = entry.with_gene_key(&m.organism_gene) {
                        entries.push(BorrowedEntry {
                            entry: rekeyed,
                            reference_key: m.reference_gene.clone(),
                            dropped_genes: Vec::new(),
                        });
                    }
                }
            } else {
                for entry in reference_registry.entries(kind) {
                    let key = entry.key();
                    if target.contains(kind, &key) {
                        continue;
                    }
                    let mut rewriter = GeneRewriter::new(&reference_genes, &inverse);
                    let rewritten = entry.rewrite_genes(&mut rewriter);
                    if !rewriter.keeps_entry() {
                        debug!(kind = %kind, key = %key, "No homologs for any gene of entry");
                        continue;
                    }
                    entries.push(BorrowedEntry {
                        entry: rewritten,
                        reference_key: key,
                        dropped_genes: rewriter.dropped().to_vec(),
                    });
                }
            }

            if !entries.is_empty() {
                borrowed.insert(kind, entries);
            }
        }

        Ok(borrowed)
    }
}

fn keep_better<'a>(
    best: &mut HashMap<&'a str, &'a HomologyMatch>,
    key: &'a str,
    candidate: &'a HomologyMatch,
) {
    match best.get(key) {
        Some(current) if rank(candidate, current) != Ordering::Greater => {}
        _ => {
            best.insert(key, candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::kinds::{ComplexSpec, RibosomeStoichSpec, SigmaFactorSpec};

    fn reference() -> ReferenceOrganism {
        ReferenceOrganism {
            id: "ecoli".to_string(),
            genes: ["ref_rps", "ref_rrn", "ref_sig", "ref_other"]
                .iter()
                .map(|g| (*g).to_string())
                .collect(),
            curation: vec![
                CurationEntry::RibosomeStoich(RibosomeStoichSpec {
                    step: "30_S_assembly".to_string(),
                    components: BTreeMap::from([
                        ("ref_rps".to_string(), 1.0),
                        ("ref_rrn".to_string(), 1.0),
                    ]),
                }),
                CurationEntry::SigmaFactor(SigmaFactorSpec {
                    gene: "ref_sig".to_string(),
                    housekeeping: true,
                }),
                CurationEntry::ComplexStoichiometry(ComplexSpec {
                    complex: "CPLX_unmatched".to_string(),
                    components: BTreeMap::from([("ref_other".to_string(), 1.0)]),
                }),
            ],
        }
    }

    #[test]
    fn test_invalid_cutoff() {
        assert!(HomologyMapper::new(-1.0).is_err());
        assert!(HomologyMapper::new(f64::NAN).is_err());
        assert!(HomologyMapper::new(0.0).is_ok());
    }

    #[test]
    fn test_best_matches_by_score() {
        let mapper = HomologyMapper::default();
        let matches = vec![
            HomologyMatch::new("g1", "ref_a", 80.0, 1e-30),
            HomologyMatch::new("g1", "ref_b", 95.0, 1e-40),
            HomologyMatch::new("g2", "ref_c", 99.0, 1e-3),
        ];
        let best = mapper.best_matches(&matches);
        assert_eq!(best.len(), 1);
        assert_eq!(best["g1"].reference_gene, "ref_b");
    }

    #[test]
    fn test_tie_breaks_on_reference_gene() {
        let mapper = HomologyMapper::default();
        let matches = vec![
            HomologyMatch::new("g1", "ref_z", 90.0, 1e-20),
            HomologyMatch::new("g1", "ref_a", 90.0, 1e-20),
            HomologyMatch::new("g1", "ref_m", 90.0, 1e-20),
        ];
        for _ in 0..8 {
            let best = mapper.best_matches(&matches);
            assert_eq!(best["g1"].reference_gene, "ref_a");
        }
    }

    #[test]
    fn test_reference_to_organism() {
        let mapper = HomologyMapper::default();
        let matches = vec![
            HomologyMatch::new("g1", "ref_a", 70.0, 1e-20),
            HomologyMatch::new("g2", "ref_a", 90.0, 1e-20),
        ];
        let inverse = HomologyMapper::reference_to_organism(&mapper.best_matches(&matches));
        assert_eq!(inverse["ref_a"], "g2");
    }

    #[test]
    fn test_borrow_rewrites_and_rekeys() {
        let mapper = HomologyMapper::default();
        let matches = vec![
            HomologyMatch::new("g_rps", "ref_rps", 90.0, 1e-50),
            HomologyMatch::new("g_rrn", "ref_rrn", 90.0, 1e-50),
            HomologyMatch::new("g_sig", "ref_sig", 90.0, 1e-50),
        ];
        let borrowed = mapper
            .borrow(&matches, &reference(), &CurationRegistry::new())
            .unwrap();

        let ribosome = &borrowed[&CurationKind::RibosomeStoich][0];
        let CurationEntry::RibosomeStoich(step) = &ribosome.entry else {
            panic!("wrong variant");
        };
        assert_eq!(
            step.components,
            BTreeMap::from([("g_rps".to_string(), 1.0), ("g_rrn".to_string(), 1.0)])
        );

        let sigma = &borrowed[&CurationKind::SigmaFactor][0];
        assert_eq!(sigma.entry.key(), "g_sig");
        assert_eq!(sigma.reference_key, "ref_sig");

        assert!(!borrowed.contains_key(&CurationKind::ComplexStoichiometry));
    }

    #[test]
    fn test_borrow_skips_curated_keys() {
        let mapper = HomologyMapper::default();
        let matches = vec![HomologyMatch::new("g_rps", "ref_rps", 90.0, 1e-50)];
        let mut target = CurationRegistry::new();
        target
            .load(
                CurationKind::RibosomeStoich,
                "manual",
                vec![CurationEntry::RibosomeStoich(RibosomeStoichSpec {
                    step: "30_S_assembly".to_string(),
                    components: BTreeMap::new(),
                })],
            )
            .unwrap();
        let borrowed = mapper.borrow(&matches, &reference(), &target).unwrap();
        assert!(!borrowed.contains_key(&CurationKind::RibosomeStoich));
    }

    #[test]
    fn test_borrow_records_dropped_genes() {
        let mapper = HomologyMapper::default();
        let matches = vec![HomologyMatch::new("g_rps", "ref_rps", 90.0, 1e-50)];
        let borrowed = mapper
            .borrow(&matches, &reference(), &CurationRegistry::new())
            .unwrap();
        assert_eq!(
            borrowed[&CurationKind::RibosomeStoich][0].dropped_genes,
            vec!["ref_rrn".to_string()]
        );
    }
}
