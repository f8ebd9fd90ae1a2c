use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::curation::kinds::{CurationEntry, CurationKind};
use crate::curation::registry::CurationRegistry;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read defaults catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse defaults catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Defaults catalog holds organism-specific kind {0}")]
    OrganismSpecificKind(CurationKind),
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub created_at: String,
    pub entries: Vec<CurationEntry>,
}

/// Organism-agnostic umbrella defaults.
///
/// Every entry is built on the placeholder complex so a draft model can be
/// assembled when no machinery of a kind is curated or borrowed.
#[derive(Debug, Clone, Default)]
pub struct UmbrellaDefaults {
    entries: BTreeMap<CurationKind, Vec<CurationEntry>>,
}

impl UmbrellaDefaults {
    /// Load the embedded default catalog
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the embedded catalog is malformed.
    pub fn load_embedded() -> Result<Self, CatalogError> {
        // Embedded at compile time, validated by build.rs
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/umbrella_defaults.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load a catalog from a JSON file
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a catalog from a JSON string
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the JSON is malformed or holds an
    /// organism-specific kind.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        if data.version != CATALOG_VERSION {
            warn!(
                expected = CATALOG_VERSION,
                found = %data.version,
                "Defaults catalog version mismatch"
            );
        }

        let mut defaults = Self::default();
        for entry in data.entries {
            let kind = entry.kind();
            if !kind.is_borrowable() || kind.is_gene_keyed() {
                return Err(CatalogError::OrganismSpecificKind(kind));
            }
            defaults.entries.entry(kind).or_default().push(entry);
        }
        Ok(defaults)
    }

    /// Export the catalog to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            entries: self.entries.values().flatten().cloned().collect(),
        };
        serde_json::to_string_pretty(&data)
    }

    /// Default entries of a kind
    #[must_use]
    pub fn entries(&self, kind: CurationKind) -> &[CurationEntry] {
        self.entries.get(&kind).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Defaults of a kind whose slot the registry leaves empty
    #[must_use]
    pub fn unfilled(&self, kind: CurationKind, registry: &CurationRegistry) -> Vec<CurationEntry> {
        let filled: HashSet<String> = registry.filled_slots(kind);
        self.entries(kind)
            .iter()
            .filter(|entry| !filled.contains(&entry.slot()))
            .cloned()
            .collect()
    }

    /// Merge every unfilled default into the registry.
    ///
    /// Returns the number of entries inserted per kind, omitting kinds where
    /// nothing was needed.
    pub fn fill(&self, registry: &mut CurationRegistry) -> BTreeMap<CurationKind, usize> {
        let mut inserted = BTreeMap::new();
        for &kind in self.entries.keys() {
            let generated = self.unfilled(kind, registry);
            if generated.is_empty() {
                continue;
            }
            let count = registry.merge_defaults(kind, generated);
            if count > 0 {
                debug!(kind = %kind, count, "Filled slots from umbrella defaults");
                inserted.insert(kind, count);
            }
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::kinds::{ComplexSpec, ReleaseFactorSpec};
    use crate::curation::registry::EntryOrigin;

    #[test]
    fn test_load_embedded() {
        let defaults = UmbrellaDefaults::load_embedded().unwrap();
        assert!(!defaults.is_empty());
        assert_eq!(defaults.entries(CurationKind::RnaPolymerase).len(), 1);
        assert_eq!(defaults.entries(CurationKind::TranscriptionSubreaction).len(), 3);
        assert_eq!(defaults.entries(CurationKind::PeptideReleaseFactor).len(), 3);
        assert_eq!(defaults.entries(CurationKind::ExcisionMachinery).len(), 3);
        assert!(defaults.entries(CurationKind::ReactionKeff).is_empty());
    }

    #[test]
    fn test_rejects_organism_specific_kind() {
        let json = r#"{
            "version": "1.0.0",
            "created_at": "2026-01-01T00:00:00Z",
            "entries": [{"kind": "reaction_keff", "reaction": "PGI", "keff": 10}]
        }"#;
        assert!(matches!(
            UmbrellaDefaults::from_json(json),
            Err(CatalogError::OrganismSpecificKind(CurationKind::ReactionKeff))
        ));
    }

    #[test]
    fn test_fill_skips_curated_slots() {
        let defaults = UmbrellaDefaults::load_embedded().unwrap();
        let mut registry = CurationRegistry::new();
        registry
            .load_all(
                "manual",
                vec![
                    CurationEntry::RnaPolymerase(ComplexSpec {
                        complex: "RNAP_core".to_string(),
                        components: BTreeMap::from([("g_rnap".to_string(), 2.0)]),
                    }),
                    CurationEntry::PeptideReleaseFactor(ReleaseFactorSpec {
                        codon: "UAA".to_string(),
                        enzyme: "PrfA".to_string(),
                    }),
                ],
            )
            .unwrap();

        let inserted = defaults.fill(&mut registry);
        assert!(!inserted.contains_key(&CurationKind::RnaPolymerase));
        assert_eq!(inserted[&CurationKind::PeptideReleaseFactor], 2);
        assert_eq!(registry.len(CurationKind::RnaPolymerase), 1);
        assert_eq!(
            registry
                .get_registered(CurationKind::PeptideReleaseFactor, "UAA")
                .unwrap()
                .origin,
            EntryOrigin::Manual
        );
        assert_eq!(
            registry
                .get_registered(CurationKind::PeptideReleaseFactor, "UGA")
                .unwrap()
                .origin,
            EntryOrigin::Generated
        );
    }

    #[test]
    fn test_fill_is_idempotent() {
        let defaults = UmbrellaDefaults::load_embedded().unwrap();
        let mut registry = CurationRegistry::new();
        let first = defaults.fill(&mut registry);
        assert!(!first.is_empty());
        assert!(defaults.fill(&mut registry).is_empty());
    }

    #[test]
    fn test_to_json_round_trip() {
        let defaults = UmbrellaDefaults::load_embedded().unwrap();
        let json = defaults.to_json().unwrap();
        let reloaded = UmbrellaDefaults::from_json(&json).unwrap();
        assert_eq!(reloaded.len(), defaults.len());
    }
}
