use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::model::MEModel;
use crate::curation::kinds::{CurationEntry, CurationKind, EntityRef, RefRole};
use crate::utils::validation::{check_record_limit, is_valid_identifier, MAX_CURATION_ENTRIES};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Entry '{key}' is a {found} entry, not {expected}")]
    KindMismatch {
        expected: CurationKind,
        found: CurationKind,
        key: String,
    },

    #[error("Duplicate {kind} entry '{key}' in {source_name}")]
    DuplicateKey {
        kind: CurationKind,
        key: String,
        source_name: String,
    },

    #[error("Invalid {kind} key '{key}'")]
    InvalidKey { kind: CurationKind, key: String },

    #[error("{0}")]
    TooManyEntries(String),
}

/// Provenance of a registered entry, ordered by precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// Organism-agnostic umbrella default
    Generated,
    /// Borrowed from a reference organism through homology
    Homology,
    /// Supplied by the organism's own curation tables
    Manual,
}

impl std::fmt::Display for EntryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Homology => write!(f, "homology"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredEntry {
    pub entry: CurationEntry,
    pub origin: EntryOrigin,
    /// Name of the table, file or organism the entry came from
    pub source: String,
}

/// A curation entry referencing something the assembled model lacks
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DanglingReference {
    pub kind: CurationKind,
    pub key: String,
    pub reference: EntityRef,
}

impl std::fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} entry '{}' references unknown {:?} '{}'",
            self.kind, self.key, self.reference.role, self.reference.id
        )
    }
}

/// Typed curation tables keyed by kind, then by primary key.
///
/// Manual entries always win over generated ones. Homology-borrowed and
/// umbrella defaults only fill keys the registry does not hold yet.
#[derive(Debug, Clone, Default)]
pub struct CurationRegistry {
    tables: BTreeMap<CurationKind, BTreeMap<String, RegisteredEntry>>,
}

impl CurationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every entry of a reference organism
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the entries contain duplicate keys.
    pub fn from_entries(source: &str, entries: Vec<CurationEntry>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.load_all(source, entries)?;
        Ok(registry)
    }

    /// Register manually curated entries of one kind.
    ///
    /// Entries replace any generated or borrowed entry with the same key. A
    /// later manual source replaces an earlier one.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::KindMismatch` if an entry is of another kind,
    /// `RegistryError::DuplicateKey` if the source holds a key twice, or
    /// `RegistryError::InvalidKey` for an unusable key. Nothing is registered
    /// when an error is returned.
    pub fn load(
        &mut self,
        kind: CurationKind,
        source: &str,
        entries: Vec<CurationEntry>,
    ) -> Result<usize, RegistryError> {
        if let Some(msg) =
            check_record_limit(self.total_len() + entries.len(), MAX_CURATION_ENTRIES + 1, "curation entries")
        {
            return Err(RegistryError::TooManyEntries(msg));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            let key = entry.key();
            if entry.kind() != kind {
                return Err(RegistryError::KindMismatch {
                    expected: kind,
                    found: entry.kind(),
                    key,
                });
            }
            if !is_valid_identifier(&key) {
                return Err(RegistryError::InvalidKey { kind, key });
            }
            if !seen.insert(key.clone()) {
                return Err(RegistryError::DuplicateKey {
                    kind,
                    key,
                    source_name: source.to_string(),
                });
            }
        }

        let count = entries.len();
        let table = self.tables.entry(kind).or_default();
        for entry in entries {
            let key = entry.key();
            if let Some(previous) = table.get(&key) {
                debug!(
                    kind = %kind,
                    key = %key,
                    replaced = %previous.origin,
                    "Manual entry overrides existing entry"
                );
            }
            table.insert(
                key,
                RegisteredEntry {
                    entry,
                    origin: EntryOrigin::Manual,
                    source: source.to_string(),
                },
            );
        }
        Ok(count)
    }

    /// Register manually curated entries of any kind, grouped by kind
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] raised by [`Self::load`].
    pub fn load_all(
        &mut self,
        source: &str,
        entries: Vec<CurationEntry>,
    ) -> Result<usize, RegistryError> {
        let mut by_kind: BTreeMap<CurationKind, Vec<CurationEntry>> = BTreeMap::new();
        for entry in entries {
            by_kind.entry(entry.kind()).or_default().push(entry);
        }
        let mut total = 0;
        for (kind, entries) in by_kind {
            total += self.load(kind, source, entries)?;
        }
        Ok(total)
    }

    /// Look up an entry
    #[must_use]
    pub fn get(&self, kind: CurationKind, key: &str) -> Option<&CurationEntry> {
        self.get_registered(kind, key).map(|r| &r.entry)
    }

    #[must_use]
    pub fn get_registered(&self, kind: CurationKind, key: &str) -> Option<&RegisteredEntry> {
        self.tables.get(&kind)?.get(key)
    }

    #[must_use]
    pub fn contains(&self, kind: CurationKind, key: &str) -> bool {
        self.get_registered(kind, key).is_some()
    }

    /// Insert generated entries for keys the registry does not already hold.
    /// Returns how many were inserted.
    pub fn merge_defaults(&mut self, kind: CurationKind, generated: Vec<CurationEntry>) -> usize {
        self.merge(kind, generated, EntryOrigin::Generated, "umbrella defaults")
    }

    /// Insert homology-borrowed entries for keys the registry does not already
    /// hold. Returns how many were inserted.
    pub fn merge_borrowed(
        &mut self,
        kind: CurationKind,
        borrowed: Vec<CurationEntry>,
        reference: &str,
    ) -> usize {
        self.merge(kind, borrowed, EntryOrigin::Homology, reference)
    }

    fn merge(
        &mut self,
        kind: CurationKind,
        entries: Vec<CurationEntry>,
        origin: EntryOrigin,
        source: &str,
    ) -> usize {
        let table = self.tables.entry(kind).or_default();
        let mut inserted = 0;
        for entry in entries.into_iter().filter(|e| e.kind() == kind) {
            let key = entry.key();
            if table.contains_key(&key) {
                continue;
            }
            table.insert(
                key,
                RegisteredEntry {
                    entry,
                    origin,
                    source: source.to_string(),
                },
            );
            inserted += 1;
        }
        inserted
    }

    /// Entries of a kind in key order
    pub fn entries(&self, kind: CurationKind) -> impl Iterator<Item = &CurationEntry> {
        self.registered(kind).map(|r| &r.entry)
    }

    /// Registered entries of a kind in key order
    pub fn registered(&self, kind: CurationKind) -> impl Iterator<Item = &RegisteredEntry> {
        self.tables.get(&kind).into_iter().flat_map(|t| t.values())
    }

    /// Number of entries of a kind
    #[must_use]
    pub fn len(&self, kind: CurationKind) -> usize {
        self.tables.get(&kind).map_or(0, BTreeMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, kind: CurationKind) -> bool {
        self.len(kind) == 0
    }

    #[must_use]
    pub fn total_len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    /// Number of entries of a kind per origin
    #[must_use]
    pub fn origin_counts(&self, kind: CurationKind) -> BTreeMap<EntryOrigin, usize> {
        let mut counts = BTreeMap::new();
        for registered in self.registered(kind) {
            *counts.entry(registered.origin).or_insert(0) += 1;
        }
        counts
    }

    /// Slots of a kind already filled, see [`CurationEntry::slot`]
    #[must_use]
    pub fn filled_slots(&self, kind: CurationKind) -> HashSet<String> {
        self.entries(kind).map(CurationEntry::slot).collect()
    }

    /// Check every entry's references against the assembled model.
    ///
    /// Returns the references that do not resolve, in kind and key order.
    #[must_use]
    pub fn finalize(&self, model: &MEModel) -> Vec<DanglingReference> {
        let network_reactions: HashSet<&str> = model
            .reactions
            .values()
            .filter_map(|r| r.source.as_deref())
            .collect();

        let resolves = |reference: &EntityRef| -> bool {
            let id = reference.id.as_str();
            match reference.role {
                RefRole::Gene => model.genes.contains_key(id),
                RefRole::Component => model.genes.contains_key(id) || model.has_species(id),
                RefRole::Species | RefRole::Metabolite => model.has_species(id),
                RefRole::Modification => {
                    model.has_species(id) || self.contains(CurationKind::SpecialModification, id)
                }
                RefRole::Reaction => {
                    network_reactions.contains(id) || model.reactions.contains_key(id)
                }
                RefRole::Entry(kind) => self.contains(kind, id),
            }
        };

        let mut dangling = Vec::new();
        for (kind, table) in &self.tables {
            for (key, registered) in table {
                for reference in registered.entry.references() {
                    if !resolves(&reference) {
                        dangling.push(DanglingReference {
                            kind: *kind,
                            key: key.clone(),
                            reference,
                        });
                    }
                }
            }
        }
        dangling
    }

    /// Look for a required kind with no entries at all
    #[must_use]
    pub fn missing_required(&self, required: &[CurationKind]) -> Option<CurationKind> {
        required.iter().copied().find(|kind| self.is_empty(*kind))
    }
}
