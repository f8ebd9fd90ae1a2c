//! Audit trail of every automatic fix.
//!
//! A [`TroubleshootingReport`] collects two append-only logs:
//!
//! - [`PatchRecord`]s, one per troubleshooting iteration, naming the gap that
//!   was diagnosed, the patch applied and whether the next solve succeeded
//! - [`CurationNote`]s, one per fallback taken anywhere in the pipeline
//!   (umbrella defaults, homology borrowing, assembly warnings, patches)
//!
//! The report renders as a plain-text review log or as JSON.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::troubleshoot::diagnosis::Gap;
use crate::troubleshoot::engine::{Patch, TroubleshootState};

/// How urgently a note needs human review
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Critical,
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// A fallback the pipeline took, for a curator to check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationNote {
    pub msg: String,
    pub importance: Importance,
    /// What a curator should do about it
    pub to_do: String,
    /// Entity or phase that triggered the note
    pub triggered_by: String,
}

impl CurationNote {
    pub fn new(
        importance: Importance,
        triggered_by: impl Into<String>,
        msg: impl Into<String>,
        to_do: impl Into<String>,
    ) -> Self {
        Self {
            msg: msg.into(),
            importance,
            to_do: to_do.into(),
            triggered_by: triggered_by.into(),
        }
    }
}

/// One troubleshooting iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// 1-based iteration number
    pub iteration: usize,
    pub gap: Gap,
    pub patch: Patch,
    /// Outcome of the solve following the patch
    pub feasible: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TroubleshootingReport {
    records: Vec<PatchRecord>,
    notes: Vec<CurationNote>,

    /// Terminal state of the last troubleshooting run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_state: Option<TroubleshootState>,

    /// Gaps still present when the loop stopped without feasibility
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    unresolved: Vec<Gap>,
}

impl TroubleshootingReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_record(&mut self, record: PatchRecord) {
        self.records.push(record);
    }

    pub fn push_note(&mut self, note: CurationNote) {
        self.notes.push(note);
    }

    /// Append a note built from its parts
    pub fn note(
        &mut self,
        importance: Importance,
        triggered_by: impl Into<String>,
        msg: impl Into<String>,
        to_do: impl Into<String>,
    ) {
        self.push_note(CurationNote::new(importance, triggered_by, msg, to_do));
    }

    pub fn extend_notes(&mut self, notes: impl IntoIterator<Item = CurationNote>) {
        self.notes.extend(notes);
    }

    pub(crate) fn finish(&mut self, state: TroubleshootState, unresolved: Vec<Gap>) {
        self.final_state = Some(state);
        self.unresolved = unresolved;
    }

    #[must_use]
    pub fn records(&self) -> &[PatchRecord] {
        &self.records
    }

    #[must_use]
    pub fn notes(&self) -> &[CurationNote] {
        &self.notes
    }

    #[must_use]
    pub fn final_state(&self) -> Option<TroubleshootState> {
        self.final_state
    }

    #[must_use]
    pub fn unresolved(&self) -> &[Gap] {
        &self.unresolved
    }

    /// Number of troubleshooting iterations recorded
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.records.len()
    }

    /// Notes at or above an importance level
    pub fn notes_at_least(&self, importance: Importance) -> impl Iterator<Item = &CurationNote> {
        self.notes.iter().filter(move |n| n.importance <= importance)
    }

    /// Export to JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render the curation notes log for human review
    #[must_use]
    pub fn render_log(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "=== Troubleshooting ===");
        match self.final_state {
            Some(state) => {
                let _ = writeln!(out, "Final state: {state}");
            }
            None => {
                let _ = writeln!(out, "Final state: not run");
            }
        }
        let _ = writeln!(out, "Iterations:  {}", self.records.len());
        for record in &self.records {
            let _ = writeln!(
                out,
                "  [{}] {} -> {} ({})",
                record.iteration,
                record.gap,
                record.patch,
                if record.feasible { "feasible" } else { "still infeasible" }
            );
        }
        if !self.unresolved.is_empty() {
            let _ = writeln!(out, "Unresolved gaps:");
            for gap in &self.unresolved {
                let _ = writeln!(out, "  {gap}");
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "=== Curation notes ({}) ===", self.notes.len());
        let mut notes: Vec<&CurationNote> = self.notes.iter().collect();
        notes.sort_by_key(|n| n.importance);
        for note in notes {
            let _ = writeln!(out, "[{}] {}: {}", note.importance, note.triggered_by, note.msg);
            if !note.to_do.is_empty() {
                let _ = writeln!(out, "    to do: {}", note.to_do);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::troubleshoot::diagnosis::GapKind;

    fn record(iteration: usize, feasible: bool) -> PatchRecord {
        PatchRecord {
            iteration,
            gap: Gap {
                kind: GapKind::UnproducedMetabolite,
                target: "cofactor_c".to_string(),
                species: None,
            },
            patch: Patch::AddSink {
                reaction: "SK_cofactor_c".to_string(),
                species: "cofactor_c".to_string(),
            },
            feasible,
        }
    }

    #[test]
    fn test_records_are_append_only() {
        let mut report = TroubleshootingReport::new();
        report.push_record(record(1, false));
        report.push_record(record(2, true));
        assert_eq!(report.iterations(), 2);
        assert_eq!(report.records()[0].iteration, 1);
        assert!(report.records()[1].feasible);
    }

    #[test]
    fn test_notes_at_least() {
        let mut report = TroubleshootingReport::new();
        report.note(Importance::Low, "assembly", "orphan reaction", "");
        report.note(Importance::High, "registry", "missing sigma", "curate sigma_factor");
        report.note(Importance::Critical, "troubleshooting", "unresolved", "inspect gaps");
        assert_eq!(report.notes_at_least(Importance::High).count(), 2);
        assert_eq!(report.notes_at_least(Importance::Low).count(), 3);
    }

    #[test]
    fn test_render_log() {
        let mut report = TroubleshootingReport::new();
        report.push_record(record(1, true));
        report.note(Importance::Low, "GLCK", "keff set from median", "curate reaction_keff");
        report.note(Importance::High, "registry", "ribosome borrowed", "");
        report.finish(TroubleshootState::Done, Vec::new());

        let log = report.render_log();
        assert!(log.contains("Final state: done"));
        assert!(log.contains("[1] unproduced species cofactor_c -> add sink SK_cofactor_c"));
        // Notes are listed most important first
        let high = log.find("[high]").unwrap();
        let low = log.find("[low]").unwrap();
        assert!(high < low);
        assert!(log.contains("to do: curate reaction_keff"));
    }

    #[test]
    fn test_to_json() {
        let mut report = TroubleshootingReport::new();
        report.push_record(record(1, true));
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["records"][0]["patch"]["action"], "add_sink");
        assert_eq!(value["records"][0]["gap"]["kind"], "unproduced_metabolite");
    }
}
