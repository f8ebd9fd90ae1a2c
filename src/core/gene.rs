use serde::{Deserialize, Serialize};

use crate::core::types::{is_stop_codon, nucleotide_index, translate_codon, ProductType, Strand};

/// A gene from the genome annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    /// Locus tag, unique within an organism
    pub id: String,

    /// Gene name as given by the annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Alternate identifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// 1-based inclusive start coordinate
    #[serde(default)]
    pub start: u64,

    /// 1-based inclusive end coordinate
    #[serde(default)]
    pub end: u64,

    #[serde(default)]
    pub strand: Strand,

    pub product: ProductType,

    /// Nucleotide sequence of the coding strand, stop codon included
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

impl GeneRecord {
    pub fn new(id: impl Into<String>, product: ProductType) -> Self {
        Self {
            id: id.into(),
            name: None,
            aliases: Vec::new(),
            start: 0,
            end: 0,
            strand: Strand::Plus,
            product,
            sequence: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, start: u64, end: u64, strand: Strand) -> Self {
        self.start = start;
        self.end = end;
        self.strand = strand;
        self
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    /// Nucleotide length, taken from the sequence when present
    #[must_use]
    pub fn length(&self) -> u64 {
        match &self.sequence {
            Some(seq) => seq.len() as u64,
            None if self.end >= self.start && self.end > 0 => self.end - self.start + 1,
            None => 0,
        }
    }

    /// Number of amino acid residues, excluding the stop codon
    #[must_use]
    pub fn residue_count(&self) -> u64 {
        if let Some(protein) = self.protein_sequence() {
            return protein.len() as u64;
        }
        (self.length() / 3).saturating_sub(1)
    }

    /// Translated protein sequence, if a nucleotide sequence is known
    #[must_use]
    pub fn protein_sequence(&self) -> Option<String> {
        if self.product != ProductType::Protein {
            return None;
        }
        let seq = self.sequence.as_ref()?;
        let bytes = seq.as_bytes();
        let mut protein = String::with_capacity(bytes.len() / 3);
        for codon in bytes.chunks_exact(3) {
            let codon = std::str::from_utf8(codon).ok()?;
            match translate_codon(codon) {
                Some(residue) => protein.push(residue),
                None => break,
            }
        }
        Some(protein)
    }

    /// Terminal stop codon in RNA alphabet, if the sequence ends with one
    #[must_use]
    pub fn stop_codon(&self) -> Option<String> {
        let seq = self.sequence.as_ref()?;
        if seq.len() < 3 || !seq.is_char_boundary(seq.len() - 3) {
            return None;
        }
        let tail = &seq[seq.len() - 3..];
        is_stop_codon(tail).then(|| tail.to_ascii_uppercase().replace('T', "U"))
    }

    /// Counts of A, C, G and U/T in the sequence
    #[must_use]
    pub fn base_counts(&self) -> Option<[u64; 4]> {
        let seq = self.sequence.as_ref()?;
        let mut counts = [0u64; 4];
        for base in seq.chars() {
            if let Some(idx) = nucleotide_index(base) {
                counts[idx] += 1;
            }
        }
        Some(counts)
    }
}

/// A transcription unit (operon) from the annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionUnit {
    pub id: String,

    /// Member genes in transcription order
    pub genes: Vec<String>,

    /// Sigma factor gene recognising the promoter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma: Option<String>,
}

impl TranscriptionUnit {
    pub fn new(id: impl Into<String>, genes: Vec<String>) -> Self {
        Self {
            id: id.into(),
            genes,
            sigma: None,
        }
    }

    /// Generated unit holding a single gene
    pub fn monocistronic(gene: &str) -> Self {
        Self::new(format!("TU_{gene}"), vec![gene.to_string()])
    }

    #[must_use]
    pub fn with_sigma(mut self, sigma: impl Into<String>) -> Self {
        self.sigma = Some(sigma.into());
        self
    }
}
