use serde::{Deserialize, Serialize};

/// Identifier of the placeholder complex that absorbs unassigned gene products
pub const DUMMY_COMPLEX: &str = "CPLX_dummy";

/// Identifier of the synthetic gene expressed to form the placeholder complex
pub const DUMMY_GENE: &str = "dummy";

/// Nucleotide length given to the synthetic dummy gene
pub const DUMMY_GENE_LENGTH: u64 = 1_000;

/// Ribosome complex identifier
pub const RIBOSOME: &str = "ribosome";

/// Nucleoside triphosphates consumed by transcription, in A, C, G, U order
pub const NTPS: [&str; 4] = ["atp_c", "ctp_c", "gtp_c", "utp_c"];

/// Nucleoside monophosphates released by RNA degradation, in A, C, G, U order
pub const NMPS: [&str; 4] = ["amp_c", "cmp_c", "gmp_c", "ump_c"];

pub const ATP: &str = "atp_c";
pub const AMP: &str = "amp_c";
pub const PPI: &str = "ppi_c";
pub const H2O: &str = "h2o_c";
pub const PROTON: &str = "h_c";

/// Kind of product encoded by a gene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Protein,
    Trna,
    Rrna,
    MiscRna,
}

impl ProductType {
    /// Stable RNAs are not degraded by the degradosome
    #[must_use]
    pub fn is_stable_rna(self) -> bool {
        !matches!(self, Self::Protein)
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Protein => write!(f, "protein"),
            Self::Trna => write!(f, "tRNA"),
            Self::Rrna => write!(f, "rRNA"),
            Self::MiscRna => write!(f, "misc RNA"),
        }
    }
}

/// Genomic strand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strand {
    #[default]
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
}

/// Category of a species in the ME model index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeciesKind {
    Metabolite,
    Rna,
    Protein,
    Complex,
    Generic,
}

/// Map a nucleotide to the index used in [`NTPS`] and [`NMPS`]
#[must_use]
pub fn nucleotide_index(base: char) -> Option<usize> {
    match base.to_ascii_uppercase() {
        'A' => Some(0),
        'C' => Some(1),
        'G' => Some(2),
        'T' | 'U' => Some(3),
        _ => None,
    }
}

/// Metabolite identifier of the free amino acid for a one-letter residue code
#[must_use]
pub fn amino_acid_metabolite(residue: char) -> Option<&'static str> {
    let id = match residue.to_ascii_uppercase() {
        'A' => "ala__L_c",
        'R' => "arg__L_c",
        'N' => "asn__L_c",
        'D' => "asp__L_c",
        'C' => "cys__L_c",
        'Q' => "gln__L_c",
        'E' => "glu__L_c",
        'G' => "gly_c",
        'H' => "his__L_c",
        'I' => "ile__L_c",
        'L' => "leu__L_c",
        'K' => "lys__L_c",
        'M' => "met__L_c",
        'F' => "phe__L_c",
        'P' => "pro__L_c",
        'S' => "ser__L_c",
        'T' => "thr__L_c",
        'W' => "trp__L_c",
        'Y' => "tyr__L_c",
        'V' => "val__L_c",
        'U' => "sec_c",
        _ => return None,
    };
    Some(id)
}

/// Translate one codon with the bacterial code (table 11), returning `None` for stops
#[must_use]
pub fn translate_codon(codon: &str) -> Option<char> {
    let codon = codon.to_ascii_uppercase().replace('T', "U");
    let residue = match codon.as_str() {
        "UUU" | "UUC" => 'F',
        "UUA" | "UUG" | "CUU" | "CUC" | "CUA" | "CUG" => 'L',
        "AUU" | "AUC" | "AUA" => 'I',
        "AUG" => 'M',
        "GUU" | "GUC" | "GUA" | "GUG" => 'V',
        "UCU" | "UCC" | "UCA" | "UCG" | "AGU" | "AGC" => 'S',
        "CCU" | "CCC" | "CCA" | "CCG" => 'P',
        "ACU" | "ACC" | "ACA" | "ACG" => 'T',
        "GCU" | "GCC" | "GCA" | "GCG" => 'A',
        "UAU" | "UAC" => 'Y',
        "CAU" | "CAC" => 'H',
        "CAA" | "CAG" => 'Q',
        "AAU" | "AAC" => 'N',
        "AAA" | "AAG" => 'K',
        "GAU" | "GAC" => 'D',
        "GAA" | "GAG" => 'E',
        "UGU" | "UGC" => 'C',
        "UGG" => 'W',
        "CGU" | "CGC" | "CGA" | "CGG" | "AGA" | "AGG" => 'R',
        "GGU" | "GGC" | "GGA" | "GGG" => 'G',
        _ => return None,
    };
    Some(residue)
}

/// Whether a codon is one of the three stop codons
#[must_use]
pub fn is_stop_codon(codon: &str) -> bool {
    matches!(
        codon.to_ascii_uppercase().replace('T', "U").as_str(),
        "UAA" | "UAG" | "UGA"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_rna() {
        assert!(!ProductType::Protein.is_stable_rna());
        assert!(ProductType::Trna.is_stable_rna());
        assert!(ProductType::Rrna.is_stable_rna());
    }

    #[test]
    fn test_codon_translation() {
        assert_eq!(translate_codon("ATG"), Some('M'));
        assert_eq!(translate_codon("gcu"), Some('A'));
        assert_eq!(translate_codon("TAA"), None);
        assert!(is_stop_codon("TGA"));
        assert!(!is_stop_codon("TGG"));
    }

    #[test]
    fn test_nucleotide_index() {
        assert_eq!(nucleotide_index('a'), Some(0));
        assert_eq!(nucleotide_index('T'), Some(3));
        assert_eq!(nucleotide_index('U'), Some(3));
        assert_eq!(nucleotide_index('N'), None);
    }

    #[test]
    fn test_strand_serde() {
        let json = serde_json::to_string(&Strand::Minus).unwrap();
        assert_eq!(json, "\"-\"");
        let parsed: Strand = serde_json::from_str("\"+\"").unwrap();
        assert_eq!(parsed, Strand::Plus);
    }
}
