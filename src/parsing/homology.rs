use std::path::Path;

use crate::homology::HomologyMatch;
use crate::parsing::json::read_text;
use crate::parsing::ParseError;
use crate::utils::validation::MAX_HOMOLOGY_MATCHES;

/// Column count of BLAST tabular output (`-outfmt 6`)
const BLAST_COLUMNS: usize = 12;

/// Parse a homology table file, plain or gzip compressed
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_homology_file(path: &Path) -> Result<Vec<HomologyMatch>, ParseError> {
    let text = read_text(path)?;
    parse_homology_text(&text)
}

fn parse_number(field: &str, what: &str, line_num: usize) -> Result<f64, ParseError> {
    let value: f64 = field.trim().parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid {what} on line {line_num}: '{field}'"))
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseError::InvalidFormat(format!(
            "Non-finite {what} on line {line_num}: '{field}'"
        )))
    }
}

/// Parse tab-separated reciprocal best hits.
///
/// Accepted layouts:
/// - `organism_gene  reference_gene  score  [evalue]`
/// - BLAST outfmt 6, where `qseqid` is the organism gene, `sseqid` the
///   reference gene, the bitscore the score
///
/// A missing e-value is read as 0.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for short lines or bad numbers, or
/// `ParseError::TooManyMatches` if the limit is exceeded.
pub fn parse_homology_text(text: &str) -> Result<Vec<HomologyMatch>, ParseError> {
    let mut matches = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();

        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if first == "organism_gene" || first == "qseqid" || first == "query" {
                continue;
            }
        }

        let line_num = i + 1;
        let (score, evalue) = match fields.len() {
            3 => (parse_number(fields[2], "score", line_num)?, 0.0),
            4..=11 => (
                parse_number(fields[2], "score", line_num)?,
                parse_number(fields[3], "e-value", line_num)?,
            ),
            n if n >= BLAST_COLUMNS => (
                parse_number(fields[11], "bitscore", line_num)?,
                parse_number(fields[10], "e-value", line_num)?,
            ),
            _ => {
                return Err(ParseError::InvalidFormat(format!(
                    "Line {line_num} has fewer than 3 fields"
                )))
            }
        };

        if matches.len() >= MAX_HOMOLOGY_MATCHES {
            return Err(ParseError::TooManyMatches(matches.len() + 1));
        }
        matches.push(HomologyMatch::new(fields[0], fields[1], score, evalue));
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let tsv = "organism_gene\treference_gene\tscore\tevalue\n\
                   g_rps\tb3303\t412\t1e-80\n\
                   g_rrn\tb3851\t98.5\n";
        let matches = parse_homology_text(tsv).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].organism_gene, "g_rps");
        assert_eq!(matches[0].reference_gene, "b3303");
        assert!((matches[0].evalue - 1e-80).abs() < f64::EPSILON);
        assert!((matches[1].score - 98.5).abs() < f64::EPSILON);
        assert!(matches[1].evalue.abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_blast_outfmt6() {
        let tsv = "# BLASTP 2.14.0+\n\
                   g_rps\tb3303\t87.2\t118\t15\t0\t1\t118\t1\t118\t3.1e-70\t240\n";
        let matches = parse_homology_text(tsv).unwrap();
        assert_eq!(matches.len(), 1);
        assert!((matches[0].score - 240.0).abs() < f64::EPSILON);
        assert!((matches[0].evalue - 3.1e-70).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_lines() {
        assert!(matches!(
            parse_homology_text("g_rps\tb3303\n"),
            Err(ParseError::InvalidFormat(_))
        ));
        let err = parse_homology_text("g_rps\tb3303\thigh\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
        assert!(parse_homology_text("g_rps\tb3303\tinf\n").is_err());
    }

    #[test]
    fn test_empty_table() {
        assert!(parse_homology_text("# nothing\n\n").unwrap().is_empty());
    }
}
