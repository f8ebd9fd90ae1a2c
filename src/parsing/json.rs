use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::core::organism::{OrganismInputs, ReferenceOrganism};
use crate::curation::kinds::CurationEntry;
use crate::parsing::ParseError;

/// Check if the path names a gzip-compressed file
#[must_use]
pub fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Read a whole file as text, decompressing `.gz` files
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or decompressed.
pub fn read_text(path: &Path) -> Result<String, ParseError> {
    let file = File::open(path)?;
    let mut text = String::new();
    if is_gzipped(path) {
        BufReader::new(GzDecoder::new(file)).read_to_string(&mut text)?;
    } else {
        BufReader::new(file).read_to_string(&mut text)?;
    }
    Ok(text)
}

/// Deserialize a JSON document
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::Json` naming the file if the document does not match `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ParseError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| ParseError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write text to a file, gzip-compressing when the path ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be written.
pub fn write_text(path: &Path, contents: &str) -> Result<(), ParseError> {
    let file = File::create(path)?;
    if is_gzipped(path) {
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(contents.as_bytes())?;
        encoder.finish()?;
    } else {
        let mut file = file;
        file.write_all(contents.as_bytes())?;
    }
    Ok(())
}

/// Read organism inputs: annotation, transcription units and network
///
/// # Errors
///
/// Returns a [`ParseError`] if the file cannot be read or deserialized.
pub fn read_organism(path: &Path) -> Result<OrganismInputs, ParseError> {
    read_json(path)
}

/// Read a reference organism with its curation
///
/// # Errors
///
/// Returns a [`ParseError`] if the file cannot be read or deserialized.
pub fn read_reference(path: &Path) -> Result<ReferenceOrganism, ParseError> {
    read_json(path)
}

/// A curation file: a bare list of entries or an object holding one
#[derive(Deserialize)]
#[serde(untagged)]
enum CurationFile {
    List(Vec<CurationEntry>),
    Table { entries: Vec<CurationEntry> },
}

/// Read a curation table of any mix of kinds
///
/// # Errors
///
/// Returns `ParseError::Json` if an entry has an unknown kind or is missing
/// a field of its kind.
pub fn read_curation(path: &Path) -> Result<Vec<CurationEntry>, ParseError> {
    Ok(match read_json::<CurationFile>(path)? {
        CurationFile::List(entries) | CurationFile::Table { entries } => entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curation::kinds::CurationKind;
    use tempfile::tempdir;

    const CURATION: &str = r#"[
        {"kind": "sigma_factor", "gene": "g_sig", "housekeeping": true},
        {"kind": "reaction_keff", "reaction": "GLCK", "keff": 50.0}
    ]"#;

    #[test]
    fn test_read_curation_list_and_table() {
        let dir = tempdir().unwrap();
        let list = dir.path().join("list.json");
        std::fs::write(&list, CURATION).unwrap();
        let table = dir.path().join("table.json");
        std::fs::write(&table, format!(r#"{{"entries": {CURATION}}}"#)).unwrap();

        for path in [list, table] {
            let entries = read_curation(&path).unwrap();
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].kind(), CurationKind::SigmaFactor);
            assert_eq!(entries[1].key(), "GLCK");
        }
    }

    #[test]
    fn test_gzip_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("curation.json.gz");
        write_text(&path, CURATION).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        assert_eq!(read_curation(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_kind_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"[{"kind": "operon_layout", "id": "x"}]"#).unwrap();

        let err = read_curation(&path).unwrap_err();
        assert!(matches!(err, ParseError::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_is_gzipped() {
        assert!(is_gzipped(Path::new("inputs.json.gz")));
        assert!(is_gzipped(Path::new("inputs.JSON.GZ")));
        assert!(!is_gzipped(Path::new("inputs.json")));
    }
}
