use std::path::Path;

/// Curation kinds the embedded catalog may contain
const KNOWN_KINDS: &[&str] = &[
    "complex_stoichiometry",
    "complex_modification",
    "ribosome_stoich",
    "ribosome_subreaction",
    "rna_polymerase",
    "sigma_factor",
    "transcription_subreaction",
    "translation_initiation",
    "translation_elongation",
    "translation_termination",
    "peptide_release_factor",
    "trna_synthetase",
    "special_trna_subreaction",
    "trna_modification",
    "trna_modification_target",
    "rrna_modification",
    "rna_degradosome",
    "excision_machinery",
    "special_modification",
    "folding_mechanism",
    "translocation_pathway",
    "protein_location",
    "generic_component",
    "reaction_keff",
    "metabolite_mapping",
];

/// Kinds that are organism-specific and must never ship as umbrella defaults
const ORGANISM_ONLY_KINDS: &[&str] = &["reaction_keff", "metabolite_mapping", "protein_location"];

fn main() {
    let catalog_path = Path::new("catalogs/umbrella_defaults.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the umbrella defaults catalog before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    assert!(
        catalog.get("version").and_then(|v| v.as_str()).is_some(),
        "\n\nCATALOG BUILD ERROR: Missing 'version' string\n"
    );

    let entries = catalog.get("entries").unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Missing 'entries' field\n\
             The catalog must have a top-level 'entries' array.\n"
        );
    });

    let entries = entries.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: 'entries' must be an array\n\
             Got: {entries}\n"
        );
    });

    for (i, entry) in entries.iter().enumerate() {
        validate_entry(entry, i);
    }

    println!(
        "cargo:warning=Validated umbrella catalog: {} default entries",
        entries.len()
    );
}

fn validate_entry(entry: &serde_json::Value, index: usize) {
    let kind = entry
        .get("kind")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| {
            panic!("\n\nCATALOG BUILD ERROR: Entry at index {index} missing 'kind' field\n");
        });

    assert!(
        KNOWN_KINDS.contains(&kind),
        "\n\nCATALOG BUILD ERROR: Entry at index {index} has unknown kind '{kind}'\n"
    );

    assert!(
        !ORGANISM_ONLY_KINDS.contains(&kind),
        "\n\nCATALOG BUILD ERROR: Entry at index {index} has organism-specific kind '{kind}'\n\
         Only organism-agnostic machinery belongs in the umbrella catalog.\n"
    );

    // Coefficients must be finite numbers
    for field in ["components", "stoichiometry"] {
        if let Some(map) = entry.get(field).and_then(|v| v.as_object()) {
            for (id, coefficient) in map {
                assert!(
                    coefficient.as_f64().is_some_and(f64::is_finite),
                    "\n\nCATALOG BUILD ERROR: Entry at index {index} ({kind}) has a non-numeric \
                     coefficient for '{id}' in '{field}'\n"
                );
            }
        }
    }
}

fn set_build_dependencies() {
    println!("cargo:rerun-if-changed=catalogs/umbrella_defaults.json");
    println!("cargo:rerun-if-changed=build.rs");
}
