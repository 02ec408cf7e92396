//! End-to-end tests for parsing and assembly
//!
//! Covers the bundled schemas and small fixture registries with deliberately
//! overlapping templates.

use eo_naming::{
    ExampleStatus, FieldMap, SchemaDocument, SchemaError, SchemaRegistry, SchemaStatus, Scope, Transcoder,
};

fn bundled() -> Transcoder {
    Transcoder::new(SchemaRegistry::bundled().unwrap())
}

fn fixtures(sources: &[&str]) -> Transcoder {
    let mut registry = SchemaRegistry::new();
    for source in sources {
        registry.insert(SchemaDocument::from_json(source).unwrap()).unwrap();
    }
    Transcoder::new(registry)
}

fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

const OPTIONAL: &str = include_str!("fixtures/optional_scenario.json");
const ONE_OF: &str = include_str!("fixtures/one_of.json");
const ALPHA_V1: &str = include_str!("fixtures/overlap_alpha_v1.json");
const ALPHA_V2: &str = include_str!("fixtures/overlap_alpha_v2.json");
const BETA: &str = include_str!("fixtures/overlap_beta.json");
const MALFORMED: &str = include_str!("fixtures/malformed_required.json");

const S2_L2A: &str = "S2B_MSIL2A_20241123T224759_N0511_R101_T03VUL_20241123T230829.SAFE";

// =============================================================================
// Round-trip law
// =============================================================================

#[test]
fn test_bundled_examples_round_trip() {
    let transcoder = bundled();
    let mut checked = 0;

    for doc in transcoder.registry().iter() {
        for example in doc.examples() {
            let parsed = transcoder.parse(example, Scope::Document(doc)).unwrap();
            let assembled = transcoder.assemble(&parsed.fields, Scope::Document(doc)).unwrap();
            assert_eq!(&assembled, example, "schema {}", doc.key());
            checked += 1;
        }
    }
    assert_eq!(checked, 8);
}

#[test]
fn test_bundled_validation_is_clean() {
    let transcoder = bundled();
    let reports = transcoder.validate_all();
    assert_eq!(reports.len(), 4);
    for report in &reports {
        assert!(report.is_clean(), "{}: {:?} {:?}", report.schema_id, report.outcomes, report.warnings);
    }
}

#[test]
fn test_fixture_examples_validate() {
    let transcoder = fixtures(&[OPTIONAL, ONE_OF]);
    for report in transcoder.validate_all() {
        assert_eq!(report.passed(), report.outcomes.len(), "{}", report.schema_id);
    }
}

// =============================================================================
// Sentinel-2
// =============================================================================

#[test]
fn test_parse_sentinel2_expands_semantic_fields() {
    let parsed = bundled().parse(S2_L2A, Scope::All).unwrap();
    assert_eq!(parsed.schema_id, "esa:sentinel:s2");
    assert_eq!(parsed.family, "S2");
    assert_eq!(parsed.status, SchemaStatus::Current);

    let f = &parsed.fields;
    assert_eq!(f["mission"], "S2B");
    assert_eq!(f["platform"], "sentinel-2b");
    assert_eq!(f["constellation"], "sentinel-2");
    assert_eq!(f["processing:level"], "L2A");
    assert_eq!(f["s2:product_type"], "MSIL2A");
    assert_eq!(f["datetime"], "2024-11-23T22:47:59Z");
    assert_eq!(f["s2:processing_baseline"], "05.11");
    assert_eq!(f["sat:relative_orbit"], "101");
    assert_eq!(f["grid:code"], "MGRS-03VUL");
    assert_eq!(f["extension"], "SAFE");
}

#[test]
fn test_assemble_sentinel2_from_semantic_fields_only() {
    let supplied = fields(&[
        ("platform", "sentinel-2b"),
        ("constellation", "sentinel-2"),
        ("instruments", "msi"),
        ("processing:level", "L2A"),
        ("datetime", "2024-11-23T22:47:59Z"),
        ("s2:processing_baseline", "05.11"),
        ("sat:relative_orbit", "101"),
        ("grid:code", "MGRS-03VUL"),
        ("generation_time", "20241123T230829"),
        ("extension", "SAFE"),
    ]);
    assert_eq!(bundled().assemble(&supplied, Scope::All).unwrap(), S2_L2A);
}

#[test]
fn test_preserved_original_overrides_token() {
    let transcoder = bundled();
    let mut parsed = transcoder.parse(S2_L2A, Scope::All).unwrap().fields;
    parsed.insert("s2:product_type".into(), "MSIL1C".into());

    let assembled = transcoder.assemble(&parsed, Scope::family("s2")).unwrap();
    assert_eq!(assembled, "S2B_MSIL1C_20241123T224759_N0511_R101_T03VUL_20241123T230829.SAFE");
}

#[test]
fn test_assemble_rejects_inconsistent_capture_fields() {
    let transcoder = bundled();
    let mut parsed = transcoder.parse(S2_L2A, Scope::All).unwrap().fields;
    parsed.remove("relative_orbit");
    parsed.insert("sat:relative_orbit".into(), "1O1".into());

    match transcoder.assemble(&parsed, Scope::family("s2")) {
        Err(SchemaError::AmbiguousOrUnknownMapping { field, reason, .. }) => {
            assert_eq!(field, "relative_orbit");
            assert!(reason.contains("\"R1O1\""), "{reason}");
        }
        other => panic!("expected AmbiguousOrUnknownMapping, got {:?}", other),
    }
}

#[test]
fn test_near_miss_diagnostics() {
    let err = bundled()
        .parse("S2B_MSIL3X_20241123T224759_N0511_R101_T03VUL_20241123T230829.SAFE", Scope::family("S2"))
        .unwrap_err();
    match err {
        SchemaError::NoSchemaMatched { nearest: Some(miss), .. } => {
            assert_eq!(miss.schema_id, "esa:sentinel:s2");
            assert_eq!(miss.segment, "product_type");
            assert_eq!(miss.value, "MSIL3X");
            assert_eq!(miss.offset, 4);
        }
        other => panic!("expected NoSchemaMatched with a near miss, got {:?}", other),
    }
}

// =============================================================================
// Sentinel-1 and CLMS
// =============================================================================

#[test]
fn test_parse_sentinel1_adjacent_placeholders() {
    let parsed = bundled()
        .parse("S1A_IW_SLC__1SDV_20250105T053021_20250105T053048_057321_070F2E_ABC1.SAFE", Scope::All)
        .unwrap();
    let f = &parsed.fields;
    assert_eq!(f["product_type"], "SLC");
    assert_eq!(f["resolution"], "_");
    assert_eq!(f["processing_level"], "1");
    assert_eq!(f["polarisation"], "DV");
    assert_eq!(f["sar:polarizations"], "VV,VH");
    assert_eq!(f["sat:absolute_orbit"], "057321");
    assert_eq!(f["end_datetime"], "2025-01-05T05:30:48Z");
}

#[test]
fn test_clms_version_selection() {
    let transcoder = bundled();

    let current = transcoder.parse("CZ_BAR_T32TNS_20210202_V101.zip", Scope::All).unwrap();
    assert_eq!(current.version.to_string(), "1.0.0");
    assert_eq!(transcoder.assemble(&current.fields, Scope::All).unwrap(), "CZ_BAR_T32TNS_20210202_V101.zip");

    // Only the deprecated version knows .gpkg
    let old = transcoder.parse("CZ_FOO_T32TNS_20210101_V100.gpkg", Scope::All).unwrap();
    assert_eq!(old.version.to_string(), "0.0.0");
    assert_eq!(old.status, SchemaStatus::Deprecated);
    assert_eq!(old.fields["tile_id"], "T32TNS");

    // Automatic assembly uses the current version, which rejects gpkg
    assert!(matches!(
        transcoder.assemble(&old.fields, Scope::All),
        Err(SchemaError::InvalidFieldValue { ref field, .. }) if field == "extension"
    ));
    let pinned = transcoder.assemble(&old.fields, Scope::family_version("cz", "0.0.0")).unwrap();
    assert_eq!(pinned, "CZ_FOO_T32TNS_20210101_V100.gpkg");
}

#[test]
fn test_clms_eea_grid_tile() {
    let parsed = bundled().parse("CZ_BAZ_W012S003_20220315_V200", Scope::family("CZ")).unwrap();
    assert_eq!(parsed.fields["tile_id"], "W012S003");
    assert_eq!(parsed.fields["datetime"], "2022-03-15T00:00:00Z");
    assert!(!parsed.fields.contains_key("extension"));
}

// =============================================================================
// Fixture registries
// =============================================================================

#[test]
fn test_optional_group_omission() {
    let transcoder = fixtures(&[OPTIONAL]);
    let base = fields(&[("platform", "S2B"), ("level", "L2A"), ("datetime", "20241123T224759")]);
    assert_eq!(transcoder.assemble(&base, Scope::All).unwrap(), "S2B_L2A_20241123T224759");

    let mut with_ext = base.clone();
    with_ext.insert("extension".into(), "SAFE".into());
    assert_eq!(transcoder.assemble(&with_ext, Scope::All).unwrap(), "S2B_L2A_20241123T224759.SAFE");

    assert_eq!(transcoder.parse("S2B_L2A_20241123T224759", Scope::All).unwrap().fields, base);
    assert_eq!(transcoder.parse("S2B_L2A_20241123T224759.SAFE", Scope::All).unwrap().fields, with_ext);
}

#[test]
fn test_one_of_acceptance() {
    let transcoder = fixtures(&[ONE_OF]);
    for accepted in ["ID_A", "ID_X09"] {
        assert!(transcoder.parse(accepted, Scope::All).is_ok(), "{accepted}");
    }
    for rejected in ["ID_C", "ID_x09"] {
        assert!(transcoder.parse(rejected, Scope::All).is_err(), "{rejected}");
    }
}

#[test]
fn test_exclusivity_of_match() {
    let transcoder = fixtures(&[BETA, ALPHA_V2, ALPHA_V1]);

    // ALPHA sorts before BETA, and its current version before the newer draft
    let parsed = transcoder.parse("EO1_ABC", Scope::All).unwrap();
    assert_eq!(parsed.schema_id, "fixture:alpha");
    assert_eq!(parsed.version.to_string(), "1.0.0");

    let order: Vec<String> = transcoder
        .registry()
        .candidates(Scope::All)
        .unwrap()
        .iter()
        .map(|d| d.key())
        .collect();
    assert_eq!(order, vec!["fixture:alpha@1.0.0", "fixture:alpha@2.0.0", "fixture:beta@1.0.0"]);
}

#[test]
fn test_automatic_assembly_ambiguity() {
    let transcoder = fixtures(&[ALPHA_V1, BETA]);
    let supplied = fields(&[("mission", "EO1"), ("code", "ABC")]);
    match transcoder.assemble(&supplied, Scope::All) {
        Err(SchemaError::AmbiguousSchemaSelection { candidates }) => {
            assert_eq!(candidates, vec!["fixture:alpha@1.0.0", "fixture:beta@1.0.0"]);
        }
        other => panic!("expected AmbiguousSchemaSelection, got {:?}", other),
    }

    // A code only alpha accepts narrows it down
    let digits = fields(&[("mission", "EO1"), ("code", "A1")]);
    assert_eq!(transcoder.assemble(&digits, Scope::All).unwrap(), "EO1_A1");
}

#[test]
fn test_shadowed_examples_are_reported() {
    let mut beta: serde_json::Value = serde_json::from_str(BETA).unwrap();
    beta["examples"] = serde_json::json!(["EO1_XYZ"]);
    let beta = beta.to_string();
    let transcoder = fixtures(&[ALPHA_V1, beta.as_str()]);

    let report = transcoder
        .validate_examples(transcoder.registry().resolve("beta", None).unwrap());
    assert_eq!(report.outcomes[0].status, ExampleStatus::Passed);
    assert_eq!(report.warnings.len(), 1);
    assert!(!report.is_clean());
}

#[test]
fn test_malformed_document_is_rejected() {
    match SchemaDocument::from_json(MALFORMED) {
        Err(SchemaError::MalformedSchema { schema_id, reason }) => {
            assert_eq!(schema_id, "fixture:malformed");
            assert!(reason.contains("'c'"));
        }
        other => panic!("expected MalformedSchema, got {:?}", other.map(|d| d.key())),
    }
}

#[test]
fn test_determinism() {
    let transcoder = bundled();
    let first = transcoder.parse(S2_L2A, Scope::All).unwrap();
    let assembled = transcoder.assemble(&first.fields, Scope::All).unwrap();
    for _ in 0..5 {
        let again = transcoder.parse(S2_L2A, Scope::All).unwrap();
        assert_eq!(again, first);
        assert_eq!(transcoder.assemble(&again.fields, Scope::All).unwrap(), assembled);
    }
}
