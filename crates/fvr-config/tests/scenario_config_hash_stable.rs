//! Config hash stability.
//!
//! GREEN when:
//! - the same layers hash identically on every load;
//! - key order inside a YAML document does not change the hash;
//! - different values produce different hashes;
//! - later layers override earlier ones.

use fvr_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
github:
  owner: "reichlab"
  repo: "covid19-forecast-hub"
  token_env: "FVR_GITHUB_TOKEN"
comparison:
  precision:
    canonical: 6
    revision: 4
  display_timezone: "US/Eastern"
"#;

const BASE_YAML_REORDERED: &str = r#"
comparison:
  display_timezone: "US/Eastern"
  precision:
    revision: 4
    canonical: 6
github:
  token_env: "FVR_GITHUB_TOKEN"
  repo: "covid19-forecast-hub"
  owner: "reichlab"
"#;

const OVERLAY_YAML: &str = r#"
comparison:
  precision:
    revision: 6
driver:
  concurrency: 4
"#;

#[test]
fn same_input_produces_identical_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
}

#[test]
fn reordered_keys_produce_same_hash() {
    let original = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let reordered = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(
        original.config_hash, reordered.config_hash,
        "reordering keys in YAML must not change the hash"
    );
}

#[test]
fn different_values_produce_different_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(a.config_hash, b.config_hash);
}

#[test]
fn overlay_overrides_only_named_leaves() {
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();

    let revision = merged
        .config_json
        .pointer("/comparison/precision/revision")
        .and_then(|v| v.as_u64())
        .unwrap();
    assert_eq!(revision, 6, "overlay should override revision precision");

    let canonical = merged
        .config_json
        .pointer("/comparison/precision/canonical")
        .and_then(|v| v.as_u64())
        .unwrap();
    assert_eq!(canonical, 6, "base canonical precision must survive the merge");

    assert_eq!(
        merged.config_json.pointer("/github/owner").and_then(|v| v.as_str()),
        Some("reichlab")
    );
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn empty_document_is_an_empty_layer() {
    let a = load_layered_yaml_from_strings(&["{}"]).unwrap();
    let b = load_layered_yaml_from_strings(&[""]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, "{}");
}
