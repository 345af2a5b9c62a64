use std::fs;
use tempfile::tempdir;
use wfc_rules::loader::load_from_file;
use wfc_rules::{LoadError, TileId};

// Helper function to create the full path to test data
fn test_data_path(filename: &str) -> std::path::PathBuf {
    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("rules_data");
    path.push(filename);
    path
}

#[test]
fn test_load_valid_simple() {
    let path = test_data_path("valid_simple.ron");
    let (tileset, rules) = load_from_file(&path).expect("valid_simple.ron should load");

    assert_eq!(tileset.num_tiles(), 2);
    let a = tileset.find("A").unwrap();
    let b = tileset.find("B").unwrap();
    assert_eq!(tileset.glyph(a), Some('A'));

    assert_eq!(rules.num_tiles(), 2);
    assert_eq!(rules.num_axes(), 6);

    assert!(rules.check(a, a, 0)); // A-A +x
    assert!(rules.check(b, b, 3)); // B-B -y
    assert!(rules.check(a, b, 0)); // A-B +x
    assert!(rules.check(b, a, 1)); // B-A -x
    assert_eq!(rules.weight(a, b, 0), 2);
    assert_eq!(rules.weight(a, a, 0), 1);

    assert!(!rules.check(a, b, 1)); // A-B -x (not defined)
    assert!(!rules.check(b, a, 0)); // B-A +x (not defined)
    assert!(!rules.check(a, b, 2)); // A-B +y
    assert!(rules.is_symmetric());
}

#[test]
fn test_load_example_layout() {
    let path = test_data_path("coast.txt");
    let (tileset, rules) = load_from_file(&path).expect("coast.txt should load");

    assert_eq!(tileset.num_tiles(), 2);
    let water = tileset.find_glyph('~').unwrap();
    let land = tileset.find_glyph('.').unwrap();
    assert_eq!(water, TileId(0));
    assert_eq!(rules.num_axes(), 4);

    // Water is only ever seen to the left of land, never to the right.
    assert!(rules.check(water, land, 0));
    assert!(!rules.check(land, water, 0));
    // Three rows each hold exactly one water->land transition along +x.
    assert_eq!(rules.weight(water, land, 0), 3);
    assert!(rules.is_symmetric());
}

#[test]
fn test_load_missing_file() {
    let path = test_data_path("does_not_exist.ron");
    assert!(matches!(load_from_file(&path), Err(LoadError::Io(_))));
}

#[test]
fn test_load_invalid_ron_from_tempfile() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.ron");
    fs::write(&path, "(tiles: [(name: \"A\")], adjacency: [(from: \"A\"").unwrap();
    assert!(matches!(load_from_file(&path), Err(LoadError::ParseError(_))));
}

#[test]
fn test_extension_selects_parser() {
    let dir = tempdir().unwrap();
    // The same text is a valid example layout but not valid RON.
    let content = "ab\nba\n";
    let as_text = dir.path().join("layout.txt");
    let as_ron = dir.path().join("layout.RON");
    fs::write(&as_text, content).unwrap();
    fs::write(&as_ron, content).unwrap();

    let (tileset, _) = load_from_file(&as_text).unwrap();
    assert_eq!(tileset.num_tiles(), 2);
    assert!(load_from_file(&as_ron).is_err());
}
