//! Filesystem store and writer behavior on a real directory

use genkit_layer::{
    ArtifactStore, ArtifactWriter, FsStore, GoNormalizer, Normalizer, OverlayStore, SchemaNormalizer, StoreError,
    WriteError, WriteStatus,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::path::Path;

#[test]
fn fs_store_creates_parents_and_replaces() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user/pkg/http/handler.go");
    let store = FsStore::new();

    assert!(!store.exists(&path).unwrap());
    store.write(&path, "package http\n", false).unwrap();
    assert_eq!(store.read(&path).unwrap(), "package http\n");

    let err = store.write(&path, "package other\n", false).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
    assert_eq!(store.read(&path).unwrap(), "package http\n");

    store.write(&path, "package http\n\nvar x = 1\n", true).unwrap();
    assert_eq!(store.read(&path).unwrap(), "package http\n\nvar x = 1\n");
}

#[test]
fn fs_store_leaves_no_temp_files_behind() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new();
    store.write(&dir.path().join("a.go"), "package a\n", true).unwrap();
    store.write(&dir.path().join("a.go"), "package a\n\nvar b = 2\n", true).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.go"]);
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = FsStore::new().read(&dir.path().join("nope.go")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn failed_normalization_keeps_prior_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user.proto");
    std::fs::write(&path, "syntax = \"proto3\";\n").unwrap();

    let store = FsStore::new();
    let err = ArtifactWriter::new(&store)
        .commit(&path, "service {", &SchemaNormalizer::new())
        .unwrap_err();
    assert!(matches!(err, WriteError::Normalize(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "syntax = \"proto3\";\n");
}

#[test]
fn dry_run_overlay_does_not_touch_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handler.go");
    std::fs::write(&path, "package http\n").unwrap();

    let fs = FsStore::new();
    let overlay = OverlayStore::new(&fs);
    let status = ArtifactWriter::new(&overlay)
        .commit(&path, "package http\n\nvar x = 1\n", &GoNormalizer::new())
        .unwrap();

    assert_eq!(status, WriteStatus::Updated);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "package http\n");
    assert_eq!(overlay.changes().keys().map(|p| p.as_path()).collect::<Vec<_>>(), [path.as_path()]);
    assert!(!overlay.exists(Path::new("/definitely/not/here.go")).unwrap());
}

fn go_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        Just("import (".to_string()),
        Just(")".to_string()),
        Just("\t\"fmt\"".to_string()),
        Just("\t\"context\"".to_string()),
        Just("// note".to_string()),
        "[a-z]{1,6} := [0-9]{1,3}[ \t]{0,2}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn go_normalizer_is_idempotent(lines in prop::collection::vec(go_line(), 0..16)) {
        let mut text = String::from("package a\n");
        text.push_str(&lines.join("\n"));
        let once = GoNormalizer::new().normalize(&text).unwrap();
        let twice = GoNormalizer::new().normalize(&once).unwrap();
        prop_assert_eq!(once, twice);
    }
}
