use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use genotypeload::error::LoadError;
use genotypeload::keys::{Counter, KeyAllocator};
use genotypeload::store::{ReferenceStore, SnapshotStore};

const SNAPSHOT: &str = r#"{
  "maxima": {"genotype": 10, "allele_pair": 20, "accession": 30, "note": 40},
  "accession_max": {"MGI:": 5000},
  "accessions": [
    {"acc_id": "MGI:97490", "mgi_type": 2, "object_key": 9},
    {"acc_id": "MGI:1856126", "mgi_type": 11, "object_key": 8, "status": 847114}
  ],
  "terms": [{"vocab": 39, "term": "Homozygous", "key": 847138}],
  "users": [{"login": "jsmith", "key": 1400}]
}"#;

fn write_snapshot() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("store.json")).unwrap();
    fs::write(path.as_std_path(), SNAPSHOT).unwrap();
    (temp, path)
}

#[test]
fn open_and_resolve() {
    let (_temp, path) = write_snapshot();
    let store = SnapshotStore::open(&path).unwrap();

    assert_eq!(store.accession("mgi:97490", 2).unwrap().object_key, 9);
    assert!(store.accession("MGI:97490", 11).is_none());
    assert_eq!(
        store.accession("MGI:1856126", 11).unwrap().status_key,
        Some(847114)
    );
    assert_eq!(store.term(39, "homozygous"), Some(847138));
    assert_eq!(store.user("jsmith"), Some(1400));
    assert_eq!(store.user("JSMITH"), None);
    assert_eq!(store.location(), path.to_string());
}

#[test]
fn seeding_starts_after_the_maxima() {
    let (_temp, path) = write_snapshot();
    let store = SnapshotStore::open(&path).unwrap();
    let mut keys = KeyAllocator::seed(&store, "MGI:").unwrap();

    assert_eq!(keys.next(Counter::Genotype), 11);
    assert_eq!(keys.next(Counter::Genotype), 12);
    assert_eq!(keys.peek(Counter::Note), 41);
    assert_eq!(keys.next(Counter::AccessionNumber), 5001);
}

#[test]
fn unknown_prefix_cannot_seed() {
    let (_temp, path) = write_snapshot();
    let store = SnapshotStore::open(&path).unwrap();
    let err = KeyAllocator::seed(&store, "J:").unwrap_err();
    assert_matches!(err, LoadError::Seed(_));
}

#[test]
fn advanced_maximum_survives_reopen() {
    let (_temp, path) = write_snapshot();
    let mut store = SnapshotStore::open(&path).unwrap();
    store.advance_accession_max("MGI:", 7).unwrap();

    let reopened = SnapshotStore::open(&path).unwrap();
    assert_eq!(reopened.maxima("MGI:").unwrap().accession_number, 5007);
    assert_eq!(reopened.user("jsmith"), Some(1400));
}

#[test]
fn missing_store_is_an_error() {
    let err = SnapshotStore::open(&Utf8PathBuf::from("/nonexistent/store.json")).unwrap_err();
    assert_matches!(err, LoadError::StoreRead(_));
}
