use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::Key;
use crate::error::LoadError;

/// An accession resolved to the object it identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessionRef {
    pub object_key: Key,
    pub status_key: Option<Key>,
}

/// Current persisted maxima for the five key sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreMaxima {
    pub genotype: Key,
    pub allele_pair: Key,
    pub accession: Key,
    pub note: Key,
    pub accession_number: Key,
}

/// Read access to the reference database plus the one write the loader
/// performs on it: advancing the accession-number high-water mark.
pub trait ReferenceStore {
    fn accession(&self, acc_id: &str, mgi_type: Key) -> Option<AccessionRef>;
    fn term(&self, vocab: Key, term: &str) -> Option<Key>;
    fn user(&self, login: &str) -> Option<Key>;
    fn maxima(&self, prefix: &str) -> Result<StoreMaxima, LoadError>;
    fn advance_accession_max(&mut self, prefix: &str, by: u64) -> Result<(), LoadError>;
    fn location(&self) -> String;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub maxima: SnapshotMaxima,
    #[serde(default)]
    pub accession_max: BTreeMap<String, Key>,
    #[serde(default)]
    pub accessions: Vec<SnapshotAccession>,
    #[serde(default)]
    pub terms: Vec<SnapshotTerm>,
    #[serde(default)]
    pub users: Vec<SnapshotUser>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotMaxima {
    pub genotype: Option<Key>,
    pub allele_pair: Option<Key>,
    pub accession: Option<Key>,
    pub note: Option<Key>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotAccession {
    pub acc_id: String,
    pub mgi_type: Key,
    pub object_key: Key,
    #[serde(default)]
    pub status: Option<Key>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTerm {
    pub vocab: Key,
    pub term: String,
    pub key: Key,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotUser {
    pub login: String,
    pub key: Key,
}

/// Reference store backed by a JSON snapshot of the lookup tables.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: Option<Utf8PathBuf>,
    snapshot: Snapshot,
    accessions: HashMap<(Key, String), AccessionRef>,
    terms: HashMap<(Key, String), Key>,
    users: HashMap<String, Key>,
}

impl SnapshotStore {
    pub fn open(path: &Utf8Path) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| LoadError::StoreRead(path.to_path_buf()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|err| LoadError::StoreParse(err.to_string()))?;
        let mut store = Self::from_snapshot(snapshot);
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// In-memory store; nothing is written back.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let accessions = snapshot
            .accessions
            .iter()
            .map(|acc| {
                (
                    (acc.mgi_type, acc.acc_id.to_lowercase()),
                    AccessionRef {
                        object_key: acc.object_key,
                        status_key: acc.status,
                    },
                )
            })
            .collect();
        let terms = snapshot
            .terms
            .iter()
            .map(|term| ((term.vocab, term.term.to_lowercase()), term.key))
            .collect();
        let users = snapshot
            .users
            .iter()
            .map(|user| (user.login.clone(), user.key))
            .collect();

        Self {
            path: None,
            snapshot,
            accessions,
            terms,
            users,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn persist(&self) -> Result<(), LoadError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or(Utf8Path::new("."));
        let content = serde_json::to_vec_pretty(&self.snapshot)
            .map_err(|err| LoadError::StorePersist(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("genotypeload-store")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| LoadError::StorePersist(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| LoadError::StorePersist(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| LoadError::StorePersist(err.to_string()))?;
        Ok(())
    }
}

impl ReferenceStore for SnapshotStore {
    fn accession(&self, acc_id: &str, mgi_type: Key) -> Option<AccessionRef> {
        self.accessions
            .get(&(mgi_type, acc_id.trim().to_lowercase()))
            .copied()
    }

    fn term(&self, vocab: Key, term: &str) -> Option<Key> {
        self.terms.get(&(vocab, term.trim().to_lowercase())).copied()
    }

    fn user(&self, login: &str) -> Option<Key> {
        self.users.get(login).copied()
    }

    fn maxima(&self, prefix: &str) -> Result<StoreMaxima, LoadError> {
        let maxima = &self.snapshot.maxima;
        let require = |value: Option<Key>, name: &str| {
            value.ok_or_else(|| LoadError::Seed(name.to_string()))
        };
        Ok(StoreMaxima {
            genotype: require(maxima.genotype, "genotype")?,
            allele_pair: require(maxima.allele_pair, "allele pair")?,
            accession: require(maxima.accession, "accession")?,
            note: require(maxima.note, "note")?,
            accession_number: require(
                self.snapshot.accession_max.get(prefix).copied(),
                &format!("accession number ({prefix})"),
            )?,
        })
    }

    fn advance_accession_max(&mut self, prefix: &str, by: u64) -> Result<(), LoadError> {
        let current = self
            .snapshot
            .accession_max
            .get_mut(prefix)
            .ok_or_else(|| LoadError::Seed(format!("accession number ({prefix})")))?;
        *current += by;
        self.persist()
    }

    fn location(&self) -> String {
        match &self.path {
            Some(path) => path.to_string(),
            None => "in-memory".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample() -> Snapshot {
        Snapshot {
            maxima: SnapshotMaxima {
                genotype: Some(10),
                allele_pair: Some(20),
                accession: Some(30),
                note: Some(40),
            },
            accession_max: BTreeMap::from([("MGI:".to_string(), 500)]),
            accessions: vec![SnapshotAccession {
                acc_id: "MGI:1".to_string(),
                mgi_type: 10,
                object_key: 7,
                status: None,
            }],
            terms: vec![SnapshotTerm {
                vocab: 60,
                term: "Mouse Line".to_string(),
                key: 99,
            }],
            users: vec![SnapshotUser {
                login: "user1".to_string(),
                key: 1001,
            }],
        }
    }

    #[test]
    fn lookups() {
        let store = SnapshotStore::from_snapshot(sample());
        assert_eq!(store.accession("mgi:1", 10).unwrap().object_key, 7);
        assert!(store.accession("MGI:1", 11).is_none());
        assert_eq!(store.term(60, "mouse line"), Some(99));
        assert_eq!(store.user("user1"), Some(1001));
        assert_eq!(store.user("USER1"), None);
    }

    #[test]
    fn missing_maximum_fails_seeding() {
        let mut snapshot = sample();
        snapshot.maxima.note = None;
        let store = SnapshotStore::from_snapshot(snapshot);
        assert_matches!(store.maxima("MGI:"), Err(LoadError::Seed(_)));
        let store = SnapshotStore::from_snapshot(sample());
        assert_matches!(store.maxima("RRID:"), Err(LoadError::Seed(_)));
    }

    #[test]
    fn advance_persists_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("store.json")).unwrap();
        fs::write(path.as_std_path(), serde_json::to_vec(&sample()).unwrap()).unwrap();

        let mut store = SnapshotStore::open(&path).unwrap();
        store.advance_accession_max("MGI:", 3).unwrap();

        let reopened = SnapshotStore::open(&path).unwrap();
        assert_eq!(reopened.maxima("MGI:").unwrap().accession_number, 503);
    }
}
