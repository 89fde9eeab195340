use std::path::{Path, PathBuf};

use bincode::Options;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use sled::{Config, Db, IVec, Tree};
use tracing::warn;

use crate::{
    application::services::CatalogStore,
    domain::{DomainError, TattooDraft, TattooRecord},
};

const TATTOOS_TREE: &str = "tattoos";

/// Embedded catalog store backed by `sled`.
///
/// Records live in a single tree keyed by big-endian ids from
/// `Db::generate_id`, so iteration order is insertion order.
pub struct SledCatalogStore {
    db: Db,
    tattoos: Tree,
    _data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SledCatalogStore {
    /// Opens (or creates) a sled database rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|err| {
            DomainError::storage(format!("failed to create data directory {:?}: {err}", dir))
        })?;

        let db = Config::default()
            .path(&dir)
            .cache_capacity(16 * 1024 * 1024)
            .open()
            .map_err(|err| DomainError::storage(format!("failed to open sled db: {err}")))?;

        let tattoos = db
            .open_tree(TATTOOS_TREE)
            .map_err(|err| DomainError::storage(format!("failed to open tattoos tree: {err}")))?;

        Ok(Self {
            db,
            tattoos,
            _data_dir: dir,
            write_lock: Mutex::new(()),
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .serialize(value)
            .map_err(|err| DomainError::storage(format!("serialization error: {err}")))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
        bincode::options()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .deserialize(bytes)
            .map_err(|err| DomainError::storage(format!("deserialization error: {err}")))
    }

    fn encode_key(id: u64) -> [u8; 8] {
        id.to_be_bytes()
    }

    fn decode_record(bytes: &IVec) -> Result<TattooRecord, DomainError> {
        Self::deserialize(bytes.as_ref())
    }

    #[cfg(test)]
    fn insert_raw(&self, id: u64, bytes: &[u8]) -> Result<(), DomainError> {
        self.tattoos
            .insert(Self::encode_key(id), bytes)
            .map(|_| ())
            .map_err(|err| DomainError::storage(format!("failed to insert raw row: {err}")))
    }
}

impl CatalogStore for SledCatalogStore {
    fn insert(&self, draft: TattooDraft) -> Result<TattooRecord, DomainError> {
        let _guard = self.write_lock.lock();

        let id = self
            .db
            .generate_id()
            .map_err(|err| DomainError::storage(format!("failed to allocate id: {err}")))?
            + 1;
        let record = TattooRecord::new(id, draft);

        let bytes = Self::serialize(&record)?;
        self.tattoos
            .insert(Self::encode_key(record.id), bytes)
            .map_err(|err| DomainError::storage(format!("failed to persist tattoo: {err}")))?;

        self.tattoos
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush tattoos: {err}")))?;

        Ok(record)
    }

    fn get(&self, id: u64) -> Result<Option<TattooRecord>, DomainError> {
        self.tattoos
            .get(Self::encode_key(id))
            .map_err(|err| DomainError::storage(format!("failed to read tattoo {id}: {err}")))?
            .map(|value| Self::decode_record(&value))
            .transpose()
    }

    fn list(&self) -> Result<Vec<TattooRecord>, DomainError> {
        let mut records = Vec::new();

        for entry in self.tattoos.iter() {
            let (key, value) = entry.map_err(|err| {
                DomainError::storage(format!("failed to read tattoo record: {err}"))
            })?;

            match Self::decode_record(&value) {
                Ok(record) => records.push(record),
                Err(err) => warn!(key = ?key.as_ref(), %err, "skipping malformed catalog row"),
            }
        }

        Ok(records)
    }

    fn count(&self) -> Result<usize, DomainError> {
        Ok(self.tattoos.len())
    }

    fn ping(&self) -> Result<(), DomainError> {
        self.db
            .flush()
            .map_err(|err| DomainError::storage(format!("failed to flush db: {err}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, description: &str, image: &str) -> TattooDraft {
        TattooDraft {
            name: name.into(),
            description: description.into(),
            image: image.into(),
        }
    }

    #[test]
    fn insert_assigns_increasing_ids_and_lists_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledCatalogStore::open(dir.path()).unwrap();

        let first = store.insert(draft("Koi", "koi fish", "koi.png")).unwrap();
        let second = store.insert(draft("Owl", "night owl", "owl.png")).unwrap();
        assert!(first.id >= 1);
        assert!(second.id > first.id);

        let listed = store.list().unwrap();
        assert_eq!(listed, vec![first.clone(), second]);
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get(first.id).unwrap(), Some(first));
        assert_eq!(store.get(9_999).unwrap(), None);
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = SledCatalogStore::open(dir.path()).unwrap();
            store.insert(draft("Rose", "rose with thorns", "rose.png")).unwrap().id
        };

        let reopened = SledCatalogStore::open(dir.path()).unwrap();
        let record = reopened.get(id).unwrap().unwrap();
        assert_eq!(record.description, "rose with thorns");
        assert!(reopened.ping().is_ok());
    }

    #[test]
    fn malformed_rows_are_skipped_when_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledCatalogStore::open(dir.path()).unwrap();
        let good = store.insert(draft("Moth", "death head moth", "moth.png")).unwrap();
        store.insert_raw(good.id + 100, &[0xde, 0xad]).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed, vec![good]);
    }
}
