//! Keyed storage for [`ChainRecord`]s.
//!
//! The protocol only ever talks to a [`RecordStore`]; hosts plug in whatever
//! persistent key-value engine they run.  [`MemoryRecordStore`] is the
//! in-process implementation used by tests and single-node tooling.

use {
    crate::state::ChainRecord,
    dashmap::DashMap,
    log::trace,
    thiserror::Error,
};

/// Errors raised by a record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A stored value could not be encoded or decoded.
    #[error("codec error for key {key:?}: {source}")]
    Codec {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing engine failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Storage primitives the protocol core consumes.
///
/// Implementations must make each call atomic with respect to its key; the
/// core never holds a record across calls for another peer.
pub trait RecordStore {
    /// Fetch the record for `peer_id`.
    fn get(&self, peer_id: &str) -> Result<Option<ChainRecord>, StoreError>;

    /// Insert or overwrite the record keyed by `record.peer_id`.
    fn set(&self, record: &ChainRecord) -> Result<(), StoreError>;

    /// Remove the record for `peer_id`.  Returns whether a row existed.
    fn delete(&self, peer_id: &str) -> Result<bool, StoreError>;

    /// Every stored record, in key order.
    fn list(&self) -> Result<Vec<ChainRecord>, StoreError>;

    /// Reverse lookup: the peer whose record is bound to `channel_id`.
    fn channel_binding(&self, channel_id: &str) -> Result<Option<String>, StoreError> {
        if channel_id.is_empty() {
            return Ok(None);
        }
        Ok(self
            .list()?
            .into_iter()
            .find(|record| record.channel_id == channel_id)
            .map(|record| record.peer_id))
    }
}

/// In-memory record store keyed by `prefix ++ peer_id`.
///
/// Values are borsh-encoded so the store holds exactly what a persistent
/// backend would.
#[derive(Debug)]
pub struct MemoryRecordStore {
    prefix: Vec<u8>,
    entries: DashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryRecordStore {
    /// Create an empty store whose keys all start with `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.as_bytes().to_vec(),
            entries: DashMap::new(),
        }
    }

    /// The key prefix fixed at construction.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(&self, peer_id: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.prefix.len().saturating_add(peer_id.len()));
        key.extend_from_slice(&self.prefix);
        key.extend_from_slice(peer_id.as_bytes());
        key
    }

    fn decode(key: &[u8], bytes: &[u8]) -> Result<ChainRecord, StoreError> {
        borsh::from_slice(bytes).map_err(|source| StoreError::Codec {
            key: String::from_utf8_lossy(key).into_owned(),
            source,
        })
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_KEY_PREFIX)
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, peer_id: &str) -> Result<Option<ChainRecord>, StoreError> {
        let key = self.key(peer_id);
        self.entries
            .get(&key)
            .map(|bytes| Self::decode(&key, bytes.value()))
            .transpose()
    }

    fn set(&self, record: &ChainRecord) -> Result<(), StoreError> {
        let key = self.key(&record.peer_id);
        let bytes = borsh::to_vec(record).map_err(|source| StoreError::Codec {
            key: record.peer_id.clone(),
            source,
        })?;
        trace!("store set {}", record.peer_id);
        self.entries.insert(key, bytes);
        Ok(())
    }

    fn delete(&self, peer_id: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(&self.key(peer_id)).is_some())
    }

    fn list(&self) -> Result<Vec<ChainRecord>, StoreError> {
        let mut rows: Vec<(Vec<u8>, Vec<u8>)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(&self.prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.iter()
            .map(|(key, bytes)| Self::decode(key, bytes))
            .collect()
    }
}
