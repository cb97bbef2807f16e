//! # Transactional Key/Value Store
//!
//! The engine persists through [`KvStore`]: point reads, ordered prefix
//! scans, and atomic commit of a [`WriteBatch`]. Either every operation in a
//! batch becomes visible or none does.
//!
//! [`MemoryStore`] is the in-process implementation, a `BTreeMap` behind a
//! `parking_lot::RwLock`. Commits take the write lock once, so readers never
//! observe half a batch.
//!
//! [`SledStore`] persists to disk through an embedded `sled` database. A
//! batch becomes one `sled::Batch`, applied atomically and flushed before
//! `commit` returns.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};
use parking_lot::RwLock;

use plasma_core::{Digest32, StoreError};

/// Key layout.
pub mod keys {
    use super::Digest32;

    /// Persisted number of the open block.
    pub const CURRENT_BLOCK_NUMBER: &str = "current_block_number";

    /// Prefix of sealed block records.
    pub const BLOCK_PREFIX: &str = "block_";

    /// Prefix of pending mempool records.
    pub const MEMPOOL_PREFIX: &str = "tx_mempool_";

    /// Key of sealed block `number`. Zero-padded so prefix scans are ordered.
    pub fn block(number: u64) -> String {
        format!("{BLOCK_PREFIX}{number:020}")
    }

    /// Key of the pending transaction with `hash`. The value is the
    /// admission sequence number followed by the tx storage encoding.
    pub fn mempool(hash: &Digest32) -> String {
        format!("{MEMPOOL_PREFIX}{}", hash.to_hex())
    }
}

/// One staged write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Set `key` to `value`.
    Put {
        /// Target key.
        key: String,
        /// New value.
        value: Vec<u8>,
    },
    /// Remove `key` if present.
    Delete {
        /// Target key.
        key: String,
    },
}

/// Ordered writes applied atomically by [`KvStore::commit()`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a put.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Put {
            key: key.into(),
            value,
        });
        self
    }

    /// Stage a delete.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { key: key.into() });
        self
    }

    /// Staged operations, in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Number of staged operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Transactional key/value persistence.
pub trait KvStore: Send + Sync {
    /// Read one key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Apply `batch` atomically.
    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// In-memory [`KvStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let guard = self.data.read();
        Ok(guard
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut guard = self.data.write();
        for op in batch.ops {
            match op {
                WriteOp::Put { key, value } => {
                    guard.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    guard.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// Disk-backed [`KvStore`] over an embedded `sled` database.
#[derive(Debug, Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path)
            .map_err(|e| StoreError::ReadFailed(format!("open {}: {e}", path.display())))?;
        Ok(Self { db })
    }
}

fn utf8_key(raw: &[u8]) -> Result<String, StoreError> {
    String::from_utf8(raw.to_vec()).map_err(|e| StoreError::Corrupt {
        key: hex::encode(raw),
        reason: e.to_string(),
    })
}

impl KvStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.db
            .get(key.as_bytes())
            .map(|v| v.map(|ivec| ivec.to_vec()))
            .map_err(|e| StoreError::ReadFailed(e.to_string()))
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.db
            .scan_prefix(prefix.as_bytes())
            .map(|item| {
                let (k, v) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
                Ok((utf8_key(&k)?, v.to_vec()))
            })
            .collect()
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut staged = sled::Batch::default();
        for op in batch.ops {
            match op {
                WriteOp::Put { key, value } => staged.insert(key.into_bytes(), value),
                WriteOp::Delete { key } => staged.remove(key.into_bytes()),
            }
        }
        self.db
            .apply_batch(staged)
            .map_err(|e| StoreError::CommitAborted(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StoreError::CommitAborted(e.to_string()))?;
        Ok(())
    }
}

/// Encode the block counter.
pub fn encode_counter(n: u64) -> Vec<u8> {
    let mut buf = vec![0u8; 8];
    BigEndian::write_u64(&mut buf, n);
    buf
}

/// Decode the block counter.
pub fn decode_counter(bytes: &[u8]) -> Result<u64, StoreError> {
    if bytes.len() != 8 {
        return Err(StoreError::Corrupt {
            key: keys::CURRENT_BLOCK_NUMBER.to_string(),
            reason: format!("expected 8 bytes, got {}", bytes.len()),
        });
    }
    Ok(BigEndian::read_u64(bytes))
}

/// Encode a mempool record: admission sequence, then the tx bytes.
pub fn encode_mempool_record(seq: u64, tx: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(8 + tx.len());
    buf.extend_from_slice(&seq.to_be_bytes());
    buf.extend_from_slice(tx);
    buf
}

/// Split a mempool record into its admission sequence and tx bytes.
pub fn decode_mempool_record<'a>(key: &str, bytes: &'a [u8]) -> Result<(u64, &'a [u8]), StoreError> {
    if bytes.len() < 8 {
        return Err(StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("mempool record of {} bytes", bytes.len()),
        });
    }
    let (seq, tx) = bytes.split_at(8);
    Ok((BigEndian::read_u64(seq), tx))
}
