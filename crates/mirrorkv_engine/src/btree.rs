//! File-backed reference engine.

use crate::engine::{KvEngine, SnapshotSource};
use crate::error::{EngineError, EngineResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Magic bytes identifying a database file.
const DB_MAGIC: [u8; 4] = *b"MKVB";
/// Current database file format version.
const DB_VERSION: u16 = 1;
/// Header size (magic + version + entry count).
const HEADER_SIZE: usize = 4 + 2 + 4;
/// Footer size (checksum).
const FOOTER_SIZE: usize = 4;

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// Open options for [`BTreeEngine`].
#[derive(Debug, Clone)]
pub struct BTreeOptions {
    /// Whether to fsync the database file on every commit.
    pub sync_on_commit: bool,
}

impl Default for BTreeOptions {
    fn default() -> Self {
        Self {
            sync_on_commit: true,
        }
    }
}

/// A minimal file-backed transactional engine.
///
/// `BTreeEngine` keeps a single ordered keyspace in memory and rewrites its
/// backing file on every commit. It exists so that the sync layer and its
/// tests have a complete [`KvEngine`] implementation whose snapshot bytes
/// are exactly its on-disk file format: materializing a snapshot at a path
/// yields a file this engine opens directly.
///
/// It is suitable for tests, examples, and small databases. It is not a
/// general-purpose storage engine - every commit is O(database size).
///
/// # Thread Safety
///
/// Transactions are serialized single-writer/multiple-reader by an internal
/// `RwLock`.
///
/// # Example
///
/// ```no_run
/// use mirrorkv_engine::{BTreeEngine, BTreeOptions, KvEngine};
/// use std::path::Path;
///
/// let engine = BTreeEngine::open(Path::new("data.db"), 0o600, &BTreeOptions::default()).unwrap();
/// engine
///     .update(|tx| {
///         tx.put(b"greeting", b"hello");
///         Ok(())
///     })
///     .unwrap();
/// ```
pub struct BTreeEngine {
    path: PathBuf,
    mode: u32,
    options: BTreeOptions,
    inner: RwLock<Inner>,
}

struct Inner {
    entries: Entries,
    open: bool,
}

impl Inner {
    fn ensure_open(&self) -> EngineResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(EngineError::Closed)
        }
    }
}

impl BTreeEngine {
    /// Returns the path to the backing database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the backing file with the given content.
    ///
    /// Writes to a sibling temp file, then renames over the database file so
    /// a crash mid-write never leaves a torn database behind.
    fn persist(&self, entries: &Entries) -> EngineResult<()> {
        let data = encode_entries(entries);

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("db");
        let tmp = self.path.with_file_name(format!("{file_name}.tmp"));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(&data)?;
        file.flush()?;
        if self.options.sync_on_commit {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(&tmp, &self.path)?;
        apply_mode(&self.path, self.mode)?;
        Ok(())
    }
}

impl KvEngine for BTreeEngine {
    type Options = BTreeOptions;
    type ReadTxn<'a> = BTreeReadTxn<'a> where Self: 'a;
    type WriteTxn<'a> = BTreeWriteTxn<'a> where Self: 'a;

    fn open(path: &Path, mode: u32, options: &Self::Options) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (entries, existed) = match fs::read(path) {
            Ok(data) if data.is_empty() => (Entries::new(), false),
            Ok(data) => (decode_entries(&data)?, true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Entries::new(), false),
            Err(e) => return Err(e.into()),
        };

        let engine = Self {
            path: path.to_path_buf(),
            mode,
            options: options.clone(),
            inner: RwLock::new(Inner {
                entries,
                open: true,
            }),
        };

        // Missing and zero-length files become a valid empty database so the
        // on-disk state is well-formed from open onward.
        if !existed {
            let inner = engine.inner.read();
            engine.persist(&inner.entries)?;
        }

        Ok(engine)
    }

    fn update<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&mut Self::WriteTxn<'_>) -> EngineResult<T>,
    {
        let mut inner = self.inner.write();
        inner.ensure_open()?;

        // Stage on a copy; an Err from the transaction function discards it.
        let mut staged = inner.entries.clone();
        let mut txn = BTreeWriteTxn {
            entries: &mut staged,
        };
        let out = f(&mut txn)?;

        self.persist(&staged)?;
        inner.entries = staged;
        Ok(out)
    }

    fn view<T, F>(&self, f: F) -> EngineResult<T>
    where
        F: FnOnce(&Self::ReadTxn<'_>) -> EngineResult<T>,
    {
        let inner = self.inner.read();
        inner.ensure_open()?;
        let txn = BTreeReadTxn {
            entries: &inner.entries,
        };
        f(&txn)
    }

    fn close(&self) -> EngineResult<()> {
        let mut inner = self.inner.write();
        inner.open = false;
        Ok(())
    }
}

/// A read-only transaction over a [`BTreeEngine`].
pub struct BTreeReadTxn<'a> {
    entries: &'a Entries,
}

impl BTreeReadTxn<'_> {
    /// Gets the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the database holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_slice(), v.as_slice()))
    }
}

impl SnapshotSource for BTreeReadTxn<'_> {
    fn write_snapshot(&self, dest: &mut dyn Write) -> EngineResult<u64> {
        let data = encode_entries(self.entries);
        dest.write_all(&data)?;
        Ok(data.len() as u64)
    }
}

/// A read-write transaction over a [`BTreeEngine`].
pub struct BTreeWriteTxn<'a> {
    entries: &'a mut Entries,
}

impl BTreeWriteTxn<'_> {
    /// Gets the value stored under `key`, observing staged writes.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Stages an insert or update of `key` to `value`.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.entries.insert(key.to_vec(), value.to_vec());
    }

    /// Stages removal of `key`. Returns true if the key was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns the number of entries, counting staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the database holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> EngineResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> EngineResult<()> {
    Ok(())
}

/// Encodes entries to the database file format.
///
/// Layout: `| magic (4) | version (2) | entry count (4) | entries... | crc32 (4) |`
/// where each entry is `| key len (4) | key | value len (4) | value |`.
/// All integers are little-endian.
fn encode_entries(entries: &Entries) -> Vec<u8> {
    let entries_size: usize = entries.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    let mut data = Vec::with_capacity(HEADER_SIZE + entries_size + FOOTER_SIZE);

    data.extend_from_slice(&DB_MAGIC);
    data.extend_from_slice(&DB_VERSION.to_le_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    for (key, value) in entries {
        data.extend_from_slice(&(key.len() as u32).to_le_bytes());
        data.extend_from_slice(key);
        data.extend_from_slice(&(value.len() as u32).to_le_bytes());
        data.extend_from_slice(value);
    }

    let checksum = compute_crc32(&data);
    data.extend_from_slice(&checksum.to_le_bytes());
    data
}

/// Decodes a database file, validating framing and checksum.
fn decode_entries(data: &[u8]) -> EngineResult<Entries> {
    if data.len() < HEADER_SIZE + FOOTER_SIZE {
        return Err(EngineError::corrupted("database file too small"));
    }

    if data[0..4] != DB_MAGIC {
        return Err(EngineError::corrupted("invalid database magic"));
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != DB_VERSION {
        return Err(EngineError::corrupted(format!(
            "unsupported database version: {version}"
        )));
    }

    let checksum_offset = data.len() - FOOTER_SIZE;
    let stored = u32::from_le_bytes([
        data[checksum_offset],
        data[checksum_offset + 1],
        data[checksum_offset + 2],
        data[checksum_offset + 3],
    ]);
    let computed = compute_crc32(&data[..checksum_offset]);
    if stored != computed {
        return Err(EngineError::corrupted(format!(
            "checksum mismatch: expected {stored:08x}, got {computed:08x}"
        )));
    }

    let count = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;
    let payload = &data[HEADER_SIZE..checksum_offset];

    let mut entries = Entries::new();
    let mut offset = 0usize;
    for _ in 0..count {
        let key = read_chunk(payload, &mut offset)?;
        let value = read_chunk(payload, &mut offset)?;
        entries.insert(key, value);
    }

    if offset != payload.len() {
        return Err(EngineError::corrupted("trailing bytes after last entry"));
    }

    Ok(entries)
}

fn read_chunk(payload: &[u8], offset: &mut usize) -> EngineResult<Vec<u8>> {
    if *offset + 4 > payload.len() {
        return Err(EngineError::corrupted("entry length extends beyond data"));
    }
    let len = u32::from_le_bytes([
        payload[*offset],
        payload[*offset + 1],
        payload[*offset + 2],
        payload[*offset + 3],
    ]) as usize;
    *offset += 4;

    if *offset + len > payload.len() {
        return Err(EngineError::corrupted("entry extends beyond data"));
    }
    let chunk = payload[*offset..*offset + len].to_vec();
    *offset += len;
    Ok(chunk)
}

/// Computes a CRC32 checksum (IEEE polynomial).
fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn open_at(dir: &TempDir, name: &str) -> BTreeEngine {
        BTreeEngine::open(&dir.path().join(name), 0o600, &BTreeOptions::default()).unwrap()
    }

    #[test]
    fn open_missing_file_creates_empty_database() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "fresh.db");

        engine.view(|tx| {
            assert!(tx.is_empty());
            Ok(())
        })
        .unwrap();

        // The backing file now exists and is a valid empty database.
        let reopened = open_at(&dir, "fresh.db");
        reopened
            .view(|tx| {
                assert!(tx.is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn committed_writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "data.db");

        engine
            .update(|tx| {
                tx.put(b"alpha", b"1");
                tx.put(b"beta", b"2");
                Ok(())
            })
            .unwrap();
        engine.close().unwrap();

        let reopened = open_at(&dir, "data.db");
        reopened
            .view(|tx| {
                assert_eq!(tx.get(b"alpha"), Some(&b"1"[..]));
                assert_eq!(tx.get(b"beta"), Some(&b"2"[..]));
                assert_eq!(tx.len(), 2);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn failed_transaction_discards_staged_writes() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "data.db");

        engine
            .update(|tx| {
                tx.put(b"kept", b"yes");
                Ok(())
            })
            .unwrap();

        let result: EngineResult<()> = engine.update(|tx| {
            tx.put(b"dropped", b"no");
            Err(EngineError::transaction_aborted("caller bailed"))
        });
        assert!(matches!(
            result,
            Err(EngineError::TransactionAborted { .. })
        ));

        engine
            .view(|tx| {
                assert_eq!(tx.get(b"kept"), Some(&b"yes"[..]));
                assert_eq!(tx.get(b"dropped"), None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn delete_removes_key() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "data.db");

        engine
            .update(|tx| {
                tx.put(b"gone", b"soon");
                Ok(())
            })
            .unwrap();
        engine
            .update(|tx| {
                assert!(tx.delete(b"gone"));
                assert!(!tx.delete(b"never-there"));
                Ok(())
            })
            .unwrap();

        engine
            .view(|tx| {
                assert_eq!(tx.get(b"gone"), None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn batch_defaults_to_update() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "data.db");

        engine
            .batch(|tx| {
                tx.put(b"batched", b"1");
                Ok(())
            })
            .unwrap();

        engine
            .view(|tx| {
                assert_eq!(tx.get(b"batched"), Some(&b"1"[..]));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn snapshot_bytes_open_as_database() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "source.db");

        engine
            .update(|tx| {
                tx.put(b"carried", b"over");
                Ok(())
            })
            .unwrap();

        let mut snapshot = Vec::new();
        engine
            .view(|tx| {
                tx.write_snapshot(&mut snapshot)?;
                Ok(())
            })
            .unwrap();

        let copy_path = dir.path().join("copy.db");
        fs::write(&copy_path, &snapshot).unwrap();
        let copy = BTreeEngine::open(&copy_path, 0o600, &BTreeOptions::default()).unwrap();
        copy.view(|tx| {
            assert_eq!(tx.get(b"carried"), Some(&b"over"[..]));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn corrupted_file_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.db");
        let engine = BTreeEngine::open(&path, 0o600, &BTreeOptions::default()).unwrap();
        engine
            .update(|tx| {
                tx.put(b"key", b"value");
                Ok(())
            })
            .unwrap();
        engine.close().unwrap();

        let mut data = fs::read(&path).unwrap();
        let mid = data.len() / 2;
        data[mid] ^= 0xFF;
        fs::write(&path, &data).unwrap();

        let result = BTreeEngine::open(&path, 0o600, &BTreeOptions::default());
        assert!(matches!(result, Err(EngineError::Corrupted(_))));
    }

    #[test]
    fn truncated_file_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.db");
        fs::write(&path, b"MKV").unwrap();

        let result = BTreeEngine::open(&path, 0o600, &BTreeOptions::default());
        assert!(matches!(result, Err(EngineError::Corrupted(_))));
    }

    #[test]
    fn bad_magic_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.db");
        fs::write(&path, vec![0u8; HEADER_SIZE + FOOTER_SIZE]).unwrap();

        let result = BTreeEngine::open(&path, 0o600, &BTreeOptions::default());
        assert!(matches!(result, Err(EngineError::Corrupted(_))));
    }

    #[test]
    fn closed_engine_rejects_transactions() {
        let dir = TempDir::new().unwrap();
        let engine = open_at(&dir, "data.db");
        engine.close().unwrap();

        let update: EngineResult<()> = engine.update(|_| Ok(()));
        assert!(matches!(update, Err(EngineError::Closed)));

        let view: EngineResult<()> = engine.view(|_| Ok(()));
        assert!(matches!(view, Err(EngineError::Closed)));

        // Double close is a no-op.
        engine.close().unwrap();
    }

    proptest! {
        #[test]
        fn encode_decode_roundtrip(
            pairs in proptest::collection::vec(
                (
                    proptest::collection::vec(any::<u8>(), 0..32),
                    proptest::collection::vec(any::<u8>(), 0..64),
                ),
                0..16,
            )
        ) {
            let entries: Entries = pairs.into_iter().collect();
            let encoded = encode_entries(&entries);
            let decoded = decode_entries(&encoded).unwrap();
            prop_assert_eq!(entries, decoded);
        }
    }
}
