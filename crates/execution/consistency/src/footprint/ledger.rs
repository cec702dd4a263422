//! Bounded durable log of known footprint mismatches.
//!
//! The ledger is newline-delimited text: one `0x`-prefixed transaction hash per line, oldest first.
//! Blank lines and lines starting with `#` are ignored on read, as is any line that is not UTF-8
//! or not a hash. Truncation rewrites the whole payload with the retained suffix.

use std::{
    fmt::Debug,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    str::{self, FromStr},
};

use alloy_primitives::TxHash;
use parking_lot::Mutex;
use tracing::warn;

use crate::{KeyValueStore, LedgerError};

/// File name of the mismatch ledger inside the node data directory.
pub const MISMATCH_LEDGER_FILE: &str = "known_footprint_mismatches.txt";

/// Key under which [`KvLedger`] keeps its payload.
pub const MISMATCH_LEDGER_KEY: &[u8] = b"footprint-known-mismatches";

/// Append-only log of mismatching transaction hashes that can be cut down to its most recent
/// entries.
///
/// Implementations are not required to be safe against concurrent writers. The
/// [`FootprintManager`](crate::FootprintManager) serialises every call under its write lock.
pub trait MismatchLedger: Debug + Send + Sync {
    /// Returns every recorded hash, oldest first.
    fn load(&self) -> Result<Vec<TxHash>, LedgerError>;

    /// Appends `tx_hash` to the end of the log.
    fn append(&self, tx_hash: TxHash) -> Result<(), LedgerError>;

    /// Keeps only the `max_entries` most recent hashes.
    ///
    /// Returns the retained hashes (oldest first) if anything was dropped, `None` if the log was
    /// already within bounds.
    fn truncate_to_last(&self, max_entries: usize) -> Result<Option<Vec<TxHash>>, LedgerError>;

    /// Appends `tx_hash` and keeps only the `max_entries` most recent hashes.
    ///
    /// Returns the retained hashes like [`Self::truncate_to_last`]. Implementations that can
    /// should do this as a single write so a failure never leaves the log over the bound.
    fn append_bounded(
        &self,
        tx_hash: TxHash,
        max_entries: usize,
    ) -> Result<Option<Vec<TxHash>>, LedgerError> {
        self.append(tx_hash)?;
        self.truncate_to_last(max_entries)
    }
}

/// Parses a ledger payload, skipping blank lines, `#` comments and lines that are not hashes.
fn parse_entries(raw: &[u8]) -> Vec<TxHash> {
    let mut entries = Vec::new();
    for (index, line) in raw.split(|byte| *byte == b'\n').enumerate() {
        let line = match str::from_utf8(line) {
            Ok(line) => line.trim(),
            Err(err) => {
                warn!(target: "consistency", line = index + 1, error = %err, "Skipping malformed footprint ledger line");
                continue;
            }
        };
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match TxHash::from_str(line) {
            Ok(tx_hash) => entries.push(tx_hash),
            Err(err) => {
                warn!(target: "consistency", line = index + 1, error = %err, "Skipping malformed footprint ledger line");
            }
        }
    }
    entries
}

fn render_entries(entries: &[TxHash]) -> String {
    let mut out = String::with_capacity(entries.len() * 67);
    for tx_hash in entries {
        out.push_str(&format!("{tx_hash:#x}\n"));
    }
    out
}

/// Returns the most recent `max_entries` of `entries` if it is over the bound.
fn retained_suffix(entries: &[TxHash], max_entries: usize) -> Option<Vec<TxHash>> {
    (entries.len() > max_entries).then(|| entries[entries.len() - max_entries..].to_vec())
}

/// Appends `tx_hash` to `entries` and returns the new payload with the retained suffix, if any.
fn append_entry(
    mut entries: Vec<TxHash>,
    tx_hash: TxHash,
    max_entries: usize,
) -> (Vec<TxHash>, Option<Vec<TxHash>>) {
    entries.push(tx_hash);
    let retained = retained_suffix(&entries, max_entries);
    (retained.clone().unwrap_or(entries), retained)
}

/// Ledger stored as a plain text file.
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    /// Creates a ledger backed by the file at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a ledger at [`MISMATCH_LEDGER_FILE`] inside `data_dir`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(MISMATCH_LEDGER_FILE))
    }

    /// Returns the ledger file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rewrite(&self, entries: &[TxHash]) -> Result<(), LedgerError> {
        let mut file =
            OpenOptions::new().create(true).write(true).truncate(true).open(&self.path)?;
        file.write_all(render_entries(entries).as_bytes())?;
        file.sync_data()?;
        Ok(())
    }
}

impl MismatchLedger for FileLedger {
    fn load(&self) -> Result<Vec<TxHash>, LedgerError> {
        match fs::read(&self.path) {
            Ok(raw) => Ok(parse_entries(&raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn append(&self, tx_hash: TxHash) -> Result<(), LedgerError> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(format!("{tx_hash:#x}\n").as_bytes())?;
        Ok(())
    }

    fn truncate_to_last(&self, max_entries: usize) -> Result<Option<Vec<TxHash>>, LedgerError> {
        let entries = self.load()?;
        let Some(retained) = retained_suffix(&entries, max_entries) else {
            return Ok(None);
        };
        self.rewrite(&retained)?;
        Ok(Some(retained))
    }

    fn append_bounded(
        &self,
        tx_hash: TxHash,
        max_entries: usize,
    ) -> Result<Option<Vec<TxHash>>, LedgerError> {
        let entries = self.load()?;
        if entries.len() < max_entries {
            self.append(tx_hash)?;
            return Ok(None);
        }
        let (payload, retained) = append_entry(entries, tx_hash, max_entries);
        self.rewrite(&payload)?;
        Ok(retained)
    }
}

/// Ledger stored as a single value in a [`KeyValueStore`].
#[derive(Debug)]
pub struct KvLedger<DB> {
    db: DB,
}

impl<DB: KeyValueStore> KvLedger<DB> {
    /// Creates a ledger backed by `db` under [`MISMATCH_LEDGER_KEY`].
    pub const fn new(db: DB) -> Self {
        Self { db }
    }

    fn write(&self, entries: &[TxHash]) -> Result<(), LedgerError> {
        self.db.put(MISMATCH_LEDGER_KEY, render_entries(entries).as_bytes())?;
        Ok(())
    }
}

impl<DB: KeyValueStore> MismatchLedger for KvLedger<DB> {
    fn load(&self) -> Result<Vec<TxHash>, LedgerError> {
        let raw = self.db.get(MISMATCH_LEDGER_KEY)?.unwrap_or_default();
        Ok(parse_entries(&raw))
    }

    fn append(&self, tx_hash: TxHash) -> Result<(), LedgerError> {
        let mut entries = self.load()?;
        entries.push(tx_hash);
        self.write(&entries)
    }

    fn truncate_to_last(&self, max_entries: usize) -> Result<Option<Vec<TxHash>>, LedgerError> {
        let entries = self.load()?;
        let Some(retained) = retained_suffix(&entries, max_entries) else {
            return Ok(None);
        };
        self.write(&retained)?;
        Ok(Some(retained))
    }

    fn append_bounded(
        &self,
        tx_hash: TxHash,
        max_entries: usize,
    ) -> Result<Option<Vec<TxHash>>, LedgerError> {
        let (payload, retained) = append_entry(self.load()?, tx_hash, max_entries);
        self.write(&payload)?;
        Ok(retained)
    }
}

/// Volatile ledger for tests and nodes running without a data directory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: Mutex<Vec<TxHash>>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger pre-populated with `entries`, oldest first.
    pub fn with_entries(entries: impl IntoIterator<Item = TxHash>) -> Self {
        Self { entries: Mutex::new(entries.into_iter().collect()) }
    }
}

impl MismatchLedger for MemoryLedger {
    fn load(&self) -> Result<Vec<TxHash>, LedgerError> {
        Ok(self.entries.lock().clone())
    }

    fn append(&self, tx_hash: TxHash) -> Result<(), LedgerError> {
        self.entries.lock().push(tx_hash);
        Ok(())
    }

    fn truncate_to_last(&self, max_entries: usize) -> Result<Option<Vec<TxHash>>, LedgerError> {
        let mut entries = self.entries.lock();
        let retained = retained_suffix(&entries, max_entries);
        if let Some(retained) = &retained {
            *entries = retained.clone();
        }
        Ok(retained)
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use tempfile::tempdir;

    use super::*;
    use crate::MemoryKv;

    fn hash(n: u8) -> TxHash {
        TxHash::repeat_byte(n)
    }

    #[test]
    fn test_file_ledger_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());
        assert!(ledger.load().unwrap().is_empty());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_file_ledger_append_format() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());

        ledger.append(hash(0xab)).unwrap();
        ledger.append(hash(0x01)).unwrap();

        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents, format!("0x{}\n0x{}\n", "ab".repeat(32), "01".repeat(32)));
        assert_eq!(ledger.load().unwrap(), vec![hash(0xab), hash(0x01)]);
    }

    #[test]
    fn test_file_ledger_skips_comments_and_garbage() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());
        fs::write(
            ledger.path(),
            format!(
                "# pre-fix transactions\n\n0x{}\nnot-a-hash\n{}\n",
                "11".repeat(32),
                "22".repeat(32)
            ),
        )
        .unwrap();

        assert_eq!(ledger.load().unwrap(), vec![hash(0x11), hash(0x22)]);
    }

    #[test]
    fn test_file_ledger_truncate_rewrites_suffix() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());
        fs::write(ledger.path(), "# header comment\n").unwrap();
        for n in 1..=5 {
            ledger.append(hash(n)).unwrap();
        }

        assert_eq!(ledger.truncate_to_last(5).unwrap(), None);
        let retained = ledger.truncate_to_last(3).unwrap().unwrap();
        assert_eq!(retained, vec![hash(3), hash(4), hash(5)]);

        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert!(!contents.contains('#'));
        assert_eq!(contents.lines().count(), 3);
        assert_eq!(ledger.load().unwrap(), retained);
    }

    #[test]
    fn test_kv_ledger_roundtrip_and_truncate() {
        let db = Arc::new(MemoryKv::new());
        let ledger = KvLedger::new(db.clone());
        for n in 1..=4 {
            ledger.append(hash(n)).unwrap();
        }

        assert_eq!(ledger.load().unwrap().len(), 4);
        assert_eq!(ledger.truncate_to_last(2).unwrap(), Some(vec![hash(3), hash(4)]));
        assert_eq!(KvLedger::new(db).load().unwrap(), vec![hash(3), hash(4)]);
    }

    #[test]
    fn test_file_ledger_skips_non_utf8_lines() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());
        let mut raw = format!("{:#x}\n{:#x}\n", hash(1), hash(2)).into_bytes();
        raw.extend_from_slice(b"\xff\xfe\n");
        raw.extend_from_slice(format!("{:#x}\n", hash(3)).as_bytes());
        fs::write(ledger.path(), raw).unwrap();

        assert_eq!(ledger.load().unwrap(), vec![hash(1), hash(2), hash(3)]);
    }

    #[test]
    fn test_file_ledger_append_bounded_stays_within_bound() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());
        let mut raw = format!("{:#x}\n{:#x}\n{:#x}\n", hash(1), hash(2), hash(3)).into_bytes();
        raw.extend_from_slice(b"\xff\xfe\n");
        fs::write(ledger.path(), raw).unwrap();

        for n in 10..=15 {
            ledger.append_bounded(hash(n), 3).unwrap();
        }

        let contents = fs::read_to_string(ledger.path()).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert_eq!(ledger.load().unwrap(), vec![hash(13), hash(14), hash(15)]);
    }

    #[test]
    fn test_file_ledger_append_bounded_appends_below_bound() {
        let dir = tempdir().unwrap();
        let ledger = FileLedger::in_dir(dir.path());
        fs::write(ledger.path(), "# header comment\n").unwrap();

        assert_eq!(ledger.append_bounded(hash(1), 2).unwrap(), None);
        assert_eq!(ledger.append_bounded(hash(2), 2).unwrap(), None);
        assert!(fs::read_to_string(ledger.path()).unwrap().starts_with('#'));

        assert_eq!(ledger.append_bounded(hash(3), 2).unwrap(), Some(vec![hash(2), hash(3)]));
        assert_eq!(ledger.load().unwrap(), vec![hash(2), hash(3)]);
    }

    #[test]
    fn test_kv_ledger_skips_binary_lines() {
        let db = MemoryKv::new();
        let mut raw = vec![0xff, 0xfe, 0x00, b'\n'];
        raw.extend_from_slice(format!("{:#x}\n", hash(4)).as_bytes());
        db.put(MISMATCH_LEDGER_KEY, &raw).unwrap();
        let ledger = KvLedger::new(db);

        assert_eq!(ledger.load().unwrap(), vec![hash(4)]);
        assert_eq!(ledger.append_bounded(hash(5), 1).unwrap(), Some(vec![hash(5)]));
        assert_eq!(ledger.load().unwrap(), vec![hash(5)]);
    }

    #[test]
    fn test_memory_ledger_truncate() {
        let ledger = MemoryLedger::with_entries([hash(1), hash(2), hash(3)]);
        assert_eq!(ledger.truncate_to_last(1).unwrap(), Some(vec![hash(3)]));
        assert_eq!(ledger.load().unwrap(), vec![hash(3)]);
    }
}
