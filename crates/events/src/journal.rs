//! Sequenced journal writer
//!
//! Wraps the event store with the sequence/hash bookkeeping needed to keep
//! the chain linked across restarts.

use chrono::Utc;
use std::path::Path;

use crate::error::EventError;
use crate::event::{JournalRecord, PositionEvent};
use crate::hash::{calculate_record_hash, verify_chain, GENESIS_HASH};
use crate::reader::EventReader;
use crate::store::EventStore;

/// Append-only, hash-chained journal
pub struct Journal {
    store: EventStore,
    last_sequence: u64,
    last_hash: String,
    poisoned: bool,
}

impl Journal {
    /// Open the journal in `path`, returning it together with the records
    /// already on disk (for replay)
    ///
    /// Fails if the existing chain does not verify.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<JournalRecord>), EventError> {
        let path = path.as_ref();
        let store = EventStore::new(path)?;
        let records = EventReader::from_directory(path)?.read_all()?;
        verify_chain(&records)?;

        let (last_sequence, last_hash) = match records.last() {
            Some(last) => (last.sequence, last.hash.clone()),
            None => (0, GENESIS_HASH.to_string()),
        };

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "Journal opened"
        );

        Ok((
            Self {
                store,
                last_sequence,
                last_hash,
                poisoned: false,
            },
            records,
        ))
    }

    /// Sequence, hash and durably append one event
    ///
    /// A failed write may have left part of the line on disk, so the
    /// journal refuses further appends until it is reopened and verified.
    pub fn append(&mut self, correlation_id: &str, event: PositionEvent) -> Result<JournalRecord, EventError> {
        if self.poisoned {
            return Err(EventError::Poisoned);
        }

        let mut record = JournalRecord {
            sequence: self.last_sequence + 1,
            prev_hash: self.last_hash.clone(),
            hash: String::new(),
            timestamp: Utc::now(),
            correlation_id: correlation_id.to_string(),
            event,
        };
        record.hash = calculate_record_hash(&record);

        if let Err(e) = self.store.append(&record) {
            self.poisoned = true;
            tracing::error!(
                sequence = record.sequence,
                error = %e,
                "Journal write failed"
            );
            return Err(e);
        }

        self.last_sequence = record.sequence;
        self.last_hash = record.hash.clone();

        Ok(record)
    }

    /// Sequence of the last appended record (0 when empty)
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Whether a failed write has disabled appends
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn path(&self) -> &Path {
        self.store.base_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lending_core::{Address, Amount, PositionKind};
    use tempfile::TempDir;

    fn owner() -> Address {
        Address::new([5u8; 32])
    }

    #[test]
    fn test_append_and_reopen() -> anyhow::Result<()> {
        let dir = TempDir::new()?;

        {
            let (mut journal, existing) = Journal::open(dir.path())?;
            assert!(existing.is_empty());

            let first = journal.append(
                "init-1",
                PositionEvent::Initialized {
                    owner: owner(),
                    kind: PositionKind::Collateral,
                },
            )?;
            assert_eq!(first.sequence, 1);
            assert_eq!(first.prev_hash, GENESIS_HASH);

            let second = journal.append(
                "deposit-1",
                PositionEvent::Deposited {
                    owner: owner(),
                    amount: Amount::from_units(10),
                },
            )?;
            assert_eq!(second.prev_hash, first.hash);
        }

        let (mut journal, existing) = Journal::open(dir.path())?;
        assert_eq!(existing.len(), 2);
        assert_eq!(journal.last_sequence(), 2);

        let third = journal.append(
            "deposit-2",
            PositionEvent::Deposited {
                owner: owner(),
                amount: Amount::from_units(5),
            },
        )?;
        assert_eq!(third.sequence, 3);
        assert_eq!(third.prev_hash, existing[1].hash);

        Ok(())
    }

    #[test]
    fn test_failed_write_poisons_journal() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let journal_dir = dir.path().join("journal");
        let deposit = || PositionEvent::Deposited {
            owner: owner(),
            amount: Amount::from_units(10),
        };

        let (mut journal, _) = Journal::open(&journal_dir)?;
        std::fs::remove_dir_all(&journal_dir)?;

        assert!(matches!(journal.append("deposit-1", deposit()), Err(EventError::Io(_))));
        assert!(journal.is_poisoned());
        assert_eq!(journal.last_sequence(), 0);

        // Even once the directory is back, appends stay refused
        std::fs::create_dir_all(&journal_dir)?;
        assert!(matches!(journal.append("deposit-2", deposit()), Err(EventError::Poisoned)));

        Ok(())
    }

    #[test]
    fn test_open_rejects_tampered_journal() -> anyhow::Result<()> {
        let dir = TempDir::new()?;

        {
            let (mut journal, _) = Journal::open(dir.path())?;
            journal.append(
                "deposit-1",
                PositionEvent::Deposited {
                    owner: owner(),
                    amount: Amount::from_units(10),
                },
            )?;
        }

        let file = EventReader::from_directory(dir.path())?.files()[0].clone();
        let mut record: serde_json::Value = serde_json::from_str(std::fs::read_to_string(&file)?.trim())?;
        record["event"]["amount"] = serde_json::json!("99");
        std::fs::write(&file, format!("{}\n", record))?;

        let result = Journal::open(dir.path());
        assert!(matches!(result, Err(EventError::Chain(_))));

        Ok(())
    }
}
