//! In-memory position store
//!
//! The store is the authoritative in-process view of every position. It is
//! rebuilt from the journal on start-up; writers must append to the journal
//! before calling `apply_delta` so the two never disagree.

use chrono::Utc;
use lending_core::{Address, Amount, PositionKind};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::LedgerError;
use crate::record::{PositionDelta, PositionRecord};

type RecordKey = (Address, PositionKind);

/// Keyed store of position records
#[derive(Debug, Default)]
pub struct PositionLedger {
    records: RwLock<HashMap<RecordKey, PositionRecord>>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a zero-balance record for `(owner, kind)`
    ///
    /// Fails with `AlreadyInitialized` if the record exists; the existing
    /// record is left untouched.
    pub fn initialize(&self, owner: Address, kind: PositionKind) -> Result<PositionRecord, LedgerError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);

        if records.contains_key(&(owner, kind)) {
            return Err(LedgerError::AlreadyInitialized { owner, kind });
        }

        let record = PositionRecord::new(owner, kind, Utc::now());
        records.insert((owner, kind), record.clone());
        Ok(record)
    }

    /// Read the record for `(owner, kind)`
    pub fn read(&self, owner: &Address, kind: PositionKind) -> Result<PositionRecord, LedgerError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&(*owner, kind))
            .cloned()
            .ok_or(LedgerError::NotFound { owner: *owner, kind })
    }

    /// Read a record if it exists
    pub fn get(&self, owner: &Address, kind: PositionKind) -> Option<PositionRecord> {
        self.read(owner, kind).ok()
    }

    /// Check whether a record exists
    pub fn contains(&self, owner: &Address, kind: PositionKind) -> bool {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.contains_key(&(*owner, kind))
    }

    /// Apply a signed delta to one record
    ///
    /// Fails with `Underflow` if the balance would become negative; the
    /// record is unchanged in that case.
    pub fn apply_delta(
        &self,
        owner: &Address,
        kind: PositionKind,
        delta: Decimal,
    ) -> Result<PositionRecord, LedgerError> {
        let mut applied = self.apply_deltas(&[PositionDelta {
            owner: *owner,
            kind,
            delta,
        }])?;
        // One delta in, one record out
        Ok(applied.remove(0))
    }

    /// Apply several deltas as one unit
    ///
    /// Every delta is validated before any record is written, so either all
    /// of them commit or none do. Returns the updated records in input order.
    pub fn apply_deltas(&self, deltas: &[PositionDelta]) -> Result<Vec<PositionRecord>, LedgerError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);

        // Stage the new balances; the same record may appear more than once
        let mut staged: HashMap<RecordKey, PositionRecord> = HashMap::new();
        for d in deltas {
            let key = (d.owner, d.kind);
            let current = match staged.get(&key) {
                Some(record) => record.clone(),
                None => records
                    .get(&key)
                    .cloned()
                    .ok_or(LedgerError::NotFound { owner: d.owner, kind: d.kind })?,
            };

            let new_balance = current
                .balance
                .value()
                .checked_add(d.delta)
                .ok_or(LedgerError::Overflow { owner: d.owner, kind: d.kind })?;
            let balance = Amount::new(new_balance).map_err(|_| LedgerError::Underflow {
                owner: d.owner,
                kind: d.kind,
                balance: current.balance.value(),
                delta: d.delta,
            })?;

            staged.insert(
                key,
                PositionRecord {
                    balance,
                    updated_at: Utc::now(),
                    ..current
                },
            );
        }

        let mut updated = Vec::with_capacity(deltas.len());
        for d in deltas {
            let key = (d.owner, d.kind);
            if let Some(record) = staged.get(&key) {
                records.insert(key, record.clone());
                updated.push(record.clone());
            }
        }

        Ok(updated)
    }

    /// Snapshot of every record, sorted by owner then kind
    pub fn records(&self) -> Vec<PositionRecord> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<PositionRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| (a.owner, a.kind).cmp(&(b.owner, b.kind)));
        all
    }

    /// Distinct owners with at least one record
    pub fn owners(&self) -> Vec<Address> {
        let mut owners: Vec<Address> = self.records().into_iter().map(|r| r.owner).collect();
        owners.dedup();
        owners
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn alice() -> Address {
        Address::new([1u8; 32])
    }

    fn bob() -> Address {
        Address::new([2u8; 32])
    }

    #[test]
    fn test_initialize_creates_zero_record() {
        let ledger = PositionLedger::new();
        let record = ledger.initialize(alice(), PositionKind::Collateral).unwrap();

        assert_eq!(record.balance, Amount::ZERO);
        assert_eq!(record.address, PositionKind::Collateral.address_for(&alice()));
        assert_eq!(ledger.read(&alice(), PositionKind::Collateral).unwrap(), record);
    }

    #[test]
    fn test_double_initialize_rejected_and_state_kept() {
        let ledger = PositionLedger::new();
        ledger.initialize(alice(), PositionKind::Collateral).unwrap();
        ledger
            .apply_delta(&alice(), PositionKind::Collateral, dec!(40))
            .unwrap();
        let before = ledger.read(&alice(), PositionKind::Collateral).unwrap();

        let result = ledger.initialize(alice(), PositionKind::Collateral);
        assert!(matches!(result, Err(LedgerError::AlreadyInitialized { .. })));
        assert_eq!(ledger.read(&alice(), PositionKind::Collateral).unwrap(), before);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let ledger = PositionLedger::new();
        let result = ledger.read(&alice(), PositionKind::Loan);
        assert_eq!(
            result,
            Err(LedgerError::NotFound {
                owner: alice(),
                kind: PositionKind::Loan
            })
        );
    }

    #[test]
    fn test_apply_delta_underflow() {
        let ledger = PositionLedger::new();
        ledger.initialize(alice(), PositionKind::Loan).unwrap();
        ledger.apply_delta(&alice(), PositionKind::Loan, dec!(100)).unwrap();

        let result = ledger.apply_delta(&alice(), PositionKind::Loan, dec!(-101));
        assert!(matches!(result, Err(LedgerError::Underflow { .. })));

        let record = ledger.read(&alice(), PositionKind::Loan).unwrap();
        assert_eq!(record.balance.value(), dec!(100));
    }

    #[test]
    fn test_apply_deltas_all_or_nothing() {
        let ledger = PositionLedger::new();
        ledger.initialize(alice(), PositionKind::Collateral).unwrap();
        ledger.initialize(alice(), PositionKind::Loan).unwrap();
        ledger.apply_delta(&alice(), PositionKind::Collateral, dec!(500)).unwrap();
        ledger.apply_delta(&alice(), PositionKind::Loan, dec!(200)).unwrap();

        // Second delta underflows, so the first must not commit either
        let result = ledger.apply_deltas(&[
            PositionDelta::debit(alice(), PositionKind::Collateral, Amount::from_units(100)),
            PositionDelta::debit(alice(), PositionKind::Loan, Amount::from_units(300)),
        ]);
        assert!(matches!(result, Err(LedgerError::Underflow { .. })));
        assert_eq!(
            ledger.read(&alice(), PositionKind::Collateral).unwrap().balance,
            Amount::from_units(500)
        );

        let updated = ledger
            .apply_deltas(&[
                PositionDelta::debit(alice(), PositionKind::Collateral, Amount::from_units(100)),
                PositionDelta::debit(alice(), PositionKind::Loan, Amount::from_units(150)),
            ])
            .unwrap();
        assert_eq!(updated[0].balance, Amount::from_units(400));
        assert_eq!(updated[1].balance, Amount::from_units(50));
    }

    #[test]
    fn test_owners_are_distinct() {
        let ledger = PositionLedger::new();
        ledger.initialize(bob(), PositionKind::Loan).unwrap();
        ledger.initialize(alice(), PositionKind::Collateral).unwrap();
        ledger.initialize(alice(), PositionKind::Loan).unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.owners(), vec![alice(), bob()]);
    }
}
