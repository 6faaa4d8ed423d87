//! Rebuild the position ledger from journal records

use std::collections::HashSet;

use lending_core::PositionKind;
use lending_ledger::{LedgerError, PositionDelta, PositionLedger};

use crate::error::EventError;
use crate::event::{JournalRecord, PositionEvent};

/// Apply every record, in order, to `ledger`
///
/// Records named by a later `Reverted` event are skipped. Returns the
/// number of records that changed the ledger.
pub fn replay(ledger: &PositionLedger, records: &[JournalRecord]) -> Result<usize, EventError> {
    let reverted: HashSet<u64> = records
        .iter()
        .filter_map(|record| match record.event {
            PositionEvent::Reverted { sequence, .. } => Some(sequence),
            _ => None,
        })
        .collect();

    let mut applied = 0;

    for record in records {
        if reverted.contains(&record.sequence) || matches!(record.event, PositionEvent::Reverted { .. }) {
            continue;
        }
        apply_event(ledger, &record.event).map_err(|source| EventError::Replay {
            sequence: record.sequence,
            source,
        })?;
        applied += 1;
    }

    Ok(applied)
}

/// Apply one event to `ledger`
///
/// Used both for replay and for live commits, so a journal always rebuilds
/// the balances it was written alongside.
pub fn apply_event(ledger: &PositionLedger, event: &PositionEvent) -> Result<(), LedgerError> {
    match event {
        PositionEvent::Initialized { owner, kind } => {
            ledger.initialize(*owner, *kind)?;
        }
        PositionEvent::Deposited { owner, amount } => {
            ledger.apply_delta(owner, PositionKind::Collateral, amount.value())?;
        }
        PositionEvent::Borrowed { owner, amount } => {
            ledger.apply_delta(owner, PositionKind::Loan, amount.value())?;
        }
        PositionEvent::Repaid { owner, amount } => {
            ledger.apply_delta(owner, PositionKind::Loan, -amount.value())?;
        }
        PositionEvent::Liquidated {
            owner,
            repaid,
            collateral_seized,
            ..
        } => {
            ledger.apply_deltas(&[
                PositionDelta::debit(*owner, PositionKind::Loan, *repaid),
                PositionDelta::debit(*owner, PositionKind::Collateral, *collateral_seized),
            ])?;
        }
        PositionEvent::Reverted { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{calculate_record_hash, GENESIS_HASH};
    use chrono::Utc;
    use lending_core::{Address, Amount};

    fn record(sequence: u64, event: PositionEvent) -> JournalRecord {
        let mut record = JournalRecord {
            sequence,
            prev_hash: GENESIS_HASH.to_string(),
            hash: String::new(),
            timestamp: Utc::now(),
            correlation_id: format!("r-{}", sequence),
            event,
        };
        record.hash = calculate_record_hash(&record);
        record
    }

    #[test]
    fn test_replay_rebuilds_balances() {
        let owner = Address::new([3u8; 32]);
        let liquidator = Address::new([4u8; 32]);
        let records = vec![
            record(1, PositionEvent::Initialized { owner, kind: PositionKind::Collateral }),
            record(2, PositionEvent::Initialized { owner, kind: PositionKind::Loan }),
            record(3, PositionEvent::Deposited { owner, amount: Amount::from_units(1_000) }),
            record(4, PositionEvent::Borrowed { owner, amount: Amount::from_units(500) }),
            record(5, PositionEvent::Repaid { owner, amount: Amount::from_units(100) }),
            record(
                6,
                PositionEvent::Liquidated {
                    owner,
                    liquidator,
                    repaid: Amount::from_units(200),
                    collateral_seized: Amount::from_units(210),
                },
            ),
        ];

        let ledger = PositionLedger::new();
        assert_eq!(replay(&ledger, &records).unwrap(), 6);

        let collateral = ledger.read(&owner, PositionKind::Collateral).unwrap();
        let loan = ledger.read(&owner, PositionKind::Loan).unwrap();
        assert_eq!(collateral.balance, Amount::from_units(790));
        assert_eq!(loan.balance, Amount::from_units(200));
    }

    #[test]
    fn test_replay_skips_reverted_records() {
        let owner = Address::new([3u8; 32]);
        let records = vec![
            record(1, PositionEvent::Initialized { owner, kind: PositionKind::Loan }),
            record(2, PositionEvent::Borrowed { owner, amount: Amount::from_units(400) }),
            record(3, PositionEvent::Reverted { owner, sequence: 2 }),
            record(4, PositionEvent::Borrowed { owner, amount: Amount::from_units(50) }),
        ];

        let ledger = PositionLedger::new();
        assert_eq!(replay(&ledger, &records).unwrap(), 2);
        assert_eq!(
            ledger.read(&owner, PositionKind::Loan).unwrap().balance,
            Amount::from_units(50)
        );
    }

    #[test]
    fn test_replay_reports_failing_sequence() {
        let owner = Address::new([3u8; 32]);
        let records = vec![record(1, PositionEvent::Deposited { owner, amount: Amount::from_units(1) })];

        let result = replay(&PositionLedger::new(), &records);
        assert!(matches!(result, Err(EventError::Replay { sequence: 1, .. })));
    }
}
