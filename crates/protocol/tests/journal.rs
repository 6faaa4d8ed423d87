//! Journal durability: replay, sequencing and tamper detection

mod common;

use std::sync::Arc;

use common::{units, Market};
use lending_core::Amount;
use lending_custody::InMemoryCustody;
use lending_events::{hash::verify_chain, EventReader};
use lending_protocol::{LendingError, LendingProtocol, ProtocolConfig};
use lending_oracle::ParityOracle;
use rust_decimal_macros::dec;
use tempfile::TempDir;

#[tokio::test]
async fn test_replay_reproduces_ledger() {
    let temp_dir = TempDir::new().unwrap();
    let custody = Arc::new(InMemoryCustody::new());

    let market = Market::with_journal(temp_dir.path(), custody.clone());
    market.fund_loan_vault(10_000);
    let alice = market.user(1_000, 0);
    let keeper = market.user(0, 1_000);
    market.open_positions(&alice).await;
    market.deposit(&alice, 1_000).await.unwrap();
    market.borrow(&alice, 500).await.unwrap();
    market.repay(&alice, 100).await.unwrap();
    market.set_collateral_price(dec!(0.6));
    let receipt = market.liquidate(&keeper, &alice, 200).await.unwrap();

    // init x2, deposit, borrow, repay, liquidate
    assert_eq!(receipt.sequence, Some(6));
    assert_eq!(market.protocol.journal_sequence(), Some(6));
    let before = market.protocol.ledger().records();
    drop(market);

    let restored = LendingProtocol::new(ProtocolConfig::default(), custody, Arc::new(ParityOracle))
        .unwrap()
        .with_journal(temp_dir.path())
        .unwrap();

    let after = restored.ledger().records();
    assert_eq!(after.len(), before.len());
    for (a, b) in after.iter().zip(before.iter()) {
        assert_eq!(a.owner, b.owner);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.balance, b.balance);
    }
    assert_eq!(restored.journal_sequence(), Some(6));
}

#[tokio::test]
async fn test_rejected_operations_are_not_journaled() {
    let temp_dir = TempDir::new().unwrap();
    let market = Market::with_journal(temp_dir.path(), Arc::new(InMemoryCustody::new()));
    market.fund_loan_vault(10_000);
    let alice = market.user(1_000, 0);
    market.open_positions(&alice).await;
    market.deposit(&alice, 1_000).await.unwrap();

    assert!(market.borrow(&alice, 501).await.is_err());
    assert!(market.repay(&alice, 1).await.is_err());
    assert!(market.deposit(&alice, 1).await.is_err());
    assert_eq!(market.protocol.journal_sequence(), Some(3));

    let records = EventReader::from_directory(temp_dir.path())
        .unwrap()
        .read_all()
        .unwrap();
    assert_eq!(records.len(), 3);
    assert!(verify_chain(&records).is_ok());
}

#[tokio::test]
async fn test_journal_continues_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let custody = Arc::new(InMemoryCustody::new());

    let market = Market::with_journal(temp_dir.path(), custody.clone());
    let alice = market.user(1_000, 0);
    market.open_positions(&alice).await;
    market.deposit(&alice, 400).await.unwrap();
    drop(market);

    let market = Market::with_journal(temp_dir.path(), custody);
    assert_eq!(market.collateral(&alice), units(400));

    let receipt = market.deposit(&alice, 100).await.unwrap();
    assert_eq!(receipt.sequence, Some(4));
    assert_eq!(receipt.collateral, Some(units(500)));

    let records = EventReader::from_directory(temp_dir.path())
        .unwrap()
        .read_all()
        .unwrap();
    assert!(verify_chain(&records).is_ok());
}

#[tokio::test]
async fn test_tampered_journal_refuses_to_open() {
    let temp_dir = TempDir::new().unwrap();
    let market = Market::with_journal(temp_dir.path(), Arc::new(InMemoryCustody::new()));
    let alice = market.user(1_000, 0);
    market.open_positions(&alice).await;
    market.deposit(&alice, 400).await.unwrap();
    drop(market);

    // Inflate the recorded deposit
    let reader = EventReader::from_directory(temp_dir.path()).unwrap();
    let file = reader.files()[0].clone();
    let content = std::fs::read_to_string(&file).unwrap();
    let tampered: Vec<String> = content
        .lines()
        .map(|line| {
            let mut value: serde_json::Value = serde_json::from_str(line).unwrap();
            if value["event"]["type"] == "deposited" {
                value["event"]["amount"] = serde_json::json!("4000");
            }
            value.to_string()
        })
        .collect();
    std::fs::write(&file, tampered.join("\n") + "\n").unwrap();

    let result = LendingProtocol::new(
        ProtocolConfig::default(),
        Arc::new(InMemoryCustody::new()),
        Arc::new(ParityOracle),
    )
    .unwrap()
    .with_journal(temp_dir.path());
    assert!(matches!(result, Err(LendingError::Journal(_))));
}

#[tokio::test]
async fn test_unjournaled_protocol_has_no_sequence() {
    let market = Market::new();
    let alice = market.user(10, 0);
    market.open_positions(&alice).await;

    let receipt = market.deposit(&alice, 10).await.unwrap();
    assert_eq!(receipt.sequence, None);
    assert_eq!(market.protocol.journal_sequence(), None);
    assert_ne!(market.collateral(&alice), Amount::ZERO);
}
