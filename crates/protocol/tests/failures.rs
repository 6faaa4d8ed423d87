//! Failures after a transfer: custody, ledger and journal must still agree

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{units, Market, User};
use lending_core::Amount;
use lending_custody::InMemoryCustody;
use lending_events::{EventReader, PositionEvent};
use lending_protocol::LendingError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

fn journal_dir(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("journal")
}

/// Reopen the market on its journal, then take the journal away
fn reopen_with_broken_journal(path: &Path, custody: Arc<InMemoryCustody>) -> Market {
    let market = Market::with_journal(path, custody);
    std::fs::remove_dir_all(path).unwrap();
    market
}

/// Market with one user holding 1,000 collateral deposited and `borrowed` lent out
async fn setup(path: &Path, custody: Arc<InMemoryCustody>, borrowed: u64) -> (Market, User) {
    let market = Market::with_journal(path, custody);
    market.fund_loan_vault(10_000);
    let alice = market.user(1_000, 0);
    market.open_positions(&alice).await;
    market.deposit(&alice, 1_000).await.unwrap();
    if borrowed > 0 {
        market.borrow(&alice, borrowed).await.unwrap();
    }
    (market, alice)
}

#[tokio::test]
async fn test_borrow_with_failing_journal_pays_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let path = journal_dir(&temp_dir);
    let custody = Arc::new(InMemoryCustody::new());
    let (market, alice) = setup(&path, custody.clone(), 0).await;
    drop(market);

    let market = reopen_with_broken_journal(&path, custody);
    let err = market.borrow(&alice, 400).await.unwrap_err();

    assert!(matches!(err, LendingError::Journal(_)));
    assert_eq!(market.principal(&alice), Amount::ZERO);
    assert_eq!(market.balance(&alice.loan_account).await, Amount::ZERO);
    assert_eq!(market.balance(&market.protocol.loan_vault().address).await, units(10_000));
}

#[tokio::test]
async fn test_deposit_refunded_when_journal_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = journal_dir(&temp_dir);
    let custody = Arc::new(InMemoryCustody::new());
    let market = Market::with_journal(&path, custody.clone());
    let alice = market.user(1_000, 0);
    market.open_positions(&alice).await;
    market.deposit(&alice, 300).await.unwrap();
    drop(market);

    let market = reopen_with_broken_journal(&path, custody);
    let err = market.deposit(&alice, 200).await.unwrap_err();

    assert!(matches!(err, LendingError::Journal(_)));
    assert_eq!(market.collateral(&alice), units(300));
    assert_eq!(market.balance(&alice.collateral_account).await, units(700));
    assert_eq!(
        market.balance(&market.protocol.collateral_vault().address).await,
        units(300)
    );
}

#[tokio::test]
async fn test_repay_refunded_when_journal_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = journal_dir(&temp_dir);
    let custody = Arc::new(InMemoryCustody::new());
    let (market, alice) = setup(&path, custody.clone(), 400).await;
    drop(market);

    let market = reopen_with_broken_journal(&path, custody);
    let err = market.repay(&alice, 100).await.unwrap_err();

    assert!(matches!(err, LendingError::Journal(_)));
    assert_eq!(market.principal(&alice), units(400));
    assert_eq!(market.balance(&alice.loan_account).await, units(400));
    assert_eq!(market.balance(&market.protocol.loan_vault().address).await, units(9_600));
}

#[tokio::test]
async fn test_liquidation_refunded_when_journal_fails() {
    let temp_dir = TempDir::new().unwrap();
    let path = journal_dir(&temp_dir);
    let custody = Arc::new(InMemoryCustody::new());
    let (market, alice) = setup(&path, custody.clone(), 500).await;
    let keeper = market.user(0, 1_000);
    drop(market);

    let market = reopen_with_broken_journal(&path, custody);
    market.set_collateral_price(dec!(0.8));
    let err = market.liquidate(&keeper, &alice, 200).await.unwrap_err();

    assert!(matches!(err, LendingError::Journal(_)));
    assert_eq!(market.balance(&keeper.loan_account).await, units(1_000));
    assert_eq!(market.balance(&keeper.collateral_account).await, Amount::ZERO);
    assert_eq!(market.principal(&alice), units(500));
    assert_eq!(market.collateral(&alice), units(1_000));
    assert_eq!(market.balance(&market.protocol.loan_vault().address).await, units(9_500));
}

#[tokio::test]
async fn test_failed_collateral_payout_refunds_liquidator() {
    let temp_dir = TempDir::new().unwrap();
    let path = journal_dir(&temp_dir);
    let custody = Arc::new(InMemoryCustody::new());
    let (market, alice) = setup(&path, custody.clone(), 500).await;
    let keeper = market.user(0, 1_000);
    // A full collateral account cannot take the seized collateral
    market.mint(&keeper.collateral_account, Amount::new(Decimal::MAX).unwrap());
    market.set_collateral_price(dec!(0.8));

    let err = market.liquidate(&keeper, &alice, 200).await.unwrap_err();

    assert!(matches!(err, LendingError::InvalidAmount(_)));
    assert_eq!(market.balance(&keeper.loan_account).await, units(1_000));
    assert_eq!(market.principal(&alice), units(500));
    assert_eq!(market.collateral(&alice), units(1_000));
    assert_eq!(market.balance(&market.protocol.loan_vault().address).await, units(9_500));
    assert_eq!(
        market.balance(&market.protocol.collateral_vault().address).await,
        units(1_000)
    );

    // init x2, deposit, borrow, liquidated, reverted
    assert_eq!(market.protocol.journal_sequence(), Some(6));
    drop(market);

    let market = Market::with_journal(&path, custody);
    assert_eq!(market.principal(&alice), units(500));
    assert_eq!(market.collateral(&alice), units(1_000));
}

#[tokio::test]
async fn test_failed_borrow_payout_is_reverted_in_journal() {
    let temp_dir = TempDir::new().unwrap();
    let path = journal_dir(&temp_dir);
    let custody = Arc::new(InMemoryCustody::new());
    let (market, alice) = setup(&path, custody.clone(), 0).await;
    market.mint(&alice.loan_account, Amount::new(Decimal::MAX).unwrap());

    let err = market.borrow(&alice, 100).await.unwrap_err();

    assert!(matches!(err, LendingError::InvalidAmount(_)));
    assert_eq!(market.principal(&alice), Amount::ZERO);
    assert_eq!(market.balance(&market.protocol.loan_vault().address).await, units(10_000));
    drop(market);

    let records = EventReader::from_directory(&path).unwrap().read_all().unwrap();
    assert_eq!(records.len(), 5);
    assert!(matches!(records[3].event, PositionEvent::Borrowed { .. }));
    assert!(matches!(
        records[4].event,
        PositionEvent::Reverted { sequence: 4, .. }
    ));

    let market = Market::with_journal(&path, custody);
    assert_eq!(market.principal(&alice), Amount::ZERO);
}
