use crate::core::engine::{BalanceAggregator, ExpenseSplitter, IntegrityIssue, RemainderPolicy, validate_ledger};
use crate::core::errors::LedgerError;
use crate::core::models::{ExpenseRecord, RecordShare};
use proptest::prelude::*;

fn balance(aggregation: &crate::core::engine::Aggregation, id: &str) -> f64 {
    aggregation.balances.get(id).copied().unwrap_or(0.0)
}

#[test]
fn test_aggregate_credits_payer_and_debits_shares() {
    let expenses = vec![
        ExpenseRecord::new("e1", "alice", 30.0, &[("alice", 10.0), ("bob", 10.0), ("carol", 10.0)]),
        ExpenseRecord::new("e2", "bob", 12.0, &[("alice", 6.0), ("bob", 6.0)]),
    ];
    let aggregation = BalanceAggregator::aggregate(&expenses);

    assert_eq!(aggregation.aggregated, 2);
    assert!(aggregation.warnings.is_empty());
    assert!((balance(&aggregation, "alice") - 14.0).abs() < 1e-9);
    assert!((balance(&aggregation, "bob") - -4.0).abs() < 1e-9);
    assert!((balance(&aggregation, "carol") - -10.0).abs() < 1e-9);
    assert!(aggregation.total().abs() < 1e-9);
}

#[test]
fn test_aggregate_sorted_is_identifier_ordered() {
    let expenses = vec![ExpenseRecord::new("e1", "zoe", 20.0, &[("mia", 10.0), ("adam", 10.0)])];
    let sorted = BalanceAggregator::aggregate(&expenses).sorted();
    let ids: Vec<&str> = sorted.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["adam", "mia", "zoe"]);
}

#[test]
fn test_aggregate_skips_record_with_missing_payer() {
    let mut orphan = ExpenseRecord::new("e2", "ghost", 50.0, &[("alice", 25.0), ("bob", 25.0)]);
    orphan.payer = None;
    let expenses = vec![
        ExpenseRecord::new("e1", "alice", 20.0, &[("alice", 10.0), ("bob", 10.0)]),
        orphan,
    ];
    let aggregation = BalanceAggregator::aggregate(&expenses);

    assert_eq!(aggregation.aggregated, 1);
    assert_eq!(aggregation.warnings.len(), 1);
    assert_eq!(aggregation.warnings[0].expense_id, "e2");
    assert_eq!(aggregation.warnings[0].issue, IntegrityIssue::MissingPayer);
    assert!((balance(&aggregation, "alice") - 10.0).abs() < 1e-9);
    assert!((balance(&aggregation, "bob") - -10.0).abs() < 1e-9);
}

#[test]
fn test_aggregate_skips_whole_record_with_missing_participant() {
    let record = ExpenseRecord {
        id: "e1".to_string(),
        payer: Some("alice".to_string()),
        amount: 30.0,
        shares: vec![
            RecordShare {
                participant: Some("bob".to_string()),
                amount: 15.0,
            },
            RecordShare {
                participant: None,
                amount: 15.0,
            },
        ],
    };
    let aggregation = BalanceAggregator::aggregate(&[record]);

    assert_eq!(aggregation.aggregated, 0);
    assert!(aggregation.balances.is_empty());
    assert_eq!(
        aggregation.warnings[0].issue,
        IntegrityIssue::MissingParticipant { share_index: 1 }
    );
}

#[test]
fn test_aggregate_skips_non_finite_amounts() {
    let expenses = vec![ExpenseRecord::new("e1", "alice", f64::NAN, &[("bob", 1.0)])];
    let aggregation = BalanceAggregator::aggregate(&expenses);
    assert_eq!(aggregation.aggregated, 0);
    assert_eq!(aggregation.warnings[0].issue, IntegrityIssue::NonFiniteAmount);
}

#[test]
fn test_validate_ledger_empty_depends_on_caller() {
    assert_eq!(
        validate_ledger("g1", &[], true),
        Err(LedgerError::EmptyLedger("g1".to_string()))
    );
    assert_eq!(validate_ledger("g1", &[], false), Ok(()));
}

#[test]
fn test_validate_ledger_rejects_negative_values() {
    let negative_amount = vec![ExpenseRecord::new("e1", "alice", -5.0, &[("bob", -5.0)])];
    assert!(matches!(
        validate_ledger("g1", &negative_amount, false),
        Err(LedgerError::InvalidInput(field, _)) if field == "amount"
    ));

    let negative_share = vec![ExpenseRecord::new("e1", "alice", 5.0, &[("bob", 6.0), ("carol", -1.0)])];
    assert!(matches!(
        validate_ledger("g1", &negative_share, false),
        Err(LedgerError::InvalidInput(field, _)) if field == "shares"
    ));
}

#[test]
fn test_aggregate_checked_accepts_rounding_drift() {
    let expenses = vec![ExpenseRecord::new("e1", "alice", 10.0, &[("alice", 3.33), ("bob", 3.33), ("carol", 3.33)])];
    let aggregation = BalanceAggregator::aggregate_checked("g1", &expenses).unwrap();
    assert!((aggregation.total() - 0.01).abs() < 1e-9);
}

#[test]
fn test_aggregate_checked_reports_consistency_violation() {
    let expenses = vec![ExpenseRecord::new("e1", "alice", 10.0, &[("bob", 5.0)])];
    match BalanceAggregator::aggregate_checked("g1", &expenses) {
        Err(LedgerError::ConsistencyViolation { group_id, sum, tolerance }) => {
            assert_eq!(group_id, "g1");
            assert!((sum - 5.0).abs() < 1e-9);
            assert!((tolerance - 0.02).abs() < 1e-9);
        }
        other => panic!("expected consistency violation, got {:?}", other),
    }
}

const POOL: [&str; 8] = ["ana", "ben", "cy", "dee", "eli", "fay", "gus", "hal"];

fn record_from(idx: usize, cents: u32, payer: usize, mask: u16, policy: RemainderPolicy) -> ExpenseRecord {
    let participants: Vec<String> = POOL
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, p)| p.to_string())
        .collect();
    let amount = cents as f64 / 100.0;
    let shares = ExpenseSplitter::new(policy).split(amount, &participants).unwrap();
    let shares: Vec<(&str, f64)> = shares.iter().map(|s| (s.participant_id.as_str(), s.amount)).collect();
    ExpenseRecord::new(&format!("e{}", idx), POOL[payer], amount, &shares)
}

proptest! {
    #[test]
    fn prop_balances_conserve_money_with_absorbed_remainder(
        expenses in prop::collection::vec((1u32..=100_000, 0usize..8, 1u16..256), 1..25)
    ) {
        let records: Vec<ExpenseRecord> = expenses
            .iter()
            .enumerate()
            .map(|(i, (cents, payer, mask))| record_from(i, *cents, *payer, *mask, RemainderPolicy::Absorb))
            .collect();
        let aggregation = BalanceAggregator::aggregate(&records);
        prop_assert!(aggregation.total().abs() <= 0.02 * records.len() as f64 + 1e-9);
        prop_assert!(BalanceAggregator::aggregate_checked("g", &records).is_ok());
    }

    #[test]
    fn prop_balances_conserve_money_with_ignored_remainder(
        expenses in prop::collection::vec((1u32..=100_000, 0usize..8, 1u16..256), 1..25)
    ) {
        let records: Vec<ExpenseRecord> = expenses
            .iter()
            .enumerate()
            .map(|(i, (cents, payer, mask))| record_from(i, *cents, *payer, *mask, RemainderPolicy::Ignore))
            .collect();
        let aggregation = BalanceAggregator::aggregate(&records);
        prop_assert!(aggregation.total().abs() <= 0.01 * records.len() as f64 + 1e-9);
        prop_assert!(BalanceAggregator::aggregate_checked("g", &records).is_ok());
    }
}
