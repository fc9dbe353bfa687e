use crate::core::engine::{ExpenseSplitter, RemainderPolicy};
use crate::core::errors::LedgerError;
use proptest::prelude::*;

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn amounts(splitter: ExpenseSplitter, amount: f64, names: &[&str]) -> Vec<f64> {
    splitter
        .split(amount, &ids(names))
        .unwrap()
        .into_iter()
        .map(|s| s.amount)
        .collect()
}

#[test]
fn test_split_absorbs_remainder_into_leading_participants() {
    let shares = amounts(ExpenseSplitter::new(RemainderPolicy::Absorb), 10.0, &["a", "b", "c"]);
    assert_eq!(shares, vec![3.34, 3.33, 3.33]);
    let total: f64 = shares.iter().sum();
    assert!((total - 10.0).abs() < 1e-9);
}

#[test]
fn test_split_ignoring_remainder_rounds_each_share() {
    let shares = amounts(ExpenseSplitter::new(RemainderPolicy::Ignore), 10.0, &["a", "b", "c"]);
    assert_eq!(shares, vec![3.33, 3.33, 3.33]);
    let total: f64 = shares.iter().sum();
    assert!((total - 9.99).abs() < 1e-9);
}

#[test]
fn test_split_ignoring_remainder_caps_drift_at_one_cent() {
    // 1.00 / 8 rounds to 0.13 each, four cents over; three come back off the leading shares.
    let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
    let shares = amounts(ExpenseSplitter::new(RemainderPolicy::Ignore), 1.0, &names);
    assert_eq!(shares, vec![0.12, 0.12, 0.12, 0.13, 0.13, 0.13, 0.13, 0.13]);
    let total: f64 = shares.iter().sum();
    assert!((total - 1.01).abs() < 1e-9);
}

#[test]
fn test_split_keeps_participant_order() {
    let splitter = ExpenseSplitter::default();
    let shares = splitter.split(0.05, &ids(&["carol", "alice", "bob"])).unwrap();
    let got: Vec<(&str, f64)> = shares.iter().map(|s| (s.participant_id.as_str(), s.amount)).collect();
    assert_eq!(got, vec![("carol", 0.02), ("alice", 0.02), ("bob", 0.01)]);
}

#[test]
fn test_split_even_amount_has_no_remainder() {
    let shares = amounts(ExpenseSplitter::default(), 9.0, &["a", "b", "c"]);
    assert_eq!(shares, vec![3.0, 3.0, 3.0]);
}

#[test]
fn test_split_single_participant_takes_everything() {
    let shares = amounts(ExpenseSplitter::default(), 42.42, &["solo"]);
    assert_eq!(shares, vec![42.42]);
}

#[test]
fn test_split_rejects_empty_participants() {
    let result = ExpenseSplitter::default().split(10.0, &[]);
    assert_eq!(result, Err(LedgerError::EmptyParticipants));
}

#[test]
fn test_split_rejects_duplicate_participants() {
    let result = ExpenseSplitter::default().split(10.0, &ids(&["a", "b", "a"]));
    assert_eq!(result, Err(LedgerError::DuplicateParticipant("a".to_string())));
}

#[test]
fn test_split_rejects_invalid_amounts() {
    let splitter = ExpenseSplitter::default();
    for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        match splitter.split(amount, &ids(&["a", "b"])) {
            Err(LedgerError::InvalidInput(field, _)) => assert_eq!(field, "amount"),
            other => panic!("expected invalid amount for {}, got {:?}", amount, other),
        }
    }
}

#[test]
fn test_remainder_policy_parses_case_insensitively() {
    assert_eq!("absorb".parse::<RemainderPolicy>(), Ok(RemainderPolicy::Absorb));
    assert_eq!(" IGNORE ".parse::<RemainderPolicy>(), Ok(RemainderPolicy::Ignore));
    assert!(matches!(
        "floor".parse::<RemainderPolicy>(),
        Err(LedgerError::ConfigError(_))
    ));
}

proptest! {
    #[test]
    fn prop_split_stays_within_a_cent_of_amount(
        cents in 1i64..=10_000_000,
        count in 1usize..40,
        ignore in any::<bool>(),
    ) {
        let policy = if ignore { RemainderPolicy::Ignore } else { RemainderPolicy::Absorb };
        let names: Vec<String> = (0..count).map(|i| format!("p{}", i)).collect();
        let amount = cents as f64 / 100.0;
        let shares = ExpenseSplitter::new(policy).split(amount, &names).unwrap();
        prop_assert_eq!(shares.len(), count);
        let total: i64 = shares.iter().map(|s| (s.amount * 100.0).round() as i64).sum();
        prop_assert!((total - cents).abs() <= 1, "{} over {} drifted to {}", cents, count, total);
        if !ignore {
            prop_assert_eq!(total, cents);
        }
    }
}
