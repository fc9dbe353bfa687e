use crate::constants::CONSERVATION_EPSILON_PER_EXPENSE;
use crate::core::errors::LedgerError;
use crate::core::models::{ExpenseRecord, ParticipantId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, warn};

pub type Balances = HashMap<ParticipantId, f64>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    MissingPayer,
    MissingParticipant { share_index: usize },
    NonFiniteAmount,
}

/// A ledger record the aggregator had to skip.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IntegrityWarning {
    pub expense_id: String,
    pub issue: IntegrityIssue,
}

#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    pub balances: Balances,
    pub warnings: Vec<IntegrityWarning>,
    /// Records that contributed to `balances`.
    pub aggregated: usize,
}

impl Aggregation {
    pub fn total(&self) -> f64 {
        self.balances.values().sum()
    }

    pub fn tolerance(&self) -> f64 {
        CONSERVATION_EPSILON_PER_EXPENSE * self.aggregated as f64
    }

    /// Balances as identifier-sorted pairs.
    pub fn sorted(&self) -> Vec<(ParticipantId, f64)> {
        let mut pairs: Vec<(ParticipantId, f64)> = self.balances.iter().map(|(id, v)| (id.clone(), *v)).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }
}

/// Rejects ledgers the engine must not aggregate.
///
/// `require_expenses` is set by callers that expect a balance to exist;
/// recomputation accepts an empty ledger and produces no instructions.
pub fn validate_ledger(group_id: &str, expenses: &[ExpenseRecord], require_expenses: bool) -> Result<(), LedgerError> {
    if require_expenses && expenses.is_empty() {
        return Err(LedgerError::EmptyLedger(group_id.to_string()));
    }
    for expense in expenses {
        if expense.amount.is_finite() && expense.amount < 0.0 {
            return Err(LedgerError::invalid_input(
                "amount",
                "Negative Amount",
                format!("Expense {} has a negative amount", expense.id),
            ));
        }
        if expense.shares.iter().any(|s| s.amount.is_finite() && s.amount < 0.0) {
            return Err(LedgerError::invalid_input(
                "shares",
                "Negative Share",
                format!("Expense {} has a negative share", expense.id),
            ));
        }
    }
    Ok(())
}

pub struct BalanceAggregator;

impl BalanceAggregator {
    pub fn aggregate(expenses: &[ExpenseRecord]) -> Aggregation {
        let mut aggregation = Aggregation::default();

        for expense in expenses {
            let Some(payer) = Self::check(expense, &mut aggregation.warnings) else {
                continue;
            };

            *aggregation.balances.entry(payer.clone()).or_insert(0.0) += expense.amount;
            for share in &expense.shares {
                if let Some(participant) = &share.participant {
                    *aggregation.balances.entry(participant.clone()).or_insert(0.0) -= share.amount;
                }
            }
            aggregation.aggregated += 1;
        }

        debug!(
            aggregated = aggregation.aggregated,
            skipped = aggregation.warnings.len(),
            participants = aggregation.balances.len(),
            "Aggregated balances"
        );
        aggregation
    }

    /// Aggregates and enforces the conservation invariant.
    pub fn aggregate_checked(group_id: &str, expenses: &[ExpenseRecord]) -> Result<Aggregation, LedgerError> {
        let aggregation = Self::aggregate(expenses);
        let sum = aggregation.total();
        let tolerance = aggregation.tolerance();
        if sum.abs() > tolerance + f64::EPSILON {
            error!(group_id, sum, tolerance, "Balance sum diverges from zero");
            return Err(LedgerError::ConsistencyViolation {
                group_id: group_id.to_string(),
                sum,
                tolerance,
            });
        }
        Ok(aggregation)
    }

    fn check<'a>(expense: &'a ExpenseRecord, warnings: &mut Vec<IntegrityWarning>) -> Option<&'a ParticipantId> {
        let issue = if !expense.amount.is_finite() || expense.shares.iter().any(|s| !s.amount.is_finite()) {
            Some(IntegrityIssue::NonFiniteAmount)
        } else if expense.payer.is_none() {
            Some(IntegrityIssue::MissingPayer)
        } else {
            expense
                .shares
                .iter()
                .position(|s| s.participant.is_none())
                .map(|share_index| IntegrityIssue::MissingParticipant { share_index })
        };

        match issue {
            Some(issue) => {
                warn!(expense_id = %expense.id, ?issue, "Skipping malformed ledger record");
                warnings.push(IntegrityWarning {
                    expense_id: expense.id.clone(),
                    issue,
                });
                None
            }
            None => expense.payer.as_ref(),
        }
    }
}
