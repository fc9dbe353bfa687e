use crate::constants::MAX_EXPENSE_AMOUNT;
use crate::core::errors::LedgerError;
use crate::core::models::{ParticipantId, ParticipantShare};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// What to do with the cents an equal split cannot distribute evenly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Leftover cents go one each to the leading participants, so shares
    /// always sum to the expense amount.
    #[default]
    Absorb,
    /// Every share is rounded independently; the sum may be off by at most
    /// one cent per expense.
    Ignore,
}

impl FromStr for RemainderPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "absorb" => Ok(RemainderPolicy::Absorb),
            "ignore" => Ok(RemainderPolicy::Ignore),
            other => Err(LedgerError::ConfigError(format!("unknown split remainder policy `{}`", other))),
        }
    }
}

/// Rounds a currency value to two decimals.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub(crate) fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ExpenseSplitter {
    policy: RemainderPolicy,
}

impl ExpenseSplitter {
    pub fn new(policy: RemainderPolicy) -> Self {
        ExpenseSplitter { policy }
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    /// Divides `amount` equally across `participants`, in the given order.
    pub fn split(&self, amount: f64, participants: &[ParticipantId]) -> Result<Vec<ParticipantShare>, LedgerError> {
        if participants.is_empty() {
            return Err(LedgerError::EmptyParticipants);
        }
        if !amount.is_finite() || amount <= 0.0 || amount > MAX_EXPENSE_AMOUNT {
            return Err(LedgerError::invalid_input(
                "amount",
                "Invalid Amount",
                format!("Amount must be greater than 0 and at most {}", MAX_EXPENSE_AMOUNT),
            ));
        }
        let mut seen = HashSet::with_capacity(participants.len());
        for participant in participants {
            if !seen.insert(participant.as_str()) {
                return Err(LedgerError::DuplicateParticipant(participant.clone()));
            }
        }

        let count = participants.len();
        let shares = match self.policy {
            RemainderPolicy::Ignore => {
                let total = to_cents(amount);
                let share = to_cents(amount / count as f64);
                // Keep at most one cent of drift; any further overflow moves
                // one cent at a time onto the leading participants.
                let drift = total - share * count as i64;
                let overflow = drift - drift.signum();
                let adjusted = overflow.unsigned_abs() as usize;
                participants
                    .iter()
                    .enumerate()
                    .map(|(idx, id)| {
                        let cents = if idx < adjusted { share + overflow.signum() } else { share };
                        ParticipantShare {
                            participant_id: id.clone(),
                            amount: cents as f64 / 100.0,
                        }
                    })
                    .collect()
            }
            RemainderPolicy::Absorb => {
                let total = to_cents(amount);
                let base = total / count as i64;
                let remainder = (total - base * count as i64) as usize;
                participants
                    .iter()
                    .enumerate()
                    .map(|(idx, id)| {
                        let cents = if idx < remainder { base + 1 } else { base };
                        ParticipantShare {
                            participant_id: id.clone(),
                            amount: cents as f64 / 100.0,
                        }
                    })
                    .collect()
            }
        };
        Ok(shares)
    }
}
