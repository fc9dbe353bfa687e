use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque, stable participant identifier.
pub type ParticipantId = String;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Accommodation,
    Transport,
    Entertainment,
    Utilities,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Accommodation => "accommodation",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Entertainment => "entertainment",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "food" => Some(ExpenseCategory::Food),
            "accommodation" => Some(ExpenseCategory::Accommodation),
            "transport" => Some(ExpenseCategory::Transport),
            "entertainment" => Some(ExpenseCategory::Entertainment),
            "utilities" => Some(ExpenseCategory::Utilities),
            "other" => Some(ExpenseCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    #[default]
    Equal,
    Exact,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Equal => "equal",
            SplitType::Exact => "exact",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "equal" => Some(SplitType::Equal),
            "exact" => Some(SplitType::Exact),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ParticipantShare {
    pub participant_id: ParticipantId,
    pub amount: f64,
}

/// An expense as stored in the ledger.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub paid_by: ParticipantId,
    pub split_type: SplitType,
    pub shares: Vec<ParticipantShare>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub date: DateTime<Utc>,
    pub created_by: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.shares.iter().map(|s| s.participant_id.clone()).collect()
    }
}

/// Ledger read model handed to the settlement engine.
///
/// References are optional: a payer or participant that does not resolve
/// against the group roster is carried as `None` and the aggregator skips
/// the whole record.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseRecord {
    pub id: String,
    pub payer: Option<ParticipantId>,
    pub amount: f64,
    pub shares: Vec<RecordShare>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecordShare {
    pub participant: Option<ParticipantId>,
    pub amount: f64,
}

impl ExpenseRecord {
    /// Builds a record with every reference present.
    pub fn new(id: &str, payer: &str, amount: f64, shares: &[(&str, f64)]) -> Self {
        ExpenseRecord {
            id: id.to_string(),
            payer: Some(payer.to_string()),
            amount,
            shares: shares
                .iter()
                .map(|(participant, amount)| RecordShare {
                    participant: Some(participant.to_string()),
                    amount: *amount,
                })
                .collect(),
        }
    }

    /// Resolves a stored expense against the set of known participants.
    pub fn resolve<F>(expense: &Expense, is_known: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let lookup = |id: &str| {
            if !id.trim().is_empty() && is_known(id) {
                Some(id.to_string())
            } else {
                None
            }
        };
        ExpenseRecord {
            id: expense.id.clone(),
            payer: lookup(&expense.paid_by),
            amount: expense.amount,
            shares: expense
                .shares
                .iter()
                .map(|share| RecordShare {
                    participant: lookup(&share.participant_id),
                    amount: share.amount,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ExpenseFilter {
    pub category: Option<ExpenseCategory>,
    #[schema(value_type = Option<String>, example = "2024-06-01")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "2024-06-30")]
    pub end_date: Option<NaiveDate>,
}

impl ExpenseFilter {
    /// Date bounds are inclusive; the end date covers the whole day.
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = self.category {
            if expense.category != category {
                return false;
            }
        }
        let day = expense.date.date_naive();
        if let Some(start) = self.start_date {
            if day < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if day > end {
                return false;
            }
        }
        true
    }
}
