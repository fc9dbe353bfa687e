use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum LedgerError {
    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// Split requested over zero participants
    #[error("Cannot split an expense across zero participants")]
    EmptyParticipants,

    /// Same participant listed twice in one split
    #[error("Participant {0} listed more than once")]
    DuplicateParticipant(String),

    /// Exact shares don't add up to the expense amount
    #[error("Invalid split amounts")]
    InvalidSplit,

    /// Participant named in a split is not an active group member
    #[error("Invalid split user: {0}")]
    InvalidSplitUser(String),

    #[error("User {0} is not a group member")]
    NotGroupMember(String),

    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),

    #[error("User {0} is not allowed to manage group {1}")]
    NotGroupCreator(String, String),

    #[error("Group creator cannot be removed")]
    CreatorCannotLeave,

    /// A balance was requested for a group that has no expenses
    #[error("Group {0} has no expenses")]
    EmptyLedger(String),

    /// Aggregated balances do not net to zero within tolerance
    #[error("Balances for group {group_id} sum to {sum:.4}, beyond tolerance {tolerance:.4}")]
    ConsistencyViolation {
        group_id: String,
        sum: f64,
        tolerance: f64,
    },

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Group {0} is archived")]
    GroupInactive(String),

    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Settlement does not exist or is not pending
    #[error("Settlement {0} not found")]
    SettlementNotFound(String),

    #[error("Settlement {0} already settled")]
    SettlementAlreadySettled(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error("Report error: {0}")]
    ReportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Recompute queue is closed")]
    RecomputeQueueClosed,
}

impl LedgerError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        LedgerError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }

    /// Errors worth retrying: the ledger itself is fine, the store was not.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::StorageError(_) | LedgerError::RecomputeQueueClosed)
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::StorageError(err.to_string())
    }
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        LedgerError::ReportError(err.to_string())
    }
}
