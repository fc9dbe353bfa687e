// Audit action names
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
pub const EXPENSE_ADDED: &str = "EXPENSE_ADDED";
pub const EXPENSE_UPDATED: &str = "EXPENSE_UPDATED";
pub const EXPENSE_DELETED: &str = "EXPENSE_DELETED";
pub const SETTLEMENTS_RECOMPUTED: &str = "SETTLEMENTS_RECOMPUTED";
pub const SETTLEMENT_SETTLED: &str = "SETTLEMENT_SETTLED";
pub const REPORT_EXPORTED: &str = "REPORT_EXPORTED";

/// Residuals at or below this magnitude are treated as settled.
pub const SETTLEMENT_EPSILON: f64 = 0.01;

/// Allowed drift of the balance sum, per aggregated expense.
pub const CONSERVATION_EPSILON_PER_EXPENSE: f64 = 0.02;

/// Allowed difference between the sum of exact shares and the expense amount.
pub const SPLIT_TOLERANCE: f64 = 0.01;

pub const MAX_EXPENSE_AMOUNT: f64 = 1_000_000.0;
pub const MAX_DESCRIPTION_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 100;
