pub mod audit;
pub mod expense;
pub mod group;
pub mod settlement;

pub use audit::{AppLog, GroupAudit};
pub use expense::{
    Expense, ExpenseCategory, ExpenseFilter, ExpenseRecord, ParticipantId, ParticipantShare, RecordShare, SplitType,
};
pub use group::{Group, GroupCategory, GroupMember};
pub use settlement::{SettlementInstruction, SettlementStatus, Transfer};
