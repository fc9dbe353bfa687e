use crate::core::errors::LedgerError;
use crate::core::models::{Expense, ExpenseFilter, ExpenseRecord, Group, SettlementInstruction, Transfer};
use async_trait::async_trait;

#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    async fn get_participant_groups(&self, participant_id: &str) -> Result<Vec<Group>, LedgerError>;
}

#[async_trait]
pub trait ExpenseLedger: Send + Sync {
    /// Full ledger of a group, references resolved against the group roster.
    async fn list_expenses(&self, group_id: &str) -> Result<Vec<ExpenseRecord>, LedgerError>;
    async fn save_expense(&self, expense: Expense) -> Result<(), LedgerError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError>;
    async fn delete_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError>;
    async fn list_group_expenses(&self, group_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, LedgerError>;
}

#[async_trait]
pub trait SettlementStore: Send + Sync {
    /// Atomically swaps the group's pending instructions for `transfers`.
    /// Settled instructions are never touched.
    async fn replace_pending(
        &self,
        group_id: &str,
        transfers: Vec<Transfer>,
    ) -> Result<Vec<SettlementInstruction>, LedgerError>;
    async fn list_pending(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError>;
    async fn list_settlements(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError>;
    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<SettlementInstruction>, LedgerError>;
    /// Fails with `SettlementNotFound` unless the instruction exists and is pending.
    async fn mark_settled(&self, settlement_id: &str) -> Result<SettlementInstruction, LedgerError>;
}

pub trait Storage: GroupDirectory + ExpenseLedger + SettlementStore {}

impl<T: GroupDirectory + ExpenseLedger + SettlementStore> Storage for T {}

/// Checks a whole replacement batch before anything is written.
pub(crate) fn validate_batch(group_id: &str, transfers: &[Transfer]) -> Result<(), LedgerError> {
    for (idx, transfer) in transfers.iter().enumerate() {
        if !transfer.amount.is_finite() || transfer.amount <= 0.0 {
            return Err(LedgerError::StorageError(format!(
                "rejected settlement batch for group {}: entry {} has amount {}",
                group_id, idx, transfer.amount
            )));
        }
        if transfer.from.is_empty() || transfer.to.is_empty() || transfer.from == transfer.to {
            return Err(LedgerError::StorageError(format!(
                "rejected settlement batch for group {}: entry {} has invalid parties",
                group_id, idx
            )));
        }
    }
    Ok(())
}

pub mod in_memory;
pub mod sqlite;
