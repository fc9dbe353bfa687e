use crate::core::errors::LedgerError;
use crate::core::models::{Expense, ExpenseFilter, ExpenseRecord, Group, SettlementInstruction, Transfer};
use crate::infrastructure::storage::{ExpenseLedger, GroupDirectory, SettlementStore, validate_batch};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<HashMap<String, Expense>>>,
    // group_id -> instructions in creation order
    settlements: Arc<RwLock<HashMap<String, Vec<SettlementInstruction>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage::default()
    }
}

#[async_trait]
impl GroupDirectory for InMemoryStorage {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn get_participant_groups(&self, participant_id: &str) -> Result<Vec<Group>, LedgerError> {
        let groups = self.groups.read().await;
        let mut found: Vec<Group> = groups
            .values()
            .filter(|g| g.is_active && g.is_active_member(participant_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait]
impl ExpenseLedger for InMemoryStorage {
    async fn list_expenses(&self, group_id: &str) -> Result<Vec<ExpenseRecord>, LedgerError> {
        let group = self
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;
        let expenses = self.expenses.read().await;
        let mut own: Vec<&Expense> = expenses.values().filter(|e| e.group_id == group_id).collect();
        own.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(own
            .into_iter()
            .map(|e| ExpenseRecord::resolve(e, |id| group.knows(id)))
            .collect())
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut expenses = self.expenses.write().await;
        expenses.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.get(expense_id).cloned())
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let mut expenses = self.expenses.write().await;
        Ok(expenses.remove(expense_id))
    }

    async fn list_group_expenses(&self, group_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, LedgerError> {
        let expenses = self.expenses.read().await;
        let mut found: Vec<Expense> = expenses
            .values()
            .filter(|e| e.group_id == group_id && filter.matches(e))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait]
impl SettlementStore for InMemoryStorage {
    async fn replace_pending(
        &self,
        group_id: &str,
        transfers: Vec<Transfer>,
    ) -> Result<Vec<SettlementInstruction>, LedgerError> {
        validate_batch(group_id, &transfers)?;

        let now = Utc::now();
        let fresh: Vec<SettlementInstruction> = transfers
            .into_iter()
            .map(|t| SettlementInstruction::pending(Uuid::new_v4().to_string(), group_id, t, now))
            .collect();

        // Single write lock: readers see either the old or the new pending set.
        let mut settlements = self.settlements.write().await;
        let entry = settlements.entry(group_id.to_string()).or_default();
        entry.retain(|s| !s.is_pending());
        entry.extend(fresh.iter().cloned());
        Ok(fresh)
    }

    async fn list_pending(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .get(group_id)
            .map(|all| all.iter().filter(|s| s.is_pending()).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_settlements(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        let settlements = self.settlements.read().await;
        Ok(settlements.get(group_id).cloned().unwrap_or_default())
    }

    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<SettlementInstruction>, LedgerError> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .values()
            .flat_map(|all| all.iter())
            .find(|s| s.id == settlement_id)
            .cloned())
    }

    async fn mark_settled(&self, settlement_id: &str) -> Result<SettlementInstruction, LedgerError> {
        let mut settlements = self.settlements.write().await;
        let instruction = settlements
            .values_mut()
            .flat_map(|all| all.iter_mut())
            .find(|s| s.id == settlement_id && s.is_pending())
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))?;
        instruction.settle(Utc::now());
        Ok(instruction.clone())
    }
}
