mod aggregator_tests;
mod config_tests;
mod splitter_tests;

use crate::core::engine::ExpenseSplitter;
use crate::core::errors::LedgerError;
use crate::core::models::{
    Expense, ExpenseCategory, ExpenseFilter, ExpenseRecord, Group, GroupCategory, GroupMember, ParticipantShare,
    SettlementInstruction, SplitType, Transfer,
};
use crate::core::services::{LedgerService, NewExpense, NewGroup, NewMember, SplitInput};
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::infrastructure::storage::{ExpenseLedger, GroupDirectory, SettlementStore};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn create_test_service() -> (LedgerService<InMemoryLogging, InMemoryStorage>, Arc<InMemoryStorage>) {
    crate::telemetry::init_for_tests();
    let storage = Arc::new(InMemoryStorage::new());
    let service = LedgerService::new(storage.clone(), InMemoryLogging::new(), ExpenseSplitter::default());
    (service, storage)
}

pub fn member(id: &str, name: &str) -> NewMember {
    NewMember {
        participant_id: id.to_string(),
        name: name.to_string(),
    }
}

/// Group created by alice with bob and carol.
pub async fn create_trip<S>(service: &LedgerService<InMemoryLogging, S>) -> Group
where
    S: crate::infrastructure::storage::Storage + ?Sized,
{
    service
        .create_group(NewGroup {
            name: "Lisbon Trip".to_string(),
            description: "Long weekend".to_string(),
            category: GroupCategory::Trip,
            creator: member("alice", "Alice"),
            members: vec![member("bob", "Bob"), member("carol", "Carol")],
        })
        .await
        .unwrap()
}

pub fn equal_expense(group_id: &str, payer: &str, amount: f64, participants: &[&str]) -> NewExpense {
    NewExpense {
        group_id: group_id.to_string(),
        description: "Dinner".to_string(),
        amount,
        category: ExpenseCategory::Food,
        paid_by: payer.to_string(),
        split: SplitInput::Equal(participants.iter().map(|p| p.to_string()).collect()),
        date: None,
        created_by: Some(payer.to_string()),
    }
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Group written straight to a store, bypassing the service.
pub fn roster_group(id: &str, members: &[&str]) -> Group {
    let now = Utc::now();
    Group {
        id: id.to_string(),
        name: format!("Group {}", id),
        description: String::new(),
        category: GroupCategory::Other,
        members: members
            .iter()
            .map(|m| GroupMember {
                participant_id: m.to_string(),
                name: m.to_uppercase(),
                joined_at: now,
                left_at: None,
            })
            .collect(),
        created_by: members[0].to_string(),
        is_active: true,
        created_at: now,
    }
}

/// Stored expense with explicit shares, bypassing split validation.
pub fn raw_expense(id: &str, group_id: &str, payer: &str, amount: f64, shares: &[(&str, f64)]) -> Expense {
    let now = Utc::now();
    Expense {
        id: id.to_string(),
        group_id: group_id.to_string(),
        description: format!("Expense {}", id),
        amount,
        category: ExpenseCategory::Other,
        paid_by: payer.to_string(),
        split_type: SplitType::Exact,
        shares: shares
            .iter()
            .map(|(p, a)| ParticipantShare {
                participant_id: p.to_string(),
                amount: *a,
            })
            .collect(),
        date: now,
        created_by: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn transfer_triples(instructions: &[SettlementInstruction]) -> Vec<(String, String, f64)> {
    instructions
        .iter()
        .map(|i| (i.from.clone(), i.to.clone(), i.amount))
        .collect()
}

/// In-memory store that fails a set number of ledger reads or pending
/// replacements before behaving normally.
#[derive(Default)]
pub struct FaultyStorage {
    pub inner: InMemoryStorage,
    pub read_failures: AtomicUsize,
    pub replace_failures: AtomicUsize,
    pub replace_calls: AtomicUsize,
}

impl FaultyStorage {
    fn trip(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl GroupDirectory for FaultyStorage {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError> {
        self.inner.save_group(group).await
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        self.inner.get_group(group_id).await
    }

    async fn get_participant_groups(&self, participant_id: &str) -> Result<Vec<Group>, LedgerError> {
        self.inner.get_participant_groups(participant_id).await
    }
}

#[async_trait]
impl ExpenseLedger for FaultyStorage {
    async fn list_expenses(&self, group_id: &str) -> Result<Vec<ExpenseRecord>, LedgerError> {
        if Self::trip(&self.read_failures) {
            return Err(LedgerError::StorageError("ledger read failed".to_string()));
        }
        self.inner.list_expenses(group_id).await
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        self.inner.save_expense(expense).await
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        self.inner.get_expense(expense_id).await
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        self.inner.delete_expense(expense_id).await
    }

    async fn list_group_expenses(&self, group_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, LedgerError> {
        self.inner.list_group_expenses(group_id, filter).await
    }
}

#[async_trait]
impl SettlementStore for FaultyStorage {
    async fn replace_pending(
        &self,
        group_id: &str,
        transfers: Vec<Transfer>,
    ) -> Result<Vec<SettlementInstruction>, LedgerError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if Self::trip(&self.replace_failures) {
            return Err(LedgerError::StorageError("settlement write failed".to_string()));
        }
        self.inner.replace_pending(group_id, transfers).await
    }

    async fn list_pending(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        self.inner.list_pending(group_id).await
    }

    async fn list_settlements(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        self.inner.list_settlements(group_id).await
    }

    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<SettlementInstruction>, LedgerError> {
        self.inner.get_settlement(settlement_id).await
    }

    async fn mark_settled(&self, settlement_id: &str) -> Result<SettlementInstruction, LedgerError> {
        self.inner.mark_settled(settlement_id).await
    }
}
