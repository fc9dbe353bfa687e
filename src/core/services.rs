use crate::constants::{
    EXPENSE_ADDED, EXPENSE_DELETED, EXPENSE_UPDATED, GROUP_CREATED, MAX_DESCRIPTION_LENGTH, MAX_EXPENSE_AMOUNT,
    MAX_NAME_LENGTH, MEMBER_ADDED, MEMBER_REMOVED, REPORT_EXPORTED, SETTLEMENT_SETTLED, SETTLEMENTS_RECOMPUTED,
    SPLIT_TOLERANCE,
};
use crate::core::engine::{BalanceAggregator, ExpenseSplitter, round_cents, validate_ledger};
use crate::core::errors::LedgerError;
use crate::core::models::{
    AppLog, Expense, ExpenseCategory, ExpenseFilter, Group, GroupAudit, GroupCategory, GroupMember, ParticipantId,
    ParticipantShare, SettlementInstruction, SplitType,
};
use crate::core::recalculation::{RecalculationCoordinator, RecomputeOutcome};
use crate::core::report;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::worker::RecomputeQueue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewMember {
    pub participant_id: ParticipantId,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct NewGroup {
    pub name: String,
    pub description: String,
    pub category: GroupCategory,
    pub creator: NewMember,
    pub members: Vec<NewMember>,
}

/// How an expense is divided among its participants.
#[derive(Clone, Debug)]
pub enum SplitInput {
    Equal(Vec<ParticipantId>),
    Exact(Vec<ParticipantShare>),
}

#[derive(Clone, Debug)]
pub struct NewExpense {
    pub group_id: String,
    pub description: String,
    pub amount: f64,
    pub category: ExpenseCategory,
    pub paid_by: ParticipantId,
    pub split: SplitInput,
    pub date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<ExpenseCategory>,
    pub paid_by: Option<ParticipantId>,
    pub split: Option<SplitInput>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ParticipantBalance {
    pub participant_id: ParticipantId,
    pub name: Option<String>,
    /// Positive when the group owes this participant.
    pub balance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupBalances {
    pub group_id: String,
    pub balances: Vec<ParticipantBalance>,
    pub skipped_records: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: f64,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupSummary {
    pub group_id: String,
    pub name: String,
    pub member_count: usize,
    pub expense_count: usize,
    pub total_expenses: f64,
    pub pending_settlements: usize,
    pub total_unsettled: f64,
    pub categories: Vec<CategoryTotal>,
}

pub struct LedgerService<L: LoggingService, S: Storage + ?Sized> {
    storage: Arc<S>,
    logging: L,
    coordinator: Arc<RecalculationCoordinator<S>>,
    splitter: ExpenseSplitter,
    recompute_queue: Option<RecomputeQueue>,
}

impl<L: LoggingService, S: Storage + ?Sized> LedgerService<L, S> {
    /// Builds a service that recomputes inline on every mutation.
    pub fn new(storage: Arc<S>, logging: L, splitter: ExpenseSplitter) -> Self {
        let coordinator = Arc::new(RecalculationCoordinator::new(storage.clone()));
        LedgerService {
            storage,
            logging,
            coordinator,
            splitter,
            recompute_queue: None,
        }
    }

    /// Switches mutations to deferred recomputation through `queue`.
    pub fn with_recompute_queue(mut self, queue: RecomputeQueue) -> Self {
        self.recompute_queue = Some(queue);
        self
    }

    pub fn coordinator(&self) -> Arc<RecalculationCoordinator<S>> {
        self.coordinator.clone()
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    async fn load_active_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        let group = self.load_group(group_id).await?;
        if !group.is_active {
            return Err(LedgerError::GroupInactive(group_id.to_string()));
        }
        Ok(group)
    }

    async fn validate_group_and_creator(&self, group_id: &str, participant_id: &str) -> Result<Group, LedgerError> {
        let group = self.load_active_group(group_id).await?;
        if group.created_by != participant_id {
            return Err(LedgerError::NotGroupCreator(
                participant_id.to_string(),
                group_id.to_string(),
            ));
        }
        Ok(group)
    }

    fn require_member(group: &Group, participant_id: &str) -> Result<(), LedgerError> {
        if !group.is_active_member(participant_id) {
            return Err(LedgerError::NotGroupMember(participant_id.to_string()));
        }
        Ok(())
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LedgerError> {
        self.logging.log_action(group_id, action, details, user_id).await
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.trim().is_empty() {
            return Err(LedgerError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        self.validate_optional_text(field, value, max_length)
    }

    fn validate_optional_text(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        if value.chars().count() > max_length {
            return Err(LedgerError::invalid_input(
                field,
                format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(LedgerError::invalid_input(
                field,
                format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: f64) -> Result<(), LedgerError> {
        if !amount.is_finite() {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be a finite number",
            ));
        }
        if amount <= 0.0 {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > MAX_EXPENSE_AMOUNT {
            return Err(LedgerError::invalid_input(
                field,
                "Amount Too Large",
                "Amount cannot exceed 1,000,000",
            ));
        }
        let cents = amount * 100.0;
        if (cents - cents.round()).abs() > 1e-6 {
            return Err(LedgerError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        Ok(())
    }

    /// Turns a split request into stored shares, checking every participant
    /// against the active roster.
    ///
    /// The shares that get stored, rounded to cents, must add up to `amount`
    /// within a cent, so a saved expense always passes the conservation check.
    fn build_shares(&self, group: &Group, amount: f64, split: &SplitInput) -> Result<Vec<ParticipantShare>, LedgerError> {
        let shares = match split {
            SplitInput::Equal(participants) => {
                for participant in participants {
                    if !group.is_active_member(participant) {
                        return Err(LedgerError::InvalidSplitUser(participant.clone()));
                    }
                }
                self.splitter.split(amount, participants)?
            }
            SplitInput::Exact(shares) => {
                if shares.is_empty() {
                    return Err(LedgerError::EmptyParticipants);
                }
                let mut seen = HashSet::with_capacity(shares.len());
                for share in shares {
                    if !group.is_active_member(&share.participant_id) {
                        return Err(LedgerError::InvalidSplitUser(share.participant_id.clone()));
                    }
                    if !seen.insert(share.participant_id.as_str()) {
                        return Err(LedgerError::DuplicateParticipant(share.participant_id.clone()));
                    }
                    if !share.amount.is_finite() || share.amount < 0.0 {
                        return Err(LedgerError::InvalidSplit);
                    }
                }
                shares
                    .iter()
                    .map(|s| ParticipantShare {
                        participant_id: s.participant_id.clone(),
                        amount: round_cents(s.amount),
                    })
                    .collect()
            }
        };

        let total: f64 = shares.iter().map(|s| s.amount).sum();
        if (total - amount).abs() > SPLIT_TOLERANCE + 1e-9 {
            warn!(group_id = %group.id, amount, total, "Rounded shares do not add up to the expense amount");
            return Err(LedgerError::InvalidSplit);
        }
        Ok(shares)
    }

    /// Brings the group's pending settlements in line with its ledger.
    ///
    /// Inline mode retries a transient failure once before giving up.
    async fn trigger_recompute(&self, group_id: &str) -> Result<(), LedgerError> {
        if let Some(queue) = &self.recompute_queue {
            match queue.enqueue(group_id) {
                Ok(()) => return Ok(()),
                Err(err) => warn!(group_id, error = %err, "Recompute queue unavailable, recomputing inline"),
            }
        }
        match self.coordinator.recompute(group_id).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_transient() => {
                warn!(group_id, error = %err, "Recompute failed, retrying once");
                self.coordinator.recompute(group_id).await.map(|_| ())
            }
            Err(err) => Err(err),
        }
    }

    // Groups

    pub async fn create_group(&self, input: NewGroup) -> Result<Group, LedgerError> {
        self.validate_string_input("name", &input.name, MAX_NAME_LENGTH)?;
        self.validate_optional_text("description", &input.description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_string_input("participant_id", &input.creator.participant_id, MAX_NAME_LENGTH)?;
        self.validate_string_input("member_name", &input.creator.name, MAX_NAME_LENGTH)?;

        let now = Utc::now();
        let mut members = vec![GroupMember {
            participant_id: input.creator.participant_id.clone(),
            name: input.creator.name.clone(),
            joined_at: now,
            left_at: None,
        }];
        for member in input.members {
            self.validate_string_input("participant_id", &member.participant_id, MAX_NAME_LENGTH)?;
            self.validate_string_input("member_name", &member.name, MAX_NAME_LENGTH)?;
            if members.iter().any(|m| m.participant_id == member.participant_id) {
                continue;
            }
            members.push(GroupMember {
                participant_id: member.participant_id,
                name: member.name,
                joined_at: now,
                left_at: None,
            });
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description,
            category: input.category,
            members,
            created_by: input.creator.participant_id,
            is_active: true,
            created_at: now,
        };
        self.storage.save_group(group.clone()).await?;
        info!(group_id = %group.id, members = group.members.len(), "Group created");

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "category": group.category.as_str(),
                "member_ids": group.members.iter().map(|m| m.participant_id.clone()).collect::<Vec<_>>()
            }),
            Some(group.created_by.as_str()),
        )
        .await?;
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.load_group(group_id).await
    }

    pub async fn list_user_groups(&self, participant_id: &str) -> Result<Vec<Group>, LedgerError> {
        self.storage.get_participant_groups(participant_id).await
    }

    /// Adds a participant, or brings a former member back onto the roster.
    pub async fn add_member(&self, group_id: &str, member: NewMember, added_by: &str) -> Result<Group, LedgerError> {
        let mut group = self.validate_group_and_creator(group_id, added_by).await?;
        self.validate_string_input("participant_id", &member.participant_id, MAX_NAME_LENGTH)?;
        self.validate_string_input("member_name", &member.name, MAX_NAME_LENGTH)?;

        if group.is_active_member(&member.participant_id) {
            return Err(LedgerError::AlreadyGroupMember(member.participant_id));
        }
        let now = Utc::now();
        match group
            .members
            .iter_mut()
            .find(|m| m.participant_id == member.participant_id)
        {
            Some(former) => {
                former.name = member.name.clone();
                former.joined_at = now;
                former.left_at = None;
            }
            None => group.members.push(GroupMember {
                participant_id: member.participant_id.clone(),
                name: member.name.clone(),
                joined_at: now,
                left_at: None,
            }),
        }
        self.storage.save_group(group.clone()).await?;
        info!(group_id, participant_id = %member.participant_id, "Member added");

        self.log_and_audit(
            Some(group_id),
            MEMBER_ADDED,
            json!({ "group_id": group_id, "participant_id": member.participant_id, "name": member.name }),
            Some(added_by),
        )
        .await?;
        Ok(group)
    }

    /// Marks a member as departed. Their expenses stay in the ledger and keep
    /// counting toward balances.
    pub async fn remove_member(&self, group_id: &str, member_id: &str, removed_by: &str) -> Result<Group, LedgerError> {
        let mut group = self.validate_group_and_creator(group_id, removed_by).await?;
        if member_id == group.created_by {
            return Err(LedgerError::CreatorCannotLeave);
        }
        let member = group
            .members
            .iter_mut()
            .find(|m| m.participant_id == member_id && m.is_active())
            .ok_or_else(|| LedgerError::NotGroupMember(member_id.to_string()))?;
        member.left_at = Some(Utc::now());
        let name = member.name.clone();

        self.storage.save_group(group.clone()).await?;
        info!(group_id, participant_id = member_id, "Member removed");

        self.log_and_audit(
            Some(group_id),
            MEMBER_REMOVED,
            json!({ "group_id": group_id, "participant_id": member_id, "name": name }),
            Some(removed_by),
        )
        .await?;
        Ok(group)
    }

    // Expenses

    pub async fn create_expense(&self, input: NewExpense) -> Result<Expense, LedgerError> {
        let group = self.load_active_group(&input.group_id).await?;
        self.validate_string_input("description", &input.description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_amount_input("amount", input.amount)?;
        Self::require_member(&group, &input.paid_by)?;
        if let Some(created_by) = &input.created_by {
            Self::require_member(&group, created_by)?;
        }

        let shares = self.build_shares(&group, input.amount, &input.split)?;
        let split_type = match input.split {
            SplitInput::Equal(_) => SplitType::Equal,
            SplitInput::Exact(_) => SplitType::Exact,
        };
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group.id.clone(),
            description: input.description,
            amount: input.amount,
            category: input.category,
            paid_by: input.paid_by,
            split_type,
            shares,
            date: input.date.unwrap_or(now),
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };

        self.storage.save_expense(expense.clone()).await?;
        info!(expense_id = %expense.id, group_id = %expense.group_id, amount = expense.amount, "Expense added");

        self.log_and_audit(
            Some(&expense.group_id),
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "description": expense.description,
                "amount": expense.amount,
                "paid_by": expense.paid_by,
                "participants": expense.participant_ids(),
            }),
            expense.created_by.as_deref(),
        )
        .await?;

        self.trigger_recompute(&expense.group_id).await?;
        Ok(expense)
    }

    pub async fn get_expense(&self, expense_id: &str) -> Result<Expense, LedgerError> {
        self.storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))
    }

    pub async fn list_group_expenses(&self, group_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, LedgerError> {
        self.load_group(group_id).await?;
        self.storage.list_group_expenses(group_id, filter).await
    }

    /// Applies a partial update. Equal splits are recomputed when the amount
    /// or the participant list changes.
    pub async fn update_expense(
        &self,
        expense_id: &str,
        update: ExpenseUpdate,
        updated_by: Option<&str>,
    ) -> Result<Expense, LedgerError> {
        let mut expense = self.get_expense(expense_id).await?;
        let group = self.load_active_group(&expense.group_id).await?;
        if let Some(user) = updated_by {
            Self::require_member(&group, user)?;
        }

        if let Some(description) = update.description {
            self.validate_string_input("description", &description, MAX_DESCRIPTION_LENGTH)?;
            expense.description = description;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        if let Some(paid_by) = update.paid_by {
            Self::require_member(&group, &paid_by)?;
            expense.paid_by = paid_by;
        }

        let amount_changed = match update.amount {
            Some(amount) => {
                self.validate_amount_input("amount", amount)?;
                let changed = (amount - expense.amount).abs() > f64::EPSILON;
                expense.amount = amount;
                changed
            }
            None => false,
        };

        let split = match update.split {
            Some(split) => Some(split),
            None if amount_changed => match expense.split_type {
                SplitType::Equal => Some(SplitInput::Equal(expense.participant_ids())),
                // Exact shares no longer add up to the new amount.
                SplitType::Exact => return Err(LedgerError::InvalidSplit),
            },
            None => None,
        };
        if let Some(split) = split {
            expense.shares = self.build_shares(&group, expense.amount, &split)?;
            expense.split_type = match split {
                SplitInput::Equal(_) => SplitType::Equal,
                SplitInput::Exact(_) => SplitType::Exact,
            };
        }
        expense.updated_at = Utc::now();

        self.storage.save_expense(expense.clone()).await?;
        info!(expense_id, group_id = %expense.group_id, "Expense updated");

        self.log_and_audit(
            Some(&expense.group_id),
            EXPENSE_UPDATED,
            json!({
                "expense_id": expense.id,
                "description": expense.description,
                "amount": expense.amount,
                "paid_by": expense.paid_by,
                "participants": expense.participant_ids(),
            }),
            updated_by,
        )
        .await?;

        self.trigger_recompute(&expense.group_id).await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, expense_id: &str, deleted_by: Option<&str>) -> Result<Expense, LedgerError> {
        let expense = self.get_expense(expense_id).await?;
        let group = self.load_active_group(&expense.group_id).await?;
        if let Some(user) = deleted_by {
            Self::require_member(&group, user)?;
        }

        let removed = self
            .storage
            .delete_expense(expense_id)
            .await?
            .ok_or_else(|| LedgerError::ExpenseNotFound(expense_id.to_string()))?;
        info!(expense_id, group_id = %removed.group_id, "Expense deleted");

        self.log_and_audit(
            Some(&removed.group_id),
            EXPENSE_DELETED,
            json!({ "expense_id": removed.id, "description": removed.description, "amount": removed.amount }),
            deleted_by,
        )
        .await?;

        self.trigger_recompute(&removed.group_id).await?;
        Ok(removed)
    }

    // Settlements

    /// Pending instructions, newest first.
    pub async fn list_pending_settlements(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        self.load_group(group_id).await?;
        let mut pending = self.storage.list_pending(group_id).await?;
        // Stable: one batch shares a timestamp and keeps its matching order.
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    pub async fn settle_payment(
        &self,
        settlement_id: &str,
        settled_by: Option<&str>,
    ) -> Result<SettlementInstruction, LedgerError> {
        let instruction = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))?;
        if !instruction.is_pending() {
            return Err(LedgerError::SettlementAlreadySettled(settlement_id.to_string()));
        }
        if let Some(user) = settled_by {
            let group = self.load_group(&instruction.group_id).await?;
            Self::require_member(&group, user)?;
        }

        // Under the group lock so a concurrent recompute cannot swap it out mid-way.
        let settled = self
            .coordinator
            .with_group_lock(&instruction.group_id, || self.storage.mark_settled(settlement_id))
            .await?;
        info!(settlement_id, group_id = %settled.group_id, amount = settled.amount, "Settlement recorded");

        self.log_and_audit(
            Some(&settled.group_id),
            SETTLEMENT_SETTLED,
            json!({
                "settlement_id": settled.id,
                "from": settled.from,
                "to": settled.to,
                "amount": settled.amount,
            }),
            settled_by,
        )
        .await?;
        Ok(settled)
    }

    /// Net position of every participant, sorted by identifier.
    pub async fn group_balances(&self, group_id: &str) -> Result<GroupBalances, LedgerError> {
        let group = self.load_group(group_id).await?;
        let expenses = self.storage.list_expenses(group_id).await?;
        validate_ledger(group_id, &expenses, true)?;
        let aggregation = BalanceAggregator::aggregate_checked(group_id, &expenses)?;

        let balances = aggregation
            .sorted()
            .into_iter()
            .map(|(participant_id, balance)| ParticipantBalance {
                name: group.member_name(&participant_id).map(String::from),
                participant_id,
                balance: round_cents(balance),
            })
            .collect();
        Ok(GroupBalances {
            group_id: group_id.to_string(),
            balances,
            skipped_records: aggregation.warnings.len(),
        })
    }

    /// Forces a recompute regardless of the configured mode.
    pub async fn recompute_group(
        &self,
        group_id: &str,
        requested_by: Option<&str>,
    ) -> Result<RecomputeOutcome, LedgerError> {
        self.load_group(group_id).await?;
        let outcome = self.coordinator.recompute(group_id).await?;

        self.log_and_audit(
            Some(group_id),
            SETTLEMENTS_RECOMPUTED,
            json!({
                "group_id": group_id,
                "aggregated": outcome.aggregated,
                "skipped": outcome.warnings.len(),
                "pending": outcome.instructions.len(),
            }),
            requested_by,
        )
        .await?;
        Ok(outcome)
    }

    // Reporting

    pub async fn group_summary(&self, group_id: &str) -> Result<GroupSummary, LedgerError> {
        let group = self.load_group(group_id).await?;
        let expenses = self.storage.list_group_expenses(group_id, &ExpenseFilter::default()).await?;
        let pending = self.storage.list_pending(group_id).await?;

        let mut by_category: BTreeMap<ExpenseCategory, (f64, usize)> = BTreeMap::new();
        for expense in &expenses {
            let entry = by_category.entry(expense.category).or_insert((0.0, 0));
            entry.0 += expense.amount;
            entry.1 += 1;
        }

        Ok(GroupSummary {
            group_id: group.id.clone(),
            name: group.name.clone(),
            member_count: group.active_members().count(),
            expense_count: expenses.len(),
            total_expenses: round_cents(expenses.iter().map(|e| e.amount).sum()),
            pending_settlements: pending.len(),
            total_unsettled: round_cents(pending.iter().map(|s| s.amount).sum()),
            categories: by_category
                .into_iter()
                .map(|(category, (total, count))| CategoryTotal {
                    category,
                    total: round_cents(total),
                    count,
                })
                .collect(),
        })
    }

    pub async fn expense_report_csv(&self, group_id: &str, requested_by: Option<&str>) -> Result<String, LedgerError> {
        let group = self.load_group(group_id).await?;
        let expenses = self.storage.list_group_expenses(group_id, &ExpenseFilter::default()).await?;
        let csv = report::expenses_to_csv(&group, &expenses)?;

        self.log_and_audit(
            Some(group_id),
            REPORT_EXPORTED,
            json!({ "group_id": group_id, "expenses": expenses.len() }),
            requested_by,
        )
        .await?;
        Ok(csv)
    }

    // Audit

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        self.load_group(group_id).await?;
        self.logging.get_group_audits(group_id).await
    }
}
