//! SQLite-backed storage.
//!
//! All access goes through one connection behind a mutex; every multi-row
//! write runs inside a SQLite transaction so a failure rolls back cleanly.

use crate::core::errors::LedgerError;
use crate::core::models::{
    Expense, ExpenseCategory, ExpenseFilter, ExpenseRecord, Group, GroupCategory, GroupMember, ParticipantShare,
    SettlementInstruction, SettlementStatus, SplitType, Transfer,
};
use crate::infrastructure::storage::{ExpenseLedger, GroupDirectory, SettlementStore, validate_batch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS expense_groups (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    category TEXT NOT NULL,
    created_by TEXT NOT NULL,
    is_active INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS group_members (
    group_id TEXT NOT NULL,
    participant_id TEXT NOT NULL,
    name TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    left_at TEXT,
    position INTEGER NOT NULL,
    PRIMARY KEY (group_id, participant_id)
);
CREATE TABLE IF NOT EXISTS expenses (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    category TEXT NOT NULL,
    paid_by TEXT NOT NULL,
    split_type TEXT NOT NULL,
    date TEXT NOT NULL,
    created_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_expenses_group ON expenses(group_id);
CREATE TABLE IF NOT EXISTS expense_shares (
    expense_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    participant_id TEXT NOT NULL,
    amount REAL NOT NULL,
    PRIMARY KEY (expense_id, position)
);
CREATE TABLE IF NOT EXISTS settlements (
    id TEXT PRIMARY KEY,
    group_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    from_participant TEXT NOT NULL,
    to_participant TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    settled_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_settlements_group ON settlements(group_id, status);
";

const EXPENSE_COLUMNS: &str =
    "id, group_id, description, amount, category, paid_by, split_type, date, created_by, created_at, updated_at";

const SETTLEMENT_COLUMNS: &str = "id, group_id, from_participant, to_participant, amount, status, created_at, settled_at";

#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    pub fn open_in_memory() -> Result<Self, LedgerError> {
        Self::init(Connection::open_in_memory()?)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        Self::init(Connection::open(path)?)
    }

    fn init(conn: Connection) -> Result<Self, LedgerError> {
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStorage {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::StorageError("sqlite connection lock poisoned".to_string()))
    }

    fn load_group(conn: &Connection, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let group = conn
            .query_row(
                "SELECT id, name, description, category, created_by, is_active, created_at FROM expense_groups WHERE id = ?1",
                params![group_id],
                |row| {
                    Ok(Group {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        category: parse_enum(3, row.get::<_, String>(3)?, GroupCategory::parse)?,
                        members: Vec::new(),
                        created_by: row.get(4)?,
                        is_active: row.get(5)?,
                        created_at: parse_time(6, row.get(6)?)?,
                    })
                },
            )
            .optional()?;

        let Some(mut group) = group else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT participant_id, name, joined_at, left_at FROM group_members
             WHERE group_id = ?1 ORDER BY position",
        )?;
        group.members = stmt
            .query_map(params![group_id], |row| {
                Ok(GroupMember {
                    participant_id: row.get(0)?,
                    name: row.get(1)?,
                    joined_at: parse_time(2, row.get(2)?)?,
                    left_at: row
                        .get::<_, Option<String>>(3)?
                        .map(|raw| parse_time(3, raw))
                        .transpose()?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(group))
    }

    fn load_shares(conn: &Connection, group_id: &str) -> Result<HashMap<String, Vec<ParticipantShare>>, LedgerError> {
        let mut stmt = conn.prepare(
            "SELECT s.expense_id, s.participant_id, s.amount FROM expense_shares s
             JOIN expenses e ON e.id = s.expense_id
             WHERE e.group_id = ?1 ORDER BY s.expense_id, s.position",
        )?;
        let rows = stmt.query_map(params![group_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                ParticipantShare {
                    participant_id: row.get(1)?,
                    amount: row.get(2)?,
                },
            ))
        })?;
        let mut shares: HashMap<String, Vec<ParticipantShare>> = HashMap::new();
        for row in rows {
            let (expense_id, share) = row?;
            shares.entry(expense_id).or_default().push(share);
        }
        Ok(shares)
    }

    fn load_group_expenses(conn: &Connection, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let mut shares = Self::load_shares(conn, group_id)?;
        let sql = format!(
            "SELECT {} FROM expenses WHERE group_id = ?1 ORDER BY created_at, id",
            EXPENSE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let expenses = stmt
            .query_map(params![group_id], expense_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(expenses
            .into_iter()
            .map(|mut e| {
                e.shares = shares.remove(&e.id).unwrap_or_default();
                e
            })
            .collect())
    }

    fn load_settlements(
        conn: &Connection,
        group_id: &str,
        status: Option<SettlementStatus>,
    ) -> Result<Vec<SettlementInstruction>, LedgerError> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM settlements WHERE group_id = ?1 AND status = ?2 ORDER BY position",
                    SETTLEMENT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![group_id, status.as_str()], settlement_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM settlements WHERE group_id = ?1 ORDER BY position",
                    SETTLEMENT_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![group_id], settlement_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };
        Ok(rows)
    }

    fn load_settlement(conn: &Connection, settlement_id: &str) -> Result<Option<SettlementInstruction>, LedgerError> {
        let sql = format!("SELECT {} FROM settlements WHERE id = ?1", SETTLEMENT_COLUMNS);
        Ok(conn
            .query_row(&sql, params![settlement_id], settlement_from_row)
            .optional()?)
    }
}

fn parse_time(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_enum<T>(idx: usize, raw: String, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("unknown value `{}`", raw).into())
    })
}

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get(0)?,
        group_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: parse_enum(4, row.get(4)?, ExpenseCategory::parse)?,
        paid_by: row.get(5)?,
        split_type: parse_enum(6, row.get(6)?, SplitType::parse)?,
        shares: Vec::new(),
        date: parse_time(7, row.get(7)?)?,
        created_by: row.get(8)?,
        created_at: parse_time(9, row.get(9)?)?,
        updated_at: parse_time(10, row.get(10)?)?,
    })
}

fn settlement_from_row(row: &Row<'_>) -> rusqlite::Result<SettlementInstruction> {
    Ok(SettlementInstruction {
        id: row.get(0)?,
        group_id: row.get(1)?,
        from: row.get(2)?,
        to: row.get(3)?,
        amount: row.get(4)?,
        status: parse_enum(5, row.get(5)?, SettlementStatus::parse)?,
        created_at: parse_time(6, row.get(6)?)?,
        settled_at: row
            .get::<_, Option<String>>(7)?
            .map(|raw| parse_time(7, raw))
            .transpose()?,
    })
}

#[async_trait]
impl GroupDirectory for SqliteStorage {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO expense_groups (id, name, description, category, created_by, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description,
                 category = excluded.category, is_active = excluded.is_active",
            params![
                group.id,
                group.name,
                group.description,
                group.category.as_str(),
                group.created_by,
                group.is_active,
                group.created_at.to_rfc3339(),
            ],
        )?;
        tx.execute("DELETE FROM group_members WHERE group_id = ?1", params![group.id])?;
        for (position, member) in group.members.iter().enumerate() {
            tx.execute(
                "INSERT INTO group_members (group_id, participant_id, name, joined_at, left_at, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    group.id,
                    member.participant_id,
                    member.name,
                    member.joined_at.to_rfc3339(),
                    member.left_at.map(|t| t.to_rfc3339()),
                    position as i64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let conn = self.conn()?;
        Self::load_group(&conn, group_id)
    }

    async fn get_participant_groups(&self, participant_id: &str) -> Result<Vec<Group>, LedgerError> {
        let conn = self.conn()?;
        let ids: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT g.id FROM expense_groups g JOIN group_members m ON m.group_id = g.id
                 WHERE m.participant_id = ?1 AND m.left_at IS NULL AND g.is_active = 1
                 ORDER BY g.created_at DESC, g.id",
            )?;
            let ids = stmt
                .query_map(params![participant_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };
        let mut groups = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(group) = Self::load_group(&conn, &id)? {
                groups.push(group);
            }
        }
        Ok(groups)
    }
}

#[async_trait]
impl ExpenseLedger for SqliteStorage {
    async fn list_expenses(&self, group_id: &str) -> Result<Vec<ExpenseRecord>, LedgerError> {
        let conn = self.conn()?;
        let group =
            Self::load_group(&conn, group_id)?.ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;
        let expenses = Self::load_group_expenses(&conn, group_id)?;
        Ok(expenses
            .iter()
            .map(|e| ExpenseRecord::resolve(e, |id| group.knows(id)))
            .collect())
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!(
                "INSERT OR REPLACE INTO expenses ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                EXPENSE_COLUMNS
            ),
            params![
                expense.id,
                expense.group_id,
                expense.description,
                expense.amount,
                expense.category.as_str(),
                expense.paid_by,
                expense.split_type.as_str(),
                expense.date.to_rfc3339(),
                expense.created_by,
                expense.created_at.to_rfc3339(),
                expense.updated_at.to_rfc3339(),
            ],
        )?;
        tx.execute("DELETE FROM expense_shares WHERE expense_id = ?1", params![expense.id])?;
        for (position, share) in expense.shares.iter().enumerate() {
            tx.execute(
                "INSERT INTO expense_shares (expense_id, position, participant_id, amount) VALUES (?1, ?2, ?3, ?4)",
                params![expense.id, position as i64, share.participant_id, share.amount],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM expenses WHERE id = ?1", EXPENSE_COLUMNS);
        let Some(mut expense) = conn.query_row(&sql, params![expense_id], expense_from_row).optional()? else {
            return Ok(None);
        };
        let mut stmt =
            conn.prepare("SELECT participant_id, amount FROM expense_shares WHERE expense_id = ?1 ORDER BY position")?;
        expense.shares = stmt
            .query_map(params![expense_id], |row| {
                Ok(ParticipantShare {
                    participant_id: row.get(0)?,
                    amount: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(expense))
    }

    async fn delete_expense(&self, expense_id: &str) -> Result<Option<Expense>, LedgerError> {
        let existing = self.get_expense(expense_id).await?;
        if existing.is_none() {
            return Ok(None);
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM expense_shares WHERE expense_id = ?1", params![expense_id])?;
        tx.execute("DELETE FROM expenses WHERE id = ?1", params![expense_id])?;
        tx.commit()?;
        Ok(existing)
    }

    async fn list_group_expenses(&self, group_id: &str, filter: &ExpenseFilter) -> Result<Vec<Expense>, LedgerError> {
        let conn = self.conn()?;
        let mut found: Vec<Expense> = Self::load_group_expenses(&conn, group_id)?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait]
impl SettlementStore for SqliteStorage {
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

        let mut conn = self.conn()?;
        // Dropping `tx` without commit rolls everything back.
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM settlements WHERE group_id = ?1 AND status = ?2",
            params![group_id, SettlementStatus::Pending.as_str()],
        )?;
        let base: i64 = tx.query_row("SELECT COALESCE(MAX(position), 0) FROM settlements", [], |row| row.get(0))?;
        for (offset, instruction) in fresh.iter().enumerate() {
            tx.execute(
                &format!(
                    "INSERT INTO settlements ({}, position) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    SETTLEMENT_COLUMNS
                ),
                params![
                    instruction.id,
                    instruction.group_id,
                    instruction.from,
                    instruction.to,
                    instruction.amount,
                    instruction.status.as_str(),
                    instruction.created_at.to_rfc3339(),
                    Option::<String>::None,
                    base + offset as i64 + 1,
                ],
            )?;
        }
        tx.commit()?;
        Ok(fresh)
    }

    async fn list_pending(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        let conn = self.conn()?;
        Self::load_settlements(&conn, group_id, Some(SettlementStatus::Pending))
    }

    async fn list_settlements(&self, group_id: &str) -> Result<Vec<SettlementInstruction>, LedgerError> {
        let conn = self.conn()?;
        Self::load_settlements(&conn, group_id, None)
    }

    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<SettlementInstruction>, LedgerError> {
        let conn = self.conn()?;
        Self::load_settlement(&conn, settlement_id)
    }

    async fn mark_settled(&self, settlement_id: &str) -> Result<SettlementInstruction, LedgerError> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE settlements SET status = ?1, settled_at = ?2 WHERE id = ?3 AND status = ?4",
            params![
                SettlementStatus::Settled.as_str(),
                Utc::now().to_rfc3339(),
                settlement_id,
                SettlementStatus::Pending.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(LedgerError::SettlementNotFound(settlement_id.to_string()));
        }
        Self::load_settlement(&conn, settlement_id)?
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))
    }
}
