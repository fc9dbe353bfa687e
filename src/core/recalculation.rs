use crate::core::engine::{BalanceAggregator, DebtSimplifier, IntegrityWarning, validate_ledger};
use crate::core::errors::LedgerError;
use crate::core::models::SettlementInstruction;
use crate::infrastructure::storage::Storage;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// How mutations reach the settlement store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecomputeMode {
    /// The mutation awaits recomputation before returning.
    #[default]
    Inline,
    /// The mutation enqueues the group on the background worker.
    Deferred,
}

impl FromStr for RecomputeMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(RecomputeMode::Inline),
            "deferred" => Ok(RecomputeMode::Deferred),
            other => Err(LedgerError::ConfigError(format!("unknown recompute mode `{}`", other))),
        }
    }
}

/// Registry of per-group async mutexes.
///
/// Entries live only while someone holds or waits on them; `prune` drops an
/// entry once the registry holds the last reference.
#[derive(Default)]
pub struct GroupLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        GroupLocks::default()
    }

    pub fn get(&self, group_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Removes the group's entry if no caller still holds its mutex.
    pub fn prune(&self, group_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks.get(group_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(group_id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RecomputeOutcome {
    pub group_id: String,
    /// Ledger records that contributed to the balances.
    pub aggregated: usize,
    pub warnings: Vec<IntegrityWarning>,
    pub instructions: Vec<SettlementInstruction>,
}

/// Owns the read, compute, replace cycle for a group's pending settlements.
pub struct RecalculationCoordinator<S: ?Sized> {
    storage: Arc<S>,
    locks: GroupLocks,
}

impl<S: Storage + ?Sized> RecalculationCoordinator<S> {
    pub fn new(storage: Arc<S>) -> Self {
        RecalculationCoordinator {
            storage,
            locks: GroupLocks::new(),
        }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Runs `f` while holding the group's lock.
    pub async fn with_group_lock<F, Fut, T>(&self, group_id: &str, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.locks.get(group_id);
        let result = {
            let _guard = lock.lock().await;
            f().await
        };
        drop(lock);
        self.locks.prune(group_id);
        result
    }

    pub fn locks(&self) -> &GroupLocks {
        &self.locks
    }

    /// Rebuilds the group's pending instructions from its full ledger.
    ///
    /// Any failure before the replace leaves the store as it was; the replace
    /// itself is atomic in every store. Safe to call repeatedly.
    pub async fn recompute(&self, group_id: &str) -> Result<RecomputeOutcome, LedgerError> {
        self.with_group_lock(group_id, || self.recompute_locked(group_id)).await
    }

    async fn recompute_locked(&self, group_id: &str) -> Result<RecomputeOutcome, LedgerError> {
        let expenses = self.storage.list_expenses(group_id).await?;
        validate_ledger(group_id, &expenses, false)?;

        let aggregation = BalanceAggregator::aggregate_checked(group_id, &expenses)?;
        let transfers = DebtSimplifier::simplify(&aggregation.balances);
        debug!(group_id, transfers = transfers.len(), "Computed settlement plan");

        let instructions = self.storage.replace_pending(group_id, transfers).await?;
        info!(
            group_id,
            aggregated = aggregation.aggregated,
            skipped = aggregation.warnings.len(),
            pending = instructions.len(),
            "Recomputed settlements"
        );

        Ok(RecomputeOutcome {
            group_id: group_id.to_string(),
            aggregated: aggregation.aggregated,
            warnings: aggregation.warnings,
            instructions,
        })
    }
}
