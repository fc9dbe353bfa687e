pub mod in_memory;

use crate::core::errors::LedgerError;
use crate::core::models::audit::{AppLog, GroupAudit};
use async_trait::async_trait;

/// Business audit trail. Diagnostics go through `tracing`; this records
/// who did what to which group.
#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        group_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LedgerError>;
    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError>;
}
