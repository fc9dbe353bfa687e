use crate::core::errors::LedgerError;
use crate::core::models::audit::{AppLog, GroupAudit};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<Vec<AppLog>>>,
    group_audits: Arc<RwLock<HashMap<String, Vec<GroupAudit>>>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        InMemoryLogging::default()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        group_id: Option<&str>,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), LedgerError> {
        if !details.is_object() {
            return Err(LedgerError::LoggingError(format!(
                "details for {} must be a JSON object",
                action
            )));
        }
        let timestamp = Utc::now();

        if let Some(gid) = group_id {
            let mut audits = self.group_audits.write().await;
            audits.entry(gid.to_string()).or_default().push(GroupAudit {
                id: Uuid::new_v4().to_string(),
                group_id: gid.to_string(),
                action: action.to_string(),
                user_id: user_id.map(String::from),
                details: details.clone(),
                timestamp,
            });
        }

        let mut logs = self.logs.write().await;
        logs.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details,
            timestamp,
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        let logs = self.logs.read().await;
        Ok(logs.clone())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        let audits = self.group_audits.read().await;
        Ok(audits.get(group_id).cloned().unwrap_or_default())
    }
}
