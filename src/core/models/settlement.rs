use super::expense::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Settled,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Settled => "settled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SettlementStatus::Pending),
            "settled" => Some(SettlementStatus::Settled),
            _ => None,
        }
    }
}

/// A payment the debt simplifier asks for: `from` pays `to`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: f64,
}

impl Transfer {
    pub fn new(from: &str, to: &str, amount: f64) -> Self {
        Transfer {
            from: from.to_string(),
            to: to.to_string(),
            amount,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct SettlementInstruction {
    pub id: String,
    pub group_id: String,
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: f64,
    pub status: SettlementStatus,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl SettlementInstruction {
    pub fn pending(id: String, group_id: &str, transfer: Transfer, created_at: DateTime<Utc>) -> Self {
        SettlementInstruction {
            id,
            group_id: group_id.to_string(),
            from: transfer.from,
            to: transfer.to,
            amount: transfer.amount,
            status: SettlementStatus::Pending,
            created_at,
            settled_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == SettlementStatus::Pending
    }

    /// The only transition out of `Pending`. Settled instructions are terminal.
    pub fn settle(&mut self, at: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = SettlementStatus::Settled;
        self.settled_at = Some(at);
        true
    }
}
