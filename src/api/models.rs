use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::core::errors::LedgerError;
use crate::core::models::{ExpenseCategory, GroupCategory, ParticipantShare, SettlementInstruction, SplitType};
use crate::core::recalculation::RecomputeOutcome;
use crate::core::services::{ExpenseUpdate, NewMember, SplitInput};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: GroupCategory,
    pub created_by: NewMember,
    #[serde(default)]
    pub members: Vec<NewMember>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub participant_id: String,
    pub name: String,
    pub added_by_id: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RemoveMemberQuery {
    pub removed_by_id: String,
}

/// Equal splits list `participants`; exact splits list `shares`.
#[derive(Deserialize, ToSchema)]
pub struct AddExpenseRequest {
    pub group_id: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub paid_by_id: String,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub shares: Vec<ParticipantShare>,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub date: Option<DateTime<Utc>>,
    pub created_by_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<ExpenseCategory>,
    pub paid_by_id: Option<String>,
    pub split_type: Option<SplitType>,
    pub participants: Option<Vec<String>>,
    pub shares: Option<Vec<ParticipantShare>>,
    #[schema(value_type = Option<String>, example = "2024-06-01T12:34:56Z")]
    pub date: Option<DateTime<Utc>>,
    pub updated_by_id: Option<String>,
}

/// Optional acting participant, recorded in the audit trail.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ActorQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RecomputeResponse {
    pub group_id: String,
    pub aggregated: usize,
    pub skipped_records: usize,
    pub instructions: Vec<SettlementInstruction>,
}

impl From<RecomputeOutcome> for RecomputeResponse {
    fn from(outcome: RecomputeOutcome) -> Self {
        RecomputeResponse {
            group_id: outcome.group_id,
            aggregated: outcome.aggregated,
            skipped_records: outcome.warnings.len(),
            instructions: outcome.instructions,
        }
    }
}

fn split_input(split_type: SplitType, participants: Vec<String>, shares: Vec<ParticipantShare>) -> SplitInput {
    match split_type {
        SplitType::Equal => SplitInput::Equal(participants),
        SplitType::Exact => SplitInput::Exact(shares),
    }
}

impl AddExpenseRequest {
    pub fn split(&mut self) -> SplitInput {
        split_input(
            self.split_type,
            std::mem::take(&mut self.participants),
            std::mem::take(&mut self.shares),
        )
    }
}

impl UpdateExpenseRequest {
    /// A split change is requested by any of `split_type`, `participants` or
    /// `shares`; missing parts default to an equal split.
    pub fn into_update(self) -> (ExpenseUpdate, Option<String>) {
        let split = match (self.split_type, self.participants, self.shares) {
            (None, None, None) => None,
            (split_type, participants, shares) => {
                let split_type = split_type.unwrap_or(if shares.is_some() {
                    SplitType::Exact
                } else {
                    SplitType::Equal
                });
                Some(split_input(
                    split_type,
                    participants.unwrap_or_default(),
                    shares.unwrap_or_default(),
                ))
            }
        };
        let update = ExpenseUpdate {
            description: self.description,
            amount: self.amount,
            category: self.category,
            paid_by: self.paid_by_id,
            split,
            date: self.date,
        };
        (update, self.updated_by_id)
    }
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for LedgerError to implement IntoResponse
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LedgerError::InvalidInput(..)
            | LedgerError::EmptyParticipants
            | LedgerError::DuplicateParticipant(_)
            | LedgerError::InvalidSplit
            | LedgerError::InvalidSplitUser(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotGroupMember(_) | LedgerError::NotGroupCreator(..) | LedgerError::CreatorCannotLeave => {
                StatusCode::FORBIDDEN
            }
            LedgerError::GroupNotFound(_)
            | LedgerError::ExpenseNotFound(_)
            | LedgerError::SettlementNotFound(_)
            | LedgerError::EmptyLedger(_) => StatusCode::NOT_FOUND,
            LedgerError::AlreadyGroupMember(_)
            | LedgerError::SettlementAlreadySettled(_)
            | LedgerError::GroupInactive(_) => StatusCode::CONFLICT,
            LedgerError::ConsistencyViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::RecomputeQueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::StorageError(_)
            | LedgerError::LoggingError(_)
            | LedgerError::ReportError(_)
            | LedgerError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match &self.0 {
            LedgerError::InvalidInput(field, detail) => {
                format!("Invalid input for {}: {}", field, detail.description)
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
