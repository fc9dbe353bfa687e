use crate::{
    api::models::*,
    core::{
        models::{AppLog, Expense, ExpenseFilter, Group, GroupAudit, SettlementInstruction},
        services::{GroupBalances, GroupSummary, LedgerService, NewExpense, NewGroup, NewMember},
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::Storage},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use http::header;

use std::sync::Arc;

pub type SharedService = Arc<LedgerService<InMemoryLogging, dyn Storage>>;

// Define API routes
pub fn api_routes(service: SharedService) -> Router {
    Router::new()
        .route("/groups", post(create_group))
        .route("/groups/{group_id}", get(get_group))
        .route("/users/{user_id}/groups", get(list_user_groups))
        .route("/groups/{group_id}/members", post(add_member))
        .route(
            "/groups/{group_id}/members/{member_id}",
            axum::routing::delete(remove_member),
        )
        .route("/expenses", post(add_expense))
        .route(
            "/expenses/{expense_id}",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/groups/{group_id}/expenses", get(list_group_expenses))
        .route("/groups/{group_id}/settlements", get(get_pending_settlements))
        .route("/groups/{group_id}/balances", get(get_group_balances))
        .route("/groups/{group_id}/recompute", post(recompute_group))
        .route("/groups/{group_id}/summary", get(get_group_summary))
        .route("/groups/{group_id}/report", get(export_group_report))
        .route("/settlements/{settlement_id}/settle", put(settle_payment))
        .route("/logs", get(get_app_logs))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn create_group(
    State(service): State<SharedService>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = service
        .create_group(NewGroup {
            name: req.name,
            description: req.description,
            category: req.category,
            creator: req.created_by,
            members: req.members,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group to retrieve")
    ),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<Group>, ApiError> {
    let group = service.get_group(&group_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/groups",
    params(
        ("user_id" = String, Path, description = "Participant whose active groups are listed")
    ),
    responses(
        (status = 200, description = "Groups retrieved successfully", body = [Group]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_user_groups(
    State(service): State<SharedService>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
    let groups = service.list_user_groups(&user_id).await?;
    Ok(Json(groups))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/members",
    request_body = AddMemberRequest,
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Member added successfully", body = Group),
        (status = 403, description = "Not group creator", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Already a group member", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn add_member(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Group>, ApiError> {
    let member = NewMember {
        participant_id: req.participant_id,
        name: req.name,
    };
    let group = service.add_member(&group_id, member, &req.added_by_id).await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/api/groups/{group_id}/members/{member_id}",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("member_id" = String, Path, description = "Participant to remove"),
        RemoveMemberQuery
    ),
    responses(
        (status = 200, description = "Member removed successfully", body = Group),
        (status = 403, description = "Not group creator, or creator removal", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn remove_member(
    State(service): State<SharedService>,
    Path((group_id, member_id)): Path<(String, String)>,
    Query(query): Query<RemoveMemberQuery>,
) -> Result<Json<Group>, ApiError> {
    let group = service
        .remove_member(&group_id, &member_id, &query.removed_by_id)
        .await?;
    Ok(Json(group))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = AddExpenseRequest,
    responses(
        (status = 201, description = "Expense added successfully", body = Expense),
        (status = 400, description = "Invalid expense or split", body = ErrorResponse),
        (status = 403, description = "Payer is not a group member", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn add_expense(
    State(service): State<SharedService>,
    Json(mut req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let split = req.split();
    let expense = service
        .create_expense(NewExpense {
            group_id: req.group_id,
            description: req.description,
            amount: req.amount,
            category: req.category,
            paid_by: req.paid_by_id,
            split,
            date: req.date,
            created_by: req.created_by_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = Expense),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_expense(
    State(service): State<SharedService>,
    Path(expense_id): Path<String>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service.get_expense(&expense_id).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    request_body = UpdateExpenseRequest,
    params(
        ("expense_id" = String, Path, description = "ID of the expense")
    ),
    responses(
        (status = 200, description = "Expense updated successfully", body = Expense),
        (status = 400, description = "Invalid expense or split", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn update_expense(
    State(service): State<SharedService>,
    Path(expense_id): Path<String>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let (update, updated_by) = req.into_update();
    let expense = service
        .update_expense(&expense_id, update, updated_by.as_deref())
        .await?;
    Ok(Json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(
        ("expense_id" = String, Path, description = "ID of the expense"),
        ActorQuery
    ),
    responses(
        (status = 200, description = "Expense deleted successfully", body = Expense),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_expense(
    State(service): State<SharedService>,
    Path(expense_id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service.delete_expense(&expense_id, actor.user_id.as_deref()).await?;
    Ok(Json(expense))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/expenses",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ("category" = Option<String>, Query, description = "Only expenses of this category"),
        ("start_date" = Option<String>, Query, description = "Inclusive lower bound, YYYY-MM-DD"),
        ("end_date" = Option<String>, Query, description = "Inclusive upper bound, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Expenses, newest first", body = [Expense]),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn list_group_expenses(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = service.list_group_expenses(&group_id, &filter).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/settlements",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Pending settlement instructions", body = [SettlementInstruction]),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_pending_settlements(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<SettlementInstruction>>, ApiError> {
    let settlements = service.list_pending_settlements(&group_id).await?;
    Ok(Json(settlements))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/balances",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Net balance per participant", body = GroupBalances),
        (status = 404, description = "Group not found or has no expenses", body = ErrorResponse),
        (status = 422, description = "Balances do not net to zero", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_balances(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupBalances>, ApiError> {
    let balances = service.group_balances(&group_id).await?;
    Ok(Json(balances))
}

#[utoipa::path(
    post,
    path = "/api/groups/{group_id}/recompute",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ActorQuery
    ),
    responses(
        (status = 200, description = "Pending settlements rebuilt", body = RecomputeResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 422, description = "Balances do not net to zero", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn recompute_group(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<RecomputeResponse>, ApiError> {
    let outcome = service.recompute_group(&group_id, actor.user_id.as_deref()).await?;
    Ok(Json(outcome.into()))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/summary",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group totals", body = GroupSummary),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_summary(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<GroupSummary>, ApiError> {
    let summary = service.group_summary(&group_id).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/report",
    params(
        ("group_id" = String, Path, description = "ID of the group"),
        ActorQuery
    ),
    responses(
        (status = 200, description = "Expense report", content_type = "text/csv", body = String),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn export_group_report(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let csv = service
        .expense_report_csv(&group_id, actor.user_id.as_deref())
        .await?;
    let disposition = format!("attachment; filename=\"expenses-{}.csv\"", group_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

#[utoipa::path(
    put,
    path = "/api/settlements/{settlement_id}/settle",
    params(
        ("settlement_id" = String, Path, description = "ID of the settlement instruction"),
        ActorQuery
    ),
    responses(
        (status = 200, description = "Settlement recorded", body = SettlementInstruction),
        (status = 404, description = "Settlement not found", body = ErrorResponse),
        (status = 409, description = "Settlement already settled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn settle_payment(
    State(service): State<SharedService>,
    Path(settlement_id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<SettlementInstruction>, ApiError> {
    let settled = service
        .settle_payment(&settlement_id, actor.user_id.as_deref())
        .await?;
    Ok(Json(settled))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs retrieved successfully", body = [AppLog]),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_app_logs(State(service): State<SharedService>) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}/audits",
    params(
        ("group_id" = String, Path, description = "ID of the group")
    ),
    responses(
        (status = 200, description = "Group audits retrieved successfully", body = [GroupAudit]),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group_audits(
    State(service): State<SharedService>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    let audits = service.get_group_audits(&group_id).await?;
    Ok(Json(audits))
}
