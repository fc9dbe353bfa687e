use utoipa::OpenApi;

use crate::{
    api::models::{AddExpenseRequest, AddMemberRequest, CreateGroupRequest, ErrorResponse, RecomputeResponse,
        UpdateExpenseRequest},
    core::{
        models::{
            AppLog, Expense, ExpenseCategory, Group, GroupAudit, GroupCategory, GroupMember, ParticipantShare,
            SettlementInstruction, SettlementStatus, SplitType,
        },
        services::{CategoryTotal, GroupBalances, GroupSummary, NewMember, ParticipantBalance},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::list_user_groups,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::add_expense,
        super::handlers::get_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::list_group_expenses,
        super::handlers::get_pending_settlements,
        super::handlers::get_group_balances,
        super::handlers::recompute_group,
        super::handlers::get_group_summary,
        super::handlers::export_group_report,
        super::handlers::settle_payment,
        super::handlers::get_app_logs,
        super::handlers::get_group_audits
    ),
    components(schemas(
        CreateGroupRequest,
        NewMember,
        AddMemberRequest,
        AddExpenseRequest,
        UpdateExpenseRequest,
        RecomputeResponse,
        ErrorResponse,
        Group,
        GroupMember,
        GroupCategory,
        Expense,
        ExpenseCategory,
        SplitType,
        ParticipantShare,
        SettlementInstruction,
        SettlementStatus,
        GroupBalances,
        ParticipantBalance,
        GroupSummary,
        CategoryTotal,
        AppLog,
        GroupAudit
    )),
    info(
        title = "SettleUp API",
        description = "Shared expenses, balances and debt settlement for groups",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
