//! Expense endpoints

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use super::{ApiError, ServerState};
use crate::application::{AppError, ExpenseRequest, OverallReport, UserExpense, UserOwedTotal};
use crate::domain::{Expense, ExpenseId, UserId, format_date_time, format_millis};
use crate::io::{Exporter, SheetKind};

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseCreated {
    #[serde(rename = "ExpenseID")]
    pub expense_id: ExpenseId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserExpenseView {
    pub expense_id: ExpenseId,
    pub title: String,
    pub description: Option<String>,
    pub expense_date: String,
    pub split_method: String,
    pub total_amount: String,
    pub amount_owed: String,
}

impl From<UserExpense> for UserExpenseView {
    fn from(e: UserExpense) -> Self {
        Self {
            expense_id: e.expense_id,
            title: e.title,
            description: e.description,
            expense_date: format_date_time(e.occurred_at),
            split_method: e.split_method.as_str().to_string(),
            total_amount: format_millis(e.total_amount),
            amount_owed: format_millis(e.amount_owed),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseView {
    pub expense_id: ExpenseId,
    pub title: String,
    pub description: Option<String>,
    pub expense_date: String,
    pub total_amount: String,
    pub split_method: String,
}

impl From<Expense> for ExpenseView {
    fn from(e: Expense) -> Self {
        Self {
            expense_id: e.id,
            title: e.title,
            description: e.description,
            expense_date: format_date_time(e.occurred_at),
            total_amount: format_millis(e.total_amount),
            split_method: e.split_method.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserOwedView {
    pub user_id: UserId,
    pub email: String,
    pub total_amount_owed: String,
}

impl From<UserOwedTotal> for UserOwedView {
    fn from(t: UserOwedTotal) -> Self {
        Self {
            user_id: t.user_id,
            email: t.email,
            total_amount_owed: format_millis(t.total_owed),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverallSummaryView {
    pub total_expenses: usize,
    pub total_amount_spent: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverallView {
    pub overall_summary: OverallSummaryView,
    pub expenses: Vec<ExpenseView>,
    pub user_summary: Vec<UserOwedView>,
}

impl From<OverallReport> for OverallView {
    fn from(report: OverallReport) -> Self {
        Self {
            overall_summary: OverallSummaryView {
                total_expenses: report.overall_summary.total_expenses,
                total_amount_spent: format_millis(report.overall_summary.total_amount_spent),
            },
            expenses: report.expenses.into_iter().map(Into::into).collect(),
            user_summary: report.user_summary.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SheetQuery {
    pub date: Option<String>,
    pub sheet: Option<String>,
}

pub async fn add(
    State(state): State<ServerState>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ApiError> {
    let Json(request) = payload?;
    let expense_id = state.service.record_expense(request).await?;
    Ok((StatusCode::CREATED, Json(ExpenseCreated { expense_id })))
}

pub async fn list_for_user(
    State(state): State<ServerState>,
    user_id: Result<Path<String>, PathRejection>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<UserExpenseView>>, ApiError> {
    let Path(raw_id) = user_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let Query(query) = query?;

    let user_id: UserId = raw_id
        .parse()
        .map_err(|_| AppError::InvalidIdFormat(raw_id.clone()))?;

    let expenses = state
        .service
        .list_user_expenses(user_id, query.date.as_deref())
        .await?;
    Ok(Json(expenses.into_iter().map(Into::into).collect()))
}

pub async fn overall(
    State(state): State<ServerState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<OverallView>, ApiError> {
    let Query(query) = query?;
    let report = state.service.overall_report(query.date.as_deref()).await?;
    Ok(Json(report.into()))
}

/// Download one balance sheet as a CSV attachment.
///
/// `sheet` selects `individual` (the default) or `overall`. Each request
/// returns a single sheet, so a client wanting both makes two requests.
pub async fn balance_sheet(
    State(state): State<ServerState>,
    query: Result<Query<SheetQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;

    let kind = match query.sheet.as_deref() {
        None | Some("") => SheetKind::Individual,
        Some(name) => SheetKind::from_str(name).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "Unknown sheet '{}'. Expected 'individual' or 'overall'",
                name
            ))
        })?,
    };

    let sheet = state.service.balance_sheet(query.date.as_deref()).await?;

    let mut body = Vec::new();
    Exporter::new(&sheet)
        .export_csv(kind, &mut body)
        .map_err(AppError::Database)?;

    let disposition = format!("attachment; filename={}", kind.file_name(sheet.date));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
