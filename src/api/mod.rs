//! HTTP API over the expense service.

use axum::{
    Json, Router,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::application::{AppError, ExpenseService};

mod expenses;
mod users;

pub use expenses::{ExpenseCreated, ExpenseView, OverallView, UserExpenseView, UserOwedView};
pub use users::{UserCreated, UserView};

#[derive(Clone)]
pub struct ServerState {
    pub service: Arc<ExpenseService>,
}

pub enum ApiError {
    App(AppError),
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for_app_error(err: &AppError) -> StatusCode {
    match err {
        AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
        AppError::UserAlreadyExists(_) => StatusCode::CONFLICT,
        err if err.is_validation() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_app_error(err: AppError) -> String {
    match err {
        AppError::Database(db_err) => {
            tracing::error!("database error: {db_err:#}");
            "Internal Server Error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::App(err) => (status_for_app_error(&err), message_for_app_error(err)),
            ApiError::BadRequest(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self::App(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

async fn health() -> &'static str {
    "OK"
}

pub fn router(service: Arc<ExpenseService>) -> Router {
    let state = ServerState { service };

    Router::new()
        .route("/health", get(health))
        .route("/createUser", post(users::create))
        .route("/user/info", get(users::info))
        .route("/user/{user_id}/expenses", get(expenses::list_for_user))
        .route("/expenses/add", post(expenses::add))
        .route("/expenses/overall", get(expenses::overall))
        .route("/expenses/balance-sheet", get(expenses::balance_sheet))
        .with_state(state)
}

pub async fn run_with_listener(
    service: ExpenseService,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DateError, SplitError};

    #[test]
    fn validation_errors_map_to_400() {
        let res = ApiError::from(AppError::Split(SplitError::AmountTooSmall)).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = ApiError::from(AppError::InvalidDate(DateError::FutureNotAllowed(
            "2999-01-01T00:00:00".into(),
        )))
        .into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let res = ApiError::from(AppError::UserNotFound("7".into())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_maps_to_409() {
        let res = ApiError::from(AppError::UserAlreadyExists("a@b.co".into())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn database_maps_to_500() {
        let res = ApiError::from(AppError::Database(anyhow::anyhow!("disk full"))).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
