//! API route handlers

use crate::server::AppState;
use crate::table::QueryError;
use crate::table::RowSum;
use crate::table::TableDetails;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct TableList {
    pub tables: Vec<String>,
}

/// Failures keep the `{"<kind>": "<message>"}` body and carry a matching status code.
impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match self {
            QueryError::InvalidTableName(_) | QueryError::InvalidRowName { .. } => StatusCode::NOT_FOUND,
            QueryError::NonNumericRowData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = serde_json::json!({ self.key(): self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "Name": env!("CARGO_PKG_NAME"),
        "Project Name": "Capital Budgeting Excel Processor",
        "Version": env!("CARGO_PKG_VERSION")
    }))
}

/// Liveness probe
pub async fn liveness(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
        "tables": state.registry.len()
    }))
}

pub async fn list_tables(State(state): State<AppState>) -> Json<TableList> {
    Json(TableList {
        tables: state.registry.list_tables(),
    })
}

pub async fn table_details(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
) -> Result<Json<TableDetails>, QueryError> {
    state
        .registry
        .describe_table(&table_name)
        .map(Json)
        .inspect_err(|error| warn!(%error, "table details rejected"))
}

pub async fn row_sum(
    State(state): State<AppState>,
    Path((table_name, row_name)): Path<(String, String)>,
) -> Result<Json<RowSum>, QueryError> {
    state
        .registry
        .sum_row(&table_name, &row_name)
        .map(Json)
        .inspect_err(|error| warn!(%error, "row sum rejected"))
}
