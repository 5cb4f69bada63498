use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Query};
use crate::models::{AuditLogQuery, AuditLogResponse};
use crate::pagination::Paginated;

/// Query the audit trail, newest entries first.
pub async fn query_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Paginated<AuditLogResponse>>> {
    let conn = state.audit.get()?;
    let (logs, total) = queries::query_audit_logs(&conn, &query)?;
    let items = logs.into_iter().map(AuditLogResponse::from).collect();
    Ok(Json(Paginated::new(items, total, query.limit(), query.offset())))
}

/// Same query, rendered one formatted line per entry for grepping.
pub async fn query_audit_logs_text(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<String> {
    let conn = state.audit.get()?;
    let (logs, _) = queries::query_audit_logs(&conn, &query)?;
    let lines: Vec<String> = logs.iter().map(|log| log.formatted()).collect();
    Ok(lines.join("\n"))
}
