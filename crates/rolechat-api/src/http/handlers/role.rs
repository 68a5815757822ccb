//! Role handlers for the REST API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use rolechat_types::message::Message;
use rolechat_types::role::{CreateRoleRequest, Role, SyncReport};

use super::parse_role_id;
use crate::http::error::AppError;
use crate::state::AppState;

/// Query parameters for `POST /api/roles/sync`.
#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
    /// Overrides `sync.prune` from the configuration.
    pub prune: Option<bool>,
}

/// GET /api/roles - All roles, newest first.
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    let roles = state.role_service.list_roles().await?;
    Ok(Json(roles))
}

/// POST /api/roles - Create a role and its upstream agent.
pub async fn create_role(
    State(state): State<AppState>,
    body: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let Json(body) = body?;
    let role = state.role_service.create_role(body).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// POST /api/roles/sync - Reconcile local roles with the upstream agents.
pub async fn sync_roles(
    State(state): State<AppState>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncReport>, AppError> {
    let prune = query.prune.unwrap_or(state.config.sync.prune);
    let report = state.role_service.sync_from_upstream(prune).await?;
    Ok(Json(report))
}

/// GET /api/roles/{role_id}/history - Stored messages, oldest first.
pub async fn role_history(
    State(state): State<AppState>,
    Path(role_id): Path<String>,
) -> Result<Json<Vec<Message>>, AppError> {
    let role_id = parse_role_id(&role_id)?;
    let messages = state.chat_service.history(&role_id).await?;
    Ok(Json(messages))
}
