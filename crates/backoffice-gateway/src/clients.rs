use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use backoffice_core::{
    Client, ClientFilter, ClientInput, ClientStatus, ValidationErrors, looks_like_email,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiResult, invalid_request},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListClientsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListClientsResponse {
    pub items: Vec<Client>,
}

fn validate_client(input: &ClientInput) -> Result<(), ValidationErrors> {
    if input.name.trim().is_empty() {
        return Err(ValidationErrors::single("name", "name is required"));
    }

    let email = input.email.trim();
    if !email.is_empty() && !looks_like_email(email) {
        return Err(ValidationErrors::single("email", "not a valid email address"));
    }

    Ok(())
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListClientsQuery>,
) -> ApiResult<Json<ListClientsResponse>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            ClientStatus::parse(raw)
                .ok_or_else(|| invalid_request(format!("unknown client status {raw:?}")))?,
        ),
    };

    let items = state
        .clients
        .list(&ClientFilter {
            status,
            limit: Some(query.limit.unwrap_or(100).clamp(1, 500)),
        })
        .await?;
    Ok(Json(ListClientsResponse { items }))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> ApiResult<(StatusCode, Json<Client>)> {
    validate_client(&input)?;
    let client = state.clients.create(&input).await?;
    info!(client_id = %client.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> ApiResult<Json<Client>> {
    Ok(Json(state.clients.get(client_id).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(input): Json<ClientInput>,
) -> ApiResult<Json<Client>> {
    validate_client(&input)?;
    Ok(Json(state.clients.update(client_id, &input).await?))
}

/// Documents drafted for the client keep their copied counterparty fields.
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.clients.delete(client_id).await?;
    info!(%client_id, "client deleted");
    Ok(StatusCode::NO_CONTENT)
}
