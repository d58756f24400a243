use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use crate::errors::AppResult;
use crate::models::{RefillRequest, RegisterRequest};
use crate::state::AppState;
use super::extract::AppJson;

pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<Response> {
    tracing::debug!("Registration attempt for user: {}", request.username);

    state.accounts.register(&request.username, &request.password).await?;

    Ok(Json(json!({
        "status": 200,
        "message": "You successfully signed up for the API",
    }))
    .into_response())
}

pub async fn handle_refill(
    State(state): State<AppState>,
    AppJson(request): AppJson<RefillRequest>,
) -> AppResult<Response> {
    tracing::debug!("Refill request for user: {}", request.username);

    let tokens = state
        .meter
        .refill(&request.username, &request.admin_pw, request.amount)
        .await?;

    Ok(Json(json!({
        "status": 200,
        "message": "Tokens refilled successfully",
        "tokens": tokens,
    }))
    .into_response())
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Response> {
    let users = state.accounts.list_users().await?;
    tracing::debug!("Listing {} users", users.len());

    Ok(Json(json!({
        "status": 200,
        "message": "Users retrieved successfully",
        "total_users": users.len(),
        "users": users,
    }))
    .into_response())
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
