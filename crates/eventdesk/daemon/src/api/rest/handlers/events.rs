//! Event record handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::StatusCode,
    Json,
};
use eventdesk_types::{CreateEventInput, Event, EventId, UpdateEventPatch, Validate};
use std::net::SocketAddr;

/// Address the gate resolves: the peer IP as seen by the listener, without port
fn client_address(peer: SocketAddr) -> String {
    peer.ip().to_string()
}

fn parse_id(raw: &str) -> ApiResult<EventId> {
    raw.parse::<EventId>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// List all events
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Json<Vec<Event>>> {
    Ok(Json(state.events.find_all().await?))
}

/// Get a specific event
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Event>> {
    let id = parse_id(&id)?;
    Ok(Json(state.events.find_one(id).await?))
}

/// Create a new event
pub async fn create_event(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    payload: Result<Json<CreateEventInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let input = json_body(payload)?;
    input.validate()?;

    let event = state.events.create(input, &client_address(peer)).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Partially update an event
pub async fn update_event(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateEventPatch>, JsonRejection>,
) -> ApiResult<Json<Event>> {
    let id = parse_id(&id)?;
    let patch = json_body(payload)?;
    patch.validate()?;

    let event = state
        .events
        .update(id, patch, &client_address(peer))
        .await?;
    Ok(Json(event))
}

/// Delete an event
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    state.events.remove(id).await?;
    Ok(StatusCode::OK)
}
