//! Handlers for the `/songs` endpoints.
//!
//! Each public handler times itself, runs the operation, and records the
//! outcome in `songs_requests_total` before returning. The `utoipa::path`
//! attributes feed the OpenAPI document in [`super::docs`].

use super::AppState;
use super::error::{ApiError, Operation};
use super::types::{
    CreateSongRequest, ListSongsQuery, MessageResponse, SongKeyQuery, SongTextQuery,
    SongsResponse, UpdateSongRequest, VersesResponse,
};
use crate::Error;
use crate::observability::record_request;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::time::Instant;

type HandlerResult = std::result::Result<Response, ApiError>;

fn finish(operation: Operation, started: Instant, result: HandlerResult) -> Response {
    let response = result.unwrap_or_else(IntoResponse::into_response);
    record_request(operation.as_str(), response.status().as_u16(), started.elapsed());
    response
}

fn query<T>(operation: Operation, query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(inner)| inner)
        .map_err(|e| ApiError::new(operation, Error::InvalidInput(e.body_text())))
}

fn body<T>(operation: Operation, body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(inner)| inner)
        .map_err(|e| ApiError::new(operation, Error::InvalidInput(e.body_text())).in_body())
}

/// Add a song, enriched from the metadata source.
#[utoipa::path(
    post,
    path = "/songs",
    tag = "songs",
    request_body = CreateSongRequest,
    responses(
        (status = 201, description = "Song added", body = MessageResponse),
        (status = 400, description = "Invalid body, duplicate, or song unknown to the metadata source", body = MessageResponse),
        (status = 500, description = "Storage or metadata source failure", body = MessageResponse)
    )
)]
pub async fn create_song(
    State(state): State<AppState>,
    request: Result<Json<CreateSongRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    finish(Operation::Create, started, create(&state, request).await)
}

async fn create(
    state: &AppState,
    request: Result<Json<CreateSongRequest>, JsonRejection>,
) -> HandlerResult {
    let op = Operation::Create;
    let request = body(op, request)?;

    let song = state
        .library
        .create(&request.group, &request.song)
        .await
        .map_err(|e| ApiError::new(op, e).in_body())?;

    let message = format!(
        "Song successfully added. Group: {}, song: {}",
        song.group, song.song
    );
    Ok((StatusCode::CREATED, Json(MessageResponse::new(message))).into_response())
}

/// List songs matching the filters, one page at a time.
#[utoipa::path(
    get,
    path = "/songs",
    tag = "songs",
    params(ListSongsQuery),
    responses(
        (status = 200, description = "Matching songs ordered by group and title", body = SongsResponse),
        (status = 400, description = "Invalid pagination", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    )
)]
pub async fn list_songs(
    State(state): State<AppState>,
    params: Result<Query<ListSongsQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    finish(Operation::List, started, list(&state, params).await)
}

async fn list(
    state: &AppState,
    params: Result<Query<ListSongsQuery>, QueryRejection>,
) -> HandlerResult {
    let op = Operation::List;
    let params = query(op, params)?;
    let page = params.page().map_err(|e| ApiError::new(op, e))?;

    let songs = state
        .library
        .list(&params.filter(), page)
        .await
        .map_err(|e| ApiError::new(op, e))?;

    Ok(Json(SongsResponse { songs }).into_response())
}

/// Delete a song.
#[utoipa::path(
    delete,
    path = "/songs",
    tag = "songs",
    params(SongKeyQuery),
    responses(
        (status = 200, description = "Song deleted", body = MessageResponse),
        (status = 400, description = "Invalid query or song not found", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    )
)]
pub async fn delete_song(
    State(state): State<AppState>,
    params: Result<Query<SongKeyQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    finish(Operation::Delete, started, delete(&state, params).await)
}

async fn delete(
    state: &AppState,
    params: Result<Query<SongKeyQuery>, QueryRejection>,
) -> HandlerResult {
    let op = Operation::Delete;
    let key = query(op, params)?.key().map_err(|e| ApiError::new(op, e))?;

    state
        .library
        .delete(&key)
        .await
        .map_err(|e| ApiError::new(op, e))?;

    let message = format!(
        "Song successfully deleted. Group: {}, song: {}",
        key.group(),
        key.song()
    );
    Ok(Json(MessageResponse::new(message)).into_response())
}

/// Rename a song and optionally replace its lyrics.
#[utoipa::path(
    put,
    path = "/songs",
    tag = "songs",
    params(SongKeyQuery),
    request_body = UpdateSongRequest,
    responses(
        (status = 200, description = "Song updated", body = MessageResponse),
        (status = 400, description = "Invalid input or the new name belongs to another song", body = MessageResponse),
        (status = 404, description = "Song not found", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    )
)]
pub async fn update_song(
    State(state): State<AppState>,
    params: Result<Query<SongKeyQuery>, QueryRejection>,
    request: Result<Json<UpdateSongRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    finish(Operation::Update, started, update(&state, params, request).await)
}

async fn update(
    state: &AppState,
    params: Result<Query<SongKeyQuery>, QueryRejection>,
    request: Result<Json<UpdateSongRequest>, JsonRejection>,
) -> HandlerResult {
    let op = Operation::Update;
    let from = query(op, params)?.key().map_err(|e| ApiError::new(op, e))?;
    let request = body(op, request)?;
    let to = request.key().map_err(|e| ApiError::new(op, e).in_body())?;

    state
        .library
        .update(&from, &to, request.verses())
        .await
        .map_err(|e| ApiError::new(op, e))?;

    let message = format!(
        "Song successfully updated. Group: {}, song: {}",
        to.group(),
        to.song()
    );
    Ok(Json(MessageResponse::new(message)).into_response())
}

/// Fetch a page of a song's verses.
#[utoipa::path(
    get,
    path = "/songs/text",
    tag = "songs",
    params(SongTextQuery),
    responses(
        (status = 200, description = "Requested verses", body = VersesResponse),
        (status = 400, description = "Invalid query or song not found", body = MessageResponse),
        (status = 500, description = "Storage failure", body = MessageResponse)
    )
)]
pub async fn song_text(
    State(state): State<AppState>,
    params: Result<Query<SongTextQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    finish(Operation::Text, started, text(&state, params).await)
}

async fn text(
    state: &AppState,
    params: Result<Query<SongTextQuery>, QueryRejection>,
) -> HandlerResult {
    let op = Operation::Text;
    let (key, page) = query(op, params)?.parts().map_err(|e| ApiError::new(op, e))?;

    let verses = state
        .library
        .verses(&key, page)
        .await
        .map_err(|e| ApiError::new(op, e))?;

    Ok(Json(VersesResponse { verses }).into_response())
}
