//! Canned metadata source for local development.
//!
//! Mounted at `GET /info` when `server.mock_info` is on. It answers every
//! well-formed lookup with the same demo payload, so a single process can
//! enrich against itself.

use super::error::{ApiError, Operation};
use super::types::SongKeyQuery;
use crate::Error;
use crate::enrichment::SongInfoPayload;
use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::QueryRejection;
use axum::response::{IntoResponse, Response};

/// Release date in the demo payload.
pub const DEMO_RELEASE_DATE: &str = "01.01.1990";

/// Lyric body in the demo payload (three verses).
pub const DEMO_TEXT: &str = "AAAA\nBBBB\nCCCC\n\nDDDD\nEEEE\nFFFF\n\nGGG\nHHH\nKKK";

/// Link in the demo payload.
pub const DEMO_LINK: &str = "habdulala";

/// `GET /info?group=..&song=..`
pub async fn song_info(params: Result<Query<SongKeyQuery>, QueryRejection>) -> Response {
    let key = params
        .map_err(|e| Error::InvalidInput(e.body_text()))
        .and_then(|Query(params)| params.key());

    match key {
        Ok(key) => {
            tracing::debug!(group = key.group(), song = key.song(), "Serving demo song details");
            Json(SongInfoPayload {
                release_date: Some(DEMO_RELEASE_DATE.to_string()),
                text: Some(DEMO_TEXT.to_string()),
                link: Some(DEMO_LINK.to_string()),
            })
            .into_response()
        },
        Err(e) => ApiError::new(Operation::Info, e).into_response(),
    }
}
