//! Mapping of library errors to HTTP responses.

use super::types::MessageResponse;
use crate::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Body of every 500 response. Internal causes stay in the logs.
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Try later";

/// The endpoint an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /songs`
    Create,
    /// `GET /songs`
    List,
    /// `DELETE /songs`
    Delete,
    /// `PUT /songs`
    Update,
    /// `GET /songs/text`
    Text,
    /// `GET /info`
    Info,
}

impl Operation {
    /// Returns the metric and log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::List => "list",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Text => "text",
            Self::Info => "info",
        }
    }

    /// Update reports a missing song as 404; the rest use 400.
    const fn not_found_status(self) -> StatusCode {
        match self {
            Self::Update => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    const fn not_found_message(self) -> &'static str {
        match self {
            Self::Delete => "You are trying to delete a song that does not exist",
            Self::Update => "You are trying to update a song that does not exist",
            Self::Text => "You are trying to get the text of a song that does not exist",
            Self::Create | Self::List | Self::Info => "Song not found",
        }
    }
}

/// Where invalid input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    /// The URL query string.
    Query,
    /// The JSON request body.
    Body,
}

/// A failed request, ready to be turned into a response.
#[derive(Debug)]
pub struct ApiError {
    operation: Operation,
    source: InputSource,
    error: Error,
}

impl ApiError {
    /// Wraps an error raised while handling `operation`.
    ///
    /// Invalid input is attributed to the query string unless
    /// [`Self::in_body`] says otherwise.
    #[must_use]
    pub const fn new(operation: Operation, error: Error) -> Self {
        Self {
            operation,
            source: InputSource::Query,
            error,
        }
    }

    /// Attributes invalid input to the request body.
    #[must_use]
    pub fn in_body(mut self) -> Self {
        self.source = InputSource::Body;
        self
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.error {
            Error::NotFound { .. } => self.operation.not_found_status(),
            Error::InvalidInput(_) | Error::AlreadyExists { .. } | Error::UnknownSong { .. } => {
                StatusCode::BAD_REQUEST
            },
            Error::Upstream { .. } | Error::OperationFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Returns the message sent to the client.
    #[must_use]
    pub fn message(&self) -> String {
        match (&self.error, self.source) {
            (Error::InvalidInput(msg), InputSource::Query) => {
                format!("URL has incorrect parameters in the query string: {msg}")
            },
            (Error::InvalidInput(msg), InputSource::Body) => {
                format!("You provided incorrect JSON: {msg}")
            },
            (Error::NotFound { .. }, _) => self.operation.not_found_message().to_string(),
            (Error::AlreadyExists { group, song }, _) => match self.operation {
                Operation::Update => {
                    format!("Another song already uses this name. Group: {group}, song: {song}")
                },
                _ => format!("You are trying to add an existing song. Group: {group}, song: {song}"),
            },
            (Error::UnknownSong { .. }, _) => {
                "Song does not exist. Check the correctness of the provided data".to_string()
            },
            (Error::Upstream { .. } | Error::OperationFailed { .. }, _) => {
                SERVER_ERROR_MESSAGE.to_string()
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let operation = self.operation.as_str();

        if self.error.is_client_error() {
            tracing::info!(operation, status = status.as_u16(), error = %self.error, "Request rejected");
        } else {
            tracing::error!(operation, status = status.as_u16(), error = %self.error, "Request failed");
        }

        (status, Json(MessageResponse::new(self.message()))).into_response()
    }
}
