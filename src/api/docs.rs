//! OpenAPI document and Swagger UI.
//!
//! The document is served as JSON at [`OPENAPI_PATH`] and browsed at
//! [`SWAGGER_UI_PATH`].

use super::handlers;
use super::types::{
    CreateSongRequest, MessageResponse, SongsResponse, UpdateSongRequest, VersesResponse,
};
use crate::models::Song;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Mount point of the Swagger UI.
pub const SWAGGER_UI_PATH: &str = "/swagger";

/// Location of the OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI description of the `/songs` endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Music library",
        description = "Songs and their lyrics, enriched from an external metadata source."
    ),
    paths(
        handlers::create_song,
        handlers::list_songs,
        handlers::update_song,
        handlers::delete_song,
        handlers::song_text
    ),
    components(schemas(
        Song,
        CreateSongRequest,
        UpdateSongRequest,
        MessageResponse,
        SongsResponse,
        VersesResponse
    )),
    tags((name = "songs", description = "Song library"))
)]
pub struct ApiDoc;

/// Swagger UI serving [`ApiDoc`].
#[must_use]
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new(SWAGGER_UI_PATH).url(OPENAPI_PATH, ApiDoc::openapi())
}
