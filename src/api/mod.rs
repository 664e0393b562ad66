//! HTTP API.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/songs` | [`handlers::create_song`] |
//! | `GET` | `/songs` | [`handlers::list_songs`] |
//! | `PUT` | `/songs` | [`handlers::update_song`] |
//! | `DELETE` | `/songs` | [`handlers::delete_song`] |
//! | `GET` | `/songs/text` | [`handlers::song_text`] |
//! | `GET` | `/info` | [`mock_info::song_info`] (only with `server.mock_info`) |
//! | `GET` | `/api-docs/openapi.json` | [`docs::ApiDoc`] |
//! | `GET` | `/swagger/` | Swagger UI |

pub mod docs;
pub mod error;
pub mod handlers;
pub mod mock_info;
pub mod types;

pub use error::{ApiError, Operation, SERVER_ERROR_MESSAGE};

use crate::config::LibraryConfig;
use crate::enrichment::{HttpSongInfoClient, NoopSongInfo, SongInfoProvider};
use crate::observability::{REQUEST_ID_HEADER, RequestContext, scope_request_context};
use crate::services::SongLibrary;
use crate::storage::open_store;
use crate::{Error, Result};
use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderValue, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// Largest accepted request body.
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The library service.
    pub library: Arc<SongLibrary>,
}

impl AppState {
    /// Creates handler state around `library`.
    #[must_use]
    pub fn new(library: SongLibrary) -> Self {
        Self {
            library: Arc::new(library),
        }
    }
}

/// Builds the router with its middleware stack.
pub fn router(state: AppState, mock_info: bool) -> Router {
    let mut routes = Router::new()
        .route(
            "/songs",
            get(handlers::list_songs)
                .post(handlers::create_song)
                .put(handlers::update_song)
                .delete(handlers::delete_song),
        )
        .route("/songs/text", get(handlers::song_text));

    if mock_info {
        routes = routes.route("/info", get(mock_info::song_info));
    }

    routes
        .merge(docs::swagger_ui())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_SIZE))
        .layer(middleware::from_fn(request_context))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Runs each request inside a request context and echoes its ID.
async fn request_context(request: Request, next: Next) -> Response {
    let context = RequestContext::from_header(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    let request_id = context.request_id().to_string();
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id
    );

    let mut response = scope_request_context(context, next.run(request))
        .instrument(span)
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Chooses the metadata provider for `config`.
///
/// An explicit `enrichment.url` wins. Without one, `server.mock_info` points
/// the client at this process's own `/info` route; otherwise enrichment is
/// disabled.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn song_info_provider(config: &LibraryConfig) -> Result<Arc<dyn SongInfoProvider>> {
    if let Some(client) = HttpSongInfoClient::from_config(&config.enrichment)? {
        tracing::info!(endpoint = client.endpoint(), "Song enrichment enabled");
        return Ok(Arc::new(client));
    }

    if config.server.mock_info {
        let endpoint = loopback_info_url(config.server.bind_addr);
        tracing::info!(endpoint = %endpoint, "Song enrichment uses the built-in demo source");
        let client = HttpSongInfoClient::new(endpoint, config.enrichment.retry_policy())?;
        return Ok(Arc::new(client));
    }

    tracing::warn!("No enrichment URL configured; new songs are stored without details");
    Ok(Arc::new(NoopSongInfo))
}

fn loopback_info_url(bind_addr: SocketAddr) -> String {
    let ip = if bind_addr.ip().is_unspecified() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        bind_addr.ip()
    };
    format!("http://{}/info", SocketAddr::new(ip, bind_addr.port()))
}

/// Opens the store, builds the library and serves HTTP until Ctrl-C or
/// SIGTERM.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &LibraryConfig) -> Result<()> {
    let store = open_store(&config.database).await?;
    let provider = song_info_provider(config)?;
    let state = AppState::new(SongLibrary::new(store, provider));
    let app = router(state, config.server.mock_info);

    let addr = config.server.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::operation("bind", format!("{addr}: {e}")))?;
    tracing::info!(%addr, backend = config.database.backend.as_str(), "Music library listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::operation("serve", e))?;

    tracing::info!("Music library stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
