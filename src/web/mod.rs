//! HTTP surface: JSON API, the form page and the background image.

use std::num::NonZeroU16;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::constants::MAX_REQUEST_BYTES;
use crate::error::HaikuError;
use crate::generator::HaikuGenerator;
use crate::haiku::HaikuResult;
use crate::openai::TextModel;
use crate::render::{Background, MugRenderer};

mod api;
mod images;
mod prelude;
mod views;

/// Shared, read-only state behind every handler.
pub struct AppState<M> {
    generator: Arc<HaikuGenerator<M>>,
    renderer: MugRenderer,
    background: Background,
    background_path: PathBuf,
    environment: String,
}

impl<M> Clone for AppState<M> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            renderer: self.renderer.clone(),
            background: self.background.clone(),
            background_path: self.background_path.clone(),
            environment: self.environment.clone(),
        }
    }
}

impl<M: TextModel> AppState<M> {
    /// Bundles the generator, renderer and background for the router.
    pub fn new(
        generator: HaikuGenerator<M>,
        renderer: MugRenderer,
        background: Background,
        background_path: PathBuf,
        environment: &str,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            renderer,
            background,
            background_path,
            environment: environment.to_string(),
        }
    }

    /// Waits for the background, then renders and encodes off the async workers.
    pub(crate) async fn render_png(&self, lines: [String; 3]) -> Result<Vec<u8>, HaikuError> {
        let background = self.background.ready().await?;
        let renderer = self.renderer.clone();
        tokio::task::spawn_blocking(move || renderer.render_png(&lines, &background)).await?
    }

    /// Text to haiku to PNG, for callers that want both.
    pub(crate) async fn haiku_mug(&self, text: &str) -> Result<(HaikuResult, Vec<u8>), HaikuError> {
        let haiku = self.generator.generate(text).await?;
        let png = self.render_png(haiku.ja.clone()).await?;
        Ok((haiku, png))
    }
}

fn create_router<M: TextModel + 'static>() -> Router<AppState<M>> {
    Router::new()
        .route(
            "/",
            get(views::index_handler).post(views::generate_form_handler::<M>),
        )
        .route("/mug.png", get(images::background_handler::<M>))
        .route("/static/styles.css", get(styles_handler))
        .route("/api/haiku", post(api::haiku_handler::<M>))
        .route("/api/mug", post(api::mug_handler::<M>))
        .route("/api/hello-openai", get(api::hello_openai_handler::<M>))
        .route("/api/debug-env", get(api::debug_env_handler::<M>))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(map_response(json_payload_too_large::<Body>))
        .layer(TraceLayer::new_for_http())
}

/// The body limit layer and the form extractor answer 413 in plain text; keep errors JSON.
async fn json_payload_too_large<B>(response: Response<B>) -> Response
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE && !is_json {
        return HaikuError::PayloadTooLarge(format!("limit is {MAX_REQUEST_BYTES} bytes"))
            .into_response();
    }
    response.map(Body::new)
}

async fn styles_handler() -> impl IntoResponse {
    const STYLES: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/static/styles.css"));
    ([(CONTENT_TYPE, "text/css")], STYLES)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    }
    info!("Shutting down");
}

/// Binds the listener and serves until ctrl-c.
pub async fn setup_server<M: TextModel + 'static>(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState<M>,
) -> Result<(), anyhow::Error> {
    let app = create_router::<M>().with_state(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}
