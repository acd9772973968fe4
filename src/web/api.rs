//! JSON endpoints under `/api`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::Serialize;
use serde_json::{Value, json};

use super::prelude::*;
use crate::haiku::HaikuResult;

#[derive(Deserialize)]
pub(crate) struct HaikuRequest {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct HaikuResponse {
    haiku: HaikuResult,
}

#[derive(Deserialize)]
pub(crate) struct MugRequest {
    lines: Vec<String>,
}

fn bad_json(rejection: &JsonRejection) -> HaikuError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        HaikuError::PayloadTooLarge(rejection.body_text())
    } else {
        HaikuError::BadRequest(rejection.body_text())
    }
}

/// POST /api/haiku
pub(crate) async fn haiku_handler<M: TextModel + 'static>(
    State(state): State<AppState<M>>,
    payload: Result<Json<HaikuRequest>, JsonRejection>,
) -> Result<Json<HaikuResponse>, HaikuError> {
    let Json(request) = payload.map_err(|rejection| bad_json(&rejection))?;
    let text = request.text.unwrap_or_default();
    let text = truncate_chars(text.trim(), MAX_INPUT_CHARS);
    if text.is_empty() {
        return Err(HaikuError::BadRequest("Text is required".to_string()));
    }
    let haiku = state.generator.generate(text).await?;
    info!("Haiku generated: {}", haiku.ja.join(" / "));
    Ok(Json(HaikuResponse { haiku }))
}

/// POST /api/mug, renders any three lines without generating.
pub(crate) async fn mug_handler<M: TextModel + 'static>(
    State(state): State<AppState<M>>,
    payload: Result<Json<MugRequest>, JsonRejection>,
) -> Result<Response, HaikuError> {
    let Json(request) = payload.map_err(|rejection| bad_json(&rejection))?;
    let lines: [String; 3] = request.lines.try_into().map_err(|lines: Vec<String>| {
        HaikuError::BadRequest(format!("Expected 3 lines, got {}", lines.len()))
    })?;
    let png = state.render_png(lines).await?;
    debug!("Rendered mug, {} bytes", png.len());
    Ok(([(CONTENT_TYPE, "image/png")], png).into_response())
}

/// GET /api/hello-openai, passes the upstream reply straight through.
pub(crate) async fn hello_openai_handler<M: TextModel + 'static>(
    State(state): State<AppState<M>>,
) -> Result<Response, HaikuError> {
    let reply = state.generator.model().probe().await?;
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, [(CONTENT_TYPE, "application/json")], reply.body).into_response())
}

/// GET /api/debug-env
pub(crate) async fn debug_env_handler<M: TextModel + 'static>(
    State(state): State<AppState<M>>,
) -> Json<Value> {
    Json(json!({
        "hasKey": state.generator.model().has_credential(),
        "env": state.environment,
    }))
}
