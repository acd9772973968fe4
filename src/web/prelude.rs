pub(crate) use super::AppState;
pub(crate) use crate::constants::MAX_INPUT_CHARS;
pub(crate) use crate::error::HaikuError;
pub(crate) use crate::haiku::truncate_chars;
pub(crate) use crate::openai::TextModel;
pub(crate) use axum::extract::State;
pub(crate) use axum::http::{StatusCode, header::CONTENT_TYPE};
pub(crate) use axum::response::{IntoResponse, Response};
pub(crate) use serde::Deserialize;
pub(crate) use tracing::{debug, info};
