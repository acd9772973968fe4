//! Serves the mug background with conditional-request support.

use std::io::ErrorKind;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue};
use httpdate::{fmt_http_date, parse_http_date};
use image::ImageFormat;

use super::prelude::*;
use crate::constants::BACKGROUND_CACHE_CONTROL;

/// Validators derived from the background file's metadata.
#[derive(Clone, Debug)]
pub(crate) struct Validators {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl Validators {
    pub(crate) fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let modified_at = metadata.modified().ok();
        let seconds = modified_at
            .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
            .map(|age| age.as_secs())
            .unwrap_or_default();
        Self {
            etag: HeaderValue::from_str(&format!("W/\"{}-{}\"", metadata.len(), seconds)).ok(),
            last_modified: modified_at
                .and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok()),
            modified_at,
        }
    }

    /// Adds Cache-Control plus whichever validators we have.
    pub(crate) fn apply(&self, mut builder: Builder) -> Builder {
        builder = builder.header(CACHE_CONTROL, BACKGROUND_CACHE_CONTROL.as_str());
        if let Some(etag) = &self.etag {
            builder = builder.header(ETAG, etag.clone());
        }
        if let Some(last_modified) = &self.last_modified {
            builder = builder.header(LAST_MODIFIED, last_modified.clone());
        }
        builder
    }

    /// True when the client's copy is still current. `If-None-Match` wins over
    /// `If-Modified-Since` when both are sent, and uses weak comparison.
    pub(crate) fn is_fresh(&self, headers: &HeaderMap) -> bool {
        if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
            let Ok(candidates) = if_none_match.to_str() else {
                return false;
            };
            let candidates = candidates.trim();
            if candidates == "*" {
                return true;
            }
            let Some(etag) = self.etag.as_ref().and_then(|etag| etag.to_str().ok()) else {
                return false;
            };
            let etag = opaque_tag(etag);
            return candidates
                .split(',')
                .any(|candidate| opaque_tag(candidate.trim()) == etag);
        }

        matches!(
            (headers.get(IF_MODIFIED_SINCE), self.modified_at),
            (Some(since), Some(modified_at))
                if since
                    .to_str()
                    .ok()
                    .and_then(|value| parse_http_date(value).ok())
                    .is_some_and(|date| modified_at <= date)
        )
    }
}

fn opaque_tag(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// GET /mug.png
pub(crate) async fn background_handler<M: TextModel + 'static>(
    State(state): State<AppState<M>>,
    headers: HeaderMap,
) -> Result<Response, HaikuError> {
    let path = &state.background_path;
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(HaikuError::NotFound(path.display().to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    let validators = Validators::from_metadata(&metadata);
    if validators.is_fresh(&headers) {
        return validators
            .apply(Response::builder().status(StatusCode::NOT_MODIFIED))
            .body(Body::empty())
            .map_err(HaikuError::from);
    }

    let bytes = tokio::fs::read(path).await?;
    let mime = ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");
    validators
        .apply(Response::builder().header(CONTENT_TYPE, mime))
        .body(Body::from(bytes))
        .map_err(HaikuError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validators() -> Validators {
        let modified_at = UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        Validators {
            etag: HeaderValue::from_str("W/\"42-1700000000\"").ok(),
            last_modified: HeaderValue::from_str(&fmt_http_date(modified_at)).ok(),
            modified_at: Some(modified_at),
        }
    }

    #[test]
    fn etag_lists_are_matched() {
        let mut headers = HeaderMap::new();
        headers.insert(
            IF_NONE_MATCH,
            HeaderValue::from_static("\"other\", W/\"42-1700000000\""),
        );
        assert!(validators().is_fresh(&headers));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"other\""));
        assert!(!validators().is_fresh(&headers));
    }

    #[test]
    fn etags_compare_weakly() {
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"42-1700000000\""));
        assert!(validators().is_fresh(&headers));

        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"42-1700000001\""));
        assert!(!validators().is_fresh(&headers));
    }

    #[test]
    fn modified_since_is_compared() {
        let later = UNIX_EPOCH + std::time::Duration::from_secs(1_800_000_000);
        let earlier = UNIX_EPOCH + std::time::Duration::from_secs(1_600_000_000);

        let mut headers = HeaderMap::new();
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(later)).unwrap(),
        );
        assert!(validators().is_fresh(&headers));

        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(earlier)).unwrap(),
        );
        assert!(!validators().is_fresh(&headers));
        assert!(!validators().is_fresh(&HeaderMap::new()));
    }
}
