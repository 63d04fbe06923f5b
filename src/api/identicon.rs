use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse},
};
use percent_encoding::percent_decode_str;
use shared::AppError;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::api::templates::identicon_page;
use crate::state::AppState;

/// Decoded request path. Paths that do not decode to UTF-8 are used as sent.
pub fn request_key(uri: &Uri) -> Cow<'_, str> {
    let raw = uri.path();
    percent_decode_str(raw)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(raw))
}

/// GET /img/*  -- the full decoded request path is the identicon key.
pub async fn identicon_handler(
    State(state): State<Arc<AppState>>,
    uri: Uri,
) -> Result<Html<String>, AppError> {
    let start = Instant::now();
    let key = request_key(&uri);

    let resolution = state.resolver.resolve(&key).await?;
    let page = identicon_page(&resolution.image);

    info!(
        "{} after {:?} (cache {})",
        key,
        start.elapsed(),
        resolution.outcome.as_str()
    );

    Ok(Html(page))
}

/// GET /img  -- moved permanently to the subtree root.
pub async fn img_root_redirect() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/img/")])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_key_is_percent_decoded() {
        let uri: Uri = "/img/hello%20world".parse().unwrap();
        assert_eq!(request_key(&uri), "/img/hello world");
    }

    #[test]
    fn test_request_key_keeps_raw_path_when_not_utf8() {
        let uri: Uri = "/img/%FF".parse().unwrap();
        assert_eq!(request_key(&uri), "/img/%FF");
    }
}
