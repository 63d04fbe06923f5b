use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::AppState;

pub mod identicon;
pub mod monitoring;
pub mod templates;

pub use identicon::{identicon_handler, img_root_redirect};
pub use monitoring::monitoring_router;

/// Image routes. `/img/` itself is a valid key, like any path below it.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/img", get(img_root_redirect))
        .route("/img/", get(identicon_handler))
        .route("/img/*key", get(identicon_handler))
}
