pub mod generate;
pub mod proxy;
pub mod responses;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate", post(generate::generate_handler))
        .route("/api/fetch-image", post(proxy::fetch_image_handler))
        .with_state(state)
}
