use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::web::{AppState, catalog, relay};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/courses", get(catalog::list_courses))
        .route("/courses/:course_id/modules", get(catalog::list_modules))
        .route(
            "/courses/:course_id/modules/:module_id/items",
            get(catalog::list_items),
        )
        .route("/files/:file_id/relay", post(relay::relay_file))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
