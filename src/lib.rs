pub mod config;
pub mod dto;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use handlers::rest;
use service::NoteService;

/// Builds the HTTP router for the notes API.
pub fn router(service: Arc<NoteService>) -> Router {
    Router::new()
        .route("/", get(rest::root))
        .route("/notes", post(rest::create_note).get(rest::list_notes))
        .route(
            "/notes/{id}",
            get(rest::get_note)
                .patch(rest::update_note)
                .delete(rest::delete_note),
        )
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", rest::ApiDoc::openapi()),
        )
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
