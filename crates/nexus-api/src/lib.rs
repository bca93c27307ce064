//! JSON API over the contact network: people, their connections, contact
//! creation from free text, and password login.

mod connections;
mod contacts;
pub mod error;
mod login;
mod people;
mod status;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use nexus_core::Settings;
use nexus_db::Store;
use nexus_extract::Extractor;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub extractor: Extractor,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(store: Store, extractor: Extractor, settings: Settings) -> Self {
        Self {
            store,
            extractor,
            settings: Arc::new(settings),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status::root))
        .route("/diagnostic", get(status::diagnostic))
        .route("/people", get(people::list).post(people::create))
        .route("/people/search", get(people::search))
        .route("/people/{id}", get(people::show).put(people::update))
        .route("/people/{id}/recent-tags", get(people::recent_tags))
        .route("/people/{id}/connections", get(connections::list))
        .route("/people/{id}/update-last-login", post(login::update_last_login))
        .route(
            "/connections",
            post(connections::add)
                .put(connections::update)
                .delete(connections::remove),
        )
        .route("/connections/update", put(connections::update))
        .route("/contacts/create", post(contacts::create))
        .route("/login", post(login::login))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
