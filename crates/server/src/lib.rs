pub mod error;
pub mod routes;

use axum::Router;
use db::DBService;
use services::services::{claude_api::ClaudeApiClient, storage::FileStorage};
use tower_http::cors::CorsLayer;

/// Shared application state handed to every route.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    storage: FileStorage,
    claude: Option<ClaudeApiClient>,
}

impl AppState {
    pub fn new(db: DBService, storage: FileStorage, claude: Option<ClaudeApiClient>) -> Self {
        Self {
            db,
            storage,
            claude,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn claude(&self) -> Option<ClaudeApiClient> {
        self.claude.clone()
    }
}

/// The full application router: the JSON API under `/api`, stored uploads
/// under `/files`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::projects::router())
        .merge(routes::companies::router())
        .merge(routes::contacts::router())
        .merge(routes::users::router())
        .merge(routes::tasks::router())
        .merge(routes::notes::router())
        .merge(routes::boards::router())
        .merge(routes::invoices::router())
        .merge(routes::workflows::router())
        .merge(routes::files::router())
        .merge(routes::search::router())
        .merge(routes::financials::router())
        .merge(routes::ai::router());

    Router::new()
        .nest("/api", api)
        .merge(routes::files::serve_router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
