use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::user_resolver::{DbUserResolver, UserResolver};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub user_resolver: Arc<dyn UserResolver>,
}

/// Build the application router with the default database-backed resolver.
pub fn app(db: DBService) -> Router {
    let resolver = Arc::new(DbUserResolver::new(db.pool.clone()));
    app_with_resolver(db, resolver)
}

pub fn app_with_resolver(db: DBService, user_resolver: Arc<dyn UserResolver>) -> Router {
    Router::new()
        .nest("/api", routes::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { db, user_resolver })
}
