use axum::Router;

use crate::AppState;

pub mod health;
pub mod records;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(records::router())
}
