use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::admission::admit;
use crate::handlers::{delete_handler, health_handler, resolve_handler, shorten_handler};
use crate::state::AppState;

pub struct App;

impl App {
    /// Health checks bypass admission; URL routes are admitted first when
    /// the state carries an [`Admission`](burrow_resolver::Admission).
    pub fn router(state: AppState) -> Router {
        let mut urls = Router::new()
            .route("/", post(shorten_handler))
            .route("/{url_id}", get(resolve_handler).delete(delete_handler));
        if let Some(admission) = state.admission() {
            urls = urls.route_layer(middleware::from_fn_with_state(admission.clone(), admit));
        }

        Router::new()
            .route("/health", get(health_handler))
            .merge(urls)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}
