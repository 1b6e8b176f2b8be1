use axum::routing::post;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST   /intents                   -> create_intent
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/intents", post(payments::create_intent))
}
