//! Route definitions for provider webhooks. No JWT; each handler verifies
//! its provider's signature.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// Routes mounted at `/webhooks`.
///
/// ```text
/// POST   /shopify                   -> shopify
/// POST   /stripe                    -> stripe
/// POST   /easypost                  -> easypost
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shopify", post(webhooks::shopify))
        .route("/stripe", post(webhooks::stripe))
        .route("/easypost", post(webhooks::easypost))
}
