//! Axum router construction.
//!
//! There are no per-path routes: every request, whatever its method, goes
//! to the fallback handler, which builds a [`RequestContext`] and hands it
//! to the pipeline.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware;
use axum::response::Response;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::context::{AppContext, RequestContext};
use crate::middleware::request_id::request_id_middleware;

/// Build the application router.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn dispatch(State(ctx): State<AppContext>, request: Request<Body>) -> Response {
    // Request bodies are never read; the server is read-only.
    let (parts, _body) = request.into_parts();
    let req = RequestContext::from_parts(&parts);
    ctx.pipeline.dispatch(&req).await
}
