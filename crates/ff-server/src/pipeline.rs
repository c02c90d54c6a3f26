//! The dispatch engine.
//!
//! A [`Pipeline`] owns an ordered list of [`Interceptor`]s and one
//! [`Terminal`] handler, fixed at construction. Each request is offered to
//! the interceptors in order; the first to return [`Outcome::Handled`] owns
//! the response. When all pass, the terminal handler serves it.
//!
//! An interceptor that fails returns `Err`; the error becomes the response
//! and later interceptors are not consulted.

use async_trait::async_trait;
use axum::response::{IntoResponse, Response};

use crate::context::RequestContext;
use crate::error::AppError;

/// What an interceptor decided about a request.
pub enum Outcome {
    /// The interceptor produced the response.
    Handled(Response),
    /// Not this interceptor's request.
    Pass,
}

/// A request-handling layer that may own a response or defer.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn try_handle(&self, req: &RequestContext) -> ff_core::Result<Outcome>;
}

/// The innermost handler; always produces a response.
#[async_trait]
pub trait Terminal: Send + Sync {
    async fn serve(&self, req: &RequestContext) -> ff_core::Result<Response>;
}

pub struct Pipeline {
    interceptors: Vec<Box<dyn Interceptor>>,
    terminal: Box<dyn Terminal>,
}

impl Pipeline {
    pub fn new(interceptors: Vec<Box<dyn Interceptor>>, terminal: Box<dyn Terminal>) -> Self {
        Self {
            interceptors,
            terminal,
        }
    }

    /// Interceptor names in registration order.
    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub async fn dispatch(&self, req: &RequestContext) -> Response {
        for interceptor in &self.interceptors {
            match interceptor.try_handle(req).await {
                Ok(Outcome::Handled(response)) => {
                    tracing::debug!(
                        interceptor = interceptor.name(),
                        status = %response.status(),
                        "Request handled"
                    );
                    return response;
                }
                Ok(Outcome::Pass) => {}
                Err(e) => {
                    tracing::debug!(interceptor = interceptor.name(), error = %e, "Interceptor failed");
                    return error_response(req, e);
                }
            }
        }

        match self.terminal.serve(req).await {
            Ok(response) => response,
            Err(e) => error_response(req, e),
        }
    }
}

fn error_response(req: &RequestContext, e: ff_core::Error) -> Response {
    AppError::new(e)
        .with_request_id(req.request_id.clone())
        .with_allow("GET, HEAD")
        .into_response()
}
