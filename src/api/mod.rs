//! HTTP server for the dashboard: HTML views, JSON endpoints and probes

pub mod conversations;
pub mod health;
pub mod pages;
pub mod search;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::format::TimeFormatter;
use crate::gateway::QueryGateway;
use crate::summary::Summarizer;
use crate::{Error, Result};

/// Shared state for handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub gateway: QueryGateway,
    /// Present when a summary API key is configured
    pub summarizer: Option<Summarizer>,
}

impl ApiState {
    #[must_use]
    pub const fn formatter(&self) -> &TimeFormatter {
        self.gateway.formatter()
    }
}

/// Error returned by JSON endpoints
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    /// The document store or summary service could not be reached; retrying may help
    Unavailable(String),
    NotConfigured(&'static str),
    /// An upstream service answered with an error
    Upstream(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(what) => Self::NotFound(what),
            Error::Summary(msg) => Self::Upstream(msg),
            e if e.is_retryable() => Self::Unavailable(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let retryable = matches!(self, Self::Unavailable(_));
        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg),
            Self::NotConfigured(msg) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured", msg.to_string()),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody {
                    code,
                    message,
                    retryable,
                },
            }),
        )
            .into_response()
    }
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    gateway: QueryGateway,
    port: u16,
    summarizer: Option<Summarizer>,
}

impl ApiServerBuilder {
    #[must_use]
    pub const fn new(gateway: QueryGateway, port: u16) -> Self {
        Self {
            gateway,
            port,
            summarizer: None,
        }
    }

    /// Enable the conversation summary endpoint
    #[must_use]
    pub fn summarizer(mut self, summarizer: Option<Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                gateway: self.gateway,
                summarizer: self.summarizer,
            }),
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Router with every route and layer
    #[must_use]
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(pages::router(self.state.clone()))
            .nest("/api/conversations", conversations::router(self.state.clone()))
            .merge(search::router(self.state.clone()))
            .merge(health::router())
            .merge(health::ready_router(self.state.clone()))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind dashboard server: {e}")))?;

        tracing::info!(
            port = self.port,
            store = self.state.gateway.store_name(),
            summaries = self.state.summarizer.is_some(),
            "dashboard listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(|e| Error::Config(format!("dashboard server error: {e}")))?;

        Ok(())
    }
}
