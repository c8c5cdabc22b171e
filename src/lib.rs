//! User management service of the bank application.
//!
//! HTTP routes build commands, endpoints hand them to the [`Mediator`],
//! which routes each one to its handler.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
pub mod cancellation;
pub mod config;
mod database;
pub mod endpoints;
pub mod error;
pub mod mediator;
mod router;
pub mod telemetry;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer,
};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::endpoints::users;
use crate::mediator::{Mediator, Sender};
use crate::user::{
    CreateUserCommand, CreateUserHandler, GetUserHandler, GetUserQuery,
    MemoryUserRepository, PostgresUserRepository, UserRepository,
};

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State backed by an in-memory repository.
#[cfg(test)]
pub fn memory_state() -> AppState {
    state_with_repository(
        Arc::new(config::Configuration::default()),
        Arc::new(MemoryUserRepository::new()),
    )
    .expect("every handler is registered")
}

/// Create-user endpoint as stored in [`AppState`].
pub type CreateEndpoint = users::Create<Arc<dyn Sender<CreateUserCommand>>>;
/// Get-user endpoint as stored in [`AppState`].
pub type GetEndpoint = users::Get<Arc<dyn Sender<GetUserQuery>>>;

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub create_user: Arc<CreateEndpoint>,
    pub get_user: Arc<GetEndpoint>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new [`AppState`] whose endpoints send to the given senders.
    pub fn new(
        config: Arc<config::Configuration>,
        create_user: Arc<dyn Sender<CreateUserCommand>>,
        get_user: Arc<dyn Sender<GetUserQuery>>,
    ) -> Self {
        Self {
            config,
            create_user: Arc::new(users::Create::new(create_user)),
            get_user: Arc::new(users::Get::new(get_user)),
            metrics: None,
        }
    }

    /// Expose metrics on `GET /metrics`.
    pub fn metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout);

    let middleware = ServiceBuilder::new()
        // Tag every request with a `x-request-id`.
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(
                    |chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                        tracing::trace!(
                            size_bytes = chunk.len(),
                            latency = ?latency,
                            "sending body chunk"
                        )
                    },
                )
                .make_span_with(
                    DefaultMakeSpan::new()
                        .include_headers(true)
                        .level(tracing::Level::INFO),
                )
                .on_request(DefaultOnRequest::new())
                .on_response(
                    DefaultOnResponse::new()
                        .include_headers(true)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([
            header::AUTHORIZATION,
            header::COOKIE,
        ]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        );

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .route("/metrics", get(telemetry::metrics))
        // `POST /users` goes to `create`.
        .route("/users", post(router::create::handler))
        .route("/users/{id}", get(router::users::get))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

fn state_with_repository(
    config: Arc<config::Configuration>,
    repo: Arc<dyn UserRepository>,
) -> error::Result<AppState> {
    let mediator = Arc::new(
        Mediator::builder()
            .create_user(CreateUserHandler::new(Arc::clone(&repo)))
            .get_user(GetUserHandler::new(repo))
            .build()?,
    );

    Ok(AppState::new(config, mediator.clone(), mediator))
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default()
        .path(std::env::var("CONFIG_PATH").unwrap_or_default().into())
        .read()?;

    let repo: Arc<dyn UserRepository> = match config.postgres {
        Some(ref postgres) => {
            let db = database::Database::from_config(postgres).await?;

            // execute migrations scripts on start.
            sqlx::migrate!().run(&db.postgres).await?;

            Arc::new(PostgresUserRepository::new(db.postgres))
        },
        None => {
            tracing::warn!(
                "missing `postgres` entry on `config.yaml` file, \
                 users are kept in memory"
            );
            Arc::new(MemoryUserRepository::new())
        },
    };

    let state = state_with_repository(Arc::clone(&config), repo)?;

    match telemetry::setup_metrics_recorder() {
        Ok(handle) => Ok(state.metrics(handle)),
        Err(err) => {
            tracing::warn!(error = %err, "prometheus recorder not installed");
            Ok(state)
        },
    }
}
