//! Listener wiring: the HTTP router with its middleware stack, and the tonic server.

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use core_config::server::ServerConfig;
use database::postgres::{DatabaseConnection, check_health};
use domain_todos::{Envelope, SharedRepository, handlers};
use eyre::WrapErr;
use serde_json::json;
use std::{any::Any, future::Future, time::Duration};
use tokio::net::TcpListener;
use tonic::transport::Server;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info, info_span, warn};

const REQUEST_ID: &str = "x-request-id";

/// REST + GraphQL routes, `/ready`, and the middleware stack.
pub fn http_app(
    repository: SharedRepository,
    db: DatabaseConnection,
    cors_origins: Vec<HeaderValue>,
) -> Router {
    let probes = Router::new().route("/ready", get(ready)).with_state(db);

    handlers::http_router(repository)
        .merge(probes)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "http",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(cors_origins))
}

fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response {
    error!("handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::failure("internal error")),
    )
        .into_response()
}

async fn ready(State(db): State<DatabaseConnection>) -> Response {
    match check_health(&db).await {
        Ok(()) => Json(json!({ "status": "ready" })).into_response(),
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

pub async fn serve_http(
    config: ServerConfig,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> eyre::Result<()> {
    let listener = TcpListener::bind(config.address())
        .await
        .wrap_err_with(|| format!("failed to bind HTTP listener on {}", config.address()))?;
    info!(address = %config.address(), "HTTP listener (REST + GraphQL) started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .wrap_err("HTTP server failed")
}

pub async fn serve_grpc(
    config: ServerConfig,
    repository: SharedRepository,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> eyre::Result<()> {
    let addr = config.socket_addr()?;
    info!(address = %addr, "gRPC listener started");

    Server::builder()
        .trace_fn(|request| info_span!("grpc", path = %request.uri().path()))
        .add_service(handlers::TodoGrpcService::new(repository).into_server())
        .serve_with_shutdown(addr, shutdown)
        .await
        .wrap_err("gRPC server failed")
}
