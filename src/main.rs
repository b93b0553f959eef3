#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
mod config;
mod executor;
mod structures;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CACHE_CONTROL, CONTENT_TYPE,
        },
        HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, MethodRouter},
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::Config,
    structures::{ErrorSerialization, StatusQuery},
};

#[macro_use]
extern crate tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    start_tracing()?;
    let config = Config::from_env()?;
    let socket_address = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        %socket_address,
        default_host = %config.default_host,
        default_port = config.default_port,
        timeout = ?config.timeout,
        "starting status service"
    );
    let app = router(Arc::new(config));
    let tcp = TcpListener::bind(socket_address).await?;
    axum::serve(tcp, app)
        .with_graceful_shutdown(vss::shutdown_signal())
        .await?;
    Ok(())
}

static ROBOTS_NAME: HeaderName = HeaderName::from_static("x-robots-tag");
static ROBOTS_VALUE: HeaderValue = HeaderValue::from_static("noindex");
static ANY_ORIGIN: HeaderValue = HeaderValue::from_static("*");
static NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache, no-store, must-revalidate");
static ALLOWED_METHODS: HeaderValue = HeaderValue::from_static("GET, OPTIONS");
static ALLOWED_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type");
static PREFLIGHT_MAX_AGE: HeaderValue = HeaderValue::from_static("86400");

fn router(config: Arc<Config>) -> Router {
    let status: MethodRouter<Arc<Config>> = get(handle_status)
        .options(handle_preflight)
        .fallback(method_not_allowed);
    Router::new()
        .route("/", status.clone())
        .route("/api/status", status)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    ACCESS_CONTROL_ALLOW_ORIGIN,
                    ANY_ORIGIN.clone(),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    ROBOTS_NAME.clone(),
                    ROBOTS_VALUE.clone(),
                )),
        )
        .with_state(config)
}

async fn handle_status(
    State(config): State<Arc<Config>>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, Failure> {
    let host = query
        .host
        .filter(|host| !host.trim().is_empty())
        .unwrap_or_else(|| config.default_host.clone());
    let port = match query.port {
        Some(port) => port
            .trim()
            .parse::<u16>()
            .map_err(|_| Failure::InvalidPort(port))?,
        None => config.default_port,
    };

    let status = executor::probe(host, port, config.timeout).await;
    if status.online() {
        Ok(([(CACHE_CONTROL, NO_CACHE.clone())], Json(status)).into_response())
    } else {
        Ok(Json(status).into_response())
    }
}

async fn handle_preflight() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS.clone()),
            (ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS.clone()),
            (ACCESS_CONTROL_MAX_AGE, PREFLIGHT_MAX_AGE.clone()),
        ],
    )
}

#[allow(clippy::unused_async)]
async fn method_not_allowed() -> Failure {
    Failure::MethodNotAllowed
}

#[derive(thiserror::Error, Debug)]
pub enum Failure {
    #[error("invalid port `{0}`")]
    InvalidPort(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidPort(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        };
        debug!(error = ?self, "rejecting request");
        let ser = ErrorSerialization {
            error: self.to_string(),
        };
        (status, Json(ser)).into_response()
    }
}

pub struct Json<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        static JSON_CTYPE: HeaderValue = HeaderValue::from_static("application/json;charset=utf-8");

        let body = serde_json::to_vec(&self.0).unwrap_or_else(|_| {
            r#"{"error": "JSON Serialization failed, please make a bug report"}"#
                .as_bytes()
                .to_vec()
        });
        ([(CONTENT_TYPE, JSON_CTYPE.clone())], body).into_response()
    }
}

fn start_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(concat!(env!("CARGO_PKG_NAME"), "=info").parse()?)
        .with_env_var("LOG")
        .from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use serde_json::{json, Value};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };
    use tower::ServiceExt;

    use super::*;

    fn test_config(default_port: u16) -> Arc<Config> {
        Arc::new(Config {
            default_host: "127.0.0.1".to_owned(),
            default_port,
            timeout: Duration::from_secs(1),
            ..Config::default()
        })
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Response<Body>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn preflight() {
        let (status, response) = send(router(test_config(25565)), Method::OPTIONS, "/").await;
        assert_eq!(status, StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn other_methods_are_rejected() {
        let (status, response) =
            send(router(test_config(25565)), Method::POST, "/api/status").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            json_body(response).await,
            json!({"error": "Method not allowed"})
        );
    }

    #[tokio::test]
    async fn invalid_port() {
        let (status, response) =
            send(router(test_config(25565)), Method::GET, "/?port=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({"error": "invalid port `abc`"}));
    }

    #[tokio::test]
    async fn unreachable_server_is_reported_offline() {
        let port = closed_port().await;
        let (status, response) = send(
            router(test_config(25565)),
            Method::GET,
            &format!("/?host=127.0.0.1&port={port}"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[ROBOTS_NAME.clone()], "noindex");
        assert!(response.headers().get(CACHE_CONTROL).is_none());
        assert_eq!(
            json_body(response).await,
            json!({
                "online": false,
                "error": "connection refused",
                "players": {"online": 0, "max": 0},
                "version": "Unknown",
                "motd": "Server offline"
            })
        );
    }

    #[tokio::test]
    async fn online_server_uses_default_host_and_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            // handshake for "127.0.0.1" is 16 bytes, then the status request
            let mut request = [0; 18];
            socket.read_exact(&mut request).await.unwrap();

            let json = r#"{"version":{"name":"1.8.9"},"players":{"online":7,"max":50},"description":"Welcome","favicon":"data:image/png;base64,iVBO"}"#;
            let mut body = vec![0x00];
            slp::varint::write(&mut body, json.len() as u32);
            body.extend_from_slice(json.as_bytes());
            socket.write_all(&slp::frame::frame(&body)).await.unwrap();
        });

        let (status, response) = send(router(test_config(port)), Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "application/json;charset=utf-8"
        );
        assert_eq!(
            json_body(response).await,
            json!({
                "online": true,
                "players": {"online": 7, "max": 50},
                "version": "1.8.9",
                "motd": "Welcome",
                "favicon": "data:image/png;base64,iVBO"
            })
        );
        server.await.unwrap();
    }
}
