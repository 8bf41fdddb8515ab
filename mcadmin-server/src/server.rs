//! HTTP Server implementation

use crate::AppState;
use anyhow::Result;
use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use mcadmin_common::{AdminAction, AdminError, CacheAdmin, Envelope, Outcome};
use serde::Serialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Run the HTTP server
pub async fn run_server(state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.server.bind_address, state.config.server.port
    )
    .parse()?;

    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on http://{}", addr);

    loop {
        let (stream, remote_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = state.clone();
                async move { handle_request(state, req, remote_addr).await }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection error: {:?}", err);
            }
        });
    }
}

/// Handle incoming HTTP request
async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<Response<BoxBody<Bytes, Infallible>>, Infallible> {
    let method = req.method().clone();
    let uri = req.uri().clone();

    if state.config.server.access_log {
        info!(
            "{} {} {} - {}",
            remote_addr.ip(),
            method,
            uri.path(),
            uri.query().unwrap_or("")
        );
    }

    let reply = dispatch(state.admin.clone(), &method, uri.path(), uri.query()).await;
    Ok(reply.into_response())
}

/// Status and JSON body of a response
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    fn json<T: Serialize>(status: StatusCode, payload: &T) -> Self {
        match serde_json::to_string(payload) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to serialize response")
            }
        }
    }

    fn success<T: Serialize>(path: &str, result: T) -> Self {
        Self::json(StatusCode::OK, &Envelope::success(path, result))
    }

    fn error(status: StatusCode, message: &str) -> Self {
        let envelope = Envelope::<()>::error(status.as_u16(), message);
        match serde_json::to_string(&envelope) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("Failed to serialize error response: {}", e);
                Self {
                    status,
                    body: String::new(),
                }
            }
        }
    }

    fn failure(err: AdminError) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
    }

    fn into_response(self) -> Response<BoxBody<Bytes, Infallible>> {
        let mut response = Response::new(full_body(self.body.into_bytes()));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// Route a request to the matching admin action
pub async fn dispatch(
    admin: Arc<CacheAdmin>,
    method: &Method,
    path: &str,
    query: Option<&str>,
) -> Reply {
    let Some(action) = AdminAction::from_path(path) else {
        return Reply::error(StatusCode::NOT_FOUND, "Not Found");
    };

    if *method != Method::GET {
        return Reply::error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    debug!("Dispatching memcached {} action", action.as_str());

    match action {
        AdminAction::Flush => {
            match blocking(admin, |admin| admin.flush().and_then(Outcome::into_result)).await {
                Ok(()) => Reply::success(path, true),
                Err(e) => Reply::failure(e),
            }
        }
        AdminAction::Stats => {
            let verbose = is_full_skin(query);
            match blocking(admin, move |admin| admin.stats(verbose)).await {
                Ok(report) => Reply::success(path, report),
                Err(e) => Reply::failure(e),
            }
        }
        AdminAction::Info => {
            match blocking(admin, CacheAdmin::info).await {
                Ok(info) => Reply::success(path, info),
                Err(e) => Reply::failure(e),
            }
        }
    }
}

/// Run a cache round-trip off the async workers
async fn blocking<T, F>(admin: Arc<CacheAdmin>, f: F) -> Result<T, AdminError>
where
    T: Send + 'static,
    F: FnOnce(&CacheAdmin) -> Result<T, AdminError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&admin))
        .await
        .unwrap_or_else(|e| Err(AdminError::ClientFault(format!("Admin task failed: {}", e))))
}

/// `?skin=full` selects the verbose metric set
fn is_full_skin(query: Option<&str>) -> bool {
    query.is_some_and(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .any(|(key, value)| key == "skin" && value == "full")
    })
}

/// Create a full body response
fn full_body(data: Vec<u8>) -> BoxBody<Bytes, Infallible> {
    Full::new(Bytes::from(data))
        .map_err(|_| unreachable!())
        .boxed()
}
