//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One task per
//! connection; requests share nothing but the injected `AppState`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::{authenticate, CredentialVerifier, IdentityClaim, AUTH_HEADER};
use crate::config::Args;
use crate::db::ArticleStore;
use crate::routes::{self, Route};
use crate::types::{ArticlesError, Result};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 100 * 1024;

/// Shared application state
///
/// Built once at startup; the store connection is established before the
/// state exists and closed by `run` on shutdown.
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn ArticleStore>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    pub fn new(
        args: Args,
        store: Arc<dyn ArticleStore>,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            args,
            store,
            verifier,
        }
    }
}

/// Start the HTTP server and serve until SIGINT/SIGTERM
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listen = state.args.listen_addr();
    let listener = TcpListener::bind(listen).await?;

    info!("Server is listening on port {}", listen.port());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { Ok::<_, Infallible>(handle_request(state, addr, req).await) }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => break,
        }
    }

    info!("Server shutting down");
    state.store.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Route an incoming HTTP request
///
/// Never fails: every error is translated into its documented status with a
/// JSON `{"message": ...}` body, and every response carries CORS headers.
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let route = Route::resolve(&method, &path);

    let response = match dispatch(&state, route, &path, req).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                ArticlesError::Unauthenticated => {
                    warn!(path = %path, "Mutating request without auth token")
                }
                // Rejections are logged by the gate
                ArticlesError::Forbidden(_) => {}
                ArticlesError::NotFound(_)
                | ArticlesError::BadRequest(_)
                | ArticlesError::PayloadTooLarge(_) => {}
                _ => error!(path = %path, error = %err, "Request failed"),
            }
            routes::error_response(&err)
        }
    };

    with_cors(response, &state.args.cors_origin)
}

async fn dispatch<B>(
    state: &AppState,
    route: Route,
    path: &str,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let identity = if route.requires_auth() {
        Some(authenticate(req.headers(), state.verifier.as_ref()).await?)
    } else {
        None
    };

    let store = state.store.as_ref();

    match route {
        Route::Preflight => Ok(preflight_response()),
        Route::Hello => Ok(routes::hello()),
        Route::GetArticle(name) => routes::get_article(store, &name).await,
        Route::Upvote(name) => routes::upvote_article(store, &name, gated(&identity)?).await,
        Route::AddComment(name) => {
            let body = read_body(req).await?;
            routes::add_comment(store, &name, &body, gated(&identity)?).await
        }
        Route::Static(p) => routes::serve_static(&state.args.dist_dir, &p).await,
        Route::NotFound => Err(ArticlesError::NotFound(path.to_string())),
    }
}

/// Identity established by the gate for an authenticated route
fn gated(identity: &Option<IdentityClaim>) -> Result<&IdentityClaim> {
    identity
        .as_ref()
        .ok_or_else(|| ArticlesError::Internal("Authenticated route reached without identity".into()))
}

async fn read_body<B>(req: Request<B>) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                ArticlesError::PayloadTooLarge(MAX_BODY_BYTES)
            } else {
                ArticlesError::BadRequest(format!("Failed to read request body: {}", e))
            }
        })
}

/// Attach CORS headers for the single configured origin
fn with_cors(mut response: Response<Full<Bytes>>, origin: &str) -> Response<Full<Bytes>> {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    response
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS")
        .header(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            format!("Content-Type, {}", AUTH_HEADER),
        )
        .header(header::ACCESS_CONTROL_MAX_AGE, "86400")
        .body(Full::new(Bytes::new()))
        .unwrap()
}
