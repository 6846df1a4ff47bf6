//! HTTP endpoint accepting `{"status": "..."}` pushes
//!
//! Runs on its own thread with a single-threaded tokio runtime. The only
//! state it shares with the main loop is the [`StatusCell`]. Every request
//! that reaches the handler is answered `200 OK`, whatever its body.

use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::IntoResponse;
use axum::Router;
use http::{header, StatusCode};
use inkkeys_device::StatusCell;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::StatusError;

/// Bodies larger than this are rejected
const MAX_BODY: usize = 64 * 1024;

/// How long a client may take to deliver its body
const BODY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: Option<String>,
}

/// Start listening on `0.0.0.0:port` in a background thread
///
/// A bind failure is logged; the rest of the driver keeps running.
pub fn spawn(port: u16, status: StatusCell) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("status-listener".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Cannot start status listener runtime: {e}");
                    return;
                }
            };
            runtime.block_on(async move {
                let addr = SocketAddr::from(([0, 0, 0, 0], port));
                let listener = match TcpListener::bind(addr).await {
                    Ok(listener) => listener,
                    Err(e) => {
                        error!("Cannot bind http server on port {}: {}", port, e);
                        return;
                    }
                };
                info!("Listening for http traffic on port {}", port);
                if let Err(e) = serve(listener, status).await {
                    error!("Status listener stopped: {e}");
                }
            });
        })
}

/// Every path and method ends up in the same handler
pub fn router(status: StatusCell) -> Router {
    Router::new().fallback(receive).with_state(status)
}

/// Serve requests on `listener` until it fails
pub async fn serve(listener: TcpListener, status: StatusCell) -> std::io::Result<()> {
    axum::serve(listener, router(status)).await
}

async fn receive(State(status): State<StatusCell>, request: Request) -> impl IntoResponse {
    debug!("{} {}", request.method(), request.uri());
    if let Err(e) = read_status(request.into_body(), &status).await {
        warn!("Ignoring status request: {e}");
    }
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")])
}

async fn read_status(body: Body, status: &StatusCell) -> Result<(), StatusError> {
    let bytes = tokio::time::timeout(BODY_TIMEOUT, to_bytes(body, MAX_BODY))
        .await
        .map_err(|_| StatusError::Timeout(BODY_TIMEOUT))??;
    apply_body(&bytes, status)
}

/// Store the status carried by a JSON body, if any
pub fn apply_body(body: &[u8], status: &StatusCell) -> Result<(), StatusError> {
    debug!("POST - {} bytes received", body.len());
    let payload: StatusPayload = serde_json::from_slice(body)?;
    if let Some(value) = payload.status {
        debug!("Status set to {:?}", value);
        status.set(value);
    }
    Ok(())
}
