//! Dashboard HTTP server
//!
//! Uses tokio directly (no HTTP framework). Every `GET /` is one render
//! cycle; the JSON routes expose the same view models for scripting.

use crate::dashboard::{AppState, Dashboard};
use crate::render::{render_error_page, render_page};
use crate::search::SearchHit;
use crate::selection::Selection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

const READ_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Shared, read-only server state.
pub struct ServerState {
    pub app: AppState,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(app: AppState) -> Self {
        Self {
            app,
            started_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    predictions_loaded: bool,
    drivers_loaded: bool,
    countries: usize,
}

#[derive(Serialize)]
struct CountriesResponse {
    countries: Vec<SearchHit>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                Self {
                    status: 500,
                    content_type: "application/json",
                    body: r#"{"error":"serialization failed"}"#.to_string(),
                }
            }
        }
    }

    pub fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, &ErrorResponse { error: message.into() })
    }

    fn cors_preflight() -> Self {
        Self {
            status: 204,
            content_type: "text/plain",
            body: String::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Access-Control-Allow-Origin: *\r\n\
             Access-Control-Allow-Methods: GET, OPTIONS\r\n\
             Access-Control-Allow-Headers: Content-Type\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\
             \r\n\
             {}",
            self.status,
            status_text(self.status),
            self.content_type,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<ServerState>, bind_addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    run(listener, state).await
}

/// Accept loop over an already-bound listener.
pub async fn run(listener: TcpListener, state: Arc<ServerState>) -> std::io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                error!("Error handling connection from {}: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<ServerState>) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    let read = timeout(READ_TIMEOUT, async {
        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..n]);
            if buffer.windows(4).any(|w| w == b"\r\n\r\n") || buffer.len() > MAX_REQUEST_BYTES {
                break;
            }
        }
        Ok::<_, std::io::Error>(())
    })
    .await;

    let response = match read {
        Err(_) => HttpResponse::error(408, "Request timeout"),
        Ok(Err(e)) => return Err(e),
        Ok(Ok(())) if buffer.len() > MAX_REQUEST_BYTES => HttpResponse::error(413, "Request too large"),
        Ok(Ok(())) => {
            let request = String::from_utf8_lossy(&buffer);
            handle_request(&state, &request)
        }
    };

    stream.write_all(&response.to_bytes()).await?;
    stream.flush().await
}

/// Parse the request line and dispatch.
pub fn handle_request(state: &ServerState, request: &str) -> HttpResponse {
    let Some(request_line) = request.lines().next().filter(|l| !l.trim().is_empty()) else {
        return HttpResponse::error(400, "Empty request");
    };
    let parts: Vec<&str> = request_line.split_whitespace().collect();
    if parts.len() < 2 {
        return HttpResponse::error(400, "Invalid request line");
    }

    let (method, target) = (parts[0], parts[1]);
    let (path, params) = parse_target(target);
    debug!("Request: {} {}", method, path);
    let response = route(state, method, &path, &params);
    if response.status >= 400 {
        warn!("{} {} -> {}", method, path, response.status);
    }
    response
}

pub fn route(
    state: &ServerState,
    method: &str,
    path: &str,
    params: &HashMap<String, String>,
) -> HttpResponse {
    match (method, path) {
        ("OPTIONS", _) => HttpResponse::cors_preflight(),
        ("GET", "/api/health") => health(state),
        ("GET", "/" | "/api/countries" | "/api/detail" | "/api/map") => match &state.app {
            AppState::Unavailable { message } if path == "/" => {
                HttpResponse::html(503, render_error_page(message))
            }
            AppState::Unavailable { message } => HttpResponse::error(503, message.clone()),
            AppState::Ready(dashboard) => route_ready(dashboard, path, params),
        },
        (_, "/" | "/api/health" | "/api/countries" | "/api/detail" | "/api/map") => {
            HttpResponse::error(405, format!("Method not allowed: {}", method))
        }
        _ => HttpResponse::error(404, format!("Not found: {} {}", method, path)),
    }
}

fn route_ready(dashboard: &Dashboard, path: &str, params: &HashMap<String, String>) -> HttpResponse {
    match path {
        "/" => {
            let cycle = dashboard.render_cycle(&selection_from(params));
            HttpResponse::html(200, render_page(dashboard, &cycle))
        }
        "/api/detail" => {
            let cycle = dashboard.render_cycle(&selection_from(params));
            HttpResponse::json(200, &cycle)
        }
        "/api/countries" => {
            let query = params.get("q").map(String::as_str).unwrap_or_default();
            HttpResponse::json(
                200,
                &CountriesResponse {
                    countries: dashboard.search(query),
                },
            )
        }
        "/api/map" => HttpResponse::json(200, &dashboard.map_data()),
        _ => HttpResponse::error(404, format!("Not found: {}", path)),
    }
}

fn health(state: &ServerState) -> HttpResponse {
    let (status, drivers_loaded, countries) = match &state.app {
        AppState::Ready(d) => ("ok", d.drivers().is_some(), d.options().countries().len()),
        AppState::Unavailable { .. } => ("unavailable", false, 0),
    };
    HttpResponse::json(
        200,
        &HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            started_at: state.started_at,
            predictions_loaded: state.app.is_ready(),
            drivers_loaded,
            countries,
        },
    )
}

fn selection_from(params: &HashMap<String, String>) -> Selection {
    Selection::new(params.get("click").cloned(), params.get("country").cloned())
}

/// Split `/path?a=1&b=2` into the path and decoded query parameters.
pub fn parse_target(target: &str) -> (String, HashMap<String, String>) {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let key = url_decode(k);
            (!key.is_empty()).then(|| (key, url_decode(v)))
        })
        .collect();

    let path = match path.trim_end_matches('/') {
        "" => "/".to_string(),
        p => p.to_string(),
    };
    (path, params)
}

/// Percent-decode a query component; `+` is a space.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(b) => {
                        out.push(b);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
