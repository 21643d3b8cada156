//! Admin HTTP endpoints: health, metrics, announcements and runtime catalog registration

use anyhow::Result;
use discovery_core::{AnnouncementMetrics, Announcer, CatalogStore, CoreError};
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{body::Bytes, server::conn::http1, service::service_fn, Method, Request, Response, StatusCode};
use hyper_util::rt::tokio::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

const CATALOG_PATH_PREFIX: &str = "/v1/catalog/";

/// Shared state of the admin endpoints
pub struct AdminState {
    pub announcer: Arc<Announcer>,
    pub catalogs: Arc<CatalogStore>,
    pub metrics: AnnouncementMetrics,
}

/// Accept admin connections until the announcer shuts down
pub async fn serve(listener: TcpListener, state: Arc<AdminState>) -> Result<()> {
    let mut shutdown = state.announcer.subscribe_shutdown();
    info!("Admin server listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = shutdown.changed() => break,
        };
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Error serving admin connection from {}: {}", peer_addr, e);
            }
        });
    }

    info!("Admin server stopped");
    Ok(())
}

pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AdminState>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    drop(req);
    debug!("{} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/healthz") => text(StatusCode::OK, "OK\n"),
        (&Method::GET, "/metrics") => match state.metrics.gather() {
            Ok(metrics) => with_content_type(
                text(StatusCode::OK, &metrics),
                "text/plain; version=0.0.4",
            ),
            Err(e) => {
                warn!("Failed to gather metrics: {}", e);
                text(StatusCode::INTERNAL_SERVER_ERROR, "Failed to gather metrics\n")
            }
        },
        (&Method::GET, "/v1/announcement") => {
            let announcements = state.announcer.service_announcements().await;
            match serde_json::to_string(&announcements) {
                Ok(body) => with_content_type(text(StatusCode::OK, &body), "application/json"),
                Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, &format!("{}\n", e)),
            }
        }
        (&Method::PUT, catalog_path) if catalog_path.starts_with(CATALOG_PATH_PREFIX) => {
            let catalog_name = &catalog_path[CATALOG_PATH_PREFIX.len()..];
            let connector_id = query_param(query.as_deref(), "connector").unwrap_or(catalog_name);
            match (urlencoding::decode(catalog_name), urlencoding::decode(connector_id)) {
                (Ok(catalog_name), Ok(connector_id)) => {
                    register_catalog(&state, &catalog_name, &connector_id).await
                }
                _ => text(StatusCode::BAD_REQUEST, "Invalid percent-encoding\n"),
            }
        }
        _ => text(StatusCode::NOT_FOUND, "Not Found\n"),
    };

    Ok(response)
}

async fn register_catalog(
    state: &AdminState,
    catalog_name: &str,
    connector_id: &str,
) -> Response<Full<Bytes>> {
    if catalog_name.is_empty() || catalog_name.contains('/') {
        return text(StatusCode::BAD_REQUEST, "Invalid catalog name\n");
    }

    match state.catalogs.register_catalog(catalog_name, connector_id).await {
        Ok(()) => text(StatusCode::CREATED, &format!("Registered catalog {}\n", catalog_name)),
        Err(e @ CoreError::InvalidDatasource(_)) => text(StatusCode::BAD_REQUEST, &format!("{}\n", e)),
        Err(e @ CoreError::CatalogAlreadyExists(_)) => text(StatusCode::CONFLICT, &format!("{}\n", e)),
        Err(e) if e.is_not_found() => {
            warn!("Cannot announce catalog {}: {}", catalog_name, e);
            text(StatusCode::NOT_FOUND, "Announcement not found\n")
        }
        Err(e) => text(StatusCode::INTERNAL_SERVER_ERROR, &format!("{}\n", e)),
    }
}

fn query_param<'a>(query: Option<&'a str>, name: &str) -> Option<&'a str> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn text(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
}

fn with_content_type(mut response: Response<Full<Bytes>>, content_type: &'static str) -> Response<Full<Bytes>> {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
