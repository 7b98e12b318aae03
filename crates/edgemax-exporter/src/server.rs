//! HTTP endpoint serving the Prometheus exposition.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::net::TcpListener;

use crate::exporter::Exporter;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Build the router: metrics at `telemetry_path`, `/` redirects there.
pub fn router(exporter: Arc<Exporter>, telemetry_path: &str) -> Router {
    let location = telemetry_path.to_owned();

    Router::new()
        .route(telemetry_path, get(metrics_handler))
        .route(
            "/",
            get(move || {
                let location = location.clone();
                async move { (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]) }
            }),
        )
        .with_state(exporter)
}

/// Serve `app` until the listener fails.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "metrics endpoint listening");
    }
    axum::serve(listener, app).await
}

async fn metrics_handler(State(exporter): State<Arc<Exporter>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        exporter.render(),
    )
}
