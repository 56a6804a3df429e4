//! HTTP server: static files, GPX track listing, Kartverket point proxy and
//! the cached owner-properties endpoint.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use eiendom_core::models::load_owners;
use eiendom_core::{
    ApiClient, Config, EnrichOptions, Enricher, FeatureCollection, GeometryCache, GeometrySource,
    PipelineError,
};

use crate::tracks::{list_tracks, served_path};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    client: ApiClient,
    source: Arc<dyn GeometrySource>,
    /// Serializes owner-property runs so one process never interleaves
    /// cache reads and writes.
    enrich_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Config, client: ApiClient) -> Self {
        let source: Arc<dyn GeometrySource> = Arc::new(client.clone());
        Self::with_source(config, client, source)
    }

    pub fn with_source(config: Config, client: ApiClient, source: Arc<dyn GeometrySource>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            source,
            enrich_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// JSON error body shared by every API route
fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// List GPX tracks on disk
async fn tracks(State(state): State<AppState>) -> Response {
    match list_tracks(&state.config.static_root, &state.config.tracks_dir) {
        Ok(tracks) => Json(tracks).into_response(),
        Err(e) => {
            error!(dir = %state.config.tracks_dir.display(), error = %e, "Failed to list tracks");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to list tracks: {}", e))
        }
    }
}

#[derive(Debug, Deserialize)]
struct PointParams {
    lat: Option<String>,
    lon: Option<String>,
}

/// Proxy a point lookup to Kartverket, passing status and body through
async fn eiendom(State(state): State<AppState>, Query(params): Query<PointParams>) -> Response {
    let lat = params.lat.filter(|s| !s.is_empty());
    let lon = params.lon.filter(|s| !s.is_empty());
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing lat or lon parameters");
    };

    match state.client.point_areas(&lat, &lon).await {
        Ok(lookup) => {
            let status = StatusCode::from_u16(lookup.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, [(header::CONTENT_TYPE, "application/json")], lookup.body).into_response()
        }
        Err(e) => {
            error!(lat = %lat, lon = %lon, error = %e, "Proxy error");
            error_response(StatusCode::BAD_GATEWAY, format!("Proxy error: {}", e))
        }
    }
}

/// Owners merged with cached or freshly fetched polygons
async fn owner_properties(State(state): State<AppState>) -> Response {
    let _guard = state.enrich_lock.lock().await;

    match enrich_owners(&state).await {
        Ok(collection) => Json(collection).into_response(),
        Err(e) => {
            error!(error = %e, "Error in owner_properties");
            let status = match &e {
                PipelineError::OwnersNotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(status, e.to_string())
        }
    }
}

async fn enrich_owners(state: &AppState) -> Result<FeatureCollection, PipelineError> {
    let owners = load_owners(&state.config.owners_path)?;
    let mut cache = GeometryCache::load(&state.config.cache_path);

    let enricher = Enricher::new(
        state.source.as_ref(),
        EnrichOptions::first_only(state.config.request_delay()),
    );
    let result = enricher.enrich(&owners, Some(&mut cache)).await;

    if result.cache_modified {
        if let Err(e) = cache.persist() {
            warn!(path = %cache.path().display(), error = %e, "Failed to persist geometry cache");
        }
    }

    info!(
        records = result.stats.records,
        features = result.collection.len(),
        cache_hits = result.stats.cache_hits,
        fetched = result.stats.fetched,
        not_found = result.stats.not_found,
        failed = result.stats.failed,
        "Owner properties served"
    );
    Ok(result.collection)
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_root);

    Router::new()
        .route("/api/tracks", get(tracks))
        .route("/api/eiendom", get(eiendom))
        .route("/api/owner_properties", get(owner_properties))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until the process is stopped
pub async fn start_server(config: Config) -> Result<()> {
    if !config.tracks_dir.exists() {
        std::fs::create_dir_all(&config.tracks_dir).with_context(|| {
            format!("Failed to create tracks directory: {}", config.tracks_dir.display())
        })?;
        info!(dir = %config.tracks_dir.display(), "Created tracks directory");
    }

    if let Err(e) = served_path(&config.static_root, &config.tracks_dir) {
        warn!(error = %e, "GPX tracks will not be listed");
    }

    let addr = config.addr();
    let tracks_dir = std::fs::canonicalize(&config.tracks_dir)
        .unwrap_or_else(|_| config.tracks_dir.clone());

    let client = ApiClient::new(&config)?;
    let app = create_router(AppState::new(config, client));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        url = %format!("http://localhost:{}", addr.port()),
        tracks_dir = %tracks_dir.display(),
        "Serving"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use eiendom_core::{ApiError, Feature};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    /// Answers every lookup with one polygon and counts calls.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GeometrySource for CountingSource {
        async fn lookup(&self, matrikkel_id: &str) -> Result<Vec<Feature>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let feature = serde_json::from_value(json!({
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": []},
                "properties": {"id": matrikkel_id}
            }))
            .unwrap();
            Ok(vec![feature])
        }
    }

    fn test_config(root: &Path) -> Config {
        Config {
            static_root: root.to_path_buf(),
            tracks_dir: root.join("tracks"),
            owners_path: root.join("matrikkel_owners.json"),
            cache_path: root.join("matrikkel_cache.json"),
            request_delay_ms: 0,
            ..Config::default()
        }
    }

    fn test_router(config: Config, source: Arc<CountingSource>) -> Router {
        let client = ApiClient::new(&config).unwrap();
        create_router(AppState::with_source(config, client, source))
    }

    async fn send_get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_owner_properties_fetches_then_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(
            &config.owners_path,
            r#"[{"matrikkelnummer": "3236/123/2", "eier": "Ola Nordmann"}, {"matrikkelnummer": "", "eier": "x"}]"#,
        )
        .unwrap();
        let cache_path = config.cache_path.clone();
        let source = Arc::new(CountingSource::default());

        let (status, body) = send_get(test_router(config.clone(), source.clone()), "/api/owner_properties").await;
        assert_eq!(status, StatusCode::OK);
        let collection: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"].as_array().unwrap().len(), 1);
        assert_eq!(collection["features"][0]["properties"]["eier"], "Ola Nordmann");
        assert_eq!(collection["features"][0]["properties"]["matrikkelnummer"], "3236/123/2");
        assert_eq!(collection["features"][0]["properties"]["id"], "3236-123/2");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let cached: Value = serde_json::from_str(&std::fs::read_to_string(&cache_path).unwrap()).unwrap();
        assert!(cached.get("3236-123/2").is_some());

        // Second request is served from the cache file
        let (status, second) = send_get(test_router(config, source.clone()), "/api/owner_properties").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_slice::<Value>(&second).unwrap(), collection);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_owner_properties_missing_owners_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(test_config(dir.path()), Arc::new(CountingSource::default()));

        let (status, body) = send_get(router, "/api/owner_properties").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("matrikkel_owners.json not found"));
    }

    #[tokio::test]
    async fn test_owner_properties_malformed_owners_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.owners_path, "[{").unwrap();
        let router = test_router(config, Arc::new(CountingSource::default()));

        let (status, body) = send_get(router, "/api/owner_properties").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Failed to parse"));
    }

    #[tokio::test]
    async fn test_tracks_lists_fetchable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let web = dir.path().join("web");
        let config = Config {
            static_root: web.clone(),
            tracks_dir: web.join("tracks"),
            ..test_config(dir.path())
        };
        std::fs::create_dir_all(&config.tracks_dir).unwrap();
        std::fs::write(config.tracks_dir.join("tur.gpx"), "<gpx/>").unwrap();
        std::fs::write(config.tracks_dir.join("readme.md"), "").unwrap();
        let router = test_router(config, Arc::new(CountingSource::default()));

        let (status, body) = send_get(router.clone(), "/api/tracks").await;
        assert_eq!(status, StatusCode::OK);
        let tracks: Vec<String> = serde_json::from_slice(&body).unwrap();
        assert_eq!(tracks, vec!["tracks/tur.gpx"]);

        let (status, gpx) = send_get(router, &format!("/{}", tracks[0])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(gpx, b"<gpx/>");
    }

    #[tokio::test]
    async fn test_tracks_outside_static_root_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            static_root: dir.path().join("web"),
            ..test_config(dir.path())
        };
        std::fs::create_dir_all(&config.static_root).unwrap();
        std::fs::create_dir_all(&config.tracks_dir).unwrap();
        let router = test_router(config, Arc::new(CountingSource::default()));

        let (status, body) = send_get(router, "/api/tracks").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("not under static root"));
    }

    #[tokio::test]
    async fn test_eiendom_requires_lat_and_lon() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(test_config(dir.path()), Arc::new(CountingSource::default()));

        let (status, body) = send_get(router.clone(), "/api/eiendom?lat=59.9").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Missing lat or lon parameters");

        let (status, _) = send_get(router, "/api/eiendom?lat=&lon=10.7").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_static_fallback_serves_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('kart');").unwrap();
        let router = test_router(test_config(dir.path()), Arc::new(CountingSource::default()));

        let (status, body) = send_get(router.clone(), "/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"console.log('kart');");

        let (status, _) = send_get(router, "/missing.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
