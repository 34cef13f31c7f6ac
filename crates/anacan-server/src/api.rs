use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use anacan_provision::DocumentService;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::sitemap;

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentService>,
    pub database_id: String,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/sitemap.xml", get(sitemap_all))
        .route("/sitemap-az.xml", get(sitemap_az))
        .route("/sitemap-ru.xml", get(sitemap_ru))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found(uri: Uri) -> ServerError {
    ServerError::NotFound(uri.path().to_string())
}

async fn sitemap_all(State(state): State<AppState>) -> Response {
    sitemap_response(&state, None).await
}

async fn sitemap_az(State(state): State<AppState>) -> Response {
    sitemap_response(&state, Some("az")).await
}

async fn sitemap_ru(State(state): State<AppState>) -> Response {
    sitemap_response(&state, Some("ru")).await
}

/// Render the sitemap, or the fallback document if the content could not be
/// fetched. Always answers 200 so crawlers keep the site root.
async fn sitemap_response(state: &AppState, locale: Option<&str>) -> Response {
    let site_url = state.config.site_url.as_str();
    let xml = match sitemap::collect_entries(state.documents.as_ref(), &state.database_id).await {
        Ok(entries) => {
            info!(entries = entries.len(), locale = locale.unwrap_or("all"), "Sitemap generated");
            match locale {
                Some(locale) => sitemap::render_locale(site_url, &entries, locale),
                None => sitemap::render_all(site_url, &entries),
            }
        }
        Err(e) => {
            warn!(error = %e, "Sitemap generation failed, serving fallback");
            sitemap::fallback(site_url)
        }
    };

    (
        [
            (header::CONTENT_TYPE, "application/xml"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        xml,
    )
        .into_response()
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Map, Value};
    use tower::ServiceExt;

    use anacan_provision::{InMemoryBackend, SchemaService};
    use anacan_shared::constants::UNIQUE_ID;
    use anacan_shared::SchemaDefinition;

    use super::*;

    const DB: &str = "anacan";

    async fn backend() -> Arc<InMemoryBackend> {
        let backend = Arc::new(InMemoryBackend::new());
        backend.create_database(DB, "Anacan").await.unwrap();
        for collection in ["categories", "posts", "pages", "forums"] {
            backend
                .create_collection(DB, &SchemaDefinition::new(collection, collection))
                .await
                .unwrap();
        }

        let docs: [(&str, Value); 6] = [
            ("categories", json!({ "slug": "qidalanma", "is_active": true, "sort_order": 1 })),
            ("categories", json!({ "slug": "arxiv", "is_active": false, "sort_order": 2 })),
            ("posts", json!({ "slug": "ilk-elave-qida", "status": "published", "published_at": "2024-02-20T09:00:00.000+00:00" })),
            ("posts", json!({ "slug": "qaralama", "status": "draft" })),
            ("pages", json!({ "slug": "haqqimizda", "status": "published" })),
            ("forums", json!({ "slug": "yuxu-rejimi", "is_active": true, "sort_order": 1 })),
        ];
        for (collection, data) in docs {
            let data: Map<String, Value> = data.as_object().cloned().unwrap();
            backend
                .create_document(DB, collection, UNIQUE_ID, &data)
                .await
                .unwrap();
        }
        backend
    }

    fn app(backend: Arc<InMemoryBackend>) -> Router {
        build_router(AppState {
            documents: backend,
            database_id: DB.to_string(),
            config: Arc::new(ServerConfig::default()),
        })
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let (status, _, body) = fetch(app(backend().await), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_combined_sitemap_lists_published_content() {
        let (status, content_type, xml) = fetch(app(backend().await), "/sitemap.xml").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/xml"));
        assert!(xml.contains("<loc>https://anacan.az/</loc>"));
        assert!(xml.contains("<loc>https://anacan.az/blog/ilk-elave-qida</loc>"));
        assert!(xml.contains("<loc>https://anacan.az/category/qidalanma</loc>"));
        assert!(xml.contains("<loc>https://anacan.az/haqqimizda</loc>"));
        assert!(xml.contains("<loc>https://anacan.az/forum/yuxu-rejimi</loc>"));
        assert!(xml.contains(r#"hreflang="ru" href="https://anacan.az/ru/blog/ilk-elave-qida""#));

        assert!(!xml.contains("qaralama"));
        assert!(!xml.contains("arxiv"));
    }

    #[tokio::test]
    async fn test_locale_sitemaps() {
        let backend = backend().await;

        let (_, _, ru) = fetch(app(backend.clone()), "/sitemap-ru.xml").await;
        assert!(ru.contains("<loc>https://anacan.az/ru/blog/ilk-elave-qida</loc>"));
        assert!(ru.contains("<loc>https://anacan.az/ru</loc>"));
        assert!(!ru.contains("xhtml:link"));

        let (_, _, az) = fetch(app(backend), "/sitemap-az.xml").await;
        assert!(az.contains("<loc>https://anacan.az/blog/ilk-elave-qida</loc>"));
        assert!(!az.contains("/ru/"));
    }

    #[tokio::test]
    async fn test_remote_failure_serves_fallback() {
        let backend = backend().await;
        backend.fail_fatal("list:posts", "service unavailable").await;

        let (status, content_type, xml) = fetch(app(backend), "/sitemap.xml").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/xml"));
        assert_eq!(xml.matches("<url>").count(), 1);
        assert!(xml.contains("<loc>https://anacan.az/</loc>"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, _, body) = fetch(app(backend().await), "/sitemap-de.xml").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"], "Not found: /sitemap-de.xml");
    }
}
