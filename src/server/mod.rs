use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::locale::LocaleSettings;
use crate::storage::SqliteStore;

pub mod routes;

/// Admin forms carry attachments inline, so allow bodies well past axum's default
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Server state
pub struct AppState {
    pub store: SqliteStore,
    pub locales: LocaleSettings,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admin/pages", get(routes::list_pages))
        .route(
            "/admin/pages/{page_id}/contents",
            get(routes::list_contents).post(routes::create_content),
        )
        .route(
            "/admin/pages/{page_id}/contents/update_positions",
            post(routes::update_positions),
        )
        .route(
            "/admin/pages/{page_id}/contents/{id}",
            get(routes::edit_content)
                .put(routes::update_content)
                .delete(routes::destroy_content),
        )
        .route(
            "/admin/pages/{page_id}/contents/{id}/attachment",
            get(routes::download_attachment),
        )
        .fallback(routes::show_page)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, store: SqliteStore, locales: LocaleSettings) -> anyhow::Result<()> {
    let state = Arc::new(AppState { store, locales });
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentForm;
    use crate::contents::ContentStore;
    use crate::fixtures;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app_with(store: SqliteStore) -> Router {
        let locales = LocaleSettings::new("en", &["fr".to_string()]).unwrap();
        router(Arc::new(AppState { store, locales }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_get_pages_by_path() {
        let store = fixtures::store();
        let home = fixtures::page(&store, "Home", "/");
        fixtures::page(&store, "Another Home", "/home");
        fixtures::page(&store, "About", "/about-us");
        let nested = fixtures::page(&store, "Our Services", "/about-us/services");
        let app = app_with(store);

        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["id"], json!(home.id));

        let (status, body) = send(&app, "GET", "/home", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["title"], json!("Another Home"));

        let (status, body) = send(&app, "GET", "/about-us", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["title"], json!("About"));

        let (status, body) = send(&app, "GET", "/about-us/services", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["id"], json!(nested.id));
    }

    #[tokio::test]
    async fn test_encoded_paths_reach_pages() {
        let store = fixtures::store();
        let cafe = fixtures::page(&store, "Café", "/café & bar");
        let spaced = fixtures::page(&store, "About", "/about us");
        let app = app_with(store);

        let (status, body) = send(&app, "GET", "/caf%C3%A9%20&%20bar", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["id"], json!(cafe.id));

        let (status, body) = send(&app, "GET", "/fr/about%20us", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"]["id"], json!(spaced.id));
        assert_eq!(body["locale"], json!("fr"));

        let (status, _) = send(&app, "GET", "/about+us", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/%FF%FE", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn test_missing_page_and_unknown_route_share_404() {
        let app = app_with(fixtures::store());

        let (status, missing_page) = send(&app, "GET", "/a/page/that/doesnt/exist", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, no_route) = send(&app, "POST", "/nowhere", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing_page, no_route);
    }

    #[tokio::test]
    async fn test_locale_prefixed_page() {
        let store = fixtures::store();
        let page = fixtures::page(&store, "Just another page", "/just-another-page");
        let form = ContentForm::new("Just some content")
            .body("Just some words in the content...")
            .translation("fr", Some("Juste quelque contenu"), Some("Juste quelques mots dans le contenu..."));
        ContentStore::new(&store).create(page.id, &form).unwrap();
        let app = app_with(store);

        for path in ["/just-another-page", "/en/just-another-page"] {
            let (status, body) = send(&app, "GET", path, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["contents"][0]["body"], json!("Just some words in the content..."));
        }

        let (_, body) = send(&app, "GET", "/fr/just-another-page", None).await;
        assert_eq!(body["locale"], json!("fr"));
        assert_eq!(body["contents"][0]["body"], json!("Juste quelques mots dans le contenu..."));
    }

    #[tokio::test]
    async fn test_create_validation_error_report() {
        let store = fixtures::store();
        let page = fixtures::page(&store, "Home", "/");
        let app = app_with(store);
        let uri = format!("/admin/pages/{}/contents", page.id);

        let (status, body) = send(&app, "POST", &uri, Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["count"], json!(1));
        assert_eq!(body["summary"], json!("1 error prohibited this record from being saved:"));
        assert_eq!(body["messages"], json!(["Title can't be blank"]));
        assert_eq!(body["errors"]["title"], json!(["can't be blank"]));

        let (status, _) = send(&app, "POST", "/admin/pages/999/contents", Some(json!({ "title": "x" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_content_lifecycle() {
        let store = fixtures::store();
        let page = fixtures::page(&store, "Home", "/");
        let app = app_with(store);
        let base = format!("/admin/pages/{}/contents", page.id);

        let form = json!({
            "title": "Just some content",
            "body": "Just some words in the content...",
            "attachment": { "file_name": "sample.txt", "content_type": "text/plain", "data": "aGVsbG8=" }
        });
        let (status, created) = send(&app, "POST", &base, Some(form)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["attachment"]["file_name"], json!("sample.txt"));
        let id = created["id"].as_i64().unwrap();
        let item = format!("{base}/{id}");

        let (status, updated) = send(&app, "PUT", &item, Some(json!({ "title": "Renamed" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], json!("Renamed"));
        assert_eq!(updated["body"], Value::Null);
        assert_eq!(updated["attachment"]["file_name"], json!("sample.txt"));

        let request = Request::builder().uri(format!("{item}/attachment")).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/plain");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");

        let (_, cleared) = send(
            &app,
            "PUT",
            &item,
            Some(json!({ "title": "Renamed", "delete_attachment": true })),
        )
        .await;
        assert_eq!(cleared["attachment"], Value::Null);
        let (status, _) = send(&app, "GET", &format!("{item}/attachment"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", &format!("/admin/pages/{}/contents/{id}", page.id + 1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &item, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &item, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_positions_endpoint() {
        let store = fixtures::store();
        let page = fixtures::page(&store, "Home", "/");
        let c1 = fixtures::content(&store, &page, "Content #1", 0);
        let c2 = fixtures::content(&store, &page, "Content #2", 1);
        let app = app_with(store);
        let base = format!("/admin/pages/{}/contents", page.id);

        let positions = json!({ "positions": { (c1.id.to_string()): 1, (c2.id.to_string()): 0 } });
        let (status, _) = send(&app, "POST", &format!("{base}/update_positions"), Some(positions)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, listed) = send(&app, "GET", &format!("{base}?locale=en"), None).await;
        assert_eq!(listed[0]["title"], json!("Content #2"));
        assert_eq!(listed[1]["title"], json!("Content #1"));

        let (status, _) = send(&app, "GET", &format!("{base}?locale=not%20valid"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
