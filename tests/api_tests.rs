//! HTTP boundary tests: in-process through `oneshot`, and over a real socket
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use price_scout::api::{build_router, AppState};
use price_scout::crawling::{OrchestratorConfig, SearchOrchestrator};
use price_scout::test_utils::{fixture_registry, listing_html, ScriptedLauncher, SessionScript};

fn app() -> axum::Router {
    let launcher = ScriptedLauncher::new(SessionScript::failing_navigation("offline"))
        .route(
            "north.test",
            SessionScript::rendering(listing_html(&[("Blender", 49.0), ("Mixer", 15.0)])),
        )
        .route(
            "south.test",
            SessionScript::rendering(listing_html(&[("Juicer", 22.5)])),
        );
    let orchestrator = SearchOrchestrator::new(
        Arc::new(fixture_registry(&["north", "south", "west"])),
        Arc::new(launcher),
        OrchestratorConfig::default(),
    );
    build_router(Arc::new(AppState::new(orchestrator)))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn search_returns_price_sorted_products() {
    let (status, body) = get("/search?product_name=kitchen%20blender&location=india").await;

    assert_eq!(status, StatusCode::OK);
    let products = body.as_array().unwrap();
    let prices: Vec<f64> = products.iter().map(|p| p["priceWhole"].as_f64().unwrap()).collect();
    assert_eq!(prices, vec![15.0, 22.5, 49.0]);
    assert_eq!(products[0]["title"], "Mixer");
    assert_eq!(products[0]["priceCurrency"], "$");
    assert_eq!(products[0]["link"], "https://north.test/p/1");
}

#[tokio::test]
async fn search_without_product_name_is_rejected() {
    for uri in ["/search", "/search?location=us", "/search?product_name=%20%20"] {
        let (status, body) = get(uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "missing_parameter");
        assert!(body["message"].as_str().unwrap().contains("product_name"));
    }
}

#[tokio::test]
async fn health_lists_registered_sites() {
    let (status, body) = get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sites"], serde_json::json!(["north", "south", "west"]));
}

#[tokio::test]
async fn serves_search_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base_url}/search"))
        .query(&[("product_name", "juicer")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let products: Vec<Value> = response.json().await.unwrap();
    assert_eq!(products.len(), 3);

    let missing = client.get(format!("{base_url}/search")).send().await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::BAD_REQUEST);

    server.abort();
}
