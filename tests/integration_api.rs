//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use pv_recommender::api::{AppState, ConfigSource, router};
use pv_recommender::catalog::Catalog;

fn build_api_state(config: ConfigSource) -> Arc<AppState> {
    Arc::new(AppState {
        catalog: Catalog::builtin(),
        config,
    })
}

async fn post_intake(state: Arc<AppState>, body: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn recommend_matches_library_output() {
    let state = build_api_state(ConfigSource::Preset("baseline".to_string()));
    let (status, json) = post_intake(
        state,
        r#"{"bill_amount": 300, "billing_period": "quarterly", "tariff_cents_per_kwh": 30,
            "roof_type": "tile", "storeys": 1, "phase": "single", "postcode": "2000",
            "usage_level": "moderate"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let annual = json["sizing"]["annual_usage_kwh"].as_f64().unwrap();
    assert!((annual - 4000.0).abs() < 1e-6);

    let shortlist = json["shortlist"].as_array().unwrap();
    assert!(!shortlist.is_empty() && shortlist.len() <= 3);
    assert_eq!(shortlist[0]["rank"], 1);
    assert!(shortlist[0]["candidate"]["total_score"].is_number());
}

#[tokio::test]
async fn config_file_is_read_per_request() {
    let dir = std::env::temp_dir().join("pv_recommender_api_config");
    std::fs::create_dir_all(&dir).unwrap();
    let path: PathBuf = dir.join("engine.toml");
    std::fs::write(&path, "[region]\nprofile = \"qld\"\n").unwrap();

    let state = build_api_state(ConfigSource::File(path.clone()));
    let body = r#"{"bill_amount": 400, "billing_period": "quarterly", "roof_type": "metal", "storeys": 1}"#;

    let (status, json) = post_intake(state.clone(), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["region"], "qld");

    std::fs::write(&path, "[region]\nprofile = \"vic\"\n").unwrap();
    let (status, json) = post_intake(state, body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["region"], "vic");

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn unknown_intake_field_returns_400() {
    let state = build_api_state(ConfigSource::Preset("baseline".to_string()));
    let (status, json) = post_intake(
        state,
        r#"{"bill_amount": 300, "billing_period": "quarterly", "roof_type": "tile", "storeys": 1, "pool": true}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "intake");
}

#[tokio::test]
async fn bad_postcode_returns_400() {
    let state = build_api_state(ConfigSource::Preset("baseline".to_string()));
    let (status, json) = post_intake(
        state,
        r#"{"bill_amount": 300, "billing_period": "quarterly", "roof_type": "tile", "storeys": 1, "postcode": "20x0"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "postcode");
}

#[tokio::test]
async fn nan_override_returns_500() {
    let dir = std::env::temp_dir().join("pv_recommender_api_nan");
    std::fs::create_dir_all(&dir).unwrap();
    let path: PathBuf = dir.join("engine.toml");
    std::fs::write(&path, "[roi]\nconfidence_min = nan\n").unwrap();

    let state = build_api_state(ConfigSource::File(path.clone()));
    let (status, json) = post_intake(
        state,
        r#"{"bill_amount": 300, "billing_period": "quarterly", "roof_type": "tile", "storeys": 1}"#,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["field"], "roi.confidence_min");

    std::fs::remove_file(&path).ok();
}
