use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ly_fantasy::config::{FeedConfig, SyncSettings};
use ly_fantasy::database::{MemoryStore, Store};
use ly_fantasy::errors::AppError;
use ly_fantasy::models::feeds::BillRecord;
use ly_fantasy::models::legislator::{Legislator, LegislatorFilter};
use ly_fantasy::models::score::ScoreCategory;
use ly_fantasy::services::http_fetch::HttpFetcher;
use ly_fantasy::services::score_sync::ScoreSyncEngine;
use ly_fantasy::services::sources::{BillSource, LyApi};

type Hits = Arc<AtomicUsize>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::with_client(reqwest::Client::new(), 3, Duration::from_millis(5))
}

async fn flaky(State(hits): State<Hits>) -> (StatusCode, Json<Value>) {
    if hits.fetch_add(1, Ordering::SeqCst) == 0 {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "boom" })))
    } else {
        (StatusCode::OK, Json(json!({ "ok": true })))
    }
}

async fn missing(State(hits): State<Hits>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

async fn down(State(hits): State<Hits>) -> StatusCode {
    hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE
}

async fn throttled(State(hits): State<Hits>) -> (StatusCode, Json<Value>) {
    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
        (StatusCode::TOO_MANY_REQUESTS, Json(json!({})))
    } else {
        (StatusCode::OK, Json(json!({ "ok": true })))
    }
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let hits = Hits::default();
    let base = serve(Router::new().route("/flaky", get(flaky)).with_state(hits.clone())).await;

    let body: Option<Value> = fetcher().get_json(&format!("{}/flaky", base), &[]).await.unwrap();
    assert_eq!(body, Some(json!({ "ok": true })));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn not_found_is_returned_without_retry() {
    let hits = Hits::default();
    let base = serve(Router::new().route("/missing", get(missing)).with_state(hits.clone())).await;

    let body: Option<Value> = fetcher().get_json(&format!("{}/missing", base), &[]).await.unwrap();
    assert!(body.is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn too_many_requests_is_retried() {
    let hits = Hits::default();
    let base = serve(Router::new().route("/throttled", get(throttled)).with_state(hits.clone())).await;

    let body: Option<Value> = fetcher().get_json(&format!("{}/throttled", base), &[]).await.unwrap();
    assert!(body.is_some());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn exhausted_budget_reports_attempts() {
    let hits = Hits::default();
    let base = serve(Router::new().route("/down", get(down)).with_state(hits.clone())).await;

    let err = fetcher()
        .get_with_retry(&format!("{}/down", base), &[])
        .await
        .unwrap_err();
    match err {
        AppError::FetchExhausted { attempts, reason, .. } => {
            assert_eq!(attempts, 3);
            assert_eq!(reason, "HTTP 503");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

// ========== PAGINATED FEED ==========

/// Two pages of bills; page 3 is advertised but broken.
async fn bills(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let page = params.get("page").map(String::as_str).unwrap_or("1");
    match page {
        "1" => (
            StatusCode::OK,
            Json(json!({
                "total": 3, "total_page": 3, "page": 1,
                "bills": [
                    { "議案編號": "202110012340000", "議案名稱": "公平交易法修正草案",
                      "提案日期": "2024-03-11", "議案狀態": "三讀通過" },
                    { "議案編號": "202110012350000", "議案名稱": "所得稅法修正草案",
                      "提案日期": "2024-03-12", "議案狀態": "審查中" }
                ]
            })),
        ),
        "2" => (
            StatusCode::OK,
            Json(json!({
                "total": 3, "total_page": 3, "page": 2,
                "bills": [
                    { "議案編號": "202110012360000", "議案名稱": "沒有日期的草案" }
                ]
            })),
        ),
        _ => (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad page" }))),
    }
}

#[tokio::test]
async fn pages_are_collected_and_a_bad_page_is_skipped() {
    let base = serve(Router::new().route("/bills", get(bills))).await;
    let feeds = FeedConfig {
        ly_api_base: base,
        ..FeedConfig::default()
    };
    let api = LyApi::new(fetcher(), &feeds);

    let items: Vec<BillRecord> = api
        .fetch_all_pages("bills", &[("提案人", "王小明".to_string())])
        .await
        .unwrap();
    assert_eq!(items.len(), 3);
}

#[tokio::test]
async fn proposals_flow_from_feed_to_scores() {
    let base = serve(Router::new().route("/bills", get(bills))).await;
    let feeds = FeedConfig {
        ly_api_base: base,
        ..FeedConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    store.insert_legislator(Legislator::new("王小明", "民進黨")).await;

    let engine = ScoreSyncEngine::new(
        store.clone(),
        SyncSettings {
            batch_size: 5,
            batch_delay: Duration::ZERO,
        },
    );
    let source = BillSource::proposals(LyApi::new(fetcher(), &feeds));

    let summary = engine.sync_source(&source, &LegislatorFilter::all()).await.unwrap();
    assert_eq!(summary.processed_count, 1);
    // The undated bill is skipped.
    assert_eq!(summary.total_scores_created, 2);

    let mut points: Vec<f64> = store.all_scores().await.iter().map(|s| s.points).collect();
    points.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(points, vec![3.0, 9.0]);
    assert_eq!(store.count_scores(Some(ScoreCategory::ProposeBill)).await.unwrap(), 2);

    let again = engine.sync_source(&source, &LegislatorFilter::all()).await.unwrap();
    assert_eq!(again.total_scores_created, 0);
}
