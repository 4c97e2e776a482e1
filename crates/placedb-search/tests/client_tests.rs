use axum::extract::{Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use placedb_core::config::SearchSettings;
use placedb_core::traits::PlaceSearch;
use placedb_core::{CategoryQuery, Error, PlaceCategory, Region};
use placedb_search::HttpPlaceSearch;

/// In-process stand-in for the count and text-search APIs.
#[derive(Default)]
struct Upstream {
    /// Pages served before the token runs out; `None` keeps handing out tokens.
    pages: Option<usize>,
    fail_with: Option<StatusCode>,
    fetches: AtomicUsize,
    tokens_seen: Mutex<Vec<Option<String>>>,
    counts: Mutex<Vec<(&'static str, HashMap<String, String>, Option<String>)>>,
}

fn record_count(up: &Upstream, endpoint: &'static str, params: HashMap<String, String>, headers: &HeaderMap) {
    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
    up.counts.lock().unwrap().push((endpoint, params, auth));
}

async fn count_category(State(up): State<Arc<Upstream>>, headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    if let Some(status) = up.fail_with {
        return (status, "slow down").into_response();
    }
    record_count(&up, "category", params, &headers);
    Json(json!({ "meta": { "total_count": 42 } })).into_response()
}

async fn count_keyword(State(up): State<Arc<Upstream>>, headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Response {
    record_count(&up, "keyword", params, &headers);
    Json(json!({ "meta": { "total_count": 17 } })).into_response()
}

async fn search_text(State(up): State<Arc<Upstream>>, Json(body): Json<Value>) -> Response {
    up.fetches.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = up.fail_with {
        return (status, "busy").into_response();
    }
    let token = body["pageToken"].as_str().map(str::to_string);
    up.tokens_seen.lock().unwrap().push(token.clone());
    let page: usize = token.as_deref().and_then(|t| t.strip_prefix("page-")).and_then(|n| n.parse().ok()).unwrap_or(0);
    let places: Vec<Value> = (0..2)
        .map(|i| json!({
            "id": format!("p{page}-{i}"),
            "displayName": { "text": format!("Cafe {page}.{i}") },
            "location": { "latitude": 37.56 + page as f64 * 0.001, "longitude": 126.97 + i as f64 * 0.001 },
        }))
        .collect();
    let next = match up.pages {
        Some(total) if page + 1 >= total => String::new(),
        _ => format!("page-{}", page + 1),
    };
    Json(json!({ "places": places, "nextPageToken": next })).into_response()
}

async fn serve(upstream: Arc<Upstream>) -> anyhow::Result<SearchSettings> {
    let app = Router::new()
        .route("/category", get(count_category))
        .route("/keyword", get(count_keyword))
        .route("/search", post(search_text))
        .with_state(upstream);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(SearchSettings {
        count_category_url: format!("http://{addr}/category"),
        count_keyword_url: format!("http://{addr}/keyword"),
        fetch_url: format!("http://{addr}/search"),
        count_api_key: "count-key".into(),
        fetch_api_key: "fetch-key".into(),
        max_pages: 5,
        ..SearchSettings::default()
    })
}

fn region() -> Region {
    Region::new(126.97, 37.56, 126.99, 37.575).unwrap()
}

#[tokio::test]
async fn fetch_follows_page_tokens_until_empty() -> anyhow::Result<()> {
    let upstream = Arc::new(Upstream { pages: Some(3), ..Upstream::default() });
    let client = HttpPlaceSearch::new(serve(upstream.clone()).await?)?;

    let places = client.fetch(&region(), &CategoryQuery::keyword("cafe")).await?;

    let ids: Vec<_> = places.iter().map(|p| p.external_id.as_str()).collect();
    assert_eq!(ids, vec!["p0-0", "p0-1", "p1-0", "p1-1", "p2-0", "p2-1"]);
    assert_eq!(upstream.fetches.load(Ordering::SeqCst), 3);
    assert_eq!(
        *upstream.tokens_seen.lock().unwrap(),
        vec![None, Some("page-1".to_string()), Some("page-2".to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn fetch_stops_at_page_limit() -> anyhow::Result<()> {
    let upstream = Arc::new(Upstream::default());
    let settings = serve(upstream.clone()).await?;
    let max_pages = settings.max_pages as usize;
    let client = HttpPlaceSearch::new(settings)?;

    let places = client.fetch(&region(), &CategoryQuery::keyword("cafe")).await?;

    assert_eq!(upstream.fetches.load(Ordering::SeqCst), max_pages);
    assert_eq!(places.len(), 2 * max_pages);
    Ok(())
}

#[tokio::test]
async fn count_uses_group_code_or_keyword() -> anyhow::Result<()> {
    let upstream = Arc::new(Upstream::default());
    let client = HttpPlaceSearch::new(serve(upstream.clone()).await?)?;

    assert_eq!(client.count(&region(), &PlaceCategory::Cafe.default_query()).await?, 42);
    assert_eq!(client.count(&region(), &PlaceCategory::Activity.default_query()).await?, 17);

    let counts = upstream.counts.lock().unwrap();
    assert_eq!(counts.len(), 2);
    let (endpoint, params, auth) = &counts[0];
    assert_eq!(*endpoint, "category");
    assert_eq!(params.get("category_group_code").map(String::as_str), Some("CE7"));
    assert_eq!(params.get("rect"), Some(&region().to_string()));
    assert_eq!(auth.as_deref(), Some("KakaoAK count-key"));
    let (endpoint, params, _) = &counts[1];
    assert_eq!(*endpoint, "keyword");
    assert_eq!(params.get("query").map(String::as_str), Some("tourist attraction"));
    assert!(!params.contains_key("category_group_code"));
    Ok(())
}

#[tokio::test]
async fn rate_limit_and_conflict_statuses_map_to_errors() -> anyhow::Result<()> {
    let limited = Arc::new(Upstream { fail_with: Some(StatusCode::TOO_MANY_REQUESTS), ..Upstream::default() });
    let client = HttpPlaceSearch::new(serve(limited).await?)?;
    let err = client.count(&region(), &PlaceCategory::Cafe.default_query()).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamRateLimited { .. }), "got {err:?}");
    let err = client.fetch(&region(), &CategoryQuery::keyword("cafe")).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamRateLimited { .. }), "got {err:?}");

    let conflicted = Arc::new(Upstream { fail_with: Some(StatusCode::CONFLICT), ..Upstream::default() });
    let client = HttpPlaceSearch::new(serve(conflicted.clone()).await?)?;
    let err = client.fetch(&region(), &CategoryQuery::keyword("cafe")).await.unwrap_err();
    assert!(matches!(err, Error::UpstreamConflict(ref body) if body == "busy"), "got {err:?}");
    assert_eq!(conflicted.fetches.load(Ordering::SeqCst), 1);
    Ok(())
}
