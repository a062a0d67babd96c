//! End-to-end tests against an in-process fake of the storage server

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::Mutex;
use reduct_rs::{ClientError, QuotaType, ReductClient, Settings};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_MAX_BLOCK_SIZE: u64 = 64 * 1024 * 1024;

#[derive(Default)]
struct FakeStorage {
    buckets: Mutex<HashMap<String, FakeBucket>>,
}

struct FakeBucket {
    settings: Settings,
    entries: HashMap<String, BTreeMap<i64, Bytes>>,
}

type Shared = Arc<FakeStorage>;

#[derive(Deserialize)]
struct TsQuery {
    ts: i64,
}

#[derive(Deserialize)]
struct RangeQuery {
    start: i64,
    stop: i64,
}

fn with_defaults(settings: Settings) -> Settings {
    Settings::new()
        .with_max_block_size(DEFAULT_MAX_BLOCK_SIZE)
        .with_quota_type(QuotaType::None)
        .with_quota_size(0)
        .merge(&settings)
}

fn error(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn no_bucket(name: &str) -> Response {
    error(StatusCode::NOT_FOUND, format!("Bucket '{}' is not found", name))
}

async fn info(State(state): State<Shared>) -> Response {
    let count = state.buckets.lock().len();
    Json(json!({
        "version": "0.1.0",
        "bucket_count": count.to_string(),
        "usage": "0",
        "uptime": "1",
        "oldest_record": "0",
        "latest_record": "0"
    }))
    .into_response()
}

async fn get_bucket(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    match state.buckets.lock().get(&name) {
        Some(bucket) => (
            [("content-type", "application/json")],
            bucket.settings.to_json_string(),
        )
            .into_response(),
        None => no_bucket(&name),
    }
}

async fn create_bucket(State(state): State<Shared>, Path(name): Path<String>, body: Bytes) -> Response {
    let settings = match Settings::parse(&String::from_utf8_lossy(&body)) {
        Ok(settings) => settings,
        Err(e) => return error(StatusCode::UNPROCESSABLE_ENTITY, e.message),
    };

    let mut buckets = state.buckets.lock();
    if buckets.contains_key(&name) {
        return error(StatusCode::CONFLICT, format!("Bucket '{}' already exists", name));
    }
    buckets.insert(
        name,
        FakeBucket {
            settings: with_defaults(settings),
            entries: HashMap::new(),
        },
    );
    StatusCode::OK.into_response()
}

// PUT replaces the whole settings object; absent fields fall back to defaults.
async fn update_bucket(State(state): State<Shared>, Path(name): Path<String>, body: Bytes) -> Response {
    let settings = match Settings::parse(&String::from_utf8_lossy(&body)) {
        Ok(settings) => settings,
        Err(e) => return error(StatusCode::UNPROCESSABLE_ENTITY, e.message),
    };

    match state.buckets.lock().get_mut(&name) {
        Some(bucket) => {
            bucket.settings = with_defaults(settings);
            StatusCode::OK.into_response()
        }
        None => no_bucket(&name),
    }
}

async fn remove_bucket(State(state): State<Shared>, Path(name): Path<String>) -> Response {
    match state.buckets.lock().remove(&name) {
        Some(_) => StatusCode::OK.into_response(),
        None => no_bucket(&name),
    }
}

async fn write_record(
    State(state): State<Shared>,
    Path((bucket, entry)): Path<(String, String)>,
    Query(query): Query<TsQuery>,
    body: Bytes,
) -> Response {
    match state.buckets.lock().get_mut(&bucket) {
        Some(b) => {
            b.entries.entry(entry).or_default().insert(query.ts, body);
            StatusCode::OK.into_response()
        }
        None => no_bucket(&bucket),
    }
}

async fn read_record(
    State(state): State<Shared>,
    Path((bucket, entry)): Path<(String, String)>,
    Query(query): Query<TsQuery>,
) -> Response {
    let buckets = state.buckets.lock();
    let Some(b) = buckets.get(&bucket) else {
        return no_bucket(&bucket);
    };
    match b.entries.get(&entry).and_then(|records| records.get(&query.ts)) {
        Some(blob) => blob.clone().into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            format!("No record with timestamp {}", query.ts),
        ),
    }
}

async fn list_records(
    State(state): State<Shared>,
    Path((bucket, entry)): Path<(String, String)>,
    Query(query): Query<RangeQuery>,
) -> Response {
    let buckets = state.buckets.lock();
    let Some(b) = buckets.get(&bucket) else {
        return no_bucket(&bucket);
    };
    if query.start >= query.stop {
        return Json(json!({ "records": [] })).into_response();
    }
    let records: Vec<_> = b
        .entries
        .get(&entry)
        .map(|records| {
            records
                .range(query.start..query.stop)
                .map(|(ts, blob)| json!({ "ts": ts.to_string(), "size": blob.len().to_string() }))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "records": records })).into_response()
}

// Helper to spawn a server on a random port
async fn spawn_server() -> String {
    let state: Shared = Arc::new(FakeStorage::default());
    let app = Router::new()
        .route("/info", get(info))
        .route(
            "/b/{name}",
            get(get_bucket)
                .post(create_bucket)
                .put(update_bucket)
                .delete(remove_bucket),
        )
        .route("/b/{bucket}/{entry}", get(read_record).post(write_record))
        .route("/b/{bucket}/{entry}/list", get(list_records))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_write_list_read_walk() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();
    let settings = Settings::new()
        .with_quota_type(QuotaType::Fifo)
        .with_quota_size(1_000_000);
    let bucket = client.create_bucket("b", settings).await.unwrap();

    let payloads = ["some_data1", "some_data2", "some_data3"];
    // records are stamped at microsecond precision
    let start = Utc::now().trunc_subsecs(6);
    for data in payloads {
        bucket.write("e1", data, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    let stop = Utc::now() + Duration::seconds(1);

    let records = bucket.list("e1", start, stop).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(records.iter().all(|r| r.timestamp >= start && r.timestamp < stop));

    for (record, expected) in records.iter().zip(payloads) {
        let blob = bucket.read("e1", record.timestamp).await.unwrap();
        assert_eq!(blob, expected);
        assert_eq!(record.size, expected.len() as u64);
    }

    let stored = bucket.get_settings().await.unwrap();
    assert_eq!(stored.quota_type, Some(QuotaType::Fifo));
    assert_eq!(stored.quota_size, Some(1_000_000));
}

#[tokio::test]
async fn test_list_is_half_open() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();
    let bucket = client.create_bucket("b", Settings::new()).await.unwrap();

    let t1 = DateTime::from_timestamp(1_650_000_000, 0).unwrap();
    let t2 = t1 + Duration::seconds(1);
    let t3 = t1 + Duration::seconds(2);
    // written out of order on purpose
    for ts in [t3, t1, t2] {
        bucket.write("e", "x", Some(ts)).await.unwrap();
    }

    let records = bucket.list("e", t1, t3).await.unwrap();
    let timestamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![t1, t2]);

    let after = bucket
        .list("e", t3 + Duration::microseconds(1), t3 + Duration::microseconds(2))
        .await
        .unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn test_write_same_timestamp_overwrites() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();
    let bucket = client.create_bucket("b", Settings::new()).await.unwrap();
    let ts = DateTime::from_timestamp(1_650_000_000, 42_000).unwrap();

    bucket.write("e", "first", Some(ts)).await.unwrap();
    bucket.write("e", "second", Some(ts)).await.unwrap();

    assert_eq!(bucket.read("e", ts).await.unwrap(), "second");
    let records = bucket.list("e", ts, ts + Duration::seconds(1)).await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_update_settings_keeps_absent_fields() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();
    let initial = Settings::new()
        .with_max_block_size(10)
        .with_quota_type(QuotaType::Fifo)
        .with_quota_size(100);
    client.create_bucket("b", initial).await.unwrap();

    let bucket = client.get_bucket("b").await.unwrap();
    bucket
        .update_settings(&Settings::new().with_quota_size(200))
        .await
        .unwrap();

    assert_eq!(
        bucket.get_settings().await.unwrap(),
        Settings::new()
            .with_max_block_size(10)
            .with_quota_type(QuotaType::Fifo)
            .with_quota_size(200)
    );
}

#[tokio::test]
async fn test_missing_bucket_and_removal() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();

    let err = client.get_bucket("missing").await.unwrap_err();
    assert_eq!(err, ClientError::new(404, "Bucket 'missing' is not found"));

    let bucket = client.create_bucket("tmp", Settings::new()).await.unwrap();
    assert_eq!(client.get_info().await.unwrap().bucket_count, 1);

    let err = client.create_bucket("tmp", Settings::new()).await.unwrap_err();
    assert_eq!(err.code, 409);

    bucket.remove().await.unwrap();
    assert!(client.get_bucket("tmp").await.unwrap_err().is_not_found());
    assert_eq!(bucket.get_settings().await.unwrap_err().code, 404);
    assert_eq!(client.get_info().await.unwrap().bucket_count, 0);
}

#[tokio::test]
async fn test_read_missing_record() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();
    let bucket = client.create_bucket("b", Settings::new()).await.unwrap();

    let err = bucket.read("e", Utc::now()).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(err.message.starts_with("No record with timestamp"));
}

#[tokio::test]
async fn test_records_before_epoch() {
    let client = ReductClient::with_url(&spawn_server().await).unwrap();
    let bucket = client.create_bucket("b", Settings::new()).await.unwrap();

    let before = DateTime::from_timestamp(-10, 0).unwrap();
    let after = DateTime::from_timestamp(10, 0).unwrap();
    bucket.write("e", "old", Some(before)).await.unwrap();
    bucket.write("e", "new", Some(after)).await.unwrap();

    assert_eq!(bucket.read("e", before).await.unwrap(), "old");

    let records = bucket
        .list("e", before, before + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, before);

    let records = bucket
        .list("e", before - Duration::seconds(1), after + Duration::seconds(1))
        .await
        .unwrap();
    let timestamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![before, after]);
}
