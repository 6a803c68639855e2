//! Feed client and ingestion cycle against a local HTTP server
//!
//! Serves fixture feed documents from an in-process axum server and
//! checks fetch error classification and end-to-end ingestion into the
//! memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use ingestion::{Feed, FeedClient, FeedSource, FetchError, Ingestor};
use persistence::{EarthquakeStore, MemoryStore};

const LATEST: &str = r#"{"Infogempa":{"gempa":{
    "Tanggal":"15 Jan 2024","Jam":"10:21:45 WIB","DateTime":"2024-01-15T03:21:45+00:00",
    "Coordinates":"-3.21,128.45","Magnitude":"5.2","Kedalaman":"10 km",
    "Wilayah":"Pusat gempa berada di laut 20 km Tenggara Ambon",
    "Potensi":"Tidak berpotensi tsunami","Shakemap":"20240115102145.mmi.jpg"
}}}"#;

const STRONG: &str = r#"{"Infogempa":{"gempa":[
    {"Tanggal":"15 Jan 2024","Jam":"10:21:45 WIB","DateTime":"2024-01-15T03:21:45+00:00",
     "Coordinates":"-3.21,128.45","Magnitude":"5.2","Kedalaman":"10 km","Wilayah":"Laut Banda",
     "Potensi":"Tidak berpotensi tsunami"},
    {"Tanggal":"14 Jan 2024","Jam":"08:00:00 WIB","DateTime":"2024-01-14T01:00:00+00:00",
     "Coordinates":"2.10,96.30","Magnitude":"6.1","Kedalaman":"33 km","Wilayah":"Simeulue"},
    {"Tanggal":"13 Jan 2024","Jam":"07:00:00 WIB","DateTime":"2024-01-13T00:00:00+00:00",
     "Coordinates":"somewhere","Magnitude":"5.0","Kedalaman":"12 km","Wilayah":"Broken"}
]}}"#;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> FeedClient {
    FeedClient::new(base, Duration::from_millis(500)).unwrap()
}

#[tokio::test]
async fn test_fetch_single_and_list_documents() {
    let base = serve(
        Router::new()
            .route("/autogempa.json", get(|| async { LATEST }))
            .route("/gempaterkini.json", get(|| async { STRONG })),
    )
    .await;
    let client = client(&base);

    let latest = client.fetch(Feed::Latest).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].magnitude, "5.2");

    let strong = client.fetch(Feed::Strong).await.unwrap();
    assert_eq!(strong.len(), 3);
}

#[tokio::test]
async fn test_fetch_error_status() {
    let base = serve(Router::new().route(
        "/gempadirasakan.json",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "oops") }),
    ))
    .await;

    match client(&base).fetch(Feed::Felt).await {
        Err(FetchError::Status { status, url }) => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/gempadirasakan.json"));
        }
        other => panic!("expected status error, got {other:?}"),
    }

    // Unrouted path
    assert!(matches!(
        client(&base).fetch(Feed::Latest).await,
        Err(FetchError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_fetch_error_malformed_body() {
    let base = serve(Router::new().route("/autogempa.json", get(|| async { "<html>maintenance</html>" }))).await;
    assert!(matches!(
        client(&base).fetch(Feed::Latest).await,
        Err(FetchError::Decode { .. })
    ));
}

#[tokio::test]
async fn test_fetch_error_timeout() {
    let base = serve(Router::new().route(
        "/autogempa.json",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            LATEST
        }),
    ))
    .await;
    let client = FeedClient::new(&base, Duration::from_millis(100)).unwrap();
    assert!(matches!(client.fetch(Feed::Latest).await, Err(FetchError::Timeout { .. })));
}

#[tokio::test]
async fn test_fetch_error_unreachable() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = client(&format!("http://{addr}")).fetch(Feed::Latest).await;
    assert!(matches!(result, Err(FetchError::Request { .. })));
}

#[tokio::test]
async fn test_cycle_end_to_end() {
    let base = serve(
        Router::new()
            .route("/autogempa.json", get(|| async { LATEST }))
            .route("/gempaterkini.json", get(|| async { STRONG }))
            .route(
                "/gempadirasakan.json",
                get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            ),
    )
    .await;
    let store = Arc::new(MemoryStore::new());
    let ingestor = Ingestor::new(Arc::new(client(&base)), store.clone());

    let report = ingestor.run_cycle().await;
    assert_eq!(report.failed_feeds(), 1);
    assert_eq!(report.rejected(), 1);
    assert_eq!(report.feed(Feed::Latest).unwrap().written, 1);
    assert_eq!(report.feed(Feed::Strong).unwrap().written, 2);

    // Ambon event appears in two feeds but is stored once
    assert_eq!(store.len().await, 2);
    let latest = store.latest().await.unwrap().unwrap();
    assert_eq!(latest.id.as_str(), "2024-01-15T03_21_45+00_00_-3.21_128.45");
    assert_eq!(latest.datetime, "15 Jan 2024 10:21:45 WIB");
    assert_eq!(latest.tsunami_potential.as_deref(), Some("Tidak berpotensi tsunami"));

    // Second cycle is idempotent
    let created_at = latest.created_at;
    ingestor.run_cycle().await;
    assert_eq!(store.len().await, 2);
    let again = store.get(latest.id.as_str()).await.unwrap().unwrap();
    assert_eq!(again.created_at, created_at);
}

const FELT_MIXED: &str = r#"{"Infogempa":{"gempa":[
    {"Tanggal":"12 Jan 2024","Jam":"09:00:00 WIB","DateTime":"2024-01-12T02:00:00+00:00",
     "Coordinates":"-7.80,110.36","Magnitude":4.1,"Kedalaman":"8 km","Wilayah":null,
     "Dirasakan":"III Yogyakarta"},
    {"Tanggal":"11 Jan 2024","Jam":"06:00:00 WIB","DateTime":"2024-01-10T23:00:00+00:00",
     "Coordinates":{"lat":-8.1,"lon":115.2},"Magnitude":"3.9","Kedalaman":"10 km","Wilayah":"Bali"},
    {"Tanggal":"10 Jan 2024","Jam":"05:00:00 WIB","DateTime":"2024-01-09T22:00:00+00:00",
     "Coordinates":"-6.90,107.60","Magnitude":"3.5","Kedalaman":"5 km","Wilayah":"Bandung"}
]}}"#;

#[tokio::test]
async fn test_mistyped_entry_does_not_drop_siblings() {
    let base = serve(Router::new().route("/gempadirasakan.json", get(|| async { FELT_MIXED }))).await;

    let felt = client(&base).fetch(Feed::Felt).await.unwrap();
    assert_eq!(felt.len(), 3);
    assert_eq!(felt[0].magnitude, "4.1");
    assert!(felt[1].decode_error.is_some());

    let store = Arc::new(MemoryStore::new());
    let report = Ingestor::new(Arc::new(client(&base)), store.clone()).run_cycle().await;
    let felt = report.feed(Feed::Felt).unwrap();
    assert_eq!((felt.fetched, felt.rejected, felt.written), (3, 1, 2));
    assert_eq!(store.len().await, 2);
}
