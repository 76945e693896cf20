//! Byte-range streaming integration tests.
//!
//! Run with: `cargo test -p reelay-api --test streaming_test`

mod helpers;

use helpers::{api_path, setup_test_app, setup_test_app_with, TestApp};
use serde_json::Value;

/// Seed a raw video file directly into durable storage.
async fn seed_video(app: &TestApp, filename: &str, data: &[u8]) {
    app.state
        .media
        .storage
        .upload(&format!("videos/{}", filename), "video/mp4", data.to_vec())
        .await
        .expect("seed video");
}

fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn range_request_round_trip() {
    let app = setup_test_app().await;
    let data = sample_bytes(1000);
    seed_video(&app, "sample.mp4", &data).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .add_header("Range", "bytes=0-99")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(
        response.header("content-range"),
        "bytes 0-99/1000"
    );
    assert_eq!(response.header("accept-ranges"), "bytes");
    assert_eq!(response.header("content-length"), "100");
    assert_eq!(response.header("content-type"), "video/mp4");
    assert_eq!(response.as_bytes().as_ref(), &data[..100]);
}

#[tokio::test]
async fn missing_range_header_is_rejected_with_no_video_bytes() {
    let app = setup_test_app().await;
    let data = sample_bytes(1000);
    seed_video(&app, "sample.mp4", &data).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Range header required"));
}

#[tokio::test]
async fn open_ended_range_is_bounded_by_chunk_size() {
    let app = setup_test_app_with(|config| config.stream_chunk_size = 100, None).await;
    let data = sample_bytes(1000);
    seed_video(&app, "sample.mp4", &data).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .add_header("Range", "bytes=100-")
        .await;

    assert_eq!(response.status_code(), 206);
    // end = min(start + chunk, size - 1) = min(200, 999) = 200
    assert_eq!(
        response.header("content-range"),
        "bytes 100-200/1000"
    );
    assert_eq!(response.header("content-length"), "101");
    assert_eq!(response.as_bytes().as_ref(), &data[100..=200]);
}

#[tokio::test]
async fn open_ended_range_near_eof_is_clamped() {
    let app = setup_test_app_with(|config| config.stream_chunk_size = 100, None).await;
    let data = sample_bytes(1000);
    seed_video(&app, "sample.mp4", &data).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .add_header("Range", "bytes=950-")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(
        response.header("content-range"),
        "bytes 950-999/1000"
    );
    assert_eq!(response.as_bytes().as_ref(), &data[950..]);
}

#[tokio::test]
async fn explicit_end_past_eof_is_clamped() {
    let app = setup_test_app().await;
    let data = sample_bytes(1000);
    seed_video(&app, "sample.mp4", &data).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .add_header("Range", "bytes=900-5000")
        .await;

    assert_eq!(response.status_code(), 206);
    assert_eq!(
        response.header("content-range"),
        "bytes 900-999/1000"
    );
}

#[tokio::test]
async fn start_past_eof_is_range_not_satisfiable() {
    let app = setup_test_app().await;
    seed_video(&app, "sample.mp4", &sample_bytes(1000)).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .add_header("Range", "bytes=1000-")
        .await;

    assert_eq!(response.status_code(), 416);
    assert_eq!(
        response.header("content-range"),
        "bytes */1000"
    );
    let body: Value = response.json();
    assert_eq!(body["code"], "RANGE_NOT_SATISFIABLE");
}

#[tokio::test]
async fn inverted_range_is_range_not_satisfiable() {
    let app = setup_test_app().await;
    seed_video(&app, "sample.mp4", &sample_bytes(1000)).await;

    let response = app
        .client()
        .get(&api_path("/videos/sample.mp4/stream"))
        .add_header("Range", "bytes=200-100")
        .await;

    assert_eq!(response.status_code(), 416);
}

#[tokio::test]
async fn malformed_range_is_bad_request() {
    let app = setup_test_app().await;
    seed_video(&app, "sample.mp4", &sample_bytes(1000)).await;

    for header in ["bytes=abc-def", "bytes=-", "0-99", "bytes=-500"] {
        let response = app
            .client()
            .get(&api_path("/videos/sample.mp4/stream"))
            .add_header("Range", header)
            .await;
        assert_eq!(response.status_code(), 400, "header {:?}", header);
    }
}

#[tokio::test]
async fn missing_video_is_not_found_before_any_read() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/videos/ghost.mp4/stream"))
        .add_header("Range", "bytes=0-99")
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn missing_image_is_not_found() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/images/ghost.jpg")).await;
    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");
}
