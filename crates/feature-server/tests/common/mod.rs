//! Shared fixtures for feature-server integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
};
use candle_core::{Device, Tensor};
use feature_data::{FeatureData, FeatureRow, RowTable};
use feature_server::{AppState, LocalBackend, router};
use serde_json::{Value, json};
use tower::ServiceExt;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const DESCRIPTIONS: &str = r#"{"3": "cat feature", "7": "dog feature"}"#;
pub const RECORDS: &str = r#"[["Cat Detector", 3, 0.91], ["Dog Detector", 7, 0.88], ["Catalog entries", 12, 0.4]]"#;

pub fn similarity_row(i: i64) -> FeatureRow {
    FeatureRow {
        indices: vec![i + 1, i + 2, i + 3],
        values: vec![0.75, 0.5, 0.25],
    }
}

pub fn effects_row(i: i64) -> FeatureRow {
    FeatureRow {
        indices: vec![100 + i, 200 + i],
        values: vec![2.5, -1.0],
    }
}

/// 4 similarity rows, 2 effects rows, the cat/dog descriptions and records.
pub fn sample_data() -> FeatureData {
    let similarity: RowTable = (0..4).map(similarity_row).collect();
    let effects: RowTable = (0..2).map(effects_row).collect();
    let descriptions = serde_json::from_str(DESCRIPTIONS).unwrap();
    let records = serde_json::from_str(RECORDS).unwrap();
    FeatureData::new(similarity, effects, descriptions, records)
}

pub fn local_app(data: FeatureData) -> Router {
    router(AppState::new(Arc::new(LocalBackend::new(Arc::new(data)))))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn options(uri: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri(uri)
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Run one request through the router. An empty body comes back as `Value::Null`.
pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn assert_cors(headers: &HeaderMap) {
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type,Authorization"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET,PUT,POST,DELETE,OPTIONS"
    );
}

pub fn error_body(message: &str) -> Value {
    json!({ "error": message })
}

/// Serve `app` on an ephemeral localhost port.
pub async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Write a single-tensor safetensors file.
pub fn write_tensor(path: &Path, tensor: Tensor) {
    candle_core::safetensors::save(&HashMap::from([("data", tensor)]), path).unwrap();
}

fn pickle_str(out: &mut Vec<u8>, s: &str) {
    out.push(b'X');
    out.extend((s.len() as u32).to_le_bytes());
    out.extend(s.as_bytes());
}

fn pickle_ints(out: &mut Vec<u8>, values: &[usize]) {
    out.push(b'(');
    for v in values {
        out.push(b'J');
        out.extend((*v as i32).to_le_bytes());
    }
    out.push(b't');
}

/// Bytes of `torch.save(t)` for a row-major 2-d tensor `t`. `storage` is the
/// torch storage class and `data` the little-endian element bytes.
pub fn torch_archive(storage: &str, rows: usize, cols: usize, data: &[u8]) -> Vec<u8> {
    let mut pickle = b"\x80\x02ctorch._utils\n_rebuild_tensor_v2\n((".to_vec();
    pickle_str(&mut pickle, "storage");
    pickle.extend(format!("ctorch\n{}\n", storage).into_bytes());
    pickle_str(&mut pickle, "0");
    pickle_str(&mut pickle, "cpu");
    pickle.push(b'J');
    pickle.extend(((rows * cols) as i32).to_le_bytes());
    pickle.extend(b"tQJ\x00\x00\x00\x00");
    pickle_ints(&mut pickle, &[rows, cols]);
    pickle_ints(&mut pickle, &[cols, 1]);
    pickle.extend(b"\x89ccollections\nOrderedDict\n)RtR.");

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file("archive/data.pkl", options).unwrap();
    writer.write_all(&pickle).unwrap();
    writer.start_file("archive/data/0", options).unwrap();
    writer.write_all(data).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn write_torch_indices(path: &Path, rows: &[[i64; 2]]) {
    let data: Vec<u8> = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, torch_archive("LongStorage", rows.len(), 2, &data)).unwrap();
}

pub fn write_torch_values(path: &Path, rows: &[[f32; 2]]) {
    let data: Vec<u8> = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, torch_archive("FloatStorage", rows.len(), 2, &data)).unwrap();
}

pub const SIM_INDICES: [[i64; 2]; 3] = [[1, 2], [0, 2], [0, 1]];
pub const SIM_VALUES: [[f32; 2]; 3] = [[0.75, 0.25], [0.5, 0.125], [1.5, -0.5]];
pub const TOP_INDICES: [[i64; 2]; 2] = [[10, 11], [12, 13]];
pub const TOP_VALUES: [[f32; 2]; 2] = [[5.0, 4.0], [3.0, 2.0]];

/// Write the full set of default-named blobs into `dir`, tensors as
/// `torch.save` archives.
///
/// Similarity: 3 rows x 2 columns. Effects: 2 rows x 2 columns. Values are
/// exact in f32 so they survive a JSON round trip unchanged.
pub fn write_blobs(dir: &Path) {
    write_torch_indices(&dir.join("cosine_sim_indices.pt"), &SIM_INDICES);
    write_torch_values(&dir.join("cosine_sim_values.pt"), &SIM_VALUES);
    write_torch_indices(&dir.join("top_is.pt"), &TOP_INDICES);
    write_torch_values(&dir.join("top_vs.pt"), &TOP_VALUES);
    std::fs::write(dir.join("new_autointerp.json"), DESCRIPTIONS).unwrap();
    std::fs::write(dir.join("autointerp.json"), RECORDS).unwrap();
}

/// Same tables as [`write_blobs`], tensors as safetensors under `.safetensors` keys.
pub fn write_safetensors_blobs(dir: &Path) {
    let device = Device::Cpu;
    write_tensor(
        &dir.join("cosine_sim_indices.safetensors"),
        Tensor::new(&SIM_INDICES, &device).unwrap(),
    );
    write_tensor(
        &dir.join("cosine_sim_values.safetensors"),
        Tensor::new(&SIM_VALUES, &device).unwrap(),
    );
    write_tensor(
        &dir.join("top_is.safetensors"),
        Tensor::new(&TOP_INDICES, &device).unwrap(),
    );
    write_tensor(
        &dir.join("top_vs.safetensors"),
        Tensor::new(&TOP_VALUES, &device).unwrap(),
    );
    std::fs::write(dir.join("new_autointerp.json"), DESCRIPTIONS).unwrap();
    std::fs::write(dir.join("autointerp.json"), RECORDS).unwrap();
}
