//! Test server wrapper for integration tests
//!
//! Builds the same router as the binary over a temporary image directory
//! and a synthesized alarm asset, with a [`RecordingSink`] standing in for
//! the audio device.

use super::RecordingSink;
use alert_relay::api::{create_router, run, AppContext};
use alert_relay::audio::AudioSink;
use alert_relay::images::ImageStore;
use alert_relay::{AlarmPlayer, AlarmState, SharedState};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const BOUNDARY: &str = "alert-relay-test-boundary";

const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// In-process relay with its own image directory and alarm asset
pub struct TestServer {
    pub router: Router,
    pub state: Arc<SharedState>,
    pub alarm: Arc<AlarmPlayer>,
    /// None when built without an audio subsystem
    pub sink: Option<Arc<RecordingSink>>,
    dir: TempDir,
}

impl TestServer {
    /// Relay with a working (recording) audio subsystem
    pub fn new() -> Self {
        Self::build(true)
    }

    /// Relay whose audio subsystem failed to initialize
    pub fn without_audio() -> Self {
        Self::build(false)
    }

    fn build(with_audio: bool) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let image_dir = dir.path().join("intruders");
        std::fs::create_dir(&image_dir).expect("Failed to create image dir");

        let sound = dir.path().join("alarm.wav");
        write_alarm_wav(&sound);

        let sink = with_audio.then(|| Arc::new(RecordingSink::default()));
        let output = sink.clone().map(|s| s as Arc<dyn AudioSink>);

        let state = Arc::new(SharedState::new());
        let alarm = Arc::new(AlarmPlayer::new(sound, output, Arc::clone(&state)));
        let ctx = AppContext::new(Arc::clone(&state), Arc::clone(&alarm), ImageStore::new(&image_dir));

        Self {
            router: create_router(ctx, MAX_UPLOAD_BYTES),
            state,
            alarm,
            sink,
            dir,
        }
    }

    pub fn image_dir(&self) -> PathBuf {
        self.dir.path().join("intruders")
    }

    pub fn sink(&self) -> &RecordingSink {
        self.sink.as_deref().expect("server built without audio")
    }

    /// Send one request through the router, returning status and JSON body
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        content_type: Option<&str>,
        body: Body,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// POST a single-file multipart upload
    pub async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/upload-image/",
            Some(&format!("multipart/form-data; boundary={}", BOUNDARY)),
            Body::from(multipart_body("file", filename, content_type, bytes)),
        )
        .await
    }

    pub async fn stop_alarm(&self) -> (StatusCode, Value) {
        self.request(Method::POST, "/stop-alarm/", None, Body::empty())
            .await
    }

    /// Poll until the alarm reaches `expected` or the timeout passes
    pub async fn wait_for_alarm(&self, expected: AlarmState) -> bool {
        for _ in 0..100 {
            if self.alarm.state() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

/// Relay served on an ephemeral localhost port
pub struct LiveServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl LiveServer {
    pub async fn start(server: &TestServer) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = server.router.clone();
        let handle = tokio::spawn(async move {
            run(listener, app, async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("Test server failed");
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/events", self.addr)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        // Open sockets keep graceful shutdown waiting; don't hang the test on them
        let _ = tokio::time::timeout(Duration::from_secs(2), &mut self.handle).await;
    }
}

/// Build a multipart/form-data body with one file field
pub fn multipart_body(field: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Write a short mono 16-bit WAV usable as the alarm asset
pub fn write_alarm_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    // 0.1s square wave
    for n in 0..1600 {
        let sample: i16 = if (n / 20) % 2 == 0 { 8000 } else { -8000 };
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}
