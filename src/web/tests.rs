use super::*;
use crate::config::ImageSection;
use crate::imaging::tests::png;
use crate::llm_extract::{ExtractError, ScanFields};
use crate::sheets_hub::SheetError;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, StatusCode, header};
use http_body_util::BodyExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "qc-test-boundary";

struct FakeExtractor {
    fields: ScanFields,
    fail: AtomicBool,
    calls: AtomicUsize,
    /// Held by a test to keep an extraction in flight.
    gate: tokio::sync::Mutex<()>,
}

#[async_trait]
impl VisionExtractor for FakeExtractor {
    async fn extract(&self, image_jpeg: &[u8], prompt: &str) -> Result<ScanFields, ExtractError> {
        assert!(image_jpeg.starts_with(&[0xFF, 0xD8]), "extractor must get a JPEG");
        assert!(!prompt.is_empty());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _open = self.gate.lock().await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExtractError::EmptyResponse);
        }
        Ok(self.fields.clone())
    }
}

#[derive(Default)]
struct MemorySink {
    rows: StdMutex<Vec<Vec<String>>>,
    fail: AtomicBool,
}

#[async_trait]
impl RowSink for MemorySink {
    async fn append_row(&self, row: &[String]) -> Result<u32, SheetError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SheetError::Key(std::io::Error::other("sheet offline")));
        }
        let mut rows = self.rows.lock().unwrap();
        rows.push(row.to_vec());
        Ok(rows.len() as u32 + 1)
    }
}

struct Harness {
    app: Router,
    extractor: Arc<FakeExtractor>,
    sink: Arc<MemorySink>,
    cookie: Option<String>,
}

fn lldpe_scan() -> ScanFields {
    [
        ("tanggal", "16/12/2024"),
        ("no_surat_jalan", "SJ-0912"),
        ("no_po", "PO 4411"),
        ("no_batch", "24c15/5b/24c15/blf/fzf"),
        ("jml_datang", "12 roll"),
        ("supplier", "blasfolie"),
        ("lebar", "790"),
        ("thickness", "75"),
        ("cof", "0.12"),
        ("sampling_size", "3"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Harness {
    fn new() -> Self {
        let extractor = Arc::new(FakeExtractor {
            fields: lldpe_scan(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            gate: tokio::sync::Mutex::new(()),
        });
        let sink = Arc::new(MemorySink::default());
        let state = AppState {
            sessions: Arc::new(SessionStore::new(Duration::from_secs(600))),
            extractor: extractor.clone(),
            sink: sink.clone(),
            image: ImageSection::default(),
        };
        Self {
            app: router(state, 1024 * 1024),
            extractor,
            sink,
            cookie: None,
        }
    }

    async fn send(&mut self, req: axum::http::request::Builder, body: Body) -> (StatusCode, Vec<u8>) {
        let req = match &self.cookie {
            Some(c) => req.header(header::COOKIE, c),
            None => req,
        };
        let resp = self
            .app
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        if let Some(set) = resp.headers().get(header::SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap().to_string();
            self.cookie = Some(pair);
        }
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn page(&mut self) -> String {
        let (status, body) = self
            .send(axum::http::Request::get("/"), Body::empty())
            .await;
        assert_eq!(status, StatusCode::OK);
        String::from_utf8(body).unwrap()
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> StatusCode {
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(req, Body::from(form.to_string())).await.0
    }

    async fn upload(&mut self, filename: &str, bytes: &[u8], material: &str) -> StatusCode {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"material\"\r\n\r\n{material}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        self.send(req, Body::from(body)).await.0
    }

    /// Start `POST /analyze` in the background and wait until the model is called.
    async fn analyze_in_background(&self) -> tokio::task::JoinHandle<StatusCode> {
        let before = self.extractor.calls.load(Ordering::SeqCst);
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, self.cookie.clone().unwrap())
            .body(Body::empty())
            .unwrap();
        let pending = tokio::spawn(self.app.clone().oneshot(req));
        while self.extractor.calls.load(Ordering::SeqCst) == before {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::spawn(async move { pending.await.unwrap().unwrap().status() })
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.sink.rows.lock().unwrap().clone()
    }
}

#[tokio::test]
async fn upload_analyze_submit_once() {
    let mut h = Harness::new();

    assert_eq!(h.upload("sheet.png", &png(60, 40), "LLDPE").await, StatusCode::SEE_OTHER);
    let page = h.page().await;
    assert!(page.contains("action=\"/analyze\""));

    assert_eq!(h.post_form("/analyze", "material=LLDPE").await, StatusCode::SEE_OTHER);
    let page = h.page().await;
    assert!(page.contains("Analysis done in"));
    assert!(page.contains("value=\"24C15/SB/24C15/BLF/FZF\""));
    assert!(page.contains("value=\"15-12-2024\""));
    assert!(page.contains("value=\"LLDPE 790mm x 75µm\""));
    assert!(page.contains("<option selected>BLASFOLIE</option>"));

    let status = h
        .post_form("/submit", "no_po=PO+4412&supplier=SAKA&film=LLDPE+800mm+x+75%C2%B5m")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let rows = h.rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.len(), 22);
    assert_eq!(row[0], "16/12/2024");
    assert_eq!(row[1], "LLDPE 800mm x 75µm");
    assert_eq!(row[3], "PO 4412");
    assert_eq!(row[4], "24C15/SB/24C15/BLF/FZF");
    assert_eq!(row[5], "15-12-2024");
    assert_eq!(row[20], "SAKA");

    let page = h.page().await;
    assert!(page.contains("Sent to row 2"));
    assert!(page.contains("Data sent."));
    assert!(!page.contains("action=\"/submit\""));

    h.post_form("/submit", "no_po=again").await;
    let page = h.page().await;
    assert!(page.contains("This data has already been sent."));
    assert_eq!(h.rows().len(), 1);
}

#[tokio::test]
async fn failed_extraction_shows_no_result() {
    let mut h = Harness::new();
    h.extractor.fail.store(true, Ordering::SeqCst);

    h.upload("sheet.png", &png(20, 20), "OPP").await;
    h.post_form("/analyze", "").await;

    let page = h.page().await;
    assert!(page.contains("Extraction failed"));
    assert!(!page.contains("action=\"/submit\""));

    h.post_form("/submit", "").await;
    assert!(h.page().await.contains("Nothing to send yet."));
    assert!(h.rows().is_empty());
}

#[tokio::test]
async fn failed_append_can_be_retried() {
    let mut h = Harness::new();
    h.upload("sheet.png", &png(20, 20), "LLDPE").await;
    h.post_form("/analyze", "").await;

    h.sink.fail.store(true, Ordering::SeqCst);
    h.post_form("/submit", "").await;
    let page = h.page().await;
    assert!(page.contains("Could not write to Google Sheets"));
    assert!(page.contains("action=\"/submit\""));
    assert!(h.rows().is_empty());

    h.sink.fail.store(false, Ordering::SeqCst);
    h.post_form("/submit", "").await;
    assert!(h.page().await.contains("Sent to row 2"));
    assert_eq!(h.rows().len(), 1);
}

#[tokio::test]
async fn new_analysis_allows_another_send() {
    let mut h = Harness::new();
    h.upload("sheet.png", &png(20, 20), "LLDPE").await;
    h.post_form("/analyze", "").await;
    h.post_form("/submit", "").await;

    h.post_form("/analyze", "").await;
    h.post_form("/submit", "").await;

    assert_eq!(h.rows().len(), 2);
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn analyze_without_photo_is_refused() {
    let mut h = Harness::new();
    h.post_form("/analyze", "material=PET").await;
    let page = h.page().await;
    assert!(page.contains("Upload a checksheet photo before analysing."));
    assert!(page.contains("<option value=\"PET\" selected>"));
    assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let mut h = Harness::new();
    h.upload("notes.pdf", b"%PDF-1.7 not a photo", "LLDPE").await;
    let page = h.page().await;
    assert!(page.contains("notes.pdf: unsupported photo format"));
    assert!(!page.contains("action=\"/analyze\""));
}

#[tokio::test]
async fn unknown_material_is_a_bad_request() {
    let mut h = Harness::new();
    assert_eq!(h.post_form("/material", "material=PVC").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rotated_preview_is_served_as_jpeg() {
    let mut h = Harness::new();
    let (status, _) = h.send(axum::http::Request::get("/photo"), Body::empty()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    h.upload("sheet.png", &png(40, 20), "LLDPE").await;
    h.post_form("/rotate", "").await;
    assert!(h.page().await.contains("-90\""));

    let (status, body) = h.send(axum::http::Request::get("/photo"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let img = image::load_from_memory_with_format(&body, image::ImageFormat::Jpeg).unwrap();
    assert_eq!((img.width(), img.height()), (20, 40));
}

#[tokio::test]
async fn operators_do_not_share_sessions() {
    let mut a = Harness::new();
    a.upload("sheet.png", &png(20, 20), "LLDPE").await;
    a.post_form("/analyze", "").await;

    let mut b = Harness {
        app: a.app.clone(),
        extractor: a.extractor.clone(),
        sink: a.sink.clone(),
        cookie: None,
    };
    let page = b.page().await;
    assert!(!page.contains("action=\"/submit\""));
    assert!(!page.contains("action=\"/analyze\""));

    b.post_form("/submit", "").await;
    assert!(b.page().await.contains("Nothing to send yet."));
    assert!(a.page().await.contains("action=\"/submit\""));
}

#[tokio::test]
async fn health_reports_status() {
    let mut h = Harness::new();
    let (status, body) = h.send(axum::http::Request::get("/health"), Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(h.cookie.is_none());
}

#[tokio::test]
async fn page_stays_usable_while_the_model_runs() {
    let mut h = Harness::new();
    h.upload("sheet.png", &png(20, 20), "LLDPE").await;

    let extractor = h.extractor.clone();
    let held = extractor.gate.lock().await;
    let pending = h.analyze_in_background().await;

    let page = tokio::time::timeout(Duration::from_secs(5), h.page())
        .await
        .expect("page blocked by a running analysis");
    assert!(page.contains("action=\"/analyze\""));
    let (status, _) = tokio::time::timeout(
        Duration::from_secs(5),
        h.send(axum::http::Request::get("/photo"), Body::empty()),
    )
    .await
    .expect("preview blocked by a running analysis");
    assert_eq!(status, StatusCode::OK);

    drop(held);
    assert_eq!(pending.await.unwrap(), StatusCode::SEE_OTHER);
    assert!(h.page().await.contains("value=\"24C15/SB/24C15/BLF/FZF\""));
}

#[tokio::test]
async fn result_for_a_replaced_photo_is_discarded() {
    let mut h = Harness::new();
    h.upload("first.png", &png(20, 20), "LLDPE").await;

    let extractor = h.extractor.clone();
    let held = extractor.gate.lock().await;
    let pending = h.analyze_in_background().await;

    h.upload("second.png", &png(30, 20), "LLDPE").await;
    drop(held);
    pending.await.unwrap();

    let page = h.page().await;
    assert!(page.contains("The photo changed during analysis."));
    assert!(!page.contains("action=\"/submit\""));
    assert!(page.contains("alt=\"second.png\""));
}
