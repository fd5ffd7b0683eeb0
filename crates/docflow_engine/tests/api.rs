use docflow_core::{HistoryEntry, JobId, PickedFile, ProcessingOptions, Selection, StatusReport};
use docflow_engine::{
    ApiSettings, FailureKind, JobApi, ReqwestJobApi, SubmissionError, GENERIC_UPLOAD_FAILURE,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestJobApi {
    ReqwestJobApi::new(ApiSettings::parse(&server.uri()).unwrap()).unwrap()
}

fn selection(options: ProcessingOptions) -> Selection {
    Selection {
        file: PickedFile::new("report.pdf", b"%PDF-1.7 body".to_vec()),
        options,
    }
}

/// Value of a multipart field, read up to the end of its first line.
fn multipart_field(body: &str, name: &str) -> Option<String> {
    let start = body.find(&format!("name=\"{name}\""))?;
    let rest = &body[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let value_end = value.find("\r\n")?;
    Some(value[..value_end].to_string())
}

#[tokio::test]
async fn submit_sends_file_and_four_option_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "job_id": "abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let options = ProcessingOptions {
        strategy: "fast".into(),
        model: "v1".into(),
        infer_tables: true,
        extract_images: false,
    };
    let job_id = api_for(&server).submit(&selection(options)).await.unwrap();
    assert_eq!(job_id, JobId::new("abc"));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();

    assert_eq!(body.matches("form-data; name=\"").count(), 5);
    assert!(body.contains("filename=\"report.pdf\""));
    assert_eq!(multipart_field(&body, "file").as_deref(), Some("%PDF-1.7 body"));
    assert_eq!(multipart_field(&body, "strategy").as_deref(), Some("fast"));
    assert_eq!(multipart_field(&body, "model").as_deref(), Some("v1"));
    assert_eq!(multipart_field(&body, "infer_tables").as_deref(), Some("true"));
    assert_eq!(multipart_field(&body, "extract_images").as_deref(), Some("false"));
}

#[tokio::test]
async fn submit_surfaces_server_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "unsupported format" })),
        )
        .mount(&server)
        .await;

    let err = api_for(&server)
        .submit(&selection(ProcessingOptions::default()))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::Rejected {
            status: 400,
            message: "unsupported format".into(),
        }
    );
    assert_eq!(err.user_message(), "unsupported format");
}

#[tokio::test]
async fn submit_falls_back_to_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .submit(&selection(ProcessingOptions::default()))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), GENERIC_UPLOAD_FAILURE);
}

#[tokio::test]
async fn submit_to_unreachable_server_is_a_transport_error() {
    let api = ReqwestJobApi::new(ApiSettings::parse("http://127.0.0.1:9").unwrap()).unwrap();
    let err = api
        .submit(&selection(ProcessingOptions::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Transport(_)));
}

#[tokio::test]
async fn status_reports_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "Complete",
            "progress": 100,
            "result_file": "report.json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/lost"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "Unknown" })),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    assert_eq!(
        api.status(&JobId::new("abc")).await.unwrap(),
        StatusReport::new("Complete", 100).with_result_file("report.json")
    );
    assert_eq!(
        api.status(&JobId::new("lost")).await.unwrap(),
        StatusReport::new("Unknown", 0)
    );
}

#[tokio::test]
async fn status_failures_are_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/down"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.status(&JobId::new("down")).await.unwrap_err();
    assert_eq!(err.0.kind, FailureKind::HttpStatus(503));
    let err = api.status(&JobId::new("garbled")).await.unwrap_err();
    assert_eq!(err.0.kind, FailureKind::Decode);
}

#[tokio::test]
async fn history_keeps_server_order_and_ignores_extra_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "2", "filename": "b.pdf", "date": "2026-10-16 10:00", "zip_name": "b_processed.zip" },
            { "id": "1", "filename": "a.pdf", "date": "2026-10-15 09:00", "zip_name": "a_processed.zip" }
        ])))
        .mount(&server)
        .await;

    let entries = api_for(&server).history().await.unwrap();
    assert_eq!(
        entries,
        vec![
            HistoryEntry {
                file_name: "b.pdf".into(),
                date: "2026-10-16 10:00".into(),
                archive_name: "b_processed.zip".into(),
            },
            HistoryEntry {
                file_name: "a.pdf".into(),
                date: "2026-10-15 09:00".into(),
                archive_name: "a_processed.zip".into(),
            },
        ]
    );
}

#[tokio::test]
async fn history_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = api_for(&server).history().await.unwrap_err();
    assert_eq!(err.0.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn download_returns_artifact_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/report_processed.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04zip".to_vec()))
        .mount(&server)
        .await;

    let bytes = api_for(&server)
        .download("report_processed.zip")
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"PK\x03\x04zip");
}

#[tokio::test]
async fn download_rejects_oversized_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/big.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 11]))
        .mount(&server)
        .await;

    let mut settings = ApiSettings::parse(&server.uri()).unwrap();
    settings.max_download_bytes = 10;
    let err = ReqwestJobApi::new(settings)
        .unwrap()
        .download("big.zip")
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}
