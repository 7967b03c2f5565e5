use super::*;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Router,
};
use shared::error::{ErrorKind, GENERIC_FAILURE_MESSAGE};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

const REGRESSION_BODY: &str = r#"{
    "coeficiente": 1.25, "intercepto": 3.0, "r2": 0.875, "rmse": 12.5,
    "dados": {
        "t": [0, 5, 10], "elapsed": [100, 120, 135], "predito": [101, 118, 136],
        "erro": [-1, 2, -1], "future_t": [15, 20], "future_pred": [150, 162]
    }
}"#;

#[derive(Debug, Clone)]
struct ReceivedField {
    name: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone)]
struct PredictState {
    status: StatusCode,
    body: String,
    received: Arc<Mutex<Vec<ReceivedField>>>,
}

async fn handle_predict(
    State(state): State<PredictState>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state.received.lock().await.push(ReceivedField {
            name,
            file_name,
            content_type,
            bytes,
        });
    }
    (state.status, state.body.clone())
}

async fn spawn_predict_server(
    status: StatusCode,
    body: &str,
) -> Result<(Url, Arc<Mutex<Vec<ReceivedField>>>), Box<dyn std::error::Error>> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = PredictState {
        status,
        body: body.to_string(),
        received: received.clone(),
    };
    let app = Router::new()
        .route("/predict", post(handle_predict))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}/predict"))?, received))
}

fn sample_upload() -> CsvUpload {
    CsvUpload::new("results.csv", b"timeStamp,elapsed\n1700000000000,120\n".to_vec())
}

#[tokio::test]
async fn posts_csv_as_single_multipart_file_field() {
    let (endpoint, received) = spawn_predict_server(StatusCode::OK, REGRESSION_BODY)
        .await
        .expect("spawn server");
    let client = AnalysisClient::new(endpoint.clone());
    assert_eq!(client.endpoint(), &endpoint);

    let result = client.analyze(sample_upload()).await.expect("analyze");
    assert_eq!(result.shape_name(), "regression");

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    let field = &received[0];
    assert_eq!(field.name.as_deref(), Some("file"));
    assert_eq!(field.file_name.as_deref(), Some("results.csv"));
    assert_eq!(field.content_type.as_deref(), Some("text/csv"));
    assert_eq!(field.bytes, sample_upload().bytes);
}

#[tokio::test]
async fn server_detail_is_used_verbatim() {
    let (endpoint, _) =
        spawn_predict_server(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail": "invalid file"}"#)
            .await
            .expect("spawn server");
    let client = AnalysisClient::new(endpoint);

    let err = client.analyze(sample_upload()).await.expect_err("must fail");
    assert_eq!(
        err,
        AnalysisError::Server {
            status: 422,
            detail: Some("invalid file".to_string())
        }
    );
    assert_eq!(err.user_message(), "invalid file");
}

#[tokio::test]
async fn unparseable_error_body_falls_back_to_status_message() {
    let (endpoint, _) = spawn_predict_server(StatusCode::INTERNAL_SERVER_ERROR, "oops <html>")
        .await
        .expect("spawn server");
    let client = AnalysisClient::new(endpoint);

    let err = client.analyze(sample_upload()).await.expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::ServerError);
    let message = err.user_message();
    assert!(!message.is_empty());
    assert_eq!(message, "Falha no envio com status 500");
}

#[tokio::test]
async fn success_with_unknown_shape_is_malformed() {
    let (endpoint, _) = spawn_predict_server(StatusCode::OK, r#"{"status": "queued"}"#)
        .await
        .expect("spawn server");
    let client = AnalysisClient::new(endpoint);

    let err = client.analyze(sample_upload()).await.expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn unreachable_service_is_network_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let endpoint = Url::parse(&format!("http://{addr}/predict")).expect("url");
    let client = AnalysisClient::new(endpoint);

    let err = client.analyze(sample_upload()).await.expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn session_surfaces_server_detail_as_error_state() {
    let (endpoint, received) =
        spawn_predict_server(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail": "invalid file"}"#)
            .await
            .expect("spawn server");
    let session = IntakeSession::new(Arc::new(AnalysisClient::new(endpoint)), ZipPolicy::Strict);

    let outcome = session
        .submit(sample_upload(), FileSource::Dropped)
        .await
        .expect("accepted");
    assert_eq!(
        outcome,
        SubmitOutcome::Settled(IntakeState::Error("invalid file".to_string()))
    );
    assert_eq!(received.lock().await.len(), 1);
}

#[tokio::test]
async fn csv_upload_from_path_keeps_file_name() {
    let dir = std::env::temp_dir().join(format!("client_core_upload_{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.expect("dir");
    let path = dir.join("jmeter-run.csv");
    tokio::fs::write(&path, b"elapsed\n12\n").await.expect("write");

    let upload = CsvUpload::from_path(&path).await.expect("read");
    assert_eq!(upload.filename, "jmeter-run.csv");
    assert_eq!(upload.bytes, b"elapsed\n12\n".to_vec());

    tokio::fs::remove_dir_all(dir).await.expect("cleanup");
}

#[tokio::test]
async fn csv_upload_from_missing_path_is_invalid_file() {
    let err = CsvUpload::from_path("/definitely/not/here.csv")
        .await
        .expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::InvalidFile);
}

#[test]
fn endpoint_must_be_http_or_https() {
    assert!(parse_endpoint(DEFAULT_ENDPOINT_URL).is_ok());
    assert!(parse_endpoint("  http://localhost:7860/predict ").is_ok());
    assert!(matches!(
        parse_endpoint("ftp://example.com/predict"),
        Err(EndpointError::UnsupportedScheme(scheme)) if scheme == "ftp"
    ));
    assert!(matches!(
        parse_endpoint("not a url"),
        Err(EndpointError::Invalid(_))
    ));
}
