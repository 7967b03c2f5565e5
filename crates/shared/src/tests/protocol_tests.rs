use super::*;
use crate::error::ErrorKind;

const REGRESSION_BODY: &str = r#"{
    "coeficiente": 0.5,
    "intercepto": 12,
    "r2": 0.91,
    "rmse": 3.25,
    "dados": {
        "t": [0, 1, 2],
        "elapsed": [10, 11, 13],
        "predito": [10.5, 11, 12.5],
        "erro": [-0.5, 0, 0.5],
        "future_t": [3, 4],
        "future_pred": [13, 13.5]
    }
}"#;

const TREND_BODY: &str = r#"{
    "consumo_ultimo_minuto_medio": 42.5,
    "previsoes": [
        {"janela_minutos": 5, "consumo_medio_previsto": 44.0, "tendencia": "Tendência de Aumento"},
        {"janela_minutos": 15, "consumo_medio_previsto": 40.0, "tendencia": "Queda"}
    ]
}"#;

#[test]
fn decodes_regression_shape_with_wire_names() {
    let result = AnalysisResult::from_json(REGRESSION_BODY.as_bytes()).expect("decode");
    let AnalysisResult::Regression(regression) = result else {
        panic!("expected regression shape");
    };
    assert_eq!(regression.coefficient, 0.5);
    assert_eq!(regression.intercept, 12.0);
    assert_eq!(regression.series.predicted, vec![10.5, 11.0, 12.5]);
    assert_eq!(regression.series.future_predicted, vec![13.0, 13.5]);
}

#[test]
fn decodes_windowed_trend_shape() {
    let result = AnalysisResult::from_json(TREND_BODY.as_bytes()).expect("decode");
    assert_eq!(result.shape_name(), "windowed_trend");
    let AnalysisResult::WindowedTrend(forecast) = result else {
        panic!("expected trend shape");
    };
    assert_eq!(forecast.baseline_mean, 42.5);
    assert_eq!(forecast.windows.len(), 2);
    assert_eq!(forecast.windows[1].trend, "Queda");
}

#[test]
fn json_matching_neither_shape_is_malformed() {
    for body in [r#"{}"#, r#"{"status": "ok"}"#, r#"[1, 2, 3]"#, r#""text""#] {
        let err = AnalysisResult::from_json(body.as_bytes()).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::MalformedResponse, "body: {body}");
    }
}

#[test]
fn non_json_body_is_malformed() {
    let err = AnalysisResult::from_json(b"<html>bad gateway</html>").expect_err("must reject");
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[test]
fn regression_missing_series_field_is_malformed() {
    let body = r#"{"coeficiente": 1, "intercepto": 0, "r2": 1, "rmse": 0,
        "dados": {"t": [0], "elapsed": [1], "predito": [1], "erro": [0]}}"#;
    let err = AnalysisResult::from_json(body.as_bytes()).expect_err("must reject");
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[test]
fn error_detail_uses_only_non_blank_strings() {
    assert_eq!(
        parse_error_detail(br#"{"detail": "invalid file"}"#).as_deref(),
        Some("invalid file")
    );
    assert_eq!(parse_error_detail(br#"{"detail": "   "}"#), None);
    assert_eq!(
        parse_error_detail(br#"{"detail": [{"loc": ["body", "file"], "msg": "field required"}]}"#),
        None
    );
    assert_eq!(parse_error_detail(br#"{"message": "nope"}"#), None);
    assert_eq!(parse_error_detail(b"Internal Server Error"), None);
}

#[test]
fn user_message_prefers_detail_then_status_then_generic() {
    let with_detail = AnalysisError::server(422, Some("invalid file".to_string()));
    assert_eq!(with_detail.user_message(), "invalid file");

    let without_detail = AnalysisError::server(500, None);
    assert_eq!(without_detail.user_message(), "Falha no envio com status 500");

    let network = AnalysisError::Network("connection refused".to_string());
    assert_eq!(
        network.user_message(),
        crate::error::GENERIC_FAILURE_MESSAGE
    );
}
