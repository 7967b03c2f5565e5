//! Wire formats returned by the prediction service.
//!
//! Field names on the wire are the service's own (`coeficiente`, `dados`,
//! `previsoes`, ...). The two result shapes never share a deployment, so the
//! body is decoded untagged into [`AnalysisResult`].

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Regression(RegressionResult),
    WindowedTrend(TrendForecast),
}

impl AnalysisResult {
    /// Decodes a 2xx response body. Anything that is not one of the two known
    /// shapes is rejected rather than rendered as an empty result.
    pub fn from_json(body: &[u8]) -> Result<Self, AnalysisError> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|err| {
            AnalysisError::MalformedResponse(format!("response body is not valid JSON: {err}"))
        })?;
        if !value.is_object() {
            return Err(AnalysisError::MalformedResponse(
                "response body is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|_| {
            AnalysisError::MalformedResponse(
                "response matches neither the regression nor the windowed trend shape".to_string(),
            )
        })
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Regression(_) => "regression",
            Self::WindowedTrend(_) => "windowed_trend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    #[serde(rename = "coeficiente")]
    pub coefficient: f64,
    #[serde(rename = "intercepto")]
    pub intercept: f64,
    pub r2: f64,
    pub rmse: f64,
    #[serde(rename = "dados")]
    pub series: RegressionSeries,
}

/// Parallel arrays joined by position. `t`, `elapsed`, `predicted` and
/// `residual` share one length; `future_t` and `future_predicted` share another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegressionSeries {
    pub t: Vec<f64>,
    pub elapsed: Vec<f64>,
    #[serde(rename = "predito")]
    pub predicted: Vec<f64>,
    #[serde(rename = "erro")]
    pub residual: Vec<f64>,
    pub future_t: Vec<f64>,
    #[serde(rename = "future_pred")]
    pub future_predicted: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    #[serde(rename = "consumo_ultimo_minuto_medio")]
    pub baseline_mean: f64,
    #[serde(rename = "previsoes")]
    pub windows: Vec<ForecastWindow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    #[serde(rename = "janela_minutos")]
    pub window_minutes: f64,
    #[serde(rename = "consumo_medio_previsto")]
    pub predicted_mean: f64,
    #[serde(rename = "tendencia")]
    pub trend: String,
}

/// Failure body. Only a non-blank string `detail` is shown to the user; FastAPI
/// style validation arrays and other JSON types fall back to the status message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail_message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|detail| !detail.trim().is_empty())
    }
}

pub fn parse_error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()?
        .detail_message()
        .map(str::to_string)
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
