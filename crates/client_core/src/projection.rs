//! Turns a decoded analysis result into chart-ready rows and summary cards.
//!
//! Everything here is pure: inputs are borrowed and never mutated, so
//! projecting the same result twice yields equal output.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared::{
    domain::{Accent, FutureRow, PrimaryRow, ResidualRow, SummaryCard, TrendCategory, WindowRow},
    error::AnalysisError,
    protocol::{AnalysisResult, RegressionResult, TrendForecast},
};
use thiserror::Error;

/// How to join parallel arrays whose lengths disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZipPolicy {
    /// Any length mismatch inside a group is an error.
    #[default]
    Strict,
    /// Iterate to the shortest array of the group.
    Truncate,
}

impl FromStr for ZipPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "truncate" | "lenient" => Ok(Self::Truncate),
            other => Err(format!("unknown zip policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("{group} series: `{field}` has {actual} values but `{anchor}` has {expected}")]
    LengthMismatch {
        group: &'static str,
        anchor: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl From<ProjectionError> for AnalysisError {
    fn from(value: ProjectionError) -> Self {
        AnalysisError::MalformedResponse(value.to_string())
    }
}

/// A named parallel array.
#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'static str,
    pub values: &'a [f64],
}

impl<'a> Column<'a> {
    pub fn new(name: &'static str, values: &'a [f64]) -> Self {
        Self { name, values }
    }
}

fn joined_len(
    group: &'static str,
    anchor: Column<'_>,
    companions: &[Column<'_>],
    policy: ZipPolicy,
) -> Result<usize, ProjectionError> {
    let expected = anchor.values.len();
    match policy {
        ZipPolicy::Strict => {
            if let Some(column) = companions.iter().find(|c| c.values.len() != expected) {
                return Err(ProjectionError::LengthMismatch {
                    group,
                    anchor: anchor.name,
                    field: column.name,
                    expected,
                    actual: column.values.len(),
                });
            }
            Ok(expected)
        }
        ZipPolicy::Truncate => Ok(companions
            .iter()
            .map(|c| c.values.len())
            .fold(expected, usize::min)),
    }
}

/// Joins two parallel arrays by position, in input order.
pub fn zip_by_index(
    group: &'static str,
    anchor: Column<'_>,
    companion: Column<'_>,
    policy: ZipPolicy,
) -> Result<Vec<(f64, f64)>, ProjectionError> {
    let len = joined_len(group, anchor, &[companion], policy)?;
    Ok((0..len)
        .map(|i| (anchor.values[i], companion.values[i]))
        .collect())
}

pub fn zip3_by_index(
    group: &'static str,
    anchor: Column<'_>,
    second: Column<'_>,
    third: Column<'_>,
    policy: ZipPolicy,
) -> Result<Vec<(f64, f64, f64)>, ProjectionError> {
    let len = joined_len(group, anchor, &[second, third], policy)?;
    Ok((0..len)
        .map(|i| (anchor.values[i], second.values[i], third.values[i]))
        .collect())
}

/// Case-insensitive substring match; "aumento" is checked before "queda" and
/// anything else is neutral.
pub fn classify_trend(label: &str) -> TrendCategory {
    let label = label.to_lowercase();
    if label.contains("aumento") {
        TrendCategory::Increase
    } else if label.contains("queda") {
        TrendCategory::Decrease
    } else {
        TrendCategory::Neutral
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionProjection {
    pub primary: Vec<PrimaryRow>,
    pub futures: Vec<FutureRow>,
    pub residuals: Vec<ResidualRow>,
    pub summary: Vec<SummaryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendProjection {
    pub baseline: f64,
    pub windows: Vec<WindowRow>,
    pub summary: Vec<SummaryCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Projection {
    Regression(RegressionProjection),
    WindowedTrend(TrendProjection),
}

impl Projection {
    pub fn summary(&self) -> &[SummaryCard] {
        match self {
            Self::Regression(projection) => &projection.summary,
            Self::WindowedTrend(projection) => &projection.summary,
        }
    }
}

pub fn project(result: &AnalysisResult, policy: ZipPolicy) -> Result<Projection, ProjectionError> {
    match result {
        AnalysisResult::Regression(regression) => {
            project_regression(regression, policy).map(Projection::Regression)
        }
        AnalysisResult::WindowedTrend(forecast) => {
            Ok(Projection::WindowedTrend(project_trend(forecast)))
        }
    }
}

pub fn project_regression(
    result: &RegressionResult,
    policy: ZipPolicy,
) -> Result<RegressionProjection, ProjectionError> {
    let series = &result.series;
    let t = Column::new("t", &series.t);

    let primary = zip3_by_index(
        "primary",
        t,
        Column::new("elapsed", &series.elapsed),
        Column::new("predito", &series.predicted),
        policy,
    )?
    .into_iter()
    .map(|(t, elapsed, predicted)| PrimaryRow {
        t,
        elapsed,
        predicted,
    })
    .collect();

    let residuals = zip_by_index("residual", t, Column::new("erro", &series.residual), policy)?
        .into_iter()
        .map(|(t, residual)| ResidualRow { t, residual })
        .collect();

    let futures = zip_by_index(
        "future",
        Column::new("future_t", &series.future_t),
        Column::new("future_pred", &series.future_predicted),
        policy,
    )?
    .into_iter()
    .map(|(t, predicted)| FutureRow { t, predicted })
    .collect();

    Ok(RegressionProjection {
        primary,
        futures,
        residuals,
        summary: regression_summary(result),
    })
}

pub fn project_trend(forecast: &TrendForecast) -> TrendProjection {
    let windows = forecast
        .windows
        .iter()
        .map(|window| {
            let category = classify_trend(&window.trend);
            WindowRow {
                window_minutes: window.window_minutes,
                predicted_mean: window.predicted_mean,
                trend: window.trend.clone(),
                category,
                accent: category.accent(),
            }
        })
        .collect();

    TrendProjection {
        baseline: forecast.baseline_mean,
        windows,
        summary: vec![SummaryCard::new(
            "Consumo médio (último minuto)",
            format!("{:.2}", forecast.baseline_mean),
            Accent::Amber,
        )],
    }
}

fn regression_summary(result: &RegressionResult) -> Vec<SummaryCard> {
    vec![
        SummaryCard::new("Score R²", format!("{:.4}", result.r2), Accent::Indigo),
        SummaryCard::new("RMSE (Erro)", format!("{:.2} ms", result.rmse), Accent::Rose),
        SummaryCard::new(
            "Coeficiente",
            format!("{:.4}", result.coefficient),
            Accent::Emerald,
        ),
    ]
}

#[cfg(test)]
#[path = "tests/projection_tests.rs"]
mod tests;
