//! Text and JSON rendering of a loaded analysis.

use std::fmt::Write as _;

use client_core::{LoadedAnalysis, Projection, RegressionProjection, TrendProjection};
use shared::domain::SummaryCard;

pub fn render_json(loaded: &LoadedAnalysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&loaded.projection)
}

pub fn render_text(loaded: &LoadedAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Análise de {} ({})",
        loaded.filename,
        loaded.result.shape_name()
    );
    out.push('\n');
    render_cards(&mut out, loaded.projection.summary());

    match &loaded.projection {
        Projection::Regression(projection) => render_regression(&mut out, projection),
        Projection::WindowedTrend(projection) => render_trend(&mut out, projection),
    }
    out
}

fn render_cards(out: &mut String, cards: &[SummaryCard]) {
    let width = cards
        .iter()
        .map(|card| card.label.chars().count())
        .max()
        .unwrap_or(0);
    for card in cards {
        let pad = width - card.label.chars().count();
        let _ = writeln!(out, "  {}{}  {}", card.label, " ".repeat(pad), card.value);
    }
}

fn render_regression(out: &mut String, projection: &RegressionProjection) {
    let _ = writeln!(out, "\nReal vs Predito ({} linhas)", projection.primary.len());
    let _ = writeln!(out, "{:>12} {:>12} {:>12}", "t", "elapsed", "predito");
    for row in &projection.primary {
        let _ = writeln!(
            out,
            "{:>12.2} {:>12.2} {:>12.2}",
            row.t, row.elapsed, row.predicted
        );
    }

    let _ = writeln!(out, "\nPrevisão futura ({} linhas)", projection.futures.len());
    let _ = writeln!(out, "{:>12} {:>12}", "t", "predito");
    for row in &projection.futures {
        let _ = writeln!(out, "{:>12.2} {:>12.2}", row.t, row.predicted);
    }

    let _ = writeln!(out, "\nResíduos ({} linhas)", projection.residuals.len());
    let _ = writeln!(out, "{:>12} {:>12}", "t", "erro");
    for row in &projection.residuals {
        let _ = writeln!(out, "{:>12.2} {:>12.2}", row.t, row.residual);
    }
}

fn render_trend(out: &mut String, projection: &TrendProjection) {
    let _ = writeln!(out, "\nJanelas de previsão ({})", projection.windows.len());
    let _ = writeln!(
        out,
        "{:>8} {:>14} {:>10}  tendencia",
        "janela", "previsto", "categoria"
    );
    for window in &projection.windows {
        let _ = writeln!(
            out,
            "{:>6.0}min {:>14.2} {:>10}  {}",
            window.window_minutes,
            window.predicted_mean,
            window.category.label(),
            window.trend
        );
    }
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
