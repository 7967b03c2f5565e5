use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    Increase,
    Decrease,
    Neutral,
}

impl TrendCategory {
    pub fn accent(self) -> Accent {
        match self {
            Self::Increase => Accent::Rose,
            Self::Decrease => Accent::Emerald,
            Self::Neutral => Accent::Indigo,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Increase => "aumento",
            Self::Decrease => "queda",
            Self::Neutral => "estável",
        }
    }
}

/// Palette keys understood by the card and chart surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accent {
    Indigo,
    Emerald,
    Rose,
    Amber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryRow {
    pub t: f64,
    pub elapsed: f64,
    #[serde(rename = "predito")]
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureRow {
    pub t: f64,
    #[serde(rename = "predito")]
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    pub t: f64,
    #[serde(rename = "erro")]
    pub residual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRow {
    #[serde(rename = "janela_minutos")]
    pub window_minutes: f64,
    #[serde(rename = "consumo_medio_previsto")]
    pub predicted_mean: f64,
    #[serde(rename = "tendencia")]
    pub trend: String,
    pub category: TrendCategory,
    pub accent: Accent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCard {
    pub label: String,
    pub value: String,
    pub accent: Accent,
}

impl SummaryCard {
    pub fn new(label: impl Into<String>, value: impl Into<String>, accent: Accent) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            accent,
        }
    }
}
