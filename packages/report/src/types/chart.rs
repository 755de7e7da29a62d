use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declarative chart description. The viewing layer draws it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChartDescriptor {
    pub chart_type: ChartType,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Extra chart-library options, merged over the renderer defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Doughnut,
    Pie,
    Radar,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Doughnut => "doughnut",
            ChartType::Pie => "pie",
            ChartType::Radar => "radar",
        }
    }

    /// Pie-like charts colour each slice, others colour each dataset.
    pub fn colors_per_point(&self) -> bool {
        matches!(self, ChartType::Doughnut | ChartType::Pie)
    }
}
