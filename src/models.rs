// Response shapes of the incident analytics API. Read-only projections;
// nothing here is mutated after decoding.
use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterOptions {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub directions: Vec<String>,
    #[serde(default)]
    pub event_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Kpi {
    #[serde(default)]
    pub total_incidents: u64,
    #[serde(default)]
    pub total_intensity: f64,
    #[serde(default)]
    pub avg_intensity: f64,
    pub top_direction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendPoint {
    pub t: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelValue {
    pub label: String,
    pub value: f64,
}

/// Sector x week counts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Heatmap {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<HeatmapRow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatmapRow {
    pub sector: String,
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Incident {
    pub id: i64,
    pub occurred_at: String,
    pub sector: String,
    pub direction: String,
    pub event_type: String,
    pub intensity: i64,
    pub source: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncidentPage {
    #[serde(default)]
    pub items: Vec<Incident>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
