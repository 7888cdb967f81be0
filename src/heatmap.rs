use crate::models::{Heatmap, HeatmapRow};

pub const MIN_ALPHA: f64 = 0.1;
pub const MAX_ALPHA: f64 = 0.85;
const ALPHA_SPAN: f64 = 0.75;

/// Largest cell across the whole grid, never below zero.
pub fn global_max(rows: &[HeatmapRow]) -> f64 {
    rows.iter()
        .flat_map(|r| r.values.iter().copied())
        .fold(0.0, f64::max)
}

/// Linear ramp from 10% to 85% of the value's share of the grid maximum.
/// `None` means the cell gets no fill.
pub fn cell_opacity(value: f64, max: f64) -> Option<f64> {
    if max <= 0.0 {
        return None;
    }
    Some((MIN_ALPHA + (value / max) * ALPHA_SPAN).min(MAX_ALPHA))
}

pub fn cell_fill(value: f64, max: f64) -> String {
    match cell_opacity(value, max) {
        Some(alpha) => format!("rgba(0, 123, 255, {})", alpha),
        None => "transparent".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCell {
    pub value: f64,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatRow {
    pub sector: String,
    pub cells: Vec<HeatCell>,
}

/// The coloured table, ready to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapTable {
    pub columns: Vec<String>,
    pub rows: Vec<HeatRow>,
}

impl From<&Heatmap> for HeatmapTable {
    fn from(h: &Heatmap) -> Self {
        let max = global_max(&h.rows);
        let rows = h
            .rows
            .iter()
            .map(|r| HeatRow {
                sector: r.sector.clone(),
                cells: r
                    .values
                    .iter()
                    .map(|&value| HeatCell {
                        value,
                        fill: cell_fill(value, max),
                    })
                    .collect(),
            })
            .collect();

        HeatmapTable {
            columns: h.columns.clone(),
            rows,
        }
    }
}
