//! The seam between the view controller and whatever draws the page.
//!
//! The controller only ever pushes [`WidgetUpdate`]s into a [`Surface`] and
//! receives [`UserAction`]s back; it never knows whether the other side is an
//! HTML page, a terminal or a test recorder.

use crate::chart::{ChartBinding, ChartUpdate};
use crate::filters::{FilterState, SortField, SortOrder};
use crate::heatmap::HeatmapTable;
use crate::models::{FilterOptions, Incident, Kpi};
use crate::pagination::Pagination;
use crate::view::ViewMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Widget {
    Layout,
    FilterOptions,
    Kpi,
    Insight,
    Trend,
    Directions,
    Types,
    Heatmap,
    Incidents,
    Pagination,
    Modal,
    Error,
}

/// Read-only incident card. Source is left out when the view hides it.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentDetail {
    pub incident: Incident,
    pub show_source: bool,
}

impl IncidentDetail {
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let i = &self.incident;
        let mut out = vec![
            ("ID", i.id.to_string()),
            ("Occurred at", i.occurred_at.clone()),
            ("Sector", i.sector.clone()),
            ("Direction", i.direction.clone()),
            ("Event type", i.event_type.clone()),
            ("Intensity", i.intensity.to_string()),
        ];
        if self.show_source {
            out.push(("Source", i.source.clone().unwrap_or_default()));
        }
        out.push(("Summary", i.summary.clone().unwrap_or_default()));
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetUpdate {
    Layout(ViewMode),
    FilterOptions(FilterOptions),
    Kpi(Kpi),
    Insight(String),
    Chart {
        widget: Widget,
        update: ChartUpdate,
        binding: ChartBinding,
    },
    Heatmap(HeatmapTable),
    Incidents {
        rows: Vec<Incident>,
        show_source: bool,
    },
    Pagination(Pagination),
    ModalOpen(IncidentDetail),
    ModalClosed,
    Error(Option<String>),
}

impl WidgetUpdate {
    pub fn widget(&self) -> Widget {
        match self {
            WidgetUpdate::Layout(_) => Widget::Layout,
            WidgetUpdate::FilterOptions(_) => Widget::FilterOptions,
            WidgetUpdate::Kpi(_) => Widget::Kpi,
            WidgetUpdate::Insight(_) => Widget::Insight,
            WidgetUpdate::Chart { widget, .. } => *widget,
            WidgetUpdate::Heatmap(_) => Widget::Heatmap,
            WidgetUpdate::Incidents { .. } => Widget::Incidents,
            WidgetUpdate::Pagination(_) => Widget::Pagination,
            WidgetUpdate::ModalOpen(_) | WidgetUpdate::ModalClosed => Widget::Modal,
            WidgetUpdate::Error(_) => Widget::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    Apply(FilterState),
    PrevPage,
    NextPage,
    SetPageSize(u32),
    SetSort(SortField, SortOrder),
    OpenDetails(i64),
    CloseModal,
    BackdropClick,
}

pub trait Surface: Send {
    fn render(&mut self, update: WidgetUpdate);

    /// Whether the page has a dedicated error region.
    fn has_error_region(&self) -> bool {
        true
    }

    /// Blocking fallback used when there is no error region.
    fn alert(&mut self, message: &str);
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub updates: Vec<WidgetUpdate>,
    pub alerts: Vec<String>,
    pub no_error_region: bool,
}

#[cfg(test)]
impl RecordingSurface {
    pub fn widgets(&self) -> Vec<Widget> {
        self.updates.iter().map(WidgetUpdate::widget).collect()
    }

    pub fn last(&self, widget: Widget) -> Option<&WidgetUpdate> {
        self.updates.iter().rev().find(|u| u.widget() == widget)
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn render(&mut self, update: WidgetUpdate) {
        self.updates.push(update);
    }

    fn has_error_region(&self) -> bool {
        !self.no_error_region
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident() -> Incident {
        Incident {
            id: 3,
            occurred_at: "2025-01-05 10:00:00".into(),
            sector: "North".into(),
            direction: "East".into(),
            event_type: "shelling".into(),
            intensity: 4,
            source: Some("radio".into()),
            summary: None,
        }
    }

    #[test]
    fn detail_omits_source_when_hidden() {
        let shown = IncidentDetail {
            incident: incident(),
            show_source: true,
        };
        assert!(shown.fields().iter().any(|(k, v)| *k == "Source" && v == "radio"));

        let hidden = IncidentDetail {
            incident: incident(),
            show_source: false,
        };
        assert!(hidden.fields().iter().all(|(k, _)| *k != "Source"));
        assert_eq!(hidden.fields().last().unwrap(), &("Summary", String::new()));
    }
}
