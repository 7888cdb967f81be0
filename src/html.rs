use std::collections::BTreeMap;

use crate::chart::ChartBinding;
use crate::filters::FilterState;
use crate::heatmap::HeatmapTable;
use crate::models::{FilterOptions, Incident, Kpi};
use crate::pagination::{DEFAULT_PAGE_SIZE, Pagination};
use crate::surface::{IncidentDetail, Surface, Widget, WidgetUpdate};
use crate::view::ViewMode;

const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

/// Escape HTML special characters
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// JSON placed inside a `<script>` must not close the tag.
fn script_json(v: &serde_json::Value) -> String {
    v.to_string().replace("</", "<\\/")
}

fn or_dash(v: Option<&str>) -> String {
    escape(v.filter(|s| !s.is_empty()).unwrap_or("-"))
}

/// A [`Surface`] that keeps the latest state of every widget and draws the
/// whole page on demand.
#[derive(Debug, Clone, Default)]
pub struct HtmlSurface {
    mode: ViewMode,
    options: Option<FilterOptions>,
    kpi: Option<Kpi>,
    insight: Option<String>,
    charts: BTreeMap<Widget, ChartBinding>,
    heatmap: Option<HeatmapTable>,
    incidents: Option<(Vec<Incident>, bool)>,
    pagination: Option<Pagination>,
    modal: Option<IncidentDetail>,
    error: Option<String>,
    alerts: Vec<String>,
}

impl Surface for HtmlSurface {
    fn render(&mut self, update: WidgetUpdate) {
        match update {
            WidgetUpdate::Layout(mode) => self.mode = mode,
            WidgetUpdate::FilterOptions(options) => self.options = Some(options),
            WidgetUpdate::Kpi(kpi) => self.kpi = Some(kpi),
            WidgetUpdate::Insight(text) => self.insight = Some(text),
            WidgetUpdate::Chart { widget, binding, .. } => {
                self.charts.insert(widget, binding);
            }
            WidgetUpdate::Heatmap(table) => self.heatmap = Some(table),
            WidgetUpdate::Incidents { rows, show_source } => {
                self.incidents = Some((rows, show_source))
            }
            WidgetUpdate::Pagination(p) => self.pagination = Some(p),
            WidgetUpdate::ModalOpen(detail) => self.modal = Some(detail),
            WidgetUpdate::ModalClosed => self.modal = None,
            WidgetUpdate::Error(msg) => self.error = msg,
        }
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}

impl HtmlSurface {
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The full document for the current state.
    pub fn page(&mut self, filters: &FilterState) -> String {
        let view = self.mode.as_str();
        let mut body = String::new();

        body.push_str(&format!(
            r#"<h1>Incident Dashboard <span id="viewBadge" class="badge">{}</span></h1>"#,
            view
        ));
        body.push_str(&self.render_error());
        body.push_str(&self.render_filters(filters));
        body.push_str(&self.render_kpi());
        if self.mode.show_insight() {
            body.push_str(&format!(
                r#"<div id="insightBox" class="card"><p id="insightText">{}</p></div>"#,
                escape(self.insight.as_deref().unwrap_or(""))
            ));
        }
        body.push_str(&self.render_charts());
        if self.mode.show_heatmap() {
            body.push_str(&self.render_heatmap());
        }
        if self.mode.show_incident_table() {
            body.push_str(&self.render_incidents());
        }
        body.push_str(&self.render_modal());

        let alerts: String = self
            .alerts
            .drain(..)
            .map(|a| format!("alert({});", script_json(&serde_json::Value::String(a))))
            .collect();

        format!(
            "{}{}\n<script>\n{}{}</script>\n</body>\n</html>\n",
            PAGE_HEAD,
            body,
            self.chart_scripts(),
            alerts
        )
    }

    fn render_error(&self) -> String {
        match &self.error {
            Some(msg) => format!(r#"<div id="errorBox" class="error">{}</div>"#, escape(msg)),
            None => r#"<div id="errorBox" class="error" style="display:none"></div>"#.to_string(),
        }
    }

    fn render_filters(&self, filters: &FilterState) -> String {
        let options = self.options.clone().unwrap_or_default();

        let select = |name: &str, values: &[String], current: Option<&str>| {
            let opts: String = values
                .iter()
                .map(|v| {
                    let sel = if Some(v.as_str()) == current { " selected" } else { "" };
                    format!(r#"<option value="{0}"{1}>{0}</option>"#, escape(v), sel)
                })
                .collect();
            format!(
                r#"<select name="{}"><option value="">All</option>{}</select>"#,
                name, opts
            )
        };
        let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();

        format!(
            r#"<form id="filters" class="card" action="/apply" method="get">
<input type="hidden" name="view" value="{view}">
<label>From <input type="date" name="from" value="{from}"></label>
<label>To <input type="date" name="to" value="{to}"></label>
<label>Sector {sector}</label>
<label>Direction {direction}</label>
<label>Event type {event_type}</label>
<label>Min intensity <input type="number" min="1" name="min_intensity" value="{min}"></label>
<button id="applyBtn" type="submit">Apply</button>
</form>"#,
            view = self.mode.as_str(),
            from = date(filters.date_from),
            to = date(filters.date_to),
            sector = select("sector", &options.sectors, filters.sector.as_deref()),
            direction = select("direction", &options.directions, filters.direction.as_deref()),
            event_type = select("event_type", &options.event_types, filters.event_type.as_deref()),
            min = filters.min_intensity.map(|n| n.to_string()).unwrap_or_default(),
        )
    }

    fn render_kpi(&self) -> String {
        let (total, sum, avg, top) = match &self.kpi {
            Some(k) => (
                k.total_incidents.to_string(),
                k.total_intensity.to_string(),
                k.avg_intensity.to_string(),
                or_dash(k.top_direction.as_deref()),
            ),
            None => ("-".into(), "-".into(), "-".into(), "-".into()),
        };
        format!(
            r#"<div class="grid kpis">
<div class="card"><h2>Incidents</h2><p id="kpiTotal">{}</p></div>
<div class="card"><h2>Total intensity</h2><p id="kpiSum">{}</p></div>
<div class="card"><h2>Avg intensity</h2><p id="kpiAvg">{}</p></div>
<div class="card"><h2>Top direction</h2><p id="kpiTop">{}</p></div>
</div>"#,
            total, sum, avg, top
        )
    }

    fn render_charts(&self) -> String {
        r#"<div class="grid">
<div class="card"><h2>Trend</h2><div class="chart-container"><canvas id="trendChart"></canvas></div></div>
<div class="card"><h2>By direction</h2><div class="chart-container"><canvas id="dirChart"></canvas></div></div>
<div class="card"><h2>By event type</h2><div class="chart-container"><canvas id="typeChart"></canvas></div></div>
</div>"#
            .to_string()
    }

    fn chart_scripts(&self) -> String {
        self.charts
            .iter()
            .filter_map(|(widget, binding)| {
                let canvas = match widget {
                    Widget::Trend => "trendChart",
                    Widget::Directions => "dirChart",
                    Widget::Types => "typeChart",
                    _ => return None,
                };
                Some(format!(
                    "new Chart(document.getElementById('{}').getContext('2d'), {});\n",
                    canvas,
                    script_json(&binding.to_chartjs())
                ))
            })
            .collect()
    }

    fn render_heatmap(&self) -> String {
        let Some(table) = &self.heatmap else {
            return r#"<div id="heatmapSection" class="card"><h2>Sector x week</h2><p class="loading">No data</p></div>"#.to_string();
        };

        let mut html = String::from(
            r#"<div id="heatmapSection" class="card"><h2>Sector x week</h2><table id="heatmapTable"><thead><tr><th>Sector</th>"#,
        );
        for c in &table.columns {
            html.push_str(&format!("<th>{}</th>", escape(c)));
        }
        html.push_str("</tr></thead><tbody>");
        for row in &table.rows {
            html.push_str(&format!("<tr><td>{}</td>", escape(&row.sector)));
            for cell in &row.cells {
                html.push_str(&format!(
                    r#"<td style="background:{}; color:#fff; text-align:center;">{}</td>"#,
                    cell.fill, cell.value
                ));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody></table></div>");
        html
    }

    fn render_incidents(&self) -> String {
        let view = self.mode.as_str();
        let show_source = !self.mode.hide_source();
        let mut html = String::from(
            r#"<div id="incidentsSection" class="card"><h2>Incidents</h2><table><thead><tr><th>ID</th><th>Occurred at</th><th>Sector</th><th>Direction</th><th>Event type</th><th>Intensity</th>"#,
        );
        if show_source {
            html.push_str(r#"<th id="thSource">Source</th>"#);
        }
        html.push_str(r#"<th>Summary</th><th></th></tr></thead><tbody id="incidentsBody">"#);

        if let Some((rows, rows_show_source)) = &self.incidents {
            for i in rows {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
                    i.id,
                    escape(&i.occurred_at),
                    escape(&i.sector),
                    escape(&i.direction),
                    escape(&i.event_type),
                    i.intensity
                ));
                if *rows_show_source && show_source {
                    html.push_str(&format!(
                        "<td>{}</td>",
                        escape(i.source.as_deref().unwrap_or(""))
                    ));
                }
                html.push_str(&format!(
                    r#"<td>{}</td><td><a class="button" href="/details/{}?view={}">Details</a></td></tr>"#,
                    escape(i.summary.as_deref().unwrap_or("")),
                    i.id,
                    view
                ));
            }
        }
        html.push_str("</tbody></table>");
        html.push_str(&self.render_pagination());
        html.push_str("</div>");
        html
    }

    fn render_pagination(&self) -> String {
        let view = self.mode.as_str();
        let p = self.pagination.unwrap_or_default();

        let control = |label: &str, route: &str, disabled: bool| {
            if disabled {
                format!("<button disabled>{}</button>", label)
            } else {
                format!(r#"<a class="button" href="/page/{}?view={}">{}</a>"#, route, view, label)
            }
        };
        let sizes: String = PAGE_SIZES
            .iter()
            .map(|&n| {
                let sel = if n == p.page_size() { " selected" } else { "" };
                format!(r#"<option value="{0}"{1}>{0}</option>"#, n, sel)
            })
            .collect();

        format!(
            r#"<div id="pagination">{prev}<span>{label}</span>{next}
<form action="/page-size" method="get"><input type="hidden" name="view" value="{view}">
<select id="pageSize" name="size" onchange="this.form.submit()" data-default="{default}">{sizes}</select></form></div>"#,
            prev = control("Prev", "prev", p.prev_disabled()),
            label = p.label(),
            next = control("Next", "next", p.next_disabled()),
            view = view,
            default = DEFAULT_PAGE_SIZE,
            sizes = sizes,
        )
    }

    fn render_modal(&self) -> String {
        let Some(detail) = &self.modal else {
            return String::new();
        };
        let close = format!("/modal/close?view={}", self.mode.as_str());
        let fields: String = detail
            .fields()
            .iter()
            .map(|(k, v)| format!("<p><b>{}:</b> {}</p>", k, escape(v)))
            .collect();
        format!(
            r#"<a id="modal" class="modal" href="{close}"></a>
<div class="modal-content"><a id="modalClose" class="close" href="{close}">&times;</a><div id="modalBody">{fields}</div></div>"#,
            close = close,
            fields = fields
        )
    }
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Incident Dashboard</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js"></script>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
            background: #f1f3f8;
            padding: 20px;
        }
        h1 { margin-bottom: 20px; color: #1f2937; }
        .badge { font-size: 0.9rem; background: #007bff; color: #fff; padding: 2px 10px; border-radius: 10px; }
        .grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
            gap: 20px;
            margin-bottom: 20px;
        }
        .card {
            background: white;
            padding: 20px;
            border-radius: 12px;
            box-shadow: 0 4px 12px rgba(0,0,0,0.1);
            margin-bottom: 20px;
        }
        .card h2 { font-size: 1.1rem; color: #333; margin-bottom: 10px; }
        .chart-container { position: relative; height: 280px; }
        form label { margin-right: 12px; }
        table { width: 100%; border-collapse: collapse; }
        th, td { padding: 6px 8px; border-bottom: 1px solid #eee; text-align: left; }
        .button { padding: 4px 10px; background: #007bff; color: #fff; border-radius: 4px; text-decoration: none; }
        #pagination { display: flex; gap: 12px; align-items: center; margin-top: 12px; }
        .error { background: #fee; color: #dc2626; padding: 12px; border-radius: 6px; margin-bottom: 20px; }
        .loading { color: #999; font-style: italic; }
        .modal { position: fixed; inset: 0; background: rgba(0,0,0,0.5); }
        .modal-content {
            position: fixed; top: 10%; left: 50%; transform: translateX(-50%);
            background: #fff; padding: 24px; border-radius: 12px; min-width: 400px;
        }
        .close { float: right; font-size: 1.5rem; text-decoration: none; color: #333; }
    </style>
</head>
<body>
"#;
