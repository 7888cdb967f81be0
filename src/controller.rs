use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::api::{Api, ApiError, fetch_json};
use crate::chart::ChartSlot;
use crate::filters::{FilterState, IncidentQuery, SortField, SortOrder, TrendGroup, with_query};
use crate::heatmap::HeatmapTable;
use crate::models::{FilterOptions, Heatmap, Incident, IncidentPage, Kpi, LabelValue, TrendPoint};
use crate::pagination::Pagination;
use crate::surface::{IncidentDetail, Surface, UserAction, Widget, WidgetUpdate};
use crate::view::ViewMode;

/// Named steps of a full refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Kpi,
    Trend,
    Distributions,
    Heatmap,
    Incidents,
}

/// Run in this order, each awaited before the next; the first failure
/// stops the rest. Widgets already updated keep their new state.
pub const REFRESH_PIPELINE: [Stage; 5] = [
    Stage::Kpi,
    Stage::Trend,
    Stage::Distributions,
    Stage::Heatmap,
    Stage::Incidents,
];

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Kpi => "kpi",
            Stage::Trend => "trend",
            Stage::Distributions => "distributions",
            Stage::Heatmap => "heatmap",
            Stage::Incidents => "incidents",
        })
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct RefreshError {
    pub stage: Stage,
    #[source]
    pub source: ApiError,
}

/// A pending incidents load. Only the most recently issued generation may
/// render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentRequest {
    pub generation: u64,
    pub path: String,
}

/// The GET half of an incidents load, usable without holding the controller.
pub async fn fetch_incidents<A: Api + ?Sized>(
    api: &A,
    req: IncidentRequest,
) -> (IncidentRequest, Result<IncidentPage, ApiError>) {
    let res = fetch_json(api, &req.path).await;
    (req, res)
}

/// `Інцидентів: N. Сумарна інтенсивність: S. Топ-напрямок: D.`
pub fn insight_text(kpi: &Kpi) -> String {
    let top = match kpi.top_direction.as_deref().filter(|d| !d.is_empty()) {
        Some(d) => format!("Топ-напрямок: {}.", d),
        None => "Немає даних по топ-напрямку.".to_string(),
    };
    format!(
        "Інцидентів: {}. Сумарна інтенсивність: {}. {}",
        kpi.total_incidents, kpi.total_intensity, top
    )
}

/// Owns every piece of view state and is the only thing that mutates it.
pub struct ViewController<A: ?Sized, S> {
    api: Arc<A>,
    surface: S,
    mode: ViewMode,
    filters: FilterState,
    pagination: Pagination,
    sort: SortField,
    order: SortOrder,
    trend_group: TrendGroup,
    trend: ChartSlot,
    directions: ChartSlot,
    types: ChartSlot,
    incidents_generation: u64,
    modal_open: bool,
}

impl<A, S> ViewController<A, S>
where
    A: Api + ?Sized,
    S: Surface,
{
    pub fn new(api: Arc<A>, surface: S, mode: ViewMode) -> Self {
        Self {
            api,
            surface,
            mode,
            filters: FilterState::default(),
            pagination: Pagination::default(),
            sort: SortField::default(),
            order: SortOrder::default(),
            trend_group: TrendGroup::default(),
            trend: ChartSlot::trend(),
            directions: ChartSlot::directions(),
            types: ChartSlot::types(),
            incidents_generation: 0,
            modal_open: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.pagination = Pagination::new(page_size);
        self
    }

    pub fn with_trend_group(mut self, group: TrendGroup) -> Self {
        self.trend_group = group;
        self
    }

    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.filters = filters;
        self
    }

    pub fn api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn trend_chart(&self) -> &ChartSlot {
        &self.trend
    }

    /// First paint: layout, filter choices, then a full refresh. Fails only
    /// when the filter choices could not be loaded; the page is not usable
    /// then and the caller should try again later.
    pub async fn init(&mut self) -> Result<(), ApiError> {
        self.surface.render(WidgetUpdate::Layout(self.mode));
        if let Err(e) = self.load_filters().await {
            error!(error = %e, "loading filter options failed");
            self.report(&e.to_string());
            return Err(e);
        }
        self.refresh().await;
        Ok(())
    }

    pub async fn load_filters(&mut self) -> Result<(), ApiError> {
        let options: FilterOptions = fetch_json(self.api.as_ref(), "/filters").await?;

        if self.filters.date_from.is_none() {
            self.filters.date_from = options.min_date;
        }
        if self.filters.date_to.is_none() {
            self.filters.date_to = options.max_date;
        }

        self.surface.render(WidgetUpdate::FilterOptions(options));
        Ok(())
    }

    pub async fn load_kpi(&mut self) -> Result<(), ApiError> {
        let path = with_query("/kpi", &self.filters.to_query());
        let kpi: Kpi = fetch_json(self.api.as_ref(), &path).await?;

        if self.mode.show_insight() {
            self.surface.render(WidgetUpdate::Insight(insight_text(&kpi)));
        }
        self.surface.render(WidgetUpdate::Kpi(kpi));
        Ok(())
    }

    pub async fn load_trend(&mut self) -> Result<(), ApiError> {
        let path = with_query("/trend", &self.trend_group.query(&self.filters.to_query()));
        let points: Vec<TrendPoint> = fetch_json(self.api.as_ref(), &path).await?;

        let update = self.trend.set_series(points.into_iter().map(|p| (p.t, p.value)));
        if let Some(binding) = self.trend.binding() {
            self.surface.render(WidgetUpdate::Chart {
                widget: Widget::Trend,
                update,
                binding: binding.clone(),
            });
        }
        Ok(())
    }

    pub async fn load_direction_distribution(&mut self) -> Result<(), ApiError> {
        let path = with_query("/distribution/directions", &self.filters.to_query());
        let rows: Vec<LabelValue> = fetch_json(self.api.as_ref(), &path).await?;

        let update = self.directions.set_series(rows.into_iter().map(|r| (r.label, r.value)));
        if let Some(binding) = self.directions.binding() {
            self.surface.render(WidgetUpdate::Chart {
                widget: Widget::Directions,
                update,
                binding: binding.clone(),
            });
        }
        Ok(())
    }

    pub async fn load_type_distribution(&mut self) -> Result<(), ApiError> {
        let path = with_query("/distribution/types", &self.filters.to_query());
        let rows: Vec<LabelValue> = fetch_json(self.api.as_ref(), &path).await?;

        let update = self.types.set_series(rows.into_iter().map(|r| (r.label, r.value)));
        if let Some(binding) = self.types.binding() {
            self.surface.render(WidgetUpdate::Chart {
                widget: Widget::Types,
                update,
                binding: binding.clone(),
            });
        }
        Ok(())
    }

    pub async fn load_heatmap(&mut self) -> Result<(), ApiError> {
        if !self.mode.show_heatmap() {
            return Ok(());
        }

        let path = with_query("/heatmap", &self.filters.to_query());
        let heatmap: Heatmap = fetch_json(self.api.as_ref(), &path).await?;
        self.surface.render(WidgetUpdate::Heatmap(HeatmapTable::from(&heatmap)));
        Ok(())
    }

    /// Issues a new generation for the current page, or `None` when the
    /// table is hidden in this view.
    pub fn begin_incidents(&mut self) -> Option<IncidentRequest> {
        if !self.mode.show_incident_table() {
            return None;
        }

        self.incidents_generation += 1;
        let query = IncidentQuery {
            page: self.pagination.current_page(),
            page_size: self.pagination.page_size(),
            sort: self.sort,
            order: self.order,
        };
        Some(IncidentRequest {
            generation: self.incidents_generation,
            path: with_query("/incidents", &query.append_to(self.filters.to_query())),
        })
    }

    /// Renders `page` unless a newer request has been issued since `req`.
    pub fn apply_incidents(&mut self, req: &IncidentRequest, page: IncidentPage) -> bool {
        if req.generation != self.incidents_generation {
            debug!(
                generation = req.generation,
                latest = self.incidents_generation,
                "dropping stale incidents response"
            );
            return false;
        }

        self.pagination.sync(page.total, page.page, page.page_size);
        self.surface.render(WidgetUpdate::Incidents {
            rows: page.items,
            show_source: !self.mode.hide_source(),
        });
        self.surface.render(WidgetUpdate::Pagination(self.pagination));
        true
    }

    /// Completes a request started with [`begin_incidents`]. Failures of a
    /// superseded request are dropped along with its rows.
    ///
    /// [`begin_incidents`]: ViewController::begin_incidents
    pub fn finish_incidents(
        &mut self,
        req: IncidentRequest,
        result: Result<IncidentPage, ApiError>,
    ) {
        match result {
            Ok(page) => {
                self.apply_incidents(&req, page);
            }
            Err(e) if req.generation == self.incidents_generation => {
                error!(error = %e, "loading incidents failed");
                self.report(&e.to_string());
            }
            Err(e) => debug!(error = %e, "ignoring failure of stale incidents request"),
        }
    }

    pub async fn load_incidents(&mut self) -> Result<(), ApiError> {
        let Some(req) = self.begin_incidents() else {
            return Ok(());
        };
        let page: IncidentPage = fetch_json(self.api.as_ref(), &req.path).await?;
        self.apply_incidents(&req, page);
        Ok(())
    }

    async fn run_stage(&mut self, stage: Stage) -> Result<(), ApiError> {
        match stage {
            Stage::Kpi => self.load_kpi().await,
            Stage::Trend => self.load_trend().await,
            Stage::Distributions => {
                self.load_direction_distribution().await?;
                self.load_type_distribution().await
            }
            Stage::Heatmap => self.load_heatmap().await,
            Stage::Incidents => self.load_incidents().await,
        }
    }

    pub async fn refresh_all(&mut self) -> Result<(), RefreshError> {
        self.surface.render(WidgetUpdate::Error(None));
        for stage in REFRESH_PIPELINE {
            self.run_stage(stage)
                .await
                .map_err(|source| RefreshError { stage, source })?;
        }
        Ok(())
    }

    /// `refresh_all` with the failure shown to the user.
    pub async fn refresh(&mut self) {
        if let Err(e) = self.refresh_all().await {
            error!(stage = %e.stage, error = %e.source, "refresh aborted");
            self.report(&e.source.to_string());
        }
    }

    pub async fn open_details(&mut self, id: i64) -> Result<(), ApiError> {
        let incident: Incident = fetch_json(self.api.as_ref(), &format!("/incidents/{}", id)).await?;
        self.surface.render(WidgetUpdate::ModalOpen(IncidentDetail {
            incident,
            show_source: !self.mode.hide_source(),
        }));
        self.modal_open = true;
        Ok(())
    }

    pub fn close_modal(&mut self) {
        if self.modal_open {
            self.modal_open = false;
            self.surface.render(WidgetUpdate::ModalClosed);
        }
    }

    /// Applies a paging action and returns the incidents request it needs,
    /// if any. Out-of-range moves do nothing.
    pub fn page_action(&mut self, action: &UserAction) -> Option<IncidentRequest> {
        let moved = match action {
            UserAction::PrevPage => self.pagination.prev(),
            UserAction::NextPage => self.pagination.next(),
            UserAction::SetPageSize(n) => {
                self.pagination.set_page_size(*n);
                true
            }
            UserAction::SetSort(field, order) => {
                self.sort = *field;
                self.order = *order;
                self.pagination.reset();
                true
            }
            _ => false,
        };
        if moved { self.begin_incidents() } else { None }
    }

    pub async fn handle(&mut self, action: UserAction) {
        match action {
            UserAction::Apply(filters) => {
                self.filters = filters;
                self.pagination.reset();
                self.refresh().await;
            }
            UserAction::OpenDetails(id) => {
                if let Err(e) = self.open_details(id).await {
                    error!(id, error = %e, "loading incident details failed");
                    self.report(&e.to_string());
                }
            }
            UserAction::CloseModal | UserAction::BackdropClick => self.close_modal(),
            paging => {
                if let Some(req) = self.page_action(&paging) {
                    let (req, result) = fetch_incidents(self.api.as_ref(), req).await;
                    self.finish_incidents(req, result);
                }
            }
        }
    }

    fn report(&mut self, message: &str) {
        if self.surface.has_error_region() {
            self.surface.render(WidgetUpdate::Error(Some(message.to_string())));
        } else {
            self.surface.alert(message);
        }
    }
}
