use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::{Api, HttpApi};
use crate::controller::{ViewController, fetch_incidents};
use crate::filters::{FilterForm, FilterState, SortField, SortOrder, TrendGroup};
use crate::html::HtmlSurface;
use crate::pagination::parse_page_size;
use crate::surface::UserAction;
use crate::view::ViewMode;

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub page_size: u32,
    pub trend_group: TrendGroup,
}

/// One controller per view mode. The first request to a view triggers its
/// initial load, and every request after a failed one tries again.
struct Session<A: ?Sized = HttpApi> {
    controller: ViewController<A, HtmlSurface>,
    started: bool,
}

impl<A: Api + ?Sized> Session<A> {
    async fn ensure_started(&mut self) {
        if !self.started {
            self.started = self.controller.init().await.is_ok();
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    sessions: Arc<HashMap<ViewMode, Arc<Mutex<Session>>>>,
}

impl AppState {
    pub fn new(api: HttpApi, settings: SessionSettings) -> Self {
        let api = Arc::new(api);
        let sessions = ViewMode::ALL
            .into_iter()
            .map(|mode| {
                let controller =
                    ViewController::new(Arc::clone(&api), HtmlSurface::default(), mode)
                        .with_page_size(settings.page_size)
                        .with_trend_group(settings.trend_group);
                let session = Session {
                    controller,
                    started: false,
                };
                (mode, Arc::new(Mutex::new(session)))
            })
            .collect();
        Self {
            sessions: Arc::new(sessions),
        }
    }

    fn session(&self, mode: ViewMode) -> Result<Arc<Mutex<Session>>, (StatusCode, String)> {
        self.sessions
            .get(&mode)
            .cloned()
            .ok_or_else(|| (StatusCode::NOT_FOUND, format!("no session for view {}", mode)))
    }
}

type WebResult<T> = Result<T, (StatusCode, String)>;

fn back_to(mode: ViewMode) -> Redirect {
    Redirect::to(&format!("/?view={}", mode))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/apply", get(apply))
        .route("/page/{step}", get(page_step))
        .route("/page-size", get(page_size))
        .route("/sort", get(sort))
        .route("/details/{id}", get(details))
        .route("/modal/close", get(close_modal))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(api: HttpApi, settings: SessionSettings, bind: SocketAddr) -> anyhow::Result<()> {
    info!(api = api.base(), "using incident API");
    let app = router(AppState::new(api, settings));

    info!("listening on http://{}", bind);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct ViewParam {
    view: Option<String>,
}

impl ViewParam {
    fn mode(&self) -> ViewMode {
        ViewMode::from_param(self.view.as_deref())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn index(State(st): State<AppState>, Query(q): Query<ViewParam>) -> WebResult<Html<String>> {
    let slot = st.session(q.mode())?;
    let mut s = slot.lock().await;
    s.ensure_started().await;

    let filters = s.controller.filters().clone();
    Ok(Html(s.controller.surface_mut().page(&filters)))
}

#[derive(Debug, Deserialize)]
struct ApplyParams {
    view: Option<String>,
    #[serde(flatten)]
    form: FilterForm,
}

async fn apply(State(st): State<AppState>, Query(q): Query<ApplyParams>) -> WebResult<Redirect> {
    let mode = ViewMode::from_param(q.view.as_deref());
    let filters = FilterState::try_from(q.form).map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let slot = st.session(mode)?;
    let mut s = slot.lock().await;
    s.ensure_started().await;
    s.controller.handle(UserAction::Apply(filters)).await;
    Ok(back_to(mode))
}

/// Runs a paging action with the session unlocked during the fetch, so a
/// slow page cannot block the view; stale pages are dropped by generation.
async fn run_paging(st: &AppState, mode: ViewMode, action: UserAction) -> WebResult<Redirect> {
    let slot = st.session(mode)?;
    let (api, req) = {
        let mut s = slot.lock().await;
        s.ensure_started().await;
        (s.controller.api(), s.controller.page_action(&action))
    };

    if let Some(req) = req {
        let (req, result) = fetch_incidents(api.as_ref(), req).await;
        slot.lock().await.controller.finish_incidents(req, result);
    }
    Ok(back_to(mode))
}

async fn page_step(
    State(st): State<AppState>,
    Path(step): Path<String>,
    Query(q): Query<ViewParam>,
) -> WebResult<Redirect> {
    let action = match step.as_str() {
        "prev" => UserAction::PrevPage,
        "next" => UserAction::NextPage,
        other => return Err((StatusCode::NOT_FOUND, format!("unknown page step {:?}", other))),
    };
    run_paging(&st, q.mode(), action).await
}

#[derive(Debug, Deserialize)]
struct PageSizeParams {
    view: Option<String>,
    size: Option<String>,
}

async fn page_size(State(st): State<AppState>, Query(q): Query<PageSizeParams>) -> WebResult<Redirect> {
    let mode = ViewMode::from_param(q.view.as_deref());
    let size = parse_page_size(q.size.as_deref().unwrap_or(""));
    run_paging(&st, mode, UserAction::SetPageSize(size)).await
}

#[derive(Debug, Deserialize)]
struct SortParams {
    view: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

async fn sort(State(st): State<AppState>, Query(q): Query<SortParams>) -> WebResult<Redirect> {
    let mode = ViewMode::from_param(q.view.as_deref());
    let field = match q.sort.as_deref() {
        None => SortField::default(),
        Some(s) => SortField::parse(s).ok_or((StatusCode::BAD_REQUEST, format!("unknown sort field {:?}", s)))?,
    };
    let order = match q.order.as_deref() {
        None => SortOrder::default(),
        Some(s) => SortOrder::parse(s).ok_or((StatusCode::BAD_REQUEST, "order must be asc|desc".to_string()))?,
    };
    run_paging(&st, mode, UserAction::SetSort(field, order)).await
}

async fn details(
    State(st): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<ViewParam>,
) -> WebResult<Redirect> {
    let mode = q.mode();
    let slot = st.session(mode)?;
    let mut s = slot.lock().await;
    s.ensure_started().await;
    s.controller.handle(UserAction::OpenDetails(id)).await;
    Ok(back_to(mode))
}

async fn close_modal(State(st): State<AppState>, Query(q): Query<ViewParam>) -> WebResult<Redirect> {
    let mode = q.mode();
    let slot = st.session(mode)?;
    slot.lock().await.controller.handle(UserAction::CloseModal).await;
    Ok(back_to(mode))
}
