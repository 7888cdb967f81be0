// src/main.rs
mod api;
mod chart;
mod controller;
mod filters;
mod heatmap;
mod html;
mod models;
mod pagination;
mod surface;
mod view;
mod web;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::api::HttpApi;
use crate::controller::ViewController;
use crate::filters::{FilterState, TrendGroup};
use crate::html::HtmlSurface;
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::view::ViewMode;

#[derive(Parser)]
#[command(name = "incidash")]
#[command(about = "Incident analytics API -> dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the dashboard server
    Serve {
        /// Base URL of the incident analytics API
        #[arg(long, default_value = "http://localhost:8000")]
        api: String,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,

        /// Incident rows per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Trend bucket size
        #[arg(long, value_enum, default_value_t = TrendGroup::Day)]
        trend_group: TrendGroup,
    },

    /// Load the dashboard once and print the page
    Snapshot {
        /// Base URL of the incident analytics API
        #[arg(long, default_value = "http://localhost:8000")]
        api: String,

        #[arg(long, value_enum, default_value_t = ViewMode::Analyst)]
        view: ViewMode,

        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day, YYYY-MM-DD
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long)]
        sector: Option<String>,

        #[arg(long)]
        direction: Option<String>,

        #[arg(long)]
        event_type: Option<String>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        min_intensity: Option<u32>,

        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        #[arg(long, value_enum, default_value_t = TrendGroup::Day)]
        trend_group: TrendGroup,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve {
            api,
            bind,
            page_size,
            trend_group,
        } => {
            let api = HttpApi::new(&api).with_context(|| format!("parse api url {}", api))?;
            let bind: SocketAddr = bind.parse().context("parse bind addr")?;
            let settings = web::SessionSettings {
                page_size,
                trend_group,
            };
            web::serve(api, settings, bind).await?;
        }

        Command::Snapshot {
            api,
            view,
            from,
            to,
            sector,
            direction,
            event_type,
            min_intensity,
            page_size,
            trend_group,
        } => {
            let api = HttpApi::new(&api).with_context(|| format!("parse api url {}", api))?;
            let filters = FilterState {
                date_from: from,
                date_to: to,
                sector,
                direction,
                event_type,
                min_intensity,
            };
            tracing::info!(view = %view, filtered = !filters.is_empty(), "taking snapshot");

            let mut controller = ViewController::new(Arc::new(api), HtmlSurface::default(), view)
                .with_filters(filters)
                .with_page_size(page_size)
                .with_trend_group(trend_group);
            let loaded = controller.init().await;

            let filters = controller.filters().clone();
            let surface = controller.surface_mut();
            println!("{}", surface.page(&filters));
            loaded.context("load filter options")?;
            if let Some(err) = surface.error() {
                bail!("dashboard load failed: {}", err);
            }
        }
    }

    Ok(())
}
