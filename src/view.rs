use std::fmt;

/// Session-fixed UI configuration, read once from the `view` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum ViewMode {
    Executive,
    #[default]
    Analyst,
    Demo,
}

impl ViewMode {
    pub const ALL: [ViewMode; 3] = [ViewMode::Executive, ViewMode::Analyst, ViewMode::Demo];

    /// Case-insensitive; anything unrecognised (or missing) is `Analyst`.
    pub fn from_param(v: Option<&str>) -> Self {
        match v.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("executive") => ViewMode::Executive,
            Some("demo") => ViewMode::Demo,
            _ => ViewMode::Analyst,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Executive => "executive",
            ViewMode::Analyst => "analyst",
            ViewMode::Demo => "demo",
        }
    }

    pub fn hide_source(&self) -> bool {
        matches!(self, ViewMode::Demo)
    }

    pub fn show_incident_table(&self) -> bool {
        matches!(self, ViewMode::Analyst)
    }

    pub fn show_heatmap(&self) -> bool {
        matches!(self, ViewMode::Analyst)
    }

    pub fn show_insight(&self) -> bool {
        matches!(self, ViewMode::Executive)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
