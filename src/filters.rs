use chrono::NaiveDate;
use serde::Deserialize;
use url::form_urlencoded;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// The user's current query constraints. `None` means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sector: Option<String>,
    pub direction: Option<String>,
    pub event_type: Option<String>,
    pub min_intensity: Option<u32>,
}

impl FilterState {
    /// Canonical query string without a leading `?`. Only set fields appear,
    /// in a fixed order; an empty state gives an empty string.
    pub fn to_query(&self) -> String {
        let mut q = form_urlencoded::Serializer::new(String::new());

        if let Some(d) = self.date_from {
            q.append_pair("from", &d.format(DATE_FORMAT).to_string());
        }
        if let Some(d) = self.date_to {
            q.append_pair("to", &d.format(DATE_FORMAT).to_string());
        }
        if let Some(s) = &self.sector {
            q.append_pair("sector", s);
        }
        if let Some(s) = &self.direction {
            q.append_pair("direction", s);
        }
        if let Some(s) = &self.event_type {
            q.append_pair("event_type", s);
        }
        if let Some(n) = self.min_intensity {
            q.append_pair("min_intensity", &n.to_string());
        }

        q.finish()
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterState::default()
    }
}

/// `path` or `path?query`, never a dangling `?`.
pub fn with_query(path: &str, query: &str) -> String {
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    #[default]
    OccurredAt,
    Sector,
    Direction,
    EventType,
    Intensity,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::OccurredAt => "occurred_at",
            SortField::Sector => "sector",
            SortField::Direction => "direction",
            SortField::EventType => "event_type",
            SortField::Intensity => "intensity",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "id" => Some(SortField::Id),
            "occurred_at" => Some(SortField::OccurredAt),
            "sector" => Some(SortField::Sector),
            "direction" => Some(SortField::Direction),
            "event_type" => Some(SortField::EventType),
            "intensity" => Some(SortField::Intensity),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Paging and sorting appended after the filter query by the incidents loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentQuery {
    pub page: u32,
    pub page_size: u32,
    pub sort: SortField,
    pub order: SortOrder,
}

impl IncidentQuery {
    pub fn append_to(&self, filter_query: String) -> String {
        let mut q = form_urlencoded::Serializer::new(filter_query);
        q.append_pair("page", &self.page.to_string());
        q.append_pair("page_size", &self.page_size.to_string());
        q.append_pair("sort", self.sort.as_str());
        q.append_pair("order", self.order.as_str());
        q.finish()
    }
}

/// Bucket size of the trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TrendGroup {
    #[default]
    Day,
    Week,
}

impl TrendGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendGroup::Day => "day",
            TrendGroup::Week => "week",
        }
    }

    /// `group=<g>` followed by the filter query.
    pub fn query(&self, filter_query: &str) -> String {
        let mut q = format!("group={}", self.as_str());
        if !filter_query.is_empty() {
            q.push('&');
            q.push_str(filter_query);
        }
        q
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("invalid '{field}' date {value:?}, use YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("invalid min_intensity {0:?}, must be a whole number of at least 1")]
    InvalidIntensity(String),
}

/// Raw filter inputs as a browser form submits them. Empty fields are absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterForm {
    pub from: Option<String>,
    pub to: Option<String>,
    pub sector: Option<String>,
    pub direction: Option<String>,
    pub event_type: Option<String>,
    pub min_intensity: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_date(field: &'static str, v: Option<String>) -> Result<Option<NaiveDate>, FilterError> {
    match non_empty(v) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| FilterError::InvalidDate { field, value: s }),
    }
}

impl TryFrom<FilterForm> for FilterState {
    type Error = FilterError;

    fn try_from(form: FilterForm) -> Result<Self, Self::Error> {
        let min_intensity = match non_empty(form.min_intensity) {
            None => None,
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n >= 1 => Some(n),
                _ => return Err(FilterError::InvalidIntensity(s)),
            },
        };

        Ok(FilterState {
            date_from: parse_date("from", form.from)?,
            date_to: parse_date("to", form.to)?,
            sector: non_empty(form.sector),
            direction: non_empty(form.direction),
            event_type: non_empty(form.event_type),
            min_intensity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_serializes_to_empty_string() {
        assert_eq!(FilterState::default().to_query(), "");
        assert_eq!(with_query("/kpi", ""), "/kpi");
    }

    #[test]
    fn only_sector_is_serialized() {
        let f = FilterState {
            sector: Some("North".into()),
            ..Default::default()
        };
        assert_eq!(f.to_query(), "sector=North");
        assert_eq!(with_query("/heatmap", &f.to_query()), "/heatmap?sector=North");
    }

    #[test]
    fn fields_keep_fixed_order_and_are_encoded() {
        let f = FilterState {
            date_from: NaiveDate::from_ymd_opt(2025, 1, 2),
            date_to: NaiveDate::from_ymd_opt(2025, 2, 3),
            sector: Some("A & B".into()),
            direction: Some("East".into()),
            event_type: Some("shelling".into()),
            min_intensity: Some(3),
        };
        assert_eq!(
            f.to_query(),
            "from=2025-01-02&to=2025-02-03&sector=A+%26+B&direction=East&event_type=shelling&min_intensity=3"
        );
    }

    #[test]
    fn paging_is_appended_after_filters() {
        let q = IncidentQuery {
            page: 2,
            page_size: 20,
            sort: SortField::OccurredAt,
            order: SortOrder::Desc,
        };
        assert_eq!(
            q.append_to(String::new()),
            "page=2&page_size=20&sort=occurred_at&order=desc"
        );
        assert_eq!(
            q.append_to("sector=North".into()),
            "sector=North&page=2&page_size=20&sort=occurred_at&order=desc"
        );
    }

    #[test]
    fn form_blank_fields_are_absent() {
        let form = FilterForm {
            from: Some("".into()),
            to: Some("2025-03-01".into()),
            sector: Some("  ".into()),
            direction: None,
            event_type: Some("drone".into()),
            min_intensity: Some("".into()),
        };
        let f = FilterState::try_from(form).unwrap();
        assert_eq!(f.date_from, None);
        assert_eq!(f.date_to, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(f.sector, None);
        assert_eq!(f.event_type.as_deref(), Some("drone"));
        assert_eq!(f.min_intensity, None);
    }

    #[test]
    fn form_rejects_bad_date_and_intensity() {
        let bad_date = FilterForm {
            from: Some("01/02/2025".into()),
            ..Default::default()
        };
        assert!(matches!(
            FilterState::try_from(bad_date),
            Err(FilterError::InvalidDate { field: "from", .. })
        ));

        let bad_n = FilterForm {
            min_intensity: Some("lots".into()),
            ..Default::default()
        };
        assert_eq!(
            FilterState::try_from(bad_n),
            Err(FilterError::InvalidIntensity("lots".into()))
        );
    }

    #[test]
    fn form_intensity_starts_at_one() {
        let zero = FilterForm {
            min_intensity: Some("0".into()),
            ..Default::default()
        };
        assert_eq!(
            FilterState::try_from(zero),
            Err(FilterError::InvalidIntensity("0".into()))
        );

        let one = FilterForm {
            min_intensity: Some(" 1 ".into()),
            ..Default::default()
        };
        assert_eq!(FilterState::try_from(one).unwrap().min_intensity, Some(1));
    }

    #[test]
    fn trend_group_leads_the_query() {
        assert_eq!(TrendGroup::Day.query(""), "group=day");
        assert_eq!(TrendGroup::Week.query("sector=North"), "group=week&sector=North");
    }

    #[test]
    fn sort_parsing() {
        assert_eq!(SortField::parse("intensity"), Some(SortField::Intensity));
        assert_eq!(SortField::parse("bogus"), None);
        assert_eq!(SortOrder::parse(" ASC "), Some(SortOrder::Asc));
        assert_eq!(SortOrder::default().as_str(), "desc");
    }
}
