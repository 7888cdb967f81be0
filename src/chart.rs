use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Doughnut,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Doughnut => "doughnut",
        }
    }
}

/// A live chart. Labels and values are parallel and keep server order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBinding {
    id: u64,
    kind: ChartKind,
    dataset_label: &'static str,
    labels: Vec<String>,
    values: Vec<f64>,
    revision: u32,
}

impl ChartBinding {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of redraws since creation.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Chart.js configuration for the client-side renderer.
    pub fn to_chartjs(&self) -> Value {
        json!({
            "type": self.kind.as_str(),
            "data": {
                "labels": self.labels,
                "datasets": [{ "label": self.dataset_label, "data": self.values }]
            },
            "options": {
                "responsive": true,
                "plugins": { "legend": { "display": true } }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartUpdate {
    Created(u64),
    Updated(u64),
}

/// Uninitialized until the first load, then bound for the life of the view.
#[derive(Debug, Clone)]
pub struct ChartSlot {
    kind: ChartKind,
    dataset_label: &'static str,
    binding: Option<ChartBinding>,
}

impl ChartSlot {
    pub fn new(kind: ChartKind, dataset_label: &'static str) -> Self {
        Self {
            kind,
            dataset_label,
            binding: None,
        }
    }

    pub fn trend() -> Self {
        Self::new(ChartKind::Line, "Incidents")
    }

    pub fn directions() -> Self {
        Self::new(ChartKind::Bar, "By directions")
    }

    pub fn types() -> Self {
        Self::new(ChartKind::Doughnut, "By event types")
    }

    pub fn binding(&self) -> Option<&ChartBinding> {
        self.binding.as_ref()
    }

    /// Creates the binding on first call; afterwards replaces its series in
    /// place and bumps the revision.
    pub fn set_series<I>(&mut self, points: I) -> ChartUpdate
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let (labels, values): (Vec<String>, Vec<f64>) = points.into_iter().unzip();

        match &mut self.binding {
            Some(b) => {
                b.labels = labels;
                b.values = values;
                b.revision += 1;
                ChartUpdate::Updated(b.id)
            }
            None => {
                let id = NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed);
                self.binding = Some(ChartBinding {
                    id,
                    kind: self.kind,
                    dataset_label: self.dataset_label,
                    labels,
                    values,
                    revision: 0,
                });
                ChartUpdate::Created(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(l, v)| (l.to_string(), *v)).collect()
    }

    #[test]
    fn second_load_updates_the_same_binding() {
        let mut slot = ChartSlot::trend();
        assert!(slot.binding().is_none());

        let first = slot.set_series(series(&[("2025-01-01", 2.0), ("2025-01-02", 5.0)]));
        let ChartUpdate::Created(id) = first else {
            panic!("expected creation, got {:?}", first);
        };

        let second = slot.set_series(series(&[("2025-02-01", 9.0)]));
        assert_eq!(second, ChartUpdate::Updated(id));

        let b = slot.binding().unwrap();
        assert_eq!(b.id(), id);
        assert_eq!(b.revision(), 1);
        assert_eq!(b.labels(), &["2025-02-01".to_string()]);
        assert_eq!(b.values(), &[9.0]);
    }

    #[test]
    fn server_order_is_preserved() {
        let mut slot = ChartSlot::directions();
        slot.set_series(series(&[("West", 1.0), ("East", 10.0), ("North", 4.0)]));
        let b = slot.binding().unwrap();
        assert_eq!(b.labels(), &["West", "East", "North"]);
        assert_eq!(b.values(), &[1.0, 10.0, 4.0]);
    }

    #[test]
    fn chartjs_config_shape() {
        let mut slot = ChartSlot::types();
        slot.set_series(series(&[("drone", 3.0)]));
        let cfg = slot.binding().unwrap().to_chartjs();
        assert_eq!(cfg["type"], "doughnut");
        assert_eq!(cfg["data"]["labels"][0], "drone");
        assert_eq!(cfg["data"]["datasets"][0]["label"], "By event types");
        assert_eq!(cfg["data"]["datasets"][0]["data"][0], 3.0);
    }
}
