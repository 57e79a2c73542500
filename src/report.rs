// report.rs

use serde::Serialize;

use crate::aggregate::Summary;
use crate::filter::{Cascade, Dimension};
use crate::layers::{LayerKind, MapView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub dimension: &'static str,
    pub offered: Vec<String>,
    pub selected: Vec<String>,
}

/// Machine-readable snapshot of one filter state, printed by `summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub filters: Vec<FilterReport>,
    #[serde(flatten)]
    pub summary: Summary,
    pub habitations_shown: usize,
}

impl Report {
    pub fn new(cascade: &Cascade<'_>, view: &MapView<'_>) -> Self {
        let filters = Dimension::ORDER
            .into_iter()
            .map(|dimension| FilterReport {
                dimension: dimension.label(),
                offered: cascade.offered(dimension).to_vec(),
                selected: cascade
                    .selected(dimension)
                    .map(|values| values.iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect();
        Report {
            filters,
            summary: view.summary,
            habitations_shown: view
                .layer(LayerKind::Habitations)
                .map_or(0, |layer| layer.features.len()),
        }
    }
}
