// filter.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::model::{HabitationRecord, RoadRecord, Table};

/// A road attribute the dashboard filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    AdminUnit,
    Scheme,
    Classification,
}

impl Dimension {
    /// Cascade order: each dimension's options come from the roads left
    /// over by the ones before it.
    pub const ORDER: [Dimension; 3] = [
        Dimension::AdminUnit,
        Dimension::Scheme,
        Dimension::Classification,
    ];

    pub fn value(self, road: &RoadRecord) -> Option<&str> {
        match self {
            Dimension::AdminUnit => road.unit.as_deref(),
            Dimension::Scheme => road.scheme.as_deref(),
            Dimension::Classification => road.classification.as_deref(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Dimension::AdminUnit => "Taluka",
            Dimension::Scheme => "Scheme",
            Dimension::Classification => "Connected To",
        }
    }

    pub fn choice(self) -> Choice {
        match self {
            Dimension::AdminUnit => Choice::Single,
            Dimension::Scheme | Dimension::Classification => Choice::Multi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Single,
    Multi,
}

impl Choice {
    /// Widget default for a fresh option list: first entry for single
    /// choice, everything for multi choice.
    pub fn default_selection(self, offered: &[String]) -> BTreeSet<String> {
        match self {
            Choice::Single => offered.first().cloned().into_iter().collect(),
            Choice::Multi => offered.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub dimension: Dimension,
    pub choice: Choice,
    pub selected: BTreeSet<String>,
    /// Options offered on the last [`FilterPipeline::sync`].
    offered: Vec<String>,
}

impl Stage {
    pub fn new(dimension: Dimension) -> Self {
        Stage {
            dimension,
            choice: dimension.choice(),
            selected: BTreeSet::new(),
            offered: Vec::new(),
        }
    }

    pub fn with_selection<I, S>(dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Stage {
            selected: values.into_iter().map(Into::into).collect(),
            ..Stage::new(dimension)
        }
    }

    pub fn offered(&self) -> &[String] {
        &self.offered
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selected.contains(value)
    }
}

/// Sorted, de-duplicated, non-missing values of `dimension` across `pool`.
pub fn offered_values(dimension: Dimension, pool: &[&RoadRecord]) -> Vec<String> {
    pool.iter()
        .filter_map(|road| dimension.value(road))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Roads from `pool` whose `dimension` value is in `selected`. Roads
/// missing the value never match, and an empty selection matches nothing.
pub fn apply_stage<'a>(
    dimension: Dimension,
    selected: &BTreeSet<String>,
    pool: &[&'a RoadRecord],
) -> Vec<&'a RoadRecord> {
    pool.iter()
        .copied()
        .filter(|road| dimension.value(road).is_some_and(|v| selected.contains(v)))
        .collect()
}

#[derive(Debug, Clone)]
pub struct StageResult<'a> {
    pub dimension: Dimension,
    pub selected: BTreeSet<String>,
    pub offered: Vec<String>,
    pub output: Vec<&'a RoadRecord>,
}

/// Per-stage outcome of one pipeline evaluation.
#[derive(Debug, Clone)]
pub struct Cascade<'a> {
    base: Vec<&'a RoadRecord>,
    pub stages: Vec<StageResult<'a>>,
}

impl<'a> Cascade<'a> {
    /// Roads surviving every stage.
    pub fn roads(&self) -> &[&'a RoadRecord] {
        self.stages.last().map_or(&self.base, |stage| &stage.output)
    }

    pub fn selected(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.stages
            .iter()
            .find(|stage| stage.dimension == dimension)
            .map(|stage| &stage.selected)
    }

    pub fn offered(&self, dimension: Dimension) -> &[String] {
        self.stages
            .iter()
            .find(|stage| stage.dimension == dimension)
            .map(|stage| stage.offered.as_slice())
            .unwrap_or(&[])
    }
}

/// Ordered stages over an immutable road collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl FilterPipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        FilterPipeline { stages }
    }

    /// Unit, then scheme, then connecting-road class; nothing selected yet.
    pub fn standard() -> Self {
        Self::new(Dimension::ORDER.into_iter().map(Stage::new).collect())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, dimension: Dimension) -> Option<&Stage> {
        self.stages.iter().find(|s| s.dimension == dimension)
    }

    fn stage_mut(&mut self, dimension: Dimension) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.dimension == dimension)
    }

    pub fn selected(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        self.stage(dimension).map(|s| &s.selected)
    }

    pub fn select<I, S>(&mut self, dimension: Dimension, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(stage) = self.stage_mut(dimension) {
            stage.selected = values.into_iter().map(Into::into).collect();
        }
    }

    /// Single choice replaces the selection; multi choice flips membership.
    pub fn toggle(&mut self, dimension: Dimension, value: &str) {
        let Some(stage) = self.stage_mut(dimension) else {
            return;
        };
        match stage.choice {
            Choice::Single => {
                stage.selected.clear();
                stage.selected.insert(value.to_string());
            }
            Choice::Multi => {
                if !stage.selected.remove(value) {
                    stage.selected.insert(value.to_string());
                }
            }
        }
    }

    /// Selects every offered option, or clears the list if all are
    /// already selected. No-op for single choice.
    pub fn toggle_all(&mut self, dimension: Dimension) {
        let Some(stage) = self.stage_mut(dimension) else {
            return;
        };
        if stage.choice == Choice::Single {
            return;
        }
        let all_selected = stage.offered.iter().all(|v| stage.selected.contains(v));
        if all_selected {
            stage.selected.clear();
        } else {
            stage.selected = stage.offered.iter().cloned().collect();
        }
    }

    /// Applies requested selections in cascade order. A dimension with no
    /// requested values keeps its default for the options left by the
    /// dimensions before it.
    pub fn from_requests(roads: &[RoadRecord], requests: &[(Dimension, Vec<String>)]) -> Self {
        let mut pipeline = Self::standard();
        for dimension in Dimension::ORDER {
            pipeline.sync(roads);
            let requested = requests
                .iter()
                .filter(|(d, values)| *d == dimension && !values.is_empty())
                .flat_map(|(_, values)| values.iter().cloned());
            let mut requested = requested.peekable();
            if requested.peek().is_some() {
                pipeline.select(dimension, requested);
            }
        }
        pipeline.sync(roads);
        pipeline
    }

    /// Runs the cascade without touching any selection.
    pub fn evaluate<'a>(&self, roads: &'a [RoadRecord]) -> Cascade<'a> {
        self.clone().run(roads, false)
    }

    /// Runs the cascade, resetting a stage to its default selection when
    /// the options it is offered differ from last time. Unchanged option
    /// lists keep whatever the user picked, including nothing.
    pub fn sync<'a>(&mut self, roads: &'a [RoadRecord]) -> Cascade<'a> {
        self.run(roads, true)
    }

    fn run<'a>(&mut self, roads: &'a [RoadRecord], reset_changed: bool) -> Cascade<'a> {
        let base: Vec<&RoadRecord> = roads.iter().collect();
        let mut pool = base.clone();
        let mut results = Vec::with_capacity(self.stages.len());
        for stage in &mut self.stages {
            let offered = offered_values(stage.dimension, &pool);
            if reset_changed && offered != stage.offered {
                stage.selected = stage.choice.default_selection(&offered);
                stage.offered = offered.clone();
                debug!(
                    dimension = stage.dimension.label(),
                    offered = offered.len(),
                    "filter options changed, selection reset"
                );
            }
            let output = apply_stage(stage.dimension, &stage.selected, &pool);
            pool = output.clone();
            results.push(StageResult {
                dimension: stage.dimension,
                selected: stage.selected.clone(),
                offered,
                output,
            });
        }
        Cascade {
            base,
            stages: results,
        }
    }
}

/// Habitations in the selected units. Falls back to the whole set when the
/// habitation table has no unit column to join on.
pub fn narrow_habitations<'a>(
    habitations: &'a Table<HabitationRecord>,
    unit_column: &str,
    selected_units: &BTreeSet<String>,
) -> Vec<&'a HabitationRecord> {
    if !habitations.has_column(unit_column) {
        return habitations.iter().collect();
    }
    habitations
        .iter()
        .filter(|hab| hab.unit.as_deref().is_some_and(|u| selected_units.contains(u)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{MapColor, Style, scheme_style};

    fn road(unit: Option<&str>, scheme: Option<&str>, class: Option<&str>) -> RoadRecord {
        RoadRecord {
            unit: unit.map(str::to_string),
            scheme: scheme.map(str::to_string),
            classification: class.map(str::to_string),
            ..RoadRecord::default()
        }
    }

    fn roads() -> Vec<RoadRecord> {
        vec![
            road(Some("Haveli"), Some("PMGSY"), Some("SH")),
            road(Some("Haveli"), Some("PMGSY"), Some("ODR")),
            road(Some("Haveli"), Some("MMGSY"), Some("MDR")),
            road(Some("Haveli"), None, Some("NH")),
            road(Some("Mulshi"), Some("Proposed"), Some("VR")),
            road(Some("Mulshi"), Some("PMGSY"), None),
            road(None, Some("PMGSY"), Some("SH")),
        ]
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn options_are_sorted_and_skip_missing() {
        let roads = roads();
        let pool: Vec<&RoadRecord> = roads.iter().collect();
        assert_eq!(offered_values(Dimension::AdminUnit, &pool), vec!["Haveli", "Mulshi"]);
        assert_eq!(
            offered_values(Dimension::Scheme, &pool),
            vec!["MMGSY", "PMGSY", "Proposed"]
        );
    }

    #[test]
    fn haveli_pmgsy_scenario() {
        let roads = roads();
        let mut pipeline = FilterPipeline::standard();
        pipeline.sync(&roads);
        pipeline.select(Dimension::AdminUnit, ["Haveli"]);
        pipeline.sync(&roads);
        pipeline.select(Dimension::Scheme, ["PMGSY"]);
        let cascade = pipeline.sync(&roads);

        assert_eq!(cascade.offered(Dimension::Classification), ["ODR", "SH"]);
        assert_eq!(
            pipeline.selected(Dimension::Classification),
            Some(&set(&["ODR", "SH"]))
        );
        let filtered = cascade.roads();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.unit.as_deref() == Some("Haveli")
            && r.scheme.as_deref() == Some("PMGSY")));
        for road in filtered {
            assert_eq!(scheme_style(road.scheme.as_deref()), Style::new(MapColor::Blue, 3));
        }
    }

    #[test]
    fn evaluate_leaves_selections_alone() {
        let roads = roads();
        let mut pipeline = FilterPipeline::standard();
        let untouched = pipeline.clone();
        assert!(pipeline.evaluate(&roads).roads().is_empty());
        assert_eq!(pipeline, untouched);

        let cascade = pipeline.sync(&roads);
        assert_ne!(pipeline, untouched);
        assert_eq!(cascade.roads().len(), 3);
        assert_eq!(pipeline.evaluate(&roads).roads().len(), 3);
    }

    #[test]
    fn empty_selection_yields_nothing() {
        let roads = roads();
        let mut pipeline = FilterPipeline::standard();
        pipeline.sync(&roads);
        pipeline.select(Dimension::Scheme, Vec::<String>::new());
        let cascade = pipeline.sync(&roads);
        assert!(cascade.roads().is_empty());
        assert!(cascade.offered(Dimension::Classification).is_empty());
        // cleared selection survives a re-sync
        assert!(pipeline.selected(Dimension::Scheme).unwrap().is_empty());
    }

    #[test]
    fn missing_values_never_match() {
        let roads = roads();
        let pool: Vec<&RoadRecord> = roads.iter().collect();
        let all_schemes = set(&["MMGSY", "PMGSY", "Proposed"]);
        let matched = apply_stage(Dimension::Scheme, &all_schemes, &pool);
        assert_eq!(matched.len(), 6);
    }

    #[test]
    fn evaluate_is_idempotent() {
        let roads = roads();
        let pipeline = FilterPipeline::new(vec![
            Stage::with_selection(Dimension::AdminUnit, ["Haveli"]),
            Stage::with_selection(Dimension::Scheme, ["PMGSY", "MMGSY"]),
            Stage::with_selection(Dimension::Classification, ["SH", "MDR"]),
        ]);
        let once: Vec<*const RoadRecord> =
            pipeline.evaluate(&roads).roads().iter().map(|r| *r as *const _).collect();
        let twice: Vec<*const RoadRecord> =
            pipeline.evaluate(&roads).roads().iter().map(|r| *r as *const _).collect();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);

        // feeding the output back through the same stages changes nothing
        let first = pipeline.evaluate(&roads);
        let refiltered: Vec<RoadRecord> = first.roads().iter().map(|r| (*r).clone()).collect();
        assert_eq!(pipeline.evaluate(&refiltered).roads().len(), first.roads().len());
    }

    #[test]
    fn narrowing_unit_never_grows_downstream_options() {
        let roads = roads();
        let wide = FilterPipeline::new(vec![
            Stage::with_selection(Dimension::AdminUnit, ["Haveli", "Mulshi"]),
            Stage::with_selection(Dimension::Scheme, ["MMGSY", "PMGSY", "Proposed"]),
            Stage::with_selection(Dimension::Classification, ["MDR", "NH", "ODR", "SH", "VR"]),
        ]);
        let mut narrow = wide.clone();
        narrow.select(Dimension::AdminUnit, ["Mulshi"]);

        let wide = wide.evaluate(&roads);
        let narrow = narrow.evaluate(&roads);
        for dim in [Dimension::Scheme, Dimension::Classification] {
            let wide_opts: BTreeSet<_> = wide.offered(dim).iter().collect();
            assert!(narrow.offered(dim).iter().all(|v| wide_opts.contains(v)), "{dim:?}");
        }
        assert!(narrow.roads().len() <= wide.roads().len());
    }

    #[test]
    fn sync_resets_only_changed_lists() {
        let roads = roads();
        let mut pipeline = FilterPipeline::standard();
        pipeline.sync(&roads);
        assert_eq!(pipeline.selected(Dimension::AdminUnit), Some(&set(&["Haveli"])));
        assert_eq!(
            pipeline.selected(Dimension::Scheme),
            Some(&set(&["MMGSY", "PMGSY"]))
        );

        pipeline.toggle(Dimension::Scheme, "MMGSY");
        pipeline.sync(&roads);
        assert_eq!(pipeline.selected(Dimension::Scheme), Some(&set(&["PMGSY"])));

        pipeline.toggle(Dimension::AdminUnit, "Mulshi");
        pipeline.sync(&roads);
        assert_eq!(pipeline.selected(Dimension::AdminUnit), Some(&set(&["Mulshi"])));
        assert_eq!(
            pipeline.selected(Dimension::Scheme),
            Some(&set(&["PMGSY", "Proposed"]))
        );
    }

    #[test]
    fn requests_apply_in_cascade_order() {
        let roads = roads();
        let pipeline = FilterPipeline::from_requests(
            &roads,
            &[
                (Dimension::Scheme, vec!["PMGSY".to_string()]),
                (Dimension::AdminUnit, vec!["Mulshi".to_string()]),
            ],
        );
        assert_eq!(pipeline.selected(Dimension::AdminUnit), Some(&set(&["Mulshi"])));
        assert_eq!(pipeline.selected(Dimension::Scheme), Some(&set(&["PMGSY"])));
        // the Mulshi PMGSY road has no class, so nothing is offered or kept
        let cascade = pipeline.evaluate(&roads);
        assert!(cascade.offered(Dimension::Classification).is_empty());
        assert!(cascade.roads().is_empty());

        let defaults = FilterPipeline::from_requests(&roads, &[]);
        assert_eq!(defaults.selected(Dimension::AdminUnit), Some(&set(&["Haveli"])));
        assert_eq!(defaults.evaluate(&roads).roads().len(), 3);
    }

    #[test]
    fn toggle_all_flips_between_everything_and_nothing() {
        let roads = roads();
        let mut pipeline = FilterPipeline::standard();
        pipeline.sync(&roads);
        pipeline.toggle_all(Dimension::Scheme);
        assert!(pipeline.selected(Dimension::Scheme).unwrap().is_empty());
        pipeline.toggle_all(Dimension::Scheme);
        assert_eq!(pipeline.selected(Dimension::Scheme).unwrap().len(), 2);

        pipeline.toggle_all(Dimension::AdminUnit);
        assert_eq!(pipeline.selected(Dimension::AdminUnit), Some(&set(&["Haveli"])));
    }

    #[test]
    fn habitations_narrow_by_unit() {
        let habs = Table::new(
            vec![
                HabitationRecord { unit: Some("Haveli".into()), ..Default::default() },
                HabitationRecord { unit: Some("Mulshi".into()), ..Default::default() },
                HabitationRecord::default(),
            ],
            set(&["THENAME", "HAB_NAME"]),
        );
        let narrowed = narrow_habitations(&habs, "THENAME", &set(&["Haveli"]));
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].unit.as_deref(), Some("Haveli"));
    }

    #[test]
    fn habitations_without_unit_column_are_unfiltered() {
        let habs = Table::new(
            vec![HabitationRecord::default(), HabitationRecord::default()],
            set(&["HAB_NAME", "TOT_POPULA"]),
        );
        assert_eq!(narrow_habitations(&habs, "THENAME", &set(&["Haveli"])).len(), 2);
        assert_eq!(narrow_habitations(&habs, "THENAME", &BTreeSet::new()).len(), 2);
    }
}
