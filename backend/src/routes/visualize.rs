use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::algorithms::Describe;
use crate::error::PipelineWarning;
use crate::models::{DataId, Stage};
use crate::preprocessing::PipelineMetadata;

// =========================================================
// Visualization types + route
// =========================================================

/// Per-column histogram: `bins` holds the `n + 1` edges, `counts` the `n`
/// bin counts. Both are empty for an empty column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Aligned coordinates of one ordered column pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterPair {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Per-point outlier flag, present when the stage carries a mask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlier: Option<Vec<bool>>,
}

/// Scatter pairs keyed `"<x>__<y>"` plus per-column histograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScatterMatrix {
    pub variables: Vec<String>,
    pub pairs: BTreeMap<String, ScatterPair>,
    pub hist: BTreeMap<String, Histogram>,
}

impl ScatterMatrix {
    pub fn pair_key(x: &str, y: &str) -> String {
        format!("{}__{}", x, y)
    }

    pub fn pair(&self, x: &str, y: &str) -> Option<&ScatterPair> {
        self.pairs.get(&Self::pair_key(x, y))
    }
}

/// Five-number summary of one calendar bucket. Empty buckets have
/// `count == 0` and every statistic `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub count: usize,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub whisker_low: Option<f64>,
    pub whisker_high: Option<f64>,
    #[serde(default)]
    pub outliers: Vec<f64>,
}

impl GroupSummary {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Calendar-complete box plot: one entry per bucket label.
pub type BoxPlotGroups = BTreeMap<u32, GroupSummary>;

/// Pearson correlation matrix; `None` where undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationHeatmap {
    pub variables: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

impl CorrelationHeatmap {
    pub fn get(&self, x: &str, y: &str) -> Option<f64> {
        let i = self.variables.iter().position(|v| v == x)?;
        let j = self.variables.iter().position(|v| v == y)?;
        self.matrix.get(i)?.get(j).copied().flatten()
    }
}

/// Derived statistics of one stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageArtifacts {
    pub scatter_matrix: ScatterMatrix,
    pub boxplot_by_month: BoxPlotGroups,
    pub boxplot_by_day: BoxPlotGroups,
    pub boxplot_by_hour: BoxPlotGroups,
    pub correlation_heatmap_full: CorrelationHeatmap,
}

/// One stage as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageView {
    pub stage: Stage,
    pub rows: usize,
    pub no_data: bool,
    #[serde(flatten)]
    pub artifacts: StageArtifacts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagesView {
    pub raw: StageView,
    pub gi_tm_adjusted: StageView,
    pub outlier_removed: StageView,
}

/// Complete `GET /visualize` payload.
#[derive(Debug, Clone, Serialize)]
pub struct VisualizeData {
    pub data_id: DataId,
    pub stages: StagesView,
    /// Aligned with `stages.gi_tm_adjusted`; `true` marks removed records.
    pub outlier_mask: Vec<bool>,
    pub columns: Vec<String>,
    pub stats: BTreeMap<String, Describe>,
    pub sample: Vec<Map<String, Value>>,
    pub warnings: Vec<PipelineWarning>,
    pub metadata: PipelineMetadata,
}

/// Query string of `GET /visualize`.
///
/// `remove_outliers` is the switch older clients send: it stands in for
/// `apply_outlier` when that is absent, and `apply_gi_tm` defaults to
/// whatever `apply_outlier` resolves to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizeQuery {
    pub data_id: DataId,
    #[serde(default)]
    pub remove_outliers: Option<bool>,
    #[serde(default)]
    pub apply_gi_tm: Option<bool>,
    #[serde(default)]
    pub apply_outlier: Option<bool>,
    #[serde(default)]
    pub outlier_method: Option<String>,
    #[serde(default)]
    pub iqr_factor: Option<f64>,
    #[serde(default)]
    pub zscore_threshold: Option<f64>,
    #[serde(default)]
    pub isolation_contamination: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub bins: Option<usize>,
    /// Overrides the unit stored with the dataset.
    #[serde(default)]
    pub irradiance_unit: Option<String>,
}

impl VisualizeQuery {
    pub fn new(data_id: DataId) -> Self {
        Self {
            data_id,
            ..Default::default()
        }
    }

    /// Resolved `(apply_gi_tm, apply_outlier)`.
    pub fn stage_flags(&self) -> (bool, bool) {
        let apply_outlier = self
            .apply_outlier
            .or(self.remove_outliers)
            .unwrap_or(false);
        let apply_gi_tm = self.apply_gi_tm.unwrap_or(apply_outlier);
        (apply_gi_tm, apply_outlier)
    }
}

/// Route path for stage visualization
pub const VISUALIZE_PATH: &str = "/visualize";
/// Path kept for clients of the per-site variant
pub const VISUALIZE_SITE_DATA_PATH: &str = "/visualize/site-data";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_remove_outliers_flag() {
        let mut query = VisualizeQuery::new(DataId(1));
        assert_eq!(query.stage_flags(), (false, false));

        query.remove_outliers = Some(true);
        assert_eq!(query.stage_flags(), (true, true));

        query.apply_gi_tm = Some(false);
        assert_eq!(query.stage_flags(), (false, true));

        query.apply_outlier = Some(false);
        assert_eq!(query.stage_flags(), (false, false));
    }

    #[test]
    fn test_pair_key_orientation() {
        assert_eq!(ScatterMatrix::pair_key("GI", "EAC"), "GI__EAC");
        assert_ne!(
            ScatterMatrix::pair_key("GI", "EAC"),
            ScatterMatrix::pair_key("EAC", "GI")
        );
    }

    #[test]
    fn test_boxplot_keys_serialize_as_strings() {
        let mut groups = BoxPlotGroups::new();
        groups.insert(3, GroupSummary::default());
        let json = serde_json::to_value(&groups).unwrap();
        assert_eq!(json["3"]["count"], 0);
        assert!(json["3"]["median"].is_null());
    }

    #[test]
    fn test_correlation_lookup() {
        let heatmap = CorrelationHeatmap {
            variables: vec!["EAC".into(), "GI".into()],
            matrix: vec![vec![Some(1.0), Some(0.8)], vec![Some(0.8), Some(1.0)]],
        };
        assert_eq!(heatmap.get("GI", "EAC"), Some(0.8));
        assert_eq!(heatmap.get("TM", "EAC"), None);
    }

    #[test]
    fn test_stage_view_flattens_artifacts() {
        let view = StageView {
            stage: Stage::Raw,
            rows: 0,
            no_data: true,
            artifacts: StageArtifacts::default(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["stage"], "raw");
        assert!(json.get("scatter_matrix").is_some());
        assert!(json.get("boxplot_by_hour").is_some());
    }
}
