use serde::{Deserialize, Serialize};
use std::fmt;

/// Named points of the cleaning chain, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Raw,
    GiTmAdjusted,
    OutlierRemoved,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Raw, Stage::GiTmAdjusted, Stage::OutlierRemoved];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::GiTmAdjusted => "gi_tm_adjusted",
            Stage::OutlierRemoved => "outlier_removed",
        }
    }

    /// The stage this one is derived from.
    pub fn previous(&self) -> Option<Stage> {
        match self {
            Stage::Raw => None,
            Stage::GiTmAdjusted => Some(Stage::Raw),
            Stage::OutlierRemoved => Some(Stage::GiTmAdjusted),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
