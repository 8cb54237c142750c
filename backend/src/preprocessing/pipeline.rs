//! Stage pipeline: `raw -> gi_tm_adjusted -> outlier_removed`.
//!
//! [`StagePipeline`] applies the GI/TM adjustment and the outlier detector in
//! order and attaches histograms, scatter pairs and box plots to every stage.
//! Options are checked up front so an invalid request fails before any work.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::adjustment::{adjust_gi_tm, TmFill};
use crate::algorithms::{detect_records, CombineMode, Detection, OutlierPolicy};
use crate::api::{CorrelationHeatmap, StageArtifacts, StageView};
use crate::error::{push_warning, CleaningError, CleaningResult, PipelineWarning};
use crate::models::{Column, Dataset, IrradianceUnit, Stage};
use crate::services::aggregates::{compute_stage_artifacts, correlation_matrix, ArtifactOptions};

/// Upper bound on histogram bins per column.
pub const MAX_HISTOGRAM_BINS: usize = 1000;

/// Caller-selected options of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub apply_gi_tm: bool,
    pub apply_outlier: bool,
    pub policy: OutlierPolicy,
    /// Columns the outlier detector runs against.
    pub outlier_columns: Vec<Column>,
    pub combine: CombineMode,
    pub tm_fill: TmFill,
    pub bins: usize,
    pub box_column: Column,
    /// Unit the dataset's GI is stored in.
    pub irradiance_unit: IrradianceUnit,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            apply_gi_tm: false,
            apply_outlier: false,
            policy: OutlierPolicy::None,
            outlier_columns: Column::MONITORED.to_vec(),
            combine: CombineMode::Any,
            tm_fill: TmFill::ForwardBackward,
            bins: 15,
            box_column: Column::Eac,
            irradiance_unit: IrradianceUnit::KwhPerM2,
        }
    }
}

impl PipelineOptions {
    /// Reject impossible stage orders and bad parameters before any work.
    pub fn validate(&self) -> CleaningResult<()> {
        if self.apply_outlier && !self.apply_gi_tm {
            return Err(CleaningError::StageOrder {
                requested: Stage::OutlierRemoved.name(),
                missing: Stage::GiTmAdjusted.name(),
            });
        }
        if self.bins == 0 || self.bins > MAX_HISTOGRAM_BINS {
            return Err(CleaningError::invalid_parameter(
                "bins",
                format!("must be between 1 and {}", MAX_HISTOGRAM_BINS),
            ));
        }
        if self.apply_outlier {
            self.policy.validate()?;
        }
        Ok(())
    }

    /// The policy that actually runs: `None` unless outlier removal is on.
    pub fn effective_policy(&self) -> OutlierPolicy {
        if self.apply_outlier {
            self.policy
        } else {
            OutlierPolicy::None
        }
    }
}

/// Parameters and counters attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub irradiance_unit: IrradianceUnit,
    pub factor_to_kwh: f64,
    pub policy: OutlierPolicy,
    pub apply_gi_tm: bool,
    pub apply_outlier: bool,
    pub tm_fill: TmFill,
    pub bins: usize,
    pub whisker_factor: f64,
    pub dropped_zero_gi: usize,
    pub imputed_tm: usize,
    pub removed_outliers: usize,
}

/// A stage's dataset with its derived statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSnapshot {
    pub stage: Stage,
    pub dataset: Dataset,
    /// Set when filtering left no records.
    pub no_data: bool,
    pub artifacts: StageArtifacts,
}

impl StageSnapshot {
    pub fn view(&self) -> StageView {
        StageView {
            stage: self.stage,
            rows: self.dataset.len(),
            no_data: self.no_data,
            artifacts: self.artifacts.clone(),
        }
    }
}

/// The three snapshots of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSet {
    pub raw: StageSnapshot,
    pub gi_tm_adjusted: StageSnapshot,
    pub outlier_removed: StageSnapshot,
    /// Aligned index-for-index with `gi_tm_adjusted`.
    pub outlier_mask: Vec<bool>,
    pub warnings: Vec<PipelineWarning>,
    pub metadata: PipelineMetadata,
}

impl StageSet {
    pub fn stage(&self, stage: Stage) -> &StageSnapshot {
        match stage {
            Stage::Raw => &self.raw,
            Stage::GiTmAdjusted => &self.gi_tm_adjusted,
            Stage::OutlierRemoved => &self.outlier_removed,
        }
    }

    pub fn removed_count(&self) -> usize {
        self.outlier_mask.iter().filter(|&&m| m).count()
    }
}

/// Staged cleaning pipeline: `raw -> gi_tm_adjusted -> outlier_removed`.
///
/// Stateless; the same input and options always give the same [`StageSet`].
pub struct StagePipeline {
    options: PipelineOptions,
}

impl StagePipeline {
    /// Create a pipeline with default options (no cleaning)
    pub fn new() -> Self {
        Self {
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run every stage over `raw` and compute each stage's statistics.
    ///
    /// # Errors
    ///
    /// [`CleaningError::StageOrder`] when outlier removal is requested without
    /// the GI/TM step, [`CleaningError::InvalidParameter`] for bad bins or
    /// policy parameters. Both are raised before any computation.
    pub fn compute_stages(&self, raw: &Dataset) -> CleaningResult<StageSet> {
        let started = Instant::now();
        self.options.validate()?;
        let policy = self.options.effective_policy();
        let mut warnings = Vec::new();

        // Step 1: GI/TM adjustment
        let (adjusted, dropped_zero_gi, imputed_tm) = if self.options.apply_gi_tm {
            let adjustment = adjust_gi_tm(raw, self.options.tm_fill);
            for w in adjustment.warnings {
                push_warning(&mut warnings, w);
            }
            (adjustment.dataset, adjustment.dropped_zero_gi, adjustment.imputed_tm)
        } else {
            (raw.clone(), 0, 0)
        };

        // Step 2: outlier detection against the adjusted stage
        let detection = self.detect(&adjusted)?;
        for w in detection.warnings.iter().cloned() {
            push_warning(&mut warnings, w);
        }
        let outlier_mask = detection.mask;
        let removed = adjusted.without_masked(&outlier_mask);

        // Step 3: derived statistics
        let (correlation, corr_warnings) = correlation_matrix(raw);
        for w in corr_warnings {
            push_warning(&mut warnings, w);
        }
        let artifact_options = ArtifactOptions {
            bins: self.options.bins,
            whisker_factor: policy.whisker_factor(),
            box_column: self.options.box_column,
        };
        let adjusted_mask = self.options.apply_outlier.then_some(outlier_mask.as_slice());

        let raw_stage = self.snapshot(
            Stage::Raw,
            raw.clone(),
            None,
            &correlation,
            &artifact_options,
            &mut warnings,
        );
        let adjusted_stage = self.snapshot(
            Stage::GiTmAdjusted,
            adjusted,
            adjusted_mask,
            &correlation,
            &artifact_options,
            &mut warnings,
        );
        let removed_stage = self.snapshot(
            Stage::OutlierRemoved,
            removed,
            None,
            &correlation,
            &artifact_options,
            &mut warnings,
        );

        let removed_outliers = outlier_mask.iter().filter(|&&m| m).count();
        log::debug!(
            "Pipeline stages: raw={} gi_tm_adjusted={} outlier_removed={} ({} in {:?})",
            raw_stage.dataset.len(),
            adjusted_stage.dataset.len(),
            removed_stage.dataset.len(),
            policy,
            started.elapsed()
        );

        Ok(StageSet {
            raw: raw_stage,
            gi_tm_adjusted: adjusted_stage,
            outlier_removed: removed_stage,
            outlier_mask,
            warnings,
            metadata: PipelineMetadata {
                irradiance_unit: self.options.irradiance_unit,
                factor_to_kwh: self.options.irradiance_unit.factor_to_kwh(),
                policy,
                apply_gi_tm: self.options.apply_gi_tm,
                apply_outlier: self.options.apply_outlier,
                tm_fill: self.options.tm_fill,
                bins: self.options.bins,
                whisker_factor: policy.whisker_factor(),
                dropped_zero_gi,
                imputed_tm,
                removed_outliers,
            },
        })
    }

    /// Only the `outlier_removed` dataset and its mask, for callers that
    /// persist the result without its statistics.
    pub fn outlier_removed(&self, raw: &Dataset) -> CleaningResult<(Dataset, Vec<bool>)> {
        self.options.validate()?;
        let adjusted = if self.options.apply_gi_tm {
            adjust_gi_tm(raw, self.options.tm_fill).dataset
        } else {
            raw.clone()
        };
        let detection = self.detect(&adjusted)?;
        let removed = adjusted.without_masked(&detection.mask);
        Ok((removed, detection.mask))
    }

    fn detect(&self, adjusted: &Dataset) -> CleaningResult<Detection> {
        if !self.options.apply_outlier {
            return Ok(Detection::clear(adjusted.len()));
        }
        detect_records(
            adjusted,
            &self.options.outlier_columns,
            self.options.combine,
            &self.options.policy,
        )
    }

    fn snapshot(
        &self,
        stage: Stage,
        dataset: Dataset,
        mask: Option<&[bool]>,
        correlation: &CorrelationHeatmap,
        options: &ArtifactOptions,
        warnings: &mut Vec<PipelineWarning>,
    ) -> StageSnapshot {
        let no_data = dataset.is_empty();
        if no_data {
            push_warning(warnings, PipelineWarning::EmptyStage { stage });
        }
        let artifacts = compute_stage_artifacts(&dataset, mask, correlation, options);
        StageSnapshot {
            stage,
            dataset,
            no_data,
            artifacts,
        }
    }
}

impl Default for StagePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to run the pipeline once
pub fn compute_stages(raw: &Dataset, options: &PipelineOptions) -> CleaningResult<StageSet> {
    StagePipeline::with_options(options.clone()).compute_stages(raw)
}
