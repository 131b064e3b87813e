//! Main curation pipeline.
//!
//! This module provides the `Pipeline` struct and its builder, which run
//! type inference, dispatch, checks and remediation in order.

use crate::config::{ConfigValidationError, CuratorConfig};
use crate::decisions::RuleBasedDispatcher;
use crate::error::{CuratorError, Result};
use crate::imputers::FittedImputer;
use crate::ledger::ProcessingLedger;
use crate::pipeline::{DataChecker, DataProcessor};
use crate::profiler::DataProfiler;
use crate::quality::DataChecks;
use crate::reader::{DataFiles, DataReader};
use crate::reporting::ReportGenerator;
use crate::types::{DatasetCollection, Metadata};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one curation run produces.
#[derive(Debug, Clone)]
pub struct CurationResult {
    /// Remediated datasets.
    pub data: DatasetCollection,
    pub metadata: Metadata,
    pub checks: DataChecks,
    pub ledger: ProcessingLedger,
    /// Imputers fitted on the main dataset.
    pub imputers: Vec<FittedImputer>,
    /// Files written by the run, empty unless outputs are enabled.
    pub written_files: Vec<PathBuf>,
}

/// The curation pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use data_curator::{CuratorConfig, DataFiles, Pipeline};
///
/// let files = DataFiles::from_filenames(&["train.csv", "test.csv"])?;
/// let result = Pipeline::builder()
///     .config(CuratorConfig::builder().target_column("label").build()?)
///     .build()?
///     .run_files(&files)?;
///
/// println!("learning type: {:?}", result.metadata.learning_type);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CuratorConfig,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &CuratorConfig {
        &self.config
    }

    /// Reader configured with this pipeline's target settings.
    pub fn reader(&self) -> DataReader {
        DataReader::new(
            self.config.no_target,
            self.config.target_column.clone(),
            self.config.cat_to_num_threshold,
        )
    }

    /// Infer dtypes, choose the learning type and run the checks.
    ///
    /// The datasets are only read. `metadata` must come from a reader built
    /// with this pipeline's threshold.
    pub fn check(
        &self,
        data: &DatasetCollection,
        metadata: Metadata,
    ) -> Result<(Metadata, DataChecks)> {
        if metadata.cat_to_num_threshold != self.config.cat_to_num_threshold {
            return Err(CuratorError::InvalidConfig(format!(
                "metadata threshold {} does not match pipeline threshold {}",
                metadata.cat_to_num_threshold, self.config.cat_to_num_threshold
            )));
        }

        info!("Step 1: Inferring feature dtypes...");
        let metadata = DataProfiler::annotate(data, metadata)?;

        info!("Step 2: Determining learning type...");
        let main = data.require(metadata.main_data_key)?;
        let metadata =
            RuleBasedDispatcher::new(metadata.cat_to_num_threshold).dispatch(main, metadata)?;

        info!("Step 3: Running data checks...");
        DataChecker::new(data)?.run(metadata)
    }

    /// Run checks and remediation over already established datasets.
    pub fn run(&self, data: DatasetCollection, metadata: Metadata) -> Result<CurationResult> {
        let start_time = Instant::now();
        info!("Starting curation pipeline...");

        let (metadata, checks) = self.check(&data, metadata)?;

        info!("Step 4: Remediating datasets...");
        let processed =
            DataProcessor::new(self.config.params()).run(data, &metadata, &checks)?;

        info!(
            "Curation pipeline completed in {}ms",
            start_time.elapsed().as_millis()
        );
        Ok(CurationResult {
            data: processed.data,
            metadata,
            checks,
            ledger: processed.ledger,
            imputers: processed.imputers,
            written_files: Vec::new(),
        })
    }

    /// Normalize in-memory frames, establish columns and run the pipeline.
    ///
    /// Nothing is written to disk.
    pub fn curate_frames(&self, data: DatasetCollection) -> Result<CurationResult> {
        let (data, metadata) = self.reader().load_frames(data)?;
        self.run(data, metadata)
    }

    /// Read the data files, run the pipeline and write the outputs.
    pub fn run_files(&self, files: &DataFiles) -> Result<CurationResult> {
        let (data, metadata) = self.reader().read(files)?;
        let mut result = self.run(data, metadata)?;

        if self.config.write_outputs {
            result.written_files = self.reporter(files).write_all(&mut result)?;
        } else {
            debug!("output writing disabled");
        }
        Ok(result)
    }

    /// Read the data files and run only the checks.
    ///
    /// Writes the metadata and check outputs when outputs are enabled.
    pub fn check_files(&self, files: &DataFiles) -> Result<(Metadata, DataChecks)> {
        let (data, metadata) = self.reader().read(files)?;
        let (metadata, checks) = self.check(&data, metadata)?;

        if self.config.write_outputs {
            self.reporter(files).write_check_outputs(&metadata, &checks)?;
        }
        Ok((metadata, checks))
    }

    fn reporter(&self, files: &DataFiles) -> ReportGenerator {
        let output_dir = self
            .config
            .output_dir
            .clone()
            .unwrap_or_else(|| files.data_folder());
        ReportGenerator::new(output_dir, self.config.flatten_check_matrices)
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<CuratorConfig>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: CuratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(Pipeline { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::ColumnStatus;
    use crate::types::{DataKey, LearningType};
    use polars::prelude::*;

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().cat_to_num_threshold, 100);
        assert!(pipeline.config().write_outputs);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = CuratorConfig {
            cat_to_num_threshold: 0,
            ..CuratorConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_check_leaves_data_untouched() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [1, 1, 1],
        ]
        .unwrap();
        let config = CuratorConfig::builder().no_target(true).build().unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let (data, metadata) = pipeline
            .reader()
            .load_frames(DatasetCollection::Total(df))
            .unwrap();
        let (metadata, checks) = pipeline.check(&data, metadata).unwrap();

        assert_eq!(metadata.learning_type, Some(LearningType::Unsupervised));
        assert!(checks.fail_count() > 0);
        assert_eq!(data.get(DataKey::Total).unwrap().width(), 2);
    }

    #[test]
    fn test_check_rejects_foreign_threshold() {
        let df = df!["a" => [1.0, 2.0, 3.0]].unwrap();
        let config = CuratorConfig::builder().no_target(true).build().unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let (data, mut metadata) = pipeline
            .reader()
            .load_frames(DatasetCollection::Total(df))
            .unwrap();
        metadata.cat_to_num_threshold = 5;

        let err = pipeline.check(&data, metadata).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_curate_frames_end_to_end() {
        let train = df![
            "id" => [7, 7, 7, 7],
            "x" => [Some(1.0), None, Some(3.0), Some(5.0)],
            "y" => ["a", "b", "a", "b"],
        ]
        .unwrap();
        let test = df![
            "id" => [1, 2],
            "x" => [2.0, 4.0],
            "y" => ["b", "a"],
        ]
        .unwrap();
        let config = CuratorConfig::builder()
            .target_column("y")
            .write_outputs(false)
            .build()
            .unwrap();
        let pipeline = Pipeline::builder().config(config).build().unwrap();

        let result = pipeline
            .curate_frames(DatasetCollection::TrainTest { train, test })
            .unwrap();

        assert_eq!(result.metadata.learning_type, Some(LearningType::Classification));
        assert_eq!(
            result.ledger.status(DataKey::Test, "id"),
            Some(ColumnStatus::RemovedCriticalCardinality)
        );
        assert_eq!(
            result.ledger.status(DataKey::Train, "x"),
            Some(ColumnStatus::Imputed)
        );
        assert!(result.written_files.is_empty());
    }
}
