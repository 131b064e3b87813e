use crate::error::Result;
use crate::imputers::FittedImputer;
use crate::ledger::ProcessingLedger;
use crate::pipeline::CurationResult;
use crate::quality::DataChecks;
use crate::types::{DataKey, DatasetCollection, Metadata};
use chrono::Local;
use polars::prelude::*;
use serde_json::{Map, Value, json};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

pub const META_FILE: &str = "data_checker_meta.json";
pub const CHECKER_OUTPUT_FILE: &str = "data_checker_output.json";
pub const PROCESSOR_OUTPUT_FILE: &str = "data_processor_output.json";

/// Writes the JSON outputs and processed datasets of a run.
pub struct ReportGenerator {
    output_dir: PathBuf,
    flatten_check_matrices: bool,
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf, flatten_check_matrices: bool) -> Self {
        Self {
            output_dir,
            flatten_check_matrices,
        }
    }

    /// Write every output of a finished run.
    pub fn write_all(&self, result: &mut CurationResult) -> Result<Vec<PathBuf>> {
        let mut written = self.write_check_outputs(&result.metadata, &result.checks)?;
        written.push(self.write_processor_output(&result.ledger, &result.imputers)?);
        written.extend(self.write_processed_datasets(&mut result.data, &result.metadata)?);
        Ok(written)
    }

    /// Write the metadata and check results.
    pub fn write_check_outputs(
        &self,
        metadata: &Metadata,
        checks: &DataChecks,
    ) -> Result<Vec<PathBuf>> {
        let meta_path = self.write_json(META_FILE, &serde_json::to_value(metadata)?)?;
        let checks_path = self.write_json(
            CHECKER_OUTPUT_FILE,
            &checker_output(checks, self.flatten_check_matrices)?,
        )?;
        Ok(vec![meta_path, checks_path])
    }

    /// Write the processing ledger and the fitted imputers.
    pub fn write_processor_output(
        &self,
        ledger: &ProcessingLedger,
        imputers: &[FittedImputer],
    ) -> Result<PathBuf> {
        let report = json!({
            "generated_at": timestamp(),
            "column_processing": ledger.column_processing,
            "row_processing": ledger.row_processing,
            "dropped_target_rows": ledger.dropped_target_rows,
            "imputers": imputers,
        });
        self.write_json(PROCESSOR_OUTPUT_FILE, &report)
    }

    /// Save every remediated dataset as `<stem>_processed.csv`.
    pub fn write_processed_datasets(
        &self,
        data: &mut DatasetCollection,
        metadata: &Metadata,
    ) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;

        let mut written = Vec::new();
        for key in metadata.data_keys() {
            let output_path = self
                .output_dir
                .join(format!("{}_processed.csv", dataset_stem(metadata, key)));
            let mut file = File::create(&output_path)?;

            CsvWriter::new(&mut file)
                .include_header(true)
                .with_separator(b',')
                .with_quote_char(b'"')
                .finish(data.require_mut(key)?)?;

            info!("Dataset saved: {}", output_path.display());
            written.push(output_path);
        }
        Ok(written)
    }

    fn write_json(&self, file_name: &str, value: &Value) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(file_name);
        let mut file = File::create(&path)?;
        file.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;

        info!("Report saved: {}", path.display());
        Ok(path)
    }
}

/// JSON form of the check results.
///
/// Flattened matrices become `{dataset: {check: {column: verdict}}}`;
/// otherwise each matrix is replaced by its `(checks, columns)` shape.
pub fn checker_output(checks: &DataChecks, flatten: bool) -> Result<Value> {
    let mut column_checks = Map::new();
    for (key, matrix) in &checks.column_checks {
        let value = if flatten {
            let mut flat = serde_json::to_value(&matrix.verdicts)?;
            if !matrix.duplicate_bases.is_empty()
                && let Value::Object(map) = &mut flat
            {
                map.insert(
                    "DUPLICATE_BASES".to_string(),
                    serde_json::to_value(&matrix.duplicate_bases)?,
                );
            }
            flat
        } else {
            let (n_checks, n_columns) = matrix.shape();
            json!({ "shape": [n_checks, n_columns] })
        };
        column_checks.insert(key.to_string(), value);
    }
    debug!("check output built for {} datasets", column_checks.len());

    Ok(json!({
        "generated_at": timestamp(),
        "column_checks": column_checks,
        "validation_reco": checks.validation_reco,
        "class_balance": checks.class_balance,
    }))
}

fn dataset_stem(metadata: &Metadata, key: DataKey) -> String {
    metadata
        .datafiles
        .get(&key)
        .and_then(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| key.to_string())
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
