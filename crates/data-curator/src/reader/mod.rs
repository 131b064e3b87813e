//! Dataset loading and target establishment.
//!
//! The reader turns validated input files (or in-memory frames) into a
//! [`DatasetCollection`] plus the initial [`Metadata`] of a run:
//! - whitespace-only strings become null
//! - boolean columns become `"true"`/`"false"` strings
//! - the target column is resolved and the feature lists are recorded
//! - train and test must share the same feature set

mod files;

pub use files::{DataFiles, VALID_EXTENSIONS};

use crate::error::{CuratorError, Result, ResultExt};
use crate::types::{DataKey, DatasetCollection, Metadata, SplitType};
use crate::utils::is_blank;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads datasets and builds the initial run metadata.
#[derive(Debug, Clone)]
pub struct DataReader {
    no_target: bool,
    target_column: Option<String>,
    cat_to_num_threshold: usize,
}

impl DataReader {
    /// `target_column` of None means the last column of the main dataset.
    pub fn new(no_target: bool, target_column: Option<String>, cat_to_num_threshold: usize) -> Self {
        Self {
            no_target,
            target_column,
            cat_to_num_threshold,
        }
    }

    /// Read every input file and establish columns.
    pub fn read(&self, files: &DataFiles) -> Result<(DatasetCollection, Metadata)> {
        let load = |key: DataKey| -> Result<DataFrame> {
            let path = files.files.get(&key).ok_or_else(|| {
                CuratorError::InvalidConfig(format!("no {} file given", key))
            })?;
            read_csv(path).context(format!("Failed to read {} data", key))
        };

        let data = match files.split_type {
            SplitType::TrainTest => DatasetCollection::TrainTest {
                train: load(DataKey::Train)?,
                test: load(DataKey::Test)?,
            },
            SplitType::Total => DatasetCollection::Total(load(DataKey::Total)?),
        };

        let (data, mut metadata) = self.load_frames(data)?;
        metadata.datafiles = files.files.clone();
        Ok((data, metadata))
    }

    /// Normalize in-memory frames and establish columns.
    pub fn load_frames(&self, data: DatasetCollection) -> Result<(DatasetCollection, Metadata)> {
        let data = match data {
            DatasetCollection::TrainTest { train, test } => DatasetCollection::TrainTest {
                train: normalize_frame(train)?,
                test: normalize_frame(test)?,
            },
            DatasetCollection::Total(df) => DatasetCollection::Total(normalize_frame(df)?),
        };

        let mut metadata = Metadata::new(data.split_type(), self.cat_to_num_threshold);
        metadata.no_target = self.no_target;

        if self.no_target {
            self.establish_columns_no_target(&data, &mut metadata);
        } else {
            self.establish_columns_with_target(&data, &mut metadata)?;
        }

        if data.split_type() == SplitType::TrainTest {
            compare_train_test_columns(&metadata)?;
        }

        Ok((data, metadata))
    }

    fn establish_columns_no_target(&self, data: &DatasetCollection, metadata: &mut Metadata) {
        debug!("target column not present");
        for (key, df) in data.iter() {
            metadata.features.insert(key, column_names(df));
            metadata.target_col.insert(key, None);
        }
        metadata.main_target_col = None;
    }

    fn establish_columns_with_target(
        &self,
        data: &DatasetCollection,
        metadata: &mut Metadata,
    ) -> Result<()> {
        let main_key = metadata.main_data_key;
        let main = data.require(main_key)?;
        let main_columns = column_names(main);

        let target = match &self.target_column {
            Some(target) => target.clone(),
            None => main_columns.last().cloned().ok_or_else(|| {
                CuratorError::SchemaMismatch(format!("{} data has no columns", main_key))
            })?,
        };
        debug!("checking for target column: {}", target);

        if !main_columns.contains(&target) {
            return Err(CuratorError::TargetNotFound {
                column: target,
                data_key: main_key.to_string(),
            });
        }
        metadata.features.insert(main_key, without(&main_columns, &target));
        metadata.target_col.insert(main_key, Some(target.clone()));
        debug!("fetched target column: {}", target);

        if let Some(second_key) = metadata.second_data_key {
            let second_columns = column_names(data.require(second_key)?);
            if second_columns.contains(&target) {
                debug!("target column present in {} data", second_key);
                metadata
                    .features
                    .insert(second_key, without(&second_columns, &target));
                metadata.target_col.insert(second_key, Some(target.clone()));
            } else {
                info!("No target column in {} data. Seems like competition data.", second_key);
                metadata.features.insert(second_key, second_columns);
                metadata.target_col.insert(second_key, None);
            }
        }

        metadata.main_target_col = Some(target);
        Ok(())
    }
}

fn compare_train_test_columns(metadata: &Metadata) -> Result<()> {
    let feature_set = |key: DataKey| -> BTreeSet<&str> {
        metadata
            .features
            .get(&key)
            .map(|features| features.iter().map(String::as_str).collect())
            .unwrap_or_default()
    };

    let train = feature_set(DataKey::Train);
    let test = feature_set(DataKey::Test);
    if train != test {
        let only_train: Vec<_> = train.difference(&test).collect();
        let only_test: Vec<_> = test.difference(&train).collect();
        return Err(CuratorError::SchemaMismatch(format!(
            "different columns in train and test data (train only: {:?}, test only: {:?})",
            only_train, only_test
        )));
    }
    debug!("PASSED: train test features and target col same/checked");
    Ok(())
}

/// Read a CSV file with a header row.
///
/// The schema is inferred over every row so a late non-numeric value does
/// not break parsing.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()?;
    debug!("{} reading completed", path.display());
    Ok(df)
}

/// Null out whitespace-only strings and turn booleans into strings.
pub fn normalize_frame(mut df: DataFrame) -> Result<DataFrame> {
    let names: Vec<PlSmallStr> = df.get_column_names().into_iter().cloned().collect();

    for name in names {
        let series = df.column(name.as_str())?.as_materialized_series();
        let replacement = match series.dtype() {
            DataType::Boolean => Some(series.cast(&DataType::String)?),
            DataType::String => Some(nullify_blank(series)?),
            _ => None,
        };
        if let Some(replacement) = replacement {
            df.replace(name.as_str(), replacement)?;
        }
    }

    Ok(df)
}

fn nullify_blank(series: &Series) -> PolarsResult<Series> {
    let values: Vec<Option<&str>> = series
        .str()?
        .into_iter()
        .map(|v| v.filter(|s| !is_blank(s)))
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

fn without(columns: &[String], target: &str) -> Vec<String> {
    columns.iter().filter(|c| *c != target).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(target: Option<&str>) -> DataReader {
        DataReader::new(false, target.map(str::to_string), 100)
    }

    #[test]
    fn test_default_target_is_last_column() {
        let df = df!["a" => [1, 2], "label" => ["x", "y"]].unwrap();
        let (_, metadata) = reader(None)
            .load_frames(DatasetCollection::Total(df))
            .unwrap();

        assert_eq!(metadata.main_target_col.as_deref(), Some("label"));
        assert_eq!(metadata.features[&DataKey::Total], vec!["a"]);
    }

    #[test]
    fn test_no_target() {
        let df = df!["a" => [1, 2], "b" => [3, 4]].unwrap();
        let (_, metadata) = DataReader::new(true, None, 100)
            .load_frames(DatasetCollection::Total(df))
            .unwrap();

        assert_eq!(metadata.main_target_col, None);
        assert_eq!(metadata.features[&DataKey::Total], vec!["a", "b"]);
        assert_eq!(metadata.target_col[&DataKey::Total], None);
    }

    #[test]
    fn test_declared_target_must_exist() {
        let df = df!["a" => [1, 2]].unwrap();
        let err = reader(Some("y"))
            .load_frames(DatasetCollection::Total(df))
            .unwrap_err();
        assert_eq!(err.error_code(), "TARGET_NOT_FOUND");
    }

    #[test]
    fn test_competition_test_data_without_target() {
        let train = df!["a" => [1, 2], "y" => [0, 1]].unwrap();
        let test = df!["a" => [3]].unwrap();
        let (_, metadata) = reader(Some("y"))
            .load_frames(DatasetCollection::TrainTest { train, test })
            .unwrap();

        assert_eq!(metadata.target_col[&DataKey::Test], None);
        assert_eq!(metadata.features[&DataKey::Test], vec!["a"]);
        assert_eq!(metadata.main_data_key, DataKey::Train);
    }

    #[test]
    fn test_train_test_feature_mismatch() {
        let train = df!["a" => [1], "y" => [0]].unwrap();
        let test = df!["b" => [1], "y" => [0]].unwrap();
        let err = reader(Some("y"))
            .load_frames(DatasetCollection::TrainTest { train, test })
            .unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_normalize_frame() {
        let df = df![
            "s" => [Some("a"), Some("   "), None],
            "flag" => [true, false, true],
        ]
        .unwrap();
        let df = normalize_frame(df).unwrap();

        assert_eq!(df.column("s").unwrap().null_count(), 2);
        assert_eq!(df.column("flag").unwrap().dtype(), &DataType::String);
    }
}
