//! Input file validation.

use crate::error::{CuratorError, Result};
use crate::types::{DataKey, SplitType};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Supported data file extensions.
pub const VALID_EXTENSIONS: [&str; 1] = ["csv"];

/// Input files of one run, keyed by dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFiles {
    pub split_type: SplitType,
    pub files: BTreeMap<DataKey, PathBuf>,
}

impl DataFiles {
    /// Map one or two filenames to dataset keys.
    ///
    /// - one file: `total`
    /// - two distinct files: `train`, then `test`
    /// - the same file twice: `total`, with a warning
    pub fn from_filenames<S: AsRef<str>>(filenames: &[S]) -> Result<Self> {
        let names: Vec<&str> = filenames.iter().map(AsRef::as_ref).collect();

        let data_files = match names.as_slice() {
            [] => {
                return Err(CuratorError::InvalidConfig(
                    "at least one data file is required".to_string(),
                ));
            }
            [total] => Self::total(total),
            [first, second] if first == second => {
                warn!("same file names given, considering only single file as total data");
                Self::total(first)
            }
            [train, test] => Self {
                split_type: SplitType::TrainTest,
                files: BTreeMap::from([
                    (DataKey::Train, PathBuf::from(train)),
                    (DataKey::Test, PathBuf::from(test)),
                ]),
            },
            _ => {
                return Err(CuratorError::InvalidConfig(format!(
                    "maximum 2 files are permitted, got {}",
                    names.len()
                )));
            }
        };

        data_files.validate_extensions()?;
        debug!("data is of {} format", data_files.split_type);
        Ok(data_files)
    }

    fn total(path: &str) -> Self {
        Self {
            split_type: SplitType::Total,
            files: BTreeMap::from([(DataKey::Total, PathBuf::from(path))]),
        }
    }

    /// Path of the main dataset.
    pub fn main_path(&self) -> Option<&Path> {
        let (main_key, _) = self.split_type.data_keys();
        self.files.get(&main_key).map(PathBuf::as_path)
    }

    /// Folder of the main data file, used as the default output directory.
    pub fn data_folder(&self) -> PathBuf {
        self.main_path()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn validate_extensions(&self) -> Result<()> {
        let mut extensions = Vec::new();
        for (key, path) in &self.files {
            let ext = extension_of(path);
            if !VALID_EXTENSIONS.contains(&ext.as_str()) {
                return Err(CuratorError::SchemaMismatch(format!(
                    "unsupported extension '.{}' for {} file {}",
                    ext,
                    key,
                    path.display()
                )));
            }
            extensions.push(ext);
        }

        if extensions.windows(2).any(|pair| pair[0] != pair[1]) {
            return Err(CuratorError::SchemaMismatch(
                "train and test files have different extensions".to_string(),
            ));
        }
        debug!("PASSED: file extensions valid");
        Ok(())
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}
