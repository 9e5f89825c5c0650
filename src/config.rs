use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::{ReportError, Result};

/// Decides which loaded files feed the aggregation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SourceMode {
    /// Aggregate only the last file that loaded; earlier files are discarded.
    #[default]
    LastFile,
    /// Concatenate every loaded file before grouping.
    Combined,
    /// Write one report workbook for each loaded file.
    PerFile,
}

/// Validated settings for one report run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Folder holding the transaction exports.
    pub upload_folder: PathBuf,
    /// Results folder from the environment. Validated but not written to.
    pub results_folder: Option<PathBuf>,
    /// Folder the report workbook is written to.
    pub output_dir: PathBuf,
    pub source_mode: SourceMode,
}

impl Config {
    /// Builds a configuration, checking every folder is named and exists.
    pub fn new(
        upload_folder: PathBuf,
        results_folder: Option<PathBuf>,
        output_dir: PathBuf,
        source_mode: SourceMode,
    ) -> Result<Self> {
        require_directory("upload folder", &upload_folder)?;
        if let Some(results_folder) = &results_folder {
            require_directory("results folder", results_folder)?;
        }
        require_directory("output directory", &output_dir)?;

        Ok(Self {
            upload_folder,
            results_folder,
            output_dir,
            source_mode,
        })
    }
}

fn require_directory(label: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ReportError::InvalidConfig(format!("{label} is empty")));
    }
    if !path.is_dir() {
        return Err(ReportError::InvalidConfig(format!(
            "{label} {} is not a directory",
            path.display()
        )));
    }
    Ok(())
}
