use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::aggregate::{self, TransactionTable};
use crate::config::{Config, SourceMode};
use crate::error::{ReportError, Result};
use crate::io::{self, excel_write};
use crate::layout::build_layout;
use crate::model::Frame;

/// Loads every export in the upload folder, aggregates it per merchant and MID,
/// and writes the report workbooks. Returns their paths in write order: one
/// path, or one per loaded file in [`SourceMode::PerFile`].
#[instrument(
    level = "info",
    skip_all,
    fields(upload = %config.upload_folder.display(), mode = ?config.source_mode)
)]
pub fn generate_report(config: &Config) -> Result<Vec<PathBuf>> {
    if let Some(results_folder) = &config.results_folder {
        debug!(results = %results_folder.display(), "results folder configured but not used for output");
    }

    let frames = load_frames(&config.upload_folder)?;
    let tables = select_transactions(frames, config.source_mode)?;

    let mut paths = Vec::with_capacity(tables.len());
    for table in &tables {
        paths.push(write_table_report(&config.output_dir, table)?);
    }
    Ok(paths)
}

fn write_table_report(output_dir: &Path, table: &TransactionTable) -> Result<PathBuf> {
    let groups = aggregate::aggregate(table);
    info!(group_count = groups.len(), "aggregated merchant/MID groups");

    let layout = build_layout(groups);
    let path = excel_write::write_report(output_dir, &layout)?;
    info!(path = %path.display(), sheet_count = layout.sheets.len(), "report written");
    Ok(path)
}

/// Loads every file of the folder, skipping the ones that parse neither as a
/// spreadsheet nor as CSV. Fails when nothing loads.
#[instrument(level = "debug", skip_all, fields(folder = %folder.display()))]
pub fn load_frames(folder: &Path) -> Result<Vec<Frame>> {
    let files = io::list_input_files(folder)?;
    let mut frames = Vec::with_capacity(files.len());

    for path in files {
        match io::load_frame(&path) {
            Ok(frame) => {
                info!(path = %path.display(), rows = frame.rows().len(), "loaded transaction file");
                frames.push(frame);
            }
            Err(error) => warn!(%error, "skipping unreadable file"),
        }
    }

    if frames.is_empty() {
        return Err(ReportError::NoReadableInput(folder.to_path_buf()));
    }
    Ok(frames)
}

/// Turns the loaded frames into the transaction tables to report on, one
/// table per output workbook. Every frame is validated whatever the mode, so
/// a file missing required columns aborts the run even when it is discarded.
pub fn select_transactions(frames: Vec<Frame>, mode: SourceMode) -> Result<Vec<TransactionTable>> {
    let mut tables = frames
        .iter()
        .map(TransactionTable::from_frame)
        .collect::<Result<Vec<_>>>()?;

    match mode {
        SourceMode::LastFile => {
            let discarded = tables.len().saturating_sub(1);
            if let Some(kept) = frames.last().filter(|_| discarded > 0) {
                warn!(
                    discarded,
                    kept = %kept.source().display(),
                    "only the last loaded file is aggregated"
                );
            }
            Ok(tables.pop().into_iter().collect())
        }
        SourceMode::Combined => {
            let mut combined = TransactionTable::default();
            for table in tables {
                combined.extend(table);
            }
            Ok(vec![combined])
        }
        SourceMode::PerFile => Ok(tables),
    }
}
