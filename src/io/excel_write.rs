use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::aggregate::SummaryTable;
use crate::error::Result;
use crate::layout::ReportLayout;
use crate::model::Cell;

/// Prefix of every generated report file name.
pub const REPORT_FILE_PREFIX: &str = "Merchant_MID_Report_";

/// Returns a fresh `Merchant_MID_Report_<uuid>.xlsx` file name.
pub fn report_file_name() -> String {
    format!("{REPORT_FILE_PREFIX}{}.xlsx", Uuid::new_v4())
}

/// Writes the report into `output_dir` under a freshly generated name and
/// returns the path of the new workbook.
pub fn write_report(output_dir: &Path, layout: &ReportLayout) -> Result<PathBuf> {
    let path = output_dir.join(report_file_name());
    write_workbook(&path, layout)?;
    Ok(path)
}

/// Writes the provided report layout to the given path.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), sheets = layout.sheets.len()))]
pub fn write_workbook(path: &Path, layout: &ReportLayout) -> Result<()> {
    let mut workbook = Workbook::new();
    let formats = CellFormats::new();

    for sheet in &layout.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.sheet_name)?;

        let mut row: u32 = 0;
        for table in &sheet.tables {
            row = write_table(worksheet, row, table, &formats)?;
        }
        debug!(sheet = %sheet.sheet_name, last_row = row, "sheet written");
    }

    workbook.save(path)?;
    Ok(())
}

/// Writes one titled table starting at `row` and returns the row where the
/// next table's title goes.
fn write_table(
    worksheet: &mut Worksheet,
    row: u32,
    table: &SummaryTable,
    formats: &CellFormats,
) -> Result<u32> {
    let columns = table.columns();
    let last_col = (columns.len() as u16).saturating_sub(1);
    if last_col == 0 {
        worksheet.write_string_with_format(row, 0, table.title(), &formats.title)?;
    } else {
        worksheet.merge_range(row, 0, row, last_col, table.title(), &formats.title)?;
    }

    let header_row = row + 1;
    for (col_idx, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(header_row, col_idx as u16, name, &formats.header)?;
    }

    let rows = table.rows();
    for (offset, cells) in rows.iter().enumerate() {
        let data_row = header_row + 1 + offset as u32;
        for (col_idx, cell) in cells.iter().enumerate() {
            write_cell(worksheet, data_row, col_idx as u16, cell, formats)?;
        }
    }

    Ok(header_row + rows.len() as u32 + 2)
}

/// Applies the report's value policy: missing and non-finite values become
/// blank bordered cells, fractions in `[0, 1]` are shown as percentages.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    formats: &CellFormats,
) -> Result<()> {
    match cell {
        Cell::Float(value) if !value.is_finite() => {
            worksheet.write_blank(row, col, &formats.plain)?;
        }
        Cell::Float(value) if (0.0..=1.0).contains(value) => {
            worksheet.write_number_with_format(row, col, *value, &formats.percent)?;
        }
        Cell::Float(value) => {
            worksheet.write_number_with_format(row, col, *value, &formats.plain)?;
        }
        Cell::Int(value) => {
            worksheet.write_number_with_format(row, col, *value as f64, &formats.plain)?;
        }
        Cell::DateTime(value) if value.is_finite() => {
            worksheet.write_number_with_format(row, col, *value, &formats.date)?;
        }
        Cell::Bool(value) => {
            worksheet.write_boolean_with_format(row, col, *value, &formats.plain)?;
        }
        Cell::Text(value) if !value.is_empty() => {
            worksheet.write_string_with_format(row, col, value, &formats.plain)?;
        }
        Cell::Text(_) | Cell::DateTime(_) | Cell::Empty => {
            worksheet.write_blank(row, col, &formats.plain)?;
        }
    }
    Ok(())
}

struct CellFormats {
    title: Format,
    header: Format,
    plain: Format,
    percent: Format,
    date: Format,
}

impl CellFormats {
    fn new() -> Self {
        Self {
            title: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xADD8E6))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(0xF0E68C))
                .set_border(FormatBorder::Thin)
                .set_align(FormatAlign::Center),
            plain: Format::new().set_border(FormatBorder::Thin),
            percent: Format::new()
                .set_num_format("0.00%")
                .set_border(FormatBorder::Thin),
            date: Format::new()
                .set_num_format("yyyy-mm-dd hh:mm:ss")
                .set_border(FormatBorder::Thin),
        }
    }
}
