mod common;

use std::fs;
use std::path::Path;

use std::path::PathBuf;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use common::{CSV_HEADER, HEADER, aggregate_frame};
use merchant_mid_report::io::{excel_write, load_frame};
use merchant_mid_report::layout::build_layout;
use merchant_mid_report::model::Cell;
use merchant_mid_report::pipeline::{self, generate_report};
use merchant_mid_report::{Config, ReportError, SourceMode};
use rust_xlsxwriter::{Format, Workbook};
use tempfile::tempdir;

fn write_csv(folder: &Path, name: &str, rows: &[&str]) {
    let mut contents = String::from(CSV_HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    fs::write(folder.join(name), contents).expect("CSV written");
}

fn config(upload: &Path, output: &Path, mode: SourceMode) -> Config {
    Config::new(upload.to_path_buf(), None, output.to_path_buf(), mode).expect("valid config")
}

fn sheet_names(path: &Path) -> Vec<String> {
    let workbook: Xlsx<_> = open_workbook(path).expect("report opened");
    workbook.sheet_names().to_vec()
}

fn single_report(config: &Config) -> PathBuf {
    let mut paths = generate_report(config).expect("report generated");
    assert_eq!(paths.len(), 1);
    paths.pop().expect("one report")
}

#[test]
fn csv_export_produces_one_sheet_per_merchant_mid() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    write_csv(
        upload.path(),
        "march.csv",
        &[
            "Acme Ltd,1001,2024-03-01,success,100,DE,Visa,Bank A,",
            "Acme Ltd,1001,2024-03-02,fail,50,DE,Visa,Bank A,Expired card",
            "Beta GmbH,2002,2024-03-02,success,75.5,AT,Mastercard,Bank C,",
            ",3003,2024-03-03,success,10,AT,Visa,Bank C,",
        ],
    );

    let path = single_report(&config(upload.path(), output.path(), SourceMode::LastFile));

    assert_eq!(path.parent(), Some(output.path()));
    let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
    assert!(file_name.starts_with("Merchant_MID_Report_"));
    assert!(file_name.ends_with(".xlsx"));
    assert_eq!(sheet_names(&path), ["Acme_Ltd_1001", "Beta_GmbH_2002"]);
}

#[test]
fn default_mode_aggregates_only_the_last_loaded_file() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    write_csv(
        upload.path(),
        "first.csv",
        &["First,1,2024-03-01,success,1,DE,Visa,Bank A,"],
    );
    write_csv(
        upload.path(),
        "second.csv",
        &["Second,2,2024-03-01,success,1,DE,Visa,Bank A,"],
    );

    let frames = pipeline::load_frames(upload.path()).expect("frames loaded");
    assert_eq!(frames.len(), 2);
    let last_merchant = frames
        .last()
        .and_then(|frame| frame.rows().first())
        .map(|row| row[0].clone())
        .expect("last frame has rows");

    let path = single_report(&config(upload.path(), output.path(), SourceMode::LastFile));

    // Files before the last one are discarded, whichever order the directory
    // listing yields.
    let expected = match last_merchant.as_text() {
        Some("First") => "First_1",
        _ => "Second_2",
    };
    assert_eq!(sheet_names(&path), [expected]);
}

#[test]
fn combined_mode_aggregates_every_file() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    write_csv(
        upload.path(),
        "first.csv",
        &["Shop,1,2024-03-01,success,10,DE,Visa,Bank A,"],
    );
    write_csv(
        upload.path(),
        "second.csv",
        &["Shop,1,2024-03-02,fail,5,DE,Visa,Bank A,Do not honour"],
    );

    let frames = pipeline::load_frames(upload.path()).expect("frames loaded");
    let tables = pipeline::select_transactions(frames, SourceMode::Combined).expect("combined");
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows.len(), 2);

    let path = single_report(&config(upload.path(), output.path(), SourceMode::Combined));
    assert_eq!(sheet_names(&path), ["Shop_1"]);
}

#[test]
fn unreadable_files_are_skipped() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    fs::write(upload.path().join("broken.xlsx"), [0xff, 0xfe, 0x00, 0xc3, 0x28]).expect("written");
    write_csv(
        upload.path(),
        "good.csv",
        &["Shop,1,2024-03-01,success,10,DE,Visa,Bank A,"],
    );

    assert!(matches!(
        load_frame(&upload.path().join("broken.xlsx")),
        Err(ReportError::LoadFailed { .. })
    ));

    let frames = pipeline::load_frames(upload.path()).expect("frames loaded");
    assert_eq!(frames.len(), 1);

    let path = single_report(&config(upload.path(), output.path(), SourceMode::Combined));
    assert_eq!(sheet_names(&path), ["Shop_1"]);
}

#[test]
fn folder_without_readable_files_fails() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    fs::write(upload.path().join("broken.xlsx"), [0xff, 0xfe, 0x00]).expect("written");

    let result = generate_report(&config(upload.path(), output.path(), SourceMode::LastFile));
    assert!(matches!(result, Err(ReportError::NoReadableInput(_))));
}

#[test]
fn missing_required_column_aborts_the_run() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    fs::write(
        upload.path().join("partial.csv"),
        "Merchant,MID,Status,Amount\nShop,1,success,10\n",
    )
    .expect("written");

    let result = generate_report(&config(upload.path(), output.path(), SourceMode::LastFile));
    match result {
        Err(ReportError::MissingColumns { columns, .. }) => {
            assert_eq!(
                columns,
                ["Transaction Date", "Payer Country", "Brand", "Issuer"]
            );
        }
        other => panic!("expected missing columns, got {other:?}"),
    }
    let written = fs::read_dir(output.path()).expect("output listed").count();
    assert_eq!(written, 0);
}

#[test]
fn spreadsheet_exports_load_before_the_csv_fallback() {
    let upload = tempdir().expect("upload folder");
    write_csv(
        upload.path(),
        "source.csv",
        &["Shop,1,2024-03-01,success,10,DE,Visa,Bank A,"],
    );
    let csv_frame = load_frame(&upload.path().join("source.csv")).expect("CSV loaded");

    // Write the frame's report back out and load it as a spreadsheet: the
    // first sheet's first row becomes the header.
    let layout = build_layout(aggregate_frame(&csv_frame).expect("aggregated"));
    let xlsx_path = upload.path().join("report.xlsx");
    excel_write::write_workbook(&xlsx_path, &layout).expect("workbook written");

    let frame = load_frame(&xlsx_path).expect("spreadsheet loaded");
    assert_eq!(frame.columns().first().map(String::as_str), Some("MID Summary"));
    assert!(
        frame
            .rows()
            .iter()
            .any(|row| row.first() == Some(&Cell::from("Total Transactions")))
    );
}

#[test]
fn config_rejects_missing_and_empty_folders() {
    let existing = tempdir().expect("folder");
    let missing = existing.path().join("does-not-exist");

    let result = Config::new(
        missing.clone(),
        None,
        existing.path().to_path_buf(),
        SourceMode::LastFile,
    );
    assert!(matches!(result, Err(ReportError::InvalidConfig(_))));

    let result = Config::new(
        "".into(),
        None,
        existing.path().to_path_buf(),
        SourceMode::LastFile,
    );
    assert!(matches!(result, Err(ReportError::InvalidConfig(_))));

    let result = Config::new(
        existing.path().to_path_buf(),
        Some(missing),
        existing.path().to_path_buf(),
        SourceMode::LastFile,
    );
    assert!(matches!(result, Err(ReportError::InvalidConfig(_))));

    let config = Config::new(
        existing.path().to_path_buf(),
        Some(existing.path().to_path_buf()),
        existing.path().to_path_buf(),
        SourceMode::Combined,
    )
    .expect("valid config");
    assert_eq!(config.source_mode, SourceMode::Combined);
}

#[test]
fn csv_mids_keep_their_text_form() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    write_csv(
        upload.path(),
        "mids.csv",
        &[
            "Shop,0123,2024-03-01,success,10,DE,Visa,Bank A,",
            "Shop,123,2024-03-01,success,10,DE,Visa,Bank A,",
            "Shop,AB9,2024-03-01,fail,10,DE,Visa,Bank A,Expired card",
            "Shop,0123,2024-03-02,fail,10,DE,Visa,Bank A,Expired card",
        ],
    );

    let frame = load_frame(&upload.path().join("mids.csv")).expect("CSV loaded");
    let mids: Vec<&Cell> = frame.rows().iter().map(|row| &row[1]).collect();
    assert_eq!(mids[0], &Cell::from("0123"));
    assert_eq!(mids[1], &Cell::from("123"));
    assert_eq!(frame.rows()[0][4], Cell::Int(10));

    let groups = aggregate_frame(&frame).expect("aggregated");
    let keys: Vec<&str> = groups.iter().map(|group| group.key.mid.as_str()).collect();
    assert_eq!(keys, ["0123", "123", "AB9"]);

    let path = single_report(&config(upload.path(), output.path(), SourceMode::LastFile));
    assert_eq!(sheet_names(&path), ["Shop_0123", "Shop_123", "Shop_AB9"]);
}

#[test]
fn records_wider_than_the_header_skip_the_file() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    write_csv(
        upload.path(),
        "ragged.csv",
        &[
            "Ragged,1,2024-03-01,success,10,DE,Visa,Bank A,",
            "Ragged,1,2024-03-01,fail,10,DE,Visa,Bank A,Expired card,extra",
        ],
    );
    write_csv(
        upload.path(),
        "good.csv",
        &["Shop,1,2024-03-01,success,10,DE,Visa,Bank A,"],
    );

    match load_frame(&upload.path().join("ragged.csv")) {
        Err(ReportError::LoadFailed { delimited, .. }) => {
            assert!(delimited.contains("record has 10 fields, header has 9"));
        }
        other => panic!("expected a load failure, got {other:?}"),
    }

    let path = single_report(&config(upload.path(), output.path(), SourceMode::Combined));
    assert_eq!(sheet_names(&path), ["Shop_1"]);
}

#[test]
fn per_file_mode_writes_one_workbook_per_file() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    write_csv(
        upload.path(),
        "first.csv",
        &["First,1,2024-03-01,success,1,DE,Visa,Bank A,"],
    );
    write_csv(
        upload.path(),
        "second.csv",
        &["Second,2,2024-03-01,success,1,DE,Visa,Bank A,"],
    );

    let paths = generate_report(&config(upload.path(), output.path(), SourceMode::PerFile))
        .expect("reports generated");
    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);

    let mut sheets: Vec<Vec<String>> = paths.iter().map(|path| sheet_names(path)).collect();
    sheets.sort();
    assert_eq!(sheets, [vec!["First_1".to_string()], vec!["Second_2".to_string()]]);

    let written = fs::read_dir(output.path()).expect("output listed").count();
    assert_eq!(written, 2);
}

#[test]
fn discarded_files_are_still_validated() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");
    fs::write(
        upload.path().join("partial.csv"),
        "Merchant,MID,Status,Amount\nShop,1,success,10\n",
    )
    .expect("written");
    write_csv(
        upload.path(),
        "good.csv",
        &["Shop,1,2024-03-01,success,10,DE,Visa,Bank A,"],
    );

    for mode in [SourceMode::LastFile, SourceMode::Combined, SourceMode::PerFile] {
        let result = generate_report(&config(upload.path(), output.path(), mode));
        assert!(
            matches!(result, Err(ReportError::MissingColumns { .. })),
            "{mode:?} accepted a file without required columns"
        );
    }
    let written = fs::read_dir(output.path()).expect("output listed").count();
    assert_eq!(written, 0);
}

#[test]
fn spreadsheet_export_with_dates_runs_end_to_end() {
    let upload = tempdir().expect("upload folder");
    let output = tempdir().expect("output folder");

    // 2024-03-01 12:00 and 2024-03-02 08:30 as spreadsheet serials.
    let dates = [45352.5, 45353.354166666664];
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    let worksheet = workbook.add_worksheet();
    for (col, name) in HEADER.iter().enumerate() {
        worksheet.write_string(0, col as u16, *name).expect("header written");
    }
    for (idx, (status, date)) in [("success", dates[0]), ("fail", dates[1])]
        .into_iter()
        .enumerate()
    {
        let row = idx as u32 + 1;
        worksheet.write_string(row, 0, "Acme Ltd").expect("merchant");
        worksheet.write_number(row, 1, 1001.0).expect("mid");
        worksheet
            .write_number_with_format(row, 2, date, &date_format)
            .expect("date");
        worksheet.write_string(row, 3, status).expect("status");
        worksheet.write_number(row, 4, 40.0).expect("amount");
        worksheet.write_string(row, 5, "DE").expect("country");
        worksheet.write_string(row, 6, "Visa").expect("brand");
        worksheet.write_string(row, 7, "Bank A").expect("issuer");
        if status == "fail" {
            worksheet.write_string(row, 8, "Expired card").expect("decline");
        }
    }
    workbook
        .save(upload.path().join("export.xlsx"))
        .expect("export saved");

    let frame = load_frame(&upload.path().join("export.xlsx")).expect("spreadsheet loaded");
    assert_eq!(frame.rows()[0][1], Cell::Int(1001));
    assert_eq!(frame.rows()[0][2], Cell::DateTime(dates[0]));

    let path = single_report(&config(upload.path(), output.path(), SourceMode::LastFile));
    assert_eq!(sheet_names(&path), ["Acme_Ltd_1001"]);

    let mut report: Xlsx<_> = open_workbook(&path).expect("report opened");
    let range = report
        .worksheet_range("Acme_Ltd_1001")
        .expect("sheet present")
        .expect("sheet read");
    let is_text = |row: u32, col: u32, expected: &str| {
        matches!(range.get_value((row, col)), Some(DataType::String(value)) if value == expected)
    };

    let title_row = (0..range.height() as u32)
        .find(|row| is_text(*row, 0, "Underlying Data"))
        .expect("underlying data table");
    let header_row = title_row + 1;
    assert!(is_text(header_row, 2, "Transaction Date"));
    for (offset, date) in dates.iter().enumerate() {
        match range.get_value((header_row + 1 + offset as u32, 2)) {
            Some(DataType::DateTime(value)) => assert!((value - date).abs() < 1e-9),
            other => panic!("expected a date cell, got {other:?}"),
        }
    }
    assert!(is_text(header_row + 2, 8, "Expired card"));
}
