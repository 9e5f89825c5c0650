#![allow(dead_code)]

use merchant_mid_report::Result;
use merchant_mid_report::aggregate::{self, MerchantGroup, TransactionTable};
use merchant_mid_report::model::{Cell, Frame};

pub const HEADER: [&str; 9] = [
    "Merchant",
    "MID",
    "Transaction Date",
    "Status",
    "Amount",
    "Payer Country",
    "Brand",
    "Issuer",
    "Decline reason",
];

/// A transaction row in the column order of [`HEADER`].
pub fn row(
    merchant: &str,
    mid: &str,
    status: &str,
    amount: i64,
    country: &str,
    brand: &str,
    issuer: &str,
    decline: &str,
) -> Vec<Cell> {
    vec![
        Cell::from(merchant),
        Cell::from(mid),
        Cell::from("2024-03-01"),
        Cell::from(status),
        Cell::Int(amount),
        Cell::from(country),
        Cell::from(brand),
        Cell::from(issuer),
        Cell::from(decline),
    ]
}

pub fn frame(rows: Vec<Vec<Cell>>) -> Frame {
    Frame::new(
        "transactions.csv",
        HEADER.iter().map(|name| name.to_string()).collect(),
        rows,
    )
}

/// Same rows without the decline reason column.
pub fn frame_without_decline_reason(rows: Vec<Vec<Cell>>) -> Frame {
    let rows = rows
        .into_iter()
        .map(|mut row| {
            row.truncate(8);
            row
        })
        .collect();
    Frame::new(
        "transactions.csv",
        HEADER[..8].iter().map(|name| name.to_string()).collect(),
        rows,
    )
}

pub const CSV_HEADER: &str =
    "Merchant,MID,Transaction Date,Status,Amount,Payer Country,Brand,Issuer,Decline reason";

/// Validates `frame` and aggregates it per merchant and MID.
pub fn aggregate_frame(frame: &Frame) -> Result<Vec<MerchantGroup>> {
    let table = TransactionTable::from_frame(frame)?;
    Ok(aggregate::aggregate(&table))
}
