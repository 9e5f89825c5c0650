//! Groups transactions by merchant and MID and computes the per-group
//! summary bundle.

mod summary;

use std::collections::HashMap;

use tracing::{debug, instrument};

pub use summary::{BrandRatio, CountryStat, MidSummary, SummaryTable, ValueCount};

use crate::error::{ReportError, Result};
use crate::model::{Cell, Frame};

pub const MERCHANT: &str = "Merchant";
pub const MID: &str = "MID";
pub const TRANSACTION_DATE: &str = "Transaction Date";
pub const STATUS: &str = "Status";
pub const AMOUNT: &str = "Amount";
pub const PAYER_COUNTRY: &str = "Payer Country";
pub const BRAND: &str = "Brand";
pub const ISSUER: &str = "Issuer";

/// Columns every transaction export must carry, in output order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    MERCHANT,
    MID,
    TRANSACTION_DATE,
    STATUS,
    AMOUNT,
    PAYER_COUNTRY,
    BRAND,
    ISSUER,
];

/// Columns holding identifiers: loaded as text, never as numbers.
pub const IDENTIFIER_COLUMNS: [&str; 2] = [MERCHANT, MID];

/// Accepted spellings of the optional decline reason header.
pub const DECLINE_REASON_HEADERS: [&str; 2] = ["Decline Reason", "Decline reason"];

/// Outcome recorded in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Fail,
    Other,
}

impl Status {
    fn from_cell(cell: &Cell) -> Self {
        match cell.as_text() {
            Some("success") => Status::Success,
            Some("fail") => Status::Fail,
            _ => Status::Other,
        }
    }
}

/// One transaction row projected onto the report columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub merchant: Cell,
    pub mid: Cell,
    pub transaction_date: Cell,
    pub status: Cell,
    pub amount: Cell,
    pub payer_country: Cell,
    pub brand: Cell,
    pub issuer: Cell,
    pub decline_reason: Option<Cell>,
}

impl Transaction {
    pub fn status(&self) -> Status {
        Status::from_cell(&self.status)
    }

    fn is_success(&self) -> bool {
        self.status() == Status::Success
    }

    fn cells(&self, with_decline_reason: bool) -> Vec<Cell> {
        let mut cells = vec![
            self.merchant.clone(),
            self.mid.clone(),
            self.transaction_date.clone(),
            self.status.clone(),
            self.amount.clone(),
            self.payer_country.clone(),
            self.brand.clone(),
            self.issuer.clone(),
        ];
        if with_decline_reason {
            cells.push(self.decline_reason.clone().unwrap_or(Cell::Empty));
        }
        cells
    }
}

/// Validated transactions ready for grouping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionTable {
    /// Header used for the decline reason column, when any source had one.
    pub decline_reason_column: Option<String>,
    pub rows: Vec<Transaction>,
}

impl TransactionTable {
    /// Checks the frame carries the required columns, then keeps the rows that
    /// have both a merchant and a status.
    #[instrument(level = "debug", skip_all, fields(source = %frame.source().display()))]
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| frame.column_index(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ReportError::MissingColumns {
                file: frame.source().to_path_buf(),
                columns: missing,
            });
        }

        let index = |name: &str| frame.column_index(name).unwrap_or_default();
        let [merchant, mid, date, status, amount, country, brand, issuer] =
            REQUIRED_COLUMNS.map(index);
        let decline = DECLINE_REASON_HEADERS
            .iter()
            .find_map(|name| frame.column_index(name).map(|idx| (idx, name.to_string())));

        let mut rows = Vec::with_capacity(frame.rows().len());
        for row in frame.rows() {
            if row[merchant].is_missing() || row[status].is_missing() {
                continue;
            }
            rows.push(Transaction {
                merchant: row[merchant].clone(),
                mid: row[mid].clone(),
                transaction_date: row[date].clone(),
                status: row[status].clone(),
                amount: row[amount].clone(),
                payer_country: row[country].clone(),
                brand: row[brand].clone(),
                issuer: row[issuer].clone(),
                decline_reason: decline.as_ref().map(|(idx, _)| row[*idx].clone()),
            });
        }
        debug!(
            kept = rows.len(),
            dropped = frame.rows().len() - rows.len(),
            "dropped rows without merchant or status"
        );

        Ok(Self {
            decline_reason_column: decline.map(|(_, name)| name),
            rows,
        })
    }

    /// Appends the rows of another table.
    pub fn extend(&mut self, other: TransactionTable) {
        if self.decline_reason_column.is_none() {
            self.decline_reason_column = other.decline_reason_column;
        }
        self.rows.extend(other.rows);
    }

    /// Column names of the underlying data table.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .map(|name| name.to_string())
            .collect();
        if let Some(name) = &self.decline_reason_column {
            columns.push(name.clone());
        }
        columns
    }
}

/// Grouping key: merchant and MID in their exact text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub merchant: String,
    pub mid: String,
}

/// Summary bundle for one merchant/MID pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MerchantGroup {
    pub key: GroupKey,
    pub tables: Vec<SummaryTable>,
}

impl MerchantGroup {
    /// The MID summary, which every bundle starts with.
    pub fn mid_summary(&self) -> Option<&MidSummary> {
        self.tables.iter().find_map(|table| match table {
            SummaryTable::MidSummary(summary) => Some(summary),
            _ => None,
        })
    }

    /// Looks a table up by its title.
    pub fn table(&self, title: &str) -> Option<&SummaryTable> {
        self.tables.iter().find(|table| table.title() == title)
    }
}

/// Groups the table by merchant and MID, in the order each pair is first
/// encountered, and builds each group's summary bundle.
#[instrument(level = "info", skip_all, fields(rows = table.rows.len()))]
pub fn aggregate(table: &TransactionTable) -> Vec<MerchantGroup> {
    let mut order: Vec<(GroupKey, Vec<&Transaction>)> = Vec::new();
    let mut positions: HashMap<GroupKey, usize> = HashMap::new();
    let mut without_mid = 0usize;

    for row in &table.rows {
        if row.mid.is_missing() {
            without_mid += 1;
            continue;
        }
        let key = GroupKey {
            merchant: row.merchant.key(),
            mid: row.mid.key(),
        };
        match positions.get(&key) {
            Some(&position) => order[position].1.push(row),
            None => {
                positions.insert(key.clone(), order.len());
                order.push((key, vec![row]));
            }
        }
    }
    if without_mid > 0 {
        debug!(rows = without_mid, "rows without MID left out of grouping");
    }

    let with_decline_reason = table.decline_reason_column.is_some();
    let columns = table.columns();
    order
        .into_iter()
        .map(|(key, rows)| MerchantGroup {
            tables: summarize(&rows, &columns, with_decline_reason),
            key,
        })
        .collect()
}

fn summarize(
    rows: &[&Transaction],
    columns: &[String],
    with_decline_reason: bool,
) -> Vec<SummaryTable> {
    let mut tables = vec![SummaryTable::MidSummary(mid_summary(rows))];

    if with_decline_reason {
        let failed: Vec<&&Transaction> = rows
            .iter()
            .filter(|row| row.status() == Status::Fail)
            .collect();
        if !failed.is_empty() {
            let reasons = failed
                .iter()
                .filter_map(|row| row.decline_reason.as_ref());
            tables.push(SummaryTable::DeclineSummary(value_counts(reasons)));
        }
    }

    let countries = success_buckets(rows, |row| &row.payer_country)
        .into_iter()
        .map(|bucket| CountryStat {
            approval_ratio: bucket.ratio(),
            country: bucket.value,
            count: bucket.total,
        })
        .collect::<Vec<_>>();
    tables.push(SummaryTable::CountrySummary(sort_by_count(countries, |stat| stat.count)));

    let mut brands = success_buckets(rows, |row| &row.brand)
        .into_iter()
        .map(|bucket| BrandRatio {
            approval_ratio: bucket.ratio(),
            brand: bucket.value,
        })
        .collect::<Vec<_>>();
    brands.sort_by(|lhs, rhs| lhs.brand.label_cmp(&rhs.brand));
    tables.push(SummaryTable::CardBrandSummary(brands));

    tables.push(SummaryTable::IssuerSummary(value_counts(
        rows.iter().map(|row| &row.issuer),
    )));

    tables.push(SummaryTable::UnderlyingData {
        columns: columns.to_vec(),
        rows: rows.iter().map(|row| row.cells(with_decline_reason)).collect(),
    });

    tables
}

fn mid_summary(rows: &[&Transaction]) -> MidSummary {
    let mut approved_count = 0u64;
    let mut failed_count = 0u64;
    let mut total_amount = AmountTotal::default();
    let mut total_approved_amount = AmountTotal::default();

    for row in rows {
        match row.status() {
            Status::Success => {
                approved_count += 1;
                total_approved_amount.add(&row.amount);
            }
            Status::Fail => failed_count += 1,
            Status::Other => {}
        }
        total_amount.add(&row.amount);
    }

    let total_count = approved_count + failed_count;
    let approval_ratio = if total_count > 0 {
        approved_count as f64 / total_count as f64
    } else {
        0.0
    };

    MidSummary {
        total_count,
        approved_count,
        failed_count,
        approval_ratio,
        total_amount: total_amount.into_cell(),
        total_approved_amount: total_approved_amount.into_cell(),
    }
}

/// Running sum of an amount column. The sum stays integral while every
/// contributing amount is; missing and non-numeric amounts are skipped.
#[derive(Debug, Default)]
struct AmountTotal {
    whole: i64,
    fraction: f64,
    fractional: bool,
}

impl AmountTotal {
    fn add(&mut self, amount: &Cell) {
        match amount {
            Cell::Int(value) => self.whole = self.whole.saturating_add(*value),
            Cell::Float(value) if !value.is_nan() => {
                self.fraction += value;
                self.fractional = true;
            }
            _ => {}
        }
    }

    fn into_cell(self) -> Cell {
        if self.fractional {
            Cell::Float(self.whole as f64 + self.fraction)
        } else {
            Cell::Int(self.whole)
        }
    }
}

/// Rows sharing one value of a column, with how many of them succeeded.
struct Bucket {
    value: Cell,
    total: u64,
    successes: u64,
}

impl Bucket {
    fn ratio(&self) -> f64 {
        self.successes as f64 / self.total as f64
    }
}

/// Buckets rows by a column in first-seen order. Missing values form no
/// bucket, so every bucket holds at least one row.
fn success_buckets<'a>(
    rows: &[&'a Transaction],
    field: impl Fn(&'a Transaction) -> &'a Cell,
) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let value = field(*row);
        if value.is_missing() {
            continue;
        }
        let position = *positions.entry(value.key()).or_insert_with(|| {
            buckets.push(Bucket {
                value: value.clone(),
                total: 0,
                successes: 0,
            });
            buckets.len() - 1
        });
        let bucket = &mut buckets[position];
        bucket.total += 1;
        if row.is_success() {
            bucket.successes += 1;
        }
    }

    buckets
}

/// Counts non-missing values, most frequent first; ties keep first-seen order.
fn value_counts<'a>(values: impl Iterator<Item = &'a Cell>) -> Vec<ValueCount> {
    let mut counts: Vec<ValueCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for value in values {
        if value.is_missing() {
            continue;
        }
        let position = *positions.entry(value.key()).or_insert_with(|| {
            counts.push(ValueCount {
                value: value.clone(),
                count: 0,
            });
            counts.len() - 1
        });
        counts[position].count += 1;
    }

    sort_by_count(counts, |entry| entry.count)
}

fn sort_by_count<T>(mut items: Vec<T>, count: impl Fn(&T) -> u64) -> Vec<T> {
    items.sort_by(|lhs, rhs| count(rhs).cmp(&count(lhs)));
    items
}
