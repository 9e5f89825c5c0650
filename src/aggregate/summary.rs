use crate::model::Cell;

/// Transaction-level figures for one merchant/MID pair.
#[derive(Debug, Clone, PartialEq)]
pub struct MidSummary {
    /// Approved plus failed transactions. Other statuses are not counted.
    pub total_count: u64,
    pub approved_count: u64,
    pub failed_count: u64,
    /// `approved_count / total_count`, or `0.0` when nothing was counted.
    pub approval_ratio: f64,
    /// Sum of every amount in the group, whatever the status.
    pub total_amount: Cell,
    /// Sum of the amounts of successful transactions.
    pub total_approved_amount: Cell,
}

/// Number of rows sharing one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueCount {
    pub value: Cell,
    pub count: u64,
}

/// Rows per payer country joined with the country's approval ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryStat {
    pub country: Cell,
    pub count: u64,
    /// Successes over all rows for the country.
    pub approval_ratio: f64,
}

/// Approval ratio of one card brand over all of its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandRatio {
    pub brand: Cell,
    pub approval_ratio: f64,
}

/// One titled table of a merchant/MID report sheet.
///
/// A group's bundle always lists its tables in declaration order; only the
/// decline summary may be absent.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryTable {
    MidSummary(MidSummary),
    DeclineSummary(Vec<ValueCount>),
    CountrySummary(Vec<CountryStat>),
    CardBrandSummary(Vec<BrandRatio>),
    IssuerSummary(Vec<ValueCount>),
    UnderlyingData {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
}

impl SummaryTable {
    /// Title rendered above the table.
    pub fn title(&self) -> &'static str {
        match self {
            SummaryTable::MidSummary(_) => "MID Summary",
            SummaryTable::DeclineSummary(_) => "Decline Summary",
            SummaryTable::CountrySummary(_) => "Country Summary",
            SummaryTable::CardBrandSummary(_) => "Card Brand Summary",
            SummaryTable::IssuerSummary(_) => "Issuer Summary",
            SummaryTable::UnderlyingData { .. } => "Underlying Data",
        }
    }

    /// Header row of the table.
    pub fn columns(&self) -> Vec<String> {
        let names: &[&str] = match self {
            SummaryTable::MidSummary(_) => &["Metric", "Value"],
            SummaryTable::DeclineSummary(_) => &["Decline Reason", "Count"],
            SummaryTable::CountrySummary(_) => &["Country", "Count", "Approval Ratio"],
            SummaryTable::CardBrandSummary(_) => &["Card Brand", "Approval Ratio"],
            SummaryTable::IssuerSummary(_) => &["Issuer", "Count"],
            SummaryTable::UnderlyingData { columns, .. } => return columns.clone(),
        };
        names.iter().map(|name| name.to_string()).collect()
    }

    /// Data rows of the table, one cell per column.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        match self {
            SummaryTable::MidSummary(summary) => vec![
                metric("Total Transactions", count_cell(summary.total_count)),
                metric("Approved Transactions", count_cell(summary.approved_count)),
                metric("Failed Transactions", count_cell(summary.failed_count)),
                metric("Approval Ratio", Cell::Float(summary.approval_ratio)),
                metric("Total Amount", summary.total_amount.clone()),
                metric("Total Approved Amount", summary.total_approved_amount.clone()),
            ],
            SummaryTable::DeclineSummary(counts) | SummaryTable::IssuerSummary(counts) => counts
                .iter()
                .map(|entry| vec![entry.value.clone(), count_cell(entry.count)])
                .collect(),
            SummaryTable::CountrySummary(countries) => countries
                .iter()
                .map(|entry| {
                    vec![
                        entry.country.clone(),
                        count_cell(entry.count),
                        Cell::Float(entry.approval_ratio),
                    ]
                })
                .collect(),
            SummaryTable::CardBrandSummary(brands) => brands
                .iter()
                .map(|entry| vec![entry.brand.clone(), Cell::Float(entry.approval_ratio)])
                .collect(),
            SummaryTable::UnderlyingData { rows, .. } => rows.clone(),
        }
    }

    /// Number of data rows, excluding title and header.
    pub fn row_count(&self) -> usize {
        match self {
            SummaryTable::MidSummary(_) => 6,
            SummaryTable::DeclineSummary(counts) | SummaryTable::IssuerSummary(counts) => {
                counts.len()
            }
            SummaryTable::CountrySummary(countries) => countries.len(),
            SummaryTable::CardBrandSummary(brands) => brands.len(),
            SummaryTable::UnderlyingData { rows, .. } => rows.len(),
        }
    }
}

fn metric(name: &str, value: Cell) -> Vec<Cell> {
    vec![Cell::Text(name.to_string()), value]
}

fn count_cell(count: u64) -> Cell {
    Cell::Int(i64::try_from(count).unwrap_or(i64::MAX))
}
