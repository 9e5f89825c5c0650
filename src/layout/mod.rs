use std::collections::HashSet;

use crate::aggregate::{MerchantGroup, SummaryTable};

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel rejects in sheet names, besides control characters.
const INVALID_SHEET_CHARS: [char; 9] = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];

/// One worksheet of the report: a unique name and the tables stacked on it.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    pub sheet_name: String,
    pub tables: Vec<SummaryTable>,
}

/// Represents every sheet of the report workbook, in group order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportLayout {
    pub sheets: Vec<SheetLayout>,
}

/// Assigns each group a unique sheet named after its merchant and MID.
pub fn build_layout(groups: Vec<MerchantGroup>) -> ReportLayout {
    let mut sheet_names = SheetNameRegistry::default();

    let sheets = groups
        .into_iter()
        .map(|group| SheetLayout {
            sheet_name: sheet_names.assign(&format!("{}_{}", group.key.merchant, group.key.mid)),
            tables: group.tables,
        })
        .collect();

    ReportLayout { sheets }
}

/// Hands out sheet names, suffixing `_1`, `_2`, ... on collision. Excel
/// compares sheet names case-insensitively, and so does the registry.
#[derive(Debug, Default)]
pub struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    /// Returns a sanitized name for `raw` that no earlier call returned.
    pub fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.claim(&base) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let max_len = MAX_SHEET_NAME_LEN - suffix.chars().count();
            let prefix: String = base.chars().take(max_len).collect();
            let candidate = format!("{prefix}{suffix}");
            if self.claim(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    fn claim(&mut self, name: &str) -> bool {
        self.used.insert(name.to_lowercase())
    }
}

/// Replaces spaces and characters Excel rejects with underscores and
/// truncates to 31 characters. Applying it twice changes nothing.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if ch == ' ' || INVALID_SHEET_CHARS.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    if sanitized.is_empty() {
        "Sheet".to_string()
    } else {
        sanitized
    }
}
