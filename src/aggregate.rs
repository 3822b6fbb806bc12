//! Frequency views over the multi-select columns.

use std::{collections::HashMap, fmt, str::FromStr};

use crate::table::{BarrierRow, NormalizedRecord};

pub const DELIMITER: char = ';';

/// Columns holding semicolon-delimited selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiSelect {
    Barriers,
    SolutionPath,
}

impl MultiSelect {
    pub fn column(self) -> &'static str {
        match self {
            MultiSelect::Barriers => "barrier_list",
            MultiSelect::SolutionPath => "solution_path",
        }
    }
}

impl fmt::Display for MultiSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for MultiSelect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "barriers" | "barrier_list" => Ok(MultiSelect::Barriers),
            "solutions" | "solution_path" => Ok(MultiSelect::SolutionPath),
            other => Err(format!(
                "unknown multi-select field `{}` (expected barriers or solutions)",
                other
            )),
        }
    }
}

/// Rows that carry the multi-select columns.
pub trait MultiSelectRow {
    fn multi_select(&self, field: MultiSelect) -> Option<&str>;
}

impl MultiSelectRow for NormalizedRecord {
    fn multi_select(&self, field: MultiSelect) -> Option<&str> {
        match field {
            MultiSelect::Barriers => self.barrier_list.as_deref(),
            MultiSelect::SolutionPath => self.solution_path.as_deref(),
        }
    }
}

impl MultiSelectRow for BarrierRow {
    fn multi_select(&self, field: MultiSelect) -> Option<&str> {
        match field {
            MultiSelect::Barriers => self.barrier_list.as_deref(),
            MultiSelect::SolutionPath => self.solution_path.as_deref(),
        }
    }
}

/// Every individual selection, in row order then split order. Cells are
/// split exactly on the delimiter; missing cells are skipped and duplicates
/// stay.
pub fn master_list<R: MultiSelectRow>(rows: &[R], field: MultiSelect) -> Vec<&str> {
    rows.iter()
        .filter_map(|r| r.multi_select(field))
        .flat_map(|cell| cell.split(DELIMITER))
        .collect()
}

/// The `n` most frequent selections with their counts. Ties keep the order
/// in which the values first appeared.
pub fn top_values<R: MultiSelectRow>(rows: &[R], field: MultiSelect, n: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in master_list(rows, field) {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    // stable: equal counts stay in first-occurrence order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(n)
        .map(|(v, c)| (v.to_string(), c))
        .collect()
}
