//! Per-issue click counters.
//!
//! Counters are keyed by the issue number carried on each catalog record.
//! Analytics rows are reported for every number from 1 up to the highest
//! clicked one, so gaps show up as zero instead of disappearing. Gap filling
//! stops at [`GAP_FILL_LIMIT`]; counters above it are listed as recorded.

use crate::naming;
use crate::sidetable::{self, SideTableError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Highest issue number that gets zero rows for unclicked gaps.
pub const GAP_FILL_LIMIT: u32 = 1_000;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClickCounts {
    counts: BTreeMap<u32, u64>,
}

/// One analytics row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRow {
    pub issue_name: String,
    pub clicks: u64,
}

#[derive(Debug, Clone)]
pub struct ClickTable {
    path: PathBuf,
}

impl ClickTable {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(sidetable::CLICKS_FILENAME),
        }
    }

    /// Increment the counter for `number`; returns the new count.
    pub fn record_click(&self, number: u32) -> Result<u64, SideTableError> {
        let mut table: ClickCounts = sidetable::load(&self.path)?;
        let count = table.counts.entry(number).or_insert(0);
        *count += 1;
        let count = *count;
        sidetable::save(&self.path, &table)?;
        tracing::debug!(number, count, "recorded click");
        Ok(count)
    }

    /// Record a click for an issue title. Returns `false` when the title
    /// carries no issue number or the table cannot be written.
    pub fn record_click_for_title(&self, title: &str) -> bool {
        let Some(number) = naming::issue_number(title) else {
            tracing::warn!(title, "could not extract issue number");
            return false;
        };
        match self.record_click(number) {
            Ok(_) => true,
            Err(err) => {
                tracing::error!(error = %err, title, "click not recorded");
                false
            }
        }
    }

    /// Rows for issues 1..=max clicked number; empty when unreadable.
    ///
    /// Only numbers up to [`GAP_FILL_LIMIT`] are gap-filled, so one stray
    /// large number adds one row rather than millions.
    pub fn analytics(&self) -> Vec<ClickRow> {
        let table: ClickCounts = match sidetable::load(&self.path) {
            Ok(t) => t,
            Err(err) => {
                tracing::error!(error = %err, "cannot read click table");
                return Vec::new();
            }
        };
        let filled_to = table
            .counts
            .range(..=GAP_FILL_LIMIT)
            .next_back()
            .map_or(0, |(&n, _)| n);
        let row = |n: u32| ClickRow {
            issue_name: naming::issue_title(n),
            clicks: table.counts.get(&n).copied().unwrap_or(0),
        };
        (1..=filled_to)
            .map(row)
            .chain(table.counts.range(filled_to + 1..).map(|(&n, _)| row(n)))
            .collect()
    }
}
