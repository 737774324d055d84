//! Catalog assembly: join the metadata sheet with the PDF and image indexes.
//!
//! Stage 1 of the build pipeline. Three independently maintained sources go
//! in, one ordered list of [`IssueRecord`]s comes out:
//!
//! ```text
//! issues.toml (rows) ─┐
//! pdfs/   → pdf index ├─→ reconcile() → Catalog → issues.json
//! images/ → img index ┘
//! ```
//!
//! ## Join rules
//!
//! - The join is PDF-driven: a row is emitted only when a PDF with the row's
//!   title as its stem exists. Rows without one are dropped silently.
//! - Rows are scanned last to first, so the most recently added row comes
//!   first in the catalog. There is no date sort.
//! - Titles are unique: when the sheet repeats a title, only the newest row
//!   (the one nearest the bottom) is emitted.
//! - A missing cover image is fine; `imageId` is then `null`.
//! - An empty category becomes the configured default (`"General"`).
//! - `featured` is true only for the exact text `TRUE`.
//!
//! ## Failure policy
//!
//! [`build_catalog`] is what the publish path uses. Any failure reading the
//! sheet or either folder yields an empty catalog, logged at error level,
//! rather than an error: the public archive shows "No issues found" instead
//! of a half-joined list. [`try_build_catalog`] exposes the underlying error
//! for `check`.

use crate::config::{SiteConfig, SourcesConfig};
use crate::files::{self, FileCollection, FolderCollection, ImageRef, PdfRef, StorageError};
use crate::naming;
use crate::sheet::{self, Cell, SheetError, SheetSource, TomlSheet};
use crate::types::{Catalog, IssueRecord};
use chrono::{DateTime, NaiveDate};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),
}

/// The three read-only inputs of a catalog build.
#[derive(Clone, Copy)]
pub struct Sources<'a> {
    pub sheet: &'a dyn SheetSource,
    pub pdfs: &'a dyn FileCollection,
    pub images: &'a dyn FileCollection,
}

/// Sources laid out in a local content directory.
#[derive(Debug, Clone)]
pub struct LocalSources {
    pub sheet: TomlSheet,
    pub pdfs: FolderCollection,
    pub images: FolderCollection,
}

impl LocalSources {
    pub fn new(root: &Path, config: &SourcesConfig) -> Self {
        Self {
            sheet: TomlSheet::new(root.join(&config.sheet), config.sheet_name.clone()),
            pdfs: FolderCollection::new(root.join(&config.pdfs)),
            images: FolderCollection::new(root.join(&config.images)),
        }
    }

    pub fn as_sources(&self) -> Sources<'_> {
        Sources {
            sheet: &self.sheet,
            pdfs: &self.pdfs,
            images: &self.images,
        }
    }
}

/// Build the catalog, degrading to an empty one on any source failure.
pub fn build_catalog(sources: Sources<'_>, config: &SiteConfig) -> Catalog {
    match try_build_catalog(sources, config) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(error = %err, "catalog build failed, publishing an empty catalog");
            Catalog::default()
        }
    }
}

/// Build the catalog, propagating source failures.
pub fn try_build_catalog(sources: Sources<'_>, config: &SiteConfig) -> Result<Catalog, CatalogError> {
    let indexes = files::build_indexes(
        sources.pdfs,
        sources.images,
        &config.urls,
        config.catalog.on_duplicate_stem,
    )?;
    let rows = sheet::read_rows(sources.sheet)?;

    let issues = reconcile(
        &rows,
        &indexes.images,
        &indexes.pdfs,
        &config.catalog.default_category,
    );
    tracing::info!(
        rows = rows.len().saturating_sub(1),
        pdfs = indexes.pdfs.len(),
        images = indexes.images.len(),
        issues = issues.len(),
        "catalog assembled"
    );
    Ok(Catalog { issues })
}

/// Join sheet rows (header first) with the file indexes.
pub fn reconcile(
    rows: &[Vec<Cell>],
    images: &HashMap<String, ImageRef>,
    pdfs: &HashMap<String, PdfRef>,
    default_category: &str,
) -> Vec<IssueRecord> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for row in rows.iter().skip(1).rev() {
        let title = sheet::cell(row, sheet::TITLE).to_text();
        let Some(pdf) = pdfs.get(&title) else {
            tracing::debug!(title = title.as_str(), "no PDF for sheet row, skipping");
            continue;
        };
        if !seen.insert(title.clone()) {
            tracing::warn!(title = title.as_str(), "duplicate title in sheet, keeping newest row");
            continue;
        }
        let image = images.get(&title);

        let category = match sheet::cell(row, sheet::CATEGORY) {
            c if c.is_blank() => default_category.to_string(),
            c => c.to_text(),
        };
        let featured = matches!(sheet::cell(row, sheet::FEATURED), Cell::Text(s) if s == "TRUE");

        issues.push(IssueRecord {
            number: naming::issue_number(&title),
            description: sheet::cell(row, sheet::DESCRIPTION).to_text(),
            date: format_date(sheet::cell(row, sheet::DATE)),
            category,
            featured,
            image_id: image.map(|i| i.id.clone()),
            image_url: image.map(|i| i.url.clone()),
            pdf_url: pdf.url.clone(),
            pdf_id: pdf.id.clone(),
            pdf_embed_url: pdf.embed_url.clone(),
            title,
        });
    }

    issues
}

/// Display format for sheet dates.
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Normalize a date cell for display.
///
/// - blank → `""`
/// - text → unchanged
/// - calendar date → `MM-DD-YYYY`
/// - number → milliseconds since the Unix epoch (UTC) → `MM-DD-YYYY`
/// - anything that is not a calendar date → its raw text
pub fn format_date(cell: &Cell) -> String {
    if cell.is_blank() {
        return String::new();
    }
    if let Cell::Text(s) = cell {
        return s.clone();
    }
    match as_calendar_date(cell) {
        Some(date) => date.format(DATE_FORMAT).to_string(),
        None => cell.to_text(),
    }
}

fn as_calendar_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(dt) => {
            let d = dt.date?;
            NaiveDate::from_ymd_opt(d.year.into(), d.month.into(), d.day.into())
        }
        Cell::Number(ms) if ms.is_finite() => {
            DateTime::from_timestamp_millis(ms.trunc() as i64).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CategorySelector;
    use crate::config::DuplicatePolicy;
    use crate::test_helpers::*;

    fn date(s: &str) -> Cell {
        Cell::Date(s.parse().unwrap())
    }

    #[test]
    fn emits_only_rows_with_pdf() {
        let rows = sheet_rows(&[
            &["newspaper-issue-1", "One"],
            &["newspaper-issue-2", "Two"],
            &["newspaper-issue-3", "Three"],
            &["newspaper-issue-4", "Four"],
        ]);
        let pdfs = pdf_refs(&["newspaper-issue-2", "newspaper-issue-4", "orphan"]);

        let issues = reconcile(&rows, &HashMap::new(), &pdfs, "General");
        assert_eq!(issue_titles(&issues), vec!["newspaper-issue-4", "newspaper-issue-2"]);
    }

    #[test]
    fn output_is_reverse_row_order_not_date_order() {
        let rows = vec![
            header_row(),
            vec![text("b"), text("B"), date("2020-01-01")],
            vec![text("a"), text("A"), date("2024-06-01")],
            vec![text("c"), text("C"), date("2022-03-01")],
        ];
        let pdfs = pdf_refs(&["a", "b", "c"]);
        let issues = reconcile(&rows, &HashMap::new(), &pdfs, "General");
        assert_eq!(issue_titles(&issues), vec!["c", "a", "b"]);
    }

    #[test]
    fn header_row_is_never_an_issue() {
        let rows = vec![vec![text("Issue Name"), text("Description")]];
        let pdfs = pdf_refs(&["Issue Name"]);
        assert!(reconcile(&rows, &HashMap::new(), &pdfs, "General").is_empty());
    }

    #[test]
    fn featured_requires_exact_true_text() {
        let cases = [
            (text("TRUE"), true),
            (text("true"), false),
            (text("True"), false),
            (text(" TRUE"), false),
            (text("1"), false),
            (Cell::Bool(true), false),
            (Cell::Number(1.0), false),
            (Cell::Empty, false),
        ];
        for (flag, expected) in cases {
            let rows = vec![
                header_row(),
                vec![text("x"), text("X"), text(""), text(""), flag.clone()],
            ];
            let issues = reconcile(&rows, &HashMap::new(), &pdf_refs(&["x"]), "General");
            assert_eq!(issues[0].featured, expected, "flag {flag:?}");
        }
    }

    #[test]
    fn blank_category_gets_default() {
        let rows = vec![
            header_row(),
            vec![text("a"), text("A"), text(""), text("Sports")],
            vec![text("b"), text("B"), text(""), text("")],
            vec![text("c"), text("C")],
        ];
        let issues = reconcile(&rows, &HashMap::new(), &pdf_refs(&["a", "b", "c"]), "General");
        let categories: Vec<&str> = issues.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(categories, vec!["General", "General", "Sports"]);
    }

    #[test]
    fn image_is_optional() {
        let rows = sheet_rows(&[&["with", "W"], &["without", "WO"]]);
        let images = image_refs(&["with"]);
        let issues = reconcile(&rows, &images, &pdf_refs(&["with", "without"]), "General");

        let without = find_issue(&issues, "without");
        assert_eq!(without.image_id, None);
        assert_eq!(without.image_url, None);

        let with = find_issue(&issues, "with");
        assert_eq!(with.image_id.as_deref(), Some("img-with"));
    }

    #[test]
    fn record_carries_pdf_payload_and_number() {
        let rows = sheet_rows(&[&["newspaper-issue-7", "Seven"]]);
        let issues = reconcile(&rows, &HashMap::new(), &pdf_refs(&["newspaper-issue-7"]), "General");
        let issue = &issues[0];
        assert_eq!(issue.pdf_id, "pdf-newspaper-issue-7");
        assert_eq!(issue.pdf_url, "pdfs/newspaper-issue-7.pdf");
        assert_eq!(issue.description, "Seven");
        assert_eq!(issue.number, Some(7));
    }

    #[test]
    fn duplicate_title_keeps_newest_row() {
        let rows = sheet_rows(&[&["a", "old"], &["b", "B"], &["a", "new"]]);
        let issues = reconcile(&rows, &HashMap::new(), &pdf_refs(&["a", "b"]), "General");
        assert_eq!(issue_titles(&issues), vec!["a", "b"]);
        assert_eq!(issues[0].description, "new");

        let grid = crate::client::filter::filter_by_category(&issues, &CategorySelector::All);
        let grid: Vec<&str> = grid.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(grid, vec!["B"]);
    }

    // =========================================================================
    // Date formatting
    // =========================================================================

    #[test]
    fn format_date_calendar_date() {
        assert_eq!(format_date(&date("2024-01-05")), "01-05-2024");
        assert_eq!(format_date(&date("1999-12-31T23:59:00")), "12-31-1999");
    }

    #[test]
    fn format_date_text_passthrough() {
        assert_eq!(format_date(&text("March 2024")), "March 2024");
        assert_eq!(format_date(&text("2024-01-05")), "2024-01-05");
    }

    #[test]
    fn format_date_blank_is_empty() {
        assert_eq!(format_date(&Cell::Empty), "");
        assert_eq!(format_date(&text("")), "");
        assert_eq!(format_date(&Cell::Number(0.0)), "");
    }

    #[test]
    fn format_date_epoch_millis() {
        // 2024-01-05T12:00:00Z
        assert_eq!(format_date(&Cell::Number(1_704_456_000_000.0)), "01-05-2024");
    }

    #[test]
    fn format_date_falls_back_to_text() {
        assert_eq!(format_date(&date("08:30:00")), "08:30:00");
        assert_eq!(format_date(&Cell::Bool(true)), "true");
        assert_eq!(format_date(&Cell::Number(1e300)), format!("{}", 1e300));
    }

    // =========================================================================
    // Source access and degrade policy
    // =========================================================================

    #[test]
    fn end_to_end_three_rows_two_pdfs_one_image() {
        let sheet = MemorySheet::new(sheet_rows(&[
            &["newspaper-issue-1", "First"],
            &["newspaper-issue-2", "Second"],
            &["newspaper-issue-3", "Third"],
        ]));
        let pdfs = MemoryCollection::new(vec![
            stored("newspaper-issue-1.pdf", "p1"),
            stored("newspaper-issue-3.pdf", "p3"),
        ]);
        let images = MemoryCollection::new(vec![stored("newspaper-issue-1.jpg", "i1")]);

        let catalog = build_catalog(
            Sources {
                sheet: &sheet,
                pdfs: &pdfs,
                images: &images,
            },
            &SiteConfig::default(),
        );

        assert_eq!(issue_titles(&catalog.issues), vec!["newspaper-issue-3", "newspaper-issue-1"]);
        assert_eq!(catalog.issues[0].image_id, None);
        assert_eq!(catalog.issues[1].image_id.as_deref(), Some("i1"));
        assert_eq!(catalog.issues[1].image_url.as_deref(), Some("images/newspaper-issue-1.jpg"));
    }

    #[test]
    fn failing_collection_degrades_to_empty() {
        let sheet = MemorySheet::new(sheet_rows(&[&["a", "A"]]));
        let pdfs = FailingCollection;
        let images = MemoryCollection::new(vec![]);
        let sources = Sources {
            sheet: &sheet,
            pdfs: &pdfs,
            images: &images,
        };

        assert!(try_build_catalog(sources, &SiteConfig::default()).is_err());
        assert!(build_catalog(sources, &SiteConfig::default()).is_empty());
    }

    #[test]
    fn failing_sheet_degrades_to_empty() {
        let sheet = FailingSheet;
        let pdfs = MemoryCollection::new(vec![stored("a.pdf", "p")]);
        let images = MemoryCollection::new(vec![]);
        let catalog = build_catalog(
            Sources {
                sheet: &sheet,
                pdfs: &pdfs,
                images: &images,
            },
            &SiteConfig::default(),
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn rejected_duplicate_stem_degrades_to_empty() {
        let sheet = MemorySheet::new(sheet_rows(&[&["a", "A"]]));
        let pdfs = MemoryCollection::new(vec![stored("a.pdf", "p")]);
        let images = MemoryCollection::new(vec![stored("a.jpg", "1"), stored("a.png", "2")]);
        let mut config = SiteConfig::default();
        config.catalog.on_duplicate_stem = DuplicatePolicy::Reject;

        let sources = Sources {
            sheet: &sheet,
            pdfs: &pdfs,
            images: &images,
        };
        assert!(matches!(
            try_build_catalog(sources, &config),
            Err(CatalogError::Storage(StorageError::DuplicateStem { .. }))
        ));
        assert!(build_catalog(sources, &config).is_empty());
    }

    #[test]
    fn local_sources_missing_content_degrades_to_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = SiteConfig::default();
        let local = LocalSources::new(tmp.path(), &config.sources);
        assert!(build_catalog(local.as_sources(), &config).is_empty());
    }
}
