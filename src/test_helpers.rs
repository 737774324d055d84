//! Shared test utilities for the newsstand test suite.
//!
//! Provides in-memory sources, record builders, lookup helpers, and a fixture
//! content directory for tests that exercise the real filesystem path.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let sheet = MemorySheet::new(sheet_rows(&[
//!     &["newspaper-issue-1", "Welcome back"],
//!     &["newspaper-issue-2", "Homecoming"],
//! ]));
//! let pdfs = MemoryCollection::new(vec![stored("newspaper-issue-2.pdf", "p2")]);
//!
//! let issues = reconcile(&sheet.rows().unwrap(), &HashMap::new(), &pdf_refs(&["newspaper-issue-2"]), "General");
//! assert_eq!(issue_titles(&issues), vec!["newspaper-issue-2"]);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

use crate::files::{FileCollection, ImageRef, PdfRef, StorageError, StoredFile};
use crate::sheet::{Cell, SheetError, SheetSource};
use crate::types::{Catalog, IssueRecord};

// =========================================================================
// Sources
// =========================================================================

/// A file listing with a fixed modification time.
pub fn stored(name: &str, id: &str) -> StoredFile {
    stored_at(name, id, 1_700_000_000)
}

/// A file listing modified `secs` after the epoch.
pub fn stored_at(name: &str, id: &str, secs: u64) -> StoredFile {
    StoredFile {
        name: name.to_string(),
        id: id.to_string(),
        modified: UNIX_EPOCH + Duration::from_secs(secs),
    }
}

pub struct MemoryCollection {
    files: Vec<StoredFile>,
}

impl MemoryCollection {
    pub fn new(files: Vec<StoredFile>) -> Self {
        Self { files }
    }
}

impl FileCollection for MemoryCollection {
    fn files(&self) -> Result<Vec<StoredFile>, StorageError> {
        Ok(self.files.clone())
    }
}

/// A collection whose listing always fails.
pub struct FailingCollection;

impl FileCollection for FailingCollection {
    fn files(&self) -> Result<Vec<StoredFile>, StorageError> {
        Err(StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "listing denied",
        )))
    }
}

pub struct MemorySheet {
    rows: Vec<Vec<Cell>>,
}

impl MemorySheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }
}

impl SheetSource for MemorySheet {
    fn rows(&self) -> Result<Vec<Vec<Cell>>, SheetError> {
        Ok(self.rows.clone())
    }
}

/// A sheet whose read always fails.
pub struct FailingSheet;

impl SheetSource for FailingSheet {
    fn rows(&self) -> Result<Vec<Vec<Cell>>, SheetError> {
        Err(SheetError::MissingSheet("Sheet1".into()))
    }
}

// =========================================================================
// Sheet and index builders
// =========================================================================

pub fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

pub fn header_row() -> Vec<Cell> {
    ["Issue Name", "Description", "Date", "Category", "Featured"]
        .iter()
        .map(|h| text(h))
        .collect()
}

/// Header plus one all-text row per entry.
pub fn sheet_rows(rows: &[&[&str]]) -> Vec<Vec<Cell>> {
    std::iter::once(header_row())
        .chain(rows.iter().map(|row| row.iter().map(|c| text(c)).collect()))
        .collect()
}

/// PDF index with id `pdf-<stem>` and URL `pdfs/<stem>.pdf`.
pub fn pdf_refs(stems: &[&str]) -> HashMap<String, PdfRef> {
    stems
        .iter()
        .map(|stem| {
            let url = format!("pdfs/{stem}.pdf");
            let pdf = PdfRef {
                id: format!("pdf-{stem}"),
                embed_url: url.clone(),
                url,
            };
            (stem.to_string(), pdf)
        })
        .collect()
}

/// Image index with id `img-<stem>` and URL `images/<stem>.jpg`.
pub fn image_refs(stems: &[&str]) -> HashMap<String, ImageRef> {
    stems
        .iter()
        .map(|stem| {
            let image = ImageRef {
                id: format!("img-{stem}"),
                url: format!("images/{stem}.jpg"),
            };
            (stem.to_string(), image)
        })
        .collect()
}

// =========================================================================
// Records
// =========================================================================

/// A catalog record with the given title and category, dated `date`.
pub fn issue(title: &str, category: &str, date: &str) -> IssueRecord {
    IssueRecord {
        title: title.to_string(),
        description: format!("{title} headline"),
        date: date.to_string(),
        category: category.to_string(),
        featured: false,
        image_id: None,
        image_url: None,
        pdf_url: format!("pdfs/{title}.pdf"),
        pdf_id: format!("pdf-{title}"),
        pdf_embed_url: format!("pdfs/{title}.pdf"),
        number: crate::naming::issue_number(title),
    }
}

pub fn featured(mut record: IssueRecord) -> IssueRecord {
    record.featured = true;
    record
}

pub fn catalog_of(issues: Vec<IssueRecord>) -> Catalog {
    Catalog { issues }
}

// =========================================================================
// Lookups and extractors
// =========================================================================

/// All issue titles in catalog order.
pub fn issue_titles(issues: &[IssueRecord]) -> Vec<&str> {
    issues.iter().map(|i| i.title.as_str()).collect()
}

/// Find an issue by title. Panics if not found.
pub fn find_issue<'a>(issues: &'a [IssueRecord], title: &str) -> &'a IssueRecord {
    issues.iter().find(|i| i.title == title).unwrap_or_else(|| {
        let titles = issue_titles(issues);
        panic!("issue '{title}' not found. Available: {titles:?}")
    })
}

// =========================================================================
// Fixture content
// =========================================================================

pub const FIXTURE_SHEET: &str = r#"[sheets.Sheet1]
rows = [
  ["Issue Name", "Description", "Date", "Category", "Featured"],
  ["newspaper-issue-1", "Welcome back, Raiders!", 2024-09-05, "News", ""],
  ["newspaper-issue-2", "Homecoming recap", "October 2024", "", ""],
  ["newspaper-issue-3", "Winter sports preview", 2024-12-02, "Sports", "TRUE"],
  ["newspaper-issue-4", "Drafted but never printed", 2025-01-10, "News", ""],
]
"#;

/// Write a content directory to a temp dir and return it.
///
/// Issues 1-3 have PDFs; issue 4 does not. Only issues 1 and 3 have covers.
pub fn setup_content() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_content(tmp.path());
    tmp
}

fn write_content(root: &Path) {
    std::fs::write(root.join("issues.toml"), FIXTURE_SHEET).unwrap();

    let pdfs = root.join("pdfs");
    std::fs::create_dir_all(&pdfs).unwrap();
    for n in 1..=3 {
        std::fs::write(
            pdfs.join(format!("newspaper-issue-{n}.pdf")),
            format!("%PDF-1.4 issue {n}"),
        )
        .unwrap();
    }

    let images = root.join("images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("newspaper-issue-1.jpg"), "jpeg one").unwrap();
    std::fs::write(images.join("newspaper-issue-3.png"), "png three").unwrap();
}
