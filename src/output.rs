//! CLI output formatting for all commands.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every issue is shown
//! by its positional index and title first; headline, category, date and the
//! files behind it follow as indented context lines.
//!
//! # Output Format
//!
//! ## Catalog
//!
//! ```text
//! Issues
//! 001 newspaper-issue-3 (Sports, 12-02-2024) featured
//!     Headline: Winter sports preview
//!     PDF: pdfs/newspaper-issue-3.pdf
//!     Cover: images/newspaper-issue-3.png
//! 002 newspaper-issue-2 (General, October 2024)
//!     Headline: Homecoming recap
//!     PDF: pdfs/newspaper-issue-2.pdf
//!     Cover: (placeholder)
//!
//! Catalog: 2 issues in 2 categories
//! ```
//!
//! ## Generate
//!
//! ```text
//! All issues → index.html (2 issues)
//! 001 Sports → category/sports/index.html (1 issue)
//! 002 General → category/general/index.html (1 issue)
//!
//! Generated 3 pages, copied 2 PDFs, 1 image
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::clicks::ClickRow;
use crate::client::filter;
use crate::generate::GenerateReport;
use crate::notify::NotifyOutcome;
use crate::subscribers::{Outcome, Subscriber};
use crate::types::{Catalog, IssueRecord};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 issue`, `2 issues`.
fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else if let Some(stem) = noun.strip_suffix('y') {
        format!("{} {}ies", n, stem)
    } else {
        format!("{} {}s", n, noun)
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Issue header: index, title, then category and date when present.
///
/// ```text
/// 001 newspaper-issue-3 (Sports, 12-02-2024) featured
/// 002 newspaper-issue-2 (General)
/// ```
fn issue_header(index: usize, issue: &IssueRecord) -> String {
    let mut line = format!("{} {}", format_index(index), issue.title);
    if issue.date.is_empty() {
        line.push_str(&format!(" ({})", issue.category));
    } else {
        line.push_str(&format!(" ({}, {})", issue.category, issue.date));
    }
    if issue.featured {
        line.push_str(" featured");
    }
    line
}

// ============================================================================
// Catalog output
// ============================================================================

/// Format the assembled catalog as an issue inventory.
pub fn format_catalog_output(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();
    if catalog.is_empty() {
        lines.push("No issues found.".to_string());
        return lines;
    }

    lines.push("Issues".to_string());
    for (i, issue) in catalog.issues.iter().enumerate() {
        lines.push(issue_header(i + 1, issue));
        if !issue.description.is_empty() {
            lines.push(format!(
                "{}Headline: {}",
                indent(1),
                truncate_desc(&issue.description, 60)
            ));
        }
        lines.push(format!("{}PDF: {}", indent(1), issue.pdf_url));
        match &issue.image_url {
            Some(url) => lines.push(format!("{}Cover: {}", indent(1), url)),
            None => lines.push(format!("{}Cover: (placeholder)", indent(1))),
        }
    }

    let categories = distinct_category_count(catalog);
    lines.push(String::new());
    lines.push(format!(
        "Catalog: {} in {}",
        plural(catalog.len(), "issue"),
        plural(categories, "category")
    ));
    lines
}

fn distinct_category_count(catalog: &Catalog) -> usize {
    // Every category counts here, the default one included.
    filter::distinct_categories(&catalog.issues, "").len()
}

pub fn print_catalog_output(catalog: &Catalog) {
    for line in format_catalog_output(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format content warnings: issues that will render with gaps.
///
/// Returns an empty list when every issue has a cover, a date and a number.
pub fn format_check_warnings(catalog: &Catalog) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, issue) in catalog.issues.iter().enumerate() {
        let mut problems = Vec::new();
        if issue.image_url.is_none() {
            problems.push("no cover image");
        }
        if issue.date.is_empty() {
            problems.push("no date");
        }
        if issue.number.is_none() {
            problems.push("no issue number (clicks not tracked)");
        }
        if problems.is_empty() {
            continue;
        }
        lines.push(format!("{} {}", format_index(i + 1), issue.title));
        for problem in problems {
            lines.push(format!("{}{}", indent(1), problem));
        }
    }
    if !lines.is_empty() {
        lines.insert(0, "Warnings".to_string());
    }
    lines
}

pub fn print_check_warnings(catalog: &Catalog) {
    for line in format_check_warnings(catalog) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate output
// ============================================================================

/// Format generate output: one line per written page, then totals.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut position = 0;
    for page in &report.pages {
        let count = plural(page.issue_count, "issue");
        match &page.category {
            None => lines.push(format!("All issues \u{2192} {} ({})", page.path, count)),
            Some(category) => {
                position += 1;
                lines.push(format!(
                    "{} {} \u{2192} {} ({})",
                    format_index(position),
                    category,
                    page.path,
                    count
                ));
            }
        }
    }
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, copied {}, {}",
        plural(report.pages.len(), "page"),
        plural(report.pdfs_copied, "PDF"),
        plural(report.images_copied, "image")
    ));
    lines
}

pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Side tables
// ============================================================================

pub fn format_outcome(outcome: &Outcome) -> String {
    if outcome.success {
        outcome.message.clone()
    } else {
        format!("Error: {}", outcome.message)
    }
}

/// Subscriber list, oldest first.
pub fn format_subscribers(subscribers: &[Subscriber]) -> Vec<String> {
    let mut lines: Vec<String> = subscribers
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{} {} (since {})",
                format_index(i + 1),
                s.email,
                s.subscribed_at.format("%Y-%m-%d")
            )
        })
        .collect();
    lines.push(plural(subscribers.len(), "subscriber"));
    lines
}

pub fn print_subscribers(subscribers: &[Subscriber]) {
    for line in format_subscribers(subscribers) {
        println!("{}", line);
    }
}

/// Click analytics table, aligned on the issue name column.
pub fn format_analytics(rows: &[ClickRow]) -> Vec<String> {
    if rows.is_empty() {
        return vec!["No clicks recorded.".to_string()];
    }
    let width = rows.iter().map(|r| r.issue_name.len()).max().unwrap_or(0);
    let mut lines = vec![format!("{:<width$}  Clicks", "Issue", width = width)];
    lines.extend(
        rows.iter()
            .map(|r| format!("{:<width$}  {}", r.issue_name, r.clicks, width = width)),
    );
    lines
}

pub fn print_analytics(rows: &[ClickRow]) {
    for line in format_analytics(rows) {
        println!("{}", line);
    }
}

pub fn format_notify_outcome(outcome: &NotifyOutcome) -> Vec<String> {
    match outcome {
        NotifyOutcome::UpToDate { current, last } => vec![format!(
            "Issue #{} already announced (last announced: #{})",
            current, last
        )],
        NotifyOutcome::Sent { number, report } => vec![
            format!("Announced issue #{}", number),
            report.to_string(),
        ],
    }
}

pub fn print_notify_outcome(outcome: &NotifyOutcome) {
    for line in format_notify_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GeneratedPage;
    use crate::notify::SendReport;
    use crate::test_helpers::*;
    use chrono::{TimeZone, Utc};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "issue"), "1 issue");
        assert_eq!(plural(0, "issue"), "0 issues");
        assert_eq!(plural(3, "PDF"), "3 PDFs");
        assert_eq!(plural(2, "category"), "2 categories");
    }

    #[test]
    fn truncate_desc_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate_desc(&text, 40), format!("{}...", "a".repeat(40)));
        assert_eq!(truncate_desc("short", 40), "short");
    }

    #[test]
    fn truncate_desc_multibyte() {
        assert_eq!(truncate_desc("ééééé", 2), "éé...");
    }

    // =========================================================================
    // Catalog tests
    // =========================================================================

    #[test]
    fn catalog_lists_issues_with_context() {
        let mut first = featured(issue("newspaper-issue-3", "Sports", "12-02-2024"));
        first.image_url = Some("images/newspaper-issue-3.png".into());
        let second = issue("newspaper-issue-2", "General", "");
        let lines = format_catalog_output(&catalog_of(vec![first, second]));

        assert_eq!(lines[0], "Issues");
        assert_eq!(lines[1], "001 newspaper-issue-3 (Sports, 12-02-2024) featured");
        assert_eq!(lines[2], "    Headline: newspaper-issue-3 headline");
        assert!(lines[3].starts_with("    PDF: "));
        assert_eq!(lines[4], "    Cover: images/newspaper-issue-3.png");
        assert_eq!(lines[5], "002 newspaper-issue-2 (General)");
        assert_eq!(lines.last().unwrap(), "Catalog: 2 issues in 2 categories");
    }

    #[test]
    fn catalog_single_category_wording() {
        let lines = format_catalog_output(&catalog_of(vec![issue("newspaper-issue-1", "News", "")]));
        assert_eq!(lines.last().unwrap(), "Catalog: 1 issue in 1 category");
    }

    #[test]
    fn empty_catalog() {
        assert_eq!(format_catalog_output(&Catalog::default()), vec!["No issues found."]);
    }

    #[test]
    fn check_warnings_list_gaps() {
        let mut complete = issue("newspaper-issue-1", "News", "09-05-2024");
        complete.image_url = Some("images/newspaper-issue-1.jpg".into());
        let gaps = issue("Special Edition", "News", "");
        let lines = format_check_warnings(&catalog_of(vec![complete, gaps]));
        assert_eq!(
            lines,
            vec![
                "Warnings",
                "002 Special Edition",
                "    no cover image",
                "    no date",
                "    no issue number (clicks not tracked)",
            ]
        );
    }

    #[test]
    fn check_warnings_empty_when_complete() {
        let mut complete = issue("newspaper-issue-1", "News", "09-05-2024");
        complete.image_url = Some("images/x.jpg".into());
        assert!(format_check_warnings(&catalog_of(vec![complete])).is_empty());
    }

    // =========================================================================
    // Generate tests
    // =========================================================================

    #[test]
    fn generate_lists_pages_and_totals() {
        let report = GenerateReport {
            pages: vec![
                GeneratedPage {
                    category: None,
                    path: "index.html".into(),
                    issue_count: 2,
                },
                GeneratedPage {
                    category: Some("Sports".into()),
                    path: "category/sports/index.html".into(),
                    issue_count: 1,
                },
            ],
            issues: 3,
            pdfs_copied: 3,
            images_copied: 1,
        };
        let lines = format_generate_output(&report);
        assert_eq!(lines[0], "All issues \u{2192} index.html (2 issues)");
        assert_eq!(lines[1], "001 Sports \u{2192} category/sports/index.html (1 issue)");
        assert_eq!(lines[3], "Generated 2 pages, copied 3 PDFs, 1 image");
    }

    // =========================================================================
    // Side table tests
    // =========================================================================

    #[test]
    fn outcome_prefixes_errors() {
        let ok = Outcome {
            success: true,
            message: "Subscription successful".into(),
        };
        let err = Outcome {
            success: false,
            message: "Email not found".into(),
        };
        assert_eq!(format_outcome(&ok), "Subscription successful");
        assert_eq!(format_outcome(&err), "Error: Email not found");
    }

    #[test]
    fn subscribers_listing() {
        let list = vec![Subscriber {
            email: "a@x.org".into(),
            subscribed_at: Utc.with_ymd_and_hms(2024, 9, 5, 8, 0, 0).unwrap(),
        }];
        assert_eq!(
            format_subscribers(&list),
            vec!["001 a@x.org (since 2024-09-05)", "1 subscriber"]
        );
    }

    #[test]
    fn analytics_table_aligns() {
        let rows = vec![
            ClickRow {
                issue_name: "newspaper-issue-1".into(),
                clicks: 4,
            },
            ClickRow {
                issue_name: "newspaper-issue-2".into(),
                clicks: 0,
            },
        ];
        let lines = format_analytics(&rows);
        assert_eq!(lines[0], "Issue              Clicks");
        assert_eq!(lines[1], "newspaper-issue-1  4");
        assert_eq!(format_analytics(&[]), vec!["No clicks recorded."]);
    }

    #[test]
    fn notify_outcomes() {
        let up_to_date = NotifyOutcome::UpToDate { current: 4, last: 4 };
        assert_eq!(
            format_notify_outcome(&up_to_date),
            vec!["Issue #4 already announced (last announced: #4)"]
        );
        let sent = NotifyOutcome::Sent {
            number: 5,
            report: SendReport { sent: 3, failed: 1 },
        };
        assert_eq!(
            format_notify_outcome(&sent),
            vec![
                "Announced issue #5",
                "Email campaign complete: 3 sent successfully, 1 failed"
            ]
        );
    }
}
