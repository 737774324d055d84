//! Category derivation, hero selection, and the grid/carousel subset.

use crate::types::IssueRecord;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Which categories the grid shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategorySelector {
    #[default]
    All,
    Category(String),
}

impl CategorySelector {
    pub fn matches(&self, issue: &IssueRecord) -> bool {
        match self {
            CategorySelector::All => true,
            CategorySelector::Category(name) => issue.category == *name,
        }
    }

    /// Value used for `data-category` attributes.
    pub fn key(&self) -> &str {
        match self {
            CategorySelector::All => "all",
            CategorySelector::Category(name) => name,
        }
    }
}

/// Categories in first-seen order, without the default category or blanks.
pub fn distinct_categories<'a>(issues: &'a [IssueRecord], default_category: &str) -> Vec<&'a str> {
    let mut categories: Vec<&str> = Vec::new();
    for issue in issues {
        let category = issue.category.as_str();
        if !category.is_empty() && category != default_category && !categories.contains(&category)
        {
            categories.push(category);
        }
    }
    categories
}

/// The hero issue: the first flagged one, else the first in catalog order.
pub fn featured_issue(issues: &[IssueRecord]) -> Option<&IssueRecord> {
    issues.iter().find(|i| i.featured).or_else(|| issues.first())
}

/// Issues matching `selector`, never including the hero issue.
pub fn filter_by_category<'a>(
    issues: &'a [IssueRecord],
    selector: &CategorySelector,
) -> Vec<&'a IssueRecord> {
    let hero = featured_issue(issues).map(|i| i.title.as_str());
    issues
        .iter()
        .filter(|i| selector.matches(i) && Some(i.title.as_str()) != hero)
        .collect()
}

/// Parse a catalog display date (`MM-DD-YYYY`, or ISO `YYYY-MM-DD`).
pub fn parse_display_date(date: &str) -> Option<NaiveDate> {
    let date = date.trim();
    NaiveDate::parse_from_str(date, crate::reconcile::DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()
}

/// Whether an issue dated `date` gets the NEW badge at `now`.
///
/// True when the date (at midnight) is later than `now - window_days`.
/// Free-text dates never qualify.
pub fn is_new(date: &str, now: NaiveDateTime, window_days: u32) -> bool {
    let Some(date) = parse_display_date(date) else {
        return false;
    };
    let cutoff = now - Duration::days(i64::from(window_days));
    date.and_hms_opt(0, 0, 0).is_some_and(|d| d > cutoff)
}
