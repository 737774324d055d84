//! Centralized name handling: file stems, issue numbers, and URL slugs.
//!
//! The archive joins three sources on a shared name. A PDF called
//! `newspaper-issue-4.pdf`, a cover called `newspaper-issue-4.jpg` and a sheet
//! row titled `newspaper-issue-4` all describe the same issue. The stem rules
//! differ slightly per collection and are kept here so the indexer, the
//! reconciler and the click counter agree on them.
//!
//! ## Stems
//!
//! - PDFs: only a literal trailing `.pdf` is removed (`a.b.pdf` → `a.b`,
//!   `notes.PDF` stays `notes.PDF`).
//! - Images: the last dot-delimited extension is removed, whatever it is
//!   (`cover.final.webp` → `cover.final`).
//!
//! ## Issue numbers
//!
//! Titles following the `newspaper-issue-N` convention yield `N`. Any other
//! title yields its first embedded integer. Zero counts as "no number".

use regex::Regex;
use std::sync::OnceLock;

/// Title prefix used by the paper's file naming convention.
pub const ISSUE_PREFIX: &str = "newspaper-issue-";

/// Stem of a file in the PDF collection.
pub fn pdf_stem(name: &str) -> &str {
    name.strip_suffix(".pdf").unwrap_or(name)
}

/// Stem of a file in the image collection.
///
/// Strips the final `.ext` segment. A name without a dot, or ending in a bare
/// dot, is returned unchanged. A dotfile like `.cover` has an empty stem.
pub fn image_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() && !name[pos + 1..].contains('/') => &name[..pos],
        _ => name,
    }
}

/// Extract the numeric issue identifier from a title.
///
/// - `"newspaper-issue-4"` → `Some(4)`
/// - `"Spring Edition 12"` → `Some(12)`
/// - `"newspaper-issue-0"` / `"Special"` → `None`
pub fn issue_number(title: &str) -> Option<u32> {
    let number = if title.contains(ISSUE_PREFIX) {
        let rest = title.replacen(ISSUE_PREFIX, "", 1);
        leading_integer(rest.trim_start())
    } else {
        first_integer(title)
    };
    number.filter(|&n| n != 0)
}

/// Canonical title for an issue number (`4` → `newspaper-issue-4`).
pub fn issue_title(number: u32) -> String {
    format!("{ISSUE_PREFIX}{number}")
}

fn leading_integer(text: &str) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn first_integer(text: &str) -> Option<u32> {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"\d+").expect("static regex"));
    re.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Turn a category label into a URL path segment.
///
/// Lowercases ASCII letters, replaces every other non-alphanumeric run with a
/// single dash, and strips leading/trailing dashes. An all-symbol label
/// becomes `"category"` so the page still has a path.
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut prev_dash = true;
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "category".to_string()
    } else {
        trimmed.to_string()
    }
}
