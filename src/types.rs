//! Shared types for the catalog stage and everything that reads its output.
//!
//! [`Catalog`] is the wire shape of `issues.json`: the generator reads it, the
//! published site serves it, and the client-side model in [`crate::client`]
//! loads it. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// One published newspaper edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    /// Join key: the PDF file stem, e.g. `newspaper-issue-4`.
    pub title: String,
    /// Headline shown on cards.
    pub description: String,
    /// Display date, `MM-DD-YYYY` when the sheet held a real date.
    pub date: String,
    pub category: String,
    pub featured: bool,
    /// Cover image file id; `null` when no image matches the title.
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    pub pdf_url: String,
    pub pdf_id: String,
    /// Embeddable preview URL for the viewer.
    pub pdf_embed_url: String,
    /// Stable issue number, used as the click-statistics key.
    #[serde(default)]
    pub number: Option<u32>,
}

/// The full catalog as served to the client: `{ "issues": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub issues: Vec<IssueRecord>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}
