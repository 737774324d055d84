//! # Newsstand
//!
//! A static archive site for a school newspaper. Published issues are PDFs in
//! one folder, their covers are images in another, and a metadata sheet lists
//! the issues with headline, date, category and a featured flag.
//!
//! # Architecture: Two-Stage Pipeline
//!
//! ```text
//! 1. Catalog   issues.toml + pdfs/ + images/  →  issues.json   (reconcile)
//! 2. Generate  issues.json                    →  dist/         (static site)
//! ```
//!
//! The catalog stage joins sheet rows to files by name: a row titled
//! `newspaper-issue-4` picks up `newspaper-issue-4.pdf` and
//! `newspaper-issue-4.jpg`. Rows without a PDF are dropped. The catalog is
//! plain JSON you can inspect or serve directly.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`files`] | File collections, content ids, stem → URL indexes |
//! | [`sheet`] | The metadata sheet: cells, rows, the TOML-backed source |
//! | [`reconcile`] | Stage 1: joins rows to files and builds the [`types::Catalog`] |
//! | [`generate`] | Stage 2: renders the site from the catalog using Maud |
//! | [`client`] | Browser-side state: store, category filter, carousel, PDF viewer |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`types`] | The catalog wire shape shared by every stage |
//! | [`naming`] | Title conventions: file stems, issue numbers, slugs |
//! | [`subscribers`] | Mailing-list side table |
//! | [`clicks`] | Per-issue click counters |
//! | [`notify`] | New-issue announcement emails |
//! | [`sidetable`] | JSON load/save shared by the side tables |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Degrade, Don't Fail
//!
//! A storage or sheet failure during cataloguing yields an empty catalog and
//! an error log line, never a crash. The site still builds and shows
//! "No issues found." until the source is fixed. [`reconcile::try_build_catalog`]
//! is there for callers that want the error.
//!
//! ## Client State in Rust
//!
//! The browser behaviour (category tabs, carousel, viewer modal) is modelled
//! as plain Rust state machines in [`client`]. The generator uses them to
//! pre-render each page in its initial state, and the small script shipped
//! with the site mirrors the same transitions.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): malformed markup
//! is a build error and all interpolation is auto-escaped, which matters for
//! headlines typed by students into a spreadsheet.

pub mod clicks;
pub mod client;
pub mod config;
pub mod files;
pub mod generate;
pub mod naming;
pub mod notify;
pub mod output;
pub mod reconcile;
pub mod sheet;
pub mod sidetable;
pub mod subscribers;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
