//! Browser-side model of the archive page.
//!
//! The published site ships a small script for interaction, but the rules it
//! follows live here as plain Rust state machines: which categories get tabs,
//! which issue is the hero, what the grid shows, how the carousel moves, and
//! when the PDF viewer paints. The generator drives these types to pre-render
//! the initial page, and the tests pin their behavior.
//!
//! | Type | Role |
//! |------|------|
//! | [`CatalogStore`] | loaded catalog, selected category, active view |
//! | [`filter`] | distinct categories, hero pick, filtered subset, NEW badge |
//! | [`CarouselController`] | circular single-slide viewport with settle window |
//! | [`IssueViewer`] | PDF modal with stale-render protection |

pub mod carousel;
pub mod filter;
pub mod store;
pub mod viewer;

pub use carousel::{CarouselController, Swipe, SwipeTracker};
pub use filter::CategorySelector;
pub use store::{CatalogStore, LoadState, View};
pub use viewer::{BrowserProfile, ClickAction, IssueViewer, PdfRenderer, RenderTicket};
