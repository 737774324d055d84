//! In-page PDF viewer modal.
//!
//! The viewer is a small state machine: hidden or visible, with a body that
//! moves through `Idle → Loading → Pages | Failed`, or straight to
//! `DirectDownload` in browsers that cannot embed PDFs.
//!
//! ## Stale renders
//!
//! Rendering is asynchronous and cannot be cancelled. Every [`IssueViewer::open`]
//! and [`IssueViewer::close`] bumps a generation counter; `open` hands out a
//! [`RenderTicket`] stamped with the generation it was issued for, and
//! [`IssueViewer::complete`] drops any result whose ticket is no longer current.
//! Closing mid-render, or opening another issue, can therefore never paint
//! the old document into the modal.
//!
//! ## Closing
//!
//! `close` hides the modal and unlocks scrolling immediately; the content is
//! wiped only once the clear delay has passed (see [`IssueViewer::tick`]), so
//! the closing transition still has something to show.

use crate::config::ViewerConfig;
use maud::{Markup, html};
use regex::Regex;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Title shown when an issue has none.
pub const DEFAULT_TITLE: &str = "Viewing PDF";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("failed to load PDF: {0}")]
    Load(String),
    #[error("failed to render page {page}: {reason}")]
    Page { page: u32, reason: String },
}

/// One page drawn to a canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedPage {
    pub number: u32,
    pub width: u32,
    pub height: u32,
}

/// What a renderer produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPdf {
    /// Total pages in the document, not just those rendered.
    pub page_count: u32,
    pub pages: Vec<RenderedPage>,
}

/// External PDF rendering capability.
pub trait PdfRenderer {
    /// Render up to `max_pages` leading pages of `pdf_url` at `scale`.
    fn render(&mut self, pdf_url: &str, max_pages: u32, scale: f32) -> Result<RenderedPdf, RenderError>;
}

/// Proof that a render was requested for a particular opening of the viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
    pdf_url: String,
}

impl RenderTicket {
    pub fn pdf_url(&self) -> &str {
        &self.pdf_url
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerBody {
    Idle,
    Loading,
    Pages {
        pages: Vec<RenderedPage>,
        /// The document's page count, set when it has more pages than were rendered.
        total_pages: Option<u32>,
    },
    DirectDownload,
    Failed,
}

#[derive(Debug)]
pub struct IssueViewer {
    max_pages: u32,
    scale: f32,
    clear_delay: Duration,
    visible: bool,
    title: String,
    pdf_url: Option<String>,
    body: ViewerBody,
    generation: u64,
    clear_at: Option<Instant>,
}

impl IssueViewer {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            scale: config.scale,
            clear_delay: Duration::from_millis(config.clear_delay_ms),
            visible: false,
            title: String::new(),
            pdf_url: None,
            body: ViewerBody::Idle,
            generation: 0,
            clear_at: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Background scrolling is locked exactly while the modal is visible.
    pub fn scroll_locked(&self) -> bool {
        self.visible
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pdf_url(&self) -> Option<&str> {
        self.pdf_url.as_deref()
    }

    pub fn body(&self) -> &ViewerBody {
        &self.body
    }

    /// Show the modal for a PDF.
    ///
    /// Returns a ticket when the caller should render the document, or `None`
    /// when the browser is embed-hostile and a download link is shown instead.
    pub fn open(&mut self, pdf_url: &str, title: Option<&str>, browser: &BrowserProfile) -> Option<RenderTicket> {
        self.generation += 1;
        self.clear_at = None;
        self.visible = true;
        self.pdf_url = Some(pdf_url.to_string());
        self.title = title
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        if browser.embed_hostile() {
            tracing::debug!(pdf_url, "embed-hostile browser, offering direct download");
            self.body = ViewerBody::DirectDownload;
            return None;
        }

        self.body = ViewerBody::Loading;
        Some(RenderTicket {
            generation: self.generation,
            pdf_url: pdf_url.to_string(),
        })
    }

    /// Apply a render result. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn complete(&mut self, ticket: RenderTicket, result: Result<RenderedPdf, RenderError>) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                pdf_url = ticket.pdf_url.as_str(),
                "discarding stale render result"
            );
            return false;
        }

        self.body = match result {
            Ok(mut pdf) => {
                pdf.pages.truncate(self.max_pages as usize);
                let total_pages = (pdf.page_count > self.max_pages).then_some(pdf.page_count);
                ViewerBody::Pages {
                    pages: pdf.pages,
                    total_pages,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, pdf_url = ticket.pdf_url.as_str(), "PDF render failed");
                ViewerBody::Failed
            }
        };
        true
    }

    /// Run `renderer` for `ticket` and apply the result.
    pub fn render_with(&mut self, ticket: RenderTicket, renderer: &mut dyn PdfRenderer) -> bool {
        let result = renderer.render(&ticket.pdf_url, self.max_pages, self.scale);
        self.complete(ticket, result)
    }

    /// Hide the modal. Content is cleared by a later [`tick`](Self::tick).
    pub fn close(&mut self, now: Instant) {
        if !self.visible {
            return;
        }
        self.visible = false;
        self.generation += 1;
        self.clear_at = Some(now + self.clear_delay);
    }

    /// Advance the clock; wipes content once the clear delay has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if self.clear_at.is_some_and(|at| now >= at) {
            self.clear_at = None;
            self.body = ViewerBody::Idle;
            self.pdf_url = None;
            self.title.clear();
        }
    }

    /// The modal element for the current state.
    pub fn render(&self) -> Markup {
        let url = self.pdf_url.as_deref().unwrap_or("");
        html! {
            div.pdf-modal.active[self.visible] #pdfModal role="dialog" aria-modal="true" aria-labelledby="pdfModalTitle" {
                div.pdf-modal-content {
                    div.pdf-modal-header {
                        h3.pdf-modal-title #pdfModalTitle { (self.title) }
                        div.pdf-modal-actions {
                            a.btn #pdfDownloadBtn href=(url) target="_blank" rel="noopener" { "Download" }
                            button.pdf-close #pdfCloseBtn type="button" aria-label="Close" { "×" }
                        }
                    }
                    (self.render_body(url))
                }
            }
        }
    }

    fn render_body(&self, url: &str) -> Markup {
        html! {
            @match &self.body {
                ViewerBody::Idle => {
                    div.pdf-container #pdfContainer {}
                }
                ViewerBody::Loading => {
                    div.pdf-container #pdfContainer { div.spinner {} }
                }
                ViewerBody::Pages { pages, total_pages } => {
                    div.pdf-container #pdfContainer {
                        @for page in pages {
                            div.pdf-page {
                                canvas data-page=(page.number) width=(page.width) height=(page.height) {}
                            }
                        }
                        @if let Some(total) = total_pages {
                            div.more-pages-message {
                                p { "Only showing first " (self.max_pages) " pages. Download the PDF to view all " (total) " pages." }
                                a.btn href=(url) target="_blank" rel="noopener" { "Download Full PDF" }
                            }
                        }
                    }
                }
                ViewerBody::DirectDownload => {
                    div.direct-download-button {
                        a.btn #directPdfLink href=(url) download=(format!("{}.pdf", self.title)) { "Open PDF" }
                    }
                }
                ViewerBody::Failed => {
                    div.pdf-container #pdfContainer {
                        div.pdf-error {
                            p { "Error loading PDF. Please try downloading it instead." }
                            a.btn href=(url) target="_blank" rel="noopener" { "Download PDF" }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Browser detection
// ============================================================================

/// What a click on an issue card should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Leave the page and load the PDF directly.
    NavigateToPdf,
    OpenModal,
}

/// User-agent facts relevant to PDF embedding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserProfile {
    pub instagram: bool,
    pub safari: bool,
    pub facebook: bool,
    pub in_app: bool,
    pub from_instagram: bool,
    pub mobile: bool,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

static INSTAGRAM: OnceLock<Regex> = OnceLock::new();
static SAFARI: OnceLock<Regex> = OnceLock::new();
static CHROME_OR_ANDROID: OnceLock<Regex> = OnceLock::new();
static FACEBOOK: OnceLock<Regex> = OnceLock::new();
static IN_APP: OnceLock<Regex> = OnceLock::new();

impl BrowserProfile {
    pub fn detect(user_agent: &str, referrer: &str, mobile: bool) -> Self {
        Self {
            instagram: regex(&INSTAGRAM, "Instagram").is_match(user_agent),
            safari: is_plain_safari(user_agent),
            facebook: regex(&FACEBOOK, "FBAN|FBAV").is_match(user_agent),
            in_app: regex(&IN_APP, "Twitter|Line|WhatsApp|wv").is_match(user_agent),
            from_instagram: referrer.contains("instagram"),
            mobile,
        }
    }

    /// Browsers that cannot show embedded PDFs get a download link instead.
    pub fn embed_hostile(&self) -> bool {
        self.instagram || self.safari || self.facebook || self.in_app
    }

    pub fn click_action(&self) -> ClickAction {
        if self.mobile && (self.from_instagram || self.facebook || self.in_app) {
            ClickAction::NavigateToPdf
        } else {
            ClickAction::OpenModal
        }
    }
}

/// Safari proper: "safari" with no "chrome" or "android" before it.
fn is_plain_safari(user_agent: &str) -> bool {
    let Some(found) = regex(&SAFARI, "(?i)safari").find(user_agent) else {
        return false;
    };
    !regex(&CHROME_OR_ANDROID, "(?i)chrome|android").is_match(&user_agent[..found.start()])
}
