//! HTML site generation.
//!
//! Stage 2 of the newsstand build pipeline. Takes the catalog written by the
//! catalog stage and generates the final static site.
//!
//! ## Generated Pages
//!
//! - **Archive page** (`/index.html`): hero issue, category tabs, issue grid,
//!   mobile carousel, PDF viewer modal, footer (with a subscribe form when
//!   `site.subscribe_url` is set)
//! - **Category pages** (`/category/{slug}/index.html`): the same page with one
//!   category selected; the tabs link between them
//!
//! Initial page state comes from [`crate::client`]: the store decides the hero,
//! the tabs and the visible subset, the carousel decides which slide starts
//! active, and the viewer renders its (hidden) modal shell.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html
//! ├── issues.json               # catalog, served for client fetches
//! ├── style.css                 # colors injected from config
//! ├── archive.js
//! ├── category/
//! │   └── sports/index.html
//! ├── pdfs/
//! │   └── newspaper-issue-3.pdf
//! └── images/
//!     ├── newspaper-issue-1.jpg
//!     └── placeholder.svg
//! ```
//!
//! ## NEW badges
//!
//! Computed at build time against the clock passed to [`generate`]. A site
//! that is not rebuilt keeps its badges; rebuild on a schedule if that
//! matters.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Templates are type-safe Rust code with automatic XSS escaping.

use crate::client::carousel::CarouselController;
use crate::client::filter::{self, CategorySelector};
use crate::client::store::CatalogStore;
use crate::client::viewer::IssueViewer;
use crate::config::{self, SiteConfig};
use crate::naming;
use crate::types::{Catalog, IssueRecord};
use chrono::{Datelike, NaiveDateTime};
use maud::{DOCTYPE, Markup, html};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS: &str = include_str!("../static/archive.js");
const PLACEHOLDER_SVG: &str = include_str!("../static/placeholder.svg");

/// Cover shown for issues without an image.
pub const PLACEHOLDER_IMAGE: &str = "images/placeholder.svg";

/// One written HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    /// `None` for the all-issues page.
    pub category: Option<String>,
    /// Path relative to the output directory.
    pub path: String,
    /// Issues in the grid (hero excluded).
    pub issue_count: usize,
}

/// What a generate run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub pages: Vec<GeneratedPage>,
    pub issues: usize,
    pub pdfs_copied: usize,
    pub images_copied: usize,
}

/// Generate the site from a catalog file.
///
/// `content_root` holds the `pdfs/` and `images/` folders named by the config;
/// they are copied as-is so relative catalog URLs resolve.
pub fn generate(
    catalog_path: &Path,
    content_root: &Path,
    output_dir: &Path,
    config: &SiteConfig,
    now: NaiveDateTime,
) -> Result<GenerateReport, GenerateError> {
    let catalog: Catalog = serde_json::from_str(&fs::read_to_string(catalog_path)?)?;

    let color_css = config::generate_color_css(&config.colors);
    let css = format!("{}\n\n{}", color_css, CSS_STATIC);

    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join("style.css"), css)?;
    fs::write(output_dir.join("archive.js"), JS)?;
    fs::write(output_dir.join("issues.json"), serde_json::to_string_pretty(&catalog)?)?;

    let pdfs_copied = copy_flat(
        &content_root.join(&config.sources.pdfs),
        &output_dir.join("pdfs"),
    )?;
    let images_copied = copy_flat(
        &content_root.join(&config.sources.images),
        &output_dir.join("images"),
    )?;
    fs::write(output_dir.join(PLACEHOLDER_IMAGE), PLACEHOLDER_SVG)?;

    let mut report = GenerateReport {
        issues: catalog.len(),
        pdfs_copied,
        images_copied,
        ..Default::default()
    };

    let mut store = CatalogStore::from_catalog(catalog, config.catalog.default_category.clone());
    let slugs = category_slugs(&store.categories());

    let index = render_archive_page(&store, &slugs, config, now, "");
    fs::write(output_dir.join("index.html"), index.into_string())?;
    report.pages.push(GeneratedPage {
        category: None,
        path: "index.html".to_string(),
        issue_count: store.visible().len(),
    });

    for (category, slug) in &slugs {
        store.select_category(CategorySelector::Category(category.clone()));
        let page_dir = output_dir.join("category").join(slug);
        fs::create_dir_all(&page_dir)?;

        let page = render_archive_page(&store, &slugs, config, now, "../../");
        fs::write(page_dir.join("index.html"), page.into_string())?;
        report.pages.push(GeneratedPage {
            category: Some(category.clone()),
            path: format!("category/{}/index.html", slug),
            issue_count: store.visible().len(),
        });
    }

    Ok(report)
}

/// Copy the regular, non-hidden files of `src` into `dst`. A missing `src`
/// copies nothing.
fn copy_flat(src: &Path, dst: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(dst)?;
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') || !entry.file_type()?.is_file() {
            continue;
        }
        fs::copy(entry.path(), dst.join(&name))?;
        copied += 1;
    }
    Ok(copied)
}

/// Pair each category with a unique URL slug, in tab order.
pub fn category_slugs(categories: &[&str]) -> Vec<(String, String)> {
    let mut used = HashSet::new();
    categories
        .iter()
        .map(|category| {
            let base = naming::slugify(category);
            let mut slug = base.clone();
            let mut n = 2;
            while !used.insert(slug.clone()) {
                slug = format!("{}-{}", base, n);
                n += 1;
            }
            (category.to_string(), slug)
        })
        .collect()
}

/// Prefix a relative URL so it resolves from a nested page.
fn site_url(base: &str, url: &str) -> String {
    if url.contains("://") || url.starts_with('/') {
        url.to_string()
    } else {
        format!("{}{}", base, url)
    }
}

fn asset_version() -> String {
    let hash = env!("GIT_HASH");
    if hash.is_empty() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), hash)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, base: &str, config: &SiteConfig, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href={ (base) "style.css?v=" (asset_version()) };
            }
            body
                data-settle-ms=(config.carousel.settle_ms)
                data-swipe-threshold=(config.carousel.swipe_threshold)
                data-clear-delay-ms=(config.viewer.clear_delay_ms)
                data-max-pages=(config.viewer.max_pages)
                data-scale=(config.viewer.scale)
                data-pdfjs-worker=(config.viewer.pdfjs_worker_src)
            {
                (content)
                script src=(config.viewer.pdfjs_src) {}
                script src={ (base) "archive.js" } {}
            }
        }
    }
}

fn site_header(config: &SiteConfig, base: &str) -> Markup {
    html! {
        header.site-header {
            a.site-title href={ (base) "index.html" } { (config.site.title) }
            p.site-tagline { (config.site.tagline) }
        }
    }
}

/// Data attributes the script needs to open an issue.
fn issue_link(issue: &IssueRecord, base: &str, body: Markup) -> Markup {
    html! {
        a.issue-link
            href=(site_url(base, &issue.pdf_url))
            data-pdf-url=(site_url(base, &issue.pdf_url))
            data-title=(issue.title)
            data-number=[issue.number]
        {
            (body)
        }
    }
}

fn cover_image(issue: &IssueRecord, base: &str) -> Markup {
    let src = issue.image_url.as_deref().unwrap_or(PLACEHOLDER_IMAGE);
    html! {
        img src=(site_url(base, src)) alt=(issue.title) loading="lazy";
    }
}

/// Renders the hero block for the featured issue
fn render_featured(issue: &IssueRecord, config: &SiteConfig, base: &str) -> Markup {
    html! {
        section.featured-issue #featuredIssue {
            div.featured-image {
                (cover_image(issue, base))
                div.featured-badge { "Latest Issue" }
            }
            div.featured-content {
                div.featured-date { (issue.date) }
                h2.featured-title { (issue.description) }
                p.featured-description { (config.site.featured_blurb) }
                (issue_link(issue, base, html! { span.btn { "Read Now" } }))
            }
        }
    }
}

/// Renders the category tabs, or nothing when there is only the default category
pub fn render_category_tabs(
    slugs: &[(String, String)],
    selector: &CategorySelector,
    base: &str,
) -> Markup {
    html! {
        @if !slugs.is_empty() {
            nav.category-tabs #categoryTabs {
                a.category-tab.active[*selector == CategorySelector::All]
                    href={ (base) "index.html" } data-category="all" { "All Issues" }
                @for (category, slug) in slugs {
                    @let active = matches!(selector, CategorySelector::Category(c) if c == category);
                    a.category-tab.active[active]
                        href={ (base) "category/" (slug) "/index.html" } data-category=(category) { (category) }
                }
            }
        }
    }
}

fn render_card(issue: &IssueRecord, is_new: bool, base: &str) -> Markup {
    html! {
        (issue_link(issue, base, html! {
            div.issue-image {
                (cover_image(issue, base))
                @if is_new {
                    div.new-badge { "NEW" }
                }
                div.issue-date { (issue.date) }
            }
            div.issue-content {
                h3.issue-title {
                    @if issue.description.is_empty() { (issue.title) } @else { (issue.description) }
                }
                div.issue-footer {
                    span.read-more { "Read More →" }
                }
            }
        }))
    }
}

/// Renders the issue grid for the visible subset
pub fn render_grid(visible: &[&IssueRecord], config: &SiteConfig, now: NaiveDateTime, base: &str) -> Markup {
    html! {
        div.issues-grid #issuesGrid {
            @for issue in visible {
                div.issue-card {
                    (render_card(issue, filter::is_new(&issue.date, now, config.site.new_badge_days), base))
                }
            }
        }
    }
}

/// Renders the mobile carousel; navigation controls only when it can move
pub fn render_carousel(
    visible: &[&IssueRecord],
    carousel: Option<&CarouselController>,
    config: &SiteConfig,
    now: NaiveDateTime,
    base: &str,
) -> Markup {
    let active = |i: usize| carousel.map_or(i == 0, |c| c.is_active(i));
    html! {
        @if !visible.is_empty() {
            div.carousel #issuesCarousel {
                div.carousel-track #carouselContainer {
                    @for (i, issue) in visible.iter().enumerate() {
                        div.carousel-slide.active[active(i)] data-index=(i) {
                            div.issue-card {
                                (render_card(issue, filter::is_new(&issue.date, now, config.site.new_badge_days), base))
                            }
                        }
                    }
                }
                @if carousel.is_some() {
                    button.carousel-prev #carouselPrev type="button" aria-label="Previous issue" { "‹" }
                    button.carousel-next #carouselNext type="button" aria-label="Next issue" { "›" }
                    div.carousel-dots #carouselDots {
                        @for i in 0..visible.len() {
                            button.carousel-dot.active[active(i)] type="button" data-index=(i) aria-label={ "Issue " (i + 1) } {}
                        }
                    }
                }
            }
        }
    }
}

fn render_footer(config: &SiteConfig, now: NaiveDateTime) -> Markup {
    html! {
        footer.site-footer {
            @if let Some(action) = &config.site.subscribe_url {
                section.subscribe #subscribe {
                    h2 { "Get new issues by email" }
                    form.subscribe-form #subscribeForm action=(action) method="post" {
                        input type="email" name="email" placeholder="you@example.com" required;
                        button.btn type="submit" { "Subscribe" }
                    }
                }
            }
            @if let Some(locations) = &config.site.print_locations {
                p.print-locations { (locations) }
            }
            p.copyright { "© " span #currentYear { (now.year()) } " " (config.site.title) }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the archive page for the store's current category selection
pub fn render_archive_page(
    store: &CatalogStore,
    slugs: &[(String, String)],
    config: &SiteConfig,
    now: NaiveDateTime,
    base: &str,
) -> Markup {
    let visible = store.visible();
    let carousel = store.carousel(Duration::from_millis(config.carousel.settle_ms));
    let viewer = IssueViewer::new(&config.viewer);

    let title = match store.selector() {
        CategorySelector::All => config.site.title.clone(),
        CategorySelector::Category(c) => format!("{} - {}", c, config.site.title),
    };

    let content = html! {
        (site_header(config, base))
        main.archive-page {
            @if let Some(hero) = store.featured() {
                (render_featured(hero, config, base))
            }
            (render_category_tabs(slugs, store.selector(), base))
            @if let Some(message) = store.message() {
                p.no-issues { (message) }
            } @else {
                (render_grid(&visible, config, now, base))
                (render_carousel(&visible, carousel.as_ref(), config, now, base))
            }
        }
        (viewer.render())
        (render_footer(config, now))
    };

    base_document(&title, base, config, content)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample_store() -> CatalogStore {
        CatalogStore::from_catalog(
            catalog_of(vec![
                issue("newspaper-issue-4", "News", "03-15-2024"),
                featured(issue("newspaper-issue-3", "Sports", "02-01-2024")),
                issue("newspaper-issue-2", "General", "01-01-2024"),
                issue("newspaper-issue-1", "News", "December 2023"),
            ]),
            "General",
        )
    }

    fn page(store: &CatalogStore) -> String {
        let slugs = category_slugs(&store.categories());
        render_archive_page(store, &slugs, &SiteConfig::default(), now(), "").into_string()
    }

    #[test]
    fn archive_page_includes_doctype_and_title() {
        let html = page(&sample_store());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Raider Report</title>"));
    }

    #[test]
    fn hero_is_flagged_issue_and_not_in_grid() {
        let html = page(&sample_store());
        assert!(html.contains("featured-issue"));
        assert!(html.contains("newspaper-issue-3 headline"));
        assert_eq!(html.matches(r#"data-title="newspaper-issue-3""#).count(), 1);
        // grid + carousel
        assert_eq!(html.matches(r#"data-title="newspaper-issue-4""#).count(), 2);
    }

    #[test]
    fn tabs_link_category_pages() {
        let html = page(&sample_store());
        assert!(html.contains("All Issues"));
        assert!(html.contains(r#"href="category/news/index.html""#));
        assert!(html.contains(r#"href="category/sports/index.html""#));
        assert!(!html.contains(r#"data-category="General""#));
    }

    #[test]
    fn no_tabs_with_only_default_category() {
        let store = CatalogStore::from_catalog(
            catalog_of(vec![issue("a", "General", ""), issue("b", "General", "")]),
            "General",
        );
        assert!(!page(&store).contains("category-tabs"));
    }

    #[test]
    fn new_badge_only_for_recent_dates() {
        let html = page(&sample_store());
        // issue-4 (03-15) in grid + carousel; issue-2 and free-text issue-1 never
        assert_eq!(html.matches("new-badge").count(), 2);
    }

    #[test]
    fn placeholder_used_without_cover() {
        let html = page(&sample_store());
        assert!(html.contains(r#"src="images/placeholder.svg""#));
    }

    #[test]
    fn empty_catalog_shows_message() {
        let store = CatalogStore::from_catalog(Catalog::default(), "General");
        let html = page(&store);
        assert!(html.contains("No issues found."));
        assert!(!html.contains("featured-issue"));
        assert!(!html.contains("issuesGrid"));
    }

    #[test]
    fn empty_category_shows_message() {
        let mut store = sample_store();
        store.select_category(CategorySelector::Category("Sports".into()));
        let html = page(&store);
        assert!(html.contains("No issues found in this category."));
    }

    #[test]
    fn carousel_first_slide_active_and_controls_when_movable() {
        let html = page(&sample_store());
        assert_eq!(html.matches(r#"class="carousel-slide active""#).count(), 1);
        assert_eq!(html.matches(r#"class="carousel-dot active""#).count(), 1);
        assert!(html.contains("carouselNext"));
    }

    #[test]
    fn single_slide_carousel_has_no_controls() {
        let store = CatalogStore::from_catalog(
            catalog_of(vec![issue("hero", "General", ""), issue("only", "General", "")]),
            "General",
        );
        let html = page(&store);
        assert!(html.contains("carousel-slide active"));
        assert!(!html.contains("carouselNext"));
        assert!(!html.contains("carousel-dot"));
    }

    #[test]
    fn viewer_modal_rendered_hidden() {
        let html = page(&sample_store());
        assert!(html.contains(r#"class="pdf-modal""#));
        assert!(!html.contains("pdf-modal active"));
    }

    #[test]
    fn nested_pages_prefix_relative_urls() {
        let store = sample_store();
        let slugs = category_slugs(&store.categories());
        let html = render_archive_page(&store, &slugs, &SiteConfig::default(), now(), "../../").into_string();
        assert!(html.contains(r#"href="../../pdfs/newspaper-issue-4.pdf""#));
        assert!(html.contains(r#"src="../../archive.js""#));
    }

    #[test]
    fn absolute_urls_are_not_prefixed() {
        assert_eq!(site_url("../../", "https://x/y.pdf"), "https://x/y.pdf");
        assert_eq!(site_url("../../", "/pdfs/a.pdf"), "/pdfs/a.pdf");
        assert_eq!(site_url("../../", "pdfs/a.pdf"), "../../pdfs/a.pdf");
    }

    #[test]
    fn category_slugs_are_unique() {
        let slugs = category_slugs(&["News", "news!", "Sports"]);
        let only: Vec<&str> = slugs.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(only, vec!["news", "news-2", "sports"]);
    }

    #[test]
    fn html_escape_in_maud() {
        let store = CatalogStore::from_catalog(
            catalog_of(vec![issue("<script>alert('x')</script>", "General", "")]),
            "General",
        );
        let html = page(&store);
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn footer_shows_year_and_print_locations() {
        let mut config = SiteConfig::default();
        config.site.print_locations = Some("Library and front office".into());
        let store = sample_store();
        let html = render_archive_page(&store, &[], &config, now(), "").into_string();
        assert!(html.contains("2024"));
        assert!(html.contains("Library and front office"));
    }

    #[test]
    fn subscribe_form_only_with_endpoint() {
        let store = sample_store();
        let html = render_archive_page(&store, &[], &SiteConfig::default(), now(), "").into_string();
        assert!(!html.contains("subscribeForm"));

        let mut config = SiteConfig::default();
        config.site.subscribe_url = Some("https://example.org/subscribe".into());
        let html = render_archive_page(&store, &[], &config, now(), "").into_string();
        assert!(html.contains(r#"action="https://example.org/subscribe""#));
    }

    #[test]
    fn viewer_settings_reach_the_script() {
        let mut config = SiteConfig::default();
        config.viewer.max_pages = 3;
        let html = render_archive_page(&sample_store(), &[], &config, now(), "").into_string();
        assert!(html.contains(r#"data-max-pages="3""#));
        assert!(html.contains(r#"data-scale="1.5""#));
        assert!(html.contains(r#"data-pdfjs-worker="https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.worker.min.js""#));
        let pdfjs = html.find(r#"src="https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js""#);
        let script = html.find(r#"src="archive.js""#);
        assert!(pdfjs.is_some() && pdfjs < script);
    }

    #[test]
    fn generate_writes_site() {
        let content = setup_content();
        let out = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let catalog = crate::reconcile::build_catalog(
            crate::reconcile::LocalSources::new(content.path(), &config.sources).as_sources(),
            &config,
        );
        let catalog_path = content.path().join("issues.json");
        fs::write(&catalog_path, serde_json::to_string(&catalog).unwrap()).unwrap();

        let report = generate(&catalog_path, content.path(), out.path(), &config, now()).unwrap();

        assert_eq!(report.issues, 3);
        assert_eq!(report.pdfs_copied, 3);
        assert_eq!(report.images_copied, 2);
        assert!(out.path().join("index.html").exists());
        assert!(out.path().join("issues.json").exists());
        assert!(out.path().join("style.css").exists());
        assert!(out.path().join("archive.js").exists());
        assert!(out.path().join("images/placeholder.svg").exists());
        assert!(out.path().join("pdfs/newspaper-issue-2.pdf").exists());
        assert!(out.path().join("category/news/index.html").exists());
        assert!(out.path().join("category/sports/index.html").exists());

        let paths: Vec<&str> = report.pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["index.html", "category/sports/index.html", "category/news/index.html"]
        );
        let css = fs::read_to_string(out.path().join("style.css")).unwrap();
        assert!(css.contains("--color-bg"));
    }

    #[test]
    fn generate_with_missing_folders_still_writes_pages() {
        let content = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let catalog_path = content.path().join("issues.json");
        fs::write(&catalog_path, r#"{"issues":[]}"#).unwrap();

        let report = generate(&catalog_path, content.path(), out.path(), &SiteConfig::default(), now()).unwrap();
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.pdfs_copied, 0);
        let html = fs::read_to_string(out.path().join("index.html")).unwrap();
        assert!(html.contains("No issues found."));
    }
}
