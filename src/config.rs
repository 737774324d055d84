//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's `config.toml` in the content root; the file only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! title = "Raider Report"
//! tagline = "Fryeburg Academy's Student Publication"
//! new_badge_days = 14
//!
//! [sources]
//! sheet = "issues.toml"     # Metadata sheet, relative to the content root
//! sheet_name = "Sheet1"
//! pdfs = "pdfs"
//! images = "images"
//!
//! [catalog]
//! default_category = "General"
//! on_duplicate_stem = "newest"   # or "reject"
//!
//! [urls]
//! pdf_view = "pdfs/{name}"
//! pdf_embed = "pdfs/{name}"
//! image = "images/{name}"
//!
//! [carousel]
//! settle_ms = 400
//! swipe_threshold = 50
//!
//! [viewer]
//! max_pages = 5
//! scale = 1.5
//! clear_delay_ms = 300
//! pdfjs_src = "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Masthead text and render-time display settings.
    pub site: SiteInfo,
    /// Where the sheet and the two file collections live.
    pub sources: SourcesConfig,
    /// Reconciliation policy.
    pub catalog: CatalogConfig,
    /// URL templates for file references.
    pub urls: UrlsConfig,
    /// Mobile carousel timing and gesture settings.
    pub carousel: CarouselConfig,
    /// PDF viewer settings.
    pub viewer: ViewerConfig,
    /// Color schemes for light and dark modes.
    pub colors: ColorConfig,
    /// New-issue notification settings.
    pub notify: NotifyConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.default_category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "catalog.default_category must not be empty".into(),
            ));
        }
        for (key, template) in [
            ("urls.pdf_view", &self.urls.pdf_view),
            ("urls.pdf_embed", &self.urls.pdf_embed),
            ("urls.image", &self.urls.image),
        ] {
            if !template.contains("{id}") && !template.contains("{name}") {
                return Err(ConfigError::Validation(format!(
                    "{key} must contain {{id}} or {{name}}"
                )));
            }
        }
        if self.viewer.max_pages == 0 {
            return Err(ConfigError::Validation(
                "viewer.max_pages must be at least 1".into(),
            ));
        }
        if self.viewer.scale.is_nan() || self.viewer.scale <= 0.0 {
            return Err(ConfigError::Validation(
                "viewer.scale must be positive".into(),
            ));
        }
        if self.viewer.pdfjs_src.is_empty() {
            return Err(ConfigError::Validation(
                "viewer.pdfjs_src must not be empty".into(),
            ));
        }
        if self.carousel.settle_ms == 0 {
            return Err(ConfigError::Validation(
                "carousel.settle_ms must be non-zero".into(),
            ));
        }
        if self.site.new_badge_days == 0 {
            return Err(ConfigError::Validation(
                "site.new_badge_days must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Masthead and display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    /// Paper name, used in the header, page titles and notification emails.
    pub title: String,
    /// One-line description under the masthead.
    pub tagline: String,
    /// Blurb shown under the featured issue headline.
    pub featured_blurb: String,
    /// Public address of the archive, linked from notification emails.
    pub home_url: String,
    /// Where printed copies can be picked up (shown in emails, optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_locations: Option<String>,
    /// Form endpoint that accepts `email` posts. No subscribe form without it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe_url: Option<String>,
    /// Issues dated within this many days before the build get a NEW badge.
    pub new_badge_days: u32,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            title: "Raider Report".to_string(),
            tagline: "Fryeburg Academy's Student Publication".to_string(),
            featured_blurb: "Check out our latest issue, featuring school news, sports updates, and student achievements.".to_string(),
            home_url: "https://example.org/raider-report".to_string(),
            print_locations: None,
            subscribe_url: None,
            new_badge_days: 14,
        }
    }
}

/// Locations of the three data sources, relative to the content root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    /// TOML file holding the metadata sheet(s).
    pub sheet: String,
    /// Which sheet inside that file holds the issue rows.
    pub sheet_name: String,
    /// Folder of issue PDFs.
    pub pdfs: String,
    /// Folder of cover images.
    pub images: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            sheet: "issues.toml".to_string(),
            sheet_name: "Sheet1".to_string(),
            pdfs: "pdfs".to_string(),
            images: "images".to_string(),
        }
    }
}

/// What to do when two files in one collection share a stem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Most recently modified file wins; ties go to the greatest file name.
    #[default]
    Newest,
    /// Fail the index build.
    Reject,
}

/// Reconciliation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Category applied to rows that leave the category cell empty.
    pub default_category: String,
    /// Collision handling for duplicate file stems.
    pub on_duplicate_stem: DuplicatePolicy,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_category: "General".to_string(),
            on_duplicate_stem: DuplicatePolicy::Newest,
        }
    }
}

/// URL templates. `{id}` expands to the file id, `{name}` to the
/// URL-encoded file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlsConfig {
    /// Shareable link to a PDF.
    pub pdf_view: String,
    /// Embeddable preview of a PDF.
    pub pdf_embed: String,
    /// Cover image.
    pub image: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            pdf_view: "pdfs/{name}".to_string(),
            pdf_embed: "pdfs/{name}".to_string(),
            image: "images/{name}".to_string(),
        }
    }
}

/// Expand a URL template for one file.
pub fn expand_url(template: &str, id: &str, name: &str) -> String {
    template
        .replace("{id}", id)
        .replace("{name}", &urlencoding::encode(name))
}

/// Mobile carousel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarouselConfig {
    /// Slide transition duration; navigation is locked for this long.
    pub settle_ms: u64,
    /// Minimum horizontal travel (px) for a touch to count as a swipe.
    pub swipe_threshold: f64,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            settle_ms: 400,
            swipe_threshold: 50.0,
        }
    }
}

const PDFJS_SRC: &str = "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js";
const PDFJS_WORKER_SRC: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.worker.min.js";

/// PDF viewer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Pages rendered inline before offering the full download.
    pub max_pages: u32,
    /// Render scale factor for page canvases.
    pub scale: f32,
    /// Delay between closing the modal and wiping its content.
    pub clear_delay_ms: u64,
    /// pdf.js build loaded by the site for page rendering.
    pub pdfjs_src: String,
    /// Worker script matching `pdfjs_src`.
    pub pdfjs_worker_src: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            scale: 1.5,
            clear_delay_ms: 300,
            pdfjs_src: PDFJS_SRC.to_string(),
            pdfjs_worker_src: PDFJS_WORKER_SRC.to_string(),
        }
    }
}

/// New-issue notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Display name on outgoing mail.
    pub sender_name: String,
    /// Subject line; `{title}` and `{number}` are substituted.
    pub subject: String,
    /// Directory (relative to the temp dir) where composed mail is written.
    pub outbox: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender_name: "Raider Report".to_string(),
            subject: "{title} Issue #{number} is now available!".to_string(),
            outbox: "outbox".to_string(),
        }
    }
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    /// Light mode color scheme.
    pub light: ColorScheme,
    /// Dark mode color scheme.
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

/// Individual color scheme (light or dark).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Dates, captions, footer.
    pub text_muted: String,
    pub border: String,
    /// Masthead, buttons, active tab.
    pub accent: String,
    /// Badges and underlines.
    pub highlight: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#1a1a1a".to_string(),
            text_muted: "#666666".to_string(),
            border: "#dddddd".to_string(),
            accent: "#002d5b".to_string(),
            highlight: "#6dc4bc".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0d1117".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#30363d".to_string(),
            accent: "#4f8cc9".to_string(),
            highlight: "#6dc4bc".to_string(),
        }
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(root)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Newsstand Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Masthead
# ---------------------------------------------------------------------------
[site]
title = "Raider Report"
tagline = "Fryeburg Academy's Student Publication"
featured_blurb = "Check out our latest issue, featuring school news, sports updates, and student achievements."
# Linked from notification emails.
home_url = "https://example.org/raider-report"
# print_locations = "Physical copies are available in the Library."
# Endpoint for the footer subscribe form (receives a POSTed `email` field).
# subscribe_url = "https://example.org/raider-report/subscribe"
# Issues dated within this many days of the build get a NEW badge.
new_badge_days = 14

# ---------------------------------------------------------------------------
# Data sources (relative to the content root)
# ---------------------------------------------------------------------------
[sources]
# TOML file with one or more sheets:
#   [sheets.Sheet1]
#   rows = [
#     ["Issue Name", "Description", "Date", "Category", "Featured"],
#     ["newspaper-issue-1", "Welcome back!", 2024-09-05, "News", "TRUE"],
#   ]
sheet = "issues.toml"
sheet_name = "Sheet1"
pdfs = "pdfs"
images = "images"

# ---------------------------------------------------------------------------
# Reconciliation
# ---------------------------------------------------------------------------
[catalog]
# Category for rows with an empty category cell. Hidden from the tab bar.
default_category = "General"
# Two files with the same stem: "newest" keeps the most recently modified,
# "reject" fails the catalog build (which publishes an empty catalog).
on_duplicate_stem = "newest"

# ---------------------------------------------------------------------------
# URL templates: {id} = content hash id, {name} = file name
# ---------------------------------------------------------------------------
[urls]
pdf_view = "pdfs/{name}"
pdf_embed = "pdfs/{name}"
image = "images/{name}"

# ---------------------------------------------------------------------------
# Mobile carousel
# ---------------------------------------------------------------------------
[carousel]
settle_ms = 400
swipe_threshold = 50

# ---------------------------------------------------------------------------
# PDF viewer
# ---------------------------------------------------------------------------
[viewer]
max_pages = 5
scale = 1.5
clear_delay_ms = 300
# pdf.js build used to draw pages into the modal
pdfjs_src = "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js"
pdfjs_worker_src = "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.worker.min.js"

# ---------------------------------------------------------------------------
# Colors (prefers-color-scheme: light / dark)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#1a1a1a"
text_muted = "#666666"
border = "#dddddd"
accent = "#002d5b"
highlight = "#6dc4bc"

[colors.dark]
background = "#0d1117"
text = "#eeeeee"
text_muted = "#999999"
border = "#30363d"
accent = "#4f8cc9"
highlight = "#6dc4bc"

# ---------------------------------------------------------------------------
# New-issue notifications
# ---------------------------------------------------------------------------
[notify]
sender_name = "Raider Report"
subject = "{title} Issue #{number} is now available!"
# Composed messages are written here (relative to the temp dir).
outbox = "outbox"
"##
}

/// Generate CSS custom properties from color config.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    format!(
        r#":root {{
    --color-bg: {light_bg};
    --color-text: {light_text};
    --color-text-muted: {light_text_muted};
    --color-border: {light_border};
    --color-accent: {light_accent};
    --color-highlight: {light_highlight};
}}

@media (prefers-color-scheme: dark) {{
    :root {{
        --color-bg: {dark_bg};
        --color-text: {dark_text};
        --color-text-muted: {dark_text_muted};
        --color-border: {dark_border};
        --color-accent: {dark_accent};
        --color-highlight: {dark_highlight};
    }}
}}"#,
        light_bg = colors.light.background,
        light_text = colors.light.text,
        light_text_muted = colors.light.text_muted,
        light_border = colors.light.border,
        light_accent = colors.light.accent,
        light_highlight = colors.light.highlight,
        dark_bg = colors.dark.background,
        dark_text = colors.dark.text,
        dark_text_muted = colors.dark.text_muted,
        dark_border = colors.dark.border,
        dark_accent = colors.dark.accent,
        dark_highlight = colors.dark.highlight,
    )
}
