//! The loaded catalog plus the user's current category and view selection.

use super::carousel::CarouselController;
use super::filter::{self, CategorySelector};
use crate::types::{Catalog, IssueRecord};
use std::time::Duration;

pub const LOAD_ERROR_MESSAGE: &str = "Error loading issues. Please try again later.";
pub const EMPTY_CATALOG_MESSAGE: &str = "No issues found.";
pub const EMPTY_CATEGORY_MESSAGE: &str = "No issues found in this category.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Which render target is on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Grid,
    Carousel,
}

#[derive(Debug, Clone)]
pub struct CatalogStore {
    state: LoadState,
    issues: Vec<IssueRecord>,
    default_category: String,
    selector: CategorySelector,
    view: View,
}

impl CatalogStore {
    /// A store waiting for its catalog.
    pub fn new(default_category: impl Into<String>) -> Self {
        Self {
            state: LoadState::Loading,
            issues: Vec::new(),
            default_category: default_category.into(),
            selector: CategorySelector::All,
            view: View::Grid,
        }
    }

    pub fn from_catalog(catalog: Catalog, default_category: impl Into<String>) -> Self {
        let mut store = Self::new(default_category);
        store.issues = catalog.issues;
        store.state = LoadState::Ready;
        store
    }

    /// Accept a fetched `issues.json` body.
    pub fn load(&mut self, body: &str) {
        match serde_json::from_str::<Catalog>(body) {
            Ok(catalog) => {
                self.issues = catalog.issues;
                self.selector = CategorySelector::All;
                self.state = LoadState::Ready;
            }
            Err(err) => self.fail(&err.to_string()),
        }
    }

    /// Record a failed fetch. The reason is logged, never shown.
    pub fn fail(&mut self, reason: &str) {
        tracing::warn!(reason, "error loading issues");
        self.issues.clear();
        self.state = LoadState::Failed(LOAD_ERROR_MESSAGE.to_string());
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn issues(&self) -> &[IssueRecord] {
        &self.issues
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    pub fn categories(&self) -> Vec<&str> {
        filter::distinct_categories(&self.issues, &self.default_category)
    }

    /// Tabs appear only when there is something besides the default category.
    pub fn show_category_tabs(&self) -> bool {
        !self.categories().is_empty()
    }

    pub fn featured(&self) -> Option<&IssueRecord> {
        filter::featured_issue(&self.issues)
    }

    pub fn selector(&self) -> &CategorySelector {
        &self.selector
    }

    pub fn select_category(&mut self, selector: CategorySelector) {
        self.selector = selector;
    }

    /// The grid/carousel subset for the active selector.
    pub fn visible(&self) -> Vec<&IssueRecord> {
        filter::filter_by_category(&self.issues, &self.selector)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    /// Inline message replacing the grid, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            LoadState::Loading => None,
            LoadState::Failed(message) => Some(message.as_str()),
            LoadState::Ready if self.issues.is_empty() => Some(EMPTY_CATALOG_MESSAGE),
            LoadState::Ready if self.visible().is_empty() => Some(EMPTY_CATEGORY_MESSAGE),
            LoadState::Ready => None,
        }
    }

    /// A fresh carousel over the visible subset.
    pub fn carousel(&self, settle: Duration) -> Option<CarouselController> {
        CarouselController::new(self.visible().len(), settle)
    }
}
