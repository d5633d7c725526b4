//! State of the catalog screen, independent of rendering.
//!
//! The controller derives the page from the router, drives the list and
//! search queries, applies the "return home" redirects and owns overlay and
//! cart state. The UI layer only reads from it and forwards user actions.

use crate::cart::{CartLineItem, CartStore, CartSummary};
use crate::catalog::{CatalogApi, FetchError, Product};
use crate::config::Config;
use crate::debounce::Debounced;
use crate::query::Query;
use crate::routing::{skip_for, Router};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Inactive query entries older than this are dropped
const CACHE_TIME: Duration = Duration::from_secs(300);

/// Query keys for catalog requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CatalogQueryKey {
  /// One page of the full catalog
  Products { page: u32 },
  /// One page of search results
  Search { term: String, page: u32 },
}

/// Tunables taken from the config
#[derive(Debug, Clone, Copy)]
pub struct ControllerSettings {
  pub page_size: usize,
  pub search_debounce: Duration,
  pub stale_time: Duration,
}

impl Default for ControllerSettings {
  fn default() -> Self {
    Self {
      page_size: 10,
      search_debounce: Duration::from_millis(500),
      stale_time: Duration::from_secs(10),
    }
  }
}

impl From<&Config> for ControllerSettings {
  fn from(config: &Config) -> Self {
    Self {
      page_size: config.page_size,
      search_debounce: config.search_debounce(),
      stale_time: config.stale_time(),
    }
  }
}

/// What the main area shows
#[derive(Debug, PartialEq)]
pub enum Screen<'a> {
  /// A catalog request failed; nothing else is rendered
  Error(&'a str),
  /// First load of the active query
  Loading,
  /// Product rows for the current page
  Results(&'a [Product]),
  /// The page loaded but has no products
  Empty,
}

pub struct CatalogController {
  router: Router,
  search_text: String,
  search_term: Debounced<String>,
  products: Query<CatalogQueryKey, Vec<Product>>,
  search_results: Query<CatalogQueryKey, Vec<Product>>,
  cart: CartStore,
  cart_items: Vec<CartLineItem>,
  page_size: usize,

  // Overlay and selection state
  selected: usize,
  detail: Option<Product>,
  cart_open: bool,
  cart_selected: usize,
}

impl CatalogController {
  pub fn new(
    catalog: Arc<dyn CatalogApi>,
    cart: CartStore,
    settings: ControllerSettings,
    initial_path: &str,
  ) -> Self {
    let page_size = settings.page_size;

    let products = {
      let catalog = catalog.clone();
      Query::new(move |key: &CatalogQueryKey| fetch(catalog.as_ref(), key, page_size))
        .with_stale_time(settings.stale_time)
        .keep_previous_data()
    };

    let search_results =
      Query::new(move |key: &CatalogQueryKey| fetch(catalog.as_ref(), key, page_size));

    let cart_items = cart.list();

    let mut controller = Self {
      router: Router::new(initial_path),
      search_text: String::new(),
      search_term: Debounced::new(String::new(), settings.search_debounce),
      products,
      search_results,
      cart,
      cart_items,
      page_size,
      selected: 0,
      detail: None,
      cart_open: false,
      cart_selected: 0,
    };
    controller.sync();
    controller
  }

  // ==========================================================================
  // Derived state
  // ==========================================================================

  pub fn page(&self) -> u32 {
    self.router.current_page()
  }

  pub fn skip(&self) -> usize {
    skip_for(self.page(), self.page_size)
  }

  pub fn path(&self) -> String {
    self.router.path()
  }

  pub fn search_text(&self) -> &str {
    &self.search_text
  }

  pub fn debounced_search(&self) -> &str {
    self.search_term.value()
  }

  fn search_active(&self) -> bool {
    !self.search_term.value().is_empty()
  }

  fn active_query(&self) -> &Query<CatalogQueryKey, Vec<Product>> {
    if self.search_active() {
      &self.search_results
    } else {
      &self.products
    }
  }

  /// Search results while a search term is active, catalog page otherwise
  ///
  /// Nothing while the active query has failed, so placeholder rows from the
  /// previous page cannot be selected, opened or added behind the error.
  pub fn display_products(&self) -> Option<&[Product]> {
    let query = self.active_query();
    if query.is_error() {
      return None;
    }
    query.data().map(Vec::as_slice)
  }

  /// Fewer than a full page means there is nothing after it.
  ///
  /// A final page that happens to be exactly full is not detected.
  pub fn is_last_page(&self) -> bool {
    self
      .display_products()
      .is_some_and(|p| p.len() < self.page_size)
  }

  pub fn is_fetching(&self) -> bool {
    self.active_query().is_fetching()
  }

  /// Search results for the current term are still on their way
  pub fn is_searching(&self) -> bool {
    self.search_active() && self.search_results.is_pending()
  }

  /// The search box changed and its quiet period has not elapsed yet
  pub fn is_debouncing(&self) -> bool {
    self.search_term.is_pending()
  }

  pub fn can_go_previous(&self) -> bool {
    self.page() > 1
  }

  pub fn can_go_next(&self) -> bool {
    !self.active_query().is_error() && !self.is_fetching() && !self.is_last_page()
  }

  pub fn can_go_back(&self) -> bool {
    self.router.can_go_back()
  }

  pub fn screen(&self) -> Screen<'_> {
    let query = self.active_query();
    if let Some(error) = query.error() {
      return Screen::Error(error);
    }
    if query.is_pending() {
      return Screen::Loading;
    }
    match self.display_products() {
      Some(products) if !products.is_empty() => Screen::Results(products),
      _ => Screen::Empty,
    }
  }

  // ==========================================================================
  // Navigation and search
  // ==========================================================================

  pub fn set_search_text(&mut self, text: &str) {
    if text == self.search_text {
      return;
    }
    self.search_text = text.to_string();
    self.search_term.set(self.search_text.clone());
  }

  /// Empty the search box and go back to the first catalog page.
  pub fn clear_search(&mut self) {
    self.search_text.clear();
    self.search_term.set_now(String::new());
    self.router.redirect_home();
    self.sync();
  }

  pub fn next_page(&mut self) {
    if self.can_go_next() {
      self.router.next();
      self.sync();
    }
  }

  pub fn previous_page(&mut self) {
    if self.can_go_previous() {
      self.router.previous();
      self.sync();
    }
  }

  pub fn navigate(&mut self, path: &str) {
    self.router.navigate(path);
    self.sync();
  }

  pub fn back(&mut self) {
    if self.router.back() {
      self.sync();
    }
  }

  /// Reload the current page, like a browser refresh. Not offered on the
  /// error screen.
  pub fn reload(&mut self) {
    if !matches!(self.screen(), Screen::Error(_)) {
      if self.search_active() {
        self.search_results.refetch();
      } else {
        self.products.refetch();
      }
    }
  }

  /// Drop the pending search timer; called when the screen goes away.
  pub fn shutdown(&mut self) {
    self.search_term.cancel();
  }

  /// Advance timers and queries. Returns true when anything visible changed.
  pub fn tick(&mut self) -> bool {
    let mut changed = false;

    if let Some(term) = self.search_term.poll() {
      changed = true;
      if !term.is_empty() {
        info!(%term, "searching");
        self.router.redirect_home();
      }
      self.sync();
    }

    changed |= self.products.poll();
    changed |= self.search_results.poll();

    if self.current_page_is_empty() {
      debug!(path = %self.path(), "page has no results");
      self.router.redirect_home();
      self.sync();
      changed = true;
    }

    self.products.prune(CACHE_TIME);
    self.search_results.prune(CACHE_TIME);

    if changed {
      self.clamp_selection();
    }
    changed
  }

  /// Loaded (not placeholder) results for a page past the first are empty
  fn current_page_is_empty(&self) -> bool {
    let query = self.active_query();
    self.page() > 1
      && !query.is_placeholder()
      && query.data().is_some_and(Vec::is_empty)
  }

  /// Point both queries at the keys derived from the route and search term.
  fn sync(&mut self) {
    let page = self.page();
    let term = self.search_term.value().clone();
    let searching = !term.is_empty();

    self
      .products
      .observe(CatalogQueryKey::Products { page }, !searching);
    self
      .search_results
      .observe(CatalogQueryKey::Search { term, page }, searching);

    self.clamp_selection();
  }

  // ==========================================================================
  // Selection and overlays
  // ==========================================================================

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn move_selection(&mut self, delta: i32) {
    let len = self.display_products().map_or(0, <[Product]>::len);
    self.selected = wrap(self.selected, delta, len);
  }

  fn clamp_selection(&mut self) {
    let len = self.display_products().map_or(0, <[Product]>::len);
    self.selected = self.selected.min(len.saturating_sub(1));
    self.cart_selected = self
      .cart_selected
      .min(self.cart_items.len().saturating_sub(1));
  }

  pub fn detail(&self) -> Option<&Product> {
    self.detail.as_ref()
  }

  /// Show the detail overlay for the selected row.
  pub fn open_detail(&mut self) {
    if let Some(product) = self
      .display_products()
      .and_then(|p| p.get(self.selected))
      .cloned()
    {
      self.detail = Some(product);
    }
  }

  pub fn close_detail(&mut self) {
    self.detail = None;
  }

  pub fn is_cart_open(&self) -> bool {
    self.cart_open
  }

  pub fn toggle_cart(&mut self) {
    self.cart_open = !self.cart_open;
    self.cart_selected = 0;
  }

  pub fn close_cart(&mut self) {
    self.cart_open = false;
  }

  pub fn cart_selected(&self) -> usize {
    self.cart_selected
  }

  pub fn move_cart_selection(&mut self, delta: i32) {
    self.cart_selected = wrap(self.cart_selected, delta, self.cart_items.len());
  }

  // ==========================================================================
  // Cart
  // ==========================================================================

  pub fn cart_items(&self) -> &[CartLineItem] {
    &self.cart_items
  }

  pub fn cart_summary(&self) -> CartSummary {
    CartSummary::of(&self.cart_items)
  }

  pub fn add_to_cart(&mut self, product: &Product) {
    self.cart.add(product);
    self.refresh_cart();
  }

  pub fn remove_from_cart(&mut self, product_id: u64) {
    self.cart.remove(product_id);
    self.refresh_cart();
  }

  /// Add the product shown in the detail overlay.
  pub fn add_detail_to_cart(&mut self) {
    if let Some(product) = self.detail.clone() {
      self.add_to_cart(&product);
    }
  }

  /// Remove the line selected in the cart popover.
  pub fn remove_selected_cart_item(&mut self) {
    if let Some(id) = self.cart_items.get(self.cart_selected).map(CartLineItem::id) {
      self.remove_from_cart(id);
    }
  }

  pub fn clear_cart(&mut self) {
    self.cart.clear();
    self.refresh_cart();
  }

  /// Re-read the cart from storage so the view never drifts from it.
  fn refresh_cart(&mut self) {
    self.cart_items = self.cart.list();
    self.clamp_selection();
  }
}

fn fetch(
  catalog: &dyn CatalogApi,
  key: &CatalogQueryKey,
  page_size: usize,
) -> BoxFuture<'static, Result<Vec<Product>, FetchError>> {
  match key {
    CatalogQueryKey::Products { page } => catalog.fetch_page(page_size, skip_for(*page, page_size)),
    CatalogQueryKey::Search { term, page } => {
      catalog.search(term, page_size, skip_for(*page, page_size))
    }
  }
}

fn wrap(current: usize, delta: i32, len: usize) -> usize {
  if len == 0 {
    return 0;
  }
  (current as i64 + i64::from(delta)).rem_euclid(len as i64) as usize
}
