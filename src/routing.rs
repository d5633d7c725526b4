//! In-app location and history.
//!
//! The catalog page lives in a path: `/` is page 1 and `/page/n` is page
//! `n > 1`. Page 1 is never shown with an explicit segment; `/page/1` and
//! unknown paths are normalized to `/` as soon as they are visited.

use std::fmt;
use tracing::debug;

/// A parsed location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
  /// `/`, the first page
  Home,
  /// `/page/n` with `n > 1`
  Page(u32),
  /// Anything else, including `/page/1` before normalization
  NotFound(String),
}

impl Route {
  pub fn parse(path: &str) -> Self {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
      return Route::Home;
    }

    let mut segments = trimmed.trim_start_matches('/').split('/');
    match (segments.next(), segments.next(), segments.next()) {
      (Some("page"), Some(n), None) => match n.parse::<u32>() {
        Ok(n) if n > 1 => Route::Page(n),
        _ => Route::NotFound(path.to_string()),
      },
      _ => Route::NotFound(path.to_string()),
    }
  }

  /// Route for a 1-based page number; page 1 (or 0) is home.
  pub fn for_page(page: u32) -> Self {
    if page > 1 {
      Route::Page(page)
    } else {
      Route::Home
    }
  }

  pub fn page(&self) -> u32 {
    match self {
      Route::Page(n) => *n,
      Route::Home | Route::NotFound(_) => 1,
    }
  }

  pub fn path(&self) -> String {
    match self {
      Route::Home => "/".to_string(),
      Route::Page(n) => format!("/page/{}", n),
      Route::NotFound(path) => path.clone(),
    }
  }

  fn is_canonical(&self) -> bool {
    !matches!(self, Route::NotFound(_))
  }
}

impl fmt::Display for Route {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path())
  }
}

/// Number of items to skip to reach `page` (1-based)
pub fn skip_for(page: u32, page_size: usize) -> usize {
  (page.max(1) as usize - 1) * page_size
}

/// Browser-style history over [`Route`]s.
///
/// `navigate` pushes an entry (dropping any forward entries), redirects
/// replace the current one.
#[derive(Debug, Clone)]
pub struct Router {
  entries: Vec<Route>,
  index: usize,
}

impl Default for Router {
  fn default() -> Self {
    Self {
      entries: vec![Route::Home],
      index: 0,
    }
  }
}

impl Router {
  /// Start at `path`, normalizing it if needed.
  pub fn new(path: &str) -> Self {
    let mut router = Self {
      entries: vec![Route::parse(path)],
      index: 0,
    };
    router.normalize();
    router
  }

  pub fn current(&self) -> &Route {
    &self.entries[self.index]
  }

  pub fn current_page(&self) -> u32 {
    self.current().page()
  }

  pub fn path(&self) -> String {
    self.current().path()
  }

  pub fn can_go_back(&self) -> bool {
    self.index > 0
  }

  /// Push `path` as a new entry.
  pub fn navigate(&mut self, path: &str) {
    self.push(Route::parse(path));
  }

  /// Go to the following page.
  pub fn next(&mut self) {
    let page = self.current_page().saturating_add(1);
    self.push(Route::for_page(page));
  }

  /// Go to the preceding page. Does nothing on page 1.
  pub fn previous(&mut self) {
    let page = self.current_page();
    if page > 1 {
      self.push(Route::for_page(page - 1));
    }
  }

  /// Replace the current entry with `/`.
  pub fn redirect_home(&mut self) {
    if self.current() != &Route::Home {
      debug!(from = %self.current(), "redirecting home");
      self.entries[self.index] = Route::Home;
    }
  }

  /// Step back one history entry. Returns false when there is none.
  pub fn back(&mut self) -> bool {
    if self.index == 0 {
      return false;
    }
    self.index -= 1;
    self.normalize();
    true
  }

  fn push(&mut self, route: Route) {
    debug!(to = %route, "navigate");
    self.entries.truncate(self.index + 1);
    self.entries.push(route);
    self.index = self.entries.len() - 1;
    self.normalize();
  }

  fn normalize(&mut self) {
    if !self.current().is_canonical() {
      self.redirect_home();
    }
  }
}
