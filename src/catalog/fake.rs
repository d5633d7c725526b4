//! In-memory catalog for tests.

use crate::catalog::{CatalogApi, FetchError, Product};
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::Mutex;

/// A request the fake received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Page { limit: usize, skip: usize },
  Search { query: String, limit: usize, skip: usize },
}

/// Catalog serving a fixed product list and recording every request
#[derive(Default)]
pub struct FakeCatalog {
  products: Vec<Product>,
  failing_skips: Mutex<HashSet<usize>>,
  fail_search: bool,
  calls: Mutex<Vec<Call>>,
}

impl FakeCatalog {
  /// Products with ids `1..=count`
  pub fn with_products(count: u64) -> Self {
    Self {
      products: (1..=count).map(product).collect(),
      ..Default::default()
    }
  }

  /// Answer list requests at `skip` with HTTP 500
  pub fn fail_skip(self, skip: usize) -> Self {
    self
      .failing_skips
      .lock()
      .unwrap()
      .insert(skip);
    self
  }

  /// Answer every search with HTTP 503
  pub fn failing_search(mut self) -> Self {
    self.fail_search = true;
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.lock().unwrap().clone()
  }

  pub fn search_calls(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Call::Search { query, .. } => Some(query),
        Call::Page { .. } => None,
      })
      .collect()
  }
}

impl CatalogApi for FakeCatalog {
  fn fetch_page(
    &self,
    limit: usize,
    skip: usize,
  ) -> BoxFuture<'static, Result<Vec<Product>, FetchError>> {
    self.calls.lock().unwrap().push(Call::Page { limit, skip });
    if self.failing_skips.lock().unwrap().contains(&skip) {
      return future::ready(Err(FetchError::Status { status: 500 })).boxed();
    }
    let page = self.products.iter().skip(skip).take(limit).cloned().collect();
    future::ready(Ok(page)).boxed()
  }

  fn search(
    &self,
    query: &str,
    limit: usize,
    skip: usize,
  ) -> BoxFuture<'static, Result<Vec<Product>, FetchError>> {
    self.calls.lock().unwrap().push(Call::Search {
      query: query.to_string(),
      limit,
      skip,
    });
    if self.fail_search {
      return future::ready(Err(FetchError::Status { status: 503 })).boxed();
    }
    let query = query.to_lowercase();
    let page = self
      .products
      .iter()
      .filter(|p| p.title.to_lowercase().contains(&query))
      .skip(skip)
      .take(limit)
      .cloned()
      .collect();
    future::ready(Ok(page)).boxed()
  }
}

/// Every fifth product is a phone
pub fn product(id: u64) -> Product {
  let title = if id % 5 == 0 {
    format!("Phone {}", id)
  } else {
    format!("Gadget {}", id)
  };
  Product {
    id,
    title,
    description: Some("A thing".to_string()),
    price: id as f64,
    images: Vec::new(),
    category: None,
  }
}
