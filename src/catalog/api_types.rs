//! Serde-deserializable types matching catalog API responses.
//!
//! These types are separate from domain types so that loosely-typed fields
//! (missing descriptions, null categories) are normalized in one place.

use serde::Deserialize;

use super::types::Product;

// ============================================================================
// Product list / search responses
// ============================================================================

/// Body of both `GET /products` and `GET /products/search`
#[derive(Debug, Deserialize)]
pub struct ApiProductsResponse {
  pub products: Vec<ApiProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ApiProduct {
  pub id: u64,
  #[serde(default)]
  pub title: String,
  pub description: Option<String>,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub images: Vec<String>,
  pub category: Option<String>,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiProduct> for Product {
  fn from(p: ApiProduct) -> Self {
    Product {
      id: p.id,
      title: p.title,
      description: p.description.filter(|d| !d.trim().is_empty()),
      price: p.price,
      images: p.images.into_iter().filter(|i| !i.is_empty()).collect(),
      category: p.category.filter(|c| !c.trim().is_empty()),
    }
  }
}

impl ApiProductsResponse {
  pub fn into_products(self) -> Vec<Product> {
    self.products.into_iter().map(Product::from).collect()
  }
}
