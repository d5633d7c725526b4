use serde::{Deserialize, Serialize};

/// A catalog product as served by the remote API.
///
/// Products are never mutated locally; a changed product is only ever
/// observed by fetching it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub price: f64,
  #[serde(default)]
  pub images: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
}

impl Product {
  /// First image URL, used as the list thumbnail
  pub fn thumbnail(&self) -> Option<&str> {
    self.images.first().map(String::as_str)
  }
}
