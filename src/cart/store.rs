use crate::cart::CartStorage;
use crate::catalog::Product;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Slot the cart is persisted under
pub const CART_SLOT: &str = "cart";

/// A product in the cart together with how many of it were added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
  #[serde(flatten)]
  pub product: Product,
  pub quantity: u32,
}

impl CartLineItem {
  pub fn id(&self) -> u64 {
    self.product.id
  }

  pub fn subtotal(&self) -> f64 {
    self.product.price * f64::from(self.quantity)
  }
}

/// Totals shown on the cart trigger
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartSummary {
  pub lines: usize,
  pub quantity: u32,
  pub total: f64,
}

impl CartSummary {
  pub fn of(items: &[CartLineItem]) -> Self {
    Self {
      lines: items.len(),
      quantity: items.iter().map(|i| i.quantity).sum(),
      total: items.iter().map(CartLineItem::subtotal).sum(),
    }
  }
}

/// Shopping cart persisted through a [`CartStorage`] backend.
///
/// The store keeps no copy of its own: every operation re-reads the stored
/// blob and writes the full collection back. Storage and parse failures are
/// logged and treated as an empty cart.
pub struct CartStore {
  storage: Box<dyn CartStorage>,
}

impl CartStore {
  pub fn new(storage: impl CartStorage + 'static) -> Self {
    Self {
      storage: Box::new(storage),
    }
  }

  /// All line items in insertion order.
  pub fn list(&self) -> Vec<CartLineItem> {
    let raw = match self.storage.read(CART_SLOT) {
      Ok(Some(raw)) => raw,
      Ok(None) => return Vec::new(),
      Err(e) => {
        warn!(error = %e, "cart storage unavailable, using empty cart");
        return Vec::new();
      }
    };

    match serde_json::from_str::<Vec<CartLineItem>>(&raw) {
      Ok(items) => items,
      Err(e) => {
        warn!(error = %e, "stored cart is malformed, using empty cart");
        Vec::new()
      }
    }
  }

  /// Add one of `product`, incrementing the existing line if present.
  pub fn add(&self, product: &Product) {
    let mut items = self.list();

    match items.iter_mut().find(|item| item.id() == product.id) {
      Some(item) => item.quantity += 1,
      None => items.push(CartLineItem {
        product: product.clone(),
        quantity: 1,
      }),
    }

    debug!(product_id = product.id, "added to cart");
    self.save(&items);
  }

  /// Drop the whole line for `product_id`. Unknown ids are a no-op.
  pub fn remove(&self, product_id: u64) {
    let items: Vec<CartLineItem> = self
      .list()
      .into_iter()
      .filter(|item| item.id() != product_id)
      .collect();

    debug!(product_id, "removed from cart");
    self.save(&items);
  }

  /// Empty the cart by deleting its slot.
  pub fn clear(&self) {
    if let Err(e) = self.storage.remove(CART_SLOT) {
      warn!(error = %e, "failed to clear cart");
    }
  }

  fn save(&self, items: &[CartLineItem]) {
    let raw = match serde_json::to_string(items) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(error = %e, "failed to serialize cart");
        return;
      }
    };

    if let Err(e) = self.storage.write(CART_SLOT, &raw) {
      warn!(error = %e, "failed to persist cart");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cart::storage::MemoryStorage;
  use color_eyre::{eyre::eyre, Result};

  fn product(id: u64, price: f64) -> Product {
    Product {
      id,
      title: format!("Product {}", id),
      description: None,
      price,
      images: Vec::new(),
      category: None,
    }
  }

  /// Storage whose every operation fails
  struct BrokenStorage;

  impl CartStorage for BrokenStorage {
    fn read(&self, _slot: &str) -> Result<Option<String>> {
      Err(eyre!("disk on fire"))
    }

    fn write(&self, _slot: &str, _value: &str) -> Result<()> {
      Err(eyre!("disk on fire"))
    }

    fn remove(&self, _slot: &str) -> Result<()> {
      Err(eyre!("disk on fire"))
    }
  }

  #[test]
  fn test_empty_when_slot_absent() {
    let cart = CartStore::new(MemoryStorage::new());
    assert!(cart.list().is_empty());
  }

  #[test]
  fn test_add_same_product_twice_increments_quantity() {
    let cart = CartStore::new(MemoryStorage::new());
    let phone = product(1, 549.0);

    cart.add(&phone);
    cart.add(&phone);

    let items = cart.list();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].product, phone);
  }

  #[test]
  fn test_add_keeps_insertion_order() {
    let cart = CartStore::new(MemoryStorage::new());
    cart.add(&product(3, 1.0));
    cart.add(&product(1, 1.0));
    cart.add(&product(3, 1.0));

    let ids: Vec<u64> = cart.list().iter().map(CartLineItem::id).collect();
    assert_eq!(ids, vec![3, 1]);
  }

  #[test]
  fn test_remove_drops_whole_line() {
    let cart = CartStore::new(MemoryStorage::new());
    let p = product(5, 2.0);
    cart.add(&p);
    cart.add(&p);
    cart.add(&product(6, 2.0));

    cart.remove(5);

    let ids: Vec<u64> = cart.list().iter().map(CartLineItem::id).collect();
    assert_eq!(ids, vec![6]);
  }

  #[test]
  fn test_remove_unknown_id_is_noop() {
    let cart = CartStore::new(MemoryStorage::new());
    cart.add(&product(1, 1.0));
    cart.add(&product(2, 1.0));
    let before = cart.list();

    cart.remove(99);

    assert_eq!(cart.list(), before);
  }

  #[test]
  fn test_malformed_blob_reads_as_empty() {
    let storage = MemoryStorage::new();
    storage.write(CART_SLOT, "{not json").unwrap();
    let cart = CartStore::new(storage);

    assert!(cart.list().is_empty());

    // The next write replaces the broken blob
    cart.add(&product(1, 1.0));
    assert_eq!(cart.list().len(), 1);
  }

  #[test]
  fn test_blob_is_flat_json_array() {
    let storage = MemoryStorage::new();
    storage
      .write(
        CART_SLOT,
        r#"[{"id":4,"title":"Lamp","price":12.5,"images":[],"quantity":3}]"#,
      )
      .unwrap();
    let cart = CartStore::new(storage);

    let items = cart.list();
    assert_eq!(items[0].id(), 4);
    assert_eq!(items[0].quantity, 3);
  }

  #[test]
  fn test_broken_storage_recovers_to_empty() {
    let cart = CartStore::new(BrokenStorage);
    cart.add(&product(1, 1.0));
    cart.remove(1);
    cart.clear();
    assert!(cart.list().is_empty());
  }

  #[test]
  fn test_clear_and_summary() {
    let cart = CartStore::new(MemoryStorage::new());
    cart.add(&product(1, 10.0));
    cart.add(&product(1, 10.0));
    cart.add(&product(2, 2.5));

    let summary = CartSummary::of(&cart.list());
    assert_eq!(summary.lines, 2);
    assert_eq!(summary.quantity, 3);
    assert!((summary.total - 22.5).abs() < f64::EPSILON);

    cart.clear();
    assert_eq!(CartSummary::of(&cart.list()), CartSummary::default());
  }
}
