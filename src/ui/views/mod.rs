mod cart_popover;
mod product_detail;
mod product_list;

pub use cart_popover::draw_cart_popover;
pub use product_detail::draw_product_detail;
pub use product_list::draw_product_list;
