pub mod footer;
pub mod header;
pub mod pagination;
pub mod utils;

pub use footer::{draw_footer, Shortcut};
pub use header::draw_header;
pub use pagination::{draw_pagination, Pager};
pub use utils::{centered_rect, control_style, format_price, truncate};
