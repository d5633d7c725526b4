mod input;
mod key_result;
mod search_box;

pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_box::{SearchBox, SearchEvent};
