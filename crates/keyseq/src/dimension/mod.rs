mod date;
mod interface;

pub use date::*;
pub use interface::*;
