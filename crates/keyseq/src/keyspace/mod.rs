mod counter;
mod interface;

pub use counter::*;
pub use interface::*;
