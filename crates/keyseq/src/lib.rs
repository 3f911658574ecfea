mod cache;
mod dimension;
mod error;
mod keyspace;
mod serial;

pub use crate::cache::*;
pub use crate::dimension::*;
pub use crate::error::*;
pub use crate::keyspace::*;
pub use crate::serial::*;
