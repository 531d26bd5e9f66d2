//! Variable definitions: typed values, single variables and namespaces.

mod namespace;
mod value;

pub use namespace::*;
pub use value::*;
