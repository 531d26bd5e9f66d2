//! # Dialogue State
//!
//! The variable store shared by every conversation running on a flow player.
//! Variables are addressed as `Namespace.Variable`, carry one of three kinds
//! (bool, int, string) and keep a shadow stack so speculative changes can be
//! rolled back exactly.
//!
//! ## Core Components
//!
//! - **variables**: typed values, single variables and namespaces
//! - **store**: the [`VariableStore`], shadow scopes and TOML declarations
//! - **error**: [`StateError`]
//!
//! This crate knows nothing about dialogue graphs or scripting.

pub mod error;
pub mod store;
pub mod variables;

pub use error::*;
pub use store::*;
pub use variables::*;
