//! Shared support utilities for the relic class model.
//!
//! Provides the [`Memo`] lazy cell that every lazily-parsed descriptor field
//! is built on, and binary-name helpers shared by the decoder and the pool.

mod memo;
mod name;

pub use memo::Memo;
pub use name::{package_of, simple_name_of, to_internal_name, to_source_name};

#[cfg(test)]
mod tests;
