//! Bookshelf application library
//!
//! Service modules mounted by the `bookshelf` binary.

pub mod modules;

pub use modules::*;
