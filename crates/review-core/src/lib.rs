#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! review-core
//!
//! Domain types, the error taxonomy, capability traits, configuration and the
//! strict list-literal codec shared by every other crate in the workspace.

pub mod config;
pub mod error;
pub mod list_literal;
pub mod splitter;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
