//! Profile bridge library.
//!
//! Syncs customers and their addresses from the commerce platform (Magento)
//! into the profile platform (GAMA). The binary in `main.rs` serves the
//! engine over HTTP; the CLI runs it directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod source;
pub mod state;
pub mod store;
pub mod sync;
pub mod target;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod wire;
