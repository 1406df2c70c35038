//! Profile Bridge Core - Shared types library.
//!
//! This crate provides the types shared by every Profile Bridge component:
//! - `bridge` - The sync service (HTTP handler, clients, reconciliation engine)
//! - `cli` - Command-line tools for migrations and one-off syncs
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. Anything that talks to the commerce platform, the profile platform
//! or the sync store lives in `profile-bridge`.
//!
//! # Modules
//!
//! - [`types`] - Emails, ids, encoded credentials, sync outcomes and Target enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
