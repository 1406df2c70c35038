//! Core types for Profile Bridge.
//!
//! This module provides type-safe wrappers for the concepts both sides of the
//! sync agree on.

pub mod credential;
pub mod email;
pub mod id;
pub mod outcome;
pub mod status;

pub use credential::{CredentialError, CredentialParts, EncodedCredential};
pub use email::{Email, EmailError};
pub use id::*;
pub use outcome::{InvalidSyncCode, ResultLabel, SyncCode, SyncResult};
pub use status::{TargetUserStatus, TargetUserType};
