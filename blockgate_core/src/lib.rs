//! Core blockgate types and traits.
//!
//! This crate defines the shared vocabulary used by all blockgate crates:
//!
//! - Storage keys (`key::Key`), the hierarchical slash-paths the storage
//!   layer routes on
//! - The polymorphic store capability (`store::Store`) and its error
//!   taxonomy (`store::StoreError`)
//! - The ordered mount resolver (`mounts::MountStore`), which routes a key
//!   to the first mount whose prefix matches it
//!
//! Content identifiers are the `cid` crate's [`Cid`] type, re-exported here
//! so downstream crates agree on one version.

pub mod key;
pub mod mounts;
pub mod store;

pub use cid::Cid;
pub use key::Key;
pub use mounts::{Mount, MountStore};
pub use store::{Store, StoreError, StoreResult};
