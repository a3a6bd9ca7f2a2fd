//! # favsync testkit
//!
//! Test utilities for favsync.
//!
//! This crate provides:
//! - Sample records and temporary data directories
//! - Simulated devices sharing one backend
//! - An in-memory backend reachable through the loopback HTTP client
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use favsync_testkit::prelude::*;
//! use std::sync::Arc;
//!
//! let backend = Arc::new(FakeBackend::new());
//! let phone = TestDevice::new(&backend, "u1");
//! phone.favorite("p1");
//! phone.sync().unwrap();
//! assert_eq!(backend.poi_ids("u1"), vec!["p1".to_string()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use backend::*;
pub use fixtures::*;
pub use generators::*;
