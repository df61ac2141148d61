//! Common test utilities for brokkr-modules
//!
//! This module provides shared test infrastructure including:
//! - Module builders producing registry records and packed artifacts
//! - A fixture bundling an in-memory registry, store and module root

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
