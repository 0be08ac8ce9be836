//! # cglimit-common
//!
//! Shared utilities and types for cglimit.
//!
//! This crate provides common functionality used across the cglimit crates:
//! - Workload ID validation
//! - Standard filesystem paths
//! - Memory quantity parsing
//! - Common error types

#![warn(missing_docs)]

pub mod error;
pub mod id;
pub mod paths;
pub mod resource;

pub use error::{CgError, CgResult};
pub use id::WorkloadId;
pub use paths::CgPaths;
pub use resource::MemoryQuantity;
