//! content-dispatch - Repository-dispatch notifications for content changes
//!
//! When content is published or unpublished, this library posts one
//! repository-dispatch event per changed record without blocking the caller.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod settings;
pub mod task_manager;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export core types for convenience
pub use crate::core::*;
pub use crate::dispatch::Dispatcher;
pub use crate::error::DispatchError;
