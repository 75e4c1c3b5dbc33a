//! A small registry of named workers and a runner for them.
//!
//! Unrelated to the release workflows. The registry is built once at startup and is
//! read-only afterwards; the runner executes a list of independent components either in
//! order or fanned out across threads.

pub mod registry;
pub mod runner;
pub mod scrape;

pub use registry::{builtin, global, install, Registration, Registry, RegistryBuilder};
pub use runner::{ExecutionMode, Runner};

use crate::error::Result;

/// A worker the runner can execute
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    /// Run to completion
    fn run(&self) -> Result<()>;
}
