pub mod component;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod git;
pub mod hosting;
pub mod publish;
pub mod ui;
pub mod workflow;

pub use error::{ReleaseError, Result};
