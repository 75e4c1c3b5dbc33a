//! User-facing terminal output.
//!
//! Diagnostics go through `tracing`; this module is what a person reading a CI log sees.

pub mod formatter;

pub use formatter::{
    display_components, display_error, display_intent, display_outcome, display_status,
    display_success, format_outcome,
};
