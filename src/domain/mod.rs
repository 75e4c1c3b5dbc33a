//! Domain logic - pure release rules independent of git and hosting operations

pub mod intent;
pub mod naming;
pub mod version;

pub use intent::ReleaseIntent;
pub use naming::{parse_backport_label, Naming};
pub use version::{major_minor, next_minor, parse_version, MinorVersion};
