//! The reconciliation engine: the components every release workflow is assembled from.
//!
//! - [RefResolver]: branch, tag or commit id to a commit
//! - [HistorySearch]: bounded, paginated marker search through a branch's history
//! - [IdempotencyGuard]: decides whether a workflow still has anything to do
//! - [TagNumberAllocator]: next free release-candidate number for a version
//! - [ObjectGrafter]: tag objects and squash grafts built without a working tree
//!
//! All components borrow a [crate::git::Repository] and hold no state of their own, so
//! nothing is cached between calls.

pub mod allocator;
pub mod graft;
pub mod guard;
pub mod history;
pub mod resolve;

pub use allocator::TagNumberAllocator;
pub use graft::ObjectGrafter;
pub use guard::{Check, Decision, Evidence, IdempotencyGuard};
pub use history::HistorySearch;
pub use resolve::{RefResolver, ResolvedRef};
