//! # Comment-thread tree assembly
//!
//! This library maintains the in-memory reply tree behind a discussion
//! thread. Servers deliver comments as flat, paginated arrays where each
//! record carries its own id, a nullable parent id and a depth; `trellis`
//! assembles those batches into a rooted tree and keeps the tree correct
//! as later pages, out-of-order branches and locally written replies
//! arrive. It also maintains the derived reply counts that incremental
//! rendering reads.
//!
//! ## Core operations
//!
//! 1. **Build / merge**: place each record under its parent, parking
//!    out-of-order arrivals as partial branches
//! 2. **Graft**: reattach partial branches once their parents exist;
//!    leftovers are reported as orphans, never errors
//! 3. **Insert**: splice a local reply in front of its siblings and bump
//!    every ancestor's reply counts
//! 4. **Search**: preorder scans with an optional depth hint that skips
//!    subtrees which cannot contain the target
//!
//! ## Usage example
//!
//! ```
//! use trellis::{CommentRecord, CommentTree};
//!
//! let records = vec![
//!     CommentRecord::top_level("1", serde_json::json!({"body": "first!"})),
//!     CommentRecord::reply_to("2", "1", 1, serde_json::json!({"body": "welcome"})),
//! ];
//! let (tree, outcome) = CommentTree::from_records(records);
//! assert_eq!(outcome.placed, 2);
//!
//! let first = tree.children(tree.root())[0];
//! assert_eq!(tree.rendered_replies(first), 1);
//! ```
//!
//! ## Failure taxonomy
//!
//! Batch merging never fails: records that cannot be attached are
//! orphaned, logged and tallied in a [`MergeOutcome`]. Lookups for absent
//! ids return `None`. Only [`CommentTree::insert_comment`] can return an
//! [`EngineError`], because a local reply targeting a parent that is not
//! in the tree is a caller bug, not bad server data.

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

// Core modules - each implements one face of the engine
pub mod record; // Flat server-supplied comment records
pub mod tree; // Tree assembly, grafting, search and derived counts

// Re-exports for convenience
pub use record::{CommentId, CommentRecord};
pub use tree::{CommentTree, MergeOutcome, NodeId, Preorder};

use thiserror::Error;

/// Errors raised by the comment-tree engine.
///
/// Deliberately small: merge anomalies are soft (see the crate docs), so
/// only operations with a hard precondition can fail.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A locally written reply pointed at a parent id that is not present
    /// in the visible tree.
    #[error("parent comment not found: {id}")]
    ParentNotFound {
        /// Parent id the reply pointed at.
        id: CommentId,
    },
}
