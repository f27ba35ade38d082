//! Flat comment records as delivered by the server.
//!
//! A record is the server's view of a single comment: identity, threading
//! coordinates (nullable parent id plus depth), the server-side descendant
//! reply total, and an opaque display payload the engine carries but never
//! inspects. Batches arrive as flat arrays of these; the tree module turns
//! them into a rooted structure.

use serde::{Deserialize, Serialize};

/// Stable comment identifier assigned by the server.
pub type CommentId = String;

/// Flat, server-supplied representation of one comment.
///
/// `P` is the display payload type (author, body, timestamps, votes, and
/// whatever else the frontend renders). The engine threads it through
/// unchanged; callers that only care about structure can use
/// `serde_json::Value` and forget about it.
///
/// Wire field names keep the server's casing (`parentId`, `noReplies`).
/// Any JSON fields beyond the threading coordinates are collected into
/// `payload`, so `P` must be map-shaped (a struct or a JSON object) for
/// serialization to round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord<P> {
    /// Unique, stable comment id.
    pub id: CommentId,
    /// Id of the comment this one replies to; `None` (or an absent field)
    /// marks a top-level comment.
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    /// Distance from the thread root. Top-level comments sit at depth 0 and
    /// a reply's depth is its parent's depth plus one.
    pub depth: u32,
    /// Server-reported count of all replies below this comment, including
    /// ones not fetched yet. Bumped locally when a reply is spliced in.
    #[serde(default)]
    pub no_replies: u32,
    /// Opaque display payload.
    #[serde(flatten)]
    pub payload: P,
}

impl<P> CommentRecord<P> {
    /// Assemble a record from all of its parts.
    pub fn new(
        id: impl Into<CommentId>,
        parent_id: Option<CommentId>,
        depth: u32,
        no_replies: u32,
        payload: P,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id,
            depth,
            no_replies,
            payload,
        }
    }

    /// Top-level comment: no parent, depth 0, no replies yet.
    pub fn top_level(id: impl Into<CommentId>, payload: P) -> Self {
        Self::new(id, None, 0, 0, payload)
    }

    /// Reply to an existing comment, with no replies of its own yet.
    pub fn reply_to(
        id: impl Into<CommentId>,
        parent_id: impl Into<CommentId>,
        depth: u32,
        payload: P,
    ) -> Self {
        Self::new(id, Some(parent_id.into()), depth, 0, payload)
    }

    /// Whether this record sits at the top level of the thread.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}
