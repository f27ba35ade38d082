//! Arena node storage
//!
//! Nodes live in a flat `Vec` owned by the tree and link to each other by
//! index, never by reference. Upward count propagation is then plain index
//! chasing, and subtrees can be regrafted by rewriting two links.
//!
//! Slot 0 always holds the synthetic root. Slots are never freed: a branch
//! that ends up orphaned simply stays unreachable from the root.

use std::fmt;

use crate::record::CommentRecord;

/// Index of a node within its owning tree's arena.
///
/// Ids are only meaningful for the tree that issued them and stay valid for
/// that tree's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Arena slot of the synthetic root.
    pub(crate) const ROOT: NodeId = NodeId(0);

    /// Raw arena index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One tree slot: a comment plus its structural bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct Node<P> {
    /// Record held here; `None` only for the synthetic root.
    pub(crate) comment: Option<CommentRecord<P>>,

    /// Owning node; `None` for the root and for unattached branch tops.
    pub(crate) parent: Option<NodeId>,

    /// Child nodes in display order (fresh local replies go in front).
    pub(crate) children: Vec<NodeId>,

    /// Count of strict descendants as of the last recompute.
    pub(crate) no_replies_rendered: u32,

    /// UI collapse flag; carried by the tree, ignored by its algorithms.
    pub(crate) collapsed: bool,
}

impl<P> Node<P> {
    /// The record-less root every thread hangs off.
    pub(crate) fn synthetic_root() -> Self {
        Self {
            comment: None,
            parent: None,
            children: Vec::new(),
            no_replies_rendered: 0,
            collapsed: false,
        }
    }

    /// Fresh node for `comment`, not yet linked into any child list.
    pub(crate) fn for_comment(comment: CommentRecord<P>, parent: Option<NodeId>) -> Self {
        Self {
            comment: Some(comment),
            parent,
            children: Vec::new(),
            no_replies_rendered: 0,
            collapsed: false,
        }
    }

    /// Id of the record held here, if any.
    #[inline]
    pub(crate) fn comment_id(&self) -> Option<&str> {
        self.comment.as_ref().map(|c| c.id.as_str())
    }

    /// Depth of the record held here, if any.
    #[inline]
    pub(crate) fn depth(&self) -> Option<u32> {
        self.comment.as_ref().map(|c| c.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_root_slot_is_zero() {
        assert_eq!(NodeId::ROOT.index(), 0);
        assert_eq!(NodeId::ROOT.to_string(), "#0");
    }

    #[test]
    fn test_synthetic_root_holds_no_record() {
        let root: Node<Value> = Node::synthetic_root();
        assert!(root.comment.is_none());
        assert!(root.comment_id().is_none());
        assert!(root.depth().is_none());
    }

    #[test]
    fn test_comment_node_exposes_record_fields() {
        let record = CommentRecord::reply_to("c3", "c1", 2, Value::Null);
        let node = Node::for_comment(record, Some(NodeId(5)));

        assert_eq!(node.comment_id(), Some("c3"));
        assert_eq!(node.depth(), Some(2));
        assert_eq!(node.parent, Some(NodeId(5)));
        assert!(node.children.is_empty());
        assert_eq!(node.no_replies_rendered, 0);
    }
}
