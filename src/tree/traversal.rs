//! Search and iteration over the visible tree
//!
//! Lookups are preorder scans; the tree keeps no id index. The hinted
//! variant skips whole subtrees using the depth invariant: within one
//! child list, depths only grow, so if a node's first child already sits
//! deeper than the target depth, nothing at the target depth can live in
//! that subtree.
//!
//! The hint is a shortcut, not ground truth. With a stale or wrong depth
//! it can skip past the node it was looking for, so callers that need a
//! definitive answer use the unhinted scan.

use super::node::NodeId;
use super::CommentTree;

impl<P> CommentTree<P> {
    /// Locate the node holding comment `id` anywhere in the visible tree.
    ///
    /// Full preorder scan, no pruning. Returns `None` when the id is
    /// absent (or only present in an orphaned branch).
    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.search_below(NodeId::ROOT, id, None)
    }

    /// Locate comment `id`, skipping subtrees that cannot contain a node
    /// at `depth_hint`.
    ///
    /// A subtree is skipped when its first child sits strictly deeper than
    /// the hint; a first child at exactly the hint depth is still searched.
    /// With accurate depths this returns the same node as [`find`]; with
    /// inaccurate ones it may return `None` for a node that exists.
    ///
    /// [`find`]: CommentTree::find
    pub fn find_with_depth_hint(&self, id: &str, depth_hint: u32) -> Option<NodeId> {
        self.search_below(NodeId::ROOT, id, Some(depth_hint))
    }

    /// Preorder search of the subtree below `start`, excluding `start`
    /// itself. Direct children are always checked; the hint only gates
    /// descent into their subtrees.
    pub(crate) fn search_below(
        &self,
        start: NodeId,
        id: &str,
        depth_hint: Option<u32>,
    ) -> Option<NodeId> {
        for &child in &self.nodes[start.0].children {
            if self.nodes[child.0].comment_id() == Some(id) {
                return Some(child);
            }
            if self.subtree_beyond_hint(child, depth_hint) {
                continue;
            }
            if let Some(found) = self.search_below(child, id, depth_hint) {
                return Some(found);
            }
        }
        None
    }

    /// Like [`search_below`] but also matches `start` itself. Used when
    /// unattached branch tops are themselves candidate parents.
    ///
    /// [`search_below`]: CommentTree::search_below
    pub(crate) fn search_rooted(
        &self,
        start: NodeId,
        id: &str,
        depth_hint: Option<u32>,
    ) -> Option<NodeId> {
        if self.nodes[start.0].comment_id() == Some(id) {
            return Some(start);
        }
        self.search_below(start, id, depth_hint)
    }

    /// Whether `node`'s subtree starts past the hinted depth and can be
    /// skipped. Leaves never prune; a record-less first child never prunes.
    fn subtree_beyond_hint(&self, node: NodeId, depth_hint: Option<u32>) -> bool {
        let hint = match depth_hint {
            Some(hint) => hint,
            None => return false,
        };
        let first = match self.nodes[node.0].children.first() {
            Some(&first) => first,
            None => return false,
        };
        match self.nodes[first.0].depth() {
            Some(depth) => depth > hint,
            None => false,
        }
    }

    /// Preorder iterator over every comment node reachable from the root.
    ///
    /// The synthetic root is not yielded. Within a node the children come
    /// out in display order, so the sequence matches a rendered thread
    /// read top to bottom.
    pub fn iter(&self) -> Preorder<'_, P> {
        let mut stack: Vec<NodeId> = self.nodes[NodeId::ROOT.0].children.clone();
        stack.reverse();
        Preorder { tree: self, stack }
    }
}

/// Preorder walk over a tree's visible comment nodes.
///
/// Created by [`CommentTree::iter`].
#[derive(Debug)]
pub struct Preorder<'a, P> {
    tree: &'a CommentTree<P>,
    stack: Vec<NodeId>,
}

impl<'a, P> Iterator for Preorder<'a, P> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        let children = &self.tree.nodes[next.0].children;
        self.stack.extend(children.iter().rev().copied());
        Some(next)
    }
}
