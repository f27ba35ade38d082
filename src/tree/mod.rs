//! Comment tree assembly and maintenance
//!
//! Turns flat, paginated comment batches into a rooted reply tree and
//! keeps it correct as more batches and locally written replies arrive.
//!
//! Out-of-order arrival is the normal case, not an error. A record whose
//! parent has not materialized yet opens a partial branch; an end-of-pass
//! graft step reattaches partial branches once their parents exist.
//! Branches still unattached when the pass ends are orphans. They get
//! logged and reported in the [`MergeOutcome`], and the visible tree goes
//! on without them.
//!
//! Nodes live in an index arena ([`node`]); search and iteration live in
//! [`traversal`].

mod node;
mod traversal;

pub use node::NodeId;
pub use traversal::Preorder;

use tracing::{debug, warn};

use crate::record::{CommentId, CommentRecord};
use crate::EngineError;

use node::Node;

/// Rooted comment tree backed by an index arena.
///
/// Slot 0 holds a synthetic record-less root; top-level comments are its
/// children. Arena slots are never freed, so a [`NodeId`] stays valid for
/// the tree's whole lifetime even if its branch loses the graft step and
/// becomes unreachable.
///
/// All structural mutation goes through [`merge_records`],
/// [`merge_new_replies`] and [`insert_comment`]; the only state callers
/// may write directly is the per-node collapse flag.
///
/// [`merge_records`]: CommentTree::merge_records
/// [`merge_new_replies`]: CommentTree::merge_new_replies
/// [`insert_comment`]: CommentTree::insert_comment
#[derive(Debug, Clone)]
pub struct CommentTree<P> {
    pub(crate) nodes: Vec<Node<P>>,
}

/// Report of one build or merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Records attached to the visible tree during the pass.
    pub placed: usize,

    /// Partial branches reattached by the end-of-pass graft step.
    pub grafted_branches: usize,

    /// Records dropped because their parent never turned up.
    pub orphaned: usize,

    /// Topmost comment id of each orphaned branch.
    pub orphan_roots: Vec<CommentId>,

    /// Records skipped by [`CommentTree::merge_new_replies`] because the
    /// tree already held their id.
    pub skipped_duplicates: usize,
}

/// Branch whose parent had not materialized when its top record arrived.
struct PartialBranch {
    /// Arena slot of the branch top.
    node: NodeId,
    /// Parent id the branch top is waiting for.
    parent_id: CommentId,
    /// Depth hint for locating that parent.
    parent_hint: Option<u32>,
}

impl<P> CommentTree<P> {
    /// Empty tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::synthetic_root()],
        }
    }

    /// Build a tree from a single flat batch.
    ///
    /// Equivalent to [`new`] followed by one [`merge_records`] pass.
    ///
    /// [`new`]: CommentTree::new
    /// [`merge_records`]: CommentTree::merge_records
    pub fn from_records(records: Vec<CommentRecord<P>>) -> (Self, MergeOutcome) {
        let mut tree = Self::new();
        let outcome = tree.merge_records(records);
        (tree, outcome)
    }

    /// Merge a flat batch into the tree.
    ///
    /// Records are processed in batch order. Each one attaches under its
    /// parent if the parent is already present (in the visible tree or in
    /// a partial branch opened earlier in this pass); otherwise it opens a
    /// new partial branch. After the whole batch is placed, a graft step
    /// reattaches partial branches whose parents now exist, descendant
    /// counts are recomputed from the root, and whatever is still
    /// unattached is reported as orphaned.
    ///
    /// Collapse flags and arena ids of existing nodes are untouched.
    pub fn merge_records(&mut self, records: Vec<CommentRecord<P>>) -> MergeOutcome {
        let total = records.len();
        let mut partials: Vec<PartialBranch> = Vec::new();

        for record in records {
            let parent_hint = record.depth.checked_sub(1);
            let parent_id = record.parent_id.clone();
            match parent_id {
                // Top-level comments hang directly off the synthetic root.
                None => {
                    let child = self.alloc(record, Some(NodeId::ROOT));
                    self.nodes[NodeId::ROOT.0].children.push(child);
                }
                Some(pid) => {
                    let found = self
                        .search_below(NodeId::ROOT, &pid, parent_hint)
                        .or_else(|| {
                            partials
                                .iter()
                                .find_map(|p| self.search_rooted(p.node, &pid, parent_hint))
                        });
                    match found {
                        Some(parent) => {
                            let child = self.alloc(record, Some(parent));
                            self.nodes[parent.0].children.push(child);
                        }
                        None => {
                            let node = self.alloc(record, None);
                            partials.push(PartialBranch {
                                node,
                                parent_id: pid,
                                parent_hint,
                            });
                        }
                    }
                }
            }
        }

        let mut outcome = MergeOutcome::default();
        self.graft_partials(partials, &mut outcome);
        outcome.placed = total - outcome.orphaned;

        self.recompute_rendered_counts(NodeId::ROOT);
        outcome
    }

    /// Merge a "load more replies" batch, skipping records whose id is
    /// already in the visible tree.
    ///
    /// Pagination overlap is expected here, so duplicates are counted in
    /// the outcome rather than treated as anomalies. Fresh records go
    /// through the same placement and graft steps as [`merge_records`].
    ///
    /// [`merge_records`]: CommentTree::merge_records
    pub fn merge_new_replies(&mut self, records: Vec<CommentRecord<P>>) -> MergeOutcome {
        let mut fresh = Vec::with_capacity(records.len());
        let mut skipped = 0;
        for record in records {
            if self.contains(&record.id) {
                skipped += 1;
            } else {
                fresh.push(record);
            }
        }

        let mut outcome = self.merge_records(fresh);
        outcome.skipped_duplicates = skipped;
        outcome
    }

    /// Splice one locally written comment into the tree.
    ///
    /// The parent is located by id with the record's `depth - 1` as the
    /// search hint. The new node goes to the front of the parent's child
    /// list, newest reply first. Every ancestor record's `no_replies` and
    /// every ancestor node's rendered count are bumped by one, so the
    /// counts stay consistent without a full recompute.
    ///
    /// Unlike batch merging, a missing parent here is a contract
    /// violation and fails with [`EngineError::ParentNotFound`]. The tree
    /// is unchanged on error.
    pub fn insert_comment(&mut self, record: CommentRecord<P>) -> Result<NodeId, EngineError> {
        let parent = match record.parent_id.as_deref() {
            None => NodeId::ROOT,
            Some(pid) => {
                let hint = record.depth.checked_sub(1);
                match self.search_below(NodeId::ROOT, pid, hint) {
                    Some(parent) => parent,
                    None => {
                        return Err(EngineError::ParentNotFound { id: pid.to_owned() });
                    }
                }
            }
        };

        let node = self.alloc(record, Some(parent));
        self.nodes[parent.0].children.insert(0, node);

        // Both count domains pick up the new reply on the way up: the
        // server total on ancestor records, the rendered count on
        // ancestor nodes (synthetic root included).
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            let ancestor = &mut self.nodes[current.0];
            if let Some(comment) = ancestor.comment.as_mut() {
                comment.no_replies += 1;
            }
            ancestor.no_replies_rendered += 1;
            cursor = ancestor.parent;
        }

        self.recompute_rendered_counts(parent);
        Ok(node)
    }

    /// Recompute rendered reply counts for `node`'s whole subtree.
    ///
    /// Post-order: each node's count becomes the number of its strict
    /// descendants, and that count is also the return value. Merging calls
    /// this from the root after every pass; it is cheap enough to call on
    /// any subtree whose shape changed by other means.
    pub fn recompute_rendered_counts(&mut self, node: NodeId) -> u32 {
        let mut total = 0;
        for i in 0..self.nodes[node.0].children.len() {
            let child = self.nodes[node.0].children[i];
            total += 1 + self.recompute_rendered_counts(child);
        }
        self.nodes[node.0].no_replies_rendered = total;
        total
    }

    /// Direct child count plus the children's own server-reported totals.
    ///
    /// Counts only one level of materialized structure, then trusts the
    /// children's `no_replies` for everything below. Comparing this
    /// against a parent's `no_replies` tells a pager how many replies are
    /// still unfetched.
    pub fn count_direct_and_descendant_replies(&self, node: NodeId) -> u32 {
        let children = &self.nodes[node.0].children;
        let mut total = children.len() as u32;
        for &child in children {
            if let Some(comment) = self.nodes[child.0].comment.as_ref() {
                total += comment.no_replies;
            }
        }
        total
    }

    /// Arena id of the synthetic root.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Record held at `node`; `None` for the synthetic root.
    pub fn comment(&self, node: NodeId) -> Option<&CommentRecord<P>> {
        self.nodes[node.0].comment.as_ref()
    }

    /// Children of `node` in display order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Parent of `node`; `None` for the root and for orphaned branch tops.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Rendered reply count of `node` as of the last recompute.
    pub fn rendered_replies(&self, node: NodeId) -> u32 {
        self.nodes[node.0].no_replies_rendered
    }

    /// UI collapse flag of `node`.
    pub fn is_collapsed(&self, node: NodeId) -> bool {
        self.nodes[node.0].collapsed
    }

    /// Set the UI collapse flag, the one piece of node state callers may
    /// write directly. Merges and inserts never reset it.
    pub fn set_collapsed(&mut self, node: NodeId, collapsed: bool) {
        self.nodes[node.0].collapsed = collapsed;
    }

    /// Whether comment `id` is reachable from the root. Linear scan.
    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Number of comments reachable from the root. Walks the tree;
    /// orphaned branches are not counted.
    pub fn comment_count(&self) -> usize {
        self.subtree_size(NodeId::ROOT) - 1
    }

    /// Whether the visible tree holds no comments at all.
    pub fn is_empty(&self) -> bool {
        self.nodes[NodeId::ROOT.0].children.is_empty()
    }

    /// Fingerprint of the visible tree's shape: comment ids and child
    /// order, nothing else.
    ///
    /// Payload edits, count changes and collapse toggles leave the digest
    /// unchanged; any reparenting or reordering changes it. Memoizing
    /// renderers use it as a cheap "did anything move" probe.
    pub fn structure_digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        self.digest_subtree(NodeId::ROOT, &mut hasher);
        *hasher.finalize().as_bytes()
    }

    fn digest_subtree(&self, node: NodeId, hasher: &mut blake3::Hasher) {
        if let Some(id) = self.nodes[node.0].comment_id() {
            hasher.update(id.as_bytes());
        }
        // Parens delimit child lists so sibling and nesting structure
        // cannot collide.
        hasher.update(b"(");
        for &child in &self.nodes[node.0].children {
            self.digest_subtree(child, hasher);
        }
        hasher.update(b")");
    }

    /// Graft pass: reattach partial branches whose parent now exists in
    /// the visible tree or inside another partial branch. Leftovers are
    /// orphans and get logged and tallied in the outcome.
    fn graft_partials(&mut self, partials: Vec<PartialBranch>, outcome: &mut MergeOutcome) {
        let mut unattached = partials;

        let mut i = 0;
        while i < unattached.len() {
            let branch_top = unattached[i].node;
            let hint = unattached[i].parent_hint;

            let target = {
                let pid = unattached[i].parent_id.as_str();
                self.search_below(NodeId::ROOT, pid, hint).or_else(|| {
                    unattached
                        .iter()
                        .enumerate()
                        .filter(|&(j, _)| j != i)
                        .find_map(|(_, other)| self.search_rooted(other.node, pid, hint))
                })
            };

            match target {
                Some(parent) => {
                    self.nodes[branch_top.0].parent = Some(parent);
                    self.nodes[parent.0].children.push(branch_top);
                    debug!(
                        "grafted waiting branch {} onto comment {}",
                        branch_top, unattached[i].parent_id
                    );
                    outcome.grafted_branches += 1;
                    // A grafted branch becomes searchable for the ones
                    // still pending, so one pass resolves chains.
                    unattached.remove(i);
                }
                None => i += 1,
            }
        }

        for leftover in &unattached {
            let size = self.subtree_size(leftover.node);
            outcome.orphaned += size;
            if let Some(id) = self.nodes[leftover.node.0].comment_id() {
                warn!(
                    "dropping orphaned branch at comment {} ({} record(s)): parent {} never arrived",
                    id, size, leftover.parent_id
                );
                outcome.orphan_roots.push(id.to_owned());
            }
        }
    }

    /// Push a node into the arena, unlinked from any child list.
    fn alloc(&mut self, comment: CommentRecord<P>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::for_comment(comment, parent));
        id
    }

    /// Number of nodes in `node`'s subtree, `node` included.
    fn subtree_size(&self, node: NodeId) -> usize {
        let mut count = 0;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(self.nodes[current.0].children.iter().copied());
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn top(id: &str) -> CommentRecord<Value> {
        CommentRecord::top_level(id, Value::Null)
    }

    fn reply(id: &str, parent: &str, depth: u32) -> CommentRecord<Value> {
        CommentRecord::reply_to(id, parent, depth, Value::Null)
    }

    #[test]
    fn test_empty_batch_builds_empty_tree() {
        let (tree, outcome) = CommentTree::<Value>::from_records(Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.comment_count(), 0);
        assert_eq!(outcome, MergeOutcome::default());
    }

    #[test]
    fn test_in_order_batch_places_everything() {
        let (tree, outcome) =
            CommentTree::from_records(vec![top("a"), reply("b", "a", 1), reply("c", "a", 1)]);

        assert_eq!(outcome.placed, 3);
        assert_eq!(outcome.orphaned, 0);
        assert_eq!(tree.comment_count(), 3);

        let a = tree.find("a").unwrap();
        assert_eq!(tree.children(a).len(), 2);
        assert_eq!(tree.rendered_replies(a), 2);
    }

    #[test]
    fn test_out_of_order_batch_grafts_into_place() {
        // Deepest first: c waits for b, b waits for a.
        let (tree, outcome) =
            CommentTree::from_records(vec![reply("c", "b", 2), reply("b", "a", 1), top("a")]);

        assert_eq!(outcome.orphaned, 0);
        assert_eq!(outcome.grafted_branches, 2);

        let b = tree.find("b").unwrap();
        let c = tree.find("c").unwrap();
        assert_eq!(tree.parent(c), Some(b));
        assert_eq!(tree.rendered_replies(tree.find("a").unwrap()), 2);
    }

    #[test]
    fn test_unresolvable_branch_is_orphaned_not_fatal() {
        let (tree, outcome) = CommentTree::from_records(vec![
            top("a"),
            reply("x", "ghost", 1),
            reply("y", "x", 2),
        ]);

        assert_eq!(outcome.placed, 1);
        assert_eq!(outcome.orphaned, 2);
        assert_eq!(outcome.orphan_roots, vec!["x".to_string()]);
        assert!(tree.contains("a"));
        assert!(!tree.contains("x"));
        assert!(!tree.contains("y"));
    }

    #[test]
    fn test_insert_prepends_and_propagates_counts() {
        let (mut tree, _) =
            CommentTree::from_records(vec![top("a"), reply("b", "a", 1), reply("c", "b", 2)]);

        let id = tree
            .insert_comment(reply("d", "b", 2))
            .expect("parent exists");

        let b = tree.find("b").unwrap();
        assert_eq!(tree.children(b)[0], id);

        // Server totals bumped on every ancestor record.
        assert_eq!(tree.comment(b).unwrap().no_replies, 1);
        let a = tree.find("a").unwrap();
        assert_eq!(tree.comment(a).unwrap().no_replies, 1);

        // Rendered counts bumped root included.
        assert_eq!(tree.rendered_replies(b), 2);
        assert_eq!(tree.rendered_replies(a), 3);
        assert_eq!(tree.rendered_replies(tree.root()), 4);
    }

    #[test]
    fn test_insert_missing_parent_fails_clean() {
        let (mut tree, _) = CommentTree::from_records(vec![top("a")]);
        let digest = tree.structure_digest();

        let err = tree.insert_comment(reply("z", "ghost", 1)).unwrap_err();
        assert!(matches!(err, EngineError::ParentNotFound { ref id } if id == "ghost"));
        assert_eq!(tree.structure_digest(), digest);
        assert_eq!(tree.comment_count(), 1);
    }

    #[test]
    fn test_count_direct_and_descendant_replies_trusts_server_totals() {
        let mut b = reply("b", "a", 1);
        b.no_replies = 3;
        let mut c = reply("c", "a", 1);
        c.no_replies = 0;
        let (tree, _) = CommentTree::from_records(vec![top("a"), b, c]);

        let a = tree.find("a").unwrap();
        // Two materialized children plus 3 + 0 reported below them.
        assert_eq!(tree.count_direct_and_descendant_replies(a), 5);
        // Only one of b's reported replies is actually fetched: none.
        assert_eq!(tree.rendered_replies(a), 2);
    }

    #[test]
    fn test_collapse_survives_merges() {
        let (mut tree, _) = CommentTree::from_records(vec![top("a")]);
        let a = tree.find("a").unwrap();
        tree.set_collapsed(a, true);

        tree.merge_records(vec![reply("b", "a", 1)]);
        assert!(tree.is_collapsed(a));
        assert!(!tree.is_collapsed(tree.find("b").unwrap()));
    }

    #[test]
    fn test_digest_tracks_shape_not_state() {
        let (mut tree, _) = CommentTree::from_records(vec![top("a"), reply("b", "a", 1)]);
        let before = tree.structure_digest();

        let a = tree.find("a").unwrap();
        tree.set_collapsed(a, true);
        assert_eq!(tree.structure_digest(), before);

        tree.insert_comment(reply("c", "a", 1)).unwrap();
        assert_ne!(tree.structure_digest(), before);
    }
}
