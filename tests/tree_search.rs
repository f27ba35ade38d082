use test_helpers::*;

use serde_json::Value;
use test_case::test_case;
use trellis::CommentTree;

/// a(0) -> b(1) -> c(2), with d(0) as a second top-level comment.
fn sample_tree() -> CommentTree<Value> {
    CommentTree::from_records(vec![
        top("a"),
        reply("b", "a", 1),
        reply("c", "b", 2),
        top("d"),
    ])
    .0
}

#[test_case("a", 0, true  ; "top level at hint depth")]
#[test_case("b", 1, true  ; "hint at exact depth descends")]
#[test_case("b", 0, false ; "hint above target prunes its subtree")]
#[test_case("b", 5, true  ; "generous hint never prunes")]
#[test_case("c", 2, true  ; "deep node with exact hint")]
#[test_case("c", 1, false ; "hint between root and target")]
#[test_case("c", 0, false ; "hint far above deep node")]
#[test_case("ghost", 3, false ; "absent id")]
fn hinted_search(id: &str, hint: u32, expect_found: bool) {
    let tree = sample_tree();
    assert_eq!(tree.find_with_depth_hint(id, hint).is_some(), expect_found);
}

#[test]
fn unhinted_find_reaches_everything() {
    let tree = sample_tree();
    for id in ["a", "b", "c", "d"] {
        assert!(tree.find(id).is_some(), "find({})", id);
    }
    assert!(tree.find("ghost").is_none());
}

#[test]
fn accurate_hint_agrees_with_unhinted_find() {
    let tree = sample_tree();
    for node in tree.iter() {
        let comment = tree.comment(node).unwrap();
        assert_eq!(
            tree.find_with_depth_hint(&comment.id, comment.depth),
            Some(node),
            "hinted find of {} at its real depth",
            comment.id
        );
    }
}

#[test]
fn empty_tree_finds_nothing() {
    let tree: CommentTree<Value> = CommentTree::new();
    assert!(tree.find("a").is_none());
    assert!(tree.find_with_depth_hint("a", 0).is_none());
    assert!(!tree.contains("a"));
}

#[test]
fn contains_mirrors_find() {
    let tree = sample_tree();
    assert!(tree.contains("c"));
    assert!(!tree.contains("ghost"));
}

#[test]
fn preorder_iteration_covers_each_node_once() {
    let tree = sample_tree();
    let mut ids = ids_in_display_order(&tree);
    assert_eq!(ids.len(), tree.comment_count());
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}
