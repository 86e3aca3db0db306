//! Tests for the comment reply tree builder

use chrono::{TimeZone, Utc};

use std::thread;

use founders_links::comments_tree::{build_forest, build_tree, CommentNode, MAX_DEPTH};
use founders_links::model::Comment;

fn comment(id: &str, parent_id: Option<&str>) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: "post".to_string(),
        parent_id: parent_id.map(str::to_string),
        content: format!("comment {id}"),
        author_id: "author".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 12, 19, 9, 0, 0).unwrap(),
    }
}

fn ids(nodes: &[CommentNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.comment.id.as_str()).collect()
}

fn count(nodes: &[CommentNode]) -> usize {
    nodes.iter().map(CommentNode::subtree_len).sum()
}

/// Number of levels in the forest, walked without recursion
fn depth(nodes: &[CommentNode]) -> usize {
    let mut deepest = 0;
    let mut stack: Vec<(&CommentNode, usize)> = nodes.iter().map(|n| (n, 1)).collect();
    while let Some((node, level)) = stack.pop() {
        deepest = deepest.max(level);
        stack.extend(node.children.iter().map(|c| (c, level + 1)));
    }
    deepest
}

/// "c0" <- "c1" <- "c2" ... each comment replying to the one before
fn reply_chain(len: usize) -> Vec<Comment> {
    (0..len)
        .map(|i| {
            let parent = (i > 0).then(|| format!("c{}", i - 1));
            comment(&format!("c{}", i), parent.as_deref())
        })
        .collect()
}

#[test]
fn test_dangling_parent_becomes_root() {
    let forest = build_forest(vec![
        comment("a", None),
        comment("b", Some("a")),
        comment("c", Some("z")),
    ]);

    assert_eq!(ids(&forest.roots), vec!["a", "c"]);
    assert_eq!(ids(&forest.roots[0].children), vec!["b"]);
    assert!(forest.roots[1].children.is_empty());
    assert_eq!(count(&forest.roots), 3);
    assert_eq!(forest.orphaned, 1);
}

#[test]
fn test_siblings_keep_input_order() {
    let roots = build_tree(vec![
        comment("a", None),
        comment("b", Some("a")),
        comment("c", Some("a")),
    ]);

    assert_eq!(roots.len(), 1);
    assert_eq!(ids(&roots[0].children), vec!["b", "c"]);
}

#[test]
fn test_reply_before_parent() {
    let roots = build_tree(vec![
        comment("reply", Some("top")),
        comment("top", None),
    ]);

    assert_eq!(ids(&roots), vec!["top"]);
    assert_eq!(ids(&roots[0].children), vec!["reply"]);
}

#[test]
fn test_deep_nesting() {
    let roots = build_tree(vec![
        comment("a", None),
        comment("b", Some("a")),
        comment("c", Some("b")),
        comment("d", Some("c")),
        comment("e", None),
    ]);

    assert_eq!(ids(&roots), vec!["a", "e"]);
    let c = &roots[0].children[0].children[0];
    assert_eq!(c.comment.id, "c");
    assert_eq!(ids(&c.children), vec!["d"]);
    assert_eq!(count(&roots), 5);
}

#[test]
fn test_roots_keep_input_order() {
    let roots = build_tree(vec![
        comment("x", None),
        comment("orphan", Some("gone")),
        comment("y", None),
    ]);

    assert_eq!(ids(&roots), vec!["x", "orphan", "y"]);
}

#[test]
fn test_empty_input() {
    let forest = build_forest(Vec::new());

    assert!(forest.roots.is_empty());
    assert_eq!(forest.orphaned, 0);
}

#[test]
fn test_every_comment_appears_once() {
    let input = vec![
        comment("1", None),
        comment("2", Some("1")),
        comment("3", Some("1")),
        comment("4", Some("2")),
        comment("5", Some("missing")),
        comment("6", Some("5")),
        comment("7", None),
    ];
    let total = input.len();

    let roots = build_tree(input);

    assert_eq!(count(&roots), total);
    assert_eq!(ids(&roots), vec!["1", "5", "7"]);
    assert_eq!(ids(&roots[1].children), vec!["6"]);
}

#[test]
fn test_node_serializes_flat_with_children() {
    let roots = build_tree(vec![comment("a", None), comment("b", Some("a"))]);
    let value = serde_json::to_value(&roots).unwrap();

    assert_eq!(value[0]["id"], "a");
    assert_eq!(value[0]["post_id"], "post");
    assert_eq!(value[0]["children"][0]["id"], "b");
    assert_eq!(value[0]["children"][0]["parent_id"], "a");
    assert_eq!(value[0]["children"][0]["children"], serde_json::json!([]));
}

#[test]
fn test_long_reply_chain_on_small_stack() {
    let handle = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let roots = build_tree(reply_chain(100_000));

            assert_eq!(count(&roots), 100_000);
            assert_eq!(depth(&roots), MAX_DEPTH + 2);

            let json = serde_json::to_string(&roots).unwrap();
            assert!(json.starts_with(r#"[{"id":"c0""#));

            drop(roots);
        })
        .unwrap();

    handle.join().expect("deep reply chain handled without overflowing");
}

#[test]
fn test_replies_below_max_depth_are_flattened_in_thread_order() {
    let mut input = reply_chain(MAX_DEPTH + 3);
    // a second branch hanging off the deepest nested comment
    let anchor = format!("c{}", MAX_DEPTH);
    input.push(comment("side", Some(&anchor)));

    let roots = build_tree(input);

    let mut node = &roots[0];
    for level in 1..=MAX_DEPTH {
        assert_eq!(node.children.len(), 1);
        node = &node.children[0];
        assert_eq!(node.comment.id, format!("c{}", level));
    }

    let expected: Vec<String> = vec![
        format!("c{}", MAX_DEPTH + 1),
        format!("c{}", MAX_DEPTH + 2),
        "side".to_string(),
    ];
    let flattened: Vec<String> = node.children.iter().map(|c| c.comment.id.clone()).collect();
    assert_eq!(flattened, expected);
    assert!(node.children.iter().all(|c| c.children.is_empty()));
}

#[test]
fn test_cycle_is_left_out() {
    let forest = build_forest(vec![
        comment("root", None),
        comment("x", Some("y")),
        comment("y", Some("x")),
    ]);

    assert_eq!(ids(&forest.roots), vec!["root"]);
    assert_eq!(count(&forest.roots), 1);
}
