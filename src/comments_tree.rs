//! Builds the nested reply tree of a post from its flat comment list
//!
//! Comments are stored flat, each pointing at an optional parent comment.
//! Rendering wants a forest: top-level comments as roots, replies nested
//! under the comment they answer.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::Comment;

/// Deepest reply level kept as real nesting; roots are level 0
///
/// Replies below this level are attached to their ancestor at this level,
/// in thread order, so the returned tree is at most `MAX_DEPTH + 1` levels
/// deep however long a reply chain grows.
pub const MAX_DEPTH: usize = 32;

/// A comment together with its direct replies
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,

    pub children: Vec<CommentNode>,
}

impl CommentNode {
    /// Number of nodes in this subtree, including itself
    pub fn subtree_len(&self) -> usize {
        let mut len = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            len += 1;
            stack.extend(node.children.iter());
        }
        len
    }
}

/// The reply forest of a post plus how many comments lost their parent
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CommentForest {
    pub roots: Vec<CommentNode>,

    /// Comments whose `parent_id` did not resolve and were promoted to roots
    pub orphaned: usize,
}

/// Turns a flat comment list into a reply forest
///
/// See [`build_forest`] for the placement rules.
pub fn build_tree(comments: Vec<Comment>) -> Vec<CommentNode> {
    build_forest(comments).roots
}

/// Turns a flat comment list into a reply forest, counting orphans
///
/// Placement, in input order:
/// - no `parent_id` - root
/// - `parent_id` found in the batch - appended to that comment's children
/// - `parent_id` not found (parent deleted, or in another batch) - root
///
/// Parents do not need to come before their replies in the input. Siblings
/// and roots keep their relative input order. With duplicate ids, replies
/// attach to the first comment carrying the id.
///
/// Nesting stops at [`MAX_DEPTH`]: a comment at that level gets all of its
/// descendants as direct children, in depth-first thread order.
///
/// The parent graph is assumed to be acyclic. Comments caught in a cycle
/// are unreachable from any root and are left out, with a warning.
pub fn build_forest(comments: Vec<Comment>) -> CommentForest {
    let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(comments.len());
    for (index, comment) in comments.iter().enumerate() {
        by_id.entry(comment.id.as_str()).or_insert(index);
    }

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut orphaned = 0;

    for (index, comment) in comments.iter().enumerate() {
        match comment.parent_id.as_deref() {
            Some(parent_id) => match by_id.get(parent_id) {
                Some(&parent) => children[parent].push(index),
                None => {
                    tracing::warn!(
                        comment_id = %comment.id,
                        parent_id,
                        "comment parent not found, showing it as a top-level comment"
                    );
                    orphaned += 1;
                    roots.push(index);
                }
            },
            None => roots.push(index),
        }
    }

    let total = comments.len();
    let (order, placement) = thread_order(&roots, &children);

    let mut slots: Vec<Option<Comment>> = comments.into_iter().map(Some).collect();
    let mut built: Vec<Option<CommentNode>> = vec![None; total];

    // Every comment comes after its parent in `order`, so walking it
    // backwards finishes all children before their parent
    for &index in order.iter().rev() {
        let Some(comment) = slots[index].take() else {
            continue;
        };
        let children = placement[index]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(CommentNode { comment, children });
    }

    let roots: Vec<CommentNode> = roots
        .into_iter()
        .filter_map(|index| built[index].take())
        .collect();

    if order.len() < total {
        tracing::warn!(
            total,
            placed = order.len(),
            "comment replies form a cycle, some comments were left out"
        );
    }

    CommentForest { roots, orphaned }
}

/// Depth-first walk from the roots with an explicit stack
///
/// Returns the visiting order and, per comment, the children it ends up
/// with once nesting is capped at [`MAX_DEPTH`].
fn thread_order(roots: &[usize], children: &[Vec<usize>]) -> (Vec<usize>, Vec<Vec<usize>>) {
    let mut order = Vec::with_capacity(children.len());
    let mut placement: Vec<Vec<usize>> = vec![Vec::new(); children.len()];
    let mut visited = vec![false; children.len()];

    // (comment, depth, ancestor at MAX_DEPTH collecting deeper replies)
    let mut stack: Vec<(usize, usize, Option<usize>)> =
        roots.iter().rev().map(|&index| (index, 0, None)).collect();

    while let Some((index, depth, anchor)) = stack.pop() {
        if std::mem::replace(&mut visited[index], true) {
            continue;
        }
        order.push(index);

        let anchor = match anchor {
            Some(anchor) => {
                placement[anchor].push(index);
                Some(anchor)
            }
            None if depth == MAX_DEPTH => Some(index),
            None => {
                placement[index] = children[index].clone();
                None
            }
        };

        stack.extend(
            children[index]
                .iter()
                .rev()
                .map(|&child| (child, depth + 1, anchor)),
        );
    }

    (order, placement)
}
