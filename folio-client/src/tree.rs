use std::collections::{HashMap, HashSet};

use crate::api::{Comment, CommentId};

/// Nesting deeper than this inside a payload is cut off
pub const MAX_PAYLOAD_DEPTH: usize = 64;

/// The canonical in-memory shape of a scope's comments
///
/// Every comment's `parent_id` is the id of the comment whose `replies` hold
/// it, and `None` exactly for top-level comments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentTree {
    roots: Vec<Comment>,
    len: usize,
}

impl CommentTree {
    /// Normalizes a server payload, be it flat (`parent` links only),
    /// pre-nested (`replies`) or a mix of both
    pub fn from_payload(payload: Vec<Comment>) -> CommentTree {
        let mut flat = Vec::new();
        let mut seen = HashSet::new();
        for c in payload {
            flatten_into(c, None, 0, &mut flat, &mut seen);
        }
        CommentTree::from_flat(flat)
    }

    fn from_flat(flat: Vec<Comment>) -> CommentTree {
        let index = flat
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect::<HashMap<_, _>>();
        let mut children: HashMap<CommentId, Vec<usize>> = HashMap::new();
        let mut roots = Vec::new();
        for (i, c) in flat.iter().enumerate() {
            match c.parent_id {
                None => roots.push(i),
                Some(p) if p != c.id && index.contains_key(&p) => {
                    children.entry(p).or_default().push(i)
                }
                Some(p) => {
                    tracing::warn!(
                        comment = %c.id,
                        parent = %p,
                        "parent is not in this scope, showing comment at top level"
                    );
                    roots.push(i);
                }
            }
        }

        let mut slots = flat.into_iter().map(Some).collect::<Vec<_>>();
        let mut tree = CommentTree::default();
        for i in roots {
            if let Some(c) = assemble(i, 0, &mut slots, &children, &mut tree.len) {
                tree.push_root(c);
            }
        }

        // Whatever is left can only be reached through a parent cycle
        for i in 0..slots.len() {
            if let Some(id) = slots[i].as_ref().map(|c| c.id) {
                tracing::warn!(comment = %id, "reply cycle, showing comment at top level");
                if let Some(c) = assemble(i, 0, &mut slots, &children, &mut tree.len) {
                    tree.push_root(c);
                }
            }
        }

        tree
    }

    fn push_root(&mut self, mut c: Comment) {
        c.parent_id = None;
        self.roots.push(c);
    }

    pub fn roots(&self) -> &[Comment] {
        &self.roots
    }

    /// Total number of comments, replies included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        find_in(&self.roots, id)
    }

    /// Number of ancestors of comment `id`
    pub fn depth_of(&self, id: CommentId) -> Option<usize> {
        self.iter()
            .find(|(_, c)| c.id == id)
            .map(|(depth, _)| depth)
    }

    /// Pre-order traversal yielding each comment with its depth
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().map(|c| (0, c)).collect(),
        }
    }

    /// Places a freshly created comment where a refetch would put it: first
    /// among its siblings, as the server sorts newest first. Returns false if
    /// the comment was already there.
    pub fn insert(&mut self, mut comment: Comment) -> bool {
        if self.find(comment.id).is_some() {
            return false;
        }
        comment.replies.clear();
        let comment = match comment.parent_id {
            None => comment,
            Some(parent_id) => match find_in_mut(&mut self.roots, parent_id) {
                Some(parent) => {
                    parent.replies.insert(0, comment);
                    self.len += 1;
                    return true;
                }
                None => {
                    tracing::warn!(
                        comment = %comment.id,
                        parent = %parent_id,
                        "inserting reply to unknown comment at top level"
                    );
                    comment.parent_id = None;
                    comment
                }
            },
        };
        self.roots.insert(0, comment);
        self.len += 1;
        true
    }
}

pub struct Iter<'a> {
    stack: Vec<(usize, &'a Comment)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a Comment);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, c) = self.stack.pop()?;
        self.stack
            .extend(c.replies.iter().rev().map(|r| (depth + 1, r)));
        Some((depth, c))
    }
}

fn find_in(comments: &[Comment], id: CommentId) -> Option<&Comment> {
    for c in comments {
        if c.id == id {
            return Some(c);
        }
        if let Some(res) = find_in(&c.replies, id) {
            return Some(res);
        }
    }
    None
}

fn find_in_mut(comments: &mut [Comment], id: CommentId) -> Option<&mut Comment> {
    for c in comments.iter_mut() {
        if c.id == id {
            return Some(c);
        }
        if let Some(res) = find_in_mut(&mut c.replies, id) {
            return Some(res);
        }
    }
    None
}

fn flatten_into(
    mut c: Comment,
    enclosing: Option<CommentId>,
    depth: usize,
    out: &mut Vec<Comment>,
    seen: &mut HashSet<CommentId>,
) {
    let replies = std::mem::take(&mut c.replies);
    match (c.parent_id, enclosing) {
        (None, _) => c.parent_id = enclosing,
        (Some(p), Some(e)) if p != e => {
            tracing::debug!(
                comment = %c.id,
                parent = %p,
                nested_under = %e,
                "nesting disagrees with parent field, following the field"
            )
        }
        _ => (),
    }
    let id = c.id;
    match seen.insert(id) {
        true => out.push(c),
        false => {
            tracing::warn!(comment = %id, "duplicate comment in payload, keeping the first one")
        }
    }
    if replies.is_empty() {
        return;
    }
    if depth + 1 >= MAX_PAYLOAD_DEPTH {
        tracing::warn!(
            comment = %id,
            dropped = replies.len(),
            "payload nests too deep, dropping replies"
        );
        return;
    }
    for r in replies {
        flatten_into(r, Some(id), depth + 1, out, seen);
    }
}

fn assemble(
    i: usize,
    depth: usize,
    slots: &mut [Option<Comment>],
    children: &HashMap<CommentId, Vec<usize>>,
    len: &mut usize,
) -> Option<Comment> {
    let mut c = slots[i].take()?;
    *len += 1;
    let kids = match children.get(&c.id) {
        Some(kids) => kids,
        None => return Some(c),
    };
    if depth + 1 >= MAX_PAYLOAD_DEPTH {
        tracing::warn!(comment = %c.id, "replies nest too deep, dropping them");
        for &k in kids {
            discard(k, slots, children);
        }
        return Some(c);
    }
    for &k in kids {
        if let Some(reply) = assemble(k, depth + 1, slots, children, len) {
            c.replies.push(reply);
        }
    }
    Some(c)
}

fn discard(i: usize, slots: &mut [Option<Comment>], children: &HashMap<CommentId, Vec<usize>>) {
    if let Some(c) = slots[i].take() {
        for &k in children.get(&c.id).into_iter().flatten() {
            discard(k, slots, children);
        }
    }
}
