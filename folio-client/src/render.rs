use crate::{
    api::{Comment, CommentId},
    CommentTree,
};

/// Replies nested deeper than this are not rendered
pub const MAX_RENDER_DEPTH: usize = 32;

/// What a "reply" button on a rendered comment hands to the compose box
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReplyTarget {
    pub id: CommentId,
    /// Human-readable name of who is being replied to
    pub label: String,
}

impl ReplyTarget {
    pub fn to(comment: &Comment) -> ReplyTarget {
        ReplyTarget {
            id: comment.id,
            label: String::from(comment.display_name()),
        }
    }
}

/// Receives a comment tree one comment at a time, parents before replies
pub trait CommentRenderer {
    /// `reply` is what should be passed to `Compose::reply_to` when the user
    /// asks to reply to this comment
    fn comment(&mut self, comment: &Comment, depth: usize, reply: ReplyTarget);

    fn enter_replies(&mut self, _parent: &Comment, _depth: usize) {}

    fn leave_replies(&mut self, _parent: &Comment, _depth: usize) {}

    /// Called instead of descending into replies past the depth limit
    fn truncated(&mut self, _parent: &Comment, _hidden: usize, _depth: usize) {}
}

pub fn render<R: CommentRenderer>(tree: &CommentTree, renderer: &mut R) {
    render_with_limit(tree, renderer, MAX_RENDER_DEPTH)
}

pub fn render_with_limit<R: CommentRenderer>(
    tree: &CommentTree,
    renderer: &mut R,
    max_depth: usize,
) {
    for c in tree.roots() {
        render_comment(c, 0, max_depth, renderer);
    }
}

fn render_comment<R: CommentRenderer>(c: &Comment, depth: usize, max_depth: usize, r: &mut R) {
    r.comment(c, depth, ReplyTarget::to(c));
    if c.replies.is_empty() {
        return;
    }
    if depth + 1 >= max_depth {
        r.truncated(c, count_descendants(c), depth);
        return;
    }
    r.enter_replies(c, depth);
    for reply in &c.replies {
        render_comment(reply, depth + 1, max_depth, r);
    }
    r.leave_replies(c, depth);
}

fn count_descendants(c: &Comment) -> usize {
    let mut stack = c.replies.iter().collect::<Vec<_>>();
    let mut res = 0;
    while let Some(c) = stack.pop() {
        res += 1;
        stack.extend(c.replies.iter());
    }
    res
}

/// Renders a tree as indented plain text, one line per comment
#[derive(Debug, Default)]
pub struct OutlineRenderer {
    pub lines: Vec<String>,
    /// Reply targets in rendering order
    pub targets: Vec<ReplyTarget>,
}

impl OutlineRenderer {
    pub fn render(tree: &CommentTree) -> OutlineRenderer {
        let mut res = OutlineRenderer::default();
        render(tree, &mut res);
        res
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl CommentRenderer for OutlineRenderer {
    fn comment(&mut self, comment: &Comment, depth: usize, reply: ReplyTarget) {
        self.lines.push(format!(
            "{}{} ({}): {}",
            "  ".repeat(depth),
            comment.display_name(),
            comment.created_at,
            comment.content.replace('\n', " "),
        ));
        self.targets.push(reply);
    }

    fn truncated(&mut self, _parent: &Comment, hidden: usize, depth: usize) {
        self.lines
            .push(format!("{}… {hidden} more replies", "  ".repeat(depth + 1)));
    }
}
